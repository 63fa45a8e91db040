//! nginx configuration crossplane
//!
//! Lex nginx configuration text into tokens, parse the tokens into a directive
//! tree, and build the tree back into text that re-parses to the same tree.
//!
//! ```
//! use nginx_crossplane::{build, parse};
//!
//! let config = parse("events { worker_connections 1024; }").unwrap();
//! let events = config.find_directive("events").unwrap();
//! assert_eq!(events.find_directive("worker_connections").unwrap().args, vec!["1024"]);
//!
//! let text = build(&config);
//! assert!(parse(&text).unwrap().equivalent(&config));
//! ```

pub mod ast;
pub mod builder;
pub mod cli;
pub mod escape;
pub mod lexer;
pub mod parser;

pub use ast::{Argument, Comment, Directive, NginxConfig, Node};
pub use builder::{build, BuildOptions, Builder};
pub use lexer::{lex, tokenize, LexError, Lexer, Token, TokenKind};
pub use parser::{parse, parse_tokens, parse_with, ParseError, ParseOptions};

use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Lex(#[from] LexError),

    #[error("{0}")]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Read a UTF-8 config source to the end
pub fn read_source<R: Read>(mut reader: R) -> Result<String> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    Ok(source)
}

/// Parse a config from any byte source
pub fn parse_reader<R: Read>(reader: R, options: &ParseOptions) -> Result<NginxConfig> {
    let source = read_source(reader)?;
    Ok(parse_with(&source, options)?)
}

/// Parse a config file
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<NginxConfig> {
    let source = std::fs::read_to_string(path)?;
    Ok(parse_with(&source, options)?)
}
