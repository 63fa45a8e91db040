//! nginx configuration parser
//!
//! Single forward pass over the token stream with an explicit stack of open blocks.

use crate::ast::{Argument, Comment, Directive, NginxConfig, Node};
use crate::lexer::{lex, LexError, Token, TokenKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected '}}' at line {line}")]
    UnexpectedCloseBrace { line: usize },

    #[error("unexpected end of file, expecting '}}' for block opened at line {line}")]
    UnclosedBlock { line: usize },

    #[error("unexpected end of file, expecting ';' or '{{' after directive at line {line}")]
    UnterminatedDirective { line: usize },

    #[error("unexpected '{token}' at line {line}")]
    UnexpectedTerminator { token: char, line: usize },
}

impl ParseError {
    /// Line at which the failing decision was made
    pub fn line(&self) -> usize {
        match self {
            Self::Lex(e) => e.line(),
            Self::UnexpectedCloseBrace { line }
            | Self::UnclosedBlock { line }
            | Self::UnterminatedDirective { line }
            | Self::UnexpectedTerminator { line, .. } => *line,
        }
    }
}

/// Parser options
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Keep comments in the tree
    pub comments: bool,
    /// Directive names to drop, together with their blocks
    pub ignore: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            comments: true,
            ignore: Vec::new(),
        }
    }
}

impl ParseOptions {
    fn ignores(&self, name: &str) -> bool {
        self.ignore.iter().any(|n| n == name)
    }
}

/// Parse nginx configuration source with default options
pub fn parse(source: &str) -> Result<NginxConfig, ParseError> {
    parse_with(source, &ParseOptions::default())
}

/// Parse nginx configuration source
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<NginxConfig, ParseError> {
    parse_tokens(lex(source), options)
}

/// Build a tree from any token stream
pub fn parse_tokens<I>(tokens: I, options: &ParseOptions) -> Result<NginxConfig, ParseError>
where
    I: IntoIterator<Item = Result<Token, LexError>>,
{
    let mut parser = TreeParser::new(options);
    for token in tokens {
        parser.feed(token?)?;
    }
    parser.finish()
}

/// Directive being accumulated since the last terminator
struct Pending {
    name: String,
    line: usize,
    args: Vec<Argument>,
}

/// An open block; the root frame has no directive
struct Frame {
    directive: Option<Directive>,
    nodes: Vec<Node>,
    /// Inside an ignored directive; nothing here reaches the tree
    discard: bool,
}

struct TreeParser<'o> {
    options: &'o ParseOptions,
    stack: Vec<Frame>,
    pending: Option<Pending>,
}

impl<'o> TreeParser<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            stack: vec![Frame {
                directive: None,
                nodes: Vec::new(),
                discard: false,
            }],
            pending: None,
        }
    }

    fn current(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push_node(&mut self, node: Node) {
        let frame = self.current();
        if !frame.discard {
            frame.nodes.push(node);
        }
    }

    fn take_pending(&mut self, token: &Token) -> Result<Pending, ParseError> {
        self.pending.take().ok_or(ParseError::UnexpectedTerminator {
            token: if token.kind == TokenKind::OpenBrace { '{' } else { ';' },
            line: token.line,
        })
    }

    fn feed(&mut self, token: Token) -> Result<(), ParseError> {
        match token.kind {
            TokenKind::Comment => {
                if self.options.comments {
                    self.push_node(Node::Comment(Comment::new(token.value, token.line)));
                }
            }
            TokenKind::Semicolon => {
                let pending = self.take_pending(&token)?;
                if !self.options.ignores(&pending.name) {
                    let directive = Directive::new(pending.name, pending.line).with_args(pending.args);
                    self.push_node(Node::Directive(directive));
                }
            }
            TokenKind::OpenBrace => {
                let pending = self.take_pending(&token)?;
                let discard = self.current().discard || self.options.ignores(&pending.name);
                let directive = Directive::new(pending.name, pending.line).with_args(pending.args);
                self.stack.push(Frame {
                    directive: Some(directive),
                    nodes: Vec::new(),
                    discard,
                });
            }
            TokenKind::CloseBrace => {
                if self.pending.is_some() || self.stack.len() == 1 {
                    return Err(ParseError::UnexpectedCloseBrace { line: token.line });
                }
                if let Some(Frame {
                    directive: Some(directive),
                    nodes,
                    discard,
                }) = self.stack.pop()
                {
                    if !discard {
                        self.push_node(Node::Directive(directive.with_block(nodes)));
                    }
                }
            }
            TokenKind::Word => match &mut self.pending {
                Some(pending) => pending.args.push(Argument {
                    value: token.value,
                    quoted: token.is_quoted,
                }),
                None => {
                    self.pending = Some(Pending {
                        name: token.value,
                        line: token.line,
                        args: Vec::new(),
                    })
                }
            },
        }
        Ok(())
    }

    fn finish(mut self) -> Result<NginxConfig, ParseError> {
        if let Some(pending) = &self.pending {
            return Err(ParseError::UnterminatedDirective { line: pending.line });
        }
        if let Some(directive) = self.stack.last().and_then(|f| f.directive.as_ref()) {
            return Err(ParseError::UnclosedBlock {
                line: directive.line,
            });
        }

        let nodes = self.stack.pop().map(|root| root.nodes).unwrap_or_default();
        Ok(NginxConfig { nodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_directive() {
        let config = parse("worker_processes 4;").unwrap();

        assert_eq!(config.nodes.len(), 1);
        let directive = config.nodes[0].as_directive().unwrap();
        assert_eq!(directive.name, "worker_processes");
        assert_eq!(directive.args, vec!["4"]);
        assert!(!directive.is_block());
    }

    #[test]
    fn test_parse_block() {
        let input = r#"
            server {
                listen 80;
                server_name example.com;
            }
        "#;
        let config = parse(input).unwrap();

        assert_eq!(config.nodes.len(), 1);
        let server = config.find_directive("server").unwrap();
        assert_eq!(server.line, 2);
        assert!(server.args.is_empty());

        let block = server.children();
        assert_eq!(block.len(), 2);
        assert_eq!(block[0].as_directive().unwrap().name, "listen");
        assert_eq!(block[1].as_directive().unwrap().name, "server_name");
        assert_eq!(block[1].line(), 4);
    }

    #[test]
    fn test_parse_nested_blocks() {
        let input = r#"
            http {
                server {
                    location / {
                        proxy_pass http://backend;
                    }
                }
            }
        "#;
        let config = parse(input).unwrap();

        let http = config.find_directive("http").unwrap();
        let server = http.find_directive("server").unwrap();
        let location = server.find_directive("location").unwrap();
        assert_eq!(location.args, vec!["/"]);

        let proxy_pass = location.find_directive("proxy_pass").unwrap();
        assert_eq!(proxy_pass.first_arg(), Some("http://backend"));
    }

    #[test]
    fn test_events_block() {
        let config = parse("events { worker_connections 1024; }").unwrap();

        assert_eq!(config.nodes.len(), 1);
        let events = config.nodes[0].as_directive().unwrap();
        assert_eq!(events.name, "events");
        assert!(events.args.is_empty());
        assert_eq!(events.children().len(), 1);

        let wc = events.children()[0].as_directive().unwrap();
        assert_eq!(wc.name, "worker_connections");
        assert_eq!(wc.args, vec!["1024"]);
        assert!(wc.block.is_none());
    }

    #[test]
    fn test_empty_block_has_children() {
        let config = parse("location /foo {}").unwrap();
        let location = config.find_directive("location").unwrap();
        assert_eq!(location.block, Some(vec![]));
    }

    #[test]
    fn test_comments_in_order() {
        let input = "# top\nhttp {\n    # inside\n    sendfile on; #trailing\n}\n";
        let config = parse(input).unwrap();

        assert_eq!(config.nodes[0].as_comment().unwrap().text, " top");
        let http = config.find_directive("http").unwrap();
        let texts: Vec<_> = http
            .children()
            .iter()
            .map(|n| match n {
                Node::Comment(c) => format!("#{}@{}", c.text, c.line),
                Node::Directive(d) => format!("{}@{}", d.name, d.line),
            })
            .collect();
        assert_eq!(texts, vec!["# inside@3", "sendfile@4", "#trailing@4"]);
    }

    #[test]
    fn test_comments_dont_affect_structure() {
        let config = parse("http { # }\n}\n").unwrap();
        let http = config.find_directive("http").unwrap();
        assert_eq!(http.children().len(), 1);
    }

    #[test]
    fn test_comments_can_be_dropped() {
        let options = ParseOptions {
            comments: false,
            ..Default::default()
        };
        let config = parse_with("# a\nuser nobody; # b\n", &options).unwrap();
        assert_eq!(config.nodes.len(), 1);
        assert!(config.nodes[0].as_directive().is_some());
    }

    #[test]
    fn test_ignored_directives() {
        let options = ParseOptions {
            ignore: vec!["server".to_string(), "user".to_string()],
            ..Default::default()
        };
        let input = "user nobody;\nhttp {\n    server {\n        location / { return 200; }\n    }\n    gzip on;\n}\n";
        let config = parse_with(input, &options).unwrap();

        assert_eq!(config.nodes.len(), 1);
        let http = config.find_directive("http").unwrap();
        assert_eq!(http.children().len(), 1);
        assert_eq!(http.children()[0].as_directive().unwrap().name, "gzip");
    }

    #[test]
    fn test_quoted_flag_is_kept() {
        let config = parse(r#"return 200 "ok";"#).unwrap();
        let ret = config.find_directive("return").unwrap();
        assert!(!ret.args[0].quoted);
        assert!(ret.args[1].quoted);
    }

    #[test]
    fn test_quoted_braces_do_not_open_blocks() {
        let input = "http {\n    log_format main '{ \"x\": 1 }';\n}\n";
        let config = parse(input).unwrap();
        let http = config.find_directive("http").unwrap();
        let log_format = http.find_directive("log_format").unwrap();
        assert_eq!(log_format.args, vec!["main", r#"{ "x": 1 }"#]);
        assert!(!log_format.is_block());
    }

    #[test]
    fn test_extra_close_brace() {
        let err = parse("events {\n}\n}\n").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedCloseBrace { line: 3 });
    }

    #[test]
    fn test_close_brace_mid_directive() {
        let err = parse("http {\n    sendfile on\n}\n").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedCloseBrace { line: 3 });
    }

    #[test]
    fn test_missing_close_brace() {
        let err = parse("http {\n    server {\n        listen 80;\n    }\n").unwrap_err();
        assert_eq!(err, ParseError::UnclosedBlock { line: 1 });
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_unterminated_directive() {
        let err = parse("user nobody;\nworker_processes 4\n").unwrap_err();
        assert_eq!(err, ParseError::UnterminatedDirective { line: 2 });
    }

    #[test]
    fn test_terminator_without_name() {
        assert_eq!(
            parse("user nobody;;").unwrap_err(),
            ParseError::UnexpectedTerminator { token: ';', line: 1 }
        );
        assert_eq!(
            parse("\n{ }").unwrap_err(),
            ParseError::UnexpectedTerminator { token: '{', line: 2 }
        );
    }

    #[test]
    fn test_lex_error_is_propagated() {
        let err = parse("root '/srv;\n").unwrap_err();
        assert_eq!(err, ParseError::Lex(LexError::UnterminatedQuote { line: 1 }));
        assert_eq!(err.to_string(), "unterminated quote starting at line 1");
    }

    #[test]
    fn test_parse_tokens_from_vec() {
        let tokens = crate::lexer::tokenize("a b;").unwrap();
        let config = parse_tokens(tokens.into_iter().map(Ok), &ParseOptions::default()).unwrap();
        assert_eq!(config.find_directive("a").unwrap().args, vec!["b"]);
    }
}
