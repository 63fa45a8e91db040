//! nginx configuration lexer
//!
//! The lexer is pull-based: [`Lexer`] produces one [`Token`] per call to `next`
//! and keeps only the unread remainder of the source and the current line.

use crate::escape::{is_space, is_structural, push_escaped};
use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, one_of},
    combinator::map,
    error::ErrorKind,
    sequence::preceded,
    IResult,
};
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;
use thiserror::Error;

/// Token types for nginx config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Bare or quoted word (directive name or argument)
    Word,
    /// Comment text after the `#`
    Comment,
    /// Open brace {
    OpenBrace,
    /// Close brace }
    CloseBrace,
    /// Semicolon ;
    Semicolon,
}

/// A lexed token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Decoded text: quotes stripped, quote and backslash escapes collapsed
    pub value: String,
    /// Line on which the token begins (1-based)
    pub line: usize,
    /// The token was delimited by a leading quote
    pub is_quoted: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated quote starting at line {line}")]
    UnterminatedQuote { line: usize },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            Self::UnterminatedQuote { line } => *line,
        }
    }
}

/// Lazy token stream over nginx configuration source
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    remaining: &'a str,
    line: usize,
    done: bool,
}

/// Start lexing `source`; tokens are produced on demand
pub fn lex(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

/// Tokenize nginx configuration
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    lex(source).collect()
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            remaining: source,
            line: 1,
            done: false,
        }
    }

    fn advance(&mut self, rest: &'a str) {
        let consumed = &self.remaining[..self.remaining.len() - rest.len()];
        self.line += consumed.matches('\n').count();
        self.remaining = rest;
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        if let Ok((rest, _)) = whitespace(self.remaining) {
            self.advance(rest);
        }

        if self.remaining.is_empty() {
            return Ok(None);
        }

        let line = self.line;
        // Words accept any leading character, so only an open quote can fail here
        let (rest, lexeme) =
            lexeme(self.remaining).map_err(|_| LexError::UnterminatedQuote { line })?;
        self.advance(rest);

        let (kind, value, is_quoted) = match lexeme {
            Lexeme::Comment(text) => (TokenKind::Comment, text, false),
            Lexeme::Structural(c) => {
                let kind = match c {
                    '{' => TokenKind::OpenBrace,
                    '}' => TokenKind::CloseBrace,
                    _ => TokenKind::Semicolon,
                };
                (kind, c.to_string(), false)
            }
            Lexeme::Quoted(value) => (TokenKind::Word, value, true),
            Lexeme::Word(value) => (TokenKind::Word, value, false),
        };

        Ok(Some(Token {
            kind,
            value,
            line,
            is_quoted,
        }))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Lexer<'_> {}

enum Lexeme {
    Comment(String),
    Structural(char),
    Quoted(String),
    Word(String),
}

/// Accumulation state for a word or quoted string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InWord,
    InQuote(char),
}

impl State {
    fn delimiter(self) -> Option<char> {
        match self {
            Self::InWord => None,
            Self::InQuote(delim) => Some(delim),
        }
    }
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(is_space)(input)
}

fn lexeme(input: &str) -> IResult<&str, Lexeme> {
    alt((
        map(comment, |text| Lexeme::Comment(text.to_string())),
        map(one_of("{};"), Lexeme::Structural),
        map(quoted, Lexeme::Quoted),
        map(word, Lexeme::Word),
    ))(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    let (rest, text) = preceded(char('#'), take_while(|c: char| c != '\n'))(input)?;
    Ok((rest, text.strip_suffix('\r').unwrap_or(text)))
}

fn quoted(input: &str) -> IResult<&str, String> {
    let (rest, delim) = one_of("\"'")(input)?;
    literal(rest, State::InQuote(delim))
}

fn word(input: &str) -> IResult<&str, String> {
    let (rest, value) = literal(input, State::InWord)?;
    if rest.len() == input.len() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::TakeWhile1,
        )));
    }
    Ok((rest, value))
}

fn literal(input: &str, state: State) -> IResult<&str, String> {
    let quote = state.delimiter();
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();
    // The last character pushed came from a backslash pair
    let mut after_escape = false;

    while let Some((i, c)) = chars.next() {
        let escaped = std::mem::replace(&mut after_escape, false);
        match c {
            '\\' => match chars.next() {
                Some((_, next)) => {
                    push_escaped(&mut value, next, quote);
                    after_escape = true;
                }
                None if state == State::InWord => value.push('\\'),
                None => break,
            },
            c if Some(c) == quote => return Ok((&input[i + c.len_utf8()..], value)),
            '{' if state == State::InWord && !escaped && value.ends_with('$') => {
                // ${var} stays inside the word
                value.push(c);
                while let Some(&(_, next)) = chars.peek() {
                    if is_space(next) {
                        break;
                    }
                    value.push(next);
                    chars.next();
                    if next == '}' {
                        break;
                    }
                }
            }
            c if state == State::InWord && (is_space(c) || is_structural(c)) => {
                return Ok((&input[i..], value));
            }
            c => value.push(c),
        }
    }

    match state {
        State::InWord => Ok(("", value)),
        State::InQuote(_) => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::Char,
        ))),
    }
}
