//! Directive tree produced by the parser and consumed by the builder

use serde::{Deserialize, Serialize};

/// Parsed nginx configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NginxConfig {
    pub nodes: Vec<Node>,
}

/// A tree node: directive or comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Directive(Directive),
    Comment(Comment),
}

/// A nginx directive (simple or block)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    pub args: Vec<Argument>,
    pub line: usize,
    /// Present iff the directive opens a block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Vec<Node>>,
}

/// A comment; `text` is everything after the `#`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub line: usize,
}

/// Directive argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argument {
    pub value: String,
    /// Written as a quoted string in the source
    #[serde(default)]
    pub quoted: bool,
}

impl Argument {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
        }
    }

    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for Argument {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for Argument {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl Directive {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            line,
            block: None,
        }
    }

    pub fn with_args<A: Into<Argument>>(mut self, args: impl IntoIterator<Item = A>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_block(mut self, block: Vec<Node>) -> Self {
        self.block = Some(block);
        self
    }

    /// Check if this is a block directive
    pub fn is_block(&self) -> bool {
        self.block.is_some()
    }

    /// Get the first argument
    pub fn first_arg(&self) -> Option<&str> {
        self.arg(0)
    }

    /// Get argument at index
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(Argument::as_str)
    }

    /// Check if directive has a specific argument
    pub fn has_arg(&self, value: &str) -> bool {
        self.args.iter().any(|a| a == value)
    }

    /// Get block children, comments included
    pub fn children(&self) -> &[Node] {
        self.block.as_deref().unwrap_or(&[])
    }

    /// Child directives, skipping comments
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        directives_in(self.children())
    }

    /// Find child directive by name
    pub fn find_directive(&self, name: &str) -> Option<&Directive> {
        self.directives().find(|d| d.name == name)
    }

    /// Find all child directives by name
    pub fn find_all_directives(&self, name: &str) -> Vec<&Directive> {
        self.directives().filter(|d| d.name == name).collect()
    }

    fn equivalent(&self, other: &Directive) -> bool {
        self.name == other.name
            && self.args.len() == other.args.len()
            && self.args.iter().zip(&other.args).all(|(a, b)| a.value == b.value)
            && match (&self.block, &other.block) {
                (Some(a), Some(b)) => nodes_equivalent(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl Comment {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }
}

impl Node {
    pub fn as_directive(&self) -> Option<&Directive> {
        match self {
            Self::Directive(d) => Some(d),
            Self::Comment(_) => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Self::Comment(c) => Some(c),
            Self::Directive(_) => None,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Directive(d) => d.line,
            Self::Comment(c) => c.line,
        }
    }

    /// Same kinds, names, argument values, comment text, nesting and order.
    /// Line numbers and argument quoting are ignored.
    pub fn equivalent(&self, other: &Node) -> bool {
        match (self, other) {
            (Self::Directive(a), Self::Directive(b)) => a.equivalent(b),
            (Self::Comment(a), Self::Comment(b)) => a.text == b.text,
            _ => false,
        }
    }
}

impl From<Directive> for Node {
    fn from(directive: Directive) -> Self {
        Self::Directive(directive)
    }
}

impl From<Comment> for Node {
    fn from(comment: Comment) -> Self {
        Self::Comment(comment)
    }
}

impl NginxConfig {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level directives, skipping comments
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        directives_in(&self.nodes)
    }

    /// Find top-level directive by name
    pub fn find_directive(&self, name: &str) -> Option<&Directive> {
        self.directives().find(|d| d.name == name)
    }

    /// Every directive in the tree, depth-first in source order, with its nesting depth
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(self.nodes.iter(), 0)],
        }
    }

    /// Structural equality ignoring line numbers and argument quoting
    pub fn equivalent(&self, other: &NginxConfig) -> bool {
        nodes_equivalent(&self.nodes, &other.nodes)
    }
}

fn directives_in(nodes: &[Node]) -> impl Iterator<Item = &Directive> {
    nodes.iter().filter_map(Node::as_directive)
}

fn nodes_equivalent(a: &[Node], b: &[Node]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equivalent(y))
}

/// Depth-first directive iterator returned by [`NginxConfig::walk`]
pub struct Walk<'a> {
    stack: Vec<(std::slice::Iter<'a, Node>, usize)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (&'a Directive, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (iter, depth) = self.stack.last_mut()?;
            let depth = *depth;
            match iter.next() {
                Some(Node::Directive(d)) => {
                    if let Some(block) = &d.block {
                        self.stack.push((block.iter(), depth + 1));
                    }
                    return Some((d, depth));
                }
                Some(Node::Comment(_)) => continue,
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NginxConfig {
        NginxConfig::new(vec![
            Comment::new(" top", 1).into(),
            Directive::new("http", 2)
                .with_block(vec![
                    Directive::new("server", 3)
                        .with_block(vec![
                            Directive::new("listen", 4).with_args(["80"]).into(),
                            Directive::new("listen", 5).with_args(["443", "ssl"]).into(),
                        ])
                        .into(),
                    Comment::new("inner", 7).into(),
                ])
                .into(),
            Directive::new("user", 9).with_args(["nobody"]).into(),
        ])
    }

    #[test]
    fn test_directive_queries() {
        let config = sample();
        assert!(!config.is_empty());
        assert!(NginxConfig::default().is_empty());

        let http = config.find_directive("http").unwrap();
        assert!(http.is_block());
        assert_eq!(http.children().len(), 2);

        let server = http.find_directive("server").unwrap();
        let listens = server.find_all_directives("listen");
        assert_eq!(listens.len(), 2);
        assert_eq!(listens[1].first_arg(), Some("443"));
        assert_eq!(listens[1].arg(1), Some("ssl"));
        assert!(listens[1].has_arg("ssl"));
        assert!(!listens[0].has_arg("ssl"));
        assert!(!listens[0].is_block());
        assert!(listens[0].children().is_empty());
    }

    #[test]
    fn test_walk_depth_first() {
        let config = sample();
        let walked: Vec<_> = config.walk().map(|(d, depth)| (d.name.as_str(), depth)).collect();
        assert_eq!(
            walked,
            vec![("http", 0), ("server", 1), ("listen", 2), ("listen", 2), ("user", 0)]
        );
    }

    #[test]
    fn test_equivalent_ignores_lines_and_quoting() {
        let a = NginxConfig::new(vec![Directive::new("root", 1).with_args(["/srv"]).into()]);
        let b = NginxConfig::new(vec![Directive::new("root", 7)
            .with_args([Argument::quoted("/srv")])
            .into()]);
        assert!(a.equivalent(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_equivalent_distinguishes_block_from_simple() {
        let simple = NginxConfig::new(vec![Directive::new("events", 1).into()]);
        let block = NginxConfig::new(vec![Directive::new("events", 1).with_block(vec![]).into()]);
        assert!(!simple.equivalent(&block));
    }

    #[test]
    fn test_serde_shape() {
        let config = NginxConfig::new(vec![
            Directive::new("listen", 1).with_args(["80"]).into(),
            Comment::new("note", 2).into(),
        ]);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["nodes"][0]["type"], "directive");
        assert_eq!(json["nodes"][0]["name"], "listen");
        assert_eq!(json["nodes"][0]["args"][0]["value"], "80");
        assert!(json["nodes"][0].get("block").is_none());
        assert_eq!(json["nodes"][1]["type"], "comment");
        assert_eq!(json["nodes"][1]["text"], "note");

        let back: NginxConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
