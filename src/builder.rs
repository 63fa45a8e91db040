//! nginx configuration text generation

use crate::ast::{Argument, Directive, NginxConfig, Node};
use crate::escape::{enquote, needs_quotes};

/// Options for building config text
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Indent string per nesting level (default: 4 spaces)
    pub indent: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
        }
    }
}

impl BuildOptions {
    pub fn spaces(width: usize) -> Self {
        Self {
            indent: " ".repeat(width),
        }
    }

    pub fn tabs() -> Self {
        Self {
            indent: "\t".to_string(),
        }
    }
}

/// Serializes a directive tree back into nginx syntax
pub struct Builder {
    options: BuildOptions,
}

/// Build config text with default options
pub fn build(config: &NginxConfig) -> String {
    Builder::default().build(config)
}

impl Builder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn build(&self, config: &NginxConfig) -> String {
        let mut output = String::new();
        self.emit_nodes(&mut output, &config.nodes, 0);
        output
    }

    fn emit_nodes(&self, output: &mut String, nodes: &[Node], depth: usize) {
        for node in nodes {
            match node {
                Node::Comment(comment) => self.emit_comment(output, &comment.text, depth),
                Node::Directive(directive) => {
                    self.push_indent(output, depth);
                    self.emit_directive(output, directive, depth);
                }
            }
        }
    }

    /// Comment text is written raw, one `#` line per line of text.
    ///
    /// Text containing newlines re-parses as several comments, and a `\r`
    /// ending a line is dropped by the lexer.
    fn emit_comment(&self, output: &mut String, text: &str, depth: usize) {
        for line in text.split('\n') {
            self.push_indent(output, depth);
            output.push('#');
            output.push_str(line);
            output.push('\n');
        }
    }

    fn push_indent(&self, output: &mut String, depth: usize) {
        for _ in 0..depth {
            output.push_str(&self.options.indent);
        }
    }

    fn emit_directive(&self, output: &mut String, directive: &Directive, depth: usize) {
        output.push_str(&render_word(&directive.name, false));
        for arg in &directive.args {
            output.push(' ');
            output.push_str(&render_arg(arg));
        }

        match &directive.block {
            None => output.push_str(";\n"),
            Some(children) => {
                output.push_str(" {\n");
                self.emit_nodes(output, children, depth + 1);
                self.push_indent(output, depth);
                output.push_str("}\n");
            }
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new(BuildOptions::default())
    }
}

fn render_arg(arg: &Argument) -> String {
    render_word(&arg.value, arg.quoted)
}

fn render_word(value: &str, quoted: bool) -> String {
    if quoted || needs_quotes(value) {
        enquote(value)
    } else {
        value.to_string()
    }
}
