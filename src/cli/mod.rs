//! CLI argument definitions

use crate::builder::BuildOptions;
use crate::parser::ParseOptions;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Lex, parse and rebuild nginx configuration files
#[derive(Parser)]
#[command(name = "crossplane")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the token stream of a config file
    Lex(LexArgs),

    /// Parse a config file and print the directive tree as JSON
    Parse(ParseArgs),

    /// Parse a config file and rebuild it with normalized formatting
    Format(FormatArgs),
}

#[derive(clap::Args)]
pub struct LexArgs {
    /// Input file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct ParseArgs {
    /// Input file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Drop comments from the tree
    #[arg(long)]
    pub no_comments: bool,

    /// Directive to drop along with its block (can be repeated)
    #[arg(long = "ignore", value_name = "NAME")]
    pub ignore: Vec<String>,

    /// Pretty-print the JSON
    #[arg(long)]
    pub pretty: bool,
}

impl ParseArgs {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            comments: !self.no_comments,
            ignore: self.ignore.clone(),
        }
    }
}

#[derive(clap::Args)]
pub struct FormatArgs {
    /// Input file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Spaces per indentation level
    #[arg(long, default_value = "4", conflicts_with = "tabs")]
    pub indent: usize,

    /// Indent with tabs
    #[arg(long)]
    pub tabs: bool,
}

impl FormatArgs {
    pub fn build_options(&self) -> BuildOptions {
        if self.tabs {
            BuildOptions::tabs()
        } else {
            BuildOptions::spaces(self.indent)
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "crossplane",
            "parse",
            "nginx.conf",
            "--no-comments",
            "--ignore",
            "include",
            "--ignore",
            "ssl_certificate",
        ])
        .unwrap();

        match cli.command {
            Commands::Parse(args) => {
                let options = args.parse_options();
                assert!(!options.comments);
                assert_eq!(options.ignore, vec!["include", "ssl_certificate"]);
            }
            _ => panic!("expected parse subcommand"),
        }
    }

    #[test]
    fn test_format_args() {
        let cli = Cli::try_parse_from(["crossplane", "-v", "format", "nginx.conf", "--tabs"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Format(args) => assert_eq!(args.build_options().indent, "\t"),
            _ => panic!("expected format subcommand"),
        }

        let cli = Cli::try_parse_from(["crossplane", "format", "nginx.conf", "--indent", "2"]).unwrap();
        match cli.command {
            Commands::Format(args) => assert_eq!(args.build_options().indent, "  "),
            _ => panic!("expected format subcommand"),
        }
    }

    #[test]
    fn test_indent_conflicts_with_tabs() {
        let result =
            Cli::try_parse_from(["crossplane", "format", "nginx.conf", "--indent", "2", "--tabs"]);
        assert!(result.is_err());
    }
}
