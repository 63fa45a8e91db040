use clap::Parser;
use colored::*;
use nginx_crossplane::cli::{Cli, ColorChoice, Commands, FormatArgs, LexArgs, ParseArgs};
use nginx_crossplane::{parse_file, read_source, tokenize, Builder, Token};
use std::fs;
use std::process;

fn main() {
    let cli = Cli::parse();

    // Set up color output
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {}
    }

    let result = match cli.command {
        Commands::Lex(args) => run_lex(args),
        Commands::Parse(args) => run_parse(args, cli.verbose),
        Commands::Format(args) => run_format(args, cli.verbose, cli.quiet),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }
}

fn run_lex(args: LexArgs) -> Result<(), String> {
    let file = fs::File::open(&args.input)
        .map_err(|e| format!("Failed to open {}: {}", args.input.display(), e))?;
    let source = read_source(file).map_err(|e| e.to_string())?;
    let tokens = tokenize(&source)
        .map_err(|e| format!("{}: {}", args.input.display(), e))?;

    if args.json {
        let json = serde_json::to_string(&tokens).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        for token in &tokens {
            print_token(token);
        }
    }

    Ok(())
}

fn print_token(token: &Token) {
    let marker = if token.is_quoted { "q" } else { " " };
    println!(
        "{:>5} {} {:<11} {:?}",
        token.line.to_string().dimmed(),
        marker.cyan(),
        format!("{:?}", token.kind),
        token.value
    );
}

fn run_parse(args: ParseArgs, verbose: u8) -> Result<(), String> {
    let config = parse_file(&args.input, &args.parse_options())
        .map_err(|e| format!("{}: {}", args.input.display(), e))?;

    if verbose > 0 {
        eprintln!(
            "{}: parsed {} ({} directives)",
            "info".blue(),
            args.input.display(),
            config.walk().count()
        );
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&config)
    } else {
        serde_json::to_string(&config)
    }
    .map_err(|e| e.to_string())?;
    println!("{}", json);

    Ok(())
}

fn run_format(args: FormatArgs, verbose: u8, quiet: bool) -> Result<(), String> {
    let config = parse_file(&args.input, &Default::default())
        .map_err(|e| format!("{}: {}", args.input.display(), e))?;

    if verbose > 0 {
        eprintln!(
            "{}: parsed {} ({} top-level nodes)",
            "info".blue(),
            args.input.display(),
            config.nodes.len()
        );
    }

    if config.is_empty() && !quiet {
        eprintln!(
            "{}: {} contains no directives or comments",
            "warning".yellow(),
            args.input.display()
        );
    }

    let output = Builder::new(args.build_options()).build(&config);

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output).map_err(|e| format!("Failed to write output: {}", e))?;
        if !quiet {
            eprintln!(
                "{} Wrote {}",
                "Success:".green().bold(),
                output_path.display()
            );
        }
    } else {
        print!("{}", output);
    }

    Ok(())
}
