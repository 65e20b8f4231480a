use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use sema::{
    analyze,
    errors::errors::{Error, ErrorHandler, ErrorTip, MAX_REPORTED_ERRORS},
    get_line, Analysis,
};

#[derive(Parser)]
#[command(name = "sema")]
#[command(version, about = "Resolve names and infer types for a source file", long_about = None)]
struct Cli {
    /// Source file to analyze
    file: PathBuf,

    /// Maximum number of errors to print
    #[arg(long, default_value_t = MAX_REPORTED_ERRORS)]
    max_errors: usize,

    /// Print the syntax tree as an S-expression
    #[arg(long)]
    dump_tree: bool,

    /// Print every declaration with its qualified name
    #[arg(long)]
    dump_names: bool,

    /// Print the inferred type of every declaration
    #[arg(long)]
    dump_types: bool,

    /// Increases the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let source = match read_to_string(&cli.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Error: failed to read {}: {}", cli.file.display(), error);
            return ExitCode::FAILURE;
        }
    };
    let file_name = cli
        .file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| cli.file.display().to_string());

    let start = Instant::now();
    let mut errors = ErrorHandler::with_limit(cli.max_errors);
    let analysis = analyze(source.clone(), Some(file_name), &mut errors);
    tracing::info!(elapsed = ?start.elapsed(), errors = errors.len(), "analysis finished");

    if let Some(analysis) = &analysis {
        if cli.dump_tree {
            println!("{}", analysis.ast.render());
        }
        if cli.dump_names {
            dump_names(analysis);
        }
        if cli.dump_types {
            dump_types(analysis);
        }
    }

    if errors.is_empty() {
        return ExitCode::SUCCESS;
    }

    for error in errors.reported() {
        display_error(error, &source, &cli.file);
    }
    if errors.omitted() > 0 {
        eprintln!("... and {} more errors", errors.omitted());
    }
    ExitCode::FAILURE
}

fn dump_names(analysis: &Analysis) {
    for node in analysis.names.all_declaration_nodes() {
        let Some(name) = analysis.names.node_to_name(*node) else {
            continue;
        };
        let location = analysis.ast.token_location(*node);
        println!("{}:{}\t{}", location.line, location.col, name);
    }
}

fn dump_types(analysis: &Analysis) {
    for node in analysis.names.all_declaration_nodes() {
        let Some(name) = analysis.names.node_to_name(*node) else {
            continue;
        };
        let rendered = analysis
            .types
            .type_of_name(name)
            .map(|ty| analysis.types.render(ty))
            .unwrap_or_else(|| String::from("?"));
        println!("{}: {}", name, rendered);
    }
}

fn display_error(error: &Error, source: &str, file: &Path) {
    /*
        Error: ScopecheckFailed (`c` is not declared in this scope or any enclosing one)
        -> test.lang:2:15
           |
         2 | const b = a + c
           | --------------^
    */

    let location = error.get_location();
    let line_str = location.line.to_string();
    let padding = line_str.len() + 2;

    if let ErrorTip::None = error.get_tip() {
        eprintln!("Error: {}", error.get_error_name());
    } else {
        eprintln!("Error: {} ({})", error.get_error_name(), error.get_tip());
    }
    eprintln!("-> {}:{}:{}", file.display(), location.line, location.col);

    let Some(line_text) = get_line(source, location.line) else {
        return;
    };

    eprintln!("{:>padding$}", "|");
    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(line_text);
    eprintln!("{} | {}", line_str, line_text_removed.trim_end());

    let arrows = (location.col as usize).saturating_sub(removed_whitespace).max(1);
    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}

fn remove_starting_whitespace(string: &str) -> (&str, usize) {
    let trimmed = string.trim_start_matches([' ', '\t']);
    (trimmed, string.len() - trimmed.len())
}
