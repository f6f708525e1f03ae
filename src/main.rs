use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qparse::{
    display_error,
    lexer::lexer::tokenize_with_trivia,
    modules::{check_imports, DirectoryResolver},
    parse_units, ParseMode, ParseOptions, SourceUnit,
};

/// Parse Q scripts and report their diagnostics.
#[derive(Debug, Parser)]
#[command(name = "qparse")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Source files to parse
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Print the parsed statements
    #[arg(long)]
    dump_ast: bool,

    /// Print the token stream
    #[arg(long)]
    dump_tokens: bool,

    /// Stop each file at its first diagnostic
    #[arg(long)]
    fail_fast: bool,

    /// Directory searched for imported modules; enables import checking
    #[arg(long = "search-path", value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut failed = false;
    let mut units = vec![];

    for path in &cli.files {
        match fs::read_to_string(path) {
            Ok(source) => units.push(SourceUnit::new(path.to_string_lossy(), source)),
            Err(error) => {
                eprintln!("Error: could not read {}: {}", path.display(), error);
                failed = true;
            }
        }
    }

    let options = ParseOptions {
        mode: if cli.fail_fast {
            ParseMode::FailFast
        } else {
            ParseMode::Batch
        },
        cancel: None,
    };
    let resolver = (!cli.search_paths.is_empty())
        .then(|| DirectoryResolver::new(cli.search_paths.clone()));

    info!(files = units.len(), "parsing");
    let results = parse_units(units.clone(), &options);

    for (unit, result) in units.iter().zip(results) {
        if cli.dump_tokens {
            if let Ok(lexed) = tokenize_with_trivia(&unit.source, Some(unit.name.clone())) {
                for token in &lexed.tokens {
                    println!("{}", token.debug());
                }
            }
        }

        let parsed = match result {
            Ok(parsed) => parsed,
            Err(error) => {
                display_error(&error, &unit.source, &unit.name);
                failed = true;
                continue;
            }
        };

        if cli.dump_ast {
            for stmt in parsed.script.iter() {
                println!("{}", stmt);
            }
        }

        let mut diagnostics = parsed.diagnostics;
        if let Some(resolver) = &resolver {
            diagnostics.extend(check_imports(&parsed.script, resolver));
        }

        debug!(file = %parsed.file, diagnostics = diagnostics.len(), "checked unit");

        for error in &diagnostics {
            display_error(error, &unit.source, &unit.name);
        }
        failed |= !diagnostics.is_empty();
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
