//! Lingo CLI: assemble, list and run handler libraries.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input or assembly error
//! - 3: Runtime error

mod commands;

use std::process;

use tracing_subscriber::EnvFilter;

/// Filter variable checked before `RUST_LOG`.
const LOG_ENV: &str = "LINGO_LOG";

/// Used when neither variable holds a valid filter. `put` output stays
/// visible.
const DEFAULT_FILTER: &str = "warn,lingo::put=info";

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    init_logging(args.iter().any(|a| a == "--trace"));

    let result = match args[1].as_str() {
        "assemble" => commands::assemble(&args[2..]),
        "list" => commands::list(&args[2..]),
        "run" => commands::run(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

/// Install a stderr subscriber filtered by `LINGO_LOG`, then `RUST_LOG`.
/// `trace` adds the per-instruction trace target.
fn init_logging(trace: bool) {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .and_then(|expr| EnvFilter::try_new(expr).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));
    let filter = match (trace, "lingo::trace=debug".parse()) {
        (true, Ok(directive)) => filter.add_directive(directive),
        _ => filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn print_usage() {
    eprintln!("Usage: lingo <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  assemble <input.lasm>                          Check a library and summarize it");
    eprintln!("  list <input.lasm>                              Print the annotated listing");
    eprintln!("  run <input.lasm> <handler> [args] [--trace]    Call a handler and print its result");
    eprintln!();
    eprintln!("Arguments to run are integers, floats, \"strings\" or #symbols.");
    eprintln!("Environment: LINGO_LOG (log filter), LINGO_STEP_LIMIT (instructions per call).");
}
