//! CLI command implementations.

use std::fs;

use lingo_common::{Datum, ScriptLibrary};
use lingo_vm::{LingoVM, LogTrace, VmConfig};

/// Check a library and print a summary of its scripts.
pub fn assemble(args: &[String]) -> Result<(), i32> {
    let Some(input) = args.first() else {
        eprintln!("error: assemble requires an input file");
        eprintln!("Usage: lingo assemble <input.lasm>");
        return Err(1);
    };
    let library = read_library(input)?;

    let handlers: usize = library.scripts.iter().map(|s| s.handlers.len()).sum();
    let bytes: usize = library
        .scripts
        .iter()
        .flat_map(|s| &s.handlers)
        .map(|h| h.bytecode_len())
        .sum();
    println!("OK: {input}");
    println!(
        "library {} {:?} (version {}): {} scripts, {handlers} handlers, {bytes} bytes",
        library.number,
        library.name,
        library.dir_version,
        library.scripts.len()
    );
    for script in &library.scripts {
        let names: Vec<String> = script
            .handlers
            .iter()
            .map(|h| library.names.name_or_placeholder(h.name_id))
            .collect();
        let label = if script.name.is_empty() {
            String::new()
        } else {
            format!(" {:?}", script.name)
        };
        println!(
            "  script {} {}{label}: {}",
            script.member,
            script.kind.name(),
            names.join(", ")
        );
    }
    Ok(())
}

/// Print the annotated listing of a library.
pub fn list(args: &[String]) -> Result<(), i32> {
    let Some(input) = args.first() else {
        eprintln!("error: list requires an input file");
        eprintln!("Usage: lingo list <input.lasm>");
        return Err(1);
    };
    let library = read_library(input)?;
    print!("{}", lingo_assembler::listing(&library));
    Ok(())
}

/// Load a library as the movie and call one handler.
pub fn run(args: &[String]) -> Result<(), i32> {
    let positional: Vec<&String> = args.iter().filter(|a| *a != "--trace").collect();
    let trace = positional.len() != args.len();
    let (Some(input), Some(handler)) = (positional.first(), positional.get(1)) else {
        eprintln!("error: run requires an input file and a handler name");
        eprintln!("Usage: lingo run <input.lasm> <handler> [args] [--trace]");
        return Err(1);
    };
    let library = read_library(input)?;
    let call_args: Vec<Datum> = positional[2..].iter().map(|a| parse_arg(a)).collect();

    let mut vm = LingoVM::with_config(VmConfig::from_env());
    vm.set_movie(library);
    if trace {
        vm.set_trace_listener(Some(Box::new(LogTrace)));
    }
    if vm.find_handler(handler).is_none() && !vm.has_builtin(handler) {
        eprintln!("error: no handler named '{handler}' in {input}");
        return Err(1);
    }

    tracing::debug!(target: "lingo::cli", "calling {handler} with {} args", call_args.len());
    match vm.call_handler(handler, &call_args) {
        Ok(_) if vm.error_state() => {
            eprintln!("runtime error: {handler} stopped after a script error");
            Err(3)
        }
        Ok(value) => {
            println!("{value}");
            Ok(())
        }
        Err(e) => {
            eprintln!("runtime error: {e}");
            Err(3)
        }
    }
}

/// Read and assemble a library file, reporting failures as exit code 1.
fn read_library(path: &str) -> Result<ScriptLibrary, i32> {
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;
    lingo_assembler::assemble(&text).map_err(|e| {
        eprintln!("error: {path}: {e}");
        1
    })
}

/// A command-line argument as a datum: `#name` is a symbol, numbers parse
/// as integers or floats, and anything else is a string with surrounding
/// quotes removed.
fn parse_arg(arg: &str) -> Datum {
    if let Some(name) = arg.strip_prefix('#') {
        return Datum::symbol(name);
    }
    if let Ok(n) = arg.parse::<i32>() {
        return Datum::Int(n);
    }
    if let Ok(f) = arg.parse::<f64>() {
        return Datum::Float(f);
    }
    let unquoted = arg
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(arg);
    Datum::string(unquoted)
}
