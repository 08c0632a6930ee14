//! cxc CLI
//!
//! Inspects, loads and indexes AST files.

use std::path::PathBuf;

use cx_serialization::SerializationError;
use cxc::commands::{build_index, dump_decls, module_info};

fn main() {
    cxc::init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "module-info" => {
            if args.len() < 3 {
                eprintln!("Usage: cxc module-info <file>");
                std::process::exit(1);
            }
            match module_info(args[2].as_ref()) {
                Ok(info) => println!("{info}"),
                Err(e) => fail(&e, &args[2]),
            }
        }
        "dump-decls" => {
            let mut file = None;
            let mut deps = Vec::new();
            let mut in_deps = false;
            for arg in args.iter().skip(2) {
                if arg == "--deps" {
                    in_deps = true;
                } else if let Some(list) = arg.strip_prefix("--deps=") {
                    deps.extend(list.split(',').filter(|s| !s.is_empty()).map(PathBuf::from));
                } else if in_deps {
                    deps.push(PathBuf::from(arg));
                } else if file.is_none() {
                    file = Some(PathBuf::from(arg));
                }
            }
            let Some(file) = file else {
                eprintln!("error: missing file path");
                eprintln!("Usage: cxc dump-decls <file> [--deps <file>...]");
                std::process::exit(1);
            };
            match dump_decls(&file, &deps) {
                Ok(out) => {
                    for warning in &out.warnings {
                        eprintln!("{warning}");
                    }
                    println!("module {}", out.module);
                    for decl in &out.decls {
                        println!("  {decl}");
                    }
                }
                Err(e) => fail(&e, &file.display().to_string()),
            }
        }
        "build-index" => {
            if args.len() < 4 {
                eprintln!("Usage: cxc build-index <out> <file>...");
                std::process::exit(1);
            }
            let out = PathBuf::from(&args[2]);
            let files: Vec<PathBuf> = args[3..].iter().map(PathBuf::from).collect();
            match build_index(&out, &files) {
                Ok(index) => println!(
                    "indexed {} modules, {} identifiers -> {}",
                    index.modules().len(),
                    index.num_identifiers(),
                    out.display()
                ),
                Err(e) => fail(&e, &args[2]),
            }
        }
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-V" => println!("cxc {}", env!("CARGO_PKG_VERSION")),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn fail(error: &SerializationError, what: &str) -> ! {
    eprintln!("{}", error.to_diagnostic(Some(what)));
    std::process::exit(1);
}

fn print_usage() {
    println!("cxc - inspect and index AST files");
    println!();
    println!("Usage: cxc <command> [options]");
    println!();
    println!("Commands:");
    println!("  module-info <file>                  Print a file's header, imports and ID counts");
    println!("  dump-decls <file> [--deps <f>...]   List a module's top-level declarations");
    println!("  build-index <out> <file>...         Write a global module index over the files");
    println!("  help                                Show this message");
    println!("  version                             Show the version");
    println!();
    println!("Set RUST_LOG (e.g. RUST_LOG=cx_serialization=debug) for tracing output;");
    println!("add CXC_LOG_TREE=1 to render it as a tree.");
}
