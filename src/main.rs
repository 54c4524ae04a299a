//! Context-Free Grammar Parser
//!
//! A Rust library for constructing recognizers from context-free grammars
//! over an arbitrary token type: a general Earley chart recognizer, and a
//! deterministic canonical LR(k) recognizer.
//!
//! This binary is a thin demo front end, not the library's tested surface:
//! it reads a grammar file in a small ad hoc notation and lines of
//! whitespace-separated tokens from stdin, and prints `yes`/`no` per line.
//!
//! # Author
//! Juan Manuel Young Hoyos
//!
//! # References
//! Aho, Alfred V. et al. "Compilers: Principles, Techniques, and Tools" (2nd Edition).
//! Addison-Wesley, 2006.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use cfg_parser::cli;

/// Recognize a line of tokens against a context-free grammar.
#[derive(Parser, Debug)]
#[command(name = "cfg_parser", version, about)]
struct Args {
    /// Path to a grammar file in the `LHS -> alt1 tok | alt2` notation.
    grammar: PathBuf,

    /// Lookahead depth for both FIRST_k and the LR(k) tables.
    #[arg(short = 'k', long, default_value_t = 1)]
    k: usize,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = cli::run(args.grammar, args.k) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
