//! CLI module for the grammar parser demo binary.
//!
//! This is plumbing, not the library's tested surface: it reads a small ad
//! hoc grammar notation (not the full BNF metagrammar a real front end
//! would accept) and a line of whitespace-separated tokens per input line,
//! selects LR(k) when the grammar compiles without conflict and falls back
//! to Earley otherwise, and prints `yes`/`no`.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use thiserror::Error;

use crate::earley::{EarleyParser, EarleyParserConfig};
use crate::error::{GrammarError, LRBuildError};
use crate::grammar::Grammar;
use crate::lr::driver::{LRParser, LRParserConfig};
use crate::symbol::{Symbol, Terminal};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("could not read grammar file {path:?}: {source}")]
    ReadGrammar {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed grammar line: {0:?}")]
    MalformedLine(String),

    #[error("grammar has no rules")]
    EmptyGrammar,

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub const EOF_TOKEN: &str = "$";

/// Parses the ad hoc notation: one `LHS -> alt1 tok tok | alt2` line per
/// rule. A token starting with an uppercase letter is a nonterminal;
/// anything else is an exact-match terminal. The first line's lhs becomes
/// the start symbol.
pub fn parse_grammar_text(text: &str) -> Result<Grammar<String>, CliError> {
    let mut grammar: Option<Grammar<String>> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (lhs_str, rhs_str) = line
            .split_once("->")
            .ok_or_else(|| CliError::MalformedLine(line.to_string()))?;
        let lhs_name = lhs_str.trim();
        if lhs_name.is_empty() {
            return Err(CliError::MalformedLine(line.to_string()));
        }

        if grammar.is_none() {
            grammar = Some(Grammar::new(lhs_name));
        }
        let g = grammar.as_mut().expect("just initialized above");
        let lhs = g.ensure_nonterminal(lhs_name);

        for alt in rhs_str.split('|') {
            let rhs = alt
                .split_whitespace()
                .map(|tok| {
                    if tok.starts_with(|c: char| c.is_uppercase()) {
                        Symbol::Nonterminal(g.ensure_nonterminal(tok))
                    } else {
                        Symbol::Terminal(Terminal::exact(tok.to_string()))
                    }
                })
                .collect();
            g.add_rule(lhs.clone(), rhs);
        }
    }

    grammar.ok_or(CliError::EmptyGrammar)
}

enum EngineConfig {
    Lr(LRParserConfig<String>),
    Earley(EarleyParserConfig<String>),
}

/// Reads a grammar file, selects an engine, then treats stdin as one
/// whitespace-tokenized line of input per query, printing `yes`/`no`.
pub fn run(grammar_path: PathBuf, k: usize) -> Result<(), CliError> {
    let text = fs::read_to_string(&grammar_path).map_err(|source| CliError::ReadGrammar {
        path: grammar_path.clone(),
        source,
    })?;
    let grammar = parse_grammar_text(&text)?;

    let (engine_config, label) = match LRParserConfig::new(grammar.clone(), EOF_TOKEN.to_string(), k) {
        Ok(config) => (EngineConfig::Lr(config), format!("LR({k})")),
        Err(LRBuildError::Grammar(e)) => return Err(e.into()),
        Err(LRBuildError::Conflict(conflict)) => {
            eprintln!("grammar is not LR({k}) ({conflict}); falling back to Earley");
            (
                EngineConfig::Earley(EarleyParserConfig::new(grammar)?),
                "Earley".to_string(),
            )
        }
    };
    println!("using {label} engine");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let tokens: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
        let accepted = match &engine_config {
            EngineConfig::Lr(config) => {
                let mut parser = LRParser::new(config);
                parser.feed(tokens);
                parser.parse().unwrap_or(false)
            }
            EngineConfig::Earley(config) => {
                let mut parser = EarleyParser::new(config);
                parser.feed(tokens);
                parser.parse().unwrap_or(false)
            }
        };
        println!("{}", if accepted { "yes" } else { "no" });
        io::stdout().flush()?;
    }

    Ok(())
}
