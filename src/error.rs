//! Error types for grammar construction, LR(k) table compilation, and the
//! LR driver. Recognizer rejection is never an error. It is a plain
//! `false` returned from `Parser::parse`.

use std::fmt;

use thiserror::Error;

use crate::symbol::Nonterminal;

/// Errors raised while building or mutating a [`crate::grammar::Grammar`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("nonterminal `{0}` already exists in this grammar")]
    DuplicateNonterminal(Nonterminal),

    #[error("name `{0}` is reserved for the augmented start symbol")]
    ReservedNameInUse(String),
}

/// A grammar is not LR(k) for the `k` the table compiler was asked to use.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LRConflict<T: fmt::Debug> {
    #[error("shift-reduce conflict on lookahead {lookahead:?} in state {state}")]
    ShiftReduce { lookahead: Vec<T>, state: String },

    #[error("reduce-reduce conflict on lookahead {lookahead:?}: `{rule_a}` vs `{rule_b}`")]
    ReduceReduce {
        lookahead: Vec<T>,
        rule_a: String,
        rule_b: String,
    },
}

/// Everything that can go wrong building an [`crate::lr::driver::LRParserConfig`]:
/// either the underlying grammar itself is malformed, or the grammar is not
/// LR(k) for the requested `k`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LRBuildError<T: fmt::Debug> {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Conflict(#[from] LRConflict<T>),
}

/// Raised by a driver's `parse` when called before `feed`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserError {
    #[error("parser has not been fed a source; call `feed` before `parse`")]
    NotInitialized,
}

pub type Result<T, E = GrammarError> = std::result::Result<T, E>;
