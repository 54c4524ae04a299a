//! Symbol types for context-free grammars over an arbitrary token type `T`.
//!
//! A [`Symbol`] is either a [`Nonterminal`] or a [`Terminal`]. Terminals are
//! polymorphic: a terminal only needs to answer "does this token match me?"
//! and "what is my representative token?" (used as a hash key during LR
//! table construction), so it is modeled as a small trait object rather than
//! a closed enum, so a grammar is free to mix an exact-match terminal with a
//! custom predicate-matched one.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use smol_str::SmolStr;

/// An interned nonterminal name. Clones are cheap (`SmolStr` is a small
/// inline-or-`Rc` string), which matters because nonterminals are copied
/// into item sets and FIRST_k tables constantly during construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nonterminal(SmolStr);

impl Nonterminal {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Nonterminal(name.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<SmolStr>> From<S> for Nonterminal {
    fn from(s: S) -> Self {
        Nonterminal::new(s)
    }
}

/// Name reserved for the grammar's augmented start symbol. Attempting to
/// register a nonterminal with this name is rejected.
pub const AUGMENTED_START_NAME: &str = "__new_start__";

/// A terminal's matching behavior: does a token match, and what token
/// should represent this terminal in hash-keyed collections (item sets,
/// GOTO tables)?
pub trait TerminalKind<T>: fmt::Debug {
    fn matches(&self, token: &T) -> bool;
    fn representative_token(&self) -> T;
}

/// A terminal that matches by exact equality against a fixed token. This is
/// the "plain string terminal" variant: the common case, and the only kind
/// produced by [`crate::grammar::Grammar::split_long_terminals`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExactTerminal<T>(pub T);

impl<T> TerminalKind<T> for ExactTerminal<T>
where
    T: Clone + PartialEq + fmt::Debug,
{
    fn matches(&self, token: &T) -> bool {
        self.0 == *token
    }

    fn representative_token(&self) -> T {
        self.0.clone()
    }
}

/// A terminal that matches via a user-supplied predicate, carrying a
/// representative token so it still has a stable hash/ordering key
/// (e.g. a "digit" terminal whose representative token is `'0'`).
pub struct PredicateTerminal<T, F> {
    representative: T,
    predicate: F,
}

impl<T, F> PredicateTerminal<T, F>
where
    F: Fn(&T) -> bool,
{
    pub fn new(representative: T, predicate: F) -> Self {
        PredicateTerminal {
            representative,
            predicate,
        }
    }
}

impl<T, F> fmt::Debug for PredicateTerminal<T, F>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateTerminal")
            .field("representative", &self.representative)
            .finish()
    }
}

impl<T, F> TerminalKind<T> for PredicateTerminal<T, F>
where
    T: Clone + fmt::Debug,
    F: Fn(&T) -> bool,
{
    fn matches(&self, token: &T) -> bool {
        (self.predicate)(token)
    }

    fn representative_token(&self) -> T {
        self.representative.clone()
    }
}

/// A polymorphic terminal symbol. Equality, hashing, and ordering are all
/// defined over [`TerminalKind::representative_token`], the representative
/// token used as a hash key during LR table construction.
#[derive(Clone)]
pub struct Terminal<T>(Rc<dyn TerminalKind<T>>);

impl<T> Terminal<T> {
    pub fn new(kind: impl TerminalKind<T> + 'static) -> Self {
        Terminal(Rc::new(kind))
    }

    pub fn matches(&self, token: &T) -> bool {
        self.0.matches(token)
    }

    pub fn get_token(&self) -> T {
        self.0.representative_token()
    }
}

impl<T> Terminal<T>
where
    T: Clone + PartialEq + fmt::Debug + 'static,
{
    /// Builds the "plain string terminal" variant: matches by equality.
    pub fn exact(token: T) -> Self {
        Terminal::new(ExactTerminal(token))
    }
}

impl<T> fmt::Debug for Terminal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<T: Eq> PartialEq for Terminal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.get_token() == other.get_token()
    }
}

impl<T: Eq> Eq for Terminal<T> {}

impl<T: Hash + Eq> Hash for Terminal<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get_token().hash(state);
    }
}

impl<T: Ord> PartialOrd for Terminal<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Terminal<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.get_token().cmp(&other.get_token())
    }
}

/// A symbol appearing on the right-hand side of a rule: either a
/// nonterminal or a terminal.
#[derive(Debug, Clone)]
pub enum Symbol<T> {
    Nonterminal(Nonterminal),
    Terminal(Terminal<T>),
}

impl<T> Symbol<T> {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub const fn is_nonterminal(&self) -> bool {
        matches!(self, Symbol::Nonterminal(_))
    }

    pub fn as_nonterminal(&self) -> Option<&Nonterminal> {
        match self {
            Symbol::Nonterminal(n) => Some(n),
            Symbol::Terminal(_) => None,
        }
    }

    pub fn as_terminal(&self) -> Option<&Terminal<T>> {
        match self {
            Symbol::Terminal(t) => Some(t),
            Symbol::Nonterminal(_) => None,
        }
    }
}

impl<T: Eq> PartialEq for Symbol<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Symbol::Nonterminal(a), Symbol::Nonterminal(b)) => a == b,
            (Symbol::Terminal(a), Symbol::Terminal(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: Eq> Eq for Symbol<T> {}

impl<T: Hash + Eq> Hash for Symbol<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Symbol::Nonterminal(n) => {
                0u8.hash(state);
                n.hash(state);
            }
            Symbol::Terminal(t) => {
                1u8.hash(state);
                t.hash(state);
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for Symbol<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Nonterminal(n) => write!(f, "{}", n),
            Symbol::Terminal(t) => write!(f, "{:?}", t),
        }
    }
}

impl<T> From<Nonterminal> for Symbol<T> {
    fn from(n: Nonterminal) -> Self {
        Symbol::Nonterminal(n)
    }
}

impl<T> From<Terminal<T>> for Symbol<T> {
    fn from(t: Terminal<T>) -> Self {
        Symbol::Terminal(t)
    }
}

/// Splits a string into one exact-match `String` terminal per character,
/// the token representation used throughout this crate's character-level
/// tests and its demo CLI.
pub fn char_tokens(s: &str) -> Vec<String> {
    s.chars().map(|c| c.to_string()).collect()
}

/// Builds a single-character `Symbol::Terminal` over the `String` token
/// type, convenient for hand-writing character grammars in tests.
pub fn char_terminal(c: char) -> Symbol<String> {
    Symbol::Terminal(Terminal::exact(c.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonterminal_equality_is_by_name() {
        assert_eq!(Nonterminal::new("S"), Nonterminal::new("S"));
        assert_ne!(Nonterminal::new("S"), Nonterminal::new("A"));
    }

    #[test]
    fn exact_terminal_matches_only_its_token() {
        let t: Terminal<String> = Terminal::exact("(".to_string());
        assert!(t.matches(&"(".to_string()));
        assert!(!t.matches(&")".to_string()));
        assert_eq!(t.get_token(), "(".to_string());
    }

    #[test]
    fn terminal_equality_is_by_representative_token() {
        let a: Terminal<String> = Terminal::exact("a".to_string());
        let b: Terminal<String> = Terminal::new(PredicateTerminal::new("a".to_string(), |t: &String| t == "a"));
        assert_eq!(a, b);
    }

    #[test]
    fn char_tokens_splits_one_token_per_char() {
        assert_eq!(char_tokens("ab"), vec!["a".to_string(), "b".to_string()]);
    }
}
