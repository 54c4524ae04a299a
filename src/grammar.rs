//! Grammar module for context-free grammars over an arbitrary token type.
//!
//! A [`Grammar`] owns its rule set and its nonterminal name table, and knows
//! how to augment itself with a fresh start symbol and how to split
//! multi-character string terminals into single-token terminals.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use log::{debug, trace};

use crate::error::{GrammarError, Result};
use crate::symbol::{AUGMENTED_START_NAME, Nonterminal, Symbol, Terminal};

/// A production rule `lhs -> rhs`. Immutable once built; cheap to clone
/// (the right-hand side is shared via `Rc`).
///
/// `id` is a grammar-unique insertion index, not part of the rule's
/// identity (equality/hashing stay structural on `lhs`/`rhs`). It only
/// exists to give LR items a total order for deterministic item-set
/// interning.
#[derive(Debug, Clone)]
pub struct Rule<T> {
    pub lhs: Nonterminal,
    rhs: Rc<[Symbol<T>]>,
    pub(crate) id: usize,
}

impl<T> Rule<T> {
    pub fn new(lhs: Nonterminal, rhs: Vec<Symbol<T>>, id: usize) -> Self {
        Rule {
            lhs,
            rhs: Rc::from(rhs),
            id,
        }
    }

    pub fn rhs(&self) -> &[Symbol<T>] {
        &self.rhs
    }

    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Nonterminal> {
        self.rhs.iter().filter_map(Symbol::as_nonterminal)
    }
}

impl<T: Eq> PartialEq for Rule<T> {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs && *self.rhs == *other.rhs
    }
}

impl<T: Eq> Eq for Rule<T> {}

impl<T: Hash + Eq> Hash for Rule<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lhs.hash(state);
        for sym in self.rhs.iter() {
            sym.hash(state);
        }
    }
}

impl<T: fmt::Display> fmt::Display for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} -> ", self.lhs)?;
        for (i, sym) in self.rhs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", sym)?;
        }
        write!(f, ">")
    }
}

/// A context-free grammar over token type `T`.
///
/// Rules are stored behind `Rc` so a [`Rule`] handed out by
/// `get_rules_by_lhs` can be held independently of the grammar (item sets
/// and LR states keep rule references around for their whole lifetime).
#[derive(Debug, Clone)]
pub struct Grammar<T> {
    rules: Vec<Rc<Rule<T>>>,
    nonterminals: HashMap<String, Nonterminal>,
    start: Nonterminal,
    augmented_start: Option<Nonterminal>,
    next_rule_id: usize,
}

impl<T> Grammar<T> {
    /// Creates an empty grammar with the given start nonterminal name.
    pub fn new(start: impl Into<String>) -> Self {
        let start_name = start.into();
        let start = Nonterminal::new(start_name.clone());
        let mut nonterminals = HashMap::new();
        nonterminals.insert(start_name, start.clone());
        Grammar {
            rules: Vec::new(),
            nonterminals,
            start,
            augmented_start: None,
            next_rule_id: 0,
        }
    }

    pub fn start(&self) -> &Nonterminal {
        &self.start
    }

    pub fn has_nonterminal(&self, name: &str) -> bool {
        self.nonterminals.contains_key(name)
    }

    pub fn resolve_nonterminal(&self, name: &str) -> Option<&Nonterminal> {
        self.nonterminals.get(name)
    }

    /// Registers `name` as a nonterminal if it isn't already known, and
    /// returns the (possibly newly-created) `Nonterminal`.
    pub fn ensure_nonterminal(&mut self, name: impl Into<String>) -> Nonterminal {
        let name = name.into();
        if let Some(existing) = self.nonterminals.get(&name) {
            return existing.clone();
        }
        let nt = Nonterminal::new(name.clone());
        self.nonterminals.insert(name, nt.clone());
        nt
    }

    /// Registers a brand-new nonterminal, failing if the name is already
    /// taken or reserved for the augmented start symbol.
    pub fn add_nonterminal(&mut self, name: impl Into<String>) -> Result<Nonterminal> {
        let name = name.into();
        if name == AUGMENTED_START_NAME {
            return Err(GrammarError::ReservedNameInUse(name));
        }
        if self.nonterminals.contains_key(&name) {
            return Err(GrammarError::DuplicateNonterminal(Nonterminal::new(name)));
        }
        let nt = Nonterminal::new(name.clone());
        self.nonterminals.insert(name, nt.clone());
        Ok(nt)
    }

    /// Adds a rule, implicitly registering any nonterminal it mentions
    /// (lhs and any nonterminal in the rhs) that isn't already known.
    pub fn add_rule(&mut self, lhs: Nonterminal, rhs: Vec<Symbol<T>>) {
        trace!("adding rule {} -> (len {})", lhs, rhs.len());
        if !self.nonterminals.contains_key(lhs.as_str()) {
            self.nonterminals.insert(lhs.as_str().to_string(), lhs.clone());
        }
        for sym in &rhs {
            if let Symbol::Nonterminal(nt) = sym {
                self.nonterminals
                    .entry(nt.as_str().to_string())
                    .or_insert_with(|| nt.clone());
            }
        }
        let id = self.next_rule_id;
        self.next_rule_id += 1;
        self.rules.push(Rc::new(Rule::new(lhs, rhs, id)));
    }

    pub fn rules(&self) -> &[Rc<Rule<T>>] {
        &self.rules
    }

    pub fn nonterminal_names(&self) -> impl Iterator<Item = &str> {
        self.nonterminals.keys().map(String::as_str)
    }

    pub fn nonterminal_values(&self) -> impl Iterator<Item = &Nonterminal> {
        self.nonterminals.values()
    }

    pub fn get_rules_by_lhs<'a>(&'a self, lhs: &'a Nonterminal) -> impl Iterator<Item = &'a Rc<Rule<T>>> {
        self.rules.iter().filter(move |r| &r.lhs == lhs)
    }

    /// Returns the grammar's augmented start nonterminal `S'`, creating it
    /// (and its single rule `S' -> S`) on first call. Idempotent: a second
    /// call returns the same nonterminal without touching the rule set.
    ///
    /// Fails with [`GrammarError::ReservedNameInUse`] if the user grammar
    /// already registered a nonterminal under the reserved augmentation
    /// name before this was ever called.
    pub fn new_start(&mut self) -> Result<Nonterminal> {
        if let Some(nt) = &self.augmented_start {
            return Ok(nt.clone());
        }
        if self.nonterminals.contains_key(AUGMENTED_START_NAME) {
            return Err(GrammarError::ReservedNameInUse(
                AUGMENTED_START_NAME.to_string(),
            ));
        }
        debug!("augmenting grammar with new start symbol");
        let augmented = Nonterminal::new(AUGMENTED_START_NAME);
        self.nonterminals
            .insert(AUGMENTED_START_NAME.to_string(), augmented.clone());
        let start = self.start.clone();
        let id = self.next_rule_id;
        self.next_rule_id += 1;
        self.rules.push(Rc::new(Rule::new(
            augmented.clone(),
            vec![Symbol::Nonterminal(start)],
            id,
        )));
        self.augmented_start = Some(augmented.clone());
        Ok(augmented)
    }

    pub fn augmented_start(&self) -> Option<&Nonterminal> {
        self.augmented_start.as_ref()
    }
}

impl Grammar<String> {
    /// Creates a new grammar equivalent to this one but with every
    /// multi-character string terminal replaced by the sequence of its
    /// single-character terminals, and every zero-length string terminal
    /// dropped entirely. The rule introduced by `new_start` is not copied;
    /// the returned grammar is re-augmented independently if needed.
    ///
    /// Preserves the recognized language, provided tokens fed to a parser
    /// built from the result are single characters (as produced by
    /// [`crate::symbol::char_tokens`]).
    pub fn split_long_terminals(&self) -> Grammar<String> {
        let mut new_grammar: Grammar<String> = Grammar::new(self.start.as_str());

        for rule in &self.rules {
            if Some(&rule.lhs) == self.augmented_start.as_ref() {
                continue;
            }

            let mut new_rhs = Vec::with_capacity(rule.len());
            for sym in rule.rhs() {
                match sym {
                    Symbol::Nonterminal(nt) => new_rhs.push(Symbol::Nonterminal(nt.clone())),
                    Symbol::Terminal(t) => {
                        let value = t.get_token();
                        if value.is_empty() {
                            continue;
                        }
                        for ch in value.chars() {
                            new_rhs.push(Symbol::Terminal(Terminal::exact(ch.to_string())));
                        }
                    }
                }
            }

            new_grammar.add_rule(rule.lhs.clone(), new_rhs);
        }

        new_grammar
    }
}

impl<T: fmt::Display> fmt::Display for Grammar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}
