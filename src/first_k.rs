//! FIRST_k: the set of length-≤k token prefixes a symbol or symbol sequence
//! can begin with.
//!
//! Computed as a bounded fixed point rather than a textbook worklist: each
//! of the `k * |rules|` rounds recomputes every nonterminal's expansion
//! from the previous round's cache, and a sequence can grow by at most one
//! token of depth per round, so `k * |rules|` rounds are always enough to
//! saturate. No round-counting convergence check is needed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use itertools::iproduct;
use log::trace;

use crate::grammar::Grammar;
use crate::symbol::{Nonterminal, Symbol};

pub struct FirstKEngine<'g, T> {
    grammar: &'g Grammar<T>,
    k: usize,
    cache: RefCell<HashMap<Nonterminal, HashSet<Vec<T>>>>,
}

impl<'g, T> FirstKEngine<'g, T>
where
    T: Clone + Eq + Hash + fmt::Debug,
{
    pub fn new(grammar: &'g Grammar<T>, k: usize) -> Self {
        let engine = FirstKEngine {
            grammar,
            k,
            cache: RefCell::new(HashMap::new()),
        };
        engine.saturate();
        engine
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn saturate(&self) {
        let rule_count = self.grammar.rules().len().max(1);
        let rounds = self.k.max(1) * rule_count;
        trace!("first_k saturating over {rounds} rounds (k={})", self.k);
        let nonterminals: Vec<Nonterminal> = self.grammar.nonterminal_values().cloned().collect();
        for _ in 0..rounds {
            for nt in &nonterminals {
                let expansion = self.do_expand_nonterminal(nt);
                self.cache.borrow_mut().insert(nt.clone(), expansion);
            }
        }
    }

    fn do_expand_nonterminal(&self, nt: &Nonterminal) -> HashSet<Vec<T>> {
        let mut result = HashSet::new();
        for rule in self.grammar.get_rules_by_lhs(nt) {
            result.extend(self.expand_sequence(rule.rhs()));
        }
        result
    }

    fn expand_symbol(&self, symbol: &Symbol<T>) -> HashSet<Vec<T>> {
        match symbol {
            Symbol::Terminal(t) => HashSet::from([vec![t.get_token()]]),
            Symbol::Nonterminal(nt) => self
                .cache
                .borrow()
                .get(nt)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// The set of length-≤k prefixes the symbol sequence `seq` can begin
    /// with, truncating (and ceasing to extend) any prefix once it reaches
    /// length k.
    pub fn expand_sequence(&self, seq: &[Symbol<T>]) -> HashSet<Vec<T>> {
        let mut done: HashSet<Vec<T>> = HashSet::new();
        let mut cur: HashSet<Vec<T>> = HashSet::from([Vec::new()]);

        for symbol in seq {
            if cur.is_empty() {
                break;
            }
            let next = self.expand_symbol(symbol);
            let mut grown = HashSet::new();
            for (prefix, suffix) in iproduct!(cur.iter(), next.iter()) {
                let mut combined = prefix.clone();
                combined.extend(suffix.iter().cloned());
                if combined.len() >= self.k {
                    combined.truncate(self.k);
                    done.insert(combined);
                } else {
                    grown.insert(combined);
                }
            }
            cur = grown;
        }

        done.extend(cur);
        done
    }

    /// `FIRST_k(seq . continuation)`: every length-≤k prefix of `seq`,
    /// padded out to k tokens with `continuation` where `seq` alone is
    /// shorter than k.
    pub fn first_k(&self, seq: &[Symbol<T>], continuation: &[T]) -> HashSet<Vec<T>> {
        self.expand_sequence(seq)
            .into_iter()
            .map(|mut r| {
                let remaining = self.k.saturating_sub(r.len());
                r.extend(continuation.iter().take(remaining).cloned());
                r
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Terminal;

    fn term(s: &str) -> Symbol<String> {
        Symbol::Terminal(Terminal::exact(s.to_string()))
    }

    #[test]
    fn first_1_of_balanced_parens_grammar() {
        // S -> ( S ) | S S | ""
        let mut g: Grammar<String> = Grammar::new("S");
        let s = g.start().clone();
        g.add_rule(
            s.clone(),
            vec![term("("), Symbol::Nonterminal(s.clone()), term(")")],
        );
        g.add_rule(s.clone(), vec![Symbol::Nonterminal(s.clone()), Symbol::Nonterminal(s.clone())]);
        g.add_rule(s.clone(), vec![]);

        let engine = FirstKEngine::new(&g, 1);
        let first = engine.expand_sequence(&[Symbol::Nonterminal(s)]);
        let expected: HashSet<Vec<String>> =
            HashSet::from([vec!["(".to_string()], vec![]]);
        assert_eq!(first, expected);
    }

    #[test]
    fn first_2_probes_two_tokens_deep() {
        // S -> a S | b
        let mut g: Grammar<String> = Grammar::new("S");
        let s = g.start().clone();
        g.add_rule(s.clone(), vec![term("a"), Symbol::Nonterminal(s.clone())]);
        g.add_rule(s.clone(), vec![term("b")]);

        let engine = FirstKEngine::new(&g, 2);
        let first = engine.expand_sequence(&[Symbol::Nonterminal(s)]);
        let expected: HashSet<Vec<String>> = HashSet::from([
            vec!["a".to_string(), "a".to_string()],
            vec!["a".to_string(), "b".to_string()],
            vec!["b".to_string()],
        ]);
        assert_eq!(first, expected);
    }

    #[test]
    fn first_k_pads_short_sequences_with_continuation() {
        let mut g: Grammar<String> = Grammar::new("S");
        let s = g.start().clone();
        g.add_rule(s, vec![term("a")]);

        let engine = FirstKEngine::new(&g, 2);
        let result = engine.first_k(&[term("a")], &["$".to_string()]);
        assert_eq!(
            result,
            HashSet::from([vec!["a".to_string(), "$".to_string()]])
        );
    }
}
