//! Canonical LR(k) item-set construction: closure, GOTO, and the worklist
//! that builds the full collection V_G^k.
//!
//! Closure computes lookahead for a predicted item from `FIRST_k(rhs[dot+1
//! ..], continuation)`, the symbols *after* the one under the dot, not
//! including it. This is the standard algorithm; closing over `rhs[dot:]`
//! instead is a common mistake and is not done here.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;
use log::trace;

use crate::first_k::FirstKEngine;
use crate::grammar::{Grammar, Rule};
use crate::symbol::Symbol;
use crate::updateable_set::UpdateableSet;

/// `(rule, dot, lookahead)`: an LR(k) item. `lookahead` is at most k tokens.
#[derive(Debug, Clone)]
pub struct LRItem<T> {
    pub rule: Rc<Rule<T>>,
    pub dot: usize,
    pub lookahead: Rc<[T]>,
}

impl<T> LRItem<T> {
    pub fn next_symbol(&self) -> Option<&Symbol<T>> {
        self.rule.rhs().get(self.dot)
    }

    pub fn is_reduce_item(&self) -> bool {
        self.dot >= self.rule.len()
    }

    pub fn shifted(&self) -> Self {
        LRItem {
            rule: Rc::clone(&self.rule),
            dot: self.dot + 1,
            lookahead: Rc::clone(&self.lookahead),
        }
    }
}

impl<T: Eq> PartialEq for LRItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dot == other.dot && *self.rule == *other.rule && *self.lookahead == *other.lookahead
    }
}

impl<T: Eq> Eq for LRItem<T> {}

impl<T: Hash + Eq> Hash for LRItem<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rule.hash(state);
        self.dot.hash(state);
        self.lookahead.hash(state);
    }
}

impl<T: Eq + Ord> PartialOrd for LRItem<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Eq + Ord> Ord for LRItem<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.rule.id, self.dot, &*self.lookahead).cmp(&(other.rule.id, other.dot, &*other.lookahead))
    }
}

/// A closed, frozen item set, a node of the canonical collection.
pub type ItemSet<T> = Rc<BTreeSet<LRItem<T>>>;

/// The full canonical collection V_G^k: every state plus its GOTO edges,
/// each recorded in first-discovery order (`indexmap::IndexMap`) so table
/// compilation and the driver see deterministic symbol ordering.
pub struct CanonicalCollection<T> {
    pub states: Vec<ItemSet<T>>,
    pub gotos: Vec<IndexMap<Symbol<T>, usize>>,
}

impl<T> CanonicalCollection<T> {
    pub const ROOT: usize = 0;
}

pub struct VGkBuilder<'g, T> {
    grammar: &'g Grammar<T>,
    first_k: &'g FirstKEngine<'g, T>,
    k: usize,
}

impl<'g, T> VGkBuilder<'g, T>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug,
{
    pub fn new(grammar: &'g Grammar<T>, first_k: &'g FirstKEngine<'g, T>, k: usize) -> Self {
        VGkBuilder {
            grammar,
            first_k,
            k,
        }
    }

    /// Closes a pending set of items under prediction, producing a frozen,
    /// sorted item set.
    fn closure(&self, mut pending: UpdateableSet<LRItem<T>>) -> BTreeSet<LRItem<T>> {
        while let Some(item) = pending.pop_pending() {
            let Some(Symbol::Nonterminal(nt)) = item.next_symbol() else {
                continue;
            };
            let rest = &item.rule.rhs()[item.dot + 1..];
            let continuations = self.first_k.first_k(rest, &item.lookahead);
            for rule in self.grammar.get_rules_by_lhs(nt) {
                for continuation in &continuations {
                    pending.add(LRItem {
                        rule: Rc::clone(rule),
                        dot: 0,
                        lookahead: Rc::from(continuation.as_slice()),
                    });
                }
            }
        }
        pending.freeze().into_iter().collect()
    }

    fn goto(&self, items: &BTreeSet<LRItem<T>>, symbol: &Symbol<T>) -> BTreeSet<LRItem<T>> {
        let mut pending = UpdateableSet::new();
        for item in items {
            if item.next_symbol() == Some(symbol) {
                pending.add(item.shifted());
            }
        }
        self.closure(pending)
    }

    /// Builds the canonical collection from a single initial item: the
    /// augmented start rule, dot at zero, lookahead `[eof; k]`.
    pub fn build(&self, start_rule: Rc<Rule<T>>, eof: T) -> CanonicalCollection<T> {
        let initial_lookahead: Vec<T> = std::iter::repeat(eof).take(self.k).collect();
        let mut initial_pending = UpdateableSet::new();
        initial_pending.add(LRItem {
            rule: start_rule,
            dot: 0,
            lookahead: Rc::from(initial_lookahead.as_slice()),
        });
        let root_items = Rc::new(self.closure(initial_pending));

        let mut states: Vec<ItemSet<T>> = vec![Rc::clone(&root_items)];
        let mut index_of: HashMap<ItemSet<T>, usize> = HashMap::new();
        index_of.insert(root_items, CanonicalCollection::<T>::ROOT);
        let mut gotos: Vec<IndexMap<Symbol<T>, usize>> = vec![IndexMap::new()];

        let mut worklist = vec![CanonicalCollection::<T>::ROOT];
        while let Some(state_id) = worklist.pop() {
            let items = Rc::clone(&states[state_id]);

            // Symbols under the dot, in first-discovery order within this state.
            let mut next_symbols: IndexMap<&Symbol<T>, ()> = IndexMap::new();
            for item in items.iter() {
                if let Some(sym) = item.next_symbol() {
                    next_symbols.entry(sym).or_insert(());
                }
            }

            for symbol in next_symbols.keys().copied().collect::<Vec<_>>() {
                let target_items = self.goto(&items, symbol);
                if target_items.is_empty() {
                    continue;
                }
                let target_rc = Rc::new(target_items);
                let target_id = match index_of.get(&target_rc) {
                    Some(&id) => id,
                    None => {
                        let id = states.len();
                        states.push(Rc::clone(&target_rc));
                        index_of.insert(target_rc, id);
                        gotos.push(IndexMap::new());
                        worklist.push(id);
                        id
                    }
                };
                gotos[state_id].insert(symbol.clone(), target_id);
            }
        }

        trace!("V_G^{} built {} states", self.k, states.len());
        CanonicalCollection { states, gotos }
    }
}

/// Groups a BTreeSet's items by their lhs nonterminal name, purely as a
/// debugging/inspection helper (e.g. for pretty-printing a state).
pub fn group_by_lhs<T: Clone + Ord>(items: &BTreeSet<LRItem<T>>) -> BTreeMap<String, Vec<LRItem<T>>>
where
    T: fmt::Debug,
{
    let mut grouped: BTreeMap<String, Vec<LRItem<T>>> = BTreeMap::new();
    for item in items {
        grouped
            .entry(item.rule.lhs.to_string())
            .or_default()
            .push(item.clone());
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Terminal;

    fn term(s: &str) -> Symbol<String> {
        Symbol::Terminal(Terminal::exact(s.to_string()))
    }

    fn seminar_grammar() -> Grammar<String> {
        // Classic LR(1) grammar: S -> E, E -> E + T | T, T -> ( E ) | id
        let mut g: Grammar<String> = Grammar::new("S");
        let s = g.start().clone();
        let e = g.ensure_nonterminal("E");
        let t = g.ensure_nonterminal("T");
        g.add_rule(s, vec![Symbol::Nonterminal(e.clone())]);
        g.add_rule(
            e.clone(),
            vec![Symbol::Nonterminal(e.clone()), term("+"), Symbol::Nonterminal(t.clone())],
        );
        g.add_rule(e, vec![Symbol::Nonterminal(t.clone())]);
        g.add_rule(
            t.clone(),
            vec![term("("), Symbol::Nonterminal(g.start().clone()), term(")")],
        );
        g.add_rule(t, vec![term("id")]);
        g
    }

    #[test]
    fn closure_is_order_independent() {
        let mut g = seminar_grammar();
        let start = g.new_start().unwrap();
        let start_rule = g.get_rules_by_lhs(&start).next().unwrap().clone();
        let first_k = FirstKEngine::new(&g, 1);
        let builder = VGkBuilder::new(&g, &first_k, 1);
        let collection = builder.build(start_rule, "$".to_string());
        assert!(!collection.states.is_empty());
        // Every state's GOTO targets must themselves be states in the collection.
        for edges in &collection.gotos {
            for &target in edges.values() {
                assert!(target < collection.states.len());
            }
        }
    }

    #[test]
    fn goto_graph_revisits_existing_states_for_cycles() {
        // S -> a S | a   (GOTO on 'a' from state 1 loops back to state 1)
        let mut g: Grammar<String> = Grammar::new("S");
        let s = g.start().clone();
        g.add_rule(s.clone(), vec![term("a"), Symbol::Nonterminal(s.clone())]);
        g.add_rule(s, vec![term("a")]);
        let start = g.new_start().unwrap();
        let start_rule = g.get_rules_by_lhs(&start).next().unwrap().clone();
        let first_k = FirstKEngine::new(&g, 1);
        let builder = VGkBuilder::new(&g, &first_k, 1);
        let collection = builder.build(start_rule, "$".to_string());
        // A finite state count confirms the cycle was detected, not re-expanded forever.
        assert!(collection.states.len() < 10);
    }
}
