//! Compiles a canonical LR(k) item-set collection into action/goto tables,
//! detecting shift-reduce and reduce-reduce conflicts.
//!
//! Shift lookaheads are computed from `FIRST_k(rhs[dot ..], lookahead)`,
//! starting *at* the dot, so the terminal about to be shifted is itself
//! part of the computed continuation. This differs from closure, which
//! looks past the symbol under the dot.
//!
//! Accept is installed whenever the completed item's rule is the
//! augmented start rule: it can never be the next symbol of any other
//! rule, so reducing by it always means the whole input has been
//! recognized, independent of what lookahead tuple the reduce fires on.

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;
use log::trace;

use crate::error::LRConflict;
use crate::grammar::Rule;
use crate::lr::items::CanonicalCollection;
use crate::symbol::{Nonterminal, Symbol};

#[derive(Debug, Clone)]
pub enum Action<T> {
    Shift,
    Reduce(Rc<Rule<T>>),
    Accept,
}

impl<T: Eq> PartialEq for Action<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Action::Shift, Action::Shift) | (Action::Accept, Action::Accept) => true,
            (Action::Reduce(a), Action::Reduce(b)) => **a == **b,
            _ => false,
        }
    }
}

impl<T: Eq> Eq for Action<T> {}

pub struct LRState<T> {
    pub actions: IndexMap<Vec<T>, Action<T>>,
    pub gotos: IndexMap<Symbol<T>, usize>,
    pub token_gotos: IndexMap<T, usize>,
}

pub struct LRTable<T> {
    pub states: Vec<LRState<T>>,
    pub start_state: usize,
}

pub struct LRTableBuilder<T> {
    k: usize,
}

impl<T> LRTableBuilder<T>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug,
{
    pub fn new(k: usize) -> Self {
        LRTableBuilder { k }
    }

    pub fn build(
        &self,
        collection: &CanonicalCollection<T>,
        augmented_start: &Nonterminal,
        first_k: &crate::first_k::FirstKEngine<T>,
    ) -> Result<LRTable<T>, LRConflict<T>> {
        let mut states = Vec::with_capacity(collection.states.len());

        for (state_id, item_set) in collection.states.iter().enumerate() {
            let mut actions: IndexMap<Vec<T>, Action<T>> = IndexMap::new();

            // Pass 1: shifts. Multiple items agreeing on the same
            // continuation are harmless (the same token is shifted either
            // way); only a later reduce colliding with one is a conflict.
            for item in item_set.iter() {
                if let Some(Symbol::Terminal(_)) = item.next_symbol() {
                    let seq = &item.rule.rhs()[item.dot..];
                    for continuation in first_k.first_k(seq, &item.lookahead) {
                        actions.entry(continuation).or_insert(Action::Shift);
                    }
                }
            }

            // Pass 2: reduces and accept.
            for item in item_set.iter() {
                if item.next_symbol().is_some() {
                    continue;
                }
                let lookahead = item.lookahead.to_vec();
                let action = if item.rule.lhs == *augmented_start {
                    Action::Accept
                } else {
                    Action::Reduce(Rc::clone(&item.rule))
                };

                match actions.get(&lookahead) {
                    None => {
                        actions.insert(lookahead, action);
                    }
                    Some(Action::Shift) => {
                        return Err(LRConflict::ShiftReduce {
                            lookahead,
                            state: state_id.to_string(),
                        });
                    }
                    Some(existing) => {
                        if *existing != action {
                            let rule_a = format!("{existing:?}");
                            return Err(LRConflict::ReduceReduce {
                                lookahead,
                                rule_a,
                                rule_b: format!("{:?}", item.rule),
                            });
                        }
                    }
                }
            }

            states.push(LRState {
                actions,
                gotos: IndexMap::new(),
                token_gotos: IndexMap::new(),
            });
        }

        for (state_id, edges) in collection.gotos.iter().enumerate() {
            for (symbol, &target) in edges {
                states[state_id].gotos.insert(symbol.clone(), target);
                if let Symbol::Terminal(t) = symbol {
                    states[state_id].token_gotos.insert(t.get_token(), target);
                }
            }
        }

        trace!("compiled LR({}) table with {} states", self.k, states.len());
        Ok(LRTable {
            states,
            start_state: CanonicalCollection::<T>::ROOT,
        })
    }
}
