//! The general Earley recognizer: a chart of per-position item sets built
//! by predict/scan/complete closure, accepting iff the final chart position
//! contains a completed augmented-start item spanning the whole input.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use log::trace;

use crate::error::{GrammarError, ParserError};
use crate::grammar::{Grammar, Rule};
use crate::symbol::{Nonterminal, Symbol};
use crate::updateable_set::UpdateableSet;

/// `(rule, dot, start_offset)`: a partially-matched rule, how far into its
/// rhs we've matched, and which chart position the match began at.
#[derive(Debug, Clone)]
pub struct EarleyItem<T> {
    rule: Rc<Rule<T>>,
    dot: usize,
    start: usize,
}

impl<T> EarleyItem<T> {
    pub fn next_symbol(&self) -> Option<&Symbol<T>> {
        self.rule.rhs().get(self.dot)
    }

    pub fn is_complete(&self) -> bool {
        self.dot >= self.rule.len()
    }

    fn shifted(&self) -> Self {
        EarleyItem {
            rule: Rc::clone(&self.rule),
            dot: self.dot + 1,
            start: self.start,
        }
    }
}

impl<T: Eq> PartialEq for EarleyItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dot == other.dot && self.start == other.start && *self.rule == *other.rule
    }
}

impl<T: Eq> Eq for EarleyItem<T> {}

impl<T: Hash + Eq> Hash for EarleyItem<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rule.hash(state);
        self.dot.hash(state);
        self.start.hash(state);
    }
}

/// Grammar prepared for Earley recognition: augmented with a fresh start
/// symbol once, up front.
///
/// For a character-level grammar (tokens produced one character at a time,
/// e.g. by [`crate::symbol::char_tokens`]), a multi-character terminal can
/// never match a single-character token, so the grammar passed in here must
/// already have been normalised with
/// [`Grammar::split_long_terminals`](crate::grammar::Grammar::split_long_terminals)
/// before construction. This config only augments; it does not split, since
/// splitting is defined over `Grammar<String>` specifically and not every
/// token type has a notion of characters.
pub struct EarleyParserConfig<T> {
    grammar: Grammar<T>,
    start_rule: Rc<Rule<T>>,
}

impl<T> EarleyParserConfig<T>
where
    T: Clone + Eq + Hash + fmt::Debug,
{
    pub fn new(mut grammar: Grammar<T>) -> Result<Self, GrammarError> {
        let augmented = grammar.new_start()?;
        let start_rule = grammar
            .get_rules_by_lhs(&augmented)
            .next()
            .expect("new_start always installs exactly one rule")
            .clone();
        Ok(EarleyParserConfig {
            grammar,
            start_rule,
        })
    }

    pub fn grammar(&self) -> &Grammar<T> {
        &self.grammar
    }
}

/// A recognizer built from an [`EarleyParserConfig`]. `feed` then `parse`,
/// any number of times, in sequence.
pub struct EarleyParser<'c, T> {
    config: &'c EarleyParserConfig<T>,
    tokens: Option<Vec<T>>,
}

impl<'c, T> EarleyParser<'c, T>
where
    T: Clone + Eq + Hash + fmt::Debug,
{
    pub fn new(config: &'c EarleyParserConfig<T>) -> Self {
        EarleyParser {
            config,
            tokens: None,
        }
    }

    /// Supplies the token source to parse. Replaces any source fed earlier.
    pub fn feed(&mut self, source: impl IntoIterator<Item = T>) {
        self.tokens = Some(source.into_iter().collect());
    }

    pub fn parse(&mut self) -> Result<bool, ParserError> {
        let tokens = self.tokens.take().ok_or(ParserError::NotInitialized)?;
        let n = tokens.len();
        trace!("earley: recognizing {n} tokens");

        let mut tables: Vec<UpdateableSet<EarleyItem<T>>> =
            (0..=n).map(|_| UpdateableSet::new()).collect();
        tables[0].add(EarleyItem {
            rule: Rc::clone(&self.config.start_rule),
            dot: 0,
            start: 0,
        });

        for i in 0..=n {
            self.close_position(i, &mut tables, &tokens);
        }

        let accept_rule = &self.config.start_rule;
        Ok(tables[n].iter().any(|item| {
            item.is_complete() && item.start == 0 && *item.rule == **accept_rule
        }))
    }

    fn close_position(&self, i: usize, tables: &mut [UpdateableSet<EarleyItem<T>>], tokens: &[T]) {
        loop {
            let item = match tables[i].pop_pending() {
                Some(item) => item,
                None => break,
            };

            match item.next_symbol() {
                None => {
                    // Complete: shift every item waiting on this lhs back in
                    // the table the completed rule started in.
                    let waiting: Vec<EarleyItem<T>> = tables[item.start].iter().cloned().collect();
                    for prev in waiting {
                        if prev.next_symbol().and_then(Symbol::as_nonterminal)
                            == Some(&item.rule.lhs)
                        {
                            tables[i].add(prev.shifted());
                        }
                    }
                }
                Some(Symbol::Nonterminal(nt)) => {
                    self.predict(nt, i, tables);
                }
                Some(Symbol::Terminal(term)) => {
                    if i < tokens.len() && term.matches(&tokens[i]) {
                        tables[i + 1].add(item.shifted());
                    }
                }
            }
        }
    }

    fn predict(&self, nt: &Nonterminal, i: usize, tables: &mut [UpdateableSet<EarleyItem<T>>]) {
        for rule in self.config.grammar.get_rules_by_lhs(nt) {
            tables[i].add(EarleyItem {
                rule: Rc::clone(rule),
                dot: 0,
                start: i,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Terminal, char_tokens};

    fn term(s: &str) -> Symbol<String> {
        Symbol::Terminal(Terminal::exact(s.to_string()))
    }

    fn balanced_parens_grammar() -> Grammar<String> {
        let mut g: Grammar<String> = Grammar::new("S");
        let s = g.start().clone();
        g.add_rule(s.clone(), vec![term("("), Symbol::Nonterminal(s.clone()), term(")")]);
        g.add_rule(s.clone(), vec![Symbol::Nonterminal(s.clone()), Symbol::Nonterminal(s.clone())]);
        g.add_rule(s, vec![]);
        g
    }

    fn accepts(config: &EarleyParserConfig<String>, input: &str) -> bool {
        let mut parser = EarleyParser::new(config);
        parser.feed(char_tokens(input));
        parser.parse().unwrap()
    }

    #[test]
    fn balanced_parens_accept_and_reject() {
        let config = EarleyParserConfig::new(balanced_parens_grammar()).unwrap();
        assert!(accepts(&config, ""));
        assert!(accepts(&config, "()"));
        assert!(accepts(&config, "(())"));
        assert!(accepts(&config, "()()"));
        assert!(!accepts(&config, "("));
        assert!(!accepts(&config, ")("));
        assert!(!accepts(&config, "(()"));
    }

    fn equal_ab_grammar() -> Grammar<String> {
        // S -> a S b S | b S a S | ""
        let mut g: Grammar<String> = Grammar::new("S");
        let s = g.start().clone();
        g.add_rule(
            s.clone(),
            vec![
                term("a"),
                Symbol::Nonterminal(s.clone()),
                term("b"),
                Symbol::Nonterminal(s.clone()),
            ],
        );
        g.add_rule(
            s.clone(),
            vec![
                term("b"),
                Symbol::Nonterminal(s.clone()),
                term("a"),
                Symbol::Nonterminal(s.clone()),
            ],
        );
        g.add_rule(s, vec![]);
        g
    }

    #[test]
    fn equal_ab_accept_and_reject() {
        let config = EarleyParserConfig::new(equal_ab_grammar()).unwrap();
        assert!(accepts(&config, ""));
        assert!(accepts(&config, "ab"));
        assert!(accepts(&config, "aabb"));
        assert!(accepts(&config, "abab"));
        assert!(!accepts(&config, "a"));
        assert!(!accepts(&config, "aab"));
    }

    #[test]
    fn indirect_left_recursion_with_no_base_case_terminates_and_rejects() {
        // start -> a | "abc"; a -> a  (a has no base case, must not hang)
        let mut g: Grammar<String> = Grammar::new("start");
        let start = g.start().clone();
        let a = g.ensure_nonterminal("a");
        g.add_rule(start.clone(), vec![Symbol::Nonterminal(a.clone())]);
        g.add_rule(start, vec![term("a"), term("b"), term("c")]);
        g.add_rule(a.clone(), vec![Symbol::Nonterminal(a)]);

        let config = EarleyParserConfig::new(g).unwrap();
        assert!(accepts(&config, "abc"));
        assert!(!accepts(&config, "a"));
        assert!(!accepts(&config, ""));
    }
}
