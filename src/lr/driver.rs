//! LR(k) table construction front door and the stack-based driver.
//!
//! The driver reads lookahead through a [`PeekableStream`]: a fixed-size
//! ring buffer in front of the caller's token source, padded with the EOF
//! token forever once the source is exhausted, so peeking `k` tokens past
//! the end of input is always well-defined.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use log::trace;

use crate::error::{LRBuildError, ParserError};
use crate::first_k::FirstKEngine;
use crate::grammar::{Grammar, Rule};
use crate::lr::items::VGkBuilder;
use crate::lr::table::{Action, LRTable, LRTableBuilder};
use crate::symbol::{Nonterminal, Symbol};

/// A ring buffer of up to `limit` lookahead tokens in front of an
/// iterator, repeating `sentinel` forever once the source runs dry.
pub struct PeekableStream<T> {
    source: Box<dyn Iterator<Item = T>>,
    limit: usize,
    peeked: VecDeque<T>,
    sentinel: T,
    source_exhausted: bool,
}

impl<T: Clone + PartialEq> PeekableStream<T> {
    pub fn new(source: impl Iterator<Item = T> + 'static, limit: usize, sentinel: T) -> Self {
        let mut stream = PeekableStream {
            source: Box::new(source),
            limit: limit.max(1),
            peeked: VecDeque::new(),
            sentinel,
            source_exhausted: false,
        };
        stream.refill();
        stream
    }

    fn refill(&mut self) {
        while !self.source_exhausted && self.peeked.len() < self.limit {
            match self.source.next() {
                Some(tok) => self.peeked.push_back(tok),
                None => self.source_exhausted = true,
            }
        }
        while self.peeked.len() < self.limit {
            self.peeked.push_back(self.sentinel.clone());
        }
    }

    pub fn next_token(&mut self) -> T {
        let result = self
            .peeked
            .pop_front()
            .expect("refill always keeps at least `limit` tokens buffered");
        self.refill();
        result
    }

    pub fn peek(&self, count: usize) -> Vec<T> {
        self.peeked.iter().take(count).cloned().collect()
    }

    pub fn peek1(&self) -> T {
        self.peeked[0].clone()
    }

    pub fn is_over(&self) -> bool {
        self.peek1() == self.sentinel
    }
}

/// A grammar compiled into LR(k) action/goto tables, ready to drive any
/// number of [`LRParser`]s.
pub struct LRParserConfig<T> {
    table: LRTable<T>,
    k: usize,
    eof: T,
}

impl<T> LRParserConfig<T>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug + 'static,
{
    pub fn new(mut grammar: Grammar<T>, eof: T, k: usize) -> Result<Self, LRBuildError<T>> {
        let augmented = grammar.new_start()?;
        let start_rule: Rc<Rule<T>> = grammar
            .get_rules_by_lhs(&augmented)
            .next()
            .expect("new_start always installs exactly one rule")
            .clone();

        let first_k = FirstKEngine::new(&grammar, k);
        let collection = VGkBuilder::new(&grammar, &first_k, k).build(start_rule, eof.clone());
        let table = LRTableBuilder::new(k).build(&collection, &augmented, &first_k)?;

        trace!("LR({k}) config built");
        Ok(LRParserConfig { table, k, eof })
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

enum StackSymbol<T> {
    Terminal(T),
    Nonterminal(Nonterminal),
}

struct Frame<T> {
    #[allow(dead_code)]
    symbol: StackSymbol<T>,
    state: usize,
}

/// A driver built from an [`LRParserConfig`]. `feed` then `parse`, any
/// number of times, in sequence.
pub struct LRParser<'c, T> {
    config: &'c LRParserConfig<T>,
    source: Option<Vec<T>>,
}

impl<'c, T> LRParser<'c, T>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug + 'static,
{
    pub fn new(config: &'c LRParserConfig<T>) -> Self {
        LRParser {
            config,
            source: None,
        }
    }

    /// Supplies the token source to parse. Replaces any source fed earlier.
    pub fn feed(&mut self, source: impl IntoIterator<Item = T>) {
        self.source = Some(source.into_iter().collect());
    }

    pub fn parse(&mut self) -> Result<bool, ParserError> {
        let tokens = self.source.take().ok_or(ParserError::NotInitialized)?;
        let k = self.config.k.max(1);
        let mut stream = PeekableStream::new(tokens.into_iter(), k, self.config.eof.clone());

        let bottom = Nonterminal::new("$bottom$");
        let mut stack: Vec<Frame<T>> = vec![Frame {
            symbol: StackSymbol::Nonterminal(bottom),
            state: self.config.table.start_state,
        }];

        loop {
            let state_id = stack.last().expect("stack is never empty").state;
            let state = &self.config.table.states[state_id];
            let lookahead = stream.peek(k);

            match state.actions.get(&lookahead) {
                Some(Action::Shift) => {
                    let token = stream.next_token();
                    let Some(&target) = state.token_gotos.get(&token) else {
                        return Ok(false);
                    };
                    stack.push(Frame {
                        symbol: StackSymbol::Terminal(token),
                        state: target,
                    });
                }
                Some(Action::Reduce(rule)) => {
                    let pop_count = rule.len();
                    if stack.len() <= pop_count {
                        return Ok(false);
                    }
                    stack.truncate(stack.len() - pop_count);
                    let prev_state = stack.last().expect("stack is never empty").state;
                    let target_symbol = Symbol::Nonterminal(rule.lhs.clone());
                    let Some(&target) = self.config.table.states[prev_state]
                        .gotos
                        .get(&target_symbol)
                    else {
                        return Ok(false);
                    };
                    stack.push(Frame {
                        symbol: StackSymbol::Nonterminal(rule.lhs.clone()),
                        state: target,
                    });
                }
                Some(Action::Accept) => return Ok(true),
                None => return Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Terminal;

    fn term(s: &str) -> Symbol<String> {
        Symbol::Terminal(Terminal::exact(s.to_string()))
    }

    fn seminar_grammar() -> Grammar<String> {
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
        let s2 = g.resolve_nonterminal("S").unwrap().clone();
        g.add_rule(
            t.clone(),
            vec![term("("), Symbol::Nonterminal(s2), term(")")],
        );
        g.add_rule(t, vec![term("id")]);
        g
    }

    fn tokenize(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn lr1_seminar_grammar_accepts_and_rejects() {
        let config = LRParserConfig::new(seminar_grammar(), "$".to_string(), 1).unwrap();
        let mut parser = LRParser::new(&config);

        parser.feed(tokenize("id"));
        assert!(parser.parse().unwrap());

        parser.feed(tokenize("id + id"));
        assert!(parser.parse().unwrap());

        parser.feed(tokenize("( id + id )"));
        assert!(parser.parse().unwrap());

        parser.feed(tokenize("id +"));
        assert!(!parser.parse().unwrap());

        parser.feed(tokenize("( id"));
        assert!(!parser.parse().unwrap());
    }

    #[test]
    fn parse_without_feed_errors() {
        let config = LRParserConfig::new(seminar_grammar(), "$".to_string(), 1).unwrap();
        let mut parser = LRParser::new(&config);
        assert_eq!(parser.parse(), Err(ParserError::NotInitialized));
    }

    #[test]
    fn ambiguous_dangling_else_style_grammar_reports_conflict() {
        // S -> A | B ; A -> "x" ; B -> "x". Both A and B reduce on "x" with eof lookahead.
        let mut g: Grammar<String> = Grammar::new("S");
        let s = g.start().clone();
        let a = g.ensure_nonterminal("A");
        let b = g.ensure_nonterminal("B");
        g.add_rule(s.clone(), vec![Symbol::Nonterminal(a.clone())]);
        g.add_rule(s, vec![Symbol::Nonterminal(b.clone())]);
        g.add_rule(a, vec![term("x")]);
        g.add_rule(b, vec![term("x")]);

        let result = LRParserConfig::new(g, "$".to_string(), 1);
        assert!(matches!(
            result,
            Err(LRBuildError::Conflict(crate::error::LRConflict::ReduceReduce { .. }))
        ));
    }
}
