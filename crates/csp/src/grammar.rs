//! Grammar engine adapter.
//!
//! The CSP grammar lives in `csp.pest` and is compiled into the [`Rule`] enum
//! by `pest_derive` when the crate is built, so the matcher is immutable static
//! code shared by every thread. This module hides the engine behind
//! [`match_rule`], which hands back owned [`ParseNode`] trees.

use std::ops::Range;

use pest::error::{ErrorVariant, InputLocation};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::error::{CspError, CspResult};

#[derive(Parser)]
#[grammar = "csp.pest"]
struct CspGrammar;

/// A node of a parse tree produced by [`match_rule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
    /// Grammar rule this node matched
    pub rule: Rule,
    /// Half-open byte range of the matched input
    pub span: Range<usize>,
    /// Child matches in input order
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    fn from_pair(pair: Pair<'_, Rule>) -> Self {
        let span = pair.as_span();
        let rule = pair.as_rule();
        let children = pair.into_inner().map(ParseNode::from_pair).collect();

        Self {
            rule,
            span: span.start()..span.end(),
            children,
        }
    }

    /// Length of the matched span in bytes
    pub fn len(&self) -> usize {
        self.span.end - self.span.start
    }

    /// Whether the node matched the empty string
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

/// Human readable grammar name of a rule, used in diagnostics.
pub fn rule_name(rule: Rule) -> String {
    format!("{:?}", rule).replace('_', "-")
}

/// Match `input` against `rule`.
///
/// Returns every tree the engine produced, in order; the first one is
/// authoritative. A failed match is reported as [`CspError::Syntax`] with the
/// position the engine stopped at, any other engine failure as
/// [`CspError::GrammarEngine`].
pub fn match_rule(rule: Rule, input: &str) -> CspResult<Vec<ParseNode>> {
    match CspGrammar::parse(rule, input) {
        Ok(pairs) => Ok(pairs.map(ParseNode::from_pair).collect()),
        Err(err) => {
            let position = match err.location {
                InputLocation::Pos(pos) => pos,
                InputLocation::Span((start, _)) => start,
            };

            match err.variant {
                ErrorVariant::ParsingError { .. } => Err(CspError::syntax(rule, input, position)),
                ErrorVariant::CustomError { message } => Err(CspError::GrammarEngine {
                    rule: rule_name(rule),
                    message,
                }),
            }
        }
    }
}

/// Return the first (authoritative) tree, treating an empty match set as a
/// syntax error on `input`.
pub fn first_tree(trees: Vec<ParseNode>, rule: Rule, input: &str) -> CspResult<ParseNode> {
    trees
        .into_iter()
        .next()
        .ok_or_else(|| CspError::syntax(rule, input, 0))
}
