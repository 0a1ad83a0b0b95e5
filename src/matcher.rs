//! Rule selection
//!
//! The matcher walks the catalog in registration order and stops at the
//! first rule whose trigger holds. When several rules would accept a node,
//! the earliest-registered one wins, which makes catalog order part of the
//! observable behavior.

use tracing::debug;

use crate::catalog::{Catalog, Rule};
use crate::node::{Captures, SourceNode};

/// The rule chosen for a node and the captures bound from it
#[derive(Debug, Clone)]
pub struct Match<'c> {
    pub rule: &'c Rule,
    pub captures: Captures,
}

#[derive(Debug, Clone, Copy)]
pub struct Matcher<'c> {
    catalog: &'c Catalog,
}

impl<'c> Matcher<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Matcher { catalog }
    }

    /// Find the first rule accepting `node`.
    ///
    /// `None` is an ordinary outcome: the node is a construct the catalog
    /// does not cover.
    pub fn match_node(&self, node: &SourceNode) -> Option<Match<'c>> {
        let rule = self.catalog.rules().iter().find(|rule| rule.applies_to(node));
        match rule {
            Some(rule) => {
                debug!(kind = %node.kind, rule = rule.name(), "matched rule");
                Some(Match {
                    rule,
                    captures: node.captures.clone(),
                })
            }
            None => {
                debug!(kind = %node.kind, "no rule matched");
                None
            }
        }
    }

    /// Every rule accepting `node`, in match order. The first entry is the one
    /// `match_node` would pick.
    pub fn candidates(&self, node: &SourceNode) -> Vec<&'c Rule> {
        self.catalog
            .rules()
            .iter()
            .filter(|rule| rule.applies_to(node))
            .collect()
    }
}
