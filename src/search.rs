//! Drives an enumerator with a qualifier.
//!
//! Searches walk the subtree below a root node breadth first. `find` stops
//! pulling elements the moment one qualifies, `find_all` walks the whole
//! subtree. Neither holds on to anything once it returns.

use tracing::debug;

use crate::element::Node;
use crate::enumerators::BreadthFirst;
use crate::error::Result;
use crate::qualifier::{Filters, Predicate, Qualifier};
use crate::translator::{classify, singularize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// The first match, or nothing.
    One,
    /// Every match, in breadth first order.
    All,
}

impl Cardinality {
    /// Guess the cardinality from the grammatical number of a type token:
    /// `button` asks for one, `buttons` asks for all of them.
    #[deprecated(note = "pass the cardinality explicitly")]
    pub fn infer(token: &str) -> Self {
        if singularize(token) == token {
            Cardinality::One
        } else {
            Cardinality::All
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    One(Option<Node>),
    All(Vec<Node>),
}

impl SearchResult {
    pub fn is_blank(&self) -> bool {
        match self {
            SearchResult::One(found) => found.is_none(),
            SearchResult::All(found) => found.is_empty(),
        }
    }
    pub fn into_vec(self) -> Vec<Node> {
        match self {
            SearchResult::One(found) => found.into_iter().collect(),
            SearchResult::All(found) => found,
        }
    }
}

pub fn find_all(
    root: &Node,
    kind: &str,
    filters: &Filters,
    predicate: Option<Predicate<'_>>,
) -> Result<Vec<Node>> {
    let qualifier = Qualifier::build(kind, filters, predicate);
    debug!(root = %root.handle(), qualifier = %qualifier.describe(), "searching for all");
    let mut found = Vec::new();
    for node in BreadthFirst::new(root) {
        let node = node?;
        if qualifier.qualifies(&node)? {
            found.push(node);
        }
    }
    debug!(matches = found.len(), "search complete");
    Ok(found)
}

pub fn find(
    root: &Node,
    kind: &str,
    filters: &Filters,
    predicate: Option<Predicate<'_>>,
) -> Result<Option<Node>> {
    let qualifier = Qualifier::build(kind, filters, predicate);
    debug!(root = %root.handle(), qualifier = %qualifier.describe(), "searching for first");
    let found = BreadthFirst::new(root).find(|node| qualifier.qualifies(node))?;
    debug!(found = found.is_some(), "search complete");
    Ok(found)
}

pub fn search(
    root: &Node,
    kind: &str,
    filters: &Filters,
    predicate: Option<Predicate<'_>>,
    cardinality: Cardinality,
) -> Result<SearchResult> {
    match cardinality {
        Cardinality::One => find(root, kind, filters, predicate).map(SearchResult::One),
        Cardinality::All => find_all(root, kind, filters, predicate).map(SearchResult::All),
    }
}

/// The closest ancestor of `node` that qualifies, walking up parent links.
pub fn ancestor(
    node: &Node,
    kind: &str,
    filters: &Filters,
    predicate: Option<Predicate<'_>>,
) -> Result<Option<Node>> {
    let qualifier = Qualifier::build(kind, filters, predicate);
    debug!(element = %node.handle(), kind = %classify(kind), "searching ancestors");
    let mut current = node.parent();
    while let Some(candidate) = current {
        if qualifier.qualifies(&candidate)? {
            return Ok(Some(candidate));
        }
        current = candidate.parent();
    }
    Ok(None)
}
