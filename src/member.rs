//! Name based lookups on a node.
//!
//! A name like `title`, `press` or `buttons` can mean an attribute, an action
//! or a search for descendants. [`resolve_member`] tries those readings in a
//! fixed order and says which one applies, leaving it to the caller to act on
//! the answer.

use crate::debug;
use crate::element::Node;
use crate::error::{AxError, Result};
use crate::qualifier::{Filters, Qualifier};
use crate::search::{self, Cardinality, SearchResult};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Attribute(Value),
    /// Needs a parameter before it can be read.
    ParameterizedAttribute(String),
    Action(String),
    SearchRequest { kind: String, cardinality: Cardinality },
    NotFound,
}

/// Attribute first, then parameterized attribute, then action. A name that
/// is none of those is read as a search when the node has children.
pub fn resolve_member(node: &Node, name: &str) -> Member {
    if node.has_attribute(name) {
        return Member::Attribute(node.attribute(name));
    }
    if node.has_parameterized_attribute(name) {
        return Member::ParameterizedAttribute(name.to_string());
    }
    if node.actions().iter().any(|action| action == name) {
        return Member::Action(name.to_string());
    }
    if node.has_children_relation() {
        #[allow(deprecated)]
        let cardinality = Cardinality::infer(name);
        return Member::SearchRequest {
            kind: name.to_string(),
            cardinality,
        };
    }
    Member::NotFound
}

/// Search below `node` for `name`, reading the cardinality off the name.
/// Finding nothing is an error here, unlike in [`search::search`].
pub fn implicit_search(node: &Node, name: &str, filters: &Filters) -> Result<SearchResult> {
    #[allow(deprecated)]
    let cardinality = Cardinality::infer(name);
    let result = search::search(node, name, filters, None, cardinality)?;
    if result.is_blank() {
        return Err(search_failure(node, name, filters));
    }
    Ok(result)
}

/// The error reported when a search below `searcher` came back empty.
pub fn search_failure(searcher: &Node, kind: &str, filters: &Filters) -> AxError {
    let searchee = Qualifier::new(kind, filters).describe();
    let path: Vec<String> = debug::path(searcher).iter().map(|n| n.to_string()).collect();
    let mut message = format!(
        "Could not find `{searchee}` as a child of {}\nElement Path:\n\t{}",
        searcher.kind(),
        path.join("\n\t")
    );
    if searcher.session().settings().debug {
        match debug::text_subtree(searcher) {
            Ok(subtree) => {
                message.push_str("\nSubtree:\n\t");
                message.push_str(&subtree);
            }
            Err(e) => message.push_str(&format!("\nSubtree unavailable: {e}")),
        }
    }
    AxError::SearchFailure { message }
}

impl Node {
    pub fn resolve_member(&self, name: &str) -> Member {
        resolve_member(self, name)
    }
}
