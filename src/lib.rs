//! Axquery – declarative searching of live accessibility trees.
//!
//! Applications expose their user interface as a tree of elements, each with
//! a role (`AXButton`), sometimes a subrole (`AXCloseButton`), a bag of
//! attributes and a list of children. Axquery answers questions such as
//! "the first button titled Send below this window" or "every text field
//! whose value matches /@/" without the caller writing any traversal code.
//! * A [`backend::Accessible`] owns the live tree and is the only thing that
//!   talks to it. Every call may be a round trip to another process.
//! * A [`element::Node`] wraps one backend handle and translates between
//!   native names (`AXTitle`) and caller names (`title`).
//! * The [`registry::TypeRegistry`] learns the role/subrole hierarchy as it is
//!   observed, so that a search for `Button` also finds close buttons.
//! * A [`qualifier::Qualifier`] decides whether one node is what a search
//!   looks for; [`search`] drives it over a lazy breadth first walk.
//!
//! ## Modules
//! * [`backend`] – The [`backend::Accessible`] trait and element handles.
//! * [`snapshot`] – An in-memory backend loaded from JSON.
//! * [`element`] – Nodes and the session they share.
//! * [`registry`] – Element kinds and their is-a relation.
//! * [`translator`] – Naming rules between native constants and caller names.
//! * [`enumerators`] – Breadth and depth first walks with early exit.
//! * [`qualifier`] – Filters and the rules compiled from them.
//! * [`search`] – `find`, `find_all`, `search` and `ancestor`.
//! * [`member`] – Reading a bare name as attribute, action or search.
//! * [`debug`] – Element paths and subtree dumps for failure reports.
//! * [`settings`] – Layered configuration.
//!
//! ## Searching
//! A search never includes the node it starts from and never touches more of
//! the tree than it has to: `find` stops pulling elements as soon as one
//! qualifies. Elements that vanish while a search is running are treated as
//! leaves; only a backend that reports malformed children fails the search.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use axquery::{filters, element::{Node, Session}, snapshot::MemoryTree};
//!
//! let tree = Arc::new(MemoryTree::from_json(json!({
//!     "role": "Window",
//!     "children": [
//!         { "role": "Button", "attributes": { "title": "Cancel" } },
//!         { "role": "Button", "attributes": { "title": "Send" } }
//!     ]
//! })).unwrap());
//! let root = Node::new(Arc::new(Session::new(tree.clone())), tree.root());
//! let send = root.find("button", &filters! { "title" => "Send" }).unwrap().unwrap();
//! assert_eq!(send.to_string(), r#"#<Button "Send">"#);
//! assert_eq!(root.find_all("buttons", &filters! {}).unwrap().len(), 2);
//! ```

pub mod backend;
pub mod debug;
pub mod element;
pub mod enumerators;
pub mod error;
pub mod member;
pub mod qualifier;
pub mod registry;
pub mod search;
pub mod settings;
pub mod snapshot;
pub mod translator;
pub mod value;

pub use backend::{Accessible, Handle};
pub use element::{Node, NodeSliceExt, Session};
pub use error::{AxError, Result};
pub use qualifier::{Expected, FilterKey, Filters, Qualifier};
pub use search::{Cardinality, SearchResult};
pub use value::Value;
