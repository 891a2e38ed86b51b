//! The collaborator that owns the live element tree.
//!
//! Everything the search layer knows about an element it learns through
//! [`Accessible`]. Each call may be an out-of-process round trip, and any
//! handle may stop being valid between two calls. Implementations report an
//! expired handle by returning empty/absent data, never by failing; an `Err`
//! from [`Accessible::children`] is reserved for data that is malformed.

use std::fmt;

use crate::error::{AxError, Result};
use crate::value::{RawValue, Value};

/// Opaque reference to a backend element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u64);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

// native attribute names the search layer relies on
pub const ROLE: &str = "AXRole";
pub const SUBROLE: &str = "AXSubrole";
pub const CHILDREN: &str = "AXChildren";
pub const PARENT: &str = "AXParent";
pub const TITLE: &str = "AXTitle";
pub const VALUE: &str = "AXValue";
pub const IDENTIFIER: &str = "AXIdentifier";
pub const STRING_FOR_RANGE: &str = "AXStringForRange";

pub trait Accessible: Send + Sync {
    /// Native names of the attributes the element exposes.
    fn attribute_names(&self, element: Handle) -> Vec<String>;

    /// `None` when the attribute is absent or the element has expired.
    fn attribute(&self, element: Handle, name: &str) -> Option<RawValue>;

    /// `Ok(None)` when the element has no children relation (or has expired).
    fn children(&self, element: Handle) -> Result<Option<Vec<Handle>>>;

    fn role(&self, element: Handle) -> Option<String> {
        match self.attribute(element, ROLE) {
            Some(Value::String(role)) => Some(role),
            _ => None,
        }
    }

    fn subrole(&self, element: Handle) -> Option<String> {
        match self.attribute(element, SUBROLE) {
            Some(Value::String(subrole)) => Some(subrole),
            _ => None,
        }
    }

    /// Only used to report where an element lives, never for traversal.
    fn parent(&self, element: Handle) -> Option<Handle> {
        match self.attribute(element, PARENT) {
            Some(Value::Element(parent)) => Some(parent),
            _ => None,
        }
    }

    fn parameterized_attribute_names(&self, _element: Handle) -> Vec<String> {
        Vec::new()
    }

    fn parameterized_attribute(
        &self,
        _element: Handle,
        _name: &str,
        _parameter: &RawValue,
    ) -> Option<RawValue> {
        None
    }

    fn action_names(&self, _element: Handle) -> Vec<String> {
        Vec::new()
    }

    /// Returns whether the backend accepted the action.
    fn perform_action(&self, _element: Handle, _action: &str) -> bool {
        false
    }

    fn is_writable(&self, _element: Handle, _name: &str) -> bool {
        false
    }

    fn set_attribute(&self, element: Handle, name: &str, _value: RawValue) -> Result<()> {
        Err(AxError::ReadOnly {
            attribute: name.to_string(),
            element: element.to_string(),
        })
    }

    fn is_valid(&self, _element: Handle) -> bool {
        true
    }

    /// Number of items in a collection valued attribute.
    fn size_of(&self, element: Handle, name: &str) -> usize {
        match self.attribute(element, name) {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        }
    }
}
