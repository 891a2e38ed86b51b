//! Nodes: the caller facing wrapper around one backend handle.

use std::fmt;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tracing::{debug, trace};

use crate::backend::{Accessible, Handle};
use crate::error::{AxError, Result};
use crate::qualifier::{Filters, Predicate};
use crate::registry::{TypeDescriptor, TypeRegistry};
use crate::search::{self, Cardinality, SearchResult};
use crate::settings::Settings;
use crate::translator::{cocoaify, rubyize, unprefix};
use crate::value::{RawValue, Value};

// ------------- Session -------------
/// What every node of one tree shares: the backend, the registry its types
/// are kept in, and the settings that shape diagnostics.
pub struct Session {
    backend: Arc<dyn Accessible>,
    registry: Arc<TypeRegistry>,
    settings: Settings,
}

impl Session {
    pub fn new(backend: Arc<dyn Accessible>) -> Self {
        Self {
            backend,
            registry: TypeRegistry::global(),
            settings: Settings::default(),
        }
    }
    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = registry;
        self
    }
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
    pub fn backend(&self) -> &dyn Accessible {
        self.backend.as_ref()
    }
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Session")
            .field("types", &self.registry.len())
            .field("settings", &self.settings)
            .finish()
    }
}

// ------------- Node -------------
/// One backend element.
///
/// Names, actions and the element's type are fetched the first time they are
/// asked for and kept for the lifetime of the node. Nodes are cheap to create
/// and are not meant to outlive the call that produced them: the tree keeps
/// changing underneath.
#[derive(Clone)]
pub struct Node {
    session: Arc<Session>,
    handle: Handle,
    kind: OnceCell<Arc<TypeDescriptor>>,
    attributes: OnceCell<Vec<String>>,
    parameterized: OnceCell<Vec<String>>,
    actions: OnceCell<Vec<String>>,
}

impl Node {
    pub fn new(session: Arc<Session>, handle: Handle) -> Self {
        Self {
            session,
            handle,
            kind: OnceCell::new(),
            attributes: OnceCell::new(),
            parameterized: OnceCell::new(),
            actions: OnceCell::new(),
        }
    }
    pub fn handle(&self) -> Handle {
        self.handle
    }
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
    fn backend(&self) -> &dyn Accessible {
        self.session.backend()
    }
    fn wrap(&self, handle: Handle) -> Node {
        Node::new(Arc::clone(&self.session), handle)
    }
    fn process(&self, raw: RawValue) -> Value {
        raw.map_elements(&mut |handle: Handle| self.wrap(handle))
    }

    // ---- attributes ----
    pub fn attribute_names(&self) -> &[String] {
        self.attributes.get_or_init(|| {
            let names = self.backend().attribute_names(self.handle);
            names.iter().map(|name| rubyize(name)).collect()
        })
    }
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute_names().iter().any(|n| n == name)
    }
    /// `Nil` when the attribute is absent or the element has expired.
    pub fn attribute(&self, name: &str) -> Value {
        match self.backend().attribute(self.handle, &cocoaify(name)) {
            Some(raw) => self.process(raw),
            None => Value::Nil,
        }
    }
    pub fn writable(&self, name: &str) -> bool {
        self.backend().is_writable(self.handle, &cocoaify(name))
    }
    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        if !self.writable(name) {
            return Err(AxError::ReadOnly {
                attribute: name.to_string(),
                element: self.to_string(),
            });
        }
        self.backend()
            .set_attribute(self.handle, &cocoaify(name), value.to_raw())
    }
    pub fn size_of(&self, name: &str) -> usize {
        self.backend().size_of(self.handle, &cocoaify(name))
    }

    // ---- parameterized attributes ----
    pub fn parameterized_attribute_names(&self) -> &[String] {
        self.parameterized.get_or_init(|| {
            let names = self.backend().parameterized_attribute_names(self.handle);
            names.iter().map(|name| rubyize(name)).collect()
        })
    }
    pub fn has_parameterized_attribute(&self, name: &str) -> bool {
        self.parameterized_attribute_names().iter().any(|n| n == name)
    }
    pub fn parameterized_attribute(&self, name: &str, parameter: &Value) -> Value {
        let parameter = parameter.to_raw();
        match self
            .backend()
            .parameterized_attribute(self.handle, &cocoaify(name), &parameter)
        {
            Some(raw) => self.process(raw),
            None => Value::Nil,
        }
    }

    // ---- actions ----
    pub fn actions(&self) -> &[String] {
        self.actions.get_or_init(|| {
            let names = self.backend().action_names(self.handle);
            names.iter().map(|name| rubyize(name)).collect()
        })
    }
    pub fn perform(&self, action: &str) -> bool {
        self.backend().perform_action(self.handle, &cocoaify(action))
    }

    // ---- hierarchy ----
    pub fn has_children_relation(&self) -> bool {
        self.has_attribute("children")
    }
    /// Empty for leaves and for elements that expired; an error only when the
    /// backend hands back something that is not a list of elements.
    pub fn children(&self) -> Result<Vec<Node>> {
        if !self.has_children_relation() {
            return Ok(Vec::new());
        }
        match self.backend().children(self.handle)? {
            Some(handles) => Ok(handles.into_iter().map(|h| self.wrap(h)).collect()),
            None => {
                debug!(element = %self.handle, "children relation vanished, treating as a leaf");
                Ok(Vec::new())
            }
        }
    }
    pub fn parent(&self) -> Option<Node> {
        self.backend().parent(self.handle).map(|h| self.wrap(h))
    }
    /// The node followed by each of its ancestors up to the top level element.
    pub fn ancestry(&self) -> Vec<Node> {
        std::iter::successors(Some(self.clone()), |node| node.parent()).collect()
    }
    pub fn is_valid(&self) -> bool {
        self.backend().is_valid(self.handle)
    }

    // ---- type ----
    pub fn kind(&self) -> &Arc<TypeDescriptor> {
        self.kind.get_or_init(|| self.resolve_kind())
    }
    fn resolve_kind(&self) -> Arc<TypeDescriptor> {
        let registry = self.session.registry();
        let role = match self.backend().role(self.handle) {
            Some(role) => unprefix(&role),
            // expired or unclassified elements are plain elements
            None => return registry.base(),
        };
        // some elements claim a subrole but report none
        if self.has_attribute("subrole") {
            if let Some(subrole) = self.backend().subrole(self.handle) {
                return registry.resolve_pair(&unprefix(&subrole), &role);
            }
        }
        trace!(element = %self.handle, role = %role, "resolved element type");
        registry.resolve(&role)
    }
    pub fn type_matches(&self, descriptor: &TypeDescriptor) -> bool {
        self.kind().is_a(descriptor)
    }

    // ---- search ----
    pub fn find(&self, kind: &str, filters: &Filters) -> Result<Option<Node>> {
        search::find(self, kind, filters, None)
    }
    pub fn find_all(&self, kind: &str, filters: &Filters) -> Result<Vec<Node>> {
        search::find_all(self, kind, filters, None)
    }
    pub fn search(
        &self,
        kind: &str,
        filters: &Filters,
        predicate: Option<Predicate<'_>>,
        cardinality: Cardinality,
    ) -> Result<SearchResult> {
        search::search(self, kind, filters, predicate, cardinality)
    }
    pub fn ancestor(&self, kind: &str, filters: &Filters) -> Result<Option<Node>> {
        search::ancestor(self, kind, filters, None)
    }

    // used for Display: the first of title, value and identifier that is set
    fn identifier(&self) -> Option<String> {
        for name in ["title", "value", "id"] {
            if !self.has_attribute(name) {
                continue;
            }
            match self.attribute(name) {
                Value::Nil => continue,
                Value::String(s) if s.is_empty() => continue,
                Value::String(s) => return Some(format!("{s:?}")),
                other => return Some(format!("{name}={other}")),
            }
        }
        None
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = f.debug_struct("Node");
        s.field("handle", &self.handle);
        if let Some(kind) = self.kind.get() {
            s.field("kind", &kind.label());
        }
        s.finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#<{}", self.kind())?;
        if let Some(identifier) = self.identifier() {
            write!(f, " {identifier}")?;
        }
        f.write_str(">")
    }
}

// ------------- Node sequences -------------
/// Helpers for search results.
pub trait NodeSliceExt {
    /// True when a search found nothing.
    fn is_blank(&self) -> bool;
    /// The value of `attribute` for each node, in order.
    fn values_of(&self, attribute: &str) -> Vec<Value>;
    /// The type label of each node, in order.
    fn kinds(&self) -> Vec<String>;
}

impl NodeSliceExt for [Node] {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
    fn values_of(&self, attribute: &str) -> Vec<Value> {
        self.iter().map(|node| node.attribute(attribute)).collect()
    }
    fn kinds(&self) -> Vec<String> {
        self.iter().map(|node| node.kind().label().to_string()).collect()
    }
}
