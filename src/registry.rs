use std::sync::{Arc, PoisonError, RwLock};

// label keyed maps use the same fast hasher throughout the crate
use core::hash::{BuildHasherDefault, Hash, Hasher};
use seahash::SeaHasher;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

// used to print out readable forms of a descriptor
use std::fmt;

use lazy_static::lazy_static;
use tracing::debug;

pub type LabelHasher = BuildHasherDefault<SeaHasher>;

/// Every descriptor descends from this one.
pub const BASE_TYPE: &str = "Element";

lazy_static! {
    static ref GLOBAL: Arc<TypeRegistry> = Arc::new(TypeRegistry::new());
}

// ------------- TypeDescriptor -------------
#[derive(Debug)]
pub struct TypeDescriptor {
    label: String,
    parent: Option<Arc<TypeDescriptor>>,
}

impl TypeDescriptor {
    fn new(label: String, parent: Option<Arc<TypeDescriptor>>) -> Self {
        Self { label, parent }
    }
    // Only getters are exposed, so a descriptor is immutable after creation.
    pub fn label(&self) -> &str {
        &self.label
    }
    pub fn parent(&self) -> Option<&Arc<TypeDescriptor>> {
        self.parent.as_ref()
    }
    /// The descriptor itself followed by each of its ancestors.
    pub fn lineage(&self) -> impl Iterator<Item = &TypeDescriptor> {
        std::iter::successors(Some(self), |t| t.parent.as_deref())
    }
    /// True when `self` is `other` or one of its subtypes.
    pub fn is_a(&self, other: &TypeDescriptor) -> bool {
        self.lineage().any(|t| t.label == other.label)
    }
}
// descriptors with the same label are the same type
impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}
impl Eq for TypeDescriptor {}
impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.label)
    }
}

// ------------- TypeRegistry -------------
/// Append-only mapping from role/subrole labels to descriptors.
///
/// Element kinds are not known up front, so descriptors are created the first
/// time a label is observed. Nothing is ever removed, which means a reader
/// that found a descriptor can keep it for as long as it likes.
#[derive(Debug)]
pub struct TypeRegistry {
    base: Arc<TypeDescriptor>,
    kept: RwLock<HashMap<String, Arc<TypeDescriptor>, LabelHasher>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let base = Arc::new(TypeDescriptor::new(BASE_TYPE.to_string(), None));
        let mut kept = HashMap::<String, Arc<TypeDescriptor>, LabelHasher>::default();
        kept.insert(BASE_TYPE.to_string(), Arc::clone(&base));
        Self {
            base,
            kept: RwLock::new(kept),
        }
    }
    /// The process wide registry.
    pub fn global() -> Arc<TypeRegistry> {
        Arc::clone(&GLOBAL)
    }
    pub fn base(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.base)
    }
    pub fn get(&self, label: &str) -> Option<Arc<TypeDescriptor>> {
        // a poisoned map is still consistent since entries are only ever added
        let kept = self.kept.read().unwrap_or_else(PoisonError::into_inner);
        kept.get(label).map(Arc::clone)
    }
    pub fn exists(&self, label: &str) -> bool {
        self.get(label).is_some()
    }
    pub fn resolve(&self, label: &str) -> Arc<TypeDescriptor> {
        if let Some(kept) = self.get(label) {
            return kept;
        }
        self.keep(label, self.base())
    }
    pub fn resolve_pair(&self, subrole: &str, role: &str) -> Arc<TypeDescriptor> {
        if let Some(kept) = self.get(subrole) {
            return kept;
        }
        let parent = self.resolve(role);
        self.keep(subrole, parent)
    }
    // Two callers racing on the same label both end up with the descriptor
    // that won the write lock.
    fn keep(&self, label: &str, parent: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        let mut kept = self.kept.write().unwrap_or_else(PoisonError::into_inner);
        match kept.entry(label.to_string()) {
            Entry::Occupied(e) => Arc::clone(e.get()),
            Entry::Vacant(e) => {
                debug!(label, parent = %parent, "registered element type");
                let descriptor = Arc::new(TypeDescriptor::new(label.to_string(), Some(parent)));
                Arc::clone(e.insert(descriptor))
            }
        }
    }
    pub fn len(&self) -> usize {
        self.kept.read().unwrap_or_else(PoisonError::into_inner).len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
