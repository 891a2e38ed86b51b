//! An in-memory element tree.
//!
//! [`MemoryTree`] implements [`Accessible`] over a snapshot that was either
//! loaded from JSON or built in code. It is what the tests, the benchmark and
//! the command line tool search through.
//!
//! Snapshot format: every element has a `role` and may have a `subrole`, an
//! `id`, `attributes`, `actions`, the names of `writable` attributes and a
//! `children` list. Attribute and action names may be given in either form
//! (`title` or `AXTitle`), roles with or without the `AX` prefix. Attribute
//! values are JSON scalars, arrays, `{"location": 0, "length": 2}` ranges or
//! `{"$ref": "some-id"}` references to another element.
//!
//! ```json
//! { "role": "Window", "subrole": "StandardWindow", "attributes": { "title": "Mail" },
//!   "children": [ { "role": "Button", "attributes": { "title": "Send" }, "actions": ["press"] } ] }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

use crate::backend::{self, Accessible, Handle};
use crate::error::{AxError, Result};
use crate::registry::LabelHasher;
use crate::translator::cocoaify;
use crate::value::{RawValue, Value};

// ------------- Snapshot format -------------
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subrole: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, Json>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub writable: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SnapshotElement>>,
    /// Makes the backend answer garbage when asked for this element's children.
    #[serde(default)]
    pub malformed: bool,
}

impl SnapshotElement {
    pub fn new(role: &str) -> Self {
        Self {
            role: role.to_string(),
            ..Self::default()
        }
    }
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }
    pub fn subrole(mut self, subrole: &str) -> Self {
        self.subrole = Some(subrole.to_string());
        self
    }
    pub fn attr(mut self, name: &str, value: impl Into<Json>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
    pub fn action(mut self, action: &str) -> Self {
        self.actions.push(action.to_string());
        self
    }
    /// Adds a child, turning a leaf into a container.
    pub fn child(mut self, child: SnapshotElement) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child);
        self
    }
}

// ------------- MemoryTree -------------
#[derive(Debug, Default)]
struct Entry {
    attributes: Vec<(String, RawValue)>,
    actions: Vec<String>,
    writable: HashSet<String>,
    children: Option<Vec<Handle>>,
    malformed: bool,
}

impl Entry {
    fn get(&self, name: &str) -> Option<&RawValue> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// How often each backend call was made, see [`MemoryTree::counts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchCounts {
    pub attribute_names: usize,
    pub attributes: usize,
    pub children: usize,
}

impl FetchCounts {
    pub fn total(&self) -> usize {
        self.attribute_names + self.attributes + self.children
    }
}

#[derive(Debug, Default)]
struct Counters {
    attribute_names: AtomicUsize,
    attributes: AtomicUsize,
    children: AtomicUsize,
}

#[derive(Debug)]
pub struct MemoryTree {
    entries: RwLock<Vec<Entry>>,
    ids: HashMap<String, Handle, LabelHasher>,
    invalid: RwLock<HashSet<Handle>>,
    performed: Mutex<Vec<(Handle, String)>>,
    counters: Counters,
}

impl MemoryTree {
    pub fn new(root: SnapshotElement) -> Result<Self> {
        let mut flat = Vec::new();
        flatten(&root, None, &mut flat);
        let mut ids = HashMap::<String, Handle, LabelHasher>::default();
        for (index, (element, _, _)) in flat.iter().enumerate() {
            if let Some(id) = &element.id {
                if ids.insert(id.clone(), handle_at(index)).is_some() {
                    return Err(AxError::Snapshot(format!("duplicate element id '{id}'")));
                }
            }
        }
        let entries = flat
            .iter()
            .map(|(element, parent, children)| build_entry(element, *parent, children.clone(), &ids))
            .collect::<Result<Vec<_>>>()?;
        debug!(elements = entries.len(), "loaded snapshot");
        Ok(Self {
            entries: RwLock::new(entries),
            ids,
            invalid: RwLock::new(HashSet::new()),
            performed: Mutex::new(Vec::new()),
            counters: Counters::default(),
        })
    }
    pub fn from_json(json: Json) -> Result<Self> {
        Self::new(serde_json::from_value(json)?)
    }
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::new(serde_json::from_reader(reader)?)
    }
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn root(&self) -> Handle {
        handle_at(0)
    }
    /// The handle of the element with the given snapshot `id`.
    pub fn handle_of(&self, id: &str) -> Option<Handle> {
        self.ids.get(id).copied()
    }
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// From now on the element behaves like one that was destroyed.
    pub fn invalidate(&self, element: Handle) {
        self.invalid
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(element);
    }
    pub fn counts(&self) -> FetchCounts {
        FetchCounts {
            attribute_names: self.counters.attribute_names.load(Ordering::Relaxed),
            attributes: self.counters.attributes.load(Ordering::Relaxed),
            children: self.counters.children.load(Ordering::Relaxed),
        }
    }
    pub fn reset_counts(&self) {
        self.counters.attribute_names.store(0, Ordering::Relaxed);
        self.counters.attributes.store(0, Ordering::Relaxed);
        self.counters.children.store(0, Ordering::Relaxed);
    }
    /// Actions performed so far, oldest first.
    pub fn performed(&self) -> Vec<(Handle, String)> {
        self.performed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, Vec<Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }
    fn is_invalid(&self, element: Handle) -> bool {
        self.invalid
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&element)
    }
    // None for unknown or invalidated handles
    fn with_entry<T>(&self, element: Handle, f: impl FnOnce(&Entry) -> T) -> Option<T> {
        if self.is_invalid(element) {
            return None;
        }
        let entries = self.read_entries();
        let index = usize::try_from(element.0).ok()?;
        entries.get(index).map(f)
    }
}

fn handle_at(index: usize) -> Handle {
    Handle(index as u64)
}

// Pre-order, so the root is handle 0 and ids can be resolved in a second pass.
fn flatten<'s>(
    element: &'s SnapshotElement,
    parent: Option<Handle>,
    flat: &mut Vec<(&'s SnapshotElement, Option<Handle>, Option<Vec<Handle>>)>,
) -> Handle {
    let handle = handle_at(flat.len());
    flat.push((element, parent, None));
    if let Some(children) = &element.children {
        let handles = children
            .iter()
            .map(|child| flatten(child, Some(handle), flat))
            .collect();
        flat[handle.0 as usize].2 = Some(handles);
    }
    handle
}

fn native_name(name: &str) -> String {
    if name.starts_with("AX") {
        name.to_string()
    } else {
        cocoaify(name)
    }
}

fn native_role(role: &str) -> String {
    if role.starts_with("AX") {
        role.to_string()
    } else {
        format!("AX{role}")
    }
}

fn build_entry(
    element: &SnapshotElement,
    parent: Option<Handle>,
    children: Option<Vec<Handle>>,
    ids: &HashMap<String, Handle, LabelHasher>,
) -> Result<Entry> {
    let mut attributes = vec![(
        backend::ROLE.to_string(),
        Value::String(native_role(&element.role)),
    )];
    if let Some(subrole) = &element.subrole {
        attributes.push((backend::SUBROLE.to_string(), Value::String(native_role(subrole))));
    }
    for (name, json) in &element.attributes {
        attributes.push((native_name(name), convert(json, ids)?));
    }
    if let Some(children) = &children {
        let list = children.iter().map(|h| Value::Element(*h)).collect();
        attributes.push((backend::CHILDREN.to_string(), Value::Array(list)));
    }
    if let Some(parent) = parent {
        attributes.push((backend::PARENT.to_string(), Value::Element(parent)));
    }
    Ok(Entry {
        attributes,
        actions: element.actions.iter().map(|a| native_name(a)).collect(),
        writable: element.writable.iter().map(|w| native_name(w)).collect(),
        children,
        malformed: element.malformed,
    })
}

fn convert(json: &Json, ids: &HashMap<String, Handle, LabelHasher>) -> Result<RawValue> {
    let value = match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| convert(item, ids))
                .collect::<Result<Vec<_>>>()?,
        ),
        Json::Object(object) => {
            if let Some(reference) = object.get("$ref").and_then(Json::as_str) {
                let handle = ids.get(reference).ok_or_else(|| {
                    AxError::Snapshot(format!("reference to unknown element '{reference}'"))
                })?;
                Value::Element(*handle)
            } else if let (Some(location), Some(length)) = (
                object.get("location").and_then(Json::as_u64),
                object.get("length").and_then(Json::as_u64),
            ) {
                Value::Range {
                    location: location as usize,
                    length: length as usize,
                }
            } else {
                return Err(AxError::Snapshot(format!("unsupported attribute value {json}")));
            }
        }
    };
    Ok(value)
}

// characters of `text` in the given range, or None when it runs past the end
fn substring(text: &str, location: usize, length: usize) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let end = location.checked_add(length)?;
    chars.get(location..end).map(|slice| slice.iter().collect())
}

impl Accessible for MemoryTree {
    fn attribute_names(&self, element: Handle) -> Vec<String> {
        self.counters.attribute_names.fetch_add(1, Ordering::Relaxed);
        self.with_entry(element, |entry| {
            entry.attributes.iter().map(|(name, _)| name.clone()).collect()
        })
        .unwrap_or_default()
    }

    fn attribute(&self, element: Handle, name: &str) -> Option<RawValue> {
        self.counters.attributes.fetch_add(1, Ordering::Relaxed);
        self.with_entry(element, |entry| entry.get(name).cloned())
            .flatten()
    }

    fn children(&self, element: Handle) -> Result<Option<Vec<Handle>>> {
        self.counters.children.fetch_add(1, Ordering::Relaxed);
        match self.with_entry(element, |entry| (entry.malformed, entry.children.clone())) {
            Some((true, _)) => Err(AxError::Invariant(format!(
                "children of element {element} are not a list of elements"
            ))),
            Some((false, children)) => Ok(children),
            None => Ok(None),
        }
    }

    fn parameterized_attribute_names(&self, element: Handle) -> Vec<String> {
        self.with_entry(element, |entry| match entry.get(backend::VALUE) {
            Some(Value::String(_)) => vec![backend::STRING_FOR_RANGE.to_string()],
            _ => Vec::new(),
        })
        .unwrap_or_default()
    }

    fn parameterized_attribute(
        &self,
        element: Handle,
        name: &str,
        parameter: &RawValue,
    ) -> Option<RawValue> {
        if name != backend::STRING_FOR_RANGE {
            return None;
        }
        let Value::Range { location, length } = parameter else {
            return None;
        };
        self.with_entry(element, |entry| match entry.get(backend::VALUE) {
            Some(Value::String(text)) => substring(text, *location, *length).map(Value::String),
            _ => None,
        })
        .flatten()
    }

    fn action_names(&self, element: Handle) -> Vec<String> {
        self.with_entry(element, |entry| entry.actions.clone())
            .unwrap_or_default()
    }

    fn perform_action(&self, element: Handle, action: &str) -> bool {
        let known = self
            .with_entry(element, |entry| entry.actions.iter().any(|a| a == action))
            .unwrap_or(false);
        if known {
            self.performed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((element, action.to_string()));
        }
        known
    }

    fn is_writable(&self, element: Handle, name: &str) -> bool {
        self.with_entry(element, |entry| entry.writable.contains(name))
            .unwrap_or(false)
    }

    fn set_attribute(&self, element: Handle, name: &str, value: RawValue) -> Result<()> {
        if !self.is_writable(element, name) {
            return Err(AxError::ReadOnly {
                attribute: name.to_string(),
                element: element.to_string(),
            });
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .get_mut(element.0 as usize)
            .ok_or_else(|| AxError::Invariant(format!("no element {element}")))?;
        match entry.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => entry.attributes.push((name.to_string(), value)),
        }
        Ok(())
    }

    fn is_valid(&self, element: Handle) -> bool {
        !self.is_invalid(element) && (element.0 as usize) < self.len()
    }
}
