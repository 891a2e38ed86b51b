//! Answers whether a given node is the kind of node a search is looking for.
//!
//! A [`Qualifier`] is built from a type token, a map of [`Filters`] and an
//! optional predicate. The filters are compiled once into [`FilterRule`]s so
//! that checking a candidate does not have to inspect the shape of every
//! filter again.
//!
//! ```
//! use regex::Regex;
//! use axquery::filters;
//! use axquery::qualifier::Qualifier;
//!
//! let filters = filters! { "title" => "Log In", "role_description" => Regex::new("button").unwrap() };
//! let qualifier = Qualifier::new("button", &filters);
//! assert_eq!(qualifier.describe(), r#"Button(title: "Log In", role_description: /button/)"#);
//! ```

use std::fmt;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use regex::Regex;
use tracing::{trace, warn};

use crate::element::Node;
use crate::error::Result;
use crate::registry::TypeDescriptor;
use crate::search;
use crate::translator::classify;
use crate::value::Value;

/// Custom acceptance test, run after every other filter passed.
pub type Predicate<'p> = &'p dyn Fn(&Node) -> bool;

// ------------- Filters -------------
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKey {
    Attribute(String),
    /// An attribute computed from an extra parameter, e.g. a sub-range.
    Parameterized(String, Value),
}

impl FilterKey {
    pub fn attribute(&self) -> &str {
        match self {
            FilterKey::Attribute(attribute) => attribute,
            FilterKey::Parameterized(attribute, _) => attribute,
        }
    }
}
impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FilterKey::Attribute(attribute) => f.write_str(attribute),
            FilterKey::Parameterized(attribute, param) => {
                write!(f, "{attribute}[{}]", param.inspect())
            }
        }
    }
}
impl From<&str> for FilterKey {
    fn from(attribute: &str) -> Self {
        FilterKey::Attribute(attribute.to_string())
    }
}
impl From<String> for FilterKey {
    fn from(attribute: String) -> Self {
        FilterKey::Attribute(attribute)
    }
}
impl<S: Into<String>, P: Into<Value>> From<(S, P)> for FilterKey {
    fn from((attribute, param): (S, P)) -> Self {
        FilterKey::Parameterized(attribute.into(), param.into())
    }
}

#[derive(Debug, Clone)]
pub enum Expected {
    Value(Value),
    Pattern(Regex),
    /// Sub-filters for a nested search.
    Nested(Filters),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expected::Value(value) => f.write_str(&value.inspect()),
            Expected::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
            Expected::Nested(filters) => write!(f, "{filters}"),
        }
    }
}
macro_rules! expected_value_from {
    ($($source:ty),+) => {$(
        impl From<$source> for Expected {
            fn from(value: $source) -> Self {
                Expected::Value(value.into())
            }
        }
    )+};
}
expected_value_from!(Value, Node, &str, String, bool, i64, i32, f64, std::ops::Range<usize>);

/// Ordered attribute constraints, all of which must hold.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    entries: Vec<(FilterKey, Expected)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }
    /// Adds a constraint; a second constraint on the same key replaces the first.
    pub fn insert(&mut self, key: impl Into<FilterKey>, expected: impl Into<Expected>) {
        let key = key.into();
        let expected = expected.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = expected,
            None => self.entries.push((key, expected)),
        }
    }
    pub fn with(mut self, key: impl Into<FilterKey>, expected: impl Into<Expected>) -> Self {
        self.insert(key, expected);
        self
    }
    pub fn matching(self, key: impl Into<FilterKey>, pattern: Regex) -> Self {
        self.with(key, Expected::Pattern(pattern))
    }
    pub fn nested(self, kind: &str, filters: Filters) -> Self {
        self.with(kind, Expected::Nested(filters))
    }
    pub fn iter(&self) -> impl Iterator<Item = &(FilterKey, Expected)> {
        self.entries.iter()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Regex> for Expected {
    fn from(pattern: Regex) -> Self {
        Expected::Pattern(pattern)
    }
}
impl From<Filters> for Expected {
    fn from(filters: Filters) -> Self {
        Expected::Nested(filters)
    }
}

impl fmt::Display for Filters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.entries.is_empty() {
            return Ok(());
        }
        let list: Vec<String> = self
            .entries
            .iter()
            .map(|(key, expected)| match expected {
                Expected::Nested(filters) => format!("{key}{filters}"),
                other => format!("{key}: {other}"),
            })
            .collect();
        write!(f, "({})", list.join(", "))
    }
}

/// Builds [`Filters`] from `key => value` pairs.
///
/// Keys are attribute names or `(attribute, parameter)` pairs; values are
/// anything that converts into a [`Value`], a [`Regex`], or nested `Filters`.
#[macro_export]
macro_rules! filters {
    () => { $crate::qualifier::Filters::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut filters = $crate::qualifier::Filters::new();
        $( filters.insert($key, $value); )+
        filters
    }};
}

// ------------- FilterRule -------------
#[derive(Debug, Clone)]
pub enum FilterRule {
    Equality { attribute: String, value: Value },
    RegexMatch { attribute: String, pattern: Regex },
    HasDescendant { kind: String, filters: Filters },
    ParamEquality { attribute: String, param: Value, value: Value },
    ParamRegexMatch { attribute: String, param: Value, pattern: Regex },
    PredicateCheck,
}

// ------------- Qualifier -------------
pub struct Qualifier<'p> {
    kind: String,
    filters: Filters,
    rules: Vec<FilterRule>,
    predicate: Option<Predicate<'p>>,
    // a filter shape that can never be satisfied
    malformed: bool,
    target: OnceCell<Arc<TypeDescriptor>>,
}

impl<'p> Qualifier<'p> {
    pub fn new(kind: &str, filters: &Filters) -> Self {
        Self::build(kind, filters, None)
    }
    pub fn with_predicate(kind: &str, filters: &Filters, predicate: Predicate<'p>) -> Self {
        Self::build(kind, filters, Some(predicate))
    }
    pub fn build(kind: &str, filters: &Filters, predicate: Option<Predicate<'p>>) -> Self {
        let mut qualifier = Self {
            kind: classify(kind),
            filters: filters.clone(),
            rules: Vec::with_capacity(filters.len() + 1),
            predicate,
            malformed: false,
            target: OnceCell::new(),
        };
        qualifier.compile();
        trace!(qualifier = %qualifier.describe(), rules = qualifier.rules.len(), "compiled qualifier");
        qualifier
    }

    fn compile(&mut self) {
        for (key, expected) in self.filters.iter() {
            let rule = match (key, expected) {
                (FilterKey::Attribute(kind), Expected::Nested(filters)) => FilterRule::HasDescendant {
                    kind: kind.clone(),
                    filters: filters.clone(),
                },
                (FilterKey::Parameterized(attribute, _), Expected::Nested(_)) => {
                    warn!(attribute = %attribute, "nested filters cannot hang off a parameterized attribute");
                    self.malformed = true;
                    continue;
                }
                (FilterKey::Parameterized(attribute, param), Expected::Pattern(pattern)) => {
                    FilterRule::ParamRegexMatch {
                        attribute: attribute.clone(),
                        param: param.clone(),
                        pattern: pattern.clone(),
                    }
                }
                (FilterKey::Parameterized(attribute, param), Expected::Value(value)) => {
                    FilterRule::ParamEquality {
                        attribute: attribute.clone(),
                        param: param.clone(),
                        value: value.clone(),
                    }
                }
                (FilterKey::Attribute(attribute), Expected::Pattern(pattern)) => FilterRule::RegexMatch {
                    attribute: attribute.clone(),
                    pattern: pattern.clone(),
                },
                (FilterKey::Attribute(attribute), Expected::Value(value)) => FilterRule::Equality {
                    attribute: attribute.clone(),
                    value: value.clone(),
                },
            };
            self.rules.push(rule);
        }
        if self.predicate.is_some() {
            self.rules.push(FilterRule::PredicateCheck);
        }
    }

    /// The classified type token, e.g. `Button` for `buttons`.
    pub fn kind(&self) -> &str {
        &self.kind
    }
    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn qualifies(&self, node: &Node) -> Result<bool> {
        if self.malformed || !self.the_right_type(node) {
            return Ok(false);
        }
        for rule in &self.rules {
            if !self.check(rule, node)? {
                trace!(element = %node.handle(), rule = ?rule, "rejected");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// `Button(title: "Yes")`, with `[✔]` appended when a predicate is present.
    pub fn describe(&self) -> String {
        let checked = if self.predicate.is_some() { "[✔]" } else { "" };
        format!("{}{}{}", self.kind, self.filters, checked)
    }

    // The candidate's own type is resolved first, so its label is registered
    // before the target is looked up. A target that was never observed is
    // not cached, since a later candidate may introduce it.
    fn the_right_type(&self, node: &Node) -> bool {
        let kind = node.kind();
        if let Some(target) = self.target.get() {
            return kind.is_a(target);
        }
        match node.session().registry().get(&self.kind) {
            Some(target) => kind.is_a(self.target.get_or_init(|| target)),
            None => false,
        }
    }

    fn check(&self, rule: &FilterRule, node: &Node) -> Result<bool> {
        let accepted = match rule {
            FilterRule::Equality { attribute, value } => {
                node.has_attribute(attribute) && node.attribute(attribute) == *value
            }
            FilterRule::RegexMatch { attribute, pattern } => {
                node.has_attribute(attribute) && pattern.is_match(&node.attribute(attribute).to_string())
            }
            FilterRule::HasDescendant { kind, filters } => {
                // any match settles it, so there is no reason to pull further
                search::find(node, kind, filters, None)?.is_some()
            }
            FilterRule::ParamEquality { attribute, param, value } => {
                node.has_parameterized_attribute(attribute)
                    && node.parameterized_attribute(attribute, param) == *value
            }
            FilterRule::ParamRegexMatch { attribute, param, pattern } => {
                node.has_parameterized_attribute(attribute)
                    && pattern.is_match(&node.parameterized_attribute(attribute, param).to_string())
            }
            FilterRule::PredicateCheck => match self.predicate {
                Some(predicate) => predicate(node),
                None => true,
            },
        };
        Ok(accepted)
    }
}

impl fmt::Debug for Qualifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Qualifier")
            .field("kind", &self.kind)
            .field("rules", &self.rules)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}
