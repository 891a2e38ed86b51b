//! Naming rules between native accessibility constants and the names callers
//! use.
//!
//! Native attribute names look like `AXTitleUIElement`; callers write
//! `title_ui_element`. Roles lose their prefix (`AXButton` becomes `Button`)
//! and search tokens are classified (`text_fields` becomes `TextField`).
//! Translations are cached since the same few dozen names are translated over
//! and over during a traversal.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use bimap::BiMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::registry::LabelHasher;

lazy_static! {
    static ref TRANSLATOR: Translator = Translator::new();
    static ref PREFIX: Regex = Regex::new(r"^[A-Z]*?AX").unwrap();
    static ref ACRONYM_BOUNDARY: Regex = Regex::new(r"([A-Z\d]+)([A-Z][a-z])").unwrap();
    static ref WORD_BOUNDARY: Regex = Regex::new(r"([a-z\d])([A-Z])").unwrap();
    // most specific first, the first rule that matches wins
    static ref SINGULARS: Vec<(Regex, &'static str)> = [
        (r"(?i)(database)s$", "${1}"),
        (r"(?i)(quiz)zes$", "${1}"),
        (r"(?i)(matr)ices$", "${1}ix"),
        (r"(?i)(vert|ind)ices$", "${1}ex"),
        (r"(?i)(alias|status)(es)?$", "${1}"),
        (r"(?i)(octop|vir)(us|i)$", "${1}us"),
        (r"(?i)^(a)x[ie]s$", "${1}xis"),
        (r"(?i)(cris|test)(is|es)$", "${1}is"),
        (r"(?i)(shoe)s$", "${1}"),
        (r"(?i)(o)es$", "${1}"),
        (r"(?i)(bus)(es)?$", "${1}"),
        (r"(?i)(x|ch|ss|sh)es$", "${1}"),
        (r"(?i)(m)ovies$", "${1}ovie"),
        (r"(?i)(s)eries$", "${1}eries"),
        (r"(?i)([^aeiouy]|qu)ies$", "${1}y"),
        (r"(?i)([lr])ves$", "${1}f"),
        (r"(?i)(tive|hive)s$", "${1}"),
        (r"(?i)([^f])ves$", "${1}fe"),
        (r"(?i)(analy|ba|diagno|parenthe|progno|synop|the)(sis|ses)$", "${1}sis"),
        (r"(?i)(n)ews$", "${1}ews"),
        (r"(?i)(ss)$", "${1}"),
        (r"(?i)s$", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect();
}

const UNCOUNTABLES: [&str; 10] = [
    "equipment", "information", "rice", "money", "species", "series", "fish", "sheep", "jeans", "police",
];

const ACRONYMS: [&str; 3] = ["UI", "RTF", "URL"];

// names that do not follow the regular rules
const PRELOADS: [(&str, &str); 3] = [
    ("id", "AXIdentifier"),
    ("placeholder", "AXPlaceholderValue"),
    ("application_running", "AXIsApplicationRunning"),
];

pub struct Translator {
    // caller name on the left, native name on the right
    names: RwLock<BiMap<String, String>>,
    classifications: RwLock<HashMap<String, String, LabelHasher>>,
}

impl Translator {
    fn new() -> Self {
        let mut names = BiMap::new();
        for (friendly, native) in PRELOADS {
            names.insert(friendly.to_string(), native.to_string());
        }
        Self {
            names: RwLock::new(names),
            classifications: RwLock::new(HashMap::default()),
        }
    }

    pub fn instance() -> &'static Translator {
        &TRANSLATOR
    }

    /// `AXTitleUIElement` -> `title_ui_element`
    pub fn rubyize(&self, native: &str) -> String {
        if let Some(friendly) = self.read_names().get_by_right(native) {
            return friendly.clone();
        }
        let friendly = underscore(&unprefix(native));
        self.remember(&friendly, native);
        friendly
    }

    /// `title_ui_element` -> `AXTitleUIElement`; a trailing `?` is ignored.
    pub fn cocoaify(&self, friendly: &str) -> String {
        let friendly = friendly.strip_suffix('?').unwrap_or(friendly);
        if let Some(native) = self.read_names().get_by_left(friendly) {
            return native.clone();
        }
        let native = format!("AX{}", camelize(friendly));
        self.remember(friendly, &native);
        native
    }

    /// `buttons` -> `Button`, `text_field` -> `TextField`
    pub fn classify(&self, token: &str) -> String {
        if let Some(class) = self
            .classifications
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
        {
            return class.clone();
        }
        let class = camelize(&singularize(token));
        self.classifications
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.to_string(), class.clone());
        class
    }

    fn read_names(&self) -> std::sync::RwLockReadGuard<'_, BiMap<String, String>> {
        self.names.read().unwrap_or_else(PoisonError::into_inner)
    }

    // Keeps the first pairing for either side; a later conflicting pair is
    // simply recomputed on each use.
    fn remember(&self, friendly: &str, native: &str) {
        let _ = self
            .names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert_no_overwrite(friendly.to_string(), native.to_string());
    }
}

/// Strip the namespace prefix from a native constant (`AXButton` -> `Button`,
/// `MCAXEnabled` -> `Enabled`).
pub fn unprefix(key: &str) -> String {
    let stripped = PREFIX.replace(key, "");
    stripped.split_whitespace().collect()
}

pub fn underscore(word: &str) -> String {
    let word = ACRONYM_BOUNDARY.replace_all(word, "${1}_${2}");
    let word = WORD_BOUNDARY.replace_all(&word, "${1}_${2}");
    word.replace('-', "_").to_lowercase()
}

pub fn camelize(word: &str) -> String {
    word.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let upper = part.to_uppercase();
            if ACRONYMS.contains(&upper.as_str()) {
                return upper;
            }
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Singular form of the last word in `word`, following the usual English
/// inflection rules. Case of the stem is kept.
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    let last = lower.rsplit('_').next().unwrap_or(&lower);
    if UNCOUNTABLES.contains(&last) {
        return word.to_string();
    }
    match SINGULARS.iter().find(|(rule, _)| rule.is_match(word)) {
        Some((rule, replacement)) => rule.replace(word, *replacement).into_owned(),
        None => word.to_string(),
    }
}

pub fn rubyize(native: &str) -> String {
    Translator::instance().rubyize(native)
}

pub fn cocoaify(friendly: &str) -> String {
    Translator::instance().cocoaify(friendly)
}

pub fn classify(token: &str) -> String {
    Translator::instance().classify(token)
}
