use std::sync::Arc;

use regex::Regex;
use serde_json::json;

use axquery::element::{Node, Session};
use axquery::qualifier::{FilterRule, Filters, Predicate, Qualifier};
use axquery::registry::TypeRegistry;
use axquery::search;
use axquery::snapshot::MemoryTree;
use axquery::{filters, NodeSliceExt, Value};

fn setup() -> (Arc<MemoryTree>, Node) {
    let tree = Arc::new(
        MemoryTree::from_json(json!({
            "role": "Window",
            "attributes": { "title": "Preferences" },
            "children": [
                { "id": "enabled", "role": "CheckBox", "attributes": { "title": "Sync", "enabled": true, "value": 1 } },
                { "id": "disabled", "role": "CheckBox", "attributes": { "title": "Backup", "enabled": false, "value": 0 } },
                { "id": "field", "role": "TextField", "attributes": { "value": "AXElements", "placeholder": null } },
                { "id": "general", "role": "Group", "attributes": { "role_description": "group" }, "children": [
                    { "id": "save", "role": "Button", "attributes": { "title": "Save" } }
                ] },
                { "id": "advanced", "role": "Group", "children": [
                    { "id": "reset", "role": "Button", "attributes": { "title": "Reset" } }
                ] }
            ]
        }))
        .unwrap(),
    );
    let session = Session::new(tree.clone()).with_registry(Arc::new(TypeRegistry::new()));
    let root = Node::new(Arc::new(session), tree.root());
    (tree, root)
}

fn found(tree: &MemoryTree, nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .map(|node| {
            let id = ["enabled", "disabled", "field", "general", "save", "advanced", "reset"]
                .into_iter()
                .find(|id| tree.handle_of(id) == Some(node.handle()));
            id.unwrap_or("?").to_string()
        })
        .collect()
}

#[test]
fn absent_attributes_are_a_non_match() {
    let (tree, root) = setup();
    let titled = root.find_all("element", &filters! { "title" => "Sync" }).unwrap();
    assert_eq!(found(&tree, &titled), vec!["enabled"]);
    let described = root.find_all("groups", &filters! { "role_description" => "group" }).unwrap();
    assert_eq!(found(&tree, &described), vec!["general"]);
    let patterned = root
        .find_all("groups", &filters! { "role_description" => Regex::new(".*").unwrap() })
        .unwrap();
    assert_eq!(found(&tree, &patterned), vec!["general"]);
}

#[test]
fn booleans_are_never_coerced() {
    let (tree, root) = setup();
    let enabled = root.find_all("check_boxes", &filters! { "enabled" => true }).unwrap();
    assert_eq!(found(&tree, &enabled), vec!["enabled"]);
    assert!(root.find_all("check_boxes", &filters! { "enabled" => "true" }).unwrap().is_blank());
    assert!(root.find_all("check_boxes", &filters! { "value" => true }).unwrap().is_blank());
    assert!(root.find_all("check_boxes", &filters! { "enabled" => 1 }).unwrap().is_blank());
    let one = root.find_all("check_boxes", &filters! { "value" => 1 }).unwrap();
    assert_eq!(found(&tree, &one), vec!["enabled"]);
}

#[test]
fn nil_matches_nil() {
    let (tree, root) = setup();
    let field = root.find_all("text_field", &filters! { "placeholder" => Value::Nil }).unwrap();
    assert_eq!(found(&tree, &field), vec!["field"]);
    // an absent attribute is not the same as one that is present and empty
    assert!(root.find_all("check_box", &filters! { "placeholder" => Value::Nil }).unwrap().is_blank());
    // nil renders as the empty string for patterns
    let empty = root
        .find_all("text_field", &filters! { "placeholder" => Regex::new("^$").unwrap() })
        .unwrap();
    assert_eq!(found(&tree, &empty), vec!["field"]);
}

#[test]
fn patterns_match_the_rendered_value() {
    let (tree, root) = setup();
    let checked = root
        .find_all("check_boxes", &filters! { "title" => Regex::new("^S").unwrap() })
        .unwrap();
    assert_eq!(found(&tree, &checked), vec!["enabled"]);
    let numeric = root
        .find_all("check_boxes", &filters! { "value" => Regex::new("^0$").unwrap() })
        .unwrap();
    assert_eq!(found(&tree, &numeric), vec!["disabled"]);
}

#[test]
fn nested_filters_search_below_the_candidate() {
    let (tree, root) = setup();
    let filters = Filters::new().nested("button", filters! { "title" => "Reset" });
    let groups = root.find_all("groups", &filters).unwrap();
    assert_eq!(found(&tree, &groups), vec!["advanced"]);
    let any_button = filters! { "buttons" => filters! {} };
    assert_eq!(found(&tree, &root.find_all("groups", &any_button).unwrap()), vec!["general", "advanced"]);
    let nothing = filters! { "button" => filters! { "title" => "Quit" } };
    assert!(root.find("group", &nothing).unwrap().is_none());
}

#[test]
fn parameterized_attributes() {
    let (tree, root) = setup();
    let prefix = filters! { ("string_for_range", 0usize..2) => "AX" };
    let field = root.find("text_field", &prefix).unwrap().unwrap();
    assert_eq!(found(&tree, &[field]), vec!["field"]);
    let pattern = filters! { ("string_for_range", 2usize..10) => Regex::new("^Elements$").unwrap() };
    assert!(root.find("text_field", &pattern).unwrap().is_some());
    let mismatch = filters! { ("string_for_range", 0usize..2) => "NS" };
    assert!(root.find("text_field", &mismatch).unwrap().is_none());
    // check boxes have no string value to take a range of
    assert_eq!(root.find_all("element", &prefix).unwrap().len(), 1);
}

#[test]
fn nested_filters_on_a_parameterized_key_never_match() {
    let (_, root) = setup();
    let mut malformed = Filters::new();
    malformed.insert(("string_for_range", 0usize..2), filters! { "title" => "AX" });
    assert!(root.find_all("text_fields", &malformed).unwrap().is_empty());
    assert!(Qualifier::new("text_field", &malformed).rules().is_empty());
}

#[test]
fn predicates_run_last() {
    let (tree, root) = setup();
    let long_title: Predicate = &|node: &Node| {
        node.attribute("title").as_str().is_some_and(|title| title.len() > 4)
    };
    let boxes = search::find_all(&root, "check_boxes", &filters! {}, Some(long_title)).unwrap();
    assert_eq!(found(&tree, &boxes), vec!["disabled"]);
    let enabled = filters! { "enabled" => true };
    assert!(search::find(&root, "check_box", &enabled, Some(long_title)).unwrap().is_none());
    let qualifier = Qualifier::with_predicate("check_box", &enabled, long_title);
    assert!(matches!(qualifier.rules().last(), Some(FilterRule::PredicateCheck)));
}

#[test]
fn descriptions() {
    assert_eq!(Qualifier::new("Button", &filters! { "title" => "X" }).describe(), r#"Button(title: "X")"#);
    assert_eq!(Qualifier::new("buttons", &filters! {}).describe(), "Button");
    let nested = filters! { "title" => Regex::new("^S").unwrap(), "button" => filters! { "enabled" => true } };
    assert_eq!(
        Qualifier::new("group", &nested).describe(),
        r#"Group(title: /^S/, button(enabled: true))"#
    );
    let parameterized = filters! { ("string_for_range", 0usize..2) => "AX", "value" => Value::Nil };
    assert_eq!(
        Qualifier::new("text_field", &parameterized).describe(),
        r#"TextField(string_for_range[{0, 2}]: "AX", value: nil)"#
    );
    let always: Predicate = &|_: &Node| true;
    assert_eq!(
        Qualifier::with_predicate("window", &filters! { "title" => "X" }, always).describe(),
        r#"Window(title: "X")[✔]"#
    );
}

#[test]
fn later_filters_replace_earlier_ones() {
    let filters = filters! { "title" => "A", "title" => "B" };
    assert_eq!(filters.len(), 1);
    assert_eq!(Qualifier::new("button", &filters).describe(), r#"Button(title: "B")"#);
}
