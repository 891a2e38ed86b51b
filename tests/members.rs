use std::sync::Arc;

use serde_json::json;

use axquery::element::{Node, Session};
use axquery::error::AxError;
use axquery::member::{implicit_search, Member};
use axquery::registry::TypeRegistry;
use axquery::search::{Cardinality, SearchResult};
use axquery::settings::Settings;
use axquery::snapshot::MemoryTree;
use axquery::{debug, filters, NodeSliceExt, Value};

fn setup(settings: Settings) -> (Arc<MemoryTree>, Node) {
    let tree = Arc::new(
        MemoryTree::from_json(json!({
            "role": "Application",
            "attributes": { "title": "Mail" },
            "children": [
                { "id": "window", "role": "Window", "subrole": "StandardWindow", "attributes": { "title": "Inbox" }, "children": [
                    { "id": "send", "role": "Button", "attributes": { "title": "Send" }, "actions": ["press"] },
                    { "id": "search", "role": "TextField", "attributes": { "value": "from:me" }, "writable": ["value"] }
                ] }
            ]
        }))
        .unwrap(),
    );
    let session = Session::new(tree.clone())
        .with_registry(Arc::new(TypeRegistry::new()))
        .with_settings(settings);
    let root = Node::new(Arc::new(session), tree.root());
    (tree, root)
}

fn node(tree: &MemoryTree, root: &Node, id: &str) -> Node {
    Node::new(Arc::clone(root.session()), tree.handle_of(id).unwrap())
}

#[test]
fn names_resolve_in_order() {
    let (tree, root) = setup(Settings::default());
    let window = node(&tree, &root, "window");
    assert_eq!(window.resolve_member("title"), Member::Attribute(Value::from("Inbox")));
    assert_eq!(
        window.resolve_member("buttons"),
        Member::SearchRequest { kind: "buttons".to_string(), cardinality: Cardinality::All }
    );
    assert_eq!(
        window.resolve_member("text_field"),
        Member::SearchRequest { kind: "text_field".to_string(), cardinality: Cardinality::One }
    );

    let send = node(&tree, &root, "send");
    assert_eq!(send.resolve_member("press"), Member::Action("press".to_string()));
    // a leaf cannot be searched
    assert_eq!(send.resolve_member("buttons"), Member::NotFound);

    let field = node(&tree, &root, "search");
    assert_eq!(
        field.resolve_member("string_for_range"),
        Member::ParameterizedAttribute("string_for_range".to_string())
    );
    assert_eq!(field.parameterized_attribute("string_for_range", &Value::from(0usize..4)), Value::from("from"));
}

#[test]
fn implicit_search_reads_cardinality_off_the_name() {
    let (_, root) = setup(Settings::default());
    match implicit_search(&root, "buttons", &filters! {}).unwrap() {
        SearchResult::All(buttons) => assert_eq!(buttons.values_of("title"), vec![Value::from("Send")]),
        other => panic!("expected all buttons, got {other:?}"),
    }
    match implicit_search(&root, "window", &filters! {}).unwrap() {
        SearchResult::One(Some(window)) => assert_eq!(window.to_string(), r#"#<StandardWindow "Inbox">"#),
        other => panic!("expected one window, got {other:?}"),
    }
}

#[test]
fn failed_implicit_search_explains_itself() {
    let (tree, root) = setup(Settings::default());
    let window = node(&tree, &root, "window");
    let err = implicit_search(&window, "button", &filters! { "title" => "Nope" }).unwrap_err();
    let AxError::SearchFailure { message } = &err else {
        panic!("unexpected error {err}");
    };
    assert_eq!(
        message,
        "Could not find `Button(title: \"Nope\")` as a child of StandardWindow\n\
         Element Path:\n\t#<StandardWindow \"Inbox\">\n\t#<Application \"Mail\">"
    );
    assert_eq!(err.to_string(), *message);
}

#[test]
fn debug_mode_appends_the_subtree() {
    let settings = Settings { debug: true, ..Settings::default() };
    let (tree, root) = setup(settings);
    let window = node(&tree, &root, "window");
    let err = implicit_search(&window, "check_boxes", &filters! {}).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Could not find `CheckBox` as a child of StandardWindow"), "{message}");
    assert!(message.ends_with("Subtree:\n\t#<StandardWindow \"Inbox\">\n\t#<Button \"Send\">\n\t#<TextField \"from:me\">\n"), "{message}");
}

#[test]
fn ancestry_and_ancestors() {
    let (tree, root) = setup(Settings::default());
    let send = node(&tree, &root, "send");
    let path: Vec<String> = debug::path(&send).iter().map(Node::to_string).collect();
    assert_eq!(path, vec![r#"#<Button "Send">"#, r#"#<StandardWindow "Inbox">"#, r#"#<Application "Mail">"#]);
    assert_eq!(send.parent().map(|p| p.handle()), tree.handle_of("window"));

    let window = send.ancestor("window", &filters! {}).unwrap().unwrap();
    assert_eq!(window.handle(), tree.handle_of("window").unwrap());
    let app = send.ancestor("application", &filters! { "title" => "Mail" }).unwrap().unwrap();
    assert_eq!(app, root);
    assert!(send.ancestor("sheet", &filters! {}).unwrap().is_none());
    assert!(root.parent().is_none());
}

#[test]
fn actions_and_writes() {
    let (tree, root) = setup(Settings::default());
    let send = node(&tree, &root, "send");
    assert_eq!(send.actions(), ["press"]);
    assert!(send.perform("press"));
    assert!(!send.perform("cancel"));
    assert_eq!(tree.performed(), vec![(send.handle(), "AXPress".to_string())]);

    let field = node(&tree, &root, "search");
    assert!(field.writable("value"));
    field.set("value", Value::from("to:you")).unwrap();
    assert_eq!(field.attribute("value"), Value::from("to:you"));

    assert!(!field.writable("title"));
    let err = field.set("title", Value::from("x")).unwrap_err();
    assert!(matches!(err, AxError::ReadOnly { ref attribute, .. } if attribute == "title"), "{err}");
}

#[test]
fn element_valued_attributes_are_wrapped() {
    let (tree, root) = setup(Settings::default());
    let window = node(&tree, &root, "window");
    assert_eq!(window.size_of("children"), 2);
    let Value::Array(children) = window.attribute("children") else {
        panic!("children should be a list");
    };
    let kinds: Vec<String> = children
        .iter()
        .filter_map(Value::as_element)
        .map(|child| child.kind().label().to_string())
        .collect();
    assert_eq!(kinds, vec!["Button", "TextField"]);
    assert!(window.attribute_names().iter().any(|name| name == "subrole"));
}
