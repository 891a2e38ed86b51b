use std::sync::Arc;

use serde_json::json;

use axquery::element::{Node, Session};
use axquery::registry::TypeRegistry;
use axquery::search::{self, Cardinality, SearchResult};
use axquery::snapshot::MemoryTree;
use axquery::{filters, NodeSliceExt, Value};

fn setup() -> (Arc<MemoryTree>, Node) {
    // root: A, B, C[D]
    let tree = Arc::new(
        MemoryTree::from_json(json!({
            "role": "Application",
            "attributes": { "title": "Mail" },
            "children": [
                { "id": "a", "role": "Button", "attributes": { "title": "Yes" } },
                { "id": "b", "role": "Button", "attributes": { "title": "No" } },
                { "id": "c", "role": "Window", "attributes": { "title": "Compose" }, "children": [
                    { "id": "d", "role": "Button", "attributes": { "title": "Yes" } }
                ] }
            ]
        }))
        .unwrap(),
    );
    let session = Session::new(tree.clone()).with_registry(Arc::new(TypeRegistry::new()));
    let root = Node::new(Arc::new(session), tree.root());
    (tree, root)
}

fn menu_bar() -> (Arc<MemoryTree>, Node) {
    let tree = Arc::new(
        MemoryTree::from_json(json!({
            "role": "MenuBar",
            "children": [
                { "role": "Menu", "attributes": { "title": "File" }, "children": [
                    { "role": "MenuItem", "attributes": { "title": "Open" } },
                    { "role": "MenuItem", "attributes": { "title": "Close" } }
                ] },
                { "role": "Menu", "attributes": { "title": "Edit" } }
            ]
        }))
        .unwrap(),
    );
    let session = Session::new(tree.clone()).with_registry(Arc::new(TypeRegistry::new()));
    let root = Node::new(Arc::new(session), tree.root());
    (tree, root)
}

fn ids(tree: &MemoryTree, ids: &[&str]) -> Vec<axquery::Handle> {
    ids.iter().map(|id| tree.handle_of(id).unwrap()).collect()
}

#[test]
fn find_all_is_breadth_first() {
    let (tree, root) = setup();
    let buttons = root.find_all("Button", &filters! {}).unwrap();
    let handles: Vec<_> = buttons.iter().map(Node::handle).collect();
    assert_eq!(handles, ids(&tree, &["a", "b", "d"]));
}

#[test]
fn find_returns_the_first_qualifying_node() {
    let (tree, root) = setup();
    let no = root.find("Button", &filters! { "title" => "No" }).unwrap().unwrap();
    assert_eq!(no.handle(), tree.handle_of("b").unwrap());
    assert_eq!(no.to_string(), r#"#<Button "No">"#);
}

#[test]
fn windows_and_missing_titles() {
    let (tree, root) = setup();
    let windows = root.find_all("Window", &filters! {}).unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].handle(), tree.handle_of("c").unwrap());
    assert!(root.find("Button", &filters! { "title" => "Nope" }).unwrap().is_none());
}

#[test]
fn root_is_never_part_of_the_result() {
    let (_, root) = setup();
    assert!(root.find_all("application", &filters! {}).unwrap().is_blank());
}

#[test]
fn find_agrees_with_the_head_of_find_all() {
    let (_, root) = setup();
    for (kind, filters) in [
        ("button", filters! {}),
        ("button", filters! { "title" => "Yes" }),
        ("window", filters! {}),
        ("button", filters! { "title" => "Nope" }),
    ] {
        let first = root.find(kind, &filters).unwrap();
        let all = root.find_all(kind, &filters).unwrap();
        assert_eq!(first, all.first().cloned(), "{kind} {filters}");
    }
}

#[test]
fn find_never_fetches_more_than_find_all() {
    for (kind, filters) in [
        ("button", filters! {}),
        ("button", filters! { "title" => "No" }),
        ("window", filters! {}),
        ("button", filters! { "title" => "Nope" }),
    ] {
        let (tree, root) = setup();
        root.find(kind, &filters).unwrap();
        let find = tree.counts();

        let (tree, root) = setup();
        root.find_all(kind, &filters).unwrap();
        let find_all = tree.counts();

        assert!(find.attributes <= find_all.attributes, "{kind} {filters}");
        assert!(find.total() <= find_all.total(), "{kind} {filters}");
    }
}

#[test]
fn find_stops_pulling_after_a_match() {
    let (tree, root) = setup();
    let first = root.find("button", &filters! {}).unwrap().unwrap();
    assert_eq!(first.handle(), tree.handle_of("a").unwrap());
    let counts = tree.counts();
    // the root and A were inspected, nobody else
    assert_eq!(counts.attribute_names, 2);
    assert_eq!(counts.children, 1);
}

#[test]
fn plural_tokens_are_classified() {
    let (_, root) = setup();
    assert_eq!(root.find_all("buttons", &filters! {}).unwrap().len(), 3);
    assert_eq!(
        root.find_all("buttons", &filters! { "title" => "Yes" })
            .unwrap()
            .values_of("title"),
        vec![Value::from("Yes"), Value::from("Yes")]
    );
}

#[test]
fn explicit_cardinality() {
    let (tree, root) = setup();
    match root.search("button", &filters! {}, None, Cardinality::All).unwrap() {
        SearchResult::All(found) => assert_eq!(found.kinds(), vec!["Button"; 3]),
        other => panic!("expected every button, got {other:?}"),
    }
    let one = root.search("buttons", &filters! {}, None, Cardinality::One).unwrap();
    assert_eq!(one.into_vec().iter().map(Node::handle).collect::<Vec<_>>(), ids(&tree, &["a"]));
    let none = search::search(&root, "window", &filters! { "title" => "Inbox" }, None, Cardinality::One).unwrap();
    assert!(none.is_blank());
}

#[test]
fn plural_menus_are_found() {
    let (_, root) = menu_bar();
    let menus = root.find_all("menus", &filters! {}).unwrap();
    assert_eq!(menus.values_of("title"), vec![Value::from("File"), Value::from("Edit")]);
    assert_eq!(root.find_all("menu_items", &filters! {}).unwrap().len(), 2);
    match axquery::member::implicit_search(&root, "menus", &filters! {}).unwrap() {
        SearchResult::All(found) => assert_eq!(found.kinds(), vec!["Menu", "Menu"]),
        other => panic!("expected every menu, got {other:?}"),
    }
}

#[test]
#[allow(deprecated)]
fn inferred_cardinality() {
    assert_eq!(Cardinality::infer("button"), Cardinality::One);
    assert_eq!(Cardinality::infer("buttons"), Cardinality::All);
    assert_eq!(Cardinality::infer("check_boxes"), Cardinality::All);
    assert_eq!(Cardinality::infer("status"), Cardinality::One);
    assert_eq!(Cardinality::infer("statuses"), Cardinality::All);
    assert_eq!(Cardinality::infer("menu"), Cardinality::One);
    assert_eq!(Cardinality::infer("menus"), Cardinality::All);
}

#[test]
fn unknown_types_match_nothing() {
    let (_, root) = setup();
    assert!(root.find_all("Derp", &filters! {}).unwrap().is_empty());
    assert!(root.find("Derp", &filters! {}).unwrap().is_none());
    assert!(!root.session().registry().exists("Derp"));
}
