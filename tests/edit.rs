//! Integration tests for editing parsed documents and emitting them again

use std::fs;

use indoc::indoc;
use yaml_walk::yaml::{
    append_node, assign_map_node, assign_node, codec, copy_node, equal, get_key, has_key,
    range_map, remove, Kind, NodeRef, RangeOptions,
};

fn load(text: &str) -> NodeRef {
    codec::parse_str(text).expect("valid YAML")
}

fn emitted(doc: &NodeRef) -> String {
    codec::emit(doc).expect("emittable tree")
}

// =============================================================================
// Mutation
// =============================================================================

#[test]
fn test_set_existing_key() {
    let doc = load("name: old\n");
    assign_map_node(&doc, &NodeRef::string("name"), &NodeRef::string("new")).unwrap();
    assert_eq!(emitted(&doc), "name: new\n");
}

#[test]
fn test_new_key_is_inserted_in_order() {
    let doc = load(indoc! {"
        alpha: a
        gamma: c
    "});
    assign_map_node(&doc, &NodeRef::string("beta"), &NodeRef::string("b")).unwrap();
    assign_map_node(&doc, &NodeRef::string("zeta"), &NodeRef::string("z")).unwrap();
    assert_eq!(
        emitted(&doc),
        indoc! {"
            alpha: a
            beta: b
            gamma: c
            zeta: z
        "}
    );
}

#[test]
fn test_set_nested_mapping() {
    let doc = load("config: {}\n");
    let config = get_key(&doc, "config").unwrap();
    assign_map_node(&config, &NodeRef::string("host"), &NodeRef::string("localhost")).unwrap();
    assert_eq!(emitted(&doc), "config:\n  host: localhost\n");
}

#[test]
fn test_assign_replaces_value_node_in_place() {
    let doc = load("server:\n  port: old\n");
    let server = get_key(&doc, "server").unwrap();
    let port = get_key(&server, "port").unwrap();
    assign_node(
        &port,
        &NodeRef::mapping_of(vec![(NodeRef::string("number"), NodeRef::string("high"))]),
    );
    // the node held by the mapping is the one that changed
    assert_eq!(get_key(&server, "port").unwrap().kind(), Kind::Mapping);
    assert!(get_key(&server, "port").unwrap().ptr_eq(&port));
    assert_eq!(
        emitted(&doc),
        indoc! {"
            server:
              port:
                number: high
        "}
    );
}

#[test]
fn test_assign_map_node_on_sequence_fails() {
    let doc = load("- a\n");
    let err = assign_map_node(&doc, &NodeRef::string("k"), &NodeRef::string("v")).unwrap_err();
    assert!(err
        .root()
        .to_string()
        .starts_with("assign_map_node called on invalid type"));
    // the parsed sequence is named by where it starts
    assert_eq!(err.location().map(|l| l.line), Some(1));
}

#[test]
fn test_append_to_sequence() {
    let doc = load("items:\n- a\n");
    let items = get_key(&doc, "items").unwrap();
    append_node(&items, &NodeRef::string("b")).unwrap();
    assert_eq!(emitted(&doc), "items:\n- a\n- b\n");
}

#[test]
fn test_append_to_mapping_fails() {
    let doc = load("a: b\n");
    let err = append_node(&doc, &NodeRef::string("c")).unwrap_err();
    assert!(err
        .root()
        .to_string()
        .starts_with("append_node called on invalid type"));
}

#[test]
fn test_remove_entries() {
    let doc = load(indoc! {"
        keep: x
        drop: y
        list: [p, q, r]
    "});
    assert!(remove(&doc, &NodeRef::string("drop")));
    assert!(!remove(&doc, &NodeRef::string("drop")));

    let list = get_key(&doc, "list").unwrap();
    assert!(remove(&list, &NodeRef::string("q")));
    assert_eq!(emitted(&doc), "keep: x\nlist:\n- p\n- r\n");
}

#[test]
fn test_key_lookups() {
    let doc = load("name: app\nports: [80]\n");
    assert!(has_key(&doc, "name"));
    assert!(has_key(&doc, NodeRef::string("ports")));
    assert!(!has_key(&doc, "missing"));
    assert!(!has_key(&doc, 1.5));
    assert_eq!(get_key(&doc, "name").unwrap().value(), "app");
}

// =============================================================================
// Copy and equality
// =============================================================================

#[test]
fn test_copy_is_independent() {
    let doc = load(indoc! {"
        service:
          name: web
          ports: [80, 443]
    "});
    let copy = copy_node(&doc);
    assert!(equal(&doc, &copy));

    let ports = get_key(&get_key(&copy, "service").unwrap(), "ports").unwrap();
    append_node(&ports, &NodeRef::int(8080)).unwrap();
    assert!(!equal(&doc, &copy));
    assert_eq!(
        emitted(&doc),
        indoc! {"
            service:
              name: web
              ports:
              - 80
              - 443
        "}
    );
}

#[test]
fn test_copy_keeps_aliases_inside_the_subtree() {
    let base = NodeRef::mapping_of(vec![(NodeRef::string("a"), NodeRef::int(1))]);
    base.borrow_mut().anchor = "base".to_string();
    let root = NodeRef::sequence_of(vec![base.clone(), NodeRef::alias(&base)]);

    let copy = copy_node(&root);
    let copied_base = copy.child(0).unwrap();
    let copied_alias = copy.child(1).unwrap();
    assert!(!copied_base.ptr_eq(&base));
    assert!(copied_alias.indirect().ptr_eq(&copied_base));
}

// =============================================================================
// Merge keys
// =============================================================================

/// `{<<: *base, b: 20, c: 30}` with `base: {a: 1, b: 2}`, and the anchored
/// node the alias needs kept alive.
fn merged() -> (NodeRef, NodeRef) {
    let base = NodeRef::mapping_of(vec![
        (NodeRef::string("a"), NodeRef::int(1)),
        (NodeRef::string("b"), NodeRef::int(2)),
    ]);
    let map = NodeRef::mapping_of(vec![
        (NodeRef::merge_key(), NodeRef::alias(&base)),
        (NodeRef::string("b"), NodeRef::int(20)),
        (NodeRef::string("c"), NodeRef::int(30)),
    ]);
    (map, base)
}

fn pairs(node: &NodeRef, opts: RangeOptions) -> Vec<String> {
    let mut got = Vec::new();
    range_map(
        node,
        |k, v| {
            got.push(format!("{}={}", k.value(), v.value()));
            Ok(())
        },
        opts,
    )
    .unwrap();
    got
}

#[test]
fn test_range_map_resolves_merges() {
    let (map, _base) = merged();
    assert_eq!(pairs(&map, RangeOptions::new()), vec!["a=1", "b=20", "c=30"]);
    assert_eq!(
        pairs(&map, RangeOptions::new().with_merges_last()),
        vec!["b=20", "c=30", "a=1"]
    );
    assert_eq!(
        pairs(&map, RangeOptions::new().with_allow_duplicate_merge_keys()),
        vec!["a=1", "b=2", "b=20", "c=30"]
    );
}

const MERGED: &str = "base: &b {a: 1, b: 2}\nsvc: {<<: *b, b: 20}\n";

#[test]
fn test_range_map_on_parsed_merge() {
    let doc = load(MERGED);
    let svc = get_key(&doc, "svc").unwrap();
    assert_eq!(pairs(&svc, RangeOptions::new()), vec!["a=1", "b=20"]);
    assert_eq!(
        pairs(&svc, RangeOptions::new().with_merges_last()),
        vec!["b=20", "a=1"]
    );
    assert_eq!(
        pairs(&svc, RangeOptions::new().with_allow_duplicate_merge_keys()),
        vec!["a=1", "b=2", "b=20"]
    );
}

#[test]
fn test_edit_keeps_anchor_and_alias() {
    let doc = load(MERGED);
    let svc = get_key(&doc, "svc").unwrap();
    assign_map_node(&svc, &NodeRef::string("c"), &NodeRef::int(30)).unwrap();
    assert_eq!(
        emitted(&doc),
        indoc! {"
            base: &b
              a: 1
              b: 2
            svc:
              <<: *b
              b: 20
              c: 30
        "}
    );
}

#[test]
fn test_range_map_plain_document() {
    let doc = load("x: 1\ny: 2\n");
    assert_eq!(pairs(&doc, RangeOptions::new()), vec!["x=1", "y=2"]);
}

#[test]
fn test_range_map_rejects_sequence() {
    let err = range_map(&load("- 1\n"), |_, _| Ok(()), RangeOptions::new()).unwrap_err();
    assert_eq!(
        err.root().to_string(),
        "expected node kind \"mapping\", got \"sequence\""
    );
}

// =============================================================================
// Files and native values
// =============================================================================

#[test]
fn test_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "name: from-file\n").unwrap();

    let doc = codec::read_file(&path).unwrap();
    assert_eq!(get_key(&doc, "name").unwrap().value(), "from-file");
}

#[test]
fn test_read_missing_file_names_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = codec::read_file(&path).unwrap_err();
    assert_eq!(
        err.location().and_then(|l| l.filename.clone()),
        Some(path.display().to_string())
    );
    assert!(err.to_string().starts_with(&path.display().to_string()));
    assert!(matches!(err.root(), yaml_walk::yaml::Error::Io(_)));
}

#[test]
fn test_read_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.yaml");
    fs::write(&path, "\n").unwrap();

    let doc = codec::read_file(&path).unwrap();
    assert_eq!(doc.kind(), Kind::Document);
    assert!(doc.is_empty());
    assert_eq!(codec::raw_string(&doc).unwrap(), "");
}

#[test]
fn test_native_values_to_nodes() {
    let text = codec::to_node("plain").unwrap();
    assert_eq!((text.kind(), text.value()), (Kind::Scalar, "plain".to_string()));

    assert_eq!(codec::to_node(&42i64).unwrap().value(), "42");
    assert_eq!(codec::to_node(&true).unwrap().value(), "true");

    let node = NodeRef::string("same");
    assert!(codec::to_node(&node).unwrap().ptr_eq(&node));

    let doc = load("inner: value\n");
    assert_eq!(codec::to_node(&doc).unwrap().kind(), Kind::Mapping);
}
