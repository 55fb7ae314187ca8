//! The YAML node tree.
//!
//! A [`Node`] carries structural data (kind, tag, value, children) and the
//! formatting metadata an encoder needs to reproduce a document faithfully
//! (anchor, comments, position). Nodes are shared through [`NodeRef`]
//! handles: `content` owns its children while `alias` only points at a
//! node owned elsewhere in the tree.

use crate::tag;
use std::cell::{Ref, RefCell, RefMut};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Structural category of a node.
///
/// Variants are declared in the order used when sorting mapping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Kind {
    Document,
    Sequence,
    Mapping,
    #[default]
    Scalar,
    Alias,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Document => "document",
            Kind::Sequence => "sequence",
            Kind::Mapping => "mapping",
            Kind::Scalar => "scalar",
            Kind::Alias => "alias",
        };
        f.write_str(name)
    }
}

/// A single element of the document tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub kind: Kind,
    pub tag: String,
    pub value: String,
    pub anchor: String,
    /// Children. Mappings store alternating key and value nodes.
    pub content: Vec<NodeRef>,
    alias: Option<Weak<RefCell<Node>>>,

    pub head_comment: String,
    pub line_comment: String,
    pub foot_comment: String,
    pub line: usize,
    pub column: usize,
}

impl Node {
    /// Node an alias points to, if it is still alive.
    pub fn alias_target(&self) -> Option<NodeRef> {
        self.alias.as_ref().and_then(Weak::upgrade).map(NodeRef)
    }

    pub fn set_alias(&mut self, target: Option<&NodeRef>) {
        self.alias = target.map(|t| Rc::downgrade(&t.0));
    }

    pub fn into_ref(self) -> NodeRef {
        NodeRef::new(self)
    }
}

/// Shared handle on a [`Node`].
///
/// Cloning the handle does not copy the node; use [`copy_node`] for that.
#[derive(Clone)]
pub struct NodeRef(Rc<RefCell<Node>>);

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.borrow();
        match node.kind {
            Kind::Scalar => write!(f, "{} {:?}", node.tag, node.value),
            Kind::Alias => write!(f, "*{}", node.value),
            _ => f.debug_list().entries(node.content.iter()).finish(),
        }
    }
}

impl NodeRef {
    pub fn new(node: Node) -> Self {
        NodeRef(Rc::new(RefCell::new(node)))
    }

    /// Panics if the node is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, Node> {
        self.0.borrow()
    }

    /// Panics if the node is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, Node> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> *const RefCell<Node> {
        Rc::as_ptr(&self.0)
    }

    pub fn kind(&self) -> Kind {
        self.0.borrow().kind
    }

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn value(&self) -> String {
        self.0.borrow().value.clone()
    }

    /// Number of entries in `content` (twice the pair count for mappings).
    pub fn len(&self) -> usize {
        self.0.borrow().content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().content.is_empty()
    }

    pub fn child(&self, index: usize) -> Option<NodeRef> {
        self.0.borrow().content.get(index).cloned()
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn document(child: Option<NodeRef>) -> Self {
        Node {
            kind: Kind::Document,
            content: child.into_iter().collect(),
            ..Default::default()
        }
        .into_ref()
    }

    pub fn mapping() -> Self {
        Self::mapping_of(Vec::new())
    }

    pub fn mapping_of(pairs: Vec<(NodeRef, NodeRef)>) -> Self {
        Node {
            kind: Kind::Mapping,
            tag: tag::MAP.to_string(),
            content: pairs.into_iter().flat_map(|(k, v)| [k, v]).collect(),
            ..Default::default()
        }
        .into_ref()
    }

    pub fn sequence() -> Self {
        Self::sequence_of(Vec::new())
    }

    pub fn sequence_of(items: Vec<NodeRef>) -> Self {
        Node {
            kind: Kind::Sequence,
            tag: tag::SEQ.to_string(),
            content: items,
            ..Default::default()
        }
        .into_ref()
    }

    pub fn scalar(tag: &str, value: &str) -> Self {
        Node {
            kind: Kind::Scalar,
            tag: tag.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
        .into_ref()
    }

    pub fn string(value: &str) -> Self {
        Self::scalar(tag::STR, value)
    }

    pub fn int(value: i64) -> Self {
        Self::scalar(tag::INT, &value.to_string())
    }

    pub fn float(value: f64) -> Self {
        Self::scalar(tag::FLOAT, &tag::format_float(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::scalar(tag::BOOL, if value { "true" } else { "false" })
    }

    pub fn null() -> Self {
        Self::scalar(tag::NULL, "null")
    }

    /// The `<<` key of a YAML merge.
    pub fn merge_key() -> Self {
        Self::scalar(tag::MERGE, "<<")
    }

    /// Alias node referring to `target`, named after its anchor.
    pub fn alias(target: &NodeRef) -> Self {
        let mut node = Node {
            kind: Kind::Alias,
            value: target.borrow().anchor.clone(),
            ..Default::default()
        };
        node.set_alias(Some(target));
        node.into_ref()
    }

    // =========================================================================
    // Predicates and indirection
    // =========================================================================

    /// The single child of a document node, or the node itself.
    ///
    /// Empty documents are returned as is.
    pub fn unwrap_document(&self) -> NodeRef {
        let node = self.0.borrow();
        if node.kind == Kind::Document {
            if let Some(child) = node.content.first() {
                return child.clone();
            }
        }
        self.clone()
    }

    /// Follow document wrapping and alias chains to the node holding data.
    ///
    /// A dangling alias resolves to itself.
    pub fn indirect(&self) -> NodeRef {
        let mut node = self.unwrap_document();
        loop {
            let target = {
                let n = node.borrow();
                if n.kind != Kind::Alias {
                    return node.clone();
                }
                n.alias_target()
            };
            match target {
                Some(target) => node = target,
                None => return node,
            }
        }
    }

    /// True for scalars tagged `!!null`.
    pub fn is_null(&self) -> bool {
        let node = self.0.borrow();
        node.kind == Kind::Scalar && node.tag == tag::NULL
    }

    /// True for `<<` keys.
    pub fn is_merge_key(&self) -> bool {
        self.0.borrow().tag == tag::MERGE
    }
}

// =============================================================================
// Structural equality
// =============================================================================

/// Ordering used to sort mapping keys: kind, tag, content length, value.
///
/// Complex keys are only compared by size, not recursively.
pub fn compare_keys(a: &NodeRef, b: &NodeRef) -> Ordering {
    let (a, b) = (a.borrow(), b.borrow());
    a.kind
        .cmp(&b.kind)
        .then_with(|| a.tag.cmp(&b.tag))
        .then_with(|| a.content.len().cmp(&b.content.len()))
        .then_with(|| a.value.cmp(&b.value))
}

fn sorted_pairs(content: &[NodeRef]) -> Vec<(NodeRef, NodeRef)> {
    let mut pairs: Vec<(NodeRef, NodeRef)> = content
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();
    pairs.sort_by(|(a, _), (b, _)| compare_keys(a, b));
    pairs
}

/// Structural equality: aliases are dereferenced, metadata ignored, and
/// mapping pairs compared regardless of their order.
pub fn equal(a: &NodeRef, b: &NodeRef) -> bool {
    let (a, b) = (a.indirect(), b.indirect());
    if a.ptr_eq(&b) {
        return true;
    }
    let (an, bn) = (a.borrow(), b.borrow());
    if an.kind != bn.kind
        || an.tag != bn.tag
        || an.value != bn.value
        || an.content.len() != bn.content.len()
    {
        return false;
    }
    if an.kind == Kind::Mapping && an.content.len() % 2 == 0 {
        sorted_pairs(&an.content)
            .iter()
            .zip(sorted_pairs(&bn.content).iter())
            .all(|((ak, av), (bk, bv))| equal(ak, bk) && equal(av, bv))
    } else {
        an.content
            .iter()
            .zip(bn.content.iter())
            .all(|(x, y)| equal(x, y))
    }
}

/// Reorder the pairs of a mapping by [`compare_keys`]. No-op on other kinds.
pub fn sort_map_keys(node: &NodeRef) {
    let node = node.unwrap_document();
    let mut n = node.borrow_mut();
    if n.kind != Kind::Mapping || n.content.len() % 2 != 0 {
        return;
    }
    n.content = sorted_pairs(&n.content)
        .into_iter()
        .flat_map(|(k, v)| [k, v])
        .collect();
}

// =============================================================================
// Copying
// =============================================================================

/// New node with the same fields; children and alias target are shared.
pub fn shallow_copy_node(src: &NodeRef) -> NodeRef {
    NodeRef::new(src.borrow().clone())
}

/// Deep copy of `src`.
///
/// A node reachable several times is copied once, and aliases inside the
/// copy point at the copy of their target. Aliases to nodes outside `src`
/// keep pointing at the original target.
pub fn copy_node(src: &NodeRef) -> NodeRef {
    let mut copied: HashMap<*const RefCell<Node>, NodeRef> = HashMap::new();
    let mut aliases: Vec<NodeRef> = Vec::new();
    let root = copy_content(src, &mut copied, &mut aliases);

    for alias in aliases {
        let target = alias.borrow().alias_target();
        if let Some(target) = target {
            if let Some(copy) = copied.get(&target.addr()) {
                alias.borrow_mut().set_alias(Some(copy));
            }
        }
    }
    root
}

fn copy_content(
    src: &NodeRef,
    copied: &mut HashMap<*const RefCell<Node>, NodeRef>,
    aliases: &mut Vec<NodeRef>,
) -> NodeRef {
    if let Some(done) = copied.get(&src.addr()) {
        return done.clone();
    }
    let mut node = src.borrow().clone();
    let children = std::mem::take(&mut node.content);
    let is_alias = node.alias.is_some();
    let cp = NodeRef::new(node);
    copied.insert(src.addr(), cp.clone());
    if is_alias {
        aliases.push(cp.clone());
    }

    let content: Vec<NodeRef> = children
        .iter()
        .map(|child| copy_content(child, copied, aliases))
        .collect();
    cp.borrow_mut().content = content;
    cp
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, NodeRef)]) -> NodeRef {
        NodeRef::mapping_of(
            pairs
                .iter()
                .map(|(k, v)| (NodeRef::string(k), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Kind::Mapping.to_string(), "mapping");
        assert_eq!(Kind::Alias.to_string(), "alias");
        assert_eq!(Kind::Document.to_string(), "document");
    }

    #[test]
    fn test_unwrap_document() {
        let child = NodeRef::string("x");
        let doc = NodeRef::document(Some(child.clone()));
        assert!(doc.unwrap_document().ptr_eq(&child));
        assert!(child.unwrap_document().ptr_eq(&child));

        let empty = NodeRef::document(None);
        assert!(empty.unwrap_document().ptr_eq(&empty));
    }

    #[test]
    fn test_indirect_follows_alias_chain() {
        let target = NodeRef::int(3);
        let first = NodeRef::alias(&target);
        let second = NodeRef::alias(&first);
        assert!(second.indirect().ptr_eq(&target));
    }

    #[test]
    fn test_indirect_dangling_alias_is_itself() {
        let alias = {
            let target = NodeRef::int(3);
            NodeRef::alias(&target)
        };
        assert!(alias.indirect().ptr_eq(&alias));
    }

    #[test]
    fn test_is_null() {
        assert!(NodeRef::null().is_null());
        assert!(!NodeRef::string("null").is_null());
        assert!(!NodeRef::mapping().is_null());
    }

    #[test]
    fn test_equal_ignores_mapping_order() {
        let a = map(&[("x", NodeRef::int(1)), ("y", NodeRef::int(2))]);
        let b = map(&[("y", NodeRef::int(2)), ("x", NodeRef::int(1))]);
        assert!(equal(&a, &b));
    }

    #[test]
    fn test_equal_respects_sequence_order() {
        let a = NodeRef::sequence_of(vec![NodeRef::int(1), NodeRef::int(2)]);
        let b = NodeRef::sequence_of(vec![NodeRef::int(2), NodeRef::int(1)]);
        assert!(!equal(&a, &b));
    }

    #[test]
    fn test_equal_ignores_metadata() {
        let a = NodeRef::string("v");
        let b = NodeRef::string("v");
        {
            let mut n = b.borrow_mut();
            n.line_comment = "# note".into();
            n.line = 12;
            n.anchor = "anchor".into();
        }
        assert!(equal(&a, &b));
    }

    #[test]
    fn test_equal_compares_tags() {
        assert!(!equal(&NodeRef::string("1"), &NodeRef::int(1)));
    }

    #[test]
    fn test_equal_dereferences_aliases() {
        let target = map(&[("a", NodeRef::int(1))]);
        let alias = NodeRef::alias(&target);
        let other = map(&[("a", NodeRef::int(1))]);
        assert!(equal(&alias, &other));
        assert!(equal(&other, &alias));
    }

    #[test]
    fn test_sort_map_keys() {
        let m = map(&[
            ("b", NodeRef::int(2)),
            ("c", NodeRef::int(3)),
            ("a", NodeRef::int(1)),
        ]);
        sort_map_keys(&NodeRef::document(Some(m.clone())));
        let keys: Vec<String> = m
            .borrow()
            .content
            .iter()
            .step_by(2)
            .map(|k| k.value())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(m.child(1).unwrap().value(), "1");
    }

    #[test]
    fn test_shallow_copy_shares_children() {
        let child = NodeRef::int(1);
        let seq = NodeRef::sequence_of(vec![child.clone()]);
        let cp = shallow_copy_node(&seq);
        assert!(!cp.ptr_eq(&seq));
        assert!(cp.child(0).unwrap().ptr_eq(&child));
    }

    #[test]
    fn test_copy_node_is_independent() {
        let original = map(&[(
            "list",
            NodeRef::sequence_of(vec![NodeRef::int(1), NodeRef::int(2)]),
        )]);
        let cp = copy_node(&original);
        assert!(equal(&original, &cp));

        let list = cp.child(1).unwrap();
        list.borrow_mut().content.push(NodeRef::int(3));
        list.child(0).unwrap().borrow_mut().value = "10".into();

        let original_list = original.child(1).unwrap();
        assert_eq!(original_list.len(), 2);
        assert_eq!(original_list.child(0).unwrap().value(), "1");
        assert!(!equal(&original, &cp));
    }

    #[test]
    fn test_copy_node_preserves_alias_topology() {
        let anchored = map(&[("a", NodeRef::int(1))]);
        anchored.borrow_mut().anchor = "base".into();
        let first = NodeRef::alias(&anchored);
        let second = NodeRef::alias(&anchored);
        // aliases listed before the anchor on purpose
        let root = NodeRef::sequence_of(vec![first, second, anchored.clone()]);

        let cp = copy_node(&root);
        let copied_anchor = cp.child(2).unwrap();
        assert!(!copied_anchor.ptr_eq(&anchored));
        for i in 0..2 {
            let alias = cp.child(i).unwrap();
            assert!(alias.borrow().alias_target().unwrap().ptr_eq(&copied_anchor));
        }
        assert!(equal(&root, &cp));
    }

    #[test]
    fn test_copy_node_shared_child_copied_once() {
        let shared = NodeRef::int(7);
        let root = NodeRef::sequence_of(vec![shared.clone(), shared]);
        let cp = copy_node(&root);
        assert!(cp.child(0).unwrap().ptr_eq(&cp.child(1).unwrap()));
    }

    #[test]
    fn test_copy_node_alias_outside_subtree_keeps_target() {
        let outside = NodeRef::int(1);
        let root = NodeRef::sequence_of(vec![NodeRef::alias(&outside)]);
        let cp = copy_node(&root);
        let target = cp.child(0).unwrap().borrow().alias_target().unwrap();
        assert!(target.ptr_eq(&outside));
    }
}
