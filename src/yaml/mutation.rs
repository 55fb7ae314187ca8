//! In-place tree mutation and the lookups it relies on.
//!
//! Mutations only ever touch structural data. Comments and positions of the
//! node being written to stay as they are.

use super::error::{Error, Result};
use super::node::{equal, Kind, NodeRef};
use super::path::{walk_path_matchers, PathMatcher, Segment};
use super::walk::WalkOptions;

/// Copy the structural data of `src` into `dest`.
///
/// Kind, tag, value, children, alias target and anchor are copied (children
/// are shared, not duplicated); comments and position of `dest` are kept.
pub fn assign_node(dest: &NodeRef, src: &NodeRef) {
    if dest.ptr_eq(src) {
        return;
    }
    let src = src.borrow();
    let mut dest = dest.borrow_mut();
    dest.kind = src.kind;
    dest.tag = src.tag.clone();
    dest.value = src.value.clone();
    dest.anchor = src.anchor.clone();
    dest.content = src.content.clone();
    dest.set_alias(src.alias_target().as_ref());
}

/// Set `key` to `value` in `map`.
///
/// An existing key has its value node overwritten with [`assign_node`], so
/// comments around the value survive. A new scalar key is inserted before
/// the first scalar key sorting after it; other keys are appended.
pub fn assign_map_node(map: &NodeRef, key: &NodeRef, value: &NodeRef) -> Result<()> {
    let map = map.unwrap_document();
    check_kind(&map, Kind::Mapping, "assign_map_node")?;
    if map.len() % 2 != 0 {
        return Err(Error::Shape(format!(
            "unexpected node content length {}, must be even",
            map.len()
        ))
        .at(&map));
    }

    if let Some((_, existing)) = get_key_value(&map, key) {
        log::debug!("assign_map_node: updating key {:?}", key.value());
        assign_node(&existing, value);
        return Ok(());
    }

    let insert_at = {
        let n = map.borrow();
        let new_key = key.borrow();
        if new_key.kind == Kind::Scalar {
            n.content
                .iter()
                .step_by(2)
                .position(|k| {
                    let k = k.borrow();
                    k.kind == Kind::Scalar && new_key.value < k.value
                })
                .map_or(n.content.len(), |pair| pair * 2)
        } else {
            n.content.len()
        }
    };
    log::debug!(
        "assign_map_node: inserting key {:?} at position {}",
        key.value(),
        insert_at
    );
    map.borrow_mut()
        .content
        .splice(insert_at..insert_at, [key.clone(), value.clone()]);
    Ok(())
}

/// Push `value` at the end of sequence `seq`.
pub fn append_node(seq: &NodeRef, value: &NodeRef) -> Result<()> {
    let seq = seq.unwrap_document();
    check_kind(&seq, Kind::Sequence, "append_node")?;
    seq.borrow_mut().content.push(value.clone());
    Ok(())
}

fn check_kind(node: &NodeRef, expected: Kind, op: &str) -> Result<()> {
    let kind = node.kind();
    if kind == expected {
        return Ok(());
    }
    let tag = node.tag();
    let found = if tag.is_empty() { kind.to_string() } else { tag };
    Err(Error::Type(format!("{} called on invalid type: {}", op, found)).at(node))
}

// =============================================================================
// Lookups
// =============================================================================

/// Position in `parent` of the first key (mapping) or element (sequence)
/// equal to `target`.
pub fn get_index(parent: &NodeRef, target: &NodeRef) -> Option<usize> {
    let parent = parent.unwrap_document();
    let step = match parent.kind() {
        Kind::Mapping => 2,
        Kind::Sequence => 1,
        _ => return None,
    };
    let n = parent.borrow();
    n.content
        .iter()
        .step_by(step)
        .position(|candidate| equal(candidate, target))
        .map(|found| found * step)
}

/// Key and value nodes of the entry of `map` whose key equals `key`.
pub fn get_key_value(map: &NodeRef, key: &NodeRef) -> Option<(NodeRef, NodeRef)> {
    let map = map.unwrap_document();
    if map.kind() != Kind::Mapping {
        return None;
    }
    let index = get_index(&map, key)?;
    Some((map.child(index)?, map.child(index + 1)?))
}

/// True when `map` has an entry for `key`.
pub fn has_key<S: Into<Segment>>(map: &NodeRef, key: S) -> bool {
    get_key(map, key).is_some()
}

/// Value of the entry of `map` designated by `key`.
///
/// A key node is compared against the map's own keys only, not against
/// nodes deeper in the tree.
pub fn get_key<S: Into<Segment>>(map: &NodeRef, key: S) -> Option<NodeRef> {
    let map = map.unwrap_document();
    if map.kind() != Kind::Mapping {
        return None;
    }
    let matcher = match key.into() {
        Segment::Node(node) => PathMatcher::node_with(&node, WalkOptions::new().with_max_depth(0)),
        other => PathMatcher::try_from(other).ok()?,
    };
    let mut found = None;
    walk_path_matchers(
        &map,
        |value| {
            if found.is_none() {
                found = Some(value.clone());
            }
            Ok(())
        },
        std::slice::from_ref(&matcher),
    )
    .ok()?;
    found
}

/// Delete `target` from `parent`: the whole entry when `parent` is a
/// mapping and `target` one of its keys, the element for a sequence.
///
/// Returns false when nothing equal to `target` was found.
pub fn remove(parent: &NodeRef, target: &NodeRef) -> bool {
    let parent = parent.unwrap_document();
    let Some(index) = get_index(&parent, target) else {
        return false;
    };
    let width = if parent.kind() == Kind::Mapping { 2 } else { 1 };
    let mut n = parent.borrow_mut();
    let end = (index + width).min(n.content.len());
    n.content.drain(index..end);
    true
}

// =============================================================================
// Unit Tests
// =============================================================================
