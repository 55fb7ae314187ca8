//! Path based edits used by `set-value`, `append` and `del`.

use yaml_walk::yaml::{
    assign_map_node, assign_node, get_key, resolve_index, walk_path_matchers, Error,
    Kind, NodeRef, PathMatcher, Result,
};

/// Nodes designated by `matchers` below `doc`.
pub fn matches(doc: &NodeRef, matchers: &[PathMatcher]) -> Result<Vec<NodeRef>> {
    let mut found = Vec::new();
    walk_path_matchers(
        doc,
        |node| {
            found.push(node.clone());
            Ok(())
        },
        matchers,
    )?;
    Ok(found)
}

/// Nodes designated by `matchers`, creating the entries of a key-only path
/// that do not exist yet. Created leaves are null scalars.
pub fn targets(doc: &NodeRef, matchers: &[PathMatcher]) -> Result<Vec<NodeRef>> {
    if doc.kind() == Kind::Document && doc.is_empty() {
        doc.borrow_mut().content.push(NodeRef::null());
    }
    let found = matches(doc, matchers)?;
    if !found.is_empty() {
        return Ok(found);
    }
    let keys: Option<Vec<&str>> = matchers
        .iter()
        .map(|m| match m {
            PathMatcher::Key(key) => Some(key.as_str()),
            _ => None,
        })
        .collect();
    match keys {
        Some(keys) => Ok(vec![vivify(doc, &keys)?]),
        None => Ok(Vec::new()),
    }
}

fn vivify(doc: &NodeRef, keys: &[&str]) -> Result<NodeRef> {
    let mut node = doc.unwrap_document().indirect();
    for key in keys {
        if node.is_null() {
            assign_node(&node, &NodeRef::mapping());
        }
        if node.kind() != Kind::Mapping {
            return Err(Error::Path(format!(
                "cannot set key '{}' on a {}",
                key,
                node.kind()
            )));
        }
        node = match get_key(&node, *key) {
            Some(existing) => existing.indirect(),
            None => {
                log::debug!("creating key '{}'", key);
                let value = NodeRef::null();
                assign_map_node(&node, &NodeRef::string(key), &value)?;
                value
            }
        };
    }
    Ok(node)
}

/// Delete what the last matcher designates under each match of the others.
///
/// Returns the number of removed entries.
pub fn delete(doc: &NodeRef, matchers: &[PathMatcher]) -> Result<usize> {
    let Some((last, parents)) = matchers.split_last() else {
        return Err(Error::Path("cannot delete the document root".to_string()));
    };
    let mut removed = 0;
    for parent in matches(doc, parents)? {
        let parent = parent.indirect();
        match (last, parent.kind()) {
            (PathMatcher::Key(key), Kind::Mapping) => {
                removed += remove_key(&parent, key);
            }
            (PathMatcher::Index(index), Kind::Sequence) => {
                if let Some(position) = resolve_index(*index, parent.len()) {
                    parent.borrow_mut().content.remove(position);
                    removed += 1;
                }
            }
            (PathMatcher::Key(_), _) | (PathMatcher::Index(_), _) => {}
            _ => {
                return Err(Error::Path(
                    "the last path component of a deletion must be a key or an index".to_string(),
                ))
            }
        }
    }
    Ok(removed)
}

/// Drop every entry of `map` whose key reads `key`, whatever its tag, the
/// way key matchers select entries.
fn remove_key(map: &NodeRef, key: &str) -> usize {
    let mut n = map.borrow_mut();
    let before = n.content.len();
    let content = std::mem::take(&mut n.content);
    n.content = content
        .chunks(2)
        .filter(|pair| pair[0].value() != key)
        .flatten()
        .cloned()
        .collect();
    (before - n.content.len()) / 2
}
