//! Path matching.
//!
//! A path is a list of [`PathMatcher`]s. Each matcher searches the nodes
//! handed to it by the previous one and hands its own matches to the next;
//! the last step calls the user callback. Wildcard steps may match many
//! nodes, every one of them is threaded through the rest of the path.
//!
//! Paths can be built from typed [`Segment`]s (see [`walk_path`] and the
//! [`path!`](crate::path) macro) or parsed from dot notation with
//! [`parse_path`].

use super::error::{Error, Result};
use super::node::{equal, Kind, NodeRef};
use super::walk::{walk, WalkOptions};
use super::walkers::{index_walker, key_walker};

/// Split a dot-notation path into its components.
///
/// Handles escape sequences: `\.` for literal dots, `\\` for literal backslashes.
/// For example, `a.b\.c.d` becomes `["a", "b.c", "d"]`.
pub fn split_path(path: &str) -> Vec<String> {
    let mut elements = Vec::new();
    let mut escaped = false;
    let mut element = String::new();

    for c in path.chars() {
        if escaped {
            escaped = false;
            element.push(c);
            continue;
        }
        match c {
            '\\' => escaped = true,
            '.' => elements.push(std::mem::take(&mut element)),
            _ => element.push(c),
        }
    }
    elements.push(element);
    elements
}

/// Position in a sequence of `len` elements designated by `index`.
///
/// Negative indices count from the end (`-1` is the last element).
/// Returns `None` when the index falls outside the sequence.
pub fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(usize::try_from(index.unsigned_abs()).ok()?)?
    } else {
        usize::try_from(index).ok()?
    };
    (resolved < len).then_some(resolved)
}

// =============================================================================
// Matchers
// =============================================================================

/// One step of a path.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// Value of the entry named `key` in a mapping.
    Key(String),
    /// Element of a sequence, negative indices counting from the end.
    Index(i64),
    /// Nodes structurally equal to `node`, searched with `opts`.
    Node { node: NodeRef, opts: WalkOptions },
    /// Every node below the searched one.
    Any(WalkOptions),
}

impl PathMatcher {
    pub fn key(key: &str) -> Self {
        PathMatcher::Key(key.to_string())
    }

    pub fn index(index: i64) -> Self {
        PathMatcher::Index(index)
    }

    /// Full-depth search for nodes equal to `node`.
    pub fn node(node: &NodeRef) -> Self {
        Self::node_with(node, WalkOptions::new())
    }

    pub fn node_with(node: &NodeRef, opts: WalkOptions) -> Self {
        PathMatcher::Node {
            node: node.clone(),
            opts,
        }
    }

    pub fn any() -> Self {
        Self::any_with(WalkOptions::new())
    }

    /// Wildcard walking with `opts`: breadth-first reorders the matches,
    /// `max_depth(0)` only yields the immediate children.
    pub fn any_with(opts: WalkOptions) -> Self {
        PathMatcher::Any(opts)
    }

    /// Call `f` on every node this step matches below `node`.
    ///
    /// Key and index steps applied to a node of the wrong kind match
    /// nothing; they are not an error.
    pub fn matches(&self, node: &NodeRef, f: &mut dyn FnMut(&NodeRef) -> Result<()>) -> Result<()> {
        match self {
            PathMatcher::Key(key) => {
                let node = node.indirect();
                if node.kind() != Kind::Mapping {
                    return Ok(());
                }
                walk(
                    &node,
                    key_walker(key, |value| f(value)),
                    WalkOptions::new().with_max_depth(0),
                )
            }
            PathMatcher::Index(index) => {
                let node = node.indirect();
                if node.kind() != Kind::Sequence {
                    return Ok(());
                }
                walk(
                    &node,
                    index_walker(*index, |elem| f(elem)),
                    WalkOptions::new().with_max_depth(0),
                )
            }
            PathMatcher::Node {
                node: reference,
                opts,
            } => walk(
                node,
                |current, parent, position, opts| {
                    if !equal(reference, current) {
                        return Ok(opts.miss_status());
                    }
                    match mapping_value(parent, position) {
                        Some(value) => f(&value)?,
                        None => f(current)?,
                    }
                    Ok(opts.match_status())
                },
                opts.clone(),
            ),
            PathMatcher::Any(opts) => walk(
                node,
                |current, parent, position, opts| {
                    if parent.is_none() {
                        return Ok(opts.miss_status());
                    }
                    match mapping_value(parent, position) {
                        Some(value) => f(&value)?,
                        None => f(current)?,
                    }
                    Ok(opts.miss_status())
                },
                opts.clone(),
            ),
        }
    }
}

/// Value paired with the key at `position` when `parent` is a mapping.
fn mapping_value(parent: Option<&NodeRef>, position: Option<usize>) -> Option<NodeRef> {
    match (parent, position) {
        (Some(parent), Some(position)) if parent.kind() == Kind::Mapping => {
            parent.child(position + 1)
        }
        _ => None,
    }
}

/// Call `f` on every node reached by following `matchers` from `root`.
///
/// With no matcher, `f` is called on the (unwrapped) root. Errors from any
/// step or from `f` stop the search.
pub fn walk_path_matchers<F>(root: &NodeRef, mut f: F, matchers: &[PathMatcher]) -> Result<()>
where
    F: FnMut(&NodeRef) -> Result<()>,
{
    follow(&root.unwrap_document(), &mut f, matchers)
}

fn follow(
    node: &NodeRef,
    f: &mut dyn FnMut(&NodeRef) -> Result<()>,
    matchers: &[PathMatcher],
) -> Result<()> {
    match matchers.split_first() {
        None => f(node),
        Some((step, rest)) => step.matches(node, &mut |found: &NodeRef| follow(found, f, rest)),
    }
}

// =============================================================================
// Segments
// =============================================================================

/// Typed path element accepted by [`walk_path`].
///
/// Values of types that cannot designate a node (floats, booleans) convert
/// to [`Segment::Unsupported`], which [`walk_path`] rejects before walking.
#[derive(Debug, Clone)]
pub enum Segment {
    Key(String),
    Index(i64),
    Node(NodeRef),
    Unsupported {
        type_name: &'static str,
        value: String,
    },
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<&String> for Segment {
    fn from(key: &String) -> Self {
        Segment::Key(key.clone())
    }
}

impl From<i32> for Segment {
    fn from(index: i32) -> Self {
        Segment::Index(i64::from(index))
    }
}

impl From<i64> for Segment {
    fn from(index: i64) -> Self {
        Segment::Index(index)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        match i64::try_from(index) {
            Ok(index) => Segment::Index(index),
            Err(_) => Segment::Unsupported {
                type_name: "usize",
                value: index.to_string(),
            },
        }
    }
}

impl From<NodeRef> for Segment {
    fn from(node: NodeRef) -> Self {
        Segment::Node(node)
    }
}

impl From<&NodeRef> for Segment {
    fn from(node: &NodeRef) -> Self {
        Segment::Node(node.clone())
    }
}

impl From<f64> for Segment {
    fn from(value: f64) -> Self {
        Segment::Unsupported {
            type_name: "f64",
            value: value.to_string(),
        }
    }
}

impl From<bool> for Segment {
    fn from(value: bool) -> Self {
        Segment::Unsupported {
            type_name: "bool",
            value: value.to_string(),
        }
    }
}

impl TryFrom<Segment> for PathMatcher {
    type Error = Error;

    fn try_from(segment: Segment) -> Result<Self> {
        match segment {
            Segment::Key(key) => Ok(PathMatcher::Key(key)),
            Segment::Index(index) => Ok(PathMatcher::Index(index)),
            Segment::Node(node) => Ok(PathMatcher::node(&node)),
            Segment::Unsupported { type_name, value } => Err(Error::Path(format!(
                "unable to make path matcher from type {} ({})",
                type_name, value
            ))),
        }
    }
}

/// Build a `Vec<Segment>` from mixed keys, indices and nodes.
///
/// ```
/// use yaml_walk::path;
/// use yaml_walk::yaml::Segment;
///
/// let segments = path!["servers", 0, "host"];
/// assert!(matches!(segments[1], Segment::Index(0)));
/// ```
#[macro_export]
macro_rules! path {
    ($($segment:expr),* $(,)?) => {
        vec![$($crate::yaml::Segment::from($segment)),*]
    };
}

/// [`walk_path_matchers`] over typed segments.
///
/// Every segment is converted before anything is walked, so an unsupported
/// segment fails without calling `f`.
pub fn walk_path<F, P>(root: &NodeRef, f: F, path: P) -> Result<()>
where
    F: FnMut(&NodeRef) -> Result<()>,
    P: IntoIterator,
    P::Item: Into<Segment>,
{
    let matchers = path
        .into_iter()
        .map(|segment| PathMatcher::try_from(segment.into()))
        .collect::<Result<Vec<_>>>()?;
    walk_path_matchers(root, f, &matchers)
}

/// Parse a dot-notation path into matchers.
///
/// Integers become index steps, `*` matches every immediate child and any
/// other component is a key. An empty path designates the root.
pub fn parse_path(path: &str) -> Vec<PathMatcher> {
    if path.is_empty() {
        return Vec::new();
    }
    split_path(path)
        .into_iter()
        .map(|part| {
            if part == "*" {
                PathMatcher::any_with(WalkOptions::new().with_max_depth(0))
            } else if let Ok(index) = part.parse::<i64>() {
                PathMatcher::Index(index)
            } else {
                PathMatcher::Key(part)
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
