//! Tree traversal.
//!
//! [`walk`] calls a visit function on the root and then on every
//! descendant. The status returned by each visit decides what happens to
//! the subtree below the visited node:
//!
//! - [`WalkStatus::DepthFirst`] descends into it right away,
//! - [`WalkStatus::BreadthFirst`] queues it until every node already
//!   queued has been walked, which yields level order across the tree,
//! - [`WalkStatus::Prune`] skips it,
//! - [`WalkStatus::Exit`] stops the whole walk (successfully).
//!
//! Mapping pairs are visited once, through their key: `current` is the
//! key node and the value is `parent.content[position + 1]`. The walk
//! then continues inside the value.

use super::error::{Error, Result};
use super::node::{Kind, NodeRef};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// What to do with the subtree of a visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    Exit,
    DepthFirst,
    BreadthFirst,
    Prune,
}

impl fmt::Display for WalkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WalkStatus::Exit => "Exit",
            WalkStatus::DepthFirst => "Depth",
            WalkStatus::BreadthFirst => "Breadth",
            WalkStatus::Prune => "Prune",
        };
        f.write_str(name)
    }
}

/// Observer called after every visit with
/// `(current, parent, position, depth, result)`.
pub type Tracer =
    dyn Fn(&NodeRef, Option<&NodeRef>, Option<usize>, usize, &Result<WalkStatus>);

/// Traversal policy.
#[derive(Clone)]
pub struct WalkOptions {
    miss_status: WalkStatus,
    match_status: Option<WalkStatus>,
    max_depth: Option<usize>,
    trace: Option<Rc<Tracer>>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions {
            miss_status: WalkStatus::DepthFirst,
            match_status: None,
            max_depth: None,
            trace: None,
        }
    }
}

impl fmt::Debug for WalkOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkOptions")
            .field("miss_status", &self.miss_status)
            .field("match_status", &self.match_status)
            .field("max_depth", &self.max_depth)
            .field("trace", &self.trace.is_some())
            .finish()
    }
}

impl WalkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status visit functions return when a node is not what they look for.
    pub fn with_miss_status(mut self, status: WalkStatus) -> Self {
        self.miss_status = status;
        self
    }

    /// Status visit functions return on a match. Defaults to the miss status.
    pub fn with_match_status(mut self, status: WalkStatus) -> Self {
        self.match_status = Some(status);
        self
    }

    pub fn with_breadth_first(self) -> Self {
        self.with_miss_status(WalkStatus::BreadthFirst)
    }

    /// Stop the walk after the first match.
    pub fn with_first_only(self) -> Self {
        self.with_match_status(WalkStatus::Exit)
    }

    /// Only visit nodes down to `depth`; the root's children are at depth 0.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_trace<F>(mut self, trace: F) -> Self
    where
        F: Fn(&NodeRef, Option<&NodeRef>, Option<usize>, usize, &Result<WalkStatus>) + 'static,
    {
        self.trace = Some(Rc::new(trace));
        self
    }

    pub fn miss_status(&self) -> WalkStatus {
        self.miss_status
    }

    pub fn match_status(&self) -> WalkStatus {
        self.match_status.unwrap_or(self.miss_status)
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    fn observe(
        &self,
        current: &NodeRef,
        parent: Option<&NodeRef>,
        position: Option<usize>,
        depth: usize,
        result: &Result<WalkStatus>,
    ) {
        if let Some(trace) = &self.trace {
            trace(current, parent, position, depth, result);
        }
    }
}

/// Tracer writing every visit to the `log` facade at trace level.
pub fn log_tracer(
    current: &NodeRef,
    _parent: Option<&NodeRef>,
    position: Option<usize>,
    depth: usize,
    result: &Result<WalkStatus>,
) {
    let node = current.borrow();
    let position = position.map_or_else(|| "-".to_string(), |p| p.to_string());
    match result {
        Ok(status) => log::trace!(
            "{}> {} {} {:?} [{}]",
            "===".repeat(depth),
            position,
            node.tag,
            node.value,
            status
        ),
        Err(e) => log::trace!(
            "{}> {} {} {:?} [error: {}]",
            "===".repeat(depth),
            position,
            node.tag,
            node.value,
            e
        ),
    }
}

/// Subtree whose walk was deferred by a `BreadthFirst` status.
struct Deferred {
    node: NodeRef,
    depth: usize,
}

struct Walker<'a, F> {
    visit: &'a mut F,
    opts: &'a WalkOptions,
    queue: VecDeque<Deferred>,
}

/// Walk `root` (unwrapped from its document), calling `visit` on every node.
///
/// `visit` receives `(current, parent, position, options)`; the root is
/// visited with no parent and no position. The first error returned by
/// `visit` stops the walk and is returned as is.
pub fn walk<F>(root: &NodeRef, mut visit: F, opts: WalkOptions) -> Result<()>
where
    F: FnMut(&NodeRef, Option<&NodeRef>, Option<usize>, &WalkOptions) -> Result<WalkStatus>,
{
    let root = root.unwrap_document();
    let result = visit(&root, None, None, &opts);
    opts.observe(&root, None, None, 0, &result);
    match result? {
        WalkStatus::Exit | WalkStatus::Prune => return Ok(()),
        WalkStatus::DepthFirst | WalkStatus::BreadthFirst => {}
    }

    let mut walker = Walker {
        visit: &mut visit,
        opts: &opts,
        queue: VecDeque::new(),
    };
    if walker.children(&root, 0)? == WalkStatus::Exit {
        return Ok(());
    }
    while let Some(next) = walker.queue.pop_front() {
        if walker.children(&next.node, next.depth)? == WalkStatus::Exit {
            log::trace!("walk: exit from deferred subtree at depth {}", next.depth);
            return Ok(());
        }
    }
    Ok(())
}

impl<F> Walker<'_, F>
where
    F: FnMut(&NodeRef, Option<&NodeRef>, Option<usize>, &WalkOptions) -> Result<WalkStatus>,
{
    /// Visit the children of `node`, which sit at `depth`.
    ///
    /// Returns `Exit` when the walk must stop, `Prune` when `depth` is
    /// beyond the configured maximum, `DepthFirst` otherwise.
    fn children(&mut self, node: &NodeRef, depth: usize) -> Result<WalkStatus> {
        if self.opts.max_depth.is_some_and(|max| depth > max) {
            return Ok(WalkStatus::Prune);
        }
        let mut position = 0;
        loop {
            let (current, is_map) = {
                let n = node.borrow();
                match n.content.get(position) {
                    Some(child) => (child.clone(), n.kind == Kind::Mapping),
                    None => break,
                }
            };
            let result = (self.visit)(&current, Some(node), Some(position), self.opts);
            self.opts
                .observe(&current, Some(node), Some(position), depth, &result);
            let status = result?;

            let subtree = if is_map {
                let value = node.child(position + 1).ok_or_else(|| {
                    Error::Shape(format!(
                        "mapping key {:?} at position {} has no value",
                        current.value(),
                        position
                    ))
                    .at(node)
                })?;
                position += 2;
                value
            } else {
                position += 1;
                current
            };

            match status {
                WalkStatus::Exit => return Ok(WalkStatus::Exit),
                WalkStatus::DepthFirst => {
                    if self.children(&subtree, depth + 1)? == WalkStatus::Exit {
                        return Ok(WalkStatus::Exit);
                    }
                }
                WalkStatus::BreadthFirst => self.queue.push_back(Deferred {
                    node: subtree,
                    depth: depth + 1,
                }),
                WalkStatus::Prune => {}
            }
        }
        Ok(WalkStatus::DepthFirst)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
