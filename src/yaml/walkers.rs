//! Ready-made visit functions for [`walk`](super::walk::walk).
//!
//! Each adapter calls a node callback on the nodes it is looking for and
//! answers with the options' match status, or the miss status elsewhere.

use super::error::Result;
use super::node::{Kind, NodeRef};
use super::path::resolve_index;
use super::walk::{WalkOptions, WalkStatus};

/// Call `f` on every scalar that is not a mapping key.
///
/// Sequence elements and a scalar root are matched when visited. Mapping
/// values are never visited on their own, so a scalar value is matched
/// when its key is.
pub fn scalar_values_walker<F>(
    mut f: F,
) -> impl FnMut(&NodeRef, Option<&NodeRef>, Option<usize>, &WalkOptions) -> Result<WalkStatus>
where
    F: FnMut(&NodeRef) -> Result<()>,
{
    move |current, parent, position, opts| {
        let candidate = match (parent, position) {
            (Some(parent), Some(position)) if parent.kind() == Kind::Mapping => {
                parent.child(position + 1)
            }
            _ => Some(current.clone()),
        };
        match candidate {
            Some(scalar) if scalar.kind() == Kind::Scalar => {
                f(&scalar)?;
                Ok(opts.match_status())
            }
            _ => Ok(opts.miss_status()),
        }
    }
}

/// Call `f` on the value of every mapping entry whose key is `key`.
pub fn key_walker<F>(
    key: &str,
    mut f: F,
) -> impl FnMut(&NodeRef, Option<&NodeRef>, Option<usize>, &WalkOptions) -> Result<WalkStatus>
where
    F: FnMut(&NodeRef) -> Result<()>,
{
    let key = key.to_string();
    move |current, parent, position, opts| {
        let (parent, position) = match (parent, position) {
            (Some(parent), Some(position)) if parent.kind() == Kind::Mapping => (parent, position),
            _ => return Ok(opts.miss_status()),
        };
        if current.borrow().value != key {
            return Ok(opts.miss_status());
        }
        match parent.child(position + 1) {
            Some(value) => f(&value)?,
            None => return Ok(opts.miss_status()),
        }
        Ok(opts.match_status())
    }
}

/// Call `f` on element `index` of every sequence.
///
/// Negative indices count from the end of each sequence. Elements before
/// the target are deferred and elements after it are pruned: a match can
/// only be below them, never at their level.
pub fn index_walker<F>(
    index: i64,
    mut f: F,
) -> impl FnMut(&NodeRef, Option<&NodeRef>, Option<usize>, &WalkOptions) -> Result<WalkStatus>
where
    F: FnMut(&NodeRef) -> Result<()>,
{
    move |current, parent, position, opts| {
        let (parent, position) = match (parent, position) {
            (Some(parent), Some(position)) if parent.kind() == Kind::Sequence => (parent, position),
            _ => return Ok(opts.miss_status()),
        };
        let target = match resolve_index(index, parent.len()) {
            Some(target) => target,
            None => return Ok(WalkStatus::Prune),
        };
        if target > position {
            return Ok(WalkStatus::BreadthFirst);
        }
        if target < position {
            return Ok(WalkStatus::Prune);
        }
        f(current)?;
        Ok(opts.match_status())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
