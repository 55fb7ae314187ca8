//! Mapping iteration with `<<` merge key resolution.
//!
//! A merge key (`<<: *defaults`, or `<<: [*a, *b]`) pulls the pairs of one
//! or more other mappings into the mapping holding it. [`range_map`] walks
//! a mapping as if those pairs had been written in place:
//!
//! ```yaml
//! defaults: &defaults
//!   timeout: 10
//!   retries: 3
//! service:
//!   <<: *defaults
//!   retries: 5
//! ```
//!
//! Ranging over `service` yields `timeout: 10` then `retries: 5`; the
//! `retries: 3` of the merged mapping is shadowed by the direct key unless
//! [`RangeOptions::with_allow_duplicate_merge_keys`] is used.

use super::error::{Error, Result};
use super::node::{equal, Kind, NodeRef};

/// How [`range_map`] handles merge keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeOptions {
    merges_last: bool,
    allow_duplicate_merge_keys: bool,
}

impl RangeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield merged pairs after every direct pair instead of where the
    /// merge key sits.
    pub fn with_merges_last(mut self) -> Self {
        self.merges_last = true;
        self
    }

    /// Also yield merged pairs whose key is already a direct key of an
    /// enclosing mapping.
    pub fn with_allow_duplicate_merge_keys(mut self) -> Self {
        self.allow_duplicate_merge_keys = true;
        self
    }

    pub fn merges_last(&self) -> bool {
        self.merges_last
    }

    pub fn allow_duplicate_merge_keys(&self) -> bool {
        self.allow_duplicate_merge_keys
    }
}

/// Call `f(key, value)` for every pair of mapping `node`, merge keys
/// resolved.
///
/// `node` is dereferenced first (document, aliases); a null node has no
/// pairs. Returning [`Error::StopRange`] from `f` ends the iteration
/// successfully, any other error is returned as is.
pub fn range_map<F>(node: &NodeRef, mut f: F, opts: RangeOptions) -> Result<()>
where
    F: FnMut(&NodeRef, &NodeRef) -> Result<()>,
{
    match range_pairs(node, &mut f, opts, &[]) {
        Err(e) if e.is_stop() => {
            log::trace!("range_map: stopped by callback");
            Ok(())
        }
        other => other,
    }
}

/// Pairs of `node`, skipping direct keys equal to one of `shadowed` (the
/// keys of the mappings merging this one).
fn range_pairs(
    node: &NodeRef,
    f: &mut dyn FnMut(&NodeRef, &NodeRef) -> Result<()>,
    opts: RangeOptions,
    shadowed: &[NodeRef],
) -> Result<()> {
    let node = node.indirect();
    if node.is_null() {
        return Ok(());
    }
    let kind = node.kind();
    if kind != Kind::Mapping {
        return Err(Error::Shape(format!(
            "expected node kind {:?}, got {:?}",
            Kind::Mapping.to_string(),
            kind.to_string()
        ))
        .at(&node));
    }
    // snapshot: `f` may edit the mapping it is ranging over
    let content = node.borrow().content.clone();
    if content.len() % 2 != 0 {
        return Err(Error::Shape(format!(
            "unexpected node content length {}, must be even",
            content.len()
        ))
        .at(&node));
    }

    let mut primary: Vec<NodeRef> = shadowed.to_vec();
    if !opts.allow_duplicate_merge_keys {
        primary.extend(
            content
                .iter()
                .step_by(2)
                .filter(|key| !key.is_merge_key())
                .map(NodeRef::indirect),
        );
    }

    let mut deferred = Vec::new();
    for pair in content.chunks(2) {
        let (key, value) = (&pair[0], &pair[1]);
        if key.is_merge_key() {
            for source in merge_sources(value) {
                if opts.merges_last {
                    deferred.push(source);
                } else {
                    range_pairs(&source, f, opts, &primary)?;
                }
            }
            continue;
        }
        if shadowed.iter().any(|k| equal(k, key)) {
            log::trace!("range_map: merged key {:?} is shadowed", key.value());
            continue;
        }
        f(key, value)?;
    }
    for source in deferred {
        range_pairs(&source, f, opts, &primary)?;
    }
    Ok(())
}

/// Mappings designated by the value of a merge key.
fn merge_sources(value: &NodeRef) -> Vec<NodeRef> {
    let value = value.indirect();
    if value.kind() == Kind::Sequence {
        value
            .borrow()
            .content
            .iter()
            .map(NodeRef::indirect)
            .collect()
    } else {
        vec![value]
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
