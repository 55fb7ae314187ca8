//! YAML node tree traversal, path matching and mutation.
//!
//! # Module Organization
//!
//! - [`node`](NodeRef): the node tree, structural equality and copies
//! - [`walk`]: the traversal engine and its options
//! - walkers: ready-made visit functions ([`scalar_values_walker`], ...)
//! - path: [`PathMatcher`]s, [`Segment`]s and dot-notation paths
//! - mutation: assignment, insertion, removal and key lookups
//! - merge: [`range_map`], mapping iteration resolving `<<` merge keys
//! - [`codec`]: YAML text in and out, through libfyaml, and `fyaml::Value` interop
//!
//! ```
//! use yaml_walk::yaml::{assign_node, codec, parse_path, walk_path, walk_path_matchers, NodeRef};
//!
//! let doc = codec::parse_str("servers:\n- host: a\n- host: b\n").unwrap();
//! let mut hosts = Vec::new();
//! walk_path(
//!     &doc,
//!     |host| {
//!         assign_node(host, &NodeRef::string("c"));
//!         Ok(())
//!     },
//!     yaml_walk::path!["servers", -1, "host"],
//! )
//! .unwrap();
//! walk_path_matchers(
//!     &doc,
//!     |host| {
//!         hosts.push(codec::raw_string(host)?);
//!         Ok(())
//!     },
//!     &parse_path("servers.*.host"),
//! )
//! .unwrap();
//! assert_eq!(hosts, ["a", "c"]);
//! ```

pub mod codec;
mod error;
mod fy;
mod merge;
mod mutation;
mod node;
mod path;
mod walk;
mod walkers;

pub use error::{Error, Location, Result};

pub use node::{compare_keys, copy_node, equal, shallow_copy_node, sort_map_keys, Kind, Node, NodeRef};

pub use walk::{log_tracer, walk, Tracer, WalkOptions, WalkStatus};
pub use walkers::{index_walker, key_walker, scalar_values_walker};

pub use path::{
    parse_path, resolve_index, split_path, walk_path, walk_path_matchers, PathMatcher, Segment,
};

pub use mutation::{
    append_node, assign_map_node, assign_node, get_index, get_key, get_key_value, has_key, remove,
};

pub use merge::{range_map, RangeOptions};

pub use codec::{to_node, ToNode};

// =============================================================================
// Version
// =============================================================================

/// Get the fyaml C library version.
pub fn get_version() -> Result<String> {
    fyaml::get_c_version().map_err(|e| Error::Base(e.to_string()))
}
