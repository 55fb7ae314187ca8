//! Traversal, path matching and in-place editing of YAML node trees.
//!
//! Nodes carry comments, anchors and source positions next to the data,
//! and the mutations in [`yaml`] never overwrite them. Documents enter and
//! leave the tree through [`yaml::codec`], built on libfyaml.

pub mod tag;
pub mod yaml;
