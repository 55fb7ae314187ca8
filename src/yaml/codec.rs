//! Conversion between the node tree, YAML text and `fyaml::Value`.
//!
//! Text is read and written through libfyaml documents directly so that
//! anchors, aliases and positions survive. Tags are resolved on the way
//! in: every decoded scalar carries an explicit `!!` tag and a plain `<<`
//! key is tagged `!!merge`. `fyaml::Value` is only an interchange type
//! for native values, and aliases are dereferenced when encoding into it.

use super::error::{Error, Result};
use super::fy;
use super::node::{Kind, NodeRef};
use crate::tag;
use fyaml::{Number, TaggedValue, Value};
use indexmap::IndexMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// =============================================================================
// Decoding
// =============================================================================

/// Decode a `fyaml::Value` into a node tree.
pub fn from_value(value: &Value) -> NodeRef {
    match value {
        Value::Null => NodeRef::null(),
        Value::Bool(b) => NodeRef::bool(*b),
        Value::Number(Number::Int(i)) => NodeRef::int(*i),
        Value::Number(Number::UInt(u)) => NodeRef::scalar(tag::INT, &u.to_string()),
        Value::Number(Number::Float(f)) => NodeRef::float(*f),
        Value::String(s) => NodeRef::string(s),
        Value::Sequence(items) => NodeRef::sequence_of(items.iter().map(from_value).collect()),
        Value::Mapping(map) => NodeRef::mapping_of(
            map.iter()
                .map(|(k, v)| {
                    let key = from_value(k);
                    if matches!(k, Value::String(s) if s == "<<") {
                        key.borrow_mut().tag = tag::MERGE.to_string();
                    }
                    (key, from_value(v))
                })
                .collect(),
        ),
        Value::Tagged(tagged) => {
            let node = from_value(&tagged.value);
            node.borrow_mut().tag = tag::normalize(&tagged.tag);
            node
        }
    }
}

/// Parse YAML text into a document node.
///
/// Blank input gives an empty document.
pub fn parse_str(text: &str) -> Result<NodeRef> {
    if text.trim().is_empty() {
        return Ok(NodeRef::document(None));
    }
    Ok(NodeRef::document(fy::parse(text)?))
}

/// Read and parse a YAML file. Errors carry the file name.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<NodeRef> {
    let path = path.as_ref();
    let name = path.display().to_string();
    log::debug!("reading {}", name);

    let mut text = String::new();
    {
        let mut file = File::open(path).map_err(|e| Error::from(e).with_filename(&name))?;
        file.read_to_string(&mut text)
            .map_err(|e| Error::from(e).with_filename(&name))?;
    }
    parse_str(&text).map_err(|e| e.with_filename(&name))
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a node tree into a `fyaml::Value`.
///
/// Aliases are replaced by the value they point to. Untagged scalars are
/// resolved like plain YAML scalars; tags outside the core schema are kept
/// as `Value::Tagged`.
pub fn to_value(node: &NodeRef) -> Result<Value> {
    let node = node.unwrap_document();
    let kind = node.kind();
    match kind {
        Kind::Document => Ok(Value::Null),
        Kind::Alias => {
            let target = node.indirect();
            if target.kind() == Kind::Alias {
                return Err(Error::Shape(format!("unknown anchor {:?} referenced", node.value()))
                    .at(&node));
            }
            to_value(&target)
        }
        Kind::Sequence => {
            let items = node
                .borrow()
                .content
                .iter()
                .map(to_value)
                .collect::<Result<Vec<_>>>()?;
            Ok(with_tag(&node.tag(), tag::SEQ, Value::Sequence(items)))
        }
        Kind::Mapping => {
            let content = node.borrow().content.clone();
            if content.len() % 2 != 0 {
                return Err(Error::Shape(format!(
                    "unexpected node content length {}, must be even",
                    content.len()
                ))
                .at(&node));
            }
            let mut map = IndexMap::new();
            for pair in content.chunks(2) {
                map.insert(to_value(&pair[0])?, to_value(&pair[1])?);
            }
            Ok(with_tag(&node.tag(), tag::MAP, Value::Mapping(map)))
        }
        Kind::Scalar => Ok(scalar_value(&node.tag(), &node.value())),
    }
}

fn with_tag(node_tag: &str, default: &str, value: Value) -> Value {
    if node_tag.is_empty() || node_tag == default {
        return value;
    }
    Value::Tagged(Box::new(TaggedValue {
        tag: node_tag.to_string(),
        value,
    }))
}

fn scalar_value(node_tag: &str, text: &str) -> Value {
    let resolved = if node_tag.is_empty() {
        tag::resolve(text)
    } else {
        node_tag
    };
    match resolved {
        tag::NULL => Value::Null,
        tag::BOOL => Value::Bool(text.eq_ignore_ascii_case("true")),
        tag::INT => match tag::parse_int(text) {
            Some(i) => Value::Number(Number::Int(i)),
            None => match text.parse::<u64>() {
                Ok(u) => Value::Number(Number::UInt(u)),
                Err(_) => Value::String(text.to_string()),
            },
        },
        tag::FLOAT => match tag::parse_float(text) {
            Some(f) => Value::Number(Number::Float(f)),
            None => Value::String(text.to_string()),
        },
        tag::STR | tag::MERGE => Value::String(text.to_string()),
        custom => Value::Tagged(Box::new(TaggedValue {
            tag: custom.to_string(),
            value: Value::String(text.to_string()),
        })),
    }
}

/// Emit a node tree as YAML text, anchors and aliases included.
pub fn emit(node: &NodeRef) -> Result<String> {
    fy::emit(node)
}

/// Scalars as their bare text (null as the empty string), anything else
/// emitted as YAML.
pub fn raw_string(node: &NodeRef) -> Result<String> {
    let node = node.indirect();
    match node.kind() {
        Kind::Scalar if node.is_null() => Ok(String::new()),
        Kind::Scalar => Ok(node.value()),
        Kind::Document => Ok(String::new()),
        _ => emit(&node),
    }
}

// =============================================================================
// Native values
// =============================================================================

/// Conversion of native values into nodes.
///
/// Strings become `!!str` scalars as they are. Numbers, booleans and
/// `fyaml::Value`s go through [`from_value`]. Nodes are passed through,
/// documents unwrapped.
pub trait ToNode {
    fn to_node(&self) -> Result<NodeRef>;
}

/// Shorthand for [`ToNode::to_node`].
pub fn to_node<T: ToNode + ?Sized>(value: &T) -> Result<NodeRef> {
    value.to_node()
}

impl ToNode for str {
    fn to_node(&self) -> Result<NodeRef> {
        Ok(NodeRef::string(self))
    }
}

impl ToNode for String {
    fn to_node(&self) -> Result<NodeRef> {
        Ok(NodeRef::string(self))
    }
}

impl ToNode for Value {
    fn to_node(&self) -> Result<NodeRef> {
        Ok(from_value(self))
    }
}

impl ToNode for i64 {
    fn to_node(&self) -> Result<NodeRef> {
        Value::Number(Number::Int(*self)).to_node()
    }
}

impl ToNode for i32 {
    fn to_node(&self) -> Result<NodeRef> {
        i64::from(*self).to_node()
    }
}

impl ToNode for u64 {
    fn to_node(&self) -> Result<NodeRef> {
        Value::Number(Number::UInt(*self)).to_node()
    }
}

impl ToNode for f64 {
    fn to_node(&self) -> Result<NodeRef> {
        Value::Number(Number::Float(*self)).to_node()
    }
}

impl ToNode for bool {
    fn to_node(&self) -> Result<NodeRef> {
        Value::Bool(*self).to_node()
    }
}

impl ToNode for NodeRef {
    fn to_node(&self) -> Result<NodeRef> {
        Ok(self.unwrap_document())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
