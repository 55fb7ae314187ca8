//! Node trees to and from libfyaml documents.
//!
//! Parsing keeps what `fyaml::Value` flattens away: aliases stay alias
//! nodes pointing at their anchored node, anchors and explicit tags are
//! kept and every node records where it was read. Emitting writes anchors
//! back and turns an alias into `*name` whenever its target was already
//! written under that name, expanding it in place otherwise.

use super::error::{Error, Result};
use super::node::{Kind, Node, NodeRef};
use crate::tag;
use fyaml_sys::*;
use libc::{c_char, c_void};
use std::collections::HashMap;
use std::ffi::CStr;
use std::ptr;

/// libfyaml document destroyed on drop, along with every node it owns.
struct FyDocument(*mut fy_document);

impl Drop for FyDocument {
    fn drop(&mut self) {
        if !self.0.is_null() {
            log::trace!("destroying fy_document {:p}", self.0);
            unsafe { fy_document_destroy(self.0) };
        }
    }
}

/// Copy a text and length pair lent by libfyaml.
///
/// # Safety
///
/// `data` must be null or valid for `len` bytes.
unsafe fn owned_text(data: *const c_char, len: usize) -> Result<String> {
    if data.is_null() || len == 0 {
        return Ok(String::new());
    }
    let bytes = std::slice::from_raw_parts(data as *const u8, len);
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::Parse(format!("invalid UTF-8 in YAML text: {}", e)))
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse the first document of `source`. `None` when it has no root node.
pub(super) fn parse(source: &str) -> Result<Option<NodeRef>> {
    let cfg = fy_parse_cfg {
        search_path: ptr::null_mut(),
        userdata: ptr::null_mut(),
        diag: ptr::null_mut(),
        // no FYPCF_RESOLVE_DOCUMENT: aliases and merge keys are kept as written
        flags: FYPCF_QUIET,
    };
    let doc = FyDocument(unsafe {
        fy_document_build_from_string(&cfg, source.as_ptr() as *const c_char, source.len())
    });
    if doc.0.is_null() {
        return Err(Error::Parse("failed to parse YAML".to_string()));
    }
    let root = unsafe { fy_document_root(doc.0) };
    if root.is_null() {
        return Ok(None);
    }
    Decoder::default().node(root).map(Some)
}

#[derive(Default)]
struct Decoder {
    /// Anchor name to the node last defining it, in document order.
    anchors: HashMap<String, NodeRef>,
}

impl Decoder {
    fn node(&mut self, fyn: *mut fy_node) -> Result<NodeRef> {
        // a missing key or value reads as an empty scalar
        if fyn.is_null() {
            return Ok(NodeRef::scalar(tag::NULL, ""));
        }
        let node = unsafe {
            match fy_node_get_type(fyn) {
                x if x == FYNT_SCALAR && fy_node_get_style(fyn) == FYNS_ALIAS => {
                    let node = self.alias(fyn)?;
                    set_position(&node, fyn);
                    return Ok(node);
                }
                x if x == FYNT_SCALAR => scalar(fyn)?,
                x if x == FYNT_SEQUENCE => NodeRef::sequence(),
                _ => NodeRef::mapping(),
            }
        };
        unsafe {
            let mut len: usize = 0;
            let explicit = owned_text(fy_node_get_tag(fyn, &mut len), len)?;
            if !explicit.is_empty() {
                node.borrow_mut().tag = tag::normalize(&explicit);
            }
            let anchor = fy_node_get_anchor(fyn);
            if !anchor.is_null() {
                let name = owned_text(fy_anchor_get_text(anchor, &mut len), len)?;
                node.borrow_mut().anchor = name.clone();
                // registered before the children: they may refer back to it
                self.anchors.insert(name, node.clone());
            }
            set_position(&node, fyn);
        }

        match node.kind() {
            Kind::Sequence => self.sequence(&node, fyn)?,
            Kind::Mapping => self.mapping(&node, fyn)?,
            _ => {}
        }
        Ok(node)
    }

    fn sequence(&mut self, node: &NodeRef, fyn: *mut fy_node) -> Result<()> {
        let mut prev: *mut c_void = ptr::null_mut();
        loop {
            let item = unsafe { fy_node_sequence_iterate(fyn, &mut prev) };
            if item.is_null() {
                return Ok(());
            }
            let child = self.node(item)?;
            node.borrow_mut().content.push(child);
        }
    }

    fn mapping(&mut self, node: &NodeRef, fyn: *mut fy_node) -> Result<()> {
        let mut prev: *mut c_void = ptr::null_mut();
        loop {
            let pair = unsafe { fy_node_mapping_iterate(fyn, &mut prev) };
            if pair.is_null() {
                return Ok(());
            }
            let (fy_key, fy_value) = unsafe { (fy_node_pair_key(pair), fy_node_pair_value(pair)) };
            let key = self.node(fy_key)?;
            if unsafe { is_merge_key(fy_key) } {
                key.borrow_mut().tag = tag::MERGE.to_string();
            }
            let value = self.node(fy_value)?;
            node.borrow_mut().content.extend([key, value]);
        }
    }

    unsafe fn alias(&self, fyn: *mut fy_node) -> Result<NodeRef> {
        let mut len: usize = 0;
        let name = owned_text(fy_node_get_scalar(fyn, &mut len), len)?;
        if let Some(target) = self.anchors.get(&name) {
            return Ok(NodeRef::alias(target));
        }
        log::debug!("alias *{} refers to no anchor defined before it", name);
        let mut node = Node::default();
        node.kind = Kind::Alias;
        node.value = name;
        Ok(node.into_ref())
    }
}

unsafe fn scalar(fyn: *mut fy_node) -> Result<NodeRef> {
    let mut len: usize = 0;
    let value = owned_text(fy_node_get_scalar(fyn, &mut len), len)?;
    let resolved = match fy_node_get_style(fyn) {
        FYNS_SINGLE_QUOTED | FYNS_DOUBLE_QUOTED | FYNS_LITERAL | FYNS_FOLDED => tag::STR,
        _ => tag::resolve(&value),
    };
    Ok(NodeRef::scalar(resolved, &value))
}

/// A plain, untagged `<<` key.
unsafe fn is_merge_key(fyn: *mut fy_node) -> bool {
    if fyn.is_null()
        || fy_node_get_type(fyn) != FYNT_SCALAR
        || fy_node_get_style(fyn) != FYNS_PLAIN
        || !fy_node_get_tag(fyn, ptr::null_mut()).is_null()
    {
        return false;
    }
    let mut len: usize = 0;
    matches!(owned_text(fy_node_get_scalar(fyn, &mut len), len), Ok(text) if text == "<<")
}

/// Record the 1-based start of `fyn` on `node`.
unsafe fn set_position(node: &NodeRef, fyn: *mut fy_node) {
    let token = fy_node_get_start_token(fyn);
    if token.is_null() {
        return;
    }
    let mark = fy_token_start_mark(token);
    if mark.is_null() {
        return;
    }
    let mut n = node.borrow_mut();
    n.line = usize::try_from((*mark).line).map_or(0, |line| line + 1);
    n.column = usize::try_from((*mark).column).map_or(0, |column| column + 1);
}

// =============================================================================
// Emitting
// =============================================================================

/// Emit `node` as a YAML document.
pub(super) fn emit(node: &NodeRef) -> Result<String> {
    let doc = FyDocument(unsafe { fy_document_create(ptr::null_mut()) });
    if doc.0.is_null() {
        return Err(Error::Base("failed to create a libfyaml document".to_string()));
    }
    let mut encoder = Encoder {
        doc: doc.0,
        anchors: HashMap::new(),
        open: Vec::new(),
        expanding: 0,
    };
    let root = encoder.node(&node.unwrap_document())?;
    if unsafe { fy_document_set_root(doc.0, root) } != 0 {
        return Err(Error::Base("failed to set document root".to_string()));
    }

    let text = unsafe { fy_emit_document_to_string(doc.0, FYECF_MODE_DEJSON) };
    if text.is_null() {
        return Err(Error::Base("failed to emit document".to_string()));
    }
    let emitted = unsafe { CStr::from_ptr(text) }
        .to_string_lossy()
        .into_owned();
    unsafe { libc::free(text as *mut c_void) };
    Ok(emitted)
}

struct Encoder {
    doc: *mut fy_document,
    /// Anchor name to the node written under it so far.
    anchors: HashMap<String, NodeRef>,
    /// Collections being written, outermost first.
    open: Vec<NodeRef>,
    /// Non-zero while writing a copy of an alias target. Copies carry no
    /// anchors so names stay bound to the original nodes.
    expanding: usize,
}

impl Encoder {
    fn node(&mut self, node: &NodeRef) -> Result<*mut fy_node> {
        let fyn = match node.kind() {
            Kind::Alias => return self.alias(node),
            Kind::Scalar => self.scalar(node)?,
            // an empty document nested or at the root
            Kind::Document => unsafe { fy_node_create_scalar_copy(self.doc, ptr::null(), 0) },
            Kind::Sequence => unsafe { fy_node_create_sequence(self.doc) },
            Kind::Mapping => unsafe { fy_node_create_mapping(self.doc) },
        };
        if fyn.is_null() {
            return Err(Error::Base(format!("failed to create {} node", node.kind())).at(node));
        }
        self.anchor(node, fyn)?;

        let (kind, node_tag) = {
            let n = node.borrow();
            (n.kind, n.tag.clone())
        };
        match kind {
            Kind::Sequence => {
                self.open.push(node.clone());
                let items = node.borrow().content.clone();
                for item in &items {
                    let child = self.node(item)?;
                    if unsafe { fy_node_sequence_append(fyn, child) } != 0 {
                        return Err(Error::Base("failed to append sequence item".to_string()).at(item));
                    }
                }
                self.open.pop();
                self.set_tag(fyn, &node_tag, tag::SEQ, node)?;
            }
            Kind::Mapping => {
                let content = node.borrow().content.clone();
                if content.len() % 2 != 0 {
                    return Err(Error::Shape(format!(
                        "unexpected node content length {}, must be even",
                        content.len()
                    ))
                    .at(node));
                }
                self.open.push(node.clone());
                for pair in content.chunks(2) {
                    let key = self.node(&pair[0])?;
                    let value = self.node(&pair[1])?;
                    if unsafe { fy_node_mapping_append(fyn, key, value) } != 0 {
                        return Err(Error::Shape(format!("duplicate mapping key {:?}", pair[0].value()))
                            .at(&pair[0]));
                    }
                }
                self.open.pop();
                self.set_tag(fyn, &node_tag, tag::MAP, node)?;
            }
            _ => {}
        }
        Ok(fyn)
    }

    fn scalar(&mut self, node: &NodeRef) -> Result<*mut fy_node> {
        let (node_tag, value) = {
            let n = node.borrow();
            (n.tag.clone(), n.value.clone())
        };
        let plain = tag::resolve(&value);
        let fyn = match node_tag.as_str() {
            tag::NULL if value.is_empty() => unsafe {
                fy_node_create_scalar_copy(self.doc, ptr::null(), 0)
            },
            // text that would read back as another type, or as a merge key
            tag::STR if plain != tag::STR || value == "<<" => {
                // such text never holds quotes or backslashes
                let quoted = format!("\"{}\"", value);
                unsafe {
                    fy_node_build_from_string(self.doc, quoted.as_ptr() as *const c_char, quoted.len())
                }
            }
            _ => unsafe {
                fy_node_create_scalar_copy(self.doc, value.as_ptr() as *const c_char, value.len())
            },
        };
        if fyn.is_null() {
            return Err(Error::Base("failed to create scalar node".to_string()).at(node));
        }
        let implied = match node_tag.as_str() {
            "" | tag::STR | tag::MERGE => true,
            core if tag::is_core(core) => core == plain,
            _ => false,
        };
        if !implied {
            self.set_tag(fyn, &node_tag, "", node)?;
        }
        Ok(fyn)
    }

    fn alias(&mut self, node: &NodeRef) -> Result<*mut fy_node> {
        let name = node.value();
        let target = node.borrow().alias_target();
        let Some(target) = target else {
            return Err(Error::Shape(format!("unknown anchor {:?} referenced", name)).at(node));
        };
        if self.anchors.get(&name).is_some_and(|bound| bound.ptr_eq(&target)) {
            let fyn = unsafe {
                fy_node_create_alias_copy(self.doc, name.as_ptr() as *const c_char, name.len())
            };
            if fyn.is_null() {
                return Err(Error::Base(format!("failed to create alias *{}", name)).at(node));
            }
            return Ok(fyn);
        }
        if self.open.iter().any(|open| open.ptr_eq(&target)) {
            return Err(Error::Shape(format!(
                "alias *{} refers to an enclosing node that has no anchor",
                name
            ))
            .at(node));
        }
        log::debug!("expanding alias *{} written before its anchor", name);
        self.expanding += 1;
        let expanded = self.node(&target);
        self.expanding -= 1;
        expanded
    }

    fn anchor(&mut self, node: &NodeRef, fyn: *mut fy_node) -> Result<()> {
        let name = node.borrow().anchor.clone();
        if name.is_empty() || self.expanding > 0 {
            return Ok(());
        }
        if unsafe { fy_node_set_anchor_copy(fyn, name.as_ptr() as *const c_char, name.len()) } != 0 {
            return Err(Error::Base(format!("failed to set anchor &{}", name)).at(node));
        }
        self.anchors.insert(name, node.clone());
        Ok(())
    }

    /// Write `node_tag` on `fyn` unless it is empty or `implied`.
    fn set_tag(&self, fyn: *mut fy_node, node_tag: &str, implied: &str, node: &NodeRef) -> Result<()> {
        if node_tag.is_empty() || node_tag == implied {
            return Ok(());
        }
        if unsafe { fy_node_set_tag(fyn, node_tag.as_ptr() as *const c_char, node_tag.len()) } != 0 {
            return Err(Error::Base(format!("failed to set tag {}", node_tag)).at(node));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
