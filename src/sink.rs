//! Annotation sink for decoded structure.
//!
//! The decoder reports every logical field and record it recognizes
//! through a [`StructureSink`]: a name, the absolute byte range the bytes
//! came from, a decoded value, and a display string. The sink is purely
//! observational — nothing the decoder does depends on a return value, so
//! a presentation layer can paint ranges or build a tree without being
//! able to derail the decode.

use std::ops::Range;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// An unsigned integer (fixed-width or variable-length).
    Unsigned(u64),
    /// Raw bytes, e.g. a coder id.
    Bytes(Vec<u8>),
    /// Decoded text, e.g. a file name.
    Text(String),
    /// A marker with no value of its own, e.g. a property tag.
    None,
}

/// Receives structure annotations during a decode pass.
///
/// All methods default to no-ops so implementations only override what
/// they care about. Byte ranges are absolute file offsets.
pub trait StructureSink {
    /// Opens a nested record (e.g. `PackInfo`) starting at `start`.
    fn begin_node(&mut self, _name: &str, _start: u64) {}

    /// Closes the most recently opened record, ending at `end`.
    fn end_node(&mut self, _end: u64) {}

    /// Registers one decoded field.
    fn field(&mut self, _name: &str, _range: Range<u64>, _value: FieldValue, _display: &str) {}
}

/// A sink that discards all annotations.
#[derive(Debug, Default)]
pub struct NullSink;

impl StructureSink for NullSink {}

/// One node of the collected annotation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Field or record name.
    pub name: String,
    /// Absolute byte range this node covers.
    pub range: Range<u64>,
    /// Decoded value; `FieldValue::None` for records.
    pub value: FieldValue,
    /// Human-readable rendering.
    pub display: String,
    /// Nested fields and records.
    pub children: Vec<Node>,
}

/// A sink that collects annotations into a tree of [`Node`]s.
#[derive(Debug, Default)]
pub struct TreeSink {
    roots: Vec<Node>,
    stack: Vec<Node>,
}

impl TreeSink {
    /// Creates an empty tree sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected top-level nodes.
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Consumes the sink, returning the collected tree.
    ///
    /// Nodes left open by an aborted decode are attached as-is.
    pub fn into_roots(mut self) -> Vec<Node> {
        while let Some(node) = self.stack.pop() {
            self.attach(node);
        }
        self.roots
    }

    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }
}

impl StructureSink for TreeSink {
    fn begin_node(&mut self, name: &str, start: u64) {
        self.stack.push(Node {
            name: name.to_string(),
            range: start..start,
            value: FieldValue::None,
            display: String::new(),
            children: Vec::new(),
        });
    }

    fn end_node(&mut self, end: u64) {
        if let Some(mut node) = self.stack.pop() {
            node.range.end = end.max(node.range.start);
            self.attach(node);
        }
    }

    fn field(&mut self, name: &str, range: Range<u64>, value: FieldValue, display: &str) {
        let leaf = Node {
            name: name.to_string(),
            range,
            value,
            display: display.to_string(),
            children: Vec::new(),
        };
        self.attach(leaf);
    }
}
