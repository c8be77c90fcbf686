#![forbid(unsafe_code)]

//! Minimal DOM surface used by the controller.
//!
//! The controller never looks nodes up by id. It receives the pre-existing
//! page nodes as handles and creates everything else through [`Dom`], which
//! keeps the state machine host-independent. [`MemoryDom`] is the arena
//! implementation used by tests and native hosts.

use std::fmt::Write as _;

/// Host DOM operations needed by the view controller.
pub trait Dom {
    /// Handle to one element.
    type Node: Clone + PartialEq + core::fmt::Debug;
    /// Host failure type.
    type Error: std::error::Error + 'static;

    /// Create a detached element with the given tag name.
    fn create_element(&mut self, tag: &str) -> Result<Self::Node, Self::Error>;

    /// Set the element's `id` attribute.
    fn set_id(&mut self, node: &Self::Node, id: &str) -> Result<(), Self::Error>;

    /// Replace the element's class list.
    fn set_class(&mut self, node: &Self::Node, class: &str) -> Result<(), Self::Error>;

    /// Replace the element's contents with a single text node.
    fn set_text(&mut self, node: &Self::Node, text: &str) -> Result<(), Self::Error>;

    /// Set one inline style property.
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str)
    -> Result<(), Self::Error>;

    /// Read one inline style property. `None` when unset.
    fn style(&self, node: &Self::Node, property: &str) -> Result<Option<String>, Self::Error>;

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;

    /// Detach the element from its parent. Detaching a detached node is a no-op.
    fn remove(&mut self, node: &Self::Node) -> Result<(), Self::Error>;

    /// Current value of an input element.
    fn input_value(&self, node: &Self::Node) -> Result<String, Self::Error>;

    /// Whether the element is reachable from the document root.
    fn is_attached(&self, node: &Self::Node) -> Result<bool, Self::Error>;
}

/// Index of an element inside a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// [`MemoryDom`] failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryDomError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("cannot append {child:?} into its own subtree at {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("node {0:?} is not an input element")]
    NotAnInput(NodeId),
    #[error("the document root cannot be removed")]
    RootRemoval,
}

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    id: Option<String>,
    class: String,
    text: String,
    value: String,
    styles: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Arena-backed DOM with a single `body` root.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<Element>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Create a document containing only the `body` root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Element {
                tag: "body".to_owned(),
                ..Element::default()
            }],
        }
    }

    /// The document root.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of elements ever created, including detached ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn get(&self, node: NodeId) -> Result<&Element, MemoryDomError> {
        self.nodes
            .get(node.index())
            .ok_or(MemoryDomError::UnknownNode(node))
    }

    fn get_mut(&mut self, node: NodeId) -> Result<&mut Element, MemoryDomError> {
        self.nodes
            .get_mut(node.index())
            .ok_or(MemoryDomError::UnknownNode(node))
    }

    /// Set the value of an `input` element, as a user typing would.
    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), MemoryDomError> {
        let element = self.get_mut(node)?;
        if element.tag != "input" {
            return Err(MemoryDomError::NotAnInput(node));
        }
        element.value = value.to_owned();
        Ok(())
    }

    /// Find an attached element by its `id` attribute (document order).
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            let element = &self.nodes[node.index()];
            if element.id.as_deref() == Some(id) {
                return Some(node);
            }
            stack.extend(element.children.iter().rev().copied());
        }
        None
    }

    /// Attached elements whose class list contains `class`, in document order.
    #[must_use]
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            let element = &self.nodes[node.index()];
            if element.class.split_whitespace().any(|c| c == class) {
                found.push(node);
            }
            stack.extend(element.children.iter().rev().copied());
        }
        found
    }

    /// Children of `node` in order. Empty for unknown nodes.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.index())
            .map_or(&[], |element| element.children.as_slice())
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index()).and_then(|element| element.parent)
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.index()).map(|element| element.tag.as_str())
    }

    #[must_use]
    pub fn class(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.index()).map(|element| element.class.as_str())
    }

    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.index()).map(|element| element.text.as_str())
    }

    /// Inline style lookup without going through the [`Dom`] trait.
    #[must_use]
    pub fn style_of(&self, node: NodeId, property: &str) -> Option<&str> {
        self.nodes.get(node.index()).and_then(|element| {
            element
                .styles
                .iter()
                .find(|(name, _)| name == property)
                .map(|(_, value)| value.as_str())
        })
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(current.index()).and_then(|e| e.parent);
        }
        false
    }

    fn detach(&mut self, node: NodeId) -> Result<(), MemoryDomError> {
        if let Some(parent) = self.get(node)?.parent {
            self.get_mut(parent)?.children.retain(|&child| child != node);
            self.get_mut(node)?.parent = None;
        }
        Ok(())
    }

    /// Serialize a subtree as HTML-like text for snapshots.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(element) = self.nodes.get(node.index()) else {
            return;
        };
        let _ = write!(out, "<{}", element.tag);
        if let Some(id) = &element.id {
            let _ = write!(out, " id=\"{id}\"");
        }
        if !element.class.is_empty() {
            let _ = write!(out, " class=\"{}\"", element.class);
        }
        if !element.styles.is_empty() {
            out.push_str(" style=\"");
            for (i, (name, value)) in element.styles.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{name}: {value};");
            }
            out.push('"');
        }
        out.push('>');
        out.push_str(&element.text);
        for &child in &element.children {
            self.write_html(child, out);
        }
        let _ = write!(out, "</{}>", element.tag);
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;
    type Error = MemoryDomError;

    fn create_element(&mut self, tag: &str) -> Result<NodeId, MemoryDomError> {
        let id = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        self.nodes.push(Element {
            tag: tag.to_owned(),
            ..Element::default()
        });
        Ok(NodeId(id))
    }

    fn set_id(&mut self, node: &NodeId, id: &str) -> Result<(), MemoryDomError> {
        self.get_mut(*node)?.id = Some(id.to_owned());
        Ok(())
    }

    fn set_class(&mut self, node: &NodeId, class: &str) -> Result<(), MemoryDomError> {
        self.get_mut(*node)?.class = class.to_owned();
        Ok(())
    }

    fn set_text(&mut self, node: &NodeId, text: &str) -> Result<(), MemoryDomError> {
        let children = std::mem::take(&mut self.get_mut(*node)?.children);
        for child in children {
            self.get_mut(child)?.parent = None;
        }
        self.get_mut(*node)?.text = text.to_owned();
        Ok(())
    }

    fn set_style(
        &mut self,
        node: &NodeId,
        property: &str,
        value: &str,
    ) -> Result<(), MemoryDomError> {
        let styles = &mut self.get_mut(*node)?.styles;
        match styles.iter_mut().find(|(name, _)| name == property) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => styles.push((property.to_owned(), value.to_owned())),
        }
        Ok(())
    }

    fn style(&self, node: &NodeId, property: &str) -> Result<Option<String>, MemoryDomError> {
        self.get(*node)?;
        Ok(self.style_of(*node, property).map(str::to_owned))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MemoryDomError> {
        self.get(*parent)?;
        self.get(*child)?;
        if self.contains(*child, *parent) {
            return Err(MemoryDomError::HierarchyRequest {
                parent: *parent,
                child: *child,
            });
        }
        self.detach(*child)?;
        self.get_mut(*parent)?.children.push(*child);
        self.get_mut(*child)?.parent = Some(*parent);
        Ok(())
    }

    fn remove(&mut self, node: &NodeId) -> Result<(), MemoryDomError> {
        if *node == self.root() {
            return Err(MemoryDomError::RootRemoval);
        }
        self.detach(*node)
    }

    fn input_value(&self, node: &NodeId) -> Result<String, MemoryDomError> {
        let element = self.get(*node)?;
        if element.tag != "input" {
            return Err(MemoryDomError::NotAnInput(*node));
        }
        Ok(element.value.clone())
    }

    fn is_attached(&self, node: &NodeId) -> Result<bool, MemoryDomError> {
        self.get(*node)?;
        Ok(self.contains(self.root(), *node))
    }
}
