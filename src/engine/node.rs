//! Node record - one slot of the tree arena.
//!
//! A node owns its widget, its cached geometry and its child list. The parent
//! is a plain back-reference; the parent's child list is the only ownership
//! record.

use crate::types::{Allocation, NodeFlags, NodeId, PackInfo, Requisition};
use crate::widget::{Composition, Widget};

use super::crosslink::CrossLinks;

/// Child storage, fixed by the widget's [`Composition`] at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Children {
    Leaf,
    Single(Option<NodeId>),
    Multi(Vec<NodeId>),
}

impl Children {
    pub(crate) fn for_composition(composition: Composition) -> Self {
        match composition {
            Composition::Leaf => Children::Leaf,
            Composition::Single => Children::Single(None),
            Composition::Multi => Children::Multi(Vec::new()),
        }
    }

    pub(crate) fn as_slice(&self) -> &[NodeId] {
        match self {
            Children::Leaf => &[],
            Children::Single(child) => child.as_slice(),
            Children::Multi(list) => list,
        }
    }

    pub(crate) fn is_container(&self) -> bool {
        !matches!(self, Children::Leaf)
    }
}

pub(crate) struct Node {
    pub(crate) flags: NodeFlags,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Children,

    pub(crate) requisition: Requisition,
    pub(crate) allocation: Allocation,
    pub(crate) pack: PackInfo,
    pub(crate) width_override: Option<f32>,
    pub(crate) height_override: Option<f32>,

    /// Lent out while one of its callbacks runs.
    pub(crate) widget: Option<Box<dyn Widget>>,
    pub(crate) name: String,

    pub(crate) crosslinks: CrossLinks,
    /// Child on the path to the most recently focused descendant.
    pub(crate) focus_child: Option<NodeId>,
    /// Descendant that receives children added to this container.
    pub(crate) insertion_point: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(widget: Box<dyn Widget>) -> Self {
        let name = widget.name().to_string();
        Self {
            flags: NodeFlags::INITIAL,
            parent: None,
            children: Children::for_composition(widget.composition()),
            requisition: Requisition::ZERO,
            allocation: Allocation::default(),
            pack: PackInfo::default(),
            width_override: None,
            height_override: None,
            widget: Some(widget),
            name,
            crosslinks: CrossLinks::default(),
            focus_child: None,
            insertion_point: None,
        }
    }

    #[inline]
    pub(crate) fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE) && !self.flags.contains(NodeFlags::HIDDEN_CHILD)
    }

    #[inline]
    pub(crate) fn is_sensitive(&self) -> bool {
        self.flags
            .contains(NodeFlags::SENSITIVE | NodeFlags::PARENT_SENSITIVE)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("requisition", &self.requisition)
            .field("allocation", &self.allocation)
            .finish_non_exhaustive()
    }
}
