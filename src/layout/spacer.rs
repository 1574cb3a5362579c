//! Spacer - leaf with a fixed natural size.

use crate::engine::Tree;
use crate::error::Result;
use crate::types::{Allocation, NodeId, Requisition};
use crate::widget::{Allocatable, Focusable, Measurable, Widget};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spacer {
    size: Requisition,
    focusable: bool,
}

impl Spacer {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Requisition { width, height },
            focusable: false,
        }
    }

    /// Let the spacer take keyboard focus.
    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    /// Change the natural size. The caller invalidates the node.
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.size = Requisition { width, height };
    }

    pub fn size(&self) -> Requisition {
        self.size
    }
}

impl Measurable for Spacer {
    fn measure(&mut self, _tree: &mut Tree, _id: NodeId) -> Requisition {
        self.size
    }
}

impl Allocatable for Spacer {
    fn allocate(&mut self, _tree: &mut Tree, _id: NodeId, _area: Allocation) -> Result<()> {
        Ok(())
    }
}

impl Focusable for Spacer {
    fn can_focus(&self) -> bool {
        self.focusable
    }
}

impl Widget for Spacer {
    fn name(&self) -> &str {
        "spacer"
    }

    fn as_focusable(&self) -> Option<&dyn Focusable> {
        Some(self)
    }
}
