//! Overlap - multi-child container stacking every child over the same box.

use super::{pixels, place_child, visible_children};
use crate::engine::Tree;
use crate::error::Result;
use crate::types::{Allocation, NodeId, Requisition};
use crate::widget::{Allocatable, Composition, Measurable, Widget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overlap;

impl Overlap {
    pub fn new() -> Self {
        Self
    }
}

impl Measurable for Overlap {
    fn measure(&mut self, tree: &mut Tree, id: NodeId) -> Requisition {
        let mut requisition = Requisition::ZERO;
        for child in visible_children(tree, id) {
            let inner = tree.size_request(child);
            let pack = tree.pack(child);
            requisition.width = requisition
                .width
                .max(pixels(inner.width) as f32 + pack.hspacing() as f32);
            requisition.height = requisition
                .height
                .max(pixels(inner.height) as f32 + pack.vspacing() as f32);
        }
        tree.update_spread_container(id);
        requisition
    }
}

impl Allocatable for Overlap {
    fn allocate(&mut self, tree: &mut Tree, id: NodeId, area: Allocation) -> Result<()> {
        for child in visible_children(tree, id) {
            place_child(tree, child, area, &area)?;
        }
        Ok(())
    }
}

impl Widget for Overlap {
    fn name(&self) -> &str {
        "overlap"
    }

    fn composition(&self) -> Composition {
        Composition::Multi
    }
}
