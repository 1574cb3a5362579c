//! Bin - single-child container with uniform padding.
//!
//! The requisition is the child's requisition plus its pack spacing plus the
//! padding on every side. The child is placed inside the padded box using
//! its pack alignment and scale.

use super::{pixels, place_child};
use crate::engine::Tree;
use crate::error::Result;
use crate::types::{Allocation, NodeId, Requisition};
use crate::widget::{Allocatable, Composition, Measurable, Widget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bin {
    padding: u32,
}

impl Bin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn set_padding(&mut self, padding: u32) {
        self.padding = padding;
    }

    fn visible_child(tree: &Tree, id: NodeId) -> Option<NodeId> {
        tree.get_child(id).ok().filter(|child| tree.is_visible(*child))
    }
}

impl Measurable for Bin {
    fn measure(&mut self, tree: &mut Tree, id: NodeId) -> Requisition {
        let border = 2.0 * self.padding as f32;
        let mut requisition = Requisition {
            width: border,
            height: border,
        };

        if let Some(child) = Self::visible_child(tree, id) {
            let inner = tree.size_request(child);
            let pack = tree.pack(child);
            requisition.width += pixels(inner.width) as f32 + pack.hspacing() as f32;
            requisition.height += pixels(inner.height) as f32 + pack.vspacing() as f32;
        }
        tree.update_spread_container(id);
        requisition
    }
}

impl Allocatable for Bin {
    fn allocate(&mut self, tree: &mut Tree, id: NodeId, area: Allocation) -> Result<()> {
        let Some(child) = Self::visible_child(tree, id) else {
            return Ok(());
        };
        let pad = self.padding.min(i32::MAX as u32) as i32;
        let border = pad.saturating_mul(2);
        let inner = Allocation::new(
            area.x.saturating_add(pad),
            area.y.saturating_add(pad),
            area.width.saturating_sub(border).max(0),
            area.height.saturating_sub(border).max(0),
        );
        place_child(tree, child, inner, &area)
    }
}

impl Widget for Bin {
    fn name(&self) -> &str {
        "bin"
    }

    fn composition(&self) -> Composition {
        Composition::Single
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Spacer;
    use crate::types::{ALLOCATION_LIMIT, Area, PackInfo};

    #[test]
    fn test_bin_pads_child() {
        let mut tree = Tree::new();
        let bin = tree.create(Bin::new().padding(2));
        let leaf = tree.create(Spacer::new(6.0, 3.0));
        tree.add(bin, leaf).unwrap();

        let req = tree.layout(bin, Area::new(0.0, 0.0, 20.0, 10.0)).unwrap();
        assert_eq!(req, Requisition { width: 10.0, height: 7.0 });
        assert_eq!(tree.allocation(leaf), Allocation::new(2, 2, 16, 6));
    }

    #[test]
    fn test_bin_centers_unscaled_child() {
        let mut tree = Tree::new();
        let bin = tree.create(Bin::new());
        let leaf = tree.create(Spacer::new(4.0, 2.0));
        tree.add(bin, leaf).unwrap();
        tree.set_pack(leaf, PackInfo::default().scale(0.0, 0.0));

        tree.layout(bin, Area::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(tree.allocation(leaf), Allocation::new(3, 4, 4, 2));
    }

    #[test]
    fn test_hidden_child_is_skipped() {
        let mut tree = Tree::new();
        let bin = tree.create(Bin::new().padding(1));
        let leaf = tree.create(Spacer::new(4.0, 2.0));
        tree.add(bin, leaf).unwrap();
        tree.set_visible(leaf, false);

        let req = tree.layout(bin, Area::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(req, Requisition { width: 2.0, height: 2.0 });
    }

    #[test]
    fn test_huge_area_and_padding_are_clamped() {
        let mut tree = Tree::new();
        let bin = tree.create(Bin::new());
        let leaf = tree.create(Spacer::new(4.0, 2.0));
        tree.add(bin, leaf).unwrap();

        tree.layout(bin, Area::new(1e20, 0.0, 1e20, 1.0)).unwrap();
        let a = tree.allocation(leaf);
        assert_eq!(a.x, ALLOCATION_LIMIT);
        assert_eq!(a.width, ALLOCATION_LIMIT);

        tree.widget_mut::<Bin>(bin).unwrap().set_padding(u32::MAX);
        tree.invalidate(bin);
        tree.layout(bin, Area::new(0.0, 0.0, 1e20, 1e20)).unwrap();
        assert_eq!(tree.allocation(leaf).width, 0);
    }
}
