//! Layout Module - Container and leaf widgets.
//!
//! Every widget here plugs into the sizing protocol of [`Tree`]:
//!
//! 1. `measure` asks each visible child for its requisition and combines them
//! 2. `allocate` partitions the granted box and hands each visible child a slot
//!
//! Children are positioned inside their slot by their [`PackInfo`]: spacing
//! is taken off first, then scale decides the extent and alignment the offset.
//!
//! # Widgets
//!
//! - [`Table`] - grid with row/column spans, expand and shrink
//! - [`Bin`] - one child inside a padded box
//! - [`Overlap`] - children stacked over the same box
//! - [`Spacer`] - leaf of fixed natural size
//!
//! [`PackInfo`]: crate::PackInfo

mod bin;
mod overlap;
mod spacer;
mod table;

pub use bin::Bin;
pub use overlap::Overlap;
pub use spacer::Spacer;
pub use table::{RowCol, Table};

use crate::engine::Tree;
use crate::error::Result;
use crate::types::{Allocation, NodeId, place_in_slot};

/// Whole pixels covering a requisition extent.
pub(crate) fn pixels(extent: f32) -> i32 {
    extent.max(0.0).ceil() as i32
}

/// Position `child` inside `slot` according to its pack info, clip the result
/// to `clip` and allocate it.
pub(crate) fn place_child(
    tree: &mut Tree,
    child: NodeId,
    slot: Allocation,
    clip: &Allocation,
) -> Result<()> {
    let pack = tree.pack(child);
    let requisition = tree.requisition(child);

    let (x, width) = place_in_slot(
        slot.x,
        slot.width,
        pixels(requisition.width),
        pack.left_spacing,
        pack.right_spacing,
        pack.halign,
        pack.hscale,
    );
    let (y, height) = place_in_slot(
        slot.y,
        slot.height,
        pixels(requisition.height),
        pack.top_spacing,
        pack.bottom_spacing,
        pack.valign,
        pack.vscale,
    );

    let area = Allocation::new(x, y, width, height).intersect(clip);
    tree.set_allocation(child, area)
}

/// Visible children of `id`, in traversal order.
pub(crate) fn visible_children(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    tree.local_children(id)
        .filter(|child| tree.is_visible(*child))
        .collect()
}
