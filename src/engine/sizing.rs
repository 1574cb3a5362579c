//! Invalidation and the two-phase sizing protocol.
//!
//! A node carries three dirty bits:
//! - REQUISITION_INVALID: the cached natural size must be recomputed
//! - ALLOCATION_INVALID: the node has not been given its box since it changed
//! - CONTENT_INVALID: the node must be repainted at its next allocation
//!
//! Dirtiness propagates upward and stops at the first ancestor that already
//! carries the requested bits, so repeated invalidation is cheap.

use tracing::{debug, trace};

use super::Tree;
use crate::error::{Result, TreeError};
use crate::types::{Allocation, Area, NodeFlags, NodeId, Requisition};

fn sanitize(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.max(0.0) }
}

impl Tree {
    /// Mark size and content of `id` dirty and propagate to the ancestors.
    pub fn invalidate(&mut self, id: NodeId) {
        self.mark_dirty(id, NodeFlags::ALL_INVALID);
    }

    /// Mark the size of `id` dirty, leaving content validity untouched.
    pub fn invalidate_size(&mut self, id: NodeId) {
        self.mark_dirty(id, NodeFlags::SIZE_INVALID);
    }

    /// Request a repaint of `id` without resizing anything.
    pub fn invalidate_content(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.flags.insert(NodeFlags::CONTENT_INVALID);
        if node.flags.contains(NodeFlags::POSITIVE_ALLOCATION) {
            let region = node.allocation;
            self.expose(region);
        }
    }

    fn mark_dirty(&mut self, id: NodeId, bits: NodeFlags) {
        let node = self.node_mut(id);
        if node.flags.contains(bits) {
            return;
        }
        node.flags.insert(bits);
        let parent = node.parent;
        trace!(node = %id, ?bits, "invalidated");

        self.emit_invalidated(id);
        if let Some(parent) = parent {
            self.invalidate_size(parent);
        }
    }

    /// Natural size of `id`, measured at most once per invalidation.
    ///
    /// Width/height overrides replace the measured value when set. Negative
    /// and NaN measurements are clamped to zero.
    pub fn size_request(&mut self, id: NodeId) -> Requisition {
        let node = self.node_mut(id);
        if !node.flags.contains(NodeFlags::REQUISITION_INVALID) {
            return node.requisition;
        }
        // Cleared up front so the measure callback may invalidate again.
        node.flags.remove(NodeFlags::REQUISITION_INVALID);

        let measured = self
            .with_widget(id, |widget, tree| widget.measure(tree, id))
            .unwrap_or(Requisition::ZERO);

        let node = self.node_mut(id);
        let mut requisition = Requisition {
            width: sanitize(measured.width),
            height: sanitize(measured.height),
        };
        if let Some(width) = node.width_override.filter(|w| *w >= 0.0) {
            requisition.width = width;
        }
        if let Some(height) = node.height_override.filter(|h| *h >= 0.0) {
            requisition.height = height;
        }
        node.requisition = requisition;
        trace!(node = %id, width = requisition.width, height = requisition.height, "measured");
        requisition
    }

    /// Grant `id` the rectangle `area`, rounded to whole pixels.
    ///
    /// The node's requisition must have been computed since its last
    /// invalidation.
    pub fn set_allocation(&mut self, id: NodeId, area: impl Into<Area>) -> Result<()> {
        let node = self.try_node(id)?;
        if node.flags.contains(NodeFlags::REQUISITION_INVALID) {
            return Err(TreeError::AllocateBeforeSizing(id));
        }

        let allocation = Allocation::from_area(area.into());
        let node = self.node_mut(id);
        let old = node.allocation;
        let was_positive = node.flags.contains(NodeFlags::POSITIVE_ALLOCATION);
        node.flags
            .remove(NodeFlags::ALLOCATION_INVALID | NodeFlags::POSITIVE_ALLOCATION);
        node.allocation = allocation;

        let allocated = self
            .with_widget(id, |widget, tree| widget.allocate(tree, id, allocation))
            .unwrap_or(Ok(()));

        let node = self.node_mut(id);
        let positive = allocation.is_positive();
        node.flags.set(NodeFlags::POSITIVE_ALLOCATION, positive);

        if old != allocation || node.flags.contains(NodeFlags::CONTENT_INVALID) {
            node.flags.remove(NodeFlags::CONTENT_INVALID);
            if old != allocation {
                debug!(node = %id, ?old, new = ?allocation, "allocation changed");
            }
            if was_positive {
                self.expose(old);
            }
            if positive && old != allocation {
                self.expose(allocation);
            }
        }
        allocated
    }

    /// Size `root`, then allocate it `area`.
    pub fn layout(&mut self, root: NodeId, area: impl Into<Area>) -> Result<Requisition> {
        self.try_node(root)?;
        let requisition = self.size_request(root);
        self.set_allocation(root, area)?;
        Ok(requisition)
    }
}
