//! Widget capabilities.
//!
//! Concrete widgets plug into the tree through a small closed set of traits:
//!
//! - [`Measurable`] reports a natural size (the requisition)
//! - [`Allocatable`] receives the pixel rectangle granted by the parent
//! - [`Focusable`] opts a widget into keyboard focus
//!
//! [`Widget`] bundles them with the structural facts the tree needs. The
//! tree owns one boxed widget per node and lends it out, together with
//! `&mut Tree`, for the duration of each callback.

use std::any::Any;

use crate::engine::Tree;
use crate::error::Result;
use crate::types::{Allocation, NodeId, Requisition};

/// How many children a node can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composition {
    /// No children.
    #[default]
    Leaf,
    /// Zero or one child.
    Single,
    /// Ordered list of children; order is traversal order.
    Multi,
}

/// Structural change reported to a container after `add`/`remove`/`set_pack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repack {
    Added,
    Removed,
    Changed,
}

pub trait Measurable {
    /// Natural size of the node `id`, ignoring any constraint.
    ///
    /// Containers call `tree.size_request()` on their children from here.
    /// Negative results are clamped to zero by the caller.
    fn measure(&mut self, tree: &mut Tree, id: NodeId) -> Requisition;
}

pub trait Allocatable {
    /// Accept the rectangle granted to node `id`.
    ///
    /// Leaves usually do nothing; containers partition `area` and call
    /// `tree.set_allocation()` on each visible child.
    fn allocate(&mut self, tree: &mut Tree, id: NodeId, area: Allocation) -> Result<()>;
}

pub trait Focusable {
    fn can_focus(&self) -> bool;
}

/// Type-erased access to the concrete widget behind a `dyn Widget`.
///
/// Implemented for every `'static` type, so widgets never write it by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub trait Widget: Measurable + Allocatable + AsAny {
    /// Short type name used in logs.
    fn name(&self) -> &str;

    fn composition(&self) -> Composition {
        Composition::Leaf
    }

    fn as_focusable(&self) -> Option<&dyn Focusable> {
        None
    }

    /// Called on a container once a child was attached, detached, or had its
    /// packing changed.
    fn repack(&mut self, _tree: &mut Tree, _id: NodeId, _child: NodeId, _change: Repack) {}
}

// =============================================================================
// Repaint hook
// =============================================================================

/// Root-level collaborator that receives regions needing a repaint.
///
/// `set_allocation` reports the old and the new rectangle of a node whenever
/// its box moved or its content was invalidated.
pub trait RepaintHook {
    fn expose(&mut self, region: Allocation);
}

impl<F: FnMut(Allocation)> RepaintHook for F {
    fn expose(&mut self, region: Allocation) {
        self(region)
    }
}
