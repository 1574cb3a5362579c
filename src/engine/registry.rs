//! Node Registry - Slot allocation for the tree arena.
//!
//! Manages the lifecycle of node slots:
//! - Free slot pool for O(1) reuse
//! - Recursive release of children on destroy
//! - Destroy and invalidation callbacks per node
//! - Lending a node's widget out for the duration of a callback

use std::collections::HashMap;

use tracing::{debug, warn};

use super::node::Node;
use crate::error::{Result, TreeError};
use crate::state::focus::FocusState;
use crate::types::{Allocation, NodeFlags, NodeId, PackInfo, Requisition};
use crate::widget::{RepaintHook, Widget};

type InvalidateCallback = Box<dyn FnMut(NodeId)>;
type DestroyCallback = Box<dyn FnOnce()>;

// =============================================================================
// Tree
// =============================================================================

/// Arena owning every node of one widget tree.
///
/// All mutation goes through `&mut Tree`, so the tree is confined to the
/// thread that drives the UI.
#[derive(Default)]
pub struct Tree {
    pub(crate) nodes: Vec<Option<Node>>,

    /// Pool of freed slots for reuse.
    free: Vec<usize>,

    invalidate_callbacks: HashMap<NodeId, Vec<InvalidateCallback>>,
    destroy_callbacks: HashMap<NodeId, Vec<DestroyCallback>>,

    pub(crate) repaint: Option<Box<dyn RepaintHook>>,
    pub(crate) focus: FocusState,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Slot allocation
    // =========================================================================

    /// Create a detached, fully dirty node owning `widget`.
    pub fn create(&mut self, widget: impl Widget + 'static) -> NodeId {
        self.create_boxed(Box::new(widget))
    }

    pub fn create_boxed(&mut self, widget: Box<dyn Widget>) -> NodeId {
        let node = Node::new(widget);
        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        let id = NodeId(index);
        debug!(node = %id, widget = %self.node(id).name, "created node");
        id
    }

    /// Destroy a detached node and, recursively, everything below it.
    ///
    /// A node must be removed from its parent first.
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        let node = self.try_node(id)?;
        if node.parent.is_some() {
            return Err(TreeError::StillAttached(id));
        }
        self.release(id);

        // When every node is gone, drop the slots so indices restart at zero.
        if self.nodes.iter().all(Option::is_none) {
            self.nodes.clear();
            self.free.clear();
        }
        Ok(())
    }

    fn release(&mut self, id: NodeId) {
        // Children first.
        let children = self.node(id).children.as_slice().to_vec();
        for child in children {
            self.node_mut(child).parent = None;
            self.release(child);
        }

        self.forget_focus(id);
        self.invalidate_callbacks.remove(&id);
        if let Some(callbacks) = self.destroy_callbacks.remove(&id) {
            for callback in callbacks {
                callback();
            }
        }

        debug!(node = %id, "destroyed node");
        self.nodes[id.0] = None;
        self.free.push(id.0);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(Some(_)))
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub(crate) fn try_node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(TreeError::UnknownNode(id))
    }

    pub(crate) fn try_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownNode(id))
    }

    /// Node lookup for ids already known to be live.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.0).and_then(Option::as_ref) {
            Some(node) => node,
            None => panic!("unknown node {id}"),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("unknown node {id}"),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.node(id).flags
    }

    /// Last cached requisition. Only meaningful while REQUISITION_INVALID is clear.
    pub fn requisition(&self, id: NodeId) -> Requisition {
        self.node(id).requisition
    }

    pub fn allocation(&self, id: NodeId) -> Allocation {
        self.node(id).allocation
    }

    pub fn pack(&self, id: NodeId) -> PackInfo {
        self.node(id).pack
    }

    /// Widget type name of the node.
    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    pub fn is_container(&self, id: NodeId) -> bool {
        self.node(id).children.is_container()
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.node(id).is_visible()
    }

    pub fn is_sensitive(&self, id: NodeId) -> bool {
        self.node(id).is_sensitive()
    }

    pub fn width_override(&self, id: NodeId) -> Option<f32> {
        self.node(id).width_override
    }

    pub fn height_override(&self, id: NodeId) -> Option<f32> {
        self.node(id).height_override
    }

    pub fn insertion_point(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).insertion_point
    }

    /// Child on the path to the most recently focused descendant.
    pub fn focus_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).focus_child
    }

    /// Concrete widget of a node, if it is a `W`.
    ///
    /// Returns `None` while the widget is lent out to one of its own callbacks.
    pub fn widget<W: Widget>(&self, id: NodeId) -> Option<&W> {
        let widget: &dyn Widget = self.node(id).widget.as_deref()?;
        widget.as_any().downcast_ref::<W>()
    }

    pub fn widget_mut<W: Widget>(&mut self, id: NodeId) -> Option<&mut W> {
        let widget: &mut dyn Widget = self.node_mut(id).widget.as_deref_mut()?;
        widget.as_any_mut().downcast_mut::<W>()
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Register a callback fired whenever `id` goes from partly valid to fully dirty.
    pub fn on_invalidate(&mut self, id: NodeId, callback: impl FnMut(NodeId) + 'static) {
        self.invalidate_callbacks
            .entry(id)
            .or_default()
            .push(Box::new(callback));
    }

    /// Register a callback fired when `id` is destroyed.
    pub fn on_destroy(&mut self, id: NodeId, callback: impl FnOnce() + 'static) {
        self.destroy_callbacks
            .entry(id)
            .or_default()
            .push(Box::new(callback));
    }

    pub(crate) fn emit_invalidated(&mut self, id: NodeId) {
        if let Some(callbacks) = self.invalidate_callbacks.get_mut(&id) {
            for callback in callbacks.iter_mut() {
                callback(id);
            }
        }
    }

    /// Install the root-level collaborator that receives expose regions.
    pub fn set_repaint_hook(&mut self, hook: impl RepaintHook + 'static) {
        self.repaint = Some(Box::new(hook));
    }

    pub fn clear_repaint_hook(&mut self) {
        self.repaint = None;
    }

    pub(crate) fn expose(&mut self, region: Allocation) {
        if let Some(hook) = self.repaint.as_mut() {
            hook.expose(region);
        }
    }

    // =========================================================================
    // Widget lending
    // =========================================================================

    /// Run `f` with the widget of `id` taken out of its slot, so the widget
    /// and the tree can both be borrowed mutably.
    ///
    /// Returns `None` when the widget is already lent out further up the
    /// stack.
    pub(crate) fn with_widget<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut dyn Widget, &mut Tree) -> R,
    ) -> Option<R> {
        let Some(mut widget) = self.node_mut(id).widget.take() else {
            warn!(node = %id, "widget re-entered from its own callback");
            return None;
        };

        let result = f(widget.as_mut(), self);

        // The node may have been destroyed by the callback.
        if let Some(Some(node)) = self.nodes.get_mut(id.0) {
            if node.widget.is_none() {
                node.widget = Some(widget);
            }
        }
        Some(result)
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.node_count())
            .field("free", &self.free.len())
            .field("focused", &self.focus.focused())
            .finish_non_exhaustive()
    }
}
