//! Focus System - Focus state and spatial navigation
//!
//! Manages focus state and navigation:
//! - The focused node, owned by the tree
//! - Focus callbacks (on_focus/on_blur)
//! - The focus chain: every container remembers the child leading to its most
//!   recently focused descendant
//! - `move_focus`: sequential (Next/Prev) and directional (arrow) search over
//!   the allocated rectangles of a container's children
//!
//! # Example
//!
//! ```ignore
//! use spark_layout::{FocusCallbacks, FocusDirection, Tree};
//!
//! tree.register_focus_callbacks(button, FocusCallbacks {
//!     on_focus: Some(Box::new(|| println!("Focused!"))),
//!     on_blur: Some(Box::new(|| println!("Blurred!"))),
//! });
//!
//! // Tab
//! tree.move_focus(root, FocusDirection::Next);
//! // Arrow right
//! tree.move_focus(root, FocusDirection::Right);
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;

use taffy::Point;
use tracing::debug;

use crate::engine::Tree;
use crate::error::{Result, TreeError};
use crate::types::{Allocation, NodeFlags, NodeId};

// =============================================================================
// FOCUS DIRECTION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusDirection {
    Next,
    Prev,
    Up,
    Down,
    Left,
    Right,
}

impl FocusDirection {
    pub fn is_sequential(self) -> bool {
        matches!(self, FocusDirection::Next | FocusDirection::Prev)
    }
}

// =============================================================================
// FOCUS CALLBACKS
// =============================================================================

/// Callbacks fired when focus changes
#[derive(Default)]
pub struct FocusCallbacks {
    pub on_focus: Option<Box<dyn Fn()>>,
    pub on_blur: Option<Box<dyn Fn()>>,
}

/// Focus bookkeeping of one tree.
#[derive(Default)]
pub struct FocusState {
    focused: Option<NodeId>,
    // Multiple callbacks per node supported
    callbacks: HashMap<NodeId, Vec<FocusCallbacks>>,
}

impl FocusState {
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    fn fire(&self, id: NodeId, focus: bool) {
        let Some(callbacks) = self.callbacks.get(&id) else {
            return;
        };
        for cb in callbacks {
            let callback = if focus { &cb.on_focus } else { &cb.on_blur };
            if let Some(callback) = callback {
                callback();
            }
        }
    }
}

impl Tree {
    /// The focused node, if any.
    pub fn focused(&self) -> Option<NodeId> {
        self.focus.focused()
    }

    pub fn has_focus(&self) -> bool {
        self.focus.focused().is_some()
    }

    pub fn is_focused(&self, id: NodeId) -> bool {
        self.focus.focused() == Some(id)
    }

    /// Register focus callbacks for a node. Returns a handle for
    /// [`unregister_focus_callbacks`](Tree::unregister_focus_callbacks).
    pub fn register_focus_callbacks(&mut self, id: NodeId, callbacks: FocusCallbacks) -> usize {
        let list = self.focus.callbacks.entry(id).or_default();
        list.push(callbacks);
        list.len() - 1
    }

    pub fn unregister_focus_callbacks(&mut self, id: NodeId, handle: usize) {
        let Some(list) = self.focus.callbacks.get_mut(&id) else {
            return;
        };
        // Mark as removed so other handles stay valid
        if let Some(cb) = list.get_mut(handle) {
            cb.on_focus = None;
            cb.on_blur = None;
        }
        if list.iter().all(|cb| cb.on_focus.is_none() && cb.on_blur.is_none()) {
            self.focus.callbacks.remove(&id);
        }
    }

    // =========================================================================
    // FOCUS STATE
    // =========================================================================

    /// Whether `id` would accept focus right now: its widget is focusable and
    /// the node is sensitive and shown along with all of its ancestors.
    pub fn can_focus(&self, id: NodeId) -> bool {
        let Ok(node) = self.try_node(id) else {
            return false;
        };
        let focusable = node
            .widget
            .as_deref()
            .and_then(|w| w.as_focusable())
            .is_some_and(|f| f.can_focus());
        focusable && node.is_sensitive() && self.is_drawable(id)
    }

    /// True if `id` and every ancestor are visible.
    pub fn is_drawable(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            let node = self.node(node);
            if !node.is_visible() {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Focus `id`.
    pub fn grab_focus(&mut self, id: NodeId) -> Result<()> {
        self.try_node(id)?;
        if !self.can_focus(id) {
            return Err(TreeError::NotFocusable(id));
        }
        self.set_focus_with_callbacks(Some(id));
        Ok(())
    }

    /// Clear focus. Containers keep their focus child, so the next sequential
    /// move resumes where focus was.
    pub fn blur(&mut self) {
        self.set_focus_with_callbacks(None);
    }

    /// Drop all focus state of a node that is being destroyed.
    pub(crate) fn forget_focus(&mut self, id: NodeId) {
        if self.focus.focused == Some(id) {
            self.blur();
        }
        self.focus.callbacks.remove(&id);
    }

    /// Set focus and fire callbacks at the source
    fn set_focus_with_callbacks(&mut self, new: Option<NodeId>) {
        let old = self.focus.focused;

        // No change, no callbacks
        if old == new {
            return;
        }

        if let Some(old) = old {
            self.focus.fire(old, false);
            let mut current = Some(old);
            while let Some(id) = current {
                let Ok(node) = self.try_node_mut(id) else {
                    break;
                };
                node.flags.remove(NodeFlags::FOCUS_CHAIN);
                current = node.parent;
            }
        }

        self.focus.focused = new;
        debug!(?old, ?new, "focus changed");

        if let Some(new) = new {
            let mut child = new;
            self.node_mut(new).flags.insert(NodeFlags::FOCUS_CHAIN);
            while let Some(parent) = self.node(child).parent {
                let node = self.node_mut(parent);
                node.flags.insert(NodeFlags::FOCUS_CHAIN);
                node.focus_child = Some(child);
                child = parent;
            }
            self.focus.fire(new, true);
        }
    }

    // =========================================================================
    // FOCUS NAVIGATION
    // =========================================================================

    /// Move focus from within `id` in `direction`.
    ///
    /// A focusable, unfocused node takes focus itself. A container first
    /// offers the move to its focus child, then to its other children in
    /// visiting order. Returns false and leaves focus alone when nothing
    /// accepts.
    pub fn move_focus(&mut self, id: NodeId, direction: FocusDirection) -> bool {
        let Ok(node) = self.try_node(id) else {
            return false;
        };
        if !node.is_visible() || !node.is_sensitive() {
            return false;
        }
        if !self.is_focused(id) && self.can_focus(id) {
            return self.grab_focus(id).is_ok();
        }
        if !node.children.is_container() {
            return false;
        }

        let last = node.focus_child;
        if let Some(last) = last {
            if self.move_focus(last, direction) {
                return true;
            }
        }

        let children: Vec<NodeId> = self
            .local_children(id)
            .filter(|child| self.is_visible(*child))
            .collect();
        let candidates = if direction.is_sequential() {
            let mut order = self.sequential_order(children, direction);
            if let Some(pos) = last.and_then(|last| order.iter().position(|c| *c == last)) {
                order.drain(..=pos);
            }
            order
        } else {
            self.spatial_order(id, children, direction)
        };

        candidates
            .into_iter()
            .any(|child| self.move_focus(child, direction))
    }

    /// Move focus, wrapping around at the end of a sequential cycle.
    ///
    /// When `move_focus` runs out of candidates for Next/Prev, focus is
    /// cleared together with the focus chain below `root` and the search
    /// restarts from the first (or last) child.
    pub fn cycle_focus(&mut self, root: NodeId, direction: FocusDirection) -> bool {
        if self.move_focus(root, direction) {
            return true;
        }
        if !direction.is_sequential() || !self.contains(root) {
            return false;
        }

        let previous = self.focused();
        self.blur();
        let mut current = Some(root);
        while let Some(id) = current {
            current = self.node_mut(id).focus_child.take();
        }

        if self.move_focus(root, direction) {
            return true;
        }
        if let Some(previous) = previous {
            if let Err(err) = self.grab_focus(previous) {
                debug!(node = %previous, %err, "previous focus not restored");
            }
        }
        false
    }

    /// Children in reading order: top-to-bottom bands, left-to-right inside a
    /// band. Prev walks the same order backwards.
    fn sequential_order(&self, mut children: Vec<NodeId>, direction: FocusDirection) -> Vec<NodeId> {
        // Insertion sort: stable, and tolerant of overlapping rectangles that
        // do not order transitively.
        for i in 1..children.len() {
            let mut j = i;
            while j > 0
                && band_less(
                    &self.allocation(children[j]),
                    &self.allocation(children[j - 1]),
                )
            {
                children.swap(j, j - 1);
                j -= 1;
            }
        }
        if direction == FocusDirection::Prev {
            children.reverse();
        }
        children
    }

    /// Children lying in `direction` from the reference point, nearest first.
    fn spatial_order(
        &self,
        container: NodeId,
        children: Vec<NodeId>,
        direction: FocusDirection,
    ) -> Vec<NodeId> {
        let anchor = self.focus_anchor(container, direction);

        let mut scored: Vec<(NodeId, f32, f32, f32)> = children
            .into_iter()
            .filter_map(|child| {
                let area = self.allocation(child);
                let projection = projection(&area, anchor, direction);
                if projection < 0.0 {
                    return None;
                }
                let center = area.center();
                let dx = center.x - anchor.x;
                let dy = center.y - anchor.y;
                Some((child, projection, area.distance_to(anchor), (dx * dx + dy * dy).sqrt()))
            })
            .collect();

        scored.sort_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then_with(|| a.2.total_cmp(&b.2))
                .then_with(|| a.3.total_cmp(&b.3))
        });
        scored.into_iter().map(|(child, ..)| child).collect()
    }

    /// Center of the focused node, or the container corner the movement
    /// starts from when nothing is focused.
    fn focus_anchor(&self, container: NodeId, direction: FocusDirection) -> Point<f32> {
        if let Some(focused) = self.focused().filter(|f| self.contains(*f)) {
            return self.allocation(focused).center();
        }
        let area = self.allocation(container);
        match direction {
            FocusDirection::Left | FocusDirection::Up => Point {
                x: area.right() as f32,
                y: area.bottom() as f32,
            },
            _ => Point {
                x: area.x as f32,
                y: area.y as f32,
            },
        }
    }
}

/// Reading-order comparison of two rectangles.
fn band_less(a: &Allocation, b: &Allocation) -> bool {
    if a.bottom() <= b.y {
        return true;
    }
    if a.y >= b.bottom() {
        return false;
    }
    if a.x != b.x {
        return a.x < b.x;
    }
    let (ca, cb) = (a.center(), b.center());
    match ca.y.total_cmp(&cb.y) {
        Ordering::Equal => ca.x < cb.x,
        ordering => ordering == Ordering::Less,
    }
}

/// Signed distance of `area` from `anchor` along `direction`.
fn projection(area: &Allocation, anchor: Point<f32>, direction: FocusDirection) -> f32 {
    match direction {
        FocusDirection::Right => area.x as f32 - anchor.x,
        FocusDirection::Left => anchor.x - area.right() as f32,
        FocusDirection::Down => area.y as f32 - anchor.y,
        FocusDirection::Up => anchor.y - area.bottom() as f32,
        FocusDirection::Next | FocusDirection::Prev => 0.0,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::layout::{Overlap, Spacer, Table};
    use crate::types::{Area, PackInfo};

    /// A root table with one row of focusable spacers.
    fn row(tree: &mut Tree, n: u32) -> (NodeId, Vec<NodeId>) {
        let root = tree.create(Table::new());
        let items: Vec<NodeId> = (0..n)
            .map(|col| {
                let id = tree.create(Spacer::new(10.0, 1.0).focusable(true));
                tree.add(root, id).unwrap();
                tree.set_pack(id, PackInfo::cell(col, 0));
                id
            })
            .collect();
        tree.layout(root, Area::new(0.0, 0.0, 10.0 * n as f64, 1.0)).unwrap();
        (root, items)
    }

    #[test]
    fn test_grab_focus_and_callbacks() {
        let mut tree = Tree::new();
        let (root, items) = row(&mut tree, 2);

        let log = Rc::new(RefCell::new(Vec::new()));
        for (i, id) in items.iter().enumerate() {
            let focus_log = log.clone();
            let blur_log = log.clone();
            tree.register_focus_callbacks(*id, FocusCallbacks {
                on_focus: Some(Box::new(move || focus_log.borrow_mut().push(format!("focus {i}")))),
                on_blur: Some(Box::new(move || blur_log.borrow_mut().push(format!("blur {i}")))),
            });
        }

        tree.grab_focus(items[0]).unwrap();
        tree.grab_focus(items[1]).unwrap();
        assert_eq!(*log.borrow(), vec!["focus 0", "blur 0", "focus 1"]);
        assert!(tree.flags(root).contains(NodeFlags::FOCUS_CHAIN));
        assert!(!tree.flags(items[0]).contains(NodeFlags::FOCUS_CHAIN));
        assert_eq!(tree.focus_child(root), Some(items[1]));

        assert_eq!(tree.grab_focus(root), Err(TreeError::NotFocusable(root)));
    }

    #[test]
    fn test_insensitive_cannot_focus() {
        let mut tree = Tree::new();
        let (root, items) = row(&mut tree, 1);
        tree.set_sensitive(root, false);
        assert!(!tree.can_focus(items[0]));
        assert!(!tree.move_focus(root, FocusDirection::Next));
    }

    #[test]
    fn test_next_and_prev() {
        let mut tree = Tree::new();
        let (root, items) = row(&mut tree, 3);

        assert!(tree.move_focus(root, FocusDirection::Next));
        assert_eq!(tree.focused(), Some(items[0]));
        assert!(tree.move_focus(root, FocusDirection::Next));
        assert_eq!(tree.focused(), Some(items[1]));
        assert!(tree.move_focus(root, FocusDirection::Next));
        assert_eq!(tree.focused(), Some(items[2]));

        // End of the cycle: no move.
        assert!(!tree.move_focus(root, FocusDirection::Next));
        assert_eq!(tree.focused(), Some(items[2]));

        assert!(tree.move_focus(root, FocusDirection::Prev));
        assert_eq!(tree.focused(), Some(items[1]));
    }

    #[test]
    fn test_cycle_wraps() {
        let mut tree = Tree::new();
        let (root, items) = row(&mut tree, 2);
        tree.grab_focus(items[1]).unwrap();

        assert!(tree.cycle_focus(root, FocusDirection::Next));
        assert_eq!(tree.focused(), Some(items[0]));
    }

    #[test]
    fn test_reading_order_uses_geometry() {
        let mut tree = Tree::new();
        let root = tree.create(Table::new());
        // Added bottom row first.
        let low = tree.create(Spacer::new(5.0, 1.0).focusable(true));
        let high = tree.create(Spacer::new(5.0, 1.0).focusable(true));
        tree.add(root, low).unwrap();
        tree.add(root, high).unwrap();
        tree.set_pack(low, PackInfo::cell(0, 1));
        tree.set_pack(high, PackInfo::cell(0, 0));
        tree.layout(root, Area::new(0.0, 0.0, 5.0, 2.0)).unwrap();

        assert!(tree.move_focus(root, FocusDirection::Next));
        assert_eq!(tree.focused(), Some(high));
    }

    #[test]
    fn test_right_picks_nearest_neighbour() {
        let mut tree = Tree::new();
        let (root, items) = row(&mut tree, 3);
        tree.grab_focus(items[0]).unwrap();

        assert!(tree.move_focus(root, FocusDirection::Right));
        assert_eq!(tree.focused(), Some(items[1]));
        assert!(tree.move_focus(root, FocusDirection::Left));
        assert_eq!(tree.focused(), Some(items[0]));
        assert!(!tree.move_focus(root, FocusDirection::Left));
    }

    #[test]
    fn test_directional_without_focus_starts_at_corner() {
        let mut tree = Tree::new();
        let (root, items) = row(&mut tree, 3);

        assert!(tree.move_focus(root, FocusDirection::Left));
        assert_eq!(tree.focused(), Some(items[2]));
    }

    #[test]
    fn test_focus_chain_resumes_in_nested_container() {
        let mut tree = Tree::new();
        let (root, items) = row(&mut tree, 1);
        let group = tree.create(Overlap::new());
        let inner = tree.create(Spacer::new(1.0, 1.0).focusable(true));
        tree.add(group, inner).unwrap();
        tree.add(root, group).unwrap();
        tree.set_pack(group, PackInfo::cell(1, 0));
        tree.layout(root, Area::new(0.0, 0.0, 20.0, 1.0)).unwrap();

        tree.grab_focus(inner).unwrap();
        tree.blur();
        assert_eq!(tree.focus_child(root), Some(group));

        // The chain is offered the move first.
        assert!(tree.move_focus(root, FocusDirection::Next));
        assert_eq!(tree.focused(), Some(inner));
        assert_ne!(tree.focused(), Some(items[0]));
    }

    #[test]
    fn test_removing_focused_subtree_blurs() {
        let mut tree = Tree::new();
        let (root, items) = row(&mut tree, 2);
        tree.grab_focus(items[1]).unwrap();

        tree.remove(items[1]).unwrap();
        assert_eq!(tree.focused(), None);
        assert_eq!(tree.focus_child(root), None);
    }

    /// Focusable spacers sharing cell (0, 0), each kept at its natural size
    /// and aligned inside the cell.
    fn stacked(tree: &mut Tree, sizes: &[(f32, f32, f32)]) -> (NodeId, Vec<NodeId>) {
        let root = tree.create(Table::new());
        let items = sizes
            .iter()
            .map(|&(w, h, valign)| {
                let id = tree.create(Spacer::new(w, h).focusable(true));
                tree.add(root, id).unwrap();
                tree.set_pack(id, PackInfo::cell(0, 0).align(0.0, valign).scale(0.0, 0.0));
                id
            })
            .collect();
        tree.layout(root, Area::new(0.0, 0.0, 6.0, 6.0)).unwrap();
        (root, items)
    }

    #[test]
    fn test_equal_projection_prefers_nearest_edge() {
        let mut tree = Tree::new();
        let root = tree.create(Table::new());
        let mut cell = |col, row| {
            let id = tree.create(Spacer::new(4.0, 1.0).focusable(true));
            tree.add(root, id).unwrap();
            tree.set_pack(id, PackInfo::cell(col, row));
            id
        };
        let start = cell(0, 0);
        let far = cell(1, 2);
        let near = cell(1, 1);
        tree.layout(root, Area::new(0.0, 0.0, 8.0, 3.0)).unwrap();

        tree.grab_focus(start).unwrap();
        assert!(tree.move_focus(root, FocusDirection::Right));
        assert_eq!(tree.focused(), Some(near));
        assert_ne!(tree.focused(), Some(far));
    }

    #[test]
    fn test_equal_edge_distance_prefers_nearest_center() {
        let mut tree = Tree::new();
        let (root, items) = stacked(&mut tree, &[(6.0, 6.0, 0.0), (2.0, 2.0, 0.0)]);
        assert_eq!(tree.allocation(items[1]), Allocation::new(0, 0, 2, 2));

        // Both touch the starting corner; the smaller one is centered closer.
        assert!(tree.move_focus(root, FocusDirection::Right));
        assert_eq!(tree.focused(), Some(items[1]));
    }

    #[test]
    fn test_overlapping_band_orders_by_center() {
        let mut tree = Tree::new();
        let (root, items) = stacked(&mut tree, &[(2.0, 6.0, 0.0), (2.0, 2.0, 0.0)]);
        assert!(tree.move_focus(root, FocusDirection::Next));
        assert_eq!(tree.focused(), Some(items[1]));
        assert!(tree.move_focus(root, FocusDirection::Next));
        assert_eq!(tree.focused(), Some(items[0]));

        // Same center row: the leftmost center goes first.
        let mut tree = Tree::new();
        let (root, items) = stacked(&mut tree, &[(2.0, 6.0, 0.0), (1.0, 2.0, 0.5)]);
        assert_eq!(tree.allocation(items[1]), Allocation::new(0, 2, 1, 2));
        assert!(tree.move_focus(root, FocusDirection::Next));
        assert_eq!(tree.focused(), Some(items[1]));
    }
}
