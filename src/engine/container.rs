//! Container composition and per-node state setters.
//!
//! Two layers:
//! - `add_child` / `remove_child` do the bare structural change on one
//!   container, checking only its own contract
//! - `add` / `remove` are what callers use: they follow insertion points,
//!   tear down cross-links and focus references, notify the container
//!   widget and invalidate

use std::iter::Copied;
use std::slice;

use tracing::debug;

use super::Tree;
use super::node::Children;
use crate::error::{Result, TreeError};
use crate::types::{NodeFlags, NodeId, PackInfo};
use crate::widget::Repack;

impl Tree {
    // =========================================================================
    // Structure
    // =========================================================================

    /// Immediate children of `id`, in traversal order.
    pub fn local_children(&self, id: NodeId) -> Copied<slice::Iter<'_, NodeId>> {
        self.node(id).children.as_slice().iter().copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.node(id).children.as_slice().len()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.child_count(id) > 0
    }

    /// The child of a single-child container.
    pub fn get_child(&self, container: NodeId) -> Result<NodeId> {
        match &self.try_node(container)?.children {
            Children::Single(Some(child)) => Ok(*child),
            Children::Single(None) => Err(TreeError::EmptyContainer(container)),
            Children::Leaf | Children::Multi(_) => Err(TreeError::NotAContainer(container)),
        }
    }

    /// True if `ancestor` is a strict ancestor of `id`.
    pub fn has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.node(parent).parent;
        }
        false
    }

    /// Closest node that is `a` or an ancestor of `a` and also `b` or an
    /// ancestor of `b`.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let mut current = Some(a);
        while let Some(candidate) = current {
            if candidate == b || self.has_ancestor(b, candidate) {
                return Some(candidate);
            }
            current = self.node(candidate).parent;
        }
        None
    }

    /// Attach `child` directly to `container`.
    pub fn add_child(&mut self, container: NodeId, child: NodeId) -> Result<()> {
        self.try_node(container)?;
        let node = self.try_node(child)?;
        if let Some(parent) = node.parent {
            return Err(TreeError::AlreadyParented {
                node: child,
                parent,
            });
        }
        if container == child || self.has_ancestor(container, child) {
            return Err(TreeError::Cycle {
                container,
                node: child,
            });
        }

        match &mut self.node_mut(container).children {
            Children::Leaf => return Err(TreeError::NotAContainer(container)),
            Children::Single(Some(_)) => return Err(TreeError::ContainerFull(container)),
            Children::Single(slot) => *slot = Some(child),
            Children::Multi(list) => list.push(child),
        }

        self.node_mut(child).parent = Some(container);
        let sensitive = self.node(container).is_sensitive();
        self.propagate_parent_sensitive(child, sensitive);
        Ok(())
    }

    /// Detach `child` from `container`.
    pub fn remove_child(&mut self, container: NodeId, child: NodeId) -> Result<()> {
        self.try_node(container)?;
        if self.try_node(child)?.parent != Some(container) {
            return Err(TreeError::NotAChild {
                container,
                node: child,
            });
        }

        let removed = match &mut self.node_mut(container).children {
            Children::Single(slot) if *slot == Some(child) => slot.take().is_some(),
            Children::Multi(list) => match list.iter().position(|c| *c == child) {
                Some(index) => {
                    list.remove(index);
                    true
                }
                None => false,
            },
            _ => false,
        };
        if !removed {
            panic!("container {container} does not list its child {child}");
        }

        let node = self.node_mut(child);
        node.parent = None;
        node.flags.insert(NodeFlags::PARENT_SENSITIVE);
        let sensitive = node.is_sensitive();
        let grandchildren = node.children.as_slice().to_vec();
        for grandchild in grandchildren {
            self.propagate_parent_sensitive(grandchild, sensitive);
        }
        Ok(())
    }

    /// Add `child` to `container`, or to the container's effective insertion
    /// point, then repack and invalidate.
    pub fn add(&mut self, container: NodeId, child: NodeId) -> Result<()> {
        self.try_node(container)?;
        if let Some(parent) = self.try_node(child)?.parent {
            return Err(TreeError::AlreadyParented {
                node: child,
                parent,
            });
        }

        let target = self.effective_container(container);
        self.add_child(target, child)?;
        debug!(container = %target, %child, "added child");

        self.with_widget(target, |widget, tree| {
            widget.repack(tree, target, child, Repack::Added)
        });
        self.invalidate(child);
        self.invalidate(target);
        Ok(())
    }

    /// Detach `child` from its parent.
    ///
    /// Cross-links crossing the detached subtree fire, focus references into it
    /// are dropped, and a focused node inside it is blurred.
    pub fn remove(&mut self, child: NodeId) -> Result<()> {
        let Some(container) = self.try_node(child)?.parent else {
            return Err(TreeError::Detached(child));
        };

        let mut ancestor = Some(container);
        while let Some(id) = ancestor {
            self.uncross_descendant(id, child);
            let node = self.node_mut(id);
            if node.focus_child == Some(child) {
                node.focus_child = None;
            }
            ancestor = node.parent;
        }
        // Callbacks may have detached the child already.
        if self.try_node(child).map(|n| n.parent) != Ok(Some(container)) {
            return Ok(());
        }

        if let Some(focused) = self.focus.focused() {
            if focused == child || self.has_ancestor(focused, child) {
                self.blur();
            }
        }

        self.invalidate(child);
        self.invalidate_size(container);
        self.remove_child(container, child)?;
        debug!(%container, %child, "removed child");

        self.with_widget(container, |widget, tree| {
            widget.repack(tree, container, child, Repack::Removed)
        });
        Ok(())
    }

    /// Route children added to `container` to `point`, a container below it.
    pub fn set_insertion_point(&mut self, container: NodeId, point: Option<NodeId>) -> Result<()> {
        if !self.try_node(container)?.children.is_container() {
            return Err(TreeError::NotAContainer(container));
        }
        if let Some(point) = point {
            if !self.try_node(point)?.children.is_container() {
                return Err(TreeError::NotAContainer(point));
            }
            if !self.has_ancestor(point, container) {
                return Err(TreeError::NotAChild {
                    container,
                    node: point,
                });
            }
        }
        self.node_mut(container).insertion_point = point;
        Ok(())
    }

    /// Follow insertion points downward. A point that was moved out from
    /// under its container since it was set is ignored.
    fn effective_container(&self, container: NodeId) -> NodeId {
        let mut target = container;
        while let Some(next) = self.node(target).insertion_point {
            if !self.contains(next) || !self.has_ancestor(next, target) {
                break;
            }
            target = next;
        }
        target
    }

    // =========================================================================
    // Node state
    // =========================================================================

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if self.node(id).flags.contains(NodeFlags::VISIBLE) == visible {
            return;
        }
        self.node_mut(id).flags.set(NodeFlags::VISIBLE, visible);
        self.force_invalidate(id);
    }

    /// Hide a child on behalf of its container, independent of VISIBLE.
    pub fn set_hidden_child(&mut self, id: NodeId, hidden: bool) {
        if self.node(id).flags.contains(NodeFlags::HIDDEN_CHILD) == hidden {
            return;
        }
        self.node_mut(id).flags.set(NodeFlags::HIDDEN_CHILD, hidden);
        self.force_invalidate(id);
    }

    pub fn set_sensitive(&mut self, id: NodeId, sensitive: bool) {
        let node = self.node_mut(id);
        if node.flags.contains(NodeFlags::SENSITIVE) == sensitive {
            return;
        }
        node.flags.set(NodeFlags::SENSITIVE, sensitive);
        let effective = node.is_sensitive();
        let children = node.children.as_slice().to_vec();
        for child in children {
            self.propagate_parent_sensitive(child, effective);
        }

        if let Some(focused) = self.focus.focused() {
            if !self.node(focused).is_sensitive() {
                self.blur();
            }
        }
        self.invalidate_content(id);
    }

    fn propagate_parent_sensitive(&mut self, id: NodeId, parent_sensitive: bool) {
        let node = self.node_mut(id);
        node.flags.set(NodeFlags::PARENT_SENSITIVE, parent_sensitive);
        let effective = node.is_sensitive();
        let children = node.children.as_slice().to_vec();
        for child in children {
            self.propagate_parent_sensitive(child, effective);
        }
    }

    /// Ask ancestors to pass extra horizontal space down to `id`.
    pub fn set_hspread(&mut self, id: NodeId, spread: bool) {
        self.set_flag_and_invalidate(id, NodeFlags::HSPREAD, spread);
    }

    pub fn set_vspread(&mut self, id: NodeId, spread: bool) {
        self.set_flag_and_invalidate(id, NodeFlags::VSPREAD, spread);
    }

    fn set_flag_and_invalidate(&mut self, id: NodeId, flag: NodeFlags, on: bool) {
        if self.node(id).flags.contains(flag) == on {
            return;
        }
        self.node_mut(id).flags.set(flag, on);
        self.force_invalidate(id);
    }

    /// Whether a parent should treat `id` as horizontally expandable.
    pub fn wants_hexpand(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.pack.hexpand || node.flags.intersects(NodeFlags::HSPREAD | NodeFlags::HSPREAD_CONTAINER)
    }

    pub fn wants_vexpand(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.pack.vexpand || node.flags.intersects(NodeFlags::VSPREAD | NodeFlags::VSPREAD_CONTAINER)
    }

    /// Recompute the `*_SPREAD_CONTAINER` flags of `container` from its
    /// visible children. Called by container widgets while measuring.
    pub fn update_spread_container(&mut self, container: NodeId) {
        let mut hspread = false;
        let mut vspread = false;
        for child in self.local_children(container) {
            let node = self.node(child);
            if !node.is_visible() {
                continue;
            }
            hspread |= node.flags.intersects(NodeFlags::HSPREAD | NodeFlags::HSPREAD_CONTAINER);
            vspread |= node.flags.intersects(NodeFlags::VSPREAD | NodeFlags::VSPREAD_CONTAINER);
        }
        let flags = &mut self.node_mut(container).flags;
        flags.set(NodeFlags::HSPREAD_CONTAINER, hspread);
        flags.set(NodeFlags::VSPREAD_CONTAINER, vspread);
    }

    /// Fixed width replacing the measured one; `None` or negative restores measuring.
    pub fn set_width_override(&mut self, id: NodeId, width: Option<f32>) {
        self.node_mut(id).width_override = width;
        self.invalidate_size(id);
    }

    pub fn set_height_override(&mut self, id: NodeId, height: Option<f32>) {
        self.node_mut(id).height_override = height;
        self.invalidate_size(id);
    }

    /// Replace the packing parameters of `id` and notify its container.
    ///
    /// Reversed or empty attach ranges are widened to one cell.
    pub fn set_pack(&mut self, id: NodeId, pack: PackInfo) {
        let pack = pack.normalized();
        let node = self.node_mut(id);
        if node.pack == pack {
            return;
        }
        node.pack = pack;
        let parent = node.parent;

        if let Some(parent) = parent {
            self.with_widget(parent, |widget, tree| {
                widget.repack(tree, parent, id, Repack::Changed)
            });
        }
        self.force_invalidate(id);
    }

    /// Store pack info without notifying the container. Used by container
    /// widgets rearranging their own children from `repack`.
    pub(crate) fn replace_pack(&mut self, id: NodeId, pack: PackInfo) {
        self.node_mut(id).pack = pack.normalized();
        self.invalidate_size(id);
    }

    /// Invalidate `id` and its parent even when `id` is already dirty.
    ///
    /// Flag changes alter how the parent lays out `id`, which a dirty `id`
    /// does not imply.
    fn force_invalidate(&mut self, id: NodeId) {
        self.invalidate(id);
        if let Some(parent) = self.node(id).parent {
            self.invalidate(parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Bin, Overlap, Spacer};

    fn leaf(tree: &mut Tree) -> NodeId {
        tree.create(Spacer::new(1.0, 1.0))
    }

    #[test]
    fn test_add_remove_symmetry() {
        let mut tree = Tree::new();
        let bin = tree.create(Bin::new());
        let x = leaf(&mut tree);

        tree.add(bin, x).unwrap();
        assert_eq!(tree.get_child(bin), Ok(x));
        assert_eq!(tree.parent(x), Some(bin));

        tree.remove(x).unwrap();
        assert!(!tree.has_children(bin));
        assert_eq!(tree.parent(x), None);
        assert_eq!(tree.get_child(bin), Err(TreeError::EmptyContainer(bin)));
    }

    #[test]
    fn test_multi_preserves_order() {
        let mut tree = Tree::new();
        let list = tree.create(Overlap::new());
        let x = leaf(&mut tree);
        let y = leaf(&mut tree);
        let z = leaf(&mut tree);
        for id in [x, y, z] {
            tree.add(list, id).unwrap();
        }

        tree.remove(x).unwrap();
        assert_eq!(tree.local_children(list).collect::<Vec<_>>(), vec![y, z]);
    }

    #[test]
    fn test_add_contract_violations() {
        let mut tree = Tree::new();
        let bin = tree.create(Bin::new());
        let other = tree.create(Bin::new());
        let x = leaf(&mut tree);
        let y = leaf(&mut tree);

        tree.add(bin, x).unwrap();
        assert_eq!(
            tree.add(other, x),
            Err(TreeError::AlreadyParented { node: x, parent: bin })
        );
        assert_eq!(tree.add(bin, y), Err(TreeError::ContainerFull(bin)));
        assert_eq!(tree.add(x, y), Err(TreeError::NotAContainer(x)));
        assert_eq!(tree.add(bin, bin), Err(TreeError::Cycle { container: bin, node: bin }));

        tree.add(other, bin).unwrap();
        assert_eq!(
            tree.add_child(bin, other),
            Err(TreeError::Cycle { container: bin, node: other })
        );
    }

    #[test]
    fn test_remove_contract_violations() {
        let mut tree = Tree::new();
        let a = tree.create(Overlap::new());
        let b = tree.create(Overlap::new());
        let x = leaf(&mut tree);

        assert_eq!(tree.remove(x), Err(TreeError::Detached(x)));
        tree.add(a, x).unwrap();
        assert_eq!(tree.remove_child(b, x), Err(TreeError::NotAChild { container: b, node: x }));
    }

    #[test]
    fn test_insertion_point_redirects() {
        let mut tree = Tree::new();
        let outer = tree.create(Bin::new());
        let viewport = tree.create(Overlap::new());
        tree.add(outer, viewport).unwrap();
        tree.set_insertion_point(outer, Some(viewport)).unwrap();

        let x = leaf(&mut tree);
        tree.add(outer, x).unwrap();
        assert_eq!(tree.parent(x), Some(viewport));
    }

    #[test]
    fn test_sensitivity_propagates() {
        let mut tree = Tree::new();
        let outer = tree.create(Bin::new());
        let inner = tree.create(Bin::new());
        let x = leaf(&mut tree);
        tree.add(outer, inner).unwrap();
        tree.add(inner, x).unwrap();

        tree.set_sensitive(outer, false);
        assert!(!tree.is_sensitive(x));
        assert!(tree.flags(x).contains(NodeFlags::SENSITIVE));

        tree.set_sensitive(outer, true);
        assert!(tree.is_sensitive(x));

        // Attaching below an insensitive node inherits it.
        tree.set_sensitive(outer, false);
        tree.remove(inner).unwrap();
        assert!(tree.is_sensitive(x));
        tree.add(outer, inner).unwrap();
        assert!(!tree.is_sensitive(x));
    }

    #[test]
    fn test_common_ancestor() {
        let mut tree = Tree::new();
        let root = tree.create(Overlap::new());
        let group = tree.create(Overlap::new());
        let a = leaf(&mut tree);
        let b = leaf(&mut tree);
        tree.add(root, group).unwrap();
        tree.add(group, a).unwrap();
        tree.add(root, b).unwrap();

        assert_eq!(tree.common_ancestor(a, b), Some(root));
        assert_eq!(tree.common_ancestor(a, group), Some(group));
        assert!(tree.has_ancestor(a, root));
        assert!(!tree.has_ancestor(root, a));
    }

    #[test]
    fn test_spread_marks_container() {
        let mut tree = Tree::new();
        let list = tree.create(Overlap::new());
        let x = leaf(&mut tree);
        tree.add(list, x).unwrap();
        tree.set_hspread(x, true);

        tree.update_spread_container(list);
        assert!(tree.flags(list).contains(NodeFlags::HSPREAD_CONTAINER));
        assert!(tree.wants_hexpand(list));
        assert!(!tree.wants_vexpand(list));
    }
}
