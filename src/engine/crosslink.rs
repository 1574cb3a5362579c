//! Cross-links - detach notifications between nodes that do not own each other.
//!
//! A cross-link is stored on the closest common ancestor of its two ends.
//! When either end (or an ancestor of it below that container) is removed,
//! the link fires once and is dropped.
//!
//! Callbacks run with `&mut Tree` and may unlink themselves or other links
//! while the container is scanning. Links currently running are tracked on a
//! per-container firing stack, so such an `unlink` marks the in-flight entry
//! instead of touching a list that is being walked.

use tracing::trace;

use super::Tree;
use crate::error::{Result, TreeError};
use crate::types::NodeId;

/// Handle identifying one link on its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(u64);

/// Callback fired with `(owner, target)` when the link is severed by a detach.
pub type UncrossFn = Box<dyn FnOnce(&mut Tree, NodeId, NodeId)>;

struct CrossLink {
    id: LinkId,
    owner: NodeId,
    target: NodeId,
    callback: UncrossFn,
}

#[derive(Debug)]
struct Firing {
    id: LinkId,
    owner: NodeId,
    target: NodeId,
    unlinked: bool,
}

#[derive(Default)]
pub(crate) struct CrossLinks {
    /// Newest first.
    links: Vec<CrossLink>,
    firing: Vec<Firing>,
    next: u64,
}

impl CrossLinks {
    pub(crate) fn len(&self) -> usize {
        self.links.len()
    }
}

impl Tree {
    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a link on `container`, which must be the closest common
    /// ancestor of `owner` and `target`.
    pub fn link(
        &mut self,
        container: NodeId,
        owner: NodeId,
        target: NodeId,
        callback: impl FnOnce(&mut Tree, NodeId, NodeId) + 'static,
    ) -> Result<LinkId> {
        if !self.try_node(container)?.children.is_container() {
            return Err(TreeError::NotAContainer(container));
        }
        self.try_node(owner)?;
        self.try_node(target)?;
        if owner == target {
            return Err(TreeError::SelfLink(owner));
        }
        if self.common_ancestor(owner, target) != Some(container) {
            return Err(TreeError::NoCommonAncestor {
                container,
                owner,
                target,
            });
        }

        let links = &mut self.node_mut(container).crosslinks;
        let id = LinkId(links.next);
        links.next += 1;
        links.links.insert(
            0,
            CrossLink {
                id,
                owner,
                target,
                callback: Box::new(callback),
            },
        );
        trace!(%container, %owner, %target, "cross-linked");
        Ok(id)
    }

    /// Register a link on the closest common ancestor of `owner` and `target`.
    ///
    /// Returns that container along with the link handle.
    pub fn cross_link(
        &mut self,
        owner: NodeId,
        target: NodeId,
        callback: impl FnOnce(&mut Tree, NodeId, NodeId) + 'static,
    ) -> Result<(NodeId, LinkId)> {
        self.try_node(owner)?;
        self.try_node(target)?;
        let container = self
            .common_ancestor(owner, target)
            .ok_or(TreeError::Disjoint { owner, target })?;
        let link = self.link(container, owner, target, callback)?;
        Ok((container, link))
    }

    /// Remove a link without firing it.
    ///
    /// Safe to call from inside any link callback, including the link's own.
    /// Unlinking something that is neither stored nor in flight is an error.
    pub fn unlink(
        &mut self,
        container: NodeId,
        owner: NodeId,
        target: NodeId,
        link: LinkId,
    ) -> Result<()> {
        let links = &mut self.try_node_mut(container)?.crosslinks;

        if let Some(firing) = links
            .firing
            .iter_mut()
            .rev()
            .find(|f| f.id == link && f.owner == owner && f.target == target && !f.unlinked)
        {
            firing.unlinked = true;
            return Ok(());
        }

        match links
            .links
            .iter()
            .position(|l| l.id == link && l.owner == owner && l.target == target)
        {
            Some(index) => {
                links.links.remove(index);
                trace!(%container, %owner, %target, "unlinked");
                Ok(())
            }
            None => Err(TreeError::NoSuchLink {
                container,
                owner,
                target,
            }),
        }
    }

    /// Number of links stored on `container`.
    pub fn link_count(&self, container: NodeId) -> usize {
        self.node(container).crosslinks.len()
    }

    // =========================================================================
    // Detach
    // =========================================================================

    /// Fire and drop every link on `container` with an end at or below `node`.
    ///
    /// The scan restarts after each callback, since callbacks may change the
    /// list.
    pub(crate) fn uncross_descendant(&mut self, container: NodeId, node: NodeId) {
        // A node without children can only match itself.
        let deep = !self.node(node).children.as_slice().is_empty();

        loop {
            let Some(Some(holder)) = self.nodes.get(container.0) else {
                return;
            };
            let found = holder.crosslinks.links.iter().position(|l| {
                if deep {
                    self.is_within(l.owner, node, container) || self.is_within(l.target, node, container)
                } else {
                    l.owner == node || l.target == node
                }
            });
            match found {
                Some(index) => self.fire(container, index),
                None => return,
            }
        }
    }

    /// True if `candidate` is `node` or below it, looking no higher than `bound`.
    fn is_within(&self, candidate: NodeId, node: NodeId, bound: NodeId) -> bool {
        let mut current = Some(candidate);
        while let Some(id) = current {
            if id == node {
                return true;
            }
            if id == bound {
                return false;
            }
            current = self.nodes.get(id.0).and_then(Option::as_ref).and_then(|n| n.parent);
        }
        false
    }

    fn fire(&mut self, container: NodeId, index: usize) {
        let links = &mut self.node_mut(container).crosslinks;
        let CrossLink {
            id,
            owner,
            target,
            callback,
        } = links.links.remove(index);
        links.firing.push(Firing {
            id,
            owner,
            target,
            unlinked: false,
        });

        trace!(%container, %owner, %target, "uncross");
        callback(self, owner, target);

        if let Some(Some(holder)) = self.nodes.get_mut(container.0) {
            let firing = &mut holder.crosslinks.firing;
            if let Some(pos) = firing.iter().rposition(|f| f.id == id) {
                firing.remove(pos);
            }
        }
    }
}
