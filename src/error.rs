//! Tree error types.
//!
//! Every variant is a caller contract violation. The mutation that raised it
//! is abandoned and the tree is left as it was before the call.

use thiserror::Error;

use crate::types::NodeId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {node} already has parent {parent}")]
    AlreadyParented { node: NodeId, parent: NodeId },

    #[error("node {0} is not a container")]
    NotAContainer(NodeId),

    #[error("single container {0} already holds a child")]
    ContainerFull(NodeId),

    #[error("adding {node} to {container} would make a node its own ancestor")]
    Cycle { container: NodeId, node: NodeId },

    #[error("node {node} is not a child of {container}")]
    NotAChild { container: NodeId, node: NodeId },

    #[error("node {0} has no parent")]
    Detached(NodeId),

    #[error("container {0} has no child")]
    EmptyContainer(NodeId),

    #[error("node {0} was allocated before its size was requested")]
    AllocateBeforeSizing(NodeId),

    #[error("node {0} must be removed from its parent before it is destroyed")]
    StillAttached(NodeId),

    #[error("cannot cross-link node {0} to itself")]
    SelfLink(NodeId),

    #[error("nodes {owner} and {target} do not share {container} as closest common ancestor")]
    NoCommonAncestor {
        container: NodeId,
        owner: NodeId,
        target: NodeId,
    },

    #[error("nodes {owner} and {target} are in different trees")]
    Disjoint { owner: NodeId, target: NodeId },

    #[error("no cross link from {owner} to {target} on {container} to remove")]
    NoSuchLink {
        container: NodeId,
        owner: NodeId,
        target: NodeId,
    },

    #[error("node {0} cannot take focus")]
    NotFocusable(NodeId),
}

pub type Result<T> = std::result::Result<T, TreeError>;
