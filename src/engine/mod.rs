//! Layout Engine - Node arena and the size negotiation protocol.
//!
//! The engine manages the core data structures:
//! - Registry: slot allocation, lookup, destroy, callbacks
//! - Node: flags, cached requisition/allocation, pack info, children
//! - Sizing: invalidation, `size_request`, `set_allocation`
//! - Container: add/remove, insertion points, per-node state setters
//! - CrossLink: detach notifications stored on a common ancestor
//!
//! # Architecture
//!
//! Nodes are NOT objects holding references to each other. They are slots in
//! one arena, addressed by [`NodeId`](crate::NodeId):
//!
//! ```text
//! #0: Table  (parent=None, children=[#1, #2])
//! #1: Spacer (parent=#0,   pack=cell(0, 0))
//! #2: Bin    (parent=#0,   children=[#3])
//! #3: Spacer (parent=#2)
//! ```
//!
//! A parent pointer is a plain index; the parent's child list is the only
//! ownership record. Widgets are lent out of their slot while their
//! callbacks run, so a container can size and allocate its children through
//! the same `&mut Tree`.

mod container;
mod crosslink;
mod node;
mod registry;
mod sizing;

pub use crosslink::{LinkId, UncrossFn};
pub use registry::Tree;
