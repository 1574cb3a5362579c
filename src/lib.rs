//! # spark-layout
//!
//! Size negotiation, table layout and spatial focus for retained widget trees.
//!
//! ## Architecture
//!
//! spark-layout keeps every node of a widget tree in one arena ([`Tree`]) and
//! addresses it by a [`NodeId`]. Widgets plug in through a small set of
//! capability traits ([`Measurable`], [`Allocatable`], [`Focusable`]).
//!
//! Layout is a two-phase negotiation:
//! ```text
//! size_request (bottom-up, cached)  →  set_allocation (top-down, rounded)
//! ```
//! Invalidation marks a node dirty and walks up until it meets an ancestor
//! that is already dirty, so the next pass only re-measures what changed.
//!
//! ## Modules
//!
//! - [`types`] - Core types (NodeId, NodeFlags, Allocation, PackInfo, etc.)
//! - [`engine`] - Node arena, sizing protocol, containers, cross-links
//! - [`layout`] - Table solver and the Bin/Overlap/Spacer widgets
//! - [`state`] - Focus state and directional/sequential navigation
//!
//! ## Example
//!
//! ```ignore
//! use spark_layout::{Area, PackInfo, Spacer, Table, Tree};
//!
//! let mut tree = Tree::new();
//! let table = tree.create(Table::new().col_spacing(1));
//! let label = tree.create(Spacer::new(10.0, 1.0));
//! tree.add(table, label)?;
//! tree.set_pack(label, PackInfo::cell(0, 0).expand(true, false));
//!
//! tree.layout(table, Area::new(0.0, 0.0, 80.0, 24.0))?;
//! ```

pub mod engine;
pub mod error;
pub mod layout;
pub mod state;
pub mod types;
pub mod widget;

// Re-export commonly used items
pub use types::*;

pub use error::{Result, TreeError};

pub use engine::{LinkId, Tree, UncrossFn};

pub use layout::{Bin, Overlap, RowCol, Spacer, Table};

pub use state::{FocusCallbacks, FocusDirection, FocusState};

pub use widget::{Allocatable, AsAny, Composition, Focusable, Measurable, RepaintHook, Repack, Widget};
