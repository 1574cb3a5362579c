//! State Module - Focus state and navigation
//!
//! - **Focus** - focused node, callbacks, focus chain, spatial navigation
//! - **Keys** - crossterm key events mapped to focus moves

pub(crate) mod focus;
mod keys;

pub use focus::{FocusCallbacks, FocusDirection, FocusState};
