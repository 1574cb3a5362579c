//! Core types for spark-layout.
//!
//! These types define the foundation that everything builds on: the node
//! handle, state flags, the geometry a node asks for and the geometry it is
//! granted, and the per-child packing parameters containers read.

use taffy::{Point, Size};

// =============================================================================
// NodeId
// =============================================================================

/// Handle to a node slot in a [`Tree`](crate::Tree).
///
/// Handles are plain indices. A destroyed node's slot is recycled, so a handle
/// must not be used after `destroy()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Slot index of this node.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Node Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Per-node state bits.
    ///
    /// The three `*_INVALID` bits are the dirty state of the sizing protocol.
    /// A freshly created node carries all of them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u32 {
        const VISIBLE = 1 << 0;
        const SENSITIVE = 1 << 1;
        /// Cleared while some ancestor is insensitive.
        const PARENT_SENSITIVE = 1 << 2;
        const REQUISITION_INVALID = 1 << 3;
        const ALLOCATION_INVALID = 1 << 4;
        const CONTENT_INVALID = 1 << 5;
        /// Node wants extra horizontal space and asks its ancestors to pass it on.
        const HSPREAD = 1 << 6;
        const VSPREAD = 1 << 7;
        /// Set on a container when some child spreads horizontally.
        const HSPREAD_CONTAINER = 1 << 8;
        const VSPREAD_CONTAINER = 1 << 9;
        /// Hidden by the parent container regardless of VISIBLE.
        const HIDDEN_CHILD = 1 << 10;
        /// On the path from the root to the focused node.
        const FOCUS_CHAIN = 1 << 11;
        /// Last allocation had a non-empty area.
        const POSITIVE_ALLOCATION = 1 << 12;
    }
}

impl NodeFlags {
    /// Both size bits.
    pub const SIZE_INVALID: Self =
        Self::REQUISITION_INVALID.union(Self::ALLOCATION_INVALID);

    /// Every dirty bit.
    pub const ALL_INVALID: Self = Self::SIZE_INVALID.union(Self::CONTENT_INVALID);

    /// State of a node right after creation.
    pub const INITIAL: Self = Self::VISIBLE
        .union(Self::SENSITIVE)
        .union(Self::PARENT_SENSITIVE)
        .union(Self::ALL_INVALID);
}

// =============================================================================
// Requisition / Allocation / Area
// =============================================================================

/// Desired size of a node, ignoring external constraints.
pub type Requisition = Size<f32>;

/// Largest magnitude accepted for any allocation field.
///
/// An offset plus an extent, both clamped to this, still fits in an `i32`.
pub const ALLOCATION_LIMIT: i32 = 1 << 29;

/// Largest grid attach index a [`PackInfo`] may carry.
pub const ATTACH_LIMIT: u32 = 1 << 16;

/// The concrete pixel rectangle a parent grants a child (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Allocation {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Allocation {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Round a fractional area to pixels and clamp every field into range.
    pub fn from_area(area: Area) -> Self {
        let clamp = |v: f64, lo: i32| -> i32 {
            let v = v.round();
            if v.is_nan() {
                0
            } else {
                v.clamp(f64::from(lo), f64::from(ALLOCATION_LIMIT)) as i32
            }
        };
        Self {
            x: clamp(area.x, -ALLOCATION_LIMIT),
            y: clamp(area.y, -ALLOCATION_LIMIT),
            width: clamp(area.width, 0),
            height: clamp(area.height, 0),
        }
    }

    /// True when both extents are positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Center point.
    pub fn center(&self) -> Point<f32> {
        Point {
            x: self.x as f32 + self.width as f32 / 2.0,
            y: self.y as f32 + self.height as f32 / 2.0,
        }
    }

    /// Euclidean distance from `p` to the nearest point of this rectangle.
    ///
    /// Zero when `p` lies inside.
    pub fn distance_to(&self, p: Point<f32>) -> f32 {
        let dx = (self.x as f32 - p.x).max(p.x - self.right() as f32).max(0.0);
        let dy = (self.y as f32 - p.y).max(p.y - self.bottom() as f32).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }

    /// Intersection of two rectangles; an empty result keeps the origin of `self`
    /// clamped into `other`.
    pub fn intersect(&self, other: &Allocation) -> Allocation {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        Allocation {
            x: x1.min(other.right()),
            y: y1.min(other.bottom()),
            width: x2.saturating_sub(x1).max(0),
            height: y2.saturating_sub(y1).max(0),
        }
    }
}

impl From<Area> for Allocation {
    fn from(area: Area) -> Self {
        Self::from_area(area)
    }
}

/// A possibly fractional rectangle handed to `set_allocation`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Area {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Area {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

impl From<Allocation> for Area {
    fn from(a: Allocation) -> Self {
        Self {
            x: f64::from(a.x),
            y: f64::from(a.y),
            width: f64::from(a.width),
            height: f64::from(a.height),
        }
    }
}

// =============================================================================
// Orientation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

// =============================================================================
// PackInfo
// =============================================================================

/// Per-child packing parameters, read by the parent container.
///
/// Grid attach indices describe the half-open cell span
/// `[left_attach, right_attach) x [top_attach, bottom_attach)`. Rows count
/// downward, so `top_attach < bottom_attach`.
///
/// `halign`/`valign` position the child inside its slot (0 = start,
/// 0.5 = centered, 1 = end). `hscale`/`vscale` say how much of the slot the
/// child covers: 1 fills the slot, 0 keeps the child at its requisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackInfo {
    pub left_attach: u32,
    pub right_attach: u32,
    pub top_attach: u32,
    pub bottom_attach: u32,

    pub left_spacing: u32,
    pub right_spacing: u32,
    pub top_spacing: u32,
    pub bottom_spacing: u32,

    pub halign: f32,
    pub valign: f32,
    pub hscale: f32,
    pub vscale: f32,

    /// Ask the parent for extra horizontal space.
    pub hexpand: bool,
    pub vexpand: bool,
    /// Allow the parent to give less than the requisition.
    pub hshrink: bool,
    pub vshrink: bool,
}

impl Default for PackInfo {
    fn default() -> Self {
        Self {
            left_attach: 0,
            right_attach: 1,
            top_attach: 0,
            bottom_attach: 1,
            left_spacing: 0,
            right_spacing: 0,
            top_spacing: 0,
            bottom_spacing: 0,
            halign: 0.5,
            valign: 0.5,
            hscale: 1.0,
            vscale: 1.0,
            hexpand: false,
            vexpand: false,
            hshrink: false,
            vshrink: false,
        }
    }
}

impl PackInfo {
    /// Attach at a single cell.
    pub fn cell(col: u32, row: u32) -> Self {
        Self::default().span(col, col.saturating_add(1), row, row.saturating_add(1))
    }

    /// Attach over `[left, right) x [top, bottom)`.
    ///
    /// Indices are capped at [`ATTACH_LIMIT`]. Empty or reversed spans are
    /// widened to one cell starting at `left`/`top`.
    pub fn span(mut self, left: u32, right: u32, top: u32, bottom: u32) -> Self {
        (self.left_attach, self.right_attach) = attach_range(left, right);
        (self.top_attach, self.bottom_attach) = attach_range(top, bottom);
        self
    }

    /// The same packing with a well-formed attach range.
    pub fn normalized(self) -> Self {
        self.span(
            self.left_attach,
            self.right_attach,
            self.top_attach,
            self.bottom_attach,
        )
    }

    pub fn expand(mut self, hexpand: bool, vexpand: bool) -> Self {
        self.hexpand = hexpand;
        self.vexpand = vexpand;
        self
    }

    pub fn shrink(mut self, hshrink: bool, vshrink: bool) -> Self {
        self.hshrink = hshrink;
        self.vshrink = vshrink;
        self
    }

    /// Same spacing on all four sides.
    pub fn spacing(mut self, spacing: u32) -> Self {
        self.left_spacing = spacing;
        self.right_spacing = spacing;
        self.top_spacing = spacing;
        self.bottom_spacing = spacing;
        self
    }

    pub fn align(mut self, halign: f32, valign: f32) -> Self {
        self.halign = halign.clamp(0.0, 1.0);
        self.valign = valign.clamp(0.0, 1.0);
        self
    }

    pub fn scale(mut self, hscale: f32, vscale: f32) -> Self {
        self.hscale = hscale.clamp(0.0, 1.0);
        self.vscale = vscale.clamp(0.0, 1.0);
        self
    }

    #[inline]
    pub const fn hspan(&self) -> u32 {
        self.right_attach.saturating_sub(self.left_attach)
    }

    #[inline]
    pub const fn vspan(&self) -> u32 {
        self.bottom_attach.saturating_sub(self.top_attach)
    }

    #[inline]
    pub const fn hspacing(&self) -> u32 {
        self.left_spacing.saturating_add(self.right_spacing)
    }

    #[inline]
    pub const fn vspacing(&self) -> u32 {
        self.top_spacing.saturating_add(self.bottom_spacing)
    }
}

fn attach_range(start: u32, end: u32) -> (u32, u32) {
    let start = start.min(ATTACH_LIMIT - 1);
    (start, end.clamp(start + 1, ATTACH_LIMIT))
}

// =============================================================================
// Slot placement
// =============================================================================

/// Place a child of natural extent `natural` inside a slot of `slot` pixels
/// starting at `origin`, honouring the child's spacing, alignment and scale.
///
/// A child that does not fit keeps its natural extent and overhangs the slot
/// according to its alignment. Returns `(offset, extent)`.
pub(crate) fn place_in_slot(
    origin: i32,
    slot: i32,
    natural: i32,
    lead_spacing: u32,
    trail_spacing: u32,
    align: f32,
    scale: f32,
) -> (i32, i32) {
    let spacing = lead_spacing.saturating_add(trail_spacing).min(i32::MAX as u32) as i32;
    let avail = (slot - spacing).max(0);
    let extent = if scale >= 1.0 {
        avail
    } else if natural >= avail {
        natural.max(0)
    } else {
        let grown = natural as f32 + (avail - natural) as f32 * scale;
        (grown.round() as i32).clamp(natural.max(0), avail)
    };
    let slack = (avail - extent) as f32;
    let offset = origin
        .saturating_add(lead_spacing.min(i32::MAX as u32) as i32)
        .saturating_add((slack * align).round() as i32);
    (offset, extent)
}
