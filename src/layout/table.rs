//! Table - grid container with row/column spans.
//!
//! Each child covers the cells `[left_attach, right_attach) x
//! [top_attach, bottom_attach)` of its [`PackInfo`](crate::PackInfo).
//!
//! # Algorithm
//!
//! Sizing, per axis:
//! 1. **init**: cover the largest attach index, zero every line, mark a line
//!    expandable when a child spanning only that line wants to expand
//! 2. **pass1**: each single-span child widens its line to its size + spacing
//! 3. **pass2** (homogeneous only): every line takes the largest requisition
//! 4. **pass3**: a multi-span child that still does not fit spreads the
//!    shortfall over its expandable lines, or over all of them if none
//!    expand; pass2 then runs again
//!
//! Allocation, per axis:
//! 1. **init**: every line starts at its requisition; expand/shrink
//!    eligibility is derived from the children; lines no child touches are
//!    frozen
//! 2. **pass1**: surplus goes to expandable lines and a deficit is taken from
//!    shrinkable lines, both visiting lines outward from the center; a deficit
//!    left over is cut from every line in proportion to its size
//! 3. **pass2**: each child is placed over the sum of its lines

use std::ops::Range;

use tracing::trace;

use super::{pixels, place_child, visible_children};
use crate::engine::Tree;
use crate::error::Result;
use crate::types::{Allocation, NodeId, Orientation, PackInfo, Requisition};
use crate::widget::{Allocatable, Composition, Measurable, Repack, Widget};

// =============================================================================
// RowCol
// =============================================================================

/// Solver state of one row or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowCol {
    pub requisition: i32,
    pub allocation: i32,
    /// Gap after this line; ignored on the last line.
    pub spacing: i32,
    pub expand: bool,
    pub shrink: bool,
    pub need_expand: bool,
    pub need_shrink: bool,
    pub empty: bool,
}

impl RowCol {
    fn with_spacing(spacing: u32) -> Self {
        Self {
            spacing: clamp_u32(spacing),
            ..Self::default()
        }
    }
}

fn clamp_u32(v: u32) -> i32 {
    v.min(i32::MAX as u32) as i32
}

/// `a / b` rounded up, for `a >= 0` and `b > 0`.
fn ceil_div(a: i64, b: i64) -> i64 {
    (a + b - 1) / b
}

/// Line indices starting at the middle and alternating outward, left side
/// first: `n/2, n/2-1, n/2+1, n/2-2, ...`.
pub(crate) fn centered_order(n: usize) -> impl Iterator<Item = usize> {
    let center = (n / 2) as isize;
    (0..n as isize).map(move |j| {
        let offset = (1 + j) >> 1;
        let step = if j & 1 == 1 { -offset } else { offset };
        (center + step) as usize
    })
}

// =============================================================================
// Axis helpers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Cols,
    Rows,
}

/// Snapshot of one visible child, taken once per pass.
#[derive(Debug, Clone, Copy)]
struct ChildInfo {
    pack: PackInfo,
    width: i32,
    height: i32,
    hexpand: bool,
    vexpand: bool,
}

impl ChildInfo {
    fn gather(tree: &mut Tree, child: NodeId) -> Self {
        let requisition = tree.size_request(child);
        Self {
            pack: tree.pack(child).normalized(),
            width: pixels(requisition.width),
            height: pixels(requisition.height),
            hexpand: tree.wants_hexpand(child),
            vexpand: tree.wants_vexpand(child),
        }
    }

    fn span(&self, axis: Axis) -> Range<usize> {
        match axis {
            Axis::Cols => self.pack.left_attach as usize..self.pack.right_attach as usize,
            Axis::Rows => self.pack.top_attach as usize..self.pack.bottom_attach as usize,
        }
    }

    fn is_single(&self, axis: Axis) -> bool {
        self.span(axis).len() == 1
    }

    /// Natural size plus the child's own spacing.
    fn needed(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Cols => self.width.saturating_add(clamp_u32(self.pack.hspacing())),
            Axis::Rows => self.height.saturating_add(clamp_u32(self.pack.vspacing())),
        }
    }

    fn expand(&self, axis: Axis) -> bool {
        match axis {
            Axis::Cols => self.hexpand,
            Axis::Rows => self.vexpand,
        }
    }

    fn shrink(&self, axis: Axis) -> bool {
        match axis {
            Axis::Cols => self.pack.hshrink,
            Axis::Rows => self.pack.vshrink,
        }
    }
}

/// Sum of `field` over `lines`, plus the spacing between them.
fn span_extent(lines: &[RowCol], field: impl Fn(&RowCol) -> i32) -> i32 {
    let last = lines.len().saturating_sub(1);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| field(line).saturating_add(if i < last { line.spacing } else { 0 }))
        .fold(0, i32::saturating_add)
}

// =============================================================================
// Table
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    cols: Vec<RowCol>,
    rows: Vec<RowCol>,
    homogeneous: bool,
    col_spacing: u32,
    row_spacing: u32,
    auto_flow: Option<Orientation>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    /// A 1x1 table without spacing.
    pub fn new() -> Self {
        Self {
            cols: vec![RowCol::default()],
            rows: vec![RowCol::default()],
            homogeneous: false,
            col_spacing: 0,
            row_spacing: 0,
            auto_flow: None,
        }
    }

    /// Give every column the same width and every row the same height.
    pub fn homogeneous(mut self, homogeneous: bool) -> Self {
        self.homogeneous = homogeneous;
        self
    }

    /// Gap between neighbouring columns.
    pub fn col_spacing(mut self, spacing: u32) -> Self {
        self.set_col_spacing(spacing);
        self
    }

    pub fn row_spacing(mut self, spacing: u32) -> Self {
        self.set_row_spacing(spacing);
        self
    }

    /// Attach each newly added child to the next free column
    /// (`Horizontal`) or row (`Vertical`), like a box.
    pub fn auto_flow(mut self, orientation: Orientation) -> Self {
        self.auto_flow = Some(orientation);
        self
    }

    pub fn with_size(mut self, cols: usize, rows: usize) -> Self {
        self.resize(cols, rows);
        self
    }

    // =========================================================================
    // Configuration on a live table. The caller invalidates the node.
    // =========================================================================

    /// Set the grid size. Both counts are at least one, and sizing grows
    /// them again to cover every child.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let (col_spacing, row_spacing) = (self.col_spacing, self.row_spacing);
        self.cols.resize(cols.max(1), RowCol::with_spacing(col_spacing));
        self.rows.resize(rows.max(1), RowCol::with_spacing(row_spacing));
    }

    pub fn set_homogeneous(&mut self, homogeneous: bool) {
        self.homogeneous = homogeneous;
    }

    /// Gap between all neighbouring columns.
    pub fn set_col_spacing(&mut self, spacing: u32) {
        self.col_spacing = spacing;
        for col in &mut self.cols {
            col.spacing = clamp_u32(spacing);
        }
    }

    pub fn set_row_spacing(&mut self, spacing: u32) {
        self.row_spacing = spacing;
        for row in &mut self.rows {
            row.spacing = clamp_u32(spacing);
        }
    }

    /// Gap after one column only.
    pub fn set_col_spacing_at(&mut self, col: usize, spacing: u32) {
        if let Some(line) = self.cols.get_mut(col) {
            line.spacing = clamp_u32(spacing);
        }
    }

    pub fn set_row_spacing_at(&mut self, row: usize, spacing: u32) {
        if let Some(line) = self.rows.get_mut(row) {
            line.spacing = clamp_u32(spacing);
        }
    }

    pub fn set_auto_flow(&mut self, orientation: Option<Orientation>) {
        self.auto_flow = orientation;
    }

    pub fn is_homogeneous(&self) -> bool {
        self.homogeneous
    }

    pub fn cols(&self) -> &[RowCol] {
        &self.cols
    }

    pub fn rows(&self) -> &[RowCol] {
        &self.rows
    }

    fn lines(&self, axis: Axis) -> &[RowCol] {
        match axis {
            Axis::Cols => &self.cols,
            Axis::Rows => &self.rows,
        }
    }

    fn lines_mut(&mut self, axis: Axis) -> &mut Vec<RowCol> {
        match axis {
            Axis::Cols => &mut self.cols,
            Axis::Rows => &mut self.rows,
        }
    }

    fn default_spacing(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Cols => self.col_spacing,
            Axis::Rows => self.row_spacing,
        }
    }

    // =========================================================================
    // Sizing passes
    // =========================================================================

    fn size_init(&mut self, children: &[ChildInfo]) {
        for axis in [Axis::Cols, Axis::Rows] {
            let needed = children
                .iter()
                .map(|c| c.span(axis).end)
                .max()
                .unwrap_or(1);
            let spacing = self.default_spacing(axis);
            let lines = self.lines_mut(axis);
            if lines.len() < needed {
                lines.resize(needed, RowCol::with_spacing(spacing));
            }
            for line in lines.iter_mut() {
                line.requisition = 0;
                line.expand = false;
            }
            for child in children {
                if child.is_single(axis) && child.expand(axis) {
                    lines[child.span(axis).start].expand = true;
                }
            }
        }
    }

    fn size_pass1(&mut self, axis: Axis, children: &[ChildInfo]) {
        let lines = self.lines_mut(axis);
        for child in children.iter().filter(|c| c.is_single(axis)) {
            let line = &mut lines[child.span(axis).start];
            line.requisition = line.requisition.max(child.needed(axis));
        }
    }

    fn size_pass2(&mut self) {
        if !self.homogeneous {
            return;
        }
        for axis in [Axis::Cols, Axis::Rows] {
            let lines = self.lines_mut(axis);
            let max = lines.iter().map(|l| l.requisition).max().unwrap_or(0);
            for line in lines.iter_mut() {
                line.requisition = max;
            }
        }
    }

    fn size_pass3(&mut self, axis: Axis, children: &[ChildInfo]) {
        let lines = self.lines_mut(axis);
        for child in children.iter().filter(|c| !c.is_single(axis)) {
            let span = child.span(axis);
            let have = span_extent(&lines[span.clone()], |l| l.requisition);
            let needed = child.needed(axis);
            if have >= needed {
                continue;
            }

            let mut shortfall = needed - have;
            let n_expand = lines[span.clone()].iter().filter(|l| l.expand).count();
            let force = n_expand == 0;
            let mut remaining = if force { span.len() } else { n_expand } as i32;

            for line in &mut lines[span] {
                if force || line.expand {
                    let share = ceil_div(shortfall.into(), remaining.into()) as i32;
                    line.requisition = line.requisition.saturating_add(share);
                    shortfall -= share;
                    remaining -= 1;
                }
            }
        }
    }

    // =========================================================================
    // Allocation passes
    // =========================================================================

    fn allocate_init(&mut self, axis: Axis, children: &[ChildInfo]) {
        let lines = self.lines_mut(axis);
        for line in lines.iter_mut() {
            line.allocation = line.requisition;
            line.need_expand = false;
            line.need_shrink = true;
            line.expand = false;
            line.shrink = true;
            line.empty = true;
        }

        for child in children.iter().filter(|c| c.is_single(axis)) {
            let line = &mut lines[child.span(axis).start];
            if child.expand(axis) {
                line.expand = true;
            }
            if !child.shrink(axis) {
                line.shrink = false;
            }
            line.empty = false;
        }

        for child in children.iter().filter(|c| !c.is_single(axis)) {
            let spanned = &mut lines[child.span(axis)];
            for line in spanned.iter_mut() {
                line.empty = false;
            }
            if child.expand(axis) && !spanned.iter().any(|l| l.expand) {
                for line in spanned.iter_mut() {
                    line.need_expand = true;
                }
            }
            if !child.shrink(axis) && spanned.iter().all(|l| l.shrink) {
                for line in spanned.iter_mut() {
                    line.need_shrink = false;
                }
            }
        }

        for line in lines.iter_mut() {
            if line.empty {
                line.expand = false;
                line.shrink = false;
            } else {
                if line.need_expand {
                    line.expand = true;
                }
                if !line.need_shrink {
                    line.shrink = false;
                }
            }
        }
    }

    fn allocate_pass1(&mut self, axis: Axis, target: i32) {
        let homogeneous = self.homogeneous;
        let lines = self.lines_mut(axis);
        let n = lines.len();
        let requested = span_extent(lines, |l| l.requisition);

        if homogeneous && target >= requested {
            let spacing = span_extent(lines, |_| 0);
            let mut width = target - spacing;
            for (i, line) in lines.iter_mut().enumerate() {
                let extra = width / (n - i) as i32;
                line.allocation = extra;
                width -= extra;
            }
            return;
        }

        if target > requested {
            let mut surplus = target - requested;
            let mut n_expand = lines.iter().filter(|l| l.expand).count() as i32;
            for i in centered_order(n) {
                if n_expand == 0 {
                    break;
                }
                let line = &mut lines[i];
                if line.expand {
                    let share = ceil_div(surplus.into(), n_expand.into()) as i32;
                    line.allocation = line.allocation.saturating_add(share);
                    surplus -= share;
                    n_expand -= 1;
                }
            }
            return;
        }

        let mut deficit = requested - target;
        if deficit <= 0 {
            return;
        }

        // Shrinkable lines first, never below one pixel.
        let mut total_shrink = lines.iter().filter(|l| l.shrink).count() as i32;
        while total_shrink > 0 && deficit > 0 {
            let mut n_shrink = total_shrink;
            for i in centered_order(n) {
                let line = &mut lines[i];
                if !line.shrink {
                    continue;
                }
                let before = line.allocation;
                let cut = ceil_div(deficit.into(), n_shrink.max(1).into()) as i32;
                line.allocation = (before - cut).max(1);
                deficit -= before - line.allocation;
                n_shrink -= 1;
                if line.allocation < 2 {
                    total_shrink -= 1;
                    line.shrink = false;
                }
            }
        }

        // Whatever is left comes off every line, largest first.
        if deficit > 0 {
            let mut order: Vec<usize> = centered_order(n).collect();
            order.sort_by(|a, b| lines[*b].allocation.cmp(&lines[*a].allocation));
            let total: i64 = lines.iter().map(|l| i64::from(l.allocation)).sum();
            if total > 0 {
                let owed = i64::from(deficit);
                for i in order {
                    if deficit == 0 {
                        break;
                    }
                    let line = &mut lines[i];
                    let share = ceil_div(owed * i64::from(line.allocation), total) as i32;
                    let cut = share.min(deficit).min(line.allocation);
                    line.allocation -= cut;
                    deficit -= cut;
                }
            }
        }
        trace!(?axis, target, requested, deficit, "table lines shrunk");
    }

    fn allocate_pass2(
        &self,
        tree: &mut Tree,
        children: &[(NodeId, ChildInfo)],
        area: Allocation,
    ) -> Result<()> {
        for (child, info) in children {
            let (x, width) = self.slot(Axis::Cols, info, area.x);
            let (y, height) = self.slot(Axis::Rows, info, area.y);
            place_child(tree, *child, Allocation::new(x, y, width, height), &area)?;
        }
        Ok(())
    }

    /// Offset and extent of the lines a child spans.
    fn slot(&self, axis: Axis, info: &ChildInfo, origin: i32) -> (i32, i32) {
        let lines = self.lines(axis);
        let span = info.span(axis);
        let offset = lines[..span.start]
            .iter()
            .map(|l| l.allocation.saturating_add(l.spacing))
            .fold(0, i32::saturating_add);
        let extent = span_extent(&lines[span], |l| l.allocation);
        (origin.saturating_add(offset), extent)
    }

    // =========================================================================
    // Auto flow
    // =========================================================================

    fn flow_added(&self, tree: &mut Tree, id: NodeId, child: NodeId) {
        let Some(orientation) = self.auto_flow else {
            return;
        };
        let next = tree
            .local_children(id)
            .filter(|c| *c != child)
            .map(|c| {
                let pack = tree.pack(c);
                match orientation {
                    Orientation::Horizontal => pack.right_attach,
                    Orientation::Vertical => pack.bottom_attach,
                }
            })
            .max()
            .unwrap_or(0);

        let pack = tree.pack(child);
        let pack = match orientation {
            Orientation::Horizontal => pack.span(next, next + pack.hspan(), 0, pack.vspan()),
            Orientation::Vertical => pack.span(0, pack.hspan(), next, next + pack.vspan()),
        };
        tree.replace_pack(child, pack);
    }

    /// Close the gap left by a removed child and drop the lines past the
    /// last one still attached.
    fn flow_removed(&mut self, tree: &mut Tree, id: NodeId, child: NodeId) {
        let Some(orientation) = self.auto_flow else {
            return;
        };
        let removed = tree.pack(child);
        let (start, width) = match orientation {
            Orientation::Horizontal => (removed.left_attach, removed.hspan()),
            Orientation::Vertical => (removed.top_attach, removed.vspan()),
        };

        let siblings: Vec<NodeId> = tree.local_children(id).collect();
        for sibling in siblings {
            let pack = tree.pack(sibling);
            let shifted = match orientation {
                Orientation::Horizontal if pack.left_attach >= start + width => pack.span(
                    pack.left_attach - width,
                    pack.right_attach - width,
                    pack.top_attach,
                    pack.bottom_attach,
                ),
                Orientation::Vertical if pack.top_attach >= start + width => pack.span(
                    pack.left_attach,
                    pack.right_attach,
                    pack.top_attach - width,
                    pack.bottom_attach - width,
                ),
                _ => continue,
            };
            tree.replace_pack(sibling, shifted);
        }

        let used = tree
            .local_children(id)
            .map(|c| {
                let pack = tree.pack(c);
                let end = match orientation {
                    Orientation::Horizontal => pack.right_attach,
                    Orientation::Vertical => pack.bottom_attach,
                };
                end as usize
            })
            .max()
            .unwrap_or(1);
        let axis = match orientation {
            Orientation::Horizontal => Axis::Cols,
            Orientation::Vertical => Axis::Rows,
        };
        self.lines_mut(axis).truncate(used.max(1));
    }
}

// =============================================================================
// Widget
// =============================================================================

impl Measurable for Table {
    fn measure(&mut self, tree: &mut Tree, id: NodeId) -> Requisition {
        let children: Vec<ChildInfo> = visible_children(tree, id)
            .into_iter()
            .map(|child| ChildInfo::gather(tree, child))
            .collect();
        tree.update_spread_container(id);

        self.size_init(&children);
        self.size_pass1(Axis::Cols, &children);
        self.size_pass1(Axis::Rows, &children);
        self.size_pass2();
        self.size_pass3(Axis::Cols, &children);
        self.size_pass3(Axis::Rows, &children);
        self.size_pass2();

        Requisition {
            width: span_extent(&self.cols, |l| l.requisition) as f32,
            height: span_extent(&self.rows, |l| l.requisition) as f32,
        }
    }
}

impl Allocatable for Table {
    fn allocate(&mut self, tree: &mut Tree, id: NodeId, area: Allocation) -> Result<()> {
        let children: Vec<(NodeId, ChildInfo)> = visible_children(tree, id)
            .into_iter()
            .map(|child| (child, ChildInfo::gather(tree, child)))
            .collect();
        let infos: Vec<ChildInfo> = children.iter().map(|(_, info)| *info).collect();

        self.allocate_init(Axis::Cols, &infos);
        self.allocate_init(Axis::Rows, &infos);
        self.allocate_pass1(Axis::Cols, area.width);
        self.allocate_pass1(Axis::Rows, area.height);
        self.allocate_pass2(tree, &children, area)
    }
}

impl Widget for Table {
    fn name(&self) -> &str {
        "table"
    }

    fn composition(&self) -> Composition {
        Composition::Multi
    }

    fn repack(&mut self, tree: &mut Tree, id: NodeId, child: NodeId, change: Repack) {
        match change {
            Repack::Added => self.flow_added(tree, id, child),
            Repack::Removed => self.flow_removed(tree, id, child),
            Repack::Changed => {}
        }
    }
}
