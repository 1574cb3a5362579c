//! End-to-end checks of the negotiation protocol through the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_layout::{
    Allocatable, Allocation, Area, Bin, FocusDirection, LinkId, Measurable, NodeFlags, NodeId,
    Overlap, PackInfo, Requisition, Result, Spacer, Table, Tree, TreeError, Widget,
};

/// Leaf that counts measurements and invalidates a sibling from inside
/// its own measure callback.
struct Gauge {
    size: Requisition,
    measured: Rc<Cell<u32>>,
    poke: Option<NodeId>,
}

impl Measurable for Gauge {
    fn measure(&mut self, tree: &mut Tree, _id: NodeId) -> Requisition {
        self.measured.set(self.measured.get() + 1);
        if let Some(other) = self.poke {
            tree.invalidate(other);
        }
        self.size
    }
}

impl Allocatable for Gauge {
    fn allocate(&mut self, _tree: &mut Tree, _id: NodeId, _area: Allocation) -> Result<()> {
        Ok(())
    }
}

impl Widget for Gauge {
    fn name(&self) -> &str {
        "gauge"
    }
}

fn gauge(tree: &mut Tree, width: f32, height: f32) -> (NodeId, Rc<Cell<u32>>) {
    let measured = Rc::new(Cell::new(0));
    let id = tree.create(Gauge {
        size: Requisition { width, height },
        measured: measured.clone(),
        poke: None,
    });
    (id, measured)
}

fn col_widths(tree: &Tree, table: NodeId) -> Vec<i32> {
    tree.widget::<Table>(table)
        .unwrap()
        .cols()
        .iter()
        .map(|c| c.allocation)
        .collect()
}

#[test]
fn size_request_measures_once() {
    let mut tree = Tree::new();
    let root = tree.create(Table::new());
    let (leaf, measured) = gauge(&mut tree, 3.0, 2.0);
    tree.add(root, leaf).unwrap();

    let first = tree.size_request(root);
    let second = tree.size_request(root);
    assert_eq!(first, second);
    assert_eq!(measured.get(), 1);
}

#[test]
fn invalidating_dirty_node_does_not_propagate() {
    let mut tree = Tree::new();
    let root = tree.create(Bin::new());
    let (leaf, _) = gauge(&mut tree, 1.0, 1.0);
    tree.add(root, leaf).unwrap();
    tree.layout(root, Area::new(0.0, 0.0, 4.0, 4.0)).unwrap();

    let root_hits = Rc::new(Cell::new(0));
    let hits = root_hits.clone();
    tree.on_invalidate(root, move |_| hits.set(hits.get() + 1));

    tree.invalidate(leaf);
    tree.invalidate(leaf);
    tree.invalidate(leaf);
    assert_eq!(root_hits.get(), 1);
}

#[test]
fn measure_may_invalidate_without_looping() {
    let mut tree = Tree::new();
    let root = tree.create(Overlap::new());
    let (other, _) = gauge(&mut tree, 1.0, 1.0);
    let measured = Rc::new(Cell::new(0));
    let poker = tree.create(Gauge {
        size: Requisition { width: 2.0, height: 2.0 },
        measured: measured.clone(),
        poke: Some(other),
    });
    tree.add(root, other).unwrap();
    tree.add(root, poker).unwrap();

    let req = tree.size_request(root);
    assert_eq!(req, Requisition { width: 2.0, height: 2.0 });
    assert_eq!(measured.get(), 1);
}

#[test]
fn homogeneous_table_round_trip() {
    let mut tree = Tree::new();
    let spacing = 1;
    let table = tree.create(
        Table::new()
            .homogeneous(true)
            .col_spacing(spacing)
            .row_spacing(spacing),
    );
    let mut cells = Vec::new();
    for row in 0..3 {
        for col in 0..3 {
            let cell = tree.create(Spacer::new(10.0, 10.0));
            tree.add(table, cell).unwrap();
            tree.set_pack(cell, PackInfo::cell(col, row));
            cells.push(cell);
        }
    }

    let req = tree.size_request(table);
    let expected = 30.0 + 2.0 * spacing as f32;
    assert_eq!(req, Requisition { width: expected, height: expected });

    tree.set_allocation(table, Area::new(0.0, 0.0, expected as f64, expected as f64))
        .unwrap();
    for cell in cells {
        let a = tree.allocation(cell);
        assert_eq!((a.width, a.height), (10, 10));
    }
}

#[test]
fn surplus_lands_on_the_only_expanding_column() {
    let mut tree = Tree::new();
    let table = tree.create(Table::new());
    for col in 0..5 {
        let cell = tree.create(Spacer::new(8.0, 1.0));
        tree.add(table, cell).unwrap();
        tree.set_pack(cell, PackInfo::cell(col, 0).expand(col == 2, false));
    }

    let req = tree.size_request(table);
    tree.set_allocation(table, Area::new(0.0, 0.0, req.width as f64 + 12.0, 1.0))
        .unwrap();
    assert_eq!(col_widths(&tree, table), vec![8, 8, 20, 8, 8]);
}

#[test]
fn shrinking_keeps_every_column_visible() {
    let mut tree = Tree::new();
    let table = tree.create(Table::new());
    for col in 0..3 {
        let cell = tree.create(Spacer::new(10.0, 1.0));
        tree.add(table, cell).unwrap();
        tree.set_pack(cell, PackInfo::cell(col, 0).shrink(true, false));
    }

    tree.layout(table, Area::new(0.0, 0.0, 21.0, 1.0)).unwrap();
    let widths = col_widths(&tree, table);
    assert!(widths.iter().all(|w| *w >= 1));
    assert_eq!(widths.iter().sum::<i32>(), 21);
}

#[test]
fn middle_column_takes_the_slack() {
    let mut tree = Tree::new();
    let table = tree.create(Table::new());
    let sizes = [10.0, 20.0, 10.0];
    let cells: Vec<NodeId> = sizes
        .iter()
        .enumerate()
        .map(|(col, width)| {
            let cell = tree.create(Spacer::new(*width, 1.0));
            tree.add(table, cell).unwrap();
            tree.set_pack(cell, PackInfo::cell(col as u32, 0).expand(col == 1, false));
            cell
        })
        .collect();

    tree.layout(table, Area::new(0.0, 0.0, 60.0, 1.0)).unwrap();
    let widths: Vec<i32> = cells.iter().map(|c| tree.allocation(*c).width).collect();
    assert_eq!(widths, vec![10, 40, 10]);
}

#[test]
fn spreading_child_expands_through_nested_containers() {
    let mut tree = Tree::new();
    let table = tree.create(Table::new());
    let fixed = tree.create(Spacer::new(10.0, 1.0));
    let bin = tree.create(Bin::new());
    let spread = tree.create(Spacer::new(10.0, 1.0));
    tree.add(bin, spread).unwrap();
    tree.add(table, fixed).unwrap();
    tree.add(table, bin).unwrap();
    tree.set_pack(bin, PackInfo::cell(1, 0));
    tree.set_hspread(spread, true);

    tree.layout(table, Area::new(0.0, 0.0, 30.0, 1.0)).unwrap();
    assert!(tree.flags(bin).contains(NodeFlags::HSPREAD_CONTAINER));
    assert_eq!(tree.allocation(fixed).width, 10);
    assert_eq!(tree.allocation(spread), Allocation::new(10, 0, 20, 1));
}

#[test]
fn add_remove_restores_detached_state() {
    let mut tree = Tree::new();
    let single = tree.create(Bin::new());
    let x = tree.create(Spacer::new(1.0, 1.0));
    tree.add(single, x).unwrap();
    tree.remove(x).unwrap();
    assert!(!tree.has_children(single));
    assert_eq!(tree.parent(x), None);

    let multi = tree.create(Overlap::new());
    let y = tree.create(Spacer::new(1.0, 1.0));
    let z = tree.create(Spacer::new(1.0, 1.0));
    tree.add(multi, x).unwrap();
    tree.add(multi, y).unwrap();
    tree.add(multi, z).unwrap();
    tree.remove(x).unwrap();
    assert_eq!(tree.local_children(multi).collect::<Vec<_>>(), vec![y, z]);

    assert_eq!(tree.destroy(y), Err(TreeError::StillAttached(y)));
    tree.destroy(multi).unwrap();
    assert!(!tree.contains(y));
}

#[test]
fn crosslink_callbacks_unlink_reentrantly() {
    let mut tree = Tree::new();
    let root = tree.create(Overlap::new());
    let a = tree.create(Spacer::new(1.0, 1.0));
    let b = tree.create(Spacer::new(1.0, 1.0));
    let c = tree.create(Spacer::new(1.0, 1.0));
    for id in [a, b, c] {
        tree.add(root, id).unwrap();
    }

    let calls = Rc::new(RefCell::new(Vec::new()));

    // Fires on removal of a unless unlinked first.
    let log = calls.clone();
    let (_, sibling) = tree
        .cross_link(a, c, move |_, _, _| log.borrow_mut().push("sibling"))
        .unwrap();

    let log = calls.clone();
    let me: Rc<Cell<Option<LinkId>>> = Rc::new(Cell::new(None));
    let handle = me.clone();
    let (_, link) = tree
        .cross_link(a, b, move |tree, owner, target| {
            log.borrow_mut().push("self");
            tree.unlink(root, owner, target, handle.get().unwrap()).unwrap();
            tree.unlink(root, owner, c, sibling).unwrap();
        })
        .unwrap();
    me.set(Some(link));

    let (_, survivor) = tree.cross_link(b, c, |_, _, _| {}).unwrap();

    tree.remove(a).unwrap();
    assert_eq!(*calls.borrow(), vec!["self"]);
    assert_eq!(tree.link_count(root), 1);
    assert_eq!(tree.unlink(root, b, c, survivor), Ok(()));
}

#[test]
fn focus_right_moves_one_step() {
    let mut tree = Tree::new();
    let root = tree.create(Table::new().col_spacing(2));
    let items: Vec<NodeId> = (0..3)
        .map(|col| {
            let id = tree.create(Spacer::new(5.0, 1.0).focusable(true));
            tree.add(root, id).unwrap();
            tree.set_pack(id, PackInfo::cell(col, 0));
            id
        })
        .collect();
    tree.layout(root, Area::new(0.0, 0.0, 19.0, 1.0)).unwrap();

    tree.grab_focus(items[0]).unwrap();
    assert!(tree.move_focus(root, FocusDirection::Right));
    assert_eq!(tree.focused(), Some(items[1]));
    assert!(tree.move_focus(root, FocusDirection::Right));
    assert_eq!(tree.focused(), Some(items[2]));
    assert!(!tree.move_focus(root, FocusDirection::Right));
}

#[test]
fn repaint_hook_sees_moves() {
    let mut tree = Tree::new();
    let exposed = Rc::new(RefCell::new(Vec::new()));
    let sink = exposed.clone();
    tree.set_repaint_hook(move |region: Allocation| sink.borrow_mut().push(region));

    let table = tree.create(Table::new());
    let cell = tree.create(Spacer::new(4.0, 1.0));
    tree.add(table, cell).unwrap();
    tree.layout(table, Area::new(0.0, 0.0, 4.0, 1.0)).unwrap();
    assert!(exposed.borrow().contains(&Allocation::new(0, 0, 4, 1)));

    exposed.borrow_mut().clear();
    tree.layout(table, Area::new(0.0, 0.0, 4.0, 1.0)).unwrap();
    assert!(exposed.borrow().is_empty());
}
