//! Key mapping - crossterm key events to focus moves.
//!
//! Only the mapping lives here; reading events from the terminal is left to
//! the application.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::focus::FocusDirection;
use crate::engine::Tree;
use crate::types::NodeId;

impl FocusDirection {
    /// Focus move bound to a key, if any. Key releases never move focus.
    pub fn from_key_event(event: &KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        match event.code {
            KeyCode::Tab if event.modifiers.contains(KeyModifiers::SHIFT) => Some(Self::Prev),
            KeyCode::Tab => Some(Self::Next),
            KeyCode::BackTab => Some(Self::Prev),
            KeyCode::Up => Some(Self::Up),
            KeyCode::Down => Some(Self::Down),
            KeyCode::Left => Some(Self::Left),
            KeyCode::Right => Some(Self::Right),
            _ => None,
        }
    }
}

impl Tree {
    /// Apply the focus move bound to `event` below `root`.
    ///
    /// Tab and Shift+Tab wrap around; arrows stop at the edge. Returns true
    /// when focus moved.
    pub fn move_focus_for_key(&mut self, root: NodeId, event: &KeyEvent) -> bool {
        match FocusDirection::from_key_event(event) {
            Some(direction) if direction.is_sequential() => self.cycle_focus(root, direction),
            Some(direction) => self.move_focus(root, direction),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Spacer, Table};
    use crate::types::{Area, PackInfo};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_key_mapping() {
        let none = KeyModifiers::NONE;
        assert_eq!(FocusDirection::from_key_event(&key(KeyCode::Tab, none)), Some(FocusDirection::Next));
        assert_eq!(
            FocusDirection::from_key_event(&key(KeyCode::Tab, KeyModifiers::SHIFT)),
            Some(FocusDirection::Prev)
        );
        assert_eq!(FocusDirection::from_key_event(&key(KeyCode::BackTab, KeyModifiers::SHIFT)), Some(FocusDirection::Prev));
        assert_eq!(FocusDirection::from_key_event(&key(KeyCode::Up, none)), Some(FocusDirection::Up));
        assert_eq!(FocusDirection::from_key_event(&key(KeyCode::Char('x'), none)), None);

        let mut release = key(KeyCode::Tab, none);
        release.kind = KeyEventKind::Release;
        assert_eq!(FocusDirection::from_key_event(&release), None);
    }

    #[test]
    fn test_tab_cycles_through_table() {
        let mut tree = Tree::new();
        let root = tree.create(Table::new());
        let a = tree.create(Spacer::new(2.0, 1.0).focusable(true));
        let b = tree.create(Spacer::new(2.0, 1.0).focusable(true));
        tree.add(root, a).unwrap();
        tree.add(root, b).unwrap();
        tree.set_pack(b, PackInfo::cell(1, 0));
        tree.layout(root, Area::new(0.0, 0.0, 4.0, 1.0)).unwrap();

        let tab = key(KeyCode::Tab, KeyModifiers::NONE);
        assert!(tree.move_focus_for_key(root, &tab));
        assert_eq!(tree.focused(), Some(a));
        assert!(tree.move_focus_for_key(root, &tab));
        assert_eq!(tree.focused(), Some(b));
        assert!(tree.move_focus_for_key(root, &tab));
        assert_eq!(tree.focused(), Some(a));

        let left = key(KeyCode::Left, KeyModifiers::NONE);
        assert!(!tree.move_focus_for_key(root, &left));
    }
}
