//! Widget arena.
//!
//! Widgets refer to each other by [`WidgetId`]. The tree owns every widget;
//! mouse capture and focus are plain ids that are cleared whenever the
//! widget they name is removed.

use std::collections::HashMap;

use farsight_shared::{FarsightError, FarsightResult, WidgetType};
use tracing::debug;

use super::{Widget, WidgetId};

/// Owns the widget hierarchy of one session.
#[derive(Debug)]
pub struct WidgetTree {
    widgets: HashMap<WidgetId, Widget>,
    root: Option<WidgetId>,
    next_id: u64,
    mouse_capture: Option<WidgetId>,
    mouse_focus: Option<WidgetId>,
    keyboard_focus: Option<WidgetId>,
}

impl WidgetTree {
    /// Creates a new empty widget tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            widgets: HashMap::with_capacity(256),
            root: None,
            next_id: 1,
            mouse_capture: None,
            mouse_focus: None,
            keyboard_focus: None,
        }
    }

    /// Creates a detached widget with the defaults of its kind.
    pub fn create(&mut self, kind: WidgetType) -> WidgetId {
        let id = WidgetId::new(self.next_id);
        self.next_id += 1;
        self.widgets.insert(id, Widget::new(id, kind));
        id
    }

    /// Appends `child` to `parent`'s children.
    pub fn append_child(&mut self, parent: WidgetId, child: WidgetId) {
        if !self.widgets.contains_key(&child) {
            return;
        }
        if let Some(widget) = self.widgets.get_mut(&parent) {
            widget.children.push(child);
        } else {
            return;
        }
        if let Some(widget) = self.widgets.get_mut(&child) {
            widget.parent = Some(parent);
        }
    }

    /// Puts `child` at `index` of `parent`, removing whatever subtree was there.
    ///
    /// An index past the end appends.
    pub fn replace_child(&mut self, parent: WidgetId, index: usize, child: WidgetId) {
        let old = self
            .widgets
            .get(&parent)
            .and_then(|widget| widget.children.get(index).copied());
        match old {
            Some(old) => {
                self.remove(old);
                if let Some(widget) = self.widgets.get_mut(&parent) {
                    let at = index.min(widget.children.len());
                    widget.children.insert(at, child);
                }
                if let Some(widget) = self.widgets.get_mut(&child) {
                    widget.parent = Some(parent);
                }
            }
            None => self.append_child(parent, child),
        }
    }

    /// Removes children of `parent` from `len` onwards.
    pub fn truncate_children(&mut self, parent: WidgetId, len: usize) {
        let extra: Vec<WidgetId> = self
            .widgets
            .get(&parent)
            .map(|widget| widget.children.iter().skip(len).copied().collect())
            .unwrap_or_default();
        for child in extra {
            self.remove(child);
        }
    }

    /// Removes a widget and all its children.
    pub fn remove(&mut self, id: WidgetId) {
        let Some(widget) = self.widgets.remove(&id) else {
            return;
        };
        for child in widget.children {
            self.remove_detached(child);
        }
        if let Some(parent) = widget.parent.and_then(|parent| self.widgets.get_mut(&parent)) {
            parent.children.retain(|&c| c != id);
        }
        self.forget(id);
    }

    fn remove_detached(&mut self, id: WidgetId) {
        if let Some(widget) = self.widgets.remove(&id) {
            for child in widget.children {
                self.remove_detached(child);
            }
        }
        self.forget(id);
    }

    fn forget(&mut self, id: WidgetId) {
        if self.root == Some(id) {
            self.root = None;
        }
        if self.mouse_capture == Some(id) {
            debug!("Capturing {id} destroyed, capture released");
            self.mouse_capture = None;
        }
        if self.mouse_focus == Some(id) {
            self.mouse_focus = None;
        }
        if self.keyboard_focus == Some(id) {
            self.keyboard_focus = None;
        }
    }

    /// Replaces the root, discarding the old tree.
    pub fn set_root(&mut self, root: Option<WidgetId>) {
        if let Some(old) = self.root {
            if Some(old) != root {
                self.remove(old);
            }
        }
        self.root = root;
    }

    /// Discards every widget.
    pub fn clear(&mut self) {
        self.widgets.clear();
        self.root = None;
        self.mouse_capture = None;
        self.mouse_focus = None;
        self.keyboard_focus = None;
    }

    /// The root widget.
    #[must_use]
    pub const fn root(&self) -> Option<WidgetId> {
        self.root
    }

    /// Gets a widget by ID.
    #[must_use]
    pub fn get(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.get(&id)
    }

    /// Gets mutable access to a widget.
    #[must_use]
    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.widgets.get_mut(&id)
    }

    /// Returns true if the widget exists.
    #[must_use]
    pub fn contains(&self, id: WidgetId) -> bool {
        self.widgets.contains_key(&id)
    }

    /// Returns the children of a widget.
    #[must_use]
    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.widgets.get(&id).map_or(&[][..], |widget| widget.children.as_slice())
    }

    /// Number of widgets, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Returns true if there are no widgets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Gives `id` exclusive mouse input until released.
    ///
    /// # Errors
    ///
    /// `AlreadyCaptured` if a different widget holds the capture.
    pub fn capture_mouse(&mut self, id: WidgetId) -> FarsightResult<()> {
        match self.mouse_capture {
            Some(holder) if holder != id => Err(FarsightError::AlreadyCaptured),
            _ => {
                self.mouse_capture = Some(id);
                Ok(())
            }
        }
    }

    /// Releases the mouse capture, whoever holds it.
    pub fn release_mouse(&mut self) {
        self.mouse_capture = None;
    }

    /// Widget holding the mouse capture.
    #[must_use]
    pub const fn mouse_capture(&self) -> Option<WidgetId> {
        self.mouse_capture
    }

    /// Returns true if `id` holds the mouse capture.
    #[must_use]
    pub fn has_mouse_captured(&self, id: WidgetId) -> bool {
        self.mouse_capture == Some(id)
    }

    /// Widget under the pointer that last received input.
    #[must_use]
    pub const fn mouse_focus(&self) -> Option<WidgetId> {
        self.mouse_focus
    }

    /// Sets the mouse focus.
    pub fn set_mouse_focus(&mut self, id: Option<WidgetId>) {
        self.mouse_focus = id.filter(|id| self.widgets.contains_key(id));
    }

    /// Widget receiving keyboard input.
    #[must_use]
    pub const fn keyboard_focus(&self) -> Option<WidgetId> {
        self.keyboard_focus
    }

    /// Sets the keyboard focus.
    pub fn set_keyboard_focus(&mut self, id: Option<WidgetId>) {
        self.keyboard_focus = id.filter(|id| self.widgets.contains_key(id));
    }

    /// Returns the widgets under the root in depth-first order.
    pub fn iter_dfs(&self) -> impl Iterator<Item = WidgetId> + '_ {
        WidgetDfsIterator {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first iterator over widget tree.
struct WidgetDfsIterator<'a> {
    tree: &'a WidgetTree,
    stack: Vec<WidgetId>,
}

impl Iterator for WidgetDfsIterator<'_> {
    type Item = WidgetId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        // Reverse push keeps siblings left to right.
        self.stack.extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (WidgetTree, WidgetId, WidgetId, WidgetId) {
        let mut tree = WidgetTree::new();
        let root = tree.create(WidgetType::Stack);
        let a = tree.create(WidgetType::Button);
        let b = tree.create(WidgetType::Label);
        tree.append_child(root, a);
        tree.append_child(a, b);
        tree.set_root(Some(root));
        (tree, root, a, b)
    }

    #[test]
    fn test_tree_hierarchy() {
        let (tree, root, a, b) = sample();
        assert_eq!(tree.children(root), &[a]);
        assert_eq!(tree.get(b).unwrap().parent(), Some(a));
        assert_eq!(tree.iter_dfs().collect::<Vec<_>>(), vec![root, a, b]);
    }

    #[test]
    fn test_remove_clears_capture_and_focus() {
        let (mut tree, root, a, b) = sample();
        tree.capture_mouse(b).unwrap();
        tree.set_mouse_focus(Some(b));
        tree.set_keyboard_focus(Some(a));

        tree.remove(a);
        assert!(tree.children(root).is_empty());
        assert!(!tree.contains(b));
        assert_eq!(tree.mouse_capture(), None);
        assert_eq!(tree.mouse_focus(), None);
        assert_eq!(tree.keyboard_focus(), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_second_capture_rejected() {
        let (mut tree, _, a, b) = sample();
        tree.capture_mouse(a).unwrap();
        tree.capture_mouse(a).unwrap();
        assert_eq!(tree.capture_mouse(b), Err(FarsightError::AlreadyCaptured));
        tree.release_mouse();
        tree.capture_mouse(b).unwrap();
        assert!(tree.has_mouse_captured(b));
    }

    #[test]
    fn test_replace_root_discards_old_tree() {
        let (mut tree, _, _, _) = sample();
        let fresh = tree.create(WidgetType::Panel);
        tree.set_root(Some(fresh));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), Some(fresh));
    }

    #[test]
    fn test_replace_and_truncate_children() {
        let (mut tree, root, a, _) = sample();
        let c = tree.create(WidgetType::Spacer);
        tree.replace_child(root, 0, c);
        assert!(!tree.contains(a));
        assert_eq!(tree.children(root), &[c]);

        let d = tree.create(WidgetType::Spacer);
        tree.replace_child(root, 5, d);
        assert_eq!(tree.children(root), &[c, d]);

        tree.truncate_children(root, 1);
        assert_eq!(tree.children(root), &[c]);
    }
}
