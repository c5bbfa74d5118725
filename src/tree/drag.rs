//! Drag-and-drop and interactive resizing.
//!
//! Both are short-lived transient state. Pointer events arrive from the shell as plain
//! coordinates along the relevant axis.

use tiled_ipc::DropPosition;

use super::ops::DropTarget;
use super::AppState;

/// Resize gesture in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeItem {
    pub id: String,
    /// Whether the item is resized along the vertical axis (changing its height).
    pub vertical: bool,
    /// Pointer coordinate when the gesture started.
    pub start_pos: f64,
    /// Item size when the gesture started.
    pub start_size: f64,
}

/// Side of a sibling that a pointer at `pointer` drops on.
///
/// `start` and `extent` describe the sibling along its parent's layout axis. Anything past the
/// midpoint drops after it.
pub fn drop_position(pointer: f64, start: f64, extent: f64) -> DropPosition {
    if pointer - start > extent / 2. {
        DropPosition::After
    } else {
        DropPosition::Before
    }
}

/// One drop of a dragged item.
///
/// The shell offers the drop to every target under the pointer, innermost first. Only the
/// first target acts; the ones containing it see the drop as already handled.
#[derive(Debug)]
pub struct DropHandler {
    dragged: String,
    handled: bool,
}

impl DropHandler {
    pub fn new(dragged: String) -> Self {
        Self {
            dragged,
            handled: false,
        }
    }

    pub fn dragged(&self) -> &str {
        &self.dragged
    }

    /// Whether a nested target already took the drop.
    pub fn did_drop(&self) -> bool {
        self.handled
    }

    /// Offers the drop to `target`, returning whether the tree changed.
    ///
    /// The first offer consumes the drop even when it turns out to be a no-op, such as
    /// dropping an item onto itself.
    pub fn offer(&mut self, state: &mut AppState, target: DropTarget) -> bool {
        if self.handled {
            return false;
        }
        self.handled = true;
        state.move_item(&self.dragged, &target)
    }

    /// Ends the drag regardless of whether any target took it.
    pub fn finish(self, state: &mut AppState) {
        if !self.handled {
            debug!("drag of {} ended without a drop", self.dragged());
        }
        state.end_drag();
    }
}

impl AppState {
    pub fn begin_drag(&mut self, id: &str) {
        if !self.index.contains(id) {
            return;
        }
        self.drag_item = Some(id.to_owned());
        self.commit();
    }

    pub fn end_drag(&mut self) {
        self.drag_item = None;
        self.commit();
    }

    /// Starts resizing an item from its trailing edge.
    pub fn begin_resize(&mut self, id: &str, pointer: f64, start_size: f64) -> bool {
        if !self.is_resizable(id) {
            return false;
        }
        let Some(vertical) = self.parent_vertical(id) else {
            return false;
        };

        self.resize_item = Some(ResizeItem {
            id: id.to_owned(),
            vertical,
            start_pos: pointer,
            start_size,
        });
        self.commit();
        true
    }

    /// Follows the pointer during a resize.
    ///
    /// Pointer releases can get lost, so a motion with no buttons pressed aborts the resize
    /// without changing the size.
    pub fn resize_motion(&mut self, pointer: f64, buttons_pressed: bool) {
        let Some(resize) = self.resize_item.clone() else {
            return;
        };

        if buttons_pressed {
            self.apply_resize(&resize, pointer);
        } else {
            debug!("pointer released outside of the window, cancelling resize");
            self.resize_item = None;
        }
        self.commit();
    }

    /// Applies the final size and ends the resize.
    pub fn end_resize(&mut self, pointer: f64) {
        if let Some(resize) = self.resize_item.take() {
            self.apply_resize(&resize, pointer);
        }
        self.commit();
    }

    fn apply_resize(&mut self, resize: &ResizeItem, pointer: f64) {
        let size = resize.start_size + (pointer - resize.start_pos);
        if let Some(item) = super::find_item_mut(&mut self.items, &resize.id) {
            item.set_size(resize.vertical, Some(size));
        }
    }
}
