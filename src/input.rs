//! Input model: modifier keys, pointer events, UI state and the gesture
//! state machine.
//!
//! `UiState` is the interaction state the renderer can see (selection,
//! groups, marquee, eraser hover, text editor). `InputState` is the gesture
//! active between pointer-down and pointer-up, carrying the context needed to
//! recompute previews from the gesture's starting snapshot on every move and
//! to commit a single scene mutation on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::BTreeSet;

use crate::geometry::{Bounds, Point};
use crate::hit::Handle;
use crate::object::{DrawingObject, ObjectId};

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }

    /// Whether a click or marquee should add to the selection.
    #[must_use]
    pub fn additive(self) -> bool {
        self.shift || self.command()
    }
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Case-insensitive comparison for single-character keys.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Phase of a pointer event. Touch input is reduced to its first contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// An abstract pointer event in client (CSS pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    #[must_use]
    pub fn new(kind: PointerKind, position: Point, modifiers: Modifiers) -> Self {
        Self { kind, position, modifiers }
    }
}

/// An open text editor overlay, waiting for the host to finalize or cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    /// Scene position of the label's top-left corner.
    pub anchor: Point,
    pub text_size: f64,
    pub color: String,
    /// Latest editor content, committed if the tool changes mid-edit.
    pub draft: String,
}

/// A named set of object ids that select and drag together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub members: BTreeSet<ObjectId>,
}

/// Interaction state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Ids of selected objects.
    pub selection: BTreeSet<ObjectId>,
    /// Active groups. An id belongs to at most one group.
    pub groups: Vec<Group>,
    /// Live rubber-band rectangle in scene coordinates.
    pub marquee: Option<Bounds>,
    /// Object the eraser would delete on the next press.
    pub eraser_hover: Option<ObjectId>,
    /// Open text editor, if any.
    pub text_edit: Option<TextEdit>,
    next_group: usize,
}

impl UiState {
    #[must_use]
    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selection.contains(&id)
    }

    /// Replace the selection with `ids`.
    pub fn select_only(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        self.selection = ids.into_iter().collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The group containing `id`.
    #[must_use]
    pub fn group_of(&self, id: ObjectId) -> Option<&Group> {
        self.groups.iter().find(|g| g.members.contains(&id))
    }

    /// Tag `members` as a new group.
    ///
    /// Members leave any group they were already in; groups left with fewer
    /// than two members dissolve. Returns the new group's name, or `None`
    /// when fewer than two ids were given.
    pub fn add_group(&mut self, members: BTreeSet<ObjectId>) -> Option<String> {
        if members.len() < 2 {
            return None;
        }
        for group in &mut self.groups {
            group.members.retain(|id| !members.contains(id));
        }
        self.groups.retain(|g| g.members.len() >= 2);

        self.next_group += 1;
        let name = format!("group-{}", self.next_group);
        self.groups.push(Group { name: name.clone(), members });
        Some(name)
    }

    /// Dissolve every group containing any of `ids`. Objects are untouched.
    /// Returns how many groups were removed.
    pub fn remove_groups_touching(&mut self, ids: &BTreeSet<ObjectId>) -> usize {
        let before = self.groups.len();
        self.groups.retain(|g| g.members.is_disjoint(ids));
        before - self.groups.len()
    }

    /// Drop selected, grouped and hovered ids that no longer exist in the
    /// scene. Groups left with fewer than two members dissolve.
    pub fn retain_existing(&mut self, exists: impl Fn(ObjectId) -> bool) {
        self.selection.retain(|id| exists(*id));
        for group in &mut self.groups {
            group.members.retain(|id| exists(*id));
        }
        self.groups.retain(|g| g.members.len() >= 2);
        if self.eraser_hover.is_some_and(|id| !exists(id)) {
            self.eraser_hover = None;
        }
    }
}

/// Why a set of objects is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragMode {
    /// One object, selected by the press.
    Single,
    /// The existing multi-selection.
    Multi,
    /// Every member of the named group.
    Group(String),
}

/// The gesture in progress.
///
/// Drag and resize previews are recomputed from `originals`/`original` on
/// each move, so the preview never accumulates rounding drift and the
/// committed scene is untouched until release.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A stroke is being drawn; the scene store owns the in-progress object.
    Drawing,
    /// Selected objects follow the pointer.
    DraggingObjects {
        mode: DragMode,
        /// Scene position of the press.
        origin: Point,
        /// Objects as they were at the press.
        originals: Vec<DrawingObject>,
        /// Translated copies shown in place of `originals`.
        preview: Vec<DrawingObject>,
    },
    /// A corner handle of a selected object is being dragged.
    ResizingObject {
        handle: Handle,
        /// Scene position of the press.
        start: Point,
        /// Object as it was at the press.
        original: DrawingObject,
        /// Bounds of `original`.
        initial: Bounds,
        /// Rescaled copy shown in place of `original`.
        preview: Option<DrawingObject>,
    },
    /// Rubber-band selection.
    Marquee {
        origin: Point,
        /// Selection to merge into when a modifier was held at the press.
        base: Option<BTreeSet<ObjectId>>,
    },
}

impl InputState {
    /// Objects standing in for committed ones while this gesture runs.
    #[must_use]
    pub fn previews(&self) -> &[DrawingObject] {
        match self {
            Self::DraggingObjects { preview, .. } => preview,
            Self::ResizingObject { preview: Some(p), .. } => std::slice::from_ref(p),
            _ => &[],
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
