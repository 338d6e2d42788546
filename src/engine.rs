use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::config::EngineConfig;
use crate::geometry::{Bounds, Point, resize_bounds, scale_object_with};
use crate::hit::{Handle, find_object_at_point, objects_in_rect, resize_handle_at};
use crate::input::{DragMode, InputState, Key, Modifiers, PointerEvent, PointerKind, TextEdit, UiState};
use crate::object::{DrawingObject, ObjectId};
use crate::persist::{KvRepository, PersistError};
use crate::render::{self, RenderView};
use crate::scene::SceneStore;
use crate::schedule::{Debouncer, SettleSchedule};
use crate::settings::{SettingsPatch, Tool};
use crate::storage::BrowserStorage;
use crate::viewport::Viewport;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Side effects requested by the controller. The host applies them in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Repaint the full scene.
    RenderNeeded,
    /// Paint only the in-progress stroke on top of the current frame.
    PaintInProgress,
    /// Change the CSS cursor of the canvas.
    SetCursor(String),
    /// Open a text editor overlay at `anchor` (scene coordinates).
    EditTextRequested { anchor: Point, text_size: f64, color: String },
    /// Close the text editor overlay.
    TextEditClosed,
    /// Resize the canvas element to this CSS size.
    ResizeCanvas { width: f64, height: f64 },
}

/// Interaction controller: pointer, keyboard and timer input in, scene
/// mutations and [`Action`]s out. Holds no browser handles.
pub struct EngineCore {
    pub scene: SceneStore,
    pub ui: UiState,
    pub input: InputState,
    pub viewport: Viewport,
    pub config: EngineConfig,
    resize: Debouncer<(f64, f64)>,
    settle: SettleSchedule,
    /// Scene position of the most recent pointer event.
    last_pointer: Option<Point>,
    cursor: &'static str,
    presentation: bool,
    /// Set by the scene/settings subscriptions; cleared by [`EngineCore::take_dirty`].
    dirty: Rc<Cell<bool>>,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let mut scene = SceneStore::from_config(&config);
        let dirty = Rc::new(Cell::new(false));
        let scene_dirty = Rc::clone(&dirty);
        scene.subscribe_scene(move |_| scene_dirty.set(true));
        let settings_dirty = Rc::clone(&dirty);
        scene.subscribe_settings(move |_| settings_dirty.set(true));

        Self {
            scene,
            ui: UiState::default(),
            input: InputState::default(),
            viewport: Viewport::default(),
            resize: Debouncer::new(config.resize_debounce_ms),
            settle: SettleSchedule::new(config.settle_delays_ms.clone()),
            config,
            last_pointer: None,
            cursor: "default",
            presentation: false,
            dirty,
        }
    }

    /// Whether the scene or settings changed since the last call.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    // --- Pointer input ---

    /// Dispatch an abstract pointer event.
    pub fn on_pointer(&mut self, event: PointerEvent) -> Vec<Action> {
        match event.kind {
            PointerKind::Down => self.on_pointer_down(event.position, event.modifiers),
            PointerKind::Move => self.on_pointer_move(event.position, event.modifiers),
            PointerKind::Up => self.on_pointer_up(event.position, event.modifiers),
        }
    }

    pub fn on_pointer_down(&mut self, client_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let pt = self.viewport.client_to_scene(client_pt);
        // A press without a matching release finishes the stale gesture first.
        let mut actions = self.end_gesture_at_last_point();
        self.last_pointer = Some(pt);

        match self.scene.settings().tool {
            Tool::Select => actions.extend(self.select_down(pt, modifiers)),
            Tool::Eraser => actions.extend(self.erase_at(pt)),
            Tool::Text => actions.extend(self.open_text_editor(pt)),
            Tool::Brush | Tool::Line | Tool::Rectangle | Tool::Circle => {
                if self.scene.begin_stroke(pt).is_some() {
                    self.input = InputState::Drawing;
                    actions.push(Action::PaintInProgress);
                }
            }
        }
        actions
    }

    pub fn on_pointer_move(&mut self, client_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let pt = self.viewport.client_to_scene(client_pt);
        self.last_pointer = Some(pt);

        match &mut self.input {
            InputState::Idle => self.hover(pt),
            InputState::Drawing => {
                self.scene.extend_stroke(pt);
                // Shapes repaint the whole scene so the previous outline disappears.
                let freehand = self.scene.in_progress().is_some_and(|o| o.kind().is_freehand());
                vec![if freehand { Action::PaintInProgress } else { Action::RenderNeeded }]
            }
            InputState::DraggingObjects { origin, originals, preview, .. } => {
                let (dx, dy) = (pt.x - origin.x, pt.y - origin.y);
                *preview = originals.iter().map(|o| o.translated(dx, dy)).collect();
                vec![Action::RenderNeeded]
            }
            InputState::ResizingObject { handle, start, original, initial, preview } => {
                let target = resize_bounds(initial, *handle, pt.x - start.x, pt.y - start.y, self.config.min_resize);
                *preview = Some(scale_object_with(original, &target, self.config.scale_limits()));
                vec![Action::RenderNeeded]
            }
            InputState::Marquee { origin, base } => {
                let rect = Bounds::from_corners(*origin, pt);
                let mut selection = base.clone().unwrap_or_default();
                selection.extend(objects_in_rect(self.scene.objects(), &rect));
                self.ui.selection = selection;
                self.ui.marquee = Some(rect);
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, client_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let pt = self.viewport.client_to_scene(client_pt);
        self.last_pointer = Some(pt);
        let mut actions = self.finish_gesture(pt);
        actions.extend(self.hover(pt));
        actions
    }

    /// The pointer left the canvas. Any gesture ends at the last known
    /// position; an in-progress stroke is committed as drawn so far.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        let mut actions = self.end_gesture_at_last_point();
        if self.ui.eraser_hover.take().is_some() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // --- Keyboard input ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if let Some(edit) = self.ui.text_edit.as_ref() {
            // Keystrokes belong to the editor overlay.
            if key.is("Escape") {
                return self.cancel_text();
            }
            if key.is("Enter") && !modifiers.shift {
                let draft = edit.draft.clone();
                return self.finalize_text(&draft);
            }
            return Vec::new();
        }

        if key.is("Delete") || key.is("Backspace") {
            return self.delete_selection();
        }
        if key.is("Escape") {
            return self.escape();
        }
        if !modifiers.command() {
            return Vec::new();
        }

        if key.is("z") {
            if modifiers.shift { self.redo() } else { self.undo() }
        } else if key.is("y") {
            self.redo()
        } else if key.is("a") {
            self.select_all()
        } else if key.is("g") {
            if modifiers.shift { self.ungroup_selection() } else { self.group_selection() }
        } else {
            Vec::new()
        }
    }

    fn escape(&mut self) -> Vec<Action> {
        if matches!(self.input, InputState::Marquee { .. }) {
            self.input = InputState::Idle;
        }
        self.ui.marquee = None;
        self.ui.clear_selection();
        vec![Action::RenderNeeded]
    }

    // --- Tool / settings ---

    /// Switch tools. Ends the active gesture, commits an open text editor,
    /// and clears tool-specific hover state.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        if tool == self.scene.settings().tool {
            return Vec::new();
        }
        let mut actions = self.end_gesture_at_last_point();
        if let Some(edit) = self.ui.text_edit.as_ref() {
            let draft = edit.draft.clone();
            actions.extend(self.finalize_text(&draft));
        }
        self.ui.eraser_hover = None;
        self.scene.update_settings(&SettingsPatch::tool(tool));
        debug!(?tool, "tool changed");
        self.set_cursor(tool.cursor(), &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Apply a partial settings update. A tool change goes through
    /// [`EngineCore::set_tool`].
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Vec<Action> {
        let mut actions = match patch.tool {
            Some(tool) => self.set_tool(tool),
            None => Vec::new(),
        };
        if self.scene.update_settings(patch) && !actions.contains(&Action::RenderNeeded) {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // --- Text ---

    fn open_text_editor(&mut self, pt: Point) -> Vec<Action> {
        if self.ui.text_edit.is_some() {
            return Vec::new();
        }
        let settings = self.scene.settings();
        let edit = TextEdit {
            anchor: pt,
            text_size: settings.text_size,
            color: settings.color.clone(),
            draft: String::new(),
        };
        let action = Action::EditTextRequested {
            anchor: edit.anchor,
            text_size: edit.text_size,
            color: edit.color.clone(),
        };
        debug!(x = pt.x, y = pt.y, "text editor opened");
        self.ui.text_edit = Some(edit);
        vec![action]
    }

    /// Mirror the editor overlay's current content, so a tool switch can
    /// commit it.
    pub fn set_text_draft(&mut self, text: &str) {
        if let Some(edit) = self.ui.text_edit.as_mut() {
            edit.draft = text.to_owned();
        }
    }

    /// Close the text editor, adding `text` to the scene unless it is blank.
    pub fn finalize_text(&mut self, text: &str) -> Vec<Action> {
        let Some(edit) = self.ui.text_edit.take() else {
            return Vec::new();
        };
        let text = text.trim();
        if text.is_empty() {
            return vec![Action::TextEditClosed];
        }
        let mut obj = DrawingObject::text(edit.anchor, text, edit.text_size, edit.color);
        obj.set_opacity(self.scene.settings().opacity);
        self.scene.add_text(obj);
        vec![Action::TextEditClosed, Action::RenderNeeded]
    }

    /// Close the text editor without touching the scene.
    pub fn cancel_text(&mut self) -> Vec<Action> {
        match self.ui.text_edit.take() {
            Some(_) => vec![Action::TextEditClosed],
            None => Vec::new(),
        }
    }

    // --- Selection commands ---

    /// Tag the selection as a group.
    pub fn group_selection(&mut self) -> Vec<Action> {
        match self.ui.add_group(self.ui.selection.clone()) {
            Some(name) => {
                debug!(group = %name, members = self.ui.selection.len(), "grouped");
                vec![Action::RenderNeeded]
            }
            None => Vec::new(),
        }
    }

    /// Dissolve every group touching the selection. Objects stay.
    pub fn ungroup_selection(&mut self) -> Vec<Action> {
        let selection = self.ui.selection.clone();
        let removed = self.ui.remove_groups_touching(&selection);
        if removed == 0 {
            return Vec::new();
        }
        debug!(removed, "ungrouped");
        vec![Action::RenderNeeded]
    }

    /// Delete every selected object, one undo step each. An active gesture
    /// is committed first.
    pub fn delete_selection(&mut self) -> Vec<Action> {
        let mut actions = self.end_gesture_at_last_point();
        let selection = std::mem::take(&mut self.ui.selection);
        if selection.is_empty() {
            return actions;
        }
        let ids = self.in_paint_order(&selection);
        for id in &ids {
            self.scene.delete_object(*id);
        }
        self.prune_ui();
        debug!(count = ids.len(), "selection deleted");
        request_render(&mut actions);
        actions
    }

    pub fn select_all(&mut self) -> Vec<Action> {
        self.ui.select_only(self.scene.objects().iter().map(DrawingObject::id));
        vec![Action::RenderNeeded]
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        if self.ui.selection.is_empty() {
            return Vec::new();
        }
        self.ui.clear_selection();
        vec![Action::RenderNeeded]
    }

    // --- Scene commands ---

    /// Step back one history entry. An active gesture is committed first,
    /// so undo lands on the scene as it was before that gesture.
    pub fn undo(&mut self) -> Vec<Action> {
        let mut actions = self.end_gesture_at_last_point();
        if self.scene.undo() {
            self.prune_ui();
            request_render(&mut actions);
        }
        actions
    }

    /// Step forward one history entry, committing an active gesture first.
    pub fn redo(&mut self) -> Vec<Action> {
        let mut actions = self.end_gesture_at_last_point();
        if self.scene.redo() {
            self.prune_ui();
            request_render(&mut actions);
        }
        actions
    }

    pub fn clear_scene(&mut self) -> Vec<Action> {
        self.input = InputState::Idle;
        self.scene.discard_stroke();
        self.scene.clear();
        self.ui.clear_selection();
        self.ui.marquee = None;
        self.prune_ui();
        vec![Action::RenderNeeded]
    }

    fn prune_ui(&mut self) {
        let scene = &self.scene;
        self.ui.retain_existing(|id| scene.contains(id));
    }

    // --- Viewport and scheduling ---

    /// Record a container/window size change; applied after the debounce
    /// delay by [`EngineCore::tick`].
    pub fn on_viewport_resize(&mut self, container_width: f64, window_height: f64, now: f64) {
        self.resize.request((container_width, window_height), now);
    }

    /// Enter or leave presentation mode and schedule settle repaints.
    pub fn set_presentation(&mut self, on: bool, now: f64) {
        if self.presentation != on {
            self.presentation = on;
            debug!(on, "presentation mode");
        }
        self.settle.start(now);
    }

    #[must_use]
    pub fn presentation(&self) -> bool {
        self.presentation
    }

    /// Advance timers to `now` (milliseconds).
    pub fn tick(&mut self, now: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some((container_width, window_height)) = self.resize.poll(now) {
            let (width, height) = self.viewport.resize_to_fit(container_width, window_height);
            actions.push(Action::ResizeCanvas { width, height });
        }
        if self.settle.poll(now) || !actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // --- Queries ---

    /// Selected object ids.
    #[must_use]
    pub fn selection(&self) -> &BTreeSet<ObjectId> {
        &self.ui.selection
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.scene.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.scene.can_redo()
    }

    /// Objects to paint: the committed scene with gesture previews standing
    /// in for their originals, then the in-progress stroke.
    #[must_use]
    pub fn display_objects(&self) -> Vec<&DrawingObject> {
        let previews = self.input.previews();
        let mut out: Vec<&DrawingObject> = self
            .scene
            .objects()
            .iter()
            .map(|obj| previews.iter().find(|p| p.id() == obj.id()).unwrap_or(obj))
            .collect();
        if let Some(stroke) = self.scene.in_progress() {
            out.push(stroke);
        }
        out
    }

    #[must_use]
    pub fn render_view(&self) -> RenderView<'_> {
        RenderView {
            objects: self.display_objects(),
            selection: &self.ui.selection,
            marquee: self.ui.marquee,
            eraser_hover: self.ui.eraser_hover,
            background: &self.scene.settings().background_color,
            handle_size: self.config.handle_size,
            width: self.viewport.width,
            height: self.viewport.height,
            dpr: self.viewport.dpr,
        }
    }

    // --- Gesture internals ---

    fn select_down(&mut self, pt: Point, modifiers: Modifiers) -> Vec<Action> {
        // (1) Resize handle of a selected object, topmost first.
        let handle_hit = self
            .scene
            .objects()
            .iter()
            .rev()
            .filter(|o| self.ui.is_selected(o.id()))
            .find_map(|o| {
                let bounds = o.bounds()?;
                let handle = resize_handle_at(pt, &bounds, self.config.handle_size)?;
                Some((handle, o.clone(), bounds))
            });
        if let Some((handle, original, initial)) = handle_hit {
            debug!(id = %original.id(), ?handle, "resize started");
            self.input = InputState::ResizingObject { handle, start: pt, original, initial, preview: None };
            let mut actions = Vec::new();
            self.set_cursor(handle.cursor(), &mut actions);
            return actions;
        }

        // (2) Object under the pointer.
        let Some(id) = find_object_at_point(self.scene.objects(), pt).map(DrawingObject::id) else {
            // (3) Empty space: marquee.
            let base = if modifiers.additive() {
                Some(self.ui.selection.clone())
            } else {
                self.ui.clear_selection();
                None
            };
            self.ui.marquee = Some(Bounds::from_corners(pt, pt));
            self.input = InputState::Marquee { origin: pt, base };
            return vec![Action::RenderNeeded];
        };

        let mode = if let Some(group) = self.ui.group_of(id) {
            let name = group.name.clone();
            let members = group.members.clone();
            if !modifiers.additive() {
                self.ui.clear_selection();
            }
            self.ui.selection.extend(members.into_iter().filter(|m| self.scene.contains(*m)));
            DragMode::Group(name)
        } else if self.ui.is_selected(id) && self.ui.selection.len() > 1 {
            DragMode::Multi
        } else if modifiers.additive() {
            self.ui.selection.insert(id);
            if self.ui.selection.len() > 1 { DragMode::Multi } else { DragMode::Single }
        } else {
            self.ui.select_only([id]);
            DragMode::Single
        };

        let originals: Vec<DrawingObject> = self
            .scene
            .objects()
            .iter()
            .filter(|o| self.ui.is_selected(o.id()))
            .cloned()
            .collect();
        debug!(?mode, count = originals.len(), "drag started");
        self.input = InputState::DraggingObjects { mode, origin: pt, preview: originals.clone(), originals };

        let mut actions = vec![Action::RenderNeeded];
        self.set_cursor("move", &mut actions);
        actions
    }

    fn erase_at(&mut self, pt: Point) -> Vec<Action> {
        let Some(id) = find_object_at_point(self.scene.objects(), pt).map(DrawingObject::id) else {
            return Vec::new();
        };
        self.scene.delete_object(id);
        self.prune_ui();
        self.ui.eraser_hover = None;
        let mut actions = vec![Action::RenderNeeded];
        self.set_cursor(Tool::Eraser.cursor(), &mut actions);
        actions
    }

    /// End the active gesture where the pointer was last seen. A stroke is
    /// committed as drawn so far.
    fn end_gesture_at_last_point(&mut self) -> Vec<Action> {
        if matches!(self.input, InputState::Drawing) {
            self.input = InputState::Idle;
            self.scene.interrupt_stroke();
            return vec![Action::RenderNeeded];
        }
        match self.last_pointer {
            Some(pt) => self.finish_gesture(pt),
            None => {
                self.input = InputState::Idle;
                Vec::new()
            }
        }
    }

    /// Commit or close the active gesture as if released at `pt`.
    fn finish_gesture(&mut self, pt: Point) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Drawing => {
                self.scene.commit_stroke(pt);
                vec![Action::RenderNeeded]
            }
            InputState::DraggingObjects { mode, origin, originals, .. } => {
                let (dx, dy) = (pt.x - origin.x, pt.y - origin.y);
                if !is_zero_delta(dx, dy) {
                    let moved: Vec<DrawingObject> = originals.iter().map(|o| o.translated(dx, dy)).collect();
                    let updated = self.scene.update_objects(moved);
                    debug!(?mode, updated, dx, dy, "drag committed");
                }
                vec![Action::RenderNeeded]
            }
            InputState::ResizingObject { handle, start, original, initial, .. } => {
                let (dx, dy) = (pt.x - start.x, pt.y - start.y);
                if !is_zero_delta(dx, dy) {
                    let target = resize_bounds(&initial, handle, dx, dy, self.config.min_resize);
                    let resized = scale_object_with(&original, &target, self.config.scale_limits());
                    self.scene.update_object(resized);
                    debug!(id = %original.id(), ?handle, "resize committed");
                }
                vec![Action::RenderNeeded]
            }
            InputState::Marquee { origin, base } => {
                let rect = Bounds::from_corners(origin, pt);
                let mut selection = base.unwrap_or_default();
                selection.extend(objects_in_rect(self.scene.objects(), &rect));
                debug!(selected = selection.len(), "marquee committed");
                self.ui.selection = selection;
                self.ui.marquee = None;
                vec![Action::RenderNeeded]
            }
        }
    }

    /// Idle pointer movement: cursor and eraser hover feedback.
    fn hover(&mut self, pt: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        let tool = self.scene.settings().tool;
        let cursor = match tool {
            Tool::Eraser => {
                let hovered = find_object_at_point(self.scene.objects(), pt).map(DrawingObject::id);
                if hovered != self.ui.eraser_hover {
                    self.ui.eraser_hover = hovered;
                    actions.push(Action::RenderNeeded);
                }
                if hovered.is_some() { "pointer" } else { tool.cursor() }
            }
            Tool::Select => self.select_cursor(pt),
            _ => tool.cursor(),
        };
        self.set_cursor(cursor, &mut actions);
        actions
    }

    fn select_cursor(&self, pt: Point) -> &'static str {
        let over_handle = self
            .scene
            .objects()
            .iter()
            .rev()
            .filter(|o| self.ui.is_selected(o.id()))
            .find_map(|o| resize_handle_at(pt, &o.bounds()?, self.config.handle_size));
        if let Some(handle) = over_handle {
            return handle.cursor();
        }
        if find_object_at_point(self.scene.objects(), pt).is_some() {
            return "move";
        }
        Tool::Select.cursor()
    }

    fn set_cursor(&mut self, cursor: &'static str, actions: &mut Vec<Action>) {
        if self.cursor != cursor {
            self.cursor = cursor;
            actions.push(Action::SetCursor(cursor.to_owned()));
        }
    }

    fn in_paint_order(&self, ids: &BTreeSet<ObjectId>) -> Vec<ObjectId> {
        self.scene
            .objects()
            .iter()
            .map(DrawingObject::id)
            .filter(|id| ids.contains(id))
            .collect()
    }
}

fn request_render(actions: &mut Vec<Action>) {
    if !actions.contains(&Action::RenderNeeded) {
        actions.push(Action::RenderNeeded);
    }
}

fn is_zero_delta(dx: f64, dy: f64) -> bool {
    dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON
}

/// [`EngineCore`] bound to a `<canvas>` element, painting after every event.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, config: EngineConfig) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)?;
        let mut core = EngineCore::with_config(config);
        core.viewport.width = f64::from(canvas.width());
        core.viewport.height = f64::from(canvas.height());
        Ok(Self { canvas, ctx, core })
    }

    /// Persist to `window.localStorage` and restore the auto-saved scene.
    ///
    /// # Errors
    ///
    /// Returns `PersistError` if storage is unavailable or the saved scene
    /// cannot be read.
    pub fn attach_local_storage(&mut self) -> Result<bool, PersistError> {
        let storage = BrowserStorage::local()?;
        let repo = KvRepository::new(storage, &self.core.config.storage_prefix);
        self.core.scene.attach_repository(Box::new(repo));
        self.core.scene.restore_autosave()
    }

    /// Refresh the canvas's page position from the DOM.
    pub fn sync_origin(&mut self) {
        let rect = self.canvas.get_bounding_client_rect();
        self.core.viewport.set_origin(rect.left(), rect.top());
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        self.core.viewport.dpr = dpr;
    }

    // --- Input events ---

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_pointer(&mut self, event: PointerEvent) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.on_pointer(event);
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_pointer_leave(&mut self) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.on_pointer_leave();
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.on_key_down(key, modifiers);
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn set_tool(&mut self, tool: Tool) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.set_tool(tool);
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.update_settings(patch);
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn finalize_text(&mut self, text: &str) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.finalize_text(text);
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn tick(&mut self, now: f64) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.tick(now);
        self.apply(actions)
    }

    /// Perform the actions the engine can handle itself (painting, canvas
    /// size) and return the rest for the host.
    fn apply(&mut self, actions: Vec<Action>) -> Result<Vec<Action>, JsValue> {
        let mut render = self.core.take_dirty();
        let mut paint_stroke = false;
        let mut host = Vec::new();
        for action in actions {
            match action {
                Action::RenderNeeded => render = true,
                Action::PaintInProgress => paint_stroke = true,
                Action::ResizeCanvas { .. } => {
                    // The core has already adopted the new size; the host
                    // still sets the element's CSS size.
                    let (w, h) = self.core.viewport.backing_size();
                    self.canvas.set_width(w);
                    self.canvas.set_height(h);
                    render = true;
                    host.push(action);
                }
                other => host.push(other),
            }
        }
        if render {
            self.render()?;
        } else if paint_stroke {
            self.paint_in_progress()?;
        }
        Ok(host)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        render::draw(&self.ctx, &self.core.render_view())
    }

    /// Paint just the in-progress stroke over the current frame.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn paint_in_progress(&self) -> Result<(), JsValue> {
        match self.core.scene.in_progress() {
            Some(stroke) => render::draw_object(&self.ctx, stroke, &self.core.scene.settings().background_color),
            None => Ok(()),
        }
    }
}
