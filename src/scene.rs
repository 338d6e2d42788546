//! Scene store: the single owner of committed drawing state.
//!
//! DESIGN
//! ======
//! `SceneStore` holds the ordered object list (array order is paint order),
//! the active [`DrawingSettings`], the undo/redo [`History`] and at most one
//! in-progress stroke. Every committed mutation follows the same sequence:
//! record the pre-mutation snapshot, apply the change, publish the new list on
//! the scene stream, then write the auto-save slot.
//!
//! Operations are total. Unknown ids, degenerate strokes and empty history
//! degrade to no-ops that report `false`/`None`. Persistence failures are
//! logged at this boundary and never roll back the in-memory scene; only the
//! explicit named-drawing calls return a [`PersistError`].
//!
//! Stroke lifecycle: `begin_stroke` → `extend_stroke`* → `commit_stroke`.
//! [`SceneStore::interrupt_stroke`] ends a stroke early (pointer left the
//! surface, tool switched) by committing it at its last point.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::geometry::Point;
use crate::history::History;
use crate::object::{DrawingObject, ObjectId};
use crate::persist::{CurrentState, DrawingId, Owner, PersistError, Repository, SaveRequest};
use crate::schedule::now_ms;
use crate::settings::{DrawingSettings, SettingsPatch};
use crate::signal::{Signal, SubscriptionId};

/// Owner of the scene, settings, history and change streams.
pub struct SceneStore {
    objects: Vec<DrawingObject>,
    settings: DrawingSettings,
    history: History,
    in_progress: Option<DrawingObject>,
    scene_changed: Signal<[DrawingObject]>,
    settings_changed: Signal<DrawingSettings>,
    repository: Option<Box<dyn Repository>>,
    clock: fn() -> f64,
}

impl SceneStore {
    /// Empty scene with default settings and unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(DrawingSettings::default(), 0)
    }

    /// Empty scene with the configured initial settings and history depth.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_settings(config.default_settings.clone(), config.history_limit)
    }

    #[must_use]
    pub fn with_settings(settings: DrawingSettings, history_limit: usize) -> Self {
        Self {
            objects: Vec::new(),
            settings,
            history: History::with_limit(history_limit),
            in_progress: None,
            scene_changed: Signal::new(),
            settings_changed: Signal::new(),
            repository: None,
            clock: now_ms,
        }
    }

    /// Replace the time source used for object and save timestamps.
    pub fn set_clock(&mut self, clock: fn() -> f64) {
        self.clock = clock;
    }

    // --- Queries ---

    /// Committed objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[DrawingObject] {
        &self.objects
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&DrawingObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.iter().any(|o| o.id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[must_use]
    pub fn settings(&self) -> &DrawingSettings {
        &self.settings
    }

    /// The stroke being drawn, not yet part of the scene.
    #[must_use]
    pub fn in_progress(&self) -> Option<&DrawingObject> {
        self.in_progress.as_ref()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    // --- Change streams ---

    /// Called with the full object list after every scene change.
    pub fn subscribe_scene(&mut self, callback: impl FnMut(&[DrawingObject]) + 'static) -> SubscriptionId {
        self.scene_changed.subscribe(callback)
    }

    /// Called with the new settings after every effective settings change.
    pub fn subscribe_settings(&mut self, callback: impl FnMut(&DrawingSettings) + 'static) -> SubscriptionId {
        self.settings_changed.subscribe(callback)
    }

    pub fn unsubscribe_scene(&mut self, id: SubscriptionId) -> bool {
        self.scene_changed.unsubscribe(id)
    }

    pub fn unsubscribe_settings(&mut self, id: SubscriptionId) -> bool {
        self.settings_changed.unsubscribe(id)
    }

    // --- Strokes ---

    /// Start a stroke at `point` with the active settings.
    ///
    /// Returns `None` for tools that do not stroke (select, text). A stroke
    /// already in progress is committed first.
    pub fn begin_stroke(&mut self, point: Point) -> Option<&DrawingObject> {
        if self.in_progress.is_some() {
            self.interrupt_stroke();
        }
        let mut obj = DrawingObject::from_settings(&self.settings, point)?;
        obj.set_timestamp((self.clock)());
        debug!(tool = obj.kind().name(), id = %obj.id(), "stroke started");
        self.in_progress = Some(obj);
        self.in_progress.as_ref()
    }

    /// Add `point` to the in-progress stroke. Freehand strokes keep every
    /// sample; shapes keep only `[start, point]`. Returns `false` when no
    /// stroke is in progress.
    pub fn extend_stroke(&mut self, point: Point) -> bool {
        let Some(obj) = self.in_progress.as_mut() else {
            return false;
        };
        extend(obj, point);
        true
    }

    /// Finish the in-progress stroke at `point` and add it to the scene.
    ///
    /// Strokes with fewer than two points are dropped without touching the
    /// scene or history.
    pub fn commit_stroke(&mut self, point: Point) -> Option<ObjectId> {
        let mut obj = self.in_progress.take()?;
        extend(&mut obj, point);
        self.commit_object(obj)
    }

    /// End the in-progress stroke early, committing it at its last point.
    pub fn interrupt_stroke(&mut self) -> Option<ObjectId> {
        let obj = self.in_progress.take()?;
        self.commit_object(obj)
    }

    /// Drop the in-progress stroke. Returns `true` if there was one.
    pub fn discard_stroke(&mut self) -> bool {
        self.in_progress.take().is_some()
    }

    fn commit_object(&mut self, mut obj: DrawingObject) -> Option<ObjectId> {
        if obj.points().len() < 2 {
            debug!(id = %obj.id(), points = obj.points().len(), "degenerate stroke dropped");
            return None;
        }
        obj.refresh_bounds();
        let id = obj.id();
        self.record();
        self.objects.push(obj);
        debug!(%id, count = self.objects.len(), "stroke committed");
        self.changed();
        Some(id)
    }

    // --- Object mutations ---

    /// Append a text object.
    ///
    /// A nil or already-used id is replaced with a fresh one. Objects without
    /// an anchor point are dropped.
    pub fn add_text(&mut self, mut obj: DrawingObject) -> Option<ObjectId> {
        if !obj.is_renderable() {
            debug!(id = %obj.id(), "text without anchor dropped");
            return None;
        }
        if obj.id().is_nil() || self.contains(obj.id()) {
            obj.set_id(Uuid::new_v4());
        }
        if obj.timestamp().is_none() {
            obj.set_timestamp((self.clock)());
        }
        obj.refresh_bounds();
        let id = obj.id();
        self.record();
        self.objects.push(obj);
        debug!(%id, "text added");
        self.changed();
        Some(id)
    }

    /// Remove the object with `id`. Returns `false` (and records nothing)
    /// when it is not in the scene.
    pub fn delete_object(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.objects.iter().position(|o| o.id() == id) else {
            return false;
        };
        self.record();
        self.objects.remove(index);
        debug!(%id, count = self.objects.len(), "object deleted");
        self.changed();
        true
    }

    /// Replace the object sharing `obj`'s id, keeping its position in paint
    /// order.
    pub fn update_object(&mut self, obj: DrawingObject) -> bool {
        self.update_objects(vec![obj]) == 1
    }

    /// Replace every object whose id matches, as one undo step. Objects with
    /// unknown ids are ignored. Returns how many were replaced.
    pub fn update_objects(&mut self, objects: Vec<DrawingObject>) -> usize {
        let mut incoming: HashMap<ObjectId, DrawingObject> = objects
            .into_iter()
            .filter(|o| self.contains(o.id()))
            .map(|o| (o.id(), o))
            .collect();
        if incoming.is_empty() {
            return 0;
        }
        let updated = incoming.len();
        self.record();
        for slot in &mut self.objects {
            if let Some(mut replacement) = incoming.remove(&slot.id()) {
                replacement.refresh_bounds();
                *slot = replacement;
            }
        }
        debug!(updated, "objects updated");
        self.changed();
        updated
    }

    /// Remove every object. Always records an undo step.
    pub fn clear(&mut self) {
        self.record();
        self.objects.clear();
        debug!("scene cleared");
        self.changed();
    }

    /// Restore the scene before the last mutation. Returns `false` when there
    /// is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(&self.objects) else {
            return false;
        };
        self.objects = previous;
        debug!(undo = self.history.undo_depth(), redo = self.history.redo_depth(), "undo");
        self.changed();
        true
    }

    /// Reapply the last undone mutation. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(&self.objects) else {
            return false;
        };
        self.objects = next;
        debug!(undo = self.history.undo_depth(), redo = self.history.redo_depth(), "redo");
        self.changed();
        true
    }

    /// Merge `patch` into the active settings.
    ///
    /// Switching tools ends any in-progress stroke first. Settings
    /// subscribers are notified only when a value actually changed; the scene
    /// and history are never touched.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> bool {
        if patch.tool.is_some_and(|t| t != self.settings.tool) {
            self.interrupt_stroke();
        }
        if !self.settings.apply(patch) {
            return false;
        }
        debug!(tool = ?self.settings.tool, "settings updated");
        self.settings_changed.emit(&self.settings);
        self.autosave();
        true
    }

    /// Replace the scene and settings wholesale and reset history.
    pub fn load(&mut self, objects: Vec<DrawingObject>, settings: DrawingSettings) {
        self.replace(objects, settings);
        self.autosave();
    }

    fn replace(&mut self, mut objects: Vec<DrawingObject>, settings: DrawingSettings) {
        objects.retain(DrawingObject::is_renderable);
        for obj in &mut objects {
            obj.refresh_bounds();
        }
        self.in_progress = None;
        self.objects = objects;
        self.history.clear();
        debug!(count = self.objects.len(), "scene loaded");
        self.scene_changed.emit(&self.objects);
        if self.settings != settings {
            self.settings = settings;
            self.settings_changed.emit(&self.settings);
        }
    }

    fn record(&mut self) {
        self.history.record(self.objects.clone());
    }

    fn changed(&mut self) {
        self.scene_changed.emit(&self.objects);
        self.autosave();
    }

    // --- Persistence ---

    /// Attach the store used for auto-save and named drawings.
    pub fn attach_repository(&mut self, repository: Box<dyn Repository>) {
        self.repository = Some(repository);
    }

    #[must_use]
    pub fn repository(&self) -> Option<&dyn Repository> {
        self.repository.as_deref()
    }

    fn autosave(&mut self) {
        let Some(repo) = self.repository.as_mut() else {
            return;
        };
        let state = CurrentState {
            lines: self.objects.clone(),
            settings: self.settings.clone(),
            timestamp: (self.clock)(),
        };
        if let Err(e) = repo.save_current(&state) {
            warn!(error = %e, count = state.lines.len(), "autosave failed");
        }
    }

    /// Reload the auto-saved scene. Returns `Ok(false)` when no repository
    /// is attached or nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns `PersistError` if the saved state cannot be read.
    pub fn restore_autosave(&mut self) -> Result<bool, PersistError> {
        let Some(repo) = self.repository.as_ref() else {
            return Ok(false);
        };
        let Some(state) = repo.load_current()? else {
            return Ok(false);
        };
        self.replace(state.lines, state.settings);
        Ok(true)
    }

    /// Remove the auto-saved scene.
    ///
    /// # Errors
    ///
    /// Returns `PersistError` if the backend rejects the removal.
    pub fn clear_autosave(&mut self) -> Result<(), PersistError> {
        match self.repository.as_mut() {
            Some(repo) => repo.clear_current(),
            None => Ok(()),
        }
    }

    /// Save the current scene and settings as a named drawing.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Backend` without a repository, or whatever the
    /// repository reports.
    pub fn save_as(&mut self, title: &str, id: Option<DrawingId>, owner: Owner) -> Result<DrawingId, PersistError> {
        let request = SaveRequest {
            id,
            title: title.to_owned(),
            lines: self.objects.clone(),
            settings: self.settings.clone(),
            owner,
            now: (self.clock)(),
        };
        let repo = self.repository.as_mut().ok_or_else(no_repository)?;
        let saved = repo.save(request).inspect_err(|e| {
            tracing::error!(error = %e, title, "save drawing failed");
        })?;
        debug!(id = %saved, title, "drawing saved");
        Ok(saved)
    }

    /// Replace the scene with a named drawing. History starts empty.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::NotFound` for an unknown id, or
    /// `PersistError::Backend` without a repository.
    pub fn open(&mut self, id: DrawingId) -> Result<(), PersistError> {
        let repo = self.repository.as_ref().ok_or_else(no_repository)?;
        let record = repo.load(id)?;
        debug!(%id, title = %record.title, "drawing opened");
        self.load(record.lines, record.settings);
        Ok(())
    }
}

fn no_repository() -> PersistError {
    PersistError::Backend("no repository attached".into())
}

fn extend(obj: &mut DrawingObject, point: Point) {
    if obj.kind().is_freehand() {
        obj.push_point(point);
    } else if let Some(start) = obj.points().first().copied() {
        obj.set_points(vec![start, point]);
    }
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SceneStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneStore")
            .field("objects", &self.objects.len())
            .field("settings", &self.settings)
            .field("undo_depth", &self.history.undo_depth())
            .field("redo_depth", &self.history.redo_depth())
            .field("in_progress", &self.in_progress.is_some())
            .field("repository", &self.repository.is_some())
            .finish_non_exhaustive()
    }
}
