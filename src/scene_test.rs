#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::object::ObjectKind;
use crate::persist::{DrawingRecord, KvRepository, MemoryBackend};
use crate::settings::Tool;

// =============================================================
// Helpers
// =============================================================

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn fixed_clock() -> f64 {
    1_000.0
}

fn store() -> SceneStore {
    let mut s = SceneStore::new();
    s.set_clock(fixed_clock);
    s
}

fn store_with_tool(tool: Tool) -> SceneStore {
    let mut s = store();
    s.update_settings(&SettingsPatch::tool(tool));
    s
}

fn draw(s: &mut SceneStore, from: Point, to: Point) -> ObjectId {
    s.begin_stroke(from);
    s.commit_stroke(to).unwrap()
}

fn line(x: f64) -> DrawingObject {
    DrawingObject::new(ObjectKind::Line, "#000000", 1.0, vec![pt(x, 0.0), pt(x, 10.0)])
}

/// Repository handle the test keeps a clone of, to inspect what was written.
#[derive(Clone)]
struct SharedRepo(Rc<RefCell<KvRepository<MemoryBackend>>>);

impl SharedRepo {
    fn new() -> Self {
        Self(Rc::new(RefCell::new(KvRepository::new(MemoryBackend::new(), "test"))))
    }
}

impl Repository for SharedRepo {
    fn save(&mut self, request: SaveRequest) -> Result<DrawingId, PersistError> {
        self.0.borrow_mut().save(request)
    }
    fn load(&self, id: DrawingId) -> Result<DrawingRecord, PersistError> {
        self.0.borrow().load(id)
    }
    fn list_by_owner(&self, owner: &Owner) -> Result<Vec<DrawingRecord>, PersistError> {
        self.0.borrow().list_by_owner(owner)
    }
    fn delete(&mut self, id: DrawingId) -> Result<bool, PersistError> {
        self.0.borrow_mut().delete(id)
    }
    fn count(&self) -> Result<usize, PersistError> {
        self.0.borrow().count()
    }
    fn save_current(&mut self, state: &CurrentState) -> Result<(), PersistError> {
        self.0.borrow_mut().save_current(state)
    }
    fn load_current(&self) -> Result<Option<CurrentState>, PersistError> {
        self.0.borrow().load_current()
    }
    fn clear_current(&mut self) -> Result<(), PersistError> {
        self.0.borrow_mut().clear_current()
    }
}

/// Repository whose every call fails, like a full or disabled store.
struct FailingRepo;

fn quota() -> PersistError {
    PersistError::Backend("quota exceeded".into())
}

impl Repository for FailingRepo {
    fn save(&mut self, _: SaveRequest) -> Result<DrawingId, PersistError> {
        Err(quota())
    }
    fn load(&self, _: DrawingId) -> Result<DrawingRecord, PersistError> {
        Err(quota())
    }
    fn list_by_owner(&self, _: &Owner) -> Result<Vec<DrawingRecord>, PersistError> {
        Err(quota())
    }
    fn delete(&mut self, _: DrawingId) -> Result<bool, PersistError> {
        Err(quota())
    }
    fn count(&self) -> Result<usize, PersistError> {
        Err(quota())
    }
    fn save_current(&mut self, _: &CurrentState) -> Result<(), PersistError> {
        Err(quota())
    }
    fn load_current(&self) -> Result<Option<CurrentState>, PersistError> {
        Err(quota())
    }
    fn clear_current(&mut self) -> Result<(), PersistError> {
        Err(quota())
    }
}

// =============================================================
// Strokes
// =============================================================

#[test]
fn brush_stroke_keeps_every_sample() {
    let mut s = store();
    s.begin_stroke(pt(0.0, 0.0));
    s.extend_stroke(pt(10.0, 10.0));
    let id = s.commit_stroke(pt(20.0, 20.0)).unwrap();

    assert_eq!(s.len(), 1);
    let obj = s.get(id).unwrap();
    assert_eq!(obj.kind(), &ObjectKind::Brush);
    assert_eq!(obj.points(), &[pt(0.0, 0.0), pt(10.0, 10.0), pt(20.0, 20.0)]);
    assert!(s.in_progress().is_none());
}

#[test]
fn rectangle_keeps_only_two_corners() {
    let mut s = store_with_tool(Tool::Rectangle);
    s.begin_stroke(pt(0.0, 0.0));
    s.extend_stroke(pt(30.0, 70.0));
    s.extend_stroke(pt(120.0, 10.0));
    let id = s.commit_stroke(pt(100.0, 50.0)).unwrap();

    assert_eq!(s.get(id).unwrap().points(), &[pt(0.0, 0.0), pt(100.0, 50.0)]);
}

#[test]
fn in_progress_shape_tracks_pointer() {
    let mut s = store_with_tool(Tool::Line);
    s.begin_stroke(pt(0.0, 0.0));
    s.extend_stroke(pt(5.0, 5.0));
    s.extend_stroke(pt(9.0, 1.0));
    assert_eq!(s.in_progress().unwrap().points(), &[pt(0.0, 0.0), pt(9.0, 1.0)]);
    assert!(s.is_empty());
}

#[test]
fn stroke_uses_active_settings() {
    let mut s = store();
    s.update_settings(&SettingsPatch {
        color: Some("#00FF00".into()),
        line_width: Some(8.0),
        opacity: Some(0.5),
        ..Default::default()
    });
    let id = draw(&mut s, pt(0.0, 0.0), pt(5.0, 5.0));
    let obj = s.get(id).unwrap();
    assert_eq!(obj.color(), "#00FF00");
    assert_eq!(obj.width(), 8.0);
    assert_eq!(obj.opacity(), 0.5);
    assert_eq!(obj.timestamp(), Some(1_000.0));
}

#[test]
fn begin_stroke_is_noop_for_select_and_text() {
    for tool in [Tool::Select, Tool::Text] {
        let mut s = store_with_tool(tool);
        assert!(s.begin_stroke(pt(0.0, 0.0)).is_none());
        assert!(s.in_progress().is_none());
        assert!(s.commit_stroke(pt(1.0, 1.0)).is_none());
        assert!(s.is_empty());
    }
}

#[test]
fn extend_and_commit_without_stroke_are_noops() {
    let mut s = store();
    assert!(!s.extend_stroke(pt(1.0, 1.0)));
    assert!(s.commit_stroke(pt(1.0, 1.0)).is_none());
    assert!(!s.can_undo());
}

#[test]
fn committed_stroke_has_cached_bounds() {
    let mut s = store();
    let id = draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    assert!(s.get(id).unwrap().has_cached_bounds());
}

#[test]
fn interrupt_commits_at_last_point() {
    let mut s = store();
    s.begin_stroke(pt(0.0, 0.0));
    s.extend_stroke(pt(5.0, 5.0));
    let id = s.interrupt_stroke().unwrap();
    assert_eq!(s.get(id).unwrap().points(), &[pt(0.0, 0.0), pt(5.0, 5.0)]);
}

#[test]
fn interrupt_drops_single_point_stroke() {
    let mut s = store();
    s.begin_stroke(pt(0.0, 0.0));
    assert!(s.interrupt_stroke().is_none());
    assert!(s.is_empty());
    assert!(!s.can_undo());
}

#[test]
fn begin_while_drawing_commits_previous() {
    let mut s = store();
    s.begin_stroke(pt(0.0, 0.0));
    s.extend_stroke(pt(5.0, 5.0));
    s.begin_stroke(pt(50.0, 50.0));
    assert_eq!(s.len(), 1);
    assert_eq!(s.in_progress().unwrap().points(), &[pt(50.0, 50.0)]);
}

#[test]
fn tool_switch_commits_stroke() {
    let mut s = store();
    s.begin_stroke(pt(0.0, 0.0));
    s.extend_stroke(pt(5.0, 5.0));
    s.update_settings(&SettingsPatch::tool(Tool::Select));
    assert_eq!(s.len(), 1);
    assert!(s.in_progress().is_none());
}

#[test]
fn switching_to_text_commits_stroke() {
    let mut s = store();
    s.begin_stroke(pt(0.0, 0.0));
    s.extend_stroke(pt(5.0, 5.0));
    s.update_settings(&SettingsPatch::tool(Tool::Text));
    assert_eq!(s.len(), 1);
    assert_eq!(s.objects()[0].points(), &[pt(0.0, 0.0), pt(5.0, 5.0)]);
    assert!(s.can_undo());
}

#[test]
fn discard_stroke_leaves_scene_untouched() {
    let mut s = store();
    s.begin_stroke(pt(0.0, 0.0));
    s.extend_stroke(pt(5.0, 5.0));
    assert!(s.discard_stroke());
    assert!(!s.discard_stroke());
    assert!(s.is_empty());
}

// =============================================================
// Text
// =============================================================

#[test]
fn add_text_accounts_for_label_extent() {
    let mut s = store();
    let id = s.add_text(DrawingObject::text(pt(5.0, 5.0), "hi", 16.0, "#000000")).unwrap();
    let obj = s.get(id).unwrap();
    let b = obj.bounds().unwrap();
    assert!(b.width >= 2.0 * 16.0 * 0.6 + 2.0 * (obj.width() + 5.0));
    assert!(s.can_undo());
}

#[test]
fn add_text_replaces_nil_and_duplicate_ids() {
    let mut s = store();
    let mut nil = DrawingObject::text(pt(0.0, 0.0), "a", 16.0, "#000000");
    nil.set_id(Uuid::nil());
    let first = s.add_text(nil).unwrap();
    assert!(!first.is_nil());

    let mut dup = DrawingObject::text(pt(0.0, 0.0), "b", 16.0, "#000000");
    dup.set_id(first);
    let second = s.add_text(dup).unwrap();
    assert_ne!(first, second);
    assert_eq!(s.len(), 2);
}

#[test]
fn add_text_without_anchor_is_dropped() {
    let mut s = store();
    let mut obj = DrawingObject::text(pt(0.0, 0.0), "a", 16.0, "#000000");
    obj.set_points(vec![]);
    assert!(s.add_text(obj).is_none());
    assert!(!s.can_undo());
}

// =============================================================
// Delete / update / clear
// =============================================================

#[test]
fn delete_then_undo_restores_object() {
    let mut s = store();
    let id = draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    let before = s.objects().to_vec();

    assert!(s.delete_object(id));
    assert!(s.is_empty());
    assert!(s.undo());
    assert_eq!(s.objects(), before.as_slice());
}

#[test]
fn delete_unknown_id_records_nothing() {
    let mut s = store();
    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    let depth = s.history().undo_depth();
    assert!(!s.delete_object(Uuid::new_v4()));
    assert_eq!(s.history().undo_depth(), depth);
    assert_eq!(s.len(), 1);
}

#[test]
fn update_object_replaces_in_place() {
    let mut s = store();
    let a = draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    let b = draw(&mut s, pt(20.0, 20.0), pt(30.0, 30.0));
    let c = draw(&mut s, pt(40.0, 40.0), pt(50.0, 50.0));

    let moved = s.get(b).unwrap().translated(100.0, 0.0);
    assert!(s.update_object(moved));

    let ids: Vec<ObjectId> = s.objects().iter().map(DrawingObject::id).collect();
    assert_eq!(ids, vec![a, b, c]);
    assert_eq!(s.get(b).unwrap().points()[0], pt(120.0, 20.0));
    assert!(s.get(b).unwrap().has_cached_bounds());
}

#[test]
fn update_unknown_object_records_nothing() {
    let mut s = store();
    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    let depth = s.history().undo_depth();
    assert!(!s.update_object(line(5.0)));
    assert_eq!(s.history().undo_depth(), depth);
}

#[test]
fn update_objects_is_one_undo_step() {
    let mut s = store();
    let a = draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    let b = draw(&mut s, pt(20.0, 20.0), pt(30.0, 30.0));
    let before = s.objects().to_vec();
    let depth = s.history().undo_depth();

    let moved = vec![s.get(a).unwrap().translated(1.0, 1.0), s.get(b).unwrap().translated(1.0, 1.0), line(0.0)];
    assert_eq!(s.update_objects(moved), 2);
    assert_eq!(s.history().undo_depth(), depth + 1);

    s.undo();
    assert_eq!(s.objects(), before.as_slice());
}

#[test]
fn clear_always_records() {
    let mut s = store();
    s.clear();
    assert!(s.can_undo());

    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    s.clear();
    assert!(s.is_empty());
    s.undo();
    assert_eq!(s.len(), 1);
}

// =============================================================
// Undo / redo laws
// =============================================================

#[test]
fn undo_redo_restore_exact_snapshots() {
    let mut s = store();
    let mut states = vec![s.objects().to_vec()];

    let a = draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    states.push(s.objects().to_vec());
    s.add_text(DrawingObject::text(pt(5.0, 5.0), "hi", 16.0, "#000000"));
    states.push(s.objects().to_vec());
    let moved = s.get(a).unwrap().translated(3.0, 4.0);
    s.update_object(moved);
    states.push(s.objects().to_vec());
    s.delete_object(a);
    states.push(s.objects().to_vec());
    s.clear();
    states.push(s.objects().to_vec());

    for expected in states.iter().rev().skip(1) {
        assert!(s.undo());
        assert_eq!(s.objects(), expected.as_slice());
    }
    assert!(!s.undo());

    for expected in states.iter().skip(1) {
        assert!(s.redo());
        assert_eq!(s.objects(), expected.as_slice());
    }
    assert!(!s.redo());
}

#[test]
fn mutation_after_undo_clears_redo() {
    let mut s = store();
    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    s.undo();
    assert!(s.can_redo());

    draw(&mut s, pt(5.0, 5.0), pt(6.0, 6.0));
    assert!(!s.can_redo());
    assert!(!s.redo());
}

#[test]
fn undo_redo_on_empty_history_are_noops() {
    let mut s = store();
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    s.subscribe_scene(move |_| *counter.borrow_mut() += 1);

    assert!(!s.undo());
    assert!(!s.redo());
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn history_limit_from_config() {
    let config = EngineConfig { history_limit: 2, ..EngineConfig::default() };
    let mut s = SceneStore::from_config(&config);
    for i in 0..5 {
        let x = f64::from(i);
        draw(&mut s, pt(x, 0.0), pt(x, 10.0));
    }
    assert_eq!(s.history().undo_depth(), 2);
}

// =============================================================
// Change streams
// =============================================================

#[test]
fn scene_subscribers_see_every_commit() {
    let mut s = store();
    let lens = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lens);
    s.subscribe_scene(move |objects| sink.borrow_mut().push(objects.len()));

    let id = draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    s.delete_object(id);
    s.undo();
    s.redo();

    assert_eq!(*lens.borrow(), vec![1, 2, 1, 2, 1]);
}

#[test]
fn in_progress_stroke_does_not_notify() {
    let mut s = store();
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    s.subscribe_scene(move |_| *counter.borrow_mut() += 1);

    s.begin_stroke(pt(0.0, 0.0));
    s.extend_stroke(pt(1.0, 1.0));
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn settings_update_notifies_settings_only() {
    let mut s = store();
    let scene_calls = Rc::new(RefCell::new(0));
    let settings_seen = Rc::new(RefCell::new(Vec::new()));
    let counter = Rc::clone(&scene_calls);
    let sink = Rc::clone(&settings_seen);
    s.subscribe_scene(move |_| *counter.borrow_mut() += 1);
    s.subscribe_settings(move |settings| sink.borrow_mut().push(settings.color.clone()));

    assert!(s.update_settings(&SettingsPatch { color: Some("#FF0000".into()), ..Default::default() }));
    assert!(!s.update_settings(&SettingsPatch { color: Some("#FF0000".into()), ..Default::default() }));

    assert_eq!(*settings_seen.borrow(), vec!["#FF0000"]);
    assert_eq!(*scene_calls.borrow(), 0);
    assert!(!s.can_undo());
}

#[test]
fn unsubscribed_callbacks_stop() {
    let mut s = store();
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    let id = s.subscribe_scene(move |_| *counter.borrow_mut() += 1);
    assert!(s.unsubscribe_scene(id));
    draw(&mut s, pt(0.0, 0.0), pt(1.0, 1.0));
    assert_eq!(*calls.borrow(), 0);
}

// =============================================================
// Load
// =============================================================

#[test]
fn load_replaces_scene_and_resets_history() {
    let mut s = store();
    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    let settings = DrawingSettings { color: "#ABCDEF".into(), ..DrawingSettings::default() };
    let single_point = DrawingObject::new(ObjectKind::Brush, "#000000", 1.0, vec![pt(0.0, 0.0)]);

    s.load(vec![line(1.0), single_point, line(2.0)], settings.clone());

    assert_eq!(s.len(), 2);
    assert_eq!(s.settings(), &settings);
    assert!(!s.can_undo());
    assert!(s.objects().iter().all(DrawingObject::has_cached_bounds));
}

// =============================================================
// Auto-save
// =============================================================

#[test]
fn commits_write_current_state() {
    let repo = SharedRepo::new();
    let mut s = store();
    s.attach_repository(Box::new(repo.clone()));

    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));

    let saved = repo.load_current().unwrap().unwrap();
    assert_eq!(saved.lines, s.objects());
    assert_eq!(saved.timestamp, 1_000.0);
}

#[test]
fn settings_changes_write_current_state() {
    let repo = SharedRepo::new();
    let mut s = store();
    s.attach_repository(Box::new(repo.clone()));

    s.update_settings(&SettingsPatch::tool(Tool::Circle));

    let saved = repo.load_current().unwrap().unwrap();
    assert_eq!(saved.settings.tool, Tool::Circle);
    assert!(saved.lines.is_empty());
}

#[test]
fn autosave_failure_keeps_scene() {
    let mut s = store();
    s.attach_repository(Box::new(FailingRepo));

    let id = draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    assert!(s.contains(id));
    assert!(s.undo());
    assert!(s.is_empty());
}

#[test]
fn restore_autosave_reloads_scene_and_settings() {
    let repo = SharedRepo::new();
    let mut first = store();
    first.attach_repository(Box::new(repo.clone()));
    first.update_settings(&SettingsPatch { line_width: Some(12.0), ..Default::default() });
    draw(&mut first, pt(0.0, 0.0), pt(10.0, 10.0));

    let mut second = store();
    second.attach_repository(Box::new(repo));
    assert!(second.restore_autosave().unwrap());
    assert_eq!(second.objects(), first.objects());
    assert_eq!(second.settings().line_width, 12.0);
    assert!(!second.can_undo());
}

#[test]
fn restore_autosave_without_state_or_repository() {
    let mut s = store();
    assert!(!s.restore_autosave().unwrap());
    s.attach_repository(Box::new(SharedRepo::new()));
    assert!(!s.restore_autosave().unwrap());
}

#[test]
fn clear_autosave_removes_state() {
    let repo = SharedRepo::new();
    let mut s = store();
    s.attach_repository(Box::new(repo.clone()));
    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));

    s.clear_autosave().unwrap();
    assert!(repo.load_current().unwrap().is_none());
}

#[test]
fn restore_autosave_propagates_read_errors() {
    let mut s = store();
    s.attach_repository(Box::new(FailingRepo));
    assert!(matches!(s.restore_autosave(), Err(PersistError::Backend(_))));
}

// =============================================================
// Named drawings
// =============================================================

#[test]
fn save_as_then_open_round_trips() {
    let mut s = store();
    s.attach_repository(Box::new(SharedRepo::new()));
    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    let saved_objects = s.objects().to_vec();
    let id = s.save_as("My drawing", None, Owner::Anonymous).unwrap();

    s.clear();
    assert!(s.is_empty());

    s.open(id).unwrap();
    assert_eq!(s.objects(), saved_objects.as_slice());
    assert!(!s.can_undo());
    assert!(!s.can_redo());
}

#[test]
fn save_as_with_id_overwrites() {
    let repo = SharedRepo::new();
    let mut s = store();
    s.attach_repository(Box::new(repo.clone()));
    let id = s.save_as("v1", None, Owner::Anonymous).unwrap();
    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    let same = s.save_as("v2", Some(id), Owner::Anonymous).unwrap();

    assert_eq!(id, same);
    assert_eq!(repo.count().unwrap(), 1);
    let record = repo.load(id).unwrap();
    assert_eq!(record.title, "v2");
    assert_eq!(record.lines.len(), 1);
}

#[test]
fn named_drawings_need_a_repository() {
    let mut s = store();
    assert!(matches!(s.save_as("x", None, Owner::Anonymous), Err(PersistError::Backend(_))));
    assert!(matches!(s.open(Uuid::new_v4()), Err(PersistError::Backend(_))));
}

#[test]
fn open_unknown_drawing_keeps_scene() {
    let mut s = store();
    s.attach_repository(Box::new(SharedRepo::new()));
    draw(&mut s, pt(0.0, 0.0), pt(10.0, 10.0));
    let missing = Uuid::new_v4();

    assert!(matches!(s.open(missing), Err(PersistError::NotFound(id)) if id == missing));
    assert_eq!(s.len(), 1);
    assert!(s.can_undo());
}
