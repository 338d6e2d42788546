//! Drawing scene model and interaction engine for the sketchpad whiteboard.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! drawing scene (freehand strokes, shapes and text labels), turns abstract
//! pointer and keyboard input into scene mutations, keeps linear undo/redo
//! history, and paints the result onto a 2D canvas. The host JavaScript layer
//! only wires DOM events to the engine, shows the text editor overlay, and
//! applies the [`engine::Action`]s the engine hands back.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`scene`] | Scene store: objects, settings, history, change streams |
//! | [`object`] | Drawing object variants and their invariants |
//! | [`geometry`] | Bounds, containment, overlap and rescaling |
//! | [`hit`] | Resize handles, topmost-object and marquee hit-testing |
//! | [`input`] | Input event types, UI state and the gesture state machine |
//! | [`settings`] | Active tool and style for new objects |
//! | [`history`] | Whole-scene snapshot undo/redo |
//! | [`signal`] | Single-threaded publish/subscribe |
//! | [`persist`] | Named drawings and auto-save over a key-value store |
//! | [`storage`] | Browser `localStorage` backend |
//! | [`render`] | Scene rendering onto a 2D surface |
//! | [`viewport`] | Client-to-scene mapping and canvas sizing |
//! | [`schedule`] | Debounced resize and staggered settle repaints |
//! | [`config`] | Host-supplied engine configuration |
//! | [`consts`] | Shared numeric constants (padding, handle size, floors, etc.) |

pub mod config;
pub mod consts;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod hit;
pub mod input;
pub mod object;
pub mod persist;
pub mod render;
pub mod scene;
pub mod schedule;
pub mod settings;
pub mod signal;
pub mod storage;
pub mod viewport;
