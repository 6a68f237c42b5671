//! Core engine of a layer-based vector drawing editor.
//!
//! The crate is the headless heart of the editor: a layered shape document
//! on a fixed artboard, the geometry kernel behind selection, move, resize
//! and crop, snapshot-based undo/redo, a raster asset store with deferred
//! decoding, and the JSON interchange format. Rendering and input handling
//! live in the embedding application; everything here is synchronous,
//! deterministic and testable on its own.
//!
//! The usual entry point is [`EditorSession`], which owns a [`Document`],
//! an [`AssetStore`] and a [`History`] and exposes the pointer-gesture
//! lifecycle the UI drives.

pub mod assets;
pub mod color;
pub mod crop;
pub mod document;
pub mod file_io;
pub mod geometry;
pub mod history;
pub mod layers;
pub mod select;
pub mod session;
pub mod shapes;
pub mod transform;

pub use assets::{AssetId, AssetRecord, AssetStore};
pub use color::Color;
pub use crop::crop_document;
pub use document::{Document, ARTBOARD_STEP};
pub use geometry::{Point, Rect};
pub use history::{History, Snapshot};
pub use layers::{Layer, LayerId};
pub use session::{EditorSession, Tool, DEFAULT_GRID};
pub use shapes::{Shape, ShapeId, ShapeKind, CIRCLE_SEGMENTS};
pub use transform::Handle;
