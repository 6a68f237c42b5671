//! Saving and loading the JSON interchange document.
//!
//! The on-disk form carries the artboard, the full layer stack, the complete
//! history (entries plus index, so undo survives a reload) and the portable
//! asset sources. Pixels are never written; every asset comes back pending
//! and re-decodes from its base64 source.
//!
//! Loading is the one place in the crate where bad input surfaces as an
//! error instead of being silently dropped: a malformed or inconsistent
//! document is rejected whole.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assets::{AssetRecord, AssetStore};
use crate::document::Document;
use crate::history::{History, Snapshot};
use crate::layers::Layer;
use crate::session::EditorSession;
use crate::shapes::ShapeKind;

/// The interchange document, exactly as serialized.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentFile {
    artboard_width: f64,
    artboard_height: f64,
    layers: Vec<Layer>,
    history: Vec<Snapshot>,
    history_index: isize,
    assets: Vec<AssetRecord>,
}

/// Serialize a session to the interchange JSON.
pub fn to_json(session: &EditorSession) -> Result<String> {
    let file = DocumentFile {
        artboard_width: session.document().artboard_width(),
        artboard_height: session.document().artboard_height(),
        layers: session.document().layers().to_vec(),
        history: session.history().entries().to_vec(),
        history_index: session.history().index(),
        assets: session.assets().export_records(),
    };
    serde_json::to_string_pretty(&file).context("failed to serialize document")
}

/// Parse and validate interchange JSON into a fresh session. Assets come
/// back pending; call [`EditorSession::resolve_assets`] to decode them.
pub fn from_json(json: &str) -> Result<EditorSession> {
    let file: DocumentFile =
        serde_json::from_str(json).context("malformed document file")?;
    validate(&file)?;

    let document = Document::from_parts(file.artboard_width, file.artboard_height, file.layers);
    let history = History::from_parts(file.history, file.history_index);
    let assets = AssetStore::from_records(file.assets);
    Ok(EditorSession::from_parts(document, history, assets))
}

pub fn save(session: &EditorSession, path: &Path) -> Result<()> {
    let json = to_json(session)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "document saved");
    Ok(())
}

pub fn load(path: &Path) -> Result<EditorSession> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let session = from_json(&json).with_context(|| format!("invalid document {}", path.display()))?;
    info!(path = %path.display(), "document loaded");
    Ok(session)
}

/// Cross-field consistency checks that serde cannot express.
fn validate(file: &DocumentFile) -> Result<()> {
    if !file.artboard_width.is_finite()
        || !file.artboard_height.is_finite()
        || file.artboard_width <= 0.0
        || file.artboard_height <= 0.0
    {
        bail!(
            "invalid artboard dimensions {}x{}",
            file.artboard_width,
            file.artboard_height
        );
    }
    if file.layers.is_empty() {
        bail!("document has no layers");
    }

    let asset_ids: std::collections::HashSet<_> = file.assets.iter().map(|a| a.id).collect();
    let all_layers = file
        .layers
        .iter()
        .chain(file.history.iter().flat_map(|s| s.layers.iter()));
    for layer in all_layers {
        for shape in &layer.shapes {
            if let ShapeKind::Image { asset, .. } = shape.kind {
                if !asset_ids.contains(&asset) {
                    bail!("shape {} references unknown asset {asset}", shape.id);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::{Point, Rect};
    use crate::session::Tool;

    fn drawn_session() -> EditorSession {
        let mut s = EditorSession::new(128.0, 128.0);
        s.set_snap_enabled(false);
        s.set_color(Color::from_hex("#ff8800").unwrap());
        s.set_tool(Tool::Rectangle);
        s.begin_drag(Point::new(10.0, 10.0));
        s.update_drag(Point::new(40.0, 30.0));
        s.commit_drag();
        s.set_tool(Tool::Line);
        s.begin_drag(Point::new(0.0, 0.0));
        s.update_drag(Point::new(100.0, 100.0));
        s.commit_drag();
        s
    }

    #[test]
    fn round_trip_preserves_document_and_history() {
        let session = drawn_session();
        let json = to_json(&session).unwrap();
        let loaded = from_json(&json).unwrap();

        assert_eq!(loaded.document(), session.document());
        assert_eq!(loaded.history().entries(), session.history().entries());
        assert_eq!(loaded.history().index(), session.history().index());

        // Undo still works after a reload.
        let mut loaded = loaded;
        assert!(loaded.undo());
        assert_eq!(loaded.document().shape_count(), 1);
    }

    #[test]
    fn save_and_load_through_the_filesystem() {
        let session = drawn_session();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawing.json");

        save(&session, &path).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.document(), session.document());
    }

    #[test]
    fn assets_reload_as_pending_sources() {
        use image::{DynamicImage, ImageFormat, RgbaImage};
        use std::io::Cursor;

        let img = RgbaImage::from_pixel(6, 4, image::Rgba([9, 9, 9, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();

        let mut session = EditorSession::new(128.0, 128.0);
        let id = session.add_image(&buf, Point::new(0.0, 0.0)).unwrap();
        let ShapeKind::Image { asset, .. } = &session.document().shape(id).unwrap().kind else {
            panic!("expected image shape");
        };
        let asset = *asset;

        let json = to_json(&session).unwrap();
        let mut loaded = from_json(&json).unwrap();
        assert!(loaded.assets().contains(asset));
        assert!(!loaded.assets().is_ready(asset));
        assert_eq!(loaded.resolve_assets(), 1);
        assert_eq!(loaded.assets().dimensions(asset), Some((6, 4)));
    }

    #[test]
    fn crop_after_load_keeps_partially_overlapping_images() {
        use image::{DynamicImage, ImageFormat, RgbaImage};
        use std::io::Cursor;

        let img = RgbaImage::from_pixel(64, 64, image::Rgba([5, 5, 5, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();

        let mut session = EditorSession::new(128.0, 128.0);
        session.add_image(&buf, Point::new(0.0, 0.0)).unwrap();

        // Reload and crop before any asset had a chance to decode.
        let json = to_json(&session).unwrap();
        let mut loaded = from_json(&json).unwrap();
        assert!(loaded.assets().has_pending());

        loaded.set_tool(Tool::Crop);
        loaded.begin_drag(Point::new(32.0, 32.0));
        loaded.update_drag(Point::new(96.0, 96.0));
        loaded.commit_drag();

        assert_eq!(loaded.document().shape_count(), 1);
        let shape = &loaded.document().layers()[0].shapes[0];
        assert_eq!(shape.bounds().unwrap(), Rect::new(32.0, 32.0, 32.0, 32.0));
        let ShapeKind::Image { asset, .. } = &shape.kind else {
            panic!("expected image, got {:?}", shape.kind);
        };
        assert_eq!(loaded.assets().dimensions(*asset), Some((32, 32)));
    }

    #[test]
    fn garbage_and_inconsistent_documents_are_rejected() {
        assert!(from_json("not json").is_err());
        assert!(from_json("{}").is_err());

        // Structurally valid but with a dangling asset reference.
        let json = to_json(&drawn_session()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["layers"][0]["shapes"][0]["kind"] = serde_json::json!({
            "Image": {
                "start": { "x": 0.0, "y": 0.0 },
                "end": { "x": 10.0, "y": 10.0 },
                "asset": uuid::Uuid::new_v4(),
            }
        });
        assert!(from_json(&value.to_string()).is_err());

        // Bad artboard.
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["artboard_width"] = serde_json::json!(-5.0);
        assert!(from_json(&value.to_string()).is_err());

        // No layers.
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["layers"] = serde_json::json!([]);
        assert!(from_json(&value.to_string()).is_err());
    }

    #[test]
    fn out_of_range_history_index_is_clamped_on_load() {
        let json = to_json(&drawn_session()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["history_index"] = serde_json::json!(99);
        let loaded = from_json(&value.to_string()).unwrap();
        assert_eq!(loaded.history().index(), loaded.history().len() as isize - 1);
    }
}
