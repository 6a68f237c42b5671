//! Raster asset store.
//!
//! Assets are immutable once inserted: shapes reference them by id and crop
//! produces a brand-new asset instead of touching pixel content in place.
//! The portable source is the base64-encoded image file; decoding is
//! deferred to an explicit `resolve_pending` step driven by the event loop,
//! so mutation paths never block on image decode. A shape whose asset is
//! still resolving is valid, just visually incomplete.

use std::collections::HashMap;
use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Raster asset identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sub-rectangle in asset pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Portable form of an asset, as it appears in the interchange document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    /// Base64-encoded image file (re-encodable source).
    pub source: String,
}

struct RasterAsset {
    source: String,
    pixels: Option<RgbaImage>,
}

/// Owns every raster asset in the document and the queue of assets still
/// waiting for decode.
#[derive(Default)]
pub struct AssetStore {
    assets: HashMap<AssetId, RasterAsset>,
    pending: Vec<AssetId>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an already-encoded source and queue it for decode.
    pub fn insert_encoded(&mut self, source: String) -> AssetId {
        let id = AssetId::new();
        self.assets.insert(id, RasterAsset { source, pixels: None });
        self.pending.push(id);
        id
    }

    /// Insert raw image file bytes (PNG/JPEG).
    pub fn insert_bytes(&mut self, bytes: &[u8]) -> AssetId {
        self.insert_encoded(BASE64.encode(bytes))
    }

    /// Queue decode for an asset whose pixels are missing. Used after a
    /// history restore or document load.
    pub fn request(&mut self, id: AssetId) {
        if let Some(asset) = self.assets.get(&id) {
            if asset.pixels.is_none() && !self.pending.contains(&id) {
                self.pending.push(id);
            }
        }
    }

    /// Decode everything queued. Returns the number of assets that became
    /// ready, the completion signal the render path consumes.
    pub fn resolve_pending(&mut self) -> usize {
        let queued = std::mem::take(&mut self.pending);
        let mut resolved = 0;
        for id in queued {
            let Some(asset) = self.assets.get_mut(&id) else {
                continue;
            };
            if asset.pixels.is_some() {
                continue;
            }
            match decode_source(&asset.source) {
                Ok(pixels) => {
                    debug!(%id, width = pixels.width(), height = pixels.height(), "asset decoded");
                    asset.pixels = Some(pixels);
                    resolved += 1;
                }
                Err(err) => {
                    warn!(%id, "failed to decode asset: {err:#}");
                }
            }
        }
        resolved
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.assets.contains_key(&id)
    }

    /// True once the asset has decoded pixels.
    pub fn is_ready(&self, id: AssetId) -> bool {
        self.assets.get(&id).is_some_and(|a| a.pixels.is_some())
    }

    /// True while any queued asset is still waiting for decode.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pixels(&self, id: AssetId) -> Option<&RgbaImage> {
        self.assets.get(&id)?.pixels.as_ref()
    }

    pub fn source(&self, id: AssetId) -> Option<&str> {
        self.assets.get(&id).map(|a| a.source.as_str())
    }

    /// Decoded pixel dimensions, once ready.
    pub fn dimensions(&self, id: AssetId) -> Option<(u32, u32)> {
        let pixels = self.pixels(id)?;
        Some((pixels.width(), pixels.height()))
    }

    /// Decoded pixel dimensions, decoding the source on the spot when the
    /// asset is still pending. Commits run in the quiescent state between
    /// operations, so an inline decode cannot race the event loop.
    pub fn ensure_ready(&mut self, id: AssetId) -> Result<(u32, u32)> {
        let asset = self
            .assets
            .get_mut(&id)
            .ok_or_else(|| anyhow!("unknown asset {id}"))?;
        if asset.pixels.is_none() {
            asset.pixels = Some(decode_source(&asset.source)?);
        }
        let dims = asset
            .pixels
            .as_ref()
            .map(|p| (p.width(), p.height()))
            .ok_or_else(|| anyhow!("asset {id} has no pixels"))?;
        self.pending.retain(|p| *p != id);
        Ok(dims)
    }

    /// Crop a sub-rectangle of `id` into a new asset, leaving the original
    /// untouched. The new asset is ready immediately and carries its own
    /// re-encoded portable source.
    pub fn crop(&mut self, id: AssetId, sub: PixelRect) -> Result<AssetId> {
        if sub.width == 0 || sub.height == 0 {
            return Err(anyhow!("empty crop rectangle"));
        }
        let (width, height) = self.ensure_ready(id)?;
        if sub.x + sub.width > width || sub.y + sub.height > height {
            return Err(anyhow!("crop {sub:?} outside asset bounds {width}x{height}"));
        }
        let pixels = self
            .pixels(id)
            .ok_or_else(|| anyhow!("asset {id} has no pixels"))?;

        let cropped =
            image::imageops::crop_imm(pixels, sub.x, sub.y, sub.width, sub.height).to_image();
        let source = encode_png(&cropped)?;

        let new_id = AssetId::new();
        self.assets.insert(
            new_id,
            RasterAsset {
                source,
                pixels: Some(cropped),
            },
        );
        debug!(from = %id, to = %new_id, ?sub, "asset cropped");
        Ok(new_id)
    }

    /// Portable records for persistence (sources only, never pixels).
    pub fn export_records(&self) -> Vec<AssetRecord> {
        let mut records: Vec<AssetRecord> = self
            .assets
            .iter()
            .map(|(id, a)| AssetRecord {
                id: *id,
                source: a.source.clone(),
            })
            .collect();
        records.sort_by_key(|r| r.id.0);
        records
    }

    /// Rebuild a store from persisted records. Every asset starts pending
    /// and resolves asynchronously.
    pub fn from_records(records: Vec<AssetRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store
                .assets
                .insert(record.id, RasterAsset { source: record.source, pixels: None });
            store.pending.push(record.id);
        }
        store
    }
}

fn decode_source(source: &str) -> Result<RgbaImage> {
    let bytes = BASE64.decode(source).context("invalid base64 asset source")?;
    let img = image::load_from_memory(&bytes).context("unsupported image data")?;
    Ok(img.to_rgba8())
}

fn encode_png(pixels: &RgbaImage) -> Result<String> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(pixels.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("failed to encode cropped asset")?;
    Ok(BASE64.encode(buf))
}
