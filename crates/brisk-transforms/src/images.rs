//! Image compression.

use std::io::Cursor;
use std::sync::LazyLock;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use regex::Regex;

use crate::traits::{Asset, Transform, TransformError};

static SVG_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Invalid SVG comment regex"));

/// Either an element whose whitespace is content (kept verbatim) or a run
/// of whitespace.
static SVG_SCAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<(?:text|style|script)\b[^>]*/>|<text\b.*?</text>|<style\b.*?</style>|<script\b.*?</script>|\s+",
    )
    .expect("Invalid SVG scan regex")
});

/// Compresses images per file type, never making a file larger.
///
/// JPEG is re-encoded at a fixed quality, PNG is optimized losslessly with
/// oxipng, SVG has comments and inter-tag whitespace stripped. Anything else
/// passes through untouched.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptimizer {
    jpeg_quality: u8,
    png_level: u8,
}

impl Default for ImageOptimizer {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            png_level: 5,
        }
    }
}

impl ImageOptimizer {
    pub fn new(jpeg_quality: u8, png_level: u8) -> Result<Self, TransformError> {
        if !(1..=100).contains(&jpeg_quality) {
            return Err(TransformError::InvalidOption(format!(
                "jpeg_quality must be 1-100, got {}",
                jpeg_quality
            )));
        }
        if png_level > 6 {
            return Err(TransformError::InvalidOption(format!(
                "png_level must be 0-6, got {}",
                png_level
            )));
        }
        Ok(Self {
            jpeg_quality,
            png_level,
        })
    }

    fn compress_jpeg(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .map_err(|e| TransformError::Syntax {
                line: None,
                message: format!("JPEG decode error: {}", e),
            })?;

        let mut out = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
        DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(encoder)
            .map_err(|e| TransformError::Encode(format!("JPEG encode error: {}", e)))?;

        Ok(out.into_inner())
    }

    fn compress_png(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        let options = oxipng::Options::from_preset(self.png_level);
        oxipng::optimize_from_memory(bytes, &options).map_err(|e| TransformError::Syntax {
            line: None,
            message: format!("PNG optimize error: {}", e),
        })
    }
}

/// Strip comments and whitespace between tags. Attributes (including
/// `viewBox` and ids) are left alone, as is everything inside `<text>`,
/// `<style>` and `<script>`.
pub fn minify_svg(source: &str) -> String {
    let text = SVG_COMMENT_RE.replace_all(source, "");
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in SVG_SCAN_RE.find_iter(&text) {
        out.push_str(&text[last..m.start()]);
        let is_gap = !m.as_str().starts_with('<')
            && out.ends_with('>')
            && text[m.end()..].starts_with('<');
        if !is_gap {
            out.push_str(m.as_str());
        }
        last = m.end();
    }
    out.push_str(&text[last..]);

    out.trim().to_string()
}

impl Transform for ImageOptimizer {
    fn name(&self) -> &'static str {
        "imagemin"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, TransformError> {
        let compressed = match asset.extension().as_str() {
            "jpg" | "jpeg" => self.compress_jpeg(&asset.contents)?,
            "png" => self.compress_png(&asset.contents)?,
            "svg" => minify_svg(asset.text()?).into_bytes(),
            _ => return Ok(asset),
        };

        if compressed.len() < asset.contents.len() {
            asset.contents = compressed;
        }
        Ok(asset)
    }
}
