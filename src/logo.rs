use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{ImageFormat, RgbaImage};
use std::fs;
use std::path::Path;

use crate::error::{ComposeError, Result};

/// Longest edge an SVG logo is rasterized to before compositing.
#[cfg(feature = "svg")]
const SVG_RASTER_SIZE: f32 = 512.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoFormat {
    Png,
    Jpeg,
    Svg,
}

impl LogoFormat {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(LogoFormat::Png),
            "image/jpeg" | "image/jpg" => Some(LogoFormat::Jpeg),
            "image/svg+xml" => Some(LogoFormat::Svg),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(LogoFormat::Png),
            "jpg" | "jpeg" => Some(LogoFormat::Jpeg),
            "svg" => Some(LogoFormat::Svg),
            _ => None,
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Png) => return Some(LogoFormat::Png),
            Ok(ImageFormat::Jpeg) => return Some(LogoFormat::Jpeg),
            _ => {}
        }
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
        let head = head.trim_start();
        if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
            Some(LogoFormat::Svg)
        } else {
            None
        }
    }
}

/// An uploaded logo, decoded to RGBA.
#[derive(Debug, Clone)]
pub struct LogoAsset {
    image: RgbaImage,
    format: LogoFormat,
    source_name: String,
}

impl LogoAsset {
    pub fn open(path: &Path) -> Result<Self> {
        let source_name = path.display().to_string();
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(LogoFormat::from_extension)
            .ok_or_else(|| {
                ComposeError::asset(&source_name, "only png, jpeg and svg logos are supported")
            })?;
        let bytes = fs::read(path).map_err(|e| ComposeError::asset(&source_name, e))?;
        Self::from_bytes(&bytes, Some(format), source_name)
    }

    /// Decodes `bytes`; the format is sniffed when no hint is given.
    pub fn from_bytes(
        bytes: &[u8],
        hint: Option<LogoFormat>,
        source_name: impl Into<String>,
    ) -> Result<Self> {
        let source_name = source_name.into();
        if bytes.is_empty() {
            return Err(ComposeError::asset(&source_name, "file is empty"));
        }
        let format = hint
            .or_else(|| LogoFormat::sniff(bytes))
            .ok_or_else(|| ComposeError::asset(&source_name, "unrecognized image type"))?;

        let image = match format {
            LogoFormat::Png => decode_raster(bytes, ImageFormat::Png, &source_name)?,
            LogoFormat::Jpeg => decode_raster(bytes, ImageFormat::Jpeg, &source_name)?,
            LogoFormat::Svg => rasterize_svg(bytes, &source_name)?,
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(ComposeError::asset(&source_name, "image has no pixels"));
        }

        tracing::debug!(
            "loaded logo {} ({:?}, {}x{})",
            source_name,
            format,
            image.width(),
            image.height()
        );

        Ok(LogoAsset {
            image,
            format,
            source_name,
        })
    }

    /// Accepts `data:<mime>[;param...];base64,<payload>` URLs.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ComposeError::asset("data URL", "missing data: scheme"))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| ComposeError::asset("data URL", "missing payload"))?;
        // media type first, optional parameters such as charset, base64 last
        let mut params = meta.split(';').map(str::trim);
        let mime = params.next().unwrap_or_default();
        if params.last() != Some("base64") {
            return Err(ComposeError::asset("data URL", "payload is not base64"));
        }
        let format = LogoFormat::from_mime(mime)
            .ok_or_else(|| ComposeError::asset("data URL", format!("unsupported type {}", mime)))?;
        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| ComposeError::asset("data URL", e))?;
        Self::from_bytes(&bytes, Some(format), "data URL")
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn format(&self) -> LogoFormat {
        self.format
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

fn decode_raster(bytes: &[u8], format: ImageFormat, source_name: &str) -> Result<RgbaImage> {
    image::load_from_memory_with_format(bytes, format)
        .map(|img| img.to_rgba8())
        .map_err(|e| ComposeError::asset(source_name, e))
}

#[cfg(feature = "svg")]
fn rasterize_svg(bytes: &[u8], source_name: &str) -> Result<RgbaImage> {
    use image::Rgba;
    use resvg::{tiny_skia, usvg};

    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
        .map_err(|e| ComposeError::asset(source_name, e))?;
    let size = tree.size();
    let scale = SVG_RASTER_SIZE / size.width().max(size.height());
    let width = (size.width() * scale).round().max(1.0) as u32;
    let height = (size.height() * scale).round().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ComposeError::asset(source_name, "invalid SVG dimensions"))?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let mut image = RgbaImage::new(width, height);
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(image)
}

#[cfg(not(feature = "svg"))]
fn rasterize_svg(_bytes: &[u8], source_name: &str) -> Result<RgbaImage> {
    Err(ComposeError::asset(
        source_name,
        "SVG logos need the `svg` feature",
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_sniffs_png() {
        let bytes = png_bytes(10, 20, [255, 0, 0, 255]);
        let logo = LogoAsset::from_bytes(&bytes, None, "red.png").unwrap();
        assert_eq!(logo.format(), LogoFormat::Png);
        assert_eq!(logo.image().dimensions(), (10, 20));
        assert_eq!(logo.source_name(), "red.png");
    }

    #[test]
    fn test_rejects_garbage() {
        let err = LogoAsset::from_bytes(b"not an image", None, "x.bin").unwrap_err();
        assert!(matches!(err, ComposeError::AssetRead { .. }));
        let err = LogoAsset::from_bytes(b"", None, "empty.png").unwrap_err();
        assert!(matches!(err, ComposeError::AssetRead { .. }));
    }

    #[test]
    fn test_corrupt_png_is_asset_error() {
        let err = LogoAsset::from_bytes(&[0x89, b'P', b'N', b'G', 0, 1], Some(LogoFormat::Png), "bad.png")
            .unwrap_err();
        assert!(matches!(err, ComposeError::AssetRead { .. }));
    }

    #[test]
    fn test_data_url() {
        let bytes = png_bytes(4, 4, [0, 0, 255, 255]);
        let url = format!("data:image/png;base64,{}", BASE64.encode(&bytes));
        let logo = LogoAsset::from_data_url(&url).unwrap();
        assert_eq!(logo.image().dimensions(), (4, 4));

        let url = format!(
            "data:image/png;charset=utf-8;base64,{}",
            BASE64.encode(&bytes)
        );
        assert_eq!(LogoAsset::from_data_url(&url).unwrap().format(), LogoFormat::Png);

        assert!(LogoAsset::from_data_url("data:image/png,rawbytes").is_err());
        assert!(LogoAsset::from_data_url("data:image/png;base64;charset=utf-8,AAAA").is_err());
        assert!(LogoAsset::from_data_url("data:image/gif;base64,AAAA").is_err());
        assert!(LogoAsset::from_data_url("https://example.com/logo.png").is_err());
    }

    #[test]
    fn test_mime_and_extension() {
        assert_eq!(LogoFormat::from_mime("image/jpg"), Some(LogoFormat::Jpeg));
        assert_eq!(LogoFormat::from_mime("image/svg+xml"), Some(LogoFormat::Svg));
        assert_eq!(LogoFormat::from_mime("image/gif"), None);
        assert_eq!(LogoFormat::from_extension("JPEG"), Some(LogoFormat::Jpeg));
        assert_eq!(LogoFormat::from_extension("bmp"), None);
    }

    #[cfg(feature = "svg")]
    #[test]
    fn test_svg_logo() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="#00ff00"/></svg>"##;
        let logo = LogoAsset::from_bytes(svg, None, "logo.svg").unwrap();
        assert_eq!(logo.format(), LogoFormat::Svg);
        assert_eq!(logo.image().dimensions(), (512, 256));
        assert_eq!(logo.image().get_pixel(256, 128).0, [0, 255, 0, 255]);

        let url = format!(
            "data:image/svg+xml;charset=utf-8;base64,{}",
            BASE64.encode(svg)
        );
        let logo = LogoAsset::from_data_url(&url).unwrap();
        assert_eq!(logo.format(), LogoFormat::Svg);
    }
}
