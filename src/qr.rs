use image::{ImageBuffer, Rgba, RgbaImage};
use qrcode::{Color, EcLevel, QrCode};
use std::fmt;

use crate::error::{ComposeError, Result};

#[cfg(feature = "verify")]
use image::GrayImage;
#[cfg(feature = "verify")]
use rqrr::PreparedImage;

/// Quiet zone width, in modules, when the margin is enabled.
pub const QUIET_ZONE_MODULES: usize = 4;

const DARK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Trimmed text together with its QR matrix at level H.
#[derive(Clone)]
pub struct EncodedPayload {
    text: String,
    code: QrCode,
}

impl fmt::Debug for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedPayload")
            .field("text", &self.text)
            .field("version", &self.code.version())
            .finish()
    }
}

impl EncodedPayload {
    pub fn new(input: &str) -> Result<Self> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ComposeError::EmptyInput);
        }
        let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::H)
            .map_err(|e| ComposeError::Encode(e.to_string()))?;
        Ok(EncodedPayload {
            text: text.to_string(),
            code,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn code(&self) -> &QrCode {
        &self.code
    }

    /// Modules per side, without quiet zone.
    pub fn modules(&self) -> usize {
        self.code.width()
    }
}

/// Rasterizes the matrix into an exact `size` x `size` bitmap.
pub fn render_matrix(code: &QrCode, size: u32, quiet_zone: bool) -> Result<RgbaImage> {
    if size == 0 {
        return Err(ComposeError::raster("cannot render a QR code at 0px"));
    }

    let qr_size = code.width();
    let margin = if quiet_zone { QUIET_ZONE_MODULES } else { 0 };
    let total = (qr_size + 2 * margin) as u64;
    let colors = code.to_colors();

    let module_at = |px: u32| -> usize { (px as u64 * total / size as u64) as usize };

    let image = ImageBuffer::from_fn(size, size, |x, y| {
        let (col, row) = (module_at(x), module_at(y));
        if row >= margin && row < qr_size + margin && col >= margin && col < qr_size + margin {
            if colors[(row - margin) * qr_size + (col - margin)] == Color::Dark {
                return DARK;
            }
        }
        LIGHT
    });

    Ok(image)
}

/// Renders the symbol with half blocks for a terminal, centred in the
/// current terminal. `cutout_fraction` blanks the centre square covering
/// that fraction of the symbol edge.
pub fn render_terminal(code: &QrCode, cutout_fraction: Option<f64>) -> String {
    use terminal_size::{terminal_size, Height, Width};

    let qr_size = code.width();
    let colors = code.to_colors();

    let (term_width, term_height) = terminal_size()
        .map(|(Width(w), Height(h))| {
            if w < 40 || h < 30 {
                (120, 60)
            } else {
                (w as usize, h as usize)
            }
        })
        .unwrap_or((120, 60));

    let qr_with_quiet = qr_size + 2 * QUIET_ZONE_MODULES;
    let display_height = (qr_with_quiet + 1) / 2;

    let pad_left = term_width.saturating_sub(qr_with_quiet) / 2;
    let pad_top = term_height.saturating_sub(display_height + 8) / 2;

    // Cut-out bounds in module units, measured on the quiet-zoned grid.
    let cutout = cutout_fraction.map(|fraction| {
        let half = fraction * qr_with_quiet as f64 / 2.0;
        let mid = qr_with_quiet as f64 / 2.0;
        (mid - half, mid + half)
    });

    let is_dark = |row: usize, col: usize| -> bool {
        if let Some((lo, hi)) = cutout {
            let (cy, cx) = (row as f64 + 0.5, col as f64 + 0.5);
            if cy > lo && cy < hi && cx > lo && cx < hi {
                return false;
            }
        }
        let m = QUIET_ZONE_MODULES;
        if row >= m && row < qr_size + m && col >= m && col < qr_size + m {
            colors[(row - m) * qr_size + (col - m)] == Color::Dark
        } else {
            false
        }
    };

    let mut result = String::new();
    let left_pad = " ".repeat(pad_left);

    for _ in 0..pad_top {
        result.push('\n');
    }

    for pair in 0..display_height {
        let top_row = pair * 2;
        let bottom_row = top_row + 1;

        result.push_str(&left_pad);
        for col in 0..qr_with_quiet {
            let top_dark = is_dark(top_row, col);
            let bottom_dark = bottom_row < qr_with_quiet && is_dark(bottom_row, col);

            result.push(match (top_dark, bottom_dark) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        result.push('\n');
    }

    result
}

/// Reads the payload back out of a composed image.
#[cfg(feature = "verify")]
pub fn decode_payload(image: &RgbaImage) -> Result<String> {
    let gray: GrayImage = image::DynamicImage::ImageRgba8(image.clone()).to_luma8();
    let mut prepared = PreparedImage::prepare(gray);
    let grids = prepared.detect_grids();

    let grid = grids
        .first()
        .ok_or_else(|| ComposeError::Decode("no QR code found in image".to_string()))?;

    let (_, content) = grid
        .decode()
        .map_err(|e| ComposeError::Decode(format!("{:?}", e)))?;

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_trimmed() {
        let payload = EncodedPayload::new("  https://example.com \n").unwrap();
        assert_eq!(payload.text(), "https://example.com");
        assert!(payload.modules() >= 21);
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(EncodedPayload::new("   "), Err(ComposeError::EmptyInput)));
        assert!(matches!(EncodedPayload::new(""), Err(ComposeError::EmptyInput)));
    }

    #[test]
    fn test_payload_too_long() {
        let text = "x".repeat(4000);
        assert!(matches!(EncodedPayload::new(&text), Err(ComposeError::Encode(_))));
    }

    #[test]
    fn test_render_exact_size() {
        let payload = EncodedPayload::new("Hello, World!").unwrap();
        for size in [100, 256, 333] {
            let image = render_matrix(payload.code(), size, true).unwrap();
            assert_eq!(image.dimensions(), (size, size));
        }
        assert!(render_matrix(payload.code(), 0, true).is_err());
    }

    #[test]
    fn test_quiet_zone_is_light() {
        let payload = EncodedPayload::new("Hello, World!").unwrap();
        let image = render_matrix(payload.code(), 256, true).unwrap();
        assert_eq!(*image.get_pixel(0, 0), LIGHT);
        assert_eq!(*image.get_pixel(255, 255), LIGHT);

        // Top-left finder pattern starts right after the margin.
        let total = (payload.modules() + 2 * QUIET_ZONE_MODULES) as u32;
        let px = (QUIET_ZONE_MODULES as u32 * 256 + 128) / total + 1;
        assert_eq!(*image.get_pixel(px, px), DARK);
    }

    #[test]
    fn test_terminal_cutout_blanks_centre() {
        let payload = EncodedPayload::new("https://example.com").unwrap();
        let plain = render_terminal(payload.code(), None);
        let cut = render_terminal(payload.code(), Some(0.3));
        let dark = |s: &str| s.chars().filter(|c| matches!(c, '█' | '▀' | '▄')).count();
        assert!(dark(&cut) < dark(&plain));
    }

    #[cfg(feature = "verify")]
    #[test]
    fn test_qr_roundtrip() {
        let payload = EncodedPayload::new("Test data for QR code roundtrip").unwrap();
        let image = render_matrix(payload.code(), 512, true).unwrap();
        assert_eq!(decode_payload(&image).unwrap(), payload.text());
    }
}
