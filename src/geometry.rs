use std::fmt;

use crate::error::{ComposeError, Result};

/// Edge length of the on-screen QR canvas, in pixels.
pub const QR_SIZE: u32 = 256;

pub const CUTOUT_SIZE_RATIO: f64 = 0.12;
pub const CUTOUT_MAX_RATIO: f64 = 0.15;
pub const CUTOUT_PADDING_RATIO: f64 = 0.15;

/// Export sizes offered by the front ends.
pub const STANDARD_EXPORT_SIZES: [u32; 3] = [256, 512, 1024];

/// Largest edge, in pixels, any raster is allowed to have.
pub const MAX_EXPORT_SIZE: u32 = 8192;

/// Raster scale used for PDF export.
pub const PDF_RENDER_SCALE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryConfig {
    pub canvas_size: u32,
    pub default_ratio: f64,
    pub max_ratio: f64,
    pub padding_ratio: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig {
            canvas_size: QR_SIZE,
            default_ratio: CUTOUT_SIZE_RATIO,
            max_ratio: CUTOUT_MAX_RATIO,
            padding_ratio: CUTOUT_PADDING_RATIO,
        }
    }
}

impl GeometryConfig {
    pub fn cutout(&self) -> CutoutGeometry {
        compute_cutout_geometry(
            self.canvas_size as f64,
            self.default_ratio,
            self.max_ratio,
            self.padding_ratio,
        )
    }
}

/// Raised when the configured ratios cannot produce a usable logo area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigurationWarning {
    PaddingExceedsHalf { padding: f64, cutout_size: f64 },
    InvalidRatio { name: &'static str, value: f64 },
}

impl fmt::Display for ConfigurationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationWarning::PaddingExceedsHalf {
                padding,
                cutout_size,
            } => write!(
                f,
                "padding {:.3}px leaves no room for a logo in a {:.3}px cut-out",
                padding, cutout_size
            ),
            ConfigurationWarning::InvalidRatio { name, value } => {
                write!(f, "{} must be a finite, non-negative ratio (got {})", name, value)
            }
        }
    }
}

/// Sizes of the centre cut-out, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoutGeometry {
    pub cutout_size: f64,
    pub padding: f64,
    pub logo_area_size: f64,
    pub warning: Option<ConfigurationWarning>,
}

impl CutoutGeometry {
    pub fn has_logo_area(&self) -> bool {
        self.logo_area_size > 0.0
    }

    pub fn scaled(&self, scale: f64) -> CutoutGeometry {
        CutoutGeometry {
            cutout_size: self.cutout_size * scale,
            padding: self.padding * scale,
            logo_area_size: self.logo_area_size * scale,
            warning: self.warning,
        }
    }
}

fn sanitize_ratio(
    name: &'static str,
    value: f64,
    warning: &mut Option<ConfigurationWarning>,
) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warning.get_or_insert(ConfigurationWarning::InvalidRatio { name, value });
        0.0
    }
}

/// The cut-out takes the smaller of the default and the ceiling ratio; the
/// logo area never goes negative. Problems are reported in `warning`, not
/// logged.
pub fn compute_cutout_geometry(
    canvas_size: f64,
    default_ratio: f64,
    max_ratio: f64,
    padding_ratio: f64,
) -> CutoutGeometry {
    let mut warning = None;
    let default_ratio = sanitize_ratio("default_ratio", default_ratio, &mut warning);
    let max_ratio = sanitize_ratio("max_ratio", max_ratio, &mut warning);
    let padding_ratio = sanitize_ratio("padding_ratio", padding_ratio, &mut warning);

    let cutout_size = f64::min(canvas_size * default_ratio, canvas_size * max_ratio);
    let padding = cutout_size * padding_ratio;
    let mut logo_area_size = cutout_size - 2.0 * padding;

    if logo_area_size < 0.0 {
        logo_area_size = 0.0;
        warning.get_or_insert(ConfigurationWarning::PaddingExceedsHalf {
            padding,
            cutout_size,
        });
    }

    CutoutGeometry {
        cutout_size,
        padding,
        logo_area_size,
        warning,
    }
}

/// Scale factor driving rasterization for a requested export size.
/// `None` renders at the base canvas size. Targets above
/// `MAX_EXPORT_SIZE` are rejected before anything is allocated.
pub fn render_scale(target: Option<u32>, base: u32) -> Result<f64> {
    let scale = match target {
        None => 1.0,
        Some(0) => return Err(ComposeError::InvalidExportSize),
        Some(size) if size > MAX_EXPORT_SIZE => return Err(ComposeError::InvalidExportSize),
        Some(size) => (size as f64 / base.max(1) as f64).max(1.0),
    };
    check_raster_size(raster_size(base, scale))?;
    Ok(scale)
}

pub fn check_raster_size(size: u32) -> Result<u32> {
    if size == 0 || size > MAX_EXPORT_SIZE {
        return Err(ComposeError::InvalidExportSize);
    }
    Ok(size)
}

pub fn raster_size(base: u32, scale: f64) -> u32 {
    (base as f64 * scale).round() as u32
}
