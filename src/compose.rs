use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::{ComposeError, Result};
use crate::geometry::{check_raster_size, raster_size, ConfigurationWarning, GeometryConfig};
use crate::logo::LogoAsset;
use crate::qr::{render_matrix, EncodedPayload};
use crate::style::{
    classify_scan_safety, resolve_center_style, CenterStyle, LogoShape, LogoSize, LogoStyle,
    ScanSafety,
};

/// Corner radius of the rounded shape, relative to its edge.
const ROUNDED_RADIUS_RATIO: f64 = 0.2;

/// What gets drawn on top of the modules.
#[derive(Debug, Clone, Copy)]
pub enum Overlay<'a> {
    None,
    EmptyCutout {
        shape: LogoShape,
    },
    LogoCutout {
        logo: &'a LogoAsset,
        shape: LogoShape,
    },
    /// Logo drawn straight over the modules, without a cut-out.
    CornerLogo {
        logo: &'a LogoAsset,
        shape: LogoShape,
        size: LogoSize,
    },
}

impl<'a> Overlay<'a> {
    pub fn from_parts(
        center: CenterStyle,
        logo: Option<&'a LogoAsset>,
        style: LogoStyle,
    ) -> Result<Self> {
        let center = resolve_center_style(center, logo.is_some())?;
        Ok(match (center, logo) {
            (CenterStyle::None, None) => Overlay::None,
            (CenterStyle::None, Some(logo)) => Overlay::CornerLogo {
                logo,
                shape: style.shape,
                size: style.size,
            },
            (CenterStyle::EmptyCutout, _) => Overlay::EmptyCutout { shape: style.shape },
            (CenterStyle::LogoCutout, Some(logo)) => Overlay::LogoCutout {
                logo,
                shape: style.shape,
            },
            (CenterStyle::LogoCutout, None) => return Err(ComposeError::InvalidState),
        })
    }

    pub fn center_style(&self) -> CenterStyle {
        match self {
            Overlay::None | Overlay::CornerLogo { .. } => CenterStyle::None,
            Overlay::EmptyCutout { .. } => CenterStyle::EmptyCutout,
            Overlay::LogoCutout { .. } => CenterStyle::LogoCutout,
        }
    }

    pub fn scan_safety(&self) -> ScanSafety {
        match self {
            Overlay::CornerLogo { size, .. } => classify_scan_safety(CenterStyle::None, true, *size),
            other => classify_scan_safety(other.center_style(), false, LogoSize::default()),
        }
    }
}

/// Draws the symbol and its overlay at `canvas_size * scale` pixels.
pub fn compose(
    payload: &EncodedPayload,
    overlay: &Overlay<'_>,
    config: &GeometryConfig,
    scale: f64,
) -> Result<RgbaImage> {
    let size = check_raster_size(raster_size(config.canvas_size, scale))?;
    let mut canvas = render_matrix(payload.code(), size, true)?;
    let geometry = config.cutout().scaled(scale);

    match *overlay {
        Overlay::None => {}
        Overlay::EmptyCutout { shape } => {
            fill_centered(&mut canvas, geometry.cutout_size.round() as u32, shape);
        }
        Overlay::LogoCutout { logo, shape } => {
            if !geometry.has_logo_area() {
                let warning = geometry.warning.unwrap_or(ConfigurationWarning::PaddingExceedsHalf {
                    padding: geometry.padding,
                    cutout_size: geometry.cutout_size,
                });
                return Err(ComposeError::DegenerateGeometry(warning));
            }
            fill_centered(&mut canvas, geometry.cutout_size.round() as u32, shape);
            let fitted = fit_within(logo.image(), geometry.logo_area_size);
            paste_centered(&mut canvas, &fitted);
        }
        Overlay::CornerLogo { logo, shape, size } => {
            let side = ((size.pixels() as f64 * scale).round() as u32).max(1);
            fill_centered(&mut canvas, side, shape);
            let mut resized = imageops::resize(logo.image(), side, side, FilterType::Lanczos3);
            mask_shape(&mut resized, shape);
            paste_centered(&mut canvas, &resized);
        }
    }

    Ok(canvas)
}

/// Whether the centre of pixel (x, y) lies inside `shape` drawn in a
/// `side` x `side` box.
fn shape_contains(shape: LogoShape, x: u32, y: u32, side: u32) -> bool {
    let side = side as f64;
    let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
    match shape {
        LogoShape::Square => true,
        LogoShape::Circle => {
            let r = side / 2.0;
            (px - r).powi(2) + (py - r).powi(2) <= r * r
        }
        LogoShape::Rounded => {
            let r = side * ROUNDED_RADIUS_RATIO;
            let cx = px.clamp(r, side - r);
            let cy = py.clamp(r, side - r);
            (px - cx).powi(2) + (py - cy).powi(2) <= r * r
        }
    }
}

fn centered_origin(canvas: &RgbaImage, width: u32, height: u32) -> (i64, i64) {
    (
        (canvas.width() as i64 - width as i64) / 2,
        (canvas.height() as i64 - height as i64) / 2,
    )
}

fn fill_centered(canvas: &mut RgbaImage, side: u32, shape: LogoShape) {
    if side == 0 {
        return;
    }
    let (ox, oy) = centered_origin(canvas, side, side);
    for y in 0..side {
        for x in 0..side {
            let (cx, cy) = (ox + x as i64, oy + y as i64);
            if cx < 0 || cy < 0 || cx >= canvas.width() as i64 || cy >= canvas.height() as i64 {
                continue;
            }
            if shape_contains(shape, x, y, side) {
                canvas.put_pixel(cx as u32, cy as u32, Rgba([255, 255, 255, 255]));
            }
        }
    }
}

fn mask_shape(image: &mut RgbaImage, shape: LogoShape) {
    let side = image.width().min(image.height());
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if !shape_contains(shape, x, y, side) {
            pixel.0[3] = 0;
        }
    }
}

/// Scales `image` to fit a square of `area` pixels, keeping its aspect.
fn fit_within(image: &RgbaImage, area: f64) -> RgbaImage {
    let (w, h) = image.dimensions();
    let ratio = area / w.max(h) as f64;
    let nw = ((w as f64 * ratio).round() as u32).max(1);
    let nh = ((h as f64 * ratio).round() as u32).max(1);
    imageops::resize(image, nw, nh, FilterType::Lanczos3)
}

fn paste_centered(canvas: &mut RgbaImage, top: &RgbaImage) {
    let (x, y) = centered_origin(canvas, top.width(), top.height());
    imageops::overlay(canvas, top, x, y);
}
