use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::compose::{compose, Overlay};
use crate::error::{ComposeError, Result};
use crate::geometry::{render_scale, GeometryConfig, PDF_RENDER_SCALE};
use crate::qr::EncodedPayload;

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;
pub const PDF_IMAGE_WIDTH_MM: f64 = 100.0;

const POINTS_PER_MM: f64 = 72.0 / 25.4;

pub struct PngExport {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

pub struct PdfExport {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub file_name: String,
}

/// Milliseconds since the Unix epoch, used in artifact names.
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub fn png_file_name(target: Option<u32>, timestamp: u64) -> String {
    match target {
        Some(size) => format!("qr-code-{}x{}-{}.png", size, size, timestamp),
        None => format!("qr-code-{}.png", timestamp),
    }
}

pub fn pdf_file_name(timestamp: u64) -> String {
    format!("qr-code-{}.pdf", timestamp)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(ComposeError::raster)?;
    Ok(out.into_inner())
}

pub fn png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(bytes))
}

/// Renders at `target / canvas_size` (at least 1x) and resamples to exactly
/// `target` x `target` when the raster differs.
pub fn export_png(
    payload: &EncodedPayload,
    overlay: &Overlay<'_>,
    config: &GeometryConfig,
    target: Option<u32>,
    timestamp: u64,
) -> Result<PngExport> {
    let scale = render_scale(target, config.canvas_size)?;
    let mut image = compose(payload, overlay, config, scale)?;

    if let Some(size) = target {
        if image.dimensions() != (size, size) {
            image = imageops::resize(&image, size, size, FilterType::Triangle);
        }
    }

    let bytes = encode_png(&image)?;
    Ok(PngExport {
        bytes,
        width: image.width(),
        height: image.height(),
        file_name: png_file_name(target, timestamp),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f64,
    /// Distance from the top edge of the page to the top of the image.
    pub top_mm: f64,
}

/// Where the image lands on each page of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub image_width_mm: f64,
    pub image_height_mm: f64,
    pub placements: Vec<Placement>,
}

impl PdfLayout {
    pub fn new(
        page_width_mm: f64,
        page_height_mm: f64,
        image_width_mm: f64,
        pixel_width: u32,
        pixel_height: u32,
    ) -> Self {
        let image_height_mm = pixel_height as f64 * image_width_mm / pixel_width.max(1) as f64;
        let x_mm = (page_width_mm - image_width_mm) / 2.0;
        let first_top = (page_height_mm - image_height_mm) / 2.0;

        let mut placements = vec![Placement {
            x_mm,
            top_mm: first_top,
        }];
        // The overflow continues where the first page cut the image.
        if image_height_mm > page_height_mm {
            placements.push(Placement {
                x_mm,
                top_mm: first_top - page_height_mm,
            });
        }

        PdfLayout {
            page_width_mm,
            page_height_mm,
            image_width_mm,
            image_height_mm,
            placements,
        }
    }

    pub fn a4(pixel_width: u32, pixel_height: u32) -> Self {
        Self::new(
            A4_WIDTH_MM,
            A4_HEIGHT_MM,
            PDF_IMAGE_WIDTH_MM,
            pixel_width,
            pixel_height,
        )
    }

    pub fn pages(&self) -> usize {
        self.placements.len()
    }
}

#[cfg(feature = "pdf")]
pub fn write_pdf(image: &RgbaImage, layout: &PdfLayout) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use lopdf::{dictionary, Document, Object, Stream};
    use std::io::Write;

    if image.width() == 0 || image.height() == 0 {
        return Err(ComposeError::raster("cannot embed an empty image"));
    }

    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(rgb.as_raw())
        .map_err(ComposeError::raster)?;
    let compressed = encoder.finish().map_err(ComposeError::raster)?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        compressed,
    ));

    let page_height_pt = layout.page_height_mm * POINTS_PER_MM;
    let width_pt = layout.image_width_mm * POINTS_PER_MM;
    let height_pt = layout.image_height_mm * POINTS_PER_MM;

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages());
    for placement in &layout.placements {
        let x_pt = placement.x_mm * POINTS_PER_MM;
        // PDF space grows upwards from the bottom edge.
        let y_pt = page_height_pt - (placement.top_mm * POINTS_PER_MM + height_pt);
        let content = format!(
            "q\n{:.3} 0 0 {:.3} {:.3} {:.3} cm\n/Im0 Do\nQ\n",
            width_pt, height_pt, x_pt, y_pt
        );
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    let media_box: Vec<Object> = vec![
        0.into(),
        0.into(),
        ((layout.page_width_mm * POINTS_PER_MM).round() as i64).into(),
        (page_height_pt.round() as i64).into(),
    ];
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => layout.pages() as i64,
        "MediaBox" => media_box,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(ComposeError::raster)?;
    Ok(bytes)
}

/// Rasterizes at the fixed PDF scale and lays the image out on A4.
#[cfg(feature = "pdf")]
pub fn export_pdf(
    payload: &EncodedPayload,
    overlay: &Overlay<'_>,
    config: &GeometryConfig,
    timestamp: u64,
) -> Result<PdfExport> {
    let image = compose(payload, overlay, config, PDF_RENDER_SCALE)?;
    let layout = PdfLayout::a4(image.width(), image.height());
    let bytes = write_pdf(&image, &layout)?;
    Ok(PdfExport {
        bytes,
        pages: layout.pages(),
        file_name: pdf_file_name(timestamp),
    })
}
