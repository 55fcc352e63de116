use image::{ImageFormat, Rgba, RgbaImage};
use qr_compose::{CenterStyle, LogoAsset, LogoShape, LogoSize, ScanSafety, Studio};
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

fn write_logo(dir: &std::path::Path) -> std::path::PathBuf {
    let img = RgbaImage::from_fn(120, 80, |x, _| {
        if x < 60 {
            Rgba([220, 30, 30, 255])
        } else {
            Rgba([30, 30, 220, 255])
        }
    });
    let path = dir.join("logo.png");
    img.save(&path).expect("Failed to write logo");
    path
}

#[test]
fn test_png_export_is_exactly_512() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let mut studio = Studio::new();
    assert!(studio.generate("https://example.com").unwrap());
    let png = studio.export_png(Some(512), 1).expect("PNG export failed");

    let path = temp_dir.path().join(&png.file_name);
    fs::write(&path, &png.bytes).expect("Failed to write PNG");

    let reloaded = image::open(&path).expect("Failed to open exported PNG");
    assert_eq!((reloaded.width(), reloaded.height()), (512, 512));
    assert_eq!(png.file_name, "qr-code-512x512-1.png");
}

#[test]
fn test_logo_upload_from_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logo_path = write_logo(temp_dir.path());

    let mut studio = Studio::new();
    studio.generate("https://example.com").unwrap();
    studio.load_logo(&logo_path).expect("Failed to load logo");
    studio.set_center_style(CenterStyle::LogoCutout).unwrap();

    let png = studio.export_png(Some(1024), 1).unwrap();
    let image = image::load_from_memory(&png.bytes).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (1024, 1024));

    // Left half of the logo sits left of centre.
    let pixel = image.get_pixel(500, 512).0;
    assert!(pixel[0] > 150 && pixel[2] < 100, "unexpected pixel {:?}", pixel);
}

#[test]
fn test_missing_and_unsupported_logo_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut studio = Studio::new();

    let missing = temp_dir.path().join("missing.png");
    assert!(studio.load_logo(&missing).is_err());

    let gif = temp_dir.path().join("logo.gif");
    fs::write(&gif, b"GIF89a").unwrap();
    assert!(studio.load_logo(&gif).is_err());

    assert!(studio.logo().is_none());
}

#[test]
fn test_later_upload_replaces_logo() {
    let mut studio = Studio::new();
    let first = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
    let second = RgbaImage::from_pixel(16, 4, Rgba([0, 0, 0, 255]));
    for img in [first, second] {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        studio.set_logo(LogoAsset::from_bytes(out.get_ref(), None, "upload").unwrap());
    }
    assert_eq!(studio.logo().unwrap().image().dimensions(), (16, 4));
}

#[test]
#[cfg(feature = "pdf")]
fn test_pdf_export_single_page() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let mut studio = Studio::new();
    studio.generate("https://example.com").unwrap();
    studio.set_center_style(CenterStyle::EmptyCutout).unwrap();

    let pdf = studio.export_pdf(99).expect("PDF export failed");
    assert_eq!(pdf.pages, 1);
    assert_eq!(pdf.file_name, "qr-code-99.pdf");

    let path = temp_dir.path().join(&pdf.file_name);
    fs::write(&path, &pdf.bytes).unwrap();
    let doc = lopdf::Document::load(&path).expect("Failed to parse PDF");
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
#[cfg(feature = "pdf")]
fn test_pdf_overflow_adds_second_page() {
    use qr_compose::export::write_pdf;
    use qr_compose::PdfLayout;

    let tall = RgbaImage::from_pixel(256, 1024, Rgba([255, 255, 255, 255]));
    let layout = PdfLayout::a4(tall.width(), tall.height());
    assert!(layout.image_height_mm > layout.page_height_mm);

    let bytes = write_pdf(&tall, &layout).unwrap();
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn test_scan_safety_through_session() {
    let mut studio = Studio::new();
    studio.generate("hello").unwrap();
    studio.set_logo(
        LogoAsset::from_bytes(
            &{
                let mut out = Cursor::new(Vec::new());
                RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]))
                    .write_to(&mut out, ImageFormat::Png)
                    .unwrap();
                out.into_inner()
            },
            None,
            "tiny.png",
        )
        .unwrap(),
    );
    studio.set_shape(LogoShape::Circle);
    studio.set_size(LogoSize::Large);
    assert_eq!(studio.scan_safety(), ScanSafety::Risky);
    studio.set_center_style(CenterStyle::EmptyCutout).unwrap();
    assert_eq!(studio.scan_safety(), ScanSafety::Safe);
}

#[test]
#[cfg(feature = "verify")]
fn test_cutouts_still_scan() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logo_path = write_logo(temp_dir.path());
    let text = "https://example.com/some/longer/path?with=query";

    let mut studio = Studio::new();
    studio.generate(text).unwrap();
    studio.load_logo(&logo_path).unwrap();

    for center in [CenterStyle::EmptyCutout, CenterStyle::LogoCutout] {
        for shape in [LogoShape::Circle, LogoShape::Rounded, LogoShape::Square] {
            studio.set_center_style(center).unwrap();
            studio.set_shape(shape);
            let png = studio.export_png(Some(512), 0).unwrap();
            let image = image::load_from_memory(&png.bytes).unwrap().to_rgba8();
            let decoded = qr_compose::decode_payload(&image)
                .unwrap_or_else(|e| panic!("{:?}/{:?} does not scan: {}", center, shape, e));
            assert_eq!(decoded, text);
        }
    }
}
