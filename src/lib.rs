pub mod compose;
pub mod error;
pub mod export;
pub mod geometry;
pub mod logging;
pub mod logo;
pub mod qr;
pub mod studio;
pub mod style;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use compose::{compose, Overlay};
pub use error::{ComposeError, Result};
pub use export::{export_png, pdf_file_name, png_file_name, timestamp_ms, PdfLayout, PngExport};
#[cfg(feature = "pdf")]
pub use export::{export_pdf, PdfExport};
pub use geometry::{
    compute_cutout_geometry, render_scale, ConfigurationWarning, CutoutGeometry, GeometryConfig,
    MAX_EXPORT_SIZE, QR_SIZE, STANDARD_EXPORT_SIZES,
};
pub use logo::{LogoAsset, LogoFormat};
#[cfg(feature = "verify")]
pub use qr::decode_payload;
pub use qr::{render_terminal, EncodedPayload};
pub use studio::Studio;
pub use style::{
    classify_scan_safety, resolve_center_style, CenterStyle, LogoShape, LogoSize, LogoStyle,
    ScanSafety,
};
