//! The editing session: payload, logo and overlay options, and the exports
//! built from them.

use crate::compose::Overlay;
use crate::error::{ComposeError, Result};
use crate::export::{self, PngExport};
use crate::geometry::{ConfigurationWarning, CutoutGeometry, GeometryConfig};
use crate::logo::LogoAsset;
use crate::qr::EncodedPayload;
use crate::style::{
    resolve_center_style, CenterStyle, LogoShape, LogoSize, LogoStyle, ScanSafety,
};

#[cfg(feature = "pdf")]
use crate::export::PdfExport;

/// Session state. Fields are private so that `LogoCutout` can only be held
/// while a logo is loaded.
#[derive(Debug, Clone, Default)]
pub struct Studio {
    config: GeometryConfig,
    payload: Option<EncodedPayload>,
    logo: Option<LogoAsset>,
    style: LogoStyle,
    center: CenterStyle,
}

impl Studio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any configuration warning is logged here, once per session.
    pub fn with_config(config: GeometryConfig) -> Self {
        if let Some(warning) = config.cutout().warning {
            tracing::warn!("cut-out configuration: {}", warning);
        }
        Studio {
            config,
            ..Self::default()
        }
    }

    /// Encodes `input`. Blank input is ignored and keeps the current code;
    /// returns whether a new code was generated.
    pub fn generate(&mut self, input: &str) -> Result<bool> {
        match EncodedPayload::new(input) {
            Ok(payload) => {
                tracing::debug!(
                    "generated {}x{} QR code for {} bytes",
                    payload.modules(),
                    payload.modules(),
                    payload.text().len()
                );
                self.payload = Some(payload);
                Ok(true)
            }
            Err(ComposeError::EmptyInput) => {
                tracing::debug!("ignoring blank input");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn payload(&self) -> Option<&EncodedPayload> {
        self.payload.as_ref()
    }

    /// Replaces any current logo. The centre style is left as is.
    pub fn set_logo(&mut self, logo: LogoAsset) {
        tracing::debug!("logo set from {}", logo.source_name());
        self.logo = Some(logo);
    }

    /// Loads a logo from disk; on failure the current logo stays.
    pub fn load_logo(&mut self, path: &std::path::Path) -> Result<()> {
        match LogoAsset::open(path) {
            Ok(logo) => {
                self.set_logo(logo);
                Ok(())
            }
            Err(e) => {
                tracing::error!("{}", e);
                Err(e)
            }
        }
    }

    /// Drops the logo. A logo cut-out falls back to no centre style and is
    /// not restored by a later upload.
    pub fn remove_logo(&mut self) {
        if self.logo.take().is_some() {
            tracing::debug!("logo removed");
        }
        if self.center == CenterStyle::LogoCutout {
            self.center = CenterStyle::None;
        }
    }

    pub fn logo(&self) -> Option<&LogoAsset> {
        self.logo.as_ref()
    }

    pub fn set_shape(&mut self, shape: LogoShape) {
        self.style.shape = shape;
    }

    pub fn set_size(&mut self, size: LogoSize) {
        self.style.size = size;
        if self.scan_safety() == ScanSafety::Risky {
            tracing::warn!("large logos may reduce scan reliability");
        }
    }

    pub fn style(&self) -> LogoStyle {
        self.style
    }

    /// Rejects `LogoCutout` without a logo, or when the geometry leaves no
    /// room for one. State is unchanged on error.
    pub fn set_center_style(&mut self, requested: CenterStyle) -> Result<()> {
        let center = resolve_center_style(requested, self.logo.is_some())?;
        if center == CenterStyle::LogoCutout {
            let geometry = self.geometry();
            if !geometry.has_logo_area() {
                let warning = geometry.warning.unwrap_or(ConfigurationWarning::PaddingExceedsHalf {
                    padding: geometry.padding,
                    cutout_size: geometry.cutout_size,
                });
                tracing::warn!("logo-in-cutout blocked: {}", warning);
                return Err(ComposeError::DegenerateGeometry(warning));
            }
        }
        self.center = center;
        Ok(())
    }

    pub fn center_style(&self) -> CenterStyle {
        self.center
    }

    pub fn geometry(&self) -> CutoutGeometry {
        self.config.cutout()
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    pub fn overlay(&self) -> Overlay<'_> {
        match Overlay::from_parts(self.center, self.logo.as_ref(), self.style) {
            Ok(overlay) => overlay,
            // set_center_style and remove_logo never leave LogoCutout without a logo
            Err(_) => Overlay::None,
        }
    }

    pub fn scan_safety(&self) -> ScanSafety {
        self.overlay().scan_safety()
    }

    pub fn export_png(&self, target: Option<u32>, timestamp: u64) -> Result<PngExport> {
        let payload = self.payload.as_ref().ok_or(ComposeError::NoPayload)?;
        export::export_png(payload, &self.overlay(), &self.config, target, timestamp)
            .inspect_err(|e| tracing::error!("PNG export failed: {}", e))
    }

    #[cfg(feature = "pdf")]
    pub fn export_pdf(&self, timestamp: u64) -> Result<PdfExport> {
        let payload = self.payload.as_ref().ok_or(ComposeError::NoPayload)?;
        export::export_pdf(payload, &self.overlay(), &self.config, timestamp)
            .inspect_err(|e| tracing::error!("PDF export failed: {}", e))
    }
}
