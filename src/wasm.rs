use clap::ValueEnum;
use wasm_bindgen::prelude::*;

use crate::error::ComposeError;
use crate::export::{pdf_file_name, png_data_url, png_file_name};
use crate::logo::{LogoAsset, LogoFormat};
use crate::studio::Studio;
use crate::style::{CenterStyle, LogoShape, LogoSize};

fn to_js(err: ComposeError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn parse<T: ValueEnum>(value: &str) -> Result<T, JsValue> {
    T::from_str(value, true).map_err(|e| js_sys::Error::new(&e).into())
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Browser-facing handle on a composition session.
#[wasm_bindgen]
pub struct QrStudio {
    inner: Studio,
}

impl Default for QrStudio {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl QrStudio {
    #[wasm_bindgen(constructor)]
    pub fn new() -> QrStudio {
        console_error_panic_hook::set_once();
        QrStudio {
            inner: Studio::new(),
        }
    }

    /// Returns false when the input was blank and nothing changed.
    pub fn generate(&mut self, text: &str) -> Result<bool, JsValue> {
        self.inner.generate(text).map_err(to_js)
    }

    #[wasm_bindgen(js_name = setLogo)]
    pub fn set_logo(&mut self, data: &[u8], mime: &str) -> Result<(), JsValue> {
        let format = LogoFormat::from_mime(mime)
            .ok_or_else(|| to_js(ComposeError::asset("upload", format!("unsupported type {}", mime))))?;
        let logo = LogoAsset::from_bytes(data, Some(format), "upload").map_err(to_js)?;
        self.inner.set_logo(logo);
        Ok(())
    }

    #[wasm_bindgen(js_name = setLogoDataUrl)]
    pub fn set_logo_data_url(&mut self, url: &str) -> Result<(), JsValue> {
        let logo = LogoAsset::from_data_url(url).map_err(to_js)?;
        self.inner.set_logo(logo);
        Ok(())
    }

    #[wasm_bindgen(js_name = removeLogo)]
    pub fn remove_logo(&mut self) {
        self.inner.remove_logo();
    }

    #[wasm_bindgen(js_name = hasLogo)]
    pub fn has_logo(&self) -> bool {
        self.inner.logo().is_some()
    }

    #[wasm_bindgen(js_name = setShape)]
    pub fn set_shape(&mut self, shape: &str) -> Result<(), JsValue> {
        self.inner.set_shape(parse::<LogoShape>(shape)?);
        Ok(())
    }

    #[wasm_bindgen(js_name = setSize)]
    pub fn set_size(&mut self, size: &str) -> Result<(), JsValue> {
        self.inner.set_size(parse::<LogoSize>(size)?);
        Ok(())
    }

    /// One of "none", "empty" or "logo".
    #[wasm_bindgen(js_name = setCenterStyle)]
    pub fn set_center_style(&mut self, style: &str) -> Result<(), JsValue> {
        let requested = parse::<CenterStyle>(style)?;
        self.inner.set_center_style(requested).map_err(to_js)
    }

    #[wasm_bindgen(js_name = scanSafety)]
    pub fn scan_safety(&self) -> String {
        self.inner.scan_safety().to_string()
    }

    #[wasm_bindgen(js_name = cutoutSize)]
    pub fn cutout_size(&self) -> f64 {
        self.inner.geometry().cutout_size
    }

    #[wasm_bindgen(js_name = logoAreaSize)]
    pub fn logo_area_size(&self) -> f64 {
        self.inner.geometry().logo_area_size
    }

    /// PNG bytes; `size` of `undefined` exports at the base canvas size.
    #[wasm_bindgen(js_name = exportPng)]
    pub fn export_png(&self, size: Option<u32>) -> Result<Vec<u8>, JsValue> {
        self.inner
            .export_png(size, now_ms())
            .map(|png| png.bytes)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = exportPngDataUrl)]
    pub fn export_png_data_url(&self, size: Option<u32>) -> Result<String, JsValue> {
        let bytes = self.export_png(size)?;
        Ok(png_data_url(&bytes))
    }

    #[cfg(feature = "pdf")]
    #[wasm_bindgen(js_name = exportPdf)]
    pub fn export_pdf(&self) -> Result<Vec<u8>, JsValue> {
        self.inner
            .export_pdf(now_ms())
            .map(|pdf| pdf.bytes)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = pngFileName)]
    pub fn png_file_name(size: Option<u32>) -> String {
        png_file_name(size, now_ms())
    }

    #[wasm_bindgen(js_name = pdfFileName)]
    pub fn pdf_file_name() -> String {
        pdf_file_name(now_ms())
    }
}
