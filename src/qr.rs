//! QR code generation with an optional logo overlay, exported as PDF.
//!
//! A [`QrSession`] mirrors the generator form: a payload text field, an
//! optional logo upload, a *generate* action and an *export* action.
//!
//! ```text
//! set_payload ─▶ generate ─▶ (export enabled) ─▶ export_pdf / export_png
//!       ▲                                              │
//!       └──── editing the payload disables export ◀────┘
//! ```
//!
//! The exported image is the on-screen composite: a white square container
//! with the QR bitmap centered in it and the logo, if any, fitted over the
//! whole container at reduced opacity.

use crate::config::QrConfig;
use crate::export::{ExportError, ExportSink};
use crate::imaging::{calculate_contain_dimensions, calculate_module_layout, center_offset};
use crate::pdf::{PdfError, single_page_pdf};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QrError {
    #[error("QR encode failed: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("Generate a QR code before exporting")]
    NotGenerated,
    #[error("Failed to read logo: {0}")]
    Logo(image::ImageError),
    #[error("Failed to encode PNG: {0}")]
    Png(image::ImageError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Parse an error-correction level name (`L`, `M`, `Q`, `H`, any case).
pub fn parse_ec_level(name: &str) -> Option<EcLevel> {
    match name.trim().to_ascii_uppercase().as_str() {
        "L" => Some(EcLevel::L),
        "M" => Some(EcLevel::M),
        "Q" => Some(EcLevel::Q),
        "H" => Some(EcLevel::H),
        _ => None,
    }
}

/// Rendering parameters for the QR bitmap and its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QrStyle {
    /// Edge of the rendered QR bitmap in pixels.
    pub size: u32,
    /// Edge of the square container the QR and logo are composited into.
    pub container: u32,
    /// Logo opacity, 0.0 to 1.0.
    pub logo_opacity: f32,
    pub ec_level: EcLevel,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            size: 256,
            container: 280,
            logo_opacity: 0.3,
            ec_level: EcLevel::L,
        }
    }
}

impl QrStyle {
    /// Build from validated config; an unknown level falls back to `L`.
    pub fn from_config(config: &QrConfig) -> Self {
        Self {
            size: config.size,
            container: config.container,
            logo_opacity: config.logo_opacity,
            ec_level: parse_ec_level(&config.error_correction).unwrap_or(EcLevel::L),
        }
    }
}

/// Render `payload` as a black-on-white QR bitmap of at least `size`×`size`.
///
/// No quiet zone is added around the modules. An empty payload is valid and
/// yields the smallest symbol.
pub fn render_qr(payload: &str, size: u32, ec_level: EcLevel) -> Result<GrayImage, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), ec_level)?;
    let modules = code.width() as u32;
    let layout = calculate_module_layout(modules, size);

    let mut img = GrayImage::from_pixel(layout.canvas, layout.canvas, Luma([255u8]));
    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let x0 = layout.offset + (i as u32 % modules) * layout.scale;
        let y0 = layout.offset + (i as u32 / modules) * layout.scale;
        for dy in 0..layout.scale {
            for dx in 0..layout.scale {
                img.put_pixel(x0 + dx, y0 + dy, Luma([0u8]));
            }
        }
    }
    Ok(img)
}

/// Blend `src` over `dst` with `src`'s own alpha scaled by `opacity`.
fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>, opacity: f32) {
    let alpha = (src.0[3] as f32 / 255.0) * opacity;
    for c in 0..3 {
        let blended = src.0[c] as f32 * alpha + dst.0[c] as f32 * (1.0 - alpha);
        dst.0[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
}

/// Build the export composite: white `container`×`container` square, QR
/// centered, logo fitted over the whole square at `opacity`.
///
/// If the QR bitmap is larger than the container, the container grows to
/// hold it.
pub fn compose(
    qr: &GrayImage,
    logo: Option<&DynamicImage>,
    container: u32,
    opacity: f32,
) -> RgbaImage {
    let edge = container.max(qr.width()).max(qr.height());
    let mut canvas = RgbaImage::from_pixel(edge, edge, Rgba([255, 255, 255, 255]));

    let qr_x = center_offset(edge, qr.width());
    let qr_y = center_offset(edge, qr.height());
    for (x, y, px) in qr.enumerate_pixels() {
        let v = px.0[0];
        canvas.put_pixel(qr_x + x, qr_y + y, Rgba([v, v, v, 255]));
    }

    if let Some(logo) = logo.filter(|l| l.width() > 0 && l.height() > 0) {
        let (w, h) = calculate_contain_dimensions((logo.width(), logo.height()), (edge, edge));
        let fitted = logo.resize_exact(w, h, FilterType::Lanczos3).to_rgba8();
        let (lx, ly) = (center_offset(edge, w), center_offset(edge, h));
        for (x, y, px) in fitted.enumerate_pixels() {
            blend_pixel(canvas.get_pixel_mut(lx + x, ly + y), *px, opacity);
        }
    }

    canvas
}

/// Input of the generator form.
#[derive(Debug, Clone, Default)]
pub struct QrRequest {
    pub payload: String,
    /// Raw bytes of an uploaded logo image, any supported format.
    pub logo: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
struct Generated {
    payload: String,
    bitmap: GrayImage,
}

/// State of the QR generator form.
#[derive(Debug, Clone)]
pub struct QrSession {
    style: QrStyle,
    payload: String,
    logo: Option<DynamicImage>,
    generated: Option<Generated>,
}

impl QrSession {
    pub fn new(style: QrStyle) -> Self {
        Self {
            style,
            payload: String::new(),
            logo: None,
            generated: None,
        }
    }

    /// Session pre-filled from a request, with the logo already decoded.
    pub fn from_request(style: QrStyle, request: QrRequest) -> Result<Self, QrError> {
        let mut session = Self::new(style);
        session.set_payload(request.payload);
        if let Some(bytes) = request.logo {
            session.set_logo_bytes(&bytes)?;
        }
        Ok(session)
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: impl Into<String>) {
        self.payload = payload.into();
    }

    /// Decode and keep a logo. On failure the previous logo is kept.
    pub fn set_logo_bytes(&mut self, bytes: &[u8]) -> Result<(), QrError> {
        let logo = image::load_from_memory(bytes).map_err(QrError::Logo)?;
        self.logo = Some(logo);
        Ok(())
    }

    pub fn clear_logo(&mut self) {
        self.logo = None;
    }

    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }

    /// Render the current payload and enable export for it.
    pub fn generate(&mut self) -> Result<&GrayImage, QrError> {
        let bitmap = render_qr(&self.payload, self.style.size, self.style.ec_level)?;
        let generated = self.generated.insert(Generated {
            payload: self.payload.clone(),
            bitmap,
        });
        Ok(&generated.bitmap)
    }

    /// True once a bitmap exists for the payload currently in the field.
    pub fn can_export(&self) -> bool {
        self.generated
            .as_ref()
            .is_some_and(|g| g.payload == self.payload)
    }

    /// Current composite of the generated QR and the current logo.
    pub fn composite(&self) -> Result<RgbaImage, QrError> {
        let generated = self
            .generated
            .as_ref()
            .filter(|_| self.can_export())
            .ok_or(QrError::NotGenerated)?;
        Ok(compose(
            &generated.bitmap,
            self.logo.as_ref(),
            self.style.container,
            self.style.logo_opacity,
        ))
    }

    /// Export the composite as a single-page PDF.
    pub fn export_pdf(&self, sink: &impl ExportSink, filename: &str) -> Result<(), QrError> {
        let composite = DynamicImage::ImageRgba8(self.composite()?);
        let bytes = single_page_pdf(&composite)?;
        sink.deliver(&bytes, filename)?;
        Ok(())
    }

    /// Export the composite as PNG.
    pub fn export_png(&self, sink: &impl ExportSink, filename: &str) -> Result<(), QrError> {
        let composite = DynamicImage::ImageRgba8(self.composite()?);
        let mut bytes = Vec::new();
        composite
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(QrError::Png)?;
        sink.deliver(&bytes, filename)?;
        Ok(())
    }
}
