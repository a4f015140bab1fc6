//! QR code rendering for asset tags

use image::{ImageFormat, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::str::FromStr;

use crate::error::{Result, TaggerError};

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrFormat {
    /// PNG raster image
    #[default]
    Png,
    /// SVG vector image
    Svg,
}

impl QrFormat {
    /// MIME type of the rendered image
    pub fn content_type(&self) -> &'static str {
        match self {
            QrFormat::Png => "image/png",
            QrFormat::Svg => "image/svg+xml",
        }
    }
}

impl FromStr for QrFormat {
    type Err = TaggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(QrFormat::Png),
            "svg" => Ok(QrFormat::Svg),
            other => Err(TaggerError::ValidationError(format!(
                "Unsupported QR format: {}",
                other
            ))),
        }
    }
}

/// A rendered QR image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    /// Image format
    pub format: QrFormat,
    /// Encoded image bytes
    pub bytes: Vec<u8>,
}

/// Renders tags as QR codes
///
/// Defaults: error correction level L, 10 pixels per module and the standard
/// 4-module quiet zone, black on white.
#[derive(Debug, Clone, Copy)]
pub struct QrRenderer {
    module_size: u32,
    quiet_zone: bool,
    ec_level: EcLevel,
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self {
            module_size: 10,
            quiet_zone: true,
            ec_level: EcLevel::L,
        }
    }
}

impl QrRenderer {
    /// Create a renderer with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pixel size of one module
    pub fn with_module_size(mut self, size: u32) -> Self {
        self.module_size = size.max(1);
        self
    }

    /// Enable or disable the quiet zone border
    pub fn with_quiet_zone(mut self, enabled: bool) -> Self {
        self.quiet_zone = enabled;
        self
    }

    /// Render `data` in the requested format
    pub fn render(&self, data: &str, format: QrFormat) -> Result<QrImage> {
        let bytes = match format {
            QrFormat::Png => self.render_png(data)?,
            QrFormat::Svg => self.render_svg(data)?.into_bytes(),
        };
        Ok(QrImage { format, bytes })
    }

    /// Render `data` as a PNG image
    pub fn render_png(&self, data: &str) -> Result<Vec<u8>> {
        let code = self.encode(data)?;
        let image = code
            .render::<Luma<u8>>()
            .quiet_zone(self.quiet_zone)
            .module_dimensions(self.module_size, self.module_size)
            .build();

        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| TaggerError::QrError(format!("PNG encoding failed: {}", e)))?;
        Ok(bytes)
    }

    /// Render `data` as an SVG document
    pub fn render_svg(&self, data: &str) -> Result<String> {
        let code = self.encode(data)?;
        Ok(code
            .render::<svg::Color<'_>>()
            .quiet_zone(self.quiet_zone)
            .module_dimensions(self.module_size, self.module_size)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build())
    }

    fn encode(&self, data: &str) -> Result<QrCode> {
        if data.is_empty() {
            return Err(TaggerError::QrError("Cannot encode empty data".to_string()));
        }
        QrCode::with_error_correction_level(data.as_bytes(), self.ec_level)
            .map_err(|e| TaggerError::QrError(e.to_string()))
    }
}
