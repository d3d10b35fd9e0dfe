//! Off-screen render surface.
//!
//! The surface is a standalone HTML document one physical page wide: a
//! centered title block followed by the content, with every image held to the
//! page width.

use std::time::Duration;

use crate::{FolioError, Result};

/// CSS pixels per millimetre (96 px per inch).
const CSS_PX_PER_MM: f64 = 96.0 / 25.4;

const IMAGE_STYLE: &str = "max-width:100%;height:auto;display:block;margin:10px auto";

/// Title shown on the surface when the caller gives none.
pub const DEFAULT_SURFACE_TITLE: &str = "Document";

/// Physical page dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    /// ISO A4 portrait.
    pub const A4: PageSize = PageSize { width_mm: 210.0, height_mm: 297.0 };
    /// US Letter portrait.
    pub const LETTER: PageSize = PageSize { width_mm: 215.9, height_mm: 279.4 };

    /// Both dimensions must be finite and positive.
    pub fn validate(&self) -> Result<()> {
        positive("page width", self.width_mm)?;
        positive("page height", self.height_mm)
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FolioError::InvalidInput(format!("{name} must be a positive number, got {value}")))
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Typography of the render surface.
#[derive(Debug, Clone)]
pub struct SurfaceStyle {
    pub font_family: String,
    pub font_size_px: u32,
    pub line_height: f32,
    pub title_font_size_px: u32,
    pub color: String,
    pub background: String,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self {
            font_family: "'Microsoft YaHei', 'PingFang SC', Arial, sans-serif".to_string(),
            font_size_px: 14,
            line_height: 1.6,
            title_font_size_px: 24,
            color: "#333".to_string(),
            background: "#ffffff".to_string(),
        }
    }
}

/// Configuration for pagination.
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Physical page size.
    pub page: PageSize,
    /// Supersampling factor applied at capture.
    pub scale: f32,
    /// Inner padding of the surface.
    pub margin_mm: f64,
    /// Pause between building the surface and capturing it.
    pub settle_delay: Duration,
    pub style: SurfaceStyle,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            page: PageSize::A4,
            scale: 2.0,
            margin_mm: 20.0,
            settle_delay: Duration::from_millis(300),
            style: SurfaceStyle::default(),
        }
    }
}

impl PageConfig {
    /// Rejects page sizes, scales and margins that cannot produce a bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InvalidInput`] for zero, negative or non-finite values.
    pub fn validate(&self) -> Result<()> {
        self.page.validate()?;
        positive("scale", f64::from(self.scale))?;
        if !self.margin_mm.is_finite() || self.margin_mm < 0.0 {
            return Err(FolioError::InvalidInput(format!("margin must not be negative, got {}", self.margin_mm)));
        }
        if self.margin_mm * 2.0 >= self.page.width_mm {
            return Err(FolioError::InvalidInput(format!(
                "margin of {} mm leaves no room on a {} mm page",
                self.margin_mm, self.page.width_mm
            )));
        }
        Ok(())
    }
}

/// A complete HTML document ready for the raster facility.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    pub html: String,
    /// Layout width in CSS pixels.
    pub width_px: u32,
    /// Capture scale factor.
    pub scale: f32,
}

impl RenderSurface {
    /// Width of the captured bitmap in device pixels.
    pub fn device_width_px(&self) -> u32 {
        (self.width_px as f32 * self.scale).round() as u32
    }
}

/// Converts millimetres to whole CSS pixels.
pub fn mm_to_css_px(mm: f64) -> u32 {
    (mm * CSS_PX_PER_MM).round() as u32
}

/// Builds the render surface for `title` and `content_html`.
pub fn build_surface(title: &str, content_html: &str, config: &PageConfig) -> Result<RenderSurface> {
    let title = title.trim();
    let title = if title.is_empty() { DEFAULT_SURFACE_TITLE } else { title };
    let content = constrain_images(content_html)?;
    let style = &config.style;

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
html, body {{ margin: 0; padding: 0; background: {background}; }}
.folio-surface {{ box-sizing: border-box; width: {width}mm; padding: {margin}mm; background: {background}; color: {color}; font-family: {font}; font-size: {font_size}px; line-height: {line_height}; }}
.folio-title {{ margin: 0 0 20px; font-size: {title_size}px; font-weight: bold; text-align: center; }}
.folio-content {{ word-wrap: break-word; overflow-wrap: break-word; }}
</style>
</head>
<body>
<div class="folio-surface">
<h1 class="folio-title">{title}</h1>
<div class="folio-content">{content}</div>
</div>
</body>
</html>
"#,
        background = style.background,
        width = config.page.width_mm,
        margin = config.margin_mm,
        color = style.color,
        font = style.font_family,
        font_size = style.font_size_px,
        line_height = style.line_height,
        title_size = style.title_font_size_px,
        title = escape_text(title),
        content = content,
    );

    Ok(RenderSurface { html, width_px: mm_to_css_px(config.page.width_mm), scale: config.scale })
}

/// Holds every `<img>` to the page width, keeping its aspect ratio, centered.
pub fn constrain_images(html: &str) -> Result<String> {
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("img", |el| {
                let style = match el.get_attribute("style") {
                    Some(existing) if !existing.trim().is_empty() => {
                        format!("{};{}", existing.trim().trim_end_matches(';'), IMAGE_STYLE)
                    }
                    _ => IMAGE_STYLE.to_string(),
                };
                el.set_attribute("style", &style)?;
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html.as_bytes()).map_err(|e| FolioError::Render(e.to_string()))?;
    rewriter.end().map_err(|e| FolioError::Render(e.to_string()))?;

    Ok(String::from_utf8_lossy(&output).into_owned())
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
