//! Raster capture of a render surface.
//!
//! Rasterizing HTML needs a layout engine, so capture sits behind the
//! [`RasterCapture`] trait. [`CommandCapture`] drives an external
//! HTML-to-image program; tests substitute an in-memory double.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::DynamicImage;
use tokio::process::Command;

use crate::paginate::surface::RenderSurface;
use crate::{FolioError, Result};

/// One captured bitmap of a whole render surface.
#[derive(Debug, Clone)]
pub struct PageFragment {
    pub image: DynamicImage,
    /// Device pixels per CSS pixel the bitmap was captured at.
    pub scale: f32,
}

impl PageFragment {
    pub fn new(image: DynamicImage, scale: f32) -> Self {
        Self { image, scale }
    }

    pub fn width_px(&self) -> u32 {
        self.image.width()
    }

    pub fn height_px(&self) -> u32 {
        self.image.height()
    }
}

/// Turns a render surface into a bitmap.
#[async_trait]
pub trait RasterCapture: Send + Sync {
    async fn capture(&self, surface: &RenderSurface) -> Result<PageFragment>;
}

/// Settings for [`CommandCapture`].
#[derive(Debug, Clone)]
pub struct CommandCaptureConfig {
    /// Program to run, looked up on `PATH` unless absolute.
    pub program: PathBuf,
    /// Arguments placed before the generated ones.
    pub extra_args: Vec<String>,
    /// Lets the renderer load `file://` resources referenced by the content.
    ///
    /// Off by default: the surface carries markup from arbitrary pages, so
    /// only the scratch directory holding the surface itself is readable.
    pub allow_local_files: bool,
}

impl Default for CommandCaptureConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("wkhtmltoimage"),
            extra_args: vec!["--quiet".to_string()],
            allow_local_files: false,
        }
    }
}

/// Captures surfaces with a `wkhtmltoimage`-compatible command.
///
/// The surface is written to a scratch directory, rendered to PNG at the
/// surface's device width and zoom, then decoded.
#[derive(Debug, Clone, Default)]
pub struct CommandCapture {
    config: CommandCaptureConfig,
}

impl CommandCapture {
    pub fn new(config: CommandCaptureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CommandCaptureConfig {
        &self.config
    }

    /// Full argument list for one capture, reading `input` and writing `output`.
    fn arguments(&self, surface: &RenderSurface, scratch: &Path, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.config.extra_args.iter().map(OsString::from).collect();

        if self.config.allow_local_files {
            args.push("--enable-local-file-access".into());
        } else {
            args.push("--disable-local-file-access".into());
            args.push("--allow".into());
            args.push(scratch.into());
        }

        args.extend(["--format".into(), "png".into()]);
        args.extend(["--width".into(), surface.device_width_px().to_string().into()]);
        args.extend(["--zoom".into(), surface.scale.to_string().into()]);
        args.push(input.into());
        args.push(output.into());
        args
    }
}

#[async_trait]
impl RasterCapture for CommandCapture {
    async fn capture(&self, surface: &RenderSurface) -> Result<PageFragment> {
        let scratch = tempfile::tempdir().map_err(|e| FolioError::Render(format!("scratch directory: {e}")))?;
        let input = scratch.path().join("surface.html");
        let output = scratch.path().join("surface.png");

        tokio::fs::write(&input, surface.html.as_bytes())
            .await
            .map_err(|e| FolioError::Render(format!("writing surface: {e}")))?;

        tracing::debug!(
            program = %self.config.program.display(),
            width = surface.device_width_px(),
            zoom = surface.scale,
            local_files = self.config.allow_local_files,
            "capturing surface"
        );

        let result = Command::new(&self.config.program)
            .args(self.arguments(surface, scratch.path(), &input, &output))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FolioError::Render(format!("failed to run {}: {e}", self.config.program.display())))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(FolioError::Render(format!(
                "{} exited with {}: {}",
                self.config.program.display(),
                result.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(&output).await.map_err(|e| FolioError::Render(format!("reading capture: {e}")))?;
        let image = image::load_from_memory(&bytes).map_err(|e| FolioError::Render(format!("decoding capture: {e}")))?;

        Ok(PageFragment::new(image, surface.scale))
    }
}
