//! Resume-to-image conversion.
//!
//! The first page of the uploaded PDF is rasterised and PNG-encoded so the
//! client can show a preview next to the feedback. Rendering runs inside
//! `spawn_blocking` because pdfium is not async-safe.
//!
//! pdfium initialises process-wide library state when bound and tears it down
//! when the `Pdfium` value drops, so a converter binds exactly once and every
//! render borrows that instance.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::{GenericImageView, ImageFormat};
use pdfium_render::prelude::*;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::storage::UploadFile;

/// Page scale factor used when rasterising. 4x keeps small resume fonts legible.
pub const RENDER_SCALE: f32 = 4.0;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const PNG_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Clone)]
pub struct ConvertedImage {
    pub file: UploadFile,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("pdfium error: {0}")]
    Pdfium(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait ImageConverter: Send + Sync {
    async fn convert(&self, file: &UploadFile) -> Result<ConvertedImage, ConvertError>;
}

/// Renders with a pdfium library bound on first use. Clones share the binding.
#[derive(Clone, Default)]
pub struct PdfiumConverter {
    library_path: Option<String>,
    pdfium: Arc<OnceCell<Arc<Pdfium>>>,
}

impl PdfiumConverter {
    pub fn new(library_path: Option<String>) -> Self {
        Self {
            library_path,
            pdfium: Arc::default(),
        }
    }

    /// Concurrent first callers wait on a single bind. A failed bind leaves the
    /// cell empty so the next call tries again.
    async fn pdfium(&self) -> Result<Arc<Pdfium>, ConvertError> {
        let pdfium = self
            .pdfium
            .get_or_try_init(|| async {
                let library_path = self.library_path.clone();
                let pdfium =
                    tokio::task::spawn_blocking(move || bind_pdfium(library_path.as_deref()))
                        .await??;
                info!("pdfium bound");
                Ok::<_, ConvertError>(Arc::new(pdfium))
            })
            .await?;
        Ok(pdfium.clone())
    }
}

#[async_trait]
impl ImageConverter for PdfiumConverter {
    async fn convert(&self, file: &UploadFile) -> Result<ConvertedImage, ConvertError> {
        if !is_pdf(file) {
            return Err(ConvertError::UnsupportedType(file.content_type.clone()));
        }

        let pdfium = self.pdfium().await?;
        let data = file.data.clone();
        let (png, width, height) =
            tokio::task::spawn_blocking(move || render_first_page(&pdfium, &data)).await??;

        debug!("Rendered {} to {width}x{height} PNG", file.name);

        Ok(ConvertedImage {
            file: UploadFile {
                name: image_file_name(&file.name),
                content_type: PNG_CONTENT_TYPE.to_string(),
                data: Bytes::from(png),
            },
            width,
            height,
        })
    }
}

fn bind_pdfium(library_path: Option<&str>) -> Result<Pdfium, ConvertError> {
    let bindings = match library_path {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(pdfium_error)?;
    Ok(Pdfium::new(bindings))
}

fn render_first_page(pdfium: &Pdfium, data: &[u8]) -> Result<(Vec<u8>, u32, u32), ConvertError> {
    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(pdfium_error)?;
    let page = document.pages().first().map_err(pdfium_error)?;

    let config = PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE);
    let image = page
        .render_with_config(&config)
        .map_err(pdfium_error)?
        .as_image();

    let (width, height) = image.dimensions();
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok((png, width, height))
}

fn pdfium_error(e: PdfiumError) -> ConvertError {
    ConvertError::Pdfium(e.to_string())
}

pub fn is_pdf(file: &UploadFile) -> bool {
    file.content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE)
        || Path::new(&file.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// `resume.pdf` becomes `resume.png`; names without an extension get `.png` appended.
pub fn image_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("resume");
    format!("{stem}.png")
}
