//! PDF rasterisation via pdfium.
//!
//! pdfium is a blocking C++ library with thread-local state, so every call
//! here runs inside `tokio::task::spawn_blocking`. The document is opened
//! once per submission: page count, index selection and rendering all happen
//! in the same blocking task.

use crate::config::EngineSettings;
use crate::error::EngineError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Pages rendered from one document.
pub struct RenderedDocument {
    pub total_pages: usize,
    /// `(page_index_0based, image)` in processing order.
    pub pages: Vec<(usize, DynamicImage)>,
}

/// Map an optional 1-indexed selection onto 0-indexed document pages.
///
/// `None` selects every page. Out-of-range pages are dropped; the result is
/// sorted and deduplicated.
pub fn select_indices(selection: Option<&[usize]>, total_pages: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = match selection {
        None => (0..total_pages).collect(),
        Some(pages) => pages
            .iter()
            .filter(|&&p| p >= 1 && p <= total_pages)
            .map(|p| p - 1)
            .collect(),
    };
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Open the PDF, resolve the selection and rasterise the selected pages.
pub async fn render_selection(
    pdf_path: &Path,
    selection: Option<Vec<usize>>,
    settings: &EngineSettings,
) -> Result<RenderedDocument, EngineError> {
    if !pdf_path.exists() {
        return Err(EngineError::FileNotFound {
            path: pdf_path.to_path_buf(),
        });
    }

    let path = pdf_path.to_path_buf();
    let max_pixels = settings.max_rendered_pixels;
    let lib_dir = settings.pdfium_lib_path.clone();

    tokio::task::spawn_blocking(move || {
        render_selection_blocking(&path, selection.as_deref(), max_pixels, lib_dir.as_deref())
    })
    .await
    .map_err(|e| EngineError::Internal(format!("Render task panicked: {}", e)))?
}

/// Bind to pdfium from an explicit directory, else `./`, else the system path.
pub fn bind_pdfium(lib_dir: Option<&Path>) -> Result<Pdfium, EngineError> {
    let bindings = match lib_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| EngineError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn render_selection_blocking(
    pdf_path: &Path,
    selection: Option<&[usize]>,
    max_pixels: u32,
    lib_dir: Option<&Path>,
) -> Result<RenderedDocument, EngineError> {
    let pdfium = bind_pdfium(lib_dir)?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| load_error(pdf_path.to_path_buf(), e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let indices = select_indices(selection, total_pages);
    if indices.is_empty() {
        return Err(EngineError::PageOutOfRange {
            requested: selection.map(<[usize]>::to_vec).unwrap_or_default(),
            total: total_pages,
        });
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut rendered = Vec::with_capacity(indices.len());
    for idx in indices {
        let page = pages
            .get(idx as u16)
            .map_err(|e| EngineError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| EngineError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        rendered.push((idx, image));
    }

    Ok(RenderedDocument {
        total_pages,
        pages: rendered,
    })
}

fn load_error(path: PathBuf, e: PdfiumError) -> EngineError {
    let detail = format!("{:?}", e);
    if detail.to_lowercase().contains("password") {
        EngineError::PasswordRequired { path }
    } else {
        EngineError::CorruptPdf { path, detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_selects_every_page() {
        assert_eq!(select_indices(None, 4), vec![0, 1, 2, 3]);
        assert!(select_indices(None, 0).is_empty());
    }

    #[test]
    fn selection_is_clipped_sorted_and_deduplicated() {
        assert_eq!(select_indices(Some(&[5, 1, 3, 1]), 5), vec![0, 2, 4]);
        assert_eq!(select_indices(Some(&[2, 9]), 3), vec![1]);
        assert!(select_indices(Some(&[7]), 3).is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_reported_before_binding() {
        let settings = EngineSettings::default();
        let err = render_selection(Path::new("/no/such/file.pdf"), None, &settings)
            .await
            .err()
            .expect("missing file must fail");
        assert!(matches!(err, EngineError::FileNotFound { .. }));
    }
}
