//! Stages of the bundled vision engine.
//!
//! ```text
//! render ──▶ encode ──▶ model call ──▶ cleanup
//! (pdfium)   (base64)   (engine::model) (Markdown rules)
//! ```
//!
//! 1. [`render`]: open the PDF, resolve the page selection, rasterise on
//!    `spawn_blocking`
//! 2. [`encode`]: PNG-encode and base64-wrap each page image
//! 3. [`cleanup`]: strip fences and whitespace noise from each page's reply
//!
//! The model call itself lives in [`crate::engine`], behind
//! [`crate::engine::VisionModel`].

pub mod cleanup;
pub mod encode;
pub mod render;
