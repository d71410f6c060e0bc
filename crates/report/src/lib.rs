//! Report generation for anomaly digests.
//!
//! This crate provides:
//! - Record formatting (human-scaled packet and bit rates)
//! - A declarative document definition and the renderer that builds it
//! - A layout pass that paginates the definition and a `printpdf` writer
//! - The on-disk `ReportFile` artifact and its base64 transfer encoding

pub mod artifact;
pub mod document;
pub mod encode;
pub mod error;
pub mod format;
pub mod layout;
pub mod pdf;
pub mod renderer;
pub mod templating;

pub use artifact::ReportFile;
pub use error::ReportError;
pub use format::{format_record, format_records, DisplayRow};
pub use renderer::{RenderedReport, ReportMeta, ReportRenderer};
