/// Errors that can occur while producing or reading back a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error on report file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("Logo image error: {0}")]
    Image(String),
}
