//! Text-safe transfer encoding for rendered reports.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::artifact::ReportFile;
use crate::error::ReportError;

/// Data-URI marker expected by the messaging document endpoint.
pub const PDF_DATA_URI_PREFIX: &str = "data:application/pdf;base64,";

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn encode_data_uri(bytes: &[u8]) -> String {
    format!("{PDF_DATA_URI_PREFIX}{}", encode_base64(bytes))
}

/// Read the whole report and encode it as a PDF data URI.
///
/// A read failure is returned to the caller: nothing can be delivered
/// without the file.
pub async fn encode_report(report: &ReportFile) -> Result<String, ReportError> {
    let bytes = report.read_bytes().await?;
    let encoded = encode_data_uri(&bytes);
    tracing::info!(
        name = report.name(),
        bytes = bytes.len(),
        encoded_len = encoded.len(),
        "Report encoded"
    );
    Ok(encoded)
}
