//! Builds the anomaly report document and renders it to PDF bytes.

use chrono::NaiveDate;

use digest_core::config::ReportConfig;

use crate::document::{
    Align, Block, DocumentDefinition, Logo, PageSetup, Spacing, Table, TableCell, TextSpan,
};
use crate::error::ReportError;
use crate::format::DisplayRow;
use crate::layout::layout;
use crate::templating::{ReportTemplates, TemplateContext};

/// Column content widths in points, in table column order.
pub const COLUMN_WIDTHS: [f32; 8] = [35.0, 50.0, 95.0, 65.0, 45.0, 50.0, 50.0, 50.0];
pub const COLUMN_TITLES: [&str; 8] = [
    "ID", "IP Group", "Prefix", "Anomaly", "Duration", "Start", "Packets", "Bits",
];
pub const NO_ANOMALIES_MESSAGE: &str = "No anomalies were detected in the last 24 hours.";

const TITLE_LOGO_WIDTH: f32 = 150.0;
const CLOSING_LOGO_WIDTH: f32 = 250.0;
const TITLE_FONT_SIZE: f32 = 20.0;
const HEADER_CELL_FONT_SIZE: f32 = 10.0;

/// Per-run report metadata. The date is the generation date, not the
/// query window.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub customer: String,
    pub report_date: NaiveDate,
}

impl ReportMeta {
    fn template_context(&self) -> TemplateContext {
        TemplateContext::new(&self.customer, self.report_date)
    }
}

/// A rendered PDF held in memory, not yet written to disk.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub row_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    templates: ReportTemplates,
    logo: Option<Logo>,
}

impl ReportRenderer {
    pub fn new(templates: ReportTemplates, logo: Option<Logo>) -> Self {
        Self { templates, logo }
    }

    /// Build a renderer from the report section of the config.
    ///
    /// A configured logo that cannot be read is logged and skipped: the
    /// report is still useful without it.
    pub fn from_config(config: &ReportConfig) -> Result<Self, ReportError> {
        let templates = ReportTemplates::new(&config.title_template, &config.file_template)?;
        let logo = match config.logo_path.as_deref() {
            Some(path) => match Logo::load(path) {
                Ok(logo) => Some(logo),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Logo unavailable, rendering without it");
                    None
                }
            },
            None => None,
        };
        Ok(Self::new(templates, logo))
    }

    pub fn file_name(&self, meta: &ReportMeta) -> Result<String, ReportError> {
        self.templates.file_name(&meta.template_context())
    }

    /// Describe the document for `rows`: title block, then either the
    /// "no anomalies" message or the table, then the closing logo.
    pub fn build(&self, rows: &[DisplayRow], meta: &ReportMeta) -> Result<DocumentDefinition, ReportError> {
        let title = self.templates.title(&meta.template_context())?;
        let logo_width = self.logo.as_ref().map(|_| TITLE_LOGO_WIDTH);

        let mut blocks = vec![Block::TitleRow {
            logo_width,
            title: TextSpan::new(title.clone(), TITLE_FONT_SIZE).bold().align(Align::Center),
            title_spacing: Spacing::new(40.0, 10.0),
        }];

        if rows.is_empty() {
            blocks.push(Block::Paragraph {
                span: TextSpan::new(NO_ANOMALIES_MESSAGE, TITLE_FONT_SIZE)
                    .bold()
                    .align(Align::Center),
                spacing: Spacing::new(10.0, 10.0),
            });
        } else {
            blocks.push(Block::Table(anomaly_table(rows)));
        }

        if self.logo.is_some() {
            blocks.push(Block::Logo {
                width: CLOSING_LOGO_WIDTH,
            });
        }

        Ok(DocumentDefinition {
            title: title.clone(),
            page: PageSetup::a4(),
            logo: self.logo.clone(),
            blocks,
            running_header: Some(title),
        })
    }

    /// Build, paginate and draw the report.
    pub fn render(&self, rows: &[DisplayRow], meta: &ReportMeta) -> Result<RenderedReport, ReportError> {
        let definition = self.build(rows, meta)?;
        let laid_out = layout(&definition);
        let bytes = crate::pdf::write_pdf(&laid_out, &definition)?;
        let report = RenderedReport {
            name: self.file_name(meta)?,
            bytes,
            page_count: laid_out.page_count(),
            row_count: rows.len(),
        };
        tracing::debug!(
            name = %report.name,
            pages = report.page_count,
            rows = report.row_count,
            bytes = report.bytes.len(),
            "Report rendered"
        );
        Ok(report)
    }
}

fn anomaly_table(rows: &[DisplayRow]) -> Table {
    let header = COLUMN_TITLES
        .iter()
        .map(|title| TableCell {
            text: (*title).to_string(),
            font_size: HEADER_CELL_FONT_SIZE,
            bold: true,
        })
        .collect();
    let rows = rows
        .iter()
        .map(|row| {
            row.cells()
                .iter()
                .map(|c| TableCell {
                    text: c.text.clone(),
                    font_size: c.font_size,
                    bold: false,
                })
                .collect()
        })
        .collect();
    Table {
        widths: COLUMN_WIDTHS.to_vec(),
        header,
        rows,
    }
}
