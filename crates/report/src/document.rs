//! Declarative description of a report document.
//!
//! The renderer fills a [`DocumentDefinition`]; the layout pass turns it
//! into positioned pages. All measurements are PDF points.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::image_crate::{ImageDecoder, ImageError};
use printpdf::Image;

use crate::error::ReportError;

/// An RGB fill colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Zebra shading for even table rows (`#EEEEEE`).
pub const ROW_SHADE: Rgb = Rgb(0xEE, 0xEE, 0xEE);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// A run of text with uniform styling.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
    pub align: Align,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            bold: false,
            align: Align::Left,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Vertical spacing around a block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spacing {
    pub top: f32,
    pub bottom: f32,
}

impl Spacing {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
}

/// A table whose first body row is a header that repeats on every page.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Content width of each column (padding excluded).
    pub widths: Vec<f32>,
    pub header: Vec<TableCell>,
    pub rows: Vec<Vec<TableCell>>,
}

impl Table {
    /// Number of body rows, header included.
    pub fn body_len(&self) -> usize {
        self.rows.len() + 1
    }

    /// Row at `body_index`, where index 0 is the header.
    pub fn body_row(&self, body_index: usize) -> Option<&[TableCell]> {
        if body_index == 0 {
            Some(&self.header)
        } else {
            self.rows.get(body_index - 1).map(Vec::as_slice)
        }
    }

    /// Background for a body row, keyed only on its position.
    pub fn fill_for(body_index: usize) -> Option<Rgb> {
        if body_index % 2 == 0 {
            Some(ROW_SHADE)
        } else {
            None
        }
    }
}

/// Logo image with its pixel dimensions, used to keep the aspect ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    pub path: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
    /// PNG file contents. Known to decode cleanly.
    pub png: Vec<u8>,
}

impl Logo {
    /// Read the PNG at `path` and decode it completely, so a damaged file
    /// is rejected here instead of while the PDF is being drawn.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let png = std::fs::read(path)?;
        let (width_px, height_px) = PngDecoder::new(Cursor::new(png.as_slice()))
            .map_err(|e| image_error(path, e))?
            .dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(ReportError::Image(format!("{}: empty image", path.display())));
        }
        let logo = Self {
            path: path.to_path_buf(),
            width_px,
            height_px,
            png,
        };
        logo.decode()?;
        Ok(logo)
    }

    /// Decode the stored PNG into a drawable image.
    pub fn decode(&self) -> Result<Image, ReportError> {
        let decoder = PngDecoder::new(Cursor::new(self.png.as_slice()))
            .map_err(|e| image_error(&self.path, e))?;
        Image::try_from(decoder).map_err(|e| image_error(&self.path, e))
    }

    /// Height when drawn `width` points wide.
    pub fn height_for(&self, width: f32) -> f32 {
        width * self.height_px as f32 / self.width_px as f32
    }
}

fn image_error(path: &Path, e: ImageError) -> ReportError {
    ReportError::Image(format!("{}: {e}", path.display()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Logo column (when a logo is configured) beside the title text.
    TitleRow {
        logo_width: Option<f32>,
        title: TextSpan,
        title_spacing: Spacing,
    },
    Paragraph { span: TextSpan, spacing: Spacing },
    Table(Table),
    /// Standalone logo, centred.
    Logo { width: f32 },
}

/// Page size and margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageSetup {
    pub fn a4() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: 40.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn content_top(&self) -> f32 {
        self.margin
    }

    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin
    }
}

/// A full document: content blocks plus running header and footer rules.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDefinition {
    pub title: String,
    pub page: PageSetup,
    pub logo: Option<Logo>,
    pub blocks: Vec<Block>,
    /// Text repeated at the top of every page after the first.
    pub running_header: Option<String>,
}

impl DocumentDefinition {
    /// Header for page `page` (1-based). Page 1 never has one.
    pub fn header_for(&self, page: usize) -> Option<TextSpan> {
        if page <= 1 {
            return None;
        }
        self.running_header
            .as_ref()
            .map(|text| TextSpan::new(text.clone(), 12.0).align(Align::Center))
    }

    /// Footer for page `page` of `total`, on every page.
    pub fn footer_for(&self, page: usize, total: usize) -> TextSpan {
        TextSpan::new(format!("{page}/{total}"), 10.0).align(Align::Right)
    }

    pub fn table(&self) -> Option<&Table> {
        self.blocks.iter().find_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// All paragraph texts, in order.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph { span, .. } => Some(span.text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> DocumentDefinition {
        DocumentDefinition {
            title: "T".to_string(),
            page: PageSetup::a4(),
            logo: None,
            blocks: Vec::new(),
            running_header: Some("Report".to_string()),
        }
    }

    #[test]
    fn header_suppressed_on_first_page() {
        let doc = definition();
        assert!(doc.header_for(1).is_none());
        assert_eq!(doc.header_for(2).unwrap().text, "Report");
    }

    #[test]
    fn footer_shows_page_of_total() {
        let footer = definition().footer_for(2, 5);
        assert_eq!(footer.text, "2/5");
        assert_eq!(footer.align, Align::Right);
    }

    #[test]
    fn shading_by_position() {
        assert_eq!(Table::fill_for(0), Some(ROW_SHADE));
        assert_eq!(Table::fill_for(1), None);
        assert_eq!(Table::fill_for(2), Some(ROW_SHADE));
    }

    #[test]
    fn logo_keeps_aspect_ratio() {
        let logo = Logo {
            path: PathBuf::from("logo.png"),
            width_px: 400,
            height_px: 100,
            png: Vec::new(),
        };
        assert_eq!(logo.height_for(200.0), 50.0);
    }

    #[test]
    fn missing_logo_file_is_io_error() {
        let err = Logo::load(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        use printpdf::image_crate::codecs::png::PngEncoder;
        use printpdf::image_crate::{ColorType, ImageEncoder};

        let pixels: Vec<u8> = (0..width * height * 3).map(|i| (i * 7 % 251) as u8).collect();
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&pixels, width, height, ColorType::Rgb8)
            .unwrap();
        out
    }

    #[test]
    fn loads_complete_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, sample_png(64, 32)).unwrap();

        let logo = Logo::load(&path).unwrap();
        assert_eq!((logo.width_px, logo.height_px), (64, 32));
        assert!(logo.decode().is_ok());
    }

    #[test]
    fn truncated_png_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        let png = sample_png(64, 32);
        std::fs::write(&path, &png[..png.len() - 30]).unwrap();

        let err = Logo::load(&path).unwrap_err();
        assert!(matches!(err, ReportError::Image(_)), "got {err:?}");
    }
}
