//! Draws laid-out pages with `printpdf`.

use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, ImageXObject, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference, Pt, Rect,
};

use crate::document::{DocumentDefinition, Logo, PageSetup};
use crate::error::ReportError;
use crate::layout::{Item, LaidOutDocument, TextItem};

/// Baseline sits this fraction of the font size below a line's top.
const BASELINE_RATIO: f32 = 0.85;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn pdf_err(e: impl std::fmt::Display) -> ReportError {
    ReportError::Pdf(e.to_string())
}

/// Convert a top-left based y coordinate into PDF user space.
fn flip(setup: &PageSetup, top: f32) -> Mm {
    Mm::from(Pt(setup.height - top))
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn black() -> Color {
    Color::Rgb(printpdf::Rgb::new(0.0, 0.0, 0.0, None))
}

fn draw_text(layer: &PdfLayerReference, setup: &PageSetup, fonts: &Fonts, item: &TextItem) {
    if item.text.is_empty() {
        return;
    }
    let font = if item.bold { &fonts.bold } else { &fonts.regular };
    let baseline = item.top + item.font_size * BASELINE_RATIO;
    layer.use_text(
        item.text.clone(),
        item.font_size,
        mm(item.x),
        flip(setup, baseline),
        font,
    );
}

/// Decode the logo once per document. A logo that fails to decode is
/// left out of the drawing.
fn decode_logo(logo: Option<&Logo>) -> Option<(&Logo, ImageXObject)> {
    let logo = logo?;
    match logo.decode() {
        Ok(image) => Some((logo, image.image)),
        Err(e) => {
            tracing::warn!(error = %e, "Logo could not be decoded, drawing without it");
            None
        }
    }
}

/// Draw every page of `doc` and return the serialized PDF.
pub fn write_pdf(doc: &LaidOutDocument, def: &DocumentDefinition) -> Result<Vec<u8>, ReportError> {
    let setup = &doc.setup;
    let (page_w, page_h) = (mm(setup.width), mm(setup.height));
    let (pdf, first_page, first_layer) = PdfDocument::new(def.title.as_str(), page_w, page_h, "Layer 1");

    let fonts = Fonts {
        regular: pdf.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
        bold: pdf.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
    };

    let logo_image = decode_logo(def.logo.as_ref());

    for (i, page) in doc.pages.iter().enumerate() {
        let (page_idx, layer_idx) = if i == 0 {
            (first_page, first_layer)
        } else {
            pdf.add_page(page_w, page_h, "Layer 1")
        };
        let layer = pdf.get_page(page_idx).get_layer(layer_idx);

        for item in &page.items {
            match item {
                Item::Fill(fill) => {
                    let printpdf_color = printpdf::Rgb::new(
                        fill.color.0 as f32 / 255.0,
                        fill.color.1 as f32 / 255.0,
                        fill.color.2 as f32 / 255.0,
                        None,
                    );
                    layer.set_fill_color(Color::Rgb(printpdf_color));
                    layer.add_rect(Rect::new(
                        mm(fill.x),
                        flip(setup, fill.top + fill.height),
                        mm(fill.x + fill.width),
                        flip(setup, fill.top),
                    ));
                    layer.set_fill_color(black());
                }
                Item::Text(text) => draw_text(&layer, setup, &fonts, text),
                Item::Image(placed) => {
                    let Some((logo, xobject)) = logo_image.as_ref() else {
                        continue;
                    };
                    Image::from(xobject.clone()).add_to_layer(
                        layer.clone(),
                        ImageTransform {
                            translate_x: Some(mm(placed.x)),
                            translate_y: Some(flip(setup, placed.top + placed.height)),
                            dpi: Some(logo.width_px as f32 * 72.0 / placed.width),
                            ..Default::default()
                        },
                    );
                }
            }
        }

        if let Some(header) = &page.header {
            draw_text(&layer, setup, &fonts, header);
        }
        draw_text(&layer, setup, &fonts, &page.footer);
    }

    pdf.save_to_bytes().map_err(pdf_err)
}
