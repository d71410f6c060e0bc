//! Pagination: flows a [`DocumentDefinition`] into positioned pages.
//!
//! Coordinates are points measured from the top-left corner of the page.
//! Text width is estimated from Helvetica advance widths, which is what
//! the PDF writer draws with.

use crate::document::{
    Align, Block, DocumentDefinition, PageSetup, Rgb, Spacing, Table, TableCell, TextSpan,
};

pub const CELL_PADDING_X: f32 = 4.0;
pub const CELL_PADDING_Y: f32 = 2.0;
/// Line height as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.2;

/// Header sits this far below the top edge of the page.
const HEADER_OFFSET: f32 = 10.0;
/// Footer sits this far below the bottom content edge and from the right edge.
const FOOTER_OFFSET: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub top: f32,
    pub font_size: f32,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillItem {
    pub x: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageItem {
    pub x: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Text(TextItem),
    Fill(FillItem),
    Image(ImageItem),
}

/// A table row as placed on a page. `body_index` 0 is the header.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    pub body_index: usize,
    pub top: f32,
    pub height: f32,
    pub shaded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutPage {
    /// 1-based page number.
    pub number: usize,
    pub items: Vec<Item>,
    pub table_rows: Vec<PlacedRow>,
    pub header: Option<TextItem>,
    pub footer: TextItem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub setup: PageSetup,
    pub pages: Vec<LaidOutPage>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Data rows placed across all pages, header repeats excluded.
    pub fn data_rows(&self) -> impl Iterator<Item = &PlacedRow> {
        self.pages
            .iter()
            .flat_map(|p| p.table_rows.iter())
            .filter(|r| r.body_index > 0)
    }
}

/// Approximate Helvetica advance width of `c`, in thousandths of an em.
fn char_width(c: char) -> f32 {
    let w = match c {
        'i' | 'j' | 'l' => 222,
        ' ' | '.' | ',' | ':' | ';' | '/' | '\\' | '!' | '|' | '\'' | 'I' | 'f' | 't' => 278,
        'r' | '-' | '(' | ')' => 333,
        'm' | 'M' => 833,
        'W' => 944,
        'w' => 722,
        '0'..='9' => 556,
        'A'..='Z' => 667,
        'a'..='z' => 556,
        _ => 556,
    };
    w as f32
}

/// Estimated width of `text` in points.
pub fn text_width(text: &str, font_size: f32, bold: bool) -> f32 {
    let em: f32 = text.chars().map(char_width).sum();
    let width = em * font_size / 1000.0;
    if bold {
        width * 1.05
    } else {
        width
    }
}

pub fn line_height(font_size: f32) -> f32 {
    font_size * LINE_SPACING
}

/// Greedy word wrap. Words wider than `max_width` are broken by character.
/// Always returns at least one line.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32, bold: bool) -> Vec<String> {
    let fits = |s: &str| text_width(s, font_size, bold) <= max_width;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if fits(&candidate) {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if fits(word) {
                line = word.to_string();
                continue;
            }
            for ch in word.chars() {
                let mut next = line.clone();
                next.push(ch);
                if !line.is_empty() && !fits(&next) {
                    lines.push(std::mem::take(&mut line));
                    line.push(ch);
                } else {
                    line = next;
                }
            }
        }
        lines.push(line);
    }
    lines
}

fn aligned_x(left: f32, width: f32, text_w: f32, align: Align) -> f32 {
    match align {
        Align::Left => left,
        Align::Center => left + ((width - text_w) / 2.0).max(0.0),
        Align::Right => left + (width - text_w).max(0.0),
    }
}

#[derive(Default)]
struct PageBuf {
    items: Vec<Item>,
    table_rows: Vec<PlacedRow>,
}

struct Flow {
    setup: PageSetup,
    pages: Vec<PageBuf>,
    cursor: f32,
}

impl Flow {
    fn new(setup: PageSetup) -> Self {
        Self {
            setup,
            pages: vec![PageBuf::default()],
            cursor: setup.content_top(),
        }
    }

    fn remaining(&self) -> f32 {
        self.setup.content_bottom() - self.cursor
    }

    fn at_page_top(&self) -> bool {
        self.cursor <= self.setup.content_top() + 0.01
    }

    fn new_page(&mut self) {
        self.pages.push(PageBuf::default());
        self.cursor = self.setup.content_top();
    }

    /// Break to a new page unless `height` fits. An empty page always
    /// accepts content, even if it overflows.
    fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.at_page_top() {
            self.new_page();
        }
    }

    fn push(&mut self, item: Item) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(item);
        }
    }

    fn push_lines(&mut self, lines: &[String], span: &TextSpan, left: f32, width: f32, top: f32) {
        let lh = line_height(span.font_size);
        for (i, line) in lines.iter().enumerate() {
            let w = text_width(line, span.font_size, span.bold);
            self.push(Item::Text(TextItem {
                text: line.clone(),
                x: aligned_x(left, width, w, span.align),
                top: top + i as f32 * lh,
                font_size: span.font_size,
                bold: span.bold,
            }));
        }
    }

    fn title_row(
        &mut self,
        def: &DocumentDefinition,
        logo_width: Option<f32>,
        title: &TextSpan,
        spacing: Spacing,
    ) {
        let logo = def.logo.as_ref().zip(logo_width);
        let content_w = self.setup.content_width();
        let (logo_w, logo_h) = logo
            .map(|(l, w)| {
                let w = w.min(content_w / 2.0);
                (w, l.height_for(w))
            })
            .unwrap_or((0.0, 0.0));

        let text_left = self.setup.margin + logo_w;
        let text_w = content_w - logo_w;
        let lines = wrap_text(&title.text, text_w, title.font_size, title.bold);
        let text_h = spacing.top + lines.len() as f32 * line_height(title.font_size) + spacing.bottom;

        self.ensure(logo_h.max(text_h));
        let top = self.cursor;
        if logo.is_some() {
            self.push(Item::Image(ImageItem {
                x: self.setup.margin,
                top,
                width: logo_w,
                height: logo_h,
            }));
        }
        self.push_lines(&lines, title, text_left, text_w, top + spacing.top);
        self.cursor = top + logo_h.max(text_h);
    }

    fn paragraph(&mut self, span: &TextSpan, spacing: Spacing) {
        let width = self.setup.content_width();
        let lines = wrap_text(&span.text, width, span.font_size, span.bold);
        let lh = line_height(span.font_size);
        self.ensure(spacing.top + lh);
        if !self.at_page_top() {
            self.cursor += spacing.top;
        }
        for line in &lines {
            self.ensure(lh);
            let top = self.cursor;
            self.push_lines(std::slice::from_ref(line), span, self.setup.margin, width, top);
            self.cursor += lh;
        }
        self.cursor += spacing.bottom;
    }

    fn logo(&mut self, def: &DocumentDefinition, width: f32) {
        let Some(logo) = def.logo.as_ref() else {
            return;
        };
        let content_w = self.setup.content_width();
        let w = width.min(content_w);
        let h = logo.height_for(w);
        self.ensure(h);
        self.push(Item::Image(ImageItem {
            x: self.setup.margin + (content_w - w) / 2.0,
            top: self.cursor,
            width: w,
            height: h,
        }));
        self.cursor += h;
    }

    fn table(&mut self, table: &Table) {
        let mut col_x = Vec::with_capacity(table.widths.len());
        let mut x = self.setup.margin;
        for w in &table.widths {
            col_x.push(x);
            x += w + 2.0 * CELL_PADDING_X;
        }
        let table_w = x - self.setup.margin;

        let wrapped: Vec<Vec<Vec<String>>> = (0..table.body_len())
            .filter_map(|i| table.body_row(i))
            .map(|cells| wrap_row(cells, &table.widths))
            .collect();
        let heights: Vec<f32> = (0..table.body_len())
            .filter_map(|i| table.body_row(i).map(|cells| row_height(cells, &wrapped[i])))
            .collect();

        // Keep the header together with the first data row.
        let lead = heights[0] + heights.get(1).copied().unwrap_or(0.0);
        self.ensure(lead);
        self.table_row(table, 0, &wrapped[0], heights[0], &col_x, table_w);

        for i in 1..table.body_len() {
            if heights[i] > self.remaining() && !self.at_page_top() {
                self.new_page();
                self.table_row(table, 0, &wrapped[0], heights[0], &col_x, table_w);
            }
            self.table_row(table, i, &wrapped[i], heights[i], &col_x, table_w);
        }
    }

    fn table_row(
        &mut self,
        table: &Table,
        body_index: usize,
        lines: &[Vec<String>],
        height: f32,
        col_x: &[f32],
        table_w: f32,
    ) {
        let top = self.cursor;
        let fill = Table::fill_for(body_index);
        if let Some(color) = fill {
            self.push(Item::Fill(FillItem {
                x: self.setup.margin,
                top,
                width: table_w,
                height,
                color,
            }));
        }
        if let Some(cells) = table.body_row(body_index) {
            for ((cell, cell_lines), x) in cells.iter().zip(lines).zip(col_x) {
                let lh = line_height(cell.font_size);
                for (n, line) in cell_lines.iter().enumerate() {
                    self.push(Item::Text(TextItem {
                        text: line.clone(),
                        x: x + CELL_PADDING_X,
                        top: top + CELL_PADDING_Y + n as f32 * lh,
                        font_size: cell.font_size,
                        bold: cell.bold,
                    }));
                }
            }
        }
        if let Some(page) = self.pages.last_mut() {
            page.table_rows.push(PlacedRow {
                body_index,
                top,
                height,
                shaded: fill.is_some(),
            });
        }
        self.cursor = top + height;
    }
}

fn wrap_row(cells: &[TableCell], widths: &[f32]) -> Vec<Vec<String>> {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| wrap_text(&cell.text, *w, cell.font_size, cell.bold))
        .collect()
}

fn row_height(cells: &[TableCell], lines: &[Vec<String>]) -> f32 {
    cells
        .iter()
        .zip(lines)
        .map(|(cell, l)| l.len() as f32 * line_height(cell.font_size))
        .fold(0.0, f32::max)
        + 2.0 * CELL_PADDING_Y
}

/// Flow `def` into pages, then resolve running headers and footers now
/// that the page count is known.
pub fn layout(def: &DocumentDefinition) -> LaidOutDocument {
    let mut flow = Flow::new(def.page);
    for block in &def.blocks {
        match block {
            Block::TitleRow {
                logo_width,
                title,
                title_spacing,
            } => flow.title_row(def, *logo_width, title, *title_spacing),
            Block::Paragraph { span, spacing } => flow.paragraph(span, *spacing),
            Block::Table(table) => flow.table(table),
            Block::Logo { width } => flow.logo(def, *width),
        }
    }

    let setup = def.page;
    let total = flow.pages.len();
    let pages = flow
        .pages
        .into_iter()
        .enumerate()
        .map(|(i, buf)| {
            let number = i + 1;
            let header = def.header_for(number).map(|span| TextItem {
                x: aligned_x(0.0, setup.width, text_width(&span.text, span.font_size, span.bold), span.align),
                top: HEADER_OFFSET,
                font_size: span.font_size,
                bold: span.bold,
                text: span.text,
            });
            let footer_span = def.footer_for(number, total);
            let footer_w = text_width(&footer_span.text, footer_span.font_size, footer_span.bold);
            let footer = TextItem {
                x: aligned_x(0.0, setup.width - FOOTER_OFFSET, footer_w, footer_span.align),
                top: setup.content_bottom() + FOOTER_OFFSET,
                font_size: footer_span.font_size,
                bold: footer_span.bold,
                text: footer_span.text,
            };
            LaidOutPage {
                number,
                items: buf.items,
                table_rows: buf.table_rows,
                header,
                footer,
            }
        })
        .collect();

    LaidOutDocument { setup, pages }
}
