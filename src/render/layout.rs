//! Page layout.
//!
//! Turns a publication's metadata and transformed content blocks into a
//! backend-independent page model: absolutely positioned text runs,
//! images, and rectangles on letter-sized pages. Page order is fixed:
//! cover, metadata, summary, body, references (the last only when there
//! are references).

use chrono::NaiveDateTime;

use super::{
    content::Block,
    fonts::{Face, FontSet},
};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;

const BODY_SIZE: f32 = 12.0;
const LINE_FACTOR: f32 = 1.4;

const LOGO_WIDTH: f32 = 250.0;
const LOGO_HEIGHT: f32 = 100.0;

/// What a page is for. Continuation pages keep the kind of the section
/// that overflowed onto them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageKind {
    Cover,
    Metadata,
    Summary,
    Body,
    References,
}

/// A JPEG ready for embedding.
#[derive(Clone, Debug)]
pub struct ImageAsset {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A positioned drawing primitive. Coordinates are PDF-style: origin at
/// the bottom-left corner, `y` is the text baseline.
#[derive(Clone, Debug)]
pub enum Element {
    Text {
        x: f32,
        y: f32,
        face: Face,
        size: f32,
        text: String,
        /// Extra width added to every space, for justification.
        word_spacing: f32,
    },
    Image {
        /// Index into [`Document::images`].
        asset: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        /// 0 is black, 1 is white.
        gray: f32,
    },
}

#[derive(Clone, Debug)]
pub struct Page {
    pub kind: PageKind,
    pub elements: Vec<Element>,
}

/// The laid-out document.
#[derive(Clone, Debug)]
pub struct Document {
    pub pages: Vec<Page>,
    pub images: Vec<ImageAsset>,
}

/// Everything layout needs about a publication.
#[derive(Clone, Debug)]
pub struct Input {
    pub titulo: String,
    pub autor: String,
    pub fecha_publicacion: Option<NaiveDateTime>,
    pub tipo_publicacion: String,
    pub resumen: String,
    pub blocks: Vec<Block>,
    pub referencias: String,
    pub cover: Option<ImageAsset>,
    pub logo: Option<ImageAsset>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Align {
    Left,
    Center,
    Justify,
}

struct Writer<'a> {
    fonts: &'a FontSet,
    pages: Vec<Page>,
    current: Page,
    y: f32,
}

impl<'a> Writer<'a> {
    fn new(fonts: &'a FontSet, kind: PageKind) -> Writer<'a> {
        Writer {
            fonts,
            pages: Vec::new(),
            current: Page { kind, elements: Vec::new() },
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn break_page(&mut self, kind: PageKind) {
        let done = std::mem::replace(
            &mut self.current,
            Page { kind, elements: Vec::new() },
        );
        self.pages.push(done);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.break_page(self.current.kind);
        }
    }

    fn move_down(&mut self, points: f32) {
        self.y -= points;
    }

    fn push(&mut self, element: Element) {
        self.current.elements.push(element);
    }

    /// Lay out `text` wrapped into `width`, one positioned line at a time.
    fn wrapped(
        &mut self,
        text: &str,
        face: Face,
        size: f32,
        x: f32,
        width: f32,
        align: Align,
        first_indent: f32,
    ) {
        let line_height = size * LINE_FACTOR;

        for segment in text.split('\n') {
            let words: Vec<&str> = segment.split_whitespace().collect();
            if words.is_empty() {
                self.move_down(line_height);
                continue;
            }

            let mut line: Vec<&str> = Vec::new();
            let mut first_line = true;

            let flush = |writer: &mut Writer, line: &[&str], last: bool,
                             first_line: bool| {
                let indent = if first_line { first_indent } else { 0.0 };
                let joined = line.join(" ");
                let natural = writer.fonts.text_width(face, size, &joined);

                let (line_x, word_spacing) = match align {
                    Align::Left => (x + indent, 0.0),
                    Align::Center =>
                        (x + (width - natural) / 2.0, 0.0),
                    Align::Justify => {
                        let gaps = line.len().saturating_sub(1) as f32;
                        if last || gaps == 0.0 {
                            (x + indent, 0.0)
                        } else {
                            let extra = (width - indent - natural) / gaps;
                            (x + indent, extra.max(0.0))
                        }
                    }
                };

                writer.ensure_room(line_height);
                writer.move_down(line_height);
                writer.push(Element::Text {
                    x: line_x,
                    y: writer.y,
                    face,
                    size,
                    text: joined,
                    word_spacing,
                });
            };

            for word in words {
                let indent = if first_line { first_indent } else { 0.0 };
                let mut candidate = line.join(" ");
                if !candidate.is_empty() {
                    candidate.push(' ');
                }
                candidate.push_str(word);

                let fits = self.fonts.text_width(face, size, &candidate)
                    <= width - indent;
                if fits || line.is_empty() {
                    line.push(word);
                } else {
                    flush(self, &line, false, first_line);
                    first_line = false;
                    line.clear();
                    line.push(word);
                }
            }

            if !line.is_empty() {
                flush(self, &line, true, first_line);
            }
        }
    }
}

fn heading_size(level: u8) -> f32 {
    match level {
        1 => 20.0,
        2 => 18.0,
        3 => 16.0,
        4 => 14.0,
        5 => 13.0,
        _ => 12.0,
    }
}

/// Place an image inside a box, preserving aspect ratio, anchored to the
/// box's bottom-right corner.
fn fit_bottom_right(
    asset: &ImageAsset,
    box_x: f32,
    box_y: f32,
    box_w: f32,
    box_h: f32,
) -> (f32, f32, f32, f32) {
    let scale = (box_w / asset.width as f32)
        .min(box_h / asset.height as f32);
    let w = asset.width as f32 * scale;
    let h = asset.height as f32 * scale;

    (box_x + (box_w - w), box_y, w, h)
}

fn cover_page(doc: &mut Document, input: &Input, cover: Option<usize>,
              logo: Option<usize>) {
    let mut elements = Vec::new();

    if let Some(asset) = cover {
        elements.push(Element::Image {
            asset,
            x: 0.0,
            y: 0.0,
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
        });
    }

    if let Some(asset) = logo {
        let box_x = PAGE_WIDTH - LOGO_WIDTH - 30.0;
        let box_y = 0.0;

        // White band behind the logo so it reads over any cover art.
        elements.push(Element::Rect {
            x: box_x - 5.0,
            y: box_y,
            width: LOGO_WIDTH + 10.0,
            height: LOGO_HEIGHT + 10.0,
            gray: 1.0,
        });

        let (x, y, w, h) = fit_bottom_right(
            &doc.images[asset], box_x, box_y, LOGO_WIDTH, LOGO_HEIGHT);
        elements.push(Element::Image { asset, x, y, width: w, height: h });
    }

    let _ = input;
    doc.pages.push(Page { kind: PageKind::Cover, elements });
}

fn metadata_page(fonts: &FontSet, input: &Input) -> Page {
    let width = PAGE_WIDTH - 2.0 * MARGIN;
    let mut writer = Writer::new(fonts, PageKind::Metadata);

    // Vertical centering: measure the block, then offset the cursor.
    let title_lines = {
        let mut probe = Writer::new(fonts, PageKind::Metadata);
        probe.wrapped(&input.titulo, Face::Bold, 24.0, MARGIN, width,
            Align::Center, 0.0);
        probe.current.elements.len() as f32
    };
    let block_height = title_lines * 24.0 * LINE_FACTOR
        + 2.0 * 24.0 * LINE_FACTOR
        + 5.0 * 14.0 * LINE_FACTOR;
    let offset = ((PAGE_HEIGHT - 2.0 * MARGIN - block_height) / 2.0).max(0.0);
    writer.move_down(offset);

    writer.wrapped(&input.titulo, Face::Bold, 24.0, MARGIN, width,
        Align::Center, 0.0);
    writer.move_down(2.0 * 24.0 * LINE_FACTOR);

    let fecha = input.fecha_publicacion
        .map(|f| f.format("%d/%m/%Y").to_string())
        .unwrap_or_default();
    for line in [
        format!("Autor: {}", input.autor),
        format!("Fecha de publicación: {}", fecha),
        format!("Tipo de publicación: {}", input.tipo_publicacion),
    ] {
        writer.wrapped(&line, Face::Regular, 14.0, MARGIN, width,
            Align::Center, 0.0);
        writer.move_down(14.0 * LINE_FACTOR);
    }

    writer.current
}

fn summary_pages(fonts: &FontSet, input: &Input) -> Vec<Page> {
    let mut writer = Writer::new(fonts, PageKind::Summary);

    writer.wrapped("Resumen", Face::Bold, 16.0, MARGIN,
        PAGE_WIDTH - 2.0 * MARGIN, Align::Center, 0.0);
    writer.move_down(2.0 * 16.0 * LINE_FACTOR);

    writer.wrapped(&input.resumen, Face::Regular, BODY_SIZE, MARGIN,
        PAGE_WIDTH - 3.0 * MARGIN, Align::Justify, 20.0);

    let Writer { mut pages, current, .. } = writer;
    pages.push(current);
    pages
}

fn body_pages(fonts: &FontSet, blocks: &[Block]) -> Vec<Page> {
    let width = PAGE_WIDTH - 2.0 * MARGIN;
    let mut writer = Writer::new(fonts, PageKind::Body);

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let size = heading_size(*level);
                writer.ensure_room(size * LINE_FACTOR * 2.0);
                writer.move_down(size * 0.6);
                writer.wrapped(text, Face::Bold, size, MARGIN, width,
                    Align::Left, 0.0);
                writer.move_down(size * 0.4);
            }
            Block::Paragraph(text) => {
                writer.wrapped(text, Face::Regular, BODY_SIZE, MARGIN, width,
                    Align::Justify, 0.0);
                writer.move_down(BODY_SIZE * 0.6);
            }
            Block::List { ordered, items } => {
                for (i, item) in items.iter().enumerate() {
                    let prefix = if *ordered {
                        format!("{}. {}", i + 1, item)
                    } else {
                        format!("• {}", item)
                    };
                    writer.wrapped(&prefix, Face::Regular, BODY_SIZE,
                        MARGIN + 10.0, width - 10.0, Align::Left, 0.0);
                }
                writer.move_down(BODY_SIZE * 0.6);
            }
            Block::Blockquote(text) => {
                writer.wrapped(text, Face::Italic, BODY_SIZE, MARGIN + 20.0,
                    width - 40.0, Align::Left, 0.0);
                writer.move_down(BODY_SIZE * 0.6);
            }
            Block::CodeBlock(text) => {
                writer.wrapped(text, Face::Regular, BODY_SIZE, MARGIN + 20.0,
                    width - 20.0, Align::Left, 0.0);
                writer.move_down(BODY_SIZE * 0.6);
            }
            Block::Rule => {
                writer.ensure_room(BODY_SIZE);
                writer.move_down(BODY_SIZE * 0.5);
                let y = writer.y;
                writer.push(Element::Rect {
                    x: MARGIN,
                    y,
                    width,
                    height: 0.7,
                    gray: 0.0,
                });
                writer.move_down(BODY_SIZE * 0.5);
            }
            Block::Table { rows } => {
                for row in rows {
                    writer.wrapped(&row.join(" | "), Face::Regular, BODY_SIZE,
                        MARGIN, width, Align::Left, 0.0);
                }
                writer.move_down(BODY_SIZE * 0.6);
            }
        }
    }

    let Writer { mut pages, current, .. } = writer;
    pages.push(current);
    pages
}

fn references_pages(fonts: &FontSet, referencias: &str) -> Vec<Page> {
    let mut writer = Writer::new(fonts, PageKind::References);

    writer.wrapped("Referencias", Face::Bold, 16.0, MARGIN,
        PAGE_WIDTH - 2.0 * MARGIN, Align::Center, 0.0);
    writer.move_down(16.0 * LINE_FACTOR);

    writer.wrapped(referencias, Face::Regular, BODY_SIZE, MARGIN,
        PAGE_WIDTH - 2.0 * MARGIN, Align::Left, 0.0);

    let Writer { mut pages, current, .. } = writer;
    pages.push(current);
    pages
}

/// Lay out the whole document.
pub fn layout(fonts: &FontSet, mut input: Input) -> Document {
    let mut doc = Document { pages: Vec::new(), images: Vec::new() };

    let cover = input.cover.take().map(|asset| {
        doc.images.push(asset);
        doc.images.len() - 1
    });
    let logo = input.logo.take().map(|asset| {
        doc.images.push(asset);
        doc.images.len() - 1
    });

    cover_page(&mut doc, &input, cover, logo);
    doc.pages.push(metadata_page(fonts, &input));
    doc.pages.extend(summary_pages(fonts, &input));
    doc.pages.extend(body_pages(fonts, &input.blocks));
    if !input.referencias.trim().is_empty() {
        doc.pages.extend(references_pages(fonts, &input.referencias));
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::content;

    fn fonts() -> FontSet {
        FontSet::builtin().unwrap()
    }

    fn input() -> Input {
        Input {
            titulo: "Regeneración en axolotes".to_string(),
            autor: "Ana".to_string(),
            fecha_publicacion: None,
            tipo_publicacion: "Artículo".to_string(),
            resumen: "Un resumen.".to_string(),
            blocks: content::transform("<p>Cuerpo.</p>"),
            referencias: String::new(),
            cover: None,
            logo: None,
        }
    }

    fn page_text(page: &Page) -> String {
        page.elements.iter()
            .filter_map(|e| match e {
                Element::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn page_order_without_references() {
        let doc = layout(&fonts(), input());
        let kinds: Vec<PageKind> =
            doc.pages.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![
            PageKind::Cover,
            PageKind::Metadata,
            PageKind::Summary,
            PageKind::Body,
        ]);
    }

    #[test]
    fn references_page_appears_last_when_present() {
        let mut i = input();
        i.referencias = "Monjaraz (2021). Biología del ajolote.".to_string();
        let doc = layout(&fonts(), i);

        let last = doc.pages.last().unwrap();
        assert_eq!(last.kind, PageKind::References);
        assert!(page_text(last).contains("Biología del ajolote."));
        assert!(page_text(last).contains("Referencias"));
    }

    #[test]
    fn metadata_page_lists_author_date_and_category() {
        let mut i = input();
        i.fecha_publicacion =
            chrono::NaiveDate::from_ymd_opt(2025, 3, 9)
                .and_then(|d| d.and_hms_opt(12, 0, 0));
        let doc = layout(&fonts(), i);

        let text = page_text(&doc.pages[1]);
        assert!(text.contains("Regeneración en axolotes"));
        assert!(text.contains("Autor: Ana"));
        assert!(text.contains("Fecha de publicación: 09/03/2025"));
        assert!(text.contains("Tipo de publicación: Artículo"));
    }

    #[test]
    fn long_content_flows_across_pages() {
        let mut i = input();
        let long = (0..200)
            .map(|n| format!("<p>Párrafo número {} con algo de texto.</p>", n))
            .collect::<String>();
        i.blocks = content::transform(&long);
        let doc = layout(&fonts(), i);

        let body_pages = doc.pages.iter()
            .filter(|p| p.kind == PageKind::Body)
            .count();
        assert!(body_pages > 1);
    }

    #[test]
    fn cover_art_and_logo_are_optional() {
        let doc = layout(&fonts(), input());
        assert!(doc.pages[0].elements.is_empty());
        assert!(doc.images.is_empty());

        let mut i = input();
        i.cover = Some(ImageAsset { jpeg: vec![0], width: 800, height: 600 });
        i.logo = Some(ImageAsset { jpeg: vec![0], width: 500, height: 200 });
        let doc = layout(&fonts(), i);
        assert_eq!(doc.images.len(), 2);
        // Full-bleed cover, white band, fitted logo.
        assert_eq!(doc.pages[0].elements.len(), 3);
    }

    #[test]
    fn justified_lines_receive_word_spacing() {
        let mut i = input();
        let words = std::iter::repeat("palabra")
            .take(60)
            .collect::<Vec<_>>()
            .join(" ");
        i.blocks = content::transform(&format!("<p>{}</p>", words));
        let doc = layout(&fonts(), i);

        let body = doc.pages.iter()
            .find(|p| p.kind == PageKind::Body)
            .unwrap();
        let spaced = body.elements.iter().any(|e| matches!(e,
            Element::Text { word_spacing, .. } if *word_spacing > 0.0));
        assert!(spaced);
    }
}
