//! PDF emission.
//!
//! Serializes the laid-out page model using `lopdf`. Text is set in the
//! base-14 Times faces with WinAnsi encoding, which covers the Spanish
//! character set; images are embedded as JPEG (`DCTDecode`) XObjects.

use failure::Fail;
use lopdf::{
    content::{Content, Operation},
    dictionary, Dictionary, Document as PdfDocument, Object, Stream,
    StringFormat,
};

use super::{
    fonts::Face,
    layout::{Document, Element, PAGE_HEIGHT, PAGE_WIDTH},
};

/// Re-encode text for the WinAnsi code page. Characters outside it are
/// replaced, not dropped, so layout widths stay roughly honest.
fn winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code == 0x20AC {
                0x80
            } else if (0x20..=0xFF).contains(&code)
                && !(0x7F..=0x9F).contains(&code)
            {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

fn face_objects(pdf: &mut PdfDocument) -> Dictionary {
    let mut fonts = Dictionary::new();
    for face in [Face::Regular, Face::Bold, Face::Italic] {
        let id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource(), id);
    }
    fonts
}

fn page_operations(page: &[Element]) -> Vec<Operation> {
    let mut ops = Vec::new();

    for element in page {
        match element {
            Element::Rect { x, y, width, height, gray } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("g", vec![(*gray).into()]));
                ops.push(Operation::new("re", vec![
                    (*x).into(), (*y).into(),
                    (*width).into(), (*height).into(),
                ]));
                ops.push(Operation::new("f", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            Element::Image { asset, x, y, width, height } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("cm", vec![
                    (*width).into(), 0.into(), 0.into(),
                    (*height).into(), (*x).into(), (*y).into(),
                ]));
                ops.push(Operation::new("Do", vec![
                    Object::Name(format!("Im{}", asset).into_bytes()),
                ]));
                ops.push(Operation::new("Q", vec![]));
            }
            Element::Text { x, y, face, size, text, word_spacing } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new("Tf", vec![
                    Object::Name(face.resource().into()),
                    (*size).into(),
                ]));
                ops.push(Operation::new("Tw", vec![(*word_spacing).into()]));
                ops.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                ops.push(Operation::new("Tj", vec![
                    Object::String(winansi(text), StringFormat::Literal),
                ]));
                ops.push(Operation::new("ET", vec![]));
            }
        }
    }

    ops
}

/// Serialize the page model to PDF bytes.
pub fn emit(doc: &Document) -> Result<Vec<u8>, EmitError> {
    let mut pdf = PdfDocument::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let fonts = face_objects(&mut pdf);

    let mut xobjects = Dictionary::new();
    for (i, asset) in doc.images.iter().enumerate() {
        let stream = Stream::new(dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => asset.width as i64,
            "Height" => asset.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        }, asset.jpeg.clone());
        let id = pdf.add_object(stream);
        xobjects.set(format!("Im{}", i), id);
    }

    let resources_id = pdf.add_object(dictionary! {
        "Font" => Object::Dictionary(fonts),
        "XObject" => Object::Dictionary(xobjects),
    });

    let mut kids = Vec::new();
    for page in &doc.pages {
        let encoded = Content { operations: page_operations(&page.elements) }
            .encode()
            .map_err(|e| EmitError(e.to_string()))?;
        let content_id = pdf.add_object(
            Stream::new(dictionary! {}, encoded));

        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(), 0.into(),
                PAGE_WIDTH.into(), PAGE_HEIGHT.into(),
            ],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    pdf.objects.insert(pages_id, Object::Dictionary(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    }));

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    pdf.save_to(&mut out).map_err(|e| EmitError(e.to_string()))?;

    Ok(out)
}

#[derive(Debug, Fail)]
#[fail(display = "No se pudo generar el PDF: {}", _0)]
pub struct EmitError(String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{
        fonts::FontSet,
        layout::{self, Input},
    };

    #[test]
    fn emits_a_wellformed_header_and_page_count() {
        let fonts = FontSet::builtin().unwrap();
        let doc = layout::layout(&fonts, Input {
            titulo: "T".to_string(),
            autor: "A".to_string(),
            fecha_publicacion: None,
            tipo_publicacion: "Ensayo".to_string(),
            resumen: "R".to_string(),
            blocks: vec![],
            referencias: String::new(),
            cover: None,
            logo: None,
        });

        let bytes = emit(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let parsed = PdfDocument::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), doc.pages.len());
    }

    #[test]
    fn winansi_keeps_spanish_text() {
        assert_eq!(winansi("publicación"), b"publicaci\xf3n".to_vec());
        assert_eq!(winansi("¿señal?"), b"\xbfse\xf1al?".to_vec());
        // Outside the code page: substituted, same length.
        assert_eq!(winansi("漢"), b"?".to_vec());
    }
}
