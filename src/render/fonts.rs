//! Typeface metrics for layout.
//!
//! Documents are set in the standard Times faces, which every PDF viewer
//! ships. Their advance widths are compiled in; the set is validated once
//! when the renderer is constructed, never per request.

use failure::Fail;

/// The serif faces a document uses.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Face {
    Regular,
    Bold,
    Italic,
}

impl Face {
    /// PostScript name of the backing base-14 font.
    pub fn base_font(self) -> &'static str {
        match self {
            Face::Regular => "Times-Roman",
            Face::Bold => "Times-Bold",
            Face::Italic => "Times-Italic",
        }
    }

    /// Resource name under which the face is registered on each page.
    pub fn resource(self) -> &'static str {
        match self {
            Face::Regular => "F1",
            Face::Bold => "F2",
            Face::Italic => "F3",
        }
    }
}

// Advance widths for ASCII 0x20..=0x7E, in 1/1000 em.
const WIDTHS_REGULAR: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 333, 333, 333, 500, 564, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278,
    564, 564, 564, 444, 921, 722, 667, 667, 722, 611, 556, 722, 722, 333,
    389, 722, 611, 889, 722, 722, 556, 722, 667, 556, 611, 722, 722, 944,
    722, 722, 611, 333, 278, 333, 469, 500, 333, 444, 500, 444, 500, 444,
    333, 500, 500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333, 389,
    278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

const WIDTHS_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 333, 333, 333, 500, 570, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333,
    570, 570, 570, 500, 930, 722, 667, 722, 722, 667, 611, 778, 778, 389,
    500, 778, 667, 944, 722, 778, 611, 778, 722, 556, 667, 722, 722, 1000,
    722, 722, 667, 333, 278, 333, 581, 500, 333, 500, 556, 444, 556, 444,
    333, 500, 556, 278, 333, 556, 278, 833, 556, 500, 556, 556, 444, 389,
    333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

const WIDTHS_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 333, 333, 333, 500, 675, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333,
    675, 675, 675, 500, 920, 611, 611, 667, 722, 611, 611, 722, 722, 333,
    444, 667, 556, 833, 667, 722, 611, 722, 611, 500, 556, 722, 611, 833,
    611, 556, 556, 389, 278, 389, 422, 500, 333, 500, 500, 444, 500, 444,
    278, 500, 500, 278, 278, 444, 278, 722, 500, 500, 500, 500, 389, 389,
    278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

const DEFAULT_WIDTH: u16 = 500;

/// Strip the diacritic off the letters Spanish text actually uses, so
/// their metrics come from the base letter.
fn base_char(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'Á' | 'À' | 'Ä' | 'Â' => 'A',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'Ñ' => 'N',
        '¿' => '?',
        '¡' => '!',
        c => c,
    }
}

/// The validated set of faces available to layout.
#[derive(Clone, Debug)]
pub struct FontSet {
    _validated: (),
}

impl FontSet {
    /// Load and validate the built-in metrics. Failure here is fatal at
    /// renderer construction; requests never re-check.
    pub fn builtin() -> Result<FontSet, FontError> {
        for (face, table) in [
            (Face::Regular, &WIDTHS_REGULAR),
            (Face::Bold, &WIDTHS_BOLD),
            (Face::Italic, &WIDTHS_ITALIC),
        ] {
            if table.len() != 95 || table.iter().any(|&w| w == 0) {
                return Err(FontError(face.base_font()));
            }
        }

        Ok(FontSet { _validated: () })
    }

    fn table(face: Face) -> &'static [u16; 95] {
        match face {
            Face::Regular => &WIDTHS_REGULAR,
            Face::Bold => &WIDTHS_BOLD,
            Face::Italic => &WIDTHS_ITALIC,
        }
    }

    /// Advance width of a single character at size 1000.
    fn char_width(face: Face, c: char) -> u16 {
        let c = base_char(c);
        let code = c as u32;
        if (0x20..=0x7E).contains(&code) {
            Self::table(face)[(code - 0x20) as usize]
        } else {
            DEFAULT_WIDTH
        }
    }

    /// Width of `text` set in `face` at `size` points.
    pub fn text_width(&self, face: Face, size: f32, text: &str) -> f32 {
        let units: u32 = text.chars()
            .map(|c| u32::from(Self::char_width(face, c)))
            .sum();
        units as f32 * size / 1000.0
    }
}

/// A required typeface is unusable.
#[derive(Debug, Fail)]
#[fail(display = "Fuente requerida no disponible: {}", _0)]
pub struct FontError(&'static str);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_metrics_validate() {
        assert!(FontSet::builtin().is_ok());
    }

    #[test]
    fn widths_scale_with_size() {
        let fonts = FontSet::builtin().unwrap();
        let at_12 = fonts.text_width(Face::Regular, 12.0, "Hola");
        let at_24 = fonts.text_width(Face::Regular, 24.0, "Hola");
        assert!((at_24 - at_12 * 2.0).abs() < 1e-4);
    }

    #[test]
    fn bold_is_wider_than_regular() {
        let fonts = FontSet::builtin().unwrap();
        let regular = fonts.text_width(Face::Regular, 12.0, "publicación");
        let bold = fonts.text_width(Face::Bold, 12.0, "publicación");
        assert!(bold > regular);
    }

    #[test]
    fn accented_letters_use_base_metrics() {
        let fonts = FontSet::builtin().unwrap();
        let plain = fonts.text_width(Face::Regular, 12.0, "nino");
        let accented = fonts.text_width(Face::Regular, 12.0, "niño");
        assert!((plain - accented).abs() < 1e-4);
    }
}
