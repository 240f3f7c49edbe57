//! Glyph metrics for the standard PDF fonts.
//!
//! Widths are AFM advance widths in 1/1000 em for the printable ASCII range
//! (0x20..=0x7E). Oblique faces share widths with their upright faces.
//! Vertical metrics follow Arial's hhea table, which Helvetica is
//! metric-compatible with, so a 12pt line is 13.8pt tall.

/// Width and vertical metrics of one standard font face.
#[derive(Debug)]
pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    /// Advance used for characters outside the table.
    default_width: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    extra: fn(char) -> Option<u16>,
}

impl StandardFontMetrics {
    /// Advance width of a character in 1/1000 em.
    pub fn advance(&self, ch: char) -> u16 {
        let code = ch as u32;
        if (0x20..=0x7E).contains(&code) {
            return self.widths[(code - 0x20) as usize];
        }
        (self.extra)(ch).unwrap_or(self.default_width)
    }

    /// Advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.advance(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points, no kerning.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }

    /// Distance between consecutive baselines.
    pub fn line_height(&self, font_size: f64) -> f64 {
        (self.ascender as f64 - self.descender as f64 + self.line_gap as f64) / 1000.0 * font_size
    }

    /// Distance from the top of a line box to the baseline.
    pub fn ascent(&self, font_size: f64) -> f64 {
        self.ascender as f64 / 1000.0 * font_size
    }
}

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_WIDTHS,
    default_width: 556,
    ascender: 905,
    descender: -212,
    line_gap: 33,
    extra: helvetica_extra,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_BOLD_WIDTHS,
    default_width: 556,
    ascender: 905,
    descender: -212,
    line_gap: 33,
    extra: helvetica_bold_extra,
};

pub static COURIER: StandardFontMetrics = StandardFontMetrics {
    widths: &COURIER_WIDTHS,
    default_width: 600,
    ascender: 833,
    descender: -300,
    line_gap: 0,
    extra: courier_extra,
};

#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

static COURIER_WIDTHS: [u16; 95] = [600; 95];

fn helvetica_extra(ch: char) -> Option<u16> {
    match ch {
        '\u{00A0}' => Some(278),
        '\u{2022}' => Some(350),
        '\u{2013}' => Some(556),
        '\u{2014}' | '\u{2026}' => Some(1000),
        '\u{2018}' | '\u{2019}' => Some(222),
        '\u{201C}' | '\u{201D}' => Some(333),
        _ => None,
    }
}

fn helvetica_bold_extra(ch: char) -> Option<u16> {
    match ch {
        '\u{00A0}' => Some(278),
        '\u{2022}' => Some(350),
        '\u{2013}' => Some(556),
        '\u{2014}' | '\u{2026}' => Some(1000),
        '\u{2018}' | '\u{2019}' => Some(278),
        '\u{201C}' | '\u{201D}' => Some(500),
        _ => None,
    }
}

fn courier_extra(_ch: char) -> Option<u16> {
    Some(600)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_space_width() {
        assert!((HELVETICA.char_width(' ', 12.0) - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_helvetica_table_alignment() {
        assert_eq!(HELVETICA.advance('A'), 667);
        assert_eq!(HELVETICA.advance('a'), 556);
        assert_eq!(HELVETICA.advance('i'), 222);
        assert_eq!(HELVETICA.advance('~'), 584);
        assert_eq!(HELVETICA_BOLD.advance('b'), 611);
        assert_eq!(HELVETICA_BOLD.advance('z'), 500);
    }

    #[test]
    fn test_line_height_is_arial_compatible() {
        assert!((HELVETICA.line_height(12.0) - 13.8).abs() < 1e-9);
    }

    #[test]
    fn test_courier_is_monospaced() {
        assert_eq!(COURIER.measure_string("iiii", 10.0), COURIER.measure_string("WWWW", 10.0));
        assert_eq!(COURIER.advance('\u{00E9}'), 600);
    }
}
