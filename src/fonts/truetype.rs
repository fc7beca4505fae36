use ttf_parser::{Face, GlyphId};

use super::{
    Font, FontMetrics, FontOptions, GlyphIndex, KernPairs, Kerning, ReaderOptions, TypoMetrics,
};
use crate::error::{FormatError, FormatResult};

/// A TrueType font loaded from memory. Widths and scale come from [FontMetrics]; the character
/// map, kerning pairs and typographic metrics are looked up through `ttf-parser`.
pub struct TruetypeFont<'a> {
    pub index: usize,
    pub data: &'a [u8],
    pub face: Face<'a>,
    pub metrics: FontMetrics,
    pub options: FontOptions,
}

impl<'a> TruetypeFont<'a> {
    /// `index` is the slot the font occupies in the document's font resources.
    pub fn new(
        index: usize,
        data: &'a [u8],
        options: FontOptions,
        reader_options: ReaderOptions,
    ) -> FormatResult<Self> {
        let metrics = FontMetrics::from_bytes(data, reader_options)?;
        let face = Face::parse(data, 0).map_err(FormatError::Face)?;

        Ok(TruetypeFont {
            index,
            data,
            face,
            metrics,
            options,
        })
    }
}

impl<'a> GlyphIndex for TruetypeFont<'a> {
    fn glyph_index(&self, c: char) -> Option<u16> {
        self.face
            .glyph_index(c)
            .map(|glyph| glyph.0)
            .filter(|&glyph| glyph != 0)
    }
}

/// The pairs of one left glyph, resolved lazily against the horizontal `kern` subtables.
#[derive(Clone, Copy)]
pub struct FacePairs<'f, 'a> {
    face: &'f Face<'a>,
    left: GlyphId,
}

impl<'f, 'a> KernPairs for FacePairs<'f, 'a> {
    fn lookup(&self, right: u16) -> Option<i16> {
        let kern = self.face.tables().kern?;

        kern.subtables
            .into_iter()
            .filter(|subtable| subtable.horizontal)
            .find_map(|subtable| subtable.glyphs_kerning(self.left, GlyphId(right)))
    }
}

impl<'a> Kerning for TruetypeFont<'a> {
    type Pairs<'f>
        = FacePairs<'f, 'a>
    where
        Self: 'f;

    fn pairs_for_left(&self, left: u16) -> Option<Self::Pairs<'_>> {
        self.face.tables().kern.map(|_| FacePairs {
            face: &self.face,
            left: GlyphId(left),
        })
    }
}

impl<'a> TypoMetrics for TruetypeFont<'a> {
    fn typo_ascender(&self) -> f64 {
        self.face
            .typographic_ascender()
            .unwrap_or(self.face.ascender()) as f64
    }

    fn typo_descender(&self) -> f64 {
        self.face
            .typographic_descender()
            .unwrap_or(self.face.descender()) as f64
    }
}

impl<'a> Font for TruetypeFont<'a> {
    fn index(&self) -> usize {
        self.index
    }

    fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    fn options(&self) -> FontOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::SfntBuilder;

    fn sample() -> Vec<u8> {
        SfntBuilder::new(1000)
            .widths(&[0, 667, 667, 556], 4)
            .typo(900, -250)
            .underline(-100, 50)
            .map('A', 1)
            .map('V', 2)
            .map('a', 3)
            .kern(1, 2, -80)
            .kern(2, 1, -70)
            .build()
    }

    #[test]
    fn test_glyph_index() {
        let data = sample();
        let font = TruetypeFont::new(0, &data, FontOptions::default(), ReaderOptions::default())
            .unwrap();

        assert_eq!(font.glyph_index('A'), Some(1));
        assert_eq!(font.glyph_index('V'), Some(2));
        assert_eq!(font.glyph_index('a'), Some(3));
        assert_eq!(font.glyph_index('z'), None);
        assert_eq!(font.metrics().advance_widths, vec![0, 667, 667, 556]);
    }

    #[test]
    fn test_kerning() {
        let data = sample();
        let font = TruetypeFont::new(0, &data, FontOptions::default(), ReaderOptions::default())
            .unwrap();

        assert_eq!(font.pair_value(1, 2), -80);
        assert_eq!(font.pair_value(2, 1), -70);
        assert_eq!(font.pair_value(1, 3), 0);
        assert_eq!(font.pair_value(3, 1), 0);
    }

    #[test]
    fn test_no_kern_table() {
        let data = SfntBuilder::new(1000)
            .widths(&[0, 500], 2)
            .map('A', 1)
            .build();
        let font = TruetypeFont::new(0, &data, FontOptions::default(), ReaderOptions::default())
            .unwrap();

        assert!(font.pairs_for_left(1).is_none());
        assert_eq!(font.pair_value(1, 1), 0);
    }

    #[test]
    fn test_typo_metrics() {
        let data = sample();
        let font = TruetypeFont::new(0, &data, FontOptions::default(), ReaderOptions::default())
            .unwrap();

        assert_eq!(font.typo_ascender(), 900.);
        assert_eq!(font.typo_descender(), -250.);
        assert_eq!(font.metrics().underline_position, -100.);
    }

    #[test]
    fn test_typo_metrics_fall_back_to_hhea() {
        let data = SfntBuilder::new(1000)
            .widths(&[0, 500], 2)
            .map('A', 1)
            .build();
        let font = TruetypeFont::new(0, &data, FontOptions::default(), ReaderOptions::default())
            .unwrap();

        assert_eq!(font.typo_ascender(), 800.);
        assert_eq!(font.typo_descender(), -200.);
    }

    #[test]
    fn test_format_errors_come_first() {
        let data = SfntBuilder::new(1000).magic(0).build();

        assert!(matches!(
            TruetypeFont::new(0, &data, FontOptions::default(), ReaderOptions::default()),
            Err(FormatError::BadMagicNumber)
        ));
    }
}
