pub mod sfnt;
pub mod truetype;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use sfnt::{BoundingBox, BoundingBoxMode, FontMetrics, ReaderOptions};

/// Maps characters to glyph indices of the font (or of the font subset that will end up in the
/// document).
pub trait GlyphIndex {
    /// `None` if the character has no glyph.
    fn glyph_index(&self, c: char) -> Option<u16>;
}

/// The kerning pairs that share one left glyph.
pub trait KernPairs {
    /// Adjustment in font units for the given right glyph, if there is a pair.
    fn lookup(&self, right: u16) -> Option<i16>;
}

pub trait Kerning {
    type Pairs<'a>: KernPairs
    where
        Self: 'a;

    fn pairs_for_left(&self, left: u16) -> Option<Self::Pairs<'_>>;

    /// The pair adjustment in font units, zero if either lookup comes up empty.
    fn pair_value(&self, left: u16, right: u16) -> i16 {
        self.pairs_for_left(left)
            .and_then(|pairs| pairs.lookup(right))
            .unwrap_or(0)
    }
}

/// Lets the caller replace the table-derived kerning value for a pair.
pub trait KernOverride {
    fn adjust(
        &self,
        left: char,
        right: char,
        left_index: u16,
        right_index: u16,
        value: i16,
    ) -> i16;
}

impl<F: Fn(char, char, u16, u16, i16) -> i16> KernOverride for F {
    fn adjust(
        &self,
        left: char,
        right: char,
        left_index: u16,
        right_index: u16,
        value: i16,
    ) -> i16 {
        self(left, right, left_index, right_index, value)
    }
}

/// Keeps the table value.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoOverride;

impl KernOverride for NoOverride {
    fn adjust(&self, _: char, _: char, _: u16, _: u16, value: i16) -> i16 {
        value
    }
}

/// Typographic ascender and descender in font units (descender negative). These usually come
/// from the `OS/2` table, not from `hhea`.
pub trait TypoMetrics {
    fn typo_ascender(&self) -> f64;

    fn typo_descender(&self) -> f64;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontOptions {
    pub use_kerning: bool,
}

impl Default for FontOptions {
    fn default() -> Self {
        FontOptions { use_kerning: true }
    }
}

/// Everything the compositor needs from a font.
pub trait Font: GlyphIndex + Kerning + TypoMetrics {
    /// The slot the font was allocated in the document, written as `/F<index>`.
    fn index(&self) -> usize;

    fn metrics(&self) -> &FontMetrics;

    fn options(&self) -> FontOptions;
}

/// In-memory kerning pairs, keyed by left glyph and then right glyph.
#[derive(Clone, Debug, Default)]
pub struct KernTable {
    pairs: HashMap<u16, HashMap<u16, i16>>,
}

impl KernTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, left: u16, right: u16, value: i16) {
        self.pairs.entry(left).or_default().insert(right, value);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl KernPairs for &HashMap<u16, i16> {
    fn lookup(&self, right: u16) -> Option<i16> {
        self.get(&right).copied()
    }
}

impl Kerning for KernTable {
    type Pairs<'a> = &'a HashMap<u16, i16>;

    fn pairs_for_left(&self, left: u16) -> Option<Self::Pairs<'_>> {
        self.pairs.get(&left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kern_table() {
        let mut table = KernTable::new();
        table.insert(3, 4, -80);
        table.insert(3, 5, 20);

        assert_eq!(table.pair_value(3, 4), -80);
        assert_eq!(table.pair_value(3, 5), 20);
        assert_eq!(table.pair_value(3, 6), 0);
        assert_eq!(table.pair_value(4, 3), 0);
        assert!(table.pairs_for_left(4).is_none());
    }

    #[test]
    fn test_closure_override() {
        let double = |_: char, _: char, _: u16, _: u16, value: i16| value * 2;

        assert_eq!(double.adjust('A', 'V', 1, 2, -40), -80);
        assert_eq!(NoOverride.adjust('A', 'V', 1, 2, -40), -40);
    }
}
