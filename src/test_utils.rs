//! Helpers for building fonts in tests without binary fixtures.

use std::collections::HashMap;

use crate::fonts::{
    BoundingBox, Font, FontMetrics, FontOptions, GlyphIndex, KernTable, Kerning, TypoMetrics,
};

/// Synthesizes a minimal TrueType file: `head`, `hhea`, `maxp` and `hmtx`, plus `OS/2`, `post`,
/// `cmap` (format 4) and `kern` (format 0) when the corresponding data is set.
///
/// The result is readable both by [FontMetrics::read] and by `ttf-parser`.
#[derive(Clone, Debug)]
pub struct SfntBuilder {
    version: u32,
    magic: u32,
    units_per_em: u16,
    bbox: [i16; 4],
    widths: Vec<u16>,
    num_glyphs: u16,
    typo: Option<(i16, i16)>,
    underline: Option<(i16, i16)>,
    cmap: Vec<(char, u16)>,
    kerning: Vec<(u16, u16, i16)>,
    omitted: Vec<[u8; 4]>,
}

impl SfntBuilder {
    pub fn new(units_per_em: u16) -> Self {
        SfntBuilder {
            version: 0x0001_0000,
            magic: 0x5F0F_3CF5,
            units_per_em,
            bbox: [0, 0, 1000, 1000],
            widths: vec![500],
            num_glyphs: 1,
            typo: None,
            underline: None,
            cmap: Vec::new(),
            kerning: Vec::new(),
            omitted: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn bbox(mut self, x_min: i16, y_min: i16, x_max: i16, y_max: i16) -> Self {
        self.bbox = [x_min, y_min, x_max, y_max];
        self
    }

    /// `widths` become the long horizontal metrics, `num_glyphs` may be larger.
    pub fn widths(mut self, widths: &[u16], num_glyphs: u16) -> Self {
        self.widths = widths.to_vec();
        self.num_glyphs = num_glyphs;
        self
    }

    pub fn typo(mut self, ascender: i16, descender: i16) -> Self {
        self.typo = Some((ascender, descender));
        self
    }

    pub fn underline(mut self, position: i16, thickness: i16) -> Self {
        self.underline = Some((position, thickness));
        self
    }

    pub fn map(mut self, c: char, glyph: u16) -> Self {
        self.cmap.push((c, glyph));
        self
    }

    pub fn kern(mut self, left: u16, right: u16, value: i16) -> Self {
        self.kerning.push((left, right, value));
        self
    }

    pub fn without(mut self, tag: [u8; 4]) -> Self {
        self.omitted.push(tag);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut tables = vec![
            (*b"head", self.head()),
            (*b"hhea", self.hhea()),
            (*b"maxp", self.maxp()),
            (*b"hmtx", self.hmtx()),
        ];

        if let Some((ascender, descender)) = self.typo {
            tables.push((*b"OS/2", os2(ascender, descender)));
        }

        if let Some((position, thickness)) = self.underline {
            tables.push((*b"post", post(position, thickness)));
        }

        if !self.cmap.is_empty() {
            tables.push((*b"cmap", self.cmap()));
        }

        if !self.kerning.is_empty() {
            tables.push((*b"kern", self.kern_table()));
        }

        tables.retain(|(tag, _)| !self.omitted.contains(tag));
        // Lookups in ttf-parser binary search the directory.
        tables.sort_by(|a, b| a.0.cmp(&b.0));

        let num_tables = tables.len() as u16;
        let entry_selector = 15 - num_tables.max(1).leading_zeros() as u16;
        let search_range = (1 << entry_selector) * 16;

        let mut out = Writer::default();
        out.u32(self.version)
            .u16(num_tables)
            .u16(search_range)
            .u16(entry_selector)
            .u16((num_tables * 16).saturating_sub(search_range));

        let mut offset = 12 + 16 * tables.len();
        for (tag, data) in &tables {
            out.bytes(tag)
                .u32(0)
                .u32(offset as u32)
                .u32(data.len() as u32);
            offset += data.len().next_multiple_of(4);
        }

        for (_, data) in &tables {
            out.bytes(data).pad();
        }

        out.0
    }

    fn head(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.u32(0x0001_0000)
            .u32(0x0001_0000)
            .u32(0)
            .u32(self.magic)
            .u16(0)
            .u16(self.units_per_em)
            .bytes(&[0; 16]);

        for extent in self.bbox {
            w.i16(extent);
        }

        w.u16(0).u16(8).i16(2).i16(0).i16(0);
        w.0
    }

    fn hhea(&self) -> Vec<u8> {
        let (ascender, descender) = self.typo.unwrap_or((800, -200));

        let mut w = Writer::default();
        w.u32(0x0001_0000)
            .i16(ascender)
            .i16(descender)
            .i16(0)
            .u16(self.widths.iter().copied().max().unwrap_or(0))
            .i16(0)
            .i16(0)
            .i16(0)
            .i16(1)
            .i16(0)
            .i16(0)
            .bytes(&[0; 8])
            .i16(0)
            .u16(self.widths.len() as u16);
        w.0
    }

    fn maxp(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.u32(0x0000_5000).u16(self.num_glyphs);
        w.0
    }

    fn hmtx(&self) -> Vec<u8> {
        let mut w = Writer::default();

        for &width in &self.widths {
            w.u16(width).i16(0);
        }

        for _ in self.widths.len()..self.num_glyphs as usize {
            w.i16(0);
        }

        w.0
    }

    fn cmap(&self) -> Vec<u8> {
        let mut mapped: Vec<(u16, u16)> = self
            .cmap
            .iter()
            .filter_map(|&(c, glyph)| u16::try_from(c as u32).ok().map(|code| (code, glyph)))
            .collect();
        mapped.sort();
        // Terminating segment.
        mapped.push((0xFFFF, 0));

        let seg_count = mapped.len() as u16;
        let entry_selector = 15 - seg_count.leading_zeros() as u16;
        let search_range = 2 * (1 << entry_selector);

        let mut w = Writer::default();
        w.u16(0).u16(1).u16(3).u16(1).u32(12);

        w.u16(4)
            .u16(16 + 8 * seg_count)
            .u16(0)
            .u16(seg_count * 2)
            .u16(search_range)
            .u16(entry_selector)
            .u16(seg_count * 2 - search_range);

        for &(code, _) in &mapped {
            w.u16(code);
        }
        w.u16(0);
        for &(code, _) in &mapped {
            w.u16(code);
        }
        for &(code, glyph) in &mapped {
            let delta = if code == 0xFFFF {
                1
            } else {
                glyph.wrapping_sub(code)
            };
            w.u16(delta);
        }
        for _ in &mapped {
            w.u16(0);
        }

        w.0
    }

    fn kern_table(&self) -> Vec<u8> {
        let mut pairs = self.kerning.clone();
        pairs.sort_by_key(|&(left, right, _)| (left, right));

        let count = pairs.len() as u16;
        let entry_selector = 15 - count.leading_zeros() as u16;
        let search_range = (1 << entry_selector) * 6;

        let mut w = Writer::default();
        w.u16(0).u16(1);
        // Subtable header: version, length, format 0, horizontal coverage.
        w.u16(0).u16(6 + 8 + 6 * count).bytes(&[0, 1]);
        w.u16(count)
            .u16(search_range)
            .u16(entry_selector)
            .u16(count * 6 - search_range);

        for (left, right, value) in pairs {
            w.u16(left).u16(right).i16(value);
        }

        w.0
    }
}

fn os2(ascender: i16, descender: i16) -> Vec<u8> {
    let mut data = vec![0; 78];
    let mut put = |offset: usize, value: u16| {
        data[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    };

    put(2, 500); // xAvgCharWidth
    put(4, 400); // usWeightClass
    put(6, 5); // usWidthClass
    put(68, ascender as u16);
    put(70, descender as u16);
    put(74, ascender as u16);
    put(76, descender.unsigned_abs());

    data
}

fn post(position: i16, thickness: i16) -> Vec<u8> {
    let mut w = Writer::default();
    w.u32(0x0003_0000)
        .u32(0)
        .i16(position)
        .i16(thickness)
        .bytes(&[0; 20]);
    w.0
}

#[derive(Default)]
struct Writer(Vec<u8>);

impl Writer {
    fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.extend_from_slice(bytes);
        self
    }

    fn u16(&mut self, value: u16) -> &mut Self {
        self.bytes(&value.to_be_bytes())
    }

    fn i16(&mut self, value: i16) -> &mut Self {
        self.bytes(&value.to_be_bytes())
    }

    fn u32(&mut self, value: u32) -> &mut Self {
        self.bytes(&value.to_be_bytes())
    }

    fn pad(&mut self) -> &mut Self {
        let len = self.0.len().next_multiple_of(4);
        self.0.resize(len, 0);
        self
    }
}

/// A font double with explicit glyph assignments. Glyph 0 is reserved for `.notdef`, the given
/// characters get glyph ids from 1 upwards in order.
#[derive(Clone, Debug)]
pub struct FakeFont {
    pub index: usize,
    pub metrics: FontMetrics,
    pub glyphs: HashMap<char, u16>,
    pub kerning: KernTable,
    pub options: FontOptions,
}

impl FakeFont {
    /// `chars` pairs each character with its advance width in font units.
    pub fn new(units_per_em: u16, chars: &[(char, u16)]) -> Self {
        let advance_widths: Vec<u16> = std::iter::once(0)
            .chain(chars.iter().map(|&(_, width)| width))
            .collect();

        let glyphs = chars
            .iter()
            .enumerate()
            .map(|(i, &(c, _))| (c, i as u16 + 1))
            .collect();

        FakeFont {
            index: 0,
            metrics: FontMetrics {
                units_per_em,
                bbox: BoundingBox::default(),
                number_of_h_metrics: advance_widths.len() as u16,
                num_glyphs: advance_widths.len() as u16,
                advance_widths,
                ascender: 0.,
                descender: 0.,
                underline_position: 0.,
                underline_thickness: 0.,
            },
            glyphs,
            kerning: KernTable::new(),
            options: FontOptions::default(),
        }
    }

    pub fn kern(mut self, left: char, right: char, value: i16) -> Self {
        let left = self.glyphs[&left];
        let right = self.glyphs[&right];
        self.kerning.insert(left, right, value);
        self
    }

    pub fn typo(mut self, ascender: f64, descender: f64) -> Self {
        self.metrics.ascender = ascender;
        self.metrics.descender = descender;
        self
    }

    pub fn underline(mut self, position: f64, thickness: f64) -> Self {
        self.metrics.underline_position = position;
        self.metrics.underline_thickness = thickness;
        self
    }
}

impl GlyphIndex for FakeFont {
    fn glyph_index(&self, c: char) -> Option<u16> {
        self.glyphs.get(&c).copied()
    }
}

impl Kerning for FakeFont {
    type Pairs<'a> = &'a HashMap<u16, i16>;

    fn pairs_for_left(&self, left: u16) -> Option<Self::Pairs<'_>> {
        self.kerning.pairs_for_left(left)
    }
}

impl TypoMetrics for FakeFont {
    fn typo_ascender(&self) -> f64 {
        self.metrics.ascender
    }

    fn typo_descender(&self) -> f64 {
        self.metrics.descender
    }
}

impl Font for FakeFont {
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
