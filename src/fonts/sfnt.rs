//! Reads the horizontal metrics of a TrueType font straight from the sfnt tables.
//!
//! Only what text composition needs is extracted: the `head` scale and bounding box, glyph
//! advance widths from `hhea`/`maxp`/`hmtx`, and, when present, the typographic ascender and
//! descender from `OS/2` and the underline metrics from `post`.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Cursor, Read, Seek, SeekFrom},
    path::Path,
};

use serde::{Deserialize, Serialize};

use super::TypoMetrics;
use crate::error::{FormatError, FormatResult};

const TRUETYPE_VERSION: u32 = 0x0001_0000;
const HEAD_MAGIC_NUMBER: u32 = 0x5F0F_3CF5;

/// How the `head` bounding box fields are read.
///
/// The format declares them as signed 16-bit values. `Unsigned` reproduces the behavior of the
/// metrics files this reader has to stay compatible with, which turns negative extents into large
/// positive numbers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundingBoxMode {
    #[default]
    Unsigned,
    Signed,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    pub bbox_mode: BoundingBoxMode,
}

/// Font-unit glyph extents from the `head` table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    /// The extents as the signed values the `head` table stores, whichever mode they were read
    /// with.
    pub fn to_signed(self) -> BoundingBox {
        let signed = |value: i32| value as i16 as i32;

        BoundingBox {
            x_min: signed(self.x_min),
            y_min: signed(self.y_min),
            x_max: signed(self.x_max),
            y_max: signed(self.y_max),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub bbox: BoundingBox,
    pub number_of_h_metrics: u16,
    pub num_glyphs: u16,
    /// Indexed by glyph id, always `num_glyphs` long.
    pub advance_widths: Vec<u16>,
    pub ascender: f64,
    pub descender: f64,
    pub underline_position: f64,
    pub underline_thickness: f64,
}

impl FontMetrics {
    pub fn read<R: Read + Seek>(source: R, options: ReaderOptions) -> FormatResult<Self> {
        SfntReader::new(source, options)?.read_metrics()
    }

    pub fn from_bytes(data: &[u8], options: ReaderOptions) -> FormatResult<Self> {
        Self::read(Cursor::new(data), options)
    }

    pub fn open(path: impl AsRef<Path>, options: ReaderOptions) -> FormatResult<Self> {
        let file = File::open(path).map_err(FormatError::Io)?;

        Self::read(BufReader::new(file), options)
    }

    /// Advance width in font units.
    pub fn advance_width(&self, glyph: u16) -> Option<u16> {
        self.advance_widths.get(glyph as usize).copied()
    }

    /// Advance width in thousandths of an em.
    pub fn advance_width_pdf(&self, glyph: u16) -> Option<i32> {
        self.advance_width(glyph)
            .map(|width| crate::utils::to_pdf_units(width as i32, self.units_per_em))
    }
}

impl TypoMetrics for FontMetrics {
    fn typo_ascender(&self) -> f64 {
        self.ascender
    }

    fn typo_descender(&self) -> f64 {
        self.descender
    }
}

struct SfntReader<R> {
    source: R,
    options: ReaderOptions,
    tables: HashMap<String, u32>,
}

impl<R: Read + Seek> SfntReader<R> {
    fn new(mut source: R, options: ReaderOptions) -> FormatResult<Self> {
        let mut version = [0; 4];
        source.read_exact(&mut version)?;

        if u32::from_be_bytes(version) != TRUETYPE_VERSION {
            return Err(FormatError::UnrecognizedFormat);
        }

        let mut reader = SfntReader {
            source,
            options,
            tables: HashMap::new(),
        };

        let num_tables = reader.read_u16()?;
        reader.skip(3 * 2)?; // searchRange, entrySelector, rangeShift

        for _ in 0..num_tables {
            let mut tag = [0; 4];
            reader.source.read_exact(&mut tag)?;
            reader.skip(4)?; // checksum
            let offset = reader.read_u32()?;
            reader.skip(4)?; // length

            reader
                .tables
                .insert(String::from_utf8_lossy(&tag).into_owned(), offset);
        }

        log::trace!("table directory lists {} tables", reader.tables.len());

        Ok(reader)
    }

    fn read_metrics(mut self) -> FormatResult<FontMetrics> {
        let (units_per_em, bbox) = self.read_head()?;
        let number_of_h_metrics = self.read_hhea()?;
        let num_glyphs = self.read_maxp()?;
        let advance_widths = self.read_hmtx(number_of_h_metrics, num_glyphs)?;

        let (ascender, descender) = if self.tables.contains_key("OS/2") {
            self.read_os2()?
        } else {
            log::warn!("font has no OS/2 table, typographic ascender and descender are zero");
            (0, 0)
        };

        let (underline_position, underline_thickness) = if self.tables.contains_key("post") {
            self.read_post()?
        } else {
            log::warn!("font has no post table, underline metrics are zero");
            (0, 0)
        };

        log::debug!(
            "read font metrics: units_per_em={units_per_em} num_glyphs={num_glyphs} \
            number_of_h_metrics={number_of_h_metrics}"
        );

        Ok(FontMetrics {
            units_per_em,
            bbox,
            number_of_h_metrics,
            num_glyphs,
            advance_widths,
            ascender: ascender as f64,
            descender: descender as f64,
            underline_position: underline_position as f64,
            underline_thickness: underline_thickness as f64,
        })
    }

    fn read_head(&mut self) -> FormatResult<(u16, BoundingBox)> {
        self.seek("head")?;
        self.skip(3 * 4)?; // version, fontRevision, checkSumAdjustment

        if self.read_u32()? != HEAD_MAGIC_NUMBER {
            return Err(FormatError::BadMagicNumber);
        }

        self.skip(2)?; // flags
        let units_per_em = self.read_u16()?;

        if units_per_em == 0 {
            return Err(FormatError::ZeroUnitsPerEm);
        }

        self.skip(2 * 8)?; // created, modified

        let bbox = BoundingBox {
            x_min: self.read_extent()?,
            y_min: self.read_extent()?,
            x_max: self.read_extent()?,
            y_max: self.read_extent()?,
        };

        Ok((units_per_em, bbox))
    }

    fn read_hhea(&mut self) -> FormatResult<u16> {
        self.seek("hhea")?;
        // Ascent, descent and the rest are skipped, typographic values come from OS/2.
        self.skip(4 + 15 * 2)?;
        self.read_u16()
    }

    fn read_maxp(&mut self) -> FormatResult<u16> {
        self.seek("maxp")?;
        self.skip(4)?; // version
        self.read_u16()
    }

    fn read_hmtx(&mut self, number_of_h_metrics: u16, num_glyphs: u16) -> FormatResult<Vec<u16>> {
        self.seek("hmtx")?;

        let mut widths = Vec::with_capacity(num_glyphs.max(number_of_h_metrics) as usize);

        for _ in 0..number_of_h_metrics {
            widths.push(self.read_u16()?);
            self.skip(2)?; // leftSideBearing
        }

        if number_of_h_metrics < num_glyphs {
            // Glyphs past the last long metric share its advance width.
            let last = widths.last().copied().unwrap_or(0);
            log::debug!(
                "padding {} trailing advance widths with {last}",
                num_glyphs - number_of_h_metrics
            );
            widths.resize(num_glyphs as usize, last);
        } else {
            widths.truncate(num_glyphs as usize);
        }

        Ok(widths)
    }

    fn read_os2(&mut self) -> FormatResult<(i16, i16)> {
        self.seek("OS/2")?;
        self.skip(68)?;
        let ascender = self.read_i16()?;
        let descender = self.read_i16()?;

        Ok((ascender, descender))
    }

    fn read_post(&mut self) -> FormatResult<(i16, i16)> {
        self.seek("post")?;
        self.skip(4 + 4)?; // version, italicAngle
        let position = self.read_i16()?;
        let thickness = self.read_i16()?;

        Ok((position, thickness))
    }

    fn seek(&mut self, tag: &str) -> FormatResult<()> {
        let offset = *self
            .tables
            .get(tag)
            .ok_or_else(|| FormatError::MissingTable(tag.to_string()))?;

        log::trace!("seeking to table {tag} at {offset}");
        self.source.seek(SeekFrom::Start(offset as u64))?;

        Ok(())
    }

    fn skip(&mut self, length: i64) -> FormatResult<()> {
        self.source.seek(SeekFrom::Current(length))?;
        Ok(())
    }

    fn read_u16(&mut self) -> FormatResult<u16> {
        let mut buf = [0; 2];
        self.source.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_i16(&mut self) -> FormatResult<i16> {
        self.read_u16().map(|v| v as i16)
    }

    fn read_u32(&mut self) -> FormatResult<u32> {
        let mut buf = [0; 4];
        self.source.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_extent(&mut self) -> FormatResult<i32> {
        let raw = self.read_u16()?;

        Ok(match self.options.bbox_mode {
            BoundingBoxMode::Unsigned => raw as i32,
            BoundingBoxMode::Signed => raw as i16 as i32,
        })
    }
}
