mod run;
mod stream;

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::{
    Rgb,
    error::LayoutError,
    fonts::{Font, KernOverride},
};

pub use run::compose_glyph_run;
pub use stream::{ascender_points, baseline_y, compose_stream, descender_points};

/// Where the request's `y` sits relative to the text. Deserializes from either the name or
/// the numeric code.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "ModeValue")]
pub enum Mode {
    /// `y` is the top of a cell; the baseline is moved down by the ascender.
    Cell,
    /// `y` is the baseline.
    #[default]
    FreeText,
}

impl TryFrom<u8> for Mode {
    type Error = LayoutError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Mode::Cell),
            1 => Ok(Mode::FreeText),
            _ => Err(LayoutError::UnknownMode(code)),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum ModeName {
    Cell,
    FreeText,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeValue {
    Code(u8),
    Name(ModeName),
}

impl TryFrom<ModeValue> for Mode {
    type Error = LayoutError;

    fn try_from(value: ModeValue) -> Result<Self, Self::Error> {
        match value {
            ModeValue::Code(code) => Mode::try_from(code),
            ModeValue::Name(ModeName::Cell) => Ok(Mode::Cell),
            ModeValue::Name(ModeName::FreeText) => Ok(Mode::FreeText),
        }
    }
}

/// A set of cell border sides.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Border(u8);

impl Border {
    pub const NONE: Border = Border(0);
    pub const BOTTOM: Border = Border(1);
    pub const RIGHT: Border = Border(2);
    pub const TOP: Border = Border(4);
    pub const LEFT: Border = Border(8);
    pub const ALL: Border = Border(15);

    /// Bits outside of [Border::ALL] are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Border(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Border) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 & Self::ALL.0 == 0
    }
}

impl BitOr for Border {
    type Output = Border;

    fn bitor(self, rhs: Border) -> Border {
        Border(self.0 | rhs.0)
    }
}

impl BitOrAssign for Border {
    fn bitor_assign(&mut self, rhs: Border) {
        self.0 |= rhs.0;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub underline: bool,
}

/// A fixed box for the text. Only its width is used: it replaces the measured run width.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub w: f64,
    pub h: f64,
}

/// One text placement. Coordinates are in points with `y` growing downwards from the top of
/// the page; the page height flips them into PDF space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub text: String,
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rectangle: Option<Rect>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub border: Border,
    #[serde(default)]
    pub color: Rgb,
    #[serde(default)]
    pub line_width: f64,
    #[serde(default)]
    pub page_height: f64,
}

impl LayoutRequest {
    pub fn new(text: impl Into<String>, font_size: f64, x: f64, y: f64, page_height: f64) -> Self {
        LayoutRequest {
            text: text.into(),
            font_size,
            x,
            y,
            rectangle: None,
            mode: Mode::FreeText,
            style: Style::default(),
            border: Border::NONE,
            color: Rgb::BLACK,
            line_width: 0.,
            page_height,
        }
    }

    /// Whether `other` can continue the same text object as this request: same color, size,
    /// style and line. Requests with a fixed rectangle never share state. The font slot is not
    /// part of the request and has to be compared by the caller.
    pub fn same_text_state(&self, other: &LayoutRequest) -> bool {
        if self.rectangle.is_some() {
            return false;
        }

        self.color == other.color
            && self.font_size == other.font_size
            && self.style == other.style
            && self.y == other.y
    }
}

/// The content-stream fragment for one request and the advance width of its run in points.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutResult {
    pub bytes: Vec<u8>,
    pub width: f64,
}

/// Scratch space for composing requests one after another.
///
/// The glyph buffer is cleared at the start of every [LayoutContext::compose] call. A context
/// must not be shared between threads that compose at the same time; give each its own.
#[derive(Debug, Default)]
pub struct LayoutContext {
    glyphs: String,
}

impl LayoutContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.glyphs.clear();
    }

    pub fn compose<F: Font, O: KernOverride + ?Sized>(
        &mut self,
        font: &F,
        kern_override: &O,
        request: &LayoutRequest,
    ) -> Result<LayoutResult, LayoutError> {
        self.reset();

        let width = compose_glyph_run(
            font,
            kern_override,
            &request.text,
            request.font_size,
            request.rectangle.as_ref(),
            &mut self.glyphs,
        )?;

        let bytes = compose_stream(font, request, &self.glyphs, width);

        log::trace!("composed {} bytes, width {width}", bytes.len());

        Ok(LayoutResult { bytes, width })
    }
}
