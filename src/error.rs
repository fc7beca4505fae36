//! Errors produced while reading font files and composing text runs.

use thiserror::Error;

/// Errors raised while parsing an sfnt font file. All of them are fatal for the
/// font in question; no partially filled metrics are ever returned.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The leading version tag is not the TrueType `0x00010000` marker.
    #[error("unrecognized font format")]
    UnrecognizedFormat,

    /// The `head` table magic number is not `0x5F0F3CF5`.
    #[error("incorrect magic number in head table")]
    BadMagicNumber,

    /// `unitsPerEm` is zero, which would make every unit conversion divide by zero.
    #[error("units per em is zero")]
    ZeroUnitsPerEm,

    /// A table needed by the reader is not listed in the table directory.
    #[error("font does not contain a `{0}` table")]
    MissingTable(String),

    /// The source ended before all requested bytes could be read.
    #[error("font data is truncated")]
    Truncated,

    /// `ttf-parser` rejected the face.
    #[error("font face could not be parsed: {0}")]
    Face(#[source] ttf_parser::FaceParsingError),

    #[error("i/o error while reading font: {0}")]
    Io(#[source] std::io::Error),
}

impl From<std::io::Error> for FormatError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            FormatError::Truncated
        } else {
            FormatError::Io(err)
        }
    }
}

/// Errors raised while composing a text run into content-stream bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The run contains a character the font has no glyph for.
    #[error("no glyph for character {0:?}")]
    UnmappedGlyph(char),

    /// A numeric baseline mode code is neither cell nor free text.
    #[error("unknown baseline mode {0}")]
    UnknownMode(u8),
}

/// A fragment was appended to a page the document does not have.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("page {0} does not exist")]
pub struct UnknownPage(pub usize);

pub type FormatResult<T> = std::result::Result<T, FormatError>;
