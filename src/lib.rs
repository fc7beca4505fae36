pub mod document;
pub mod error;
pub mod fonts;
pub mod test_utils;
pub mod text;
pub mod utils;

use serde::{Deserialize, Serialize};

pub use crate::error::{FormatError, LayoutError};
pub use crate::fonts::{Font, FontMetrics, FontOptions};
pub use crate::text::{
    Border, LayoutContext, LayoutRequest, LayoutResult, Mode, Rect, Style,
};

/// An RGB fill color with 0-255 channels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub fn is_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// The channels scaled to the 0-1 range used by the `rg` operator.
    pub fn fill_components(&self) -> [f64; 3] {
        [self.r, self.g, self.b].map(|c| c as f64 / 255.)
    }
}
