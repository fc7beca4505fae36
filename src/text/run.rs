use crate::{
    error::LayoutError,
    fonts::{Font, KernOverride, Kerning},
    text::Rect,
    utils::to_pdf_units,
};

/// Writes the glyph codes of `text` into `out` as the body of a `TJ` hex string, with kerning
/// adjustments spliced in, and returns the run width in points.
///
/// A kerning adjustment closes the hex string, writes the negated value and reopens it, so
/// `out` is meant to be wrapped as `[<out>]`. With a `rectangle` the returned width is the
/// rectangle's width; the kerning still shows up in `out`.
pub fn compose_glyph_run<F: Font, O: KernOverride + ?Sized>(
    font: &F,
    kern_override: &O,
    text: &str,
    font_size: f64,
    rectangle: Option<&Rect>,
    out: &mut String,
) -> Result<f64, LayoutError> {
    let metrics = font.metrics();
    let use_kerning = font.options().use_kerning;

    let mut left: Option<(char, u16)> = None;
    // Thousandths of an em.
    let mut sum_width: i64 = 0;

    for c in text.chars() {
        let glyph = font.glyph_index(c).ok_or(LayoutError::UnmappedGlyph(c))?;

        let mut kerning = 0;
        if use_kerning && let Some((left_char, left_glyph)) = left {
            let value = kern(font, kern_override, left_char, c, left_glyph, glyph);
            kerning = to_pdf_units(value as i32, metrics.units_per_em);

            if kerning != 0 {
                out.push_str(&format!(">{}<", -kerning));
            }
        }

        out.push_str(&format!("{glyph:04X}"));

        let advance = metrics
            .advance_width_pdf(glyph)
            .ok_or(LayoutError::UnmappedGlyph(c))?;

        sum_width += advance as i64 + kerning as i64;
        left = Some((c, glyph));
    }

    Ok(match rectangle {
        Some(rectangle) => rectangle.w,
        None => sum_width as f64 * font_size / 1000.,
    })
}

fn kern<K: Kerning, O: KernOverride + ?Sized>(
    kerning: &K,
    kern_override: &O,
    left: char,
    right: char,
    left_index: u16,
    right_index: u16,
) -> i16 {
    let value = kerning.pair_value(left_index, right_index);

    kern_override.adjust(left, right, left_index, right_index, value)
}
