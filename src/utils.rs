/// Converts a value in font design units to thousandths of an em, rounding to the nearest
/// integer (halfway cases away from zero).
pub fn to_pdf_units(value: i32, units_per_em: u16) -> i32 {
    (value as f64 * 1000. / units_per_em as f64).round() as i32
}

/// Converts a value in font design units to points at the given font size.
pub fn font_units_to_points(value: f64, units_per_em: u16, font_size: f64) -> f64 {
    let thousandths = value * 1000. / units_per_em as f64;
    thousandths * font_size / 1000.
}

const TEXT_HEIGHT_RATIO: f64 = 0.7;

/// The nominal line height used by the document layer for a given font size.
pub fn text_height(font_size: f64) -> f64 {
    font_size * TEXT_HEIGHT_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pdf_units() {
        assert_eq!(to_pdf_units(-50, 1000), -50);
        assert_eq!(to_pdf_units(1229, 2048), 600);
        assert_eq!(to_pdf_units(-1229, 2048), -600);
        // 1 / 2048 * 1000 = 0.488...
        assert_eq!(to_pdf_units(1, 2048), 0);
        // 3 / 2000 * 1000 = 1.5
        assert_eq!(to_pdf_units(3, 2000), 2);
        assert_eq!(to_pdf_units(-3, 2000), -2);
    }

    #[test]
    fn test_font_units_to_points() {
        assert_eq!(font_units_to_points(900., 1000, 10.), 9.);
        assert_eq!(font_units_to_points(-512., 2048, 16.), -4.);
    }
}
