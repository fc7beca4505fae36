use crate::{
    fonts::Font,
    text::{Border, LayoutRequest, Mode},
    utils::{font_units_to_points, text_height},
};

/// Typographic ascender in points at `font_size`.
pub fn ascender_points<F: Font>(font: &F, font_size: f64) -> f64 {
    font_units_to_points(font.typo_ascender(), font.metrics().units_per_em, font_size)
}

/// Typographic descender in points at `font_size`, negative for the usual fonts.
pub fn descender_points<F: Font>(font: &F, font_size: f64) -> f64 {
    font_units_to_points(font.typo_descender(), font.metrics().units_per_em, font_size)
}

/// The text baseline in PDF coordinates.
pub fn baseline_y<F: Font>(font: &F, request: &LayoutRequest) -> f64 {
    let top = request.page_height - request.y;

    match request.mode {
        Mode::FreeText => top,
        Mode::Cell => top - ascender_points(font, request.font_size),
    }
}

/// Assembles the text object for `request` around the glyph body produced by
/// [super::compose_glyph_run], followed by the underline and border paths.
///
/// All geometry is written with two decimals.
pub fn compose_stream<F: Font>(
    font: &F,
    request: &LayoutRequest,
    glyphs: &str,
    width: f64,
) -> Vec<u8> {
    let x = request.x;
    let y = baseline_y(font, request);

    let mut stream = String::new();

    stream.push_str("BT\n");
    stream.push_str(&format!("{x:.2} {y:.2} TD\n"));
    stream.push_str(&format!("/F{} {} Tf\n", font.index(), request.font_size));

    if !request.color.is_black() {
        let [r, g, b] = request.color.fill_components();
        stream.push_str(&format!("{r:.2} {g:.2} {b:.2} rg\n"));
    }

    stream.push_str(&format!("[<{glyphs}>] TJ\n"));
    stream.push_str("ET\n");

    if request.style.underline {
        stream.push_str(&underline(font, request, x, x + width));
    }

    draw_border(font, request, width, &mut stream);

    stream.into_bytes()
}

fn underline<F: Font>(font: &F, request: &LayoutRequest, start_x: f64, end_x: f64) -> String {
    let metrics = font.metrics();
    let units_per_em = metrics.units_per_em as f64;
    let size = request.font_size;

    let y = request.page_height
        - (request.y - (metrics.underline_position / units_per_em) * size)
        - text_height(size);
    let height = (metrics.underline_thickness / units_per_em) * size;

    format!(
        "{start_x:.2} {y:.2} {:.2} -{height:.2} re f\n",
        end_x - start_x
    )
}

fn draw_border<F: Font>(font: &F, request: &LayoutRequest, width: f64, stream: &mut String) {
    let border = request.border;
    if border.is_empty() {
        return;
    }

    let line_offset = request.line_width / 2.;
    let top = request.page_height - request.y;
    let bottom = top + descender_points(font, request.font_size)
        - ascender_points(font, request.font_size);

    let left = request.x;
    let right = request.x + width;

    let mut line = |start: (f64, f64), end: (f64, f64)| {
        stream.push_str(&format!(
            "{:.2} {:.2} m {:.2} {:.2} l s\n",
            start.0, start.1, end.0, end.1
        ));
    };

    if border.contains(Border::TOP) {
        line((left - line_offset, top), (right + line_offset, top));
    }

    if border.contains(Border::LEFT) {
        line((left, top), (left, bottom));
    }

    if border.contains(Border::RIGHT) {
        line((right, top), (right, bottom));
    }

    if border.contains(Border::BOTTOM) {
        line((left - line_offset, bottom), (right + line_offset, bottom));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Rgb,
        fonts::NoOverride,
        test_utils::FakeFont,
        text::{LayoutContext, Rect, Style},
    };

    fn font() -> FakeFont {
        FakeFont::new(1000, &[('H', 722), ('i', 278)])
            .typo(900., -200.)
            .underline(-100., 50.)
    }

    fn compose(font: &FakeFont, request: &LayoutRequest) -> String {
        let result = LayoutContext::new()
            .compose(font, &NoOverride, request)
            .unwrap();

        String::from_utf8(result.bytes).unwrap()
    }

    #[test]
    fn test_baseline_modes() {
        let font = font();

        let free = LayoutRequest::new("Hi", 10., 50., 100., 800.);
        assert_eq!(baseline_y(&font, &free), 700.);

        let cell = LayoutRequest {
            mode: Mode::Cell,
            ..free.clone()
        };
        assert_eq!(ascender_points(&font, 10.), 9.);
        assert_eq!(baseline_y(&font, &cell), 691.);

        assert!(compose(&font, &free).contains("50.00 700.00 TD\n"));
        assert!(compose(&font, &cell).contains("50.00 691.00 TD\n"));
    }

    #[test]
    fn test_free_text() {
        let stream = compose(&font(), &LayoutRequest::new("Hi", 10., 50., 100., 800.));

        insta::assert_snapshot!(stream, @r"
        BT
        50.00 700.00 TD
        /F0 10 Tf
        [<00010002>] TJ
        ET
        ");
    }

    #[test]
    fn test_color() {
        let font = font();
        let request = LayoutRequest::new("Hi", 10., 50., 100., 800.);

        assert!(!compose(&font, &request).contains(" rg\n"));

        let red = LayoutRequest {
            color: Rgb::new(255, 0, 0),
            ..request.clone()
        };
        assert!(compose(&font, &red).contains("\n1.00 0.00 0.00 rg\n"));

        let grey = LayoutRequest {
            color: Rgb::new(128, 128, 128),
            ..request
        };
        assert!(compose(&font, &grey).contains("\n0.50 0.50 0.50 rg\n"));
    }

    #[test]
    fn test_border_sides() {
        let font = font();
        let request = LayoutRequest {
            mode: Mode::Cell,
            line_width: 1.,
            ..LayoutRequest::new("Hi", 10., 50., 100., 800.)
        };

        let count = |stream: &str| stream.matches(" l s\n").count();

        assert_eq!(count(&compose(&font, &request)), 0);

        let top_bottom = LayoutRequest {
            border: Border::TOP | Border::BOTTOM,
            ..request.clone()
        };
        let stream = compose(&font, &top_bottom);
        assert_eq!(count(&stream), 2);
        // Width is (722 + 278) * 10 / 1000 = 10, the cell is 9 + 2 = 11 high.
        assert!(stream.contains("49.50 700.00 m 60.50 700.00 l s\n"));
        assert!(stream.contains("49.50 689.00 m 60.50 689.00 l s\n"));

        let left_right = LayoutRequest {
            border: Border::LEFT | Border::RIGHT,
            ..request.clone()
        };
        let stream = compose(&font, &left_right);
        assert_eq!(count(&stream), 2);
        assert!(stream.contains("50.00 700.00 m 50.00 689.00 l s\n"));
        assert!(stream.contains("60.00 700.00 m 60.00 689.00 l s\n"));

        let all = LayoutRequest {
            border: Border::ALL,
            ..request
        };
        assert_eq!(count(&compose(&font, &all)), 4);
    }

    #[test]
    fn test_underlined_cell() {
        let request = LayoutRequest {
            mode: Mode::Cell,
            style: Style { underline: true },
            border: Border::ALL,
            color: Rgb::new(0, 0, 255),
            line_width: 0.5,
            rectangle: Some(Rect { w: 40., h: 12. }),
            ..LayoutRequest::new("Hi", 10., 50., 100., 800.)
        };

        let stream = compose(&font(), &request);

        // Underline: 800 - (100 - (-100 / 1000) * 10) - 7 = 692, height 50 / 1000 * 10 = 0.5.
        insta::assert_snapshot!(stream, @r"
        BT
        50.00 691.00 TD
        /F0 10 Tf
        0.00 0.00 1.00 rg
        [<00010002>] TJ
        ET
        50.00 692.00 40.00 -0.50 re f
        49.75 700.00 m 90.25 700.00 l s
        50.00 700.00 m 50.00 689.00 l s
        90.00 700.00 m 90.00 689.00 l s
        49.75 689.00 m 90.25 689.00 l s
        ");
    }

    #[test]
    fn test_fractional_font_size() {
        let request = LayoutRequest::new("H", 10.5, 10., 20., 842.);

        let stream = compose(&font(), &request);

        assert!(stream.contains("10.00 822.00 TD\n/F0 10.5 Tf\n"));
    }
}
