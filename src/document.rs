//! A minimal document around composed text fragments, mostly for looking at the output.
//!
//! Every page gets one content stream made of the fragments appended to it. Fonts are embedded
//! whole as `CIDFontType2` descendants of `Identity-H` Type0 fonts, so the glyph ids written by
//! the compositor are used as CIDs directly.

use pdf_writer::{
    Filter, Name, Rect, Ref, Str,
    types::{CidFontType, FontFlags, SystemInfo},
};

use crate::{error::UnknownPage, fonts::FontMetrics};

struct EmbeddedFont<'a> {
    data: &'a [u8],
    metrics: FontMetrics,
}

struct PreviewPage {
    size: (f32, f32),
    content: Vec<u8>,
}

#[derive(Default)]
pub struct PreviewDocument<'a> {
    fonts: Vec<EmbeddedFont<'a>>,
    pages: Vec<PreviewPage>,
}

impl<'a> PreviewDocument<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a font and returns its slot, which is the index the font has to be composed
    /// with.
    pub fn add_font(&mut self, data: &'a [u8], metrics: FontMetrics) -> usize {
        self.fonts.push(EmbeddedFont { data, metrics });
        self.fonts.len() - 1
    }

    /// Adds a page of the given size in points and returns its index.
    pub fn add_page(&mut self, size: (f32, f32)) -> usize {
        self.pages.push(PreviewPage {
            size,
            content: Vec::new(),
        });
        self.pages.len() - 1
    }

    /// Appends a composed fragment to the content stream of `page`.
    pub fn append(&mut self, page: usize, fragment: &[u8]) -> Result<(), UnknownPage> {
        let page = self.pages.get_mut(page).ok_or(UnknownPage(page))?;
        page.content.extend_from_slice(fragment);
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn finish(self) -> Vec<u8> {
        let mut alloc = Ref::new(1);
        let mut pdf = pdf_writer::Pdf::new();

        let catalog_ref = alloc.bump();
        let page_tree_ref = alloc.bump();

        pdf.catalog(catalog_ref).pages(page_tree_ref);

        let font_refs: Vec<Ref> = self
            .fonts
            .iter()
            .enumerate()
            .map(|(i, font)| font.write(&mut pdf, &mut alloc, i))
            .collect();

        let page_refs: Vec<Ref> = self.pages.iter().map(|_| alloc.bump()).collect();

        pdf.pages(page_tree_ref)
            .kids(page_refs.iter().copied())
            .count(self.pages.len() as i32);

        for (page, page_ref) in self.pages.iter().zip(page_refs) {
            let content_ref = alloc.bump();

            let mut page_writer = pdf.page(page_ref);
            page_writer
                .parent(page_tree_ref)
                .media_box(Rect::new(0., 0., page.size.0, page.size.1))
                .contents(content_ref);

            let mut resources = page_writer.resources();
            let mut fonts = resources.fonts();

            for (i, &font) in font_refs.iter().enumerate() {
                fonts.pair(Name(format!("F{}", i).as_bytes()), font);
            }

            drop(fonts);
            drop(resources);
            drop(page_writer);

            pdf.stream(content_ref, &deflate(&page.content))
                .filter(Filter::FlateDecode);
        }

        log::debug!(
            "finished document with {} pages and {} fonts",
            self.pages.len(),
            self.fonts.len()
        );

        pdf.finish()
    }
}

impl<'a> EmbeddedFont<'a> {
    fn write(&self, pdf: &mut pdf_writer::Pdf, alloc: &mut Ref, index: usize) -> Ref {
        let type0_ref = alloc.bump();
        let cid_ref = alloc.bump();
        let descriptor_ref = alloc.bump();
        let data_ref = alloc.bump();

        let base_font = format!("TextRun{index}");
        let base_font = Name(base_font.as_bytes());

        pdf.type0_font(type0_ref)
            .base_font(base_font)
            .encoding_predefined(Name(b"Identity-H"))
            .descendant_font(cid_ref);

        let mut cid = pdf.cid_font(cid_ref);
        cid.subtype(CidFontType::Type2);
        cid.base_font(base_font);
        cid.system_info(SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        });
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);

        let metrics = &self.metrics;
        let scale = |value: f64| (value * 1000. / metrics.units_per_em as f64) as f32;

        let widths: Vec<f32> = metrics
            .advance_widths
            .iter()
            .map(|&width| scale(width as f64))
            .collect();

        // Runs of equal widths are written as ranges, zero widths are left to the default.
        let mut first = 0;
        let mut width_writer = cid.widths();
        for group in widths.chunk_by(|&a, &b| a == b) {
            let w = group[0];
            let end = first + group.len();
            if w != 0.0 {
                width_writer.same(first as u16, (end - 1) as u16, w);
            }
            first = end;
        }

        drop(width_writer);
        drop(cid);

        let compressed = deflate(self.data);
        let mut stream = pdf.stream(data_ref, &compressed);
        stream.filter(Filter::FlateDecode);
        stream.pair(Name(b"Length1"), self.data.len() as i32);
        drop(stream);

        let mut inked = widths.iter().filter(|&&w| w != 0.0);
        let fixed_pitch = inked
            .next()
            .is_some_and(|&first| inked.all(|&w| w == first));

        let mut flags = FontFlags::SYMBOLIC;
        flags.set(FontFlags::FIXED_PITCH, fixed_pitch);

        // Unsigned reads only matter for the metrics table, the descriptor needs real extents.
        let bbox = metrics.bbox.to_signed();
        let ascent = scale(metrics.ascender);

        pdf.font_descriptor(descriptor_ref)
            .name(base_font)
            .flags(flags)
            .bbox(Rect::new(
                scale(bbox.x_min as f64),
                scale(bbox.y_min as f64),
                scale(bbox.x_max as f64),
                scale(bbox.y_max as f64),
            ))
            .italic_angle(0.)
            .ascent(ascent)
            .descent(scale(metrics.descender))
            .cap_height(ascent)
            .stem_v(80.)
            .font_file2(data_ref);

        type0_ref
    }
}

fn deflate(data: &[u8]) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, 9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        FontOptions, LayoutContext, LayoutRequest,
        fonts::{BoundingBoxMode, NoOverride, ReaderOptions, truetype::TruetypeFont},
        test_utils::SfntBuilder,
    };

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_document() {
        let data = SfntBuilder::new(1000)
            .widths(&[0, 600, 600], 3)
            .typo(800, -200)
            .underline(-100, 50)
            .map('O', 1)
            .map('K', 2)
            .build();

        let mut document = PreviewDocument::new();
        document.add_font(&data, FontMetrics::from_bytes(&data, ReaderOptions::default()).unwrap());

        // The metrics read for composing are the ones embedded.
        let mut font =
            TruetypeFont::new(7, &data, FontOptions::default(), ReaderOptions::default()).unwrap();
        font.index = document.add_font(&data, font.metrics.clone());
        assert_eq!(font.index, 1);

        let page = document.add_page((595., 842.));
        let result = LayoutContext::new()
            .compose(
                &font,
                &NoOverride,
                &LayoutRequest::new("OK", 12., 72., 72., 842.),
            )
            .unwrap();
        document.append(page, &result.bytes).unwrap();

        assert_eq!(document.page_count(), 1);

        let bytes = document.finish();

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"/Identity-H"));
        assert!(contains(&bytes, b"/CIDFontType2"));
        assert!(contains(&bytes, b"/F0"));
        assert!(contains(&bytes, b"/F1"));
        assert!(contains(&bytes, b"/TextRun1"));
        assert!(contains(&bytes, b"/FontFile2"));
        // The font data is compressed, the raw tables are not in the output.
        assert!(!contains(&bytes, b"hmtx"));
    }

    #[test]
    fn test_font_bbox_is_signed() {
        let data = SfntBuilder::new(1000)
            .bbox(-50, -200, 1000, 900)
            .widths(&[0, 600], 2)
            .map('O', 1)
            .build();

        for bbox_mode in [BoundingBoxMode::Unsigned, BoundingBoxMode::Signed] {
            let metrics = FontMetrics::from_bytes(&data, ReaderOptions { bbox_mode }).unwrap();

            let mut document = PreviewDocument::new();
            document.add_font(&data, metrics);
            document.add_page((595., 842.));

            let bytes = document.finish();

            assert!(contains(&bytes, b"/FontBBox [-50 -200 1000 900]"));
        }
    }

    #[test]
    fn test_append_to_unknown_page() {
        let mut document = PreviewDocument::new();
        let page = document.add_page((595., 842.));

        assert_eq!(document.append(page, b"BT\nET\n"), Ok(()));
        assert_eq!(document.append(page + 1, b"BT\nET\n"), Err(UnknownPage(1)));
        assert_eq!(document.page_count(), 1);
    }
}
