use std::{
    error::Error,
    io::{BufReader, BufWriter, Write},
    path::PathBuf,
};

use pdf_textrun::{
    FontOptions, LayoutContext, LayoutRequest,
    document::PreviewDocument,
    fonts::{BoundingBoxMode, NoOverride, ReaderOptions, truetype::TruetypeFont},
};
use serde::Deserialize;

#[derive(Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum Output {
    #[default]
    Pdf,
    Stream,
}

fn default_page_size() -> (f32, f32) {
    (595., 842.)
}

fn default_use_kerning() -> bool {
    true
}

#[derive(Deserialize)]
struct Job {
    font: PathBuf,
    #[serde(default)]
    font_index: usize,
    #[serde(default = "default_page_size")]
    page_size: (f32, f32),
    #[serde(default = "default_use_kerning")]
    use_kerning: bool,
    #[serde(default)]
    bbox_mode: BoundingBoxMode,
    #[serde(default)]
    output: Output,
    placements: Vec<LayoutRequest>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let job = serde_json::from_reader::<_, Job>(BufReader::new(std::io::stdin()))?;

    let data = std::fs::read(&job.font)?;
    let reader_options = ReaderOptions {
        bbox_mode: job.bbox_mode,
    };
    let options = FontOptions {
        use_kerning: job.use_kerning,
    };

    let mut document = PreviewDocument::new();

    let mut font = TruetypeFont::new(job.font_index, &data, options, reader_options)?;
    if job.output == Output::Pdf {
        font.index = document.add_font(&data, font.metrics.clone());
    }
    log::info!(
        "loaded {} with {} glyphs",
        job.font.display(),
        font.metrics.num_glyphs
    );

    let page = document.add_page(job.page_size);
    let page_height = job.page_size.1 as f64;

    let mut ctx = LayoutContext::new();
    let mut streams = Vec::new();

    for placement in job.placements {
        let request = LayoutRequest {
            page_height,
            ..placement
        };

        let result = ctx.compose(&font, &NoOverride, &request)?;
        log::debug!("placed {:?} with width {}", request.text, result.width);

        match job.output {
            Output::Pdf => document.append(page, &result.bytes)?,
            Output::Stream => streams.extend_from_slice(&result.bytes),
        }
    }

    let bytes = match job.output {
        Output::Pdf => document.finish(),
        Output::Stream => streams,
    };

    let mut out = BufWriter::new(std::io::stdout());
    out.write_all(&bytes)?;
    out.flush()?;

    Ok(())
}
