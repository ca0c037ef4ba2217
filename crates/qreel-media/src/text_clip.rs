//! Text clip rendering.
//!
//! A text clip is a short generated video: a diagonal gradient
//! background with either a centered text block or a receipt card drawn
//! over it. Everything is expressed as an FFmpeg filter graph over two
//! lavfi color sources.

use std::path::{Path, PathBuf};

use tracing::info;

use qreel_models::TextContent;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::layout::{ReceiptLayout, CANVAS_HEIGHT, CANVAS_WIDTH, CLIP_SECONDS};

/// Gradient endpoint colors.
const GRADIENT_FROM: &str = "#FFA500";
const GRADIENT_TO: &str = "#00FFFF";

/// Receipt card geometry (wide box so long values do not overflow).
const CARD_X: u32 = 50;
const CARD_Y: u32 = 30;
const CARD_WIDTH: u32 = 1180;
const CARD_HEIGHT: u32 = 690;

/// X positions for receipt rows: labels left-aligned with the card,
/// values right-aligned against its far edge.
const LABEL_X: u32 = 100;
const VALUE_RIGHT_X: u32 = 1180;

const HEADER_Y: u32 = 100;
const HEADER_FONT_SIZE: u32 = 36;
const TOTAL_FONT_SIZE: u32 = 50;
const TOTAL_LABEL: &str = "Total Premium";

/// Layout options for a text clip.
#[derive(Debug, Clone)]
pub struct TextClipOptions {
    pub font_size: u32,
    pub font_color: String,
    pub font_file: String,
}

impl TextClipOptions {
    pub fn new(font_file: impl Into<String>) -> Self {
        Self {
            font_size: 64,
            font_color: "black".to_string(),
            font_file: font_file.into(),
        }
    }

    pub fn with_font_size(mut self, size: u32) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_font_color(mut self, color: impl Into<String>) -> Self {
        self.font_color = color.into();
        self
    }
}

/// Make a string safe inside a drawtext expression: colons separate
/// filter options and single quotes end the quoted text.
pub fn sanitize_drawtext(text: &str) -> String {
    text.replace('\\', "").replace(':', "\\:").replace('\'', "")
}

/// Build the full filter graph for a text clip, ending in `[outv]`.
pub fn build_text_filter(content: &TextContent, opts: &TextClipOptions) -> String {
    let mut chain = Vec::new();

    // Diagonal gradient: blend the two color sources along (X+Y)/(W+H).
    chain.push(
        "[0:v][1:v]blend=all_expr='A*(1-(X+Y)/(W+H))+B*((X+Y)/(W+H))':shortest=1[bg]".to_string(),
    );

    match content {
        TextContent::Plain { text } => {
            let text = sanitize_drawtext(text);
            chain.push(format!(
                "[bg]drawtext=fontfile='{font}':text='{text}':fontsize={size}:fontcolor={color}:\
                 x=(w-text_w)/2:y=(h-text_h)/2:box=1:boxcolor=white@0.85:boxborderw=60[outv]",
                font = opts.font_file,
                size = opts.font_size,
                color = opts.font_color,
            ));
        }
        TextContent::Receipt {
            header,
            lines,
            total,
        } => {
            chain.push(format!(
                "[bg]drawbox=x={CARD_X}:y={CARD_Y}:w={CARD_WIDTH}:h={CARD_HEIGHT}:color=white@0.85:t=fill[v1]"
            ));

            let mut label = "[v1]".to_string();
            let mut idx = 2usize;
            let mut draw = |chain: &mut Vec<String>, text: &str, x: &str, y: u32, size: u32| {
                let text = sanitize_drawtext(text);
                chain.push(format!(
                    "{label}drawtext=fontfile='{font}':text='{text}':fontsize={size}:fontcolor={color}:x={x}:y={y}[v{idx}]",
                    font = opts.font_file,
                    color = opts.font_color,
                ));
                label = format!("[v{idx}]");
                idx += 1;
            };

            draw(&mut chain, header, "(w-text_w)/2", HEADER_Y, HEADER_FONT_SIZE);

            let layout = ReceiptLayout::for_items(lines.len());
            for (i, line) in lines.iter().enumerate() {
                let y = layout.row_y(i);
                draw(&mut chain, &line.label, &LABEL_X.to_string(), y, layout.font_size);
                draw(
                    &mut chain,
                    &line.value,
                    &format!("{VALUE_RIGHT_X}-text_w"),
                    y,
                    layout.font_size,
                );
            }

            let total_y = layout.total_y(lines.len());
            draw(&mut chain, TOTAL_LABEL, &LABEL_X.to_string(), total_y, TOTAL_FONT_SIZE);
            draw(
                &mut chain,
                total,
                &format!("{VALUE_RIGHT_X}-text_w"),
                total_y,
                TOTAL_FONT_SIZE,
            );

            // Rename the last intermediate label to the output label.
            let from = format!("[v{}]", idx - 1);
            if let Some(last) = chain.last_mut() {
                *last = last.replace(&from, "[outv]");
            }
        }
    }

    chain.join(";")
}

/// Render a text clip to `output`.
pub async fn generate_text_clip(
    runner: &FfmpegRunner,
    content: &TextContent,
    output: impl AsRef<Path>,
    opts: &TextClipOptions,
) -> MediaResult<PathBuf> {
    let output = output.as_ref().to_path_buf();
    let color_source = |color: &str| {
        format!("color=c={color}:s={CANVAS_WIDTH}x{CANVAS_HEIGHT}:d={CLIP_SECONDS}")
    };

    let cmd = FfmpegCommand::new(&output)
        .lavfi(color_source(GRADIENT_FROM))
        .lavfi(color_source(GRADIENT_TO))
        .filter_complex(build_text_filter(content, opts))
        .map("[outv]")
        .pix_fmt("yuv420p");

    runner.run(&cmd).await?;
    info!("Generated text clip at {}", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qreel_models::ReceiptLine;

    fn opts() -> TextClipOptions {
        TextClipOptions::new("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf")
    }

    #[test]
    fn sanitize_escapes_colons_and_drops_quotes() {
        assert_eq!(sanitize_drawtext("10:30 o'clock"), "10\\:30 oclock");
    }

    #[test]
    fn plain_filter_centers_text_in_a_box() {
        let filter = build_text_filter(&TextContent::plain("Jane"), &opts());
        assert!(filter.contains("blend=all_expr"));
        assert!(filter.contains("text='Jane'"));
        assert!(filter.contains("x=(w-text_w)/2"));
        assert!(filter.contains("box=1:boxcolor=white@0.85"));
        assert!(filter.ends_with("[outv]"));
    }

    #[test]
    fn receipt_filter_draws_card_rows_and_total() {
        let content = TextContent::receipt(
            "Your Quote",
            vec![
                ReceiptLine::new("Base cover", "$120.00"),
                ReceiptLine::new("Roadside assist", "$14.50"),
            ],
            "$134.50",
        );
        let filter = build_text_filter(&content, &opts());

        assert!(filter.contains("drawbox=x=50:y=30:w=1180:h=690"));
        assert!(filter.contains("text='Your Quote'"));
        assert!(filter.contains("text='Base cover'"));
        assert!(filter.contains("text='$134.50'"));
        assert!(filter.contains("text='Total Premium'"));
        // Values are right-aligned against the card edge.
        assert!(filter.contains("x=1180-text_w"));
        assert!(filter.ends_with("[outv]"));
    }

    #[test]
    fn receipt_filter_scales_down_long_bodies() {
        let lines: Vec<ReceiptLine> = (0..12)
            .map(|i| ReceiptLine::new(format!("Item {i}"), format!("${i}.00")))
            .collect();
        let content = TextContent::receipt("Header", lines, "$66.00");
        let filter = build_text_filter(&content, &opts());

        let layout = ReceiptLayout::for_items(12);
        assert!(filter.contains(&format!("fontsize={}", layout.font_size)));
        // The last row must still be drawn inside the body region.
        assert!(filter.contains(&format!("y={}", layout.row_y(11))));
    }
}
