use std::io::Cursor;
use std::sync::Arc;

use image::{GenericImageView, ImageOutputFormat};
use resvg::tiny_skia;
use resvg::usvg::{self, fontdb};

use crate::error::AppError;
use crate::inject::escape_html;
use crate::wrap::{wrap_text, HeuristicMetrics, TextMeasure};

pub const CANVAS_WIDTH: u32 = 1200;
pub const CANVAS_HEIGHT: u32 = 630;

const TEXT_BUDGET: f32 = (CANVAS_WIDTH - 200) as f32;
const CENTER_X: u32 = CANVAS_WIDTH / 2;

const ICON_GLYPH: &str = "\u{1F4CB}";
const ICON_PX: f32 = 72.0;
const ICON_Y: f32 = 50.0;

const TITLE_PX: f32 = 48.0;
const TITLE_Y: f32 = 150.0;
const TITLE_LINE_HEIGHT: f32 = 60.0;

const DESC_PX: f32 = 24.0;
const DESC_Y: f32 = 300.0;
const DESC_LINE_HEIGHT: f32 = 35.0;

const WATERMARK: &str = "annotationhub.com";
const WATERMARK_PX: f32 = 18.0;
const WATERMARK_Y: f32 = 500.0;

const GRADIENT_FROM: &str = "#667eea";
const GRADIENT_TO: &str = "#764ba2";

const FONT_FAMILY: &str = "Inter, Arial, sans-serif";

const GENERATED_QUALITY: u8 = 90;
const CUSTOM_QUALITY: u8 = 95;

pub const MAX_CUSTOM_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Glyph-advance measurement over a system sans-serif face.
pub struct FontMetrics {
    db: fontdb::Database,
    face: fontdb::ID,
}

impl FontMetrics {
    pub fn load() -> Option<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let query = fontdb::Query {
            families: &[
                fontdb::Family::Name("Inter"),
                fontdb::Family::Name("Arial"),
                fontdb::Family::SansSerif,
            ],
            weight: fontdb::Weight::NORMAL,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        let face = db.query(&query);
        if face.is_none() {
            log::warn!("No usable sans-serif face found in the system font database");
        }
        face.map(|face| Self { db, face })
    }
}

impl TextMeasure for FontMetrics {
    fn text_width(&self, text: &str, px: f32) -> f32 {
        let measured = self
            .db
            .with_face_data(self.face, |data, index| {
                let face = ttf_parser::Face::parse(data, index).ok()?;
                let upem = f32::from(face.units_per_em());
                let units: f32 = text
                    .chars()
                    .map(|c| {
                        face.glyph_index(c)
                            .and_then(|g| face.glyph_hor_advance(g))
                            .map(f32::from)
                            .unwrap_or(upem * 0.5)
                    })
                    .sum();
                Some(units / upem * px)
            })
            .flatten();
        measured.unwrap_or_else(|| HeuristicMetrics::default().text_width(text, px))
    }
}

fn push_text_lines(
    svg: &mut String,
    lines: &[String],
    px: f32,
    y_origin: f32,
    line_height: f32,
    fill: &str,
    opacity: f32,
    weight: &str,
) {
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        // svg y is the baseline; the layout constants are top origins
        let y = y_origin + i as f32 * line_height + px;
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" text-anchor="middle" font-family="{family}" font-size="{px}" font-weight="{weight}" fill="{fill}" fill-opacity="{opacity}">{text}</text>"#,
            x = CENTER_X,
            y = y,
            family = FONT_FAMILY,
            px = px,
            weight = weight,
            fill = fill,
            opacity = opacity,
            text = escape_html(line),
        ));
    }
}

pub fn build_preview_svg(title: &str, description: &str, measure: &dyn TextMeasure) -> String {
    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = CANVAS_WIDTH,
        h = CANVAS_HEIGHT,
    ));
    svg.push_str(&format!(
        r##"<defs><linearGradient id="bg" x1="0" y1="0" x2="{w}" y2="{h}" gradientUnits="userSpaceOnUse"><stop offset="0" stop-color="{from}"/><stop offset="1" stop-color="{to}"/></linearGradient></defs><rect width="{w}" height="{h}" fill="url(#bg)"/>"##,
        w = CANVAS_WIDTH,
        h = CANVAS_HEIGHT,
        from = GRADIENT_FROM,
        to = GRADIENT_TO,
    ));

    push_text_lines(
        &mut svg,
        &[ICON_GLYPH.to_string()],
        ICON_PX,
        ICON_Y,
        ICON_PX,
        "#ffffff",
        1.0,
        "normal",
    );

    let title_lines = wrap_text(title, TEXT_BUDGET, TITLE_PX, measure);
    push_text_lines(
        &mut svg,
        &title_lines,
        TITLE_PX,
        TITLE_Y,
        TITLE_LINE_HEIGHT,
        "#ffffff",
        1.0,
        "bold",
    );

    if !description.trim().is_empty() {
        let desc_lines = wrap_text(description, TEXT_BUDGET, DESC_PX, measure);
        push_text_lines(
            &mut svg,
            &desc_lines,
            DESC_PX,
            DESC_Y,
            DESC_LINE_HEIGHT,
            "#ffffff",
            0.8,
            "normal",
        );
    }

    push_text_lines(
        &mut svg,
        &[WATERMARK.to_string()],
        WATERMARK_PX,
        WATERMARK_Y,
        WATERMARK_PX,
        "#ffffff",
        0.6,
        "normal",
    );

    svg.push_str("</svg>");
    svg
}

// Synthesized mode: fixed 1200x630 composite, JPEG quality 90.
pub fn render_generated(
    title: &str,
    description: &str,
    fonts: Option<&FontMetrics>,
) -> Result<PreviewImage, AppError> {
    let heuristic = HeuristicMetrics::default();
    let measure: &dyn TextMeasure = match fonts {
        Some(f) => f,
        None => &heuristic,
    };

    log::debug!("Rendering generated preview image for title: {}", title);
    let svg = build_preview_svg(title, description, measure);

    let mut options = usvg::Options::default();
    options.fontdb = Arc::new(match fonts {
        Some(f) => f.db.clone(),
        None => fontdb::Database::new(),
    });

    let tree = usvg::Tree::from_str(&svg, &options)
        .map_err(|e| AppError::Render(format!("SVG parse error: {}", e)))?;

    let mut pixmap = tiny_skia::Pixmap::new(CANVAS_WIDTH, CANVAS_HEIGHT)
        .ok_or_else(|| AppError::Render("failed to allocate pixmap".to_string()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut rgb = Vec::with_capacity((CANVAS_WIDTH * CANVAS_HEIGHT * 3) as usize);
    for px in pixmap.data().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    let buffer = image::RgbImage::from_raw(CANVAS_WIDTH, CANVAS_HEIGHT, rgb)
        .ok_or_else(|| AppError::Render("pixel buffer size mismatch".to_string()))?;

    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(buffer)
        .write_to(&mut out, ImageOutputFormat::Jpeg(GENERATED_QUALITY))?;

    Ok(PreviewImage {
        bytes: out.into_inner(),
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
    })
}

// Passthrough mode: re-encode at native dimensions, JPEG quality 95.
// No resizing, no overlay.
pub fn passthrough_image(bytes: &[u8]) -> Result<PreviewImage, AppError> {
    let decoded = image::load_from_memory(bytes)?;
    let width = decoded.width();
    let height = decoded.height();
    log::debug!("Re-encoding custom preview image at {}x{}", width, height);

    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(decoded.to_rgb8())
        .write_to(&mut out, ImageOutputFormat::Jpeg(CUSTOM_QUALITY))?;

    Ok(PreviewImage {
        bytes: out.into_inner(),
        width,
        height,
    })
}
