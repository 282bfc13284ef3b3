use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{point, FontVec, PxScale};
use chrono::Utc;
use image::{Rgba, RgbaImage};
use nanorand::{Rng, WyRand};
use palette::{Hsl, IntoColor, Srgb};
use tracing::{debug, info};

use crate::error::{Error, ExportError, Result};
use crate::layout::{Size, Transform, Word};
use crate::text::{self, FontMeasure};

pub const DEFAULT_PALETTE: [&str; 4] = ["#BC9CB0", "#88958D", "#D3CDD7", "#DDF2EB"];
pub const FONT_FAMILY: &str = "Montserrat";
/// Linear resolution of raster exports relative to the drawing area.
pub const EXPORT_RESOLUTION: f32 = 2.0;

/// How words are coloured. Colours carry no meaning.
#[derive(Clone, Debug)]
pub enum ColorScheme {
    /// Uniform pick, with replacement, from a fixed list.
    Palette(Vec<Srgb<u8>>),
    /// Random fully saturated hue.
    RandomHue,
}

impl Default for ColorScheme {
    fn default() -> Self {
        ColorScheme::Palette(vec![
            Srgb::new(0xBC, 0x9C, 0xB0),
            Srgb::new(0x88, 0x95, 0x8D),
            Srgb::new(0xD3, 0xCD, 0xD7),
            Srgb::new(0xDD, 0xF2, 0xEB),
        ])
    }
}

impl ColorScheme {
    /// Builds a palette from CSS colour strings such as `#BC9CB0` or `teal`.
    pub fn from_css(colors: &[&str]) -> Result<Self> {
        if colors.is_empty() {
            return Err(Error::Config {
                message: "Color palette is empty".to_string(),
            });
        }

        let palette = colors
            .iter()
            .map(|css| {
                let [r, g, b, _] = csscolorparser::parse(css)
                    .map_err(|e| Error::Config {
                        message: format!("Invalid color {css:?}: {e}"),
                    })?
                    .to_rgba8();
                Ok(Srgb::new(r, g, b))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ColorScheme::Palette(palette))
    }

    pub fn pick(&self, rng: &mut WyRand) -> Srgb<u8> {
        match self {
            ColorScheme::Palette(colors) if !colors.is_empty() => {
                colors[rng.generate_range(0..colors.len())]
            }
            _ => random_hue(rng),
        }
    }
}

fn random_hue(rng: &mut WyRand) -> Srgb<u8> {
    let hue: u8 = rng.generate_range(0..255);

    let col = Hsl::new(hue as f32, 1.0, 0.5);
    let rgb: Srgb = col.into_color();

    rgb.into_format()
}

/// A word ready to draw, in virtual canvas coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    pub count: u32,
    pub font_size: f32,
    pub x: f32,
    pub y: f32,
    pub color: Srgb<u8>,
}

pub fn colorize(words: Vec<Word>, scheme: &ColorScheme, rng: &mut WyRand) -> Vec<PlacedWord> {
    words
        .into_iter()
        .map(|word| PlacedWord {
            color: scheme.pick(rng),
            text: word.text,
            count: word.count,
            font_size: word.font_size,
            x: word.x,
            y: word.y,
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct CloudResult {
    pub words: Vec<PlacedWord>,
    pub container: Size,
    pub target: Size,
    pub transform: Transform,
    /// Tokens analysed before counting.
    pub total_words: usize,
}

impl CloudResult {
    pub fn stats(&self) -> String {
        format!(
            "Showing {} unique words | {} total words analyzed",
            self.words.len(),
            self.total_words
        )
    }
}

/// File name for an export artifact, stamped with the current unix millis.
pub fn export_file_name(extension: &str) -> String {
    format!("wordcloud-{}.{}", Utc::now().timestamp_millis(), extension)
}

fn hex(color: Srgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", color.red, color.green, color.blue)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Vector form of a cloud.
#[derive(Clone, Debug)]
pub struct SvgScene {
    pub width: f32,
    pub height: f32,
    markup: String,
}

impl SvgScene {
    pub fn from_result(result: &CloudResult) -> Self {
        let Size { width, height } = result.target;
        let mut markup = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}"><g transform="{}">"#,
            result.transform.to_svg()
        );
        for word in &result.words {
            markup.push_str(&format!(
                r#"<text style="font-family: {FONT_FAMILY}; font-size: {}px; fill: {}" text-anchor="middle" dominant-baseline="central" transform="translate({},{})">{}</text>"#,
                word.font_size,
                hex(word.color),
                word.x,
                word.y,
                escape_xml(&word.text)
            ));
        }
        markup.push_str("</g></svg>");

        SvgScene {
            width,
            height,
            markup,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.markup
    }

    pub fn export(&self, dir: &Path) -> std::result::Result<PathBuf, ExportError> {
        let path = dir.join(export_file_name("svg"));
        fs::write(&path, &self.markup)?;
        info!("SVG exported - path={}", path.display());
        Ok(path)
    }
}

/// Raster export on a white background.
pub struct Rasterizer {
    font: Arc<FontVec>,
    resolution: f32,
    background: Rgba<u8>,
}

impl Rasterizer {
    pub fn from_bytes(bytes: Vec<u8>) -> std::result::Result<Self, ExportError> {
        let font = FontVec::try_from_vec(bytes).map_err(|_| ExportError::InvalidFont)?;

        Ok(Rasterizer {
            font: Arc::new(font),
            resolution: EXPORT_RESOLUTION,
            background: Rgba([0xFF, 0xFF, 0xFF, 0xFF]),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> std::result::Result<Self, ExportError> {
        let font_file = fs::read(path.as_ref())?;
        Self::from_bytes(font_file)
    }

    pub fn with_resolution(mut self, resolution: f32) -> Self {
        self.resolution = resolution.max(0.1);
        self
    }

    /// Text metrics from the export font, for layouts that should match the
    /// raster exactly.
    pub fn measure(&self) -> FontMeasure {
        FontMeasure::new(Arc::clone(&self.font))
    }

    pub fn render(&self, result: &CloudResult) -> RgbaImage {
        let width = (result.target.width * self.resolution).round().max(1.0) as u32;
        let height = (result.target.height * self.resolution).round().max(1.0) as u32;
        let mut buffer = RgbaImage::from_pixel(width, height, self.background);

        for word in &result.words {
            let (x, y) = result.transform.apply(word.x, word.y);
            let size = word.font_size * result.transform.scale * self.resolution;
            let color = Rgba([word.color.red, word.color.green, word.color.blue, 0xFF]);

            text::draw_text_centered(
                &mut buffer,
                &word.text,
                self.font.as_ref(),
                PxScale::from(size),
                point(x * self.resolution, y * self.resolution),
                color,
            );
        }

        debug!("Rasterized cloud - width={}, height={}", width, height);
        buffer
    }

    pub fn export(
        &self,
        result: &CloudResult,
        dir: &Path,
    ) -> std::result::Result<PathBuf, ExportError> {
        let path = dir.join(export_file_name("png"));
        self.render(result).save(&path)?;
        info!("PNG exported - path={}", path.display());
        Ok(path)
    }
}
