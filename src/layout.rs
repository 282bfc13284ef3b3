//! Word placement.
//!
//! Words are placed on a virtual canvas five times the size of the drawing area so
//! the spiral search has room to converge; the finished cloud is then scaled down
//! (never up) and centred in the drawing area.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::frequency::WordFrequency;
use crate::grid::{OccupancyGrid, Rect};
use crate::settings::ScreenSize;
use crate::spiral::{self, RectangularSpiral};
use crate::text::TextMeasure;

pub const VIRTUAL_MULTIPLIER: f32 = 5.0;
pub const MIN_FONT_SIZE: f32 = 10.0;
pub const MAX_FONT_SIZE: f32 = 60.0;
pub const WORD_PADDING: f32 = 3.0;
pub const FIT_PADDING: f32 = 20.0;

// container bounds, interpolated by word count up to FULL_SIZE_WORD_COUNT
const MIN_CONTAINER: Size = Size::new(500.0, 350.0);
const MAX_CONTAINER: Size = Size::new(800.0, 550.0);
const PLATFORM_LIMIT: Size = Size::new(800.0, 600.0);
const FULL_SIZE_WORD_COUNT: f32 = 2000.0;
// space kept free around the popup on the screen
const SCREEN_MARGIN: Size = Size::new(40.0, 100.0);
// container minus drawing area (padding and the stats line)
const CONTAINER_CHROME: Size = Size::new(20.0, 40.0);

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Size { width, height }
    }

    pub fn scaled(&self, factor: f32) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }
}

/// Popup dimensions chosen for a cloud.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainerSize {
    pub container: Size,
    /// Drawing area inside the container.
    pub target: Size,
}

impl ContainerSize {
    /// More words get a larger container, bounded by the platform limits and the
    /// available screen. Shrinking for the screen keeps the aspect ratio.
    pub fn for_word_count(count: usize, screen: ScreenSize) -> Self {
        let t = (count as f32 / FULL_SIZE_WORD_COUNT).min(1.0);
        let mut width = (MIN_CONTAINER.width + (MAX_CONTAINER.width - MIN_CONTAINER.width) * t)
            .round()
            .min(PLATFORM_LIMIT.width);
        let mut height = (MIN_CONTAINER.height + (MAX_CONTAINER.height - MIN_CONTAINER.height) * t)
            .round()
            .min(PLATFORM_LIMIT.height);

        let available_width = screen.width as f32 - SCREEN_MARGIN.width;
        let available_height = screen.height as f32 - SCREEN_MARGIN.height;
        if width > available_width || height > available_height {
            let shrink = (available_width / width)
                .min(available_height / height)
                .clamp(0.0, 1.0);
            width = (width * shrink).round();
            height = (height * shrink).round();
        }

        ContainerSize {
            container: Size::new(width, height),
            target: Size::new(
                (width - CONTAINER_CHROME.width).max(1.0),
                (height - CONTAINER_CHROME.height).max(1.0),
            ),
        }
    }
}

/// Log scale from word counts to font sizes.
#[derive(Clone, Copy, Debug)]
pub struct FontScale {
    min_ln: f32,
    max_ln: f32,
    range: (f32, f32),
}

impl FontScale {
    pub fn new(words: &[WordFrequency], range: (f32, f32)) -> Self {
        let min = words.iter().map(|w| w.count).min().unwrap_or(1).max(1);
        let max = words.iter().map(|w| w.count).max().unwrap_or(1).max(1);

        FontScale {
            min_ln: (min as f32).ln(),
            max_ln: (max as f32).ln(),
            range,
        }
    }

    pub fn size(&self, count: u32) -> f32 {
        let (lo, hi) = self.range;
        let span = self.max_ln - self.min_ln;
        if span <= f32::EPSILON {
            return (lo + hi) / 2.0;
        }
        let t = ((count.max(1) as f32).ln() - self.min_ln) / span;
        lo + (hi - lo) * t.clamp(0.0, 1.0)
    }
}

/// A word with its size and centre on the virtual canvas.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Word {
    pub text: String,
    pub count: u32,
    pub font_size: f32,
    pub x: f32,
    pub y: f32,
}

/// `translate(target / 2) scale(scale) translate(-center)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Transform {
    pub scale: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub target: Size,
}

impl Transform {
    /// Maps a virtual canvas point into the drawing area.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.center_x) * self.scale + self.target.width / 2.0,
            (y - self.center_y) * self.scale + self.target.height / 2.0,
        )
    }

    pub fn to_svg(&self) -> String {
        format!(
            "translate({},{}) scale({}) translate({},{})",
            self.target.width / 2.0,
            self.target.height / 2.0,
            self.scale,
            -self.center_x,
            -self.center_y
        )
    }
}

#[derive(Clone, Debug)]
pub struct Layout {
    pub words: Vec<Word>,
    pub canvas: Size,
    pub transform: Transform,
}

#[derive(Clone, Debug)]
pub struct CloudLayout {
    pub font_range: (f32, f32),
    pub padding: f32,
    pub virtual_multiplier: f32,
    pub fit_padding: f32,
    pub cell_size: f32,
    /// Upper bound on candidates tried per word. Without it a word may follow the
    /// spiral until it has covered the whole canvas.
    pub max_budget_per_word: Option<usize>,
}

impl Default for CloudLayout {
    fn default() -> Self {
        CloudLayout {
            font_range: (MIN_FONT_SIZE, MAX_FONT_SIZE),
            padding: WORD_PADDING,
            virtual_multiplier: VIRTUAL_MULTIPLIER,
            fit_padding: FIT_PADDING,
            cell_size: 2.0,
            max_budget_per_word: None,
        }
    }
}

impl CloudLayout {
    pub fn with_budget_per_word(mut self, budget: usize) -> Self {
        self.max_budget_per_word = Some(budget.max(1));
        self
    }

    /// Candidates a word may try on `canvas`: enough for the spiral to reach every
    /// edge, unless capped.
    pub fn budget_per_word(&self, canvas: Size) -> usize {
        let cover = spiral::steps_to_cover(canvas.width, canvas.height);
        self.max_budget_per_word.map_or(cover, |cap| cap.min(cover))
    }

    pub fn with_font_range(mut self, min: f32, max: f32) -> Self {
        self.font_range = (min.min(max), max.max(min));
        self
    }

    /// Places every word it can and fits the result into `target`.
    pub fn layout(
        &self,
        words: &[WordFrequency],
        target: Size,
        measure: &dyn TextMeasure,
    ) -> Result<Layout> {
        let canvas = target.scaled(self.virtual_multiplier);
        let placed = self.place_all(words, canvas, measure);

        if placed.is_empty() {
            return Err(Error::NoWordsPlaced);
        }

        let transform = self.fit(&placed, target, measure);
        info!(
            "Layout completed - requested={}, placed={}, scale={:.3}",
            words.len(),
            placed.len(),
            transform.scale
        );

        Ok(Layout {
            words: placed,
            canvas,
            transform,
        })
    }

    /// Spiral search from the canvas centre for each word in turn. Words that find
    /// no free spot within the budget are dropped.
    pub fn place_all(
        &self,
        words: &[WordFrequency],
        canvas: Size,
        measure: &dyn TextMeasure,
    ) -> Vec<Word> {
        let scale = FontScale::new(words, self.font_range);
        let mut grid = OccupancyGrid::new(canvas.width, canvas.height, self.cell_size);
        let (cx, cy) = (canvas.width / 2.0, canvas.height / 2.0);
        let max_delta = (canvas.width * canvas.width + canvas.height * canvas.height).sqrt();
        let budget = self.budget_per_word(canvas);
        debug!("Spiral budget - per_word={}", budget);

        let mut placed = Vec::with_capacity(words.len());
        for word in words {
            let font_size = scale.size(word.count);
            let width = measure.width(&word.text, font_size) + 2.0 * self.padding;
            let height = font_size + 2.0 * self.padding;

            if width > canvas.width || height > canvas.height {
                debug!("Word larger than canvas - word={}", word.text);
                continue;
            }

            let spot = RectangularSpiral::new(canvas.width, canvas.height)
                .take(budget)
                .take_while(|(dx, dy)| dx.abs().min(dy.abs()) < max_delta)
                .map(|(dx, dy)| Rect::from_center(cx + dx, cy + dy, width, height))
                .filter(|rect| rect.fits_within(canvas.width, canvas.height))
                .find(|rect| grid.region_is_empty(rect));

            match spot {
                Some(rect) => {
                    grid.occupy(&rect);
                    let (x, y) = rect.center();
                    placed.push(Word {
                        text: word.text.clone(),
                        count: word.count,
                        font_size,
                        x,
                        y,
                    });
                }
                None => debug!("No free spot - word={}", word.text),
            }
        }

        placed
    }

    /// Uniform scale (at most 1) and centring of the placed words' bounding box.
    pub fn fit(&self, placed: &[Word], target: Size, measure: &dyn TextMeasure) -> Transform {
        let bounds = placed
            .iter()
            .map(|word| footprint(word, measure))
            .reduce(|acc, rect| acc.union(&rect));

        let Some(bounds) = bounds else {
            return Transform {
                scale: 1.0,
                center_x: 0.0,
                center_y: 0.0,
                target,
            };
        };

        let inner_width = (target.width - 2.0 * self.fit_padding).max(1.0);
        let inner_height = (target.height - 2.0 * self.fit_padding).max(1.0);
        let scale = (inner_width / bounds.width().max(f32::EPSILON))
            .min(inner_height / bounds.height().max(f32::EPSILON))
            .min(1.0);
        let (center_x, center_y) = bounds.center();

        Transform {
            scale,
            center_x,
            center_y,
            target,
        }
    }
}

/// Box a drawn word covers, without layout padding.
pub fn footprint(word: &Word, measure: &dyn TextMeasure) -> Rect {
    Rect::from_center(
        word.x,
        word.y,
        measure.width(&word.text, word.font_size),
        word.font_size,
    )
}
