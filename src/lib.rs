use std::collections::HashSet;
use std::sync::Arc;

use nanorand::WyRand;
use tracing::{info, warn};

pub use error::{Error, ExportError, ExtractionError, FilterError, Result};
pub use extract::{check_page_url, ExtractionReply, HtmlDocument, PlainText, ReplySource, VisibleTextSource};
pub use frequency::{aggregate, count_words, WordFrequency};
pub use layout::{CloudLayout, ContainerSize, Layout, Size, Transform, Word};
pub use render::{CloudResult, ColorScheme, PlacedWord, Rasterizer, SvgScene};
pub use semantic::{Criterion, OpenAiFilter, VocabularyFilter};
pub use session::{CloudState, RenderedCloud, Session};
pub use settings::{ScreenSize, Settings, SettingsProvider};
pub use text::{ApproxMeasure, FontMeasure, TextMeasure};
pub use tokenizer::Tokenizer;

pub mod error;
pub mod extract;
pub mod frequency;
pub mod grid;
pub mod layout;
pub mod logger;
pub mod render;
pub mod semantic;
pub mod session;
pub mod settings;
mod spiral;
pub mod stopwords;
mod text;
mod tokenizer;

/// The text-to-cloud pipeline.
pub struct WordCloud {
    tokenizer: Tokenizer,
    layout: CloudLayout,
    color_scheme: ColorScheme,
    measure: Arc<dyn TextMeasure>,
    filter: Option<Arc<dyn VocabularyFilter>>,
    rng_seed: Option<u64>,
}

impl Default for WordCloud {
    fn default() -> Self {
        WordCloud {
            tokenizer: Tokenizer::default(),
            layout: CloudLayout::default(),
            color_scheme: ColorScheme::default(),
            measure: Arc::new(ApproxMeasure),
            filter: None,
            rng_seed: None,
        }
    }
}

impl WordCloud {
    pub fn with_tokenizer(mut self, value: Tokenizer) -> Self {
        self.tokenizer = value;
        self
    }

    pub fn with_layout(mut self, value: CloudLayout) -> Self {
        self.layout = value;
        self
    }

    pub fn with_color_scheme(mut self, value: ColorScheme) -> Self {
        self.color_scheme = value;
        self
    }

    pub fn with_measure(mut self, value: Arc<dyn TextMeasure>) -> Self {
        self.measure = value;
        self
    }

    /// Filter used when semantic filtering is enabled. Without one, an
    /// [`OpenAiFilter`] is built from the stored credential.
    pub fn with_vocabulary_filter(mut self, value: Arc<dyn VocabularyFilter>) -> Self {
        self.filter = Some(value);
        self
    }

    pub fn with_rng_seed(mut self, value: Option<u64>) -> Self {
        self.rng_seed = value;
        self
    }

    /// Runs one request: extraction, then [`WordCloud::generate_from_text`].
    pub async fn generate(
        &self,
        source: &dyn VisibleTextSource,
        settings: &dyn SettingsProvider,
    ) -> Result<CloudResult> {
        let settings = settings.settings();
        let text = source.extract()?;
        self.generate_from_text(&text, &settings).await
    }

    pub async fn generate_from_text(&self, text: &str, settings: &Settings) -> Result<CloudResult> {
        if text.trim().is_empty() {
            return Err(Error::EmptyPageText);
        }

        let tokens = self.tokenizer.tokenize(text);
        let total_words = tokens.len();
        info!("Tokenized page text - chars={}, tokens={}", text.len(), total_words);

        let limit = settings.effective_word_limit();
        let criterion = semantic_criterion(settings)?;

        let frequencies = match criterion {
            None => aggregate(&tokens, limit)?,
            Some(criterion) => {
                let mut frequencies = aggregate(&tokens, usize::MAX)?;
                let vocabulary: Vec<String> = frequencies.iter().map(|w| w.text.clone()).collect();

                let retained = match &self.filter {
                    Some(filter) => {
                        semantic::run_semantic_filter(filter.as_ref(), &vocabulary, &criterion).await?
                    }
                    None => {
                        let filter = OpenAiFilter::from_settings(settings)?;
                        semantic::run_semantic_filter(&filter, &vocabulary, &criterion).await?
                    }
                };

                let retained: HashSet<&str> = retained.iter().map(String::as_str).collect();
                frequencies.retain(|w| retained.contains(w.text.as_str()));
                frequencies.truncate(limit);
                frequencies
            }
        };
        info!(
            "Aggregated frequencies - distinct={}, limit={}",
            frequencies.len(),
            limit
        );

        let sizes = ContainerSize::for_word_count(frequencies.len(), settings.screen);
        let layout = self
            .layout
            .layout(&frequencies, sizes.target, self.measure.as_ref())?;

        let mut rng = match self.rng_seed {
            Some(seed) => WyRand::new_seed(seed),
            None => WyRand::new(),
        };

        Ok(CloudResult {
            words: render::colorize(layout.words, &self.color_scheme, &mut rng),
            container: sizes.container,
            target: sizes.target,
            transform: layout.transform,
            total_words,
        })
    }
}

/// The criterion to filter by, or `None` when the stage does not run.
fn semantic_criterion(settings: &Settings) -> Result<Option<Criterion>> {
    if !settings.semantic_filter_enabled {
        return Ok(None);
    }

    let criterion = Criterion::parse(&settings.semantic_criterion)?;
    if criterion.is_empty() {
        warn!("Semantic filter enabled without a criterion, skipping");
        return Ok(None);
    }
    Ok(Some(criterion))
}
