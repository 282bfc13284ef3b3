use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use tracing::{info, warn};

use page_wcloud::{
    check_page_url, logger, CloudLayout, CloudState, ColorScheme, HtmlDocument, OpenAiFilter,
    PlainText, Rasterizer, ReplySource, Session, Settings, VisibleTextSource, WordCloud,
};

/// Generate a word cloud from the visible text of a web page
#[derive(Parser, Debug)]
#[clap(name = "page-wcloud", version, about, long_about = None)]
#[clap(group(ArgGroup::new("input").required(true).args(&["html", "url", "text", "reply"])))]
struct Args {
    /// HTML file to extract visible text from
    #[clap(long)]
    html: Option<PathBuf>,

    /// Page to download and extract visible text from
    #[clap(long)]
    url: Option<String>,

    /// Plain text file, used as already extracted page text
    #[clap(long)]
    text: Option<PathBuf>,

    /// JSON reply of a content script ({"success": .., "text"|"error": ..})
    #[clap(long)]
    reply: Option<PathBuf>,

    /// Settings file (TOML)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of words in the cloud
    #[clap(long)]
    limit: Option<usize>,

    /// Keep only words matching this description (enables the AI filter)
    #[clap(long)]
    filter: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[clap(long)]
    api_base: Option<String>,

    /// Comma separated CSS colors for the words
    #[clap(long, value_delimiter = ',')]
    colors: Vec<String>,

    /// TTF/OTF font used for PNG export and exact text metrics
    #[clap(long)]
    font: Option<PathBuf>,

    /// Directory for the exported files
    #[clap(short, long, default_value = ".")]
    out: PathBuf,

    /// Seed for word colors
    #[clap(long)]
    seed: Option<u64>,

    /// Cap on candidate positions tried per word before it is dropped
    #[clap(long)]
    budget: Option<usize>,

    /// Enable verbose output
    #[clap(short, long)]
    verbose: bool,
}

async fn load_source(args: &Args) -> Result<Box<dyn VisibleTextSource>> {
    if let Some(path) = &args.html {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read {}", path.display()))?;
        return Ok(Box::new(HtmlDocument::parse(&html)));
    }

    if let Some(url) = &args.url {
        check_page_url(url)?;
        info!("Fetching page - url={}", url);
        let html = reqwest::get(url)
            .await
            .with_context(|| format!("Request failed for {url}"))?
            .error_for_status()
            .with_context(|| format!("HTTP error for {url}"))?
            .text()
            .await
            .with_context(|| format!("Reading body of {url}"))?;
        return Ok(Box::new(HtmlDocument::parse(&html)));
    }

    if let Some(path) = &args.text {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read {}", path.display()))?;
        return Ok(Box::new(PlainText(text)));
    }

    if let Some(path) = &args.reply {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read {}", path.display()))?;
        return Ok(Box::new(ReplySource::from_json(&raw)?));
    }

    bail!("No input given")
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_toml_file(path)?,
        None => Settings::default(),
    }
    .with_env_credential();

    if let Some(limit) = args.limit {
        settings.word_limit = limit;
    }
    if let Some(criterion) = &args.filter {
        settings.semantic_filter_enabled = true;
        settings.semantic_criterion = criterion.clone();
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let settings = load_settings(&args)?;
    let source = load_source(&args).await?;

    let mut engine = WordCloud::default().with_rng_seed(args.seed);
    if let Some(budget) = args.budget {
        engine = engine.with_layout(CloudLayout::default().with_budget_per_word(budget));
    }
    if !args.colors.is_empty() {
        let colors: Vec<&str> = args.colors.iter().map(String::as_str).collect();
        engine = engine.with_color_scheme(ColorScheme::from_css(&colors)?);
    }
    if let (Some(base), true) = (&args.api_base, settings.semantic_filter_enabled) {
        let filter = OpenAiFilter::from_settings(&settings)?.with_base_url(base.as_str());
        engine = engine.with_vocabulary_filter(Arc::new(filter));
    }

    let rasterizer = args.font.as_ref().map(Rasterizer::from_path).transpose()?;
    if let Some(rasterizer) = &rasterizer {
        engine = engine.with_measure(Arc::new(rasterizer.measure()));
    }

    let mut session = Session::new(engine);
    if let Some(rasterizer) = rasterizer {
        session = session.with_rasterizer(rasterizer);
    }

    match session.generate(source.as_ref(), &settings).await {
        CloudState::Ready(cloud) => println!("{}", cloud.result.stats()),
        CloudState::Failed(err) => bail!("{err}"),
        CloudState::Idle | CloudState::Loading => bail!("Word cloud generation did not finish"),
    }

    let svg = session.export_svg(&args.out)?;
    println!("{}", svg.display());

    if args.font.is_some() {
        match session.export_png(&args.out) {
            Ok(png) => println!("{}", png.display()),
            Err(err) => warn!("PNG export failed - error={}", err),
        }
    }

    Ok(())
}
