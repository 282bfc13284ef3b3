use thiserror::Error;

/// Failures of a [`VisibleTextSource`](crate::VisibleTextSource).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("The page has no body to read text from")]
    MissingBody,

    #[error("No response from content script. Please refresh the page.")]
    NoResponse,

    #[error("{0}")]
    Failed(String),
}

/// Failures of the semantic vocabulary filter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("API key not found. Add an API key to use the AI filter.")]
    CredentialMissing,

    #[error("Invalid API key: {0}")]
    CredentialInvalid(String),

    #[error("AI filter prompt is too long ({length}/{max} characters). Please shorten it.")]
    PromptTooLong { length: usize, max: usize },

    #[error("AI filtering failed: {0}")]
    Service(String),

    #[error("AI filtering returned no matching words. Try a different prompt.")]
    EmptyResult,
}

/// Failures while rasterizing or writing an export artifact.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Font file may be invalid")]
    InvalidFont,

    #[error("No font configured for image export")]
    MissingFont,

    #[error("There is no word cloud to export")]
    NothingRendered,

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to extract text from page: {0}")]
    Extraction(ExtractionError),

    #[error("No response from content script. Please refresh the page.")]
    NoResponse,

    #[error("Cannot access browser internal pages. Please try on a regular webpage.")]
    InaccessiblePage { url: String },

    #[error("No text found on this page")]
    EmptyPageText,

    #[error("Not enough valid words found on this page")]
    EmptyVocabulary,

    #[error("API key not found. Add an API key to use the AI filter.")]
    CredentialMissing,

    #[error("Invalid API key: {0}")]
    CredentialInvalid(String),

    #[error("AI filter prompt is too long ({length}/{max} characters). Please shorten it.")]
    PromptTooLong { length: usize, max: usize },

    #[error("AI filtering failed: {0}")]
    Service(String),

    #[error("AI filtering returned no matching words. Try a different prompt.")]
    EmptyResult,

    #[error("Unable to generate word cloud. Try a different page.")]
    NoWordsPlaced,

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<ExtractionError> for Error {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::NoResponse => Error::NoResponse,
            other => Error::Extraction(other),
        }
    }
}

impl From<FilterError> for Error {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::CredentialMissing => Error::CredentialMissing,
            FilterError::CredentialInvalid(msg) => Error::CredentialInvalid(msg),
            FilterError::PromptTooLong { length, max } => Error::PromptTooLong { length, max },
            FilterError::Service(msg) => Error::Service(msg),
            FilterError::EmptyResult => Error::EmptyResult,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
