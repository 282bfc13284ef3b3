//! Visible text of a page.
//!
//! The pipeline only sees [`VisibleTextSource`]. `HtmlDocument` walks a parsed
//! document the way a content script walks the live DOM; `ReplySource` accepts the
//! reply a content script sends back over the extension messaging channel.

use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, ExtractionError};

/// Elements whose text is never shown to the reader.
const NON_CONTENT_TAGS: [&str; 5] = ["script", "style", "noscript", "iframe", "object"];

const INTERNAL_SCHEMES: [&str; 3] = ["chrome://", "chrome-extension://", "edge://"];

pub trait VisibleTextSource {
    fn extract(&self) -> Result<String, ExtractionError>;
}

/// Already extracted text.
pub struct PlainText(pub String);

impl VisibleTextSource for PlainText {
    fn extract(&self) -> Result<String, ExtractionError> {
        Ok(self.0.trim().to_string())
    }
}

/// Rejects pages a content script can never run on.
pub fn check_page_url(url: &str) -> Result<(), Error> {
    if INTERNAL_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        return Err(Error::InaccessiblePage {
            url: url.to_string(),
        });
    }
    Ok(())
}

/// Reply to an `extractText` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionReply {
    pub fn ok(text: impl Into<String>) -> Self {
        ExtractionReply {
            success: true,
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ExtractionReply {
            success: false,
            text: None,
            error: Some(error.into()),
        }
    }

    pub fn into_text(self) -> Result<String, ExtractionError> {
        if self.success {
            Ok(self.text.unwrap_or_default())
        } else {
            Err(ExtractionError::Failed(self.error.unwrap_or_else(|| {
                "Failed to extract text from page".to_string()
            })))
        }
    }
}

/// The receiving end of one extraction round trip. `None` means the page never
/// answered.
pub struct ReplySource {
    reply: Option<ExtractionReply>,
}

impl ReplySource {
    pub fn new(reply: Option<ExtractionReply>) -> Self {
        ReplySource { reply }
    }

    /// Parses a JSON reply; blank input is treated as no reply at all.
    pub fn from_json(raw: &str) -> Result<Self, ExtractionError> {
        if raw.trim().is_empty() {
            return Ok(ReplySource { reply: None });
        }
        let reply = serde_json::from_str(raw)
            .map_err(|e| ExtractionError::Failed(format!("Malformed extraction reply: {e}")))?;
        Ok(ReplySource { reply: Some(reply) })
    }
}

impl VisibleTextSource for ReplySource {
    fn extract(&self) -> Result<String, ExtractionError> {
        match &self.reply {
            Some(reply) => reply.clone().into_text(),
            None => Err(ExtractionError::NoResponse),
        }
    }
}

/// A parsed HTML page.
///
/// Without a rendering tree, visibility is decided from markup alone: the `hidden`
/// attribute and inline `display`, `visibility` and `opacity` declarations on the
/// text's ancestors.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        HtmlDocument {
            html: Html::parse_document(source),
        }
    }

    /// Answers an extraction request the way a content script would.
    pub fn handle_request(&self) -> ExtractionReply {
        match self.extract() {
            Ok(text) => ExtractionReply::ok(text),
            Err(err) => ExtractionReply::failed(err.to_string()),
        }
    }

    fn body(&self) -> Option<ElementRef<'_>> {
        let selector = Selector::parse("body").ok()?;
        self.html.select(&selector).next()
    }
}

impl VisibleTextSource for HtmlDocument {
    fn extract(&self) -> Result<String, ExtractionError> {
        let body = self.body().ok_or(ExtractionError::MissingBody)?;

        let mut accepted = Vec::new();
        let mut rejected = 0usize;

        for node in body.descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
                rejected += 1;
                continue;
            };

            let content: &str = text;
            if content.trim().is_empty() || !is_rendered(parent) {
                rejected += 1;
                continue;
            }
            accepted.push(content);
        }

        debug!(
            "Visible text walk - accepted={}, rejected={}",
            accepted.len(),
            rejected
        );

        Ok(accepted.join(" ").trim().to_string())
    }
}

fn is_rendered(parent: ElementRef<'_>) -> bool {
    let tag = parent.value().name().to_ascii_lowercase();
    if NON_CONTENT_TAGS.contains(&tag.as_str()) {
        return false;
    }

    // visibility inherits, so the closest declaration wins
    let mut visibility_decided = false;

    for element in std::iter::once(parent).chain(parent.ancestors().filter_map(ElementRef::wrap)) {
        let value = element.value();
        if value.attr("hidden").is_some() {
            return false;
        }
        let Some(style) = value.attr("style") else {
            continue;
        };
        for (property, setting) in declarations(style) {
            match property.as_str() {
                "display" if setting == "none" => return false,
                "opacity" if setting.parse::<f32>().map(|o| o <= 0.0).unwrap_or(false) => {
                    return false
                }
                "visibility" if !visibility_decided => {
                    if setting == "hidden" || setting == "collapse" {
                        return false;
                    }
                    visibility_decided = true;
                }
                _ => {}
            }
        }
    }

    true
}

/// Inline style declarations as lowercase `(property, value)` pairs.
fn declarations(style: &str) -> impl Iterator<Item = (String, String)> + '_ {
    style.split(';').filter_map(|decl| {
        let (property, value) = decl.split_once(':')?;
        let value = value.trim().to_ascii_lowercase();
        let value = value.trim_end_matches("!important").trim().to_string();
        Some((property.trim().to_ascii_lowercase(), value))
    })
}
