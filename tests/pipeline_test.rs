use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use page_wcloud::{
    Criterion, Error, ExtractionReply, FilterError, HtmlDocument, PlainText, ReplySource,
    ScreenSize, Settings, Tokenizer, VocabularyFilter, WordCloud,
};

/// Returns a fixed answer and records what it was asked.
struct StubFilter {
    answer: Vec<String>,
    seen: Mutex<Vec<Vec<String>>>,
}

impl StubFilter {
    fn new(answer: &[&str]) -> Arc<Self> {
        Arc::new(StubFilter {
            answer: answer.iter().map(|w| w.to_string()).collect(),
            seen: Mutex::new(vec![]),
        })
    }
}

#[async_trait]
impl VocabularyFilter for StubFilter {
    async fn filter(
        &self,
        words: &[String],
        _criterion: &Criterion,
    ) -> Result<Vec<String>, FilterError> {
        self.seen.lock().unwrap().push(words.to_vec());
        Ok(self.answer.clone())
    }
}

fn filtered_settings(criterion: &str) -> Settings {
    Settings {
        semantic_filter_enabled: true,
        semantic_criterion: criterion.to_string(),
        ..Settings::default()
    }
}

fn counts(result: &page_wcloud::CloudResult) -> HashMap<String, u32> {
    result
        .words
        .iter()
        .map(|w| (w.text.clone(), w.count))
        .collect()
}

#[tokio::test]
async fn quick_brown_fox() {
    let engine = WordCloud::default()
        .with_tokenizer(Tokenizer::default().with_stop_words(&["the", "over"]));
    let source = PlainText("The Quick Brown Fox Jumps Over The Lazy Dog".into());

    let result = engine.generate(&source, &Settings::default()).await.unwrap();

    let expected: HashMap<String, u32> = ["quick", "brown", "fox", "jumps", "lazy", "dog"]
        .iter()
        .map(|w| (w.to_string(), 1))
        .collect();
    assert_eq!(counts(&result), expected);
    // one distinct frequency, one size
    assert!(result.words.iter().all(|w| w.font_size == result.words[0].font_size));
}

#[tokio::test]
async fn limit_keeps_most_frequent_word() {
    let text = "testing example testing testing example testing testing";
    let settings = Settings {
        word_limit: 1,
        ..Settings::default()
    };

    let result = WordCloud::default()
        .generate_from_text(text, &settings)
        .await
        .unwrap();

    assert_eq!(result.words.len(), 1);
    assert_eq!(result.words[0].text, "testing");
    assert_eq!(result.words[0].count, 5);
}

#[tokio::test]
async fn semantic_filter_is_reintersected_with_vocabulary() {
    let stub = StubFilter::new(&["apple", "car", "extraword"]);
    let engine = WordCloud::default()
        .with_tokenizer(Tokenizer::default().with_min_word_length(3))
        .with_vocabulary_filter(stub.clone());

    let result = engine
        .generate_from_text("apple banana car apple", &filtered_settings("vehicles and fruit"))
        .await
        .unwrap();

    let retained: HashSet<String> = result.words.iter().map(|w| w.text.clone()).collect();
    assert_eq!(
        retained,
        ["apple", "car"].iter().map(|w| w.to_string()).collect()
    );

    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], vec!["apple", "banana", "car"]);
}

#[tokio::test]
async fn empty_page_stops_before_tokenizing() {
    let result = WordCloud::default()
        .generate(&PlainText("  \n ".into()), &Settings::default())
        .await;
    assert!(matches!(result, Err(Error::EmptyPageText)));
}

#[tokio::test]
async fn nothing_placed_on_a_tiny_screen() {
    let settings = Settings {
        screen: ScreenSize {
            width: 45,
            height: 101,
        },
        ..Settings::default()
    };

    let result = WordCloud::default()
        .generate_from_text("enormous gigantic colossal", &settings)
        .await;
    assert!(matches!(result, Err(Error::NoWordsPlaced)));
}

#[tokio::test]
async fn only_stop_words_is_empty_vocabulary() {
    let result = WordCloud::default()
        .generate_from_text("the and of to it is 42 a1", &Settings::default())
        .await;
    assert!(matches!(result, Err(Error::EmptyVocabulary)));
}

#[tokio::test]
async fn missing_credential_fails_before_any_request() {
    let result = WordCloud::default()
        .generate_from_text("apple banana cherry", &filtered_settings("fruit"))
        .await;
    assert!(matches!(result, Err(Error::CredentialMissing)));

    let settings = Settings {
        credential: Some("not-a-key".into()),
        ..filtered_settings("fruit")
    };
    let result = WordCloud::default()
        .generate_from_text("apple banana cherry", &settings)
        .await;
    assert!(matches!(result, Err(Error::CredentialInvalid(_))));
}

#[tokio::test]
async fn no_matches_is_reported() {
    let engine = WordCloud::default().with_vocabulary_filter(StubFilter::new(&["zebra"]));
    let result = engine
        .generate_from_text("apple banana cherry", &filtered_settings("animals"))
        .await;
    assert!(matches!(result, Err(Error::EmptyResult)));
}

#[tokio::test]
async fn filtered_limit_is_capped() {
    let words: Vec<String> = (0..300)
        .map(|i| {
            let a = (b'a' + (i / 26) as u8) as char;
            let b = (b'a' + (i % 26) as u8) as char;
            format!("word{a}{b}")
        })
        .collect();
    let answer: Vec<&str> = words.iter().map(String::as_str).collect();
    let engine = WordCloud::default().with_vocabulary_filter(StubFilter::new(&answer));

    let settings = Settings {
        word_limit: 2000,
        ..filtered_settings("everything")
    };
    let result = engine.generate_from_text(&words.join(" "), &settings).await.unwrap();
    assert!(result.words.len() <= 200);
}

#[tokio::test]
async fn placed_words_come_from_the_page() {
    let html = r#"<html><body>
        <h1>Ferris the crab</h1>
        <p>Ferris loves borrowing, ownership and lifetimes. Ferris compiles often.</p>
        <script>const ignored = "javascript tokens";</script>
        <p style="display:none">hidden secret words</p>
    </body></html>"#;
    let tokenizer = Tokenizer::default();
    let page = HtmlDocument::parse(html);

    let result = WordCloud::default()
        .generate(&page, &Settings::default())
        .await
        .unwrap();

    let allowed: HashSet<String> = tokenizer
        .tokenize("Ferris the crab Ferris loves borrowing, ownership and lifetimes. Ferris compiles often.")
        .into_iter()
        .collect();
    for word in &result.words {
        assert!(allowed.contains(&word.text), "{} is not page text", word.text);
    }
    assert_eq!(result.words[0].text, "ferris");
    assert_eq!(result.words[0].count, 3);
    assert!(result.words.windows(2).all(|w| w[0].font_size >= w[1].font_size));
    assert!(result.transform.scale <= 1.0);
}

#[tokio::test]
async fn silent_page_and_failed_reply_are_distinct() {
    let silent = WordCloud::default()
        .generate(&ReplySource::new(None), &Settings::default())
        .await;
    assert!(matches!(silent, Err(Error::NoResponse)));

    let failed = WordCloud::default()
        .generate(
            &ReplySource::new(Some(ExtractionReply::failed("document.body is null"))),
            &Settings::default(),
        )
        .await;
    assert!(matches!(failed, Err(Error::Extraction(_))));
}

#[tokio::test]
async fn missing_body_is_an_extraction_error() {
    // html5ever always synthesizes a body, so a frameset document is the only way to
    // end up without one
    let page = HtmlDocument::parse("<html><frameset><frame src=\"a.html\"></frameset></html>");
    let result = WordCloud::default().generate(&page, &Settings::default()).await;
    assert!(matches!(result, Err(Error::Extraction(_))));
}
