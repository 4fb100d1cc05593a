//! End-to-end tests for studymate.
//!
//! Every test runs the full pipeline: a PDF generated in memory with `lopdf`
//! goes through upload, real text extraction, prompt building, an HTTP call
//! to a `wiremock` server speaking the Gemini `generateContent` dialect, and
//! response parsing into the session. No live API key is needed.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use serde_json::{json, Value};
use std::time::Duration;
use studymate::{
    Artifact, Difficulty, ExtractionStatus, SessionStore, StudyConfig, StudyError, StudyMate,
    TaskKind, Upload,
};
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-test";
const KEY: &str = "test-key";
const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Build a PDF with one page per entry of `pages`. An empty string gives a
/// page with no text operators at all.
fn make_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            vec![]
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content stream"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialise PDF");
    bytes
}

fn pdf_upload(name: &str, pages: &[&str]) -> Upload {
    Upload::new(name, Some("application/pdf".into()), make_pdf(pages))
}

/// A successful `generateContent` body whose first candidate says `text`.
fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

/// Route library logs to the test harness; `RUST_LOG=studymate=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn mate_for(server: &MockServer, timeout_secs: u64) -> StudyMate {
    init_tracing();
    let config = StudyConfig::builder()
        .api_key(KEY)
        .model(MODEL)
        .api_base(server.uri())
        .api_timeout_secs(timeout_secs)
        .build()
        .expect("valid config");
    StudyMate::new(config).expect("build StudyMate")
}

/// Prompt text of the `n`th request the server saw.
async fn sent_prompt(server: &MockServer, n: usize) -> String {
    let requests = server.received_requests().await.expect("recording on");
    let body: Value = serde_json::from_slice(&requests[n].body).expect("JSON request body");
    body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text")
        .to_string()
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[test]
fn extraction_concatenates_pages_in_order() {
    let bytes = make_pdf(&["Alpha page one.", "Beta page two."]);
    let text = studymate::pipeline::extract::extract_text(&bytes).expect("extract");
    let alpha = text.find("Alpha").expect("first page text");
    let beta = text.find("Beta").expect("second page text");
    assert!(alpha < beta, "pages out of order: {text:?}");
}

#[test]
fn extraction_of_text_free_pdf_is_empty() {
    let bytes = make_pdf(&["", ""]);
    let text = studymate::pipeline::extract::extract_text(&bytes).expect("extract");
    assert!(text.trim().is_empty());
}

#[test]
fn extraction_tolerates_bytes_before_the_header() {
    let mut bytes = b"\r\n".to_vec();
    bytes.extend(make_pdf(&["Hello leading bytes."]));
    let text = studymate::pipeline::extract::extract_text(&bytes).expect("extract");
    assert!(text.contains("Hello leading bytes."), "got {text:?}");
}

#[tokio::test]
async fn image_only_upload_is_stored_as_empty() {
    let server = MockServer::start().await;
    let mate = mate_for(&server, 5);
    let mut session = SessionStore::new();

    let status = mate
        .upload(&mut session, pdf_upload("scan.pdf", &[""]))
        .await
        .expect("upload");
    assert_eq!(status, ExtractionStatus::Empty);

    assert!(matches!(
        mate.summarize(&mut session).await,
        Err(StudyError::EmptyDocument)
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Quiz: the happy path ─────────────────────────────────────────────────────

#[tokio::test]
async fn easy_quiz_from_one_page_pdf() {
    let server = MockServer::start().await;
    let questions = json!([
        "What is the powerhouse of the cell?",
        "Which organelle produces most of the cell's energy?",
        "What does the mitochondria generate for the cell?",
        "Is the mitochondria found inside the cell?",
        "What nickname is given to the mitochondria?"
    ]);
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(query_param("key", KEY))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&questions.to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let mate = mate_for(&server, 10);
    let mut session = SessionStore::new();
    let status = mate
        .upload(
            &mut session,
            pdf_upload("cell.pdf", &["The mitochondria is the powerhouse of the cell."]),
        )
        .await
        .expect("upload");
    assert_eq!(status, ExtractionStatus::Success);
    assert!(session.document().unwrap().text().contains("mitochondria"));

    let result = mate
        .generate_quiz(&mut session, Difficulty::Easy)
        .await
        .expect("quiz");

    match &result.artifact {
        Artifact::Questions(qs) => {
            assert_eq!(qs.len(), 5);
            assert!(qs.iter().all(|q| q.ends_with('?')), "{qs:?}");
        }
        other => panic!("expected questions, got {other:?}"),
    }
    assert_eq!(session.result(TaskKind::Quiz), Some(&result));

    let prompt = sent_prompt(&server, 0).await;
    assert!(prompt.contains("'Easy' difficulty"));
    assert!(prompt.contains("powerhouse of the cell"));
}

// ── Credentials ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_key_is_auth_error_and_sends_nothing() {
    let server = MockServer::start().await;
    let config = StudyConfig::builder()
        .model(MODEL)
        .api_base(server.uri())
        .build()
        .unwrap();
    let mate = StudyMate::new(config).unwrap();
    let mut session = SessionStore::new();
    mate.upload(&mut session, pdf_upload("a.pdf", &["Some study text."]))
        .await
        .unwrap();

    let err = mate
        .generate_quiz(&mut session, Difficulty::Easy)
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::AuthError { .. }), "{err}");
    assert!(session.result(TaskKind::Quiz).is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_key_is_auth_error_and_session_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{"reason": "API_KEY_INVALID"}]
            }
        })))
        .mount(&server)
        .await;

    let mate = mate_for(&server, 5);
    let mut session = SessionStore::new();
    mate.upload(&mut session, pdf_upload("a.pdf", &["Some study text."]))
        .await
        .unwrap();

    let err = mate.generate_flashcards(&mut session).await.unwrap_err();
    match err {
        StudyError::AuthError { detail } => assert!(detail.contains("API key not valid")),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(session.result(TaskKind::Flashcards).is_none());
    assert_eq!(session.document().unwrap().file_name(), "a.pdf");
}

// ── Response shapes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn fenced_flashcards_are_unwrapped() {
    let server = MockServer::start().await;
    let fenced = "```json\n[\n  {\"question\": \"What is ATP?\", \"answer\": \"The cell's energy currency.\"},\n  {\"question\": \"Where is ATP made?\", \"answer\": \"In the mitochondria.\"}\n]\n```";
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(fenced)))
        .mount(&server)
        .await;

    let mate = mate_for(&server, 5);
    let mut session = SessionStore::new();
    mate.upload(&mut session, pdf_upload("atp.pdf", &["ATP stores energy."]))
        .await
        .unwrap();

    let result = mate.generate_flashcards(&mut session).await.expect("flashcards");
    match &result.artifact {
        Artifact::Flashcards(cards) => {
            assert_eq!(cards.len(), 2);
            assert_eq!(cards[1].answer, "In the mitochondria.");
        }
        other => panic!("expected flashcards, got {other:?}"),
    }
    assert_eq!(result.raw, fenced);

    let prompt = sent_prompt(&server, 0).await;
    assert!(prompt.contains("5-10 flashcards"));
}

#[tokio::test]
async fn summary_with_highlights() {
    let server = MockServer::start().await;
    let payload = json!({
        "summary": "Cells convert nutrients into ATP.",
        "highlights": ["ATP is energy", "Mitochondria make ATP", "Glucose is the input", "Oxygen is needed"]
    });
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({
            "generationConfig": {"responseSchema": {"type": "OBJECT"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&payload.to_string())))
        .mount(&server)
        .await;

    let mate = mate_for(&server, 5);
    let mut session = SessionStore::new();
    mate.upload(&mut session, pdf_upload("resp.pdf", &["Respiration makes ATP."]))
        .await
        .unwrap();

    let result = mate.summarize(&mut session).await.expect("summary");
    let md = result.artifact.to_markdown();
    assert!(md.contains("## Document Summary"));
    assert!(md.contains("- Mitochondria make ATP"));
}

#[tokio::test]
async fn summary_missing_field_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply(r#"{"summary": "only a summary"}"#)),
        )
        .mount(&server)
        .await;

    let mate = mate_for(&server, 5);
    let mut session = SessionStore::new();
    mate.upload(&mut session, pdf_upload("x.pdf", &["Text."]))
        .await
        .unwrap();

    assert!(matches!(
        mate.summarize(&mut session).await,
        Err(StudyError::MalformedResponse { .. })
    ));
    assert!(session.result(TaskKind::Summary).is_none());
}

// ── Transport failures ───────────────────────────────────────────────────────

#[tokio::test]
async fn slow_service_times_out_and_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply(r#"["Too late?"]"#))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mate = mate_for(&server, 1);
    let mut session = SessionStore::new();
    mate.upload(&mut session, pdf_upload("slow.pdf", &["Patience."]))
        .await
        .unwrap();

    match mate.generate_quiz(&mut session, Difficulty::Medium).await {
        Err(StudyError::Timeout { timeout_ms }) => assert_eq!(timeout_ms, 1000),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(session.result(TaskKind::Quiz).is_none());
}

#[tokio::test]
async fn server_error_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
        })))
        .mount(&server)
        .await;

    let mate = mate_for(&server, 5);
    let mut session = SessionStore::new();
    match mate.ask(&mut session, "Why is the sky blue?").await {
        Err(StudyError::RemoteError { status, detail }) => {
            assert_eq!(status, 503);
            assert!(detail.contains("overloaded"));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(session.messages().len(), 1);
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    let config = StudyConfig::builder()
        .api_key(KEY)
        .api_base("http://127.0.0.1:1")
        .api_timeout_secs(5)
        .build()
        .unwrap();
    let mate = StudyMate::new(config).unwrap();
    let mut session = SessionStore::new();

    let err = mate.ask(&mut session, "Hello?").await.unwrap_err();
    assert!(matches!(err, StudyError::NetworkError { .. }), "{err}");
    assert!(!err.to_string().contains(KEY), "key leaked: {err}");
}

// ── Chat ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_uses_plain_text_and_grows_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "text/plain"}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply("Rayleigh scattering favours short wavelengths.")),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mate = mate_for(&server, 5);
    let mut session = SessionStore::new();

    mate.ask(&mut session, "Why is the sky blue?").await.unwrap();
    let answer = mate.ask(&mut session, "And sunsets?").await.unwrap();
    assert_eq!(answer, "Rayleigh scattering favours short wavelengths.");
    assert_eq!(session.messages().len(), 5);

    let prompt = sent_prompt(&server, 1).await;
    assert!(prompt.starts_with("You are StudyMate"));
    assert!(prompt.ends_with("And sunsets?"));
}

#[tokio::test]
async fn new_upload_clears_previous_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(r#"["Q?"]"#)))
        .mount(&server)
        .await;

    let mate = mate_for(&server, 5);
    let mut session = SessionStore::new();
    mate.upload(&mut session, pdf_upload("one.pdf", &["First document."]))
        .await
        .unwrap();
    mate.generate_quiz(&mut session, Difficulty::Easy)
        .await
        .unwrap();
    assert!(session.result(TaskKind::Quiz).is_some());

    mate.upload(&mut session, pdf_upload("two.pdf", &["Second document."]))
        .await
        .unwrap();
    assert!(session.result(TaskKind::Quiz).is_none());
    assert_eq!(session.document().unwrap().file_name(), "two.pdf");
}

// ── Links ────────────────────────────────────────────────────────────────────

#[test]
fn links_for_newtons_laws() {
    let groups = studymate::suggest_links("Newton's laws").unwrap();
    let google = groups
        .iter()
        .flat_map(|g| &g.links)
        .find(|l| l.label == "Google")
        .unwrap();
    assert_eq!(
        google.url,
        "https://www.google.com/search?q=Newton%27s%20laws"
    );
}
