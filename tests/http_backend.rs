//! Drives `HttpBackend` and the reader against a local axum server that
//! speaks the annotation API.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use url::Url;

use journal_reader::document::PdfDocument;
use journal_reader::models::{ExplainRequest, NewAnnotation, NewLayer};
use journal_reader::{
    Backend, DocumentLoader, HttpBackend, PointerRelease, Reader, ReaderError,
};

const VIEWER_ID: i64 = 7;

// ============================================================================
// Test Server
// ============================================================================

#[derive(Default)]
struct ServerState {
    annotations: Mutex<Vec<Value>>,
    next_id: Mutex<i64>,
}

type Shared = Arc<ServerState>;
type Reply = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "error": message })))
}

async fn list_layers(Path(ebook_id): Path<i64>) -> Reply {
    if ebook_id != 1 {
        return (StatusCode::OK, Json(json!([])));
    }
    (
        StatusCode::OK,
        Json(json!([{
            "id": 1,
            "name": "Themes",
            "description": null,
            "creator_id": VIEWER_ID,
            "creator_name": "ada",
            "is_public": true
        }])),
    )
}

async fn list_annotations(State(state): State<Shared>, Path(layer_id): Path<i64>) -> axum::response::Response {
    use axum::response::IntoResponse;
    if layer_id == 77 {
        return (StatusCode::OK, "<html>login</html>").into_response();
    }
    let annotations: Vec<Value> = state
        .annotations
        .lock()
        .unwrap()
        .iter()
        .filter(|a| a["layer_id"] == layer_id)
        .cloned()
        .collect();
    (StatusCode::OK, Json(Value::Array(annotations))).into_response()
}

async fn create_annotation(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    if body.get("content").is_none() || body.get("layer_id").is_none() {
        return error(StatusCode::BAD_REQUEST, "Missing required data");
    }
    let id = {
        let mut next = state.next_id.lock().unwrap();
        *next += 1;
        *next
    };
    let annotation = json!({
        "id": id,
        "layer_id": body["layer_id"],
        "content": body["content"],
        "highlighted_text": body["highlighted_text"],
        "position_data": body["position_data"],
        "author_id": VIEWER_ID,
        "author_name": "ada",
        "timestamp": "2024-03-05T14:07:31.123456"
    });
    state.annotations.lock().unwrap().push(annotation.clone());
    (StatusCode::CREATED, Json(annotation))
}

async fn delete_annotation(State(state): State<Shared>, Path(id): Path<i64>) -> Reply {
    if id == 999 {
        return error(StatusCode::FORBIDDEN, "You do not have permission to delete this");
    }
    let mut annotations = state.annotations.lock().unwrap();
    let before = annotations.len();
    annotations.retain(|a| a["id"] != id);
    if annotations.len() == before {
        return error(StatusCode::NOT_FOUND, "Annotation not found");
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Annotation deleted" })),
    )
}

async fn list_groups() -> Reply {
    (StatusCode::OK, Json(json!([{ "id": 4, "name": "Book club" }])))
}

async fn create_layer(Json(body): Json<Value>) -> Reply {
    if body.get("name").is_none() || body.get("ebook_id").is_none() {
        return error(StatusCode::BAD_REQUEST, "Missing required data (name, ebook_id)");
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 12,
            "name": body["name"],
            "description": null,
            "creator_id": VIEWER_ID,
            "creator_name": "ada",
            "is_public": body["study_group_id"].is_null(),
            "study_group_id": body["study_group_id"]
        })),
    )
}

async fn explain(Json(body): Json<Value>) -> Reply {
    let text = body["text"].as_str().unwrap_or("");
    if text.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Please ask a question.");
    }
    (
        StatusCode::OK,
        Json(json!({ "explanation": format!("It means: {}", text) })),
    )
}

async fn summarize(Path(layer_id): Path<i64>) -> Reply {
    if layer_id == 1 {
        (StatusCode::OK, Json(json!({ "summary": "Disabled" })))
    } else {
        error(StatusCode::INTERNAL_SERVER_ERROR, "AI model not available.")
    }
}

async fn spawn_server() -> Url {
    let state: Shared = Arc::new(ServerState::default());
    let app = Router::new()
        .route("/api/book/{ebook_id}/layers", get(list_layers))
        .route("/api/layer/{layer_id}/annotations", get(list_annotations))
        .route("/api/annotation/new", post(create_annotation))
        .route("/api/annotation/{id}/delete", post(delete_annotation))
        .route("/api/user/groups", get(list_groups))
        .route("/api/layer/new", post(create_layer))
        .route("/api/ai/explain", post(explain))
        .route("/api/layer/{layer_id}/summarize", get(summarize))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}/", addr)).unwrap()
}

async fn backend() -> HttpBackend {
    HttpBackend::new(spawn_server().await, Some("session=test")).unwrap()
}

struct TextLoader;

impl DocumentLoader for TextLoader {
    type Document = PdfDocument;

    async fn load(&self, _url: &str) -> Result<PdfDocument, ReaderError> {
        Ok(PdfDocument::from_page_texts(vec![
            "Page one text".to_string(),
            "foo bar baz".to_string(),
            "The end".to_string(),
        ]))
    }
}

// ============================================================================
// Backend
// ============================================================================

#[tokio::test]
async fn test_layers_and_groups() {
    let backend = backend().await;

    let layers = backend.list_layers(1).await.unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].label(), "Themes (by ada)");
    assert!(backend.list_layers(2).await.unwrap().is_empty());

    let groups = backend.list_groups().await.unwrap();
    assert_eq!(groups[0].name, "Book club");
}

#[tokio::test]
async fn test_annotation_round_trip() {
    let backend = backend().await;
    let created = backend
        .create_annotation(&NewAnnotation {
            content: "my note".to_string(),
            layer_id: 1,
            highlighted_text: Some("foo bar".to_string()),
            position_data: Some("Page 2".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(created.author_id, VIEWER_ID);
    assert_eq!(created.display_timestamp().as_deref(), Some("2024-03-05 14:07"));

    let listed = backend.list_annotations(1).await.unwrap();
    assert_eq!(listed, vec![created.clone()]);

    backend.delete_annotation(created.id).await.unwrap();
    assert!(backend.list_annotations(1).await.unwrap().is_empty());

    let missing = backend.delete_annotation(created.id).await;
    assert_eq!(
        missing,
        Err(ReaderError::Api {
            status: 404,
            message: "Annotation not found".to_string()
        })
    );
}

#[tokio::test]
async fn test_error_bodies_and_bad_payloads() {
    let backend = backend().await;

    let forbidden = backend.delete_annotation(999).await;
    assert!(matches!(forbidden, Err(ReaderError::Api { status: 403, ref message }) if message.contains("permission")));

    let not_json = backend.list_annotations(77).await;
    assert!(matches!(not_json, Err(ReaderError::Decode(_))));

    let empty_question = backend
        .explain(&ExplainRequest {
            text: String::new(),
            ebook_id: 1,
        })
        .await;
    assert!(matches!(empty_question, Err(ReaderError::Api { status: 400, .. })));

    assert_eq!(backend.summarize_layer(1).await.unwrap().summary, "Disabled");
    assert!(matches!(
        backend.summarize_layer(2).await,
        Err(ReaderError::Api { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_create_layer_scope() {
    let backend = backend().await;
    let private = backend
        .create_layer(&NewLayer {
            name: "Private thoughts".to_string(),
            ebook_id: 1,
            study_group_id: None,
        })
        .await
        .unwrap();
    assert_eq!(private.is_public, Some(true));
    assert_eq!(private.study_group_id, None);

    let group = backend
        .create_layer(&NewLayer {
            name: "Club".to_string(),
            ebook_id: 1,
            study_group_id: Some(4),
        })
        .await
        .unwrap();
    assert_eq!(group.study_group_id, Some(4));
}

#[tokio::test]
async fn test_unreachable_server_is_a_request_error() {
    let base = Url::parse("http://127.0.0.1:1/").unwrap();
    let backend = HttpBackend::new(base, None).unwrap();
    assert!(matches!(
        backend.list_groups().await,
        Err(ReaderError::Request(_))
    ));
}

// ============================================================================
// Reader over HTTP
// ============================================================================

#[tokio::test]
async fn test_reader_saves_note_over_http() {
    let reader = Reader::new(backend().await, VIEWER_ID, 1);
    reader.load_document(&TextLoader, "book.pdf").await.unwrap();
    reader.refresh_layers().await.unwrap();
    reader.select_layer(Some(1)).await.unwrap();

    let page_two = reader.layout().surface(2).unwrap().top;
    assert_eq!(reader.on_scroll(page_two), 2);
    reader.on_pointer_release(&PointerRelease::in_viewer("foo bar"));
    reader.set_draft("my note");
    reader.save_annotation().await.unwrap();

    let snapshot = reader.snapshot();
    let cards = snapshot.annotations.cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].content, "my note");
    assert_eq!(cards[0].quote.as_deref(), Some("foo bar"));
    assert_eq!(cards[0].location.as_deref(), Some("Page 2"));
    assert!(reader.take_notices().is_empty());

    reader.set_draft("what does foo mean?");
    reader.ask_ai().await.unwrap();
    assert!(reader.snapshot().draft.contains("It means: what does foo mean?"));
}
