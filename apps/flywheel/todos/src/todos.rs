//! Todo list endpoints backed by the Flywheel engine.

use std::collections::HashSet;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use flywheel::{AttributeValue, Item, TableSpec, health};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const TABLE: &str = "todos";

/// Layout of the todos table
pub fn table_spec() -> TableSpec {
    TableSpec::new(TABLE, "id")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub done: bool,
    pub pub_date: DateTime<Utc>,
}

impl Todo {
    pub fn new(title: String, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            text,
            done: false,
            pub_date: Utc::now(),
        }
    }

    pub fn to_item(&self) -> Item {
        Item::from([
            ("id".to_string(), AttributeValue::S(self.id.to_string())),
            ("title".to_string(), AttributeValue::S(self.title.clone())),
            ("text".to_string(), AttributeValue::S(self.text.clone())),
            ("done".to_string(), AttributeValue::Bool(self.done)),
            (
                "pub_date".to_string(),
                AttributeValue::S(self.pub_date.to_rfc3339()),
            ),
        ])
    }

    pub fn from_item(item: &Item) -> ApiResult<Self> {
        let id = string_attr(item, "id")?;
        let pub_date = string_attr(item, "pub_date")?;

        Ok(Self {
            id: Uuid::parse_str(id).map_err(|e| ApiError::MalformedItem(format!("id: {}", e)))?,
            title: string_attr(item, "title")?.to_string(),
            text: string_attr(item, "text")?.to_string(),
            // Items written before `done` existed count as not done
            done: match item.get("done") {
                Some(value) => *value
                    .as_bool()
                    .map_err(|_| ApiError::MalformedItem("done is not a boolean".into()))?,
                None => false,
            },
            pub_date: DateTime::parse_from_rfc3339(pub_date)
                .map_err(|e| ApiError::MalformedItem(format!("pub_date: {}", e)))?
                .with_timezone(&Utc),
        })
    }
}

fn string_attr<'a>(item: &'a Item, name: &str) -> ApiResult<&'a str> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| ApiError::MalformedItem(format!("{} is missing or not a string", name)))
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTodo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

impl CreateTodo {
    fn validate(&self) -> ApiResult<()> {
        if self.title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title is required".to_string()));
        }
        if self.text.trim().is_empty() {
            return Err(ApiError::BadRequest("Text is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDone {
    /// Ids to mark done; every other todo is marked not done
    #[serde(default)]
    pub done: Vec<Uuid>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/done", post(update_done))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn load_all(state: &AppState) -> ApiResult<Vec<Todo>> {
    let engine = state.engine().await?;
    let mut todos = engine
        .scan(TABLE)
        .await?
        .iter()
        .map(Todo::from_item)
        .collect::<ApiResult<Vec<_>>>()?;
    todos.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
    Ok(todos)
}

#[instrument(skip(state))]
async fn list_todos(State(state): State<AppState>) -> ApiResult<Json<Vec<Todo>>> {
    Ok(Json(load_all(&state).await?))
}

#[instrument(skip(state, input))]
async fn create_todo(
    State(state): State<AppState>,
    Json(input): Json<CreateTodo>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    input.validate()?;

    let todo = Todo::new(input.title, input.text);
    state.engine().await?.save(TABLE, todo.to_item()).await?;

    info!(id = %todo.id, "Todo item was successfully created");
    Ok((StatusCode::CREATED, Json(todo)))
}

#[instrument(skip(state, input))]
async fn update_done(
    State(state): State<AppState>,
    Json(input): Json<UpdateDone>,
) -> ApiResult<Json<Vec<Todo>>> {
    let done: HashSet<Uuid> = input.done.into_iter().collect();
    let engine = state.engine().await?;

    let mut todos = load_all(&state).await?;
    for todo in &mut todos {
        todo.done = done.contains(&todo.id);
        engine.save(TABLE, todo.to_item()).await?;
    }

    info!(updated = todos.len(), "Updated status");
    Ok(Json(todos))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let conn = match state.engine().await.and_then(|engine| engine.dynamo()) {
        Ok(conn) => conn,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "app": state.app.name(),
                    "healthy": false,
                    "message": e.to_string(),
                })),
            );
        }
    };

    let status = health::check_health_detailed(conn).await;
    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(json!({
            "app": state.app.name(),
            "healthy": status.healthy,
            "message": status.message,
            "response_time_ms": status.response_time_ms,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use core_config::AppConfig;
    use flywheel::{Application, Flywheel};
    use http_body_util::BodyExt;
    use tower::ServiceExt; // For oneshot()

    async fn json_body(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn test_state(conflict: &str) -> AppState {
        let mut config = AppConfig::new();
        config.insert("FLYWHEEL_DATABASE_HOST", "localhost");
        config.insert("FLYWHEEL_DATABASE_PORT", 8000_i64);
        config.insert("FLYWHEEL_SECURE", false);
        config.insert("FLYWHEEL_ENGINE_DEFAULT_CONFLICT", conflict);
        let app = Application::with_config("todos-test", config);
        Flywheel::with_app(&app);
        AppState::new(app).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let app = router(test_state("update"));
        let response = app
            .oneshot(post_json("/todos", json!({ "title": "", "text": "body" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response.into_body()).await;
        assert_eq!(body["error"], "BAD_REQUEST");
        assert_eq!(body["message"], "Title is required");
    }

    #[tokio::test]
    async fn test_create_requires_text() {
        let app = router(test_state("update"));
        let response = app
            .oneshot(post_json("/todos", json!({ "title": "Write docs" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response.into_body()).await;
        assert_eq!(body["message"], "Text is required");
    }

    #[tokio::test]
    async fn test_engine_config_error_is_500() {
        let app = router(test_state("merge"));
        let response = app
            .oneshot(Request::builder().uri("/todos").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response.into_body()).await;
        assert_eq!(body["error"], "CONFIGURATION_ERROR");
    }

    #[tokio::test]
    async fn test_health_unavailable_when_engine_fails() {
        let app = router(test_state("merge"));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response.into_body()).await;
        assert_eq!(body["healthy"], false);
    }

    #[test]
    fn test_todo_item_conversion() {
        let todo = Todo::new("Write".to_string(), "docs".to_string());
        let parsed = Todo::from_item(&todo.to_item()).unwrap();
        assert_eq!(parsed.id, todo.id);
        assert_eq!(parsed.title, "Write");
        assert!(!parsed.done);
        assert_eq!(parsed.pub_date.timestamp(), todo.pub_date.timestamp());
    }

    #[test]
    fn test_from_item_rejects_bad_id() {
        let mut item = Todo::new("a".into(), "b".into()).to_item();
        item.insert("id".to_string(), AttributeValue::S("nope".to_string()));
        assert!(matches!(
            Todo::from_item(&item),
            Err(ApiError::MalformedItem(_))
        ));
    }

    #[test]
    fn test_from_item_defaults_missing_done() {
        let mut item = Todo::new("a".into(), "b".into()).to_item();
        item.remove("done");
        assert!(!Todo::from_item(&item).unwrap().done);
    }
}
