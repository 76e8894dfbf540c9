// routes.rs - HTTP handlers mapping each route to one workflow operation.
//
// Workflow calls are synchronous and touch disk or SMTP, so every handler
// runs its operation on the blocking pool. Bodies are taken as raw bytes
// and decoded by the handler so bad JSON is answered in the usual
// `{"error": ...}` shape.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use axum::routing::{any, get, post, put};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tt_identity::CallerIdentity;
use tt_workflow::{CreateTaskRequest, GoalRequest, GoalWorkflow, TaskWorkflow, WorkflowError};

use crate::caller::caller_from_headers;
use crate::response::{parse_body, reply, AllowMethods, ApiError};

/// Shared clients, built once at startup.
#[derive(Clone)]
pub struct AppState {
    tasks: Arc<TaskWorkflow>,
    goals: Arc<GoalWorkflow>,
}

impl AppState {
    pub fn new(tasks: TaskWorkflow, goals: GoalWorkflow) -> Self {
        Self {
            tasks: Arc::new(tasks),
            goals: Arc::new(goals),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/tasks",
            post(create_task)
                .get(list_tasks)
                .fallback(|| reject_verb(AllowMethods::TASKS))
                .layer(preflight([Method::GET, Method::POST])),
        )
        .route(
            "/tasks/{task_id}",
            put(update_task_status)
                .fallback(|| reject_verb(AllowMethods::UPDATE_TASK))
                .layer(preflight([Method::GET, Method::PUT])),
        )
        .route(
            "/tasks/{task_id}/goals",
            get(goals_for_task)
                .fallback(|| reject_verb(AllowMethods::TASK_GOALS))
                .layer(preflight([Method::GET, Method::POST])),
        )
        .route(
            "/goals",
            post(save_goal)
                .get(goals_for_user)
                .fallback(|| reject_verb(AllowMethods::GOALS))
                .layer(preflight([Method::GET, Method::POST])),
        )
        .route(
            "/goals/{goal_id}",
            any(delete_goal).layer(preflight([Method::POST, Method::DELETE])),
        )
        .with_state(state)
}

/// Verbs a path does not serve get the usual JSON error and CORS headers.
async fn reject_verb(methods: AllowMethods) -> ApiError {
    ApiError::from_workflow(methods, WorkflowError::MethodNotAllowed)
}

/// Answers browser preflight requests for one path.
fn preflight<const N: usize>(methods: [Method; N]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(methods)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Run a workflow call on the blocking pool.
async fn blocking<T, F>(methods: AllowMethods, call: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, WorkflowError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(call).await {
        Ok(result) => result.map_err(|e| ApiError::from_workflow(methods, e)),
        Err(e) => Err(ApiError::internal(methods, format!("worker failed: {e}"))),
    }
}

fn identify(methods: AllowMethods, headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
    caller_from_headers(headers).map_err(|e| ApiError::from_workflow(methods, e))
}

async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    const METHODS: AllowMethods = AllowMethods::CREATE_TASK;
    let caller = identify(METHODS, &headers)?;
    let request: CreateTaskRequest = parse_body(METHODS, &body)?;
    let workflow = state.tasks.clone();
    let created = blocking(METHODS, move || workflow.create_task(&caller, request)).await?;
    Ok(reply(
        METHODS,
        StatusCode::CREATED,
        &json!({ "message": "Task created", "task": created.task }),
    ))
}

async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    const METHODS: AllowMethods = AllowMethods::LIST_TASKS;
    let caller = identify(METHODS, &headers)?;
    let workflow = state.tasks.clone();
    let tasks = blocking(METHODS, move || workflow.list_tasks(&caller)).await?;
    Ok(reply(METHODS, StatusCode::OK, &json!({ "tasks": tasks })))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: Option<String>,
}

async fn update_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    const METHODS: AllowMethods = AllowMethods::UPDATE_TASK;
    let caller = identify(METHODS, &headers)?;
    let StatusBody { status } = parse_body(METHODS, &body)?;
    let workflow = state.tasks.clone();
    blocking(METHODS, move || {
        workflow.update_status(&caller, &task_id, status.as_deref())
    })
    .await?;
    Ok(reply(
        METHODS,
        StatusCode::OK,
        &json!({ "message": "Task status updated" }),
    ))
}

async fn goals_for_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    const METHODS: AllowMethods = AllowMethods::TASK_GOALS;
    let workflow = state.goals.clone();
    let goals = blocking(METHODS, move || workflow.goals_for_task(Some(&task_id))).await?;
    Ok(reply(METHODS, StatusCode::OK, &goals))
}

async fn save_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    const METHODS: AllowMethods = AllowMethods::SAVE_GOAL;
    let caller = identify(METHODS, &headers)?;
    let request: GoalRequest = parse_body(METHODS, &body)?;
    let workflow = state.goals.clone();
    let outcome = blocking(METHODS, move || workflow.save_goal(&caller, request)).await?;
    Ok(reply(
        METHODS,
        StatusCode::CREATED,
        &json!({ "message": outcome.message(), "goalId": outcome.goal_id }),
    ))
}

async fn goals_for_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    const METHODS: AllowMethods = AllowMethods::USER_GOALS;
    let caller = identify(METHODS, &headers)?;
    let workflow = state.goals.clone();
    let goals = blocking(METHODS, move || workflow.goals_for_user(&caller)).await?;
    Ok(reply(METHODS, StatusCode::OK, &goals))
}

async fn delete_goal(
    State(state): State<AppState>,
    method: Method,
    Path(goal_id): Path<String>,
) -> Result<Response, ApiError> {
    const METHODS: AllowMethods = AllowMethods::DELETE_GOAL;
    if method != Method::DELETE {
        return Err(ApiError::from_workflow(METHODS, WorkflowError::MethodNotAllowed));
    }
    let workflow = state.goals.clone();
    let id = goal_id.clone();
    blocking(METHODS, move || workflow.delete_goal(&id)).await?;
    Ok(reply(
        METHODS,
        StatusCode::OK,
        &json!({ "message": format!("Goal {goal_id} deleted successfully") }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;
    use tt_identity::{MemoryUserDirectory, UserProvisioner};
    use tt_notify::{Notifier, RecordingMailer};
    use tt_store::MemoryRecordStore;
    use tt_workflow::Tables;

    use crate::caller::{EMAIL_HEADER, GROUPS_HEADER, SUBJECT_HEADER, USERNAME_HEADER};

    struct Harness {
        mailer: Arc<RecordingMailer>,
        app: Router,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryRecordStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let tables = Tables::new("Tasks", "Goals");
        let tasks = TaskWorkflow::new(
            store.clone(),
            tables.tasks.clone(),
            UserProvisioner::new(Arc::new(MemoryUserDirectory::with_users(["old@x.io"]))),
            Notifier::new(mailer.clone(), "bot@x.io"),
            "admin@x.io",
        );
        let goals = GoalWorkflow::new(store, tables.tasks, tables.goals);
        Harness {
            mailer,
            app: router(AppState::new(tasks, goals)),
        }
    }

    fn request(method: Method, uri: &str, groups: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(SUBJECT_HEADER, "sub-lead")
            .header(EMAIL_HEADER, "lead@x.io")
            .header(USERNAME_HEADER, "lead");
        if let Some(groups) = groups {
            builder = builder.header(GROUPS_HEADER, groups);
        }
        let body = match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        };
        builder.body(body).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn new_task() -> Value {
        json!({
            "title": "Ride app",
            "description": "Build it",
            "assignedTo": ["old@x.io", "new@x.io"],
            "deadline": "2026-11-01T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn create_then_list_tasks() {
        let h = harness();
        let (status, headers, body) = send(
            &h.app,
            request(Method::POST, "/tasks", Some("admin"), Some(new_task())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Task created");
        assert_eq!(body["task"]["status"], "pending");
        assert_eq!(body["task"]["createdBy"], "lead");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST,OPTIONS");
        assert_eq!(h.mailer.sent().len(), 1);

        let (status, headers, body) =
            send(&h.app, request(Method::GET, "/tasks", Some("admin"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET,OPTIONS");
    }

    #[tokio::test]
    async fn non_admin_create_is_forbidden() {
        let h = harness();
        let (status, headers, body) = send(
            &h.app,
            request(Method::POST, "/tasks", Some("staff"), Some(new_task())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Only admins can create tasks.");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn missing_identity_is_forbidden() {
        let h = harness();
        let req = Request::builder()
            .method(Method::GET)
            .uri("/tasks")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Missing caller identity");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let h = harness();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/goals")
            .header(SUBJECT_HEADER, "sub-dev")
            .header(EMAIL_HEADER, "dev@x.io")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, headers, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST,OPTIONS");
    }

    #[tokio::test]
    async fn status_update_validates_and_acknowledges() {
        let h = harness();
        let (_, _, created) = send(
            &h.app,
            request(Method::POST, "/tasks", Some("admin"), Some(new_task())),
        )
        .await;
        let uri = format!("/tasks/{}", created["task"]["taskId"].as_str().unwrap());

        let (status, _, body) = send(
            &h.app,
            request(Method::PUT, &uri, None, Some(json!({"status": "done"}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid status");

        let (status, headers, body) = send(
            &h.app,
            request(Method::PUT, &uri, None, Some(json!({"status": "in-progress"}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task status updated");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET,OPTIONS,PUT");

        let last = h.mailer.sent().pop().unwrap();
        assert_eq!(last.to, vec!["old@x.io", "new@x.io", "admin@x.io"]);
    }

    #[tokio::test]
    async fn goal_lifecycle() {
        let h = harness();
        let goal = json!({
            "title": "Wireframes",
            "description": "Sketch screens",
            "dueDate": "2026-11-05",
            "taskId": "t-1",
            "progress": 42.5
        });
        let (status, _, body) =
            send(&h.app, request(Method::POST, "/goals", None, Some(goal))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Goal created successfully");
        let goal_id = body["goalId"].as_str().unwrap().to_string();

        let (status, headers, body) =
            send(&h.app, request(Method::GET, "/tasks/t-1/goals", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["taskId"], "t-1");
        assert_eq!(body["goals"][0]["progress"], json!(42.5));
        assert_eq!(body["goals"][0]["assignee"], "lead@x.io");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST,OPTIONS");

        let (status, _, body) = send(&h.app, request(Method::GET, "/goals", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let update = json!({
            "action": "update",
            "goalId": goal_id,
            "title": "Wireframes v2",
            "description": "Sketch screens",
            "dueDate": "2026-11-06",
            "taskId": "t-1",
            "progress": 80
        });
        let (status, _, body) =
            send(&h.app, request(Method::POST, "/goals", None, Some(update))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Goal updated successfully");

        let uri = format!("/goals/{goal_id}");
        for _ in 0..2 {
            let (status, headers, body) =
                send(&h.app, request(Method::DELETE, &uri, None, None)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], format!("Goal {goal_id} deleted successfully"));
            assert_eq!(
                headers[header::ACCESS_CONTROL_ALLOW_METHODS],
                "POST,DELETE,OPTIONS"
            );
        }
    }

    #[tokio::test]
    async fn delete_route_rejects_other_verbs() {
        let h = harness();
        let (status, _, body) =
            send(&h.app, request(Method::POST, "/goals/g-1", None, None)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn unserved_verbs_get_json_and_cors() {
        let h = harness();
        for (method, uri, allowed) in [
            (Method::DELETE, "/tasks", "GET,OPTIONS,POST"),
            (Method::PATCH, "/tasks/t-1", "GET,OPTIONS,PUT"),
            (Method::DELETE, "/tasks/t-1/goals", "POST,OPTIONS"),
            (Method::PUT, "/goals", "GET,OPTIONS,POST"),
        ] {
            let (status, headers, body) = send(&h.app, request(method, uri, None, None)).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
            assert_eq!(body["error"], "Method Not Allowed");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], allowed);
        }
    }

    #[tokio::test]
    async fn update_of_unknown_goal_is_not_found() {
        let h = harness();
        let update = json!({
            "action": "update",
            "goalId": "ghost",
            "title": "x",
            "description": "y",
            "dueDate": "2026-11-06",
            "taskId": "t-1"
        });
        let (status, _, _) =
            send(&h.app, request(Method::POST, "/goals", None, Some(update))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preflight_is_answered() {
        let h = harness();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/tasks")
            .header(header::ORIGIN, "https://app.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
