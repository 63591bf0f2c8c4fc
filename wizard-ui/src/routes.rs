//! HTTP route handlers: the HTML form under `/form` and the JSON API.

use std::fmt::Display;

use axum::Router;
use axum::extract::{Form, Path, Query, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum::routing::get;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};
use wizard::core::actions::ActionKind;
use wizard::core::descriptors::StepDescriptor;
use wizard::form::{StepTab, Submission};
use wizard::io::session::MemorySession;
use wizard::{Field, FieldData, FieldKind, FormError, StepOutcome};

use crate::pages::{FormPage, field_views};
use crate::state::{AppState, SESSION_COOKIE, new_session_id, session_id_from_cookie};

/// Path the form is mounted at; also the form's base action.
pub const FORM_PATH: &str = "/form";

/// Build the HTML form router.
pub fn form_router() -> Router<AppState> {
    Router::new()
        .route(FORM_PATH, get(show_form).post(submit_form))
        .route("/form/gotoStep", get(goto_step))
        .route("/form/gotoStep/", get(goto_step))
        .route("/form/done", get(done))
}

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/steps", get(get_steps))
        .route("/data", get(get_data))
        .route("/submissions", get(list_submissions))
        .route("/submissions/{index}/tabs", get(get_submission_tabs))
}

#[derive(Debug, Default, Deserialize)]
pub struct StepQuery {
    step: Option<u32>,
}

/// Cookie value of this request, or a fresh one to hand out.
struct VisitorId {
    id: String,
    is_new: bool,
}

impl VisitorId {
    fn from_headers(headers: &HeaderMap) -> Self {
        match existing_session_id(headers) {
            Some(id) => Self {
                id: id.to_string(),
                is_new: false,
            },
            None => Self {
                id: new_session_id(),
                is_new: true,
            },
        }
    }

    fn attach(&self, mut response: Response) -> Response {
        if !self.is_new {
            return response;
        }
        let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
        response
    }
}

fn existing_session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(session_id_from_cookie)
}

fn internal<E: Display>(err: E) -> StatusCode {
    error!(error = %err, "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// GET /form - render the current (or requested, if reached) step.
///
/// Read-only: unknown visitors see step 1 from an empty session and get no
/// map entry until they submit something.
async fn show_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StepQuery>,
) -> Result<Response, StatusCode> {
    let visitor_id = VisitorId::from_headers(&headers);
    let html = {
        let mut visitors = state.lock_visitors();
        match visitors.get_mut(&visitor_id.id) {
            Some(visitor) => {
                let message = visitor.flash.take();
                render_form(&state, &visitor.session, query.step, message)?
            }
            None => render_form(&state, &MemorySession::new(), query.step, None)?,
        }
    };
    Ok(visitor_id.attach(Html(html).into_response()))
}

fn render_form(
    state: &AppState,
    session: &MemorySession,
    requested: Option<u32>,
    message: Option<String>,
) -> Result<String, StatusCode> {
    let form = &state.form;
    let n = form.current_step(session, requested).map_err(internal)?;
    let step = form.step(n).map_err(internal)?;
    let values = form.form_data(session, n).map_err(internal)?;
    let steps = form.all_steps(session).map_err(internal)?;
    let page = FormPage {
        form_name: form.name(),
        title: step.title(),
        step: n,
        step_count: form.step_count(),
        steps: &steps,
        message,
        action: form.form_action(n),
        fields: field_views(&step.build_fields(), &values),
        actions: form.actions(n),
    };
    state.pages.form_page(&page).map_err(internal)
}

/// POST /form?step=n - run the submitted action, then redirect.
async fn submit_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StepQuery>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, StatusCode> {
    let visitor_id = VisitorId::from_headers(&headers);
    let action = pairs
        .iter()
        .find(|(key, _)| key == "action")
        .and_then(|(_, value)| ActionKind::parse(value))
        .unwrap_or(ActionKind::Next);

    let location = {
        let mut visitors = state.lock_visitors();
        let form = &state.form;
        match action {
            ActionKind::Prev => {
                // Going back on an empty session never moves.
                if let Some(visitor) = visitors.get_mut(&visitor_id.id) {
                    form.do_prev(&mut visitor.session, query.step)
                        .map_err(internal)?;
                }
                FORM_PATH.to_string()
            }
            ActionKind::Next => {
                let visitor = visitors.entry(visitor_id.id.clone()).or_default();
                let n = form
                    .current_step(&visitor.session, query.step)
                    .map_err(internal)?;
                let data = decode_form(&form.fields(n).map_err(internal)?, &pairs);
                match form
                    .do_next(&mut visitor.session, query.step, data)
                    .map_err(internal)?
                {
                    StepOutcome::Advanced { .. } => FORM_PATH.to_string(),
                    StepOutcome::Rejected { step, error } => {
                        visitor.flash = Some(error.message);
                        form.form_action(step)
                    }
                    StepOutcome::Completed { .. } => {
                        if visitor.session.is_empty() {
                            visitors.remove(&visitor_id.id);
                        }
                        "/form/done".to_string()
                    }
                }
            }
        }
    };
    debug!(action = action.as_str(), location = %location, "form submitted");
    Ok(visitor_id.attach(Redirect::to(&location).into_response()))
}

/// GET /form/gotoStep/?step=n - jump to a reached step.
async fn goto_step(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StepQuery>,
) -> Result<Response, StatusCode> {
    let visitor_id = VisitorId::from_headers(&headers);
    {
        let mut visitors = state.lock_visitors();
        // Unknown visitors have reached nothing, so there is nowhere to go.
        if let (Some(n), Some(visitor)) = (query.step, visitors.get_mut(&visitor_id.id)) {
            state
                .form
                .goto_step(&mut visitor.session, n)
                .map_err(internal)?;
        }
    }
    Ok(visitor_id.attach(Redirect::to(FORM_PATH).into_response()))
}

/// GET /form/done - shown after the last step completed.
async fn done(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let html = state
        .pages
        .done_page(state.form.name(), FORM_PATH)
        .map_err(internal)?;
    Ok(Html(html))
}

/// Turn browser form pairs into field data for `fields`.
///
/// Only declared fields are kept. Checkboxes become booleans (absent means
/// unchecked), number fields become JSON numbers when they parse.
pub fn decode_form(fields: &[Field], pairs: &[(String, String)]) -> FieldData {
    let mut data = FieldData::new();
    decode_into(fields, pairs, &mut data);
    data
}

fn decode_into(fields: &[Field], pairs: &[(String, String)], data: &mut FieldData) {
    for field in fields {
        if field.kind == FieldKind::Group {
            decode_into(&field.children, pairs, data);
            continue;
        }
        let raw = pairs
            .iter()
            .rev()
            .find(|(key, _)| *key == field.name)
            .map(|(_, value)| value.as_str());
        let value = match (field.kind, raw) {
            (FieldKind::Checkbox, raw) => {
                Value::Bool(matches!(raw, Some("on" | "true" | "1")))
            }
            (_, None) => continue,
            (FieldKind::Number, Some(raw)) => number_value(raw),
            (_, Some(raw)) => Value::from(raw),
        };
        data.insert(field.name.clone(), value);
    }
}

fn number_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| Value::from(raw), Value::Number)
}

async fn health() -> &'static str {
    "ok"
}

/// Run `f` against the requesting visitor's session (empty when unknown).
fn with_session<T>(
    state: &AppState,
    headers: &HeaderMap,
    f: impl FnOnce(&MemorySession) -> Result<T, FormError>,
) -> Result<T, StatusCode> {
    let empty = MemorySession::new();
    let visitors = state.lock_visitors();
    let session = existing_session_id(headers)
        .and_then(|id| visitors.get(id))
        .map_or(&empty, |visitor| &visitor.session);
    f(session).map_err(internal)
}

/// GET /api/steps - navigation list for the requesting visitor.
async fn get_steps(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<StepDescriptor>>, StatusCode> {
    with_session(&state, &headers, |session| state.form.all_steps(session)).map(Json)
}

/// GET /api/data - merged data the visitor submitted so far.
async fn get_data(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FieldData>, StatusCode> {
    with_session(&state, &headers, |session| state.form.merged_data(session)).map(Json)
}

/// GET /api/submissions - completed submissions, oldest first.
async fn list_submissions(State(state): State<AppState>) -> Json<Vec<Submission>> {
    Json(state.lock_submissions().clone())
}

/// GET /api/submissions/:index/tabs - one submission as read-only step tabs.
async fn get_submission_tabs(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<Vec<StepTab>>, StatusCode> {
    let submissions = state.lock_submissions();
    let submission = submissions.get(index).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(state.form.tabbed_fields(&submission.data)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::pages::PageRenderer;
    use axum::body::to_bytes;
    use serde_json::json;
    use wizard::definition::default_definition;

    fn app_state() -> AppState {
        let submissions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&submissions);
        let form = default_definition()
            .builder()
            .base_action(FORM_PATH)
            .on_complete(move |submission: &Submission| -> anyhow::Result<()> {
                sink.lock().expect("lock").push(submission.clone());
                Ok(())
            })
            .build()
            .expect("form");
        AppState::new(form, submissions, PageRenderer::new())
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn cookie_headers(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("{SESSION_COOKIE}={id}")).expect("header");
        headers.insert(COOKIE, value);
        headers
    }

    async fn submit(state: &AppState, id: &str, step: Option<u32>, items: &[(&str, &str)]) -> Response {
        submit_form(
            State(state.clone()),
            cookie_headers(id),
            Query(StepQuery { step }),
            Form(pairs(items)),
        )
        .await
        .expect("submit")
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .expect("location")
    }

    #[test]
    fn decode_keeps_declared_fields_and_types_values() {
        let fields = vec![
            Field::text("name", "Name"),
            Field::new("age", "Age", FieldKind::Number),
            Field::new("accept", "Accept", FieldKind::Checkbox),
            Field::group("address", "Address", vec![Field::text("city", "City")]),
        ];
        let data = decode_form(
            &fields,
            &pairs(&[("name", "Ada"), ("age", " 36 "), ("city", "Lyon"), ("action", "next"), ("extra", "x")]),
        );
        assert_eq!(
            Value::Object(data),
            json!({"name": "Ada", "age": 36, "accept": false, "city": "Lyon"})
        );
    }

    #[test]
    fn decode_keeps_unparseable_numbers_as_text() {
        let fields = vec![Field::new("age", "Age", FieldKind::Number)];
        let data = decode_form(&fields, &pairs(&[("age", "old")]));
        assert_eq!(data.get("age"), Some(&json!("old")));
    }

    #[tokio::test]
    async fn first_visit_hands_out_a_session_cookie() {
        let state = app_state();
        let response = show_form(State(state), HeaderMap::new(), Query(StepQuery::default()))
            .await
            .expect("page");
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("set-cookie");
        assert!(cookie.starts_with("wizard_session="));

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("Step 1 of 3: Account"));
    }

    #[tokio::test]
    async fn rejected_step_redirects_back_with_message() {
        let state = app_state();
        let response = submit(&state, "v1", None, &[("name", "Ada"), ("action", "next")]).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/form?step=1");
        assert!(response.headers().get(SET_COOKIE).is_none());

        let page = show_form(State(state.clone()), cookie_headers("v1"), Query(StepQuery::default()))
            .await
            .expect("page");
        let body = to_bytes(page.into_body(), usize::MAX).await.expect("body");
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("msf-error"));
        assert!(html.contains(r#"value="Ada""#));
    }

    #[tokio::test]
    async fn full_run_completes_and_exposes_tabs() {
        let state = app_state();
        let response = submit(
            &state,
            "v2",
            None,
            &[("name", "Ada"), ("email", "ada@example.com"), ("action", "next")],
        )
        .await;
        assert_eq!(location(&response), "/form");

        let back = submit(&state, "v2", None, &[("action", "prev")]).await;
        assert_eq!(location(&back), "/form");
        goto_step(State(state.clone()), cookie_headers("v2"), Query(StepQuery { step: Some(2) }))
            .await
            .expect("goto");

        submit(&state, "v2", None, &[("city", "Lyon"), ("action", "next")]).await;
        let finished = submit(&state, "v2", None, &[("accept", "on"), ("action", "next")]).await;
        assert_eq!(location(&finished), "/form/done");

        let Json(submissions) = list_submissions(State(state.clone())).await;
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].data.get("accept"), Some(&json!(true)));

        let Json(tabs) = get_submission_tabs(State(state.clone()), Path(0))
            .await
            .expect("tabs");
        assert_eq!(tabs[1].tab, "Root.Step2");
        let missing = get_submission_tabs(State(state.clone()), Path(5)).await;
        assert_eq!(missing.err(), Some(StatusCode::NOT_FOUND));

        let Json(data) = get_data(State(state.clone()), cookie_headers("v2"))
            .await
            .expect("data");
        assert!(data.is_empty(), "session is cleared after completion");
        assert!(state.lock_visitors().is_empty(), "finished visitor is dropped");
    }

    #[tokio::test]
    async fn prev_steps_back_from_the_displayed_step() {
        let state = app_state();
        submit(&state, "v3", None, &[("name", "Ada"), ("email", "ada@example.com")]).await;
        submit(&state, "v3", None, &[("city", "Lyon")]).await;
        goto_step(State(state.clone()), cookie_headers("v3"), Query(StepQuery { step: Some(1) }))
            .await
            .expect("goto");

        submit(&state, "v3", Some(3), &[("action", "prev")]).await;

        let Json(steps) = get_steps(State(state), cookie_headers("v3"))
            .await
            .expect("steps");
        assert!(steps[1].is_current);
    }

    #[tokio::test]
    async fn reads_and_unknown_sessions_leave_no_visitor_behind() {
        let state = app_state();
        for i in 0..50 {
            show_form(State(state.clone()), HeaderMap::new(), Query(StepQuery::default()))
                .await
                .expect("page");
            let forged = cookie_headers(&format!("forged{i}"));
            show_form(State(state.clone()), forged.clone(), Query(StepQuery { step: Some(2) }))
                .await
                .expect("page");
            goto_step(State(state.clone()), forged.clone(), Query(StepQuery { step: Some(1) }))
                .await
                .expect("goto");
            submit(&state, &format!("forged{i}"), None, &[("action", "prev")]).await;
        }
        assert!(state.lock_visitors().is_empty());

        submit(&state, "v4", None, &[("name", "Ada"), ("email", "ada@example.com")]).await;
        assert_eq!(state.lock_visitors().len(), 1);
    }

    #[tokio::test]
    async fn api_steps_for_unknown_visitor_start_at_step_one() {
        let state = app_state();
        let Json(steps) = get_steps(State(state), HeaderMap::new())
            .await
            .expect("steps");
        assert_eq!(steps.len(), 3);
        assert!(steps[0].is_current);
        assert!(steps[1].link.is_none());
    }
}
