use axum::{
    Extension, Form,
    body::Body,
    extract::{Multipart, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::{
    auth::Session,
    dashboard,
    error::AppError,
    intake::{self, CandidateForm, ResumeUpload},
    state::AppState,
};

use super::template::{self, Notice};

// ── Chatbot ───────────────────────────────────────────────────────────────────

pub async fn get_chat(Extension(session): Extension<Session>) -> Response {
    Html(template::chat_page(&session, None, None).into_string()).into_response()
}

#[derive(Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub query: String,
}

pub async fn post_chat(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<ChatForm>,
) -> Result<Response, AppError> {
    if form.query.trim().is_empty() {
        return Ok(Html(template::chat_page(&session, None, None).into_string()).into_response());
    }

    let answer = state.chat.ask(&form.query).await?;
    let answer_html = render_markdown_safe(&answer);
    let page = template::chat_page(&session, Some(&form.query), Some(&answer_html));
    Ok(Html(page.into_string()).into_response())
}

// ── Candidate screening ───────────────────────────────────────────────────────

pub async fn get_screening(Extension(session): Extension<Session>) -> Response {
    Html(template::screening_page(&session, &CandidateForm::default(), &[]).into_string())
        .into_response()
}

pub async fn post_screening(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (form, resume) = read_screening_form(multipart).await?;

    match intake::submit(&state.store, form.clone(), resume).await {
        Ok(submission) => {
            let notices = [
                Notice::success("Candidate Information Saved"),
                Notice::info(format!(
                    "AI Suitability Score: {} (placeholder, not an assessment)",
                    submission.score
                )),
            ];
            let page = template::screening_page(&session, &CandidateForm::default(), &notices);
            Ok(Html(page.into_string()).into_response())
        }
        Err(e) if e.is_recoverable() => {
            let page = template::screening_page(&session, &form, &[Notice::warning(e.to_string())]);
            Ok(Html(page.into_string()).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Pull the candidate fields and the optional resume out of a multipart body.
/// A file input left empty arrives as a part with an empty file name.
async fn read_screening_form(
    mut multipart: Multipart,
) -> Result<(CandidateForm, Option<ResumeUpload>), AppError> {
    let mut form = CandidateForm::default();
    let mut resume = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "resume" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            if !file_name.is_empty() {
                resume = Some(ResumeUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "full_name" => form.full_name = value,
            "email" => form.email = value,
            "phone" => form.phone = value,
            "experience" => form.experience = value,
            "position" => form.position = value,
            "location" => form.location = value,
            "tech_stack" => form.tech_stack = value,
            other => tracing::debug!("Ignoring unexpected form field {other:?}"),
        }
    }

    Ok((form, resume))
}

// ── Profile ───────────────────────────────────────────────────────────────────

pub async fn get_profile(Extension(session): Extension<Session>) -> Response {
    Html(template::profile_page(&session).into_string()).into_response()
}

// ── Admin ─────────────────────────────────────────────────────────────────────

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppError> {
    let summary = dashboard::summary(&state.store).await?;
    Ok(Html(template::dashboard_page(&session, &summary).into_string()).into_response())
}

pub async fn get_candidates(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppError> {
    let candidates = state.store.load_candidates().await?;
    Ok(Html(template::candidates_page(&session, &candidates).into_string()).into_response())
}

#[derive(Deserialize)]
pub struct ResumeParam {
    pub name: String,
}

pub async fn get_resume(
    State(state): State<AppState>,
    Query(params): Query<ResumeParam>,
) -> Result<Response, AppError> {
    let path = state
        .store
        .open_resume(&params.name)
        .await?
        .ok_or(AppError::NotFound)?;

    let file = tokio::fs::File::open(&path).await?;
    let content_length = file.metadata().await?.len();

    let mime: &'static str = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let disposition = format!("attachment; filename*=UTF-8''{}", urlencoded(&file_name));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal(e.to_string()))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Render model output as markdown with raw HTML disabled, so an answer
/// cannot inject markup into the page.
fn render_markdown_safe(content: &str) -> String {
    let mut opts = markdown::Options::gfm();
    opts.compile.allow_dangerous_html = false;
    markdown::to_html_with_options(content, &opts).unwrap_or_else(|_| markdown::to_html(content))
}

/// Percent-encode a value for use in a URL query string or header parameter.
pub fn urlencoded(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, percent_encoding::NON_ALPHANUMERIC).to_string()
}
