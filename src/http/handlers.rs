use super::body::NoteBody;
use super::errors::ApiError;
use super::{AppState, UploadPage};
use crate::Note;
use crate::app::NoteService;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use log::info;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task;

const UPLOAD_FORM: &str = r#"<html>
  <body>
    <form action="/write" method="post">
      <label for="note_name">Note Name:</label>
      <input type="text" id="note_name" name="note_name"><br><br>
      <label for="note">Note Text:</label>
      <textarea id="note" name="note"></textarea><br><br>
      <button type="submit">Submit</button>
    </form>
  </body>
</html>
"#;

const UPLOAD_INSTRUCTIONS: &str = "Please use the POST /write endpoint to create a note.";

#[derive(Debug, Default, Deserialize)]
pub struct UpdateNoteBody {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateNoteBody {
    note_name: Option<String>,
    note: Option<String>,
}

/// Runs blocking storage work off the async executor
async fn with_service<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&NoteService) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(&state.service);
    task::spawn_blocking(move || f(&service))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::from)
}

/// `GET /notes/:name`
pub async fn read_note(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<String, ApiError> {
    let note = with_service(&state, move |service| service.read_note(&name)).await?;
    Ok(note.text.unwrap_or_default())
}

/// `GET /notes`
pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = with_service(&state, NoteService::list_notes).await?;
    Ok(Json(notes))
}

/// `PUT /notes/:name`
pub async fn update_note(
    State(state): State<AppState>,
    Path(name): Path<String>,
    NoteBody(body): NoteBody<UpdateNoteBody>,
) -> Result<&'static str, ApiError> {
    with_service(&state, move |service| service.update_note(&name, body.text)).await?;
    Ok("Note updated")
}

/// `DELETE /notes/:name`
pub async fn delete_note(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<&'static str, ApiError> {
    with_service(&state, move |service| service.delete_note(&name)).await?;
    Ok("Note deleted")
}

/// `POST /write`
pub async fn create_note(
    State(state): State<AppState>,
    NoteBody(body): NoteBody<CreateNoteBody>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let CreateNoteBody { note_name, note } = body;
    let name = note_name.clone();
    with_service(&state, move |service| service.create_note(note_name, note)).await?;
    info!("Note created: {}", name.unwrap_or_default());
    Ok((StatusCode::CREATED, "Note created"))
}

/// `GET /UploadForm.html`
pub async fn upload_form(State(state): State<AppState>) -> Response {
    match state.upload_page {
        UploadPage::Form => Html(UPLOAD_FORM).into_response(),
        UploadPage::Instructions => UPLOAD_INSTRUCTIONS.into_response(),
    }
}
