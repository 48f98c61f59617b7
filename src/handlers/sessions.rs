//! Form-driven session pages. These act for the anonymous guest owner.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::{FormRejection, PathRejection},
        Path, State,
    },
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::handlers::uploads::read_file_field;
use crate::models::{Owner, SessionView, WorkoutEntry, WorkoutForm};
use crate::store::WorkoutStore;
use crate::uploads::UploadStore;

#[derive(Clone)]
pub struct SessionsState {
    pub store: Arc<dyn WorkoutStore>,
    pub uploads: UploadStore,
}

#[derive(Serialize)]
struct HomePage {
    sessions: Vec<SessionView>,
    files: Vec<String>,
}

#[derive(Serialize)]
struct SessionPage {
    session_title: String,
    workouts: Vec<WorkoutEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uploaded: Option<Option<String>>,
}

pub async fn index(State(state): State<SessionsState>) -> Result<Response> {
    let sessions = state.store.sessions(Owner::GUEST).await?;
    let files = state.uploads.list().await?;

    Ok(Json(HomePage {
        sessions: sessions.iter().map(SessionView::from).collect(),
        files,
    })
    .into_response())
}

pub async fn add_workout(
    State(state): State<SessionsState>,
    form: std::result::Result<Form<WorkoutForm>, FormRejection>,
) -> Result<Response> {
    let Form(form) = form?;
    let new = form.validate()?;

    let workout = state.store.add(Owner::GUEST, new).await?;
    tracing::debug!(title = %workout.session_title, exercise = %workout.exercise, "Added workout");

    Ok(Redirect::to("/").into_response())
}

pub async fn start_workout(
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Response> {
    let Path(session_title) = path?;
    Ok(Redirect::to(&session_path(&session_title)).into_response())
}

pub async fn show(
    State(state): State<SessionsState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Response> {
    let Path(session_title) = path?;
    let page = session_page(&state, session_title, None).await?;
    Ok(Json(page).into_response())
}

/// Attach a media file while viewing a session. Requests without a
/// multipart body or without a chosen file just show the session.
pub async fn attach_file(
    State(state): State<SessionsState>,
    path: std::result::Result<Path<String>, PathRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let Path(session_title) = path?;
    let uploaded = match multipart {
        Ok(mut multipart) => match read_file_field(&mut multipart).await? {
            Some((Some(filename), bytes)) if !filename.is_empty() => {
                let stored = state.uploads.save(Some(&filename), &bytes).await?;
                Some(stored.url)
            }
            _ => None,
        },
        Err(_) => None,
    };

    let page = session_page(&state, session_title, Some(uploaded)).await?;
    Ok(Json(page).into_response())
}

pub async fn delete_session(
    State(state): State<SessionsState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Response> {
    let Path(session_title) = path?;
    if !state
        .store
        .delete_session(Owner::GUEST, &session_title)
        .await?
    {
        return Err(AppError::NotFound("Session not found".to_string()));
    }

    tracing::info!(title = %session_title, "Deleted session");
    Ok(Redirect::to("/").into_response())
}

pub async fn delete_workout(
    State(state): State<SessionsState>,
    path: std::result::Result<Path<(String, usize)>, PathRejection>,
) -> Result<Response> {
    let Path((session_title, index)) = path?;
    state
        .store
        .delete_record(Owner::GUEST, &session_title, index)
        .await?;

    Ok(Redirect::to(&session_path(&session_title)).into_response())
}

async fn session_page(
    state: &SessionsState,
    session_title: String,
    uploaded: Option<Option<String>>,
) -> Result<SessionPage> {
    let workouts = state.store.list(Owner::GUEST, &session_title).await?;
    Ok(SessionPage {
        session_title,
        workouts: workouts.iter().map(WorkoutEntry::from).collect(),
        uploaded,
    })
}

// Everything outside the RFC 3986 unreserved set
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn session_path(session_title: &str) -> String {
    format!(
        "/workout-session/{}",
        utf8_percent_encode(session_title, PATH_SEGMENT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_path_encodes_title() {
        assert_eq!(session_path("Leg Day"), "/workout-session/Leg%20Day");
        assert_eq!(session_path("a/b?c"), "/workout-session/a%2Fb%3Fc");
        assert_eq!(session_path("Über"), "/workout-session/%C3%9Cber");
        assert_eq!(session_path("push-1_x.y~"), "/workout-session/push-1_x.y~");
    }
}
