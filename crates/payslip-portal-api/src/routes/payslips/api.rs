//! Payslip API endpoints - JSON API and HTMX partial responses

use super::page::{render_error_page, render_payslip_panel};
use crate::error::status_for;
use crate::{resolve_user, ApiResult, AppState};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use payslip_portal_core::{ActionOutcome, PortalState, RenderedDocument};

/// Raw value of the year selector
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct YearForm {
    #[serde(default)]
    pub year: String,
}

pub async fn api_state(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<PortalState>> {
    let session = state.session_for(&headers).await?;
    Ok(Json(session.view().state()))
}

pub async fn api_set_year(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<YearForm>,
) -> ApiResult<Json<PortalState>> {
    let session = state.session_for(&headers).await?;
    session.view().on_year_change(&form.year).await?;
    Ok(Json(session.view().state()))
}

/// Drop the caller's session and build it again from the backend
pub async fn api_reload(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<PortalState>> {
    let user_id = resolve_user(&headers, &state.config.portal)?;
    state.sessions.reset(user_id).await;
    let session = state.sessions.get(user_id).await?;
    Ok(Json(session.view().state()))
}

/// HTMX partial: payslip panel after a year change
///
/// Failures still render the panel with the last known list and an alert.
pub async fn htmx_payslips_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(form): Query<YearForm>,
) -> Response {
    let session = match state.session_for(&headers).await {
        Ok(session) => session,
        Err(err) => return render_error_page(&headers, err.status(), &err.user_message()),
    };

    match session.view().on_year_change(&form.year).await {
        Ok(()) => Html(render_payslip_panel(&session.view().state(), None)).into_response(),
        Err(err) => {
            let message = err.user_message();
            let panel = render_payslip_panel(&session.view().state(), Some(&message));
            (status_for(&err), Html(panel)).into_response()
        }
    }
}

/// Generate and deliver the printable document of one payslip
pub async fn print_payslip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(payslip_id): Path<i64>,
) -> Response {
    let session = match state.session_for(&headers).await {
        Ok(session) => session,
        Err(err) => return render_error_page(&headers, err.status(), &err.user_message()),
    };

    match session.view().on_payslip_click(payslip_id).await {
        Ok(Some(ActionOutcome::Document(document))) => document_response(document),
        Ok(Some(ActionOutcome::Redirect(url))) => Redirect::to(&url).into_response(),
        Ok(Some(ActionOutcome::Done)) | Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => render_error_page(&headers, status_for(&err), &err.user_message()),
    }
}

fn document_response(document: RenderedDocument) -> Response {
    let disposition = format!(
        "inline; filename=\"{}\"",
        document.filename.replace('"', "")
    );
    let mut response = document.bytes.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&document.content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}
