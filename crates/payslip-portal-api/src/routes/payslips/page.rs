//! Payslip page rendering - Full page endpoints

use crate::{page_response, AppState};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use payslip_portal_core::PortalState;
use payslip_portal_utils::{escape_html, format_period};

/// Payslips page: year selector plus the list of the selected year
pub async fn page_payslips(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match state.session_for(&headers).await {
        Ok(session) => session,
        Err(err) => return render_error_page(&headers, err.status(), &err.user_message()),
    };

    let view_state = session.view().state();
    let title = view_state
        .selected_year()
        .map(|year| format!("Working year {}", year.name))
        .unwrap_or_else(|| "Payslips".to_string());
    let content = format!(
        r#"<div class='flex items-center justify-between mb-6'>
    <h1 class='text-2xl font-semibold'>My Payslips</h1>
    <div class='flex items-center gap-2'>
        <label for='year-select' class='text-sm text-gray-600'>Working year</label>
        {}
        <span id='payslip-indicator' class='htmx-indicator text-sm text-gray-500'>Loading...</span>
    </div>
</div>
<div id='payslip-panel'>{}</div>"#,
        render_year_select(&view_state),
        render_payslip_panel(&view_state, None)
    );

    Html(page_response(&headers, &title, &content)).into_response()
}

/// Year selector; a change reloads the payslip panel
pub fn render_year_select(state: &PortalState) -> String {
    if state.years.is_empty() {
        return "<span class='text-sm text-gray-500'>No working year</span>".to_string();
    }

    let options: String = state
        .years
        .iter()
        .map(|year| {
            let selected = if state.selected_year_id == Some(year.id) {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value='{}'{}>{}</option>",
                year.id,
                selected,
                escape_html(&year.name)
            )
        })
        .collect();

    format!(
        r#"<select id='year-select' name='year' class='border rounded px-2 py-1'
        hx-get='/payslips/list' hx-trigger='change' hx-target='#payslip-panel'
        hx-indicator='#payslip-indicator'>{}</select>"#,
        options
    )
}

/// Payslip list of the selected year, with an optional alert on top
///
/// Falls back to `state.error` when no alert is given.
pub fn render_payslip_panel(state: &PortalState, alert: Option<&str>) -> String {
    let mut html = String::new();

    if let Some(message) = alert.or(state.error.as_deref()) {
        html.push_str(&format!(
            "<div class='mb-4 p-3 rounded bg-red-50 text-red-700 text-sm' role='alert'>{}</div>",
            escape_html(message)
        ));
    }

    if state.years.is_empty() {
        html.push_str(
            "<p class='text-gray-500'>No working year is available yet.</p>",
        );
        return html;
    }

    if state.payslips.is_empty() {
        html.push_str(
            "<p class='text-gray-500'>No finalized payslip for this working year.</p>",
        );
        return html;
    }

    html.push_str("<ul class='divide-y bg-white rounded shadow'>");
    for payslip in &state.payslips {
        html.push_str(&format!(
            r#"<li><a href='/payslips/{id}/print' target='_blank' data-payslip-id='{id}'
        class='flex justify-between px-4 py-3 hover:bg-gray-50'>
    <span class='font-medium'>{name}</span>
    <span class='text-sm text-gray-500'>{period}</span>
</a></li>"#,
            id = payslip.id,
            name = escape_html(&payslip.name),
            period = format_period(payslip.period_start, payslip.period_end)
        ));
    }
    html.push_str("</ul>");
    html
}

/// Error page, or bare alert for HTMX requests
pub fn render_error_page(headers: &HeaderMap, status: StatusCode, message: &str) -> Response {
    let content = format!(
        r#"<div class='p-4 rounded bg-red-50 text-red-700' role='alert'>
    <p class='font-semibold'>Something went wrong</p>
    <p class='text-sm'>{}</p>
    <a href='/payslips' class='text-sm underline'>Back to payslips</a>
</div>"#,
        escape_html(message)
    );
    (status, Html(page_response(headers, "Error", &content))).into_response()
}
