//! HTTP server with HTMX support for the payslip portal
//!
//! Routes are organized into modules:
//! - routes::payslips: year selector, payslip list, document download
//!
//! Each route module has the same layout:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints
//! - page.rs: HTMX page rendering

pub mod error;
pub mod executor;
pub mod routes;
pub mod session;

use axum::http::{HeaderMap, HeaderValue};
use axum::response::Redirect;
use axum::{
    routing::{get, post},
    Router,
};
use payslip_portal_config::{Config, PortalConfig};
use payslip_portal_core::{CoreError, RecordServiceRef, ReportRenderer, ViewSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use error::{ApiError, ApiResult};
pub use executor::ReportActionExecutor;
pub use session::{PortalSession, SessionRegistry};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Wire the record service and report renderer into a session registry
    pub fn new(
        config: Config,
        service: RecordServiceRef,
        renderer: Arc<dyn ReportRenderer>,
    ) -> Self {
        let executor = Arc::new(ReportActionExecutor::new(renderer, &config.backend.url));
        let idle_timeout = match config.portal.session_idle_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let sessions = SessionRegistry::new(
            service,
            executor,
            view_settings(&config.portal),
            idle_timeout,
        );
        Self {
            config,
            sessions: Arc::new(sessions),
        }
    }

    /// Session of the user making the request
    pub async fn session_for(&self, headers: &HeaderMap) -> ApiResult<Arc<PortalSession>> {
        let user_id = resolve_user(headers, &self.config.portal)?;
        Ok(self.sessions.get(user_id).await?)
    }
}

/// View settings taken from the portal section
pub fn view_settings(portal: &PortalConfig) -> ViewSettings {
    ViewSettings {
        year_model: portal.year_model.clone(),
        payslip_model: portal.payslip_model.clone(),
        payslip_state: portal.payslip_state.clone(),
        print_method: portal.print_method.clone(),
    }
}

/// User id from the identity header, else the configured default
pub fn resolve_user(headers: &HeaderMap, portal: &PortalConfig) -> ApiResult<i64> {
    match headers.get(portal.user_header.as_str()) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or_else(|| ApiError::BadRequest {
                message: format!("Header {} must hold a user id", portal.user_header),
            }),
        None => portal
            .default_user_id
            .ok_or(ApiError::Core(CoreError::Unauthorized)),
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::payslips::{
        api_reload, api_set_year, api_state, htmx_payslips_list, page_payslips, print_payslip,
    };

    let cors = cors_layer(&state.config.server.cors_origins);

    let router = Router::new()
        // API endpoints
        .route("/api/health", get(health_check))
        .route("/api/state", get(api_state))
        .route("/api/year", post(api_set_year))
        .route("/api/reload", post(api_reload))
        // HTMX page routes
        .route("/", get(index_page))
        .route("/payslips", get(page_payslips))
        // HTMX partial routes
        .route("/payslips/list", get(htmx_payslips_list))
        .route("/payslips/:id/print", get(print_payslip))
        .with_state(state);

    match cors {
        Some(layer) => router.layer(layer),
        None => router,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }
    Some(CorsLayer::new().allow_origin(AllowOrigin::list(origins)))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn index_page() -> Redirect {
    Redirect::to("/payslips")
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Payslips</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
    </style>
    <script>
        // Error panels carry the last known list, so swap them in too
        document.addEventListener('htmx:beforeSwap', function (evt) {{
            var status = evt.detail.xhr.status;
            if (status === 400 || status === 502) {{
                evt.detail.shouldSwap = true;
                evt.detail.isError = false;
            }}
        }});
    </script>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        payslip_portal_utils::escape_html(title),
        content
    )
}

pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}

/// Full page for normal requests, bare content for HTMX requests
pub fn page_response(headers: &HeaderMap, title: &str, inner_content: &str) -> String {
    if is_htmx_request(headers) {
        inner_content.to_string()
    } else {
        base_html(
            title,
            &format!(
                r#"<main class='max-w-3xl mx-auto p-6'>{}</main>"#,
                inner_content
            ),
        )
    }
}

/// Start the server and run until Ctrl-C
pub async fn start_server(state: AppState) -> std::io::Result<()> {
    let addr = state.config.bind_address();
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting payslip portal on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - /payslips (Payslip list)");
    log::info!("  - /api/* (JSON API endpoints)");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

// ==================== Tests ====================

#[cfg(test)]
mod tests;
