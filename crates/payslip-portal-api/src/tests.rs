use super::*;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use payslip_portal_core::{CoreResult, Domain, RecordService, RenderedDocument};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tower::ServiceExt;

/// In-memory backend with two working years
#[derive(Default)]
struct FakeBackend {
    year_reads: AtomicUsize,
    fail_payslips: AtomicBool,
    print_result: Mutex<Option<Value>>,
    printed: Mutex<Vec<i64>>,
}

impl FakeBackend {
    fn payslips_of(year_id: i64) -> Vec<Value> {
        match year_id {
            1 => vec![json!({
                "id": 10,
                "name": "Salary Slip - January",
                "date_from": "2024-01-01",
                "date_to": "2024-01-31"
            })],
            2 => vec![json!({
                "id": 20,
                "name": "Salary Slip - December",
                "date_from": "2023-12-01",
                "date_to": "2023-12-31"
            })],
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl RecordService for FakeBackend {
    async fn search_read(
        &self,
        model: &str,
        domain: &Domain,
        _fields: &[&str],
    ) -> CoreResult<Vec<Value>> {
        if model == "hr.working_year" {
            self.year_reads.fetch_add(1, Ordering::SeqCst);
            return Ok(vec![
                json!({"id": 1, "name": "2024"}),
                json!({"id": 2, "name": "2023"}),
            ]);
        }
        if self.fail_payslips.load(Ordering::SeqCst) {
            return Err(CoreError::fetch(model, "connection refused"));
        }
        let year_id = domain
            .conditions()
            .iter()
            .find(|c| c.field == "year")
            .and_then(|c| c.value.as_i64())
            .unwrap_or_default();
        Ok(Self::payslips_of(year_id))
    }

    async fn call(&self, _model: &str, _method: &str, args: Vec<Value>) -> CoreResult<Value> {
        if let Some(id) = args.first().and_then(Value::as_i64) {
            self.printed.lock().unwrap().push(id);
        }
        let configured = self.print_result.lock().unwrap().clone();
        Ok(configured.unwrap_or_else(|| {
            json!({
                "type": "ir.actions.report",
                "report_name": "payroll.report_payslip",
                "report_type": "qweb-pdf",
                "context": {"active_ids": args}
            })
        }))
    }
}

struct FakeRenderer;

#[async_trait]
impl ReportRenderer for FakeRenderer {
    async fn render_report(&self, _report_name: &str, ids: &[i64]) -> CoreResult<RenderedDocument> {
        Ok(RenderedDocument {
            filename: format!("payslip-{}.pdf", ids[0]),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        })
    }
}

fn app_state(config: Config) -> (AppState, Arc<FakeBackend>) {
    let backend = Arc::new(FakeBackend::default());
    let state = AppState::new(config, backend.clone(), Arc::new(FakeRenderer));
    (state, backend)
}

fn setup(default_user: Option<i64>) -> (Router, Arc<FakeBackend>) {
    let mut config = Config::default();
    config.portal.default_user_id = default_user;
    let (state, backend) = app_state(config);
    (create_router(state), backend)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Portal-User", "7")
        .body(Body::empty())
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (router, _) = setup(None);
    let response = router
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn test_index_redirects_to_payslips() {
    let (router, _) = setup(None);
    let response = router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/payslips");
}

#[tokio::test]
async fn test_page_lists_first_year() {
    let (router, _) = setup(None);
    let response = router.oneshot(get("/payslips")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Working year 2024 - Payslips</title>"));
    assert!(html.contains("<option value='1' selected>2024</option>"));
    assert!(html.contains("Salary Slip - January"));
    assert!(!html.contains("Salary Slip - December"));
}

#[tokio::test]
async fn test_htmx_request_gets_fragment() {
    let (router, _) = setup(None);
    let request = Request::builder()
        .uri("/payslips")
        .header("X-Portal-User", "7")
        .header("HX-Request", "true")
        .body(Body::empty())
        .unwrap();
    let html = body_text(router.oneshot(request).await.unwrap()).await;
    assert!(!html.contains("<!DOCTYPE html>"));
    assert!(html.contains("id='payslip-panel'"));
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let (router, _) = setup(None);
    let response = router
        .oneshot(Request::builder().uri("/api/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_default_user_is_used_without_header() {
    let (router, _) = setup(Some(3));
    let response = router
        .oneshot(Request::builder().uri("/api/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_identity_is_bad_request() {
    let (router, _) = setup(Some(3));
    let request = Request::builder()
        .uri("/api/state")
        .header("X-Portal-User", "admin")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_year_change_partial() {
    let (router, _) = setup(None);
    let response = router.oneshot(get("/payslips/list?year=2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Salary Slip - December"));
    assert!(!html.contains("Salary Slip - January"));
}

#[tokio::test]
async fn test_invalid_year_keeps_list() {
    let (router, _) = setup(None);
    let response = router.oneshot(get("/payslips/list?year=abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = body_text(response).await;
    assert!(html.contains("Please choose a year from the list."));
    assert!(html.contains("Salary Slip - January"));
}

#[tokio::test]
async fn test_fetch_failure_is_bad_gateway() {
    let (router, backend) = setup(None);
    router.clone().oneshot(get("/payslips")).await.unwrap();
    backend.fail_payslips.store(true, Ordering::SeqCst);

    let response = router.oneshot(get("/payslips/list?year=2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let html = body_text(response).await;
    assert!(html.contains("Payslips could not be loaded."));
    assert!(html.contains("Salary Slip - January"));
}

#[tokio::test]
async fn test_print_streams_pdf_inline() {
    let (router, backend) = setup(None);
    let response = router.oneshot(get("/payslips/10/print")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"payslip-10.pdf\""
    );
    assert_eq!(body_text(response).await, "%PDF-1.4");
    assert_eq!(*backend.printed.lock().unwrap(), vec![10]);
}

#[tokio::test]
async fn test_print_unlisted_payslip_not_found() {
    let (router, backend) = setup(None);
    let response = router.oneshot(get("/payslips/20/print")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(backend.printed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_print_without_action_is_no_content() {
    let (router, backend) = setup(None);
    *backend.print_result.lock().unwrap() = Some(Value::Bool(false));
    let response = router.oneshot(get("/payslips/10/print")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_print_url_action_redirects_to_backend() {
    let (router, backend) = setup(None);
    *backend.print_result.lock().unwrap() = Some(json!({
        "type": "ir.actions.act_url",
        "url": "/web/content/99?download=true"
    }));
    let response = router.oneshot(get("/payslips/10/print")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "http://localhost:8069/web/content/99?download=true"
    );
}

#[tokio::test]
async fn test_api_state_and_year_change() {
    let (router, _) = setup(None);
    let response = router.clone().oneshot(get("/api/state")).await.unwrap();
    let state: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(state["selected_year_id"], 1);
    assert_eq!(state["loading"], false);

    let request = Request::builder()
        .method("POST")
        .uri("/api/year")
        .header("X-Portal-User", "7")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("year=2"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let state: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(state["selected_year_id"], 2);
    assert_eq!(state["payslips"][0]["id"], 20);
}

#[tokio::test]
async fn test_unknown_year_via_api_is_rejected() {
    let (router, _) = setup(None);
    let request = Request::builder()
        .method("POST")
        .uri("/api/year")
        .header("X-Portal-User", "7")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("year=99"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "INVALID_SELECTION");
}

#[tokio::test]
async fn test_reload_refetches_years() {
    let (router, backend) = setup(None);
    router.clone().oneshot(get("/api/state")).await.unwrap();
    router.clone().oneshot(get("/api/state")).await.unwrap();
    assert_eq!(backend.year_reads.load(Ordering::SeqCst), 1);

    let request = Request::builder()
        .method("POST")
        .uri("/api/reload")
        .header("X-Portal-User", "7")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.year_reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_sessions_are_per_user() {
    let (router, backend) = setup(None);
    router.clone().oneshot(get("/api/state")).await.unwrap();
    let request = Request::builder()
        .uri("/api/state")
        .header("X-Portal-User", "8")
        .body(Body::empty())
        .unwrap();
    router.oneshot(request).await.unwrap();
    assert_eq!(backend.year_reads.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_idle_sessions_are_dropped() {
    let mut config = Config::default();
    config.portal.session_idle_secs = 60;
    let (state, backend) = app_state(config);

    state.sessions.get(1).await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;
    state.sessions.get(2).await.unwrap();
    assert_eq!(backend.year_reads.load(Ordering::SeqCst), 2);

    // user 1 went idle and starts over
    state.sessions.get(1).await.unwrap();
    assert_eq!(backend.year_reads.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_active_sessions_are_kept() {
    let mut config = Config::default();
    config.portal.session_idle_secs = 60;
    let (state, backend) = app_state(config);

    state.sessions.get(1).await.unwrap();
    tokio::time::advance(Duration::from_secs(45)).await;
    state.sessions.get(1).await.unwrap();
    tokio::time::advance(Duration::from_secs(45)).await;
    state.sessions.get(2).await.unwrap();
    state.sessions.get(1).await.unwrap();
    assert_eq!(backend.year_reads.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_idle_keeps_sessions() {
    let mut config = Config::default();
    config.portal.session_idle_secs = 0;
    let (state, backend) = app_state(config);

    state.sessions.get(1).await.unwrap();
    tokio::time::advance(Duration::from_secs(86_400)).await;
    state.sessions.get(2).await.unwrap();
    state.sessions.get(1).await.unwrap();
    assert_eq!(backend.year_reads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_resolve_user_prefers_header() {
    let mut portal = PortalConfig::default();
    portal.default_user_id = Some(3);
    let mut headers = HeaderMap::new();
    assert_eq!(resolve_user(&headers, &portal).unwrap(), 3);

    headers.insert("x-portal-user", HeaderValue::from_static(" 12 "));
    assert_eq!(resolve_user(&headers, &portal).unwrap(), 12);
}

#[test]
fn test_cors_layer_only_with_origins() {
    assert!(cors_layer(&[]).is_none());
    assert!(cors_layer(&["http://localhost:3000".to_string()]).is_some());
}
