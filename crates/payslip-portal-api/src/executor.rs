//! Turns action descriptors into something a browser can follow

use async_trait::async_trait;
use payslip_portal_core::{
    ActionDescriptor, ActionExecutor, ActionOutcome, CoreError, CoreResult, ReportRenderer,
};
use std::sync::Arc;

const REPORT_ACTION: &str = "ir.actions.report";
const URL_ACTION: &str = "ir.actions.act_url";
const PDF_REPORT: &str = "qweb-pdf";

/// Executes report and URL actions on behalf of the browser
pub struct ReportActionExecutor {
    renderer: Arc<dyn ReportRenderer>,
    backend_url: String,
}

impl ReportActionExecutor {
    /// `backend_url` anchors the relative URLs of URL actions
    pub fn new(renderer: Arc<dyn ReportRenderer>, backend_url: &str) -> Self {
        Self {
            renderer,
            backend_url: backend_url.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Absolute form of a URL returned by the backend
    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.backend_url, url)
        } else {
            format!("{}/{}", self.backend_url, url)
        }
    }
}

#[async_trait]
impl ActionExecutor for ReportActionExecutor {
    async fn execute(&self, descriptor: &ActionDescriptor) -> CoreResult<ActionOutcome> {
        match descriptor.action_type() {
            REPORT_ACTION => {
                let report_type = descriptor.report_type().unwrap_or(PDF_REPORT);
                if report_type != PDF_REPORT {
                    return Err(CoreError::NotSupported {
                        operation: format!("{} report", report_type),
                    });
                }
                let report_name = descriptor
                    .report_name()
                    .ok_or_else(|| CoreError::action("report action without report_name"))?;
                let ids = descriptor.record_ids();
                if ids.is_empty() {
                    return Err(CoreError::action("report action without records"));
                }

                log::info!("Rendering {} for {:?}", report_name, ids);
                let document = self.renderer.render_report(report_name, &ids).await?;
                Ok(ActionOutcome::Document(document))
            }
            URL_ACTION => descriptor
                .url()
                .map(|url| ActionOutcome::Redirect(self.resolve_url(url)))
                .ok_or_else(|| CoreError::action("URL action without url")),
            other => Err(CoreError::NotSupported {
                operation: other.to_string(),
            }),
        }
    }
}
