//! JSON-RPC client for the payroll record service
//!
//! `JsonRpcClient` speaks the service's web JSON-RPC dialect; this module
//! plugs it into the core as a `RecordService` and a `ReportRenderer`.

pub mod client;
pub mod error;

use async_trait::async_trait;
use payslip_portal_core::{CoreResult, Domain, RecordService, RenderedDocument, ReportRenderer};
use serde_json::{json, Value};

pub use client::JsonRpcClient;
pub use error::{RpcError, RpcResult};

#[async_trait]
impl RecordService for JsonRpcClient {
    async fn search_read(
        &self,
        model: &str,
        domain: &Domain,
        fields: &[&str],
    ) -> CoreResult<Vec<Value>> {
        let result = self
            .call_kw(
                model,
                "search_read",
                vec![domain.to_value()],
                json!({ "fields": fields }),
            )
            .await
            .map_err(|e| e.into_fetch(model))?;

        match result {
            Value::Array(rows) => Ok(rows),
            other => Err(RpcError::InvalidResponse(format!(
                "search_read returned {}",
                other
            ))
            .into_fetch(model)),
        }
    }

    async fn call(&self, model: &str, method: &str, args: Vec<Value>) -> CoreResult<Value> {
        self.call_kw(model, method, args, json!({}))
            .await
            .map_err(|e| e.into_fetch(model))
    }
}

#[async_trait]
impl ReportRenderer for JsonRpcClient {
    async fn render_report(&self, report_name: &str, ids: &[i64]) -> CoreResult<RenderedDocument> {
        let (bytes, content_type) = self
            .download_report(report_name, ids)
            .await
            .map_err(RpcError::into_action)?;

        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let extension = if content_type.starts_with("application/pdf") {
            "pdf"
        } else {
            "bin"
        };
        Ok(RenderedDocument {
            filename: payslip_portal_utils::document_filename(
                &format!("{}-{}", report_name, ids.join("-")),
                extension,
            ),
            content_type,
            bytes,
        })
    }
}
