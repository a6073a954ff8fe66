//! Collaborators the payslip view depends on
//!
//! The view never looks these up on its own; the host hands them over at
//! construction so tests can substitute in-memory fakes.

use crate::domain::Domain;
use crate::error::CoreResult;
use crate::models::{ActionDescriptor, ActionOutcome, PortalState, RenderedDocument};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Generic access to the remote record service
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Bulk filtered read returning only `fields`, in service order
    async fn search_read(
        &self,
        model: &str,
        domain: &Domain,
        fields: &[&str],
    ) -> CoreResult<Vec<Value>>;

    /// Invoke a named server-side method on `model`
    async fn call(&self, model: &str, method: &str, args: Vec<Value>) -> CoreResult<Value>;
}

/// Renders a server-side report into a file
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render_report(&self, report_name: &str, ids: &[i64]) -> CoreResult<RenderedDocument>;
}

/// Host facility that carries out an action descriptor
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, descriptor: &ActionDescriptor) -> CoreResult<ActionOutcome>;
}

/// Identity of the employee the view is rendered for
pub trait UserIdentity: Send + Sync {
    fn user_id(&self) -> i64;
}

/// A user id known up front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedUser(pub i64);

impl UserIdentity for FixedUser {
    fn user_id(&self) -> i64 {
        self.0
    }
}

/// Called with a snapshot after every state change
pub type StateObserver = Arc<dyn Fn(&PortalState) + Send + Sync>;

pub type RecordServiceRef = Arc<dyn RecordService>;
pub type ActionExecutorRef = Arc<dyn ActionExecutor>;
pub type UserIdentityRef = Arc<dyn UserIdentity>;
