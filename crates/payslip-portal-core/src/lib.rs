//! Core of the payslip portal
//!
//! - models: working years, payslips, view state, action descriptors
//! - domain: conjunctive filters sent with bulk reads
//! - service: the collaborators injected into the view
//! - view: `PortalPayslipView`, the year selector and payslip list

pub mod domain;
pub mod error;
pub mod models;
pub mod service;
pub mod view;

pub use domain::{payslip_domain, Condition, Domain};
pub use error::{CoreError, CoreResult, ErrorCode, ErrorSeverity};
pub use models::{
    ActionDescriptor, ActionOutcome, Payslip, PortalState, RenderedDocument, WorkingYear,
};
pub use service::{
    ActionExecutor, ActionExecutorRef, FixedUser, RecordService, RecordServiceRef,
    ReportRenderer, StateObserver, UserIdentity, UserIdentityRef,
};
pub use view::{PortalPayslipView, ViewSettings};
