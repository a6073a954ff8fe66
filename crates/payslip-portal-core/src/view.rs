//! The payslip view: a year selector over the employee's finalized payslips
//!
//! State is kept behind a lock that is never held across a remote call, so
//! the handlers take `&self` and may overlap. Every payslip fetch is tagged
//! with a generation number; a response whose generation is no longer the
//! latest is dropped instead of overwriting newer state.

use crate::domain::payslip_domain;
use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::models::{
    decode_rows, ActionDescriptor, ActionOutcome, Payslip, PortalState, WorkingYear,
    PAYSLIP_FIELDS, WORKING_YEAR_FIELDS,
};
use crate::service::{ActionExecutorRef, RecordServiceRef, StateObserver, UserIdentityRef};
use crate::Domain;
use serde_json::Value;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Names of the remote models and methods the view talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSettings {
    pub year_model: String,
    pub payslip_model: String,
    pub payslip_state: String,
    pub print_method: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            year_model: "hr.working_year".to_string(),
            payslip_model: "hr.payslip".to_string(),
            payslip_state: "done".to_string(),
            print_method: "action_print_payslip".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct ViewInner {
    state: PortalState,
    /// Bumped on every payslip fetch; only the latest may write results
    generation: u64,
}

pub struct PortalPayslipView {
    service: RecordServiceRef,
    executor: ActionExecutorRef,
    user: UserIdentityRef,
    settings: ViewSettings,
    inner: RwLock<ViewInner>,
    observers: RwLock<Vec<StateObserver>>,
}

impl PortalPayslipView {
    pub fn new(
        service: RecordServiceRef,
        executor: ActionExecutorRef,
        user: UserIdentityRef,
        settings: ViewSettings,
    ) -> Self {
        Self {
            service,
            executor,
            user,
            settings,
            inner: RwLock::new(ViewInner::default()),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user.user_id()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PortalState {
        self.read_inner().state.clone()
    }

    /// Register a callback run after every state change
    pub fn subscribe(&self, observer: StateObserver) {
        self.observers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }

    /// Fetch the year list, select the first year and load its payslips
    pub async fn initialize(&self) -> CoreResult<()> {
        self.update(|state| state.loading = true);

        let model = self.settings.year_model.as_str();
        let fetched = self
            .service
            .search_read(model, &Domain::new(), WORKING_YEAR_FIELDS)
            .await
            .and_then(|rows| decode_rows::<WorkingYear>(model, rows));

        let years = match fetched {
            Ok(years) => years,
            Err(err) => {
                self.update(|state| {
                    state.loading = false;
                    state.error = Some(err.user_message());
                });
                self.report(&err, "initialize");
                return Err(err);
            }
        };

        log::info!(
            "User {}: {} working year(s) available",
            self.user_id(),
            years.len()
        );

        let selected = years.first().map(|y| y.id);
        self.update(|state| {
            state.years = years;
            state.selected_year_id = selected;
            state.error = None;
            if selected.is_none() {
                state.loading = false;
            }
        });

        match selected {
            Some(_) => self.load_payslips().await,
            None => Ok(()),
        }
    }

    /// Re-read the finalized payslips of the selected year
    pub async fn load_payslips(&self) -> CoreResult<()> {
        let claimed = {
            let mut inner = self.write_inner();
            match inner.state.selected_year_id {
                Some(year_id) => {
                    inner.generation += 1;
                    inner.state.loading = true;
                    Some((inner.generation, year_id, inner.state.clone()))
                }
                None => None,
            }
        };
        let Some((generation, year_id, snapshot)) = claimed else {
            return Err(CoreError::InvalidSelection {
                value: String::new(),
                reason: "no year selected".to_string(),
            });
        };
        self.notify(&snapshot);

        let model = self.settings.payslip_model.as_str();
        let domain = payslip_domain(self.user_id(), year_id, &self.settings.payslip_state);
        log::debug!(
            "Loading payslips for year {} (request {})",
            year_id,
            generation
        );

        let fetched = self
            .service
            .search_read(model, &domain, PAYSLIP_FIELDS)
            .await
            .and_then(|rows| decode_rows::<Payslip>(model, rows));

        let applied = {
            let mut inner = self.write_inner();
            if inner.generation != generation {
                None
            } else {
                inner.state.loading = false;
                match &fetched {
                    Ok(payslips) => {
                        inner.state.payslips = payslips.clone();
                        inner.state.error = None;
                    }
                    Err(err) => inner.state.error = Some(err.user_message()),
                }
                Some(inner.state.clone())
            }
        };

        let Some(snapshot) = applied else {
            log::debug!(
                "Discarding stale payslip response for year {} (request {})",
                year_id,
                generation
            );
            return Ok(());
        };
        self.notify(&snapshot);

        match fetched {
            Ok(payslips) => {
                log::debug!("Year {}: {} payslip(s)", year_id, payslips.len());
                Ok(())
            }
            Err(err) => {
                self.report(&err, "load_payslips");
                Err(err)
            }
        }
    }

    /// Handle a raw value from the year selector
    pub async fn on_year_change(&self, raw: &str) -> CoreResult<()> {
        let year_id = match self.parse_year(raw) {
            Ok(id) => id,
            Err(err) => {
                self.report(&err, "on_year_change");
                return Err(err);
            }
        };

        self.update(|state| state.selected_year_id = Some(year_id));
        self.load_payslips().await
    }

    /// Generate the printable document of a payslip and hand it to the host
    pub async fn on_payslip_click(&self, payslip_id: i64) -> CoreResult<Option<ActionOutcome>> {
        if !self.read_inner().state.payslips.iter().any(|p| p.id == payslip_id) {
            let err = CoreError::UnknownPayslip { id: payslip_id };
            self.report(&err, "on_payslip_click");
            return Err(err);
        }

        match self.print(payslip_id).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.update(|state| state.error = Some(err.user_message()));
                self.report(&err, "on_payslip_click");
                Err(err)
            }
        }
    }

    async fn print(&self, payslip_id: i64) -> CoreResult<Option<ActionOutcome>> {
        let result = self
            .service
            .call(
                &self.settings.payslip_model,
                &self.settings.print_method,
                vec![Value::from(payslip_id)],
            )
            .await
            .map_err(|err| match err {
                CoreError::FetchFailure { message, .. } => CoreError::ActionFailure { message },
                other => other,
            })?;

        let Some(descriptor) = ActionDescriptor::from_result(result)? else {
            log::info!("Payslip {}: print returned no action", payslip_id);
            return Ok(None);
        };

        log::debug!(
            "Payslip {}: executing {} action",
            payslip_id,
            descriptor.action_type()
        );
        self.executor.execute(&descriptor).await.map(Some)
    }

    fn parse_year(&self, raw: &str) -> CoreResult<i64> {
        let value = raw.trim();
        let year_id = value
            .parse::<i64>()
            .map_err(|_| CoreError::InvalidSelection {
                value: value.to_string(),
                reason: "not an integer".to_string(),
            })?;

        if !self.read_inner().state.has_year(year_id) {
            return Err(CoreError::InvalidSelection {
                value: value.to_string(),
                reason: "unknown working year".to_string(),
            });
        }
        Ok(year_id)
    }

    fn update(&self, mutate: impl FnOnce(&mut PortalState)) {
        let snapshot = {
            let mut inner = self.write_inner();
            mutate(&mut inner.state);
            inner.state.clone()
        };
        self.notify(&snapshot);
    }

    fn notify(&self, snapshot: &PortalState) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for observer in observers {
            observer(snapshot);
        }
    }

    fn report(&self, err: &CoreError, operation: &str) {
        let context = ErrorContext::new(operation).with_user_id(self.user_id());
        DefaultErrorLogger.log_error(err, &context);
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, ViewInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, ViewInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

// ==================== Tests ====================
