//! Records mirrored from the record service and the view state built from them

use crate::error::{CoreError, CoreResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A selectable working (fiscal/payroll) year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingYear {
    pub id: i64,
    pub name: String,
}

/// One finalized payslip of the current employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payslip {
    pub id: i64,
    pub name: String,
    #[serde(rename = "date_from")]
    pub period_start: NaiveDate,
    #[serde(rename = "date_to")]
    pub period_end: NaiveDate,
}

/// Fields requested for working years
pub const WORKING_YEAR_FIELDS: &[&str] = &["id", "name"];

/// Fields requested for payslips
pub const PAYSLIP_FIELDS: &[&str] = &["id", "name", "date_from", "date_to"];

/// Decode rows returned by `search_read` into typed records
pub fn decode_rows<T>(model: &str, rows: Vec<Value>) -> CoreResult<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| CoreError::fetch(model, format!("malformed row: {}", e)))
        })
        .collect()
}

/// State owned by one payslip view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalState {
    pub years: Vec<WorkingYear>,
    pub selected_year_id: Option<i64>,
    pub payslips: Vec<Payslip>,
    pub loading: bool,
    /// User-visible message for the last failure
    pub error: Option<String>,
}

impl Default for PortalState {
    fn default() -> Self {
        Self {
            years: Vec::new(),
            selected_year_id: None,
            payslips: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

impl PortalState {
    pub fn has_year(&self, year_id: i64) -> bool {
        self.years.iter().any(|y| y.id == year_id)
    }

    pub fn selected_year(&self) -> Option<&WorkingYear> {
        self.selected_year_id
            .and_then(|id| self.years.iter().find(|y| y.id == id))
    }
}

/// Opaque instruction returned by the document generation method
///
/// The portal never interprets it beyond what the host executor needs to
/// pick a strategy; it is forwarded as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionDescriptor(Map<String, Value>);

impl ActionDescriptor {
    /// Interpret a raw method result.
    ///
    /// `null`, `false` and `{}` mean "nothing to do". Anything else must be
    /// an object with a string `type`.
    pub fn from_result(result: Value) -> CoreResult<Option<Self>> {
        match result {
            Value::Null | Value::Bool(false) => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Object(map) => {
                if map.get("type").and_then(Value::as_str).is_none() {
                    return Err(CoreError::action("action descriptor has no type"));
                }
                Ok(Some(Self(map)))
            }
            other => Err(CoreError::action(format!(
                "unexpected action result: {}",
                other
            ))),
        }
    }

    pub fn action_type(&self) -> &str {
        self.str_field("type").unwrap_or_default()
    }

    pub fn report_name(&self) -> Option<&str> {
        self.str_field("report_name")
    }

    pub fn report_type(&self) -> Option<&str> {
        self.str_field("report_type")
    }

    pub fn url(&self) -> Option<&str> {
        self.str_field("url")
    }

    /// Records the action applies to, from `context.active_ids`
    pub fn record_ids(&self) -> Vec<i64> {
        self.0
            .get("context")
            .and_then(|ctx| ctx.get("active_ids"))
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// A document rendered by the record service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// What the host did with an action descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Executed with nothing to hand back
    Done,
    /// Navigate to a URL
    Redirect(String),
    /// Deliver a rendered file
    Document(RenderedDocument),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payslip_uses_wire_field_names() {
        let rows = vec![json!({
            "id": 10,
            "name": "Salary Slip - Jan",
            "date_from": "2024-01-01",
            "date_to": "2024-01-31"
        })];
        let payslips: Vec<Payslip> = decode_rows("hr.payslip", rows).unwrap();
        assert_eq!(payslips[0].period_start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(payslips[0].period_end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_malformed_row_is_fetch_failure() {
        let rows = vec![json!({ "id": "x", "name": "2024" })];
        let err = decode_rows::<WorkingYear>("hr.working_year", rows).unwrap_err();
        assert!(matches!(err, CoreError::FetchFailure { ref model, .. } if model == "hr.working_year"));
    }

    #[test]
    fn test_empty_action_results() {
        assert_eq!(ActionDescriptor::from_result(Value::Null).unwrap(), None);
        assert_eq!(ActionDescriptor::from_result(json!(false)).unwrap(), None);
        assert_eq!(ActionDescriptor::from_result(json!({})).unwrap(), None);
    }

    #[test]
    fn test_malformed_action_results() {
        assert!(ActionDescriptor::from_result(json!(true)).is_err());
        assert!(ActionDescriptor::from_result(json!([1, 2])).is_err());
        assert!(ActionDescriptor::from_result(json!({ "report_name": "x" })).is_err());
    }

    #[test]
    fn test_report_descriptor_accessors() {
        let descriptor = ActionDescriptor::from_result(json!({
            "type": "ir.actions.report",
            "report_name": "payroll.report_payslip",
            "report_type": "qweb-pdf",
            "context": { "active_ids": [10] }
        }))
        .unwrap()
        .unwrap();

        assert_eq!(descriptor.action_type(), "ir.actions.report");
        assert_eq!(descriptor.report_name(), Some("payroll.report_payslip"));
        assert_eq!(descriptor.report_type(), Some("qweb-pdf"));
        assert_eq!(descriptor.record_ids(), vec![10]);
        assert_eq!(descriptor.url(), None);
    }

    #[test]
    fn test_initial_state_is_loading() {
        let state = PortalState::default();
        assert!(state.loading);
        assert!(state.selected_year().is_none());
    }
}
