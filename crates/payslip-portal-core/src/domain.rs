//! Domain filters: conjunctive field conditions for bulk reads

use serde_json::Value;

/// One `field = value` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub value: Value,
}

/// AND of all conditions; an empty domain matches every record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    conditions: Vec<Condition>,
}

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Wire form: `[["field", "=", value], ...]`
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.conditions
                .iter()
                .map(|c| {
                    Value::Array(vec![
                        Value::from(c.field.as_str()),
                        Value::from("="),
                        c.value.clone(),
                    ])
                })
                .collect(),
        )
    }
}

/// Finalized payslips of `user_id` for `year_id`
pub fn payslip_domain(user_id: i64, year_id: i64, state: &str) -> Domain {
    Domain::new()
        .where_eq("employee_id.user_id", user_id)
        .where_eq("year", year_id)
        .where_eq("state", state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_domain() {
        assert_eq!(Domain::new().to_value(), json!([]));
        assert!(Domain::new().is_empty());
    }

    #[test]
    fn test_payslip_domain_wire_form() {
        let domain = payslip_domain(7, 2, "done");
        assert_eq!(
            domain.to_value(),
            json!([
                ["employee_id.user_id", "=", 7],
                ["year", "=", 2],
                ["state", "=", "done"]
            ])
        );
    }

    #[test]
    fn test_conditions_keep_insertion_order() {
        let domain = Domain::new().where_eq("state", "done").where_eq("year", 1);
        let fields: Vec<&str> = domain.conditions().iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["state", "year"]);
        assert!(!domain.is_empty());
    }
}
