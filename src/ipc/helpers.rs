use crate::error::GradebookError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::Store;
use serde::Serialize;
use tracing::{error, warn};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, req: &Request) -> serde_json::Value {
        if self.code.starts_with("db_") || self.code == "internal" {
            error!(
                method = %req.method,
                code = self.code,
                error = %self.message,
                "request failed"
            );
        } else {
            warn!(
                method = %req.method,
                code = self.code,
                error = %self.message,
                "request rejected"
            );
        }
        err(&req.id, self.code, self.message, self.details)
    }
}

impl From<GradebookError> for HandlerErr {
    fn from(e: GradebookError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
            details: None,
        }
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// Ids arrive either as JSON integers or as decimal strings.
pub fn get_required_id(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    let Some(v) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
        .ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: format!("invalid {}", key),
            details: Some(serde_json::json!({ key: v })),
        })
}

/// Only type-checks. Positivity is enforced by the ledger.
pub fn get_required_number(params: &serde_json::Value, key: &str) -> Result<f64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a positive number", key)))
}

pub fn to_result<T: Serialize>(value: T) -> Result<serde_json::Value, HandlerErr> {
    serde_json::to_value(value).map_err(|e| HandlerErr {
        code: "internal",
        message: e.to_string(),
        details: None,
    })
}

/// Runs `f` against the selected workspace and wraps the outcome.
pub fn with_store<F>(state: &AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&Store, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
{
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(store, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(req),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        let params = json!({ "a": 5, "b": " 12 ", "c": "x", "d": 1.5 });
        assert_eq!(get_required_id(&params, "a").ok(), Some(5));
        assert_eq!(get_required_id(&params, "b").ok(), Some(12));
        assert!(get_required_id(&params, "c").is_err());
        assert!(get_required_id(&params, "d").is_err());
        assert!(get_required_id(&params, "missing").is_err());
    }

    #[test]
    fn numbers_must_be_json_numbers() {
        let params = json!({ "score": 4, "bad": "4" });
        assert_eq!(get_required_number(&params, "score").ok(), Some(4.0));
        let e = get_required_number(&params, "bad").err().expect("string rejected");
        assert_eq!(e.code, "bad_params");
        assert_eq!(e.message, "bad must be a positive number");
    }
}
