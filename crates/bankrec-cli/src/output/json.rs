use std::io;

use bankrec_client::contracts::envelope::import_failure;
use bankrec_client::{ClientError, SuccessEnvelope};
use serde::Serialize;
use serde_json::{Value, json};

const JSON_VERSION: &str = "v1";

pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    let value = match success.command.as_str() {
        // Import results already carry `success: true` at the top level.
        "statement import" => success.data.clone(),
        "statement list" => rows_array(&success.data),
        _ => json!({
            "ok": true,
            "version": JSON_VERSION,
            "command": success.command,
            "data": success.data.clone(),
        }),
    };

    serialize_json_pretty(&value)
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    let mut payload = json!({
        "error": {
            "code": error.code,
            "message": error.message,
            "recovery_steps": error.recovery_steps,
        }
    });
    if let Some(data) = &error.data {
        payload["data"] = data.clone();
    }
    serialize_json_pretty(&payload)
}

pub fn render_import_failure_json(error: &ClientError) -> io::Result<String> {
    serialize_json_pretty(&import_failure(error))
}

fn rows_array(data: &Value) -> Value {
    Value::Array(
        data.get("rows")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    )
}

fn serialize_json_pretty<T>(value: &T) -> io::Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use bankrec_client::{ClientError, SuccessEnvelope};
    use serde_json::{Value, json};

    use super::{render_error_json, render_import_failure_json, render_success_json};

    fn success(command: &str, data: Value) -> SuccessEnvelope {
        SuccessEnvelope {
            ok: true,
            command: command.to_string(),
            version: "0.1.0".to_string(),
            data,
        }
    }

    fn parse(text: &str) -> Value {
        let parsed: Result<Value, _> = serde_json::from_str(text);
        assert!(parsed.is_ok());
        parsed.unwrap_or(Value::Null)
    }

    #[test]
    fn statement_import_json_is_the_bare_result() {
        let payload = success(
            "statement import",
            json!({"success": true, "statement_id": "stmt_1", "total_transactions": 3}),
        );

        let rendered = render_success_json(&payload);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let value = parse(&text);
            assert_eq!(value["success"], Value::Bool(true));
            assert_eq!(value["statement_id"], "stmt_1");
            assert!(value.get("ok").is_none());
        }
    }

    #[test]
    fn statement_list_json_returns_raw_array() {
        let payload = success(
            "statement list",
            json!({"rows": [{"statement_id": "stmt_1", "status": "imported"}]}),
        );

        let rendered = render_success_json(&payload);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let value = parse(&text);
            assert!(value.is_array());
            assert_eq!(value[0]["statement_id"], "stmt_1");
        }
    }

    #[test]
    fn other_commands_use_versioned_envelope() {
        let payload = success("reconcile auto", json!({"matched_count": 2}));

        let rendered = render_success_json(&payload);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let value = parse(&text);
            assert_eq!(value["ok"], Value::Bool(true));
            assert_eq!(value["version"], "v1");
            assert_eq!(value["command"], "reconcile auto");
            assert_eq!(value["data"]["matched_count"], 2);
        }
    }

    #[test]
    fn runtime_error_json_uses_universal_shape() {
        let error = ClientError::line_not_found("line_9");
        let rendered = render_error_json(&error);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let value = parse(&text);
            assert_eq!(value["error"]["code"], "LINE_NOT_FOUND");
            assert!(value["error"]["recovery_steps"].is_array());
            assert!(value.get("ok").is_none());
        }
    }

    #[test]
    fn import_failure_json_is_flat() {
        let error = ClientError::duplicate_file("abc123", Some("stmt_1"));
        let rendered = render_import_failure_json(&error);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let value = parse(&text);
            assert_eq!(value["success"], Value::Bool(false));
            assert_eq!(value["error"], "DUPLICATE_FILE");
            assert!(value["message"].is_string());
        }
    }

    #[test]
    fn non_import_failure_during_import_is_wrapped() {
        let error = ClientError::ledger_locked(std::path::Path::new("/tmp/bankrec.db"));
        let rendered = render_import_failure_json(&error);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let value = parse(&text);
            assert_eq!(value["error"], "IMPORT_ERROR");
            assert_eq!(value["data"]["cause"], "LEDGER_LOCKED");
        }
    }
}
