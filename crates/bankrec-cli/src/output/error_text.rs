use bankrec_client::ClientError;
use serde_json::Value;

pub fn render_error(error: &ClientError) -> String {
    let mut lines = vec![
        format!("Error: {}", error.code),
        format!("  {}", error.message),
    ];

    if let Some(existing) = error
        .data
        .as_ref()
        .and_then(|data| data.get("existing_statement_id"))
        .and_then(Value::as_str)
    {
        lines.push(format!("  Existing statement: {existing}"));
    }

    lines.push(String::new());
    lines.push("What to do next:".to_string());
    if error.recovery_steps.is_empty() {
        lines.push("  1. Retry the command.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}
