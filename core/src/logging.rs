use log::Level;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// One structured diagnostic, as handed to the `log` facade.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub id: String,
    pub ts: i64,
    pub level: String,
    pub code: Option<String>,
    pub module: String,
    pub message: String,
    pub explain: Option<String>,
    pub data: Option<Value>,
}

pub fn log_event(
    level: Level,
    code: Option<&str>,
    module: &str,
    message: &str,
    explain: Option<&str>,
    data: Option<Value>,
) -> EventRecord {
    let record = EventRecord {
        id: Uuid::new_v4().to_string(),
        ts: OffsetDateTime::now_utc().unix_timestamp(),
        level: level.as_str().to_ascii_lowercase(),
        code: code.map(str::to_string),
        module: module.to_string(),
        message: message.to_string(),
        explain: explain.map(str::to_string),
        data,
    };
    log::log!(
        target: module,
        level,
        "[{}] {} id={}{}{}",
        record.code.as_deref().unwrap_or("-"),
        record.message,
        record.id,
        record
            .explain
            .as_deref()
            .map(|e| format!(" explain=\"{e}\""))
            .unwrap_or_default(),
        record
            .data
            .as_ref()
            .map(|d| format!(" data={d}"))
            .unwrap_or_default(),
    );
    record
}

/// Stable SHA-256 digest used to correlate prompts in logs without storing them.
pub fn fingerprint(values: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for value in values {
        hasher.update(value.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
