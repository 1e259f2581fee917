use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Payload returned by the status endpoint. Exactly these four fields.
#[derive(Debug, Serialize)]
pub struct StatusPayload {
    pub status: &'static str,
    pub timestamp: f64,
    pub host: String,
    pub message: &'static str,
}

impl StatusPayload {
    /// Capture the current status. Fails only when the machine hostname
    /// cannot be resolved.
    pub fn capture() -> io::Result<Self> {
        let host = hostname::get()?.to_string_lossy().into_owned();
        // A clock before the epoch clamps to zero instead of failing.
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or_default();

        Ok(Self {
            status: "ok",
            timestamp,
            host,
            message: "VM-compatible dark mode server",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_reports_ok_with_four_fields() {
        let payload = StatusPayload::capture().unwrap();
        assert_eq!(payload.status, "ok");
        assert!(payload.timestamp > 0.0);
        assert!(!payload.host.is_empty());
        assert_eq!(payload.message, "VM-compatible dark mode server");

        let value = serde_json::to_value(&payload).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert!(object["timestamp"].is_f64());
    }
}
