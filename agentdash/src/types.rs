//! Types that mirror the agent API's JSON schema.

use serde::{Deserialize, Serialize};

// One telemetry observation; percentages are 0..=100 as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    // ISO-8601 as produced by the server; kept verbatim
    #[serde(default)]
    pub timestamp: String,
}

/// Envelope pushed over the telemetry socket:
/// `{ "type": "system_stats", "data": { cpu, memory, disk, timestamp } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub data: TelemetrySample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub command: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub timestamp: String,
}

// Reply of POST /api/commands/execute
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecuteResponse {
    /// Text shown for the command: the agent's response, else its error.
    pub fn text(&self) -> String {
        self.response
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryPayload {
    pub history: Vec<CommandRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessesPayload {
    pub processes: Vec<ProcessInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHit {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSearchPayload {
    pub results: Vec<FileHit>,
    #[serde(default)]
    pub count: usize,
}

/// Most read endpoints answer `200 {"error": "..."}` when the agent fails,
/// so every body is decoded through this first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Failed { error: String },
    Ok(T),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_decodes_with_and_without_type() {
        let f: TelemetryFrame = serde_json::from_str(
            r#"{"type":"system_stats","data":{"cpu":12.5,"memory":40,"disk":71.2,"timestamp":"2024-05-01T10:00:00"}}"#,
        )
        .unwrap();
        assert_eq!(f.kind.as_deref(), Some("system_stats"));
        assert_eq!(f.data.cpu, 12.5);
        assert_eq!(f.data.memory, 40.0);

        let f: TelemetryFrame =
            serde_json::from_str(r#"{"data":{"cpu":1,"memory":2,"disk":3,"timestamp":"t"}}"#)
                .unwrap();
        assert!(f.kind.is_none());
        assert_eq!(f.data.timestamp, "t");
    }

    #[test]
    fn frame_without_data_is_rejected() {
        assert!(serde_json::from_str::<TelemetryFrame>(r#"{"type":"system_stats"}"#).is_err());
        assert!(serde_json::from_str::<TelemetryFrame>("not json").is_err());
        assert!(serde_json::from_str::<TelemetryFrame>(r#"{"data":{}}"#).is_err());
        assert!(
            serde_json::from_str::<TelemetryFrame>(r#"{"data":{"cpu":1,"memory":2}}"#).is_err()
        );
    }

    #[test]
    fn stats_reply_requires_metrics() {
        let r: Reply<TelemetrySample> = serde_json::from_str(r#"{"error":"busy"}"#).unwrap();
        assert!(matches!(r, Reply::Failed { .. }));
        assert!(serde_json::from_str::<Reply<TelemetrySample>>(r#"{"status":"ok"}"#).is_err());
    }

    #[test]
    fn execute_text_prefers_response_then_error() {
        let r: ExecuteResponse =
            serde_json::from_str(r#"{"success":true,"response":"OK: 4 cores"}"#).unwrap();
        assert_eq!(r.text(), "OK: 4 cores");
        let r: ExecuteResponse =
            serde_json::from_str(r#"{"success":false,"error":"llm offline"}"#).unwrap();
        assert!(!r.success);
        assert_eq!(r.text(), "llm offline");
        let r: ExecuteResponse = serde_json::from_str(r#"{"success":true,"response":null}"#).unwrap();
        assert_eq!(r.text(), "");
    }

    #[test]
    fn reply_distinguishes_error_bodies() {
        let r: Reply<HistoryPayload> = serde_json::from_str(r#"{"error":"db locked"}"#).unwrap();
        assert!(matches!(r, Reply::Failed { ref error } if error == "db locked"));

        let r: Reply<HistoryPayload> = serde_json::from_str(
            r#"{"history":[{"command":"ls","result":"a b","success":true,"execution_time":0.0,"timestamp":"x"}]}"#,
        )
        .unwrap();
        match r {
            Reply::Ok(p) => {
                assert_eq!(p.history.len(), 1);
                assert_eq!(p.history[0].command, "ls");
            }
            Reply::Failed { .. } => panic!("expected history"),
        }
    }
}
