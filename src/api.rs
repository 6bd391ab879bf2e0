//! Transport-agnostic request/response envelope over the orchestrator.
//!
//! Requests are JSON objects tagged by `op`. Enum values are validated by
//! deserialization here, so nothing malformed reaches the core. [`serve`]
//! binds the envelope to a line-delimited stream (one request per line,
//! one response per line).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::{Result, ScanDeckError};
use crate::orchestrator::AuditOrchestrator;
use crate::query::AuditFilter;
use crate::state_machine::{AuditLanguage, CompletionOutcome};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    Status,
    ListAudits {
        #[serde(default)]
        filter: Option<AuditFilter>,
    },
    GetAudit {
        id: String,
    },
    GetContainer {
        id: String,
    },
    ListActiveContainers,
    AuditStats,
    StartPortScan {
        target: String,
    },
    StartDependencyScan {
        language: AuditLanguage,
        project_path: String,
    },
    CancelAudit {
        id: String,
    },
    CompleteAudit {
        id: String,
        outcome: CompletionOutcome,
    },
}

impl Request {
    /// Parse one request. A payload that fails only inside its `filter`
    /// is reported as [`ScanDeckError::InvalidFilter`].
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ScanDeckError::InvalidRequest(e.to_string()))?;

        if let Some(filter) = value.get("filter").filter(|f| !f.is_null())
            && let Err(e) = AuditFilter::deserialize(filter)
        {
            return Err(ScanDeckError::InvalidFilter(e.to_string()));
        }

        Request::deserialize(&value).map_err(|e| ScanDeckError::InvalidRequest(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Success { ok: bool, data: Value },
    Failure { ok: bool, error: ErrorBody },
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response::Success { ok: true, data }
    }

    pub fn failure(err: &ScanDeckError) -> Self {
        Response::Failure {
            ok: false,
            error: ErrorBody {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

/// Execute a validated request against the orchestrator.
pub async fn dispatch(orch: &AuditOrchestrator, request: Request) -> Result<Value> {
    let data = match request {
        Request::Status => Value::from(orch.status()),
        Request::ListAudits { filter } => {
            serde_json::to_value(orch.list_audits(filter.as_ref()).await)?
        }
        Request::GetAudit { id } => serde_json::to_value(orch.get_audit(&id).await)?,
        Request::GetContainer { id } => serde_json::to_value(orch.get_container(&id).await)?,
        Request::ListActiveContainers => {
            serde_json::to_value(orch.list_active_containers().await)?
        }
        Request::AuditStats => serde_json::to_value(orch.audit_stats().await)?,
        Request::StartPortScan { target } => {
            serde_json::to_value(orch.start_port_scan(&target).await?)?
        }
        Request::StartDependencyScan {
            language,
            project_path,
        } => serde_json::to_value(orch.start_dependency_scan(language, &project_path).await?)?,
        Request::CancelAudit { id } => Value::Bool(orch.cancel_audit(&id).await?),
        Request::CompleteAudit { id, outcome } => {
            Value::Bool(orch.complete_audit(&id, outcome).await?)
        }
    };
    Ok(data)
}

/// Parse, dispatch and wrap a single line. Never fails; errors become
/// `{"ok": false, ...}` responses.
pub async fn handle_line(orch: &AuditOrchestrator, line: &str) -> Response {
    let outcome = match Request::parse(line) {
        Ok(request) => {
            debug!(?request, "dispatching request");
            dispatch(orch, request).await
        }
        Err(e) => Err(e),
    };
    match outcome {
        Ok(data) => Response::success(data),
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "request failed");
            Response::failure(&e)
        }
    }
}

/// Serve requests from `reader` until EOF, writing one JSON response per
/// non-blank input line. A line that is not UTF-8 is answered with an
/// `INVALID_REQUEST` failure; only I/O errors end the loop.
pub async fn serve<R, W>(orch: &AuditOrchestrator, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(orch, line.trim_end_matches(['\n', '\r'])).await,
            Err(e) => {
                let err = ScanDeckError::InvalidRequest(format!("request is not valid UTF-8: {e}"));
                warn!(error = %err, kind = err.kind(), "request failed");
                Response::failure(&err)
            }
        };
        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::state_machine::AuditStatus;

    fn orchestrator() -> AuditOrchestrator {
        AuditOrchestrator::with_delay(Duration::from_secs(2))
    }

    async fn call(orch: &AuditOrchestrator, line: &str) -> Value {
        serde_json::to_value(handle_line(orch, line).await).unwrap()
    }

    #[test]
    fn parse_list_audits_with_filter() {
        let req = Request::parse(
            r#"{"op":"listAudits","filter":{"status":"RUNNING","target":"web"}}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            Request::ListAudits {
                filter: Some(
                    AuditFilter::default()
                        .with_status(AuditStatus::Running)
                        .with_target("web")
                )
            }
        );

        let req = Request::parse(r#"{"op":"listAudits"}"#).unwrap();
        assert_eq!(req, Request::ListAudits { filter: None });
    }

    #[test]
    fn parse_dependency_scan_uses_camel_case() {
        let req = Request::parse(
            r#"{"op":"startDependencyScan","language":"PYTHON","projectPath":"/srv/api"}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            Request::StartDependencyScan {
                language: AuditLanguage::Python,
                project_path: "/srv/api".into(),
            }
        );
    }

    #[test]
    fn unknown_filter_value_is_invalid_filter() {
        let err = Request::parse(r#"{"op":"listAudits","filter":{"status":"DONE"}}"#).unwrap_err();
        assert!(matches!(err, ScanDeckError::InvalidFilter(_)));
    }

    #[test]
    fn unknown_language_is_invalid_request() {
        let err = Request::parse(
            r#"{"op":"startDependencyScan","language":"RUBY","projectPath":"/app"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScanDeckError::InvalidRequest(_)));

        let err = Request::parse(r#"{"op":"deleteAudit","id":"1"}"#).unwrap_err();
        assert!(matches!(err, ScanDeckError::InvalidRequest(_)));

        let err = Request::parse("not json").unwrap_err();
        assert!(matches!(err, ScanDeckError::InvalidRequest(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn start_then_query_through_envelope() {
        let orch = orchestrator();

        let created = call(&orch, r#"{"op":"startPortScan","target":"10.0.0.5"}"#).await;
        assert_eq!(created["ok"], true);
        assert_eq!(created["data"]["status"], "PENDING");
        assert_eq!(created["data"]["type"], "PORT_SCAN");
        assert!(created["data"]["results"].is_null());
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let active = call(&orch, r#"{"op":"listActiveContainers"}"#).await;
        assert_eq!(active["data"][0]["status"], "CREATING");
        assert_eq!(active["data"][0]["image"], "python-nmap:latest");

        orch.settle().await;
        let fetched = call(&orch, &format!(r#"{{"op":"getAudit","id":"{id}"}}"#)).await;
        assert_eq!(fetched["data"]["status"], "RUNNING");

        let cancelled = call(&orch, &format!(r#"{{"op":"cancelAudit","id":"{id}"}}"#)).await;
        assert_eq!(cancelled, serde_json::json!({"ok": true, "data": true}));
        let again = call(&orch, &format!(r#"{{"op":"cancelAudit","id":"{id}"}}"#)).await;
        assert_eq!(again, serde_json::json!({"ok": true, "data": false}));
    }

    #[tokio::test]
    async fn missing_audit_is_null_but_cancel_is_not_found() {
        let orch = orchestrator();

        let fetched = call(&orch, r#"{"op":"getAudit","id":"nope"}"#).await;
        assert_eq!(fetched, serde_json::json!({"ok": true, "data": null}));

        let cancelled = call(&orch, r#"{"op":"cancelAudit","id":"nope"}"#).await;
        assert_eq!(cancelled["ok"], false);
        assert_eq!(cancelled["error"]["kind"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn status_and_stats() {
        let orch = orchestrator();
        let status = call(&orch, r#"{"op":"status"}"#).await;
        assert_eq!(status["data"], "scandeck orchestrator is running");

        let stats = call(&orch, r#"{"op":"auditStats"}"#).await;
        assert_eq!(stats["data"]["total"], 0);
        assert_eq!(stats["data"]["activeContainers"], 0);
    }

    #[tokio::test]
    async fn bad_filter_reports_invalid_filter() {
        let orch = orchestrator();
        let resp = call(&orch, r#"{"op":"listAudits","filter":{"type":"SQL_INJECTION"}}"#).await;
        assert_eq!(resp["ok"], false);
        assert_eq!(resp["error"]["kind"], "INVALID_FILTER");
    }

    #[tokio::test(start_paused = true)]
    async fn serve_answers_each_line() {
        let orch = orchestrator();
        let input = b"{\"op\":\"status\"}\n\n{\"op\":\"startPortScan\",\"target\":\"web-server\"}\n{\"op\":\"listAudits\",\"filter\":{\"target\":\"web\"}}\n";
        let mut output: Vec<u8> = Vec::new();

        serve(&orch, &input[..], &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l["ok"] == true));
        assert_eq!(lines[2]["data"][0]["target"], "web-server");
    }

    #[tokio::test]
    async fn serve_recovers_from_invalid_utf8() {
        let orch = orchestrator();
        let input = b"\xff\xfe\n{\"op\":\"status\"}\n";
        let mut output: Vec<u8> = Vec::new();

        serve(&orch, &input[..], &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["ok"], false);
        assert_eq!(lines[0]["error"]["kind"], "INVALID_REQUEST");
        assert_eq!(lines[1]["ok"], true);
        assert_eq!(lines[1]["data"], "scandeck orchestrator is running");
    }

    #[tokio::test]
    async fn handle_line_never_fails() {
        let orch = orchestrator();
        assert!(matches!(
            handle_line(&orch, r#"{"op":"status"}"#).await,
            Response::Success { ok: true, .. }
        ));
        assert!(matches!(
            handle_line(&orch, "{").await,
            Response::Failure { ok: false, .. }
        ));
    }
}
