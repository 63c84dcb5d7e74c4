//! Result sink — the tracking-system write path.
//!
//! Terminal verdicts are filed into Odoo recruitment over JSON-RPC: resolve
//! the configured job position by exact name, create one `hr.applicant`
//! record, attach the original CV, attach the verdict JSON. Position
//! resolution fails closed — no record is created when the position is
//! missing.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::SinkError;
use crate::pipeline::verdict::Verdict;

pub type ApplicantId = i64;

/// The persistence contract the batch driver consumes. Implemented by the
/// Odoo client in production and by counting doubles in tests.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn persist(
        &self,
        candidate_name: &str,
        cv_path: &Path,
        verdict: &Verdict,
    ) -> Result<ApplicantId, SinkError>;
}

/// Odoo recruitment client. Authenticates once at construction; each upload
/// is independent, so concurrent uploads for different candidates do not
/// interfere.
pub struct OdooSink {
    http: reqwest::Client,
    endpoint: String,
    db: String,
    password: String,
    uid: i64,
    job_name: String,
    request_id: AtomicU64,
}

impl OdooSink {
    /// Connects and authenticates against the configured Odoo instance.
    pub async fn connect(config: &Config) -> Result<Self, SinkError> {
        let http = reqwest::Client::new();
        let endpoint = format!("{}/jsonrpc", config.odoo_url.trim_end_matches('/'));

        let uid = call_rpc(
            &http,
            &endpoint,
            1,
            "common",
            "authenticate",
            json!([
                config.odoo_db,
                config.odoo_username,
                config.odoo_password,
                {}
            ]),
        )
        .await?
        .as_i64()
        .filter(|uid| *uid > 0)
        .ok_or(SinkError::Auth)?;

        info!("authenticated against Odoo as uid {uid}");
        Ok(Self {
            http,
            endpoint,
            db: config.odoo_db.clone(),
            password: config.odoo_password.clone(),
            uid,
            job_name: config.odoo_job_name.clone(),
            request_id: AtomicU64::new(2),
        })
    }

    async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value, SinkError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        call_rpc(
            &self.http,
            &self.endpoint,
            id,
            "object",
            "execute_kw",
            json!([self.db, self.uid, self.password, model, method, args, kwargs]),
        )
        .await
    }

    /// Resolves the configured job position by exact name. On a miss, the
    /// available positions are logged before failing closed.
    async fn resolve_job(&self) -> Result<i64, SinkError> {
        let ids = self
            .execute_kw(
                "hr.job",
                "search",
                json!([[["name", "=", self.job_name]]]),
                json!({}),
            )
            .await?;
        match ids.as_array().and_then(|a| a.first()).and_then(Value::as_i64) {
            Some(job_id) => Ok(job_id),
            None => {
                self.log_available_jobs().await;
                Err(SinkError::PositionNotFound(self.job_name.clone()))
            }
        }
    }

    /// Best-effort: listing failures only log, the caller's error stands.
    async fn log_available_jobs(&self) {
        match self.list_jobs().await {
            Ok(jobs) if jobs.is_empty() => warn!("no job positions exist in Odoo"),
            Ok(jobs) => warn!("available job positions: {}", jobs.join(", ")),
            Err(e) => warn!("could not list job positions: {e}"),
        }
    }

    /// Lists the names of all job positions.
    pub async fn list_jobs(&self) -> Result<Vec<String>, SinkError> {
        let ids = self
            .execute_kw("hr.job", "search", json!([[]]), json!({}))
            .await?;
        let ids = ids.as_array().cloned().unwrap_or_default();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let jobs = self
            .execute_kw(
                "hr.job",
                "read",
                json!([ids]),
                json!({ "fields": ["id", "name"] }),
            )
            .await?;
        Ok(jobs
            .as_array()
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| r.get("name").and_then(Value::as_str))
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl ResultSink for OdooSink {
    /// Creates one applicant record under the configured position and
    /// attaches the CV plus the verdict JSON.
    async fn persist(
        &self,
        candidate_name: &str,
        cv_path: &Path,
        verdict: &Verdict,
    ) -> Result<ApplicantId, SinkError> {
        let cv_bytes = tokio::fs::read(cv_path).await?;
        let job_id = self.resolve_job().await?;

        let subject = format!("Application for {} - {}", self.job_name, candidate_name);
        let email = format!(
            "{}@example.com",
            candidate_name.to_lowercase().replace(' ', ".")
        );
        let applicant_id = self
            .execute_kw(
                "hr.applicant",
                "create",
                json!([{
                    "name": subject,
                    "partner_name": candidate_name,
                    "job_id": job_id,
                    "email_from": email,
                }]),
                json!({}),
            )
            .await?
            .as_i64()
            .ok_or_else(|| {
                SinkError::Write("applicant create returned a non-integer id".to_string())
            })?;

        let file_name = cv_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cv".to_string());
        let mimetype = if file_name.to_lowercase().ends_with(".pdf") {
            "application/pdf"
        } else {
            "application/msword"
        };
        self.execute_kw(
            "ir.attachment",
            "create",
            json!([{
                "name": file_name,
                "type": "binary",
                "datas": BASE64.encode(&cv_bytes),
                "res_model": "hr.applicant",
                "res_id": applicant_id,
                "mimetype": mimetype,
            }]),
            json!({}),
        )
        .await?;

        let verdict_json = serde_json::to_string_pretty(verdict)
            .map_err(|e| SinkError::Write(format!("could not serialize verdict: {e}")))?;
        self.execute_kw(
            "ir.attachment",
            "create",
            json!([{
                "name": format!("{candidate_name}_screening_results.json"),
                "datas": BASE64.encode(verdict_json.as_bytes()),
                "res_model": "hr.applicant",
                "res_id": applicant_id,
                "type": "binary",
                "description": "Complete AI screening results JSON (verdict, justification, scores, discrepancies)",
            }]),
            json!({}),
        )
        .await?;

        info!(
            "uploaded CV and screening data for '{candidate_name}' to '{}' (applicant {applicant_id})",
            self.job_name
        );
        Ok(applicant_id)
    }
}

/// One JSON-RPC round trip. Transport failures, non-success statuses, and
/// JSON-RPC fault payloads all surface as `SinkError::Write`.
async fn call_rpc(
    http: &reqwest::Client,
    endpoint: &str,
    id: u64,
    service: &str,
    method: &str,
    args: Value,
) -> Result<Value, SinkError> {
    let body = json!({
        "jsonrpc": "2.0",
        "method": "call",
        "params": { "service": service, "method": method, "args": args },
        "id": id,
    });

    let response = http
        .post(endpoint)
        .json(&body)
        .send()
        .await
        .map_err(|e| SinkError::Write(format!("transport: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SinkError::Write(format!("HTTP {status}")));
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| SinkError::Write(format!("invalid JSON-RPC response: {e}")))?;

    if let Some(fault) = payload.get("error") {
        let message = fault
            .pointer("/data/message")
            .or_else(|| fault.get("message"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| fault.to_string());
        return Err(SinkError::Write(message));
    }

    Ok(payload.get("result").cloned().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::verdict::Decision;
    use httpmock::{Method::POST, MockServer};

    fn make_config(base_url: &str) -> Config {
        Config {
            anthropic_api_key: "test-key".to_string(),
            odoo_url: base_url.to_string(),
            odoo_db: "odoo_hr_db".to_string(),
            odoo_username: "admin".to_string(),
            odoo_password: "secret".to_string(),
            odoo_job_name: "Python developer".to_string(),
            llm_concurrency: 2,
            rust_log: "info".to_string(),
        }
    }

    fn make_verdict() -> Verdict {
        Verdict {
            verdict: Decision::Select,
            justification: "Consistent evidence and strong fit.".to_string(),
            confidence_score: 85,
            matching_score: 78,
            discrepancies: vec![],
        }
    }

    fn write_cv(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("jane_doe_cv.pdf");
        std::fs::write(&path, b"%PDF-1.7 fake cv bytes").unwrap();
        path
    }

    #[tokio::test]
    async fn connect_authenticates_once() {
        let server = MockServer::start_async().await;
        let auth = server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc").body_contains("authenticate");
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": 2}));
            })
            .await;

        let sink = OdooSink::connect(&make_config(&server.base_url())).await;
        assert!(sink.is_ok());
        auth.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn connect_rejects_bad_credentials() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc").body_contains("authenticate");
                // Odoo signals bad credentials with `false`, not a fault.
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": false}));
            })
            .await;

        let err = OdooSink::connect(&make_config(&server.base_url()))
            .await
            .err()
            .expect("expected auth failure");
        assert!(matches!(err, SinkError::Auth));
    }

    #[tokio::test]
    async fn persist_fails_closed_when_position_is_missing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc").body_contains("authenticate");
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": 2}));
            })
            .await;
        // Serves both the targeted search and the follow-up listing.
        server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc").body_contains("\"search\"");
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 2, "result": []}));
            })
            .await;
        let applicant_create = server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc").body_contains("partner_name");
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 3, "result": 7}));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cv_path = write_cv(&dir);
        let sink = OdooSink::connect(&make_config(&server.base_url()))
            .await
            .unwrap();
        let err = sink
            .persist("jane doe", &cv_path, &make_verdict())
            .await
            .unwrap_err();

        assert!(matches!(err, SinkError::PositionNotFound(ref job) if job == "Python developer"));
        applicant_create.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn persist_creates_applicant_and_both_attachments() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc").body_contains("authenticate");
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": 2}));
            })
            .await;
        let job_search = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/jsonrpc")
                    .body_contains("\"search\"")
                    .body_contains("Python developer");
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 2, "result": [42]}));
            })
            .await;
        let applicant_create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/jsonrpc")
                    .body_contains("partner_name")
                    .body_contains("Application for Python developer - jane doe")
                    .body_contains("jane.doe@example.com");
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 3, "result": 7}));
            })
            .await;
        let attachment_create = server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc").body_contains("ir.attachment");
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 4, "result": 99}));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cv_path = write_cv(&dir);
        let sink = OdooSink::connect(&make_config(&server.base_url()))
            .await
            .unwrap();
        let applicant_id = sink
            .persist("jane doe", &cv_path, &make_verdict())
            .await
            .unwrap();

        assert_eq!(applicant_id, 7);
        job_search.assert_hits_async(1).await;
        applicant_create.assert_hits_async(1).await;
        // One attachment for the CV, one for the verdict JSON.
        attachment_create.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn jsonrpc_fault_surfaces_as_write_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc").body_contains("authenticate");
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": 2}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc").body_contains("\"search\"");
                then.status(200)
                    .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 2, "result": [42]}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc").body_contains("partner_name");
                then.status(200).json_body(serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": 3,
                    "error": {"message": "Odoo Server Error", "data": {"message": "access denied on hr.applicant"}}
                }));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cv_path = write_cv(&dir);
        let sink = OdooSink::connect(&make_config(&server.base_url()))
            .await
            .unwrap();
        let err = sink
            .persist("jane doe", &cv_path, &make_verdict())
            .await
            .unwrap_err();

        let SinkError::Write(detail) = err else {
            panic!("expected write error");
        };
        assert!(detail.contains("access denied"), "detail was: {detail}");
    }
}
