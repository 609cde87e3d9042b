//! Execution trace reporting
//!
//! One reporter is built at startup and shared by `Arc` with the components
//! that emit runs. When tracing is disabled the `NoopReporter` is used.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::MonitoringConfig;
use crate::error::Result;

/// Kind of traced run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Chain,
    Llm,
}

/// One traced execution
#[derive(Debug, Clone, Serialize)]
pub struct TraceRun {
    pub id: Uuid,
    pub name: String,
    pub run_type: RunType,
    pub inputs: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl TraceRun {
    /// Start a run now; finish it with `succeeded` or `failed`
    pub fn start(name: impl Into<String>, run_type: RunType, inputs: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            run_type,
            inputs,
            outputs: None,
            error: None,
            start_time: now,
            end_time: now,
        }
    }

    pub fn succeeded(mut self, outputs: Value) -> Self {
        self.outputs = Some(outputs);
        self.end_time = Utc::now();
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.end_time = Utc::now();
        self
    }
}

/// Sink for traced runs; reporting never fails the caller
pub trait TraceReporter: Send + Sync {
    fn report(&self, run: TraceRun);

    fn is_enabled(&self) -> bool;
}

/// Reporter that drops every run
pub struct NoopReporter;

impl TraceReporter for NoopReporter {
    fn report(&self, _run: TraceRun) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Posts runs to a LangSmith-compatible `/runs` endpoint in the background
pub struct LangSmithReporter {
    client: Client,
    endpoint: String,
    api_key: String,
    project: String,
}

#[derive(Serialize)]
struct RunPayload<'a> {
    #[serde(flatten)]
    run: &'a TraceRun,
    session_name: &'a str,
}

impl LangSmithReporter {
    pub fn new(endpoint: &str, api_key: &str, project: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            project: project.to_string(),
        })
    }

    fn payload(&self, run: &TraceRun) -> Value {
        serde_json::to_value(RunPayload {
            run,
            session_name: &self.project,
        })
        .unwrap_or(Value::Null)
    }
}

impl TraceReporter for LangSmithReporter {
    fn report(&self, run: TraceRun) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime, dropping trace run {}", run.name);
            return;
        };

        let request = self
            .client
            .post(format!("{}/runs", self.endpoint))
            .header("x-api-key", &self.api_key)
            .json(&self.payload(&run));
        let name = run.name;

        handle.spawn(async move {
            match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!("Reported trace run {}", name);
                }
                Ok(resp) => tracing::warn!("Trace upload for {} rejected: HTTP {}", name, resp.status()),
                Err(e) => tracing::warn!("Trace upload for {} failed: {}", name, e),
            }
        });
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Build the reporter for this configuration
pub fn reporter_from_config(config: &MonitoringConfig) -> Arc<dyn TraceReporter> {
    let api_key = config.api_key.as_deref().filter(|k| !k.trim().is_empty());
    match (config.enabled, api_key) {
        (true, Some(key)) => match LangSmithReporter::new(&config.endpoint, key, &config.project) {
            Ok(reporter) => {
                tracing::info!("Trace reporting enabled for project {}", config.project);
                Arc::new(reporter)
            }
            Err(e) => {
                tracing::warn!("Trace reporting disabled: {}", e);
                Arc::new(NoopReporter)
            }
        },
        (true, None) => {
            tracing::warn!("LANGSMITH_TRACING is set but no API key is configured");
            Arc::new(NoopReporter)
        }
        _ => Arc::new(NoopReporter),
    }
}
