//! Supabase RPC applier
//!
//! Sends SQL to an `execute_sql` database function through the project's
//! REST endpoint using the service-role key. This bypasses the Supabase CLI
//! entirely, so the function must already exist in the target project.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use url::Url;

use crate::config::SERVICE_ROLE_KEY_VAR;
use crate::domain::result::{Error, Result};

const RPC_PATH: &str = "rest/v1/rpc/execute_sql";
const RPC_TIMEOUT_SECS: u64 = 30;

/// REST client for the `execute_sql` function
#[derive(Debug)]
pub struct RpcApplier {
    client: Client,
    endpoint: Url,
    service_role_key: String,
}

impl RpcApplier {
    /// Create an applier for the given project URL
    pub fn new(supabase_url: &str, service_role_key: &str) -> Result<Self> {
        if service_role_key.is_empty() {
            return Err(Error::config(format!(
                "{} is not set. Set the environment variable or run the migration \
                 directly in the Supabase dashboard.",
                SERVICE_ROLE_KEY_VAR
            )));
        }

        let base = Url::parse(&format!("{}/", supabase_url.trim_end_matches('/')))
            .map_err(|e| Error::config(format!("Invalid Supabase URL '{}': {}", supabase_url, e)))?;
        let local = matches!(base.host_str(), Some("localhost") | Some("127.0.0.1"));
        if base.scheme() != "https" && !local {
            return Err(Error::config("Supabase URL must use HTTPS"));
        }
        let endpoint = base
            .join(RPC_PATH)
            .map_err(|e| Error::config(format!("Invalid RPC endpoint: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(RPC_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::remote(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            service_role_key: service_role_key.to_string(),
        })
    }

    /// Create an applier using the key from the environment
    pub fn from_env(supabase_url: &str) -> Result<Self> {
        let key = std::env::var(SERVICE_ROLE_KEY_VAR).unwrap_or_default();
        Self::new(supabase_url, &key)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Execute `sql` and return whatever the function returned
    pub fn execute(&self, sql: &str) -> Result<Value> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({ "sql_query": sql }))
            .send()
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::remote(format!("Failed to read RPC response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::remote(format!("HTTP {}: {}", status.as_u16(), body.trim())));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

fn map_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::remote(format!("RPC request timed out after {} seconds", RPC_TIMEOUT_SECS))
    } else if error.is_connect() {
        Error::remote("Unable to connect to Supabase")
    } else {
        Error::remote(format!("RPC request failed: {}", error))
    }
}
