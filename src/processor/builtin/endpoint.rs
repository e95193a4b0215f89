/// Endpoint processors: calls to external services
///
/// Evaluation is synchronous, so these use the blocking `reqwest` client.
/// The gateway runs every evaluation on the blocking thread pool.

use crate::core::{ApiError, ApiResult, DataContainer, DataType, RequestContext};
use crate::processor::contract::{InputSpec, InputType, Processor, ProcessorContract, ProcessorInput};
use serde_json::{json, Value};
use std::time::Duration;

/// Outbound HTTP call
#[derive(Debug, Default)]
pub struct Url;

impl Processor for Url {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Url", "url", "Fetch the result from an external URL.", "Endpoint")
            .input(
                "method",
                InputSpec::new("HTTP method.")
                    .limit_types([InputType::Text])
                    .limit_values(["get", "post", "put", "delete", "patch"].map(|m| json!(m)))
                    .default_value("get"),
            )
            .input(
                "url",
                InputSpec::new("The source URL.")
                    .required()
                    .limit_types([InputType::Text]),
            )
            .input("source", InputSpec::new("Request body (post, put and patch only)."))
            .input(
                "report_error",
                InputSpec::new("Fail the call when the remote answers with an error status.")
                    .limit_types([InputType::Boolean])
                    .default_value(true),
            )
            .input(
                "timeout",
                InputSpec::new("Timeout in seconds.")
                    .limit_types([InputType::Integer])
                    .default_value(30),
            )
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let method = input.text("method")?.to_lowercase();
        let url = input.text("url")?;
        let report_error = input.boolean("report_error")?;
        let timeout = input.integer("timeout")?.max(1) as u64;
        let failure = |message: String| ApiError::processor_with(message, input.id(), 1, 502);

        tracing::debug!("🌍 HTTP Request: {} {}", method.to_uppercase(), url);

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| failure(format!("unable to build HTTP client: {}", e)))?;

        let mut request = match method.as_str() {
            "get" => client.get(&url),
            "post" => client.post(&url),
            "put" => client.put(&url),
            "delete" => client.delete(&url),
            "patch" => client.patch(&url),
            other => {
                return Err(ApiError::processor(format!("unsupported HTTP method: {}", other), input.id()))
            }
        };

        if input.has("source") && matches!(method.as_str(), "post" | "put" | "patch") {
            let body = input.value("source")?;
            request = match body {
                Value::String(text) => request.header("Content-Type", "text/plain").body(text),
                structured => request.json(&structured),
            };
        }

        let response = request
            .send()
            .map_err(|e| failure(format!("HTTP request failed: {}", e)))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| failure(format!("failed to read response body: {}", e)))?;

        tracing::debug!("📡 Response status: {}", status);

        if report_error && !status.is_success() {
            return Err(ApiError::processor_with(text, input.id(), 1, status.as_u16()));
        }

        Ok(match serde_json::from_str::<Value>(&text) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => DataContainer::new(parsed, DataType::Array),
            _ => DataContainer::from_literal(Value::String(text)),
        })
    }
}
