/// Security processors
///
/// Evaluated before the process tree; the result must be boolean `true` for
/// the call to proceed.

use crate::core::{ApiError, ApiResult, DataContainer, RequestContext};
use crate::processor::contract::{InputSpec, InputType, Processor, ProcessorContract, ProcessorInput};

/// Passes when the consumer's token is one of the allowed tokens
#[derive(Debug, Default)]
pub struct Token;

impl Processor for Token {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Token", "token", "Validate that the consumer has a valid token.", "Security")
            .input(
                "token",
                InputSpec::new("The consumer's token.")
                    .required()
                    .literal_allowed(false)
                    .limit_types([InputType::Text])
                    .default_value(""),
            )
            .input(
                "allowed",
                InputSpec::new("Tokens granted access.")
                    .cardinality(1, None)
                    .limit_types([InputType::Text, InputType::Array]),
            )
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let token = input.text("token")?;
        if token.is_empty() {
            tracing::warn!("🔒 Security '{}': no token supplied", input.id());
            return Err(ApiError::unauthorized(None));
        }

        let mut granted = false;
        for allowed in input.list("allowed")? {
            granted |= match allowed.data() {
                serde_json::Value::Array(items) => items.iter().any(|item| item.as_str() == Some(token.as_str())),
                _ => allowed.to_text() == token,
            };
        }

        if !granted {
            tracing::warn!("🔒 Security '{}': token rejected", input.id());
            return Err(ApiError::unauthorized(None));
        }
        Ok(DataContainer::boolean(true))
    }
}
