/// Built-in processors
///
/// - `vars`: primitives and request variable access
/// - `logic`: fragments, arithmetic and data-set operations
/// - `security`: access checks evaluated before the process tree
/// - `output`: renderers for the evaluated result
/// - `endpoint`: outbound calls to external services

pub mod endpoint;
pub mod logic;
pub mod output;
pub mod security;
pub mod vars;

use crate::core::ApiResult;
use crate::processor::registry::{Namespace, ProcessorRegistry};

/// Register every built-in processor in its namespace
pub fn register_all(registry: &mut ProcessorRegistry) -> ApiResult<()> {
    registry.register_default::<security::Token>(Namespace::Security)?;

    registry.register_default::<output::Json>(Namespace::Output)?;
    registry.register_default::<output::Xml>(Namespace::Output)?;
    registry.register_default::<output::Text>(Namespace::Output)?;

    registry.register_default::<vars::VarInt>(Namespace::Processor)?;
    registry.register_default::<vars::VarFloat>(Namespace::Processor)?;
    registry.register_default::<vars::VarBool>(Namespace::Processor)?;
    registry.register_default::<vars::VarText>(Namespace::Processor)?;
    registry.register_default::<vars::VarMixed>(Namespace::Processor)?;
    registry.register_default::<vars::VarField>(Namespace::Processor)?;
    registry.register_default::<vars::VarObject>(Namespace::Processor)?;
    registry.register_default::<vars::VarGet>(Namespace::Processor)?;
    registry.register_default::<vars::VarPost>(Namespace::Processor)?;
    registry.register_default::<vars::VarRequest>(Namespace::Processor)?;
    registry.register_default::<vars::VarUri>(Namespace::Processor)?;
    registry.register_default::<vars::VarTemporary>(Namespace::Processor)?;
    registry.register_default::<vars::BearerToken>(Namespace::Processor)?;

    registry.register_default::<logic::Fragment>(Namespace::Processor)?;
    registry.register_default::<logic::Add>(Namespace::Processor)?;
    registry.register_default::<logic::Merge>(Namespace::Processor)?;
    registry.register_default::<logic::Filter>(Namespace::Processor)?;
    registry.register_default::<logic::ConvertToJson>(Namespace::Processor)?;

    registry.register_default::<endpoint::Url>(Namespace::Endpoint)?;
    Ok(())
}
