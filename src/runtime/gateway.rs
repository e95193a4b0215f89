/// Request pipeline
///
/// Runs one matched resource for one call: security, cache lookup, fragments,
/// process and output rendering. Everything here is synchronous; the HTTP
/// layer calls it from the blocking thread pool.

use crate::core::{ApiError, ApiResult, DataContainer, RequestContext};
use crate::processor::builtin::output::content_type;
use crate::processor::registry::{Namespace, ProcessorRegistry};
use crate::resource::registry::RouteMatch;
use crate::resource::types::{MetaNode, SlotValue};
use crate::runtime::cache::ResultCache;
use crate::runtime::engine::GraphEvaluator;
use crate::runtime::fragments::FragmentResolver;
use serde_json::Value;
use std::sync::Arc;

/// Output section literal meaning "render in the requested format"
const RESPONSE_LITERAL: &str = "response";

/// Rendered response of a gateway call
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Debug)]
pub struct Gateway {
    evaluator: GraphEvaluator,
    cache: Option<ResultCache>,
    default_format: String,
}

impl Gateway {
    pub fn new(registry: Arc<ProcessorRegistry>, cache_enabled: bool, default_format: impl Into<String>) -> Self {
        Self {
            evaluator: GraphEvaluator::new(registry),
            cache: cache_enabled.then(ResultCache::new),
            default_format: default_format.into(),
        }
    }

    pub fn evaluator(&self) -> &GraphEvaluator {
        &self.evaluator
    }

    pub fn default_format(&self) -> &str {
        &self.default_format
    }

    /// Output format named by an `Accept` header, or the default
    pub fn format_from_accept(&self, accept: Option<&str>) -> String {
        let Some(accept) = accept else {
            return self.default_format.clone();
        };
        for media in accept.split(',') {
            let media = media.split(';').next().unwrap_or("").trim().to_lowercase();
            match media.as_str() {
                "application/json" => return "json".to_string(),
                "application/xml" | "text/xml" => return "xml".to_string(),
                "text/plain" => return "text".to_string(),
                _ => {}
            }
        }
        self.default_format.clone()
    }

    /// Run a matched resource against a populated context
    pub fn handle(&self, route: &RouteMatch, ctx: &mut RequestContext) -> ApiResult<GatewayResponse> {
        let call_start = std::time::Instant::now();
        let resource = &route.resource;
        let meta = Arc::new(resource.meta.clone());

        ctx.uri = resource.uri.clone();
        ctx.args = route.args.clone();
        ctx.ttl = resource.ttl;
        ctx.meta = Some(Arc::clone(&meta));

        tracing::info!(
            "🚀 Calling resource '{}' ({} {}) request {}",
            resource.name,
            ctx.method.to_uppercase(),
            resource.uri,
            ctx.request_id
        );

        if let Some(security) = &meta.security {
            let verdict = self.evaluator.evaluate(security, ctx)?;
            if verdict.data() != &Value::Bool(true) {
                tracing::warn!("🔒 Security check rejected request {}", ctx.request_id);
                return Err(ApiError::unauthorized(None));
            }
        }

        let cache_key = self.cache_key(ctx);
        let cached = match (&self.cache, &cache_key) {
            (Some(cache), Some(key)) => cache.get(key),
            _ => None,
        };

        let result = match cached {
            Some(result) => result,
            None => {
                FragmentResolver::new(&self.evaluator).resolve(&meta.fragments, ctx)?;
                let result = self.evaluator.evaluate(&meta.process, ctx)?;
                if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
                    cache.put(key, result.clone(), ctx.ttl);
                }
                result
            }
        };
        ctx.payload = Some(result);

        let rendered = match &meta.output {
            None => self.render_format(ctx)?,
            Some(SlotValue::Literal(Value::String(s))) if s == RESPONSE_LITERAL => self.render_format(ctx)?,
            Some(output) => self.evaluator.evaluate(output, ctx)?,
        };

        tracing::info!("✅ Request {} completed in {:?}", ctx.request_id, call_start.elapsed());
        Ok(GatewayResponse {
            status: 200,
            content_type: content_type(rendered.data_type()),
            body: rendered.to_text(),
        })
    }

    /// Render the payload with the output processor named by the request format
    fn render_format(&self, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let registry = self.evaluator.registry();
        let format = if registry.resolve_in(Namespace::Output, &ctx.out_format).is_ok() {
            ctx.out_format.clone()
        } else {
            tracing::debug!("Unknown output format '{}', using json", ctx.out_format);
            "json".to_string()
        };
        let node = MetaNode::new(RESPONSE_LITERAL, format);
        self.evaluator.evaluate(&SlotValue::node(node), ctx)
    }

    /// `None` when results of this call must not be cached
    fn cache_key(&self, ctx: &RequestContext) -> Option<String> {
        if self.cache.is_none() || ctx.ttl == 0 {
            return None;
        }
        let mut path = format!("{}/{}", ctx.app_id, ctx.uri);
        for arg in &ctx.args {
            path.push('/');
            path.push_str(arg);
        }
        Some(ResultCache::key(&ctx.method, &path))
    }
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
