/// Fragment resolver
///
/// Evaluates every named fragment of a resource once, before the process tree
/// runs, and stores the results in the request context. `fragment` nodes in the
/// process tree then only look the value up.

use crate::core::{ApiResult, RequestContext};
use crate::resource::types::SlotValue;
use crate::runtime::engine::GraphEvaluator;
use std::collections::BTreeMap;

pub struct FragmentResolver<'e> {
    evaluator: &'e GraphEvaluator,
}

impl<'e> FragmentResolver<'e> {
    pub fn new(evaluator: &'e GraphEvaluator) -> Self {
        Self { evaluator }
    }

    /// Populate `ctx` with every fragment result
    ///
    /// Fragments are evaluated in name order, so a fragment may reference one
    /// whose name sorts before its own. Calling this twice for the same request
    /// is a no-op.
    pub fn resolve(
        &self,
        fragments: &BTreeMap<String, SlotValue>,
        ctx: &mut RequestContext,
    ) -> ApiResult<()> {
        if ctx.fragments_resolved() {
            tracing::debug!("🧩 Fragments already resolved for request {}", ctx.request_id);
            return Ok(());
        }

        for (name, tree) in fragments {
            tracing::debug!("🧩 Resolving fragment '{}'", name);
            let value = self.evaluator.evaluate(tree, ctx)?;
            ctx.insert_fragment(name.clone(), value);
        }
        ctx.mark_fragments_resolved();

        if !fragments.is_empty() {
            tracing::info!("🧩 Resolved {} fragments", fragments.len());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fragments_test.rs"]
mod tests;
