use super::*;
use crate::processor::contract::{Processor, ProcessorContract, ProcessorInput};
use crate::resource::types::{Resource, ResourceDocument};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts how often the process section really runs
struct Tick {
    calls: Arc<AtomicUsize>,
}

impl Processor for Tick {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Tick", "tick", "Counts its evaluations", "Test")
    }

    fn process(&self, _input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(DataContainer::from_literal(Value::from(n as i64)))
    }
}

fn gateway(cache_enabled: bool) -> (Gateway, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ProcessorRegistry::with_builtins().unwrap();
    let counter = Arc::clone(&calls);
    registry
        .register(Namespace::Processor, move || {
            Box::new(Tick {
                calls: Arc::clone(&counter),
            }) as Box<dyn Processor>
        })
        .unwrap();
    (Gateway::new(Arc::new(registry), cache_enabled, "json"), calls)
}

fn route(document: &str, args: &[&str]) -> RouteMatch {
    let document = ResourceDocument::parse(document).unwrap();
    RouteMatch {
        resource: Arc::new(Resource::from_document("r1".to_string(), document)),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

const SUM: &str = r#"{
    "name": "Sum", "description": "", "appid": "app", "method": "get", "uri": "math/sum", "ttl": 0,
    "process": {
        "id": 1, "processor": "add",
        "a": {"id": 2, "processor": "var_int", "value": 3},
        "b": {"id": 3, "processor": "var_int", "value": 4}
    }
}"#;

#[test]
fn process_result_is_rendered_as_json() {
    let (gateway, _) = gateway(false);
    let mut ctx = RequestContext::new("app", "get");
    let response = gateway.handle(&route(SUM, &[]), &mut ctx).unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "application/json");
    assert_eq!(response.body, "7");
    assert_eq!(ctx.uri, "math/sum");
}

#[test]
fn requested_format_picks_the_renderer() {
    let (gateway, _) = gateway(false);
    let resource = route(
        r#"{
            "name": "Hi", "description": "", "appid": "app", "method": "get", "uri": "hi", "ttl": 0,
            "process": {"id": 1, "processor": "var_text", "value": "hi"},
            "output": "response"
        }"#,
        &[],
    );

    let mut ctx = RequestContext::new("app", "get");
    ctx.out_format = gateway.format_from_accept(Some("application/xml"));
    let response = gateway.handle(&resource, &mut ctx).unwrap();
    assert_eq!(response.content_type, "application/xml");
    assert_eq!(response.body, r#"<?xml version="1.0" encoding="UTF-8"?><response>hi</response>"#);

    let mut ctx = RequestContext::new("app", "get");
    ctx.out_format = "yaml".to_string();
    let response = gateway.handle(&resource, &mut ctx).unwrap();
    assert_eq!(response.body, "\"hi\"");
}

#[test]
fn output_section_nodes_render_the_payload() {
    let (gateway, _) = gateway(false);
    let resource = route(
        r#"{
            "name": "Hi", "description": "", "appid": "app", "method": "get", "uri": "hi", "ttl": 0,
            "process": {"id": 1, "processor": "var_uri", "index": 0},
            "output": {"id": 9, "processor": "text"}
        }"#,
        &["Alice"],
    );
    let mut ctx = RequestContext::new("app", "get");
    let response = gateway.handle(&resource, &mut ctx).unwrap();
    assert_eq!(response.content_type, "text/plain; charset=utf-8");
    assert_eq!(response.body, "Alice");
}

#[test]
fn security_must_pass_before_processing() {
    let (gateway, calls) = gateway(false);
    let resource = route(
        r#"{
            "name": "Secret", "description": "", "appid": "app", "method": "get", "uri": "secret", "ttl": 0,
            "security": {
                "id": "s1", "processor": "token",
                "token": {"id": "s2", "processor": "bearer_token"},
                "allowed": ["letmein"]
            },
            "process": {"id": 1, "processor": "tick"}
        }"#,
        &[],
    );

    let mut ctx = RequestContext::new("app", "get");
    let err = gateway.handle(&resource, &mut ctx).unwrap_err();
    assert_eq!(err.status(), 401);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let mut ctx = RequestContext::new("app", "get");
    ctx.token = Some("letmein".to_string());
    assert_eq!(gateway.handle(&resource, &mut ctx).unwrap().body, "1");
}

#[test]
fn security_result_must_be_boolean_true() {
    let (gateway, calls) = gateway(false);
    let resource = route(
        r#"{
            "name": "Open", "description": "", "appid": "app", "method": "get", "uri": "open", "ttl": 0,
            "security": {"id": "s1", "processor": "var_text", "value": "yes"},
            "process": {"id": 1, "processor": "tick"}
        }"#,
        &[],
    );
    let mut ctx = RequestContext::new("app", "get");
    let err = gateway.handle(&resource, &mut ctx).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn results_are_cached_per_path_for_the_ttl() {
    let document = r#"{
        "name": "Tick", "description": "", "appid": "app", "method": "get", "uri": "tick", "ttl": 60,
        "process": {"id": 1, "processor": "tick"}
    }"#;

    let (gateway_cached, calls) = gateway(true);
    let first = route(document, &["a"]);
    for _ in 0..3 {
        let mut ctx = RequestContext::new("app", "get");
        assert_eq!(gateway_cached.handle(&first, &mut ctx).unwrap().body, "1");
    }
    let mut ctx = RequestContext::new("app", "get");
    assert_eq!(gateway_cached.handle(&route(document, &["b"]), &mut ctx).unwrap().body, "2");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let (gateway_uncached, calls) = gateway(false);
    for expected in ["1", "2"] {
        let mut ctx = RequestContext::new("app", "get");
        assert_eq!(gateway_uncached.handle(&first, &mut ctx).unwrap().body, expected);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn accept_header_maps_to_formats() {
    let (gateway, _) = gateway(false);
    assert_eq!(gateway.format_from_accept(None), "json");
    assert_eq!(gateway.format_from_accept(Some("text/html, application/xml;q=0.9")), "xml");
    assert_eq!(gateway.format_from_accept(Some("text/plain")), "text");
    assert_eq!(gateway.format_from_accept(Some("*/*")), "json");
}
