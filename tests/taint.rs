//! Taint-tracking integration tests: sources, transfers and sinks riding a
//! context-sensitive pointer analysis.

use std::io::Write;

use irscope::prelude::*;

/// String type, an opaque source `Request.getSecret(): String`, an opaque
/// transfer candidate `Util.concat(String, String): String` and a sink
/// `Log.leak(String)`.
fn taint_fixture() -> (ProgramBuilder, TypeId, MethodId, MethodId, MethodId) {
    let mut pb = ProgramBuilder::new();
    let string = pb.add_class("String", None);
    let string_ty = pb.class_type(string);

    let request = pb.add_class("Request", None);
    let get_secret = pb.declare_method(
        request,
        "getSecret",
        &[],
        Some(string_ty),
        MethodFlags::STATIC | MethodFlags::NATIVE,
    );
    let util = pb.add_class("Util", None);
    let concat = pb.declare_method(
        util,
        "concat",
        &[string_ty, string_ty],
        Some(string_ty),
        MethodFlags::STATIC | MethodFlags::NATIVE,
    );
    let log = pb.add_class("Log", None);
    let leak = pb.declare_method(
        log,
        "leak",
        &[string_ty],
        None,
        MethodFlags::STATIC | MethodFlags::NATIVE,
    );
    (pb, string_ty, get_secret, concat, leak)
}

const CONFIG: &str = r#"{
    "sources":   [ { "method": "Request.getSecret", "type": "String" } ],
    "sinks":     [ { "method": "Log.leak", "index": 0 } ],
    "transfers": [ { "method": "Util.concat",
                     "from": 0, "to": "result", "type": "String" } ]
}"#;

#[test]
fn test_taint_flow_through_transfer() {
    let (mut pb, string_ty, get_secret, concat, leak) = taint_fixture();
    let class = pb.add_class("Main", None);
    let main = pb.declare_method(class, "main", &[], None, MethodFlags::STATIC);

    let mut b = pb.body(main);
    let s = b.var("s", string_ty);
    let u = b.var("u", string_ty);
    let t = b.var("t", string_ty);
    // s = Request.getSecret(); u = new String;
    // t = Util.concat(s, u); Log.leak(t)
    let source_idx = b.call_static(Some(s), get_secret, &[]);
    b.new_obj(u, string_ty);
    b.call_static(Some(t), concat, &[s, u]);
    let sink_idx = b.call_static(None, leak, &[t]);
    b.ret(None);
    b.seal().unwrap();
    let mut program = pb.finish();

    let config = TaintConfig::from_json_str(CONFIG, &mut program).unwrap();
    let result = PointerAnalysis::new(&program, selector_by_name("2-call").unwrap())
        .with_taint(config)
        .solve(main);

    let body = program.method(main).body().unwrap();
    let flows = result.taint_flows();
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].source, body.stmts[source_idx]);
    assert_eq!(flows[0].sink, body.stmts[sink_idx]);
    assert_eq!(flows[0].index, 0);
}

#[test]
fn test_direct_source_to_sink_flow() {
    let (mut pb, string_ty, get_secret, _, leak) = taint_fixture();
    let class = pb.add_class("Main", None);
    let main = pb.declare_method(class, "main", &[], None, MethodFlags::STATIC);

    let mut b = pb.body(main);
    let s = b.var("s", string_ty);
    let copy = b.var("copy", string_ty);
    let source_idx = b.call_static(Some(s), get_secret, &[]);
    b.copy(copy, s);
    let sink_idx = b.call_static(None, leak, &[copy]);
    b.ret(None);
    b.seal().unwrap();
    let mut program = pb.finish();

    let config = TaintConfig::from_json_str(CONFIG, &mut program).unwrap();
    let result = PointerAnalysis::new(&program, selector_by_name("ci").unwrap())
        .with_taint(config)
        .solve(main);

    let body = program.method(main).body().unwrap();
    let flows = result.taint_flows();
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].source, body.stmts[source_idx]);
    assert_eq!(flows[0].sink, body.stmts[sink_idx]);
}

#[test]
fn test_untainted_values_reach_no_sink() {
    let (mut pb, string_ty, _, _, leak) = taint_fixture();
    let class = pb.add_class("Main", None);
    let main = pb.declare_method(class, "main", &[], None, MethodFlags::STATIC);

    let mut b = pb.body(main);
    let clean = b.var("clean", string_ty);
    b.new_obj(clean, string_ty);
    b.call_static(None, leak, &[clean]);
    b.ret(None);
    b.seal().unwrap();
    let mut program = pb.finish();

    let config = TaintConfig::from_json_str(CONFIG, &mut program).unwrap();
    let result = PointerAnalysis::new(&program, selector_by_name("ci").unwrap())
        .with_taint(config)
        .solve(main);
    assert!(result.taint_flows().is_empty());
}

#[test]
fn test_transfer_is_required_for_indirect_flow() {
    // without the concat transfer the taint stops at the call
    let (mut pb, string_ty, get_secret, concat, leak) = taint_fixture();
    let class = pb.add_class("Main", None);
    let main = pb.declare_method(class, "main", &[], None, MethodFlags::STATIC);

    let mut b = pb.body(main);
    let s = b.var("s", string_ty);
    let u = b.var("u", string_ty);
    let t = b.var("t", string_ty);
    b.call_static(Some(s), get_secret, &[]);
    b.new_obj(u, string_ty);
    b.call_static(Some(t), concat, &[s, u]);
    b.call_static(None, leak, &[t]);
    b.ret(None);
    b.seal().unwrap();
    let mut program = pb.finish();

    let no_transfer = r#"{
        "sources": [ { "method": "Request.getSecret", "type": "String" } ],
        "sinks":   [ { "method": "Log.leak", "index": 0 } ]
    }"#;
    let config = TaintConfig::from_json_str(no_transfer, &mut program).unwrap();
    let result = PointerAnalysis::new(&program, selector_by_name("ci").unwrap())
        .with_taint(config)
        .solve(main);
    assert!(result.taint_flows().is_empty());
}

#[test]
fn test_config_loads_from_file() {
    let (mut pb, string_ty, get_secret, _, leak) = taint_fixture();
    let class = pb.add_class("Main", None);
    let main = pb.declare_method(class, "main", &[], None, MethodFlags::STATIC);
    let mut b = pb.body(main);
    let s = b.var("s", string_ty);
    b.call_static(Some(s), get_secret, &[]);
    b.call_static(None, leak, &[s]);
    b.ret(None);
    b.seal().unwrap();
    let mut program = pb.finish();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    let config = TaintConfig::load(file.path(), &mut program).unwrap();

    let result = PointerAnalysis::new(&program, selector_by_name("ci").unwrap())
        .with_taint(config)
        .solve(main);
    assert_eq!(result.taint_flows().len(), 1);
}
