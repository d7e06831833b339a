//! End-to-end tests for the execution coordinator

use super::helpers::{error_of, result_of, run, run_with};
use crate::interpreter::{Capability, Coordinator, SandboxOptions};
use crate::types::ExecutionRequest;
use maplit::hashmap;

/* ===================== Result Inference ===================== */

#[test]
fn test_last_expression_is_result() {
    let response = run("x = 1\nx + 2");
    assert_eq!(result_of(&response), "3");
    assert!(response.logs.is_empty());
}

#[test]
fn test_explicit_return() {
    assert_eq!(result_of(&run("return 'done'")), "done");
}

#[test]
fn test_inline_comment_after_expression() {
    assert_eq!(result_of(&run("x = 3\nx * 2 -- doubled")), "6");
}

#[test]
fn test_scalar_rendering() {
    assert_eq!(result_of(&run("10 / 4")), "2.5");
    assert_eq!(result_of(&run("2^2")), "4.0");
    assert_eq!(result_of(&run("'a' .. 'b'")), "ab");
    assert_eq!(result_of(&run("1 == 1")), "true");
}

#[test]
fn test_nil_result_is_absent() {
    let response = run("nil");
    assert!(response.is_success());
    assert_eq!(response.result, None);
}

#[test]
fn test_statement_script_has_no_result() {
    let response = run("local x = 1");
    assert!(response.is_success());
    assert_eq!(response.result, None);
}

#[test]
fn test_keyword_prefixed_identifier_is_a_result() {
    assert_eq!(result_of(&run("repeated = 1\nrepeated")), "1");
}

#[test]
fn test_function_result_is_opaque_text() {
    assert!(result_of(&run("print")).starts_with("function: "));
}

/* ===================== Fallback ===================== */

#[test]
fn test_fallback_when_rewrite_breaks_syntax() {
    let response = run("local t = {\n  1, 2\n}");
    assert!(response.is_success(), "{:?}", response.error);
    assert_eq!(response.result, None);
}

#[test]
fn test_fallback_reports_original_result() {
    assert_eq!(result_of(&run("do return 7 end\nx = 1")), "7");
}

#[test]
fn test_fallback_reports_original_error_not_rewrite_error() {
    let response = run("y = nil + 1\nx = 1");
    let error = error_of(&response);
    assert!(error.contains("arithmetic"), "{error}");
    assert!(!error.contains("syntax error"), "{error}");
}

#[test]
fn test_fallback_keeps_output_of_both_attempts() {
    let response = run("print('a')\nerror('boom')");
    assert!(error_of(&response).contains("boom"));
    assert_eq!(response.logs, vec!["a", "a"]);
}

#[test]
fn test_output_from_failed_candidate_is_not_discarded() {
    let response = run("print(math.random(1, 1000000000))\nerror('boom')");
    assert!(error_of(&response).contains("boom"));
    assert_eq!(response.logs.len(), 2);
}

#[test]
fn test_statement_last_line_runs_once() {
    let response = run("print('x')\ny = 1\nlocal z = y + nil");
    assert!(error_of(&response).contains("arithmetic"));
    assert_eq!(response.logs, vec!["x"]);
}

#[test]
fn test_error_without_rewrite() {
    let response = run("local = 5");
    assert!(!error_of(&response).is_empty());
}

#[test]
fn test_runtime_error_text_is_interpreter_message() {
    let response = run("error('boom')");
    let error = error_of(&response);
    assert!(error.starts_with("[string \"script\"]:1: boom"), "{error}");
    assert!(!error.starts_with("runtime error"), "{error}");
}

#[test]
fn test_syntax_error_text_is_interpreter_message() {
    let response = run("local = 5");
    let error = error_of(&response);
    assert!(error.starts_with("[string \"script\"]:1:"), "{error}");
    assert!(!error.starts_with("syntax error"), "{error}");
}

#[test]
fn test_module_error_text_is_unwrapped() {
    let response = run("require('base64').decode('***')");
    let error = error_of(&response);
    assert!(error.starts_with("base64: "), "{error}");
}

/* ===================== Variables ===================== */

#[test]
fn test_variable_binding() {
    let response = run_with(
        "return 'hello ' .. name",
        hashmap! { "name".to_string() => "world".to_string() },
    );
    assert_eq!(result_of(&response), "hello world");
}

#[test]
fn test_variables_stay_strings() {
    let response = run_with(
        "type(n) .. ':' .. (tonumber(n) * 2)",
        hashmap! { "n".to_string() => "21".to_string() },
    );
    assert_eq!(result_of(&response), "string:42");
}

/* ===================== Composite Results ===================== */

#[test]
fn test_composite_array_then_map() {
    assert_eq!(result_of(&run("{1, 2, foo = 'bar'}")), "{1, 2, foo = bar}");
}

#[test]
fn test_composite_map_entries_present_once() {
    let response = run("return {a = 1, b = 2, c = 3}");
    let rendered = result_of(&response);
    let inner = rendered.trim_start_matches('{').trim_end_matches('}');
    let mut entries: Vec<&str> = inner.split(", ").collect();
    entries.sort_unstable();
    assert_eq!(entries, vec!["a = 1", "b = 2", "c = 3"]);
}

#[test]
fn test_nested_and_empty_composites() {
    assert_eq!(result_of(&run("{{1}, {}, n = {x = true}}")), "{{1}, {}, n = {x = true}}");
    assert_eq!(result_of(&run("{}")), "{}");
}

#[test]
fn test_sparse_table_splits_at_gap() {
    assert_eq!(result_of(&run("{[1] = 'a', [2] = 'b', [4] = 'd'}")), "{a, b, 4 = d}");
}

#[test]
fn test_self_referential_table_does_not_crash() {
    let response = run("local t = {}\nt.me = t\nt");
    assert!(result_of(&response).contains("table: "));
}

/* ===================== Output Capture ===================== */

#[test]
fn test_log_ordering() {
    let response = run("print(\"1\", \"2\")\nprint(\"x\")");
    assert!(response.is_success());
    assert_eq!(response.result, None);
    assert_eq!(response.logs, vec!["1\t2", "x"]);
}

#[test]
fn test_partial_output_on_failure() {
    let response = run("print('before')\nlocal x = nil\nx.field = 1");
    assert!(response.error.is_some());
    assert_eq!(response.result, None);
    assert_eq!(response.logs, vec!["before"]);
}

#[test]
fn test_print_and_result_together() {
    let response = run("print('Hello from Lua!')\n\n-- The last expression is the result\n\"hello world\"");
    assert_eq!(result_of(&response), "hello world");
    assert_eq!(response.logs, vec!["Hello from Lua!"]);
}

#[test]
fn test_multiline_long_string_is_not_rewritten() {
    let response = run("print([[a\nb]])");
    assert!(response.is_success());
    assert_eq!(response.logs, vec!["a\nb"]);
}

#[test]
fn test_log_module_shares_output() {
    let response = run("print('one')\nrequire('log').write('two')\nprint('three')");
    assert_eq!(response.logs, vec!["one", "two", "three"]);
}

/* ===================== Isolation ===================== */

#[test]
fn test_globals_do_not_leak_between_requests() {
    let coordinator = Coordinator::default();
    coordinator.execute(&ExecutionRequest::new("shared = 1"));
    let response = coordinator.execute(&ExecutionRequest::new("shared"));
    assert!(response.is_success());
    assert_eq!(response.result, None);
}

#[test]
fn test_parallel_requests_are_independent() {
    let coordinator = Coordinator::default();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let coordinator = &coordinator;
                scope.spawn(move || {
                    let request = ExecutionRequest::new("print(n)\ntonumber(n) * 10")
                        .with_variables(hashmap! { "n".to_string() => i.to_string() });
                    (i, coordinator.execute(&request))
                })
            })
            .collect();

        for handle in handles {
            let (i, response) = handle.join().unwrap();
            assert_eq!(response.result, Some((i * 10).to_string()));
            assert_eq!(response.logs, vec![i.to_string()]);
        }
    });
}

#[test]
fn test_restricted_capabilities() {
    let coordinator = Coordinator::new(SandboxOptions {
        capabilities: vec![Capability::Hash],
        ..SandboxOptions::default()
    });
    let ok = coordinator.execute(&ExecutionRequest::new("require('hash').md5('')"));
    assert_eq!(ok.result.as_deref(), Some("d41d8cd98f00b204e9800998ecf8427e"));

    let denied = coordinator.execute(&ExecutionRequest::new("require('json')"));
    assert!(denied.error.unwrap().contains("json"));
}
