use brume_vm::{InterpretResult, Vm, VmOptions};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

struct Outcome {
    result: InterpretResult,
    out: String,
    err: String,
}

fn interpret(src: &str) -> Outcome {
    let mut vm = Vm::with_output(Vec::new(), Vec::new());
    let result = vm.interpret(src);
    let (out, err) = vm.into_output();
    Outcome { result, out: String::from_utf8(out).unwrap(), err: String::from_utf8(err).unwrap() }
}

fn value_of(src: &str) -> String {
    let o = interpret(src);
    assert_eq!(o.result, InterpretResult::Ok, "{src}: {}", o.err);
    assert_eq!(o.err, "");
    o.out.trim_end_matches('\n').to_owned()
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(value_of("2 + 3 * 4"), "14");
    assert_eq!(value_of("(2 + 3) * 4"), "20");
    assert_eq!(value_of("10 - 4 - 3"), "3");
    assert_eq!(value_of("8 / 4 / 2"), "1");
}

#[test]
fn unary_minus_binds_tighter() {
    assert_eq!(value_of("-2 + 3"), "1");
    assert_eq!(value_of("--2"), "2");
}

#[test]
fn division_follows_ieee() {
    assert_eq!(value_of("1 / 0"), "inf");
    assert_eq!(value_of("-1 / 0"), "-inf");
    assert_eq!(value_of("0 / 0"), "NaN");
}

#[test]
fn falsey_set_is_nil_and_false() {
    assert_eq!(value_of("!nil"), "true");
    assert_eq!(value_of("!false"), "true");
    assert_eq!(value_of("!0"), "false");
    assert_eq!(value_of("!true"), "false");
}

#[test]
fn equality_across_types() {
    assert_eq!(value_of("nil == false"), "false");
    assert_eq!(value_of("nil == nil"), "true");
    assert_eq!(value_of("1 == 1"), "true");
    assert_eq!(value_of("1 != true"), "true");
    assert_eq!(value_of("0 / 0 == 0 / 0"), "false");
}

#[test]
fn comparisons() {
    assert_eq!(value_of("1 < 2"), "true");
    assert_eq!(value_of("2 > 3"), "false");
    assert_eq!(value_of("1 <= 1"), "true");
    assert_eq!(value_of("1 >= 2"), "false");
}

#[test]
fn literals_print_verbatim() {
    assert_eq!(value_of("nil"), "nil");
    assert_eq!(value_of("true"), "true");
    assert_eq!(value_of("1.5"), "1.5");
}

#[test]
fn negating_a_non_number_is_a_runtime_error() {
    let o = interpret("-true");
    assert_eq!(o.result, InterpretResult::RuntimeError);
    assert_eq!(o.err, "Operand must be a number.\n[line 1] in script\n");
    assert_eq!(o.out, "");
}

#[test]
fn arithmetic_on_non_numbers_is_a_runtime_error() {
    for src in ["1 + nil", "true * 2", "nil < nil", "false - false"] {
        let o = interpret(src);
        assert_eq!(o.result, InterpretResult::RuntimeError, "{src}");
        assert_eq!(o.err, "Operands must be numbers.\n[line 1] in script\n", "{src}");
        assert_eq!(o.out, "");
    }
}

#[test]
fn runtime_errors_report_the_failing_line() {
    let o = interpret("1 +\n\n-nil");
    assert_eq!(o.err, "Operand must be a number.\n[line 3] in script\n");
}

#[test]
fn compile_errors_never_run() {
    let o = interpret("(1 + 2");
    assert_eq!(o.result, InterpretResult::CompileError);
    assert_eq!(o.err, "[line 1] Error at end: Expect ')' after expression.\n");
    assert_eq!(o.out, "");
}

#[test]
fn string_literals_are_rejected_at_compile_time() {
    let o = interpret("-\"not a number\"");
    assert_eq!(o.result, InterpretResult::CompileError);
    assert_eq!(o.err, "[line 1] Error at '\"not a number\"': Expect expression.\n");
}

#[test]
fn deep_nesting_overflows_the_stack() {
    let depth = 300;
    let src = format!("{}nil{}", "nil == (".repeat(depth), ")".repeat(depth));
    let o = interpret(&src);
    assert_eq!(o.result, InterpretResult::RuntimeError);
    assert_eq!(o.err, "Stack overflow.\n[line 1] in script\n");
}

#[test]
fn one_vm_serves_many_lines() {
    let mut vm = Vm::with_output(Vec::new(), Vec::new()).with_options(VmOptions::default());
    assert_eq!(vm.interpret("1 + 1"), InterpretResult::Ok);
    assert_eq!(vm.interpret("-nil"), InterpretResult::RuntimeError);
    assert_eq!(vm.interpret(")"), InterpretResult::CompileError);
    assert_eq!(vm.interpret("3 * 3"), InterpretResult::Ok);
    let (out, err) = vm.into_output();
    assert_eq!(String::from_utf8(out).unwrap(), "2\n9\n");
    assert_eq!(
        String::from_utf8(err).unwrap(),
        "Operand must be a number.\n[line 1] in script\n[line 1] Error at ')': Expect expression.\n"
    );
}

#[test]
fn deep_nesting_is_reported_not_fatal() {
    let o = interpret(&format!("{}1", "-".repeat(200_000)));
    assert_eq!(o.result, InterpretResult::CompileError);
    assert_eq!(o.out, "");
    assert_eq!(o.err, "[line 1] Error at '-': Expression nests too deeply.\n");
}

#[test]
fn tracing_options_do_not_change_results() {
    let options = VmOptions { trace_execution: true, print_code: true };
    let mut vm = Vm::with_output(Vec::new(), Vec::new()).with_options(options);
    assert_eq!(vm.interpret("(1 + 2) * -3"), InterpretResult::Ok);
    let (out, _) = vm.into_output();
    assert_eq!(out, b"-9\n");
}

proptest! {
    #[test]
    fn numbers_round_trip(n in 0.0f64..1e12) {
        prop_assert_eq!(value_of(&n.to_string()), n.to_string());
    }

    #[test]
    fn integers_round_trip(n in any::<u32>()) {
        prop_assert_eq!(value_of(&n.to_string()), n.to_string());
    }

    #[test]
    fn addition_matches_f64(a in 0u32..1_000_000, b in 0u32..1_000_000) {
        let expected = (f64::from(a) + f64::from(b)).to_string();
        prop_assert_eq!(value_of(&format!("{a} + {b}")), expected);
    }
}
