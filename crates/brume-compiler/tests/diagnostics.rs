use brume_compiler::{compile, CompileError, Compiler, CompilerOptions, Diagnostic, ErrorLocation, MAX_NESTING};
use brume_core::{Chunk, MAX_CONSTANTS};
use pretty_assertions::assert_eq;

fn errors(src: &str) -> Vec<String> {
    let mut chunk = Chunk::new();
    match compile(src, &mut chunk) {
        Ok(()) => Vec::new(),
        Err(CompileError { diagnostics }) => diagnostics.iter().map(ToString::to_string).collect(),
    }
}

#[test]
fn valid_expressions_compile() {
    for src in ["1", "(1)", "-(1 + 2) * 3 / 4", "!true == false", "nil", "1 < 2 != 3 >= 4"] {
        assert_eq!(errors(src), Vec::<String>::new(), "{src}");
    }
}

#[test]
fn unclosed_group_points_at_end() {
    assert_eq!(errors("(1 + 2"), ["[line 1] Error at end: Expect ')' after expression."]);
}

#[test]
fn trailing_tokens_are_rejected() {
    assert_eq!(errors("1 2"), ["[line 1] Error at '2': Expect end of expression."]);
}

#[test]
fn missing_operand() {
    assert_eq!(errors(")"), ["[line 1] Error at ')': Expect expression."]);
    assert_eq!(errors(""), ["[line 1] Error at end: Expect expression."]);
    assert_eq!(errors("1 +\n\n)"), ["[line 3] Error at ')': Expect expression."]);
}

#[test]
fn strings_have_no_prefix_rule() {
    assert_eq!(errors("-\"abc\""), ["[line 1] Error at '\"abc\"': Expect expression."]);
}

#[test]
fn lexical_errors_carry_no_location() {
    assert_eq!(errors("1 + @"), ["[line 1] Error: Unexpected character."]);
    assert_eq!(errors("\"open\nstring"), ["[line 2] Error: Unterminated string."]);
}

#[test]
fn panic_mode_keeps_only_the_first_error() {
    let mut chunk = Chunk::new();
    let err = compile(") ) ) 1 2", &mut chunk).unwrap_err();
    assert_eq!(err.diagnostics.len(), 1);
    assert_eq!(
        err.diagnostics[0],
        Diagnostic { line: 1, location: ErrorLocation::Lexeme(")".into()), message: "Expect expression.".into() }
    );
}

#[test]
fn nesting_up_to_the_limit_compiles() {
    let minus = format!("{}1", "-".repeat(MAX_NESTING - 1));
    let parens = format!("{}1{}", "(".repeat(MAX_NESTING - 1), ")".repeat(MAX_NESTING - 1));
    assert_eq!(errors(&minus), Vec::<String>::new());
    assert_eq!(errors(&parens), Vec::<String>::new());
}

#[test]
fn deep_unary_chain_is_a_compile_error() {
    assert_eq!(errors(&format!("{}1", "-".repeat(MAX_NESTING))), ["[line 1] Error at '-': Expression nests too deeply."]);
    assert_eq!(
        errors(&format!("{}1", "-".repeat(200_000))),
        ["[line 1] Error at '-': Expression nests too deeply."]
    );
    assert_eq!(errors(&format!("{}true", "!".repeat(200_000))), ["[line 1] Error at '!': Expression nests too deeply."]);
}

#[test]
fn deep_grouping_is_a_compile_error() {
    let src = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
    assert_eq!(errors(&src), ["[line 1] Error at '(': Expression nests too deeply."]);
}

fn sum_of(count: usize) -> String {
    (0..count).map(|n| n.to_string()).collect::<Vec<_>>().join(" + ")
}

#[test]
fn constant_pool_holds_exactly_256_entries() {
    let mut chunk = Chunk::new();
    compile(&sum_of(MAX_CONSTANTS), &mut chunk).unwrap();
    assert_eq!(chunk.constants().len(), MAX_CONSTANTS);
}

#[test]
fn constant_257_is_an_error() {
    let mut chunk = Chunk::new();
    let err = compile(&sum_of(MAX_CONSTANTS + 1), &mut chunk).unwrap_err();
    assert_eq!(err.to_string(), "[line 1] Error at '256': Too many constants in one chunk.");
    assert_eq!(chunk.constants().len(), MAX_CONSTANTS);
}

#[test]
fn compile_error_display_joins_lines() {
    let err = CompileError {
        diagnostics: vec![
            Diagnostic { line: 1, location: ErrorLocation::End, message: "a".into() },
            Diagnostic { line: 2, location: ErrorLocation::Unlocated, message: "b".into() },
        ],
    };
    assert_eq!(err.to_string(), "[line 1] Error at end: a\n[line 2] Error: b");
}

#[test]
fn print_code_does_not_change_output() {
    let mut plain = Chunk::new();
    let mut listed = Chunk::new();
    compile("1 + 2", &mut plain).unwrap();
    Compiler::new(CompilerOptions { print_code: true }).compile("1 + 2", &mut listed).unwrap();
    assert_eq!(plain, listed);
}
