//! Front-end diagnostics: what the scanner and parser report, and how the
//! parser recovers so one compile surfaces several problems.

use rill::{CollectDiagnostics, Diagnostic, Runner};

/// Compiles `source` and returns the diagnostics it must produce.
fn compile_errors(source: &str) -> Vec<Diagnostic> {
    Runner::compile(source).expect_err("source should fail to compile")
}

fn assert_compiles(source: &str) {
    assert!(
        Runner::compile(source).is_ok(),
        "source should compile cleanly: {source}"
    );
}

#[test]
fn missing_semicolon_is_reported_at_end() {
    let errors = compile_errors("print 1");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line, 1);
    assert_eq!(errors[0].message, "Error at end: Expect ';' after value.");
}

#[test]
fn missing_expression_quotes_the_offending_token() {
    let errors = compile_errors("print ;");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Error at ';': Expect expression.");
}

#[test]
fn synchronization_surfaces_multiple_errors() {
    let errors = compile_errors("var = 1;\nvar y 2;\nprint 3");
    assert_eq!(
        errors.len(),
        3,
        "each statement should contribute its own diagnostic: {errors:?}"
    );
    assert_eq!(errors[0].line, 1);
    assert_eq!(errors[0].message, "Error at '=': Expect variable name.");
    assert_eq!(errors[1].line, 2);
    assert_eq!(
        errors[1].message,
        "Error at '2': Expect ';' after variable declaration."
    );
    assert_eq!(errors[2].line, 3);
}

#[test]
fn recovery_resumes_at_statement_keywords() {
    // no semicolon before `var`, so the parser must resynchronize on the
    // keyword itself to see the second error
    let errors = compile_errors("1 + + 2\nvar 5 = 3;");
    assert!(
        errors.iter().any(|e| e.message.contains("Expect variable name.")),
        "parser should reach the second statement: {errors:?}"
    );
}

#[test]
fn invalid_assignment_targets_are_non_fatal() {
    let errors = compile_errors("1 = 2;");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Error at '=': Invalid assignment target.");

    let errors = compile_errors("var a; var b; a + b = 1;");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Error at '=': Invalid assignment target.");
}

#[test]
fn assignment_is_right_associative() {
    assert_compiles("var a; var b; a = b = 1;");
}

#[test]
fn break_outside_any_loop_is_rejected() {
    let errors = compile_errors("break;");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "Error at 'break': Can't use 'break' outside of a loop."
    );
}

#[test]
fn break_may_not_cross_a_function_boundary() {
    let errors = compile_errors("while (true) { fun f() { break; } }");
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0].message.contains("Can't use 'break' outside of a loop."),
        "a function body resets the loop context: {errors:?}"
    );
}

#[test]
fn break_inside_loops_is_accepted() {
    assert_compiles("while (false) break;");
    assert_compiles("for (;;) break;");
    assert_compiles("while (true) { if (true) break; }");
}

#[test]
fn parameter_limit_is_a_diagnostic_not_a_failure_to_continue() {
    let params: Vec<String> = (0..=255).map(|i| format!("p{i}")).collect();
    let source = format!("fun big({}) {{}}", params.join(", "));
    let errors = compile_errors(&source);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Can't have more than 255 parameters."));
}

#[test]
fn argument_limit_is_a_diagnostic_not_a_failure_to_continue() {
    let args: Vec<String> = (0..=255).map(|i| i.to_string()).collect();
    let source = format!("fun f() {{}}\nf({});", args.join(", "));
    let errors = compile_errors(&source);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Can't have more than 255 arguments."));
}

#[test]
fn at_most_255_parameters_compile_cleanly() {
    let params: Vec<String> = (0..255).map(|i| format!("p{i}")).collect();
    assert_compiles(&format!("fun big({}) {{}}", params.join(", ")));
}

#[test]
fn fun_keyword_starts_a_declaration_only_before_an_identifier() {
    // lambda in statement position
    assert_compiles("fun () {};");
    // lambda assigned to a variable
    assert_compiles("var f = fun (x) { return x; };");
    // declaration form
    assert_compiles("fun f(x) { return x; }");
}

#[test]
fn lambda_without_a_body_is_rejected() {
    let errors = compile_errors("fun ();");
    assert!(
        errors[0].message.contains("Expect '{' before function body."),
        "got: {errors:?}"
    );
}

#[test]
fn unterminated_string_is_a_scan_error() {
    let errors = compile_errors("print \"oops");
    assert!(
        errors.iter().any(|e| e.message.contains("Unterminated string.")),
        "got: {errors:?}"
    );
}

#[test]
fn unexpected_character_is_a_scan_error() {
    let errors = compile_errors("print 1 # 2;");
    assert!(
        errors.iter().any(|e| e.message.contains("Unexpected character.")),
        "got: {errors:?}"
    );
}

#[test]
fn class_keyword_is_reserved() {
    // `class` parses as no known statement, and the error after it proves
    // the parser synchronized rather than giving up
    let errors = compile_errors("class Foo;\nprint ;");
    assert!(errors.len() >= 2, "expected both errors, got: {errors:?}");
    assert!(errors[0].message.contains("Expect expression."));
}

#[test]
fn missing_closing_brace_is_reported() {
    let errors = compile_errors("{ print 1;");
    assert!(
        errors.iter().any(|e| e.message.contains("Expect '}' after block.")),
        "got: {errors:?}"
    );
}

#[test]
fn if_requires_parenthesized_condition() {
    let errors = compile_errors("if true print 1;");
    assert_eq!(errors[0].message, "Error at 'true': Expect '(' after 'if'.");
}

#[test]
fn empty_source_compiles_to_an_empty_program() {
    assert_compiles("");
    assert_compiles("// just a comment\n");
}

#[test]
fn compile_into_reports_through_a_caller_sink() {
    let mut sink = CollectDiagnostics::new();
    assert!(Runner::compile_into("print ;", &mut sink).is_none());
    assert!(sink.had_error());

    let mut sink = CollectDiagnostics::new();
    assert!(Runner::compile_into("print 1;", &mut sink).is_some());
    assert!(!sink.had_error());
}

#[test]
fn diagnostics_display_with_their_line() {
    let errors = compile_errors("print ;");
    assert_eq!(
        errors[0].to_string(),
        "[line 1] Error at ';': Expect expression."
    );
}
