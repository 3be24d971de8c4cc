//! Static resolution behavior: the self-initializer check and the depth
//! semantics observable through closures.

use pretty_assertions::assert_eq;
use rill::{CollectStringPrint, Diagnostic, Runner};

fn compile_errors(source: &str) -> Vec<Diagnostic> {
    Runner::compile(source).expect_err("source should fail to compile")
}

fn run_program(source: &str) -> String {
    let runner = Runner::compile(source).expect("program should compile");
    let mut print = CollectStringPrint::new();
    runner.run(&mut print).expect("program should run without errors");
    print.into_output()
}

#[test]
fn reading_a_local_in_its_own_initializer_is_a_static_error() {
    let errors = compile_errors("{ var a = a; }");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "Error at 'a': Can't read local variable in its own initializer."
    );
}

#[test]
fn shadowing_initializer_may_not_read_the_name_it_declares() {
    // even though an outer `a` exists, the initializer of the shadowing `a`
    // sees the name mid-declaration in the innermost scope
    let errors = compile_errors("var a = 1; { var a = a + 1; }");
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0]
            .message
            .contains("Can't read local variable in its own initializer."),
        "got: {errors:?}"
    );
}

#[test]
fn initializer_check_consults_only_the_innermost_scope() {
    // inside the lambda body a fresh scope is innermost, so the enclosing
    // `a` being mid-declaration is not the static error; the reference
    // resolves outward to that binding and fails at runtime instead, since
    // the lambda runs before `a` is defined
    let source = "{ var a = fun () { return a; }(); }";
    let runner = Runner::compile(source).expect("no static error for an enclosing declaration");
    let mut print = CollectStringPrint::new();
    let err = runner
        .run(&mut print)
        .expect_err("the captured binding is not defined yet");
    assert_eq!(err.message, "Undefined variable 'a'.");
}

#[test]
fn top_level_self_reference_is_dynamic_not_static() {
    // globals are never resolved, so this is a runtime failure
    let runner = Runner::compile("var a = a;").expect("top-level code has no resolver scopes");
    let mut print = CollectStringPrint::new();
    let err = runner.run(&mut print).expect_err("reading an undefined global");
    assert_eq!(err.message, "Undefined variable 'a'.");
}

#[test]
fn declared_functions_may_recurse_by_name() {
    let output = run_program(
        "{\n\
           fun count(n) {\n\
             if (n > 0) { count(n - 1); print n; }\n\
           }\n\
           count(3);\n\
         }",
    );
    assert_eq!(output, "1\n2\n3\n");
}

#[test]
fn resolved_depths_survive_shadowing_between_definition_and_call() {
    // the function reads the parameter at a fixed depth; the block-level
    // variable of the same name defined later must not be visible to it
    let output = run_program(
        "{\n\
           var x = \"param\";\n\
           fun read() { return x; }\n\
           var result = read();\n\
           {\n\
             var x = \"shadow\";\n\
             result = result + \"/\" + read();\n\
           }\n\
           print result;\n\
         }",
    );
    assert_eq!(output, "param/param\n");
}

#[test]
fn each_function_scope_resolves_params_and_body_together() {
    // a parameter shadows an enclosing binding for the whole body
    let output = run_program(
        "var x = \"global\";\n\
         fun show(x) { print x; }\n\
         show(\"arg\");\n\
         print x;",
    );
    assert_eq!(output, "arg\nglobal\n");
}

#[test]
fn sibling_scopes_do_not_leak_bindings() {
    let source = "{ { var hidden = 1; } print hidden; }";
    let runner = Runner::compile(source).expect("sibling scope reference resolves to global");
    let mut print = CollectStringPrint::new();
    let err = runner.run(&mut print).expect_err("no global 'hidden' exists");
    assert_eq!(err.message, "Undefined variable 'hidden'.");
}
