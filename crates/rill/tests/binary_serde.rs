//! A compiled `Runner` round-trips through `dump`/`load` and behaves
//! identically afterwards.

use pretty_assertions::assert_eq;
use rill::{CollectStringPrint, Runner};

const PROGRAM: &str = "\
fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
var words = \"fib of ten is \";
print words + \"...\";
print fib(10);
";

fn output_of(runner: &Runner) -> String {
    let mut print = CollectStringPrint::new();
    runner.run(&mut print).expect("program should run");
    print.into_output()
}

#[test]
fn dump_then_load_preserves_behavior() {
    let runner = Runner::compile(PROGRAM).expect("program should compile");
    let expected = output_of(&runner);
    assert_eq!(expected, "fib of ten is ...\n55\n");

    let bytes = runner.dump().expect("dump should serialize");
    let restored = Runner::load(&bytes).expect("load should deserialize");
    assert_eq!(output_of(&restored), expected);
}

#[test]
fn loaded_runners_preserve_resolved_closures() {
    let source = "\
var a = \"global\";
{
  fun show() { print a; }
  show();
  var a = \"block\";
  show();
}
";
    let runner = Runner::compile(source).expect("program should compile");
    let bytes = runner.dump().expect("dump should serialize");
    let restored = Runner::load(&bytes).expect("load should deserialize");
    assert_eq!(
        output_of(&restored),
        "global\nglobal\n",
        "depth table must survive the round trip"
    );
}

#[test]
fn load_rejects_garbage() {
    assert!(Runner::load(&[0xFF, 0x13, 0x37]).is_err());
}
