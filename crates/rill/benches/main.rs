use criterion::{Criterion, criterion_group, criterion_main};
use rill::{NoPrint, Runner};

const FIB: &str = "\
fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
fib(15);
";

const COUNTER: &str = "\
fun make_counter() {
  var count = 0;
  fun next() {
    count = count + 1;
    return count;
  }
  return next;
}
var tick = make_counter();
var i = 0;
while (i < 1000) {
  tick();
  i = i + 1;
}
";

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_fib", |b| {
        b.iter(|| Runner::compile(FIB).expect("benchmark source compiles"));
    });
}

fn bench_run(c: &mut Criterion) {
    let fib = Runner::compile(FIB).expect("benchmark source compiles");
    c.bench_function("run_fib_15", |b| {
        b.iter(|| fib.run(&mut NoPrint).expect("benchmark program runs"));
    });

    let counter = Runner::compile(COUNTER).expect("benchmark source compiles");
    c.bench_function("run_counter_loop", |b| {
        b.iter(|| counter.run(&mut NoPrint).expect("benchmark program runs"));
    });
}

criterion_group!(benches, bench_compile, bench_run);
criterion_main!(benches);
