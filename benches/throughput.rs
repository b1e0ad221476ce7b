use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};
use keyrules::{Config, ReloadController, RequestContext};
use tempfile::TempDir;

/// Write `n` rule files to a temporary directory and load them through a
/// reload controller, the way a running service would.
fn build_shared_controller(n: usize) -> (TempDir, Arc<ReloadController>, RequestContext) {
    let dir = TempDir::new().unwrap();
    for i in 0..n {
        let src = format!(
            "[Policy]\nRules=r{i}\n[r{i}]\nActionContains=org.example.service{i}.\nInUnixGroups=%sudo%\nResult=yes\nResultInverse=auth_admin\n"
        );
        fs::write(dir.path().join(format!("{i:02}-svc.keyrules")), src).unwrap();
    }
    let controller = Arc::new(ReloadController::new(
        &Config::default().with_dirs([dir.path()]),
    ));
    let ctx = RequestContext::new("alice")
        .groups(["users", "wheel"])
        .local(true)
        .active(true);
    (dir, controller, ctx)
}

fn bench_throughput(c: &mut Criterion) {
    let thread_counts = [1, 2, 4, 8];

    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(5));

    for &threads in &thread_counts {
        let (_dir, controller, ctx) = build_shared_controller(20);

        group.bench_function(&format!("{threads}_threads"), |b| {
            b.iter_custom(|iters| {
                let per_thread = iters / threads as u64;
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let rules = Arc::clone(&controller);
                        let c = ctx.clone();
                        thread::spawn(move || {
                            let start = Instant::now();
                            for _ in 0..per_thread {
                                let _ = rules.current().evaluate("org.example.service19.start", &c);
                            }
                            start.elapsed()
                        })
                    })
                    .collect();

                let mut max_elapsed = Duration::ZERO;
                for h in handles {
                    let elapsed = h.join().unwrap();
                    if elapsed > max_elapsed {
                        max_elapsed = elapsed;
                    }
                }
                max_elapsed
            });
        });
    }

    group.finish();
}

fn bench_reload(c: &mut Criterion) {
    let mut group = c.benchmark_group("reload");

    for &n in &[5, 20, 50] {
        let (_dir, controller, _) = build_shared_controller(n);
        group.bench_function(&format!("{n}_files"), |b| {
            b.iter(|| controller.reload().unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_throughput, bench_reload);
criterion_main!(benches);
