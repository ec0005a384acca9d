use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::directory::domain::{CreateUserInput, LoginInput};
use service::directory::service::{DirectoryConfig, DirectoryService};
use service::storage::mock::MemoryUserStore;

fn bench_login(c: &mut Criterion) {
    let svc = DirectoryService::new(Arc::new(MemoryUserStore::default()), DirectoryConfig::default());

    // pre-create user outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(svc.create(CreateUserInput {
        name: "Bench".into(),
        email: "bench@example.com".into(),
        password: "Benchmark1".into(),
        role: "usuario".into(),
    }))
    .expect("seed bench user");

    c.bench_function("directory_login_verify", |b| {
        b.iter(|| {
            let _ = rt
                .block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() }))
                .unwrap();
        });
    });
}

criterion_group!(benches, bench_login);
criterion_main!(benches);
