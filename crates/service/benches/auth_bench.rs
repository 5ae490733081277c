use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::auth::domain::Credentials;
use service::auth::password::Argon2Hasher;
use service::auth::repository::mock::MockAuthRepository;
use service::auth::token::{TokenClaims, TokenCodec};
use service::auth::{AuthConfig, AuthService};

fn bench_login(c: &mut Criterion) {
    let repo = Arc::new(MockAuthRepository::default());
    let codec = TokenCodec::new("secret").unwrap();
    let svc = AuthService::new(repo, Arc::new(Argon2Hasher::default()), codec, AuthConfig::default());

    // pre-create user outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(svc.register(Credentials::new("bench", "Benchmark1"))).unwrap();

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            rt.block_on(svc.login(Credentials::new("bench", "Benchmark1"))).unwrap();
        });
    });
}

fn bench_token(c: &mut Criterion) {
    let codec = TokenCodec::new("secret").unwrap();
    let claims = TokenClaims::new("0b6f6a3e-7f0c-4a5e-9a51-4f1f0d7b8c11", i64::MAX);
    let token = codec.encode(&claims).unwrap();

    c.bench_function("token_encode", |b| b.iter(|| codec.encode(&claims).unwrap()));
    c.bench_function("token_decode", |b| b.iter(|| codec.decode(&token).unwrap()));
}

criterion_group!(benches, bench_login, bench_token);
criterion_main!(benches);
