use axum::http::{header, HeaderMap, HeaderValue};
use chrono::Duration;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use idcdetect::auth::session::normalize_cookie_token;
use idcdetect::auth::{hash_password, verify_password, Role, SessionResolver, TokenIssuer};

const SECRET: &str = "benchmark-secret-0123456789abcdef";

fn bench_token_issue_and_verify(c: &mut Criterion) {
    let issuer = TokenIssuer::new(SECRET, Duration::minutes(60));

    c.bench_function("token_issue", |b| {
        b.iter(|| issuer.issue(black_box("alice"), Role::Patient))
    });

    let token = issuer.issue("alice", Role::Patient).unwrap();
    c.bench_function("token_verify", |b| {
        b.iter(|| issuer.verify(black_box(&token)))
    });
}

fn bench_cookie_parsing(c: &mut Criterion) {
    let issuer = TokenIssuer::new(SECRET, Duration::minutes(60));
    let token = issuer.issue("alice", Role::Patient).unwrap();

    let wrapped = format!("\"Bearer {}\"", token);
    c.bench_function("normalize_cookie_token", |b| {
        b.iter(|| normalize_cookie_token(black_box(&wrapped)))
    });

    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("theme=dark; access_token={}; lang=en", wrapped)).unwrap(),
    );
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    c.bench_function("session_candidates", |b| {
        b.iter(|| SessionResolver::candidates(black_box(&headers)))
    });
}

fn bench_password_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bcrypt_cost_4");
    group.sample_size(20);

    group.bench_function("hash", |b| b.iter(|| hash_password(black_box("pw123"), 4)));

    let hashed = hash_password("pw123", 4).unwrap();
    group.bench_function("verify", |b| {
        b.iter(|| verify_password(black_box("pw123"), black_box(&hashed)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_token_issue_and_verify,
    bench_cookie_parsing,
    bench_password_hashing
);
criterion_main!(benches);
