//! Admission and rate limiting benchmarks
//!
//! Every inbound message pays for admission; triggered ones also take the
//! rate limiter lock.
//!
//! Run with: cargo bench -p scamguard-policy

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scamguard_core::{Author, Message, ProviderResponse};
use scamguard_policy::config::{Channels, RateLimitConfig};
use scamguard_policy::{AdmissionFilter, DecisionEngine, RateLimiter};

fn message(content: &str) -> Message {
    Message {
        id: "m1".into(),
        channel_id: "c1".into(),
        guild_id: Some("g1".into()),
        author: Author {
            id: "u1".into(),
            name: "user".into(),
            bot: false,
            created_at: Utc::now(),
        },
        content: content.into(),
    }
}

fn benchmark_admission(c: &mut Criterion) {
    let triggers: Vec<String> = ["(?i)nitro", "(?i)airdrop", "(?i)giveaway", "(?i)free\\s+\\w+", "(?i)dm\\s+me"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let hard_blocks = vec!["(?i)wallet\\s+seed".to_string(), "(?i)private\\s+key".to_string()];
    let filter = AdmissionFilter::new(&triggers, &hard_blocks, &Channels::default())
        .expect("Failed to compile patterns");

    let cases = [
        ("clean", "Anyone up for a game tonight?"),
        ("triggered", "Free nitro giveaway, DM me"),
        ("hard_block", "Send your wallet seed to claim the airdrop"),
    ];

    let mut group = c.benchmark_group("Admission");
    for (name, text) in cases {
        let msg = message(text);
        group.bench_with_input(BenchmarkId::new("evaluate", name), &msg, |b, msg| {
            b.iter(|| filter.evaluate(black_box(msg), None));
        });
    }
    group.finish();
}

fn benchmark_rate_limiter(c: &mut Criterion) {
    let limiter = RateLimiter::new(&RateLimitConfig {
        max_calls_per_minute: 60,
        per_channel_cooldown_sec: 0,
    });

    c.bench_function("RateLimiter/check", |b| {
        b.iter(|| limiter.check(black_box("c1")));
    });
}

fn benchmark_decision(c: &mut Criterion) {
    let engine = DecisionEngine::new(true).expect("Failed to build decision engine");
    let verdict = ProviderResponse::from_completion(
        r#"{"is_scam": true, "confidence": 0.91, "reasons": ["fake nitro"], "tags": ["nitro"]}"#,
    );
    let prose = ProviderResponse::from_completion("not sure");
    let links = vec!["https://dlscord.example".to_string()];

    let mut group = c.benchmark_group("Decision");
    group.bench_function("verdict", |b| {
        b.iter(|| engine.decide(black_box(&verdict), "free nitro", &links, false));
    });
    group.bench_function("fallback", |b| {
        b.iter(|| engine.decide(black_box(&prose), "free nitro", &links, false));
    });
    group.finish();
}

criterion_group!(benches, benchmark_admission, benchmark_rate_limiter, benchmark_decision);
criterion_main!(benches);
