//! Prompt building and completion parsing benchmarks
//!
//! Both run once per classified message, before and after the network call.
//!
//! Run with: cargo bench -p scamguard-classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scamguard_classifiers::PromptBuilder;
use scamguard_core::{parse_json_object, ExampleMeta, Label, LabeledExample};

fn examples(count: usize) -> Vec<LabeledExample> {
    (0..count)
        .map(|i| {
            let label = if i % 3 == 0 { Label::Scam } else { Label::NotScam };
            LabeledExample::new(format!("example message number {} with some text", i), label)
                .with_reason("conf=0.70 pred=scam")
                .with_meta(ExampleMeta {
                    channel: Some("c1".into()),
                    author_age_days: Some(i as i64),
                    message_id: Some(format!("m{}", i)),
                })
        })
        .collect()
}

fn benchmark_prompt_build(c: &mut Criterion) {
    let builder = PromptBuilder::new().expect("Failed to create prompt builder");
    let content = "Free nitro for everyone https://dlscord.example/gift and https://bit.ly/x";

    let mut group = c.benchmark_group("Prompt_Build");
    for count in [0usize, 10, 40] {
        let examples = examples(count);
        group.bench_with_input(BenchmarkId::new("examples", count), &examples, |b, examples| {
            b.iter(|| builder.build(black_box(content), Some(3), black_box(examples)));
        });
    }
    group.finish();
}

fn benchmark_completion_parse(c: &mut Criterion) {
    let cases = [
        ("strict", r#"{"is_scam": true, "confidence": 0.93, "reasons": ["nitro"], "tags": []}"#),
        (
            "fenced",
            "```json\n{\"is_scam\": false, \"confidence\": 0.2, \"reasons\": [], \"tags\": []}\n```",
        ),
        ("prose", "I could not decide whether this message is a scam."),
    ];

    let mut group = c.benchmark_group("Completion_Parse");
    for (name, text) in cases {
        group.bench_with_input(BenchmarkId::new("parse", name), &text, |b, text| {
            b.iter(|| parse_json_object(black_box(text)));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_prompt_build, benchmark_completion_parse);
criterion_main!(benches);
