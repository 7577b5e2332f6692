//! Example store
//!
//! File-based persistence for few-shot examples with:
//! - JSON-lines format, one [`LabeledExample`] per line
//! - A read-mostly seed partition and a pipeline-written learned partition
//! - Weight assignment favouring moderator-corrected misses
//! - Full rewrites on correction so each message id appears at most once

use parking_lot::Mutex;
use scamguard_core::{Error, ExampleMeta, Label, LabeledExample, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the seed partition inside the examples directory
pub const SEED_FILE: &str = "seed_examples.jsonl";

/// File name of the learned partition inside the examples directory
pub const LEARNED_FILE: &str = "learned_examples.jsonl";

const HARD_NEGATIVE_WEIGHT: f64 = 2.0;
const CONFIDENT_WEIGHT: f64 = 0.5;
const DEFAULT_WEIGHT: f64 = 1.0;
const CONFIDENT_THRESHOLD: f64 = 0.85;

/// Few-shot sizing limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FewShotConfig {
    /// Most recent seed examples considered
    #[serde(default = "default_max_seed")]
    pub max_seed_examples: usize,

    /// Most recent learned examples considered
    #[serde(default = "default_max_learned")]
    pub max_learned_examples: usize,

    /// Upper bound on examples rendered into one prompt
    #[serde(default = "default_max_per_prompt")]
    pub max_examples_per_prompt: usize,

    /// Sort learned examples by weight before the final cut
    #[serde(default)]
    pub prioritize_hard_negatives: bool,
}

impl Default for FewShotConfig {
    fn default() -> Self {
        Self {
            max_seed_examples: default_max_seed(),
            max_learned_examples: default_max_learned(),
            max_examples_per_prompt: default_max_per_prompt(),
            prioritize_hard_negatives: false,
        }
    }
}

fn default_max_seed() -> usize {
    30
}

fn default_max_learned() -> usize {
    50
}

fn default_max_per_prompt() -> usize {
    40
}

/// Input to [`ExampleStore::adopt`]
#[derive(Debug, Clone)]
pub struct AdoptionInput {
    pub content: String,

    /// Label the pipeline predicted
    pub predicted: Label,

    /// Confidence of the prediction
    pub confidence: f64,

    pub meta: ExampleMeta,

    /// Moderator-confirmed label, present only for corrections
    pub ground_truth: Option<Label>,

    pub reason: Option<String>,
}

impl AdoptionInput {
    /// An automated example recording the pipeline's own verdict
    pub fn automated(content: impl Into<String>, predicted: Label, confidence: f64, meta: ExampleMeta) -> Self {
        Self {
            content: content.into(),
            predicted,
            confidence,
            meta,
            ground_truth: None,
            reason: None,
        }
    }

    pub fn with_ground_truth(mut self, label: Label) -> Self {
        self.ground_truth = Some(label);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Whether this write supersedes earlier examples for the same message
    pub fn is_correction(&self) -> bool {
        self.ground_truth.is_some() && self.meta.message_id().is_some()
    }

    fn into_example(self) -> LabeledExample {
        let weight = assign_weight(self.predicted, self.confidence, self.ground_truth);
        let reason = self
            .reason
            .unwrap_or_else(|| format!("conf={:.2} pred={}", self.confidence, self.predicted));

        LabeledExample::new(self.content, self.ground_truth.unwrap_or(self.predicted))
            .with_reason(reason)
            .with_meta(self.meta)
            .with_weight(weight)
    }
}

/// Weight of a newly adopted example.
///
/// Misses confirmed by a moderator weigh most. Confirmed hits keep the
/// default weight. Only uncorrected confident predictions are discounted.
pub fn assign_weight(predicted: Label, confidence: f64, ground_truth: Option<Label>) -> f64 {
    match ground_truth {
        Some(truth) if truth != predicted => HARD_NEGATIVE_WEIGHT,
        Some(_) => DEFAULT_WEIGHT,
        None if confidence >= CONFIDENT_THRESHOLD => CONFIDENT_WEIGHT,
        None => DEFAULT_WEIGHT,
    }
}

/// Pick the few-shot examples for one prompt.
///
/// Every truncation keeps the tail. Seed entries sit in front of learned
/// ones, so the per-prompt cap drops the oldest seed examples first.
pub fn select_examples(
    seed: Vec<LabeledExample>,
    learned: Vec<LabeledExample>,
    config: &FewShotConfig,
) -> Vec<LabeledExample> {
    let seed = keep_tail(seed, config.max_seed_examples);
    let mut learned = keep_tail(learned, config.max_learned_examples);

    if config.prioritize_hard_negatives {
        // sort_by is stable: equal weights keep file order
        learned.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    }

    let mut combined = seed;
    combined.extend(learned);
    keep_tail(combined, config.max_examples_per_prompt)
}

fn keep_tail<T>(mut items: Vec<T>, max: usize) -> Vec<T> {
    if items.len() > max {
        items.drain(..items.len() - max);
    }
    items
}

/// Summary of the persisted corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub seed: usize,
    pub learned: usize,
    pub learned_scam: usize,
    pub learned_not_scam: usize,

    /// Learned examples per weight, keyed by the weight with one decimal
    pub weights: BTreeMap<String, usize>,
}

/// Seed and learned example partitions on disk
pub struct ExampleStore {
    seed_path: PathBuf,
    learned_path: PathBuf,

    /// Serialises appends and correction rewrites
    write_lock: Mutex<()>,
}

impl ExampleStore {
    /// Create a store over explicit partition files
    pub fn new(seed_path: impl Into<PathBuf>, learned_path: impl Into<PathBuf>) -> Self {
        Self {
            seed_path: seed_path.into(),
            learned_path: learned_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store using the standard file names inside `dir`
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(SEED_FILE), dir.join(LEARNED_FILE))
    }

    pub fn seed_path(&self) -> &Path {
        &self.seed_path
    }

    pub fn learned_path(&self) -> &Path {
        &self.learned_path
    }

    /// Load the seed partition; a missing file is empty
    pub fn load_seed(&self) -> Result<Vec<LabeledExample>> {
        read_jsonl(&self.seed_path)
    }

    /// Load the learned partition; a missing file is empty
    pub fn load_learned(&self) -> Result<Vec<LabeledExample>> {
        read_jsonl(&self.learned_path)
    }

    /// Examples to render into the next prompt
    pub fn prompt_examples(&self, config: &FewShotConfig) -> Result<Vec<LabeledExample>> {
        let seed = self.load_seed()?;
        let learned = self.load_learned()?;
        Ok(select_examples(seed, learned, config))
    }

    /// Persist a new learned example.
    ///
    /// Corrections remove every learned example carrying the same message id
    /// and rewrite the partition. Automated writes append, unless the message
    /// already has an example, in which case nothing is written and
    /// `Ok(None)` is returned.
    pub fn adopt(&self, input: AdoptionInput) -> Result<Option<LabeledExample>> {
        let correction = input.is_correction();
        let example = input.into_example();

        let _guard = self.write_lock.lock();
        ensure_parent(&self.learned_path)?;

        if correction {
            let message_id = example.meta.message_id().unwrap_or_default().to_string();
            let mut learned = read_jsonl(&self.learned_path)?;
            let before = learned.len();
            learned.retain(|e| e.meta.message_id() != Some(message_id.as_str()));
            learned.push(example.clone());

            self.rewrite_learned(&learned)?;
            info!(
                message_id = %message_id,
                label = %example.label,
                weight = example.weight,
                superseded = before + 1 - learned.len(),
                "Adopted corrected example"
            );
            return Ok(Some(example));
        }

        if let Some(message_id) = example.meta.message_id() {
            let learned = read_jsonl(&self.learned_path)?;
            if learned.iter().any(|e| e.meta.message_id() == Some(message_id)) {
                debug!(message_id = %message_id, "Example already recorded, skipping");
                return Ok(None);
            }
        }

        self.append_learned(&example)?;
        debug!(label = %example.label, weight = example.weight, "Adopted example");
        Ok(Some(example))
    }

    /// Counts over both partitions
    pub fn stats(&self) -> Result<StoreStats> {
        let seed = self.load_seed()?;
        let learned = self.load_learned()?;

        let mut stats = StoreStats {
            seed: seed.len(),
            learned: learned.len(),
            ..Default::default()
        };
        for example in &learned {
            match example.label {
                Label::Scam => stats.learned_scam += 1,
                Label::NotScam => stats.learned_not_scam += 1,
            }
            *stats
                .weights
                .entry(format!("{:.1}", example.weight))
                .or_default() += 1;
        }

        Ok(stats)
    }

    fn append_learned(&self, example: &LabeledExample) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.learned_path)?;
        let line = serde_json::to_string(example)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Write the full partition to a temp file, then rename it into place
    fn rewrite_learned(&self, examples: &[LabeledExample]) -> Result<()> {
        let tmp_path = self.learned_path.with_extension("jsonl.tmp");

        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            for example in examples {
                serde_json::to_writer(&mut writer, example)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }

        std::fs::rename(&tmp_path, &self.learned_path).map_err(|e| {
            Error::store(format!(
                "Failed to replace {}: {}",
                self.learned_path.display(),
                e
            ))
        })
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Read a JSON-lines partition, skipping lines that fail to parse
fn read_jsonl(path: &Path) -> Result<Vec<LabeledExample>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut examples = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<LabeledExample>(line) {
            Ok(example) => examples.push(example),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping malformed example line"
                );
            }
        }
    }

    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn meta(message_id: &str) -> ExampleMeta {
        ExampleMeta {
            channel: Some("c1".into()),
            author_age_days: Some(3),
            message_id: Some(message_id.into()),
        }
    }

    fn weighted(content: &str, weight: f64) -> LabeledExample {
        LabeledExample::new(content, Label::Scam).with_weight(weight)
    }

    fn contents(examples: &[LabeledExample]) -> Vec<&str> {
        examples.iter().map(|e| e.content.as_str()).collect()
    }

    #[test]
    fn test_weight_table() {
        assert_eq!(assign_weight(Label::Scam, 0.9, Some(Label::NotScam)), 2.0);
        assert_eq!(assign_weight(Label::NotScam, 0.2, Some(Label::Scam)), 2.0);
        assert_eq!(assign_weight(Label::Scam, 0.9, None), 0.5);
        assert_eq!(assign_weight(Label::Scam, 0.85, None), 0.5);
        assert_eq!(assign_weight(Label::Scam, 0.84, None), 1.0);
        // Moderator confirmations never drop below the default
        assert_eq!(assign_weight(Label::Scam, 1.0, Some(Label::Scam)), 1.0);
        assert_eq!(assign_weight(Label::NotScam, 0.2, Some(Label::NotScam)), 1.0);
        assert_eq!(assign_weight(Label::NotScam, 0.3, None), 1.0);
    }

    #[test]
    fn test_select_keeps_most_recent() {
        let seed = vec![weighted("s1", 1.0), weighted("s2", 1.0), weighted("s3", 1.0)];
        let learned = vec![weighted("l1", 1.0), weighted("l2", 1.0), weighted("l3", 1.0)];
        let config = FewShotConfig {
            max_seed_examples: 2,
            max_learned_examples: 2,
            max_examples_per_prompt: 3,
            prioritize_hard_negatives: false,
        };

        let selected = select_examples(seed, learned, &config);
        assert_eq!(contents(&selected), vec!["s3", "l2", "l3"]);
    }

    #[test]
    fn test_select_prioritizes_hard_negatives_stably() {
        let learned = vec![
            weighted("a", 1.0),
            weighted("b", 2.0),
            weighted("c", 0.5),
            weighted("d", 2.0),
            weighted("e", 1.0),
        ];
        let config = FewShotConfig {
            max_seed_examples: 0,
            max_learned_examples: 10,
            max_examples_per_prompt: 10,
            prioritize_hard_negatives: true,
        };

        let selected = select_examples(Vec::new(), learned, &config);
        assert_eq!(contents(&selected), vec!["b", "d", "a", "e", "c"]);
        assert!(selected.windows(2).all(|w| w[0].weight >= w[1].weight));
    }

    #[test]
    fn test_missing_files_are_empty() {
        let dir = TempDir::new().unwrap();
        let store = ExampleStore::open(dir.path());

        assert!(store.load_seed().unwrap().is_empty());
        assert!(store
            .prompt_examples(&FewShotConfig::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SEED_FILE),
            concat!(
                "{\"content\":\"free nitro\",\"label\":\"scam\"}\n",
                "not json at all\n",
                "\n",
                "{\"content\":\"missing label\"}\n",
                "{\"content\":\"gg\",\"label\":\"not_scam\",\"reason\":\"banter\"}\n",
            ),
        )
        .unwrap();

        let seed = ExampleStore::open(dir.path()).load_seed().unwrap();
        assert_eq!(contents(&seed), vec!["free nitro", "gg"]);
        assert_eq!(seed[1].reason.as_deref(), Some("banter"));
    }

    #[test]
    fn test_automated_adopt_appends_with_default_reason() {
        let dir = TempDir::new().unwrap();
        let store = ExampleStore::open(dir.path().join("nested"));

        let adopted = store
            .adopt(AdoptionInput::automated("claim airdrop", Label::Scam, 0.7, meta("m1")))
            .unwrap()
            .unwrap();
        assert_eq!(adopted.reason.as_deref(), Some("conf=0.70 pred=scam"));
        assert_eq!(adopted.weight, 1.0);

        let learned = store.load_learned().unwrap();
        assert_eq!(learned, vec![adopted]);
    }

    #[test]
    fn test_correction_supersedes_previous_example() {
        let dir = TempDir::new().unwrap();
        let store = ExampleStore::open(dir.path());

        store
            .adopt(AdoptionInput::automated("other", Label::NotScam, 0.2, meta("m0")))
            .unwrap();
        store
            .adopt(AdoptionInput::automated("free nitro", Label::Scam, 0.9, meta("m1")))
            .unwrap();
        store
            .adopt(
                AdoptionInput::automated("free nitro (edited)", Label::Scam, 0.9, meta("m1"))
                    .with_ground_truth(Label::NotScam)
                    .with_reason("mod_42_rejected"),
            )
            .unwrap();

        let learned = store.load_learned().unwrap();
        let for_m1: Vec<_> = learned
            .iter()
            .filter(|e| e.meta.message_id() == Some("m1"))
            .collect();
        assert_eq!(for_m1.len(), 1);
        assert_eq!(for_m1[0].content, "free nitro (edited)");
        assert_eq!(for_m1[0].label, Label::NotScam);
        assert_eq!(for_m1[0].weight, 2.0);
        assert_eq!(learned.len(), 2);
        assert!(!store.learned_path().with_extension("jsonl.tmp").exists());
    }

    #[test]
    fn test_automated_write_after_correction_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = ExampleStore::open(dir.path());

        store
            .adopt(
                AdoptionInput::automated("send seed", Label::NotScam, 0.3, meta("m1"))
                    .with_ground_truth(Label::Scam),
            )
            .unwrap();
        let skipped = store
            .adopt(AdoptionInput::automated("send seed", Label::NotScam, 0.3, meta("m1")))
            .unwrap();

        assert!(skipped.is_none());
        assert_eq!(store.load_learned().unwrap().len(), 1);
    }

    #[test]
    fn test_examples_without_message_id_always_append() {
        let dir = TempDir::new().unwrap();
        let store = ExampleStore::open(dir.path());

        for _ in 0..2 {
            let input = AdoptionInput::automated("hello", Label::NotScam, 0.1, ExampleMeta::default())
                .with_ground_truth(Label::NotScam);
            assert!(!input.is_correction());
            store.adopt(input).unwrap();
        }

        assert_eq!(store.load_learned().unwrap().len(), 2);
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(ExampleStore::open(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let id = format!("m{}-{}", t, i);
                        store
                            .adopt(AdoptionInput::automated("free nitro", Label::Scam, 0.9, meta(&id)))
                            .unwrap();
                        store
                            .adopt(
                                AdoptionInput::automated("free nitro", Label::Scam, 1.0, meta(&id))
                                    .with_ground_truth(Label::NotScam),
                            )
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let learned = store.load_learned().unwrap();
        assert_eq!(learned.len(), 200);
        assert!(learned.iter().all(|e| e.label == Label::NotScam && e.weight == 2.0));

        let ids: std::collections::HashSet<_> =
            learned.iter().filter_map(|e| e.meta.message_id()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let store = ExampleStore::open(dir.path());
        std::fs::write(
            store.seed_path(),
            "{\"content\":\"a\",\"label\":\"scam\"}\n{\"content\":\"b\",\"label\":\"not_scam\"}\n",
        )
        .unwrap();
        store
            .adopt(AdoptionInput::automated("x", Label::Scam, 0.95, meta("m1")))
            .unwrap();
        store
            .adopt(AdoptionInput::automated("y", Label::NotScam, 0.4, meta("m2")))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.seed, 2);
        assert_eq!(stats.learned, 2);
        assert_eq!(stats.learned_scam, 1);
        assert_eq!(stats.weights.get("0.5"), Some(&1));
        assert_eq!(stats.weights.get("1.0"), Some(&1));
    }
}
