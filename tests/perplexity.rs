mod common;

use std::fs;
use std::path::Path;

use codeppl::config::Config;
use codeppl::corpus::{load_corpus, Extensions};
use codeppl::error::Error;
use codeppl::perplexity::{score_text, Aggregator, WindowMode};
use codeppl::pipeline::PerplexityPipeline;
use tempfile::tempdir;

use common::{TableModel, UniformModel};

fn close(a: f64, b: f64) -> bool {
    ((a - b) / b).abs() < 1e-9
}

fn pipeline(dir: &Path) -> PerplexityPipeline {
    PerplexityPipeline::new(Config::new(dir.to_path_buf()))
}

#[test_log::test]
fn truncated_single_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "x".repeat(2000)).unwrap();
    let model = TableModel::new(1024, &[('x', 0.1)]);

    let report = pipeline(dir.path()).run_with_model(&model).unwrap();
    assert_eq!(report.tokens, 1024);
    assert!(close(report.perplexity, (0.1f64).exp()));
    assert!((report.perplexity - 1.105).abs() < 1e-3);
}

#[test_log::test]
fn two_files_are_token_weighted() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "a".repeat(100)).unwrap();
    fs::write(dir.path().join("b.js"), "b".repeat(400)).unwrap();
    let model = TableModel::new(1024, &[('a', 2.0), ('b', 3.0)]);

    let report = pipeline(dir.path()).run_with_model(&model).unwrap();
    assert_eq!(report.files_scored, 2);
    assert_eq!(report.tokens, 500);
    assert!(close(report.perplexity, (2.8f64).exp()));
    assert!((report.perplexity - 16.44).abs() < 1e-2);
    assert!(!close(report.perplexity, (2.5f64).exp()));
}

#[test]
fn only_filtered_files_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("README.md"), "# nothing to score here").unwrap();
    let model = TableModel::new(1024, &[('#', 1.0)]);

    let res = pipeline(dir.path()).run_with_model(&model);
    assert!(matches!(res, Err(Error::NoTokensScored)));
}

#[test]
fn empty_dir_fails() {
    let dir = tempdir().unwrap();
    let model = TableModel::new(1024, &[]);
    let res = pipeline(dir.path()).run_with_model(&model);
    assert!(matches!(res, Err(Error::NoTokensScored)));
}

#[test]
fn missing_dir_fails() {
    let dir = tempdir().unwrap();
    let model = TableModel::new(1024, &[]);
    let res = pipeline(&dir.path().join("absent")).run_with_model(&model);
    assert!(matches!(res, Err(Error::PathNotFound(_))));
}

#[test]
fn empty_texts_dir_is_refused() {
    let model = TableModel::new(1024, &[]);
    let res = pipeline(Path::new("")).run_with_model(&model);
    assert!(matches!(res, Err(Error::Config(_))));
}

#[cfg(unix)]
#[test_log::test]
fn unreadable_file_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "a".repeat(100)).unwrap();
    fs::write(dir.path().join("b.js"), "b".repeat(400)).unwrap();
    // dangling link: matches the allow-list but cannot be opened
    std::os::unix::fs::symlink(dir.path().join("gone.c"), dir.path().join("c.c")).unwrap();
    let model = TableModel::new(1024, &[('a', 2.0), ('b', 3.0)]);

    let report = pipeline(dir.path()).run_with_model(&model).unwrap();
    assert_eq!(report.files_scored, 2);
    assert_eq!(report.files_skipped, 1);
    assert!(close(report.perplexity, (2.8f64).exp()));
}

#[test_log::test]
fn model_failure_is_excluded() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "a".repeat(100)).unwrap();
    fs::write(dir.path().join("b.js"), "b".repeat(400)).unwrap();
    fs::write(dir.path().join("oom.go"), "?".repeat(50)).unwrap();
    let model = TableModel::new(1024, &[('a', 2.0), ('b', 3.0)]);

    let report = pipeline(dir.path()).run_with_model(&model).unwrap();
    assert_eq!(report.files_skipped, 1);
    assert!(close(report.perplexity, (2.8f64).exp()));
}

#[test]
fn order_does_not_matter() {
    let dir = tempdir().unwrap();
    let model = TableModel::new(64, &[('a', 0.7), ('b', 1.9), ('c', 3.3), ('d', 0.05)]);
    for (i, c) in "abcdabcdab".chars().enumerate() {
        let text: String = std::iter::repeat(c).take(3 + i * 7).collect();
        fs::write(dir.path().join(format!("f{i}.py")), text).unwrap();
    }

    let texts = load_corpus(dir.path(), &Extensions::default()).unwrap();
    let units: Vec<_> = texts
        .iter()
        .filter_map(|t| score_text(&t.text, &model, WindowMode::Truncate).unwrap())
        .collect();

    let forward: Aggregator = units.iter().copied().collect();
    let backward: Aggregator = units.iter().rev().copied().collect();
    let mut rotated = units.clone();
    rotated.rotate_left(3);
    let rotated: Aggregator = rotated.into_iter().collect();

    let p = forward.perplexity().unwrap();
    assert!(close(p, backward.perplexity().unwrap()));
    assert!(close(p, rotated.perplexity().unwrap()));

    let mut config = Config::new(dir.path().to_path_buf());
    config.parallel = true;
    let par = PerplexityPipeline::new(config).run_with_model(&model).unwrap();
    assert!(close(p, par.perplexity));
}

#[test]
fn truncation_bound_holds() {
    let model = TableModel::new(16, &[('q', 1.0)]);
    for len in [2, 15, 16, 17, 100] {
        let unit = score_text(&"q".repeat(len), &model, WindowMode::Truncate)
            .unwrap()
            .unwrap();
        assert!(unit.token_count <= 16);
        assert_eq!(unit.token_count, len.min(16));
    }
}

#[test]
fn chunk_mode_scores_whole_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "x".repeat(2000)).unwrap();
    let model = TableModel::new(1024, &[('x', 0.1)]);

    let mut config = Config::new(dir.path().to_path_buf());
    config.mode = WindowMode::Chunk;
    let report = PerplexityPipeline::new(config).run_with_model(&model).unwrap();
    assert_eq!(report.tokens, 2000);
    assert!(close(report.perplexity, (0.1f64).exp()));
}

#[test]
fn uniform_model_gives_vocab_size() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "def f(x):\n    return x * 2\n").unwrap();
    fs::write(dir.path().join("b.c"), "int main(void) { return 0; }\n").unwrap();
    fs::write(dir.path().join("c.rb"), "puts 'hello'\n").unwrap();
    let model = UniformModel { vocab: 50257 };

    let report = pipeline(dir.path()).run_with_model(&model).unwrap();
    assert!(report.perplexity > 0.0);
    assert!((report.perplexity - 50257.0).abs() < 1e-6 * 50257.0);
}

#[test]
fn custom_extensions() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("lib.rs"), "a".repeat(10)).unwrap();
    fs::write(dir.path().join("main.py"), "b".repeat(10)).unwrap();
    let model = TableModel::new(1024, &[('a', 1.0), ('b', 2.0)]);

    let mut config = Config::new(dir.path().to_path_buf());
    config.extensions = Extensions::parse_list("rs").unwrap();
    let report = PerplexityPipeline::new(config).run_with_model(&model).unwrap();
    assert_eq!(report.files_scored, 1);
    assert!(close(report.perplexity, (1.0f64).exp()));
}

#[test]
fn report_serializes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "a".repeat(10)).unwrap();
    let model = TableModel::new(1024, &[('a', 1.0)]);

    let report = pipeline(dir.path()).run_with_model(&model).unwrap();
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["tokens"], 10);
    assert_eq!(json["files_scored"], 1);
    assert_eq!(json["files_skipped"], 0);
}
