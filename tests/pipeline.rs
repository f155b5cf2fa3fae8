use std::{fs, path::Path, process::Command};

use graynorm::{read_file, GrayNorm, GrayNormConfig, GrayNormError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::tempdir;

const DRUG: &str = "\
# sampleid: sample
# refgenes: G1, G2, G3
# controls: treatment = none
sample,treatment,G1,G2,G3
s1,none,10,10,10
s2,none,10,10.2,9.8
s3,drugX,10,14,14.2
s4,drugX,10,13.8,14
";

const UNTREATED: &str = "\
# sampleid: sample
# refgenes: G1, G2, G3
# controls: treatment = none
sample,treatment,G1,G2,G3
s1,none,10,10,10
s2,none,10,10.2,9.8
s3,none,10,14,14.2
s4,none,10,13.8,14
";

const NO_JOINT_CONTROL: &str = "\
# sampleid: sample
# refgenes: G1, G2
# controls: dose = 0, time = 0
sample,dose,time,G1,G2
s1,0,24,10,10
s2,0,48,10,12
s3,5,0,10,15
s4,5,0,10,9
";

/// A two-factor design with seeded random expression values
fn random_table(seed: u64) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut text = String::from(
        "# sampleid: id\n# refgenes: A, B, C, D, E\n# controls: dose = 0, time = 0\nid,dose,time,A,B,C,D,E\n",
    );
    let mut id = 0;
    for dose in [0, 5, 50] {
        for time in [0, 24] {
            for _ in 0..3 {
                id += 1;
                let values = (0..5)
                    .map(|_| format!("{:.4}", rng.gen_range(0.2..5.0)))
                    .collect::<Vec<_>>()
                    .join(",");
                text.push_str(&format!("s{id},{dose},{time},{values}\n"));
            }
        }
    }
    text
}

fn run_to_csv(input: &Path, config: GrayNormConfig) -> String {
    let dataset = read_file(input, None).unwrap();
    let results = GrayNorm::new(&dataset, config).run().unwrap();
    let mut buffer = Vec::new();
    results.write_csv(&mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

fn graynorm_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_graynorm"))
}

#[test]
fn test_stable_gene_ranks_before_shifting_pair() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("drug.csv");
    fs::write(&input, DRUG).unwrap();

    let dataset = read_file(&input, None).unwrap();
    let results = GrayNorm::new(&dataset, GrayNormConfig::default())
        .run()
        .unwrap();

    assert_eq!(results.len(), 7);
    let labels = results.rows.iter().map(|r| r.label.as_str()).collect::<Vec<_>>();
    assert_eq!(labels[0], "G1");
    let g1 = labels.iter().position(|l| *l == "G1").unwrap();
    let g23 = labels.iter().position(|l| *l == "G2 + G3").unwrap();
    assert!(g1 < g23);
    assert!(results.rows[g1].score.stability < results.rows[g23].score.stability);
}

#[test]
fn test_output_is_deterministic() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("random.csv");
    fs::write(&input, random_table(7)).unwrap();

    let first = run_to_csv(&input, GrayNormConfig::default());
    let second = run_to_csv(&input, GrayNormConfig::default());
    let sequential = run_to_csv(&input, GrayNormConfig::builder().parallel(false).build());
    assert_eq!(first, second);
    assert_eq!(first, sequential);
    // header plus 2^5 - 1 combinations
    assert_eq!(first.lines().count(), 32);
}

#[test]
fn test_size_never_precedes_score() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("random.csv");
    fs::write(&input, random_table(11)).unwrap();

    let dataset = read_file(&input, None).unwrap();
    let results = GrayNorm::new(&dataset, GrayNormConfig::default())
        .run()
        .unwrap();
    for pair in results.rows.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.score.stability <= b.score.stability);
        if a.score.stability == b.score.stability {
            assert!(a.size <= b.size);
        }
    }
    assert_eq!(results.variables, vec!["dose".to_string(), "time".to_string()]);
    assert_eq!(results.conditions.len(), 6);
    assert!(results.rows.iter().all(|r| r.score.dispersions.len() == 2));
}

#[test]
fn test_insufficient_data_names_variable() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("untreated.csv");
    fs::write(&input, UNTREATED).unwrap();

    let dataset = read_file(&input, None).unwrap();
    let err = GrayNorm::new(&dataset, GrayNormConfig::default())
        .run()
        .unwrap_err();
    match err {
        GrayNormError::InsufficientData { variable } => assert_eq!(variable, "treatment"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_ranks_without_joint_control_samples() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("crossed.csv");
    fs::write(&input, NO_JOINT_CONTROL).unwrap();

    let dataset = read_file(&input, None).unwrap();
    let results = GrayNorm::new(&dataset, GrayNormConfig::default())
        .run()
        .unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results.best().unwrap().label, "G1");
    assert!(results.rows.iter().all(|r| r.score.conditions.is_none()));

    let mut buffer = Vec::new();
    results.write_csv(&mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let first = text.lines().nth(1).unwrap();
    assert!(first.starts_with("G1,1,0,0,0,"));
    assert!(first.ends_with(",,,"));
}

#[test]
fn test_missing_gene_fails_before_scoring() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("missing.csv");
    fs::write(&input, DRUG.replace("sample,treatment,G1,G2,G3", "sample,treatment,G1,G2,G4"))
        .unwrap();

    let err = read_file(&input, None).unwrap_err();
    assert!(matches!(err, GrayNormError::DataFormat(_)));
    assert!(err.to_string().contains("'G3'"));
}

#[test]
fn test_missing_input_file() {
    let dir = tempdir().unwrap();
    let err = read_file(&dir.path().join("absent.csv"), None).unwrap_err();
    assert!(matches!(err, GrayNormError::Io { .. }));
}

#[test]
fn test_cli_writes_ranking() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("drug.csv");
    let output = dir.path().join("ranking.csv");
    fs::write(&input, DRUG).unwrap();

    let status = graynorm_bin()
        .arg("-in")
        .arg(&input)
        .arg("-out")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let text = fs::read_to_string(&output).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 8);
    assert!(lines[0].starts_with("gene combination,size,dispersion treatment,stability score"));
    assert!(lines[1].starts_with("G1,1,0,0,"));
}

#[test]
fn test_cli_insufficient_data_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("untreated.csv");
    let output = dir.path().join("ranking.csv");
    fs::write(&input, UNTREATED).unwrap();

    let result = graynorm_bin()
        .arg("--in")
        .arg(&input)
        .arg("--out")
        .arg(&output)
        .output()
        .unwrap();
    assert_eq!(result.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("InsufficientDataError"));
    assert!(stderr.contains("treatment"));
    assert!(!output.exists());
}

#[test]
fn test_cli_error_classes() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("ranking.csv");

    let bad = dir.path().join("bad.csv");
    fs::write(&bad, DRUG.replace("s3,drugX,10,14,14.2", "s3,drugX,10,,14.2")).unwrap();
    let result = graynorm_bin()
        .args(["--in", bad.to_str().unwrap(), "--out", output.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(result.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&result.stderr).contains("DataFormatError"));

    let good = dir.path().join("drug.csv");
    fs::write(&good, DRUG).unwrap();
    let result = graynorm_bin()
        .args(["--in", good.to_str().unwrap(), "--out", output.to_str().unwrap()])
        .args(["--limit", "2"])
        .output()
        .unwrap();
    assert_eq!(result.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&result.stderr).contains("CombinatorialLimitError"));
    assert!(!output.exists());

    let result = graynorm_bin()
        .args(["--in", good.to_str().unwrap(), "--out", output.to_str().unwrap()])
        .args(["--limit", "64"])
        .output()
        .unwrap();
    assert_eq!(result.status.code(), Some(6));
    assert!(String::from_utf8_lossy(&result.stderr).contains("InvalidConfig"));
    assert!(!output.exists());
}
