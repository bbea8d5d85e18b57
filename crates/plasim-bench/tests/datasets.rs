//! Dataset loading and the real-data experiment.

use plasim_bench::config::RealDataConfig;
use plasim_bench::error::HarnessError;
use plasim_bench::output::CsvReport;
use plasim_bench::real_data::{self, Dataset, CSV_HEADER};
use std::fs;
use std::io::Write;
use tempfile::TempDir;

fn write_text(dir: &TempDir, name: &str, keys: &[u64]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).unwrap();
    for k in keys {
        writeln!(file, "{k}").unwrap();
    }
    path
}

fn write_binary(dir: &TempDir, name: &str, count: u64, keys: &[u64]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut bytes = count.to_le_bytes().to_vec();
    for k in keys {
        bytes.extend_from_slice(&k.to_le_bytes());
    }
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn text_dataset_is_sorted_and_deduplicated() {
    let dir = TempDir::new().unwrap();
    let path = write_text(&dir, "keys.txt", &[30, 10, 20, 10, 40, 30]);
    let dataset = Dataset::load(&path, false).unwrap();
    assert_eq!(dataset.name, "keys.txt");
    assert_eq!(dataset.keys, vec![10, 20, 30, 40]);
}

#[test]
fn text_dataset_reports_bad_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.txt");
    fs::write(&path, "1\n2\nthree\n").unwrap();
    match Dataset::load(&path, false) {
        Err(HarnessError::Dataset { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected dataset error, got {other:?}"),
    }
}

#[test]
fn binary_dataset_reads_announced_keys() {
    let dir = TempDir::new().unwrap();
    let path = write_binary(&dir, "keys.bin", 3, &[9, 1, 5, 100]);
    let dataset = Dataset::load(&path, true).unwrap();
    assert_eq!(dataset.keys, vec![1, 5, 9]);

    let short = write_binary(&dir, "short.bin", 10, &[1, 2]);
    assert!(matches!(
        Dataset::load(&short, true),
        Err(HarnessError::Dataset { .. })
    ));
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        Dataset::load(&dir.path().join("absent.txt"), false),
        Err(HarnessError::Io(_))
    ));
}

#[test]
fn real_data_rows_in_epsilon_order() {
    let dir = TempDir::new().unwrap();
    let keys: Vec<u64> = (0..2_000u64).map(|i| i * i / 7 + 3 * i).collect();
    let a = write_text(&dir, "a.txt", &keys);
    let b = write_text(&dir, "b.txt", &(0..100u64).map(|i| 5 * i).collect::<Vec<_>>());

    let config = RealDataConfig {
        min_epsilon: 1,
        max_epsilon: 9,
        threads: 3,
        binary: false,
    };
    let table = real_data::run(&[a, b], &config).unwrap();
    assert_eq!(table.rows.len(), 16);

    let first: Vec<u64> = table.rows[..8].iter().map(|r| r.epsilon).collect();
    assert_eq!(first, (1..9).collect::<Vec<_>>());
    for row in &table.rows[..8] {
        assert_eq!(row.dataset, "a.txt");
        assert_eq!(row.dataset_size, 2_000);
        assert!((row.opt_avg * row.samples as f64 - 2_000.0).abs() < 1e-6);
    }
    // Fewer segments for larger ε.
    assert!(table.rows[7].samples <= table.rows[0].samples);

    // Evenly spaced keys fit one line.
    for row in &table.rows[8..] {
        assert_eq!(row.dataset, "b.txt");
        assert_eq!(row.samples, 1);
        assert_eq!(row.opt_avg, 100.0);
    }

    assert!(table.to_csv().starts_with(CSV_HEADER));
}
