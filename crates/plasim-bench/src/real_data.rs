//! OPT segmentation of real key datasets.
//!
//! Each dataset is a list of unsigned 64-bit keys, stored either as text (one
//! integer per line) or as binary (a little-endian `u64` count followed by
//! that many little-endian `u64` keys). Keys are sorted and deduplicated;
//! point `i` is `(key_i − key_0, i)`. For every error bound the whole dataset
//! is segmented and the segment lengths are summarized.

use crate::config::RealDataConfig;
use crate::error::{HarnessError, Result};
use crate::output::CsvReport;
use plasim_core::segmentation::Segmenter;
use plasim_core::RunningStat;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "dataset,dataset_size,epsilon,opt_avg,opt_std,samples";

/// A loaded, sorted, deduplicated dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub name: String,
    pub keys: Vec<u64>,
}

impl Dataset {
    /// Load `path`, as binary when `binary` is set.
    pub fn load(path: &Path, binary: bool) -> Result<Self> {
        let mut keys = if binary {
            read_binary(path)?
        } else {
            read_text(path)?
        };
        keys.sort_unstable();
        keys.dedup();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::debug!(dataset = %name, keys = keys.len(), "dataset loaded");
        Ok(Self { name, keys })
    }

    /// Segment lengths of the OPT segmentation with error bound `epsilon`.
    pub fn segment_lengths(&self, epsilon: f64) -> Result<RunningStat> {
        let mut stat = RunningStat::new();
        let Some(&first) = self.keys.first() else {
            return Ok(stat);
        };
        let mut segmenter = Segmenter::new(epsilon)?;
        for (i, &key) in self.keys.iter().enumerate() {
            if let Some(segment) = segmenter.push((key - first) as f64, i as f64)? {
                stat.push(segment.len() as f64);
            }
        }
        if let Some(segment) = segmenter.finish() {
            stat.push(segment.len() as f64);
        }
        Ok(stat)
    }
}

fn read_text(path: &Path) -> Result<Vec<u64>> {
    let reader = BufReader::new(File::open(path)?);
    let mut keys = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.parse::<u64>().map_err(|e| HarnessError::Dataset {
            path: path.to_path_buf(),
            line: i + 1,
            message: format!("`{trimmed}` is not an unsigned integer: {e}"),
        })?;
        keys.push(key);
    }
    Ok(keys)
}

fn read_binary(path: &Path) -> Result<Vec<u64>> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    let truncated = |message: String| HarnessError::Dataset {
        path: path.to_path_buf(),
        line: 0,
        message,
    };
    let mut words = bytes.chunks_exact(8).map(|c| {
        let mut word = [0u8; 8];
        word.copy_from_slice(c);
        u64::from_le_bytes(word)
    });
    let count = words
        .next()
        .ok_or_else(|| truncated("missing length header".to_string()))?;
    let keys: Vec<u64> = words.take(count as usize).collect();
    if (keys.len() as u64) < count {
        return Err(truncated(format!(
            "header announces {count} keys but the file holds {}",
            keys.len()
        )));
    }
    Ok(keys)
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealDataRow {
    pub dataset: String,
    pub dataset_size: usize,
    pub epsilon: u64,
    pub opt_avg: f64,
    pub opt_std: f64,
    pub samples: u64,
}

/// Rows of a real-data run, in dataset then ε order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealDataTable {
    pub rows: Vec<RealDataRow>,
}

impl CsvReport for RealDataTable {
    type Row = RealDataRow;

    fn header(&self) -> &'static str {
        CSV_HEADER
    }

    fn rows(&self) -> Vec<RealDataRow> {
        self.rows.clone()
    }

    fn format_row(r: &RealDataRow) -> String {
        format!(
            "{},{},{},{},{},{}",
            r.dataset, r.dataset_size, r.epsilon, r.opt_avg, r.opt_std, r.samples
        )
    }
}

/// Segment every dataset for every ε of `config`.
///
/// Error bounds of one dataset are processed in parallel; rows come back in
/// ε order.
pub fn run<P: AsRef<Path>>(paths: &[P], config: &RealDataConfig) -> Result<RealDataTable> {
    config.validate()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .thread_name(|i| format!("plasim-worker-{i}"))
        .build()?;

    let mut table = RealDataTable::default();
    for path in paths {
        let path: PathBuf = path.as_ref().to_path_buf();
        let dataset = Dataset::load(&path, config.binary)?;
        tracing::info!(dataset = %dataset.name, keys = dataset.keys.len(), "segmenting dataset");

        let epsilons: Vec<u64> = config.epsilons().collect();
        let stats: Vec<RunningStat> = pool.install(|| {
            epsilons
                .par_iter()
                .map(|&eps| dataset.segment_lengths(eps as f64))
                .collect::<Result<_>>()
        })?;

        table
            .rows
            .extend(epsilons.iter().zip(stats).map(|(&epsilon, stat)| RealDataRow {
                dataset: dataset.name.clone(),
                dataset_size: dataset.keys.len(),
                epsilon,
                opt_avg: stat.mean(),
                opt_std: stat.standard_deviation(),
                samples: stat.samples(),
            }));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_lengths_cover_dataset() {
        let dataset = Dataset {
            name: "squares".to_string(),
            keys: (0..200u64).map(|i| i * i).collect(),
        };
        for eps in [1.0, 4.0, 32.0] {
            let stat = dataset.segment_lengths(eps).unwrap();
            assert!((stat.total() - 200.0).abs() < 1e-9);
        }
        // A linear dataset is one segment.
        let linear = Dataset {
            name: "linear".to_string(),
            keys: (0..500u64).map(|i| 7 * i + 3).collect(),
        };
        let stat = linear.segment_lengths(1.0).unwrap();
        assert_eq!(stat.samples(), 1);
        assert_eq!(stat.mean(), 500.0);
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset {
            name: "empty".to_string(),
            keys: Vec::new(),
        };
        assert_eq!(dataset.segment_lengths(2.0).unwrap().samples(), 0);
    }
}
