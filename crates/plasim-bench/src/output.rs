//! Output formatters for experiment results.
//!
//! This module provides:
//! - The [`CsvReport`] trait implemented by every result table
//! - `#`-prefixed preamble lines describing the gap process
//! - [`RunTotals`], the completed and rejected trial counts of a run
//! - JSON export of a finished report

use plasim_core::{Correlation, Theory};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write};

/// A result table that renders to CSV.
pub trait CsvReport {
    type Row: Serialize;

    /// Comma-separated column names.
    fn header(&self) -> &'static str;

    /// Rows in output order.
    fn rows(&self) -> Vec<Self::Row>;

    /// One CSV line for `row`, without the trailing newline.
    fn format_row(row: &Self::Row) -> String;

    /// Header and rows, newline-terminated.
    fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(self.header());
        out.push('\n');
        for row in self.rows() {
            out.push_str(&Self::format_row(&row));
            out.push('\n');
        }
        out
    }
}

/// Descriptive lines printed before a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Preamble {
    pub lines: Vec<(String, String)>,
}

impl Preamble {
    /// Mean, variance, process and MET constant of a gap process.
    pub fn for_process(theory: &Theory, correlation: &Correlation) -> Self {
        let mut preamble = Preamble::default();
        preamble.push("mean", theory.mean);
        preamble.push("variance", theory.variance);
        let process = correlation.to_string();
        if let Some((label, value)) = process.rsplit_once(' ') {
            preamble.push(label, value);
        }
        preamble.push("met constant", theory.met_constant);
        preamble
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl ToString) {
        self.lines.push((label.into(), value.to_string()));
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (label, value) in &self.lines {
            // Writing to a String cannot fail.
            let _ = writeln!(out, "# {label} {value}");
        }
        out
    }
}

/// Trial counts of a run.
///
/// Rejected trials are part of `completed` but absent from the table, so
/// every report carries both counts next to the rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub completed: u64,
    pub rejected: u64,
}

impl RunTotals {
    /// The `# rejected R of C` line.
    pub fn preamble(&self) -> Preamble {
        let mut preamble = Preamble::default();
        preamble.push("rejected", format!("{} of {}", self.rejected, self.completed));
        preamble
    }
}

#[derive(Serialize)]
struct JsonReport<'a, R: Serialize> {
    preamble: &'a Preamble,
    #[serde(skip_serializing_if = "Option::is_none")]
    trials: Option<RunTotals>,
    rows: Vec<R>,
}

/// Write the preamble and table as CSV.
pub fn write_csv<T: CsvReport, W: Write>(
    out: &mut W,
    preamble: &Preamble,
    table: &T,
) -> io::Result<()> {
    out.write_all(preamble.render().as_bytes())?;
    out.write_all(table.to_csv().as_bytes())?;
    out.flush()
}

/// Write the preamble and table as one JSON document.
pub fn write_json<T: CsvReport, W: Write>(
    out: &mut W,
    preamble: &Preamble,
    table: &T,
    trials: Option<RunTotals>,
) -> io::Result<()> {
    let report = JsonReport {
        preamble,
        trials,
        rows: table.rows(),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    out.flush()
}

/// Write the report of a Monte Carlo run.
///
/// CSV output assumes `preamble` was printed before the run started and
/// only adds the trial counts; JSON output is one self-contained document.
pub fn write_report<T: CsvReport, W: Write>(
    out: &mut W,
    preamble: &Preamble,
    table: &T,
    trials: RunTotals,
    json: bool,
) -> io::Result<()> {
    if json {
        write_json(out, preamble, table, Some(trials))
    } else {
        write_csv(out, &trials.preamble(), table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasim_core::Moments;

    #[test]
    fn test_preamble_moving_average() {
        let theory = Theory::new(
            Moments {
                mean: 0.5,
                variance: 0.25,
            },
            &Correlation::MovingAverage { order: 3 },
        )
        .unwrap();
        let text = Preamble::for_process(&theory, &Correlation::MovingAverage { order: 3 }).render();
        assert_eq!(
            text,
            "# mean 0.5\n# variance 0.25\n# moving-average process order 3\n# met constant 1\n"
        );
    }

    #[test]
    fn test_preamble_autoregressive() {
        let correlation = Correlation::Autoregressive { phi: 0.5 };
        let theory = Theory::new(
            Moments {
                mean: 1.0,
                variance: 1.0,
            },
            &correlation,
        )
        .unwrap();
        let text = Preamble::for_process(&theory, &correlation).render();
        assert!(text.contains("# autoregressive process phi 0.5\n"));
        assert!(text.starts_with("# mean 2\n"));
    }

    struct Counts(Vec<u64>);

    impl CsvReport for Counts {
        type Row = u64;

        fn header(&self) -> &'static str {
            "count"
        }

        fn rows(&self) -> Vec<u64> {
            self.0.clone()
        }

        fn format_row(row: &u64) -> String {
            row.to_string()
        }
    }

    #[test]
    fn test_csv_report_shows_rejections() {
        let trials = RunTotals {
            completed: 2000,
            rejected: 1953,
        };
        let mut out = Vec::new();
        write_report(&mut out, &Preamble::default(), &Counts(vec![47]), trials, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# rejected 1953 of 2000\ncount\n47\n"
        );
    }

    #[test]
    fn test_json_report_shows_rejections() {
        let trials = RunTotals {
            completed: 10,
            rejected: 3,
        };
        let mut preamble = Preamble::default();
        preamble.push("mean", 1.5);
        let mut out = Vec::new();
        write_report(&mut out, &preamble, &Counts(vec![4, 5]), trials, true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["trials"]["completed"], 10);
        assert_eq!(value["trials"]["rejected"], 3);
        assert_eq!(value["rows"], serde_json::json!([4, 5]));
        assert_eq!(value["preamble"]["lines"][0][0], "mean");
    }
}
