//! Parser for `SET STATISTICS IO`/`TIME` output
//!
//! The input is free-form text pasted from SSMS: query blocks separated by
//! blank lines, each block carrying per-table I/O lines, rows-affected lines
//! and an optional completion timestamp. Diagnostic output is noisy, so any
//! line that does not match the fixed grammar is dropped without error.

use crate::models::{QueryStats, TableStats};
use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static TABLE_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^Table '([^']+)'\. Scan count (\d+), logical reads (\d+), physical reads (\d+), read-ahead reads (\d+), lob logical reads (\d+), lob physical reads (\d+), lob read-ahead reads (\d+)",
    )
    .unwrap()
});

static ROWS_AFFECTED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\((\d+) rows affected\)").unwrap());

/// Parser for statistics output text
pub struct StatsParser;

impl StatsParser {
    /// Parse pasted statistics text into per-query records
    ///
    /// Blocks are delimited by blank lines and emitted in document order;
    /// blocks with no recognized content are skipped entirely.
    pub fn parse(text: &str) -> Vec<QueryStats> {
        let mut all_stats = Vec::new();

        for block in text.split("\n\n") {
            if block.trim().is_empty() {
                continue;
            }

            let mut stats = QueryStats::default();

            for line in block.trim().lines() {
                if line.starts_with("Table") {
                    if let Some(table) = Self::parse_table_line(line) {
                        stats.tables.push(table);
                    }
                } else if line.starts_with('(') && line.contains("rows affected") {
                    if let Some(caps) = ROWS_AFFECTED_REGEX.captures(line) {
                        if let Ok(rows) = caps[1].parse() {
                            stats.rows_affected.push(rows);
                        }
                    }
                } else if line.starts_with("Completion time") {
                    stats.completion_time = line
                        .strip_prefix("Completion time: ")
                        .and_then(Self::parse_completion_time);
                }
            }

            if !stats.is_empty() {
                all_stats.push(stats);
            }
        }

        all_stats
    }

    /// Parse one `Table '...'` counter line, `None` if it deviates from the grammar
    fn parse_table_line(line: &str) -> Option<TableStats> {
        let caps = TABLE_LINE_REGEX.captures(line)?;
        let count = |i: usize| caps[i].parse::<u64>().ok();

        Some(TableStats {
            table_name: caps[1].to_string(),
            scan_count: count(2)?,
            logical_reads: count(3)?,
            physical_reads: count(4)?,
            read_ahead_reads: count(5)?,
            lob_logical_reads: count(6)?,
            lob_physical_reads: count(7)?,
            lob_read_ahead_reads: count(8)?,
        })
    }

    /// SSMS prints completion times with or without a UTC offset; offsets are
    /// accepted and discarded.
    fn parse_completion_time(value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        value
            .parse::<NaiveDateTime>()
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_local()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_line() {
        let line = "Table 'Orders'. Scan count 1, logical reads 4, physical reads 0, read-ahead reads 0, lob logical reads 0, lob physical reads 0, lob read-ahead reads 0";
        let table = StatsParser::parse_table_line(line).unwrap();
        assert_eq!(table.table_name, "Orders");
        assert_eq!(table.scan_count, 1);
        assert_eq!(table.logical_reads, 4);
        assert_eq!(table.physical_reads, 0);
    }

    #[test]
    fn test_malformed_table_line_is_dropped() {
        let line = "Table 'Orders'. Scan count one, logical reads 4";
        assert!(StatsParser::parse_table_line(line).is_none());
    }

    #[test]
    fn test_rows_affected_and_completion_time() {
        let text = "(3 rows affected)\n(17 rows affected)\nCompletion time: 2024-01-01T00:00:00\n";
        let stats = StatsParser::parse(text);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].rows_affected, vec![3, 17]);
        assert_eq!(
            stats[0].completion_time.unwrap(),
            "2024-01-01T00:00:00".parse::<NaiveDateTime>().unwrap()
        );
    }

    #[test]
    fn test_completion_time_with_offset() {
        let stats = StatsParser::parse("Completion time: 2023-06-02T14:21:08.0000000+02:00\n");
        assert_eq!(stats.len(), 1);
        assert_eq!(
            stats[0].completion_time.unwrap(),
            "2023-06-02T14:21:08".parse::<NaiveDateTime>().unwrap()
        );
    }

    #[test]
    fn test_unparseable_completion_time_is_absent() {
        let text = "(1 rows affected)\nCompletion time: whenever\n";
        let stats = StatsParser::parse(text);
        assert_eq!(stats.len(), 1);
        assert!(stats[0].completion_time.is_none());
    }

    #[test]
    fn test_unrecognized_block_yields_nothing() {
        assert!(StatsParser::parse("foo\nbar\n\n").is_empty());
    }
}
