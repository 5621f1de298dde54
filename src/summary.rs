//! Aggregated views over parsed diagnostics
//!
//! Pure roll-ups consumed by the rendering layer: per-table I/O totals across
//! all queries, per-statement-type cost totals, and the top-N operators for
//! the cost chart.

use crate::models::{NOT_AVAILABLE, PlanOperator, QueryStats, StatementCostSummary, TableIoRollup};
use std::collections::HashMap;

/// Sum scan counts and read counters per table name across all queries
///
/// Tables are listed in first-seen order so the roll-up view stays stable
/// against the pasted input.
pub fn rollup_tables(queries: &[QueryStats]) -> Vec<TableIoRollup> {
    let mut rollup: Vec<TableIoRollup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for table in queries.iter().flat_map(|q| q.tables.iter()) {
        let slot = *index.entry(table.table_name.clone()).or_insert_with(|| {
            rollup.push(TableIoRollup {
                table_name: table.table_name.clone(),
                scan_count: 0,
                logical_reads: 0,
                physical_reads: 0,
            });
            rollup.len() - 1
        });
        rollup[slot].scan_count += table.scan_count;
        rollup[slot].logical_reads += table.logical_reads;
        rollup[slot].physical_reads += table.physical_reads;
    }

    rollup
}

/// Total logical reads across every query, the dashboard's headline number
pub fn total_logical_reads(queries: &[QueryStats]) -> u64 {
    queries.iter().map(|q| q.logical_reads()).sum()
}

/// Group operators by statement type, totalling cost share and cardinality
///
/// Operators without a joined statement land in the `"N/A"` bucket. Estimated
/// row counts that are not numeric are skipped, not counted as zero rows of a
/// failed parse. Sorted by total cost share descending.
pub fn summarize_statements(operators: &[PlanOperator]) -> Vec<StatementCostSummary> {
    let mut summaries: Vec<StatementCostSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for op in operators {
        let statement_type = op.statement_type.as_deref().unwrap_or(NOT_AVAILABLE);
        let slot = *index.entry(statement_type).or_insert_with(|| {
            summaries.push(StatementCostSummary {
                statement_type: statement_type.to_string(),
                total_cost_percentage: 0.0,
                total_estimate_rows: 0.0,
                operator_count: 0,
            });
            summaries.len() - 1
        });
        summaries[slot].total_cost_percentage += op.cost_percentage;
        if let Ok(rows) = op.estimate_rows.parse::<f64>() {
            summaries[slot].total_estimate_rows += rows;
        }
        summaries[slot].operator_count += 1;
    }

    summaries.sort_by(|a, b| {
        b.total_cost_percentage
            .partial_cmp(&a.total_cost_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summaries
}

/// The `n` most expensive operators by cost share, for the focused chart
pub fn top_operators(operators: &[PlanOperator], n: usize) -> Vec<PlanOperator> {
    let mut sorted: Vec<PlanOperator> = operators.to_vec();
    sorted.sort_by(|a, b| {
        b.cost_percentage.partial_cmp(&a.cost_percentage).unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableStats;

    fn table(name: &str, scans: u64, logical: u64, physical: u64) -> TableStats {
        TableStats {
            table_name: name.to_string(),
            scan_count: scans,
            logical_reads: logical,
            physical_reads: physical,
            read_ahead_reads: 0,
            lob_logical_reads: 0,
            lob_physical_reads: 0,
            lob_read_ahead_reads: 0,
        }
    }

    fn operator(statement_type: Option<&str>, rows: &str, cost_pct: f64) -> PlanOperator {
        PlanOperator {
            node_id: "0".to_string(),
            statement_id: statement_type.map(|_| "1".to_string()),
            statement_type: statement_type.map(str::to_string),
            statement_text: None,
            physical_op: "Clustered Index Scan".to_string(),
            logical_op: "Clustered Index Scan".to_string(),
            estimate_rows: rows.to_string(),
            estimate_cpu: "0.01".to_string(),
            estimate_io: "0.01".to_string(),
            avg_row_size: "20".to_string(),
            parallel: "0".to_string(),
            estimated_total_subtree_cost: "0.1".to_string(),
            cost_percentage: cost_pct,
        }
    }

    #[test]
    fn test_rollup_sums_across_queries() {
        let queries = vec![
            QueryStats { tables: vec![table("Orders", 1, 10, 2)], ..Default::default() },
            QueryStats {
                tables: vec![table("Customers", 1, 5, 0), table("Orders", 2, 7, 1)],
                ..Default::default()
            },
        ];

        let rollup = rollup_tables(&queries);
        assert_eq!(rollup.len(), 2);
        assert_eq!(rollup[0].table_name, "Orders");
        assert_eq!(rollup[0].scan_count, 3);
        assert_eq!(rollup[0].logical_reads, 17);
        assert_eq!(rollup[0].physical_reads, 3);
        assert_eq!(rollup[1].table_name, "Customers");

        assert_eq!(total_logical_reads(&queries), 22);
    }

    #[test]
    fn test_summarize_statements_buckets_and_sorts() {
        let operators = vec![
            operator(Some("SELECT"), "10", 40.0),
            operator(Some("SELECT"), "not-a-number", 20.0),
            operator(Some("UPDATE"), "5", 100.0),
            operator(None, "1", 1.0),
        ];

        let summary = summarize_statements(&operators);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].statement_type, "UPDATE");
        assert_eq!(summary[1].statement_type, "SELECT");
        assert_eq!(summary[1].total_cost_percentage, 60.0);
        assert_eq!(summary[1].total_estimate_rows, 10.0);
        assert_eq!(summary[1].operator_count, 2);
        assert_eq!(summary[2].statement_type, NOT_AVAILABLE);
    }

    #[test]
    fn test_top_operators_orders_and_truncates() {
        let operators = vec![
            operator(Some("SELECT"), "1", 10.0),
            operator(Some("SELECT"), "1", 100.0),
            operator(Some("SELECT"), "1", 55.0),
        ];

        let top = top_operators(&operators, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].cost_percentage, 100.0);
        assert_eq!(top[1].cost_percentage, 55.0);
    }
}
