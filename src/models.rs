//! Diagnostic data models
//!
//! These models represent the structured data extracted from SQL Server
//! diagnostic output. They are designed to be serializable for API responses
//! and ready for frontend visualization.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Sentinel used for ShowPlan attributes that are absent on an operator node.
pub const NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// Statistics IO / TIME Output
// ============================================================================

/// Per-table I/O counters from one `SET STATISTICS IO` table line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub table_name: String,
    pub scan_count: u64,
    pub logical_reads: u64,
    pub physical_reads: u64,
    pub read_ahead_reads: u64,
    pub lob_logical_reads: u64,
    pub lob_physical_reads: u64,
    pub lob_read_ahead_reads: u64,
}

/// Everything reported for a single query block of the statistics output
///
/// A block may report rows-affected more than once (one per statement), so the
/// counts are kept as an ordered list alongside the table lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryStats {
    pub tables: Vec<TableStats>,
    pub rows_affected: Vec<u64>,
    pub completion_time: Option<NaiveDateTime>,
}

impl QueryStats {
    /// A block with no recognized lines is discarded rather than emitted.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.rows_affected.is_empty() && self.completion_time.is_none()
    }

    /// Sum of logical reads over this query's table lines
    pub fn logical_reads(&self) -> u64 {
        self.tables.iter().map(|t| t.logical_reads).sum()
    }
}

// ============================================================================
// Execution Plan (ShowPlan XML)
// ============================================================================

/// One `RelOp` node of a ShowPlan document, joined to its owning statement
///
/// Attribute values are kept verbatim as strings; absent attributes carry the
/// `"N/A"` sentinel instead of failing the parse. The statement fields come
/// from a left join on `StatementId` and stay `None` for operators that sit
/// outside any identified statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOperator {
    pub node_id: String,
    pub statement_id: Option<String>,
    pub statement_type: Option<String>,
    pub statement_text: Option<String>,
    pub physical_op: String,
    pub logical_op: String,
    pub estimate_rows: String,
    pub estimate_cpu: String,
    pub estimate_io: String,
    pub avg_row_size: String,
    pub parallel: String,
    pub estimated_total_subtree_cost: String,
    /// Subtree cost relative to the first operator in the document, ×100,
    /// rounded to 2 decimals. 0.0 when either side is non-numeric.
    pub cost_percentage: f64,
}

// ============================================================================
// Aggregated Views
// ============================================================================

/// Per-table I/O totals accumulated across every parsed query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableIoRollup {
    pub table_name: String,
    pub scan_count: u64,
    pub logical_reads: u64,
    pub physical_reads: u64,
}

/// Cost and cardinality totals for one statement type of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementCostSummary {
    pub statement_type: String,
    pub total_cost_percentage: f64,
    pub total_estimate_rows: f64,
    pub operator_count: usize,
}

/// Complete statistics analysis handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsAnalysis {
    pub queries: Vec<QueryStats>,
    pub table_rollup: Vec<TableIoRollup>,
    pub total_logical_reads: u64,
}

/// Complete execution plan analysis handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAnalysis {
    pub operators: Vec<PlanOperator>,
    pub statement_summary: Vec<StatementCostSummary>,
    pub top_operators: Vec<PlanOperator>,
}
