//! SQL Server Diagnostics Analyzer
//!
//! Parses two SQL Server diagnostic formats into typed, serializable records:
//!
//! - `SET STATISTICS IO`/`TIME` output pasted from SSMS, split into per-query
//!   blocks with per-table I/O counters ([`parser::StatsParser`])
//! - `ShowPlanXML` execution plans, walked into a flat operator list with
//!   relative cost percentages ([`parser::PlanParser`])
//!
//! The rendering layer consumes the models as-is; the [`summary`] module
//! provides the aggregate views it displays (per-table roll-up, statement
//! cost summary, top-N operators).
//!
//! # Usage
//!
//! ```
//! use sqldiag::analyze_stats;
//!
//! let text = "Table 'Orders'. Scan count 1, logical reads 4, physical reads 0, \
//!             read-ahead reads 0, lob logical reads 0, lob physical reads 0, \
//!             lob read-ahead reads 0\n(3 rows affected)\n";
//! let analysis = analyze_stats(text);
//! assert_eq!(analysis.total_logical_reads, 4);
//! ```

pub mod models;
pub mod parser;
pub mod summary;


// Re-export commonly used types
pub use models::{
    PlanAnalysis, PlanOperator, QueryStats, StatementCostSummary, StatsAnalysis, TableIoRollup,
    TableStats,
};
pub use parser::{ParseError, ParseResult, PlanParser, StatsParser};

/// Operators shown in the "most expensive operations" chart
const TOP_OPERATOR_COUNT: usize = 10;

/// Parse statistics output and bundle it with its aggregate views
///
/// Never fails: unrecognized lines and blocks are dropped, matching how noisy
/// diagnostic output behaves in practice.
pub fn analyze_stats(text: &str) -> StatsAnalysis {
    let queries = StatsParser::parse(text);
    let table_rollup = summary::rollup_tables(&queries);
    let total_logical_reads = summary::total_logical_reads(&queries);

    StatsAnalysis { queries, table_rollup, total_logical_reads }
}

/// Parse an execution plan document and bundle it with its aggregate views
pub fn analyze_plan(content: &str) -> ParseResult<PlanAnalysis> {
    let operators = PlanParser::parse(content)?;
    Ok(build_plan_analysis(operators))
}

/// Like [`analyze_plan`], for raw (possibly UTF-16) plan bytes
pub fn analyze_plan_bytes(bytes: &[u8]) -> ParseResult<PlanAnalysis> {
    let operators = PlanParser::parse_bytes(bytes)?;
    Ok(build_plan_analysis(operators))
}

fn build_plan_analysis(operators: Vec<PlanOperator>) -> PlanAnalysis {
    let statement_summary = summary::summarize_statements(&operators);
    let top_operators = summary::top_operators(&operators, TOP_OPERATOR_COUNT);

    PlanAnalysis { operators, statement_summary, top_operators }
}
