//! Parser for ShowPlan XML execution plans
//!
//! SSMS exports plans as UTF-16 more often than not, so the byte entry point
//! runs a strict decoding chain before the XML is touched. Attribute values
//! are carried verbatim; an absent attribute degrades to the `"N/A"` sentinel
//! instead of failing the document.

use crate::models::{NOT_AVAILABLE, PlanOperator};
use crate::parser::error::{ParseError, ParseResult};
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use roxmltree::{Document, Node};
use std::collections::HashMap;

/// Namespace of every element in a SQL Server execution plan document
pub const SHOWPLAN_NS: &str = "http://schemas.microsoft.com/sqlserver/2004/07/showplan";

/// Parser for execution plan documents
pub struct PlanParser;

impl PlanParser {
    /// Decode raw plan bytes and parse them
    ///
    /// Tries UTF-16-LE, then UTF-16-BE, then UTF-8, strictly (no replacement
    /// characters). Used when the caller hands over file contents instead of
    /// already-decoded text.
    pub fn parse_bytes(bytes: &[u8]) -> ParseResult<Vec<PlanOperator>> {
        let content = Self::decode(bytes)?;
        Self::parse(&content)
    }

    /// Parse an already-decoded plan document
    ///
    /// Fails only when the document is not well-formed XML after one retry
    /// with a leading byte-order mark stripped, or when it contains no
    /// `RelOp` element at all.
    pub fn parse(content: &str) -> ParseResult<Vec<PlanOperator>> {
        let doc = match Document::parse(content) {
            Ok(doc) => doc,
            Err(err) => match content.strip_prefix('\u{feff}').map(Document::parse) {
                Some(Ok(doc)) => doc,
                // The retry failed too; report where the original attempt died.
                _ => return Err(Self::malformed(&err)),
            },
        };

        let statements = Self::collect_statements(&doc);

        let rel_ops: Vec<Node> = doc
            .descendants()
            .filter(|n| n.has_tag_name((SHOWPLAN_NS, "RelOp")))
            .collect();
        if rel_ops.is_empty() {
            return Err(ParseError::NoOperators);
        }

        // The first operator in document order stands in for the plan's total
        // cost; if its cost does not parse, every percentage degrades to zero.
        let reference_cost = rel_ops[0]
            .attribute("EstimatedTotalSubtreeCost")
            .and_then(|v| v.parse::<f64>().ok());
        if reference_cost.is_none() {
            tracing::warn!(
                "Could not calculate cost percentages: reference subtree cost is missing or not numeric"
            );
        }

        let operators = rel_ops
            .into_iter()
            .map(|rel_op| Self::build_operator(rel_op, &statements, reference_cost))
            .collect();

        Ok(operators)
    }

    fn decode(bytes: &[u8]) -> ParseResult<String> {
        let chain: [(&Encoding, &str); 3] =
            [(UTF_16LE, "UTF-16-LE"), (UTF_16BE, "UTF-16-BE"), (UTF_8, "UTF-8")];

        for (encoding, label) in chain {
            if let Some(decoded) = encoding.decode_without_bom_handling_and_without_replacement(bytes)
            {
                // ASCII UTF-8 of even length is also "valid" UTF-16, so a
                // strict decode alone cannot pick the right chain entry;
                // require the result to actually contain markup.
                if decoded.contains('<') {
                    tracing::debug!("Decoded execution plan with {} encoding", label);
                    return Ok(decoded.into_owned());
                }
            }
        }
        Err(ParseError::Decode(
            "content is not valid UTF-16-LE, UTF-16-BE or UTF-8".to_string(),
        ))
    }

    fn malformed(err: &roxmltree::Error) -> ParseError {
        let pos = err.pos();
        ParseError::MalformedXml { line: pos.row, column: pos.col, message: err.to_string() }
    }

    /// Collect every `StmtSimple` in the document, keyed by `StatementId`
    ///
    /// Statements are picked up at any nesting depth; the first occurrence of
    /// an id wins.
    fn collect_statements<'a>(
        doc: &'a Document<'a>,
    ) -> HashMap<&'a str, (Option<&'a str>, Option<&'a str>)> {
        let mut statements = HashMap::new();
        for stmt in doc
            .descendants()
            .filter(|n| n.has_tag_name((SHOWPLAN_NS, "StmtSimple")))
        {
            if let Some(id) = stmt.attribute("StatementId") {
                statements
                    .entry(id)
                    .or_insert((stmt.attribute("StatementType"), stmt.attribute("StatementText")));
            }
        }
        statements
    }

    fn build_operator(
        rel_op: Node,
        statements: &HashMap<&str, (Option<&str>, Option<&str>)>,
        reference_cost: Option<f64>,
    ) -> PlanOperator {
        let attr = |name: &str| rel_op.attribute(name).unwrap_or(NOT_AVAILABLE).to_string();

        let statement_id = rel_op
            .ancestors()
            .find(|n| n.has_tag_name((SHOWPLAN_NS, "StmtSimple")))
            .and_then(|stmt| stmt.attribute("StatementId"))
            .map(str::to_string);

        let (statement_type, statement_text) = statement_id
            .as_deref()
            .and_then(|id| statements.get(id))
            .map(|(ty, text)| (ty.map(str::to_string), text.map(str::to_string)))
            .unwrap_or((None, None));

        let subtree_cost = attr("EstimatedTotalSubtreeCost");
        let cost_percentage = match (reference_cost, subtree_cost.parse::<f64>()) {
            (Some(total), Ok(cost)) => Self::round2(cost / total * 100.0),
            _ => 0.0,
        };

        PlanOperator {
            node_id: attr("NodeId"),
            statement_id,
            statement_type,
            statement_text,
            physical_op: attr("PhysicalOp"),
            logical_op: attr("LogicalOp"),
            estimate_rows: attr("EstimateRows"),
            estimate_cpu: attr("EstimateCPU"),
            estimate_io: attr("EstimateIO"),
            avg_row_size: attr("AvgRowSize"),
            parallel: attr("Parallel"),
            estimated_total_subtree_cost: subtree_cost,
            cost_percentage,
        }
    }

    fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }
}
