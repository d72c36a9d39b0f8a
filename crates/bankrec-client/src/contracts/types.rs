use serde::Serialize;

use crate::statement::detect::BankFormat;

#[derive(Debug, Clone, Serialize)]
pub struct SuggestedParty {
    pub party_id: i64,
    pub name: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedLine {
    pub line_id: String,
    pub line_no: i64,
    pub date: Option<String>,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub direction: String,
    pub suggested_party: Option<SuggestedParty>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportData {
    pub success: bool,
    pub statement_id: String,
    pub file_name: String,
    pub total_transactions: i64,
    pub total_credits: f64,
    pub total_debits: f64,
    pub matched_count: i64,
    pub unmatched_count: i64,
    pub skipped_rows: i64,
    pub warnings: Vec<String>,
    pub transactions: Vec<UnmatchedLine>,
    pub format: BankFormat,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementSummary {
    pub statement_id: String,
    pub file_name: String,
    pub file_hash: String,
    pub import_date: String,
    pub statement_date: Option<String>,
    pub total_credits: f64,
    pub total_debits: f64,
    pub record_count: i64,
    pub status: String,
    pub format_id: String,
    pub format_confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementListData {
    pub rows: Vec<StatementSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementLine {
    pub line_id: String,
    pub statement_id: String,
    pub line_no: i64,
    pub transaction_date: Option<String>,
    pub description: String,
    pub amount: f64,
    pub direction: String,
    pub balance: Option<f64>,
    pub reconciliation_state: String,
    pub matched_transaction_id: Option<i64>,
    pub match_category: Option<String>,
    pub match_confidence: Option<f64>,
    pub prior_payment_status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementDetailData {
    pub statement: StatementSummary,
    pub lines: Vec<StatementLine>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StateBucket {
    pub count: i64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationStatusData {
    pub statement_id: String,
    pub status: String,
    pub total_lines: i64,
    pub unreconciled: StateBucket,
    pub reconciled: StateBucket,
    pub ignored: StateBucket,
    pub auto_matched: i64,
    pub manual_matched: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteStatementData {
    pub statement_id: String,
    pub deleted_lines: i64,
    pub restored_transactions: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoMatchDecision {
    pub line_id: String,
    pub transaction_id: i64,
    pub score: f64,
    pub confidence: f64,
    pub payment_status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoReconcileData {
    pub statement_id: String,
    pub status: String,
    pub matched_count: i64,
    pub unmatched_count: i64,
    pub matches: Vec<AutoMatchDecision>,
    pub unmatched: Vec<UnmatchedLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineActionData {
    pub line_id: String,
    pub action: String,
    pub audit_id: String,
    pub statement_status: String,
    pub line: StatementLine,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub audit_id: String,
    pub performed_by: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub old_values: serde_json::Value,
    pub new_values: serde_json::Value,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditTrailData {
    pub line_id: String,
    pub rows: Vec<AuditRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportData {
    pub statement_id: String,
    pub row_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerLoadData {
    pub path: String,
    pub parties_upserted: i64,
    pub transactions_upserted: i64,
}
