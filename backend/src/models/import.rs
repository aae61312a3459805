use serde::Serialize;

/// One raw input record, as read from a spreadsheet row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    /// 1-based row number in the source sheet, header included.
    pub row_number: usize,
    /// Operator-entered ordinal column, if any.
    pub ordinal: Option<String>,
    pub student_name: Option<String>,
    pub national_id: Option<String>,
    pub class_name: Option<String>,
    pub grade: Option<String>,
    pub lesson_name: Option<String>,
    pub activity_type: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub score: Option<String>,
    pub qualitative: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Added,
    Updated,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowOutcome {
    pub row: usize,
    pub student_name: Option<String>,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub added: usize,
    pub updated: usize,
    /// Rows written, added plus updated.
    pub success: usize,
    pub failed: usize,
    #[serde(skip)]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub summary: BatchSummary,
    pub results: Vec<RowOutcome>,
    pub errors: Vec<String>,
}
