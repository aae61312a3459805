use crate::models::{BatchSummary, ImportResponse, RowOutcome, RowStatus, UpsertOutcome};

use super::rejection::Rejection;

impl RowOutcome {
    pub fn written(row: usize, student_name: &str, outcome: UpsertOutcome) -> Self {
        Self {
            row,
            student_name: Some(student_name.to_string()),
            status: match outcome {
                UpsertOutcome::Added => RowStatus::Added,
                UpsertOutcome::Updated => RowStatus::Updated,
            },
            reason: None,
        }
    }

    pub fn rejected(row: usize, student_name: Option<String>, rejection: &Rejection) -> Self {
        Self {
            row,
            student_name,
            status: RowStatus::Rejected,
            reason: Some(rejection.to_string()),
        }
    }
}

pub fn row_message(row: usize, reason: &str) -> String {
    format!("ردیف {}: {}", row, reason)
}

pub fn summarize(outcomes: &[RowOutcome]) -> BatchSummary {
    let mut summary = BatchSummary {
        total: outcomes.len(),
        ..BatchSummary::default()
    };
    for outcome in outcomes {
        match outcome.status {
            RowStatus::Added => summary.added += 1,
            RowStatus::Updated => summary.updated += 1,
            RowStatus::Rejected => {
                summary.failed += 1;
                let reason = outcome.reason.as_deref().unwrap_or_default();
                summary.errors.push(row_message(outcome.row, reason));
            }
        }
    }
    summary.success = summary.added + summary.updated;
    summary
}

pub fn build_response(outcomes: Vec<RowOutcome>) -> ImportResponse {
    let summary = summarize(&outcomes);
    let message = if summary.total == 0 {
        "هیچ ردیفی برای ورود اطلاعات یافت نشد".to_string()
    } else {
        format!(
            "ورود اطلاعات انجام شد: {} مورد جدید، {} مورد به‌روزرسانی و {} مورد ناموفق",
            summary.added, summary.updated, summary.failed
        )
    };
    let errors = summary.errors.clone();
    ImportResponse {
        success: true,
        message,
        summary,
        results: outcomes,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::rejection::RequiredField;

    #[test]
    fn counts_each_outcome_kind() {
        let outcomes = vec![
            RowOutcome::written(2, "علی", UpsertOutcome::Added),
            RowOutcome::written(3, "مریم", UpsertOutcome::Updated),
            RowOutcome::rejected(4, None, &Rejection::InvalidScore),
            RowOutcome::written(5, "سارا", UpsertOutcome::Added),
        ];
        let summary = summarize(&outcomes);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.success, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].starts_with("ردیف 4: "));
    }

    #[test]
    fn all_failed_batch_is_still_a_normal_summary() {
        let outcomes = vec![
            RowOutcome::rejected(2, None, &Rejection::InvalidDate),
            RowOutcome::rejected(3, None, &Rejection::MissingField(RequiredField::Date)),
        ];
        let response = build_response(outcomes);
        assert!(response.success);
        assert_eq!(response.summary.failed, 2);
        assert_eq!(response.summary.success, 0);
        assert_eq!(response.errors, vec![
            row_message(2, &Rejection::InvalidDate.to_string()),
            row_message(3, &Rejection::MissingField(RequiredField::Date).to_string()),
        ]);
    }

    #[test]
    fn empty_batch_reports_zero_rows() {
        let response = build_response(Vec::new());
        assert_eq!(response.summary, BatchSummary::default());
        assert!(response.results.is_empty());
    }
}
