use std::fmt;

use thiserror::Error;

/// Required spreadsheet fields, named the way teachers see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    StudentName,
    ClassName,
    LessonName,
    ActivityType,
    Date,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequiredField::StudentName => "نام دانش‌آموز",
            RequiredField::ClassName => "کلاس",
            RequiredField::LessonName => "درس",
            RequiredField::ActivityType => "نوع فعالیت",
            RequiredField::Date => "تاریخ",
        };
        f.write_str(label)
    }
}

/// Why a single row was not written. Collected per row, never propagated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("فیلد الزامی «{0}» خالی است")]
    MissingField(RequiredField),

    #[error("تاریخ وارد شده نامعتبر است")]
    InvalidDate,

    #[error("نمره نامعتبر است؛ نمره باید عددی بین ۰ تا ۲۰ باشد")]
    InvalidScore,

    #[error("برای «{0}» وارد کردن نمره کمی الزامی است")]
    ScoreRequired(String),

    #[error("برای «{0}» نمره کمی مجاز نیست")]
    ScoreNotAllowed(String),

    #[error("برای «{0}» ارزشیابی کیفی مجاز نیست")]
    QualitativeNotAllowed(String),

    #[error("نوع فعالیت «{0}» شناخته نشد")]
    UnknownActivityType(String),

    #[error("کلاس «{0}» در میان کلاس‌های شما یافت نشد")]
    UnknownClass(String),

    #[error("دانش‌آموز «{0}» یافت نشد")]
    StudentNotFound(String),

    #[error("نام «{0}» با بیش از یک دانش‌آموز مطابقت دارد؛ لطفاً کد ملی را وارد کنید")]
    StudentAmbiguous(String),

    #[error("دانش‌آموز «{0}» در کلاس «{1}» ثبت‌نام نشده است")]
    StudentNotInClass(String, String),

    #[error("درس «{0}» در کلاس «{1}» به شما اختصاص داده نشده است")]
    LessonNotFound(String, String),
}
