//! Spreadsheet decoding into [`ImportRow`]s, and the blank import template.

use std::io::Cursor;

use calamine::{Data, Ods, Range, Reader, Xls, Xlsx, open_workbook_from_rs};
use chrono::NaiveDate;
use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use crate::models::ImportRow;

use super::jalali::JalaliDate;
use super::text::{fold_name, non_empty};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Xls,
    Ods,
    Csv,
}

impl SheetFormat {
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" => Some(SheetFormat::Xlsx),
            "xls" => Some(SheetFormat::Xls),
            "ods" => Some(SheetFormat::Ods),
            "csv" => Some(SheetFormat::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("فایل قابل خواندن نیست: {0}")]
    Unreadable(String),

    #[error("فایل هیچ سطری ندارد")]
    Empty,

    #[error("ستون‌های الزامی در فایل یافت نشد: {0}")]
    MissingColumns(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Ordinal,
    StudentName,
    NationalId,
    ClassName,
    Grade,
    LessonName,
    ActivityType,
    Title,
    Date,
    Score,
    Qualitative,
}

/// Headers written to the template, in column order.
pub const TEMPLATE_HEADERS: [&str; 11] = [
    "ردیف",
    "نام دانش‌آموز",
    "کد ملی",
    "کلاس",
    "پایه",
    "درس",
    "نوع فعالیت",
    "عنوان فعالیت",
    "تاریخ",
    "نمره کمی",
    "ارزشیابی کیفی",
];

const HEADER_ALIASES: &[(Column, &[&str])] = &[
    (Column::Ordinal, &["ردیف", "row", "#"]),
    (
        Column::StudentName,
        &["نام دانش‌آموز", "نام و نام خانوادگی", "دانش‌آموز", "student_name", "student"],
    ),
    (Column::NationalId, &["کد ملی", "شماره ملی", "national_id"]),
    (Column::ClassName, &["کلاس", "نام کلاس", "class", "class_name"]),
    (Column::Grade, &["پایه", "grade"]),
    (Column::LessonName, &["درس", "نام درس", "lesson", "subject"]),
    (Column::ActivityType, &["نوع فعالیت", "activity_type"]),
    (Column::Title, &["عنوان فعالیت", "عنوان", "title"]),
    (Column::Date, &["تاریخ", "تاریخ فعالیت", "date"]),
    (Column::Score, &["نمره کمی", "نمره", "score"]),
    (
        Column::Qualitative,
        &["ارزشیابی کیفی", "ارزشیابی توصیفی", "qualitative"],
    ),
];

const REQUIRED_COLUMNS: [(Column, &str); 5] = [
    (Column::StudentName, "نام دانش‌آموز"),
    (Column::ClassName, "کلاس"),
    (Column::LessonName, "درس"),
    (Column::ActivityType, "نوع فعالیت"),
    (Column::Date, "تاریخ"),
];

fn header_key(text: &str) -> String {
    fold_name(text).replace(' ', "")
}

fn column_for_header(text: &str) -> Option<Column> {
    let key = header_key(text);
    if key.is_empty() {
        return None;
    }
    HEADER_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|a| header_key(a) == key))
        .map(|(column, _)| *column)
}

/// Cell text of one sheet. `first_row` is the 0-based sheet row of `rows[0]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub first_row: usize,
    pub rows: Vec<Vec<String>>,
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        // Real Excel dates are Gregorian; hand the pipeline a Jalali string.
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| JalaliDate::from_gregorian(d.date()).to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => NaiveDate::parse_from_str(s.get(..10).unwrap_or(s.as_str()), "%Y-%m-%d")
            .map(|d| JalaliDate::from_gregorian(d).to_string())
            .unwrap_or_else(|_| s.clone()),
        other => other.to_string(),
    }
}

fn grid_from_range(range: &Range<Data>) -> Grid {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let first_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let rows = range
        .rows()
        .map(|row| {
            let mut cells = vec![String::new(); first_col];
            cells.extend(row.iter().map(cell_text));
            cells
        })
        .collect();
    Grid { first_row, rows }
}

fn read_workbook<R>(bytes: Vec<u8>) -> Result<Grid, SheetError>
where
    R: Reader<Cursor<Vec<u8>>>,
{
    let mut workbook: R = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| SheetError::Unreadable(format!("{:?}", e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::Empty)?
        .map_err(|e| SheetError::Unreadable(format!("{:?}", e)))?;
    Ok(grid_from_range(&range))
}

fn read_csv(bytes: &[u8]) -> Result<Grid, SheetError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SheetError::Unreadable(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Grid { first_row: 0, rows })
}

pub fn read_grid(bytes: Vec<u8>, format: SheetFormat) -> Result<Grid, SheetError> {
    match format {
        SheetFormat::Xlsx => read_workbook::<Xlsx<_>>(bytes),
        SheetFormat::Xls => read_workbook::<Xls<_>>(bytes),
        SheetFormat::Ods => read_workbook::<Ods<_>>(bytes),
        SheetFormat::Csv => read_csv(&bytes),
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Maps the first non-blank row as the header and every later non-blank row
/// to an [`ImportRow`] numbered by its 1-based sheet row.
pub fn rows_from_grid(grid: &Grid) -> Result<Vec<ImportRow>, SheetError> {
    let header_index = grid
        .rows
        .iter()
        .position(|row| !is_blank(row))
        .ok_or(SheetError::Empty)?;

    let columns: Vec<Option<Column>> = grid.rows[header_index]
        .iter()
        .map(|h| column_for_header(h))
        .collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|(col, _)| !columns.contains(&Some(*col)))
        .map(|(_, name)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(SheetError::MissingColumns(missing.join("، ")));
    }

    let mut out = Vec::new();
    for (offset, cells) in grid.rows.iter().enumerate().skip(header_index + 1) {
        if is_blank(cells) {
            continue;
        }
        let mut row = ImportRow {
            row_number: grid.first_row + offset + 1,
            ..ImportRow::default()
        };
        for (cell, column) in cells.iter().zip(&columns) {
            let Some(column) = column else { continue };
            let value = non_empty(Some(cell.as_str()));
            match column {
                Column::Ordinal => row.ordinal = value,
                Column::StudentName => row.student_name = value,
                Column::NationalId => row.national_id = value,
                Column::ClassName => row.class_name = value,
                Column::Grade => row.grade = value,
                Column::LessonName => row.lesson_name = value,
                Column::ActivityType => row.activity_type = value,
                Column::Title => row.title = value,
                Column::Date => row.date = value,
                Column::Score => row.score = value,
                Column::Qualitative => row.qualitative = value,
            }
        }
        out.push(row);
    }
    Ok(out)
}

pub fn parse_upload(bytes: Vec<u8>, format: SheetFormat) -> Result<Vec<ImportRow>, SheetError> {
    let grid = read_grid(bytes, format)?;
    rows_from_grid(&grid)
}

/// Blank workbook with the expected headers and one example row.
pub fn build_template() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("activities")?;
    worksheet.set_right_to_left(true);

    for (col, header) in TEMPLATE_HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
        worksheet.set_column_width(col as u16, 18)?;
    }

    let example = [
        "1",
        "علی رضایی",
        "",
        "هفتم-الف",
        "هفتم",
        "ریاضی",
        "آزمون میان‌ترم",
        "آزمون فصل اول",
        "1404/01/07",
        "18",
        "",
    ];
    for (col, value) in example.iter().enumerate() {
        worksheet.write_string(1, col as u16, *value)?;
    }

    workbook.save_to_buffer()
}
