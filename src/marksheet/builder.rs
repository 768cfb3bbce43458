use super::activity::ActivityLog;
use super::catalog::{
    grade_formula, letter_grade, COMPONENTS, DEFAULT_TOTAL_CLASSES, FINAL_MAX, GRADE_BANDS,
    PRE_MIDTERM_COUNT, PRE_MIDTERM_MAX,
};
use super::error::MarksheetError;
use super::layout::*;
use super::sanitize::marksheet_file_name;
use chrono::NaiveDateTime;
use serde::Deserialize;

pub const PLACEHOLDER_NAME: &str = "[Enter Name]";
pub const PLACEHOLDER_ID: &str = "[Enter ID]";
pub const PLACEHOLDER_SEMESTER: &str = "[Enter Semester]";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MAX_SHEET_NAME_LEN: usize = 31;
const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

// The final total sums everything from the first post-midterm component down
// to the subtotal, so the subtotal row must follow the last component.
const _: () = assert!(ROW_PRE_MID_TOTAL == ROW_FIRST_COMPONENT + COMPONENTS.len() as u32);
const _: () = assert!(ROW_FINAL_TOTAL == ROW_PRE_MID_TOTAL + 1);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarksheetRequest {
    pub subjects: Vec<String>,
    pub student_name: Option<String>,
    pub student_id: Option<String>,
    pub semester: Option<String>,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl MarksheetRequest {
    pub fn new<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subjects: subjects.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn with_student(
        mut self,
        name: impl Into<String>,
        id: impl Into<String>,
        semester: impl Into<String>,
    ) -> Self {
        self.student_name = Some(name.into());
        self.student_id = Some(id.into());
        self.semester = Some(semester.into());
        self
    }

    /// Name and semester are needed to derive the output file name.
    pub fn require_identity(&self) -> Result<(&str, &str), MarksheetError> {
        match (present(&self.student_name), present(&self.semester)) {
            (Some(name), Some(semester)) => Ok((name, semester)),
            _ => Err(MarksheetError::Validation(
                "student name and semester are required for file naming".to_string(),
            )),
        }
    }

    pub fn file_name(&self) -> Result<String, MarksheetError> {
        let (name, semester) = self.require_identity()?;
        Ok(marksheet_file_name(name, semester))
    }
}

fn check_sheet_name(name: &str) -> Result<(), MarksheetError> {
    if name.trim().is_empty() {
        return Err(MarksheetError::Build("sheet name cannot be blank".to_string()));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(MarksheetError::Build(format!(
            "sheet name '{}' is longer than {} characters",
            name, MAX_SHEET_NAME_LEN
        )));
    }
    if let Some(c) = name.chars().find(|c| SHEET_NAME_FORBIDDEN.contains(c)) {
        return Err(MarksheetError::Build(format!(
            "sheet name '{}' contains invalid character '{}'",
            name, c
        )));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(MarksheetError::Build(format!(
            "sheet name '{}' cannot start or end with an apostrophe",
            name
        )));
    }
    if name.eq_ignore_ascii_case("History") {
        return Err(MarksheetError::Build(
            "sheet name 'History' is reserved".to_string(),
        ));
    }
    Ok(())
}

/// Sheet names compare case-insensitively; repeats get `1`, `2`, ... appended,
/// shortening the base so the result still fits a sheet tab.
fn unique_sheet_name(subject: &str, taken: &[String]) -> Result<String, MarksheetError> {
    check_sheet_name(subject)?;
    let clashes = |candidate: &str| {
        let lower = candidate.to_lowercase();
        taken.iter().any(|t| t.to_lowercase() == lower)
    };
    if !clashes(subject) {
        return Ok(subject.to_string());
    }
    let mut n = 1usize;
    loop {
        let suffix = n.to_string();
        let base: String = subject
            .chars()
            .take(MAX_SHEET_NAME_LEN - suffix.len())
            .collect();
        let candidate = format!("{}{}", base.trim_end_matches('\''), suffix);
        if !clashes(&candidate) {
            check_sheet_name(&candidate)?;
            return Ok(candidate);
        }
        n += 1;
    }
}

pub struct TemplateBuilder<'a> {
    log: &'a dyn ActivityLog,
    built_at: Option<NaiveDateTime>,
}

impl<'a> TemplateBuilder<'a> {
    pub fn new(log: &'a dyn ActivityLog) -> Self {
        Self {
            log,
            built_at: None,
        }
    }

    /// Pins the "Last Modified" stamp instead of reading the clock.
    #[cfg(test)]
    pub fn built_at(mut self, at: NaiveDateTime) -> Self {
        self.built_at = Some(at);
        self
    }

    pub fn build(&self, request: &MarksheetRequest) -> Result<MarksheetWorkbook, MarksheetError> {
        if request.subjects.is_empty() {
            self.log.error("No courses provided");
            return Err(MarksheetError::Validation("no subjects".to_string()));
        }

        let stamp = self
            .built_at
            .unwrap_or_else(|| chrono::Local::now().naive_local())
            .format(TIMESTAMP_FORMAT)
            .to_string();

        let mut names: Vec<String> = Vec::with_capacity(request.subjects.len());
        let mut sheets = Vec::with_capacity(request.subjects.len());
        for subject in &request.subjects {
            let name = match unique_sheet_name(subject, &names) {
                Ok(v) => v,
                Err(e) => {
                    self.log.error(&format!("Error creating marksheet: {}", e));
                    return Err(e);
                }
            };
            tracing::debug!(subject = %subject, sheet = %name, "building sheet");
            sheets.push(build_sheet(&name, subject, request, &stamp));
            names.push(name);
        }

        self.log.info(&format!(
            "Built marksheet with {} sheet(s): {}",
            sheets.len(),
            names.join(", ")
        ));
        Ok(MarksheetWorkbook {
            built_at: stamp,
            sheets,
        })
    }
}

fn build_sheet(name: &str, subject: &str, request: &MarksheetRequest, stamp: &str) -> SheetDocument {
    let mut sheet = SheetDocument::new(name, subject);

    sheet.put(
        ROW_TITLE,
        0,
        CellValue::text(format!("Marksheet for {}", subject)),
        CellStyle::Title,
    );
    let identity = [
        (
            ROW_STUDENT_NAME,
            "Student Name:",
            present(&request.student_name).unwrap_or(PLACEHOLDER_NAME),
        ),
        (
            ROW_STUDENT_ID,
            "Student ID:",
            present(&request.student_id).unwrap_or(PLACEHOLDER_ID),
        ),
        (
            ROW_SEMESTER,
            "Semester:",
            present(&request.semester).unwrap_or(PLACEHOLDER_SEMESTER),
        ),
        (ROW_LAST_MODIFIED, "Last Modified:", stamp),
    ];
    for (row, label, value) in identity {
        sheet.put(row, 0, CellValue::text(label), CellStyle::Plain);
        sheet.put(row, 1, CellValue::text(value), CellStyle::Plain);
    }

    for (col, header) in COLUMN_HEADERS.iter().enumerate() {
        sheet.put(
            ROW_COLUMN_HEADERS,
            col as u16,
            CellValue::text(*header),
            CellStyle::ColumnHeader,
        );
    }

    for (i, component) in COMPONENTS.iter().enumerate() {
        let row = ROW_FIRST_COMPONENT + i as u32;
        sheet.put(row, COL_COMPONENT, CellValue::text(component.label), CellStyle::Plain);
        sheet.put(row, COL_MAX, CellValue::number(component.max_marks), CellStyle::Plain);
        sheet.validations.push(ValidationRule {
            cell: (row, COL_OBTAINED),
            constraint: Constraint::DecimalBetween {
                min: 0.0,
                max: component.max_marks as f64,
            },
        });
        if component.counts_toward_submission_tracking() {
            sheet.put(row, COL_STATUS, CellValue::text("Yes"), CellStyle::Plain);
            sheet.validations.push(ValidationRule {
                cell: (row, COL_STATUS),
                constraint: Constraint::List {
                    choices: vec!["Yes".to_string(), "No".to_string()],
                    allow_blank: true,
                },
            });
        }
    }

    let first_post_mid = ROW_FIRST_COMPONENT + PRE_MIDTERM_COUNT as u32;
    let pre_mid_sum = format!(
        "=SUM({}:{})",
        a1(ROW_FIRST_COMPONENT, COL_OBTAINED),
        a1(first_post_mid - 1, COL_OBTAINED)
    );
    let final_sum = format!(
        "=SUM({}:{})",
        a1(first_post_mid, COL_OBTAINED),
        a1(ROW_PRE_MID_TOTAL, COL_OBTAINED)
    );
    sheet.put(ROW_PRE_MID_TOTAL, COL_COMPONENT, CellValue::text("Pre-Mids Total"), CellStyle::Plain);
    sheet.put(ROW_PRE_MID_TOTAL, COL_OBTAINED, CellValue::formula(pre_mid_sum, "0"), CellStyle::Plain);
    sheet.put(ROW_PRE_MID_TOTAL, COL_MAX, CellValue::number(PRE_MIDTERM_MAX), CellStyle::Plain);
    sheet.put(ROW_FINAL_TOTAL, COL_COMPONENT, CellValue::text("Final Total"), CellStyle::Plain);
    sheet.put(ROW_FINAL_TOTAL, COL_OBTAINED, CellValue::formula(final_sum, "0"), CellStyle::Plain);
    sheet.put(ROW_FINAL_TOTAL, COL_MAX, CellValue::number(FINAL_MAX), CellStyle::Plain);

    let total_classes = a1(ROW_TOTAL_CLASSES, 1);
    let attended = a1(ROW_CLASSES_ATTENDED, 1);
    sheet.put(ROW_ATTENDANCE_TITLE, 0, CellValue::text("Attendance Tracking"), CellStyle::Plain);
    sheet.put(ROW_TOTAL_CLASSES, 0, CellValue::text("Total Classes"), CellStyle::Plain);
    sheet.put(ROW_TOTAL_CLASSES, 1, CellValue::number(DEFAULT_TOTAL_CLASSES), CellStyle::Plain);
    sheet.put(ROW_CLASSES_ATTENDED, 0, CellValue::text("Classes Attended"), CellStyle::Plain);
    sheet.put(ROW_CLASSES_ATTENDED, 1, CellValue::Blank, CellStyle::Plain);
    sheet.put(ROW_ATTENDANCE_PCT, 0, CellValue::text("Attendance %"), CellStyle::Plain);
    sheet.put(
        ROW_ATTENDANCE_PCT,
        1,
        CellValue::formula(
            format!("=IF({a}=\"\",0,{a}/{t})", a = attended, t = total_classes),
            "0",
        ),
        CellStyle::BorderedPercent,
    );

    let grade_cell = (ROW_GRADE, COL_OBTAINED);
    sheet.put(ROW_GRADE, COL_COMPONENT, CellValue::text("Grade"), CellStyle::Plain);
    sheet.put(
        grade_cell.0,
        grade_cell.1,
        CellValue::formula(
            grade_formula(&a1(ROW_FINAL_TOTAL, COL_OBTAINED)),
            letter_grade(0.0),
        ),
        CellStyle::Bordered,
    );
    for band in GRADE_BANDS.iter() {
        sheet.highlights.push(HighlightRule {
            cell: grade_cell,
            equals: band.letter.to_string(),
            fill: band.fill,
        });
    }

    for row in ROW_COLUMN_HEADERS..=ROW_FINAL_TOTAL {
        for col in COL_COMPONENT..=COL_REMARKS {
            sheet.restyle(row, col, CellStyle::Bordered);
        }
    }
    for row in ROW_TOTAL_CLASSES..=ROW_ATTENDANCE_PCT {
        for col in 0..=1 {
            sheet.restyle(row, col, CellStyle::Bordered);
        }
    }

    sheet
}

#[cfg(test)]
mod tests {
    use super::super::activity::{Level, MemoryLog};
    use super::*;
    use chrono::NaiveDate;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 2)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .expect("valid date")
    }

    fn text_at(sheet: &SheetDocument, row: u32, col: u16) -> Option<String> {
        match sheet.value(row, col) {
            Some(CellValue::Text { text }) => Some(text.clone()),
            _ => None,
        }
    }

    #[test]
    fn empty_subject_list_is_a_validation_error() {
        let log = MemoryLog::new();
        let res = TemplateBuilder::new(&log).build(&MarksheetRequest::default());
        match res {
            Err(MarksheetError::Validation(msg)) => assert_eq!(msg, "no subjects"),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(
            log.entries(),
            vec![(Level::Error, "No courses provided".to_string())]
        );
    }

    #[test]
    fn absent_identity_uses_placeholders() {
        let log = MemoryLog::new();
        let wb = TemplateBuilder::new(&log)
            .built_at(fixed_time())
            .build(&MarksheetRequest::new(["Physics"]))
            .expect("build");
        let s = &wb.sheets[0];
        assert_eq!(text_at(s, ROW_STUDENT_NAME, 1).as_deref(), Some("[Enter Name]"));
        assert_eq!(text_at(s, ROW_STUDENT_ID, 1).as_deref(), Some("[Enter ID]"));
        assert_eq!(text_at(s, ROW_SEMESTER, 1).as_deref(), Some("[Enter Semester]"));
        assert_eq!(text_at(s, ROW_LAST_MODIFIED, 1).as_deref(), Some("2024-09-02 08:30:00"));
    }

    #[test]
    fn blank_identity_fields_count_as_absent() {
        let log = MemoryLog::new();
        let req = MarksheetRequest::new(["Physics"]).with_student("  ", "", "Fall 2024");
        let wb = TemplateBuilder::new(&log).build(&req).expect("build");
        let s = &wb.sheets[0];
        assert_eq!(text_at(s, ROW_STUDENT_NAME, 1).as_deref(), Some("[Enter Name]"));
        assert_eq!(text_at(s, ROW_SEMESTER, 1).as_deref(), Some("Fall 2024"));
        assert!(req.require_identity().is_err());
    }

    #[test]
    fn one_sheet_per_subject_with_identical_layout() {
        let log = MemoryLog::new();
        let subjects = ["Cal-1", "Philosophy", "Intro to Macroeconomics"];
        let wb = TemplateBuilder::new(&log)
            .built_at(fixed_time())
            .build(&MarksheetRequest::new(subjects))
            .expect("build");
        assert_eq!(wb.sheet_names(), subjects.to_vec());

        let first = &wb.sheets[0];
        for sheet in &wb.sheets[1..] {
            assert_eq!(sheet.cells.len(), first.cells.len());
            assert_eq!(sheet.last_row(), first.last_row());
            let keys_a: Vec<_> = first.cells.keys().collect();
            let keys_b: Vec<_> = sheet.cells.keys().collect();
            assert_eq!(keys_a, keys_b);
            assert_eq!(sheet.validations, first.validations);
            assert_eq!(sheet.highlights, first.highlights);
        }
        assert_eq!(
            text_at(&wb.sheets[2], ROW_TITLE, 0).as_deref(),
            Some("Marksheet for Intro to Macroeconomics")
        );
    }

    #[test]
    fn component_rows_and_status_defaults() {
        let log = MemoryLog::new();
        let wb = TemplateBuilder::new(&log)
            .build(&MarksheetRequest::new(["Cal-1"]))
            .expect("build");
        let s = &wb.sheets[0];
        for (i, c) in COMPONENTS.iter().enumerate() {
            let row = ROW_FIRST_COMPONENT + i as u32;
            assert_eq!(text_at(s, row, COL_COMPONENT).as_deref(), Some(c.label));
            assert_eq!(
                s.value(row, COL_MAX),
                Some(&CellValue::number(c.max_marks))
            );
            assert_eq!(s.value(row, COL_OBTAINED), Some(&CellValue::Blank));
            let status = text_at(s, row, COL_STATUS);
            if c.counts_toward_submission_tracking() {
                assert_eq!(status.as_deref(), Some("Yes"));
            } else {
                assert_eq!(status, None);
            }
        }
    }

    #[test]
    fn marks_validation_matches_declared_max() {
        let log = MemoryLog::new();
        let wb = TemplateBuilder::new(&log)
            .build(&MarksheetRequest::new(["Cal-1"]))
            .expect("build");
        let s = &wb.sheets[0];

        let ranges: Vec<&ValidationRule> = s
            .validations
            .iter()
            .filter(|v| matches!(v.constraint, Constraint::DecimalBetween { .. }))
            .collect();
        assert_eq!(ranges.len(), COMPONENTS.len());
        for rule in ranges {
            let (row, col) = rule.cell;
            assert_eq!(col, COL_OBTAINED);
            let Some(CellValue::Number { number }) = s.value(row, COL_MAX) else {
                panic!("max marks missing on row {}", row);
            };
            assert_eq!(
                rule.constraint,
                Constraint::DecimalBetween { min: 0.0, max: *number }
            );
        }

        let status_rows: Vec<u32> = s
            .validations
            .iter()
            .filter(|v| matches!(v.constraint, Constraint::List { .. }))
            .map(|v| v.cell.0)
            .collect();
        // Assignment 1-4 and Term Paper.
        assert_eq!(status_rows, vec![7, 8, 9, 10, 15]);
    }

    #[test]
    fn totals_attendance_and_grade_are_formulas() {
        let log = MemoryLog::new();
        let wb = TemplateBuilder::new(&log)
            .build(&MarksheetRequest::new(["Calculus"]))
            .expect("build");
        let s = wb.sheet("Calculus").expect("sheet");

        assert_eq!(
            s.value(ROW_PRE_MID_TOTAL, COL_OBTAINED),
            Some(&CellValue::formula("=SUM(B8:B17)", "0"))
        );
        assert_eq!(s.value(ROW_PRE_MID_TOTAL, COL_MAX), Some(&CellValue::number(55)));
        assert_eq!(
            s.value(ROW_FINAL_TOTAL, COL_OBTAINED),
            Some(&CellValue::formula("=SUM(B18:B20)", "0"))
        );
        assert_eq!(s.value(ROW_FINAL_TOTAL, COL_MAX), Some(&CellValue::number(100)));
        assert_eq!(s.value(ROW_TOTAL_CLASSES, 1), Some(&CellValue::number(30)));
        assert_eq!(
            s.value(ROW_ATTENDANCE_PCT, 1),
            Some(&CellValue::formula("=IF(B25=\"\",0,B25/B24)", "0"))
        );
        assert_eq!(
            s.cell(ROW_ATTENDANCE_PCT, 1).map(|c| c.style),
            Some(CellStyle::BorderedPercent)
        );
        assert_eq!(
            s.value(ROW_GRADE, COL_OBTAINED),
            Some(&CellValue::formula(
                "=IF(B21>=90,\"A\",IF(B21>=80,\"B\",IF(B21>=70,\"C\",IF(B21>=60,\"D\",\"F\"))))",
                "F"
            ))
        );

        let letters: Vec<&str> = s.highlights.iter().map(|h| h.equals.as_str()).collect();
        assert_eq!(letters, vec!["A", "B", "C", "D", "F"]);
        assert!(s.highlights.iter().all(|h| h.cell == (ROW_GRADE, COL_OBTAINED)));
    }

    #[test]
    fn borders_cover_table_attendance_and_grade() {
        let log = MemoryLog::new();
        let wb = TemplateBuilder::new(&log)
            .build(&MarksheetRequest::new(["Cal-1"]))
            .expect("build");
        let s = &wb.sheets[0];
        for row in ROW_COLUMN_HEADERS..=ROW_FINAL_TOTAL {
            for col in 0..=4 {
                let style = s.cell(row, col).map(|c| c.style);
                assert!(
                    matches!(style, Some(CellStyle::Bordered | CellStyle::ColumnHeader)),
                    "{} is {:?}",
                    a1(row, col),
                    style
                );
            }
        }
        assert_eq!(s.cell(ROW_CLASSES_ATTENDED, 1).map(|c| c.style), Some(CellStyle::Bordered));
        assert_eq!(s.cell(ROW_GRADE, 1).map(|c| c.style), Some(CellStyle::Bordered));
        assert_eq!(s.cell(ROW_GRADE, 0).map(|c| c.style), Some(CellStyle::Plain));
        assert_eq!(s.cell(ROW_ATTENDANCE_TITLE, 0).map(|c| c.style), Some(CellStyle::Plain));
        assert_eq!(s.freeze_at, (7, 0));
        assert_eq!(s.column_widths, vec![20.0, 15.0, 10.0, 15.0, 25.0]);
    }

    #[test]
    fn invalid_sheet_names_fail_the_build() {
        let log = MemoryLog::new();
        for bad in [
            "Math/Stats",
            "   ",
            "History",
            "'Quoted",
            "A subject title that is far too long for a sheet tab",
        ] {
            let res = TemplateBuilder::new(&log).build(&MarksheetRequest::new(["Cal-1", bad]));
            assert!(
                matches!(res, Err(MarksheetError::Build(_))),
                "{:?} -> {:?}",
                bad,
                res.map(|w| w.sheet_names().len())
            );
        }
        assert!(log
            .entries()
            .iter()
            .all(|(level, msg)| *level == Level::Error && msg.starts_with("Error creating marksheet")));
    }

    #[test]
    fn repeated_subjects_get_suffixed_sheet_names() {
        let log = MemoryLog::new();
        let wb = TemplateBuilder::new(&log)
            .build(&MarksheetRequest::new(["Calculus", "calculus", "Calculus"]))
            .expect("build");
        assert_eq!(wb.sheet_names(), vec!["Calculus", "calculus1", "Calculus2"]);
        assert_eq!(
            text_at(&wb.sheets[1], ROW_TITLE, 0).as_deref(),
            Some("Marksheet for calculus")
        );
    }

    #[test]
    fn repeated_full_length_subject_is_shortened_before_suffixing() {
        let log = MemoryLog::new();
        let subject = "Advanced Quantitative Methods I";
        assert_eq!(subject.chars().count(), 31);
        let wb = TemplateBuilder::new(&log)
            .build(&MarksheetRequest::new([subject, subject, subject]))
            .expect("build");
        assert_eq!(
            wb.sheet_names(),
            vec![
                "Advanced Quantitative Methods I",
                "Advanced Quantitative Methods 1",
                "Advanced Quantitative Methods 2",
            ]
        );
        assert!(wb.sheet_names().iter().all(|n| n.chars().count() <= 31));
        assert_eq!(
            text_at(&wb.sheets[2], ROW_TITLE, 0).as_deref(),
            Some("Marksheet for Advanced Quantitative Methods I")
        );
    }

    #[test]
    fn request_file_name_uses_sanitized_identity() {
        let req = MarksheetRequest::new(["Calculus"]).with_student("Jane Doe", "", "Fall 2024");
        assert_eq!(
            req.file_name().expect("file name"),
            "marksheet_Jane_Doe_Fall_2024.xlsx"
        );
        let missing = MarksheetRequest::new(["Calculus"]);
        assert!(matches!(
            missing.file_name(),
            Err(MarksheetError::Validation(_))
        ));
    }

    #[test]
    fn request_deserializes_from_camel_case() {
        let req: MarksheetRequest = serde_json::from_value(serde_json::json!({
            "subjects": ["IST"],
            "studentName": "Jane Doe",
            "semester": "Fall 2024"
        }))
        .expect("parse request");
        assert_eq!(req.subjects, vec!["IST".to_string()]);
        assert_eq!(req.student_name.as_deref(), Some("Jane Doe"));
        assert_eq!(req.student_id, None);
    }
}
