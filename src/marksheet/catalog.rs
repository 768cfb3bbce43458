use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRow {
    pub label: &'static str,
    pub max_marks: u32,
}

impl ComponentRow {
    const fn new(label: &'static str, max_marks: u32) -> Self {
        Self { label, max_marks }
    }

    /// Rows whose submission is tracked in the Submission Status column.
    pub fn counts_toward_submission_tracking(&self) -> bool {
        self.label.starts_with("Assignment") || self.label == "Term Paper"
    }
}

/// Grading components, in sheet order. The first `PRE_MIDTERM_COUNT` rows
/// feed the pre-midterm subtotal; the rest are added on top of it.
pub const COMPONENTS: [ComponentRow; 12] = [
    ComponentRow::new("Assignment 1", 5),
    ComponentRow::new("Assignment 2", 5),
    ComponentRow::new("Assignment 3", 5),
    ComponentRow::new("Assignment 4", 5),
    ComponentRow::new("Quiz 1", 5),
    ComponentRow::new("Quiz 2", 5),
    ComponentRow::new("Quiz 3", 5),
    ComponentRow::new("Quiz 4", 5),
    ComponentRow::new("Term Paper", 10),
    ComponentRow::new("CP Marks/Bonus", 5),
    ComponentRow::new("Midterms", 20),
    ComponentRow::new("Finals", 25),
];

pub const PRE_MIDTERM_COUNT: usize = 10;
pub const PRE_MIDTERM_MAX: u32 = 55;
pub const FINAL_MAX: u32 = 100;

pub const DEFAULT_TOTAL_CLASSES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    pub letter: &'static str,
    /// Inclusive lower bound on the final total. The last band has none.
    pub min_total: Option<f64>,
    /// Background highlight, `0xRRGGBB`.
    pub fill: u32,
}

pub const GRADE_BANDS: [GradeBand; 5] = [
    GradeBand { letter: "A", min_total: Some(90.0), fill: 0x90EE90 },
    GradeBand { letter: "B", min_total: Some(80.0), fill: 0xADD8E6 },
    GradeBand { letter: "C", min_total: Some(70.0), fill: 0xFFFFE0 },
    GradeBand { letter: "D", min_total: Some(60.0), fill: 0xFFA07A },
    GradeBand { letter: "F", min_total: None, fill: 0xFF4040 },
];

pub fn letter_grade(final_total: f64) -> &'static str {
    GRADE_BANDS
        .iter()
        .find(|b| b.min_total.map(|min| final_total >= min).unwrap_or(true))
        .map(|b| b.letter)
        .unwrap_or("F")
}

/// Nested `IF` over `total_cell` that mirrors `letter_grade`.
pub fn grade_formula(total_cell: &str) -> String {
    let mut out = String::from("=");
    let mut open = 0usize;
    for band in GRADE_BANDS.iter() {
        match band.min_total {
            Some(min) => {
                out.push_str(&format!("IF({}>={},\"{}\",", total_cell, min, band.letter));
                open += 1;
            }
            None => out.push_str(&format!("\"{}\"", band.letter)),
        }
    }
    out.push_str(&")".repeat(open));
    out
}
