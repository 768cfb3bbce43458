use serde::Serialize;
use std::collections::BTreeMap;

/// Zero-based (row, column), the convention of the xlsx writer.
pub type CellPos = (u32, u16);

pub const COL_COMPONENT: u16 = 0;
pub const COL_OBTAINED: u16 = 1;
pub const COL_MAX: u16 = 2;
pub const COL_STATUS: u16 = 3;
pub const COL_REMARKS: u16 = 4;

pub const ROW_TITLE: u32 = 0;
pub const ROW_STUDENT_NAME: u32 = 1;
pub const ROW_STUDENT_ID: u32 = 2;
pub const ROW_SEMESTER: u32 = 3;
pub const ROW_LAST_MODIFIED: u32 = 4;
pub const ROW_COLUMN_HEADERS: u32 = 6;
pub const ROW_FIRST_COMPONENT: u32 = 7;
pub const ROW_PRE_MID_TOTAL: u32 = 19;
pub const ROW_FINAL_TOTAL: u32 = 20;
pub const ROW_ATTENDANCE_TITLE: u32 = 22;
pub const ROW_TOTAL_CLASSES: u32 = 23;
pub const ROW_CLASSES_ATTENDED: u32 = 24;
pub const ROW_ATTENDANCE_PCT: u32 = 25;
pub const ROW_GRADE: u32 = 27;

pub const COLUMN_HEADERS: [&str; 5] = [
    "Component",
    "Marks Obtained",
    "Max Marks",
    "Submission Status",
    "Remarks",
];

pub const COLUMN_WIDTHS: [f64; 5] = [20.0, 15.0, 10.0, 15.0, 25.0];

/// Everything above the component rows stays visible.
pub const FREEZE_AT: CellPos = (ROW_FIRST_COMPONENT, 0);

/// `(0, 1)` -> `"B1"`.
pub fn a1(row: u32, col: u16) -> String {
    let mut letters = Vec::new();
    let mut n = col as u32 + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect::<String>() + &(row + 1).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CellStyle {
    Plain,
    Title,
    ColumnHeader,
    Bordered,
    BorderedPercent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CellValue {
    Blank,
    Text { text: String },
    Number { number: f64 },
    /// `expression` includes the leading `=`. `cached` is the value shown by
    /// readers that do not recalculate.
    Formula { expression: String, cached: String },
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text { text: s.into() }
    }

    pub fn number(n: impl Into<f64>) -> Self {
        CellValue::Number { number: n.into() }
    }

    pub fn formula(expression: impl Into<String>, cached: impl Into<String>) -> Self {
        CellValue::Formula {
            expression: expression.into(),
            cached: cached.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Constraint {
    DecimalBetween {
        min: f64,
        max: f64,
    },
    #[serde(rename_all = "camelCase")]
    List {
        choices: Vec<String>,
        allow_blank: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub cell: CellPos,
    pub constraint: Constraint,
}

/// Background fill applied while the cell equals `equals`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRule {
    pub cell: CellPos,
    pub equals: String,
    pub fill: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetDocument {
    pub name: String,
    pub subject: String,
    #[serde(serialize_with = "serialize_cells")]
    pub cells: BTreeMap<CellPos, Cell>,
    pub validations: Vec<ValidationRule>,
    pub highlights: Vec<HighlightRule>,
    pub column_widths: Vec<f64>,
    pub freeze_at: CellPos,
}

impl SheetDocument {
    pub fn new(name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            cells: BTreeMap::new(),
            validations: Vec::new(),
            highlights: Vec::new(),
            column_widths: COLUMN_WIDTHS.to_vec(),
            freeze_at: FREEZE_AT,
        }
    }

    pub fn put(&mut self, row: u32, col: u16, value: CellValue, style: CellStyle) {
        self.cells.insert((row, col), Cell { value, style });
    }

    /// Applies `style` to the cell, creating a styled blank when it is empty.
    pub fn restyle(&mut self, row: u32, col: u16, style: CellStyle) {
        self.cells
            .entry((row, col))
            .and_modify(|c| {
                if c.style == CellStyle::Plain {
                    c.style = style;
                }
            })
            .or_insert(Cell {
                value: CellValue::Blank,
                style,
            });
    }

    #[cfg(test)]
    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    #[cfg(test)]
    pub fn value(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cell(row, col).map(|c| &c.value)
    }

    /// Last row holding any content, zero-based.
    #[cfg(test)]
    pub fn last_row(&self) -> u32 {
        self.cells.keys().map(|(r, _)| *r).max().unwrap_or(0)
    }
}

fn serialize_cells<S>(cells: &BTreeMap<CellPos, Cell>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = s.serialize_map(Some(cells.len()))?;
    for ((row, col), cell) in cells {
        map.serialize_entry(&a1(*row, *col), cell)?;
    }
    map.end()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarksheetWorkbook {
    pub built_at: String,
    pub sheets: Vec<SheetDocument>,
}

impl MarksheetWorkbook {
    #[cfg(test)]
    pub fn sheet(&self, name: &str) -> Option<&SheetDocument> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
