use super::error::MarksheetError;
use super::layout::{CellStyle, CellValue, Constraint, MarksheetWorkbook, SheetDocument};
use rust_xlsxwriter::{
    Color, ConditionalFormatCell, ConditionalFormatCellRule, DataValidation, DataValidationRule,
    Format, FormatAlign, FormatBorder, FormatPattern, Formula, Workbook, Worksheet,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const HEADER_FILL: u32 = 0xD3D3D3;
const TITLE_FONT_SIZE: u32 = 14;
const PERCENT_FORMAT: &str = "0.00%";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMarksheet {
    pub path: PathBuf,
    pub file_name: String,
    pub sheet_count: usize,
    pub bytes: usize,
    pub sha256: String,
}

struct Styles {
    title: Format,
    column_header: Format,
    bordered: Format,
    bordered_percent: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(TITLE_FONT_SIZE),
            column_header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_pattern(FormatPattern::Solid)
                .set_border(FormatBorder::Thin),
            bordered: Format::new().set_border(FormatBorder::Thin),
            bordered_percent: Format::new()
                .set_border(FormatBorder::Thin)
                .set_num_format(PERCENT_FORMAT),
        }
    }

    fn get(&self, style: CellStyle) -> Option<&Format> {
        match style {
            CellStyle::Plain => None,
            CellStyle::Title => Some(&self.title),
            CellStyle::ColumnHeader => Some(&self.column_header),
            CellStyle::Bordered => Some(&self.bordered),
            CellStyle::BorderedPercent => Some(&self.bordered_percent),
        }
    }
}

fn render_sheet(doc: &SheetDocument, styles: &Styles) -> Result<Worksheet, MarksheetError> {
    let mut ws = Worksheet::new();
    ws.set_name(&doc.name)?;

    for (&(row, col), cell) in &doc.cells {
        let format = styles.get(cell.style);
        match (&cell.value, format) {
            (CellValue::Blank, Some(f)) => {
                ws.write_blank(row, col, f)?;
            }
            (CellValue::Blank, None) => {}
            (CellValue::Text { text }, Some(f)) => {
                ws.write_string_with_format(row, col, text, f)?;
            }
            (CellValue::Text { text }, None) => {
                ws.write_string(row, col, text)?;
            }
            (CellValue::Number { number }, Some(f)) => {
                ws.write_number_with_format(row, col, *number, f)?;
            }
            (CellValue::Number { number }, None) => {
                ws.write_number(row, col, *number)?;
            }
            (CellValue::Formula { expression, cached }, f) => {
                let formula = Formula::new(expression.as_str()).set_result(cached.as_str());
                match f {
                    Some(f) => ws.write_formula_with_format(row, col, formula, f)?,
                    None => ws.write_formula(row, col, formula)?,
                };
            }
        }
    }

    for rule in &doc.validations {
        let (row, col) = rule.cell;
        let validation = match &rule.constraint {
            Constraint::DecimalBetween { min, max } => {
                DataValidation::new().allow_decimal_number(DataValidationRule::Between(*min, *max))
            }
            Constraint::List {
                choices,
                allow_blank,
            } => DataValidation::new()
                .allow_list_strings(choices.as_slice())?
                .ignore_blank(*allow_blank),
        };
        ws.add_data_validation(row, col, row, col, &validation)?;
    }

    for rule in &doc.highlights {
        let (row, col) = rule.cell;
        let fill = Format::new()
            .set_background_color(Color::RGB(rule.fill))
            .set_pattern(FormatPattern::Solid);
        let literal = format!("\"{}\"", rule.equals);
        let cf = ConditionalFormatCell::new()
            .set_rule(ConditionalFormatCellRule::EqualTo(literal.as_str()))
            .set_format(fill);
        ws.add_conditional_format(row, col, row, col, &cf)?;
    }

    for (col, width) in doc.column_widths.iter().enumerate() {
        ws.set_column_width(col as u16, *width)?;
    }
    let (freeze_row, freeze_col) = doc.freeze_at;
    ws.set_freeze_panes(freeze_row, freeze_col)?;

    Ok(ws)
}

/// Renders the model into an xlsx package held in memory.
pub fn render(workbook: &MarksheetWorkbook) -> Result<Vec<u8>, MarksheetError> {
    let styles = Styles::new();
    let mut xlsx = Workbook::new();
    for doc in &workbook.sheets {
        let ws = render_sheet(doc, &styles)?;
        xlsx.push_worksheet(ws);
    }
    Ok(xlsx.save_to_buffer()?)
}

/// Renders the workbook and writes it to `path`.
///
/// Rendering happens fully in memory first, so a build failure never
/// leaves a file behind.
pub fn save(workbook: &MarksheetWorkbook, path: &Path) -> Result<SavedMarksheet, MarksheetError> {
    let buf = render(workbook)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| MarksheetError::Persistence {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, &buf).map_err(|source| MarksheetError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;

    let sha256 = format!("{:x}", Sha256::digest(&buf));
    tracing::debug!(path = %path.display(), bytes = buf.len(), "marksheet written");

    Ok(SavedMarksheet {
        path: path.to_path_buf(),
        file_name: path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
        sheet_count: workbook.sheets.len(),
        bytes: buf.len(),
        sha256,
    })
}
