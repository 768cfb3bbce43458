#[path = "../src/marksheet/mod.rs"]
#[allow(dead_code)]
mod marksheet;

use marksheet::activity::MemoryLog;
use marksheet::catalog::letter_grade;
use marksheet::sanitize::{marksheet_file_name, sanitize};
use marksheet::{MarksheetRequest, TemplateBuilder};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn read_entry(path: &PathBuf, name: &str) -> String {
    let f = File::open(path).expect("open xlsx");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut out = String::new();
    archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing entry {}", name))
        .read_to_string(&mut out)
        .expect("read entry");
    out
}

#[test]
fn calculus_marksheet_end_to_end() {
    let out_dir = temp_dir("marksheet-e2e");
    let request =
        MarksheetRequest::new(["Calculus"]).with_student("Jane Doe", "S-1001", "Fall 2024");

    let file_name = request.file_name().expect("file name");
    assert_eq!(file_name, "marksheet_Jane_Doe_Fall_2024.xlsx");
    assert_eq!(
        marksheet_file_name(&sanitize("Jane Doe"), &sanitize("Fall 2024")),
        file_name
    );

    let log = MemoryLog::new();
    let workbook = TemplateBuilder::new(&log).build(&request).expect("build");
    let path = out_dir.join(&file_name);
    let saved = marksheet::save(&workbook, &path).expect("save");
    assert_eq!(saved.file_name, file_name);
    assert_eq!(saved.sheet_count, 1);
    assert_eq!(saved.sha256.len(), 64);
    assert_eq!(
        std::fs::metadata(&path).expect("stat").len() as usize,
        saved.bytes
    );

    let wb_xml = read_entry(&path, "xl/workbook.xml");
    assert!(wb_xml.contains("name=\"Calculus\""), "{}", wb_xml);

    let sheet = read_entry(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("SUM(B8:B17)"));
    assert!(sheet.contains("SUM(B18:B20)"));
    // Grade formula over the final total, cached as F for an empty sheet.
    assert!(sheet.contains("IF(B21"));
    assert!(sheet.contains("<v>F</v>"), "{}", sheet);
    assert_eq!(letter_grade(0.0), "F");

    assert_eq!(sheet.matches("type=\"decimal\"").count(), 12);
    assert_eq!(sheet.matches("type=\"list\"").count(), 5);
    assert_eq!(sheet.matches("<cfRule").count(), 5);
    assert_eq!(sheet.matches("type=\"cellIs\"").count(), 5, "{}", sheet);
    assert_eq!(sheet.matches("operator=\"equal\"").count(), 5);
    for letter in ["A", "B", "C", "D", "F"] {
        assert!(
            sheet.contains(&format!("<formula>\"{}\"</formula>", letter))
                || sheet.contains(&format!("<formula>&quot;{}&quot;</formula>", letter)),
            "missing highlight for {}",
            letter
        );
    }
    assert!(sheet.contains("topLeftCell=\"A8\""));
    assert!(sheet.contains("state=\"frozen\""));

    // Widths 20/15/10/15/25 plus the writer's cell padding.
    for (col, width) in [(1, "20.7"), (2, "15.7"), (3, "10.7"), (4, "15.7"), (5, "25.7")] {
        assert!(
            sheet.contains(&format!("min=\"{c}\" max=\"{c}\" width=\"{w}", c = col, w = width)),
            "column {} width: {}",
            col,
            sheet
        );
    }

    let styles = read_entry(&path, "xl/styles.xml");
    // 0.00% is a built-in number format (id 10), so it may not be spelled out.
    assert!(
        styles.contains("formatCode=\"0.00%\"") || styles.contains("numFmtId=\"10\""),
        "{}",
        styles
    );
    assert!(styles.contains("FFD3D3D3"), "header fill: {}", styles);
    assert!(styles.contains("patternType=\"solid\""));

    let strings = read_entry(&path, "xl/sharedStrings.xml");
    for expected in [
        "Marksheet for Calculus",
        "Jane Doe",
        "S-1001",
        "Fall 2024",
        "Submission Status",
        "Pre-Mids Total",
        "Attendance Tracking",
    ] {
        assert!(strings.contains(expected), "missing {}", expected);
    }
    assert!(!strings.contains("[Enter Name]"));

    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn every_sheet_gets_the_same_rules() {
    let out_dir = temp_dir("marksheet-multi");
    let subjects = ["Statistical Inferences", "Cal-1", "IST"];
    let log = MemoryLog::new();
    let workbook = TemplateBuilder::new(&log)
        .build(&MarksheetRequest::new(subjects))
        .expect("build");
    let path = out_dir.join("marksheet_template_enhanced.xlsx");
    let saved = marksheet::save(&workbook, &path).expect("save");
    assert_eq!(saved.sheet_count, 3);

    let wb_xml = read_entry(&path, "xl/workbook.xml");
    for s in subjects {
        assert!(wb_xml.contains(&format!("name=\"{}\"", s)), "missing sheet {}", s);
    }
    for i in 1..=3 {
        let sheet = read_entry(&path, &format!("xl/worksheets/sheet{}.xml", i));
        assert_eq!(sheet.matches("type=\"decimal\"").count(), 12);
        assert_eq!(sheet.matches("<cfRule").count(), 5);
    }

    let strings = read_entry(&path, "xl/sharedStrings.xml");
    assert!(strings.contains("[Enter Name]"));
    assert!(strings.contains("[Enter ID]"));
    assert!(strings.contains("[Enter Semester]"));

    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn failed_build_leaves_no_file() {
    let out_dir = temp_dir("marksheet-nofile");
    let log = MemoryLog::new();
    let res = TemplateBuilder::new(&log).build(&MarksheetRequest::new(["Math/Stats"]));
    assert!(matches!(res, Err(marksheet::MarksheetError::Build(_))));
    assert_eq!(std::fs::read_dir(&out_dir).expect("read dir").count(), 0);
    let _ = std::fs::remove_dir_all(out_dir);
}
