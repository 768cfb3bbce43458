const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_LEN: usize = 50;
const FALLBACK: &str = "Unknown";

/// Makes `text` safe to embed in a file name.
///
/// Forbidden characters are dropped before trimming, and every remaining
/// whitespace character becomes `_`, so a second pass is a no-op.
pub fn sanitize(text: &str) -> String {
    let kept: String = text.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    let out: String = kept
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .take(MAX_LEN)
        .collect();
    if out.is_empty() {
        FALLBACK.to_string()
    } else {
        out
    }
}

pub fn marksheet_file_name(student_name: &str, semester: &str) -> String {
    format!(
        "marksheet_{}_{}.xlsx",
        sanitize(student_name),
        sanitize(semester)
    )
}
