//! Utility functions and helpers

use chrono::NaiveDate;

/// Escape text for safe inclusion in HTML content and attribute values
pub fn escape_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Pay period as shown in the list, e.g. `01/01/2024 - 31/01/2024`
pub fn format_period(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} - {}", start.format("%d/%m/%Y"), end.format("%d/%m/%Y"))
}

/// File name for a rendered payslip; keeps ASCII alphanumerics, dashes and dots
pub fn document_filename(name: &str, extension: &str) -> String {
    let mut stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    stem = stem.trim_matches('_').to_string();
    if stem.is_empty() {
        stem = "document".to_string();
    }
    format!("{}.{}", stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b onclick="x">Tom & 'Jerry'</b>"#),
            "&lt;b onclick=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_format_period() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(format_period(start, end), "01/01/2024 - 31/01/2024");
    }

    #[test]
    fn test_document_filename() {
        assert_eq!(
            document_filename("Salary Slip of Jane / January", "pdf"),
            "Salary_Slip_of_Jane___January.pdf"
        );
        assert_eq!(document_filename("  ", "pdf"), "document.pdf");
        assert_eq!(document_filename("SLIP-0042", "pdf"), "SLIP-0042.pdf");
    }
}
