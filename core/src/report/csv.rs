use super::ReportFormatter;
use crate::aggregator::ScanResult;
use crate::error::Result;

const HEADER: [&str; 10] = [
    "ID",
    "Title",
    "Severity",
    "Category",
    "Checker",
    "File",
    "Line",
    "Column",
    "Description",
    "Recommendation",
];

pub struct CsvFormatter;

/// Quote a field when it holds a comma, quote or line break.
pub fn field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

impl ReportFormatter for CsvFormatter {
    fn format(&self, result: &ScanResult) -> Result<Vec<u8>> {
        let mut out = HEADER.join(",");
        out.push_str("\r\n");
        if result.findings.is_empty() {
            let mut row = vec![String::new(); HEADER.len()];
            row[1] = "No findings".to_string();
            out.push_str(&row.join(","));
            out.push_str("\r\n");
        }
        for f in &result.findings {
            let row = [
                field(&f.id),
                field(&f.title),
                f.severity.to_string(),
                field(&f.category),
                field(&f.checker_id),
                field(&f.file),
                f.line.to_string(),
                f.column.to_string(),
                field(&f.description),
                field(&f.recommendation),
            ];
            out.push_str(&row.join(","));
            out.push_str("\r\n");
        }
        Ok(out.into_bytes())
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }

    fn mime_type(&self) -> &'static str {
        "text/csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;
    use crate::rules::model::Severity;

    #[test]
    fn quoting() {
        assert_eq!(field("plain"), "plain");
        assert_eq!(field("a,b"), "\"a,b\"");
        assert_eq!(field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn one_row_per_finding_or_placeholder() {
        let empty = String::from_utf8(CsvFormatter.format(&fixtures::result(vec![])).unwrap()).unwrap();
        assert_eq!(empty.lines().count(), 2);
        assert!(empty.contains(",No findings,"));

        let mut finding = fixtures::finding("x", Severity::Low, "a.rs", 4);
        finding.recommendation = "Use a, b".to_string();
        let text = String::from_utf8(CsvFormatter.format(&fixtures::result(vec![finding])).unwrap()).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("RUDRA-X,x title,low,memory-safety,rudra,a.rs,4,3,"));
        assert!(row.ends_with(",\"Use a, b\""));
    }
}
