use super::ReportFormatter;
use crate::aggregator::ScanResult;
use crate::error::{CoreError, Result};

pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, result: &ScanResult) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(result).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }
}
