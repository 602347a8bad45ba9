//! CSV ingestion: one document per data row.

use anyhow::{Context, Result};
use std::path::Path;

use crate::types::CsvDocument;

/// Load every data row of a CSV file as a document whose text is the row's
/// columns rendered as `header: value` lines.
pub fn load_csv(path: &Path) -> Result<Vec<CsvDocument>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open dataset {}", path.display()))?;
    let source = path.display().to_string();
    read_documents(file, &source)
}

fn read_documents<R: std::io::Read>(reader: R, source: &str) -> Result<Vec<CsvDocument>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .with_context(|| format!("Failed to read CSV header from {}", source))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut documents = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Malformed CSV record {} in {}", row + 1, source))?;

        let column_count = headers.len().max(record.len());
        let lines: Vec<String> = (0..column_count)
            .map(|i| {
                let key = headers.get(i).cloned().unwrap_or_else(|| i.to_string());
                let value = record.get(i).unwrap_or("").trim();
                format!("{}: {}", key, value)
            })
            .collect();

        documents.push(CsvDocument {
            text: lines.join("\n"),
            source: source.to_string(),
            row,
        });
    }

    tracing::debug!(source = %source, rows = documents.len(), "Loaded CSV documents");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_rows_render_as_key_value_lines() {
        let data = "Product ID,Store ID, Sales Quantity \n5321,12, 140 \n9286,7,33\n";
        let docs = read_documents(data.as_bytes(), "demand.csv").unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text, "Product ID: 5321\nStore ID: 12\nSales Quantity: 140");
        assert_eq!(docs[0].row, 0);
        assert_eq!(docs[1].row, 1);
        assert_eq!(docs[1].source, "demand.csv");
    }

    #[test]
    fn test_ragged_rows() {
        let data = "a,b\n1\n2,3,4\n";
        let docs = read_documents(data.as_bytes(), "ragged.csv").unwrap();
        assert_eq!(docs[0].text, "a: 1\nb: ");
        assert_eq!(docs[1].text, "a: 2\nb: 3\n2: 4");
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let docs = read_documents("Product ID,Price\n".as_bytes(), "pricing.csv").unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_load_csv_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Product ID,Stock Levels,Reorder Point").unwrap();
        writeln!(file, "4277,150,60").unwrap();

        let docs = load_csv(file.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].text.contains("Stock Levels: 150"));
        assert_eq!(docs[0].source, file.path().display().to_string());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_csv(Path::new("/nonexistent/inventory_monitoring.csv")).unwrap_err();
        assert!(err.to_string().contains("inventory_monitoring.csv"));
    }
}
