//! CSV decoder for the diet dataset.

use std::io::Read;

use csv::{ReaderBuilder, Trim};
use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::table::{Cell, Table};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decodes a CSV byte stream into a [`Table`].
///
/// Every header column is kept; `required` lists the columns that must be
/// present. Empty fields load as [`Cell::Missing`], everything else as text.
/// Gzip-compressed input is decompressed first.
///
/// # Errors
///
/// Returns [`PipelineError::MissingColumn`] if a required column is not in the
/// header, or [`PipelineError::Decode`] if the bytes are not valid CSV.
pub fn parse_table(bytes: &[u8], required: &[&str]) -> Result<Table> {
    let decompressed;
    let bytes = if bytes.starts_with(&GZIP_MAGIC) {
        decompressed = gunzip(bytes)?;
        &decompressed[..]
    } else {
        bytes
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    for column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(PipelineError::missing_column(column, &headers));
        }
    }

    let mut table = Table::new(headers);
    for record in rdr.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Missing
                } else {
                    Cell::text(field)
                }
            })
            .collect();
        table.push_row(row)?;
    }

    debug!(rows = table.len(), columns = table.columns().len(), "CSV decoded");
    Ok(table)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| PipelineError::Decode(e.into()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const REQUIRED: [&str; 2] = ["Diet_type", "Protein(g)"];

    #[test]
    fn test_parse_minimal_table() {
        let csv = b"Diet_type,Protein(g)\nvegan,10\nketo,\n";
        let table = parse_table(csv, &REQUIRED).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], vec![Cell::text("vegan"), Cell::text("10")]);
        assert_eq!(table.rows()[1][1], Cell::Missing);
    }

    #[test]
    fn test_parse_header_only_is_empty_table() {
        let table = parse_table(b"Diet_type,Protein(g)\n", &REQUIRED).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_parse_missing_required_column() {
        let err = parse_table(b"Diet_type,Carbs(g)\nvegan,1\n", &REQUIRED).unwrap_err();
        match err {
            PipelineError::MissingColumn { column, .. } => assert_eq!(column, "Protein(g)"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_keeps_passthrough_columns() {
        let csv = b"Extraction_day,Diet_type,Protein(g)\n10/16/2022,paleo,3.5\n";
        let table = parse_table(csv, &REQUIRED).unwrap();
        assert_eq!(table.columns()[0], "Extraction_day");
        assert_eq!(table.rows()[0][2], Cell::text("3.5"));
    }

    #[test]
    fn test_parse_ragged_row_fails() {
        let csv = b"Diet_type,Protein(g)\nvegan,1,extra\n";
        assert!(matches!(
            parse_table(csv, &REQUIRED),
            Err(PipelineError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_gzip_input() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(b"Diet_type,Protein(g)\nvegan,10\n")
            .unwrap();
        let compressed = encoder.finish().unwrap();

        let table = parse_table(&compressed, &REQUIRED).unwrap();
        assert_eq!(table.len(), 1);
    }
}
