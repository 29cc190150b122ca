// Delimited-text import (custody / NBIM files) and break-table export

use std::io::Write;
use std::path::Path;

use divrecon_recon::model::{BreakRecord, Dataset, RawRow, RawTable};
use divrecon_recon::ReconError;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Column order of the break table.
pub const BREAK_TABLE_HEADERS: [&str; 7] = [
    "JOIN_KEY_EVENT",
    "JOIN_KEY_ACCOUNT",
    "BREAK_TYPE",
    "COLUMN",
    "CUSTODY_VALUE",
    "NBIM_VALUE",
    "REASON",
];

/// Candidate delimiters in tie-break order.
const DELIMITERS: [u8; 4] = [b',', b';', b'|', b'\t'];

const SNIFF_LINES: usize = 10;

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Read and parse one input file.
pub fn read_table(dataset: Dataset, path: &Path) -> Result<RawTable, ReconError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ReconError::Io(format!("{dataset}: cannot read {}: {e}", path.display())))?;
    parse_table(dataset, &bytes)
}

/// Decode, sniff the delimiter and split into header + rows.
pub fn parse_table(dataset: Dataset, bytes: &[u8]) -> Result<RawTable, ReconError> {
    let (content, encoding) = decode(bytes).ok_or_else(|| ReconError::Ingest {
        dataset,
        reason: "not valid UTF-8 or Windows-1252 text".into(),
    })?;
    let delimiter = sniff_delimiter(&content).ok_or_else(|| ReconError::Ingest {
        dataset,
        reason: if content.trim().is_empty() {
            "no header line".into()
        } else {
            "no delimiter among , ; | tab splits the header".into()
        },
    })?;
    log::debug!(
        "{dataset}: encoding {}, delimiter {:?}",
        encoding.name(),
        delimiter as char
    );

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| ReconError::Ingest {
            dataset,
            reason: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);

        let Some(width) = headers.as_ref().map(Vec::len) else {
            headers = Some(record.iter().map(|h| h.trim().to_string()).collect());
            continue;
        };

        // A line of bare delimiters carries no row.
        if record.iter().all(|cell| cell.trim().is_empty()) {
            log::debug!("{dataset}: line {line}: skipping empty row");
            continue;
        }

        let mut values: Vec<String> = record.iter().take(width).map(|v| v.to_string()).collect();
        values.resize(width, String::new());
        rows.push(RawRow { line, values });
    }

    let headers = headers.ok_or_else(|| ReconError::Ingest {
        dataset,
        reason: "no header line".into(),
    })?;

    Ok(RawTable {
        headers,
        rows,
        delimiter,
        encoding: encoding.name().to_string(),
    })
}

/// UTF-8 (BOM stripped), then Windows-1252. Neither allows replacement characters.
pub fn decode(bytes: &[u8]) -> Option<(String, &'static Encoding)> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    for encoding in [UTF_8, WINDOWS_1252] {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
            return Some((text.into_owned(), encoding));
        }
    }
    None
}

/// Detect the field delimiter from the first non-blank lines.
///
/// For each candidate (comma, semicolon, pipe, tab) count quote-aware fields
/// per line. A candidate is viable only if it splits the header line. Score is
/// (lines with the header's field count) × (header field count); the highest
/// score wins and ties go to the earlier candidate. `None` when no candidate
/// splits the header.
pub fn sniff_delimiter(content: &str) -> Option<u8> {
    let sample_lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = None;
    let mut best_score = 0u64;

    for &delim in &DELIMITERS {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = Some(delim);
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write the break table: header row, then one row per break, UTF-8.
pub fn write_breaks<W: Write>(writer: W, breaks: &[BreakRecord], delimiter: u8) -> Result<(), ReconError> {
    let io_err = |e: csv::Error| ReconError::Io(format!("cannot write break table: {e}"));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    writer.write_record(BREAK_TABLE_HEADERS).map_err(io_err)?;
    for b in breaks {
        let column = b.column.map(|c| c.as_str()).unwrap_or("");
        writer
            .write_record([
                b.join_key.event.as_str(),
                b.join_key.account.as_str(),
                b.break_type.as_str(),
                column,
                b.custody_value.as_str(),
                b.nbim_value.as_str(),
                b.reason.as_str(),
            ])
            .map_err(io_err)?;
    }

    writer
        .flush()
        .map_err(|e| ReconError::Io(format!("cannot write break table: {e}")))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
