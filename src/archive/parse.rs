//! Decoding one downloaded archive into a table.
//!
//! Archives hold a single headerless tab-separated file. Text is read as
//! UTF-8, falling back to Latin-1 for the whole file when that fails.

use std::io::{Cursor, Read};

use tracing::debug;
use zip::ZipArchive;

use super::error::ArchiveFileError;
use crate::table::{Cell, RecordTable};

/// Parses a zipped TSV archive into a table of `width` positional columns.
///
/// Empty fields become [`Cell::Null`]; other fields stay text. Rows shorter
/// than `width` are padded with nulls and blank lines are skipped.
///
/// # Errors
///
/// Returns [`ArchiveFileError::Zip`] or [`ArchiveFileError::EntryCount`] for
/// a bad container and [`ArchiveFileError::RowTooWide`] when a row does not
/// fit the schema.
pub fn parse_archive(bytes: &[u8], width: usize) -> Result<RecordTable, ArchiveFileError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    if archive.len() != 1 {
        return Err(ArchiveFileError::EntryCount {
            count: archive.len(),
        });
    }

    let mut raw = Vec::new();
    archive.by_index(0)?.read_to_end(&mut raw)?;
    let text = decode_text(raw);
    parse_tsv(&text, width)
}

/// UTF-8 first; Latin-1 maps every byte to a code point and cannot fail.
fn decode_text(raw: Vec<u8>) -> String {
    match String::from_utf8(raw) {
        Ok(text) => text,
        Err(error) => {
            debug!(
                valid_up_to = error.utf8_error().valid_up_to(),
                "archive is not UTF-8, decoding as Latin-1"
            );
            error.into_bytes().iter().map(|&b| char::from(b)).collect()
        }
    }
}

fn parse_tsv(text: &str, width: usize) -> Result<RecordTable, ArchiveFileError> {
    let mut table = RecordTable::with_width(width);
    for (number, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let mut row: Vec<Cell> = line
            .split('\t')
            .map(|field| {
                if field.is_empty() {
                    Cell::Null
                } else {
                    Cell::from(field)
                }
            })
            .collect();
        if row.len() > width {
            return Err(ArchiveFileError::RowTooWide {
                line: number + 1,
                actual: row.len(),
                expected: width,
            });
        }
        row.resize(width, Cell::Null);
        table.push_row(row)?;
    }
    Ok(table)
}
