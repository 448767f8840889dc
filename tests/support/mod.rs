#![allow(dead_code)]

#[path = "../../src/test_support/socket_guard.rs"]
pub mod socket_guard;

use std::io::{Cursor, Write};

/// Zips `contents` as the single entry of a knowledge-graph archive.
pub fn zip_tsv(contents: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("archive.gkg.csv", zip::write::FileOptions::default())
        .unwrap();
    writer.write_all(contents.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// One tab-separated GKG 1.0 row with the given date and article count.
pub fn gkg_v1_row(date: &str, articles: u32) -> String {
    let mut fields = vec![date.to_string(), articles.to_string()];
    fields.extend((2..11).map(|i| format!("field{i}")));
    fields.join("\t")
}
