//! Import file builders

#![allow(dead_code)]

/// Header of every generated file
pub const HEADER: &str =
    "name,position,jurisdiction_type,jurisdiction_name,parent_jurisdiction,party,term_start,term_end";

/// CSV bytes for `rows`, each already comma-joined in `HEADER` order
pub fn csv_file(rows: &[&str]) -> Vec<u8> {
    let mut content = String::from(HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    content.into_bytes()
}
