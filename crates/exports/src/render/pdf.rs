//! Minimal text-only PDF 1.4 writer.
//!
//! One built-in Helvetica font, US Letter pages, fixed line height. Enough for
//! a readable data dump without pulling in a layout engine.

use super::display_value;
use crate::snapshot::UserDataSnapshot;

const LINES_PER_PAGE: usize = 50;
const MAX_LINE_CHARS: usize = 95;
const FONT_SIZE: u32 = 10;
const LEADING: u32 = 14;
const TOP: u32 = 750;
const LEFT: u32 = 50;

pub fn render(snapshot: &UserDataSnapshot) -> Vec<u8> {
    let lines = text_lines(snapshot);
    // Header lines guarantee at least one page.
    let pages: Vec<&[String]> = lines.chunks(LINES_PER_PAGE).collect();
    write_document(&pages)
}

fn text_lines(snapshot: &UserDataSnapshot) -> Vec<String> {
    let mut lines = vec![
        "Personal data export".to_string(),
        format!("User: {}", snapshot.user_id),
        format!("Generated: {}", snapshot.generated_at.to_rfc3339()),
        String::new(),
    ];

    for section in &snapshot.sections {
        lines.push(format!("== {} ({}) ==", section.name, section.records.len()));
        for (i, record) in section.records.iter().enumerate() {
            if section.records.len() > 1 {
                lines.push(format!("#{}", i + 1));
            }
            for (field, value) in &record.fields {
                lines.push(format!("  {field}: {}", display_value(value)));
            }
        }
        lines.push(String::new());
    }

    lines.into_iter().map(|l| truncate(&l)).collect()
}

fn truncate(line: &str) -> String {
    if line.chars().count() <= MAX_LINE_CHARS {
        line.to_string()
    } else {
        let mut s: String = line.chars().take(MAX_LINE_CHARS - 3).collect();
        s.push_str("...");
        s
    }
}

/// Escape a line for a PDF literal string. Non-ASCII falls back to `?`
/// because the standard font has no Unicode mapping.
fn escape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn content_stream(lines: &[String]) -> String {
    let mut s = format!("BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL\n{LEFT} {TOP} Td\n");
    for line in lines {
        s.push_str(&format!("({}) Tj T*\n", escape(line)));
    }
    s.push_str("ET");
    s
}

fn write_document(pages: &[&[String]]) -> Vec<u8> {
    // Objects: 1 catalog, 2 page tree, 3 font, then (page, contents) pairs.
    let page_obj = |i: usize| 4 + i * 2;
    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", page_obj(i)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for (i, lines) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            page_obj(i) + 1
        ));
        let stream = content_stream(lines);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }

    let xref_at = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for off in offsets {
        out.push_str(&format!("{off:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));
    out.into_bytes()
}
