use super::display_value;
use crate::snapshot::UserDataSnapshot;

/// Long-format CSV: one `section,field,value` row per field. Sections with
/// several records label each row `name[i]`.
pub fn render(snapshot: &UserDataSnapshot) -> String {
    let mut out = String::from("section,field,value\r\n");
    for section in &snapshot.sections {
        let indexed = section.records.len() > 1;
        for (i, record) in section.records.iter().enumerate() {
            let label = if indexed {
                format!("{}[{i}]", section.name)
            } else {
                section.name.clone()
            };
            for (field, value) in &record.fields {
                push_row(&mut out, &[&label, field, &display_value(value)]);
            }
        }
    }
    out
}

fn push_row(out: &mut String, cells: &[&str]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(cell));
    }
    out.push_str("\r\n");
}

/// RFC 4180 quoting: wrap in quotes when the cell holds a delimiter, quote or
/// line break; double embedded quotes.
pub(crate) fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
