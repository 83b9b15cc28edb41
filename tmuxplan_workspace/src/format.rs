//! Delimited record format used by control-plane queries.
//!
//! tmux prints one line per object using a `-F` template. Fields are joined
//! with ASCII RS so that names and paths containing spaces, tabs, or colons
//! survive intact. Each record kind has a fixed, ordered field list and lines
//! are parsed positionally against it.

use std::collections::HashMap;
use std::str::FromStr;

/// Separator placed between fields of one record.
pub const RECORD_SEPARATOR: char = '\x1e';

/// A parsed record, keyed by tmux format variable name.
pub type Record = HashMap<String, String>;

/// Fields requested for sessions.
pub const SESSION_FIELDS: &[&str] =
    &["session_id", "session_name", "session_windows", "session_attached", "session_path"];

/// Fields requested for windows.
pub const WINDOW_FIELDS: &[&str] = &[
    "window_id",
    "window_name",
    "window_index",
    "window_layout",
    "window_active",
    "window_panes",
    "session_id",
    "session_name",
];

/// Fields requested for panes.
pub const PANE_FIELDS: &[&str] = &[
    "pane_id",
    "pane_index",
    "pane_width",
    "pane_height",
    "pane_active",
    "pane_current_path",
    "pane_current_command",
    "window_id",
    "window_index",
    "session_id",
    "session_name",
];

/// Build the `-F` template for a field list.
pub fn format_string(fields: &[&str]) -> String {
    let mut template = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            template.push(RECORD_SEPARATOR);
        }
        template.push_str("#{");
        template.push_str(field);
        template.push('}');
    }
    template
}

/// Parse output lines into records.
///
/// Blank lines are skipped. Missing trailing values read as empty strings,
/// surplus values are ignored.
pub fn parse_records<S: AsRef<str>>(lines: &[S], fields: &[&str]) -> Vec<Record> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut values = line.split(RECORD_SEPARATOR);
            fields
                .iter()
                .map(|field| (field.to_string(), values.next().unwrap_or_default().to_owned()))
                .collect()
        })
        .collect()
}

/// Value of `name`, or `""` when the control plane did not report it.
pub fn field<'a>(record: &'a Record, name: &str) -> &'a str {
    record.get(name).map_or("", String::as_str)
}

/// Boolean tmux flag (`1` means set).
pub fn flag(record: &Record, name: &str) -> bool {
    field(record, name) == "1"
}

/// Numeric field, zero when missing or unparsable.
pub fn number<T: FromStr + Default>(record: &Record, name: &str) -> T {
    field(record, name).parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_joins_fields_with_separator() {
        assert_eq!(format_string(&["a", "b"]), "#{a}\x1e#{b}");
        assert_eq!(format_string(&["only"]), "#{only}");
    }

    #[test]
    fn parses_positionally() {
        let lines = ["%1\x1e0\x1e80\x1e24\x1e1\x1e/home/dev/my project\x1evim"];
        let records = parse_records(&lines, PANE_FIELDS);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r["pane_id"], "%1");
        assert_eq!(r["pane_current_path"], "/home/dev/my project");
        assert_eq!(r["pane_current_command"], "vim");
        // Values missing from the line read as empty.
        assert_eq!(r["session_name"], "");
    }

    #[test]
    fn skips_blank_lines_and_ignores_extra_values() {
        let lines = ["", "$1\x1ework\x1e2\x1e0\x1e/tmp\x1eextra", ""];
        let records = parse_records(&lines, SESSION_FIELDS);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["session_name"], "work");
        assert_eq!(records[0].len(), SESSION_FIELDS.len());
    }

    #[test]
    fn colons_and_spaces_are_not_separators() {
        let lines = ["@3\x1eweb: api server\x1e1"];
        let records = parse_records(&lines, WINDOW_FIELDS);
        assert_eq!(records[0]["window_name"], "web: api server");
        assert_eq!(records[0]["window_index"], "1");
    }

    #[test]
    fn typed_accessors_tolerate_missing_fields() {
        let record = &parse_records(&["%4\x1e2\x1ewide"], PANE_FIELDS)[0];
        assert_eq!(field(record, "pane_id"), "%4");
        assert_eq!(number::<u32>(record, "pane_index"), 2);
        assert_eq!(number::<u32>(record, "pane_width"), 0);
        assert!(!flag(record, "pane_active"));
        assert_eq!(field(record, "not_requested"), "");
    }
}
