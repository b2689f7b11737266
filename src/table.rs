//! Aligned plain-text tables for terminal output.
//!
//! Control characters inside cells are flattened to spaces so multi-line
//! feedback cannot break the grid, and cells can be clipped to a maximum
//! width with a trailing `…`.

use std::{borrow::Cow, fmt::Write as _};

const ELLIPSIS: char = '…';
const COLUMN_GAP: &str = "  ";

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    render_table_clipped(headers, rows, None)
}

pub fn render_table_clipped(
    headers: &[String],
    rows: &[Vec<String>],
    max_width: Option<usize>,
) -> String {
    let prepare = |value: &str| clip(&flatten(value), max_width);
    let header_cells = headers.iter().map(|h| prepare(h)).collect::<Vec<_>>();
    let body = rows
        .iter()
        .map(|row| {
            (0..headers.len())
                .map(|idx| prepare(row.get(idx).map(String::as_str).unwrap_or("")))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = header_cells
        .iter()
        .map(|cell| cell.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(&header_cells, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&rule, &widths));
    for row in &body {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str(COLUMN_GAP);
        }
        let _ = write!(line, "{cell:<width$}");
    }
    line.trim_end().to_string()
}

fn flatten(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace("\r\n", " ").replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

fn clip(value: &str, max_width: Option<usize>) -> String {
    match max_width {
        Some(limit) if limit > 0 && value.chars().count() > limit => {
            let mut clipped = value.chars().take(limit - 1).collect::<String>();
            clipped.push(ELLIPSIS);
            clipped
        }
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn columns_are_padded_to_the_widest_cell() {
        let rendered = render_table(
            &strings(&["Name", "Q1"]),
            &[strings(&["Alice", "7"]), strings(&["Bo", "ns"])],
        );
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines, ["Name   Q1", "-----  ---", "Alice  7", "Bo     ns"]);
    }

    #[test]
    fn multiline_cells_are_flattened_and_clipped() {
        let rendered = render_table_clipped(
            &strings(&["Feedback"]),
            &[strings(&["Good\r\nwork on\tQ2 overall"])],
            Some(10),
        );
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[2], "Good work…");
    }

    #[test]
    fn missing_cells_render_blank() {
        let rendered = render_table(&strings(&["Name", "Overall"]), &[strings(&["Alice"])]);
        assert_eq!(rendered.lines().nth(2), Some("Alice"));
    }
}
