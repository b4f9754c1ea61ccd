//! Plain-text tables for listings on stdout.

use std::fmt::Write as _;

/// Renders `rows` under `headers` with two spaces between columns. Cells
/// wider than the header extend the column; extra cells are ignored.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| visible_width(h).max(1)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_width(&flatten(cell)));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", render_line(headers, &widths));
    let rules: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(3))).collect();
    let rule_widths: Vec<usize> = widths.iter().map(|w| (*w).max(3)).collect();
    let _ = writeln!(output, "{}", render_line(&rules, &rule_widths));
    for row in rows {
        let _ = writeln!(output, "{}", render_line(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let cell = flatten(cell);
        line.push_str(&cell);
        let padding = width.saturating_sub(visible_width(&cell));
        line.extend(std::iter::repeat_n(' ', padding));
    }
    line.truncate(line.trim_end_matches(' ').len());
    line
}

/// Tabs and line breaks would break the grid.
fn flatten(cell: &str) -> String {
    cell.replace(['\n', '\r', '\t'], " ")
}

/// Character count ignoring ANSI colour sequences.
fn visible_width(value: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for ch in value.chars() {
        match (in_escape, ch) {
            (false, '\u{1b}') => in_escape = true,
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, _) => width += 1,
        }
    }
    width
}
