//! Plain-text column alignment for list output.

/// Render `rows` under `headers`, left-aligned with two-space gutters.
/// Rows shorter than the header are padded with empty cells.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, row: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = row.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat(' ').take(pad));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_columns() {
        let rows = vec![
            vec!["standard".to_string(), "300".to_string()],
            vec!["photo".to_string(), "600".to_string()],
        ];
        let out = render_table(&["NAME", "DPI"], &rows);
        assert_eq!(out, "NAME      DPI\nstandard  300\nphoto     600\n");
    }

    #[test]
    fn pads_short_rows() {
        let out = render_table(&["A", "B"], &[vec!["x".to_string()]]);
        assert_eq!(out, "A  B\nx\n");
    }
}
