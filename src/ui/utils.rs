use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cut a string to `max_cells` terminal columns, appending "…" if truncated 🛡️
pub fn truncate_cells(s: &str, max_cells: usize) -> String {
    if s.width() <= max_cells {
        return s.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_cells - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out + "…"
}

/// Logical px → terminal cells for a given px-per-cell scale.
pub fn px_to_cells(px: f32, px_per_cell: f32) -> i32 {
    if px_per_cell <= 0.0 {
        return 0;
    }
    (px / px_per_cell).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_cells() {
        assert_eq!(truncate_cells("Hello", 5), "Hello");
        assert_eq!(truncate_cells("Hello World", 6), "Hello…");
        assert_eq!(truncate_cells("日本語", 4), "日…");
        assert_eq!(truncate_cells("abc", 0), "");
    }

    #[test]
    fn test_px_to_cells() {
        assert_eq!(px_to_cells(160.0, 32.0), 5);
        assert_eq!(px_to_cells(-192.0, 32.0), -6);
        assert_eq!(px_to_cells(10.0, 0.0), 0);
    }
}
