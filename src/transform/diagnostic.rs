//! Code frames for transformer errors.
//!
//! # Example Output
//!
//! ```text
//!   1 │ .card {
//! > 2 │   color: ;
//!     │          ^
//!   3 │ }
//! ```

use colored::Colorize;
use std::fmt::Write;

/// Lines shown before and after the offending line.
const CONTEXT_LINES: usize = 2;

mod gutter {
    pub const BAR: &str = "│";
    pub const LINE_MARKER: &str = ">";
    pub const CARET: &str = "^";
}

/// Render the lines of `source` around `line`:`column` (both 1-based).
///
/// Returns an empty string when `line` is outside `source`.
pub fn code_frame(source: &str, line: usize, column: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    if line == 0 || line > lines.len() {
        return String::new();
    }

    let first = line.saturating_sub(CONTEXT_LINES).max(1);
    let last = (line + CONTEXT_LINES).min(lines.len());
    let width = last.to_string().len();

    let mut output = String::new();
    for number in first..=last {
        let text = lines[number - 1];
        let marker = if number == line {
            gutter::LINE_MARKER.red().bold().to_string()
        } else {
            " ".to_owned()
        };
        let number_str = format!("{number:>width$}");
        _ = writeln!(
            output,
            "{marker} {} {} {text}",
            number_str.dimmed(),
            gutter::BAR.dimmed()
        );

        if number == line {
            // Keep tabs so the caret lines up with the source
            let padding: String = text
                .chars()
                .take(column.saturating_sub(1))
                .map(|c| if c == '\t' { '\t' } else { ' ' })
                .collect();
            _ = writeln!(
                output,
                "  {:>width$} {} {padding}{}",
                "",
                gutter::BAR.dimmed(),
                gutter::CARET.red().bold()
            );
        }
    }

    output.truncate(output.trim_end().len());
    output
}

/// 1-based line and character column of the byte `offset` in `source`.
///
/// Offsets past the end clamp to the end of `source`.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    let before = &source[..end];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
