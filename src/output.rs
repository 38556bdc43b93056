//! Plain-text rendering of query outcomes for the terminal.

use crate::db::Row;
use crate::query::{ExecutionResult, QueryOutcome};
use crate::session::NO_RESULTS;

/// Renders an outcome as the text shown to the user.
pub fn render_outcome(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Completed(report) => {
            let mut out = render_result(&report.result);
            if let Some(warning) = &report.warning {
                out.push('\n');
                out.push_str(warning);
            }
            out
        }
        QueryOutcome::Rejected(e) | QueryOutcome::Failed(e) => {
            format!("ERROR ({}): {}", e.category(), e.reason())
        }
    }
}

/// Renders a successful result.
pub fn render_result(result: &ExecutionResult) -> String {
    match result {
        ExecutionResult::Scalar(value) => value.to_display_string(),
        ExecutionResult::Table { columns, rows } => render_table(columns, rows),
        ExecutionResult::Empty => NO_RESULTS.to_string(),
    }
}

/// Renders rows as an aligned, pipe-separated table with a row count footer.
pub fn render_table(columns: &[String], rows: &[Row]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_display_string()).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let format_line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_line(columns)];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    lines.extend(cells.iter().map(|row| format_line(row)));

    let noun = if rows.len() == 1 { "row" } else { "rows" };
    lines.push(format!("({} {})", rows.len(), noun));
    lines.join("\n")
}
