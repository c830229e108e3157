//! Plain-text contingency tables for aggregated results.

use crate::aggregate::{sort_categories, AggregatedTable, AggregationMode};
use std::fmt;

/// Decimal places used when none is requested: whole counts, probabilities to 2 places
pub fn default_precision(mode: AggregationMode) -> usize {
    match mode {
        AggregationMode::Count => 0,
        _ => 2,
    }
}

/// Render the table with primary categories as rows and secondary categories as columns.
/// Combinations that were never observed print as zero.
pub fn format_table(table: &AggregatedTable, precision: usize) -> String {
    let mut rows = table.primary_levels.clone();
    sort_categories(&mut rows);

    let columns: Vec<Option<String>> = if table.has_secondary() {
        table.secondary_levels.iter().cloned().map(Some).collect()
    } else {
        vec![None]
    };

    let header_corner = match &table.key.secondary {
        Some(s) => format!("{} \\ {}", table.key.primary, s),
        None => table.key.primary.clone(),
    };
    let column_titles: Vec<String> = columns
        .iter()
        .map(|c| c.clone().unwrap_or_else(|| table.mode.axis_title().to_string()))
        .collect();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| {
                    let value = table.get(r, c.as_deref()).map(|cell| cell.value).unwrap_or(0.0);
                    format!("{:.*}", precision, value)
                })
                .collect()
        })
        .collect();

    let first_width = rows
        .iter()
        .map(|r| r.chars().count())
        .chain(std::iter::once(header_corner.chars().count()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = (0..columns.len())
        .map(|j| {
            cells
                .iter()
                .map(|row| row[j].len())
                .chain(std::iter::once(column_titles[j].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&format!("{:<width$}", header_corner, width = first_width));
    for (title, w) in column_titles.iter().zip(&widths) {
        out.push_str(&format!("  {:>width$}", title, width = w));
    }
    out.push('\n');

    for (row, values) in rows.iter().zip(&cells) {
        out.push_str(&format!("{:<width$}", row, width = first_width));
        for (v, w) in values.iter().zip(&widths) {
            out.push_str(&format!("  {:>width$}", v, width = w));
        }
        out.push('\n');
    }
    out
}

impl fmt::Display for AggregatedTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let precision = f.precision().unwrap_or_else(|| default_precision(self.mode));
        write!(f, "{}", format_table(self, precision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::mtcars;

    #[test]
    fn test_conditional_table() {
        let ds = mtcars::dataset().unwrap();
        let table = aggregate(&ds, "cyl", Some("am"), AggregationMode::ConditionalProbability).unwrap();
        let text = format!("{}", table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "cyl \\ am     0     1");
        assert_eq!(lines[1], "4         0.27  0.73");
        assert_eq!(lines[3], "8         0.86  0.14");
    }

    #[test]
    fn test_count_table() {
        let ds = mtcars::dataset().unwrap();
        let table = aggregate(&ds, "cyl", None, AggregationMode::Count).unwrap();
        let text = format_table(&table, 0);
        assert!(text.starts_with("cyl  count\n"));
        assert!(text.contains("4       11\n"));
        assert!(text.contains("8       14\n"));
    }

    #[test]
    fn test_explicit_precision() {
        let ds = mtcars::dataset().unwrap();
        let table = aggregate(&ds, "cyl", None, AggregationMode::RelativeFrequency).unwrap();
        let text = format!("{:.4}", table);
        assert!(text.contains("0.3438"));
    }
}
