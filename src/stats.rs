use std::collections::HashMap;
use std::fmt;

use tracing::{instrument, trace, warn};

use crate::numeric::parse_number_prefix;
use crate::store::Dataset;

#[derive(Debug, Clone, PartialEq)]
pub struct ValueFrequency {
    pub value: String,
    pub count: usize,
    /// Share of the non-empty values, rounded to one decimal.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub sum: f64,
    pub average: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl NumericSummary {
    fn from_values(mut numbers: Vec<f64>) -> Option<Self> {
        if numbers.is_empty() {
            return None;
        }
        let count = numbers.len();
        let sum: f64 = numbers.iter().sum();
        numbers.sort_by(f64::total_cmp);
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (numbers[mid - 1] + numbers[mid]) / 2.0
        } else {
            numbers[mid]
        };
        Some(NumericSummary {
            count,
            sum,
            average: sum / count as f64,
            median,
            min: numbers[0],
            max: numbers[count - 1],
        })
    }
}

/// Snapshot of one column over the filtered rows at the time it was computed.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsReport {
    pub column: String,
    pub total_values: usize,
    pub unique_values: usize,
    pub empty_values: usize,
    pub numeric: Option<NumericSummary>,
    pub top_values: Vec<ValueFrequency>,
}

impl StatisticsReport {
    pub fn empty(column: impl Into<String>) -> Self {
        StatisticsReport {
            column: column.into(),
            total_values: 0,
            unique_values: 0,
            empty_values: 0,
            numeric: None,
            top_values: Vec::new(),
        }
    }
}

impl fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.column)?;
        writeln!(f, "  Total values:  {}", self.total_values)?;
        writeln!(f, "  Unique values: {}", self.unique_values)?;
        writeln!(f, "  Empty values:  {}", self.empty_values)?;
        if let Some(n) = &self.numeric {
            writeln!(f, "  Sum:           {}", format_grouped(n.sum))?;
            writeln!(f, "  Average:       {:.2}", n.average)?;
            writeln!(f, "  Median:        {:.2}", n.median)?;
            writeln!(f, "  Min:           {}", format_grouped(n.min))?;
            writeln!(f, "  Max:           {}", format_grouped(n.max))?;
        }
        if !self.top_values.is_empty() {
            writeln!(f, "Top Values")?;
            for v in &self.top_values {
                writeln!(f, "  {}: {} ({:.1}%)", v.value, v.count, v.percentage)?;
            }
        }
        Ok(())
    }
}

/// Statistics for `column` over the given dataset rows. Row order only matters
/// for breaking ties between equally frequent values (first seen wins).
#[instrument(skip(dataset, rows), fields(rows = rows.len()))]
pub fn compute_stats(
    dataset: &Dataset,
    rows: &[usize],
    column: &str,
    top_n: usize,
) -> StatisticsReport {
    let Some(col) = dataset.column_by_name(column) else {
        warn!("Statistics requested for unknown column {:?}", column);
        return StatisticsReport::empty(column);
    };

    let non_empty: Vec<&str> = rows
        .iter()
        .map(|&r| col.data[r].as_str())
        .filter(|v| !v.is_empty())
        .collect();
    let total_values = non_empty.len();

    let numbers: Vec<f64> = non_empty
        .iter()
        .filter_map(|v| parse_number_prefix(v))
        .collect();

    // Counts in first-seen order so the stable sort below keeps that order for ties.
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &value in &non_empty {
        match positions.get(value) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                positions.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    let unique_values = counts.len();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let top_values = counts
        .into_iter()
        .take(top_n)
        .map(|(value, count)| ValueFrequency {
            value: value.to_string(),
            count,
            percentage: (count as f64 * 1000.0 / total_values as f64).round() / 10.0,
        })
        .collect();

    trace!(
        "Statistics for {:?}: {} values, {} unique, {} numeric",
        column,
        total_values,
        unique_values,
        numbers.len()
    );

    StatisticsReport {
        column: column.to_string(),
        total_values,
        unique_values,
        empty_values: rows.len() - total_values,
        numeric: NumericSummary::from_values(numbers),
        top_values,
    }
}

/// Thousands-grouped number with at most three decimals, e.g. `1,234.568`.
pub fn format_grouped(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if !frac_part.is_empty() {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    if value < 0.0 && grouped.chars().any(|c| c.is_ascii_digit() && c != '0') {
        grouped.insert(0, '-');
    }
    grouped
}
