use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{trace, warn};

use crate::domain::{SortDirection, SortSpec};
use crate::numeric::parse_number_prefix;
use crate::store::Dataset;

/// Derived rows of the dataset, as dataset row indices.
///
/// `filtered` keeps dataset order and feeds the statistics; `sorted` is the
/// same rows in display order and feeds pagination and export.
#[derive(Clone, Default)]
pub struct View {
    pub filtered: Arc<Vec<usize>>,
    pub sorted: Arc<Vec<usize>>,
}

impl View {
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}

/// Full recomputation from the dataset: filter, then sort.
pub fn recompute(dataset: &Dataset, query: &str, sort: Option<SortSpec>) -> View {
    let start_time = Instant::now();
    let filtered = filter(dataset, query);
    let sorted = match sort {
        Some(spec) => sort_rows(dataset, &filtered, spec),
        None => filtered.clone(),
    };
    trace!(
        "Recomputed view: query {:?}, sort {:?}, {} of {} rows in {}ms",
        query,
        sort,
        sorted.len(),
        dataset.nrows(),
        start_time.elapsed().as_millis()
    );
    View {
        filtered: Arc::new(filtered),
        sorted: Arc::new(sorted),
    }
}

/// Rows where at least one cell contains `query`, ignoring case. An empty query
/// keeps every row.
pub fn filter(dataset: &Dataset, query: &str) -> Vec<usize> {
    if query.is_empty() {
        return (0..dataset.nrows()).collect();
    }
    let needle = query.to_lowercase();
    let columns = dataset.columns();
    (0..dataset.nrows())
        .into_par_iter()
        .filter(|&row| columns.iter().any(|c| c.folded(row).contains(&needle)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    fn from_cell(value: &str) -> Self {
        match parse_number_prefix(value) {
            Some(n) => SortKey::Number(n),
            None => SortKey::Text(value.to_lowercase()),
        }
    }
}

// Numbers before text keeps mixed columns totally ordered.
fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
    }
}

/// Ascending comparison of two cells under the sort rules.
///
/// A number and a non-number never compare as text: the number always sorts
/// first, so blank cells land after every number in an ascending sort.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    compare_keys(&SortKey::from_cell(a), &SortKey::from_cell(b))
}

/// Stable sort of `rows` by one column. An unknown column leaves the order as is.
pub fn sort_rows(dataset: &Dataset, rows: &[usize], spec: SortSpec) -> Vec<usize> {
    let Some(column) = dataset.column(spec.column) else {
        if !dataset.is_empty() {
            warn!("Sort requested for unknown column {}", spec.column);
        }
        return rows.to_vec();
    };

    let mut keyed: Vec<(usize, SortKey)> = rows
        .par_iter()
        .map(|&row| (row, SortKey::from_cell(&column.data[row])))
        .collect();

    match spec.direction {
        SortDirection::Ascending => keyed.sort_by(|(_, a), (_, b)| compare_keys(a, b)),
        SortDirection::Descending => keyed.sort_by(|(_, a), (_, b)| compare_keys(b, a)),
    }
    keyed.into_iter().map(|(row, _)| row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CsvCodec;

    fn dataset(text: &str) -> Dataset {
        Dataset::from_columns("t.csv", b',', CsvCodec::new(b',').parse(text).unwrap())
    }

    fn column_values(ds: &Dataset, rows: &[usize], column: usize) -> Vec<String> {
        rows.iter()
            .map(|&r| ds.cell(r, column).unwrap_or_default().to_string())
            .collect()
    }

    fn spec(column: usize, direction: SortDirection) -> SortSpec {
        SortSpec { column, direction }
    }

    #[test]
    fn empty_query_is_identity() {
        let ds = dataset("name,city\nA,x\nB,y\nC,z\n");
        assert_eq!(filter(&ds, ""), vec![0, 1, 2]);
    }

    #[test]
    fn filter_matches_any_cell_ignoring_case() {
        let ds = dataset("name,city\nAlice,Berlin\nbob,Paris\nCarol,berlin\n");
        let rows = filter(&ds, "BERL");
        assert_eq!(rows, vec![0, 2]);
        for row in 0..ds.nrows() {
            let hit = ds
                .record(row)
                .unwrap()
                .values()
                .any(|v| v.to_lowercase().contains("berl"));
            assert_eq!(hit, rows.contains(&row));
        }
    }

    #[test]
    fn filter_always_starts_from_the_dataset() {
        let ds = dataset("name\nann\nanna\nbob\n");
        assert_eq!(filter(&ds, "anna"), vec![1]);
        assert_eq!(filter(&ds, "an"), vec![0, 1]);
    }

    #[test]
    fn numeric_sort_is_not_lexicographic() {
        let ds = dataset("v\n10\n2\n1\n");
        let rows = sort_rows(&ds, &[0, 1, 2], spec(0, SortDirection::Ascending));
        assert_eq!(column_values(&ds, &rows, 0), vec!["1", "2", "10"]);
    }

    #[test]
    fn grouping_commas_are_ignored_when_sorting() {
        let ds = dataset("v\n\"1,000\"\n20\n300\n");
        let rows = sort_rows(&ds, &[0, 1, 2], spec(0, SortDirection::Ascending));
        assert_eq!(column_values(&ds, &rows, 0), vec!["20", "300", "1,000"]);
    }

    #[test]
    fn unit_suffixes_sort_by_their_leading_number() {
        let ds = dataset("w\n3.5kg\n10kg\n9kg\nn/a\n");
        let rows = sort_rows(&ds, &[0, 1, 2, 3], spec(0, SortDirection::Ascending));
        assert_eq!(column_values(&ds, &rows, 0), vec!["3.5kg", "9kg", "10kg", "n/a"]);
    }

    #[test]
    fn text_sort_ignores_case() {
        let ds = dataset("v\nbanana\nApple\ncherry\n");
        let rows = sort_rows(&ds, &[0, 1, 2], spec(0, SortDirection::Ascending));
        assert_eq!(column_values(&ds, &rows, 0), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn numbers_order_before_text() {
        assert_eq!(compare_cells("10", "9"), Ordering::Greater);
        assert_eq!(compare_cells("9", "apple"), Ordering::Less);
        assert_eq!(compare_cells("", "0"), Ordering::Greater);
        assert_eq!(compare_cells("Apple", "apple"), Ordering::Equal);
    }

    #[test]
    fn descending_reverses_ascending_without_ties() {
        let ds = dataset("v\n5\nb\n-1\na\n3.5\n");
        let all: Vec<usize> = (0..ds.nrows()).collect();
        let asc = sort_rows(&ds, &all, spec(0, SortDirection::Ascending));
        let mut desc = sort_rows(&ds, &all, spec(0, SortDirection::Descending));
        desc.reverse();
        assert_eq!(asc, desc);
        assert_eq!(column_values(&ds, &asc, 0), vec!["-1", "3.5", "5", "a", "b"]);
    }

    #[test]
    fn sort_is_a_stable_idempotent_permutation() {
        let ds = dataset("k,v\nx,1\ny,2\nz,1\nw,2\n");
        let all: Vec<usize> = (0..ds.nrows()).collect();
        let once = sort_rows(&ds, &all, spec(1, SortDirection::Ascending));
        assert_eq!(once, vec![0, 2, 1, 3]);
        let twice = sort_rows(&ds, &once, spec(1, SortDirection::Ascending));
        assert_eq!(once, twice);

        let mut permuted = once.clone();
        permuted.sort_unstable();
        assert_eq!(permuted, all);
    }

    #[test]
    fn recompute_filters_then_sorts() {
        let ds = dataset("name,score\nAlice,10\nbob,2\nAlina,1\n");
        let view = recompute(&ds, "al", Some(spec(1, SortDirection::Ascending)));
        assert_eq!(*view.filtered, vec![0, 2]);
        assert_eq!(*view.sorted, vec![2, 0]);
    }

    #[test]
    fn unknown_sort_column_keeps_order() {
        let ds = dataset("v\n3\n1\n2\n");
        let rows = sort_rows(&ds, &[2, 0, 1], spec(9, SortDirection::Ascending));
        assert_eq!(rows, vec![2, 0, 1]);
    }

    #[test]
    fn empty_dataset_gives_empty_views() {
        let ds = Dataset::empty();
        let view = recompute(&ds, "x", Some(spec(0, SortDirection::Descending)));
        assert!(view.is_empty());
        assert!(view.filtered.is_empty());
    }
}
