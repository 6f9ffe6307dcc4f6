use std::path::PathBuf;

use csvview::codec::CsvCodec;
use csvview::pipeline::filter;
use csvview::store::Dataset;
use csvview::{FileSource, Message, Model, SortDirection, ViewerConfig};

fn fixture() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(format!("{}/tests/fixtures/testdata_01.csv", manifest_dir))
}

fn load(page_size: usize) -> Model {
    let source = FileSource::from_path(&fixture()).expect("Failed to read fixture");
    let mut model = Model::init(&ViewerConfig::default().with_page_size(page_size));
    model.update(Message::Load(source)).expect("Failed to load fixture");
    model
}

fn column(model: &Model, name: &str) -> Vec<String> {
    let idx = model.column_index(name).unwrap();
    model
        .get_uidata()
        .rows
        .iter()
        .map(|r| r[idx].clone())
        .collect()
}

#[test]
fn test_load_fixture() {
    let model = load(100);
    let ui = model.get_uidata();
    assert_eq!(ui.name, "testdata_01.csv");
    assert_eq!(ui.headers, vec!["id", "name", "city", "amount", "weight"]);
    assert_eq!(ui.total_rows, 8);
    assert_eq!(ui.total_columns, 5);
    assert_eq!(ui.rows[0][3], "1,200.50");
    assert_eq!(ui.rows[2][4], "");
}

#[test]
fn test_search_is_case_insensitive_over_all_cells() {
    let mut model = load(100);
    model.update(Message::Search("BERLIN".into())).unwrap();
    assert_eq!(column(&model, "id"), vec!["1", "3", "8"]);
    assert_eq!(model.get_uidata().summary(), "Showing 3 of 8 rows");

    let dataset = model.dataset();
    for query in ["a", "kg", "300", "zzz", ""] {
        let rows = filter(dataset, query);
        for row in 0..dataset.nrows() {
            let hit = dataset
                .record(row)
                .unwrap()
                .values()
                .any(|v| v.to_lowercase().contains(&query.to_lowercase()));
            assert_eq!(hit, rows.contains(&row), "query {query:?}, row {row}");
        }
    }
}

#[test]
fn test_sort_numeric_with_grouping_and_blanks() {
    let mut model = load(100);
    let amount = model.column_index("amount").unwrap();
    model.update(Message::Sort(amount)).unwrap();
    assert_eq!(
        column(&model, "id"),
        vec!["5", "8", "3", "2", "4", "1", "7", "6"]
    );

    model.update(Message::Sort(amount)).unwrap();
    assert_eq!(model.state().sort.unwrap().direction, SortDirection::Descending);
    assert_eq!(column(&model, "id")[0], "6");
    assert_eq!(column(&model, "id")[1], "7");
}

#[test]
fn test_pagination_over_filtered_view() {
    let mut model = load(3);
    assert_eq!(model.page().total_pages, 3);
    model.update(Message::GoToPage(3)).unwrap();
    assert_eq!(model.get_uidata().rows.len(), 2);
    assert_eq!(model.get_uidata().page.label(), "Page 3 of 3");

    model.update(Message::Search("paris".into())).unwrap();
    assert_eq!(model.state().page, 1);
    assert_eq!(model.page().total_pages, 1);
    model.update(Message::NextPage).unwrap();
    assert_eq!(model.state().page, 1);
}

#[test]
fn test_statistics_mixed_column() {
    let model = load(100);
    let report = model.statistics("amount");
    assert_eq!(report.total_values, 7);
    assert_eq!(report.empty_values, 1);
    assert_eq!(report.unique_values, 6);
    let n = report.numeric.as_ref().unwrap();
    assert!((n.sum - 10932.75).abs() < 1e-9);
    assert_eq!(n.min, 12.0);
    assert_eq!(n.max, 9000.0);
    assert_eq!(report.top_values[0].value, "300");
    assert_eq!(report.top_values[0].percentage, 28.6);

    let weight = model.statistics("weight");
    let w = weight.numeric.as_ref().unwrap();
    assert_eq!(w.count, 6);
    assert!((w.median - 1.6).abs() < 1e-9);
    assert!(weight.to_string().contains("Median:        1.60"));
}

#[test]
fn test_export_round_trip() {
    let mut model = load(1);
    model.update(Message::Search("e".into())).unwrap();
    let name = model.column_index("name").unwrap();
    model.update(Message::Sort(name)).unwrap();
    model.update(Message::Sort(name)).unwrap();

    let blob = model.export().unwrap();
    assert_eq!(blob.file_name, "testdata_01_filtered.csv");

    let parsed = CsvCodec::new(b',').parse(&blob.text).unwrap();
    let reparsed = Dataset::from_columns("back.csv", b',', parsed);
    assert_eq!(reparsed.headers(), model.dataset().headers());

    let expected: Vec<Vec<String>> = model
        .view()
        .sorted
        .iter()
        .map(|&r| model.dataset().record(r).unwrap().to_vec())
        .collect();
    let actual: Vec<Vec<String>> = reparsed.records().map(|r| r.to_vec()).collect();
    assert_eq!(actual, expected);
    assert!(actual.len() > 1);
}
