//! Integration tests for uploaded-table validation and the upload flow.

use quotelens_core::chart::{colors, render_scatter_png, PngStyle};
use quotelens_core::upload::{
    can_render_scatter, missing_columns, RequiredColumns, UploadError, UploadFlow, UploadPhase,
    UploadedTable,
};

const TIPS_CSV: &str = "\
total_bill,tip,sex,smoker,day,time,size
16.99,1.01,Female,No,Sun,Dinner,2
10.34,1.66,Male,No,Sun,Dinner,3
21.01,3.5,Male,No,Sun,Dinner,3
23.68,3.31,Male,No,Sun,Dinner,2
24.59,3.61,Female,No,Sun,Dinner,4
25.29,4.71,Male,No,Sun,Dinner,4
";

fn parse(text: &str) -> UploadedTable {
    UploadedTable::from_csv_bytes(text.as_bytes().to_vec()).unwrap()
}

// ── Validator ────────────────────────────────────────────────────────

#[test]
fn table_with_all_three_columns_is_accepted() {
    assert!(can_render_scatter(&parse(TIPS_CSV), &RequiredColumns::tips()));
}

#[test]
fn table_missing_sex_is_rejected() {
    let table = parse("total_bill,tip,day\n16.99,1.01,Sun\n");
    assert!(!can_render_scatter(&table, &RequiredColumns::tips()));
    assert_eq!(missing_columns(&table, &RequiredColumns::tips()), vec!["sex"]);
}

#[test]
fn empty_table_is_rejected() {
    assert!(!can_render_scatter(&UploadedTable::empty(), &RequiredColumns::tips()));
}

#[test]
fn header_only_file_passes_validation() {
    let table = parse("total_bill,tip,sex\n");
    assert_eq!(table.height(), 0);
    assert!(can_render_scatter(&table, &RequiredColumns::tips()));
}

// ── Flow from disk ───────────────────────────────────────────────────

#[test]
fn tips_file_renders_grouped_scatter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tips.csv");
    std::fs::write(&path, TIPS_CSV).unwrap();

    let mut flow = UploadFlow::new();
    let table = UploadedTable::from_csv_path(&path).unwrap();
    let phase = flow.process(table, &RequiredColumns::tips()).unwrap();
    assert_eq!(phase, UploadPhase::Rendered);

    let scatter = flow.scatter().unwrap();
    assert_eq!(scatter.point_count(), 6);
    let female = scatter.groups.iter().find(|g| g.category == "Female").unwrap();
    assert_eq!(female.color, colors::FEMALE);
    assert_eq!(female.points, vec![(16.99, 1.01), (24.59, 3.61)]);

    let style = PngStyle {
        width: 240,
        height: 160,
        margin: 16,
        ..PngStyle::default()
    };
    let artifact = render_scatter_png(scatter, &style, "tips.png").unwrap();
    assert_eq!(artifact.mime, "image/png");
}

#[test]
fn basic_requirement_accepts_file_without_sex() {
    let mut flow = UploadFlow::new();
    let table = parse("total_bill,tip\n16.99,1.01\n10.34,1.66\n");
    let phase = flow.process(table, &RequiredColumns::tips_basic()).unwrap();
    assert_eq!(phase, UploadPhase::Rendered);
    assert_eq!(flow.scatter().unwrap().groups.len(), 1);
}

#[test]
fn rejection_keeps_table_for_preview() {
    let mut flow = UploadFlow::new();
    let table = parse("total_bill,tip\n16.99,1.01\n");
    let phase = flow.process(table, &RequiredColumns::tips()).unwrap();
    assert_eq!(phase, UploadPhase::Rejected);
    assert!(flow.rejection().unwrap().contains("'sex'"));
    assert_eq!(flow.table().unwrap().height(), 1);
}

#[test]
fn unreadable_file_leaves_flow_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    let flow = UploadFlow::new();

    let result = UploadedTable::from_csv_path(&missing);
    assert!(matches!(result, Err(UploadError::Io { .. })));
    assert_eq!(flow.phase(), UploadPhase::NoFile);
}

#[test]
fn late_bad_cell_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tips.csv");
    let mut text = String::from("total_bill,tip,sex\n");
    for _ in 0..150 {
        text.push_str("10.5,1.0,Male\n");
    }
    text.push_str("n/a,2.0,Female\n");
    std::fs::write(&path, text).unwrap();

    let mut flow = UploadFlow::new();
    let table = UploadedTable::from_csv_path(&path).unwrap();
    let phase = flow.process(table, &RequiredColumns::tips()).unwrap();
    assert_eq!(phase, UploadPhase::Rendered);

    let scatter = flow.scatter().unwrap();
    assert_eq!(scatter.point_count(), 150);
    assert_eq!(scatter.skipped_rows, 1);
}

#[test]
fn ragged_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragged.csv");
    std::fs::write(&path, "total_bill,tip\n16.99,1.01,Female,extra\n").unwrap();

    let result = UploadedTable::from_csv_path(&path);
    assert!(matches!(result, Err(UploadError::Parse(_))));
}
