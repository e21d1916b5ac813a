use chrono::NaiveDate;
use dashkit::{Body, Column, Table};
use serde::Serialize;
use tempfile::tempdir;

#[derive(Serialize)]
struct Payment {
    id: u32,
    family: String,
    amount_cents: i64,
    note: Option<String>,
}

fn table() -> Table<Payment> {
    Table::new(vec![
        Column::new("family", "Family"),
        Column::new("amount_cents", "Amount")
            .with_render(|p: &Payment| format!("{}.{:02}", p.amount_cents / 100, p.amount_cents % 100)),
        Column::new("note", "Note"),
    ])
}

fn payments() -> Vec<Payment> {
    vec![
        Payment {
            id: 1,
            family: "Lee".into(),
            amount_cents: 12550,
            note: Some("September, tuition".into()),
        },
        Payment {
            id: 2,
            family: "Novak".into(),
            amount_cents: 9900,
            note: None,
        },
    ]
}

#[test]
fn render_page_with_controls() {
    let r = table().render(&payments(), 1, 10, 25);

    assert_eq!(r.headers, vec!["Family", "Amount", "Note"]);
    assert_eq!(r.rows()[0], vec!["Lee", "125.50", "September, tuition"]);
    assert_eq!(r.rows()[1], vec!["Novak", "99.00", ""]);

    assert_eq!(r.pager.total_pages, 3);
    assert!(r.pager.prev_disabled);
    assert!(!r.pager.next_disabled);

    let mut requested = None;
    r.pager.click_next(|p| requested = Some(p));
    assert_eq!(requested, Some(2));
}

#[test]
fn last_page_disables_next() {
    let r = table().render(&payments(), 3, 10, 25);
    assert!(!r.pager.prev_disabled);
    assert!(r.pager.next_disabled);
}

#[test]
fn empty_page_shows_placeholder() {
    let r = table().with_empty_message("No payments").render(&[], 1, 10, 0);
    assert_eq!(
        r.body,
        Body::Empty {
            colspan: 3,
            message: "No payments".into()
        }
    );
    assert!(r.to_text().contains("No payments"));
}

#[test]
fn export_writes_named_csv_and_leaves_no_temp_files() {
    let dir = tempdir().unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();

    let path = table().export(&payments(), dir.path(), "payments", date).unwrap();

    assert_eq!(path, dir.path().join("payments-export-2025-09-01.csv"));
    let csv = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        csv,
        "Family,Amount,Note\nLee,125.50,\"September, tuition\"\nNovak,99.00,\n"
    );

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn export_creates_missing_directories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("exports").join("finance");
    let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();

    let path = table().export(&[], &nested, "payments", date).unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "Family,Amount,Note\n");
}
