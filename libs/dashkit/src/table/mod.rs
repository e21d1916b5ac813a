//! Tabular view of list data: rows, pager controls and CSV export.
//!
//! The table holds no page state of its own. It renders whatever page it is
//! handed and reports page clicks back through a callback.

mod export;
mod render;

pub use export::{export_filename, write_csv, ExportError};
pub use render::{Body, Pager, Rendered};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type RenderFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

pub const NO_DATA: &str = "No data";

pub struct Column<T> {
    /// Field path into the serialized row; dots descend into objects.
    pub key: String,
    pub header: String,
    render: Option<RenderFn<T>>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            header: self.header.clone(),
            render: self.render.clone(),
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("custom_render", &self.render.is_some())
            .finish()
    }
}

impl<T> Column<T> {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            render: None,
        }
    }

    pub fn with_render(mut self, f: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(f));
        self
    }

    /// Cell text: the custom renderer if set, otherwise the raw field.
    fn cell(&self, item: &T, raw: &Value) -> String {
        match &self.render {
            Some(f) => f(item),
            None => field_text(raw, &self.key),
        }
    }
}

/// Text of a field in a serialized row. Null and missing fields are empty.
pub fn field_text(row: &Value, key: &str) -> String {
    let found = key
        .split('.')
        .try_fold(row, |v, part| match v {
            Value::Object(map) => map.get(part),
            Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        });
    match found {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub struct Table<T> {
    columns: Vec<Column<T>>,
    empty_message: String,
}

impl<T: Serialize> Table<T> {
    pub fn new(columns: Vec<Column<T>>) -> Self {
        Self {
            columns,
            empty_message: NO_DATA.to_string(),
        }
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.clone()).collect()
    }

    /// One row per item, one cell per column, in display order.
    pub fn rows(&self, data: &[T]) -> Vec<Vec<String>> {
        data.iter()
            .map(|item| {
                let raw = serde_json::to_value(item).unwrap_or(Value::Null);
                self.columns.iter().map(|c| c.cell(item, &raw)).collect()
            })
            .collect()
    }

    pub fn render(&self, data: &[T], page: u32, page_size: u32, total: u64) -> Rendered {
        let body = if data.is_empty() {
            Body::Empty {
                colspan: self.columns.len().max(1),
                message: self.empty_message.clone(),
            }
        } else {
            Body::Rows(self.rows(data))
        };
        Rendered {
            headers: self.headers(),
            body,
            pager: Pager::new(page, page_size, total),
        }
    }

    /// Write the given rows as CSV to `<dir>/<entity>-export-<date>.csv`.
    pub fn export(&self, data: &[T], dir: &Path, entity: &str, date: NaiveDate) -> Result<PathBuf, ExportError> {
        export::export_to_dir(dir, &export_filename(entity, date), &self.headers(), &self.rows(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Child {
        id: u32,
        name: String,
        group: Option<String>,
        guardian: Value,
    }

    fn kids() -> Vec<Child> {
        vec![
            Child {
                id: 1,
                name: "Ann".into(),
                group: Some("Sunflowers".into()),
                guardian: json!({"name": "Eve", "phone": null}),
            },
            Child {
                id: 2,
                name: "Bob".into(),
                group: None,
                guardian: Value::Null,
            },
        ]
    }

    fn table() -> Table<Child> {
        Table::new(vec![
            Column::new("name", "Name"),
            Column::new("group", "Group"),
            Column::new("guardian.name", "Guardian"),
            Column::new("id", "Id").with_render(|c: &Child| format!("#{}", c.id)),
        ])
    }

    #[test]
    fn field_text_handles_nesting_and_nulls() {
        let row = json!({"a": {"b": [10, {"c": true}]}, "n": null});
        assert_eq!(field_text(&row, "a.b.0"), "10");
        assert_eq!(field_text(&row, "a.b.1.c"), "true");
        assert_eq!(field_text(&row, "n"), "");
        assert_eq!(field_text(&row, "missing.deep"), "");
    }

    #[test]
    fn rows_follow_column_order_with_custom_renderers() {
        let rows = table().rows(&kids());
        assert_eq!(rows[0], vec!["Ann", "Sunflowers", "Eve", "#1"]);
        assert_eq!(rows[1], vec!["Bob", "", "", "#2"]);
    }

    #[test]
    fn empty_data_renders_spanning_row() {
        let r = table().render(&[], 1, 10, 0);
        assert_eq!(
            r.body,
            Body::Empty {
                colspan: 4,
                message: NO_DATA.into()
            }
        );
        assert!(r.pager.prev_disabled);
        assert!(r.pager.next_disabled);
    }
}
