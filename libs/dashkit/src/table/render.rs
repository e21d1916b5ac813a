use dashkit_core::{page_window, total_pages};
use std::fmt::Write as _;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Rows(Vec<Vec<String>>),
    /// Single placeholder row spanning every column.
    Empty { colspan: usize, message: String },
}

/// Previous/next controls for the current page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pager {
    pub page: u32,
    pub total_pages: u32,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    /// Page numbers to show; `None` is a gap.
    pub window: Vec<Option<u32>>,
}

impl Pager {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let pages = total_pages(total, page_size);
        Self {
            page,
            total_pages: pages,
            prev_disabled: page <= 1,
            next_disabled: page >= pages,
            window: page_window(pages, page, 1, 2, 2),
        }
    }

    /// Emit `page - 1` unless the control is disabled. Returns whether it fired.
    pub fn click_prev(&self, on_page_change: impl FnOnce(u32)) -> bool {
        if self.prev_disabled {
            return false;
        }
        on_page_change(self.page - 1);
        true
    }

    /// Emit `page + 1` unless the control is disabled. Returns whether it fired.
    pub fn click_next(&self, on_page_change: impl FnOnce(u32)) -> bool {
        if self.next_disabled {
            return false;
        }
        on_page_change(self.page + 1);
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub headers: Vec<String>,
    pub body: Body,
    pub pager: Pager,
}

impl Rendered {
    pub fn rows(&self) -> &[Vec<String>] {
        match &self.body {
            Body::Rows(rows) => rows,
            Body::Empty { .. } => &[],
        }
    }

    /// Column-aligned plain text with a pager footer.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in self.rows() {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);

        match &self.body {
            Body::Rows(rows) => rows.iter().for_each(|r| push_line(&mut out, r, &widths)),
            Body::Empty { message, .. } => {
                out.push_str(message);
                out.push('\n');
            }
        }

        let nav: Vec<String> = self
            .pager
            .window
            .iter()
            .map(|p| match p {
                Some(n) if *n == self.pager.page => format!("[{n}]"),
                Some(n) => n.to_string(),
                None => "…".to_string(),
            })
            .collect();
        let _ = writeln!(
            out,
            "\n{} {} {}   page {} of {}",
            if self.pager.prev_disabled { " " } else { "<" },
            nav.join(" "),
            if self.pager.next_disabled { " " } else { ">" },
            self.pager.page,
            self.pager.total_pages
        );
        out
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pager_bounds() {
        let first = Pager::new(1, 10, 25);
        assert_eq!(first.total_pages, 3);
        assert!(first.prev_disabled);
        assert!(!first.next_disabled);

        let last = Pager::new(3, 10, 25);
        assert!(!last.prev_disabled);
        assert!(last.next_disabled);

        let single = Pager::new(1, 10, 0);
        assert_eq!(single.total_pages, 1);
        assert!(single.prev_disabled && single.next_disabled);
    }

    #[test]
    fn pager_survives_huge_totals() {
        let p = Pager::new(1, 1, 5_000_000_000);
        assert_eq!(p.total_pages, u32::MAX);
        assert!(!p.next_disabled);
        assert_eq!(p.window.last(), Some(&Some(u32::MAX)));
    }

    #[test]
    fn clicks_emit_neighbour_pages_only_when_enabled() {
        let p = Pager::new(2, 10, 25);
        let mut got = Vec::new();
        assert!(p.click_prev(|n| got.push(n)));
        assert!(p.click_next(|n| got.push(n)));
        assert_eq!(got, vec![1, 3]);

        let p = Pager::new(1, 10, 5);
        assert!(!p.click_prev(|_| panic!("prev is disabled")));
        assert!(!p.click_next(|_| panic!("next is disabled")));
    }

    #[test]
    fn text_rendering_aligns_columns() {
        let r = Rendered {
            headers: vec!["Name".into(), "Group".into()],
            body: Body::Rows(vec![vec!["Annabel".into(), "A".into()], vec!["Bo".into(), "".into()]]),
            pager: Pager::new(1, 10, 2),
        };
        let text = r.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name     Group");
        assert_eq!(lines[1], "-------  -----");
        assert_eq!(lines[2], "Annabel  A");
        assert_eq!(lines[3], "Bo");
        assert!(text.contains("page 1 of 1"));
    }
}
