use super::normalizer::normalize_cell;
use super::{DEFAULT_MIN_COLUMNS, DEFAULT_TABLE_PREFIX};
use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::debug;

/// One data row pulled from a labeled table, cells in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedRow {
    pub table_label: String,
    pub cells: Vec<String>,
}

/// A wanted table: its header row plus every row wide enough to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTable {
    pub label: String,
    pub header: Vec<String>,
    pub rows: Vec<TaggedRow>,
    /// Data rows below the minimum width.
    pub narrow_rows: usize,
}

/// Finds weekly tables by their `title` prefix and slices them into rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableExtractor {
    prefix: String,
    min_columns: usize,
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_PREFIX, DEFAULT_MIN_COLUMNS)
    }
}

impl TableExtractor {
    pub fn new(prefix: impl Into<String>, min_columns: usize) -> Self {
        Self {
            prefix: prefix.into(),
            min_columns,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn min_columns(&self) -> usize {
        self.min_columns
    }

    /// Titles of every table labeled with the prefix, sorted.
    pub fn list_tables(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut labels: Vec<String> = elements_named(document.root_element(), "table")
            .filter_map(|table| {
                let title = table_title(table);
                debug!(title = %title, "found table");
                title.starts_with(self.prefix.as_str()).then_some(title)
            })
            .collect();
        labels.sort();
        labels
    }

    pub fn extract_tables(&self, html: &str, wanted: &[String]) -> Vec<ExtractedTable> {
        let document = Html::parse_document(html);
        elements_named(document.root_element(), "table")
            .filter_map(|table| {
                let label = table_title(table);
                wanted
                    .iter()
                    .any(|week| week == &label)
                    .then(|| self.slice_table(table, label))
            })
            .collect()
    }

    /// Rows of every wanted table, header skipped, narrow rows dropped.
    pub fn extract_rows(&self, html: &str, wanted: &[String]) -> Vec<TaggedRow> {
        self.extract_tables(html, wanted)
            .into_iter()
            .flat_map(|table| table.rows)
            .collect()
    }

    fn slice_table(&self, table: ElementRef<'_>, label: String) -> ExtractedTable {
        let mut rows = elements_named(table, "tr");
        let header = rows
            .next()
            .map(|row| {
                row.descendants()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                    .map(cell_text)
                    .collect()
            })
            .unwrap_or_default();

        let mut kept = Vec::new();
        let mut narrow_rows = 0;
        for row in rows {
            let cells: Vec<String> = elements_named(row, "td").map(cell_text).collect();
            if cells.len() >= self.min_columns {
                kept.push(TaggedRow {
                    table_label: label.clone(),
                    cells,
                });
            } else {
                narrow_rows += 1;
            }
        }

        ExtractedTable {
            label,
            header,
            rows: kept,
            narrow_rows,
        }
    }
}

fn elements_named<'a>(
    root: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |element| element.value().name() == name)
}

fn table_title(table: ElementRef<'_>) -> String {
    table.value().attr("title").unwrap_or_default().trim().to_string()
}

fn cell_text(cell: ElementRef<'_>) -> String {
    normalize_cell(&cell.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: usize, marker: &str) -> String {
        let mut html = String::from("<tr>");
        for index in 0..cells {
            html.push_str(&format!("<td>{marker}-{index}</td>"));
        }
        html.push_str("</tr>");
        html
    }

    fn document() -> String {
        format!(
            "<html><body>\
             <table title=\" WK02 \">{header}{wide}{narrow}</table>\
             <table title=\"Notes\">{wide}</table>\
             <table>{wide}</table>\
             <table title=\"WK01\">{header}{exact}</table>\
             </body></html>",
            header = row(19, "h"),
            wide = row(21, "w"),
            narrow = row(18, "n"),
            exact = row(19, "e"),
        )
    }

    #[test]
    fn lists_only_prefixed_titles_sorted() {
        let extractor = TableExtractor::default();
        assert_eq!(extractor.list_tables(&document()), ["WK01", "WK02"]);
    }

    #[test]
    fn keeps_rows_at_or_above_threshold() {
        let extractor = TableExtractor::default();
        let wanted = vec!["WK01".to_string(), "WK02".to_string()];
        let tables = extractor.extract_tables(&document(), &wanted);

        assert_eq!(tables.len(), 2);
        let wk02 = &tables[0];
        assert_eq!(wk02.label, "WK02");
        assert_eq!(wk02.rows.len(), 1);
        assert_eq!(wk02.narrow_rows, 1);
        assert_eq!(wk02.rows[0].cells.len(), 21);
        assert_eq!(wk02.header[0], "h-0");

        let wk01 = &tables[1];
        assert_eq!(wk01.rows.len(), 1);
        assert_eq!(wk01.rows[0].cells[18], "e-18");
    }

    #[test]
    fn unwanted_tables_contribute_nothing() {
        let extractor = TableExtractor::default();
        let rows = extractor.extract_rows(&document(), &["WK01".to_string()]);
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|row| row.table_label == "WK01"));
        assert!(extractor.extract_rows(&document(), &[]).is_empty());
    }

    #[test]
    fn cell_text_is_cleaned() {
        let html = format!(
            "<table title=\"WK05\"><tr><th>Station</th></tr>\
             <tr><td>x</td><td>\u{feff} DAB5 <b>north</b>\u{200b}</td>{rest}</tr></table>",
            rest = "<td></td>".repeat(17)
        );
        let rows = TableExtractor::default().extract_rows(&html, &["WK05".to_string()]);
        assert_eq!(rows[0].cells[1], "DAB5 north");
    }

    #[test]
    fn custom_prefix_and_width() {
        let extractor = TableExtractor::new("Week", 2);
        let html = format!(
            "<table title=\"Week 7\">{}{}</table>",
            row(2, "h"),
            row(2, "d")
        );
        assert_eq!(extractor.list_tables(&html), ["Week 7"]);
        assert_eq!(extractor.extract_rows(&html, &["Week 7".to_string()]).len(), 1);
    }
}
