use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::schema::Table;

/// Pixel geometry for table nodes and group frames.
///
/// Widths are a monospace character-count heuristic, so sizing does not
/// depend on the renderer's fonts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphMetrics {
    pub header_height: f64,
    pub column_height: f64,
    pub char_width: f64,
    pub padding: f64,
    pub min_width: f64,
    pub group_padding: f64,
    pub group_header_height: f64,
}

impl Default for GraphMetrics {
    fn default() -> Self {
        Self {
            header_height: 40.0,
            column_height: 28.0,
            char_width: 8.0,
            padding: 16.0,
            min_width: 200.0,
            group_padding: 20.0,
            group_header_height: 32.0,
        }
    }
}

impl GraphMetrics {
    /// Display columns of `text`; wide (CJK) characters count double.
    pub fn char_count(&self, text: &str) -> usize {
        UnicodeWidthStr::width(text)
    }

    /// Vertical offset of the `index`-th column row inside its node.
    pub fn column_offset(&self, index: usize) -> f64 {
        self.header_height + index as f64 * self.column_height
    }

    pub fn node_size(&self, table: &Table) -> (f64, f64) {
        let longest = table
            .columns
            .iter()
            .map(|c| self.char_count(&c.name) + self.char_count(c.display_type()) + 3)
            .fold(self.char_count(&table.name), usize::max);

        let width = (longest as f64 * self.char_width + self.padding * 2.0).max(self.min_width);
        let height = self.column_offset(table.columns.len()) + self.padding;

        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};

    fn table(name: &str, columns: &[(&str, &str)]) -> Table {
        Table {
            name: name.into(),
            columns: columns
                .iter()
                .map(|(n, t)| {
                    let mut c = Column::new(*n, ColumnType::from_type_name(t));
                    c.raw_type = Some(t.to_string());
                    c
                })
                .collect(),
            ..Table::default()
        }
    }

    #[test]
    fn test_ascii_width() {
        let m = GraphMetrics::default();
        assert_eq!(m.char_count("users"), 5);
    }

    #[test]
    fn test_wide_chars_count_double() {
        let m = GraphMetrics::default();
        assert_eq!(m.char_count("ユーザー"), 8);
    }

    #[test]
    fn test_small_table_uses_min_width() {
        let m = GraphMetrics::default();
        let (w, h) = m.node_size(&table("users", &[("id", "int")]));
        assert_eq!(w, 200.0);
        assert_eq!(h, 40.0 + 28.0 + 16.0);
    }

    #[test]
    fn test_long_column_widens_node() {
        let m = GraphMetrics::default();
        let t = table("t", &[("a_really_long_column_name", "timestamp")]);
        let (w, _) = m.node_size(&t);
        // 25 + 9 + 3 = 37 characters
        assert_eq!(w, 37.0 * 8.0 + 32.0);
    }

    #[test]
    fn test_empty_table_height() {
        let m = GraphMetrics::default();
        let (_, h) = m.node_size(&table("empty", &[]));
        assert_eq!(h, 56.0);
    }
}
