use super::{exec_summary, set_summary, Renderer};
use crate::database::QueryResult;
use crate::error::Result;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

/// Boxed text table, like the mysql client prints.
pub struct TableRenderer;

impl Renderer for TableRenderer {
    fn render(&self, result: &QueryResult) -> Result<String> {
        if !result.is_select {
            return Ok(exec_summary(result));
        }
        if result.rows.is_empty() {
            return Ok(set_summary(result));
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(
            result
                .columns
                .iter()
                .map(|column| Cell::new(column).add_attribute(Attribute::Bold)),
        );
        for row in &result.rows {
            table.add_row(row.iter().map(Cell::new));
        }

        Ok(format!("{}\n{}", table, set_summary(result)))
    }
}
