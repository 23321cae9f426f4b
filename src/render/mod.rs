//! Result rendering.
//!
//! The REPL hands every `QueryResult` to the renderer selected by the
//! current output format; renderers never talk to the database.

mod csv;
mod json;
mod table;

pub use self::csv::CsvRenderer;
pub use self::json::JsonRenderer;
pub use self::table::TableRenderer;

use crate::database::QueryResult;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub trait Renderer: Send + Sync {
    fn render(&self, result: &QueryResult) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn renderer(self) -> Box<dyn Renderer> {
        match self {
            OutputFormat::Table => Box::new(TableRenderer),
            OutputFormat::Csv => Box::new(CsvRenderer),
            OutputFormat::Json => Box::new(JsonRenderer),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::usage(format!(
                "unknown format: {} (available: table, csv, json)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        })
    }
}

fn rows_label(n: usize) -> &'static str {
    if n == 1 {
        "row"
    } else {
        "rows"
    }
}

/// Footer printed under a result set.
pub(crate) fn set_summary(result: &QueryResult) -> String {
    let n = result.rows.len();
    if n == 0 {
        return format!("Empty set ({:.3} sec)", result.duration.as_secs_f64());
    }
    format!(
        "{} {} in set ({:.3} sec)",
        n,
        rows_label(n),
        result.duration.as_secs_f64()
    )
}

/// Summary for statements that do not return rows.
pub(crate) fn exec_summary(result: &QueryResult) -> String {
    let n = result.rows_affected as usize;
    let mut out = format!(
        "Query OK, {} {} affected ({:.3} sec)",
        n,
        rows_label(n),
        result.duration.as_secs_f64()
    );
    if let Some(id) = result.last_insert_id.filter(|id| *id > 0) {
        out.push_str(&format!("\nLast insert id: {}", id));
    }
    out
}
