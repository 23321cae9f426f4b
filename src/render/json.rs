use super::{exec_summary, set_summary, Renderer};
use crate::database::{CellValue, QueryResult};
use crate::error::Result;
use serde_json::{Map, Number, Value};

/// Pretty-printed array of objects keyed by column name.
pub struct JsonRenderer;

fn to_json(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Int(i) => Value::from(*i),
        CellValue::UInt(u) => Value::from(*u),
        CellValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        CellValue::Text(s) => Value::String(s.clone()),
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, result: &QueryResult) -> Result<String> {
        if !result.is_select {
            return Ok(exec_summary(result));
        }

        let records: Vec<Map<String, Value>> = result
            .rows
            .iter()
            .map(|row| {
                result
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(to_json))
                    .collect()
            })
            .collect();

        Ok(format!(
            "{}\n\n{}",
            serde_json::to_string_pretty(&records)?,
            set_summary(result)
        ))
    }
}
