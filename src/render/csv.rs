use super::{exec_summary, set_summary, Renderer};
use crate::database::QueryResult;
use crate::error::{Error, Result};

/// Header row plus one record per row. NULL is written literally.
pub struct CsvRenderer;

impl Renderer for CsvRenderer {
    fn render(&self, result: &QueryResult) -> Result<String> {
        if !result.is_select {
            return Ok(exec_summary(result));
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&result.columns)?;
        for row in &result.rows {
            writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;

        Ok(format!(
            "{}\n{}",
            String::from_utf8_lossy(&bytes),
            set_summary(result)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::CellValue;

    #[test]
    fn quotes_fields_that_need_it() {
        let result = QueryResult::listing(
            &["id", "note"],
            vec![
                vec![CellValue::Int(1), "a, b".into()],
                vec![CellValue::UInt(2), CellValue::Null],
            ],
        );
        assert_eq!(
            CsvRenderer.render(&result).unwrap(),
            "id,note\n1,\"a, b\"\n2,NULL\n\n2 rows in set (0.000 sec)"
        );
    }
}
