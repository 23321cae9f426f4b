//! Positional `?` parameters.

use crate::database::CellValue;
use crate::error::Result;
use std::io::Write;

/// Count `?` markers outside quoted runs. A backslash escapes the next byte.
pub fn count_placeholders(query: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in query.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => escaped = true,
            ('\'' | '"' | '`', None) => quote = Some(c),
            (c, Some(open)) if c == open => quote = None,
            ('?', None) => count += 1,
            _ => {}
        }
    }

    count
}

/// Interpret one typed parameter value.
pub fn parse_value(input: &str) -> CellValue {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("NULL") {
        return CellValue::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return CellValue::Float(f);
    }
    CellValue::Text(trimmed.to_string())
}

/// Where placeholder values come from.
pub trait ParamSource {
    /// Read the value for placeholder `index` (1-based). `None` cancels.
    fn read_value(&mut self, index: usize) -> Result<Option<String>>;
}

/// Ask `source` for `count` values. Returns `None` when the user cancels.
pub fn prompt_for_values(
    source: &mut dyn ParamSource,
    count: usize,
    query: &str,
    out: &mut dyn Write,
) -> Result<Option<Vec<CellValue>>> {
    writeln!(out)?;
    writeln!(out, "Query: {}", query)?;
    writeln!(out, "Enter values for {} placeholder(s):", count)?;
    writeln!(out, "  (Press Enter for NULL, Ctrl+C to cancel)")?;
    writeln!(out)?;

    let mut values = Vec::with_capacity(count);
    for index in 1..=count {
        match source.read_value(index)? {
            Some(line) => values.push(parse_value(&line)),
            None => {
                writeln!(out)?;
                return Ok(None);
            }
        }
    }
    writeln!(out)?;
    Ok(Some(values))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::VecDeque;

    /// Replays canned answers; runs dry as a cancel.
    #[derive(Default)]
    pub(crate) struct Scripted(pub VecDeque<String>);

    impl ParamSource for Scripted {
        fn read_value(&mut self, _index: usize) -> Result<Option<String>> {
            Ok(self.0.pop_front())
        }
    }

    #[rstest]
    #[case("SELECT 1", 0)]
    #[case("SELECT * FROM t WHERE id = ?", 1)]
    #[case("INSERT INTO t VALUES (?, ?, ?)", 3)]
    #[case("SELECT '?' FROM t WHERE a = ?", 1)]
    #[case("SELECT \"?\", `?` FROM t WHERE a = ?", 1)]
    #[case("SELECT 'it\\'s ?' FROM t WHERE a = ?", 1)]
    #[case("SELECT \"it's\" WHERE a = ?", 1)]
    #[case("SELECT 'unterminated ?", 0)]
    #[case("SELECT \\? FROM t", 0)]
    fn counts_placeholders_outside_quotes(#[case] query: &str, #[case] expected: usize) {
        assert_eq!(count_placeholders(query), expected);
    }

    #[rstest]
    #[case("", CellValue::Null)]
    #[case("  null ", CellValue::Null)]
    #[case("NULL", CellValue::Null)]
    #[case("42", CellValue::Int(42))]
    #[case("-7", CellValue::Int(-7))]
    #[case("3.25", CellValue::Float(3.25))]
    #[case(" hello ", CellValue::Text("hello".into()))]
    #[case("12abc", CellValue::Text("12abc".into()))]
    fn parses_values(#[case] input: &str, #[case] expected: CellValue) {
        assert_eq!(parse_value(input), expected);
    }

    #[test]
    fn collects_one_value_per_placeholder() {
        let mut source = Scripted(["1".to_string(), "bob".to_string()].into());
        let mut out = Vec::new();
        let values = prompt_for_values(&mut source, 2, "SELECT ?, ?", &mut out).unwrap();
        assert_eq!(values, Some(vec![CellValue::Int(1), "bob".into()]));
        assert!(String::from_utf8(out).unwrap().contains("Enter values for 2 placeholder(s):"));
    }

    #[test]
    fn cancel_stops_prompting() {
        let mut source = Scripted(["1".to_string()].into());
        let mut out = Vec::new();
        let values = prompt_for_values(&mut source, 2, "SELECT ?, ?", &mut out).unwrap();
        assert_eq!(values, None);
    }
}
