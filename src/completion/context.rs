/*!
 * Completion context classification
 *
 * Decides, from the tokens before the cursor, whether the user is typing a
 * table, a column, a database or something else. Heuristic only: there is no
 * grammar behind it.
 */

use super::tokenizer::{significant_tokens, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionContext {
    KeywordOrTable,
    Table,
    Column,
    Database,
}

/// Keywords that are followed by a table name.
const TABLE_KEYWORDS: &[&str] = &[
    "FROM", "JOIN", "UPDATE", "INTO", "TABLE", "DESC", "DESCRIBE", "TRUNCATE", "DROP",
];

/// Keywords that are followed by a column name.
const COLUMN_KEYWORDS: &[&str] = &[
    "SELECT", "WHERE", "AND", "OR", "ON", "SET", "ORDER", "GROUP", "HAVING", "BY", "BETWEEN",
];

fn is_table_keyword(word: &str) -> bool {
    TABLE_KEYWORDS.contains(&word)
}

fn is_column_keyword(word: &str) -> bool {
    COLUMN_KEYWORDS.contains(&word)
}

pub fn detect_context(input: &str) -> CompletionContext {
    let tokens = significant_tokens(input);
    let upper: Vec<String> = tokens.iter().map(Token::upper).collect();

    let Some(last) = upper.last() else {
        return CompletionContext::KeywordOrTable;
    };

    if is_table_keyword(last) {
        return CompletionContext::Table;
    }
    if last == "USE" {
        return CompletionContext::Database;
    }
    if in_select_list(&upper) {
        return CompletionContext::Column;
    }
    if is_column_keyword(last) {
        return CompletionContext::Column;
    }

    // The last token is probably a partial word; look one further back.
    if upper.len() >= 2 {
        let prev = upper[upper.len() - 2].as_str();
        if is_table_keyword(prev) {
            return CompletionContext::Table;
        }
        if prev == "USE" {
            return CompletionContext::Database;
        }
        if is_column_keyword(prev) {
            return CompletionContext::Column;
        }
        if prev == "BY" && upper.len() >= 3 {
            let third = upper[upper.len() - 3].as_str();
            if third == "ORDER" || third == "GROUP" {
                return CompletionContext::Column;
            }
        }
    }

    CompletionContext::KeywordOrTable
}

/// SELECT seen and no FROM anywhere: the cursor sits in the select list.
fn in_select_list(upper: &[String]) -> bool {
    upper.iter().any(|t| t == "SELECT") && !upper.iter().any(|t| t == "FROM")
}

/// Tables referenced after table keywords, backticks stripped, in order.
pub fn table_names_in_input(input: &str) -> Vec<String> {
    let tokens = significant_tokens(input);
    tokens
        .windows(2)
        .filter(|pair| is_table_keyword(&pair[0].upper()) && pair[1].is_word())
        .map(|pair| pair[1].value.trim_matches('`').to_string())
        .collect()
}
