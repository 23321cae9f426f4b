use super::Dialect;

const MYSQL_KEYWORDS: &[&str] = &[
    // Statements and clauses
    "SELECT", "FROM", "WHERE", "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER",
    "TABLE", "DATABASE", "INDEX", "VIEW", "TRIGGER", "PROCEDURE", "FUNCTION", "ADD",
    "COLUMN", "RENAME", "TO", "TRUNCATE",
    // Data types
    "INT", "INTEGER", "BIGINT", "SMALLINT", "TINYINT", "DECIMAL", "NUMERIC", "FLOAT",
    "DOUBLE", "VARCHAR", "CHAR", "TEXT", "LONGTEXT", "MEDIUMTEXT", "TINYTEXT", "DATE",
    "TIME", "DATETIME", "TIMESTAMP", "YEAR", "BINARY", "VARBINARY", "BLOB", "LONGBLOB",
    "MEDIUMBLOB", "TINYBLOB", "JSON", "GEOMETRY", "BOOLEAN", "BOOL", "ENUM",
    // Constraints and modifiers
    "PRIMARY", "KEY", "FOREIGN", "REFERENCES", "UNIQUE", "CHECK", "NOT", "NULL",
    "DEFAULT", "AUTO_INCREMENT", "UNSIGNED", "ZEROFILL",
    // Query structure
    "DISTINCT", "ALL", "AS", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS",
    "ON", "USING", "UNION", "INTERSECT", "EXCEPT", "ORDER", "BY", "ASC", "DESC", "GROUP",
    "HAVING", "LIMIT", "OFFSET", "INTO", "VALUES", "SET",
    // Conditions and operators
    "AND", "OR", "IN", "EXISTS", "BETWEEN", "LIKE", "REGEXP", "RLIKE", "IS", "ISNULL",
    "ESCAPE", "CASE", "WHEN", "THEN", "ELSE", "END", "TRUE", "FALSE", "IF",
    // Functions
    "COUNT", "SUM", "AVG", "MIN", "MAX", "GROUP_CONCAT", "CONCAT", "SUBSTRING", "LENGTH",
    "CHAR_LENGTH", "UPPER", "LOWER", "TRIM", "REPLACE", "ABS", "CEIL", "FLOOR", "ROUND",
    "MOD", "NOW", "CURDATE", "CURTIME", "MONTH", "DAY", "HOUR", "MINUTE", "SECOND",
    "DATE_ADD", "DATE_SUB", "DATEDIFF", "DATE_FORMAT", "IFNULL", "NULLIF", "COALESCE",
    "CAST", "CONVERT",
    // Administration
    "SHOW", "TABLES", "DATABASES", "COLUMNS", "DESCRIBE", "EXPLAIN", "USE", "GRANT",
    "REVOKE", "FLUSH",
    // Transactions and locking
    "BEGIN", "COMMIT", "ROLLBACK", "SAVEPOINT", "RELEASE", "TRANSACTION", "LOCK",
    "UNLOCK", "ENGINE", "CHARSET", "COLLATE", "TEMPORARY", "CASCADE", "RESTRICT",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlDialect;

impl MysqlDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn keywords(&self) -> &[&'static str] {
        MYSQL_KEYWORDS
    }

    fn tables_query(&self) -> &'static str {
        "SHOW TABLES"
    }

    fn columns_query(&self) -> &'static str {
        "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE, COLUMN_KEY, COLUMN_DEFAULT \
         FROM INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE() \
         ORDER BY ORDINAL_POSITION"
    }

    fn databases_query(&self) -> &'static str {
        "SHOW DATABASES"
    }
}
