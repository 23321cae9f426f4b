use super::{ColumnInfo, Dialect, MetadataProvider, MysqlConnector};
use crate::error::Result;
use mysql::prelude::*;
use std::sync::Arc;

/// Reads schema metadata over the shared MySQL session using the dialect's
/// introspection queries.
pub struct MysqlMetadataProvider {
    connector: Arc<MysqlConnector>,
    dialect: Arc<dyn Dialect>,
}

impl MysqlMetadataProvider {
    pub fn new(connector: Arc<MysqlConnector>, dialect: Arc<dyn Dialect>) -> Self {
        Self { connector, dialect }
    }
}

impl MetadataProvider for MysqlMetadataProvider {
    fn list_tables(&self) -> Result<Vec<String>> {
        let query = self.dialect.tables_query();
        self.connector
            .with_conn(|conn| Ok(conn.query::<String, _>(query)?))
    }

    fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let query = self.dialect.columns_query();
        self.connector.with_conn(|conn| {
            let rows: Vec<(String, String, String, String, Option<String>)> =
                conn.exec(query, (table,))?;
            Ok(rows
                .into_iter()
                .map(|(name, data_type, nullable, key, default_value)| ColumnInfo {
                    is_nullable: nullable.eq_ignore_ascii_case("YES"),
                    is_primary_key: key == "PRI",
                    default_value,
                    ..ColumnInfo::new(name, data_type)
                })
                .collect())
        })
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        let query = self.dialect.databases_query();
        self.connector
            .with_conn(|conn| Ok(conn.query::<String, _>(query)?))
    }
}
