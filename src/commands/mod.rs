//! Internal `:` commands and SQL statement execution.

pub mod query;

pub use query::QueryExecutor;

use crate::completion::MetadataCache;
use crate::config::Timeouts;
use crate::database::{lookup_database, run_blocking, CellValue, Connector, QueryResult};
use crate::error::{Error, Result};
use crate::render::OutputFormat;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::time::Instant;

const HELP: &str = "\
Available commands:
  :help, :h, :?            Show this help message
  :quit, :q, :exit         Exit the client
  :reload, :refresh        Reload metadata cache
  :tables                  List all tables
  :columns, :cols <table>  Show columns for a table
  :databases, :dbs         List all databases
  :status                  Show connection status
  :format, :fmt [name]     Show or set output format (table, csv, json)

SQL statements must end with a semicolon (;)
Use ? for positional parameters; values are prompted for
Use TAB for auto-completion
Use Ctrl+C to cancel current input, Ctrl+D to exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalCommand {
    Help,
    Quit,
    Reload,
    Tables,
    Columns(String),
    Databases,
    Status,
    Format(Option<OutputFormat>),
}

impl InternalCommand {
    /// Resolve a parsed `:name args` line. Aliases map onto one variant.
    pub fn parse(name: &str, args: &[String]) -> Result<Self> {
        let command = match name {
            "help" | "h" | "?" => InternalCommand::Help,
            "quit" | "q" | "exit" => InternalCommand::Quit,
            "reload" | "refresh" => InternalCommand::Reload,
            "tables" => InternalCommand::Tables,
            "columns" | "cols" => match args.first() {
                Some(table) => InternalCommand::Columns(table.clone()),
                None => return Err(Error::usage("usage: :columns <table_name>")),
            },
            "databases" | "dbs" => InternalCommand::Databases,
            "status" => InternalCommand::Status,
            "format" | "fmt" => {
                InternalCommand::Format(args.first().map(|f| f.parse()).transpose()?)
            }
            "" => {
                return Err(Error::usage(
                    "missing command name (type :help for available commands)",
                ))
            }
            other => {
                return Err(Error::usage(format!(
                    "unknown command: {} (type :help for available commands)",
                    other
                )))
            }
        };
        Ok(command)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub quit: bool,
}

impl CommandOutput {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

pub struct CommandHandler {
    connector: Arc<dyn Connector>,
    cache: Arc<MetadataCache>,
    runtime: Handle,
    timeouts: Timeouts,
    format: OutputFormat,
}

impl CommandHandler {
    pub fn new(
        connector: Arc<dyn Connector>,
        cache: Arc<MetadataCache>,
        runtime: Handle,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            connector,
            cache,
            runtime,
            timeouts,
            format: OutputFormat::default(),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn execute(&mut self, command: InternalCommand) -> Result<CommandOutput> {
        match command {
            InternalCommand::Help => Ok(CommandOutput::text(HELP)),
            InternalCommand::Quit => Ok(CommandOutput {
                text: String::new(),
                quit: true,
            }),
            InternalCommand::Reload => {
                self.runtime.block_on(self.cache.reload());
                Ok(CommandOutput::text("Metadata cache reloaded"))
            }
            InternalCommand::Tables => self.tables(),
            InternalCommand::Columns(table) => self.columns(&table),
            InternalCommand::Databases => self.databases(),
            InternalCommand::Status => Ok(CommandOutput::text(self.status())),
            InternalCommand::Format(None) => Ok(CommandOutput::text(format!(
                "Current format: {}",
                self.format
            ))),
            InternalCommand::Format(Some(format)) => {
                self.format = format;
                Ok(CommandOutput::text(format!("Output format set to {}", format)))
            }
        }
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.timeouts.metadata
    }

    fn render(&self, result: &QueryResult) -> Result<CommandOutput> {
        Ok(CommandOutput::text(self.format.renderer().render(result)?))
    }

    fn tables(&self) -> Result<CommandOutput> {
        let tables = self.runtime.block_on(self.cache.tables(self.deadline()))?;
        if tables.is_empty() {
            return Ok(CommandOutput::text("No tables found"));
        }
        self.render(&single_column("Table", &tables))
    }

    fn databases(&self) -> Result<CommandOutput> {
        let databases = self.runtime.block_on(self.cache.databases(self.deadline()))?;
        if databases.is_empty() {
            return Ok(CommandOutput::text("No databases found"));
        }
        self.render(&single_column("Database", &databases))
    }

    fn columns(&self, table: &str) -> Result<CommandOutput> {
        let columns = self
            .runtime
            .block_on(self.cache.columns(table, self.deadline()))?;
        if columns.is_empty() {
            return Ok(CommandOutput::text(format!(
                "No columns found for table '{}'",
                table
            )));
        }

        let rows = columns
            .iter()
            .map(|col| {
                vec![
                    col.name.as_str().into(),
                    col.data_type.as_str().into(),
                    if col.is_nullable { "YES" } else { "NO" }.into(),
                    if col.is_primary_key { "PRI" } else { "" }.into(),
                    col.default_value
                        .clone()
                        .map_or(CellValue::Null, CellValue::Text),
                ]
            })
            .collect();
        self.render(&QueryResult::listing(
            &["Column", "Type", "Nullable", "Key", "Default"],
            rows,
        ))
    }

    fn status(&self) -> String {
        let connector = self.connector.clone();
        let ping = self
            .runtime
            .block_on(run_blocking(self.timeouts.ping, move || connector.ping()));
        let status = match ping {
            Ok(()) => "Connected".to_string(),
            Err(e) => format!("Disconnected ({})", e),
        };
        let database = self
            .runtime
            .block_on(lookup_database(self.connector.clone(), self.timeouts.prompt))
            .unwrap_or_else(|| "(none)".to_string());
        format!(
            "Connection Status: {}\nCurrent database:  {}",
            status, database
        )
    }
}

fn single_column(header: &str, values: &[String]) -> QueryResult {
    QueryResult::listing(
        &[header],
        values.iter().map(|v| vec![v.as_str().into()]).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::metadata::tests::FakeProvider;
    use crate::database::tests::FakeConnector;
    use crate::database::{ColumnInfo, MetadataProvider};
    use rstest::rstest;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    struct Fixture {
        _runtime: tokio::runtime::Runtime,
        provider: Arc<FakeProvider>,
        handler: CommandHandler,
    }

    fn fixture(provider: FakeProvider, connector: FakeConnector) -> Fixture {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let provider = Arc::new(provider);
        let cache = Arc::new(MetadataCache::new(
            provider.clone() as Arc<dyn MetadataProvider>,
            Duration::from_secs(60),
        ));
        let handler = CommandHandler::new(
            Arc::new(connector),
            cache,
            runtime.handle().clone(),
            Timeouts::default(),
        );
        Fixture {
            _runtime: runtime,
            provider,
            handler,
        }
    }

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[rstest]
    #[case("help", &[], InternalCommand::Help)]
    #[case("?", &[], InternalCommand::Help)]
    #[case("q", &[], InternalCommand::Quit)]
    #[case("exit", &[], InternalCommand::Quit)]
    #[case("refresh", &[], InternalCommand::Reload)]
    #[case("tables", &[], InternalCommand::Tables)]
    #[case("cols", &["users"], InternalCommand::Columns("users".into()))]
    #[case("dbs", &[], InternalCommand::Databases)]
    #[case("status", &[], InternalCommand::Status)]
    #[case("fmt", &[], InternalCommand::Format(None))]
    #[case("format", &["CSV"], InternalCommand::Format(Some(OutputFormat::Csv)))]
    fn parses_aliases(
        #[case] name: &str,
        #[case] raw_args: &[&str],
        #[case] expected: InternalCommand,
    ) {
        assert_eq!(InternalCommand::parse(name, &args(raw_args)).unwrap(), expected);
    }

    #[rstest]
    #[case("columns", &[], "usage: :columns <table_name>")]
    #[case("format", &["xml"], "unknown format: xml")]
    #[case("frobnicate", &[], "unknown command: frobnicate")]
    #[case("", &[], "missing command name")]
    fn rejects_malformed_commands(
        #[case] name: &str,
        #[case] raw_args: &[&str],
        #[case] message: &str,
    ) {
        let err = InternalCommand::parse(name, &args(raw_args)).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert!(err.to_string().starts_with(message), "{}", err);
    }

    #[test]
    fn quit_sets_the_flag() {
        let mut f = fixture(FakeProvider::default(), FakeConnector::default());
        let out = f.handler.execute(InternalCommand::Quit).unwrap();
        assert!(out.quit);
    }

    #[test]
    fn tables_lists_cached_names() {
        let mut f = fixture(
            FakeProvider::with_schema(&[("users", &["id"]), ("orders", &["id"])]),
            FakeConnector::default(),
        );
        f.handler
            .execute(InternalCommand::Format(Some(OutputFormat::Csv)))
            .unwrap();
        let out = f.handler.execute(InternalCommand::Tables).unwrap();
        assert_eq!(out.text, "Table\nusers\norders\n\n2 rows in set (0.000 sec)");
    }

    #[test]
    fn empty_listings_say_so() {
        let mut f = fixture(FakeProvider::default(), FakeConnector::default());
        assert_eq!(f.handler.execute(InternalCommand::Tables).unwrap().text, "No tables found");
        assert_eq!(
            f.handler.execute(InternalCommand::Databases).unwrap().text,
            "No databases found"
        );
        assert_eq!(
            f.handler
                .execute(InternalCommand::Columns("ghost".into()))
                .unwrap()
                .text,
            "No columns found for table 'ghost'"
        );
    }

    #[test]
    fn columns_describe_keys_and_defaults() {
        let provider = FakeProvider::default();
        provider.columns.lock().unwrap().insert(
            "users".to_string(),
            vec![
                ColumnInfo {
                    is_nullable: false,
                    is_primary_key: true,
                    ..ColumnInfo::new("id", "int")
                },
                ColumnInfo {
                    default_value: Some("guest".to_string()),
                    ..ColumnInfo::new("name", "varchar(20)")
                },
            ],
        );
        let mut f = fixture(provider, FakeConnector::default());
        f.handler
            .execute(InternalCommand::Format(Some(OutputFormat::Csv)))
            .unwrap();
        let out = f
            .handler
            .execute(InternalCommand::Columns("users".into()))
            .unwrap();
        assert_eq!(
            out.text,
            "Column,Type,Nullable,Key,Default\nid,int,NO,PRI,NULL\nname,varchar(20),YES,,guest\n\n2 rows in set (0.000 sec)"
        );
    }

    #[test]
    fn metadata_failures_are_reported() {
        let mut f = fixture(
            FakeProvider {
                fail_all: true,
                ..Default::default()
            },
            FakeConnector::default(),
        );
        let err = f.handler.execute(InternalCommand::Tables).unwrap_err();
        assert!(err.to_string().starts_with("failed to fetch tables"), "{}", err);
    }

    #[test]
    fn reload_forces_refetch() {
        let mut f = fixture(
            FakeProvider::with_schema(&[("users", &["id"])]),
            FakeConnector::default(),
        );
        f.handler.execute(InternalCommand::Tables).unwrap();
        f.handler.execute(InternalCommand::Tables).unwrap();
        assert_eq!(f.provider.table_calls.load(Ordering::SeqCst), 1);

        let out = f.handler.execute(InternalCommand::Reload).unwrap();
        assert_eq!(out.text, "Metadata cache reloaded");
        f.handler.execute(InternalCommand::Tables).unwrap();
        assert_eq!(f.provider.table_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn format_reports_and_switches() {
        let mut f = fixture(FakeProvider::default(), FakeConnector::default());
        assert_eq!(
            f.handler.execute(InternalCommand::Format(None)).unwrap().text,
            "Current format: table"
        );
        f.handler
            .execute(InternalCommand::Format(Some(OutputFormat::Json)))
            .unwrap();
        assert_eq!(f.handler.format(), OutputFormat::Json);
    }

    #[rstest]
    #[case(false, "Connection Status: Connected\nCurrent database:  shop")]
    #[case(true, "Connection Status: Disconnected (not connected to a database)\nCurrent database:  (none)")]
    fn status_reports_reachability(#[case] offline: bool, #[case] expected: &str) {
        let connector = FakeConnector {
            offline,
            ..Default::default()
        };
        *connector.database.lock().unwrap() = Some("shop".to_string());
        let mut f = fixture(FakeProvider::default(), connector);
        assert_eq!(f.handler.execute(InternalCommand::Status).unwrap().text, expected);
    }
}
