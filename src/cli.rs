use crate::completion::{CompletionEngine, MetadataCache, SqlHelper, SqlHighlighter};
use crate::config::Config;
use crate::database::{Connector, Dialect, MysqlConnector, MysqlDialect, MysqlMetadataProvider};
use crate::error::Result;
use crate::input::InputEvent;
use crate::placeholder::ParamSource;
use crate::session::{Flow, Session};
use rustyline::error::ReadlineError;
use rustyline::{history::DefaultHistory, CompletionType, Config as EditorConfig, EditMode, Editor};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type SqlEditor = Editor<SqlHelper, DefaultHistory>;

pub struct Cli {
    connector: Arc<MysqlConnector>,
    editor: SqlEditor,
    session: Session,
    history_file: PathBuf,
    runtime: Handle,
    cancel: CancellationToken,
}

impl Cli {
    pub fn new(
        config: &Config,
        connector: Arc<MysqlConnector>,
        runtime: Handle,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let dialect = Arc::new(MysqlDialect::new());
        let provider = Arc::new(MysqlMetadataProvider::new(connector.clone(), dialect.clone()));
        let cache = Arc::new(MetadataCache::new(provider, config.cache_ttl));
        debug!(dialect = dialect.name(), ttl = ?cache.ttl(), "metadata cache ready");

        let engine = CompletionEngine::new(
            cache.clone(),
            dialect.clone(),
            runtime.clone(),
            config.timeouts.completion,
        );
        let helper = SqlHelper::new(engine, SqlHighlighter::new(dialect.as_ref()));

        let editor_config = EditorConfig::builder()
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .auto_add_history(false)
            .build();
        let mut editor = SqlEditor::with_config(editor_config)?;
        editor.set_helper(Some(helper));

        let session = Session::new(
            connector.clone() as Arc<dyn Connector>,
            cache,
            runtime.clone(),
            config.timeouts,
            cancel.clone(),
        );

        Ok(Self {
            connector,
            editor,
            session,
            history_file: config.history_file.clone(),
            runtime,
            cancel,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        self.print_banner();
        self.load_history();
        self.session.spawn_preload();
        self.watch_interrupt();

        let outcome = self.read_loop();
        self.shutdown();
        outcome
    }

    fn read_loop(&mut self) -> Result<()> {
        loop {
            if self.session.is_cancelled() {
                info!("interrupted, leaving the read loop");
                return Ok(());
            }

            let prompt = self.session.prompt();
            let event = match self.editor.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.editor.add_history_entry(line.as_str())?;
                    }
                    InputEvent::Line(line)
                }
                Err(ReadlineError::Interrupted) => InputEvent::Interrupt,
                Err(ReadlineError::Eof) => InputEvent::Eof,
                Err(err) => return Err(err.into()),
            };

            let mut params = EditorParams {
                editor: &mut self.editor,
            };
            let flow =
                self.session
                    .handle(event, &mut params, &mut io::stdout(), &mut io::stderr())?;
            if flow == Flow::Exit {
                return Ok(());
            }
        }
    }

    fn print_banner(&self) {
        println!("Welcome to sqcl - Terminal SQL Client");
        println!("Connection id: {}", self.connector.connection_id());
        println!("Server version: {}", self.connector.server_version());
        println!();
        println!("Type :help for help, :quit to exit");
        println!();
    }

    fn load_history(&mut self) {
        if let Err(e) = self.editor.load_history(&self.history_file) {
            debug!(path = %self.history_file.display(), error = %e, "no history loaded");
        }
    }

    fn save_history(&mut self) {
        if let Some(parent) = self.history_file.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(error = %e, "could not create history directory");
                return;
            }
        }
        if let Err(e) = self.editor.save_history(&self.history_file) {
            warn!(path = %self.history_file.display(), error = %e, "could not save history");
        }
    }

    /// Cancel everything on SIGINT. While the editor owns the terminal,
    /// Ctrl+C arrives as a key press instead and only clears the input.
    fn watch_interrupt(&self) {
        let cancel = self.cancel.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => {
                        info!("interrupt signal received");
                        cancel.cancel();
                    }
                    Err(e) => warn!(error = %e, "cannot listen for interrupts"),
                },
            }
        });
    }

    fn shutdown(&mut self) {
        self.save_history();
        self.session.close();
        debug!("session closed");
    }
}

/// Prompts for placeholder values on the terminal.
struct EditorParams<'a> {
    editor: &'a mut SqlEditor,
}

impl ParamSource for EditorParams<'_> {
    fn read_value(&mut self, index: usize) -> Result<Option<String>> {
        match self.editor.readline(&format!("  [{}]> ", index)) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
