//! The REPL orchestrator, minus the terminal.
//!
//! `Session` turns input events into commands, statements and output. The
//! line editor lives in `cli`; everything here can be driven from tests.

use crate::commands::query::changes_schema;
use crate::commands::{CommandHandler, InternalCommand, QueryExecutor};
use crate::completion::MetadataCache;
use crate::config::Timeouts;
use crate::database::{lookup_database, Connector};
use crate::error::{Error, Result};
use crate::input::{Action, InputEvent, InputMachine, ReplState};
use crate::placeholder::{count_placeholders, prompt_for_values, ParamSource};
use std::io::Write;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const CONTINUATION_PROMPT: &str = "   -> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Session {
    connector: Arc<dyn Connector>,
    cache: Arc<MetadataCache>,
    runtime: Handle,
    timeouts: Timeouts,
    cancel: CancellationToken,
    machine: InputMachine,
    commands: CommandHandler,
    executor: QueryExecutor,
}

impl Session {
    pub fn new(
        connector: Arc<dyn Connector>,
        cache: Arc<MetadataCache>,
        runtime: Handle,
        timeouts: Timeouts,
        cancel: CancellationToken,
    ) -> Self {
        let commands = CommandHandler::new(
            connector.clone(),
            cache.clone(),
            runtime.clone(),
            timeouts,
        );
        let executor = QueryExecutor::new(
            connector.clone(),
            runtime.clone(),
            timeouts.query,
            cancel.clone(),
        );
        Self {
            connector,
            cache,
            runtime,
            timeouts,
            cancel,
            machine: InputMachine::new(),
            commands,
            executor,
        }
    }

    pub fn state(&self) -> ReplState {
        self.machine.state()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn prompt(&self) -> String {
        if self.state() == ReplState::Accumulating {
            return CONTINUATION_PROMPT.to_string();
        }
        let database = self
            .runtime
            .block_on(lookup_database(self.connector.clone(), self.timeouts.prompt));
        match database {
            Some(name) => format!("sqcl({})> ", name),
            None => "sqcl> ".to_string(),
        }
    }

    /// Warm the table list in the background. Failures are dropped.
    pub fn spawn_preload(&self) -> JoinHandle<()> {
        let cache = self.cache.clone();
        let cancel = self.cancel.clone();
        let deadline = Instant::now() + self.timeouts.preload;
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => debug!("table preload cancelled"),
                tables = cache.tables(deadline) => match tables {
                    Ok(tables) => debug!(count = tables.len(), "preloaded table names"),
                    Err(e) => debug!(error = %e, "table preload failed"),
                },
            }
        })
    }

    /// Feed one input event. Errors from commands and statements are written
    /// to `err`; only failures to write output are returned.
    pub fn handle(
        &mut self,
        event: InputEvent,
        params: &mut dyn ParamSource,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Flow> {
        match self.machine.feed(event) {
            Action::None => Ok(Flow::Continue),
            Action::Cancelled => {
                writeln!(out, "Query cancelled")?;
                Ok(Flow::Continue)
            }
            Action::Exit => {
                writeln!(out, "Bye")?;
                Ok(Flow::Exit)
            }
            Action::Command(name, args) => self.run_command(&name, &args, out, err),
            Action::Execute(sql) => self.run_statement(&sql, params, out, err),
        }
    }

    fn run_command(
        &mut self,
        name: &str,
        args: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Flow> {
        let result = InternalCommand::parse(name, args)
            .and_then(|command| self.commands.execute(command));
        match result {
            Ok(output) => {
                if !output.text.is_empty() {
                    writeln!(out, "{}", output.text)?;
                }
                if output.quit {
                    writeln!(out, "Bye")?;
                    return Ok(Flow::Exit);
                }
            }
            Err(e) => writeln!(err, "Error: {}", e)?,
        }
        Ok(Flow::Continue)
    }

    fn run_statement(
        &mut self,
        sql: &str,
        params: &mut dyn ParamSource,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Flow> {
        let placeholders = count_placeholders(sql);
        let values = if placeholders > 0 {
            match prompt_for_values(params, placeholders, sql, out) {
                Ok(Some(values)) => values,
                Ok(None) => {
                    writeln!(out, "Query cancelled")?;
                    return Ok(Flow::Continue);
                }
                Err(e) => {
                    writeln!(err, "Error: {}", e)?;
                    return Ok(Flow::Continue);
                }
            }
        } else {
            Vec::new()
        };

        match self.executor.execute(sql, values) {
            Ok(result) => {
                let rendered = self.commands.format().renderer().render(&result);
                match rendered {
                    Ok(text) => writeln!(out, "{}", text)?,
                    Err(e) => writeln!(err, "Error: {}", e)?,
                }
                if changes_schema(sql) {
                    self.runtime.block_on(self.cache.reload());
                }
            }
            Err(Error::Cancelled) => {
                writeln!(out, "Query cancelled")?;
            }
            Err(e) => writeln!(err, "Error: {}", e)?,
        }

        if self.cancel.is_cancelled() {
            info!("interrupted, shutting down");
            return Ok(Flow::Exit);
        }
        Ok(Flow::Continue)
    }

    pub fn close(&self) {
        self.cancel.cancel();
        self.connector.close();
    }
}
