/*!
 * rustyline integration
 *
 * Bridges the completion engine and the highlighter to the line editor.
 */

use super::engine::CompletionEngine;
use super::highlight::SqlHighlighter;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::Validator;
use rustyline::Context;
use std::borrow::Cow;

pub struct SqlHelper {
    engine: CompletionEngine,
    highlighter: SqlHighlighter,
    hinter: HistoryHinter,
}

impl SqlHelper {
    pub fn new(engine: CompletionEngine, highlighter: SqlHighlighter) -> Self {
        Self {
            engine,
            highlighter,
            hinter: HistoryHinter::new(),
        }
    }

    /// Candidates for the editor: the full name is displayed, only the part
    /// after the typed prefix is inserted at the cursor.
    fn pairs(&self, line: &str, pos: usize) -> Vec<Pair> {
        let completion = self.engine.complete_line(line, pos);
        if completion.is_empty() {
            return Vec::new();
        }
        completion
            .suffixes()
            .into_iter()
            .zip(completion.candidates)
            .map(|(replacement, display)| Pair {
                display,
                replacement,
            })
            .collect()
    }
}

impl Completer for SqlHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        Ok((pos, self.pairs(line, pos)))
    }
}

impl Hinter for SqlHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for SqlHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(self.highlighter.highlight(line))
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{}\x1b[0m", hint))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Validator for SqlHelper {}

impl rustyline::Helper for SqlHelper {}
