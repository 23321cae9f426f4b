/*!
 * Input accumulation
 *
 * Collects lines into SQL statements and drives the Idle/Accumulating state
 * machine without touching a terminal.
 */

/// Marker that introduces an internal command.
pub const COMMAND_PREFIX: char = ':';

#[derive(Debug, Default)]
pub struct InputAccumulator {
    buffer: String,
}

impl InputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, line: &str) {
        if !self.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether the buffer ends a statement. Semicolons inside literals are
    /// not special here.
    pub fn is_complete(&self) -> bool {
        self.buffer.trim().ends_with(';')
    }

    pub fn get(&self) -> &str {
        &self.buffer
    }

    /// Buffer without surrounding whitespace and the final `;`.
    pub fn get_trimmed(&self) -> String {
        let trimmed = self.get().trim();
        trimmed
            .strip_suffix(';')
            .unwrap_or(trimmed)
            .trim_end()
            .to_string()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

pub fn is_internal_command(line: &str) -> bool {
    line.trim().starts_with(COMMAND_PREFIX)
}

/// Split `:name arg1 arg2` into a lowercase name and its arguments.
pub fn parse_command(line: &str) -> Option<(String, Vec<String>)> {
    if !is_internal_command(line) {
        return None;
    }
    let body = &line.trim()[COMMAND_PREFIX.len_utf8()..];
    let mut parts = body.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    Some((name, parts.map(str::to_string).collect()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplState {
    Idle,
    Accumulating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    Interrupt,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Command(String, Vec<String>),
    Execute(String),
    /// A partial statement was discarded.
    Cancelled,
    Exit,
}

#[derive(Debug)]
pub struct InputMachine {
    state: ReplState,
    buffer: InputAccumulator,
}

impl Default for InputMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl InputMachine {
    pub fn new() -> Self {
        Self {
            state: ReplState::Idle,
            buffer: InputAccumulator::new(),
        }
    }

    pub fn state(&self) -> ReplState {
        self.state
    }

    #[cfg(test)]
    pub fn buffer(&self) -> &InputAccumulator {
        &self.buffer
    }

    pub fn feed(&mut self, event: InputEvent) -> Action {
        match (self.state, event) {
            (_, InputEvent::Eof) => {
                self.reset();
                Action::Exit
            }
            (ReplState::Idle, InputEvent::Interrupt) => Action::None,
            (ReplState::Accumulating, InputEvent::Interrupt) => {
                self.reset();
                Action::Cancelled
            }
            (ReplState::Idle, InputEvent::Line(line)) => {
                if line.trim().is_empty() {
                    return Action::None;
                }
                if let Some((name, args)) = parse_command(&line) {
                    return Action::Command(name, args);
                }
                self.state = ReplState::Accumulating;
                self.push(&line)
            }
            (ReplState::Accumulating, InputEvent::Line(line)) => self.push(&line),
        }
    }

    fn push(&mut self, line: &str) -> Action {
        self.buffer.add(line);
        if !self.buffer.is_complete() {
            return Action::None;
        }
        let statement = self.buffer.get_trimmed();
        self.reset();
        Action::Execute(statement)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.state = ReplState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn line(s: &str) -> InputEvent {
        InputEvent::Line(s.to_string())
    }

    #[test]
    fn accumulates_until_semicolon() {
        let mut acc = InputAccumulator::new();
        acc.add("SELECT *");
        assert!(!acc.is_complete());
        acc.add("FROM users;");
        assert!(acc.is_complete());
        assert_eq!(acc.get(), "SELECT *\nFROM users;");
        assert_eq!(acc.get_trimmed(), "SELECT *\nFROM users");
        acc.clear();
        assert!(acc.is_empty());
    }

    #[test]
    fn semicolon_inside_literal_does_not_complete() {
        let mut acc = InputAccumulator::new();
        acc.add("SELECT 'a;b' FROM t");
        assert!(!acc.is_complete());
    }

    #[test]
    fn trailing_whitespace_after_semicolon_still_completes() {
        let mut acc = InputAccumulator::new();
        acc.add("SELECT 1 ;  ");
        assert!(acc.is_complete());
        assert_eq!(acc.get_trimmed(), "SELECT 1");
    }

    #[rstest]
    #[case(":columns users", Some(("columns", vec!["users"])))]
    #[case(":quit", Some(("quit", vec![])))]
    #[case("  :FMT   json ", Some(("fmt", vec!["json"])))]
    #[case(":", Some(("", vec![])))]
    #[case("quit", None)]
    #[case("SELECT 1;", None)]
    fn parses_commands(#[case] input: &str, #[case] expected: Option<(&str, Vec<&str>)>) {
        let expected = expected.map(|(name, args)| {
            (
                name.to_string(),
                args.into_iter().map(String::from).collect::<Vec<_>>(),
            )
        });
        assert_eq!(parse_command(input), expected);
        assert_eq!(is_internal_command(input), expected.is_some());
    }

    #[test]
    fn multi_line_statement_is_dispatched_once_complete() {
        let mut machine = InputMachine::new();
        assert_eq!(machine.feed(line("SELECT *")), Action::None);
        assert_eq!(machine.state(), ReplState::Accumulating);
        assert_eq!(machine.feed(line("")), Action::None);
        assert_eq!(
            machine.feed(line("FROM users;")),
            Action::Execute("SELECT *\n\nFROM users".to_string())
        );
        assert_eq!(machine.state(), ReplState::Idle);
        assert!(machine.buffer().is_empty());
    }

    #[test]
    fn commands_only_dispatch_from_idle() {
        let mut machine = InputMachine::new();
        assert_eq!(
            machine.feed(line(":tables")),
            Action::Command("tables".to_string(), vec![])
        );
        assert_eq!(machine.state(), ReplState::Idle);

        machine.feed(line("SELECT"));
        assert_eq!(machine.feed(line(":tables")), Action::None);
        assert_eq!(machine.buffer().get(), "SELECT\n:tables");
    }

    #[test]
    fn bare_word_begins_accumulation() {
        let mut machine = InputMachine::new();
        assert_eq!(machine.feed(line("quit")), Action::None);
        assert_eq!(machine.state(), ReplState::Accumulating);
    }

    #[test]
    fn blank_lines_are_ignored_when_idle() {
        let mut machine = InputMachine::new();
        assert_eq!(machine.feed(line("   ")), Action::None);
        assert_eq!(machine.state(), ReplState::Idle);
    }

    #[test]
    fn interrupt_discards_partial_statement() {
        let mut machine = InputMachine::new();
        assert_eq!(machine.feed(InputEvent::Interrupt), Action::None);

        machine.feed(line("DELETE FROM users"));
        assert_eq!(machine.feed(InputEvent::Interrupt), Action::Cancelled);
        assert_eq!(machine.state(), ReplState::Idle);
        assert_eq!(
            machine.feed(line("SELECT 1;")),
            Action::Execute("SELECT 1".to_string())
        );
    }

    #[rstest]
    #[case(&[])]
    #[case(&["SELECT *", "FROM t"])]
    fn eof_exits_and_drops_buffer(#[case] lines: &[&str]) {
        let mut machine = InputMachine::new();
        for l in lines {
            machine.feed(line(l));
        }
        assert_eq!(machine.feed(InputEvent::Eof), Action::Exit);
        assert!(machine.buffer().is_empty());
    }
}
