//! Confirmation before destructive actions.

use std::io::{self, BufRead, Write};

/// Decides whether a single delete or rename may go ahead.
pub trait ConfirmationProvider {
    /// Ask a yes/no question. Anything other than an explicit yes is a no.
    fn confirm(&mut self, question: &str) -> bool;

    /// Present information the operator needs before answering.
    fn show(&mut self, _text: &str) {}
}

/// Asks the operator on a terminal (or any reader/writer pair).
///
/// Only `y` (case-insensitive, surrounding whitespace ignored) counts as yes.
/// End of input and read errors count as no.
pub struct InteractivePrompt<R, W> {
    input: R,
    output: W,
}

impl InteractivePrompt<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> InteractivePrompt<R, W> {
    /// Create a prompt over the given input and output.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the prompt and return its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{question} [y/N]: ")?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            writeln!(self.output)?;
            return Ok(false);
        }
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

impl<R: BufRead, W: Write> ConfirmationProvider for InteractivePrompt<R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        match self.ask(question) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Prompt failed, treating as no: {e}");
                false
            }
        }
    }

    fn show(&mut self, text: &str) {
        if let Err(e) = writeln!(self.output, "{text}") {
            tracing::warn!("Cannot write to prompt output: {e}");
        }
    }
}

/// Approves everything without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ConfirmationProvider for AutoApprove {
    fn confirm(&mut self, question: &str) -> bool {
        tracing::debug!("Auto-approved: {question}");
        true
    }
}

/// Declines everything without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDecline;

impl ConfirmationProvider for AutoDecline {
    fn confirm(&mut self, question: &str) -> bool {
        tracing::debug!("Auto-declined: {question}");
        false
    }
}
