//! Human-driven strategy reading answers from a line-oriented terminal.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use deckhand_core::protocol::{Choice, Message, Strategy, StrategyError};
use tracing::debug;

/// Terminal collaborator used by [`ConsoleStrategy`].
pub trait Prompt {
    /// Prints one line of information.
    fn show(&mut self, line: &str) -> io::Result<()>;

    /// Presents a question and its options and reads one answer. `None`
    /// means the input is exhausted.
    fn prompt(&mut self, description: &str, options: &[String]) -> io::Result<Option<String>>;
}

/// [`Prompt`] over any buffered reader and writer. Options are numbered from 1.
pub struct LinePrompt<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn show(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{line}")
    }

    fn prompt(&mut self, description: &str, options: &[String]) -> io::Result<Option<String>> {
        writeln!(self.writer, "{description}")?;
        for (index, option) in options.iter().enumerate() {
            writeln!(self.writer, "  {:>3}) {option}", index + 1)?;
        }
        write!(self.writer, "> ")?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Shows every view and asks the prompt for each choice, repeating the
/// question until the answer is a valid option number.
pub struct ConsoleStrategy<P> {
    prompt: P,
}

impl<P: Prompt> ConsoleStrategy<P> {
    pub fn new(prompt: P) -> Self {
        Self { prompt }
    }

    pub fn into_prompt(self) -> P {
        self.prompt
    }
}

fn parse_answer(answer: &str, options: usize) -> Option<usize> {
    let number: usize = answer.parse().ok()?;
    (1..=options).contains(&number).then(|| number - 1)
}

impl<V: Display, O: Display, P: Prompt> Strategy<V, O> for ConsoleStrategy<P> {
    fn observe(&mut self, view: &V) {
        if let Err(err) = self.prompt.show(&view.to_string()) {
            debug!(target: "deckhand_bot::console", error = %err, "failed to show view");
        }
    }

    fn decide(
        &mut self,
        choice: &Choice<O>,
        _history: &[Message<V, O>],
    ) -> Result<usize, StrategyError> {
        let options: Vec<String> = choice.options().iter().map(ToString::to_string).collect();
        loop {
            let Some(answer) = self.prompt.prompt(choice.description(), &options)? else {
                return Err(StrategyError::InputClosed);
            };
            if let Some(index) = parse_answer(&answer, options.len()) {
                return Ok(index);
            }
            debug!(
                target: "deckhand_bot::console",
                answer = %answer,
                options = options.len(),
                "rejected console answer"
            );
            self.prompt.show(&format!(
                "Please enter a number between 1 and {}.",
                options.len()
            ))?;
        }
    }
}
