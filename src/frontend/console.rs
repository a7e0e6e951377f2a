//! Line-oriented terminal frontend.

use std::io::{BufRead, Write};
use std::rc::Rc;

use super::Frontend;
use crate::backend::{GpgConfirmation, PackageInfo, TransactionPlan};
use crate::presence::{Notifier, best_effort};
use crate::util::format_bytes;

/// What: [`Frontend`] reading answers from `input` and printing to `output`.
///
/// Inputs:
/// - `input`/`output`: Usually locked stdin/stdout; byte buffers in tests.
/// - `notifier`: Optional presence service receiving the working flag.
///
/// Details:
/// - End of input answers every question with "no".
pub struct ConsoleFrontend<R: BufRead, W: Write> {
    /// Answer source.
    input: R,
    /// Message sink.
    output: W,
    /// Presence publisher mirroring the working indicator.
    notifier: Option<Rc<dyn Notifier>>,
    /// Current working flag.
    working: bool,
}

impl<R: BufRead, W: Write> ConsoleFrontend<R, W> {
    /// Frontend over the given streams.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            notifier: None,
            working: false,
        }
    }

    /// Mirror the working indicator to `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Whether the working indicator is currently shown.
    #[must_use]
    pub const fn is_working(&self) -> bool {
        self.working
    }

    /// Consume the frontend and return the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Read one trimmed line; `None` at end of input.
    pub fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }

    /// Print one line, ignoring a closed terminal.
    pub fn say(&mut self, text: &str) {
        if writeln!(self.output, "{text}").is_err() {
            tracing::debug!("[Console] output closed");
        }
    }

    /// Print `text` without a newline and flush.
    pub fn prompt(&mut self, text: &str) {
        if write!(self.output, "{text}").and_then(|()| self.output.flush()).is_err() {
            tracing::debug!("[Console] output closed");
        }
    }

    /// Prompt and read a yes/no answer.
    fn yes_no(&mut self, prompt: &str) -> bool {
        self.prompt(&format!("{prompt} [y/N] "));
        self.read_line()
            .is_some_and(|a| matches!(a.to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

impl<R: BufRead, W: Write> Frontend for ConsoleFrontend<R, W> {
    fn set_working(&mut self, working: bool) {
        self.working = working;
        if let Some(n) = &self.notifier {
            best_effort("SetWorking", n.set_working(working));
        }
    }

    fn pump_events(&mut self) {
        if self.output.flush().is_err() {
            tracing::debug!("[Console] output closed");
        }
    }

    fn show_message(&mut self, text: &str) {
        self.say(text);
    }

    fn show_details(&mut self, title: &str, details: &[String]) {
        self.say(title);
        for line in details {
            self.say(&format!("  {line}"));
        }
    }

    fn confirm_transaction(&mut self, plan: &TransactionPlan) -> bool {
        self.say("Transaction:");
        for entry in &plan.entries {
            let mut line = format!(
                "  {:<10} {:<50} {:>10}",
                entry.operation.label(),
                entry.package.display_name(),
                format_bytes(entry.size)
            );
            if !entry.replaces.is_empty() {
                let replaced: Vec<String> =
                    entry.replaces.iter().map(|r| r.display_name()).collect();
                line.push_str(&format!("  replacing {}", replaced.join(", ")));
            }
            self.say(&line);
        }
        self.say(&format!("Total size: {}", format_bytes(plan.total_size())));
        self.yes_no("Is this ok?")
    }

    fn confirm_key_import(&mut self, request: &GpgConfirmation) -> bool {
        self.say("Signing key needs confirmation:");
        self.say(&format!("  Package : {}", request.package.display_name()));
        self.say(&format!("  Userid  : {}", request.user_id));
        self.say(&format!("  Key id  : {}", request.key_id));
        self.say(&format!("  From    : {}", request.key_url));
        self.yes_no("Import this key?")
    }

    fn ask(&mut self, question: &str) -> bool {
        self.yes_no(question)
    }

    fn show_packages(&mut self, rows: &[PackageInfo]) {
        for p in rows {
            let line = format!(
                "{:<3} {:<50} {:>10}  {}",
                p.action,
                p.id.display_name(),
                format_bytes(p.size),
                p.summary
            );
            self.say(&line);
        }
        self.say(&format!("{} packages", rows.len()));
    }
}
