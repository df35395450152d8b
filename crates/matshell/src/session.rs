//! The read-dispatch-print loop.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use matshell_contracts::MATSHELL_COMMAND_REPORT_SCHEMA_VERSION;
use matshell_core::{Diagnostic, Dispatcher, Outcome, ShellError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    schema_version: &'static str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'a Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Diagnostic>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Session<'p> {
    mode: OutputMode,
    prompt: Option<&'p str>,
}

impl<'p> Session<'p> {
    pub fn new(mode: OutputMode, prompt: Option<&'p str>) -> Self {
        Self { mode, prompt }
    }

    /// Runs lines from `input` until `exit` or end of input.
    ///
    /// Command failures are rendered and counted; only input and output
    /// errors end the loop early.
    pub fn run<I: BufRead, W: Write>(
        &self,
        dispatcher: &mut Dispatcher,
        mut input: I,
        out: &mut W,
    ) -> Result<SessionStats> {
        let mut stats = SessionStats::default();
        let mut line = String::new();
        loop {
            if let Some(prompt) = self.prompt {
                write!(out, "{prompt}").context("write prompt")?;
                out.flush().context("flush stdout")?;
            }
            line.clear();
            let n = input.read_line(&mut line).context("read input line")?;
            if n == 0 {
                break;
            }
            if line.split_whitespace().next() == Some("exit") {
                break;
            }
            let Some(result) = dispatcher.execute_line(&line) else {
                continue;
            };
            match &result {
                Ok(_) => stats.succeeded += 1,
                Err(_) => stats.failed += 1,
            }
            self.render(out, &result)?;
        }
        tracing::debug!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            "session ended"
        );
        Ok(stats)
    }

    fn render<W: Write>(&self, out: &mut W, result: &Result<Outcome, ShellError>) -> Result<()> {
        match self.mode {
            OutputMode::Text => {
                let written = match result {
                    Ok(outcome) => writeln!(out, "{outcome}"),
                    Err(err) => writeln!(out, "{}", err.diagnostic()),
                };
                written.context("write to stdout")
            }
            OutputMode::Json => {
                let report = match result {
                    Ok(outcome) => Report {
                        schema_version: MATSHELL_COMMAND_REPORT_SCHEMA_VERSION,
                        ok: true,
                        outcome: Some(outcome),
                        error: None,
                    },
                    Err(err) => Report {
                        schema_version: MATSHELL_COMMAND_REPORT_SCHEMA_VERSION,
                        ok: false,
                        outcome: None,
                        error: Some(err.diagnostic()),
                    },
                };
                serde_json::to_writer(&mut *out, &report).context("write report JSON")?;
                writeln!(out).context("write to stdout")
            }
        }
    }
}
