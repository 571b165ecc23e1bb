use anyhow::{Context, Result};
use std::io::Write;

use super::{Renderer, status_line};
use crate::dispatch::ProgressSnapshot;

/// Plain line output for pipes and CI logs
///
/// Prints new completion entries and a status line whenever the set of
/// running or completed seeds changes. Frames where nothing changed are
/// skipped.
pub struct LogRenderer<W: Write> {
    out: W,
    last: Option<(usize, usize)>,
}

impl LogRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> LogRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for LogRenderer<W> {
    fn render(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        let current = (snapshot.completed, snapshot.in_flight);
        if self.last == Some(current) && snapshot.new_log.is_empty() {
            return Ok(());
        }

        for entry in &snapshot.new_log {
            writeln!(self.out, "{entry}").context("Failed to write progress")?;
        }

        writeln!(self.out, "{}", status_line(snapshot)).context("Failed to write progress")?;
        self.last = Some(current);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush progress output")
    }
}
