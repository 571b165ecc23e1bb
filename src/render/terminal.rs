use anyhow::{Context, Result};
use console::Term;

use super::{Renderer, frame_lines};
use crate::dispatch::ProgressSnapshot;

/// Redraws the whole frame in place on an interactive terminal
pub struct TerminalRenderer {
    term: Term,
    drawn: usize,
}

impl TerminalRenderer {
    pub fn stdout() -> Self {
        Self {
            term: Term::stdout(),
            drawn: 0,
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        if self.drawn == 0 {
            self.term.hide_cursor().context("Failed to hide cursor")?;
        } else {
            self.term
                .clear_last_lines(self.drawn)
                .context("Failed to clear previous frame")?;
        }

        let lines = frame_lines(snapshot);
        for line in &lines {
            self.term.write_line(line).context("Failed to draw frame")?;
        }
        self.drawn = lines.len();
        Ok(())
    }

    /// Leaves the last frame on screen
    fn finish(&mut self) -> Result<()> {
        self.term.show_cursor().context("Failed to restore cursor")?;
        self.drawn = 0;
        Ok(())
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        if self.drawn > 0 {
            let _ = self.term.show_cursor();
        }
    }
}
