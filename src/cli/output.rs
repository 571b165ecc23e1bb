//! Styled console output for seedpool commands
//!
//! Progress frames are drawn by the renderers; this covers everything printed
//! around a run (summaries, calibration tables, configuration).

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Only printed with `-v`
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn category(&self, category: &str) {
        if !self.quiet {
            println!("\n{}", style(category).bold().cyan());
        }
    }

    pub fn key_value(&self, key: &str, value: &str, highlight: bool) {
        if !self.quiet {
            let styled_value = if highlight {
                style(value).green().bold()
            } else {
                style(value).white()
            };
            println!("  {} {}", style(format!("{key:<16}")).dim(), styled_value);
        }
    }

    /// Row of a fixed-width table
    pub fn table_row(&self, cells: &[String]) {
        if !self.quiet {
            let row = cells
                .iter()
                .map(|cell| format!("{cell:>12}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("  {row}");
        }
    }

    /// Raw line, suppressed only by `--quiet`
    pub fn line(&self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }

    pub fn blank_line(&self) {
        if !self.quiet {
            println!();
        }
    }
}
