use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use super::{SEED_COUNT, SeedOutput, read_seed_outputs, require_dir};
use crate::work::Seed;

/// Lines before this index are the route header and always identical
pub const FIRST_COMPARED_LINE: usize = 11;

lazy_static! {
    static ref SEED_SUFFIX: Regex =
        Regex::new(r"(?P<line>.*)Seed:.*Index.*").expect("seed suffix pattern is valid");
    static ref STEP_LINE: Regex = Regex::new(r"Step.*/").expect("step pattern is valid");
}

/// A line with any trailing `Seed: .. Index ..` annotation removed
fn without_seed_suffix(line: &str) -> &str {
    SEED_SUFFIX
        .captures(line)
        .and_then(|caps| caps.name("line"))
        .map_or(line, |m| m.as_str())
}

/// Whether two neighbouring outputs first diverge outside the step listing
pub fn differ_in_steps(first: &str, second: &str) -> bool {
    let second: Vec<&str> = second.lines().collect();

    for (index, line) in first.lines().enumerate().skip(FIRST_COMPARED_LINE) {
        let a = without_seed_suffix(line);
        let b = without_seed_suffix(second.get(index).copied().unwrap_or(""));

        if a != b {
            return !STEP_LINE.is_match(a) && !STEP_LINE.is_match(b);
        }
    }

    false
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwinsReport {
    /// Neighbouring seed pairs that diverge outside the step listing
    pub pairs: Vec<(Seed, Seed)>,
    pub warnings: Vec<String>,
}

impl TwinsReport {
    pub fn lines(&self) -> Vec<String> {
        self.warnings
            .iter()
            .map(|w| format!("WARNING: {w}"))
            .chain(
                self.pairs
                    .iter()
                    .map(|(a, b)| format!("{a} and {b} differ in steps")),
            )
            .collect()
    }
}

/// Compare every seed with its successor, wrapping the last seed to 0
pub fn find_twins(outputs: &[SeedOutput]) -> TwinsReport {
    let mut report = TwinsReport::default();

    for first in outputs {
        let next = (first.seed + 1) % SEED_COUNT;
        let Some(second) = outputs.iter().find(|o| o.seed == next) else {
            continue;
        };

        let Some(first_text) = first.content.as_deref() else {
            report
                .warnings
                .push(format!("{} does not exist", first.path.display()));
            continue;
        };
        if first_text.is_empty() {
            report.warnings.push(format!("{} is empty", first.path.display()));
            continue;
        }

        let Some(second_text) = second.content.as_deref() else {
            report
                .warnings
                .push(format!("{} does not exist", second.path.display()));
            continue;
        };
        if second_text.is_empty() {
            continue;
        }

        if differ_in_steps(first_text, second_text) {
            report.pairs.push((first.seed, next));
        }
    }

    report
}

pub fn run(dir: &Path) -> Result<TwinsReport> {
    require_dir(dir)?;
    Ok(find_twins(&read_seed_outputs(dir)))
}
