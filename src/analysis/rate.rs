//! Rate one seed's route against every other seed of the same route
//!
//! A route's output is cut into groups at a few landmark lines. For each
//! group the number of steps and their total time are compared across seeds.

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use super::{read_seed_outputs, require_dir};
use crate::dispatch::history::{mean, median, stdev};
use crate::work::Seed;

/// Lines that close a group
pub const GROUP_MARKERS: [&str; 3] = ["Paladin", "Castle of Dwarves W", "Return to Moon"];

/// Seconds per extra step
pub const EXTRA_STEP_SECS: f64 = 16.0 * 655_171.0 / 39_375_000.0;

lazy_static! {
    static ref STEP_LINE: Regex =
        Regex::new(r"Step.*: (?P<index>[0-9]+) / .*[^0-9.](?P<time>[0-9.]*)s\)")
            .expect("step pattern is valid");
    static ref EXTRA_STEPS_LINE: Regex =
        Regex::new(r" +Extra Steps: (?P<steps>[0-9]+)").expect("extra steps pattern is valid");
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupTotals {
    pub steps: usize,
    pub secs: f64,
}

/// Step count and time per group, in route order
///
/// The trailing group after the last marker is always included.
pub fn group_totals(content: &str) -> Vec<GroupTotals> {
    let mut groups = Vec::new();
    let mut current = GroupTotals::default();

    for line in content.lines() {
        if let Some(caps) = STEP_LINE.captures(line.trim()) {
            current.steps += 1;
            if let Ok(secs) = caps["time"].parse::<f64>() {
                current.secs += secs;
            }
        }

        if let Some(caps) = EXTRA_STEPS_LINE.captures(line.trim_end()) {
            if let Ok(steps) = caps["steps"].parse::<u64>() {
                current.secs += steps as f64 * EXTRA_STEP_SECS;
            }
        }

        if GROUP_MARKERS.iter().any(|marker| line.starts_with(marker)) {
            groups.push(std::mem::take(&mut current));
        }
    }

    groups.push(current);
    groups
}

/// Distribution of one group's value across seeds plus the rated seed
#[derive(Debug, Clone, PartialEq)]
pub struct RateRow {
    pub group: usize,
    pub min: f64,
    pub median: f64,
    pub max: f64,
    pub selected: Option<f64>,
    /// Standard score of the selected seed; `0.0` when all seeds agree
    pub z_score: Option<f64>,
}

impl RateRow {
    fn from_values(group: usize, values: &[f64], selected: Option<f64>) -> Option<Self> {
        let mean = mean(values)?;
        let spread = stdev(values)?;
        let z_score = selected.map(|value| {
            if spread > 0.0 {
                (value - mean) / spread
            } else {
                0.0
            }
        });

        Some(Self {
            group,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            median: median(values)?,
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            selected,
            z_score,
        })
    }

    fn format(&self, precision: usize) -> String {
        let selected = match self.selected {
            Some(value) => format!("{value:8.precision$}"),
            None => format!("{:>8}", "-"),
        };
        let z_score = match self.z_score {
            Some(z) => format!("{z:8.3}"),
            None => format!("{:>8}", "-"),
        };
        format!(
            "Group {} {:8.precision$} {:8.precision$} {:8.precision$}   {selected} {z_score}",
            self.group, self.min, self.median, self.max,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateReport {
    pub steps: Vec<RateRow>,
    pub times: Vec<RateRow>,
}

impl RateReport {
    /// Step counts, a blank line, then times
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.steps.iter().map(|row| row.format(0)).collect();
        lines.push(String::new());
        lines.extend(self.times.iter().map(|row| row.format(2)));
        lines
    }
}

/// Compare `selected` against all seeds' group totals
pub fn rate(per_seed: &[(Seed, Vec<GroupTotals>)], selected: Seed) -> RateReport {
    let group_count = per_seed.iter().map(|(_, groups)| groups.len()).max().unwrap_or(0);
    let selected_groups = per_seed
        .iter()
        .find(|(seed, _)| *seed == selected)
        .map(|(_, groups)| groups.as_slice())
        .unwrap_or_default();

    let mut steps = Vec::new();
    let mut times = Vec::new();

    for group in 0..group_count {
        let present: Vec<GroupTotals> = per_seed
            .iter()
            .filter_map(|(_, groups)| groups.get(group).copied())
            .collect();
        let chosen = selected_groups.get(group);

        let step_values: Vec<f64> = present.iter().map(|g| g.steps as f64).collect();
        let time_values: Vec<f64> = present.iter().map(|g| g.secs).collect();

        steps.extend(RateRow::from_values(group, &step_values, chosen.map(|g| g.steps as f64)));
        times.extend(RateRow::from_values(group, &time_values, chosen.map(|g| g.secs)));
    }

    RateReport { steps, times }
}

pub fn run(dir: &Path, selected: Seed) -> Result<RateReport> {
    require_dir(dir)?;

    let per_seed: Vec<(Seed, Vec<GroupTotals>)> = read_seed_outputs(dir)
        .into_iter()
        .filter_map(|output| Some((output.seed, group_totals(output.content.as_deref()?))))
        .collect();

    if !per_seed.iter().any(|(seed, _)| *seed == selected) {
        anyhow::bail!("No output for seed {selected} in {}", dir.display());
    }

    Ok(rate(&per_seed, selected))
}
