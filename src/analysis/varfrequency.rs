use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use super::{SeedOutput, read_seed_outputs, require_dir};

/// Variables declared by `PATH`/`CHOICE` lines, in declaration order
pub fn declared_variables(route: &str) -> Vec<String> {
    let mut declared: Vec<String> = Vec::new();

    for line in route.lines() {
        let mut tokens = line.split('\t');
        let (Some(kind), Some(var)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let var = var.trim();

        if matches!(kind, "PATH" | "CHOICE") && var != "-" && !declared.iter().any(|d| d == var) {
            declared.push(var.to_string());
        }
    }

    declared
}

/// How often each declared variable is set in the outputs' `VARS` lines
///
/// Sorted by count, highest first; ties keep declaration order. Variables
/// that the route never declared are ignored.
pub fn variable_frequency(route: &str, outputs: &[SeedOutput]) -> Vec<(String, usize)> {
    let declared = declared_variables(route);
    let mut counts: HashMap<&str, usize> = declared.iter().map(|v| (v.as_str(), 0)).collect();

    for content in outputs.iter().filter_map(|o| o.content.as_deref()) {
        for line in content.lines() {
            let mut tokens = line.split('\t');
            if tokens.next() != Some("VARS") {
                continue;
            }

            for assignment in tokens.next().unwrap_or_default().split(' ') {
                let Some((var, value)) = assignment.trim().split_once(':') else {
                    continue;
                };
                let set = value.trim().parse::<i64>().is_ok_and(|v| v > 0);
                if let (true, Some(count)) = (set, counts.get_mut(var)) {
                    *count += 1;
                }
            }
        }
    }

    let mut frequency: Vec<(String, usize)> = declared
        .iter()
        .map(|var| (var.clone(), counts[var.as_str()]))
        .collect();
    frequency.sort_by(|a, b| b.1.cmp(&a.1));
    frequency
}

pub fn run(route_file: &Path, dir: &Path) -> Result<Vec<(String, usize)>> {
    let route = std::fs::read_to_string(route_file)
        .with_context(|| format!("Failed to read route file: {}", route_file.display()))?;
    require_dir(dir)?;

    let outputs = read_seed_outputs(dir);
    for missing in outputs.iter().filter(|o| o.content.is_none()) {
        tracing::warn!("{} does not exist", missing.path.display());
    }

    Ok(variable_frequency(&route, &outputs))
}
