use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

lazy_static! {
    static ref VARIABLE_USE: Regex =
        Regex::new(r"(PATH|CHOICE)\t([A-F][0-9A-F]{6})").expect("variable pattern is valid");
}

/// Variable name with the number of times it is used
pub type VariableCount = (String, usize);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckVarsReport {
    /// Reused variables with at least one use outside every choice
    pub bad: Vec<VariableCount>,
    /// Reused variables spread over more than one choice
    pub potentially_bad: Vec<VariableCount>,
}

impl CheckVarsReport {
    pub fn is_clean(&self) -> bool {
        self.bad.is_empty() && self.potentially_bad.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        push_section(&mut lines, "Bad Variables", &self.bad);
        if !self.bad.is_empty() && !self.potentially_bad.is_empty() {
            lines.push(String::new());
        }
        push_section(&mut lines, "Potentially Bad Variables", &self.potentially_bad);
        lines
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, vars: &[VariableCount]) {
    if vars.is_empty() {
        return;
    }
    lines.push(title.to_string());
    lines.push("-".repeat(title.len()));
    lines.extend(vars.iter().map(|(var, count)| format!("  {count} {var}")));
}

/// Scan a route description for variables reused across choices
///
/// `CHOICE` opens a nesting level and a new choice, `END` closes a level.
/// Results keep the order in which variables first appear.
pub fn check_route(route: &str) -> CheckVarsReport {
    let mut level: i64 = 0;
    let mut choice: usize = 0;
    let mut order: Vec<String> = Vec::new();
    let mut uses: HashMap<String, Vec<(i64, usize)>> = HashMap::new();

    for line in route.lines() {
        if line.starts_with("CHOICE") {
            level += 1;
            choice += 1;
        } else if line.starts_with("END") {
            level -= 1;
        }

        if let Some(caps) = VARIABLE_USE.captures(line) {
            let var = caps[2].to_string();
            if !uses.contains_key(&var) {
                order.push(var.clone());
            }
            uses.entry(var).or_default().push((level, choice));
        }
    }

    let mut report = CheckVarsReport::default();
    for var in order {
        let var_uses = &uses[&var];
        if var_uses.len() < 2 {
            continue;
        }

        let lowest = var_uses.iter().map(|(level, _)| *level).min();
        let choices: BTreeSet<usize> = var_uses.iter().map(|(_, choice)| *choice).collect();

        if lowest == Some(0) {
            report.bad.push((var, var_uses.len()));
        } else if choices.len() > 1 {
            report.potentially_bad.push((var, var_uses.len()));
        }
    }

    report
}

pub fn run(route_file: &Path) -> Result<CheckVarsReport> {
    let route = std::fs::read_to_string(route_file)
        .with_context(|| format!("Failed to read route file: {}", route_file.display()))?;
    Ok(check_route(&route))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE: &str = "\
PATH\tA000001\tstart
PATH\tA000001\tagain at top level
CHOICE\tB000002\tfirst
PATH\tC000003
END
CHOICE\tB000003\tsecond
PATH\tC000003
PATH\tD000004
END
PATH\t-\tno variable
";

    #[test]
    fn test_classification() {
        let report = check_route(ROUTE);
        assert_eq!(report.bad, vec![("A000001".to_string(), 2)]);
        assert_eq!(report.potentially_bad, vec![("C000003".to_string(), 2)]);
    }

    #[test]
    fn test_reuse_within_one_choice_is_fine() {
        let route = "CHOICE\tB000001\nPATH\tC000001\nPATH\tC000001\nEND\n";
        assert!(check_route(route).is_clean());
    }

    #[test]
    fn test_report_lines() {
        let lines = check_route(ROUTE).lines();
        assert_eq!(
            lines,
            vec![
                "Bad Variables",
                "-------------",
                "  2 A000001",
                "",
                "Potentially Bad Variables",
                "-------------------------",
                "  2 C000003",
            ]
        );
    }

    #[test]
    fn test_missing_route_file() {
        assert!(run(Path::new("/definitely/not/here.txt")).is_err());
    }
}
