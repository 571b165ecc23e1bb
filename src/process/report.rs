use lazy_static::lazy_static;
use regex::Regex;

/// Format handed to the time wrapper; only `%e` and `%M` are read back
pub const REPORT_FORMAT: &str = "%Uuser %Ssystem %eelapsed %PCPU (%Xtext+%Ddata %Mmax)k %Iinputs+%Ooutputs (%Fmajor+%Rminor)pagefaults %Wswaps";

/// Kilobytes per gigabyte for the reported peak
pub const KB_PER_GB: f64 = 1_048_576.0;

lazy_static! {
    static ref REPORT_PATTERN: Regex =
        Regex::new(r"([0-9.]*)elapsed.*data ([0-9]*)max").expect("report pattern is valid");
}

/// Resources used by one completed run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    /// Wall clock seconds
    pub duration_secs: f64,
    /// Peak memory in GB, an approximation derived from the wrapper's max field
    pub peak_memory_gb: f64,
}

/// Extract elapsed seconds and peak memory from a resource report
pub fn parse_report(text: &str) -> Option<ResourceSample> {
    let captures = REPORT_PATTERN.captures(text)?;
    let duration_secs = captures.get(1)?.as_str().parse::<f64>().ok()?;
    let peak_kb = captures.get(2)?.as_str().parse::<f64>().ok()?;

    Some(ResourceSample {
        duration_secs,
        peak_memory_gb: peak_kb / KB_PER_GB,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "412.05user 1.20system 415.31elapsed 99%CPU (0text+0data 524288max)k 0inputs+64outputs (0major+131072minor)pagefaults 0swaps";

    #[test]
    fn test_parse_report() {
        let sample = parse_report(REPORT).unwrap();
        assert_eq!(sample.duration_secs, 415.31);
        assert_eq!(sample.peak_memory_gb, 0.5);
    }

    #[test]
    fn test_parse_report_after_exit_status_line() {
        let text = format!("Command exited with non-zero status 1\n{REPORT}");
        assert!(parse_report(&text).is_some());
    }

    #[test]
    fn test_parse_report_rejects_garbage() {
        assert_eq!(parse_report(""), None);
        assert_eq!(parse_report("Command terminated by signal 9"), None);
        // Empty elapsed field
        assert_eq!(parse_report("elapsed (0text+0data 10max)k"), None);
    }
}
