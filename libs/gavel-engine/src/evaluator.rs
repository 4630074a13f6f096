/// Judgment Evaluator - Language-Agnostic Pass/Fail Logic
///
/// **Core Responsibility:**
/// Compare produced stdout against expected output and aggregate the
/// per-case verdicts into a score.
///
/// **Critical Properties:**
/// - Knows nothing about the isolation primitive
/// - Knows nothing about language runtimes
/// - Pure functions: (output, expectation) -> verdict
///
/// **Normalization Rules:**
/// - Trim leading and trailing whitespace: YES
/// - Trailing-newline differences: ignored (via trim)
/// - Case sensitivity: YES (exact match required)
/// - Floating-point tolerance: NO
use gavel_common::types::ExecutionReport;

use crate::error::EngineError;

/// Aggregated verdict over all executed test cases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub passed_count: usize,
    pub total_count: usize,
    pub score_percent: f64,
}

/// Normalize output for comparison. Preserves internal whitespace,
/// case, and empty lines within the content.
pub fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Exact, whitespace-trimmed equality between produced stdout and the
/// expected output.
pub fn is_passed(stdout: &str, expected: &str) -> bool {
    normalize_output(stdout) == normalize_output(expected)
}

/// Aggregate per-case verdicts: `score_percent = 100 * passed / total`.
///
/// An empty report list is a caller error, never a silent zero score.
pub fn aggregate(reports: &[ExecutionReport]) -> Result<Score, EngineError> {
    if reports.is_empty() {
        return Err(EngineError::NoTestCases);
    }

    let passed_count = reports.iter().filter(|r| r.passed).count();
    let total_count = reports.len();
    let score_percent = 100.0 * passed_count as f64 / total_count as f64;

    Ok(Score {
        passed_count,
        total_count,
        score_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_common::types::RunStatus;

    /// Helper to build a report that only carries a verdict.
    fn make_report(passed: bool) -> ExecutionReport {
        ExecutionReport {
            exit_code: 0,
            status: RunStatus::Ok,
            cpu_time: 0.01,
            wall_time: 0.02,
            max_memory_kb: 1024,
            voluntary_switches: 0,
            forced_switches: 0,
            message: String::new(),
            stdout: String::new(),
            stderr: String::new(),
            stdin: String::new(),
            passed,
        }
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("hello"), "hello");
        assert_eq!(normalize_output("  hello  "), "hello");
        assert_eq!(normalize_output("hello\n"), "hello");
        assert_eq!(normalize_output("\nhello\n"), "hello");
        assert_eq!(normalize_output(""), "");
        assert_eq!(normalize_output("   "), "");
    }

    #[test]
    fn test_trailing_newline_passes() {
        assert!(is_passed("42\n", "42"));
        assert!(is_passed("42", "42\n"));
    }

    #[test]
    fn test_mismatch_fails() {
        assert!(!is_passed("43", "42"));
    }

    #[test]
    fn test_comparison_is_idempotent() {
        assert_eq!(is_passed("  42 \n", "42"), is_passed("42", "42"));
    }

    #[test]
    fn test_internal_whitespace_preserved() {
        assert!(!is_passed("hello  world", "hello world"));
        assert!(is_passed("  hello world  \n", "hello world"));
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(!is_passed("Hello", "hello"));
    }

    #[test]
    fn test_empty_output_matches_empty_expectation() {
        assert!(is_passed("   \n", ""));
    }

    #[test]
    fn test_multiline_output() {
        assert!(is_passed("line1\nline2\nline3\n", "line1\nline2\nline3"));
        assert!(!is_passed("line1\nline2", "line1\nline2\nline3"));
    }

    #[test]
    fn test_aggregate_all_passed() {
        let reports = vec![make_report(true), make_report(true)];
        let score = aggregate(&reports).unwrap();
        assert_eq!(score.passed_count, 2);
        assert_eq!(score.total_count, 2);
        assert_eq!(score.score_percent, 100.0);
    }

    #[test]
    fn test_aggregate_partial() {
        let reports = vec![make_report(true), make_report(false), make_report(false)];
        let score = aggregate(&reports).unwrap();
        assert_eq!(score.passed_count, 1);
        assert_eq!(score.total_count, 3);
        assert_eq!(score.score_percent, 100.0 / 3.0);
    }

    #[test]
    fn test_aggregate_none_passed() {
        let reports = vec![make_report(false)];
        let score = aggregate(&reports).unwrap();
        assert_eq!(score.passed_count, 0);
        assert_eq!(score.score_percent, 0.0);
    }

    #[test]
    fn test_aggregate_empty_is_an_error() {
        let err = aggregate(&[]).unwrap_err();
        assert!(matches!(err, EngineError::NoTestCases));
    }

    #[test]
    fn test_score_percent_exactness() {
        let reports = vec![
            make_report(true),
            make_report(true),
            make_report(true),
            make_report(false),
        ];
        let score = aggregate(&reports).unwrap();
        assert_eq!(score.score_percent, 75.0);
    }
}
