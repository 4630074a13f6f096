/// Integration tests for the sandbox lifecycle controller.
///
/// These verify the judging paths end to end:
/// 1. Request validation happens before a box is acquired
/// 2. Compile failures short-circuit and carry the diagnostic
/// 3. Timeouts are judging outcomes, not engine errors
/// 4. The lease is returned on every path

#[cfg(test)]
mod lifecycle_tests {
    use crate::config::JudgeConfig;
    use crate::engine::JudgeEngine;
    use crate::error::EngineError;
    use crate::languages::LanguageRegistry;
    use gavel_common::types::{
        ExecutionRequest, ResourceLimits, RunStatus, TestCase,
    };
    use uuid::Uuid;

    fn test_engine() -> JudgeEngine {
        JudgeEngine::new(JudgeConfig::default(), LanguageRegistry::builtin())
    }

    fn make_request(language: &str, source: &str, cases: Vec<TestCase>) -> ExecutionRequest {
        ExecutionRequest {
            id: Uuid::new_v4(),
            language: language.to_string(),
            source_code: source.to_string(),
            test_cases: cases,
            limits: ResourceLimits::default(),
        }
    }

    fn make_case(input: &str, expected: &str) -> TestCase {
        TestCase {
            input: input.to_string(),
            expected_output: expected.to_string(),
        }
    }

    /// Test: an unknown language fails before any box is acquired,
    /// so no isolation primitive is needed.
    #[tokio::test]
    async fn test_unsupported_language_acquires_no_box() {
        let engine = test_engine();
        let request = make_request("Brainfuck", "+++", vec![make_case("", "")]);

        let err = engine.judge(&request).await.unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedLanguage(name) if name == "Brainfuck"));
    }

    /// Test: an empty test-case list is rejected up front.
    #[tokio::test]
    async fn test_no_test_cases_is_an_error() {
        let engine = test_engine();
        let request = make_request("Python", "print(1)", Vec::new());

        let err = engine.judge(&request).await.unwrap_err();
        assert!(matches!(err, EngineError::NoTestCases));
    }

    /// Test: C program echoing stdin passes its single test case.
    #[tokio::test]
    #[ignore] // requires isolate
    async fn test_c_echo_passes() {
        let engine = test_engine();
        let source = r#"
#include <stdio.h>
int main(void) {
    int c;
    while ((c = getchar()) != EOF) putchar(c);
    return 0;
}
"#;
        let request = make_request("C", source, vec![make_case("5\n", "5\n")]);

        let result = engine.judge(&request).await.unwrap();
        assert!(result.compile_error.is_none());
        assert_eq!(result.passed_count, 1);
        assert_eq!(result.total_count, 1);
        assert_eq!(result.score_percent, 100.0);
        assert_eq!(result.reports[0].status, RunStatus::Ok);
        assert!(result.reports[0].passed);
    }

    /// Test: a wrong answer is reported per case, not as an error.
    #[tokio::test]
    #[ignore] // requires isolate
    async fn test_wrong_answer_fails_case() {
        let engine = test_engine();
        let request = make_request(
            "Python",
            "print(int(input()) + 1)",
            vec![make_case("1\n", "2\n"), make_case("1\n", "3\n")],
        );

        let result = engine.judge(&request).await.unwrap();
        assert_eq!(result.passed_count, 1);
        assert_eq!(result.total_count, 2);
        assert_eq!(result.score_percent, 50.0);
        assert!(result.reports[0].passed);
        assert!(!result.reports[1].passed);
    }

    /// Test: an infinite loop surfaces as a TIMEOUT report; the
    /// submission returns and the box is released.
    #[tokio::test]
    #[ignore] // requires isolate
    async fn test_infinite_loop_times_out() {
        let engine = test_engine();
        let mut request = make_request(
            "Python",
            "while True:\n    pass\n",
            vec![make_case("", "never")],
        );
        request.limits.wall_time_limit_sec = 2.0;

        let result = engine.judge(&request).await.unwrap();
        assert_eq!(result.reports.len(), 1);
        assert_eq!(result.reports[0].status, RunStatus::Timeout);
        assert!(!result.reports[0].passed);
        assert_eq!(result.passed_count, 0);
    }

    /// Test: invalid source in a compiled language short-circuits with
    /// the compiler diagnostic and runs no test case.
    #[tokio::test]
    #[ignore] // requires isolate
    async fn test_compile_error_short_circuits() {
        let engine = test_engine();
        let request = make_request(
            "C",
            "int main(void) { return 0 }", // missing semicolon
            vec![make_case("", ""), make_case("", "")],
        );

        let result = engine.judge(&request).await.unwrap();
        let diagnostic = result.compile_error.expect("compile error expected");
        assert!(!diagnostic.is_empty());
        assert!(result.reports.is_empty());
        assert_eq!(result.total_count, 0);
        assert_eq!(result.score_percent, 0.0);
    }

    /// Test: a crashing program is a RUNTIME_ERROR report and the
    /// remaining cases still run.
    #[tokio::test]
    #[ignore] // requires isolate
    async fn test_runtime_error_does_not_abort_submission() {
        let engine = test_engine();
        let source = r#"
n = int(input())
print(100 // n)
"#;
        let request = make_request(
            "Python",
            source,
            vec![make_case("10\n", "10"), make_case("0\n", "x"), make_case("4\n", "25")],
        );

        let result = engine.judge(&request).await.unwrap();
        assert_eq!(result.reports.len(), 3);
        assert!(result.reports[0].passed);
        assert_eq!(result.reports[1].status, RunStatus::RuntimeError);
        assert!(!result.reports[1].passed);
        assert!(result.reports[2].passed);
        assert_eq!(result.passed_count, 2);
    }

    /// Test: two submissions against a capacity-1 pool serialize on the
    /// box without ever double-assigning it.
    #[tokio::test]
    #[ignore] // requires isolate
    async fn test_capacity_one_serializes_submissions() {
        let config = JudgeConfig {
            box_capacity: 1,
            wait_for_box: true,
            ..JudgeConfig::default()
        };
        let engine = std::sync::Arc::new(JudgeEngine::new(config, LanguageRegistry::builtin()));

        let request = make_request("Python", "print(input())", vec![make_case("ok\n", "ok\n")]);
        let (a, b) = tokio::join!(
            engine.judge(&request),
            engine.judge(&request),
        );

        assert_eq!(a.unwrap().passed_count, 1);
        assert_eq!(b.unwrap().passed_count, 1);
    }

    /// Test: ad-hoc runs execute without an expectation and never pass.
    #[tokio::test]
    #[ignore] // requires isolate
    async fn test_run_single() {
        let engine = test_engine();
        let result = engine
            .run_single("Python", "print(input())", "hello\n")
            .await
            .unwrap();

        assert!(result.compile_error.is_none());
        let report = result.report.expect("report expected");
        assert_eq!(report.status, RunStatus::Ok);
        assert_eq!(report.stdout.trim(), "hello");
        assert!(!report.passed);
    }
}
