/// Sandbox Lifecycle Controller - One Box, One Submission
///
/// **Core Responsibility:**
/// Drive a leased box through its execution states for one submission:
/// stage source -> compile (optional) -> per test case: stage input,
/// run under the primitive's limits, collect output and metadata.
///
/// **Critical Architectural Boundary:**
/// - The engine knows HOW to execute (isolate subprocess, box files)
/// - The engine does NOT compare outputs (evaluator's job)
/// - The engine does NOT decode metadata (parser's job)
///
/// **Cleanup Guarantee:**
/// The lease is released on every path - success, compile failure,
/// staging failure, run failure, internal error - with the lease's
/// drop backstop covering panics and caller cancellation.
use gavel_common::types::{
    AdhocRunResult, ExecutionReport, ExecutionRequest, ResourceLimits, RunStatus, SubmissionResult,
    TestCase,
};
use tracing::{debug, info, warn};

use crate::config::JudgeConfig;
use crate::error::EngineError;
use crate::evaluator;
use crate::isolate::{Isolate, INPUT_FILE, META_FILE, OUTPUT_FILE, STDERR_FILE};
use crate::languages::{LanguagePipeline, LanguageRegistry, PreRunStep};
use crate::meta::ExecutionMeta;
use crate::pool::{BoxLease, BoxPool};

/// Safety limits to keep pathological inputs away from the sandbox
const MAX_SOURCE_CODE_BYTES: usize = 1024 * 1024; // 1MB
const MAX_TEST_INPUT_BYTES: usize = 10 * 1024 * 1024; // 10MB

pub struct JudgeEngine {
    config: JudgeConfig,
    registry: LanguageRegistry,
    pool: BoxPool,
    isolate: Isolate,
}

impl JudgeEngine {
    pub fn new(config: JudgeConfig, registry: LanguageRegistry) -> Self {
        let isolate = Isolate::new(
            config.isolate_binary.clone(),
            config.sandbox_root.clone(),
        );
        let pool = BoxPool::new(config.box_capacity, config.wait_for_box, isolate.clone());
        Self {
            config,
            registry,
            pool,
            isolate,
        }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Judge one submission against all its test cases.
    ///
    /// Compile failure and per-case timeouts/crashes are judging
    /// outcomes inside the returned `SubmissionResult`; an `Err` means
    /// the judge itself could not do its job.
    #[tracing::instrument(
        skip(self, request),
        fields(
            submission_id = %request.id,
            language = %request.language,
            test_count = request.test_cases.len()
        )
    )]
    pub async fn judge(
        &self,
        request: &ExecutionRequest,
    ) -> Result<SubmissionResult, EngineError> {
        // validated before any box is acquired
        let pipeline = self.registry.resolve(&request.language)?;
        if request.test_cases.is_empty() {
            return Err(EngineError::NoTestCases);
        }
        if request.source_code.len() > MAX_SOURCE_CODE_BYTES {
            return Err(EngineError::StagingFailed {
                what: "source file",
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("source code exceeds maximum size of {MAX_SOURCE_CODE_BYTES} bytes"),
                ),
            });
        }

        let lease = self.pool.acquire().await?;
        info!(box_id = lease.id(), "box leased");

        let result = self.judge_in_box(&lease, pipeline, request).await;
        lease.release().await;

        if let Ok(ref result) = result {
            info!(
                passed = result.passed_count,
                total = result.total_count,
                score = result.score_percent,
                compile_failed = result.compile_error.is_some(),
                "submission judged"
            );
        }
        result
    }

    /// Run one ad-hoc execution with the configured default limits.
    /// There is no expected output, so the report is never marked passed.
    #[tracing::instrument(skip(self, source_code, input), fields(language = %language))]
    pub async fn run_single(
        &self,
        language: &str,
        source_code: &str,
        input: &str,
    ) -> Result<AdhocRunResult, EngineError> {
        let pipeline = self.registry.resolve(language)?;

        let lease = self.pool.acquire().await?;
        let result = self.run_single_in_box(&lease, pipeline, source_code, input).await;
        lease.release().await;
        result
    }

    async fn judge_in_box(
        &self,
        lease: &BoxLease,
        pipeline: &LanguagePipeline,
        request: &ExecutionRequest,
    ) -> Result<SubmissionResult, EngineError> {
        self.stage_source(lease, pipeline, &request.source_code)
            .await?;

        if let Some(compile_argv) = &pipeline.compile {
            if let Some(diagnostic) = self.compile(lease, compile_argv).await? {
                warn!(box_id = lease.id(), "compilation failed, short-circuiting");
                return Ok(SubmissionResult {
                    compile_error: Some(diagnostic),
                    reports: Vec::new(),
                    passed_count: 0,
                    total_count: 0,
                    score_percent: 0.0,
                });
            }
        }

        // test cases run strictly in submitted order, reusing the
        // compiled artifact; each run overwrites only the I/O files
        let mut reports = Vec::with_capacity(request.test_cases.len());
        for (index, case) in request.test_cases.iter().enumerate() {
            let report = self
                .run_case(lease, pipeline, case, &request.limits)
                .await?;
            debug!(
                test = index + 1,
                status = ?report.status,
                passed = report.passed,
                cpu_time = report.cpu_time,
                "test case collected"
            );
            reports.push(report);
        }

        let score = evaluator::aggregate(&reports)?;
        Ok(SubmissionResult {
            compile_error: None,
            reports,
            passed_count: score.passed_count,
            total_count: score.total_count,
            score_percent: score.score_percent,
        })
    }

    async fn run_single_in_box(
        &self,
        lease: &BoxLease,
        pipeline: &LanguagePipeline,
        source_code: &str,
        input: &str,
    ) -> Result<AdhocRunResult, EngineError> {
        self.stage_source(lease, pipeline, source_code).await?;

        if let Some(compile_argv) = &pipeline.compile {
            if let Some(diagnostic) = self.compile(lease, compile_argv).await? {
                return Ok(AdhocRunResult {
                    compile_error: Some(diagnostic),
                    report: None,
                });
            }
        }

        let case = TestCase {
            input: input.to_string(),
            expected_output: String::new(),
        };
        let mut report = self
            .run_case(lease, pipeline, &case, &self.config.default_limits)
            .await?;
        report.passed = false;

        Ok(AdhocRunResult {
            compile_error: None,
            report: Some(report),
        })
    }

    /// Write the source verbatim into the box and apply the pipeline's
    /// pre-run steps.
    async fn stage_source(
        &self,
        lease: &BoxLease,
        pipeline: &LanguagePipeline,
        source_code: &str,
    ) -> Result<(), EngineError> {
        if !lease.root().is_dir() {
            return Err(EngineError::InternalError(format!(
                "box directory missing after init: {}",
                lease.root().display()
            )));
        }

        let mut staged = String::new();
        for step in &pipeline.pre_run {
            if let PreRunStep::Shebang { line } = step {
                staged.push_str(line);
                staged.push('\n');
            }
        }
        staged.push_str(source_code);

        self.isolate
            .write_file(lease.id(), &pipeline.source_file, &staged)
            .await
            .map_err(|e| EngineError::StagingFailed {
                what: "source file",
                source: e,
            })?;

        for step in &pipeline.pre_run {
            if let PreRunStep::MakeExecutable { file } = step {
                self.isolate
                    .make_executable(lease.id(), file)
                    .await
                    .map_err(|e| EngineError::StagingFailed {
                        what: "executable bit",
                        source: e,
                    })?;
            }
        }

        debug!(box_id = lease.id(), file = %pipeline.source_file, "source staged");
        Ok(())
    }

    /// Run the compile command in the box directory, bounded by the
    /// configured timeout. `Some(diagnostic)` is the judging outcome
    /// "your code does not compile"; `Err` is an infrastructure fault.
    async fn compile(
        &self,
        lease: &BoxLease,
        argv: &[String],
    ) -> Result<Option<String>, EngineError> {
        debug!(box_id = lease.id(), command = ?argv, "compiling");

        let output = match tokio::time::timeout(
            self.config.compile_timeout,
            self.isolate.exec_in_box(lease.id(), argv),
        )
        .await
        {
            Err(_) => {
                return Ok(Some(format!(
                    "compilation exceeded the {}s time limit",
                    self.config.compile_timeout.as_secs()
                )))
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(output)) => output,
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() && stderr.trim().is_empty() {
            return Ok(None);
        }

        let mut diagnostic = stderr.trim().to_string();
        if diagnostic.is_empty() {
            diagnostic = String::from_utf8_lossy(&output.stdout).trim().to_string();
        }
        Ok(Some(diagnostic))
    }

    /// Execute one test case: stage input, run under the primitive,
    /// read back streams and metadata, classify and judge.
    async fn run_case(
        &self,
        lease: &BoxLease,
        pipeline: &LanguagePipeline,
        case: &TestCase,
        limits: &ResourceLimits,
    ) -> Result<ExecutionReport, EngineError> {
        if case.input.len() > MAX_TEST_INPUT_BYTES {
            return Err(EngineError::StagingFailed {
                what: "test input",
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("test input exceeds maximum size of {MAX_TEST_INPUT_BYTES} bytes"),
                ),
            });
        }

        self.isolate
            .write_file(lease.id(), INPUT_FILE, &case.input)
            .await
            .map_err(|e| EngineError::StagingFailed {
                what: "test input",
                source: e,
            })?;

        self.isolate.run(lease.id(), &pipeline.run, limits).await?;

        // the metadata report is the authority on what happened; if it
        // is missing the run cannot be judged
        let meta_raw = self
            .isolate
            .read_file(lease.id(), META_FILE)
            .await
            .map_err(|e| {
                EngineError::InternalError(format!("metadata missing after run: {e}"))
            })?;
        let meta = ExecutionMeta::parse(&meta_raw);

        let status = meta.classify(limits);
        if status == RunStatus::InternalError {
            return Err(EngineError::InternalError(format!(
                "isolate reported an internal failure: {}",
                meta.message
            )));
        }

        let stdout = self
            .isolate
            .read_file(lease.id(), OUTPUT_FILE)
            .await
            .unwrap_or_default();
        let stderr = self
            .isolate
            .read_file(lease.id(), STDERR_FILE)
            .await
            .unwrap_or_default();

        // A run killed for exceeding a limit can never pass, even if
        // its truncated output happens to match. A non-zero exit code
        // on matching output does not by itself fail the case.
        let output_matches = evaluator::is_passed(&stdout, &case.expected_output);
        let passed = output_matches
            && !matches!(status, RunStatus::Timeout | RunStatus::MemoryExceeded);

        Ok(ExecutionReport {
            exit_code: meta.exit_code,
            status,
            cpu_time: meta.cpu_time,
            wall_time: meta.wall_time,
            max_memory_kb: meta.max_rss_kb,
            voluntary_switches: meta.csw_voluntary,
            forced_switches: meta.csw_forced,
            message: meta.message,
            stdout,
            stderr,
            stdin: case.input.clone(),
            passed,
        })
    }
}
