use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One (input, expected output) pair supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

/// Resource bounds applied to every run of one submission.
///
/// Defaults match the single-run limits the judge uses when the caller
/// does not specify any: 128 MiB, 2 s of CPU time, 3 s of wall time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default = "default_memory_limit_kb")]
    pub memory_limit_kb: u64,
    #[serde(default = "default_cpu_time_limit_sec")]
    pub cpu_time_limit_sec: f64,
    #[serde(default = "default_wall_time_limit_sec")]
    pub wall_time_limit_sec: f64,
    #[serde(default = "default_max_processes")]
    pub max_processes: u32,
}

fn default_memory_limit_kb() -> u64 {
    128 * 1024
}

fn default_cpu_time_limit_sec() -> f64 {
    2.0
}

fn default_wall_time_limit_sec() -> f64 {
    3.0
}

fn default_max_processes() -> u32 {
    4
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_limit_kb: default_memory_limit_kb(),
            cpu_time_limit_sec: default_cpu_time_limit_sec(),
            wall_time_limit_sec: default_wall_time_limit_sec(),
            max_processes: default_max_processes(),
        }
    }
}

/// A full judging request: language, source, test cases, limits.
/// Immutable once submitted; the engine never persists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub id: Uuid,
    pub language: String,
    pub source_code: String,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub limits: ResourceLimits,
}

/// Classified outcome of one sandboxed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Ok,
    RuntimeError,
    Signaled,
    Timeout,
    MemoryExceeded,
    InternalError,
}

/// Everything observed about one test-case run: exit status, timing,
/// memory, context switches, and the captured streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub exit_code: i32,
    pub status: RunStatus,
    pub cpu_time: f64,
    pub wall_time: f64,
    pub max_memory_kb: u64,
    pub voluntary_switches: u64,
    pub forced_switches: u64,
    pub message: String,
    pub stdout: String,
    pub stderr: String,
    pub stdin: String,
    pub passed: bool,
}

/// Aggregate outcome of judging one submission.
///
/// A set `compile_error` short-circuits judging: `reports` is empty and
/// no test case was executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_error: Option<String>,
    pub reports: Vec<ExecutionReport>,
    pub passed_count: usize,
    pub total_count: usize,
    pub score_percent: f64,
}

/// Outcome of an ad-hoc single run (no expected output to judge against).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdhocRunResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ExecutionReport>,
}

impl SubmissionResult {
    /// True when every executed test case passed and none were skipped.
    pub fn accepted(&self) -> bool {
        self.compile_error.is_none()
            && self.total_count > 0
            && self.passed_count == self.total_count
    }
}
