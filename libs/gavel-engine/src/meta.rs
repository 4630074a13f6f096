// Execution metadata parser.
//
// After every run the isolation primitive writes a newline-delimited
// `key:value` report. This is a report, not a contract: absent keys
// default, malformed numbers default to zero, unknown keys are ignored
// so newer primitive versions keep working.
use gavel_common::types::{ResourceLimits, RunStatus};

/// Structured view of one run's metadata report.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExecutionMeta {
    /// Raw status token (`RE`, `SG`, `TO`, `XX`); absent means the run
    /// completed normally.
    pub status: Option<String>,
    pub exit_code: i32,
    /// CPU time in seconds.
    pub cpu_time: f64,
    /// Wall-clock time in seconds.
    pub wall_time: f64,
    /// Peak resident set size in KB.
    pub max_rss_kb: u64,
    pub csw_voluntary: u64,
    pub csw_forced: u64,
    pub message: String,
    pub killed: bool,
}

impl ExecutionMeta {
    pub fn parse(raw: &str) -> Self {
        let mut meta = Self::default();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "status" => meta.status = Some(value.to_string()),
                "exitcode" => meta.exit_code = value.parse().unwrap_or(0),
                "time" => meta.cpu_time = value.parse().unwrap_or(0.0),
                "time-wall" => meta.wall_time = value.parse().unwrap_or(0.0),
                "max-rss" => meta.max_rss_kb = value.parse().unwrap_or(0),
                "csw-voluntary" => meta.csw_voluntary = value.parse().unwrap_or(0),
                "csw-forced" => meta.csw_forced = value.parse().unwrap_or(0),
                "message" => meta.message = value.to_string(),
                "killed" => meta.killed = value == "1",
                _ => {}
            }
        }
        meta
    }

    /// Map the raw report onto the run-status taxonomy.
    ///
    /// A kill that drove peak memory to the configured limit is
    /// reported as memory-exceeded rather than a bare signal, so the
    /// caller can tell "segfault" from "out of memory".
    pub fn classify(&self, limits: &ResourceLimits) -> RunStatus {
        let over_memory = self.max_rss_kb >= limits.memory_limit_kb;
        match self.status.as_deref() {
            Some("TO") => RunStatus::Timeout,
            Some("SG") if over_memory => RunStatus::MemoryExceeded,
            Some("SG") => RunStatus::Signaled,
            Some("RE") if over_memory => RunStatus::MemoryExceeded,
            Some("RE") => RunStatus::RuntimeError,
            Some("XX") => RunStatus::InternalError,
            _ => RunStatus::Ok,
        }
    }
}
