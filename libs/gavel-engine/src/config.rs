// Engine configuration, resolved once at process start and shared
// read-only thereafter.
use std::path::PathBuf;
use std::time::Duration;

use gavel_common::types::ResourceLimits;

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Root directory managed by the isolation primitive; each box
    /// lives at `<sandbox_root>/<box_id>/box`.
    pub sandbox_root: PathBuf,
    /// Name or path of the isolation primitive binary.
    pub isolate_binary: String,
    /// Maximum number of concurrently leased boxes.
    pub box_capacity: usize,
    /// When true, `acquire()` waits for a free box; when false it fails
    /// fast with `PoolExhausted`.
    pub wait_for_box: bool,
    /// Wall-clock bound on the compile step.
    pub compile_timeout: Duration,
    /// Limits applied when the caller supplies none (ad-hoc runs).
    pub default_limits: ResourceLimits,
    /// Optional languages.json overriding the built-in pipeline table.
    pub languages_file: Option<PathBuf>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            sandbox_root: PathBuf::from("/var/lib/isolate"),
            isolate_binary: "isolate".to_string(),
            box_capacity: 16,
            wait_for_box: true,
            compile_timeout: Duration::from_secs(30),
            default_limits: ResourceLimits::default(),
            languages_file: None,
        }
    }
}

impl JudgeConfig {
    /// Build the configuration from environment variables, falling back
    /// to defaults for anything unset. `ENVIRONMENT=PRODUCTION` selects
    /// the production sandbox root unless one is given explicitly.
    pub fn from_env() -> Self {
        let sandbox_root = std::env::var("GAVEL_SANDBOX_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let environment = std::env::var("ENVIRONMENT").unwrap_or_default();
                if environment == "PRODUCTION" {
                    PathBuf::from("/var/local/lib/isolate")
                } else {
                    PathBuf::from("/var/lib/isolate")
                }
            });

        let isolate_binary =
            std::env::var("GAVEL_ISOLATE_BIN").unwrap_or_else(|_| "isolate".to_string());

        let box_capacity = std::env::var("GAVEL_BOX_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(16);

        let wait_for_box = std::env::var("GAVEL_WAIT_FOR_BOX")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let compile_timeout_secs = std::env::var("GAVEL_COMPILE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let languages_file = std::env::var("GAVEL_LANGUAGES_FILE").ok().map(PathBuf::from);

        Self {
            sandbox_root,
            isolate_binary,
            box_capacity,
            wait_for_box,
            compile_timeout: Duration::from_secs(compile_timeout_secs),
            default_limits: ResourceLimits::default(),
            languages_file,
        }
    }
}
