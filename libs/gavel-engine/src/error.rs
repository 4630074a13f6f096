use thiserror::Error;

/// Engine-level faults.
///
/// These abort a submission and are surfaced to the caller distinctly
/// from a judging verdict: "your code failed" (a compile error, a
/// timed-out test case) travels inside `SubmissionResult`, while "the
/// judge is broken" travels here. The two are never conflated.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Every box is leased and the pool is configured to fail fast.
    #[error("no sandbox box available")]
    PoolExhausted,

    /// The requested language has no pipeline in the registry.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The submission carried an empty test-case list.
    #[error("no test cases supplied")]
    NoTestCases,

    /// I/O failure while writing source or input into the box.
    #[error("failed to stage {what}: {source}")]
    StagingFailed {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The isolation primitive (or a compiler) could not be spawned at
    /// all. An infrastructure fault, not a property of the submission.
    #[error("failed to launch {what}: {source}")]
    RunLaunchFailed {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Inconsistent sandbox state: missing box directory, unreadable
    /// metadata, or an internal failure reported by the primitive.
    #[error("internal judge error: {0}")]
    InternalError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EngineError::UnsupportedLanguage("Brainfuck".to_string()).to_string(),
            "unsupported language: Brainfuck"
        );
        assert_eq!(
            EngineError::PoolExhausted.to_string(),
            "no sandbox box available"
        );
        assert_eq!(EngineError::NoTestCases.to_string(), "no test cases supplied");
    }
}
