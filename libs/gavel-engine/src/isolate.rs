// Driver for the external isolation primitive.
//
// Every operation is a subprocess invocation of the `isolate` binary:
// `--init` creates the box, `--run` executes one command under the
// submission's limits, `--cleanup` tears the box down. Source, input,
// output, error and metadata files live at fixed relative names inside
// the box working directory.
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use gavel_common::types::ResourceLimits;
use tokio::process::Command;

use crate::error::EngineError;

pub const INPUT_FILE: &str = "input.txt";
pub const OUTPUT_FILE: &str = "output.txt";
pub const STDERR_FILE: &str = "cerr.txt";
pub const META_FILE: &str = "meta.txt";

/// Grace period on top of the wall-time limit before a hung primitive
/// is declared an internal fault.
const RUN_BACKSTOP_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Isolate {
    binary: String,
    sandbox_root: PathBuf,
}

impl Isolate {
    pub fn new(binary: String, sandbox_root: PathBuf) -> Self {
        Self {
            binary,
            sandbox_root,
        }
    }

    /// Working directory of one box: `<sandbox_root>/<box_id>/box`.
    pub fn box_dir(&self, box_id: u32) -> PathBuf {
        self.sandbox_root.join(box_id.to_string()).join("box")
    }

    pub async fn init(&self, box_id: u32) -> Result<(), EngineError> {
        let output = Command::new(&self.binary)
            .arg(format!("--box-id={box_id}"))
            .arg("--init")
            .output()
            .await
            .map_err(|e| EngineError::RunLaunchFailed {
                what: "isolate --init",
                source: e,
            })?;

        if !output.status.success() {
            return Err(EngineError::InternalError(format!(
                "isolate --init failed for box {box_id}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    pub async fn cleanup(&self, box_id: u32) -> Result<(), EngineError> {
        let output = Command::new(&self.binary)
            .arg(format!("--box-id={box_id}"))
            .arg("--cleanup")
            .output()
            .await
            .map_err(|e| EngineError::RunLaunchFailed {
                what: "isolate --cleanup",
                source: e,
            })?;

        if !output.status.success() {
            return Err(EngineError::InternalError(format!(
                "isolate --cleanup failed for box {box_id}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    /// Execute one command inside the box under the submission's
    /// limits. The primitive enforces CPU/wall/memory bounds itself; an
    /// outer backstop catches a primitive that never returns.
    ///
    /// A non-zero exit here is not an error: the primitive exits
    /// non-zero whenever the judged program failed a limit or crashed,
    /// and the metadata file records why.
    pub async fn run(
        &self,
        box_id: u32,
        argv: &[String],
        limits: &ResourceLimits,
    ) -> Result<Output, EngineError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(format!("--box-id={box_id}"))
            .arg(format!("--mem={}", limits.memory_limit_kb))
            .arg(format!("--time={}", limits.cpu_time_limit_sec))
            .arg(format!("--wall-time={}", limits.wall_time_limit_sec))
            .arg(format!("--stdin={INPUT_FILE}"))
            .arg(format!("--stdout={OUTPUT_FILE}"))
            .arg(format!("--stderr={STDERR_FILE}"))
            .arg(format!("--meta={META_FILE}"))
            .arg(format!("--processes={}", limits.max_processes))
            .arg("--run")
            .arg("--")
            .args(argv)
            .current_dir(self.box_dir(box_id))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let backstop =
            Duration::from_secs_f64(limits.wall_time_limit_sec.max(0.0)) + RUN_BACKSTOP_GRACE;

        match tokio::time::timeout(backstop, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(EngineError::RunLaunchFailed {
                what: "isolate --run",
                source: e,
            }),
            Err(_) => Err(EngineError::InternalError(format!(
                "isolate --run did not return within {}s for box {box_id}",
                backstop.as_secs()
            ))),
        }
    }

    /// Execute a command in the box working directory without the jail.
    /// Used for the compile step; the caller bounds it with a timeout.
    pub async fn exec_in_box(&self, box_id: u32, argv: &[String]) -> Result<Output, EngineError> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            EngineError::InternalError("empty command in language pipeline".to_string())
        })?;

        Command::new(program)
            .args(args)
            .current_dir(self.box_dir(box_id))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| EngineError::RunLaunchFailed {
                what: "compile command",
                source: e,
            })
    }

    pub async fn write_file(
        &self,
        box_id: u32,
        name: &str,
        contents: &str,
    ) -> std::io::Result<()> {
        tokio::fs::write(self.box_dir(box_id).join(name), contents).await
    }

    /// Read a box file, replacing invalid UTF-8 from the judged program.
    pub async fn read_file(&self, box_id: u32, name: &str) -> std::io::Result<String> {
        let bytes = tokio::fs::read(self.box_dir(box_id).join(name)).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    #[cfg(unix)]
    pub async fn make_executable(&self, box_id: u32, name: &str) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let path = self.box_dir(box_id).join(name);
        let mut perms = tokio::fs::metadata(&path).await?.permissions();
        perms.set_mode(perms.mode() | 0o755);
        tokio::fs::set_permissions(&path, perms).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_dir_layout() {
        let isolate = Isolate::new("isolate".to_string(), PathBuf::from("/var/lib/isolate"));
        assert_eq!(
            isolate.box_dir(7),
            PathBuf::from("/var/lib/isolate/7/box")
        );
    }

    #[tokio::test]
    async fn test_exec_in_box_rejects_empty_command() {
        let isolate = Isolate::new("true".to_string(), std::env::temp_dir());
        let err = isolate.exec_in_box(0, &[]).await.unwrap_err();
        assert!(matches!(err, EngineError::InternalError(_)));
    }
}
