// CLI commands for judging local files
use std::path::Path;

use anyhow::{bail, Context, Result};
use gavel_common::types::{ExecutionRequest, ResourceLimits, TestCase};
use gavel_engine::{JudgeConfig, JudgeEngine, LanguageRegistry};
use uuid::Uuid;

fn build_engine() -> Result<JudgeEngine> {
    let config = JudgeConfig::from_env();
    let registry = match &config.languages_file {
        Some(path) => LanguageRegistry::load(path)?,
        None => LanguageRegistry::builtin(),
    };
    Ok(JudgeEngine::new(config, registry))
}

fn parse_test_cases(content: &str) -> Result<Vec<TestCase>> {
    let cases: Vec<TestCase> =
        serde_json::from_str(content).context("failed to parse test-case file")?;
    if cases.is_empty() {
        bail!("test-case file contains no test cases");
    }
    Ok(cases)
}

pub async fn judge(
    file: &Path,
    language: &str,
    tests: &Path,
    mem: u64,
    time: f64,
    wall: f64,
) -> Result<()> {
    let source_code = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let tests_content = std::fs::read_to_string(tests)
        .with_context(|| format!("failed to read {}", tests.display()))?;
    let test_cases = parse_test_cases(&tests_content)?;

    let request = ExecutionRequest {
        id: Uuid::new_v4(),
        language: language.to_string(),
        source_code,
        test_cases,
        limits: ResourceLimits {
            memory_limit_kb: mem,
            cpu_time_limit_sec: time,
            wall_time_limit_sec: wall,
            ..ResourceLimits::default()
        },
    };

    println!("→ Judging {} ({})", file.display(), language);
    println!("  Test cases: {}", request.test_cases.len());
    println!();

    let engine = build_engine()?;
    let result = engine.judge(&request).await?;

    if let Some(diagnostic) = &result.compile_error {
        println!("✗ Compilation failed:");
        println!();
        println!("{diagnostic}");
        std::process::exit(1);
    }

    for (idx, report) in result.reports.iter().enumerate() {
        if report.passed {
            println!(
                "  ✓ Test {} passed ({:.3}s, {} KB)",
                idx + 1,
                report.cpu_time,
                report.max_memory_kb
            );
        } else {
            println!("  ✗ Test {} failed ({:?})", idx + 1, report.status);
            println!("    stdin:    {:?}", report.stdin.trim_end());
            println!("    stdout:   {:?}", report.stdout.trim_end());
            if !report.stderr.is_empty() {
                println!(
                    "    stderr:   {}",
                    report.stderr.lines().next().unwrap_or("")
                );
            }
        }
    }

    println!();
    println!(
        "→ Score: {}/{} ({:.0}%)",
        result.passed_count, result.total_count, result.score_percent
    );

    if result.passed_count < result.total_count {
        std::process::exit(1);
    }
    Ok(())
}

pub async fn run(file: &Path, language: &str, input: Option<&Path>) -> Result<()> {
    let source_code = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let input = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => String::new(),
    };

    println!("→ Running {} ({})", file.display(), language);
    println!();

    let engine = build_engine()?;
    let result = engine.run_single(language, &source_code, &input).await?;

    if let Some(diagnostic) = &result.compile_error {
        println!("✗ Compilation failed:");
        println!();
        println!("{diagnostic}");
        std::process::exit(1);
    }

    if let Some(report) = &result.report {
        println!("  Status:   {:?}", report.status);
        println!("  Exit:     {}", report.exit_code);
        println!("  CPU time: {:.3}s", report.cpu_time);
        println!("  Memory:   {} KB", report.max_memory_kb);
        println!();
        print!("{}", report.stdout);
        if !report.stderr.is_empty() {
            eprint!("{}", report.stderr);
        }
    }
    Ok(())
}

pub fn languages() -> Result<()> {
    let config = JudgeConfig::from_env();
    let registry = match &config.languages_file {
        Some(path) => LanguageRegistry::load(path)?,
        None => LanguageRegistry::builtin(),
    };

    println!("Configured languages:");
    for name in registry.names() {
        let pipeline = registry.resolve(&name)?;
        let kind = if pipeline.compile.is_some() {
            "compiled"
        } else {
            "interpreted"
        };
        println!("  {:<12} {} ({})", name, pipeline.source_file, kind);
    }
    Ok(())
}
