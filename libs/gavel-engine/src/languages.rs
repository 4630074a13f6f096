// Language pipeline registry.
//
// Pure data: each pipeline describes where the source is staged, how it
// is compiled (if at all) and how it is run. Adding a language is a
// table change here or an entry in languages.json, never a code-path
// change in the lifecycle controller.
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A step applied after the source is staged, before compile/run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PreRunStep {
    /// Set the executable bit on a staged file.
    MakeExecutable { file: String },
    /// Prepend an interpreter line to the staged source.
    Shebang { line: String },
}

/// One language's staging/compile/run recipe. Commands are explicit
/// argument vectors; no shell is involved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagePipeline {
    pub name: String,
    pub source_file: String,
    pub extension: String,
    /// `None` means interpreted: no compile step.
    #[serde(default)]
    pub compile: Option<Vec<String>>,
    pub run: Vec<String>,
    #[serde(default)]
    pub pre_run: Vec<PreRunStep>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LanguagesFile {
    languages: Vec<LanguagePipeline>,
}

/// Immutable lookup table from language name to pipeline, constructed
/// once at startup.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    pipelines: HashMap<String, LanguagePipeline>,
}

fn pipeline(
    name: &str,
    source_file: &str,
    extension: &str,
    compile: Option<&[&str]>,
    run: &[&str],
) -> LanguagePipeline {
    LanguagePipeline {
        name: name.to_string(),
        source_file: source_file.to_string(),
        extension: extension.to_string(),
        compile: compile.map(|argv| argv.iter().map(|s| s.to_string()).collect()),
        run: run.iter().map(|s| s.to_string()).collect(),
        pre_run: Vec::new(),
    }
}

impl LanguageRegistry {
    /// The built-in pipeline table.
    pub fn builtin() -> Self {
        let table = vec![
            pipeline(
                "C",
                "main.c",
                "c",
                Some(&["/usr/bin/gcc", "-O2", "-o", "main", "main.c", "-Wall"]),
                &["./main"],
            ),
            pipeline(
                "C++",
                "main.cpp",
                "cpp",
                Some(&["/usr/bin/g++", "-O2", "-o", "main", "main.cpp", "-Wall"]),
                &["./main"],
            ),
            pipeline(
                "Rust",
                "main.rs",
                "rs",
                Some(&["rustc", "main.rs", "-o", "main"]),
                &["./main"],
            ),
            pipeline(
                "Go",
                "main.go",
                "go",
                Some(&["go", "build", "-o", "main", "main.go"]),
                &["./main"],
            ),
            pipeline("Python", "main.py", "py", None, &["/usr/bin/python3", "main.py"]),
            pipeline(
                "Javascript",
                "main.js",
                "js",
                None,
                &["/usr/bin/node", "main.js"],
            ),
            pipeline("Ruby", "main.rb", "rb", None, &["ruby", "main.rb"]),
            pipeline("PHP", "main.php", "php", None, &["php", "main.php"]),
            pipeline(
                "C#",
                "main.cs",
                "cs",
                Some(&["dotnet", "build", "-o", "out", "main.cs"]),
                &["dotnet", "out/main.dll"],
            ),
        ];

        let mut pipelines = HashMap::new();
        for entry in table {
            pipelines.insert(entry.name.clone(), entry);
        }
        Self { pipelines }
    }

    /// Load the table from a languages.json file, replacing the
    /// built-in defaults entirely.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let file: LanguagesFile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let mut pipelines = HashMap::new();
        for entry in file.languages {
            pipelines.insert(entry.name.clone(), entry);
        }
        Ok(Self { pipelines })
    }

    /// Pure lookup; an unknown name is a configuration error, not a crash.
    pub fn resolve(&self, name: &str) -> Result<&LanguagePipeline, EngineError> {
        self.pipelines
            .get(name)
            .ok_or_else(|| EngineError::UnsupportedLanguage(name.to_string()))
    }

    /// All configured language names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pipelines.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_known_language() {
        let registry = LanguageRegistry::builtin();
        let c = registry.resolve("C").unwrap();
        assert_eq!(c.source_file, "main.c");
        assert!(c.compile.is_some());
        assert_eq!(c.run, vec!["./main"]);
    }

    #[test]
    fn test_resolve_unknown_language() {
        let registry = LanguageRegistry::builtin();
        let err = registry.resolve("Brainfuck").unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedLanguage(name) if name == "Brainfuck"));
    }

    #[test]
    fn test_interpreted_language_has_no_compile_step() {
        let registry = LanguageRegistry::builtin();
        let python = registry.resolve("Python").unwrap();
        assert!(python.compile.is_none());
        assert_eq!(python.run, vec!["/usr/bin/python3", "main.py"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"{{
                "languages": [
                    {{
                        "name": "Bash",
                        "source_file": "main.sh",
                        "extension": "sh",
                        "run": ["./main.sh"],
                        "pre_run": [
                            {{"step": "shebang", "line": "#!/bin/bash"}},
                            {{"step": "make_executable", "file": "main.sh"}}
                        ]
                    }}
                ]
            }}"##
        )
        .unwrap();

        let registry = LanguageRegistry::load(file.path()).unwrap();
        let bash = registry.resolve("Bash").unwrap();
        assert!(bash.compile.is_none());
        assert_eq!(bash.pre_run.len(), 2);
        assert!(matches!(
            &bash.pre_run[0],
            PreRunStep::Shebang { line } if line == "#!/bin/bash"
        ));
        assert!(matches!(
            &bash.pre_run[1],
            PreRunStep::MakeExecutable { file } if file == "main.sh"
        ));
        // the file replaces the built-in table
        assert!(registry.resolve("C").is_err());
    }

    #[test]
    fn test_names_sorted() {
        let registry = LanguageRegistry::builtin();
        let names = registry.names();
        assert!(names.contains(&"Python".to_string()));
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }
}
