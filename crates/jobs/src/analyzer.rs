//! Subprocess-backed roster analyzer.
//!
//! Spreadsheet parsing lives in a helper script next to the letter scripts;
//! the server talks to it over a one-JSON-document-on-stdout contract:
//!
//! ```text
//! <program> <analyzer script> <roster path>              -> RosterSummary
//! <program> <analyzer script> <roster path> --recipients -> [RosterRow, ...]
//! ```

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::de::DeserializeOwned;
use tokio::process::Command;

use letterdesk_core::roster::{RosterAnalyzer, RosterRow, RosterSummary};
use letterdesk_core::CoreError;

/// [`RosterAnalyzer`] that shells out to the analyzer script.
#[derive(Debug, Clone)]
pub struct ScriptRosterAnalyzer {
    program: String,
    script: PathBuf,
}

impl ScriptRosterAnalyzer {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
        }
    }

    async fn run<T: DeserializeOwned>(
        &self,
        roster: &Path,
        extra_arg: Option<&str>,
    ) -> Result<T, CoreError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.script)
            .arg(roster)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(arg) = extra_arg {
            cmd.arg(arg);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| CoreError::Analyzer(format!("could not start analyzer: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            return Err(CoreError::Analyzer(format!(
                "analyzer exited with code {code}: {}",
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(stdout.trim())
            .map_err(|e| CoreError::Analyzer(format!("unparseable analyzer output: {e}")))
    }
}

#[async_trait::async_trait]
impl RosterAnalyzer for ScriptRosterAnalyzer {
    async fn summarize(&self, roster: &Path) -> Result<RosterSummary, CoreError> {
        self.run(roster, None).await
    }

    async fn rows(&self, roster: &Path) -> Result<Vec<RosterRow>, CoreError> {
        self.run(roster, Some("--recipients")).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("analyze.sh");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "#!/bin/sh").unwrap();
        writeln!(f, "{body}").unwrap();
        path
    }

    #[tokio::test]
    async fn summarize_parses_json_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let script = write_script(
            tmp.path(),
            r#"echo '{"record_count":3,"distribution":{"SMS 2 + L0":2,"MED":1}}'"#,
        );

        let analyzer = ScriptRosterAnalyzer::new("sh", script);
        let summary = analyzer.summarize(&tmp.path().join("roster.xlsx")).await.unwrap();
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.distribution["MED"], 1);
    }

    #[tokio::test]
    async fn rows_mode_passes_the_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let script = write_script(
            tmp.path(),
            concat!(
                "if [ \"$2\" = \"--recipients\" ]; then\n",
                "  echo '[{\"email\":\"a@example.com\",\"recovery_action\":\"L1\",\"arrears\":120.5}]'\n",
                "else\n",
                "  echo '{}'\n",
                "fi"
            ),
        );

        let analyzer = ScriptRosterAnalyzer::new("sh", script);
        let rows = analyzer.rows(&tmp.path().join("roster.xlsx")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email.as_deref(), Some("a@example.com"));
        assert_eq!(rows[0].arrears, Some(120.5));
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let script = write_script(tmp.path(), "echo 'bad sheet' >&2\nexit 2");

        let analyzer = ScriptRosterAnalyzer::new("sh", script);
        let err = analyzer.summarize(&tmp.path().join("r.xlsx")).await.unwrap_err();
        assert_matches!(&err, CoreError::Analyzer(msg) if msg.contains("code 2") && msg.contains("bad sheet"));
    }

    #[tokio::test]
    async fn garbage_stdout_is_an_analyzer_error() {
        let tmp = tempfile::tempdir().unwrap();
        let script = write_script(tmp.path(), "echo 'not json at all'");

        let analyzer = ScriptRosterAnalyzer::new("sh", script);
        let err = analyzer.summarize(&tmp.path().join("r.xlsx")).await.unwrap_err();
        assert_matches!(err, CoreError::Analyzer(_));
    }

    #[tokio::test]
    async fn missing_program_is_an_analyzer_error() {
        let analyzer = ScriptRosterAnalyzer::new("/nonexistent/python999", "x.py");
        let err = analyzer.summarize(Path::new("r.xlsx")).await.unwrap_err();
        assert_matches!(&err, CoreError::Analyzer(msg) if msg.contains("could not start"));
    }
}
