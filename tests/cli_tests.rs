//! # CLI Tests
//!
//! Runs the `pdeffer` binary on pages written to a temporary directory.
//! Logs go to stderr, so stdout stays machine-readable.


#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use std::process::{Command, Output};
    use tempfile::TempDir;

    fn run_pdeffer(args: &[&str], log_format: &str) -> Output {
        Command::new(env!("CARGO_BIN_EXE_pdeffer"))
            .args(args)
            .env("LOG_FORMAT", log_format)
            .env("PDEFFER_LOG_LEVEL", "debug")
            .env_remove("RUST_LOG")
            .output()
            .expect("run pdeffer")
    }

    /// JSON output parses cleanly even while the pipeline is logging
    #[test]
    fn test_json_output_is_not_mixed_with_logs() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("page.png");
        four_by_three_page().save(&path).expect("save page");
        let path = path.to_str().expect("utf-8 path");

        for log_format in ["pretty", "json"] {
            let output = run_pdeffer(&["--no-ocr", "--format", "json", path], log_format);
            assert!(output.status.success(), "exit status {:?}", output.status);

            let report: serde_json::Value =
                serde_json::from_slice(&output.stdout).expect("stdout is a JSON report");
            let tables = report["pages"][0]["tables"].as_array().expect("tables");
            assert_eq!(tables.len(), 1);
            assert_eq!(tables[0]["cells"].as_array().map(Vec::len), Some(4));
            assert!(tables[0].get("text").is_none());

            assert!(!output.stderr.is_empty(), "logs should be written to stderr");
        }
    }

    /// A page that cannot be read is reported and turns the exit status into 2
    #[test]
    fn test_unreadable_page_exits_with_two() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("missing.png");
        let path = path.to_str().expect("utf-8 path");

        let output = run_pdeffer(&["--no-ocr", "--format", "json", path], "json");
        assert_eq!(output.status.code(), Some(2));

        let report: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("stdout is a JSON report");
        assert!(report["pages"][0]["error"].is_string());
    }
}
