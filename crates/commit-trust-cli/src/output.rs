//! Outcome writers.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use commit_trust_core::Outcome;

/// Key under which the outcome is exported to later workflow steps.
const GITHUB_OUTPUT_KEY: &str = "outcome";

/// Print the outcome on stdout and export it when `GITHUB_OUTPUT` is set.
pub fn emit(outcome: &Outcome, pretty: bool) -> anyhow::Result<()> {
    let json = outcome.to_json().context("failed to serialize outcome")?;

    let mut stdout = std::io::stdout().lock();
    if pretty {
        let rendered =
            serde_json::to_string_pretty(outcome).context("failed to serialize outcome")?;
        writeln!(stdout, "{}", rendered)?;
    } else {
        writeln!(stdout, "{}", json)?;
    }
    stdout.flush()?;

    if let Some(path) = std::env::var_os("GITHUB_OUTPUT").filter(|p| !p.is_empty()) {
        append_github_output(Path::new(&path), &json)?;
    }
    Ok(())
}

/// Append `outcome=<json>` to a workflow output file.
pub fn append_github_output(path: &Path, json: &str) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open output file {}", path.display()))?;
    writeln!(file, "{}={}", GITHUB_OUTPUT_KEY, json)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
