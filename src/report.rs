//! Lint report rendering
//!
//! Aggregates findings per migration file and renders them as text for
//! humans or JSON for tooling. A clean run renders as empty text.

use colored::Colorize;
use serde::Serialize;

use crate::domain::{Finding, RiskLevel, Severity, Verdict};

/// Output format of `migrate lint`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Findings of one migration file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub name: String,
    pub findings: Vec<Finding>,
}

/// Result of a lint run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub files: Vec<FileReport>,
    pub verdict: Verdict,
    pub exit_code: i32,
}

impl Report {
    pub fn new(files: Vec<FileReport>, integrity_error: Option<String>) -> Self {
        let findings: Vec<Finding> = files
            .iter()
            .flat_map(|f| f.findings.iter().cloned())
            .collect();
        let verdict = Verdict::from_findings(files.len(), &findings, integrity_error);
        let exit_code = verdict.exit_code();
        Self {
            files,
            verdict,
            exit_code,
        }
    }

    /// Report for a directory that failed its integrity check
    pub fn integrity_failure(message: String) -> Self {
        Self::new(Vec::new(), Some(message))
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.files.iter().flat_map(|f| f.findings.iter())
    }
}

const CATEGORY_ORDER: [RiskLevel; 5] = [
    RiskLevel::Destructive,
    RiskLevel::DataDependent,
    RiskLevel::BackwardIncompatible,
    RiskLevel::Locking,
    RiskLevel::Unknown,
];

/// Render a report as text
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();

    if let Some(ref error) = report.verdict.integrity_error {
        out.push_str(&format!(
            "{} {}\n",
            "Migration directory integrity check failed:".red().bold(),
            error
        ));
        out.push_str("Run `migrate hash` if the change was intentional.\n");
        return out;
    }

    for file in &report.files {
        for risk in CATEGORY_ORDER {
            let findings: Vec<&Finding> = file.findings.iter().filter(|f| f.risk == risk).collect();
            if findings.is_empty() {
                continue;
            }

            out.push_str(&format!(
                "{}: {} detected:\n\n",
                file.name.bold(),
                risk.category()
            ));
            for finding in findings {
                let line = finding.format();
                let line = match finding.severity {
                    Severity::Error => line.red().to_string(),
                    _ => line.yellow().to_string(),
                };
                out.push_str(&format!("\t{}\n", line));
            }
            out.push('\n');
        }
    }

    if report.findings().next().is_none() {
        return out;
    }

    let verdict = &report.verdict;
    let summary = format!(
        "{} file(s) linted: {} error(s), {} warning(s)",
        verdict.files_linted, verdict.errors, verdict.warnings
    );
    if verdict.passed() {
        out.push_str(&format!("{}\n", summary.yellow()));
    } else {
        out.push_str(&format!("{}\n", summary.red().bold()));
    }

    out
}

/// Render a report as pretty-printed JSON
pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Render a report in the requested format
pub fn render(report: &Report, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => render_json(report),
    }
}
