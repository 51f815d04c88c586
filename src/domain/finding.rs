//! Risk classification, findings and the run verdict

use serde::{Deserialize, Serialize};

use super::change::Change;

/// Risk of a change, ordered from harmless to most dangerous
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    /// The statement could not be parsed, so its risk is not known
    Unknown,
    /// Blocks writes while it runs
    Locking,
    /// Breaks application code still using the old shape
    BackwardIncompatible,
    /// May fail depending on the rows already in the table
    DataDependent,
    /// Loses data
    Destructive,
}

impl RiskLevel {
    /// Section heading used by the text reporter
    pub fn category(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Unknown => "unparsed statements",
            Self::Locking => "locking changes",
            Self::BackwardIncompatible => "backward incompatible changes",
            Self::DataDependent => "data dependent changes",
            Self::Destructive => "destructive changes",
        }
    }
}

/// Severity a risk level is reported with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    /// Findings are dropped entirely
    Off,
}

/// Stable rule codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rule {
    /// DROP SCHEMA
    DS101,
    /// DROP TABLE
    DS102,
    /// DROP COLUMN
    DS103,
    /// DELETE without WHERE or TRUNCATE
    DS104,
    /// Unique index or constraint on an existing table
    MF101,
    /// Nullable to non-nullable without backfill
    MF102,
    /// NOT NULL column without default on an existing table
    MF103,
    /// Column type change
    MF104,
    /// CHECK or FOREIGN KEY constraint validated against existing rows
    MF105,
    /// Table rename
    BC101,
    /// Column rename
    BC102,
    /// Non-concurrent index creation
    PG101,
    /// Unparsable statement
    SQ100,
}

impl Rule {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DS101 => "DS101",
            Self::DS102 => "DS102",
            Self::DS103 => "DS103",
            Self::DS104 => "DS104",
            Self::MF101 => "MF101",
            Self::MF102 => "MF102",
            Self::MF103 => "MF103",
            Self::MF104 => "MF104",
            Self::MF105 => "MF105",
            Self::BC101 => "BC101",
            Self::BC102 => "BC102",
            Self::PG101 => "PG101",
            Self::SQ100 => "SQ100",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A change together with its risk and an explanation
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// Migration file the change belongs to
    pub file: String,
    pub line: usize,
    pub rule: Rule,
    pub risk: RiskLevel,
    pub severity: Severity,
    pub message: String,
    pub change: Change,
}

impl Finding {
    pub fn format(&self) -> String {
        format!("L{}: {} [{}]", self.line, self.message, self.rule)
    }
}

/// Aggregated outcome of a lint run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Verdict {
    /// Number of migration files linted
    pub files_linted: usize,
    pub errors: usize,
    pub warnings: usize,
    /// Set when the migration directory failed its integrity check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity_error: Option<String>,
}

impl Verdict {
    pub fn from_findings(
        files_linted: usize,
        findings: &[Finding],
        integrity_error: Option<String>,
    ) -> Self {
        let errors = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        let warnings = findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count();

        Self {
            files_linted,
            errors,
            warnings,
            integrity_error,
        }
    }

    pub fn passed(&self) -> bool {
        self.errors == 0 && self.integrity_error.is_none()
    }

    /// Process exit code: 0 when passed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change::ChangeKind;

    fn finding(severity: Severity) -> Finding {
        Finding {
            file: "1_init.sql".to_string(),
            line: 1,
            rule: Rule::DS102,
            risk: RiskLevel::Destructive,
            severity,
            message: "Dropping table \"users\"".to_string(),
            change: Change::new("users", ChangeKind::DropTable, 1, 0),
        }
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Destructive > RiskLevel::DataDependent);
        assert!(RiskLevel::DataDependent > RiskLevel::BackwardIncompatible);
        assert!(RiskLevel::Locking > RiskLevel::Safe);
    }

    #[test]
    fn test_verdict_passes_without_errors() {
        let verdict = Verdict::from_findings(2, &[finding(Severity::Warning)], None);
        assert!(verdict.passed());
        assert_eq!(verdict.exit_code(), 0);
        assert_eq!(verdict.warnings, 1);
    }

    #[test]
    fn test_verdict_fails_on_error() {
        let verdict = Verdict::from_findings(
            1,
            &[finding(Severity::Error), finding(Severity::Warning)],
            None,
        );
        assert!(!verdict.passed());
        assert_eq!(verdict.exit_code(), 1);
        assert_eq!(verdict.errors, 1);
    }

    #[test]
    fn test_verdict_fails_on_integrity_error() {
        let verdict = Verdict::from_findings(0, &[], Some("checksum mismatch".to_string()));
        assert_eq!(verdict.exit_code(), 1);
    }

    #[test]
    fn test_finding_format() {
        assert_eq!(
            finding(Severity::Error).format(),
            "L1: Dropping table \"users\" [DS102]"
        );
    }
}
