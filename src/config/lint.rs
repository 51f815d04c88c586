//! Lint configuration: dialect, file selection and severity mapping.

use serde::{Deserialize, Serialize};

use crate::domain::{Dialect, RiskLevel, Severity};

fn default_error() -> Severity {
    Severity::Error
}

fn default_warning() -> Severity {
    Severity::Warning
}

/// Severity assigned to each risk level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityConfig {
    /// Data loss: DROP TABLE/COLUMN/SCHEMA, unfiltered DELETE, TRUNCATE (default: error)
    #[serde(default = "default_error")]
    pub destructive: Severity,

    /// Changes that may fail on existing rows (default: error)
    #[serde(default = "default_error")]
    pub data_dependent: Severity,

    /// Renames that break running application code (default: warning)
    #[serde(default = "default_warning")]
    pub backward_incompatible: Severity,

    /// Table locks such as non-concurrent index builds (default: warning)
    #[serde(default = "default_warning")]
    pub locking: Severity,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            destructive: Severity::Error,
            data_dependent: Severity::Error,
            backward_incompatible: Severity::Warning,
            locking: Severity::Warning,
        }
    }
}

/// Migration lint configuration (`migrate.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintConfig {
    /// SQL dialect; overridden by the `--dev-url` scheme
    #[serde(default)]
    pub dialect: Option<Dialect>,

    /// Minimum migration version prefix to lint (e.g., "20240101")
    /// Older migrations are still replayed into the schema catalog
    #[serde(default)]
    pub check_after: Option<String>,

    /// Migration files to exclude from linting
    /// Supports glob patterns (e.g., "2023*") or exact filenames
    #[serde(default)]
    pub excluded_files: Vec<String>,

    /// Fail when migrate.sum is missing (default: false, only warn)
    #[serde(default)]
    pub require_sum: bool,

    /// Report unparsable statements as errors instead of warnings
    #[serde(default)]
    pub strict_parsing: bool,

    #[serde(default)]
    pub severity: SeverityConfig,
}

impl LintConfig {
    /// Severity findings of the given risk are reported with
    pub fn severity_for(&self, risk: RiskLevel) -> Severity {
        match risk {
            RiskLevel::Safe => Severity::Off,
            RiskLevel::Unknown => {
                if self.strict_parsing {
                    Severity::Error
                } else {
                    Severity::Warning
                }
            }
            RiskLevel::Locking => self.severity.locking,
            RiskLevel::BackwardIncompatible => self.severity.backward_incompatible,
            RiskLevel::DataDependent => self.severity.data_dependent,
            RiskLevel::Destructive => self.severity.destructive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severities() {
        let config = LintConfig::default();
        assert_eq!(config.severity_for(RiskLevel::Destructive), Severity::Error);
        assert_eq!(config.severity_for(RiskLevel::DataDependent), Severity::Error);
        assert_eq!(
            config.severity_for(RiskLevel::BackwardIncompatible),
            Severity::Warning
        );
        assert_eq!(config.severity_for(RiskLevel::Locking), Severity::Warning);
        assert_eq!(config.severity_for(RiskLevel::Unknown), Severity::Warning);
        assert_eq!(config.severity_for(RiskLevel::Safe), Severity::Off);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
dialect: mysql
check_after: "20240101"
excluded_files:
  - "2023*"
severity:
  data_dependent: warning
"#;
        let config: LintConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.dialect, Some(Dialect::MySql));
        assert_eq!(config.check_after.as_deref(), Some("20240101"));
        assert_eq!(config.excluded_files, vec!["2023*".to_string()]);
        assert_eq!(config.severity.data_dependent, Severity::Warning);
        assert_eq!(config.severity.destructive, Severity::Error);
        assert!(!config.require_sum);
    }

    #[test]
    fn test_strict_parsing() {
        let config = LintConfig {
            strict_parsing: true,
            ..Default::default()
        };
        assert_eq!(config.severity_for(RiskLevel::Unknown), Severity::Error);
    }
}
