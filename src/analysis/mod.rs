//! Change classification and risk analysis
//!
//! - `classifier`: statements -> semantic changes
//! - `catalog`: schema model replayed from migration history
//! - `analyzer`: changes -> risk levels

pub mod analyzer;
pub mod catalog;
pub mod classifier;

pub use analyzer::RiskAnalyzer;
pub use catalog::Catalog;
pub use classifier::classify;

use tracing::debug;

use crate::config::LintConfig;
use crate::domain::{Dialect, Finding, ParsedMigration, RiskLevel, Severity};

/// Analyze one migration file against the schema that precedes it
///
/// Safe changes, changes whose risk is configured `off` and changes
/// suppressed with `-- lint:ignore` produce no finding.
pub fn analyze_migration(
    migration: &ParsedMigration<'_>,
    catalog: &Catalog,
    dialect: Dialect,
    config: &LintConfig,
) -> Vec<Finding> {
    let mut analyzer = RiskAnalyzer::new(catalog, dialect);
    let mut findings = Vec::new();

    for (index, statement) in migration.statements.iter().enumerate() {
        for change in classify(statement, index) {
            let risk = analyzer.classify(&change);
            let assessment = (risk != RiskLevel::Safe).then(|| analyzer.assess(&change));
            analyzer.observe(&change);

            let Some(assessment) = assessment else {
                continue;
            };
            let Some(rule) = assessment.rule else {
                continue;
            };

            let severity = config.severity_for(assessment.risk);
            if severity == Severity::Off {
                continue;
            }

            if let Some(ref suppression) = statement.suppression {
                if suppression.covers(rule.code()) {
                    debug!(
                        "{}:{} {} suppressed by lint:ignore",
                        migration.file.name, statement.line, rule
                    );
                    continue;
                }
            }

            findings.push(Finding {
                file: migration.file.name.clone(),
                line: statement.line,
                rule,
                risk: assessment.risk,
                severity,
                message: assessment.message,
                change,
            });
        }
    }

    findings
}
