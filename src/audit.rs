//! Parsing of `npm audit --json` output.
//!
//! Only the severity breakdown under `metadata.vulnerabilities` is read.
//! npm has emitted that block in the same shape since the v6 audit format.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AuditSummary {
    #[serde(default)]
    pub critical: u64,
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub moderate: u64,
    #[serde(default)]
    pub low: u64,
    #[serde(default)]
    pub info: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditVerdict {
    Clean,
    /// Moderate findings only.
    Advisory,
    /// At least one high or critical finding.
    Blocking,
}

#[derive(Error, Debug)]
pub enum AuditParseError {
    #[error("audit output is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("audit output has no metadata.vulnerabilities block")]
    MissingSeverities,
}

impl AuditSummary {
    pub fn parse(stdout: &str) -> Result<Self, AuditParseError> {
        let doc: Value = serde_json::from_str(stdout.trim())?;
        let block = doc
            .pointer("/metadata/vulnerabilities")
            .ok_or(AuditParseError::MissingSeverities)?;
        Ok(Self::deserialize(block)?)
    }

    pub fn verdict(&self) -> AuditVerdict {
        if self.critical > 0 || self.high > 0 {
            AuditVerdict::Blocking
        } else if self.moderate > 0 {
            AuditVerdict::Advisory
        } else {
            AuditVerdict::Clean
        }
    }

    /// Sum of all severities. Counts come from tool output, so it saturates.
    pub fn total(&self) -> u64 {
        [self.critical, self.high, self.moderate, self.low, self.info]
            .into_iter()
            .fold(0u64, u64::saturating_add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn summary(critical: u64, high: u64, moderate: u64, low: u64) -> AuditSummary {
        AuditSummary {
            critical,
            high,
            moderate,
            low,
            info: 0,
        }
    }

    #[test]
    fn test_parse_npm7_shape() {
        let out = r#"{
          "auditReportVersion": 2,
          "vulnerabilities": {},
          "metadata": {
            "vulnerabilities": {"info": 1, "low": 2, "moderate": 3, "high": 0, "critical": 0, "total": 6},
            "dependencies": {"prod": 10}
          }
        }"#;
        let s = AuditSummary::parse(out).unwrap();
        assert_eq!(s, AuditSummary { critical: 0, high: 0, moderate: 3, low: 2, info: 1 });
        assert_eq!(s.total(), 6);
    }

    #[test]
    fn test_parse_rejects_error_document() {
        let out = r#"{"error": {"code": "ENOLOCK", "summary": "This command requires an existing lockfile."}}"#;
        assert!(matches!(
            AuditSummary::parse(out),
            Err(AuditParseError::MissingSeverities)
        ));
    }

    #[test]
    fn test_parse_rejects_plain_text() {
        assert!(matches!(
            AuditSummary::parse("npm ERR! network request failed"),
            Err(AuditParseError::Json(_))
        ));
    }

    #[test]
    fn test_single_high_is_blocking_regardless_of_others() {
        assert_eq!(summary(0, 1, 0, 0).verdict(), AuditVerdict::Blocking);
        assert_eq!(summary(0, 1, 7, 9).verdict(), AuditVerdict::Blocking);
        assert_eq!(summary(2, 0, 0, 0).verdict(), AuditVerdict::Blocking);
    }

    #[test]
    fn test_moderate_only_is_advisory() {
        assert_eq!(summary(0, 0, 1, 4).verdict(), AuditVerdict::Advisory);
    }

    #[test]
    fn test_total_saturates_on_huge_counts() {
        let s = AuditSummary::parse(
            r#"{"metadata":{"vulnerabilities":{"low":18446744073709551615,"info":1}}}"#,
        )
        .unwrap();
        assert_eq!(s.total(), u64::MAX);
        assert_eq!(s.verdict(), AuditVerdict::Clean);
    }

    #[test]
    fn test_low_only_is_clean() {
        assert_eq!(summary(0, 0, 0, 4).verdict(), AuditVerdict::Clean);
    }
}
