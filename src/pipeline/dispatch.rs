//! Sequencing of the CDN and WAF queries for one address.

use std::fmt;
use std::net::IpAddr;

use crate::classifier::{Classifier, Match};
use crate::error::CheckError;

/// Which query failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStage {
    Cdn,
    Waf,
}

impl fmt::Display for CheckStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStage::Cdn => f.write_str("CDN"),
            CheckStage::Waf => f.write_str("WAF"),
        }
    }
}

/// Combined result of both queries for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationOutcome {
    Classified { cdn: Match, waf: Match },
    Failed { stage: CheckStage, cause: CheckError },
}

impl ClassificationOutcome {
    /// True when either query matched.
    pub fn is_matched(&self) -> bool {
        match self {
            ClassificationOutcome::Classified { cdn, waf } => cdn.matched || waf.matched,
            ClassificationOutcome::Failed { .. } => false,
        }
    }
}

/// Query CDN membership, then WAF membership.
///
/// A CDN failure skips the WAF query. A CDN match does not: both
/// queries run whenever the first one succeeds.
pub fn classify<C: Classifier + ?Sized>(classifier: &C, ip: IpAddr) -> ClassificationOutcome {
    let cdn = match classifier.check_cdn(ip) {
        Ok(m) => m,
        Err(cause) => {
            return ClassificationOutcome::Failed {
                stage: CheckStage::Cdn,
                cause,
            }
        }
    };

    let waf = match classifier.check_waf(ip) {
        Ok(m) => m,
        Err(cause) => {
            return ClassificationOutcome::Failed {
                stage: CheckStage::Waf,
                cause,
            }
        }
    };

    ClassificationOutcome::Classified { cdn, waf }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MockClassifier;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn unavailable(name: &str) -> CheckError {
        CheckError::RangesUnavailable {
            providers: vec![name.to_string()],
        }
    }

    #[test]
    fn test_cdn_queried_before_waf() {
        let mut mock = MockClassifier::new();
        let mut seq = Sequence::new();
        mock.expect_check_cdn()
            .with(eq(ip("8.8.8.8")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Match::miss()));
        mock.expect_check_waf()
            .with(eq(ip("8.8.8.8")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Match::miss()));

        let outcome = classify(&mock, ip("8.8.8.8"));
        assert_eq!(
            outcome,
            ClassificationOutcome::Classified {
                cdn: Match::miss(),
                waf: Match::miss()
            }
        );
        assert!(!outcome.is_matched());
    }

    #[test]
    fn test_cdn_error_skips_waf() {
        let mut mock = MockClassifier::new();
        mock.expect_check_cdn()
            .times(1)
            .returning(|_| Err(unavailable("fastly")));
        mock.expect_check_waf().times(0);

        let outcome = classify(&mock, ip("203.0.113.5"));
        assert_eq!(
            outcome,
            ClassificationOutcome::Failed {
                stage: CheckStage::Cdn,
                cause: unavailable("fastly")
            }
        );
    }

    #[test]
    fn test_cdn_match_still_queries_waf() {
        let mut mock = MockClassifier::new();
        mock.expect_check_cdn()
            .times(1)
            .returning(|_| Ok(Match::hit("cloudflare")));
        mock.expect_check_waf()
            .times(1)
            .returning(|_| Ok(Match::miss()));

        let outcome = classify(&mock, ip("104.16.0.1"));
        assert!(outcome.is_matched());
    }

    #[test]
    fn test_waf_error_after_cdn_match() {
        let mut mock = MockClassifier::new();
        mock.expect_check_cdn()
            .times(1)
            .returning(|_| Ok(Match::hit("cloudflare")));
        mock.expect_check_waf()
            .times(1)
            .returning(|_| Err(unavailable("mywaf")));

        let outcome = classify(&mock, ip("104.16.0.1"));
        assert_eq!(
            outcome,
            ClassificationOutcome::Failed {
                stage: CheckStage::Waf,
                cause: unavailable("mywaf")
            }
        );
        assert!(!outcome.is_matched());
    }

    #[test]
    fn test_waf_only_match() {
        let mut mock = MockClassifier::new();
        mock.expect_check_cdn().returning(|_| Ok(Match::miss()));
        mock.expect_check_waf()
            .returning(|_| Ok(Match::hit("sucuri")));

        assert!(classify(&mock, ip("192.88.134.1")).is_matched());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(CheckStage::Cdn.to_string(), "CDN");
        assert_eq!(CheckStage::Waf.to_string(), "WAF");
    }
}
