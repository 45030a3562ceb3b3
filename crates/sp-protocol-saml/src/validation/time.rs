//! Time-bound validation.
//!
//! Clock skew widens the acceptance window on both sides: NotBefore is
//! checked against `now + skew`, NotOnOrAfter against `now - skew`. The
//! bounds live in three places: the Conditions element, every
//! SubjectConfirmationData, and each AuthnStatement's session expiry.

use chrono::{DateTime, Duration, Utc};

use crate::error::{SamlError, SamlResult};
use crate::types::Assertion;

pub(crate) fn validate_time(
    assertion: &Assertion,
    now: DateTime<Utc>,
    skew: Duration,
) -> SamlResult<()> {
    let earliest = now + skew;
    let latest = now - skew;

    if let Some(conditions) = &assertion.conditions {
        check_not_before(conditions.not_before, earliest)?;
        check_not_on_or_after(conditions.not_on_or_after, latest)?;
    }

    if let Some(subject) = &assertion.subject {
        for confirmation in &subject.confirmations {
            if let Some(data) = &confirmation.data {
                check_not_before(data.not_before, earliest)?;
                check_not_on_or_after(data.not_on_or_after, latest)?;
            }
        }
    }

    for statement in assertion.authn_statements() {
        check_not_on_or_after(statement.session_not_on_or_after, latest)?;
    }

    Ok(())
}

fn check_not_before(bound: Option<DateTime<Utc>>, earliest: DateTime<Utc>) -> SamlResult<()> {
    match bound {
        Some(not_before) if not_before > earliest => Err(SamlError::AssertionNotYetValid),
        _ => Ok(()),
    }
}

fn check_not_on_or_after(bound: Option<DateTime<Utc>>, latest: DateTime<Utc>) -> SamlResult<()> {
    match bound {
        Some(not_on_or_after) if not_on_or_after <= latest => Err(SamlError::AssertionExpired),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AuthnStatement, Conditions, NameId, Statement, Subject, SubjectConfirmation,
        SubjectConfirmationData,
    };

    fn assertion_with_conditions(conditions: Conditions) -> Assertion {
        Assertion::new("https://idp.example.com")
            .with_subject(Subject::new(NameId::email("user@example.com")))
            .with_conditions(conditions)
    }

    #[test]
    fn assertion_within_window_is_accepted() {
        let now = Utc::now();
        let assertion = assertion_with_conditions(Conditions {
            not_before: Some(now - Duration::hours(1)),
            not_on_or_after: Some(now + Duration::hours(1)),
            conditions: Vec::new(),
        });
        validate_time(&assertion, now, Duration::zero()).unwrap();
    }

    #[test]
    fn just_expired_assertion_is_rejected() {
        let now = Utc::now();
        let assertion = assertion_with_conditions(Conditions {
            not_before: None,
            not_on_or_after: Some(now - Duration::seconds(1)),
            conditions: Vec::new(),
        });
        assert!(matches!(
            validate_time(&assertion, now, Duration::zero()),
            Err(SamlError::AssertionExpired)
        ));
    }

    #[test]
    fn not_on_or_after_is_an_exclusive_bound() {
        let now = Utc::now();
        let assertion = assertion_with_conditions(Conditions {
            not_before: None,
            not_on_or_after: Some(now),
            conditions: Vec::new(),
        });
        assert!(matches!(
            validate_time(&assertion, now, Duration::zero()),
            Err(SamlError::AssertionExpired)
        ));
    }

    #[test]
    fn clock_skew_rescues_a_future_not_before() {
        let now = Utc::now();
        let assertion = assertion_with_conditions(Conditions {
            not_before: Some(now + Duration::minutes(3)),
            not_on_or_after: Some(now + Duration::hours(1)),
            conditions: Vec::new(),
        });

        assert!(matches!(
            validate_time(&assertion, now, Duration::zero()),
            Err(SamlError::AssertionNotYetValid)
        ));
        validate_time(&assertion, now, Duration::minutes(5)).unwrap();
    }

    #[test]
    fn clock_skew_rescues_a_recent_expiry() {
        let now = Utc::now();
        let assertion = assertion_with_conditions(Conditions {
            not_before: None,
            not_on_or_after: Some(now - Duration::minutes(3)),
            conditions: Vec::new(),
        });
        validate_time(&assertion, now, Duration::minutes(5)).unwrap();
    }

    #[test]
    fn confirmation_data_bounds_are_checked() {
        let now = Utc::now();
        let mut assertion = Assertion::new("https://idp.example.com");
        assertion.subject = Some(
            Subject::new(NameId::email("user@example.com")).with_confirmation(
                SubjectConfirmation::bearer().with_data(SubjectConfirmationData {
                    not_on_or_after: Some(now - Duration::seconds(30)),
                    ..SubjectConfirmationData::default()
                }),
            ),
        );
        assert!(matches!(
            validate_time(&assertion, now, Duration::zero()),
            Err(SamlError::AssertionExpired)
        ));
    }

    #[test]
    fn session_expiry_is_checked() {
        let now = Utc::now();
        let assertion = Assertion::new("https://idp.example.com")
            .with_subject(Subject::new(NameId::email("user@example.com")))
            .with_statement(Statement::Authn(AuthnStatement {
                authn_instant: Some(now),
                session_not_on_or_after: Some(now - Duration::minutes(1)),
                ..AuthnStatement::default()
            }));
        assert!(matches!(
            validate_time(&assertion, now, Duration::zero()),
            Err(SamlError::AssertionExpired)
        ));
    }

    #[test]
    fn absent_bounds_pass() {
        let assertion = Assertion::new("https://idp.example.com");
        validate_time(&assertion, Utc::now(), Duration::zero()).unwrap();
    }
}
