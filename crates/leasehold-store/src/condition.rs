//! Conditional write expressions
//!
//! A [`Condition`] is evaluated by the store against the item currently held
//! under the target key, atomically with the write it guards.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};

use crate::model::{ATTR_AGGREGATE_ID, ATTR_OWNER_ID, ATTR_TIMESTAMP, LeaseRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// No item exists under the key
    Absent,
    /// An item exists and its expiry lies strictly before the given instant
    ExpiredBefore(DateTime<Utc>),
    /// An item exists and is held by the given owner
    OwnerIs(String),
    /// At least one of the nested conditions holds
    AnyOf(Vec<Condition>),
}

impl Condition {
    /// Condition guarding lease creation: absent, expired, or already ours.
    pub fn lockable(owner_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Condition::AnyOf(vec![
            Condition::Absent,
            Condition::ExpiredBefore(now),
            Condition::OwnerIs(owner_id.into()),
        ])
    }

    /// Condition guarding lease deletion
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Condition::OwnerIs(owner_id.into())
    }

    pub fn evaluate(&self, existing: Option<&LeaseRecord>) -> bool {
        match self {
            Condition::Absent => existing.is_none(),
            Condition::ExpiredBefore(now) => existing.is_some_and(|r| r.is_expired_at(*now)),
            Condition::OwnerIs(owner) => existing.is_some_and(|r| r.is_owned_by(owner)),
            Condition::AnyOf(conditions) => conditions.iter().any(|c| c.evaluate(existing)),
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Absent => write!(f, "attribute_not_exists({})", ATTR_AGGREGATE_ID),
            Condition::ExpiredBefore(now) => {
                write!(f, "{} < '{}'", ATTR_TIMESTAMP, now.to_rfc3339())
            }
            Condition::OwnerIs(owner) => write!(f, "{} = '{}'", ATTR_OWNER_ID, owner),
            Condition::AnyOf(conditions) => {
                for (i, c) in conditions.iter().enumerate() {
                    if i > 0 {
                        write!(f, " OR ")?;
                    }
                    write!(f, "{}", c)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_lockable_when_absent() {
        assert!(Condition::lockable("o1", at(10)).evaluate(None));
    }

    #[test]
    fn test_lockable_when_held_by_other() {
        let held = LeaseRecord::new("a", "o2", at(20));
        assert!(!Condition::lockable("o1", at(10)).evaluate(Some(&held)));
    }

    #[test]
    fn test_lockable_when_expired() {
        let stale = LeaseRecord::new("a", "o2", at(5));
        assert!(Condition::lockable("o1", at(10)).evaluate(Some(&stale)));
    }

    #[test]
    fn test_lockable_by_same_owner() {
        let held = LeaseRecord::new("a", "o1", at(20));
        assert!(Condition::lockable("o1", at(10)).evaluate(Some(&held)));
    }

    #[test]
    fn test_owned_by() {
        let held = LeaseRecord::new("a", "o1", at(20));
        assert!(Condition::owned_by("o1").evaluate(Some(&held)));
        assert!(!Condition::owned_by("o2").evaluate(Some(&held)));
        assert!(!Condition::owned_by("o1").evaluate(None));
    }

    #[test]
    fn test_display() {
        let rendered = Condition::lockable("o1", at(0)).to_string();
        assert_eq!(
            rendered,
            "attribute_not_exists(aggregate_id) OR timestamp < '1970-01-01T00:00:00+00:00' OR owner_id = 'o1'"
        );
        assert_eq!(Condition::owned_by("o1").to_string(), "owner_id = 'o1'");
    }

    proptest! {
        #[test]
        fn prop_other_owner_blocked_iff_live(expiry in 0i64..1_000, now in 0i64..1_000) {
            let record = LeaseRecord::new("a", "holder", at(expiry));
            let allowed = Condition::lockable("caller", at(now)).evaluate(Some(&record));
            prop_assert_eq!(allowed, expiry < now);
        }

        #[test]
        fn prop_same_owner_always_allowed(expiry in 0i64..1_000, now in 0i64..1_000) {
            let record = LeaseRecord::new("a", "holder", at(expiry));
            prop_assert!(Condition::lockable("holder", at(now)).evaluate(Some(&record)));
        }

        #[test]
        fn prop_expired_before_matches_record(offset_ms in -5_000i64..5_000) {
            let now = at(1_000);
            let record = LeaseRecord::new("a", "holder", now + Duration::milliseconds(offset_ms));
            prop_assert_eq!(
                Condition::ExpiredBefore(now).evaluate(Some(&record)),
                record.is_expired_at(now)
            );
        }
    }
}
