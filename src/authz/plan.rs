//! Plan catalogue and expiry arithmetic.
//!
//! Expiry is anchored on the wedding day (UTC midnight) and counted in
//! calendar days, so a 3-day plan for 2024-06-01 closes at 2024-06-04T00:00:00Z.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlanId {
    PlanA,
    PlanB,
    PlanC,
}

impl PlanId {
    pub const ALL: [PlanId; 3] = [PlanId::PlanA, PlanId::PlanB, PlanId::PlanC];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::PlanA => "plan_a",
            PlanId::PlanB => "plan_b",
            PlanId::PlanC => "plan_c",
        }
    }

    pub fn plan(&self) -> &'static Plan {
        match self {
            PlanId::PlanA => &PLANS[0],
            PlanId::PlanB => &PLANS[1],
            PlanId::PlanC => &PLANS[2],
        }
    }
}

impl Default for PlanId {
    fn default() -> Self {
        PlanId::PlanA
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan: {0}")]
pub struct UnknownPlan(pub String);

impl FromStr for PlanId {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan_a" => Ok(PlanId::PlanA),
            "plan_b" => Ok(PlanId::PlanB),
            "plan_c" => Ok(PlanId::PlanC),
            other => Err(UnknownPlan(other.to_string())),
        }
    }
}

/// Static reference data for one plan tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub id: PlanId,
    pub name: &'static str,
    pub description: &'static str,
    /// `None` means the event never expires.
    pub duration_days: Option<u32>,
}

impl Plan {
    pub fn is_unlimited(&self) -> bool {
        self.duration_days.is_none()
    }

    pub fn expiry_for(&self, event_date: NaiveDate) -> Option<DateTime<Utc>> {
        expiry_of(event_date, self.duration_days)
    }
}

pub static PLANS: [Plan; 3] = [
    Plan {
        id: PlanId::PlanA,
        name: "3-day plan",
        description: "Guests can upload for 3 days from the wedding day",
        duration_days: Some(3),
    },
    Plan {
        id: PlanId::PlanB,
        name: "7-day plan",
        description: "Guests can upload for 7 days from the wedding day",
        duration_days: Some(7),
    },
    Plan {
        id: PlanId::PlanC,
        name: "Lifetime",
        description: "Uploads never close on their own",
        duration_days: None,
    },
];

/// Midnight UTC of the wedding day.
pub fn anchor_of(event_date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&event_date.and_time(NaiveTime::default()))
}

/// `None` duration yields `None` (never expires). Far-future overflow saturates.
pub fn expiry_of(event_date: NaiveDate, duration_days: Option<u32>) -> Option<DateTime<Utc>> {
    let days = duration_days?;
    let end = event_date
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    Some(anchor_of(end))
}

/// Strict comparison: the expiry instant itself is still inside the window.
pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(expires_at) => now > expires_at,
        None => false,
    }
}

pub fn days_remaining(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    let expires_at = expires_at?;
    let millis = (expires_at - now).num_milliseconds();
    if millis <= 0 {
        return Some(0);
    }
    Some((millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn instant(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn three_day_plan_expires_one_second_after_the_window() {
        let expires = expiry_of(date("2024-06-01"), Some(3));
        assert_eq!(expires, Some(instant("2024-06-04T00:00:00Z")));

        let now = instant("2024-06-04T00:00:01Z");
        assert!(is_expired(expires, now));
        assert_eq!(days_remaining(expires, now), Some(0));
    }

    #[test]
    fn expiry_instant_itself_is_not_expired() {
        let expires = expiry_of(date("2024-06-01"), Some(3));
        assert!(!is_expired(expires, instant("2024-06-04T00:00:00Z")));
        assert!(is_expired(expires, instant("2024-06-04T00:00:00Z") + Duration::seconds(1)));
    }

    #[test]
    fn zero_day_plan_closes_at_the_wedding_day_midnight() {
        let expires = expiry_of(date("2024-06-01"), Some(0));
        assert_eq!(expires, Some(instant("2024-06-01T00:00:00Z")));
        assert!(is_expired(expires, instant("2024-06-01T00:00:01Z")));
    }

    #[test]
    fn unlimited_plans_never_expire() {
        let expires = expiry_of(date("2024-06-01"), None);
        assert_eq!(expires, None);

        let far_future = instant("2999-12-31T23:59:59Z");
        assert!(!is_expired(expires, far_future));
        assert_eq!(days_remaining(expires, far_future), None);
        assert!(PlanId::PlanC.plan().is_unlimited());
        assert_eq!(PlanId::PlanC.plan().expiry_for(date("1990-01-01")), None);
    }

    #[test]
    fn expiry_uses_calendar_days_across_leap_day() {
        let expires = expiry_of(date("2024-02-27"), Some(3));
        assert_eq!(expires, Some(instant("2024-03-01T00:00:00Z")));
    }

    #[test]
    fn days_remaining_rounds_partial_days_up() {
        let expires = Some(instant("2024-06-08T00:00:00Z"));
        assert_eq!(days_remaining(expires, instant("2024-06-01T00:00:00Z")), Some(7));
        assert_eq!(days_remaining(expires, instant("2024-06-07T23:00:00Z")), Some(1));
        assert_eq!(days_remaining(expires, instant("2024-06-01T00:00:01Z")), Some(7));
        assert_eq!(days_remaining(expires, instant("2024-06-09T00:00:00Z")), Some(0));
    }

    #[test]
    fn plan_ids_round_trip_through_their_wire_form() {
        for id in PlanId::ALL {
            assert_eq!(id.as_str().parse::<PlanId>(), Ok(id));
            assert_eq!(id.plan().id, id);
        }
        assert!("plan_z".parse::<PlanId>().is_err());
        assert_eq!(serde_json::to_string(&PlanId::PlanB).unwrap(), "\"plan_b\"");
    }
}
