//! Optional per-rule constraints carried in the `v3` slot of permission rules.
//!
//! # Purpose
//! A permission grant may be narrowed by where and when the connection comes
//! from: a source-IP range (allow or deny), a daily time-of-day window, and
//! an absolute expiry. All three are optional and combined with AND.
//!
//! # Wire format
//! `"<cidr>,<start>,<end>,<expire>"` with empty parts meaning unconstrained:
//! - cidr: `10.0.0.0/8` allows the range, `!10.0.0.0/8` denies it.
//! - start/end: `HH:MM +ZZZZ`; both present or both absent, same offset.
//!   The window is half-open `[start, end)` and wraps across midnight.
//! - expire: `YYYY-MM-DD HH:MM:SS +ZZZZ`.
//!
//! # Key invariants
//! - Evaluation fails closed: a source-IP policy with no caller IP available
//!   is unsatisfied.
//! - `Display` round-trips the persisted format exactly.
use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use ipnetwork::IpNetwork;
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Caller-supplied facts a constraint is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct AccessContext {
    pub ip: Option<IpAddr>,
    pub now: DateTime<Utc>,
}

impl Default for AccessContext {
    fn default() -> Self {
        Self {
            ip: None,
            now: Utc::now(),
        }
    }
}

impl AccessContext {
    pub fn new(ip: Option<IpAddr>) -> Self {
        Self {
            ip,
            now: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpPolicy {
    Allow(IpNetwork),
    Deny(IpNetwork),
}

/// A recurring time-of-day boundary in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTime {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Constraint {
    pub ip_policy: Option<IpPolicy>,
    pub start_time: Option<DailyTime>,
    pub end_time: Option<DailyTime>,
    pub expire_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("invalid ip range: {0}")]
    InvalidIpRange(String),
    #[error("invalid start_time: {0}")]
    InvalidStartTime(String),
    #[error("invalid end_time: {0}")]
    InvalidEndTime(String),
    #[error("invalid expire_date: {0}")]
    InvalidExpireDate(String),
    #[error("start_time and end_time must both be present or both absent")]
    UnbalancedWindow,
    #[error("timezone of start_time and end_time must be equal")]
    WindowOffsetMismatch,
}

impl Constraint {
    pub fn is_empty(&self) -> bool {
        self.ip_policy.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.expire_at.is_none()
    }

    /// All present parts must hold for the grant to apply.
    pub fn satisfied_by(&self, ctx: &AccessContext) -> bool {
        if !ip_in_range(ctx.ip, self.ip_policy) {
            return false;
        }
        if !in_window(ctx.now, self.start_time, self.end_time) {
            return false;
        }
        if let Some(expire) = self.expire_at {
            if ctx.now >= expire {
                return false;
            }
        }
        true
    }
}

/// Returns true when `ip` passes the range policy. No policy passes anything;
/// a policy with no caller IP fails closed.
pub fn ip_in_range(ip: Option<IpAddr>, policy: Option<IpPolicy>) -> bool {
    match (ip, policy) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(ip), Some(IpPolicy::Allow(range))) => range.contains(ip),
        (Some(ip), Some(IpPolicy::Deny(range))) => !range.contains(ip),
    }
}

/// Returns true when `now` falls in the half-open daily window `[start, end)`
/// evaluated in the window's own offset. A window crossing midnight
/// (start > end) wraps. One-sided windows never match.
pub fn in_window(now: DateTime<Utc>, start: Option<DailyTime>, end: Option<DailyTime>) -> bool {
    match (start, end) {
        (None, None) => true,
        (Some(start), Some(end)) => {
            let local = now.with_timezone(&start.offset).time();
            if start.time <= end.time {
                local >= start.time && local < end.time
            } else {
                local >= start.time || local < end.time
            }
        }
        _ => false,
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.offset.local_minus_utc();
        let sign = if secs < 0 { '-' } else { '+' };
        let secs = secs.abs();
        write!(
            f,
            "{} {}{:02}{:02}",
            self.time.format("%H:%M"),
            sign,
            secs / 3600,
            (secs % 3600) / 60
        )
    }
}

impl FromStr for DailyTime {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let time =
            NaiveTime::parse_from_str(raw, "%H:%M %z").map_err(|err| err.to_string())?;
        let offset: FixedOffset = raw
            .split_whitespace()
            .nth(1)
            .unwrap_or("+0000")
            .parse()
            .map_err(|err: chrono::ParseError| err.to_string())?;
        Ok(Self { time, offset })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(4);

        match &self.ip_policy {
            Some(IpPolicy::Allow(range)) => parts.push(range.to_string()),
            Some(IpPolicy::Deny(range)) => parts.push(format!("!{range}")),
            None => parts.push(String::new()),
        }
        match &self.start_time {
            Some(start) => parts.push(start.to_string()),
            None => parts.push(String::new()),
        }
        match &self.end_time {
            Some(end) => parts.push(end.to_string()),
            None => parts.push(String::new()),
        }
        match &self.expire_at {
            Some(expire) => parts.push(expire.format("%Y-%m-%d %H:%M:%S %z").to_string()),
            None => parts.push(String::new()),
        }

        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split(',').collect();

        let ip_policy = match parts.first() {
            Some(part) if !part.is_empty() => {
                if let Some(range) = part.strip_prefix('!') {
                    Some(IpPolicy::Deny(range.parse().map_err(
                        |err: ipnetwork::IpNetworkError| {
                            ConstraintError::InvalidIpRange(err.to_string())
                        },
                    )?))
                } else {
                    Some(IpPolicy::Allow(part.parse().map_err(
                        |err: ipnetwork::IpNetworkError| {
                            ConstraintError::InvalidIpRange(err.to_string())
                        },
                    )?))
                }
            }
            _ => None,
        };

        let start_time = match parts.get(1) {
            Some(part) if !part.is_empty() => {
                Some(
                    part.parse::<DailyTime>()
                        .map_err(ConstraintError::InvalidStartTime)?,
                )
            }
            _ => None,
        };
        let end_time = match parts.get(2) {
            Some(part) if !part.is_empty() => {
                Some(
                    part.parse::<DailyTime>()
                        .map_err(ConstraintError::InvalidEndTime)?,
                )
            }
            _ => None,
        };

        match (&start_time, &end_time) {
            (Some(_), None) | (None, Some(_)) => return Err(ConstraintError::UnbalancedWindow),
            (Some(start), Some(end)) => {
                if start.offset != end.offset {
                    return Err(ConstraintError::WindowOffsetMismatch);
                }
            }
            _ => {}
        }

        let expire_at = match parts.get(3) {
            Some(part) if !part.is_empty() => Some(
                DateTime::parse_from_str(part, "%Y-%m-%d %H:%M:%S %z")
                    .map_err(|err| ConstraintError::InvalidExpireDate(err.to_string()))?,
            ),
            _ => None,
        };

        Ok(Constraint {
            ip_policy,
            start_time,
            end_time,
            expire_at,
        })
    }
}

impl Serialize for Constraint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match (&self.start_time, &self.end_time) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(ser::Error::custom(ConstraintError::UnbalancedWindow))
            }
            (Some(start), Some(end)) if start.offset != end.offset => {
                return Err(ser::Error::custom(ConstraintError::WindowOffsetMismatch))
            }
            _ => {}
        }
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn daily(h: u32, m: u32, offset_hours: i32) -> DailyTime {
        DailyTime {
            time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            offset: FixedOffset::east_opt(offset_hours * 3600).unwrap(),
        }
    }

    fn at(h: u32, m: u32, offset_hours: i32) -> DateTime<Utc> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn parse_full_constraint_round_trips() {
        let input = "!192.168.0.0/16,11:30 +0800,17:30 +0800,2030-09-10 16:30:00 +0800";
        let constraint: Constraint = input.parse().unwrap();

        assert!(matches!(
            constraint.ip_policy,
            Some(IpPolicy::Deny(range)) if range == "192.168.0.0/16".parse().unwrap()
        ));
        assert_eq!(constraint.start_time, Some(daily(11, 30, 8)));
        assert_eq!(constraint.end_time, Some(daily(17, 30, 8)));
        assert_eq!(constraint.to_string(), input);

        let input = "10.0.0.0/8,08:00 -0330,20:00 -0330,2030-01-01 00:00:00 -0330";
        let constraint: Constraint = input.parse().unwrap();
        assert!(matches!(constraint.ip_policy, Some(IpPolicy::Allow(_))));
        assert_eq!(constraint.to_string(), input);
    }

    #[test]
    fn parse_partial_and_empty_forms() {
        assert!("".parse::<Constraint>().unwrap().is_empty());
        assert!(",,".parse::<Constraint>().unwrap().is_empty());

        let constraint: Constraint = "10.0.0.0/8,,,".parse().unwrap();
        assert!(constraint.start_time.is_none());
        assert!(constraint.expire_at.is_none());

        let constraint: Constraint = ",,,2030-01-01 00:00:00 +0000".parse().unwrap();
        assert!(constraint.ip_policy.is_none());
        assert!(constraint.expire_at.is_some());
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            "10.0.0.0/8,,20:00 +0000,".parse::<Constraint>(),
            Err(ConstraintError::UnbalancedWindow)
        );
        assert_eq!(
            "10.0.0.0/8,20:00 +0000,,".parse::<Constraint>(),
            Err(ConstraintError::UnbalancedWindow)
        );
        assert_eq!(
            ",08:00 +0000,20:00 +0300,".parse::<Constraint>(),
            Err(ConstraintError::WindowOffsetMismatch)
        );
        assert!(matches!(
            "1000.0.0.0/8,,".parse::<Constraint>(),
            Err(ConstraintError::InvalidIpRange(_))
        ));
        assert!(matches!(
            "10.0.0.0/80,,".parse::<Constraint>(),
            Err(ConstraintError::InvalidIpRange(_))
        ));
        assert!(matches!(
            ",,,2030-13-01".parse::<Constraint>(),
            Err(ConstraintError::InvalidExpireDate(_))
        ));
    }

    #[test]
    fn ip_range_checks() {
        assert!(ip_in_range(None, None));

        let allow = IpPolicy::Allow("192.168.1.0/24".parse().unwrap());
        assert!(ip_in_range(Some("192.168.1.1".parse().unwrap()), Some(allow)));
        assert!(ip_in_range(Some("192.168.1.255".parse().unwrap()), Some(allow)));
        assert!(!ip_in_range(Some("192.168.2.1".parse().unwrap()), Some(allow)));
        assert!(!ip_in_range(None, Some(allow)));

        let deny = IpPolicy::Deny("192.168.1.0/24".parse().unwrap());
        assert!(!ip_in_range(Some("192.168.1.7".parse().unwrap()), Some(deny)));
        assert!(ip_in_range(Some("10.1.2.1".parse().unwrap()), Some(deny)));

        let v6 = IpPolicy::Allow("2001:db8::/64".parse().unwrap());
        assert!(ip_in_range(Some("2001:db8::1".parse().unwrap()), Some(v6)));
        assert!(!ip_in_range(Some("2001:db9::1".parse().unwrap()), Some(v6)));
    }

    #[test]
    fn window_is_half_open_and_wraps_midnight() {
        let start = Some(daily(10, 30, 3));
        let end = Some(daily(17, 30, 3));
        assert!(in_window(at(11, 30, 3), start, end));
        assert!(in_window(at(10, 30, 3), start, end));
        assert!(!in_window(at(17, 30, 3), start, end));
        assert!(!in_window(at(18, 30, 3), start, end));

        // Overnight window wraps.
        let start = Some(daily(20, 30, 3));
        let end = Some(daily(6, 30, 3));
        assert!(in_window(at(21, 30, 3), start, end));
        assert!(in_window(at(1, 30, 3), start, end));
        assert!(in_window(at(20, 30, 3), start, end));
        assert!(!in_window(at(6, 30, 3), start, end));
        assert!(!in_window(at(8, 30, 3), start, end));

        assert!(in_window(at(8, 30, 3), None, None));
        assert!(!in_window(at(8, 30, 3), None, Some(daily(23, 30, 3))));
    }

    #[test]
    fn expiry_is_exclusive_of_the_instant() {
        let constraint: Constraint = ",,,2030-01-01 00:00:00 +0000".parse().unwrap();
        let before = AccessContext {
            ip: None,
            now: Utc.with_ymd_and_hms(2029, 12, 31, 23, 59, 59).unwrap(),
        };
        let after = AccessContext {
            ip: None,
            now: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        };
        assert!(constraint.satisfied_by(&before));
        assert!(!constraint.satisfied_by(&after));
    }

    #[test]
    fn serde_round_trip_rejects_one_sided_window() {
        let constraint: Constraint = "10.0.0.0/8,08:00 +0300,20:00 +0300,".parse().unwrap();
        let json = serde_json::to_string(&constraint).unwrap();
        assert_eq!(json, "\"10.0.0.0/8,08:00 +0300,20:00 +0300,\"");
        let back: Constraint = serde_json::from_str(&json).unwrap();
        assert_eq!(constraint, back);

        let lopsided = Constraint {
            end_time: Some(daily(8, 35, 3)),
            ..Constraint::default()
        };
        assert!(serde_json::to_string(&lopsided).is_err());
    }

    #[test]
    fn expire_display_round_trips() {
        let date = FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2030, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            )
            .unwrap();
        let constraint = Constraint {
            expire_at: Some(date),
            ..Constraint::default()
        };
        assert_eq!(constraint.to_string(), ",,,2030-01-01 00:00:00 +0300");
    }
}
