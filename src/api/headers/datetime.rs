//! Memento negotiation values: the `Accept-Datetime` header and the
//! `version` query parameter.

use chrono::{DateTime, TimeZone, Utc};

/// `Accept-Datetime` (RFC 7089), an RFC 1123 date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptDatetime(DateTime<Utc>);

impl AcceptDatetime {
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let parsed = DateTime::parse_from_rfc2822(value?.trim()).ok()?;
        Some(AcceptDatetime(parsed.with_timezone(&Utc)))
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }
}

/// `?version=<epoch seconds>` addressing a single memento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version(DateTime<Utc>);

impl Version {
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let secs: i64 = value?.trim().parse().ok()?;
        if secs < 0 {
            return None;
        }
        Utc.timestamp_opt(secs, 0).single().map(Version)
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_datetime() {
        let parsed = AcceptDatetime::parse(Some("Wed, 31 May 2017 19:58:49 GMT")).unwrap();
        assert_eq!(parsed.instant().timestamp(), 1_496_260_729);
        assert_eq!(AcceptDatetime::parse(Some("yesterday")), None);
        assert_eq!(AcceptDatetime::parse(None), None);
    }

    #[test]
    fn test_version() {
        assert_eq!(
            Version::parse(Some("1496260729")).unwrap().instant().timestamp(),
            1_496_260_729
        );
        assert_eq!(Version::parse(Some("-5")), None);
        assert_eq!(Version::parse(Some("abc")), None);
        assert_eq!(Version::parse(Some("")), None);
    }
}
