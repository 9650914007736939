//! Memento versioning contract and TimeMap rendering.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::BTreeSet;

use super::resource::Result;
use crate::model::{Resource, ResourceLookup};
use crate::rdf::Iri;

pub const LINK_FORMAT: &str = "application/link-format";

#[async_trait]
pub trait MementoService: Send + Sync {
    /// Snapshot the current state of a resource.
    async fn put(&self, resource: &Resource) -> Result<()>;

    /// The memento in effect at `time`.
    async fn get(&self, identifier: &Iri, time: DateTime<Utc>) -> Result<ResourceLookup>;

    /// All memento datetimes for a resource, oldest first.
    async fn mementos(&self, identifier: &Iri) -> Result<BTreeSet<DateTime<Utc>>>;
}

/// Memento datetimes are kept at one-second resolution, the precision of
/// both `Memento-Datetime` and the `version` query parameter.
pub fn memento_time(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(0)
}

/// Pick the memento for `time`: the latest one at or before it, else the earliest.
pub fn select_memento(
    mementos: &BTreeSet<DateTime<Utc>>,
    time: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    mementos
        .range(..=time)
        .next_back()
        .or_else(|| mementos.iter().next())
        .copied()
}

/// Renders `Link` values for the original resource, its TimeGate/TimeMap and mementos.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimemapGenerator;

impl TimemapGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Link header values advertising the versioning endpoints of `identifier`.
    pub fn links(&self, identifier: &str, mementos: &BTreeSet<DateTime<Utc>>) -> Vec<String> {
        let mut links = vec![
            format!("<{identifier}>; rel=\"original timegate\""),
            self.timemap_link(identifier, mementos),
        ];
        links.extend(mementos.iter().map(|time| memento_link(identifier, *time)));
        links
    }

    /// The body of an `application/link-format` TimeMap.
    pub fn timemap(&self, identifier: &str, mementos: &BTreeSet<DateTime<Utc>>) -> String {
        let mut entries = vec![
            format!("<{identifier}>; rel=\"original timegate\""),
            self.timemap_link(identifier, mementos).replace("rel=\"timemap\"", "rel=\"self timemap\""),
        ];
        entries.extend(mementos.iter().map(|time| memento_link(identifier, *time)));
        entries.join(",\n") + "\n"
    }

    fn timemap_link(&self, identifier: &str, mementos: &BTreeSet<DateTime<Utc>>) -> String {
        let mut link = format!(
            "<{identifier}?ext=timemap>; rel=\"timemap\"; type=\"{LINK_FORMAT}\""
        );
        if let (Some(from), Some(until)) = (mementos.first(), mementos.last()) {
            link.push_str(&format!(
                "; from=\"{}\"; until=\"{}\"",
                http_date(*from),
                http_date(*until)
            ));
        }
        link
    }
}

fn memento_link(identifier: &str, time: DateTime<Utc>) -> String {
    format!(
        "<{identifier}?version={}>; rel=\"memento\"; datetime=\"{}\"",
        time.timestamp(),
        http_date(time)
    )
}

/// RFC 1123 date as used in HTTP headers.
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn select_prefers_latest_before() {
        let mementos: BTreeSet<_> = [at(100), at(200), at(300)].into_iter().collect();
        assert_eq!(select_memento(&mementos, at(250)), Some(at(200)));
        assert_eq!(select_memento(&mementos, at(300)), Some(at(300)));
        assert_eq!(select_memento(&mementos, at(50)), Some(at(100)));
        assert_eq!(select_memento(&BTreeSet::new(), at(50)), None);
    }

    #[test]
    fn timemap_lists_every_memento() {
        let mementos: BTreeSet<_> = [at(1_496_260_729), at(1_496_261_000)].into_iter().collect();
        let body = TimemapGenerator::new().timemap("http://example.org/resource", &mementos);

        assert!(body.starts_with("<http://example.org/resource>; rel=\"original timegate\""));
        assert!(body.contains("rel=\"self timemap\""));
        assert!(body.contains("<http://example.org/resource?version=1496260729>; rel=\"memento\""));
        assert!(body.contains("from=\"Wed, 31 May 2017 19:58:49 GMT\""));
        assert_eq!(body.matches("rel=\"memento\"").count(), 2);
    }

    #[test]
    fn links_without_mementos_omit_range() {
        let links = TimemapGenerator::new().links("http://example.org/r", &BTreeSet::new());
        assert_eq!(links.len(), 2);
        assert!(!links[1].contains("from="));
    }
}
