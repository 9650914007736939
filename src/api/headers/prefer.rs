//! `Prefer` request header (RFC 7240) with the LDP `include`/`omit` parameters.

use crate::rdf::vocab::{ldp, trellis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferReturn {
    Minimal,
    Representation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    Lenient,
    Strict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefer {
    pub preference: Option<PreferReturn>,
    pub include: Vec<String>,
    pub omit: Vec<String>,
    pub handling: Option<Handling>,
    pub wait: Option<u32>,
    pub respond_async: bool,
}

impl Prefer {
    /// Parse a raw header value. Returns `None` when nothing recognisable is present.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let value = value?.trim();
        if value.is_empty() {
            return None;
        }

        let mut prefer = Prefer::default();
        let mut recognised = false;
        for param in split_unquoted(value) {
            let param = param.trim();
            let (key, raw) = match param.split_once('=') {
                Some((key, raw)) => (key.trim().to_ascii_lowercase(), Some(unquote(raw.trim()))),
                None => (param.to_ascii_lowercase(), None),
            };

            match (key.as_str(), raw) {
                ("return", Some(v)) => match v {
                    "minimal" => prefer.preference = Some(PreferReturn::Minimal),
                    "representation" => prefer.preference = Some(PreferReturn::Representation),
                    _ => continue,
                },
                ("include", Some(v)) => prefer.include.extend(v.split_whitespace().map(str::to_string)),
                ("omit", Some(v)) => prefer.omit.extend(v.split_whitespace().map(str::to_string)),
                ("handling", Some(v)) => match v {
                    "lenient" => prefer.handling = Some(Handling::Lenient),
                    "strict" => prefer.handling = Some(Handling::Strict),
                    _ => continue,
                },
                ("wait", Some(v)) => match v.parse() {
                    Ok(wait) => prefer.wait = Some(wait),
                    Err(_) => continue,
                },
                ("respond-async", None) => prefer.respond_async = true,
                _ => continue,
            }
            recognised = true;
        }

        recognised.then_some(prefer)
    }

    pub fn of_include(include: &[&str]) -> Self {
        Prefer {
            preference: Some(PreferReturn::Representation),
            include: include.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn of_omit(omit: &[&str]) -> Self {
        Prefer {
            preference: Some(PreferReturn::Representation),
            omit: omit.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Named graphs to render given the default set for the target.
    pub fn graphs(&self, defaults: &[&'static str]) -> Vec<String> {
        let minimal_container = self.include.iter().any(|g| g == ldp::PREFER_MINIMAL_CONTAINER);
        let mut graphs: Vec<String> = defaults
            .iter()
            .filter(|g| !minimal_container || (**g != ldp::PREFER_CONTAINMENT && **g != ldp::PREFER_MEMBERSHIP))
            .map(|g| g.to_string())
            .collect();

        for include in &self.include {
            if is_known_graph(include) && !graphs.contains(include) {
                graphs.push(include.clone());
            }
        }
        graphs.retain(|g| !self.omit.contains(g));
        graphs
    }
}

fn is_known_graph(iri: &str) -> bool {
    [
        trellis::PREFER_USER_MANAGED,
        trellis::PREFER_SERVER_MANAGED,
        trellis::PREFER_ACCESS_CONTROL,
        trellis::PREFER_AUDIT,
        ldp::PREFER_CONTAINMENT,
        ldp::PREFER_MEMBERSHIP,
    ]
    .contains(&iri)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn split_unquoted(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (idx, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' | ',' if !quoted => {
                parts.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_representation_with_include() {
        let prefer = Prefer::parse(Some(&format!(
            "return=representation; include=\"{} {}\"",
            ldp::PREFER_CONTAINMENT,
            trellis::PREFER_AUDIT
        )))
        .unwrap();

        assert_eq!(prefer.preference, Some(PreferReturn::Representation));
        assert_eq!(prefer.include, vec![ldp::PREFER_CONTAINMENT, trellis::PREFER_AUDIT]);
        assert!(prefer.omit.is_empty());
    }

    #[test]
    fn test_minimal_and_handling() {
        let prefer = Prefer::parse(Some("return=minimal; handling=lenient; wait=4; respond-async")).unwrap();
        assert_eq!(prefer.preference, Some(PreferReturn::Minimal));
        assert_eq!(prefer.handling, Some(Handling::Lenient));
        assert_eq!(prefer.wait, Some(4));
        assert!(prefer.respond_async);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let prefer = Prefer::parse(Some("return=other; handling=maybe; include=\"a\"")).unwrap();
        assert_eq!(prefer.preference, None);
        assert_eq!(prefer.handling, None);
        assert_eq!(prefer.include, vec!["a"]);

        assert_eq!(Prefer::parse(Some("return=blah")), None);
        assert_eq!(Prefer::parse(Some("   ")), None);
        assert_eq!(Prefer::parse(None), None);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = "return=representation; omit=\"http://www.w3.org/ns/ldp#PreferContainment\"";
        assert_eq!(Prefer::parse(Some(raw)), Prefer::parse(Some(raw)));
    }

    #[test]
    fn test_graph_projection() {
        let defaults = [trellis::PREFER_USER_MANAGED, ldp::PREFER_CONTAINMENT, ldp::PREFER_MEMBERSHIP];

        let prefer = Prefer::of_omit(&[ldp::PREFER_CONTAINMENT]);
        assert_eq!(
            prefer.graphs(&defaults),
            vec![trellis::PREFER_USER_MANAGED, ldp::PREFER_MEMBERSHIP]
        );

        let prefer = Prefer::of_include(&[ldp::PREFER_MINIMAL_CONTAINER, trellis::PREFER_AUDIT]);
        assert_eq!(
            prefer.graphs(&defaults),
            vec![trellis::PREFER_USER_MANAGED, trellis::PREFER_AUDIT]
        );

        let prefer = Prefer::of_include(&["http://example.org/unknown"]);
        assert_eq!(prefer.graphs(&defaults).len(), 3);
    }
}
