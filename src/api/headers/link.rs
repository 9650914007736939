/// One entry of a `Link` header: `<uri>; rel="a b"; key="value"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub uri: String,
    pub rels: Vec<String>,
}

impl Link {
    /// Parse a `Link` header value, which may hold several comma-separated links.
    /// Malformed entries are skipped.
    pub fn parse(value: &str) -> Vec<Link> {
        let mut links = Vec::new();
        let mut rest = value;
        while let Some(start) = rest.find('<') {
            let Some(end) = rest[start..].find('>').map(|e| start + e) else {
                break;
            };
            let uri = rest[start + 1..end].trim().to_string();
            let tail = &rest[end + 1..];
            let params_end = tail.find('<').unwrap_or(tail.len());
            let params = &tail[..params_end];

            let rels = params
                .split(';')
                .filter_map(|p| p.trim().split_once('='))
                .filter(|(k, _)| k.trim().eq_ignore_ascii_case("rel"))
                .flat_map(|(_, v)| {
                    v.trim()
                        .trim_end_matches(',')
                        .trim_matches('"')
                        .split_whitespace()
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .collect();

            if !uri.is_empty() {
                links.push(Link { uri, rels });
            }
            rest = &tail[params_end..];
        }
        links
    }

    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r == rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_type_link() {
        let links = Link::parse("<http://www.w3.org/ns/ldp#BasicContainer>; rel=\"type\"");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].uri, "http://www.w3.org/ns/ldp#BasicContainer");
        assert!(links[0].has_rel("type"));
    }

    #[test]
    fn test_multiple_links_and_rels() {
        let links = Link::parse(
            "<http://example.org/a>; rel=\"original timegate\", <http://example.org/b>; rel=type",
        );
        assert_eq!(links.len(), 2);
        assert!(links[0].has_rel("timegate"));
        assert!(links[1].has_rel("type"));
    }

    #[test]
    fn test_garbage() {
        assert!(Link::parse("not a link").is_empty());
        assert!(Link::parse("<unterminated; rel=type").is_empty());
    }
}
