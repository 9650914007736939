use std::collections::BTreeSet;

use crate::model::TRELLIS_USER_PREFIX;
use crate::rdf::Iri;
use crate::rdf::vocab::trellis;

/// Maps an authenticated principal name onto an agent IRI.
pub trait AgentService: Send + Sync {
    fn as_agent(&self, principal: Option<&str>) -> Iri;

    fn is_admin(&self, principal: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultAgentService {
    admin_users: BTreeSet<String>,
}

impl DefaultAgentService {
    pub fn new(admin_users: impl IntoIterator<Item = String>) -> Self {
        Self {
            admin_users: admin_users.into_iter().collect(),
        }
    }
}

impl AgentService for DefaultAgentService {
    fn as_agent(&self, principal: Option<&str>) -> Iri {
        match principal.map(str::trim).filter(|p| !p.is_empty()) {
            None => Iri::new(trellis::ANONYMOUS_AGENT),
            Some(name) if self.is_admin(name) => Iri::new(trellis::ADMINISTRATOR_AGENT),
            Some(name) if name.contains("://") || name.starts_with("urn:") => Iri::new(name),
            Some(name) => Iri::new(format!("{TRELLIS_USER_PREFIX}{name}")),
        }
    }

    fn is_admin(&self, principal: &str) -> bool {
        self.admin_users.contains(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_principals() {
        let svc = DefaultAgentService::new(["root".to_string()]);
        assert_eq!(svc.as_agent(None), trellis::ANONYMOUS_AGENT);
        assert_eq!(svc.as_agent(Some("  ")), trellis::ANONYMOUS_AGENT);
        assert_eq!(svc.as_agent(Some("root")), trellis::ADMINISTRATOR_AGENT);
        assert_eq!(
            svc.as_agent(Some("https://example.org/users/1")),
            "https://example.org/users/1"
        );
        assert_eq!(svc.as_agent(Some("alice")), "trellis:user/alice");
    }
}
