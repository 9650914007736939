//! Interaction-model constraints on user-supplied graphs.

use std::collections::BTreeMap;

use crate::model::{InteractionModel, TRELLIS_DATA_PREFIX};
use crate::rdf::vocab::{acl, ldp, rdf, trellis};
use crate::rdf::{Graph, Iri, Term, Triple};

/// A rule broken by a candidate graph, with the offending triples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub constraint: Iri,
    pub triples: Vec<Triple>,
}

impl ConstraintViolation {
    pub fn new(constraint: &str, triples: Vec<Triple>) -> Self {
        Self {
            constraint: Iri::new(constraint),
            triples,
        }
    }
}

pub type Violations<'a> = Box<dyn Iterator<Item = ConstraintViolation> + Send + 'a>;

pub trait ConstraintService: Send + Sync {
    /// Violations of `graph` for `model`, where in-domain IRIs start with `domain`.
    fn constrained_by_in_domain<'a>(
        &'a self,
        model: InteractionModel,
        graph: &'a Graph,
        domain: &'a str,
    ) -> Violations<'a>;

    fn constrained_by<'a>(&'a self, model: InteractionModel, graph: &'a Graph) -> Violations<'a> {
        self.constrained_by_in_domain(model, graph, TRELLIS_DATA_PREFIX)
    }
}

const MEMBERSHIP_PROPERTIES: [&str; 4] = [
    ldp::MEMBERSHIP_RESOURCE,
    ldp::HAS_MEMBER_RELATION,
    ldp::IS_MEMBER_OF_RELATION,
    ldp::INSERTED_CONTENT_RELATION,
];

/// IRI-valued predicates whose objects must be IRIs.
const IRI_RANGE_PROPERTIES: [&str; 8] = [
    ldp::MEMBERSHIP_RESOURCE,
    ldp::HAS_MEMBER_RELATION,
    ldp::IS_MEMBER_OF_RELATION,
    ldp::INSERTED_CONTENT_RELATION,
    ldp::INBOX,
    acl::ACCESS_TO,
    acl::DEFAULT,
    acl::MODE,
];

/// The LDP rules. Server-managed properties and types stay out of user
/// content. Membership triples appear only on Direct/Indirect containers, at
/// most once each. Relation-valued predicates point at IRIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdpConstraintService;

impl LdpConstraintService {
    fn triple_violation(
        model: InteractionModel,
        triple: &Triple,
        domain: &str,
    ) -> Option<ConstraintViolation> {
        let predicate = triple.predicate.as_str();

        if predicate == ldp::CONTAINS {
            return Some(ConstraintViolation::new(trellis::INVALID_PROPERTY, vec![triple.clone()]));
        }

        if predicate == rdf::TYPE {
            if let Term::Iri(object) = &triple.object {
                if InteractionModel::from_iri(object.as_str()).is_some() {
                    return Some(ConstraintViolation::new(trellis::INVALID_TYPE, vec![triple.clone()]));
                }
            }
        }

        if MEMBERSHIP_PROPERTIES.contains(&predicate)
            && !matches!(
                model,
                InteractionModel::DirectContainer | InteractionModel::IndirectContainer
            )
        {
            return Some(ConstraintViolation::new(trellis::INVALID_PROPERTY, vec![triple.clone()]));
        }

        if IRI_RANGE_PROPERTIES.contains(&predicate) {
            let in_range = match &triple.object {
                Term::Iri(object) => {
                    // Membership targets inside the server must be plain resources.
                    predicate != ldp::MEMBERSHIP_RESOURCE
                        || !object.as_str().starts_with(domain)
                        || !object.as_str().contains(['#', '?'])
                }
                _ => false,
            };
            if !in_range {
                return Some(ConstraintViolation::new(trellis::INVALID_RANGE, vec![triple.clone()]));
            }
        }

        None
    }

    fn cardinality_violation(model: InteractionModel, graph: &Graph) -> Option<ConstraintViolation> {
        if !matches!(
            model,
            InteractionModel::DirectContainer | InteractionModel::IndirectContainer
        ) {
            return None;
        }

        let mut counts: BTreeMap<&str, Vec<Triple>> = BTreeMap::new();
        for triple in graph.iter() {
            let predicate = triple.predicate.as_str();
            if MEMBERSHIP_PROPERTIES.contains(&predicate) {
                counts.entry(predicate).or_default().push(triple.clone());
            }
        }

        let relations = counts.get(ldp::HAS_MEMBER_RELATION).map_or(0, Vec::len)
            + counts.get(ldp::IS_MEMBER_OF_RELATION).map_or(0, Vec::len);
        let resources = counts.get(ldp::MEMBERSHIP_RESOURCE).map_or(0, Vec::len);
        let inserted = counts.get(ldp::INSERTED_CONTENT_RELATION).map_or(0, Vec::len);

        let invalid = relations > 1 || resources > 1 || inserted > 1;
        invalid.then(|| {
            ConstraintViolation::new(
                trellis::INVALID_CARDINALITY,
                counts.into_values().flatten().collect(),
            )
        })
    }
}

impl ConstraintService for LdpConstraintService {
    fn constrained_by_in_domain<'a>(
        &'a self,
        model: InteractionModel,
        graph: &'a Graph,
        domain: &'a str,
    ) -> Violations<'a> {
        let per_triple = graph
            .iter()
            .filter_map(move |triple| Self::triple_violation(model, triple, domain));
        let cardinality = std::iter::once(()).filter_map(move |_| Self::cardinality_violation(model, graph));
        Box::new(per_triple.chain(cardinality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Literal;

    fn subject() -> Iri {
        Iri::new("trellis:data/resource")
    }

    fn triple(predicate: &str, object: impl Into<Term>) -> Triple {
        Triple::new(subject(), Iri::new(predicate), object)
    }

    fn graph(triples: Vec<Triple>) -> Graph {
        triples.into_iter().collect()
    }

    fn first(model: InteractionModel, graph: &Graph) -> Option<Iri> {
        LdpConstraintService
            .constrained_by(model, graph)
            .next()
            .map(|v| v.constraint)
    }

    #[test]
    fn compliant_graph_has_no_violations() {
        let g = graph(vec![
            triple("http://purl.org/dc/terms/title", Literal::simple("A title")),
            triple(rdf::TYPE, Iri::new("http://example.org/Type")),
        ]);
        for model in InteractionModel::ALL {
            assert_eq!(first(model, &g), None, "{model}");
        }
    }

    #[test]
    fn contains_is_server_managed() {
        let g = graph(vec![triple(ldp::CONTAINS, Iri::new("trellis:data/child"))]);
        assert_eq!(
            first(InteractionModel::BasicContainer, &g),
            Some(Iri::new(trellis::INVALID_PROPERTY))
        );
    }

    #[test]
    fn ldp_types_cannot_be_asserted() {
        let g = graph(vec![triple(rdf::TYPE, Iri::new(ldp::BASIC_CONTAINER))]);
        assert_eq!(
            first(InteractionModel::RdfSource, &g),
            Some(Iri::new(trellis::INVALID_TYPE))
        );
    }

    #[test]
    fn membership_properties_need_membership_container() {
        let g = graph(vec![triple(ldp::HAS_MEMBER_RELATION, Iri::new("http://example.org/member"))]);
        assert_eq!(
            first(InteractionModel::BasicContainer, &g),
            Some(Iri::new(trellis::INVALID_PROPERTY))
        );
    }

    #[test]
    fn direct_container_cardinality() {
        let relation = triple(ldp::HAS_MEMBER_RELATION, Iri::new("http://example.org/member"));
        let target = triple(ldp::MEMBERSHIP_RESOURCE, Iri::new("trellis:data/other"));

        assert_eq!(
            first(InteractionModel::DirectContainer, &graph(vec![relation.clone(), target.clone()])),
            None
        );
        assert_eq!(
            first(InteractionModel::DirectContainer, &graph(vec![target.clone()])),
            None
        );
        let two = triple(ldp::HAS_MEMBER_RELATION, Iri::new("http://example.org/other"));
        assert_eq!(
            first(InteractionModel::DirectContainer, &graph(vec![relation, two, target])),
            Some(Iri::new(trellis::INVALID_CARDINALITY))
        );
    }

    #[test]
    fn relation_objects_must_be_iris() {
        let g = graph(vec![
            triple(ldp::INBOX, Literal::simple("not an iri")),
        ]);
        assert_eq!(
            first(InteractionModel::RdfSource, &g),
            Some(Iri::new(trellis::INVALID_RANGE))
        );

        let fragment = graph(vec![
            triple(ldp::HAS_MEMBER_RELATION, Iri::new("http://example.org/member")),
            triple(ldp::MEMBERSHIP_RESOURCE, Iri::new("trellis:data/other#thing")),
        ]);
        assert_eq!(
            first(InteractionModel::DirectContainer, &fragment),
            Some(Iri::new(trellis::INVALID_RANGE))
        );
    }

    #[test]
    fn evaluation_is_lazy() {
        let g = graph(vec![
            triple(ldp::CONTAINS, Iri::new("trellis:data/a")),
            triple(ldp::CONTAINS, Iri::new("trellis:data/b")),
        ]);
        let mut violations = LdpConstraintService.constrained_by(InteractionModel::RdfSource, &g);
        assert!(violations.next().is_some());
        assert!(violations.next().is_some());
        assert!(violations.next().is_none());
    }

    struct EmptyConstraints;

    impl ConstraintService for EmptyConstraints {
        fn constrained_by_in_domain<'a>(
            &'a self,
            _model: InteractionModel,
            _graph: &'a Graph,
            domain: &'a str,
        ) -> Violations<'a> {
            assert_eq!(domain, TRELLIS_DATA_PREFIX);
            Box::new(std::iter::empty())
        }
    }

    #[test]
    fn default_method_uses_data_prefix() {
        let g = Graph::new();
        assert_eq!(EmptyConstraints.constrained_by(InteractionModel::RdfSource, &g).count(), 0);
    }
}
