use uuid::Uuid;

use crate::model::Session;
use crate::rdf::vocab::{activity_streams as as_, prov, rdf, trellis, xsd};
use crate::rdf::{Iri, Literal, Quad, Term};

/// Produces the audit records stored alongside each mutation.
pub trait AuditService: Send + Sync {
    fn creation(&self, subject: &Iri, session: &Session) -> Vec<Quad>;

    fn update(&self, subject: &Iri, session: &Session) -> Vec<Quad>;

    fn deletion(&self, subject: &Iri, session: &Session) -> Vec<Quad>;
}

/// Records each change as a PROV activity in the audit graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAuditService;

impl DefaultAuditService {
    fn activity(&self, subject: &Iri, session: &Session, activity_type: &str) -> Vec<Quad> {
        let graph = Iri::new(trellis::PREFER_AUDIT);
        let bnode = Term::BlankNode(Uuid::new_v4().simple().to_string());
        let at_time = Literal::typed(
            session.created.to_rfc3339(),
            Iri::new(xsd::DATE_TIME),
        );

        let mut quads = vec![
            Quad::new(graph.clone(), subject.clone(), Iri::new(prov::WAS_GENERATED_BY), bnode.clone()),
            Quad::new(graph.clone(), bnode.clone(), Iri::new(rdf::TYPE), Iri::new(prov::ACTIVITY)),
            Quad::new(graph.clone(), bnode.clone(), Iri::new(rdf::TYPE), Iri::new(activity_type)),
            Quad::new(graph.clone(), bnode.clone(), Iri::new(prov::WAS_ASSOCIATED_WITH), session.agent.clone()),
            Quad::new(graph.clone(), bnode.clone(), Iri::new(prov::AT_TIME), at_time),
        ];
        if let Some(delegate) = &session.delegated_by {
            quads.push(Quad::new(graph, bnode, Iri::new(prov::ACTED_ON_BEHALF_OF), delegate.clone()));
        }
        quads
    }
}

impl AuditService for DefaultAuditService {
    fn creation(&self, subject: &Iri, session: &Session) -> Vec<Quad> {
        self.activity(subject, session, as_::CREATE)
    }

    fn update(&self, subject: &Iri, session: &Session) -> Vec<Quad> {
        self.activity(subject, session, as_::UPDATE)
    }

    fn deletion(&self, subject: &Iri, session: &Session) -> Vec<Quad> {
        self.activity(subject, session, as_::DELETE)
    }
}
