use crate::rdf::ntriples::{self, IoError};
use crate::rdf::{Graph, Triple};

pub const TEXT_TURTLE: &str = "text/turtle";
pub const APPLICATION_N_TRIPLES: &str = "application/n-triples";
pub const APPLICATION_SPARQL_UPDATE: &str = "application/sparql-update";

/// RDF serializations the server reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfSyntax {
    Turtle,
    NTriples,
}

impl RdfSyntax {
    pub const ALL: [RdfSyntax; 2] = [RdfSyntax::Turtle, RdfSyntax::NTriples];

    pub fn media_type(self) -> &'static str {
        match self {
            RdfSyntax::Turtle => TEXT_TURTLE,
            RdfSyntax::NTriples => APPLICATION_N_TRIPLES,
        }
    }

    /// Match a bare media type (no parameters), case-insensitively.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|syntax| syntax.media_type().eq_ignore_ascii_case(media_type.trim()))
    }
}

/// Reads, writes and updates RDF graphs.
pub trait IoService: Send + Sync {
    fn read(&self, body: &[u8], syntax: RdfSyntax, base: &str) -> Result<Graph, IoError>;

    fn write(&self, triples: &[Triple], syntax: RdfSyntax) -> String;

    fn update(&self, graph: &mut Graph, update: &str, base: &str) -> Result<(), IoError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIoService;

impl IoService for DefaultIoService {
    fn read(&self, body: &[u8], _syntax: RdfSyntax, base: &str) -> Result<Graph, IoError> {
        let text = std::str::from_utf8(body).map_err(|_| IoError::InvalidEncoding)?;
        ntriples::parse(text, base)
    }

    fn write(&self, triples: &[Triple], _syntax: RdfSyntax) -> String {
        ntriples::write(triples)
    }

    fn update(&self, graph: &mut Graph, update: &str, base: &str) -> Result<(), IoError> {
        ntriples::apply_update(graph, update, base)
    }
}
