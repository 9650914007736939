//! Vocabulary constants.

pub mod ldp {
    pub const NS: &str = "http://www.w3.org/ns/ldp#";

    pub const RESOURCE: &str = "http://www.w3.org/ns/ldp#Resource";
    pub const RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#RDFSource";
    pub const NON_RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#NonRDFSource";
    pub const CONTAINER: &str = "http://www.w3.org/ns/ldp#Container";
    pub const BASIC_CONTAINER: &str = "http://www.w3.org/ns/ldp#BasicContainer";
    pub const DIRECT_CONTAINER: &str = "http://www.w3.org/ns/ldp#DirectContainer";
    pub const INDIRECT_CONTAINER: &str = "http://www.w3.org/ns/ldp#IndirectContainer";

    pub const CONTAINS: &str = "http://www.w3.org/ns/ldp#contains";
    pub const MEMBER: &str = "http://www.w3.org/ns/ldp#member";
    pub const MEMBERSHIP_RESOURCE: &str = "http://www.w3.org/ns/ldp#membershipResource";
    pub const HAS_MEMBER_RELATION: &str = "http://www.w3.org/ns/ldp#hasMemberRelation";
    pub const IS_MEMBER_OF_RELATION: &str = "http://www.w3.org/ns/ldp#isMemberOfRelation";
    pub const INSERTED_CONTENT_RELATION: &str = "http://www.w3.org/ns/ldp#insertedContentRelation";
    pub const MEMBER_SUBJECT: &str = "http://www.w3.org/ns/ldp#MemberSubject";
    pub const INBOX: &str = "http://www.w3.org/ns/ldp#inbox";
    pub const CONSTRAINED_BY: &str = "http://www.w3.org/ns/ldp#constrainedBy";

    pub const PREFER_CONTAINMENT: &str = "http://www.w3.org/ns/ldp#PreferContainment";
    pub const PREFER_MEMBERSHIP: &str = "http://www.w3.org/ns/ldp#PreferMembership";
    pub const PREFER_MINIMAL_CONTAINER: &str = "http://www.w3.org/ns/ldp#PreferMinimalContainer";
}

pub mod trellis {
    pub const NS: &str = "http://www.trellisldp.org/ns/trellis#";

    pub const PREFER_USER_MANAGED: &str = "http://www.trellisldp.org/ns/trellis#PreferUserManaged";
    pub const PREFER_SERVER_MANAGED: &str =
        "http://www.trellisldp.org/ns/trellis#PreferServerManaged";
    pub const PREFER_ACCESS_CONTROL: &str =
        "http://www.trellisldp.org/ns/trellis#PreferAccessControl";
    pub const PREFER_AUDIT: &str = "http://www.trellisldp.org/ns/trellis#PreferAudit";

    pub const UNSUPPORTED_INTERACTION_MODEL: &str =
        "http://www.trellisldp.org/ns/trellis#UnsupportedInteractionModel";
    pub const INVALID_INTERACTION_MODEL: &str =
        "http://www.trellisldp.org/ns/trellis#InvalidInteractionModel";
    pub const INVALID_CARDINALITY: &str = "http://www.trellisldp.org/ns/trellis#InvalidCardinality";
    pub const INVALID_RANGE: &str = "http://www.trellisldp.org/ns/trellis#InvalidRange";
    pub const INVALID_PROPERTY: &str = "http://www.trellisldp.org/ns/trellis#InvalidProperty";
    pub const INVALID_TYPE: &str = "http://www.trellisldp.org/ns/trellis#InvalidType";

    pub const ADMINISTRATOR_AGENT: &str =
        "http://www.trellisldp.org/ns/trellis#AdministratorAgent";
    pub const ANONYMOUS_AGENT: &str = "http://www.trellisldp.org/ns/trellis#AnonymousAgent";
}

pub mod activity_streams {
    pub const NS: &str = "https://www.w3.org/ns/activitystreams#";
    pub const CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

    pub const CREATE: &str = "https://www.w3.org/ns/activitystreams#Create";
    pub const UPDATE: &str = "https://www.w3.org/ns/activitystreams#Update";
    pub const DELETE: &str = "https://www.w3.org/ns/activitystreams#Delete";
}

pub mod prov {
    pub const ACTIVITY: &str = "http://www.w3.org/ns/prov#Activity";
    pub const WAS_GENERATED_BY: &str = "http://www.w3.org/ns/prov#wasGeneratedBy";
    pub const WAS_ASSOCIATED_WITH: &str = "http://www.w3.org/ns/prov#wasAssociatedWith";
    pub const ACTED_ON_BEHALF_OF: &str = "http://www.w3.org/ns/prov#actedOnBehalfOf";
    pub const AT_TIME: &str = "http://www.w3.org/ns/prov#atTime";
}

pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
}

pub mod acl {
    pub const AUTHORIZATION: &str = "http://www.w3.org/ns/auth/acl#Authorization";
    pub const MODE: &str = "http://www.w3.org/ns/auth/acl#mode";
    pub const READ: &str = "http://www.w3.org/ns/auth/acl#Read";
    pub const WRITE: &str = "http://www.w3.org/ns/auth/acl#Write";
    pub const CONTROL: &str = "http://www.w3.org/ns/auth/acl#Control";
    pub const AGENT_CLASS: &str = "http://www.w3.org/ns/auth/acl#agentClass";
    pub const ACCESS_TO: &str = "http://www.w3.org/ns/auth/acl#accessTo";
    pub const DEFAULT: &str = "http://www.w3.org/ns/auth/acl#default";
}

pub mod dc {
    pub const MODIFIED: &str = "http://purl.org/dc/terms/modified";
    pub const HAS_PART: &str = "http://purl.org/dc/terms/hasPart";
    pub const FORMAT: &str = "http://purl.org/dc/terms/format";
    pub const EXTENT: &str = "http://purl.org/dc/terms/extent";
    pub const IS_PART_OF: &str = "http://purl.org/dc/terms/isPartOf";
}

pub mod foaf {
    pub const AGENT: &str = "http://xmlns.com/foaf/0.1/Agent";
}

pub mod memento {
    pub const ORIGINAL: &str = "original";
    pub const TIMEGATE: &str = "timegate";
    pub const TIMEMAP: &str = "timemap";
    pub const MEMENTO: &str = "memento";
}
