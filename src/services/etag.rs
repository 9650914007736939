use sha2::{Digest, Sha256};

use crate::model::Resource;

/// Computes the entity tag value (without quotes or `W/`) for a resource.
pub trait EtagGenerator: Send + Sync {
    fn etag(&self, resource: &Resource) -> String;
}

/// SHA-256 over the identifier, the modification time and, for binaries,
/// the content location.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEtagGenerator;

impl EtagGenerator for DefaultEtagGenerator {
    fn etag(&self, resource: &Resource) -> String {
        let mut hasher = Sha256::new();
        hasher.update(resource.identifier.as_str().as_bytes());
        hasher.update(b".");
        hasher.update(resource.modified.timestamp_micros().to_string().as_bytes());
        if let Some(binary) = &resource.binary {
            hasher.update(b".");
            hasher.update(binary.identifier.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}
