//! Cache Key Deriver
//!
//! Deterministic fingerprint of the content-relevant subset of a request:
//! document type, municipality, institution, object description and value.
//! Address and date are deliberately excluded so near-identical requests
//! differing only in timestamp still hit the cache.

use sha2::{Digest, Sha256};

use crate::types::{DocumentType, RequestContext};

/// Stable cache key for a (type, context) pair.
///
/// Each selected field is length-prefixed before hashing, so adjacent fields
/// can never collide by concatenation. SHA-256 collision risk is negligible
/// at this application's scale.
pub fn request_key(doc_type: DocumentType, ctx: &RequestContext) -> String {
    let mut hasher = Sha256::new();
    for part in [
        doc_type.slug(),
        ctx.municipality.as_str(),
        ctx.institution.as_str(),
        ctx.object_description.as_str(),
        ctx.value.as_str(),
    ] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }

    let digest = hasher.finalize();
    let mut key = String::with_capacity(8 + digest.len() * 2);
    key.push_str("ai_data_");
    for byte in digest {
        key.push_str(&format!("{byte:02x}"));
    }
    key
}
