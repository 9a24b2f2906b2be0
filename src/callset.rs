use crate::registry::{CallIdentifier, CheckRegistry};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Remote calls needed by the registered checks.
///
/// Checks are walked in registration order and each check's calls in declared
/// order; a call is kept the first time it is seen.
pub fn derive_call_set(registry: &CheckRegistry) -> Vec<CallIdentifier> {
    let mut seen: HashSet<&CallIdentifier> = HashSet::new();
    let mut calls = Vec::new();

    for descriptor in registry.all() {
        for call in &descriptor.apis {
            if seen.insert(call) {
                calls.push(call.clone());
            }
        }
    }

    calls
}

/// SHA-256 over the ordered call list, hex encoded
pub fn fingerprint(calls: &[CallIdentifier]) -> String {
    let mut hasher = Sha256::new();
    for call in calls {
        hasher.update(call.to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
