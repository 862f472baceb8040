//! Order-independent fingerprint of an activation request.
//!
//! The fingerprint is the sorted skin keys followed by the sorted custom mod
//! ids, joined with [`SEPARATOR`]. It is a plain string rather than a digest:
//! only equality matters, and keeping the keys readable makes log lines useful.

use crate::selection::ActivationRequest;

/// Joins the individual keys of a fingerprint.
pub const SEPARATOR: &str = "|";

/// Compute the fingerprint of `request`.
///
/// Permutations of the same items produce the same string. An empty request
/// yields the empty string.
pub fn fingerprint(request: &ActivationRequest) -> String {
    let mut skin_keys: Vec<String> = request
        .skins()
        .iter()
        .map(|skin| skin.composite_key())
        .collect();
    skin_keys.sort_unstable();

    let mut custom_keys: Vec<&str> = request
        .customs()
        .iter()
        .map(|custom| custom.id.as_str())
        .collect();
    custom_keys.sort_unstable();

    let mut keys: Vec<&str> = Vec::with_capacity(skin_keys.len() + custom_keys.len());
    keys.extend(skin_keys.iter().map(String::as_str));
    keys.extend(custom_keys);
    keys.join(SEPARATOR)
}
