//! Shared proptest generators.

use keyvault_lookup::secrets::KEY_PREFIX;
use proptest::prelude::*;

/// Generate vault host names.
pub fn vault_host_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{2,22}"
}

/// Generate a single key segment without `::`.
pub fn key_segment_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

/// Generate `keyvault::`-prefixed keys with one to four segments.
pub fn keyvault_key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(key_segment_strategy(), 1..5)
        .prop_map(|segments| format!("{KEY_PREFIX}{}", segments.join("::")))
}

/// Generate keys outside the `keyvault::` namespace.
pub fn foreign_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z_]{1,20}(::[a-z_]{1,20}){0,3}",
        Just("KEYVAULT::db::password".to_string()),
        Just("keyvault:db".to_string()),
        Just(" keyvault::db".to_string()),
    ]
    .prop_filter("must not carry the prefix", |k| !k.starts_with(KEY_PREFIX))
}

/// Generate optionally signed decimal strings within `i64` range.
pub fn integer_string_strategy() -> impl Strategy<Value = (String, i64)> {
    (any::<i64>(), any::<bool>()).prop_map(|(n, plus)| {
        if plus && n >= 0 {
            (format!("+{n}"), n)
        } else {
            (n.to_string(), n)
        }
    })
}

/// Generate strings that coerce to neither a boolean nor an integer.
pub fn opaque_string_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z!@#$%^&*]{1,32}",
        "[0-9]{1,5}\\.[0-9]{1,5}",
        " [0-9]{1,5}",
        "[0-9]{1,5} ",
        "0x[0-9a-f]{1,8}",
    ]
    .prop_filter("must not be a boolean literal", |s| s != "true" && s != "false")
}
