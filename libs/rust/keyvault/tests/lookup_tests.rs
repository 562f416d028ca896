//! Lookup pipeline tests against a scripted transport.

use keyvault_lookup::{
    ErrorKind, KeyVaultError, KeyVaultLookup, Lookup, LookupOptions, SecretValue, VaultConfig,
    VaultSet,
};
use keyvault_test_utils::fixtures::{
    host_only_vault, options, secret_body, single_vault_set, two_vault_set, usable_vault,
};
use keyvault_test_utils::{MockReply, MockTransport, RecordingContext};
use serde_json::json;

fn lookup(transport: MockTransport) -> KeyVaultLookup<MockTransport> {
    KeyVaultLookup::with_transport(transport)
}

fn transport(lookup: &KeyVaultLookup<MockTransport>) -> &MockTransport {
    lookup.resolver().transport()
}

#[tokio::test]
async fn end_to_end_boolean_secret() {
    let lookup = lookup(
        MockTransport::new()
            .token("t", "XYZ")
            .secret("kv1", "app-token", MockReply::Json(secret_body("true", true))),
    );
    let ctx = RecordingContext::new();

    let outcome = lookup
        .lookup_key("keyvault::app::token", &options(single_vault_set()), &ctx)
        .await
        .unwrap();

    assert_eq!(outcome, Lookup::Found(SecretValue::Bool(true)));

    let requests = transport(&lookup).requests();
    assert_eq!(requests.len(), 2);

    let auth = &requests[0];
    assert_eq!(auth.method.as_str(), "POST");
    assert_eq!(auth.url, "https://login.windows.net/t/oauth2/token");
    assert_eq!(auth.form_value("grant_type"), Some("client_credentials"));
    assert_eq!(auth.form_value("client_id"), Some("c"));
    assert_eq!(auth.form_value("client_secret"), Some("s"));
    assert_eq!(auth.form_value("resource"), Some("https://vault.azure.net"));
    assert!(auth.accept_json);

    let fetch = &requests[1];
    assert_eq!(fetch.method.as_str(), "GET");
    assert_eq!(
        fetch.url,
        "https://kv1.vault.azure.net/secrets/app-token?api-version=2016-10-01"
    );
    assert_eq!(fetch.header_value("Authorization"), Some("Bearer XYZ"));
    assert!(fetch.accept_json);
}

#[tokio::test]
async fn values_are_coerced() {
    let cases = [
        ("true", SecretValue::Bool(true)),
        ("false", SecretValue::Bool(false)),
        ("42", SecretValue::Integer(42)),
        ("-7", SecretValue::Integer(-7)),
        ("4.5", SecretValue::String("4.5".to_string())),
        ("abc", SecretValue::String("abc".to_string())),
    ];

    for (wire, expected) in cases {
        let lookup = lookup(
            MockTransport::new()
                .token("t", "XYZ")
                .secret("kv1", "db-password", MockReply::Json(secret_body(wire, true))),
        );

        let outcome = lookup
            .lookup_key(
                "keyvault::db::password",
                &options(single_vault_set()),
                &RecordingContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, Lookup::Found(expected), "wire value {wire:?}");
    }
}

#[tokio::test]
async fn unprefixed_key_makes_no_http_calls() {
    let lookup = lookup(MockTransport::new());

    for key in ["db::password", "hiera::keyvault::x", "KEYVAULT::db"] {
        let outcome = lookup
            .lookup_key(key, &options(two_vault_set()), &RecordingContext::new())
            .await
            .unwrap();
        assert_eq!(outcome, Lookup::NotFound);
    }

    let outcome = lookup
        .lookup_key(42_i64, &options(two_vault_set()), &RecordingContext::new())
        .await
        .unwrap();
    assert_eq!(outcome, Lookup::NotFound);

    assert_eq!(transport(&lookup).request_count(), 0);
}

#[tokio::test]
async fn missing_vaults_option_is_fatal_even_for_unprefixed_keys() {
    let lookup = lookup(MockTransport::new());

    let err = lookup
        .lookup_key("plain", &LookupOptions::default(), &RecordingContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("vaults key is not present"));
    assert_eq!(transport(&lookup).request_count(), 0);
}

#[tokio::test]
async fn no_usable_vaults_is_fatal_before_network() {
    let vaults = VaultSet::new()
        .with_vault("a", host_only_vault("kv1"))
        .with_vault("b", VaultConfig::new("kv2", "t", "", "s"))
        .with_vault("c", VaultConfig::default());
    let lookup = lookup(MockTransport::new());
    let ctx = RecordingContext::new();

    let err = lookup
        .lookup_key("keyvault::db::password", &options(vaults), &ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, KeyVaultError::Configuration(_)));
    assert!(err.to_string().contains("no valid vaults found"));
    assert_eq!(transport(&lookup).request_count(), 0);
    assert_eq!(ctx.messages().len(), 3);
}

#[tokio::test]
async fn disabled_secret_is_not_found() {
    let lookup = lookup(
        MockTransport::new()
            .token("tenant-kv1", "A")
            .token("tenant-kv2", "B")
            .secret("kv1", "db-password", MockReply::Json(secret_body("42", false)))
            .secret("kv2", "db-password", MockReply::Json(secret_body("43", true))),
    );
    let ctx = RecordingContext::new();

    let outcome = lookup
        .lookup_key("keyvault::db::password", &options(two_vault_set()), &ctx)
        .await
        .unwrap();

    assert_eq!(outcome, Lookup::NotFound);
    assert_eq!(transport(&lookup).secret_calls(), 1);
    assert!(ctx.explained("enabled: false"));
}

#[tokio::test]
async fn not_found_on_first_vault_stops_iteration() {
    let lookup = lookup(
        MockTransport::new()
            .token("tenant-kv1", "A")
            .token("tenant-kv2", "B")
            .secret("kv1", "db-password", MockReply::Status(404))
            .secret("kv2", "db-password", MockReply::Json(secret_body("found", true))),
    );

    let outcome = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(two_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, Lookup::NotFound);
    assert_eq!(transport(&lookup).secret_calls(), 1);
    assert_eq!(transport(&lookup).token_calls(), 1);
}

#[tokio::test]
async fn empty_response_falls_through_to_next_vault() {
    let lookup = lookup(
        MockTransport::new()
            .token("tenant-kv1", "A")
            .token("tenant-kv2", "B")
            .secret("kv1", "db-password", MockReply::Empty)
            .secret("kv2", "db-password", MockReply::Json(secret_body("found", true))),
    );
    let ctx = RecordingContext::new();

    let outcome = lookup
        .lookup_key("keyvault::db::password", &options(two_vault_set()), &ctx)
        .await
        .unwrap();

    assert_eq!(outcome, Lookup::Found(SecretValue::String("found".to_string())));
    assert_eq!(transport(&lookup).secret_calls(), 2);
    assert!(ctx.explained("empty response"));

    // Each vault is fetched with its own token.
    let requests = transport(&lookup).requests();
    let auth_headers: Vec<_> = requests
        .iter()
        .filter_map(|r| r.header_value("Authorization"))
        .collect();
    assert_eq!(auth_headers, vec!["Bearer A", "Bearer B"]);
}

#[tokio::test]
async fn json_null_counts_as_empty() {
    let lookup = lookup(
        MockTransport::new()
            .token("t", "XYZ")
            .secret("kv1", "db-password", MockReply::Json(serde_json::Value::Null)),
    );

    let outcome = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(single_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, Lookup::NotFound);
}

#[tokio::test]
async fn all_vaults_empty_is_not_found() {
    let lookup = lookup(
        MockTransport::new()
            .token("tenant-kv1", "A")
            .token("tenant-kv2", "B")
            .secret("kv1", "db-password", MockReply::Empty)
            .secret("kv2", "db-password", MockReply::Empty),
    );
    let ctx = RecordingContext::new();

    let outcome = lookup
        .lookup_key("keyvault::db::password", &options(two_vault_set()), &ctx)
        .await
        .unwrap();

    assert_eq!(outcome, Lookup::NotFound);
    assert_eq!(transport(&lookup).secret_calls(), 2);
    assert!(ctx.explained("not found"));
}

#[tokio::test]
async fn first_successful_vault_wins() {
    let lookup = lookup(
        MockTransport::new()
            .token("tenant-kv1", "A")
            .token("tenant-kv2", "B")
            .secret("kv1", "db-password", MockReply::Json(secret_body("one", true)))
            .secret("kv2", "db-password", MockReply::Json(secret_body("two", true))),
    );

    let outcome = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(two_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, Lookup::Found(SecretValue::String("one".to_string())));
    assert_eq!(transport(&lookup).token_calls(), 1);
}

#[tokio::test]
async fn auth_failure_on_first_vault_is_fatal() {
    let lookup = lookup(
        MockTransport::new()
            .token_reply("tenant-kv1", MockReply::Status(401))
            .token("tenant-kv2", "B")
            .secret("kv2", "db-password", MockReply::Json(secret_body("two", true))),
    );

    let err = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(two_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    match &err {
        KeyVaultError::Authentication { vault, source } => {
            assert_eq!(vault, "primary");
            assert_eq!(source.status_code(), Some(401));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport(&lookup).request_count(), 1);
}

#[tokio::test]
async fn token_response_without_access_token_is_fatal() {
    let lookup = lookup(
        MockTransport::new()
            .token_reply("t", MockReply::Json(json!({ "error": "invalid_client" })))
            .secret("kv1", "db-password", MockReply::Json(secret_body("x", true))),
    );

    let err = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(single_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, KeyVaultError::InvalidTokenResponse { .. }));
    assert_eq!(transport(&lookup).secret_calls(), 0);
}

#[tokio::test]
async fn unusable_entry_ahead_of_usable_one_fails_authentication() {
    let vaults = VaultSet::new()
        .with_vault("broken", host_only_vault("kv0"))
        .with_vault("good", usable_vault("kv1"));
    let lookup = lookup(
        MockTransport::new()
            .token("tenant-kv1", "A")
            .secret("kv1", "db-password", MockReply::Json(secret_body("x", true))),
    );
    let ctx = RecordingContext::new();

    let err = lookup
        .lookup_key("keyvault::db::password", &options(vaults), &ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, KeyVaultError::MissingCredentials { ref vault } if vault == "broken"));
    assert_eq!(transport(&lookup).request_count(), 0);
    assert!(ctx.explained("Vault broken has an invalid configuration"));
}

#[tokio::test]
async fn entry_without_vault_host_is_configuration_error() {
    let vaults = VaultSet::new()
        .with_vault(
            "nohost",
            VaultConfig {
                vault: None,
                ..usable_vault("kv0")
            },
        )
        .with_vault("good", usable_vault("kv1"));
    let lookup = lookup(MockTransport::new());

    let err = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(vaults),
            &RecordingContext::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("nohost"));
    assert_eq!(transport(&lookup).request_count(), 0);
}

#[tokio::test]
async fn server_error_on_fetch_is_fatal() {
    let lookup = lookup(
        MockTransport::new()
            .token("tenant-kv1", "A")
            .token("tenant-kv2", "B")
            .secret("kv1", "db-password", MockReply::Status(500))
            .secret("kv2", "db-password", MockReply::Json(secret_body("two", true))),
    );

    let err = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(two_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    match &err {
        KeyVaultError::Transport { vault, source } => {
            assert_eq!(vault, "primary");
            assert_eq!(source.status_code(), Some(500));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport(&lookup).secret_calls(), 1);
}

#[tokio::test]
async fn connection_failure_on_fetch_is_fatal() {
    let lookup = lookup(
        MockTransport::new()
            .token("t", "XYZ")
            .secret("kv1", "db-password", MockReply::Failure("connect timed out".to_string())),
    );

    let err = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(single_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("connect timed out"));
}

#[tokio::test]
async fn malformed_secret_response_is_fatal() {
    let lookup = lookup(
        MockTransport::new()
            .token("t", "XYZ")
            .secret("kv1", "db-password", MockReply::Json(json!({ "value": "x" }))),
    );

    let err = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(single_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, KeyVaultError::MalformedResponse { .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn enabled_secret_without_value_is_fatal() {
    let lookup = lookup(MockTransport::new().token("t", "XYZ").secret(
        "kv1",
        "db-password",
        MockReply::Json(json!({ "attributes": { "enabled": true } })),
    ));

    let err = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(single_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("missing value"));
}

#[tokio::test]
async fn vault_suffix_is_stripped_from_host() {
    let vaults = VaultSet::new().with_vault(
        "primary",
        VaultConfig::new("myvault.vault.azure.net", "t", "c", "s"),
    );
    let lookup = lookup(
        MockTransport::new()
            .token("t", "XYZ")
            .secret("myvault", "db-password", MockReply::Json(secret_body("7", true))),
    );

    let outcome = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(vaults),
            &RecordingContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, Lookup::Found(SecretValue::Integer(7)));
    assert_eq!(
        transport(&lookup).requests()[1].url,
        "https://myvault.vault.azure.net/secrets/db-password?api-version=2016-10-01"
    );
}

#[tokio::test]
async fn only_first_separator_becomes_dash() {
    let lookup = lookup(
        MockTransport::new()
            .token("t", "XYZ")
            .secret("kv1", "a-b::c", MockReply::Json(secret_body("v", true))),
    );

    let outcome = lookup
        .lookup_key(
            "keyvault::a::b::c",
            &options(single_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap();

    assert!(outcome.is_found());
}

#[tokio::test]
async fn reserved_characters_stay_in_the_secret_name() {
    let cases = [
        ("keyvault::db#prod", "db%23prod"),
        ("keyvault::100%", "100%25"),
        ("keyvault::my secret", "my%20secret"),
        ("keyvault::app::a b#c%d", "app-a%20b%23c%25d"),
    ];

    for (key, encoded) in cases {
        let name = keyvault_lookup::secret_name(key).unwrap();
        let lookup = lookup(
            MockTransport::new()
                .token("t", "XYZ")
                .secret("kv1", &name, MockReply::Json(secret_body("v", true))),
        );

        let outcome = lookup
            .lookup_key(key, &options(single_vault_set()), &RecordingContext::new())
            .await
            .unwrap();

        assert!(outcome.is_found(), "key {key:?}");
        assert_eq!(
            transport(&lookup).requests()[1].url,
            format!("https://kv1.vault.azure.net/secrets/{encoded}?api-version=2016-10-01"),
            "key {key:?}"
        );
    }
}

#[tokio::test]
async fn tenant_is_encoded_in_token_url() {
    let vaults =
        VaultSet::new().with_vault("primary", VaultConfig::new("kv1", "my tenant#1", "c", "s"));
    let lookup = lookup(
        MockTransport::new()
            .token("my tenant#1", "XYZ")
            .secret("kv1", "db-password", MockReply::Json(secret_body("v", true))),
    );

    lookup
        .lookup_key("keyvault::db::password", &options(vaults), &RecordingContext::new())
        .await
        .unwrap();

    assert_eq!(
        transport(&lookup).requests()[0].url,
        "https://login.windows.net/my%20tenant%231/oauth2/token"
    );
}

#[tokio::test]
async fn invalid_vault_host_is_configuration_error_before_auth() {
    let vaults =
        VaultSet::new().with_vault("primary", VaultConfig::new("bad host", "t", "c", "s"));
    let lookup = lookup(MockTransport::new().token("t", "XYZ"));

    let err = lookup
        .lookup_key("keyvault::db", &options(vaults), &RecordingContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(transport(&lookup).request_count(), 0);
}

#[tokio::test]
async fn missing_enabled_flag_is_not_found() {
    let lookup = lookup(MockTransport::new().token("t", "XYZ").secret(
        "kv1",
        "db-password",
        MockReply::Json(json!({ "value": "x", "attributes": {} })),
    ));

    let outcome = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(single_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, Lookup::NotFound);
    assert_eq!(transport(&lookup).secret_calls(), 1);
}

#[tokio::test]
async fn missing_attributes_object_is_fatal() {
    let lookup = lookup(MockTransport::new().token("t", "XYZ").secret(
        "kv1",
        "db-password",
        MockReply::Json(json!({ "value": "x" })),
    ));

    let err = lookup
        .lookup_key(
            "keyvault::db::password",
            &options(single_vault_set()),
            &RecordingContext::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, KeyVaultError::MalformedResponse { .. }));
}

#[tokio::test]
async fn options_from_host_document_keep_order() {
    let options = LookupOptions::from_value(json!({
        "vaults": {
            "second": { "vault": "kv2", "tenant": "t2", "client": "c2", "client_secret": "s2" },
            "first": { "vault": "kv1", "tenant": "t1", "client": "c1", "client_secret": "s1" }
        }
    }))
    .unwrap();
    let lookup = lookup(
        MockTransport::new()
            .token("t2", "B")
            .secret("kv2", "db-password", MockReply::Json(secret_body("from-kv2", true))),
    );

    let outcome = lookup
        .lookup_key("keyvault::db::password", &options, &RecordingContext::new())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Lookup::Found(SecretValue::String("from-kv2".to_string()))
    );
}

#[tokio::test]
async fn secret_values_never_reach_explanations() {
    let lookup = lookup(
        MockTransport::new()
            .token("t", "XYZ")
            .secret("kv1", "db-password", MockReply::Json(secret_body("hunter2-value", true))),
    );
    let ctx = RecordingContext::new();

    lookup
        .lookup_key("keyvault::db::password", &options(single_vault_set()), &ctx)
        .await
        .unwrap();

    assert!(!ctx.messages().is_empty());
    assert!(ctx.messages().iter().all(|m| !m.contains("hunter2-value")));
}

#[test]
fn blocking_lookup_runs_without_a_runtime() {
    let lookup = lookup(
        MockTransport::new()
            .token("t", "XYZ")
            .secret("kv1", "app-token", MockReply::Json(secret_body("-12", true))),
    );

    let outcome = lookup
        .lookup_key_blocking(
            "keyvault::app::token",
            &options(single_vault_set()),
            &RecordingContext::new(),
        )
        .unwrap();

    assert_eq!(outcome.into_option(), Some(SecretValue::Integer(-12)));
}
