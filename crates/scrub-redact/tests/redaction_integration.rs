//! Integration tests for scrub-redact.
//!
//! These tests verify:
//! - Sensitive fields are masked in mappings and inside sequences
//! - The caller's tree is never modified
//! - Identifiers from `summary` mappings are masked consistently
//! - Raw text and bytes captures go through the same path

use proptest::prelude::*;
use scrub_redact::{
    alternate_mask, full_mask, partial_mask, IdentifierRegistry, MaskPolicy, NodeKind, Payload,
    RedactionIssue, RedactionPolicy, Redactor, Tree,
};
use serde_json::json;
use std::sync::Arc;

fn bearer_token() -> String {
    format!("Bearer {}", "e".repeat(104))
}

fn output_tree(redactor: &Redactor, payload: Payload) -> Tree {
    match redactor.redact(&payload, "test").output {
        Payload::Tree(tree) => tree,
        other => panic!("expected a tree, got {:?}", other),
    }
}

// ============================================================================
// Field Masking
// ============================================================================

#[test]
fn test_mapping_masks_each_policy() {
    let redactor = Redactor::default();
    let original = json!({
        "email": "test@example.com",
        "Bearer": "12345678",
        "Authorization": bearer_token(),
    });
    let before = original.clone();

    let out = output_tree(&redactor, Payload::from(&original));

    assert_eq!(out["email"], json!("*".repeat(16)));
    assert_eq!(out["Bearer"], json!("*".repeat(8)));
    assert_eq!(out["Authorization"], json!(format!("Bearer {}", "*".repeat(10))));

    // The caller's tree is untouched.
    assert_eq!(original, before);
    assert_eq!(original["Authorization"], json!(bearer_token()));
}

#[test]
fn test_sequence_of_mappings() {
    let redactor = Redactor::default();
    let original = json!([
        {"title": "Title"},
        {"email": "test@example.com"},
        {"Authorization": bearer_token()},
    ]);

    let out = output_tree(&redactor, Payload::from(&original));

    assert_eq!(
        out,
        json!([
            {"title": "Title"},
            {"email": "****************"},
            {"Authorization": "Bearer **********"},
        ])
    );
    assert_eq!(original[2]["Authorization"], json!(bearer_token()));
}

#[test]
fn test_key_order_is_preserved() {
    let redactor = Redactor::default();
    let out = output_tree(
        &redactor,
        Payload::from(r#"{"zeta": 1, "email": "a", "alpha": 2}"#),
    );
    let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["zeta", "email", "alpha"]);
}

#[test]
fn test_rule_names_are_case_insensitive() {
    let redactor = Redactor::default();
    let out = output_tree(
        &redactor,
        Payload::from(json!({"EMAIL": "ab", "UserName": "abcd", "AUTHORIZATION": "x"})),
    );
    assert_eq!(out, json!({"EMAIL": "**", "UserName": "a*c*", "AUTHORIZATION": ""}));
}

#[test]
fn test_literal_syntax_capture_is_masked() {
    let redactor = Redactor::default();
    let out = output_tree(
        &redactor,
        Payload::from("{'username': 'patron', 'active': True, 'cardId': None}"),
    );
    assert_eq!(out, json!({"username": "p*t*o*", "active": true, "cardId": null}));
}

#[test]
fn test_type_mismatch_is_reported_not_fatal() {
    let redactor = Redactor::default();
    let result = redactor.redact(
        &Payload::from(json!({"email": true, "title": "kept"})),
        "test",
    );

    assert!(result.applied);
    assert_eq!(
        result.output,
        Payload::Tree(json!({"email": "****", "title": "kept"}))
    );
    assert_eq!(
        result.issues,
        vec![RedactionIssue::TypeMismatch {
            key: "email".to_string(),
            policy: MaskPolicy::FullMask,
            found: NodeKind::Bool,
        }]
    );
}

// ============================================================================
// Identifier Consistency
// ============================================================================

#[test]
fn test_summary_identifiers_masked_as_keys_in_same_pass() {
    let redactor = Redactor::default();
    let out = output_tree(
        &redactor,
        Payload::from(json!({
            "summary": {"200300400": {"checkouts": 2}},
            "details": {"200300400": [{"title": "Title"}]}
        })),
    );

    let masked = alternate_mask("200300400");
    assert_eq!(masked, "2*0*0*4*0");
    assert!(out["summary"].get(&masked).is_some());
    assert!(out["details"].get(&masked).is_some());
    assert!(out["details"].get("200300400").is_none());
}

#[test]
fn test_identifiers_masked_in_later_payloads_until_reset() {
    let redactor = Redactor::default();
    output_tree(&redactor, Payload::from(json!({"summary": {"55501": {}}})));

    let later = redactor.redact(&Payload::from("GET /accounts/55501/holds"), "REQUEST");
    assert_eq!(later.render(), "GET /accounts/5*5*1/holds");

    let out = output_tree(&redactor, Payload::from(json!({"by_id": {"55501": 1}})));
    assert_eq!(out, json!({"by_id": {"5*5*1": 1}}));

    redactor.reset_registry();
    let out = output_tree(&redactor, Payload::from(json!({"by_id": {"55501": 1}})));
    assert_eq!(out, json!({"by_id": {"55501": 1}}));
}

#[test]
fn test_registry_shared_between_redactors() {
    let registry = Arc::new(IdentifierRegistry::new(32));
    let first = Redactor::with_registry(RedactionPolicy::default(), Arc::clone(&registry));
    let second = Redactor::with_registry(RedactionPolicy::default(), Arc::clone(&registry));

    output_tree(&first, Payload::from(json!({"summary": {"90210": {}}})));
    let out = output_tree(&second, Payload::from(json!({"90210": "x"})));
    assert_eq!(out, json!({"9*2*0": "x"}));
}

#[test]
fn test_registry_capacity_from_policy() {
    let policy = RedactionPolicy {
        registry_capacity: 2,
        ..RedactionPolicy::default()
    };
    let redactor = Redactor::new(policy);
    output_tree(
        &redactor,
        Payload::from(json!({"summary": {"111": {}, "222": {}, "333": {}}})),
    );
    assert_eq!(redactor.registry().snapshot(), vec!["222", "333"]);
}

#[test]
fn test_concurrent_redaction_passes() {
    let redactor = Arc::new(Redactor::default());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let redactor = Arc::clone(&redactor);
            std::thread::spawn(move || {
                for i in 0..25 {
                    let id = format!("{}00{}", t + 1, i);
                    let tree = json!({"summary": {id.clone(): {}}, "email": "x@y"});
                    let result = redactor.redact(&Payload::from(tree), "worker");
                    assert!(result.is_clean());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(redactor.registry().len(), 200);
}

// ============================================================================
// Text and Bytes Captures
// ============================================================================

#[test]
fn test_form_encoded_bytes_pass_through() {
    let redactor = Redactor::default();
    let raw = b"days_to_suspend=0&email_address=".as_slice();
    let result = redactor.redact(&Payload::from(raw), "REQ BODY");

    assert!(result.applied);
    assert_eq!(result.render(), "days_to_suspend=0&email_address=");
}

#[test]
fn test_json_bytes_are_masked_and_rendered() {
    let redactor = Redactor::default();
    let text = redactor.redact_to_text(
        &Payload::from(br#"{"cardName":"Main","limit":5}"#.as_slice()),
        "RES BODY",
    );
    assert_eq!(text, "{\n    \"cardName\":\"M*i*\",\n    \"limit\":5\n}");
}

#[test]
fn test_serialized_text_held_as_string_tree_is_masked() {
    let redactor = Redactor::default();
    let captured = json!("{'username': 'reader', 'email': 'me@example.com'}");

    let result = redactor.redact(&Payload::Tree(captured.clone()), "RES BODY");
    assert_eq!(
        result.output,
        Payload::Tree(json!({"username": "r*a*e*", "email": "**************"}))
    );
    assert!(!result.render().contains("me@example.com"));
    assert_eq!(captured, json!("{'username': 'reader', 'email': 'me@example.com'}"));
}

#[test]
fn test_non_finite_numbers_in_json_capture() {
    let redactor = Redactor::default();
    let tree = output_tree(
        &redactor,
        Payload::from(r#"{"email":"me@example.com","rate":Infinity,"v":[NaN]}"#),
    );
    assert_eq!(
        tree,
        json!({"email": "**************", "rate": "Infinity", "v": ["NaN"]})
    );
}

#[test]
fn test_wide_numeric_identifier_from_summary() {
    let redactor = Redactor::default();
    let text = redactor.redact_to_text(
        &Payload::from(r#"{"summary":{"123456789012345678901234567890":{}},"balance":123456789012345678901234567890}"#),
        "RES BODY",
    );
    assert_eq!(
        text,
        "{\n    \"summary\":{\n        \"1*3*5*7*9*1*3*5*7*9*1*3*5*7*9*\":{}\n    },\n    \"balance\":123456789012345678901234567890\n}"
    );
}

#[test]
fn test_headers_keep_order_and_duplicates() {
    let redactor = Redactor::default();
    let headers = vec![
        ("Set-Cookie".to_string(), "a=1".to_string()),
        ("authorization".to_string(), bearer_token()),
        ("Set-Cookie".to_string(), "b=2".to_string()),
    ];

    let out = redactor.redact_headers(&headers, "REQ HEADERS");
    assert_eq!(out.len(), 3);
    assert_eq!(out[0], headers[0]);
    assert_eq!(out[1].1, "Bearer **********");
    assert_eq!(out[2], headers[2]);
}

// ============================================================================
// Masking Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_full_and_alternate_preserve_length(s in ".{0,64}") {
        let n = s.chars().count();
        prop_assert_eq!(full_mask(&s).chars().count(), n);
        prop_assert_eq!(alternate_mask(&s).chars().count(), n);
    }

    #[test]
    fn prop_partial_mask_keeps_prefix(tok in "[A-Za-z0-9._-]{0,300}") {
        let masked = partial_mask(&format!("Bearer {}", tok));
        let rest = masked.strip_prefix("Bearer ").unwrap();
        prop_assert!(rest.chars().all(|c| c == '*'));
        prop_assert_eq!(rest.len(), tok.len() / 10);
    }

    #[test]
    fn prop_redaction_never_mutates_input(
        email in "[a-z]{1,12}@[a-z]{1,8}\\.com",
        title in "[A-Za-z ]{0,20}",
    ) {
        let redactor = Redactor::default();
        let original = json!({"title": title, "user": {"email": email}});
        let before = original.clone();
        let result = redactor.redact(&Payload::from(&original), "prop");
        prop_assert_eq!(&original, &before);

        let out = result.output.as_tree().cloned().unwrap();
        prop_assert_eq!(&out["title"], &before["title"]);
        prop_assert_eq!(out["user"]["email"].as_str().unwrap().len(), email.len());
    }
}
