use listvault_core::db::open_db_in_memory;
use listvault_core::{
    CoreConfig, ListPayload, ListService, ListServiceError, OwnerPolicy, SchemaRegistry,
};
use serde_json::json;

fn payload(name: &str, items: &[(&str, serde_json::Value)]) -> ListPayload {
    ListPayload {
        name: name.to_string(),
        items: items
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
    }
}

#[test]
fn invalid_item_aborts_batch_before_any_write() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let err = service
        .upsert_batch(
            "1",
            vec![
                payload(
                    "Valid",
                    &[("k", json!({"type": "GA4GH_DRS", "dataset_guid": "g"}))],
                ),
                payload("Broken", &[("bad", json!({"type": "GA4GH_DRS"}))]),
            ],
        )
        .unwrap_err();

    match err {
        ListServiceError::Schema(schema_err) => assert_eq!(schema_err.item_key, "bad"),
        other => panic!("unexpected error: {other}"),
    }

    // No partial writes: the valid payload must not exist.
    assert_eq!(service.delete_all_lists("1").unwrap(), 0);
}

#[test]
fn wrongly_typed_required_field_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let err = service
        .upsert_batch(
            "1",
            vec![payload(
                "L",
                &[("k", json!({"type": "GA4GH_DRS", "dataset_guid": 7}))],
            )],
        )
        .unwrap_err();
    assert!(matches!(err, ListServiceError::Schema(_)));
}

#[test]
fn untyped_item_fails_generic_fallback() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let err = service
        .upsert_batch("1", vec![payload("L", &[("k", json!({"note": "x"}))])])
        .unwrap_err();
    assert!(matches!(err, ListServiceError::Schema(_)));
}

#[test]
fn unrecognized_type_tag_is_held_to_generic_fallback_only() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let outcome = service
        .upsert_batch(
            "1",
            vec![payload("L", &[("k", json!({"type": "FUTURE_KIND"}))])],
        )
        .unwrap();
    assert_eq!(outcome.created.len(), 1);
}

#[test]
fn saved_search_schema_requires_object_filter() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let err = service
        .upsert_batch(
            "1",
            vec![payload(
                "Searches",
                &[("s", json!({"type": "SAVED_SEARCH", "filter": "not-an-object"}))],
            )],
        )
        .unwrap_err();
    assert!(matches!(err, ListServiceError::Schema(_)));

    let outcome = service
        .upsert_batch(
            "1",
            vec![payload(
                "Searches",
                &[("s", json!({"type": "SAVED_SEARCH", "filter": {"tag": "rna"}}))],
            )],
        )
        .unwrap();
    assert_eq!(outcome.created.len(), 1);
}

#[test]
fn custom_definition_document_drives_validation() {
    let registry = SchemaRegistry::from_definition_str(
        r#"{
            "BOOKMARK": {
                "required": {"type": "string", "url": "string"},
                "optional": {"pinned": "boolean"}
            }
        }"#,
    )
    .unwrap();
    let config = CoreConfig::new(10, 10, registry);

    let mut conn = open_db_in_memory().unwrap();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let err = service
        .upsert_batch(
            "1",
            vec![payload("B", &[("b", json!({"type": "BOOKMARK"}))])],
        )
        .unwrap_err();
    assert!(matches!(err, ListServiceError::Schema(_)));

    let outcome = service
        .upsert_batch(
            "1",
            vec![payload(
                "B",
                &[("b", json!({"type": "BOOKMARK", "url": "https://example.com", "pinned": true}))],
            )],
        )
        .unwrap();
    assert_eq!(outcome.created.len(), 1);
}

#[test]
fn appended_items_are_validated_too() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let outcome = service
        .upsert_batch(
            "1",
            vec![payload(
                "L",
                &[("k", json!({"type": "GA4GH_DRS", "dataset_guid": "g"}))],
            )],
        )
        .unwrap();
    let id = outcome.created[0].id;

    let mut incoming = listvault_core::ItemMap::new();
    incoming.insert("bad".to_string(), json!({"type": "GA4GH_DRS"}));
    let err = service.append_items("1", id, incoming).unwrap_err();
    assert!(matches!(err, ListServiceError::Schema(_)));

    // The stored list is untouched.
    let fetched = service.get_list("1", id).unwrap();
    assert_eq!(fetched.items.len(), 1);
}
