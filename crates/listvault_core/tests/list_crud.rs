use listvault_core::db::open_db_in_memory;
use listvault_core::{
    response_map, CoreConfig, ItemMap, ListPayload, ListService, ListServiceError, OwnerPolicy,
};
use serde_json::json;
use uuid::Uuid;

fn drs_item(guid: &str) -> serde_json::Value {
    json!({"type": "GA4GH_DRS", "dataset_guid": guid})
}

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
fn create_get_delete_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let outcome = service
        .upsert_batch("1", vec![payload("L", &[("k", drs_item("g1"))])])
        .unwrap();
    let created = &outcome.created[0];

    let fetched = service.get_list("1", created.id).unwrap();
    assert_eq!(fetched.items, created.items);
    assert_eq!(fetched.items["k"], drs_item("g1"));

    service.delete_list("1", created.id).unwrap();
    let err = service.get_list("1", created.id).unwrap_err();
    assert!(matches!(err, ListServiceError::NotFound(id) if id == created.id));
}

#[test]
fn get_unknown_id_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let id = Uuid::new_v4();
    let err = service.get_list("1", id).unwrap_err();
    assert!(matches!(err, ListServiceError::NotFound(missing) if missing == id));
}

#[test]
fn replace_preserves_id_creator_and_created_time() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let outcome = service
        .upsert_batch("1", vec![payload("L", &[("k", drs_item("g1"))])])
        .unwrap();
    let created = outcome.created[0].clone();

    let replaced = service
        .replace_list(
            "1",
            created.id,
            payload("Renamed", &[("other", drs_item("g2"))]),
        )
        .unwrap();

    assert_eq!(replaced.id, created.id);
    assert_eq!(replaced.creator, created.creator);
    assert_eq!(replaced.created_time, created.created_time);
    assert_eq!(replaced.authz, created.authz);
    assert_eq!(replaced.name, "Renamed");
    assert_eq!(replaced.items["other"], drs_item("g2"));
    assert!(replaced.updated_time >= replaced.created_time);
}

#[test]
fn replace_unknown_id_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let err = service
        .replace_list("1", Uuid::new_v4(), payload("L", &[("k", drs_item("g"))]))
        .unwrap_err();
    assert!(matches!(err, ListServiceError::NotFound(_)));
}

#[test]
fn append_merges_and_keeps_existing_items() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let outcome = service
        .upsert_batch("1", vec![payload("D", &[("first", drs_item("g1"))])])
        .unwrap();
    let id = outcome.created[0].id;

    let mut incoming = ItemMap::new();
    incoming.insert("second".to_string(), drs_item("g2"));
    let merged = service.append_items("1", id, incoming).unwrap();

    assert_eq!(merged.items.len(), 2);
    assert_eq!(merged.items["first"], drs_item("g1"));
    assert_eq!(merged.items["second"], drs_item("g2"));
}

#[test]
fn append_overwrites_colliding_keys() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let outcome = service
        .upsert_batch("1", vec![payload("D", &[("k", drs_item("old"))])])
        .unwrap();
    let id = outcome.created[0].id;

    let mut incoming = ItemMap::new();
    incoming.insert("k".to_string(), drs_item("new"));
    let merged = service.append_items("1", id, incoming).unwrap();

    assert_eq!(merged.items.len(), 1);
    assert_eq!(merged.items["k"], drs_item("new"));
}

#[test]
fn append_empty_mapping_fails() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let outcome = service
        .upsert_batch("1", vec![payload("D", &[("k", drs_item("g"))])])
        .unwrap();
    let id = outcome.created[0].id;

    let err = service.append_items("1", id, ItemMap::new()).unwrap_err();
    assert!(matches!(err, ListServiceError::EmptyItems { .. }));
}

#[test]
fn delete_unknown_id_reports_not_found_not_success() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let err = service.delete_list("1", Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, ListServiceError::NotFound(_)));
}

#[test]
fn delete_all_returns_count_and_spares_other_owners() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    service
        .upsert_batch(
            "1",
            vec![
                payload("A", &[("k", drs_item("g1"))]),
                payload("B", &[("k", drs_item("g2"))]),
            ],
        )
        .unwrap();
    let other = service
        .upsert_batch("2", vec![payload("A", &[("k", drs_item("g3"))])])
        .unwrap();

    assert_eq!(service.delete_all_lists("1").unwrap(), 2);
    assert_eq!(service.delete_all_lists("1").unwrap(), 0);

    let survivor = service.get_list("2", other.created[0].id).unwrap();
    assert_eq!(survivor.name, "A");
}

#[test]
fn deleted_name_creates_a_brand_new_id() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let first = service
        .upsert_batch("1", vec![payload("L", &[("k", drs_item("g"))])])
        .unwrap();
    let first_id = first.created[0].id;
    service.delete_list("1", first_id).unwrap();

    let second = service
        .upsert_batch("1", vec![payload("L", &[("k", drs_item("g"))])])
        .unwrap();
    assert_eq!(second.created.len(), 1);
    assert_ne!(second.created[0].id, first_id);
}

#[test]
fn response_map_keys_by_id_and_strips_id_from_body() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let outcome = service
        .upsert_batch("1", vec![payload("L", &[("k", drs_item("g"))])])
        .unwrap();
    let record = &outcome.created[0];

    let response = response_map(outcome.records());
    let body = &response[&record.id.to_string()];

    assert!(body.get("id").is_none());
    assert_eq!(body["name"], "L");
    assert_eq!(body["creator"], "1");
    assert_eq!(
        body["created_time"].as_str().unwrap(),
        record.created_time.to_rfc3339()
    );
}
