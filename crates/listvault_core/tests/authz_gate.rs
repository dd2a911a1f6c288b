use listvault_core::db::open_db_in_memory;
use listvault_core::{
    AccessMethod, Authorizer, AuthzUnreachable, CoreConfig, ListPayload, ListService,
    ListServiceError, OwnerPolicy,
};
use serde_json::json;

/// Policy engine that refuses everything.
struct DenyAll;

impl Authorizer for DenyAll {
    fn authorize(
        &self,
        _user: &str,
        _method: AccessMethod,
        _resource: &str,
    ) -> Result<bool, AuthzUnreachable> {
        Ok(false)
    }
}

/// Policy engine that cannot be consulted at all.
struct Unreachable;

impl Authorizer for Unreachable {
    fn authorize(
        &self,
        _user: &str,
        _method: AccessMethod,
        _resource: &str,
    ) -> Result<bool, AuthzUnreachable> {
        Err(AuthzUnreachable {
            detail: "connection refused".to_string(),
        })
    }
}

fn payload(name: &str) -> ListPayload {
    ListPayload {
        name: name.to_string(),
        items: [(
            "k".to_string(),
            json!({"type": "GA4GH_DRS", "dataset_guid": "g"}),
        )]
        .into_iter()
        .collect(),
    }
}

#[test]
fn explicit_deny_is_authorization_denied_and_writes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();

    {
        let mut service = ListService::new(&mut conn, &config, DenyAll);
        let err = service.upsert_batch("1", vec![payload("L")]).unwrap_err();
        assert!(matches!(
            err,
            ListServiceError::AuthorizationDenied { user, method, .. }
                if user == "1" && method == AccessMethod::Create
        ));
    }

    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);
    assert_eq!(service.delete_all_lists("1").unwrap(), 0);
}

#[test]
fn unreachable_policy_engine_is_distinct_from_deny() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, Unreachable);

    let err = service.upsert_batch("1", vec![payload("L")]).unwrap_err();
    assert!(matches!(
        err,
        ListServiceError::AuthorizationUnreachable(inner) if inner.detail == "connection refused"
    ));
}

#[test]
fn every_operation_is_gated() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();

    let id = {
        let mut service = ListService::new(&mut conn, &config, OwnerPolicy);
        let outcome = service.upsert_batch("1", vec![payload("L")]).unwrap();
        outcome.created[0].id
    };

    let mut service = ListService::new(&mut conn, &config, DenyAll);
    assert!(matches!(
        service.get_list("1", id),
        Err(ListServiceError::AuthorizationDenied { .. })
    ));
    assert!(matches!(
        service.replace_list("1", id, payload("L2")),
        Err(ListServiceError::AuthorizationDenied { .. })
    ));
    assert!(matches!(
        service.append_items("1", id, Default::default()),
        Err(ListServiceError::AuthorizationDenied { .. })
    ));
    assert!(matches!(
        service.delete_list("1", id),
        Err(ListServiceError::AuthorizationDenied { .. })
    ));
    assert!(matches!(
        service.delete_all_lists("1"),
        Err(ListServiceError::AuthorizationDenied { .. })
    ));
}

#[test]
fn foreign_owner_cannot_reach_a_record_by_id() {
    let mut conn = open_db_in_memory().unwrap();
    let config = CoreConfig::with_defaults();
    let mut service = ListService::new(&mut conn, &config, OwnerPolicy);

    let outcome = service.upsert_batch("1", vec![payload("L")]).unwrap();
    let id = outcome.created[0].id;

    // Owner "2" is allowed into their own subtree by policy, but the record
    // belongs to owner "1" and must read as absent.
    assert!(matches!(
        service.get_list("2", id),
        Err(ListServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.delete_list("2", id),
        Err(ListServiceError::NotFound(_))
    ));

    // Still present for its owner.
    assert!(service.get_list("1", id).is_ok());
}
