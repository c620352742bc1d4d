//! Tenant isolation over the in-memory backend.

use orgscope_core::{
    create_accessor, make_organization_id, AccessorFactory, CreateArgs, DeleteArgs, ErrorKind,
    Filter, FindArgs, OrganizationId, Record, ScopeError, ScopedDb, SortOrder, StoreError,
    TenantModel, UniqueArgs, UpdateArgs,
};
use orgscope_memory::{MemoryBackend, Relation};
use proptest::prelude::*;
use serde_json::{json, Value};

fn rec(v: Value) -> Record {
    v.as_object().cloned().unwrap()
}

fn org(raw: &str) -> OrganizationId {
    make_organization_id(raw).unwrap()
}

fn accessor(backend: &MemoryBackend, raw: &str) -> ScopedDb {
    create_accessor(backend, org(raw)).unwrap()
}

/// Two tenants; workspace `w1` and api key `k1` belong to `org_a`, `w2` to `org_b`.
fn two_tenants() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend
        .seed("workspace", rec(json!({ "id": "w1", "name": "alpha", "organizationId": "org_a" })))
        .unwrap();
    backend
        .seed("workspace", rec(json!({ "id": "w2", "name": "beta", "organizationId": "org_b" })))
        .unwrap();
    backend
        .seed("apiKey", rec(json!({ "id": "k1", "label": "ci", "organizationId": "org_a" })))
        .unwrap();
    backend
}

#[tokio::test]
async fn other_tenant_cannot_find_a_workspace_by_id() {
    let backend = two_tenants();
    let b = accessor(&backend, "org_b");

    let found = b
        .workspace()
        .find_first(FindArgs::new().filter(Filter::eq("id", "w1")))
        .await
        .unwrap();
    assert!(found.is_none());

    let unique = b.workspace().find_unique(UniqueArgs::by_id("w1")).await.unwrap();
    assert!(unique.is_none());

    let owned = accessor(&backend, "org_a")
        .workspace()
        .find_unique(UniqueArgs::by_id("w1"))
        .await
        .unwrap();
    assert_eq!(owned.unwrap()["name"], json!("alpha"));
}

#[tokio::test]
async fn created_workspace_belongs_to_the_bound_tenant() {
    let backend = MemoryBackend::new();
    let a = accessor(&backend, "org_a");

    let created = a
        .workspace()
        .create(CreateArgs::from_json(json!({ "name": "proj" })).unwrap())
        .await
        .unwrap();

    assert_eq!(created["organizationId"], json!("org_a"));
    assert_eq!(backend.rows("workspace")[0]["organizationId"], json!("org_a"));
}

#[tokio::test]
async fn create_naming_another_tenant_persists_nothing() {
    let backend = MemoryBackend::new();
    let a = accessor(&backend, "org_a");

    let err = a
        .workspace()
        .create(CreateArgs::from_json(
            json!({ "name": "proj", "organizationId": "org_b" }),
        ).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, ScopeError::TenantMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(backend.rows("workspace").is_empty());
}

#[tokio::test]
async fn cross_tenant_delete_is_not_found_and_leaves_the_row() {
    let backend = two_tenants();
    let a = accessor(&backend, "org_a");

    let err = a
        .workspace()
        .delete(DeleteArgs::new(Filter::eq("id", "w2")))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert_eq!(err.sanitize_for_client().code(), 404);

    let still_there = accessor(&backend, "org_b")
        .workspace()
        .find_first(FindArgs::new().filter(Filter::eq("id", "w2")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(still_there["name"], json!("beta"));
    assert_eq!(still_there["organizationId"], json!("org_b"));
}

#[tokio::test]
async fn cross_tenant_update_is_not_found_and_leaves_the_row() {
    let backend = two_tenants();
    let before = backend.rows("workspace");

    let err = accessor(&backend, "org_a")
        .workspace()
        .update(UpdateArgs::from_json(
            Filter::eq("id", "w2"),
            json!({ "name": "hijacked" }),
        ).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ScopeError::Store(StoreError::NotFound { .. })));

    assert_eq!(backend.rows("workspace"), before);
}

#[tokio::test]
async fn update_cannot_move_a_row_to_another_tenant() {
    let backend = two_tenants();
    let a = accessor(&backend, "org_a");

    let err = a
        .workspace()
        .update(UpdateArgs::from_json(
            Filter::eq("id", "w1"),
            json!({ "organizationId": "org_b" }),
        ).unwrap())
        .await
        .unwrap_err();
    assert!(err.is_tenant_fault());

    let renamed = a
        .workspace()
        .update(UpdateArgs::from_json(
            Filter::eq("id", "w1"),
            json!({ "name": "renamed", "organizationId": "org_a" }),
        ).unwrap())
        .await
        .unwrap();
    assert_eq!(renamed["name"], json!("renamed"));
    assert_eq!(renamed["organizationId"], json!("org_a"));
}

#[test]
fn organization_id_guard() {
    for raw in ["", "   ", "\t\n"] {
        assert!(matches!(
            make_organization_id(raw).unwrap_err(),
            ScopeError::InvalidTenant { .. }
        ));
    }
    assert!(OrganizationId::from_value(&json!(123)).is_err());
    assert!(OrganizationId::from_value(&Value::Null).is_err());
    assert_eq!(org("org_123"), org("org_123"));
}

#[tokio::test]
async fn equal_ids_scope_identically() {
    let backend = two_tenants();
    let first = accessor(&backend, "org_a").workspace().find_many(FindArgs::new()).await.unwrap();
    let second = accessor(&backend, "org_a").workspace().find_many(FindArgs::new()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[tokio::test]
async fn counts_are_per_tenant() {
    let backend = two_tenants();
    let a = accessor(&backend, "org_a");
    let c = accessor(&backend, "org_c");

    assert_eq!(a.workspace().count(Filter::all()).await.unwrap(), 1);
    assert_eq!(a.api_key().count(Filter::all()).await.unwrap(), 1);
    assert_eq!(c.workspace().count(Filter::all()).await.unwrap(), 0);
    assert_eq!(c.api_key().count(Filter::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn or_filters_cannot_widen_past_the_tenant() {
    let backend = two_tenants();
    let a = accessor(&backend, "org_a");

    let filter = Filter::from_json(&json!({
        "OR": [{ "organizationId": "org_b" }, { "id": "w2" }, { "id": "w1" }]
    }))
    .unwrap();
    let rows = a.workspace().find_many(filter.into()).await.unwrap();

    let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, [json!("w1")]);
}

#[tokio::test]
async fn shaping_options_pass_through() {
    let backend = MemoryBackend::new();
    backend.define_relation(
        "executionLog",
        "workspace",
        Relation::one("workspace", "workspaceId", "id"),
    );
    let a = accessor(&backend, "org_a");

    let ws = a
        .workspace()
        .create(CreateArgs::from_json(json!({ "name": "proj" })).unwrap())
        .await
        .unwrap();
    for status in ["success", "failed", "halted"] {
        a.execution_log()
            .create(CreateArgs::from_json(json!({
                "workspaceId": ws["id"],
                "status": status,
            })).unwrap())
            .await
            .unwrap();
    }

    let logs = a
        .execution_log()
        .find_many(
            FindArgs::new()
                .filter(
                    Filter::from_json(&json!({ "status": { "in": ["success", "halted"] } }))
                        .unwrap(),
                )
                .order_by("status", SortOrder::Desc)
                .select(["status"])
                .include("workspace"),
        )
        .await
        .unwrap();

    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["status"], json!("success"));
    assert_eq!(logs[1]["status"], json!("halted"));
    assert_eq!(logs[0]["workspace"]["name"], json!("proj"));
    assert!(logs[0].get("organizationId").is_none());
}

/// `org_a` owns `w1`, `org_b` owns `w2`. Log `e1` is `org_a`'s but points at
/// `w2`; log `e9` is `org_b`'s but points at `w1`.
fn crossed_relations() -> MemoryBackend {
    let backend = two_tenants();
    backend
        .define_relation(
            "executionLog",
            "workspace",
            Relation::one("workspace", "workspaceId", "id"),
        )
        .define_relation(
            "workspace",
            "executionLogs",
            Relation::many("executionLog", "id", "workspaceId"),
        );
    backend
        .seed(
            "executionLog",
            rec(json!({ "id": "e1", "workspaceId": "w2", "organizationId": "org_a" })),
        )
        .unwrap();
    backend
        .seed(
            "executionLog",
            rec(json!({ "id": "e2", "workspaceId": "w1", "organizationId": "org_a" })),
        )
        .unwrap();
    backend
        .seed(
            "executionLog",
            rec(json!({ "id": "e9", "workspaceId": "w1", "organizationId": "org_b", "secret": "b-data" })),
        )
        .unwrap();
    backend
}

fn related_ids(value: &Value) -> Vec<Value> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].clone())
        .collect()
}

#[tokio::test]
async fn include_never_reaches_another_tenants_parent() {
    let backend = crossed_relations();
    let a = accessor(&backend, "org_a");

    let log = a
        .execution_log()
        .find_first(FindArgs::new().filter(Filter::eq("id", "e1")).include("workspace"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(log["workspace"], Value::Null);

    let own = a
        .execution_log()
        .find_unique(UniqueArgs::by_id("e2").include("workspace"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(own["workspace"]["id"], json!("w1"));
}

#[tokio::test]
async fn include_never_lists_another_tenants_children() {
    let backend = crossed_relations();

    let ws = accessor(&backend, "org_a")
        .workspace()
        .find_first(FindArgs::new().filter(Filter::eq("id", "w1")).include("executionLogs"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(related_ids(&ws["executionLogs"]), [json!("e2")]);

    let ws = accessor(&backend, "org_b")
        .workspace()
        .find_many(FindArgs::new().include("executionLogs"))
        .await
        .unwrap();
    assert_eq!(ws.len(), 1);
    assert_eq!(related_ids(&ws[0]["executionLogs"]), Vec::<Value>::new());
}

#[tokio::test]
async fn writes_returning_relations_stay_in_tenant() {
    let backend = crossed_relations();
    let a = accessor(&backend, "org_a");

    let created = a
        .execution_log()
        .create(
            CreateArgs::from_json(json!({ "id": "e3", "workspaceId": "w2" }))
                .unwrap()
                .include("workspace"),
        )
        .await
        .unwrap();
    assert_eq!(created["workspace"], Value::Null);

    let updated = a
        .workspace()
        .update(
            UpdateArgs::from_json(Filter::eq("id", "w1"), json!({ "name": "renamed" }))
                .unwrap()
                .include("executionLogs"),
        )
        .await
        .unwrap();
    assert_eq!(related_ids(&updated["executionLogs"]), [json!("e2")]);

    let deleted = a
        .execution_log()
        .delete(DeleteArgs::new(Filter::eq("id", "e1")).include("workspace"))
        .await
        .unwrap();
    assert_eq!(deleted["workspace"], Value::Null);
    assert!(backend.rows("workspace").iter().any(|r| r["id"] == json!("w2")));
}

#[test]
fn non_object_payloads_are_rejected() {
    for payload in [json!(null), json!("proj"), json!([{ "name": "proj" }])] {
        let err = CreateArgs::from_json(payload.clone()).unwrap_err();
        assert!(matches!(err, ScopeError::InvalidPayload(_)));
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(UpdateArgs::from_json(Filter::all(), payload).is_err());
    }
}

#[tokio::test]
async fn backend_faults_surface_unchanged() {
    let backend = MemoryBackend::new();
    backend.define_unique("organizationMember", ["organizationId", "userId"]);
    let a = accessor(&backend, "org_a");

    a.organization_member()
        .create(CreateArgs::from_json(json!({ "userId": "u1", "role": "owner" })).unwrap())
        .await
        .unwrap();
    let err = a
        .organization_member()
        .create(CreateArgs::from_json(json!({ "userId": "u1", "role": "viewer" })).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ScopeError::Store(StoreError::UniqueViolation { .. })));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Same user in another organization is fine.
    accessor(&backend, "org_b")
        .organization_member()
        .create(CreateArgs::from_json(json!({ "userId": "u1", "role": "owner" })).unwrap())
        .await
        .unwrap();

    backend.fail_next("connection refused");
    let err = a.audit_log().find_many(FindArgs::new()).await.unwrap_err();
    assert!(matches!(err, ScopeError::Store(StoreError::Connectivity(_))));
    assert_eq!(err.sanitize_for_client().to_json()["code"], json!(503));
}

#[tokio::test]
async fn factory_shares_one_backend_across_tenants() {
    let backend = MemoryBackend::new();
    let factory = AccessorFactory::new(&backend).unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let db = factory.for_raw(&format!("org_{}", i % 2)).unwrap();
            tokio::spawn(async move {
                db.audit_log()
                    .create(CreateArgs::from_json(json!({ "action": format!("event-{i}") })).unwrap())
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for tenant in ["org_0", "org_1"] {
        let db = factory.for_raw(tenant).unwrap();
        let rows = db.audit_log().find_many(FindArgs::new()).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r["organizationId"] == json!(tenant)));
    }
}

fn tenant_name() -> impl Strategy<Value = String> {
    "org_[a-d]"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Rows of other tenants never leak through any reader, whatever the
    /// mix of owners in the table.
    #[test]
    fn readers_only_see_their_own_rows(
        owners in prop::collection::vec(tenant_name(), 1..12),
        reader in tenant_name(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let backend = MemoryBackend::new();
            for (i, owner) in owners.iter().enumerate() {
                backend
                    .seed("workspace", rec(json!({ "id": format!("w{i}"), "organizationId": owner })))
                    .unwrap();
            }

            let db = accessor(&backend, &reader);
            let rows = db.workspace().find_many(FindArgs::new()).await.unwrap();
            let expected = owners.iter().filter(|o| **o == reader).count();
            prop_assert_eq!(rows.len(), expected);
            prop_assert!(rows.iter().all(|r| r["organizationId"] == json!(reader)));

            for (i, owner) in owners.iter().enumerate() {
                let id = format!("w{i}");
                let first = db
                    .workspace()
                    .find_first(FindArgs::new().filter(Filter::eq("id", id.clone())))
                    .await
                    .unwrap();
                let unique = db.workspace().find_unique(UniqueArgs::by_id(id)).await.unwrap();
                prop_assert_eq!(first.is_some(), *owner == reader);
                prop_assert_eq!(unique.is_some(), *owner == reader);
            }
            Ok(())
        })?;
    }

    /// Every model injects the bound tenant on create and refuses any other.
    #[test]
    fn creates_are_pinned_to_the_bound_tenant(
        bound in tenant_name(),
        supplied in prop::option::of(tenant_name()),
        model_index in 0..TenantModel::ALL.len(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let backend = MemoryBackend::new();
            let model = TenantModel::ALL[model_index];
            let db = accessor(&backend, &bound);

            let mut data = rec(json!({ "note": "x" }));
            if let Some(s) = &supplied {
                data.insert("organizationId".into(), json!(s));
            }
            let result = db.model(model).create(CreateArgs::new(data)).await;

            match supplied {
                Some(s) if s != bound => {
                    let is_tenant_mismatch = matches!(result, Err(ScopeError::TenantMismatch { .. }));
                    prop_assert!(is_tenant_mismatch);
                    prop_assert!(backend.rows(model.name()).is_empty());
                }
                _ => {
                    let row = result.unwrap();
                    prop_assert_eq!(&row["organizationId"], &json!(bound));
                    prop_assert_eq!(backend.rows(model.name()).len(), 1);
                }
            }
            Ok(())
        })?;
    }

    /// Writes aimed at another tenant's row touch nothing.
    #[test]
    fn foreign_rows_survive_update_and_delete(
        owner in tenant_name(),
        actor in tenant_name(),
    ) {
        prop_assume!(owner != actor);
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let backend = MemoryBackend::new();
            backend
                .seed("apiKey", rec(json!({ "id": "k1", "label": "ci", "organizationId": owner })))
                .unwrap();
            let before = backend.rows("apiKey");
            let db = accessor(&backend, &actor);

            let update = db
                .api_key()
                .update(UpdateArgs::from_json(Filter::eq("id", "k1"), json!({ "label": "x" })).unwrap())
                .await;
            let delete = db.api_key().delete(DeleteArgs::new(Filter::eq("id", "k1"))).await;

            prop_assert!(update.unwrap_err().is_not_found());
            prop_assert!(delete.unwrap_err().is_not_found());
            prop_assert_eq!(backend.rows("apiKey"), before);
            Ok(())
        })?;
    }
}
