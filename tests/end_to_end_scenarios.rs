//! Literal end-to-end scenarios against the in-process `Database` facade —
//! the HTTP-free equivalent of the request/response sequences a client
//! would drive over the eventual REST surface.

use qvarn_core::types::ResourceTypeSchema;
use qvarn_core::{Database, StoreError};
use serde_json::json;
use std::collections::HashMap;

fn contract_schema() -> ResourceTypeSchema {
    ResourceTypeSchema {
        resource_type: "contract".to_string(),
        path: "/contracts".to_string(),
        prototype: json!({"contract_type": ""}),
        subpaths: HashMap::new(),
        files: vec![],
    }
}

fn org_schema() -> ResourceTypeSchema {
    ResourceTypeSchema {
        resource_type: "org".to_string(),
        path: "/orgs".to_string(),
        prototype: json!({
            "names": [""],
            "country": "",
            "gov_org_ids": [{"country": "", "org_id_type": "", "gov_org_id": ""}],
        }),
        subpaths: HashMap::new(),
        files: vec![],
    }
}

fn test_schema() -> ResourceTypeSchema {
    ResourceTypeSchema {
        resource_type: "test".to_string(),
        path: "/test".to_string(),
        prototype: json!({"string": "", "integer": 0, "float": 0.0}),
        subpaths: HashMap::new(),
        files: vec![],
    }
}

fn person_schema() -> ResourceTypeSchema {
    ResourceTypeSchema {
        resource_type: "person".to_string(),
        path: "/persons".to_string(),
        prototype: json!({"names": [{"full_name": ""}]}),
        subpaths: HashMap::new(),
        files: vec!["photo".to_string()],
    }
}

#[test]
fn scenario_1_wrong_revision() {
    let (db, _dir) = Database::open_temp();
    db.register_schema(contract_schema());

    let created = db
        .create("contract", json!({"contract_type": "original"}))
        .unwrap();

    let err = db
        .put(
            "contract",
            &created.id,
            json!({"contract_type": "changed"}),
            "wrong",
        )
        .unwrap_err();
    match err {
        StoreError::WrongRevision { current, update, .. } => {
            assert_eq!(current, created.revision);
            assert_eq!(update, "wrong");
        }
        other => panic!("expected WrongRevision, got {other:?}"),
    }

    let fetched = db.get("contract", &created.id).unwrap();
    assert_eq!(fetched.data["contract_type"], "original");
}

#[test]
fn scenario_2_search_exact() {
    let (db, _dir) = Database::open_temp();
    db.register_schema(org_schema());

    let a = db
        .create(
            "org",
            json!({
                "names": ["Company 1", "The Company"],
                "country": "FI",
                "gov_org_ids": [{"country": "FI", "org_id_type": "registration_number", "gov_org_id": "1234567-8"}],
            }),
        )
        .unwrap();
    let b = db
        .create(
            "org",
            json!({
                "names": ["Other"],
                "gov_org_ids": [{"org_id_type": "registration_number", "gov_org_id": "1234567-9"}],
            }),
        )
        .unwrap();

    let by_country = db.search("org", "exact/country/FI").unwrap();
    assert_eq!(by_country.len(), 1);
    assert_eq!(by_country[0]["id"], a.id);

    let by_gov_id = db
        .search(
            "org",
            "exact/org_id_type/registration_number/exact/gov_org_id/1234567-9",
        )
        .unwrap();
    assert_eq!(by_gov_id.len(), 1);
    assert_eq!(by_gov_id[0]["id"], b.id);
}

#[test]
fn scenario_3_startswith_contains_case_insensitive() {
    let (db, _dir) = Database::open_temp();
    db.register_schema(org_schema());

    let _a = db
        .create("org", json!({"names": ["abc", "def"], "gov_org_ids": []}))
        .unwrap();
    let b = db
        .create("org", json!({"names": ["ghj", "klm"], "gov_org_ids": []}))
        .unwrap();

    let startswith = db.search("org", "startswith/names/Kl").unwrap();
    assert_eq!(startswith.len(), 1);
    assert_eq!(startswith[0]["id"], b.id);

    let contains = db.search("org", "contains/names/x").unwrap();
    assert!(contains.is_empty());
}

#[test]
fn scenario_4_range() {
    let (db, _dir) = Database::open_temp();
    db.register_schema(test_schema());

    let _a = db
        .create("test", json!({"string": "0", "integer": 1, "float": 2.0}))
        .unwrap();
    let b = db
        .create("test", json!({"string": "3", "integer": 4, "float": 5.0}))
        .unwrap();

    let gt1 = db.search("test", "gt/integer/1").unwrap();
    assert_eq!(gt1.len(), 1);
    assert_eq!(gt1[0]["id"], b.id);

    let gt4 = db.search("test", "gt/integer/4").unwrap();
    assert!(gt4.is_empty());
}

#[test]
fn scenario_5_notification_fanout() {
    let (db, _dir) = Database::open_temp();
    db.register_schema(org_schema());

    let l1 = db
        .create_listener("org", json!({"notify_of_new": true}))
        .unwrap();
    let l2 = db
        .create_listener("org", json!({"notify_of_new": false}))
        .unwrap();
    let l3 = db
        .create_listener("org", json!({"notify_on_all": true}))
        .unwrap();

    let o1 = db
        .create("org", json!({"names": ["one"], "gov_org_ids": []}))
        .unwrap();
    let _o2 = db
        .create("org", json!({"names": ["two"], "gov_org_ids": []}))
        .unwrap();

    assert_eq!(db.list_notifications("org", &l1.id).unwrap().len(), 2);
    assert_eq!(db.list_notifications("org", &l2.id).unwrap().len(), 0);
    assert_eq!(db.list_notifications("org", &l3.id).unwrap().len(), 2);

    let l2 = db
        .put_listener(
            "org",
            &l2.id,
            json!({"notify_of_new": false, "listen_on": [o1.id]}),
            &l2.revision,
        )
        .unwrap();

    let updated = db
        .put("org", &o1.id, json!({"names": ["one updated"], "gov_org_ids": []}), &o1.revision)
        .unwrap();

    assert_eq!(db.list_notifications("org", &l2.id).unwrap().len(), 1);
    assert_eq!(db.list_notifications("org", &l3.id).unwrap().len(), 3);
    assert_eq!(db.list_notifications("org", &l1.id).unwrap().len(), 2);

    db.delete("org", &o1.id, &updated.revision).unwrap();

    let l2_notifications = db.list_notifications("org", &l2.id).unwrap();
    assert_eq!(l2_notifications.len(), 2);
    let last = db
        .get_notification("org", &l2.id, l2_notifications.last().unwrap())
        .unwrap();
    assert!(last.resource_revision.is_none());

    assert_eq!(db.list_notifications("org", &l3.id).unwrap().len(), 4);

    db.delete_listener("org", &l1.id, &l1.revision).unwrap();
    let err = db.list_notifications("org", &l1.id).unwrap_err();
    assert!(matches!(err, StoreError::ResourceNotFound { .. }));
}

#[test]
fn scenario_6_file_subpath() {
    let (db, _dir) = Database::open_temp();
    db.register_schema(person_schema());

    let created = db
        .create("person", json!({"names": [{"full_name": "James Bond"}]}))
        .unwrap();

    let updated = db
        .put_file(
            "person",
            &created.id,
            "photo",
            "image/png",
            b"image",
            &created.revision,
        )
        .unwrap();
    assert_ne!(updated.revision, created.revision);

    let (blob, content_type, revision) = db.get_file("person", &created.id, "photo").unwrap();
    assert_eq!(blob, b"image");
    assert_eq!(content_type, "image/png");
    assert_eq!(revision, updated.revision);
}

#[test]
fn acknowledging_a_notification_is_idempotent_per_listener() {
    let (db, _dir) = Database::open_temp();
    db.register_schema(org_schema());

    let l1 = db
        .create_listener("org", json!({"notify_of_new": true}))
        .unwrap();
    let l2 = db
        .create_listener("org", json!({"notify_on_all": true}))
        .unwrap();

    db.create("org", json!({"names": ["one"], "gov_org_ids": []}))
        .unwrap();

    let notification_id = db.list_notifications("org", &l1.id).unwrap()[0].clone();
    db.delete_notification("org", &l1.id, &notification_id)
        .unwrap();

    let err = db
        .get_notification("org", &l1.id, &notification_id)
        .unwrap_err();
    assert!(matches!(err, StoreError::ResourceNotFound { .. }));

    // l2 still sees it — acknowledgement is scoped to the acknowledging listener.
    assert_eq!(db.list_notifications("org", &l2.id).unwrap().len(), 1);
}
