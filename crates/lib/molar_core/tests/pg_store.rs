//! `PgStore` against a live PostgreSQL.
//!
//! Runs only when `DATABASE_URL` is set; each test is a no-op otherwise.
//! Every test namespaces its rows with a fresh suffix so runs can share a
//! database.

use molar_core::models::auth::{NewUser, Role, UserFilter, UserUpdate};
use molar_core::models::patient::NewPatient;
use molar_core::store::postgres::PgStore;
use molar_core::store::{CredentialStore, PatientStore, StoreError, UserStore};
use sqlx::PgPool;
use uuid::Uuid;

async fn store() -> Option<PgStore> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL store test");
        return None;
    };
    let pool = PgPool::connect(&url).await.expect("connect to PostgreSQL");
    molar_core::migrate::migrate(&pool)
        .await
        .expect("run migrations");
    Some(PgStore::new(pool))
}

fn suffix() -> String {
    Uuid::now_v7().simple().to_string()
}

fn user(username: &str, email: &str, last_name: &str, role: Role) -> NewUser {
    NewUser {
        first_name: "Test".into(),
        last_name: last_name.into(),
        email: email.into(),
        username: username.into(),
        password_hash: "$2b$10$original".into(),
        role,
        phone: None,
        specialization: None,
    }
}

#[tokio::test]
async fn username_match_wins_over_older_email_match() {
    let Some(store) = store().await else { return };
    let sfx = suffix();
    let shared = format!("shared-{sfx}@clinic.com");

    let by_email = store
        .create_user(user(&format!("alice-{sfx}"), &shared, "Alice", Role::Doctor))
        .await
        .expect("create alice");
    let by_username = store
        .create_user(user(&shared, &format!("bob-{sfx}@clinic.com"), "Bob", Role::Assistant))
        .await
        .expect("create bob");

    let found = store
        .find_by_identifier(&shared)
        .await
        .expect("lookup")
        .expect("some account");
    assert_eq!(found.id, by_username.id);

    let found = store
        .find_by_identifier(&format!("alice-{sfx}"))
        .await
        .expect("lookup")
        .expect("some account");
    assert_eq!(found.id, by_email.id);
    assert_eq!(found.role, Role::Doctor);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let Some(store) = store().await else { return };
    let sfx = suffix();
    let email = format!("dup-{sfx}@clinic.com");

    store
        .create_user(user(&format!("first-{sfx}"), &email, "First", Role::Doctor))
        .await
        .expect("create first");
    let err = store
        .create_user(user(&format!("second-{sfx}"), &email, "Second", Role::Doctor))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");
    assert!(store
        .identifier_taken(&email, "nobody")
        .await
        .expect("identifier_taken"));
}

#[tokio::test]
async fn partial_update_keeps_untouched_columns() {
    let Some(store) = store().await else { return };
    let sfx = suffix();
    let created = store
        .create_user(user(&format!("upd-{sfx}"), &format!("upd-{sfx}@clinic.com"), "Before", Role::Doctor))
        .await
        .expect("create");

    let updated = store
        .update_user(
            created.id,
            &UserUpdate {
                phone: Some("555-0142".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .expect("row exists");
    assert_eq!(updated.last_name, "Before");
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.phone.as_deref(), Some("555-0142"));

    let missing = store
        .update_user(Uuid::now_v7(), &UserUpdate::default())
        .await
        .expect("update missing");
    assert!(missing.is_none());
}

#[tokio::test]
async fn password_hash_is_replaced() {
    let Some(store) = store().await else { return };
    let sfx = suffix();
    let created = store
        .create_user(user(&format!("pw-{sfx}"), &format!("pw-{sfx}@clinic.com"), "Pw", Role::Manager))
        .await
        .expect("create");

    assert!(store
        .update_password_hash(created.id, "$2b$10$replaced")
        .await
        .expect("update hash"));
    let reloaded = store
        .find_by_id(created.id)
        .await
        .expect("reload")
        .expect("row exists");
    assert_eq!(reloaded.password_hash, "$2b$10$replaced");

    assert!(!store
        .update_password_hash(Uuid::now_v7(), "$2b$10$x")
        .await
        .expect("update missing"));
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let Some(store) = store().await else { return };
    let sfx = suffix();
    store
        .create_user(user(&format!("u1-{sfx}"), &format!("u1-{sfx}@clinic.com"), &format!("Zed_{sfx}"), Role::Doctor))
        .await
        .expect("create underscore");
    store
        .create_user(user(&format!("u2-{sfx}"), &format!("u2-{sfx}@clinic.com"), &format!("Zedx{sfx}"), Role::Doctor))
        .await
        .expect("create x");

    let filter = UserFilter {
        role: Some(Role::Doctor),
        search: Some(format!("zed_{sfx}")),
    };
    let found = store.list_users(&filter).await.expect("list");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].last_name, format!("Zed_{sfx}"));

    let filter = UserFilter {
        role: Some(Role::Manager),
        search: Some(sfx.clone()),
    };
    assert!(store.list_users(&filter).await.expect("list").is_empty());
}

#[tokio::test]
async fn unknown_dentist_is_an_invalid_reference() {
    let Some(store) = store().await else { return };
    let err = store
        .create_patient(NewPatient {
            first_name: "Ana".into(),
            last_name: "Lopez".into(),
            primary_dentist_id: Some(Uuid::now_v7()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidReference(_)), "{err:?}");
}
