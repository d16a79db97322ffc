#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use warden_core::policy::builtin::{DEFAULT_POLICY, RESPONSE_WRAPPING_POLICY};
use warden_core::{Capability, PolicyType};
use warden_store::cache;
use warden_store::config::SeedPolicy;
use warden_store::{apply_seed_policies, reconcile_builtin_policies, PolicyLookup, PolicyStore};

use storage_double::CountingStorage;

async fn store_over(storage: Arc<CountingStorage>) -> PolicyStore {
    PolicyStore::new(storage, cache::build(true, 64)).await.unwrap()
}

#[tokio::test]
async fn second_run_writes_nothing() {
    let storage = Arc::new(CountingStorage::new());
    let store = store_over(storage.clone()).await;

    let first = reconcile_builtin_policies(&store).await.unwrap();
    assert!(first.default_written);
    assert!(first.response_wrapping_written);
    assert_eq!(storage.puts(), 2);

    let second = reconcile_builtin_policies(&store).await.unwrap();
    assert!(!second.wrote_anything());
    assert_eq!(storage.puts(), 2);

    // A fresh instance over the same storage agrees.
    let reopened = store_over(storage.clone()).await;
    let third = reconcile_builtin_policies(&reopened).await.unwrap();
    assert!(!third.wrote_anything());
    assert_eq!(storage.puts(), 2);
}

#[tokio::test]
async fn edited_default_is_kept() {
    let storage = Arc::new(CountingStorage::new());
    let store = store_over(storage.clone()).await;
    reconcile_builtin_policies(&store).await.unwrap();

    let custom = r#"path "sys/capabilities-self" { capabilities = ["update"] }"#;
    let p = warden_core::Policy::parse(custom).unwrap().with_name("default");
    store.set_policy(p).await.unwrap();

    let report = reconcile_builtin_policies(&store).await.unwrap();
    assert!(!report.default_written);
    let p = store.get_policy("default", PolicyLookup::ByName).await.unwrap().unwrap();
    assert_eq!(p.raw(), custom);
    assert_ne!(p.raw(), DEFAULT_POLICY);
}

#[tokio::test]
async fn drifted_response_wrapping_is_rewritten() {
    let storage = Arc::new(CountingStorage::new());
    storage
        .seed_raw(
            "response-wrapping",
            r#"{"version":2,"raw":"path \"cubbyhole/response\" { capabilities = [\"read\"] }","type":"acl"}"#,
        )
        .await;
    let store = store_over(storage.clone()).await;

    let report = reconcile_builtin_policies(&store).await.unwrap();
    assert!(report.response_wrapping_written);

    let p = store
        .get_policy("response-wrapping", PolicyLookup::ByName)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(p.raw(), RESPONSE_WRAPPING_POLICY);

    let acl = store.build_acl(&["response-wrapping"]).await.unwrap();
    assert!(acl.is_allowed("cubbyhole/response", Capability::Create));
    assert!(acl.is_allowed("sys/wrapping/unwrap", Capability::Update));
}

fn scratch_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("warden-seed-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn seed_files_are_stored() {
    let dir = scratch_dir("ok");
    let file = dir.join("ops.hcl");
    std::fs::write(&file, r#"path "secret/*" { capabilities = ["read"] }"#).unwrap();

    let store = store_over(Arc::new(CountingStorage::new())).await;
    let seeds = vec![SeedPolicy {
        name: "ops".into(),
        file: file.to_string_lossy().into_owned(),
    }];
    let n = apply_seed_policies(&store, &seeds).await.unwrap();
    assert_eq!(n, 1);
    assert_eq!(store.list_policies(PolicyType::Acl).await.unwrap(), vec!["ops"]);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn seed_cannot_replace_root() {
    let dir = scratch_dir("root");
    let file = dir.join("root.hcl");
    std::fs::write(&file, r#"path "*" { capabilities = ["deny"] }"#).unwrap();

    let store = store_over(Arc::new(CountingStorage::new())).await;
    let seeds = vec![SeedPolicy {
        name: "root".into(),
        file: file.to_string_lossy().into_owned(),
    }];
    let err = apply_seed_policies(&store, &seeds).await.unwrap_err();
    assert_eq!(err.code().as_str(), "IMMUTABLE_POLICY");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn missing_seed_file_is_a_config_error() {
    let store = store_over(Arc::new(CountingStorage::new())).await;
    let seeds = vec![SeedPolicy {
        name: "ops".into(),
        file: "/nonexistent/warden/ops.hcl".into(),
    }];
    let err = apply_seed_policies(&store, &seeds).await.unwrap_err();
    assert_eq!(err.code().as_str(), "CONFIG");
}
