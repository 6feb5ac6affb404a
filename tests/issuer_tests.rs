//! Readiness tests for `OriginIssuer` and `OriginClusterIssuer`
//!
//! Each test seeds the in-memory store, runs one reconciliation and checks the
//! `Ready` condition written back together with the provisioner collection.

mod common;

use common::{
    api_error, cluster_issuer, origin_issuer, secret, sign_response, Harness, NAMESPACE,
    SECRET_KEY, SERVICE_KEY,
};
use origin_ca_issuer::controller::{reconcile_issuer, ReconcilerError};
use origin_ca_issuer::crd::{
    Condition, ConditionStatus, OriginClusterIssuer, OriginIssuer, RequestType, CONDITION_READY,
};
use origin_ca_issuer::store::{ObjectKey, ObjectStore};

fn ready_condition(conditions: &[Condition]) -> Condition {
    conditions
        .iter()
        .find(|c| c.r#type == CONDITION_READY)
        .cloned()
        .expect("issuer should have a Ready condition")
}

async fn issuer_ready(harness: &Harness, key: &ObjectKey) -> Condition {
    let issuer = harness.store.get_origin_issuer(key).await.unwrap();
    ready_condition(&issuer.status.unwrap_or_default().conditions)
}

async fn cluster_issuer_ready(harness: &Harness, key: &ObjectKey) -> Condition {
    let issuer = harness.store.get_origin_cluster_issuer(key).await.unwrap();
    ready_condition(&issuer.status.unwrap_or_default().conditions)
}

#[tokio::test]
async fn test_origin_issuer_becomes_ready() {
    let harness = Harness::new(Ok(sign_response()));
    harness.store.insert_origin_issuer(origin_issuer("foo", "OriginECC"));
    harness
        .store
        .insert_secret(secret(NAMESPACE, &[(SECRET_KEY, SERVICE_KEY)]));
    let key = ObjectKey::namespaced(NAMESPACE, "foo");

    reconcile_issuer::<OriginIssuer>(&harness.ctx, &key).await.unwrap();

    let ready = issuer_ready(&harness, &key).await;
    assert_eq!(ready.status, ConditionStatus::True);
    assert_eq!(ready.reason.as_deref(), Some("Verified"));
    assert_eq!(
        ready.message.as_deref(),
        Some("OriginIssuer verified and ready to sign certificates")
    );
    assert_eq!(ready.last_transition_time.as_deref(), Some("2026-01-01T00:00:00Z"));
    assert_eq!(ready.observed_generation, Some(1));

    let provisioner = harness.collection.load(&key).expect("provisioner stored");
    assert_eq!(provisioner.request_type(), RequestType::OriginEcc);
}

#[tokio::test]
async fn test_cluster_issuer_becomes_ready() {
    let harness = Harness::new(Ok(sign_response()));
    harness
        .store
        .insert_origin_cluster_issuer(cluster_issuer("foo", "OriginRSA", "secrets"));
    harness
        .store
        .insert_secret(secret("secrets", &[(SECRET_KEY, SERVICE_KEY)]));
    let key = ObjectKey::cluster("foo");

    reconcile_issuer::<OriginClusterIssuer>(&harness.ctx, &key)
        .await
        .unwrap();

    let ready = cluster_issuer_ready(&harness, &key).await;
    assert_eq!(ready.status, ConditionStatus::True);
    assert_eq!(
        ready.message.as_deref(),
        Some("OriginClusterIssuer verified and ready to sign certificates")
    );

    let provisioner = harness.collection.load(&key).expect("provisioner stored");
    assert_eq!(provisioner.request_type(), RequestType::OriginRsa);
    assert!(harness
        .collection
        .load(&ObjectKey::namespaced("secrets", "foo"))
        .is_none());
}

#[tokio::test]
async fn test_ready_again_keeps_transition_time() {
    let harness = Harness::new(Ok(sign_response()));
    let mut issuer = origin_issuer("foo", "OriginECC");
    issuer.status = Some(common::ready_status());
    harness.store.insert_origin_issuer(issuer);
    harness
        .store
        .insert_secret(secret(NAMESPACE, &[(SECRET_KEY, SERVICE_KEY)]));
    let key = ObjectKey::namespaced(NAMESPACE, "foo");

    reconcile_issuer::<OriginIssuer>(&harness.ctx, &key).await.unwrap();

    let ready = issuer_ready(&harness, &key).await;
    assert_eq!(ready.status, ConditionStatus::True);
    assert_eq!(ready.last_transition_time.as_deref(), Some("2025-12-31T00:00:00Z"));
    assert_eq!(ready.reason.as_deref(), Some("Verified"));
}

#[tokio::test]
async fn test_missing_secret_is_not_found() {
    let harness = Harness::new(Ok(sign_response()));
    harness.store.insert_origin_issuer(origin_issuer("foo", "OriginECC"));
    let key = ObjectKey::namespaced(NAMESPACE, "foo");

    let err = reconcile_issuer::<OriginIssuer>(&harness.ctx, &key)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcilerError::SecretNotFound(_)));

    let ready = issuer_ready(&harness, &key).await;
    assert_eq!(ready.status, ConditionStatus::False);
    assert_eq!(ready.reason.as_deref(), Some("NotFound"));
    assert_eq!(
        ready.message.as_deref(),
        Some("Failed to retrieve auth secret: Secret \"default/service-key\" not found")
    );
    assert!(harness.collection.is_empty());
}

#[tokio::test]
async fn test_secret_read_error_is_reported_as_error() {
    let harness = Harness::new(Ok(sign_response()));
    harness.store.insert_origin_issuer(origin_issuer("foo", "OriginECC"));
    harness
        .store
        .insert_secret(secret(NAMESPACE, &[(SECRET_KEY, SERVICE_KEY)]));
    harness.store.fail_secret_reads("connection refused");
    let key = ObjectKey::namespaced(NAMESPACE, "foo");

    let err = reconcile_issuer::<OriginIssuer>(&harness.ctx, &key)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcilerError::Store(_)));

    let ready = issuer_ready(&harness, &key).await;
    assert_eq!(ready.reason.as_deref(), Some("Error"));
    assert_eq!(
        ready.message.as_deref(),
        Some("Failed to retrieve auth secret: connection refused")
    );
}

#[tokio::test]
async fn test_secret_without_key_is_not_found() {
    let harness = Harness::new(Ok(sign_response()));
    harness.store.insert_origin_issuer(origin_issuer("foo", "OriginECC"));
    harness
        .store
        .insert_secret(secret(NAMESPACE, &[("other", SERVICE_KEY)]));
    let key = ObjectKey::namespaced(NAMESPACE, "foo");

    let err = reconcile_issuer::<OriginIssuer>(&harness.ctx, &key)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "secret service-key does not contain key \"key\""
    );

    let ready = issuer_ready(&harness, &key).await;
    assert_eq!(ready.status, ConditionStatus::False);
    assert_eq!(ready.reason.as_deref(), Some("NotFound"));
    assert!(harness.collection.is_empty());
}

#[tokio::test]
async fn test_invalid_spec_writes_no_status() {
    let harness = Harness::new(Ok(sign_response()));
    harness.store.insert_origin_issuer(origin_issuer("foo", "MD4"));
    harness
        .store
        .insert_secret(secret(NAMESPACE, &[(SECRET_KEY, SERVICE_KEY)]));
    let key = ObjectKey::namespaced(NAMESPACE, "foo");

    let err = reconcile_issuer::<OriginIssuer>(&harness.ctx, &key)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "spec.requestType has invalid value \"MD4\"");
    assert_eq!(harness.store.status_writes(), 0);
    assert!(harness.collection.is_empty());
}

#[tokio::test]
async fn test_cluster_issuer_without_secret_namespace_writes_no_status() {
    let harness = Harness::new(Ok(sign_response()));
    harness
        .store
        .insert_origin_cluster_issuer(cluster_issuer("foo", "OriginECC", ""));
    let key = ObjectKey::cluster("foo");

    let err = reconcile_issuer::<OriginClusterIssuer>(&harness.ctx, &key)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "no namespace defined for secret");
    assert_eq!(harness.store.status_writes(), 0);
}

#[tokio::test]
async fn test_deleted_issuer_is_ignored() {
    let harness = Harness::new(Ok(sign_response()));

    reconcile_issuer::<OriginIssuer>(&harness.ctx, &ObjectKey::namespaced(NAMESPACE, "gone"))
        .await
        .unwrap();
    reconcile_issuer::<OriginClusterIssuer>(&harness.ctx, &ObjectKey::cluster("gone"))
        .await
        .unwrap();

    assert_eq!(harness.store.status_writes(), 0);
}

#[tokio::test]
async fn test_client_init_failure_is_reported_as_error() {
    let harness = Harness::new(Err(api_error())).with_failing_factory();
    harness.store.insert_origin_issuer(origin_issuer("foo", "OriginECC"));
    harness
        .store
        .insert_secret(secret(NAMESPACE, &[(SECRET_KEY, SERVICE_KEY)]));
    let key = ObjectKey::namespaced(NAMESPACE, "foo");

    let err = reconcile_issuer::<OriginIssuer>(&harness.ctx, &key)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcilerError::ClientInit(_)));

    let ready = issuer_ready(&harness, &key).await;
    assert_eq!(ready.reason.as_deref(), Some("Error"));
    assert!(ready
        .message
        .as_deref()
        .is_some_and(|m| m.starts_with("Failed to initialize provisioner: ")));
    assert!(harness.collection.is_empty());
}

#[tokio::test]
async fn test_failed_ready_write_is_returned() {
    let harness = Harness::new(Ok(sign_response()));
    harness.store.insert_origin_issuer(origin_issuer("foo", "OriginECC"));
    harness
        .store
        .insert_secret(secret(NAMESPACE, &[(SECRET_KEY, SERVICE_KEY)]));
    harness.store.fail_status_writes("conflict");
    let key = ObjectKey::namespaced(NAMESPACE, "foo");

    let err = reconcile_issuer::<OriginIssuer>(&harness.ctx, &key)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcilerError::Store(_)));
    assert!(harness.collection.load(&key).is_some());
}

#[tokio::test]
async fn test_failed_status_write_keeps_missing_secret_error() {
    let harness = Harness::new(Ok(sign_response()));
    harness.store.insert_origin_issuer(origin_issuer("foo", "OriginECC"));
    harness.store.fail_status_writes("etcd unavailable");
    let key = ObjectKey::namespaced(NAMESPACE, "foo");

    let err = reconcile_issuer::<OriginIssuer>(&harness.ctx, &key)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcilerError::SecretNotFound(_)));
    assert_eq!(
        err.to_string(),
        "failed to retrieve auth secret: Secret \"default/service-key\" not found"
    );
    assert_eq!(harness.store.status_writes(), 0);
}

#[tokio::test]
async fn test_failed_status_write_keeps_client_init_error() {
    let harness = Harness::new(Ok(sign_response())).with_failing_factory();
    harness
        .store
        .insert_origin_cluster_issuer(cluster_issuer("foo", "OriginECC", "secrets"));
    harness
        .store
        .insert_secret(secret("secrets", &[(SECRET_KEY, SERVICE_KEY)]));
    harness.store.fail_status_writes("etcd unavailable");

    let err = reconcile_issuer::<OriginClusterIssuer>(&harness.ctx, &ObjectKey::cluster("foo"))
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcilerError::ClientInit(_)));
    assert!(harness.collection.is_empty());
}
