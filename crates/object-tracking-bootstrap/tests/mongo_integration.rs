//! Integration tests against a real MongoDB server.
//!
//! These tests require a fresh MongoDB instance (no `admin` user, no
//! `object_tracking` database) reachable at `MONGODB_URI`, defaulting to
//! `mongodb://localhost:27017/`, with authentication disabled or with
//! credentials in the connection string.
//!
//! Run with:
//!   cargo test -p object-tracking-bootstrap --test mongo_integration -- --ignored --test-threads=1

use std::time::Duration;

use object_tracking_bootstrap::{procedure, verify, BootstrapConfig, BootstrapError, Plan};
use object_tracking_core::{CollectionName, DatabaseName};
use object_tracking_store::bson::doc;
use object_tracking_store::{MongoProvisioner, Provisioner, StoreError};

/// Default server selection timeout for tests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn mongodb_uri() -> String {
    std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017/".to_string())
}

async fn connect() -> MongoProvisioner {
    let provisioner =
        MongoProvisioner::connect(&mongodb_uri(), "bootstrap-integration", CONNECT_TIMEOUT)
            .await
            .expect("failed to create client");
    provisioner.ping().await.expect("MongoDB is not reachable");
    provisioner
}

/// Runs the bootstrap once on a fresh server, then checks the end state and
/// the behavior of a second run.
#[tokio::test]
#[ignore = "requires a fresh MongoDB server"]
async fn bootstrap_fresh_server() {
    let provisioner = connect().await;
    let plan = Plan::from_config(&BootstrapConfig::default()).unwrap();

    let report = procedure::run(&provisioner, &plan).await.unwrap();
    assert_eq!(report.steps_completed, plan.steps().len());

    // End state matches the plan exactly.
    let check = verify(&provisioner, &plan).await.unwrap();
    assert!(check.is_clean(), "{:?}", check.discrepancies);

    // zone_events carries exactly the two compound indexes plus _id_.
    let db = DatabaseName::new("object_tracking").unwrap();
    let zone_events = CollectionName::new("zone_events").unwrap();
    let mut indexes = provisioner.list_indexes(&db, &zone_events).await.unwrap();
    indexes.sort_by(|a, b| a.name.cmp(&b.name));

    let names: Vec<_> = indexes.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["_id_", "object_id_1_timestamp_-1", "zone_id_1_timestamp_-1"]);
    assert_eq!(indexes[1].keys, doc! { "object_id": 1, "timestamp": -1 });
    assert_eq!(indexes[2].keys, doc! { "zone_id": 1, "timestamp": -1 });

    // A second run is rejected by the server at the first step.
    let err = procedure::run(&provisioner, &plan).await.unwrap_err();
    assert!(err.is_duplicate(), "unexpected error: {err}");
    assert!(matches!(
        err,
        BootstrapError::Step {
            position: 1,
            source: StoreError::UserExists(_),
            ..
        }
    ));
}

/// Connecting to a port nobody listens on fails with a connection error.
#[tokio::test]
#[ignore = "waits for the server selection timeout"]
async fn unreachable_server() {
    let provisioner = MongoProvisioner::connect(
        "mongodb://127.0.0.1:1/",
        "bootstrap-integration",
        Duration::from_millis(500),
    )
    .await
    .unwrap();

    let err = provisioner.ping().await.unwrap_err();
    assert!(matches!(err, StoreError::Connection(_)), "unexpected error: {err}");
}
