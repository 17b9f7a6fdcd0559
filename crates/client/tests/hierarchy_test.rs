//! Integration tests for the client hierarchy against the in-memory backend.
//!
//! These tests verify that:
//! - Handles are cached per key and lookups happen once per run
//! - Missing parents surface as NotFound naming parent and child
//! - Namespace resolution is lazy and only caches hits
//! - Upgrade writes only when the stored hash differs

#![forbid(clippy::unwrap_used)]
#![forbid(clippy::expect_used)]
#![forbid(clippy::panic)]

use std::collections::BTreeMap;
use std::sync::Arc;

use cattlectl_client::{
    BackendOperation, HASH_LABEL, InMemoryBackend, RancherBackend, RancherClient, RemoteObject,
    ResourceClient, ResourceKind, Scope,
};
use cattlectl_core::{Error, RancherConfig};
use cattlectl_descriptor::{ConfigMap, Namespace};
use serde_json::json;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn root(backend: &Arc<InMemoryBackend>) -> RancherClient {
    RancherClient::new(&RancherConfig::default(), Arc::clone(backend) as Arc<dyn RancherBackend>)
}

fn config_map(mode: &str) -> ConfigMap {
    ConfigMap {
        name: "settings".to_string(),
        namespace: "web".to_string(),
        labels: BTreeMap::new(),
        data: [("mode".to_string(), mode.to_string())].into_iter().collect(),
    }
}

fn namespace(name: &str) -> Namespace {
    Namespace {
        name: name.to_string(),
        labels: BTreeMap::new(),
        annotations: BTreeMap::new(),
    }
}

/// # GIVEN
/// A backend with one cluster
///
/// # WHEN
/// The same cluster is requested twice
///
/// # THEN
/// One lookup is made and both handles are the same
#[test]
fn test_cluster_lookup_is_cached() -> TestResult {
    let backend = InMemoryBackend::new_arc();
    backend.add_cluster("local");
    let root = root(&backend);

    let first = root.cluster("local", "Project 'a'")?;
    let second = root.cluster("local", "Project 'b'")?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(backend.count(BackendOperation::Find, ResourceKind::Cluster), 1);

    // the id index shares the same handle
    let by_id = root.cluster_by_id(first.id(), "Project 'c'")?;
    assert!(Arc::ptr_eq(&first, &by_id));
    assert_eq!(backend.count(BackendOperation::Get, ResourceKind::Cluster), 0);
    Ok(())
}

/// # GIVEN
/// A backend without clusters
///
/// # WHEN
/// A cluster is requested on behalf of a project
///
/// # THEN
/// NotFound names both the cluster and the project
#[test]
fn test_missing_cluster_names_parent_and_child() {
    let backend = InMemoryBackend::new_arc();
    let root = root(&backend);

    let err = root.cluster("prod", "Project 'payments'").err();
    let message = err.as_ref().map(ToString::to_string).unwrap_or_default();
    assert!(matches!(err, Some(Error::NotFound { .. })));
    assert!(message.contains("prod"));
    assert!(message.contains("Project 'payments'"));
}

/// # GIVEN
/// A project whose handle has been requested twice
///
/// # WHEN
/// Leaf handles are requested with equal and different keys
///
/// # THEN
/// Equal keys share a handle, different namespaces do not
#[test]
fn test_leaf_handles_are_keyed_by_name_and_namespace() -> TestResult {
    let backend = InMemoryBackend::new_arc();
    backend.add_cluster("local");
    let cluster = root(&backend).cluster("local", "test")?;

    let project = cluster.project("demo");
    assert!(Arc::ptr_eq(&project, &cluster.project("demo")));

    let a = project.config_map("settings", "web");
    let b = project.config_map("settings", "web");
    let c = project.config_map("settings", "api");
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(c.namespace(), Some("api"));

    // constructing handles performs no remote call
    assert_eq!(backend.count(BackendOperation::Find, ResourceKind::ConfigMap), 0);
    Ok(())
}

/// # GIVEN
/// An existing project without the namespace `web`
///
/// # WHEN
/// A config map in `web` is checked, dry-run created and really created
///
/// # THEN
/// It does not exist, dry-run reports a creation, the real create fails
/// naming the namespace
#[test]
fn test_missing_namespace_semantics() -> TestResult {
    let backend = InMemoryBackend::new_arc();
    backend.add_cluster("local");
    let cluster = root(&backend).cluster("local", "test")?;
    let project = cluster.project("demo");
    project.create(false)?;

    let settings = project.config_map("settings", "web");
    settings.set_desired(config_map("prod"));

    assert!(!settings.exists()?);
    assert!(settings.create(true)?);
    let err = settings.create(false).err();
    assert!(matches!(
        err,
        Some(Error::NotFound { ref kind, ref name, .. }) if kind == "Namespace" && name == "web"
    ));
    assert_eq!(backend.count(BackendOperation::Create, ResourceKind::ConfigMap), 0);
    Ok(())
}

/// # GIVEN
/// A project where the namespace is created after a failed lookup
///
/// # WHEN
/// The namespace id is resolved again
///
/// # THEN
/// The miss was not cached; the hit is cached and not looked up again
#[test]
fn test_namespace_resolution_caches_only_hits() -> TestResult {
    let backend = InMemoryBackend::new_arc();
    backend.add_cluster("local");
    let cluster = root(&backend).cluster("local", "test")?;
    let project = cluster.project("demo");
    project.create(false)?;

    assert_eq!(project.namespace_id("web")?, None);

    let web = project.namespace("web");
    web.set_desired(namespace("web"));
    web.create(false)?;

    assert_eq!(project.namespace_id("web")?.as_deref(), Some("web"));
    let lookups = backend.count(BackendOperation::Find, ResourceKind::Namespace);
    assert_eq!(project.namespace_id("web")?.as_deref(), Some("web"));
    assert_eq!(
        backend.count(BackendOperation::Find, ResourceKind::Namespace),
        lookups
    );
    Ok(())
}

/// # GIVEN
/// A created config map
///
/// # WHEN
/// It is upgraded with the same and then with a different payload
///
/// # THEN
/// The first upgrade writes nothing, the second writes the new hash
#[test]
fn test_upgrade_writes_only_on_change() -> TestResult {
    let backend = InMemoryBackend::new_arc();
    backend.add_cluster("local");
    let cluster = root(&backend).cluster("local", "test")?;
    let project = cluster.project("demo");
    project.create(false)?;
    let web = project.namespace("web");
    web.set_desired(namespace("web"));
    web.create(false)?;

    let settings = project.config_map("settings", "web");
    settings.set_desired(config_map("prod"));
    assert!(settings.create(false)?);
    assert!(settings.exists()?);

    assert!(!settings.upgrade(false)?);
    assert_eq!(backend.count(BackendOperation::Update, ResourceKind::ConfigMap), 0);

    settings.set_desired(config_map("dev"));
    assert!(settings.upgrade(true)?);
    assert_eq!(backend.count(BackendOperation::Update, ResourceKind::ConfigMap), 0);
    assert!(settings.upgrade(false)?);
    assert_eq!(backend.count(BackendOperation::Update, ResourceKind::ConfigMap), 1);

    let stored = backend
        .objects_of(ResourceKind::ConfigMap)
        .into_iter()
        .next()
        .ok_or("config map not stored")?;
    assert_eq!(stored.body["data"]["mode"], "dev");
    Ok(())
}

/// # GIVEN
/// A catalog created outside the engine, without a hash label
///
/// # WHEN
/// The catalog is upgraded
///
/// # THEN
/// The missing label counts as changed and the label is written
#[test]
fn test_missing_hash_label_forces_write() -> TestResult {
    let backend = InMemoryBackend::new_arc();
    backend.seed(
        ResourceKind::Catalog,
        &Scope::Global,
        RemoteObject::new("library", json!({"url": "https://git.example/charts"})),
    );
    let root = root(&backend);

    let library = root.catalog("library");
    library.set_desired(serde_yaml::from_str(
        "name: library\nurl: https://git.example/charts\n",
    )?);
    assert!(library.exists()?);
    assert!(library.upgrade(false)?);

    let stored = backend
        .object(ResourceKind::Catalog, &Scope::Global, "library")
        .ok_or("catalog not stored")?;
    assert!(stored.label(HASH_LABEL).is_some());
    assert!(!library.upgrade(false)?);
    Ok(())
}

/// # GIVEN
/// A cluster without the project `payments`
///
/// # WHEN
/// A workload requires the project to exist
///
/// # THEN
/// NotFound names the project and the workload
#[test]
fn test_require_existing_project() -> TestResult {
    let backend = InMemoryBackend::new_arc();
    backend.add_cluster("local");
    let cluster = root(&backend).cluster("local", "test")?;

    let err = cluster
        .project("payments")
        .require_existing("Job 'migrate'")
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    assert!(err.contains("Project 'payments'"));
    assert!(err.contains("Job 'migrate'"));
    Ok(())
}
