//! Integration tests for applying descriptor streams.
//!
//! These tests verify that:
//! - A second apply of an unchanged stream writes nothing
//! - A failing document stops the stream and keeps earlier results
//! - Cluster lookups are shared across documents
//! - Dry runs report changes without writing them

#![forbid(clippy::unwrap_used)]
#![forbid(clippy::expect_used)]
#![forbid(clippy::panic)]

use std::fs;
use std::sync::Arc;

use cattlectl_client::{
    BackendOperation, InMemoryBackend, RancherBackend, RancherClient, RemoteObject, ResourceKind,
    Scope,
};
use cattlectl_core::{Error, RancherConfig};
use cattlectl_descriptor::{ApiVersion, ApiVersionGate, IncludeResolver};
use cattlectl_reconciler::{Applier, ConvergeResult, ResourceDescriptor};
use serde_json::json;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const GATE: ApiVersionGate = ApiVersionGate::new(ApiVersion::new(1, 3));

const PROJECT: &str = r"
api_version: '1.0'
kind: Project
metadata:
  name: demo
namespaces:
  - name: web
storage_classes:
  - name: local-path
    provisioner: rancher.io/local-path
resources:
  config_maps:
    - name: settings
      namespace: web
      data:
        mode: prod
  secrets:
    - name: token
      data:
        value: c2VjcmV0
apps:
  - name: blog
    namespace: web
    catalog: library
    chart: wordpress
    version: 7.3.8
    answers:
      replicas: '2'
";

struct Fixture {
    backend: Arc<InMemoryBackend>,
    cluster_id: String,
}

impl Fixture {
    fn new() -> Self {
        let backend = InMemoryBackend::new_arc();
        let cluster_id = backend.add_cluster("local");
        Self {
            backend,
            cluster_id,
        }
    }

    /// A fresh client hierarchy, as a new run would build it.
    fn applier(&self) -> Applier {
        let config = RancherConfig {
            cluster_name: Some("local".to_string()),
            ..RancherConfig::default()
        };
        let root = RancherClient::new(
            &config,
            Arc::clone(&self.backend) as Arc<dyn RancherBackend>,
        );
        Applier::new(root, GATE)
    }

    fn cluster_scope(&self) -> Scope {
        Scope::Cluster {
            cluster_id: self.cluster_id.clone(),
        }
    }

    /// Existing project `name` with namespace `web`.
    fn seed_project(&self, name: &str) {
        let project_id = self.backend.seed(
            ResourceKind::Project,
            &self.cluster_scope(),
            RemoteObject::new(name, json!({ "name": name })),
        );
        self.backend.seed(
            ResourceKind::Namespace,
            &Scope::Project {
                cluster_id: self.cluster_id.clone(),
                project_id,
            },
            RemoteObject::new("web", json!({ "name": "web" })),
        );
    }
}

fn created(result: &ConvergeResult) -> Vec<(ResourceKind, &str)> {
    result
        .created
        .iter()
        .map(|d| (d.kind, d.name.as_str()))
        .collect()
}

/// # GIVEN
/// An empty cluster and a project descriptor
///
/// # WHEN
/// The descriptor is applied twice
///
/// # THEN
/// The first run creates everything in declaration order, the second run
/// (same or fresh hierarchy) changes nothing
#[test]
fn test_apply_is_idempotent() -> TestResult {
    let fixture = Fixture::new();
    let applier = fixture.applier();

    let first = applier.apply_str(PROJECT)?;
    assert_eq!(
        created(&first),
        vec![
            (ResourceKind::Project, "demo"),
            (ResourceKind::Namespace, "web"),
            (ResourceKind::StorageClass, "local-path"),
            (ResourceKind::ConfigMap, "settings"),
            (ResourceKind::Secret, "token"),
            (ResourceKind::App, "blog"),
        ]
    );
    assert!(first.upgraded.is_empty());

    let writes = fixture.backend.write_count();
    let second = applier.apply_str(PROJECT)?;
    assert!(!second.changed());

    let third = fixture.applier().apply_str(PROJECT)?;
    assert!(!third.changed());
    assert_eq!(fixture.backend.write_count(), writes);
    Ok(())
}

/// # GIVEN
/// A three document stream whose second document has no kind
///
/// # WHEN
/// The stream is applied
///
/// # THEN
/// Only the first document's changes are returned, with the error, and the
/// third document is never processed
#[test]
fn test_failure_keeps_earlier_documents() -> TestResult {
    let fixture = Fixture::new();
    let stream = r"
api_version: '1.0'
kind: Project
metadata:
  name: first
namespaces:
  - name: a
---
api_version: '1.0'
metadata:
  name: broken
---
api_version: '1.0'
kind: Project
metadata:
  name: third
";

    let failure = fixture
        .applier()
        .apply_str(stream)
        .err()
        .ok_or("second document must fail")?;

    assert_eq!(
        created(&failure.partial),
        vec![(ResourceKind::Project, "first"), (ResourceKind::Namespace, "a")]
    );
    assert!(failure.error.to_string().starts_with("document 2: "));
    assert!(matches!(
        failure.error.root_cause(),
        Error::MissingField { field: "kind" }
    ));
    assert!(
        fixture
            .backend
            .object(ResourceKind::Project, &fixture.cluster_scope(), "third")
            .is_none()
    );
    Ok(())
}

/// # GIVEN
/// Two project documents naming the same cluster
///
/// # WHEN
/// They are applied in one stream
///
/// # THEN
/// The cluster is looked up once
#[test]
fn test_cluster_lookup_is_shared_across_documents() -> TestResult {
    let fixture = Fixture::new();
    let stream = r"
api_version: '1.0'
kind: Project
metadata:
  name: one
  cluster_name: local
---
api_version: '1.0'
kind: Project
metadata:
  name: two
  cluster_name: local
";

    let result = fixture.applier().apply_str(stream)?;
    assert_eq!(result.created.len(), 2);
    assert_eq!(
        fixture
            .backend
            .count(BackendOperation::Find, ResourceKind::Cluster),
        1
    );
    Ok(())
}

/// # GIVEN
/// An existing project and namespace, and an app descriptor named `demo`
///
/// # WHEN
/// The descriptor is applied twice
///
/// # THEN
/// The first run creates exactly the app, the second run upgrades nothing
#[test]
fn test_app_create_then_no_op() -> TestResult {
    let fixture = Fixture::new();
    fixture.seed_project("shop");
    let stream = r"
api_version: '1.3'
kind: Project
metadata:
  name: shop
apps:
  - name: demo
    namespace: web
    catalog: library
    chart: wordpress
    version: 7.3.8
";
    let applier = fixture.applier();

    let first = applier.apply_str(stream)?;
    assert_eq!(first.created, vec![ResourceDescriptor::new(ResourceKind::App, "demo")]);
    assert!(first.upgraded.is_empty());
    assert_eq!(
        fixture
            .backend
            .count(BackendOperation::Create, ResourceKind::App),
        1
    );

    let second = applier.apply_str(stream)?;
    assert!(second.created.is_empty());
    assert!(second.upgraded.is_empty());
    assert_eq!(
        fixture
            .backend
            .count(BackendOperation::Update, ResourceKind::App),
        0
    );
    Ok(())
}

/// # GIVEN
/// A deployed app
///
/// # WHEN
/// Its chart version changes
///
/// # THEN
/// The app is upgraded once and the stored body carries the new version
#[test]
fn test_changed_app_is_upgraded() -> TestResult {
    let fixture = Fixture::new();
    fixture.seed_project("shop");
    let app = |version: &str| {
        format!(
            "api_version: '1.3'\nkind: Project\nmetadata:\n  name: shop\napps:\n  - name: demo\n    namespace: web\n    catalog: library\n    chart: wordpress\n    version: {version}\n"
        )
    };
    let applier = fixture.applier();
    applier.apply_str(&app("7.3.8"))?;

    let result = applier.apply_str(&app("7.4.0"))?;
    assert_eq!(result.upgraded, vec![ResourceDescriptor::new(ResourceKind::App, "demo")]);

    let stored = fixture
        .backend
        .objects_of(ResourceKind::App)
        .into_iter()
        .next()
        .ok_or("app not stored")?;
    assert_eq!(
        stored.body["externalId"],
        "catalog://?catalog=library&template=wordpress&version=7.4.0"
    );
    Ok(())
}

/// # GIVEN
/// A descriptor declaring a newer api version than the engine
///
/// # WHEN
/// It is applied
///
/// # THEN
/// Nothing is converged and the version error is returned
#[test]
fn test_newer_api_version_is_rejected() -> TestResult {
    let fixture = Fixture::new();
    let failure = fixture
        .applier()
        .apply_str("api_version: '1.4'\nkind: Project\nmetadata:\n  name: demo\n")
        .err()
        .ok_or("newer api version must fail")?;

    assert!(failure.partial.is_empty());
    assert!(matches!(
        failure.error.root_cause(),
        Error::UnsupportedApiVersion { .. }
    ));
    assert_eq!(fixture.backend.write_count(), 0);
    Ok(())
}

/// # GIVEN
/// A descriptor with an unquoted `api_version: 1.10`, which YAML reads as
/// the float 1.1
///
/// # WHEN
/// It is applied by a 1.3 engine
///
/// # THEN
/// It is refused as a decode error and nothing is written
#[test]
fn test_unquoted_api_version_cannot_pass_the_gate() -> TestResult {
    let fixture = Fixture::new();
    let failure = fixture
        .applier()
        .apply_str("api_version: 1.10\nkind: Project\nmetadata:\n  name: demo\n")
        .err()
        .ok_or("unquoted api version must fail")?;

    assert!(failure.partial.is_empty());
    assert!(matches!(failure.error.root_cause(), Error::Decode { .. }));
    assert!(failure.error.to_string().contains("api_version"));
    assert_eq!(fixture.backend.write_count(), 0);
    Ok(())
}

/// # GIVEN
/// An empty cluster
///
/// # WHEN
/// A project descriptor is applied as a dry run
///
/// # THEN
/// Every would-be creation is reported and nothing is written
#[test]
fn test_dry_run_writes_nothing() -> TestResult {
    let fixture = Fixture::new();
    let result = fixture.applier().with_dry_run(true).apply_str(PROJECT)?;

    assert_eq!(result.created.len(), 6);
    assert_eq!(fixture.backend.write_count(), 0);
    Ok(())
}

/// # GIVEN
/// A job descriptor for a project that does not exist
///
/// # WHEN
/// It is applied
///
/// # THEN
/// NotFound names the project and the job
#[test]
fn test_workload_requires_existing_project() -> TestResult {
    let fixture = Fixture::new();
    let stream = r"
api_version: '1.0'
kind: Job
metadata:
  project_name: payments
  namespace: web
spec:
  name: migrate
  containers:
    - name: main
      image: busybox
";
    let failure = fixture
        .applier()
        .apply_str(stream)
        .err()
        .ok_or("missing project must fail")?;

    assert!(failure.error.is_not_found());
    let message = failure.error.to_string();
    assert!(message.contains("Project 'payments'"));
    assert!(message.contains("Job 'migrate'"));
    Ok(())
}

/// # GIVEN
/// An existing project and a deployment descriptor
///
/// # WHEN
/// It is applied twice
///
/// # THEN
/// The deployment is created once and then left alone
#[test]
fn test_workload_is_created_then_left_alone() -> TestResult {
    let fixture = Fixture::new();
    fixture.seed_project("shop");
    let stream = r"
api_version: '1.2'
kind: Deployment
metadata:
  project_name: shop
  namespace: web
spec:
  name: frontend
  containers:
    - name: nginx
      image: nginx:1.27
      ports:
        - container_port: 80
  scale: 2
";
    let applier = fixture.applier();
    let first = applier.apply_str(stream)?;
    assert_eq!(
        created(&first),
        vec![(ResourceKind::Deployment, "frontend")]
    );
    assert!(!applier.apply_str(stream)?.changed());
    Ok(())
}

/// # GIVEN
/// Rancher and Cluster descriptors
///
/// # WHEN
/// They are applied
///
/// # THEN
/// Global and cluster catalogs and storage classes are created
#[test]
fn test_rancher_and_cluster_descriptors() -> TestResult {
    let fixture = Fixture::new();
    let stream = r"
api_version: '1.0'
kind: Rancher
catalogs:
  - name: library
    url: https://git.example/library
---
api_version: '1.0'
kind: Cluster
metadata:
  name: local
storage_classes:
  - name: fast
    provisioner: kubernetes.io/no-provisioner
catalogs:
  - name: internal
    url: https://git.example/internal
";
    let result = fixture.applier().apply_str(stream)?;
    assert_eq!(
        created(&result),
        vec![
            (ResourceKind::Catalog, "library"),
            (ResourceKind::StorageClass, "fast"),
            (ResourceKind::Catalog, "internal"),
        ]
    );
    assert!(
        fixture
            .backend
            .object(ResourceKind::Catalog, &Scope::Global, "library")
            .is_some()
    );
    assert!(
        fixture
            .backend
            .object(ResourceKind::Catalog, &fixture.cluster_scope(), "internal")
            .is_some()
    );
    Ok(())
}

/// # GIVEN
/// A project file including a shared file
///
/// # WHEN
/// The project file is applied
///
/// # THEN
/// Included namespaces are converged after the parent's own
#[test]
fn test_included_files_are_merged() -> TestResult {
    let dir = tempfile::tempdir()?;
    let main = dir.path().join("project.yaml");
    fs::write(
        &main,
        "api_version: '1.0'\nkind: Project\nmetadata:\n  name: demo\n  includes:\n    - file: shared.yaml\nnamespaces:\n  - name: web\n",
    )?;
    fs::write(
        dir.path().join("shared.yaml"),
        "api_version: '1.0'\nkind: Project\nmetadata:\n  name: shared\nnamespaces:\n  - name: web\n  - name: jobs\n",
    )?;

    let fixture = Fixture::new();
    let applier = fixture
        .applier()
        .with_includes(IncludeResolver::for_file(GATE, &main));
    let result = applier.apply_str(&fs::read_to_string(&main)?)?;

    assert_eq!(
        created(&result),
        vec![
            (ResourceKind::Project, "demo"),
            (ResourceKind::Namespace, "web"),
            (ResourceKind::Namespace, "jobs"),
        ]
    );
    Ok(())
}
