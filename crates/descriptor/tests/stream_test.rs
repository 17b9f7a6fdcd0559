//! Integration tests for reading whole descriptor streams.

#![forbid(clippy::unwrap_used)]
#![forbid(clippy::expect_used)]
#![forbid(clippy::panic)]

use cattlectl_core::Error;
use cattlectl_descriptor::{
    ApiVersion, ApiVersionGate, Descriptor, DescriptorKind, DescriptorReader, WorkloadKind,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const GATE: ApiVersionGate = ApiVersionGate::new(ApiVersion::new(1, 3));

const STREAM: &str = r"
api_version: '1.0'
kind: Rancher
catalogs:
  - name: library
    url: https://git.example/library
---
---
api_version: '1.2'
kind: Project
metadata:
  name: demo
  cluster_name: local
namespaces:
  - name: web
---
api_version: v1.3.4
kind: CronJob
metadata:
  project_name: demo
  namespace: web
spec:
  name: cleanup
  cron_job_config:
    schedule: '0 * * * *'
  containers:
    - name: main
      image: busybox
";

/// # GIVEN
/// A stream with three descriptors and one empty document
///
/// # WHEN
/// Every document is read and parsed
///
/// # THEN
/// The kinds come back in order and positions count the empty document
#[test]
fn test_stream_yields_descriptors_in_order() -> TestResult {
    let mut reader = DescriptorReader::new(STREAM);
    let mut kinds = Vec::new();
    let mut positions = Vec::new();

    while let Some(document) = reader.next() {
        kinds.push(document?.parse(&GATE)?.kind());
        positions.push(reader.position());
    }

    assert_eq!(
        kinds,
        vec![
            DescriptorKind::Rancher,
            DescriptorKind::Project,
            DescriptorKind::CronJob
        ]
    );
    assert_eq!(positions, vec![1, 3, 4]);
    Ok(())
}

/// # GIVEN
/// A cron job descriptor with kind specific settings
///
/// # WHEN
/// It is parsed
///
/// # THEN
/// The settings are carried in the workload's extra fields
#[test]
fn test_workload_keeps_kind_specific_settings() -> TestResult {
    let document = DescriptorReader::new(STREAM)
        .last()
        .ok_or("stream must not be empty")??;

    let Descriptor::Workload(kind, workload) = document.parse(&GATE)? else {
        return Err("expected a workload descriptor".into());
    };
    assert_eq!(kind, WorkloadKind::CronJob);
    assert_eq!(workload.metadata.project_name, "demo");
    assert_eq!(workload.spec.name, "cleanup");
    assert_eq!(
        workload.spec.extra["cron_job_config"]["schedule"],
        "0 * * * *"
    );
    Ok(())
}

/// # GIVEN
/// Documents a 1.3 engine must refuse
///
/// # WHEN
/// They are parsed
///
/// # THEN
/// Each one fails with the matching error
#[test]
fn test_rejected_documents() -> TestResult {
    let cases = [
        ("kind: Project\nmetadata:\n  name: demo\n", "api_version"),
        ("api_version: '1.0'\nmetadata:\n  name: demo\n", "kind"),
    ];
    for (text, field) in cases {
        let error = DescriptorReader::new(text)
            .next()
            .ok_or("document expected")?
            .err()
            .ok_or("document must be rejected")?;
        assert!(matches!(error, Error::MissingField { field: f } if f == field));
    }

    let newer =
        DescriptorReader::new("api_version: '1.4'\nkind: Project\nmetadata:\n  name: demo\n")
            .next()
            .ok_or("document expected")??;
    assert!(matches!(
        newer.parse(&GATE),
        Err(Error::UnsupportedApiVersion { .. })
    ));

    let unknown = DescriptorReader::new("api_version: '1.0'\nkind: Gadget\n")
        .next()
        .ok_or("document expected")??;
    assert!(matches!(
        unknown.parse(&GATE),
        Err(Error::UnsupportedKind { ref kind }) if kind == "Gadget"
    ));
    Ok(())
}
