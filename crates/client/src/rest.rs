//! Blocking REST backend for the `/v3` collection API.
//!
//! Collections answer `GET <collection>?name=<name>` with `{"data": [...]}`,
//! single objects live at `<collection>/<id>`, `POST <collection>` creates
//! and `PUT <collection>/<id>` replaces. Parent ids (`clusterId`,
//! `projectId`, `namespaceId`) are filters on reads and body fields on
//! writes.

use std::time::Duration;

use cattlectl_core::{Error, RancherConfig, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{Map, Value};
use tracing::trace;
use url::Url;

use crate::backend::{RancherBackend, RemoteObject, Scope};
use crate::kind::ResourceKind;

/// Where a (kind, scope) pair lives on the API.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Collection {
    path: String,
    /// Parent ids: query filters on reads, body fields on writes.
    parents: Vec<(&'static str, String)>,
}

impl Collection {
    fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            parents: Vec::new(),
        }
    }

    fn with_parent(mut self, field: &'static str, id: &str) -> Self {
        self.parents.push((field, id.to_string()));
        self
    }
}

fn collection(kind: ResourceKind, scope: &Scope) -> Result<Collection> {
    use ResourceKind as K;

    let route = match (kind, scope) {
        (K::Cluster | K::Catalog, Scope::Global) => Collection::new(kind.collection()),
        (K::Catalog, Scope::Cluster { cluster_id }) => {
            Collection::new("clustercatalogs").with_parent("clusterId", cluster_id)
        }
        (K::Project, Scope::Cluster { cluster_id }) => {
            Collection::new("projects").with_parent("clusterId", cluster_id)
        }
        (K::StorageClass | K::PersistentVolume, Scope::Cluster { cluster_id }) => {
            Collection::new(format!("clusters/{cluster_id}/{}", kind.collection()))
        }
        (
            K::Namespace,
            Scope::Project {
                cluster_id,
                project_id,
            },
        ) => Collection::new(format!("clusters/{cluster_id}/namespaces"))
            .with_parent("projectId", project_id),
        (K::Certificate | K::Secret | K::DockerCredential, Scope::Project { project_id, .. }) => {
            Collection::new(format!("projects/{project_id}/{}", kind.collection()))
                .with_parent("projectId", project_id)
        }
        (
            K::Certificate | K::Secret | K::DockerCredential,
            Scope::Namespace {
                project_id,
                namespace_id,
                ..
            },
        ) => Collection::new(format!("projects/{project_id}/namespaced{}", kind.collection()))
            .with_parent("projectId", project_id)
            .with_parent("namespaceId", namespace_id),
        (
            K::ConfigMap | K::App | K::Job | K::CronJob | K::Deployment | K::DaemonSet
            | K::StatefulSet,
            Scope::Namespace {
                project_id,
                namespace_id,
                ..
            },
        ) => Collection::new(format!("projects/{project_id}/{}", kind.collection()))
            .with_parent("projectId", project_id)
            .with_parent("namespaceId", namespace_id),
        _ => {
            return Err(Error::backend(
                "route",
                format!("{kind} objects cannot live in {scope}"),
            ));
        }
    };
    Ok(route)
}

/// Backend speaking HTTP to a live endpoint.
pub struct RestBackend {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl RestBackend {
    /// Build a backend from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is missing or invalid, or the
    /// HTTP client cannot be built.
    pub fn new(config: &RancherConfig) -> Result<Self> {
        Self::with_timeout(config, config.timeout())
    }

    /// Like [`RestBackend::new`] with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// See [`RestBackend::new`].
    pub fn with_timeout(config: &RancherConfig, timeout: Duration) -> Result<Self> {
        let base = config.endpoint()?;
        let http = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.insecure_api)
            .build()
            .map_err(|e| Error::config(format!("cannot build http client: {e}")))?;

        Ok(Self {
            http,
            base,
            token: config.token(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/v3/{path}", self.base.as_str().trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| Error::backend("url", format!("{raw}: {e}")))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, operation: &str, request: RequestBuilder) -> Result<Option<Value>> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| Error::backend(operation, e.to_string()))?;
        read_json(operation, response)
    }
}

fn read_json(operation: &str, response: Response) -> Result<Option<Value>> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        let text = response.text().unwrap_or_default();
        return Err(Error::backend(operation, format!("{status}: {text}")));
    }
    response
        .json::<Value>()
        .map(Some)
        .map_err(|e| Error::backend(operation, format!("invalid response body: {e}")))
}

fn into_object(operation: &str, value: Value) -> Result<RemoteObject> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::backend(operation, "object without a name"))?;
    let id = value.get("id").and_then(Value::as_str).map(str::to_string);
    let mut object = RemoteObject::new(name, value);
    object.id = id;
    Ok(object)
}

/// Request body: the object's body plus name, labels and parent ids.
fn request_body(object: &RemoteObject, collection: &Collection) -> Result<Value> {
    let mut body = match &object.body {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        _ => return Err(Error::backend("encode", "request body must be an object")),
    };
    body.insert("name".to_string(), Value::String(object.name.clone()));
    body.insert(
        "labels".to_string(),
        Value::Object(
            object
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        ),
    );
    for (field, id) in &collection.parents {
        body.insert((*field).to_string(), Value::String(id.clone()));
    }
    Ok(Value::Object(body))
}

impl RancherBackend for RestBackend {
    fn find(&self, kind: ResourceKind, scope: &Scope, name: &str) -> Result<Option<RemoteObject>> {
        let collection = collection(kind, scope)?;
        let mut query = vec![("name", name.to_string())];
        query.extend(collection.parents.iter().cloned());

        let request = self.http.get(self.url(&collection.path)?).query(&query);
        let Some(page) = self.send("find", request)? else {
            return Ok(None);
        };
        trace!(kind = %kind, name, "Collection page received");

        page.get("data")
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .find(|item| item.get("name").and_then(Value::as_str) == Some(name))
            })
            .cloned()
            .map(|item| into_object("find", item))
            .transpose()
    }

    fn get(&self, kind: ResourceKind, scope: &Scope, id: &str) -> Result<Option<RemoteObject>> {
        let collection = collection(kind, scope)?;
        let request = self
            .http
            .get(self.url(&format!("{}/{id}", collection.path))?);
        self.send("get", request)?
            .map(|value| into_object("get", value))
            .transpose()
    }

    fn create(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        object: RemoteObject,
    ) -> Result<RemoteObject> {
        let collection = collection(kind, scope)?;
        let body = request_body(&object, &collection)?;
        let request = self.http.post(self.url(&collection.path)?).json(&body);
        let created = self
            .send("create", request)?
            .ok_or_else(|| Error::backend("create", format!("{} not found", collection.path)))?;
        into_object("create", created)
    }

    fn update(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        object: RemoteObject,
    ) -> Result<RemoteObject> {
        let collection = collection(kind, scope)?;
        let id = object
            .id
            .clone()
            .ok_or_else(|| {
                Error::backend("update", format!("{kind} '{}' has no id", object.name))
            })?;
        let body = request_body(&object, &collection)?;
        let request = self
            .http
            .put(self.url(&format!("{}/{id}", collection.path))?)
            .json(&body);
        let updated = self
            .send("update", request)?
            .ok_or_else(|| Error::not_found(kind.as_str(), &object.name, "update"))?;
        into_object("update", updated)
    }
}
