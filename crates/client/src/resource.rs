//! The uniform resource-client capability set and the generic leaf client.

use std::sync::{Arc, OnceLock};

use cattlectl_core::{Error, RancherConfig, Result};
use cattlectl_descriptor::{
    App, Catalog, Certificate, ConfigMap, DockerCredential, Named, Namespace, PersistentVolume,
    Secret, StorageClass, Workload,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::backend::{RancherBackend, RemoteObject, Scope};
use crate::cluster::ClusterScope;
use crate::hash::{HASH_LABEL, change_hash};
use crate::kind::ResourceKind;
use crate::project::ProjectScope;

/// What the converger needs from any remote entity.
pub trait ResourceClient: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Fixed for the lifetime of the handle.
    fn name(&self) -> &str;

    /// Server id, looked up on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the entity does not exist remotely.
    fn id(&self) -> Result<String>;

    /// # Errors
    ///
    /// Returns [`Error::Backend`] if the lookup fails.
    fn exists(&self) -> Result<bool>;

    /// Create the entity. Returns whether a write happened (or would have).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if a parent is missing and `dry_run` is
    /// off, or any backend error.
    fn create(&self, dry_run: bool) -> Result<bool>;

    /// Bring the entity up to date. Returns whether a write happened (or
    /// would have); `false` when the stored hash already matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the entity vanished, or any backend
    /// error.
    fn upgrade(&self, dry_run: bool) -> Result<bool>;
}

/// Behaviour switches taken from the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Overlay desired app answers onto the deployed ones on upgrade.
    pub merge_answers: bool,
}

impl From<&RancherConfig> for ClientOptions {
    fn from(config: &RancherConfig) -> Self {
        Self {
            merge_answers: config.merge_answers,
        }
    }
}

/// A desired-state payload a leaf client can write.
pub trait Payload: Named + Serialize + Clone + Send + Sync + 'static {
    /// Request body for create and update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the payload does not render as JSON.
    fn body(&self) -> Result<Value> {
        to_body(self)
    }

    /// Final body for an update of `remote`.
    fn update_body(&self, body: Value, _remote: &RemoteObject, _options: ClientOptions) -> Value {
        body
    }
}

fn to_body<T: Serialize>(payload: &T) -> Result<Value> {
    serde_json::to_value(payload).map_err(|e| Error::decode(format!("cannot render body: {e}")))
}

impl Payload for Namespace {}
impl Payload for Certificate {}
impl Payload for ConfigMap {}
impl Payload for Secret {}
impl Payload for StorageClass {}
impl Payload for Catalog {}

impl Payload for PersistentVolume {
    /// The verbatim volume source gets camelCase keys like the declared fields.
    fn body(&self) -> Result<Value> {
        let mut body = to_body(self)?;
        if let Some(map) = body.as_object_mut() {
            camel_case_keys(map);
        }
        Ok(body)
    }
}

impl Payload for Workload {
    /// Kind specific settings and container extras get camelCase keys. Their
    /// values are sent as written.
    fn body(&self) -> Result<Value> {
        let mut body = to_body(self)?;
        if let Some(map) = body.as_object_mut() {
            camel_case_keys(map);
            if let Some(Value::Array(containers)) = map.get_mut("containers") {
                containers
                    .iter_mut()
                    .filter_map(Value::as_object_mut)
                    .for_each(camel_case_keys);
            }
        }
        Ok(body)
    }
}

fn camel_case_keys(map: &mut Map<String, Value>) {
    *map = std::mem::take(map)
        .into_iter()
        .map(|(key, value)| (camel_case(&key), value))
        .collect();
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl Payload for DockerCredential {
    /// Registries are keyed by host on the wire.
    fn body(&self) -> Result<Value> {
        let mut body = to_body(self)?;
        let registries: Map<String, Value> = self
            .registries
            .iter()
            .map(|r| {
                (
                    r.name.clone(),
                    json!({ "username": r.username, "password": r.password }),
                )
            })
            .collect();
        if let Some(map) = body.as_object_mut() {
            map.insert("registries".to_string(), Value::Object(registries));
        }
        Ok(body)
    }
}

impl Payload for App {
    fn body(&self) -> Result<Value> {
        let mut body = to_body(self)?;
        if let Some(map) = body.as_object_mut() {
            map.insert("externalId".to_string(), Value::String(self.external_id()));
            map.insert(
                "targetNamespace".to_string(),
                Value::String(self.namespace.clone()),
            );
        }
        Ok(body)
    }

    fn update_body(&self, mut body: Value, remote: &RemoteObject, options: ClientOptions) -> Value {
        if !options.merge_answers {
            return body;
        }
        let mut answers = remote
            .body
            .get("answers")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (key, value) in &self.answers {
            answers.insert(key.clone(), Value::String(value.clone()));
        }
        if let Some(map) = body.as_object_mut() {
            map.insert("answers".to_string(), Value::Object(answers));
        }
        body
    }
}

/// Where a leaf lives, relative to the hierarchy.
pub(crate) enum Placement {
    Global,
    Cluster(Arc<ClusterScope>),
    Project(Arc<ProjectScope>),
    Namespace {
        project: Arc<ProjectScope>,
        namespace: String,
        namespace_id: OnceLock<String>,
    },
}

impl Placement {
    /// Scope for optional-namespace resources.
    pub(crate) fn in_project(project: &Arc<ProjectScope>, namespace: Option<&str>) -> Self {
        match namespace {
            Some(namespace) => Self::namespaced(project, namespace),
            None => Self::Project(Arc::clone(project)),
        }
    }

    pub(crate) fn namespaced(project: &Arc<ProjectScope>, namespace: &str) -> Self {
        Self::Namespace {
            project: Arc::clone(project),
            namespace: namespace.to_string(),
            namespace_id: OnceLock::new(),
        }
    }

    /// Remote scope, or `None` while a parent does not exist.
    fn resolve(&self) -> Result<Option<Scope>> {
        match self {
            Self::Global => Ok(Some(Scope::Global)),
            Self::Cluster(cluster) => Ok(Some(cluster.scope())),
            Self::Project(project) => project.scope(),
            Self::Namespace {
                project,
                namespace,
                namespace_id,
            } => {
                let Some(project_id) = project.id()? else {
                    return Ok(None);
                };
                let namespace_id = match namespace_id.get() {
                    Some(id) => id.clone(),
                    None => match project.namespace_id(namespace)? {
                        Some(id) => namespace_id.get_or_init(|| id).clone(),
                        None => return Ok(None),
                    },
                };
                Ok(Some(Scope::Namespace {
                    cluster_id: project.cluster.id.clone(),
                    project_id,
                    namespace_id,
                }))
            }
        }
    }

    /// Error for a write whose parent is missing.
    fn missing_parent(&self, required_by: &str) -> Error {
        match self {
            Self::Project(project) => {
                Error::not_found(ResourceKind::Project.as_str(), &project.name, required_by)
            }
            Self::Namespace {
                project, namespace, ..
            } if project.is_resolved() => {
                Error::not_found(ResourceKind::Namespace.as_str(), namespace, required_by)
            }
            Self::Namespace { project, .. } => {
                Error::not_found(ResourceKind::Project.as_str(), &project.name, required_by)
            }
            Self::Global | Self::Cluster(_) => Error::backend("resolve", "scope always exists"),
        }
    }

    fn namespace(&self) -> Option<&str> {
        match self {
            Self::Namespace { namespace, .. } => Some(namespace),
            _ => None,
        }
    }
}

/// Client for one leaf resource.
///
/// The handle is keyed by kind, name and namespace; its desired payload is
/// attached separately with [`Resource::set_desired`] so cached handles can
/// be shared between descriptors.
pub struct Resource<P: Payload> {
    kind: ResourceKind,
    name: String,
    placement: Placement,
    desired: RwLock<Option<P>>,
    id: OnceLock<String>,
    backend: Arc<dyn RancherBackend>,
    options: ClientOptions,
}

impl<P: Payload> Resource<P> {
    pub(crate) fn new(
        kind: ResourceKind,
        name: impl Into<String>,
        placement: Placement,
        backend: Arc<dyn RancherBackend>,
        options: ClientOptions,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            placement,
            desired: RwLock::new(None),
            id: OnceLock::new(),
            backend,
            options,
        }
    }

    /// Attach the payload the next create or upgrade writes.
    pub fn set_desired(&self, payload: P) {
        *self.desired.write() = Some(payload);
    }

    pub fn desired(&self) -> Option<P> {
        self.desired.read().clone()
    }

    /// Namespace this handle is bound to, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.placement.namespace()
    }

    fn label(&self) -> String {
        format!("{} '{}'", self.kind, self.name)
    }

    fn desired_object(&self) -> Result<(P, RemoteObject)> {
        let desired = self
            .desired()
            .ok_or_else(|| Error::decode(format!("{} has no desired state", self.label())))?;
        let hash = change_hash(&desired)?;
        let object =
            RemoteObject::new(self.name.clone(), desired.body()?).with_label(HASH_LABEL, hash);
        Ok((desired, object))
    }

    fn remote(&self, scope: &Scope) -> Result<Option<RemoteObject>> {
        let found = match self.id.get() {
            Some(id) => self.backend.get(self.kind, scope, id)?,
            None => self.backend.find(self.kind, scope, &self.name)?,
        };
        if let Some(id) = found.as_ref().and_then(|o| o.id.clone()) {
            let _ = self.id.set(id);
        }
        Ok(found)
    }
}

impl<P: Payload> ResourceClient for Resource<P> {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> Result<String> {
        if let Some(id) = self.id.get() {
            return Ok(id.clone());
        }
        let scope = self
            .placement
            .resolve()?
            .ok_or_else(|| self.placement.missing_parent(&self.label()))?;
        self.remote(&scope)?
            .and_then(|object| object.id)
            .ok_or_else(|| Error::not_found(self.kind.as_str(), &self.name, "id lookup"))
    }

    fn exists(&self) -> Result<bool> {
        let Some(scope) = self.placement.resolve()? else {
            debug!(kind = %self.kind, name = %self.name, "Parent does not exist yet");
            return Ok(false);
        };
        Ok(self.remote(&scope)?.is_some())
    }

    fn create(&self, dry_run: bool) -> Result<bool> {
        let (_, object) = self.desired_object()?;
        let Some(scope) = self.placement.resolve()? else {
            if dry_run {
                warn!(
                    kind = %self.kind,
                    name = %self.name,
                    "Parent does not exist yet; would create once it does"
                );
                return Ok(true);
            }
            return Err(self.placement.missing_parent(&self.label()));
        };

        if dry_run {
            info!(kind = %self.kind, name = %self.name, scope = %scope, "Would create");
            return Ok(true);
        }

        let created = self.backend.create(self.kind, &scope, object)?;
        if let Some(id) = created.id {
            let _ = self.id.set(id);
        }
        info!(kind = %self.kind, name = %self.name, scope = %scope, "Created");
        Ok(true)
    }

    fn upgrade(&self, dry_run: bool) -> Result<bool> {
        let (desired, object) = self.desired_object()?;
        let scope = self
            .placement
            .resolve()?
            .ok_or_else(|| self.placement.missing_parent(&self.label()))?;
        let remote = self
            .remote(&scope)?
            .ok_or_else(|| Error::not_found(self.kind.as_str(), &self.name, "upgrade"))?;

        if remote.label(HASH_LABEL) == object.label(HASH_LABEL) {
            debug!(kind = %self.kind, name = %self.name, "Up to date");
            return Ok(false);
        }

        if dry_run {
            info!(kind = %self.kind, name = %self.name, scope = %scope, "Would upgrade");
            return Ok(true);
        }

        let RemoteObject { labels, body, .. } = object;
        let update = RemoteObject {
            id: remote.id.clone(),
            name: self.name.clone(),
            labels,
            body: desired.update_body(body, &remote, self.options),
        };
        self.backend.update(self.kind, &scope, update)?;
        info!(kind = %self.kind, name = %self.name, scope = %scope, "Upgraded");
        Ok(true)
    }
}
