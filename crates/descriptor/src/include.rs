//! Loading of `metadata.includes` references.
//!
//! Includes are resolved depth first: an included project's own includes
//! are merged into it before it is merged into the including project.
//! Paths are relative to the directory of the file that names them.

use std::fs;
use std::path::{Path, PathBuf};

use cattlectl_core::{Error, Result, ResultExt};
use itertools::Itertools;
use tracing::{debug, warn};

use crate::decode::DescriptorReader;
use crate::merge::merge_project;
use crate::types::{Descriptor, Include, IncludeSource, ProjectDescriptor};
use crate::version::ApiVersionGate;

/// Resolves project includes from the filesystem. Performs no remote calls.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    gate: ApiVersionGate,
    base_dir: PathBuf,
    origin: Option<PathBuf>,
}

impl IncludeResolver {
    /// Resolver for descriptors that were not read from a file (e.g. stdin).
    pub fn new(gate: ApiVersionGate, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            gate,
            base_dir: base_dir.into(),
            origin: None,
        }
    }

    /// Resolver for descriptors read from `file`.
    pub fn for_file(gate: ApiVersionGate, file: &Path) -> Self {
        let base_dir = file
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            gate,
            base_dir,
            origin: fs::canonicalize(file).ok(),
        }
    }

    /// Merge every include of `project` into it.
    ///
    /// The returned descriptor has no includes left.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileRead`] for unreadable files, [`Error::Decode`] for
    /// include cycles or non-project documents, and any decoder error of the
    /// included files.
    pub fn resolve(&self, project: ProjectDescriptor) -> Result<ProjectDescriptor> {
        let mut chain: Vec<PathBuf> = self.origin.iter().cloned().collect();
        self.resolve_chain(project, &self.base_dir, &mut chain)
    }

    fn resolve_chain(
        &self,
        mut project: ProjectDescriptor,
        base_dir: &Path,
        chain: &mut Vec<PathBuf>,
    ) -> Result<ProjectDescriptor> {
        let includes = std::mem::take(&mut project.metadata.includes);
        let mut merged = project;

        for include in &includes {
            for path in expand(include, base_dir)? {
                let canonical =
                    fs::canonicalize(&path).map_err(|e| Error::file_read(&path, e.to_string()))?;
                if chain.contains(&canonical) {
                    return Err(Error::decode(format!(
                        "include cycle: {} is already being included",
                        path.display()
                    )));
                }

                debug!(
                    project = %merged.metadata.name,
                    include = %path.display(),
                    "Resolving include"
                );
                chain.push(canonical);
                let child_base = path.parent().unwrap_or(base_dir).to_path_buf();
                for child in self.load(&path)? {
                    let child = self
                        .resolve_chain(child, &child_base, chain)
                        .with_context(|| format!("include {}", path.display()))?;
                    merged = merge_project(&child, merged);
                }
                chain.pop();
            }
        }

        Ok(merged)
    }

    fn load(&self, path: &Path) -> Result<Vec<ProjectDescriptor>> {
        let text = fs::read_to_string(path).map_err(|e| Error::file_read(path, e.to_string()))?;

        DescriptorReader::new(&text)
            .map(|document| match document?.parse(&self.gate)? {
                Descriptor::Project(project) => Ok(*project),
                other => Err(Error::decode(format!(
                    "{}: only Project descriptors can be included, found {}",
                    path.display(),
                    other.kind()
                ))),
            })
            .collect()
    }
}

fn expand(include: &Include, base_dir: &Path) -> Result<Vec<PathBuf>> {
    match include.source()? {
        IncludeSource::File(file) => Ok(vec![base_dir.join(file)]),
        IncludeSource::Glob(pattern) => {
            let full = base_dir.join(pattern);
            let paths = glob::glob(&full.to_string_lossy())
                .map_err(|e| Error::decode(format!("invalid include pattern '{pattern}': {e}")))?
                .filter_map(|entry| entry.ok())
                .sorted()
                .collect_vec();
            if paths.is_empty() {
                warn!(pattern = %full.display(), "Include pattern matched no files");
            }
            Ok(paths)
        }
        IncludeSource::Directory(dir) => {
            let dir = base_dir.join(dir);
            let entries =
                fs::read_dir(&dir).map_err(|e| Error::file_read(&dir, e.to_string()))?;
            Ok(entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    path.is_file()
                        && path
                            .extension()
                            .is_some_and(|ext| ext == "yaml" || ext == "yml")
                })
                .sorted()
                .collect_vec())
        }
    }
}
