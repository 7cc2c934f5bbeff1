//! # Static Method Resolver
//!
//! Resolves full gRPC method names (`/package.Service/Method`) against descriptor sets
//! fetched from a [`DescriptorSource`].
//!
//! The default source is a directory holding one encoded `FileDescriptorSet` per service,
//! named after the service's fully qualified name (`<dir>/echo.EchoService.pb`). Files are read
//! lazily, the first time one of their methods is requested, and every resolved method is
//! cached under the exact string that was requested.
use crate::descriptor::{self, ParseError};
use crate::pool::ResolvedMethod;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Extension of the descriptor files read by [`DirectorySource`].
pub const DESCRIPTOR_FILE_EXTENSION: &str = "pb";

#[derive(Debug, thiserror::Error)]
pub enum StaticResolveError {
    #[error("Invalid full method name '{0}', expected /package.Service/Method")]
    InvalidFullMethodName(String),
    #[error("Failed to read descriptor for service '{service}': '{source}'")]
    Source {
        service: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Method '{0}' not found in descriptor set")]
    MethodNotFound(String),
}

/// Provides the encoded descriptor set describing a service, given its fully qualified name.
pub trait DescriptorSource: Send + Sync {
    fn fetch(&self, service: &str) -> io::Result<Vec<u8>>;
}

/// Reads `<dir>/<service>.pb` from the filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file expected to hold the descriptor set of `service`.
    pub fn path_for(&self, service: &str) -> PathBuf {
        self.dir
            .join(format!("{service}.{DESCRIPTOR_FILE_EXTENSION}"))
    }
}

impl DescriptorSource for DirectorySource {
    fn fetch(&self, service: &str) -> io::Result<Vec<u8>> {
        let path = self.path_for(service);
        std::fs::read(&path)
            .map_err(|err| io::Error::new(err.kind(), format!("{}: {err}", path.display())))
    }
}

/// Descriptor sets held in memory, keyed by service name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, service: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(service, bytes);
        self
    }

    pub fn insert(&mut self, service: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.blobs.insert(service.into(), bytes.into());
    }
}

impl DescriptorSource for MemorySource {
    fn fetch(&self, service: &str) -> io::Result<Vec<u8>> {
        self.blobs.get(service).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no descriptor registered for '{service}'"),
            )
        })
    }
}

/// Splits `/package.Service/Method` into `("package.Service", "Method")`.
///
/// Returns `None` unless the name starts with `/` and has exactly two non-empty segments.
pub fn split_full_method_name(name: &str) -> Option<(&str, &str)> {
    let (service, method) = name.strip_prefix('/')?.split_once('/')?;

    if service.is_empty() || method.is_empty() || method.contains('/') {
        return None;
    }

    Some((service, method))
}

/// Resolves and memoizes methods by full gRPC path.
#[derive(Debug)]
pub struct StaticResolver<S = DirectorySource> {
    source: S,
    cache: RwLock<HashMap<String, ResolvedMethod>>,
}

impl<S: DescriptorSource> StaticResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of memoized methods.
    pub fn cached_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Resolves `full_method_name` (e.g. `/echo.EchoService/Echo`).
    ///
    /// A cache hit performs no I/O. On a miss, the descriptor set of the service is fetched and
    /// parsed, then every method in it is compared against the requested path.
    pub fn resolve(&self, full_method_name: &str) -> Result<ResolvedMethod, StaticResolveError> {
        if let Some(method) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(full_method_name)
        {
            tracing::debug!(method = full_method_name, "static resolver cache hit");
            return Ok(method.clone());
        }

        let (service, _) = split_full_method_name(full_method_name)
            .ok_or_else(|| StaticResolveError::InvalidFullMethodName(full_method_name.into()))?;

        let bytes = self
            .source
            .fetch(service)
            .map_err(|source| StaticResolveError::Source {
                service: service.to_string(),
                source,
            })?;

        let pool = descriptor::parse(&bytes)?;

        tracing::info!(
            service,
            services = pool.service_names().len(),
            "loaded descriptor set"
        );

        let resolved = pool
            .methods()
            .map(ResolvedMethod::new)
            .find(|m| m.path() == full_method_name)
            .ok_or_else(|| StaticResolveError::MethodNotFound(full_method_name.to_string()))?;

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(full_method_name.to_string(), resolved.clone());

        Ok(resolved)
    }
}
