//! # Service Pool
//!
//! An index over the services contained in one descriptor set.
//!
//! Callers rarely know, or care to type, the fully qualified name of a service. The pool
//! therefore accepts several spellings of the same service and resolves them in a fixed order:
//!
//! 1. The exact fully qualified name (`my.pkg.Greeter`).
//! 2. The same name with a leading dot (`.my.pkg.Greeter`), as it appears inside descriptors.
//! 3. The short name (`Greeter`), but only when exactly one service in the pool carries it.
//!
//! A short name shared by several services is reported as ambiguous together with every
//! candidate, instead of silently picking one.
use prost_reflect::{DescriptorPool, MethodDescriptor, ServiceDescriptor};
use prost_types::FileDescriptorSet;
use std::collections::HashMap;

use crate::descriptor::ParseError;

/// Errors produced while resolving a `(service, method)` pair inside a [`ServicePool`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Missing service or method")]
    MissingServiceOrMethod,
    #[error("Service '{0}' not found in descriptor")]
    ServiceNotFound(String),
    #[error("Ambiguous service name '{name}', candidates: {candidates:?}")]
    AmbiguousService {
        name: String,
        candidates: Vec<String>,
    },
    #[error("Method '{method}' not found in service '{service}'")]
    MethodNotFound { method: String, service: String },
}

/// A method descriptor paired with the fully qualified name of the service that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMethod {
    pub method: MethodDescriptor,
    pub service_full_name: String,
}

impl ResolvedMethod {
    pub fn new(method: MethodDescriptor) -> Self {
        let service_full_name = method.parent_service().full_name().to_string();
        Self {
            method,
            service_full_name,
        }
    }

    /// The gRPC path of the method, e.g. `/my.pkg.Greeter/SayHello`.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.service_full_name, self.method.name())
    }

    pub fn is_streaming(&self) -> bool {
        self.method.is_client_streaming() || self.method.is_server_streaming()
    }
}

/// Services of one descriptor set, indexed by fully qualified and by short name.
#[derive(Debug, Clone)]
pub struct ServicePool {
    pool: DescriptorPool,
    by_full_name: HashMap<String, ServiceDescriptor>,
    by_short_name: HashMap<String, Vec<ServiceDescriptor>>,
}

impl ServicePool {
    pub(crate) fn new(pool: DescriptorPool) -> Self {
        let mut by_full_name = HashMap::new();
        let mut by_short_name: HashMap<String, Vec<ServiceDescriptor>> = HashMap::new();

        for service in pool.services() {
            let full_name = service.full_name().to_string();
            by_full_name.insert(format!(".{full_name}"), service.clone());
            by_full_name.insert(full_name, service.clone());
            by_short_name
                .entry(service.name().to_string())
                .or_default()
                .push(service);
        }

        Self {
            pool,
            by_full_name,
            by_short_name,
        }
    }

    /// Builds a pool from an already decoded descriptor set.
    pub fn from_file_descriptor_set(fd_set: FileDescriptorSet) -> Result<Self, ParseError> {
        let pool = DescriptorPool::from_file_descriptor_set(fd_set)?;
        Ok(Self::new(pool))
    }

    /// The underlying `prost_reflect` pool.
    pub fn descriptor_pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Fully qualified names of every service in the pool.
    pub fn service_names(&self) -> Vec<String> {
        self.pool
            .services()
            .map(|s| s.full_name().to_string())
            .collect()
    }

    /// Iterates over every method of every service, in descriptor order.
    pub fn methods(&self) -> impl Iterator<Item = MethodDescriptor> + '_ {
        self.pool
            .services()
            .flat_map(|s| s.methods().collect::<Vec<_>>())
    }

    /// Resolves a service and a method name into a [`ResolvedMethod`].
    ///
    /// `method` may also carry a full gRPC path (`/my.pkg.Greeter/SayHello`) when `service` is
    /// empty, in which case the service is taken from the path.
    pub fn resolve(&self, service: &str, method: &str) -> Result<ResolvedMethod, ResolveError> {
        let (mut service, mut method) = (service.trim(), method.trim());

        if service.is_empty()
            && let Some((svc, m)) = method.trim_start_matches('/').split_once('/')
        {
            service = svc;
            method = m;
        }

        let service = service.strip_prefix('/').unwrap_or(service);
        let service = service.strip_prefix('.').unwrap_or(service);
        let method = method.strip_prefix('/').unwrap_or(method);

        if service.is_empty() || method.is_empty() {
            return Err(ResolveError::MissingServiceOrMethod);
        }

        let descriptor = self.find_service(service)?;

        descriptor
            .methods()
            .find(|m| m.name() == method)
            .map(ResolvedMethod::new)
            .ok_or_else(|| ResolveError::MethodNotFound {
                method: method.to_string(),
                service: descriptor.full_name().to_string(),
            })
    }

    fn find_service(&self, name: &str) -> Result<&ServiceDescriptor, ResolveError> {
        if let Some(service) = self.by_full_name.get(name) {
            return Ok(service);
        }
        if let Some(service) = self.by_full_name.get(&format!(".{name}")) {
            return Ok(service);
        }

        match self.by_short_name.get(name).map(Vec::as_slice) {
            Some([service]) => Ok(service),
            Some(services) if !services.is_empty() => {
                let mut candidates: Vec<String> = services
                    .iter()
                    .map(|s| s.full_name().to_string())
                    .collect();
                candidates.sort();
                Err(ResolveError::AmbiguousService {
                    name: name.to_string(),
                    candidates,
                })
            }
            _ => Err(ResolveError::ServiceNotFound(name.to_string())),
        }
    }
}
