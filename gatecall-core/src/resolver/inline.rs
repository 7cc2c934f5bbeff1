//! # Inline Method Resolver
//!
//! Resolves methods against descriptor sets that travel with the request itself.
//!
//! Every parsed set is cached as a [`ServicePool`] under a descriptor id, either chosen by the
//! caller or derived from the SHA-256 digest of the bytes. A later request may then send only
//! the id. Sending bytes again under a known id replaces the cached pool: the last writer wins.
//!
//! Parsing happens outside of the lock. Two requests racing to register the same new id will
//! both parse, both insert, and the second insert replaces the first. Each of them still
//! resolves against the pool it parsed itself, and requests already holding a pool keep
//! using it after it has been replaced.
use crate::descriptor::{self, ParseError};
use crate::pool::{ResolveError, ResolvedMethod, ServicePool};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum InlineResolveError {
    #[error("Empty descriptor id")]
    EmptyDescriptorId,
    #[error("Descriptor not found for id '{0}'")]
    DescriptorNotFound(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Computes the cache key for a descriptor: the id when one is given, otherwise the
/// hex-encoded SHA-256 digest of the bytes.
pub fn descriptor_key(
    descriptor: Option<&[u8]>,
    descriptor_id: Option<&str>,
) -> Result<String, InlineResolveError> {
    if let Some(id) = descriptor_id.filter(|id| !id.is_empty()) {
        return Ok(id.to_string());
    }

    match descriptor.filter(|bytes| !bytes.is_empty()) {
        Some(bytes) => Ok(hex::encode(Sha256::digest(bytes))),
        None => Err(InlineResolveError::EmptyDescriptorId),
    }
}

/// A cache of [`ServicePool`]s keyed by descriptor id.
#[derive(Debug, Default)]
pub struct InlineResolver {
    pools: RwLock<HashMap<String, Arc<ServicePool>>>,
}

impl InlineResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pool currently cached under `id`, if any.
    pub fn get(&self, id: &str) -> Option<Arc<ServicePool>> {
        self.pools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Ids of every cached pool, sorted.
    pub fn cached_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .pools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Parses `bytes` and stores the resulting pool under `key`, replacing any previous entry.
    pub fn register(&self, key: &str, bytes: &[u8]) -> Result<Arc<ServicePool>, ParseError> {
        let pool = Arc::new(descriptor::parse(bytes)?);

        let replaced = self
            .pools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), Arc::clone(&pool))
            .is_some();

        tracing::info!(
            descriptor_id = key,
            services = pool.service_names().len(),
            replaced,
            "cached inline descriptor set"
        );

        Ok(pool)
    }

    /// Resolves `service`/`method` against the descriptor identified by `descriptor_id` or
    /// carried in `descriptor`.
    ///
    /// | bytes | id cached | outcome                                    |
    /// |-------|-----------|--------------------------------------------|
    /// | yes   | any       | parse, overwrite the cache entry, use it   |
    /// | no    | yes       | use the cached pool                        |
    /// | no    | no        | [`InlineResolveError::DescriptorNotFound`] |
    ///
    /// # Returns
    ///
    /// The resolved method together with the cache key that was used.
    pub fn resolve(
        &self,
        descriptor: Option<&[u8]>,
        descriptor_id: Option<&str>,
        service: &str,
        method: &str,
    ) -> Result<(ResolvedMethod, String), InlineResolveError> {
        let descriptor = descriptor.filter(|bytes| !bytes.is_empty());
        let key = descriptor_key(descriptor, descriptor_id)?;

        let pool = match descriptor {
            Some(bytes) => self.register(&key, bytes)?,
            None => {
                let pool = self
                    .get(&key)
                    .ok_or_else(|| InlineResolveError::DescriptorNotFound(key.clone()))?;
                tracing::debug!(descriptor_id = %key, "inline resolver cache hit");
                pool
            }
        };

        let resolved = pool.resolve(service, method)?;
        Ok((resolved, key))
    }
}
