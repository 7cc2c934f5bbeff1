//! # Descriptor Parser
//!
//! Turns an encoded `google.protobuf.FileDescriptorSet` into a [`ServicePool`].
//!
//! Parsing is a pure transformation: `prost_reflect` decodes the set, links every file and
//! type reference, and fails if anything is malformed or missing. A single blob may carry any
//! number of files and services.
use crate::pool::ServicePool;
use prost_reflect::{DescriptorError, DescriptorPool};

/// The descriptor blob could not be turned into a usable pool.
#[derive(Debug, thiserror::Error)]
#[error("Failed to parse file descriptor set: '{0}'")]
pub struct ParseError(#[from] pub DescriptorError);

/// Decodes `bytes` as a `FileDescriptorSet` and indexes its services.
///
/// # Returns
///
/// * `Ok(ServicePool)` - Every service of every file in the set, indexed by name.
/// * `Err(ParseError)` - If the bytes are not a descriptor set, or if the schema graph has
///   dangling imports or type references.
pub fn parse(bytes: &[u8]) -> Result<ServicePool, ParseError> {
    let pool = DescriptorPool::decode(bytes)?;
    Ok(ServicePool::new(pool))
}
