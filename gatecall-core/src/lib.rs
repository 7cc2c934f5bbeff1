//! # Gatecall Core
//!
//! `gatecall-core` is a dynamic gRPC invocation engine. Given nothing more than an encoded
//! `FileDescriptorSet`, it finds a service method, transcodes a JSON payload into the method's
//! Protobuf input type, performs a single unary call against a target address and transcodes
//! the response back into JSON. No generated client stubs are involved.
//!
//! ## Key Components
//!
//! * **[`Invoker`]:** The main entry point. It owns the resolver caches, selects the resolution
//!   path for each [`InvokeRequest`] and drives the call to completion or to a typed [`InvokeError`].
//! * **[`ServicePool`]:** An index over the services of one descriptor set, able to resolve
//!   fully qualified, dot-prefixed and short service names (detecting ambiguity).
//! * **[`StaticResolver`]:** Resolves `/package.Service/Method` names against descriptor sets
//!   fetched lazily from a [`DescriptorSource`] (one file per service by default).
//! * **[`InlineResolver`]:** Caches whole pools supplied with requests, keyed by a caller
//!   chosen descriptor id or by the SHA-256 digest of the descriptor bytes.
//!
//! ## Transport
//!
//! * **[`GrpcClient`]:** A generic unary gRPC client over any `tonic` service.
//! * **[`DynamicCodec`]:** An implementation of `tonic::codec::Codec` that moves
//!   `prost_reflect::DynamicMessage`s on and off the wire.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod descriptor;
pub mod grpc;
pub mod invoker;
pub mod payload;
pub mod pool;
pub mod resolver;

pub use descriptor::{ParseError, parse};
pub use grpc::client::GrpcClient;
pub use grpc::codec::DynamicCodec;
pub use invoker::{ErrorKind, InvokeError, InvokeRequest, Invoker, MethodSelector};
pub use pool::{ResolveError, ResolvedMethod, ServicePool};
pub use resolver::file::{DescriptorSource, DirectorySource, MemorySource, StaticResolver};
pub use resolver::inline::InlineResolver;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
