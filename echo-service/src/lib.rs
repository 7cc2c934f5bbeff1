//! # Echo Service
//!
//! **INTERNAL USE ONLY**: This crate provides the `echo.EchoService` server bindings and its
//! encoded `FileDescriptorSet` so the `gatecall` crates can run their integration tests
//! against a live gRPC server. It is not intended for production use.

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/echo.rs"));
}

pub use pb::echo_service_server::{EchoService, EchoServiceServer};

/// Encoded descriptor set of `proto/echo.proto`, as the gateway would read it from `echo.EchoService.pb`.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("descriptors");

/// Fully qualified name of the echo service.
pub const SERVICE_NAME: &str = "echo.EchoService";
