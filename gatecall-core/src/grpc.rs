//! # Generic gRPC Transport
//!
//! This module contains the low-level building blocks for performing unary gRPC calls using
//! dynamic message types.
//!
//! Unlike standard `tonic` clients which are strongly typed (e.g., `HelloRequest`), the
//! components here move `prost_reflect::DynamicMessage`s whose shape is only known at runtime.
pub mod client;
pub mod codec;
