//! # Method Resolvers
//!
//! Two caching strategies for turning a method selector into a [`crate::ResolvedMethod`]:
//!
//! * [`file::StaticResolver`] resolves full gRPC paths against descriptor sets that live
//!   outside the request (one per service, usually on disk) and memoizes each resolved method.
//! * [`inline::InlineResolver`] caches whole [`crate::ServicePool`]s that arrive with requests,
//!   so later requests can refer to them by id without resending the bytes.
//!
//! Both caches are plain maps behind a `std::sync::RwLock`: lookups share the lock, inserts
//! take it exclusively, and nothing is ever evicted.
pub mod file;
pub mod inline;
