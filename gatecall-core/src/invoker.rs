//! # Invoker
//!
//! This module implements the single operation the engine exposes to its callers:
//! take a target address, a method selector and a JSON body, perform one unary gRPC call and
//! hand back the JSON response.
//!
//! Every invocation walks the same stages and can fail in any of them:
//!
//! 1. **Resolving the method** through the [`StaticResolver`] (full gRPC path) or the
//!    [`InlineResolver`] (service/method plus a descriptor or a descriptor id).
//! 2. **Coding the request**: streaming methods are rejected, then the body is decoded into the
//!    method's input message.
//! 3. **Dialing** a fresh channel to the target. Channels are never pooled.
//! 4. **Calling** the method.
//! 5. **Coding the response** back into JSON.
//!
//! When a timeout is configured, a single deadline bounds dialing and calling. Dropping the
//! returned future cancels the invocation and closes its channel.
use crate::grpc::client::{self, DialError, GrpcClient, GrpcRequestError};
use crate::payload::{self, DecodeError, EncodeError};
use crate::pool::{ResolveError, ResolvedMethod};
use crate::resolver::file::{DescriptorSource, DirectorySource, StaticResolveError, StaticResolver};
use crate::resolver::inline::{InlineResolveError, InlineResolver};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

/// How the method to call is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSelector {
    /// A full gRPC path (`/package.Service/Method`) resolved against the descriptor source.
    FullMethod(String),
    /// A service and method resolved against a descriptor supplied with the request, or one
    /// cached earlier under `descriptor_id`.
    Inline {
        service: String,
        method: String,
        descriptor: Option<Vec<u8>>,
        descriptor_id: Option<String>,
    },
}

/// A single dynamic unary call.
#[derive(Debug, Clone)]
pub struct InvokeRequest {
    /// The server address, either `host:port` or a full URI.
    pub target: String,
    pub selector: MethodSelector,
    /// The request message as JSON.
    pub body: Vec<u8>,
}

/// The network stage an invocation was in when its deadline elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dialing,
    Calling,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Stage::Dialing => "dialing",
            Stage::Calling => "calling",
        };
        f.write_str(stage)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("Missing input: {0}")]
    MissingInput(&'static str),
    #[error("Resolve method: {0}")]
    StaticResolve(#[from] StaticResolveError),
    #[error("Resolve method from inline descriptor: {0}")]
    InlineResolve(#[from] InlineResolveError),
    #[error("Streaming method not supported: '{0}'")]
    UnsupportedShape(String),
    #[error("Request body: {0}")]
    Decode(#[from] DecodeError),
    #[error("Dial: {0}")]
    Dial(#[from] DialError),
    #[error("gRPC client request error: '{0}'")]
    Request(#[from] GrpcRequestError),
    #[error("Invoke rpc '{method}': '{status}'")]
    Call {
        method: String,
        #[source]
        status: tonic::Status,
    },
    #[error("Deadline of {timeout:?} exceeded while {stage}")]
    DeadlineExceeded { stage: Stage, timeout: Duration },
    #[error("Response body: {0}")]
    Encode(#[from] EncodeError),
}

/// A stable classification of [`InvokeError`]s for callers that map failures to their own
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingInput,
    InvalidName,
    Io,
    Parse,
    NotFound,
    AmbiguousName,
    UnsupportedShape,
    Decode,
    Dial,
    Call,
    DeadlineExceeded,
    Encode,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingInput => "missing_input",
            ErrorKind::InvalidName => "invalid_name",
            ErrorKind::Io => "io",
            ErrorKind::Parse => "parse",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AmbiguousName => "ambiguous_name",
            ErrorKind::UnsupportedShape => "unsupported_shape",
            ErrorKind::Decode => "decode",
            ErrorKind::Dial => "dial",
            ErrorKind::Call => "call",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::Encode => "encode",
        }
    }

    /// Whether the failure is caused by the shape of the request rather than by the
    /// descriptor store, the network or the remote server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::MissingInput
                | ErrorKind::InvalidName
                | ErrorKind::Parse
                | ErrorKind::NotFound
                | ErrorKind::AmbiguousName
                | ErrorKind::UnsupportedShape
                | ErrorKind::Decode
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InvokeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InvokeError::MissingInput(_) => ErrorKind::MissingInput,
            InvokeError::StaticResolve(err) => match err {
                StaticResolveError::InvalidFullMethodName(_) => ErrorKind::InvalidName,
                StaticResolveError::Source { .. } => ErrorKind::Io,
                StaticResolveError::Parse(_) => ErrorKind::Parse,
                StaticResolveError::MethodNotFound(_) => ErrorKind::NotFound,
            },
            InvokeError::InlineResolve(err) => match err {
                InlineResolveError::EmptyDescriptorId => ErrorKind::MissingInput,
                InlineResolveError::DescriptorNotFound(_) => ErrorKind::NotFound,
                InlineResolveError::Parse(_) => ErrorKind::Parse,
                InlineResolveError::Resolve(ResolveError::MissingServiceOrMethod) => {
                    ErrorKind::MissingInput
                }
                InlineResolveError::Resolve(ResolveError::AmbiguousService { .. }) => {
                    ErrorKind::AmbiguousName
                }
                InlineResolveError::Resolve(
                    ResolveError::ServiceNotFound(_) | ResolveError::MethodNotFound { .. },
                ) => ErrorKind::NotFound,
            },
            InvokeError::UnsupportedShape(_) => ErrorKind::UnsupportedShape,
            InvokeError::Decode(_) => ErrorKind::Decode,
            InvokeError::Dial(_) => ErrorKind::Dial,
            InvokeError::Request(_) | InvokeError::Call { .. } => ErrorKind::Call,
            InvokeError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            InvokeError::Encode(_) => ErrorKind::Encode,
        }
    }

    /// The gRPC status returned by the server, when the failure comes from the call itself.
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            InvokeError::Call { status, .. } => Some(status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    timeout: Duration,
}

/// Runs `fut` to completion, or until `deadline` elapses when there is one.
async fn bounded<F: Future>(
    deadline: Option<Deadline>,
    stage: Stage,
    fut: F,
) -> Result<F::Output, InvokeError> {
    match deadline {
        Some(Deadline { at, timeout }) => tokio::time::timeout_at(at, fut)
            .await
            .map_err(|_| InvokeError::DeadlineExceeded { stage, timeout }),
        None => Ok(fut.await),
    }
}

/// Performs dynamic unary gRPC calls.
///
/// Each `Invoker` owns its own resolver caches, so independent instances never observe each
/// other's descriptors. Share one across tasks behind an `Arc`.
#[derive(Debug)]
pub struct Invoker<S = DirectorySource> {
    static_resolver: StaticResolver<S>,
    inline_resolver: InlineResolver,
    timeout: Option<Duration>,
}

impl Invoker<DirectorySource> {
    /// Creates an invoker reading `<dir>/<service>.pb` descriptor files.
    pub fn with_directory(dir: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self::new(DirectorySource::new(dir), timeout)
    }
}

impl<S: DescriptorSource> Invoker<S> {
    /// Creates an invoker. A `timeout` of `None` or zero lets calls run without a deadline.
    pub fn new(source: S, timeout: Option<Duration>) -> Self {
        Self {
            static_resolver: StaticResolver::new(source),
            inline_resolver: InlineResolver::new(),
            timeout: timeout.filter(|t| !t.is_zero()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn static_resolver(&self) -> &StaticResolver<S> {
        &self.static_resolver
    }

    pub fn inline_resolver(&self) -> &InlineResolver {
        &self.inline_resolver
    }

    /// Resolves the method designated by `selector` without calling it.
    pub fn resolve(&self, selector: &MethodSelector) -> Result<ResolvedMethod, InvokeError> {
        match selector {
            MethodSelector::FullMethod(name) => {
                if name.trim().is_empty() {
                    return Err(InvokeError::MissingInput("missing full method name"));
                }
                Ok(self.static_resolver.resolve(name)?)
            }
            MethodSelector::Inline {
                service,
                method,
                descriptor,
                descriptor_id,
            } => {
                if method.trim().is_empty() {
                    return Err(InvokeError::MissingInput(
                        "missing method for inline descriptor invocation",
                    ));
                }

                let descriptor = descriptor.as_deref().filter(|d| !d.is_empty());
                let descriptor_id = descriptor_id.as_deref().filter(|id| !id.is_empty());
                if descriptor.is_none() && descriptor_id.is_none() {
                    return Err(InvokeError::MissingInput(
                        "missing descriptor or descriptor id",
                    ));
                }

                let (resolved, key) =
                    self.inline_resolver
                        .resolve(descriptor, descriptor_id, service, method)?;
                tracing::debug!(
                    descriptor_id = %key,
                    method = %resolved.path(),
                    "resolved inline method"
                );

                Ok(resolved)
            }
        }
    }

    /// Performs one unary call and returns the JSON encoded response.
    #[tracing::instrument(skip_all, fields(target = %request.target))]
    pub async fn invoke(&self, request: InvokeRequest) -> Result<Vec<u8>, InvokeError> {
        let deadline = self.timeout.map(|timeout| Deadline {
            at: Instant::now() + timeout,
            timeout,
        });

        if request.target.trim().is_empty() {
            return Err(InvokeError::MissingInput("missing target"));
        }

        let resolved = self.resolve(&request.selector)?;
        let path = resolved.path();

        if resolved.is_streaming() {
            return Err(InvokeError::UnsupportedShape(path));
        }

        let payload = payload::decode(&resolved.method.input(), &request.body)?;

        let channel = bounded(deadline, Stage::Dialing, client::dial(&request.target)).await??;
        let mut grpc_client = GrpcClient::new(channel);

        let response = bounded(
            deadline,
            Stage::Calling,
            grpc_client.unary(&resolved.method, payload),
        )
        .await??
        .map_err(|status| InvokeError::Call {
            method: path.clone(),
            status,
        })?;

        tracing::debug!(method = %path, "call succeeded");

        Ok(payload::encode(&response)?)
    }
}
