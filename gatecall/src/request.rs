//! # Gateway Requests
//!
//! The JSON shape accepted by `gatecall batch`, and the rules that turn it into an
//! [`InvokeRequest`].
//!
//! Two generations of fields are accepted:
//!
//! * **Legacy**: `target` + full method name (`method` or `full_method_name`) + `body`.
//! * **Current**: `service` + `method` + a descriptor set (base64 in `descriptor`, or a path in
//!   `descriptor_file`) and/or a `descriptor_id`, with the request message in `body` or `params`.
//!
//! Precedence: `target` over `target_addr` over the configured default target; `body` over
//! `params` over `{}`; `descriptor` over `descriptor_file`; the current form wins whenever a descriptor or a descriptor id is given.
use base64::{Engine, prelude::BASE64_STANDARD};
use gatecall_core::{InvokeRequest, MethodSelector};
use serde::Deserialize;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Missing target")]
    MissingTarget,
    #[error("Missing method for descriptor request")]
    MissingInlineMethod,
    #[error("Missing method (full_method_name) or descriptor fields")]
    MissingMethod,
    #[error("Invalid base64 descriptor: '{0}'")]
    InvalidDescriptor(#[source] base64::DecodeError),
    #[error("Failed to read descriptor file '{path}': '{source}'")]
    ReadDescriptor {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayRequest {
    pub target: String,
    pub target_addr: String,
    pub method: String,
    pub full_method_name: String,
    pub body: Option<serde_json::Value>,
    pub service: String,
    pub descriptor: String,
    pub descriptor_file: Option<PathBuf>,
    pub descriptor_id: String,
    pub params: Option<serde_json::Value>,
}

impl GatewayRequest {
    pub fn into_invoke_request(
        self,
        default_target: Option<&str>,
    ) -> Result<InvokeRequest, RequestError> {
        let target = [self.target.as_str(), self.target_addr.as_str()]
            .into_iter()
            .chain(default_target)
            .find(|t| !t.is_empty())
            .ok_or(RequestError::MissingTarget)?
            .to_string();

        let body = self
            .body
            .or(self.params)
            .filter(|v| !v.is_null())
            .unwrap_or_else(|| serde_json::json!({}));

        let selector = if !self.descriptor.is_empty()
            || self.descriptor_file.is_some()
            || !self.descriptor_id.is_empty()
        {
            if self.method.is_empty() {
                return Err(RequestError::MissingInlineMethod);
            }

            let descriptor = if self.descriptor.is_empty() {
                self.descriptor_file
                    .map(|path| {
                        std::fs::read(&path)
                            .map_err(|source| RequestError::ReadDescriptor { path, source })
                    })
                    .transpose()?
            } else {
                let bytes = BASE64_STANDARD
                    .decode(self.descriptor.trim())
                    .map_err(RequestError::InvalidDescriptor)?;
                Some(bytes)
            };

            MethodSelector::Inline {
                service: self.service,
                method: self.method,
                descriptor,
                descriptor_id: Some(self.descriptor_id).filter(|id| !id.is_empty()),
            }
        } else {
            let full_method = [self.method, self.full_method_name]
                .into_iter()
                .find(|m| !m.is_empty())
                .ok_or(RequestError::MissingMethod)?;

            MethodSelector::FullMethod(full_method)
        };

        Ok(InvokeRequest {
            target,
            selector,
            body: body.to_string().into_bytes(),
        })
    }
}
