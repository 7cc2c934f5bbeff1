//! # Batch Mode
//!
//! Runs newline-delimited [`GatewayRequest`]s through one shared [`Invoker`], writing one JSON
//! line per request: the response message on success, `{"error": ..., "kind": ...}` otherwise.
//!
//! Requests are processed in order, so a descriptor registered under an id by one line is
//! visible to every following line.
use crate::request::GatewayRequest;
use gatecall_core::{DescriptorSource, InvokeError, Invoker};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Counters reported once the input is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

pub fn error_line(message: impl ToString, kind: &str) -> serde_json::Value {
    serde_json::json!({ "error": message.to_string(), "kind": kind })
}

pub fn invoke_error_line(err: &InvokeError) -> serde_json::Value {
    error_line(err, err.kind().as_str())
}

pub async fn run<S, R, W>(
    invoker: &Invoker<S>,
    default_target: Option<&str>,
    reader: R,
    mut writer: W,
) -> std::io::Result<BatchSummary>
where
    S: DescriptorSource,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = BatchSummary::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let output = match handle_line(invoker, default_target, &line).await {
            Ok(response) => {
                summary.succeeded += 1;
                response
            }
            Err(err) => {
                summary.failed += 1;
                tracing::warn!("request failed: {err}");
                serde_json::to_vec(&err)?
            }
        };

        writer.write_all(&output).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(summary)
}

async fn handle_line<S: DescriptorSource>(
    invoker: &Invoker<S>,
    default_target: Option<&str>,
    line: &str,
) -> Result<Vec<u8>, serde_json::Value> {
    let request: GatewayRequest = serde_json::from_str(line)
        .map_err(|e| error_line(format!("Invalid JSON request: {e}"), "invalid_request"))?;

    let request = request
        .into_invoke_request(default_target)
        .map_err(|e| error_line(e, "invalid_request"))?;

    invoker
        .invoke(request)
        .await
        .map_err(|e| invoke_error_line(&e))
}
