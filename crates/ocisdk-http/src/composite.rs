//! Composite operations: a mutating call followed by a wait.

use std::future::Future;

use tracing::debug;

use crate::client::ApiClient;
use crate::error::{SdkError, SdkResult};
use crate::response::Response;
use crate::waiter::{WaitOutcome, WaiterConfig, wait_for_work_request};

/// Header naming the work request spawned by a mutating call.
pub const WORK_REQUEST_ID_HEADER: &str = "opc-work-request-id";

/// Both halves of a completed composite operation.
#[derive(Debug, Clone)]
pub struct CompositeOutcome {
    /// Response of the mutating call.
    pub initial: Response,
    /// How the wait ended.
    pub outcome: WaitOutcome,
}

/// Chains a mutating call with a wait on its effect.
///
/// If the call fails nothing has happened and its error is returned as is.
/// If the wait fails the call's response is kept in
/// [`SdkError::CompositeOperation`] so the caller does not repeat it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeOperation;

impl CompositeOperation {
    /// Run `action`, then `wait` with its response.
    pub async fn execute<A, W, WFut>(action: A, wait: W) -> SdkResult<CompositeOutcome>
    where
        A: Future<Output = SdkResult<Response>>,
        W: FnOnce(&Response) -> WFut,
        WFut: Future<Output = SdkResult<WaitOutcome>>,
    {
        let initial = action.await?;
        match wait(&initial).await {
            Ok(outcome) => Ok(CompositeOutcome { initial, outcome }),
            Err(source) => {
                debug!(request_id = ?initial.request_id(), error = %source, "Composite wait failed");
                Err(SdkError::CompositeOperation {
                    partial_results: vec![initial],
                    source: Box::new(source),
                })
            }
        }
    }

    /// Run `action`, then wait for the work request named in its
    /// `opc-work-request-id` header.
    ///
    /// `work_request_path` maps the work request id to its URL path.
    pub async fn execute_and_wait_for_work_request<A>(
        client: &ApiClient,
        action: A,
        endpoint: &str,
        work_request_path: impl FnOnce(&str) -> String,
        config: &WaiterConfig,
    ) -> SdkResult<CompositeOutcome>
    where
        A: Future<Output = SdkResult<Response>>,
    {
        Self::execute(action, |initial| {
            let path = initial
                .headers()
                .get(WORK_REQUEST_ID_HEADER)
                .map(work_request_path);
            async move {
                let Some(path) = path else {
                    return Err(SdkError::WaiterFailed {
                        message: format!("Response has no {WORK_REQUEST_ID_HEADER} header"),
                        last_response: None,
                    });
                };
                wait_for_work_request(client, endpoint, &path, config).await
            }
        })
        .await
    }
}
