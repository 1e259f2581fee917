use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::Response;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

/// Counting gate bounding how many requests are inside the handling
/// pipeline at once.
///
/// Cloning shares the underlying slot pool. A slot is held from admission
/// until the response body has been fully written; excess requests wait in
/// [`AdmissionGate::acquire`] rather than being rejected.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
    max: usize,
}

impl AdmissionGate {
    pub fn new(max: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    /// Wait for a free slot. The slot is returned when the permit drops.
    pub async fn acquire(&self) -> GatePermit {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .expect("admission semaphore is never closed");
        GatePermit { _permit: permit }
    }

    /// Currently free slots
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Configured slot maximum
    pub fn max(&self) -> usize {
        self.max
    }

    /// Requests currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.max.saturating_sub(self.available())
    }
}

/// One unit of admission capacity. Dropping it frees the slot.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

/// Attach `permit` to the response so the slot stays taken until the body
/// has been fully written, and mark the connection for closure.
pub fn hold_until_sent(response: Response, permit: GatePermit) -> Response {
    let (mut parts, body) = response.into_parts();
    parts
        .headers
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    let gated = GatedBody {
        inner: body,
        permit: Some(permit),
        completed: false,
    };
    Response::from_parts(parts, Body::new(gated))
}

/// Body wrapper that rides the gate slot out to the last written byte.
/// Framing is untouched: size hints and end-of-stream pass through to the
/// inner body, so Content-Length inference still works.
struct GatedBody {
    inner: Body,
    permit: Option<GatePermit>,
    completed: bool,
}

impl HttpBody for GatedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(None) => {
                this.completed = true;
                this.permit.take();
                Poll::Ready(None)
            }
            other => other,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for GatedBody {
    fn drop(&mut self) {
        if !self.completed && !self.inner.is_end_stream() {
            warn!("client disconnected before the response was fully sent");
        }
    }
}
