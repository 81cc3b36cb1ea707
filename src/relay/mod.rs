//! Streaming relay from the upstream agent to the caller.
//!
//! `POST /api/chat` validates the prompt, opens one streaming exchange with the
//! agent and returns a `text/plain` response immediately. A spawned producer
//! task then reads the agent's `data:` lines and pushes only the `text-delta`
//! fragments into a bounded channel whose receiving end is the response body.
//!
//! ```text
//! agent bytes ─▶ LineBuffer ─▶ UpstreamEvent ─▶ text-delta ─▶ mpsc(n) ─▶ Body
//! ```
//!
//! The channel bound is the only flow control: the producer awaits each send,
//! so a slow reader stalls the upstream read instead of growing memory.

mod lines;
mod validate;

pub use lines::LineBuffer;
pub use validate::{MAX_PROMPT_CHARS, extract_prompt, validate_prompt};

use std::io;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderValue, header},
    response::Response,
};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::agent::{AgentError, ByteStream, UpstreamEvent};
use crate::error::RelayError;

/// Sent as the whole body when the agent produced no text at all.
pub const NO_DATA_MESSAGE: &str = "Error: No data received from the server.";

/// Item type flowing from the producer task into the response body.
pub type BodyChunk = Result<Bytes, io::Error>;

/// How a relay pump finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Upstream closed normally after `delivered` text fragments.
    Completed {
        /// Number of fragments written; zero means the diagnostic was sent.
        delivered: usize,
    },
    /// The caller went away; upstream reading stopped early.
    CallerGone,
    /// Upstream failed mid-stream; the body was aborted.
    UpstreamFailed,
}

/// POST /api/chat - Relay a prompt to the agent as a plain text stream.
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, RelayError> {
    let prompt = extract_prompt(&body).inspect_err(|e| {
        warn!(name: "relay.prompt.rejected", reason = %e, "Rejected chat request");
    })?;

    let request_id = uuid::Uuid::new_v4().to_string();
    info!(
        name: "relay.prompt.accepted",
        request_id = %request_id,
        prompt_chars = prompt.chars().count(),
        "Received chat request"
    );
    tracing::trace!(request_id = %request_id, prompt = %prompt, "Prompt content");

    let upstream = state.driver.open(&prompt).await.map_err(|e| match e {
        AgentError::Status { status, body } => {
            error!(
                name: "relay.upstream.rejected",
                request_id = %request_id,
                status = %status,
                body = %body,
                "Upstream returned an error status"
            );
            RelayError::from_upstream_status(status)
        }
        other => {
            error!(
                name: "relay.upstream.unreachable",
                request_id = %request_id,
                error = %other,
                "Upstream request failed"
            );
            RelayError::UpstreamUnavailable
        }
    })?;

    let (tx, rx) = mpsc::channel(state.config.relay.channel_capacity.max(1));
    tokio::spawn(async move {
        let outcome = pump(upstream, tx).await;
        info!(
            name: "relay.stream.finished",
            request_id = %request_id,
            outcome = ?outcome,
            "Relay stream finished"
        );
    });

    Ok(build_text_stream_response(Body::from_stream(
        ReceiverStream::new(rx),
    )))
}

/// Read `upstream` to the end, forwarding each `text-delta` fragment to `tx`.
///
/// Lines are only decoded once complete; a partial line is carried to the next
/// read and dropped if the stream ends before its newline. Unparsable event
/// lines are skipped. If nothing was forwarded by the time upstream closes,
/// [`NO_DATA_MESSAGE`] is sent instead.
///
/// Each send is awaited, so at most `capacity + 1` reads are taken from
/// upstream ahead of the consumer. Reading stops as soon as the receiver is
/// dropped.
pub async fn pump(mut upstream: ByteStream, tx: mpsc::Sender<BodyChunk>) -> PumpOutcome {
    let mut lines = LineBuffer::new();
    let mut delivered = 0usize;

    loop {
        // Poll for a closed body first so noise-only upstreams cannot outlive the caller.
        let next = tokio::select! {
            biased;
            () = tx.closed() => {
                debug!("Caller disconnected, dropping upstream");
                return PumpOutcome::CallerGone;
            }
            next = upstream.next() => next,
        };
        let Some(chunk) = next else {
            break;
        };
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                error!(name: "relay.upstream.failed", error = %e, "Stream processing error");
                // Ignore a send failure: the caller is already gone.
                let _ = tx.send(Err(io::Error::other(e))).await;
                return PumpOutcome::UpstreamFailed;
            }
        };

        for line in lines.push(&chunk) {
            let event = match UpstreamEvent::from_line(&line) {
                None => continue,
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    debug!(
                        error = %e,
                        line = %line.chars().take(50).collect::<String>(),
                        "Skipping line"
                    );
                    continue;
                }
            };

            let Some(text) = event.into_text_delta() else {
                continue;
            };

            if tx.send(Ok(Bytes::from(text))).await.is_err() {
                debug!("Caller disconnected, dropping upstream");
                return PumpOutcome::CallerGone;
            }
            delivered += 1;
        }
    }

    if !lines.is_empty() {
        debug!(
            discarded_bytes = lines.carry().len(),
            "Upstream closed mid-line"
        );
    }

    if delivered == 0 {
        warn!(name: "relay.upstream.empty", "No text received from upstream");
        if tx
            .send(Ok(Bytes::from_static(NO_DATA_MESSAGE.as_bytes())))
            .await
            .is_err()
        {
            return PumpOutcome::CallerGone;
        }
    }

    PumpOutcome::Completed { delivered }
}

fn build_text_stream_response(body: Body) -> Response {
    let mut resp = Response::new(body);
    let h = resp.headers_mut();
    h.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    h.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Endless upstream repeating `line`, counting every read taken from it.
    fn endless(line: &'static str, reads: &Arc<AtomicUsize>) -> ByteStream {
        let reads = Arc::clone(reads);
        stream::repeat_with(move || {
            reads.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(line.as_bytes()))
        })
        .boxed()
    }

    fn upstream(chunks: Vec<&'static str>) -> ByteStream {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes())))).boxed()
    }

    async fn run(upstream: ByteStream) -> (PumpOutcome, Vec<BodyChunk>) {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = tokio::spawn(pump(upstream, tx));
        let mut received = Vec::new();
        while let Some(item) = rx.recv().await {
            received.push(item);
        }
        (handle.await.unwrap(), received)
    }

    fn texts(received: &[BodyChunk]) -> Vec<String> {
        received
            .iter()
            .map(|r| String::from_utf8(r.as_ref().unwrap().to_vec()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn forwards_text_deltas_in_order() {
        let (outcome, received) = run(upstream(vec![
            "data: {\"type\":\"text-delta\",\"payload\":{\"text\":\"It is \"}}\n",
            "data: {\"type\":\"text-delta\",\"payload\":{\"text\":\"sunny.\"}}\n",
            "data: {\"type\":\"other\"}\n",
        ]))
        .await;

        assert_eq!(outcome, PumpOutcome::Completed { delivered: 2 });
        assert_eq!(texts(&received), vec!["It is ", "sunny."]);
    }

    #[tokio::test]
    async fn line_split_across_reads_is_reassembled() {
        let (outcome, received) = run(upstream(vec![
            "data: {\"type\":\"text-de",
            "lta\",\"payload\":{\"te",
            "xt\":\"split\"}}\n",
        ]))
        .await;

        assert_eq!(outcome, PumpOutcome::Completed { delivered: 1 });
        assert_eq!(texts(&received), vec!["split"]);
    }

    #[tokio::test]
    async fn noise_lines_are_skipped() {
        let (_, received) = run(upstream(vec![
            "event: message\n",
            "data: not json\n",
            ": comment\n\n",
            "data: {\"type\":\"text-delta\",\"payload\":{\"text\":\"ok\"}}\n",
            "data: {\"type\":\"finish\",\"payload\":{\"reason\":\"stop\"}}\n",
        ]))
        .await;

        assert_eq!(texts(&received), vec!["ok"]);
    }

    #[tokio::test]
    async fn no_payloads_sends_diagnostic() {
        let (outcome, received) = run(upstream(vec![
            "data: {\"type\":\"start\"}\n",
            "data: {\"type\":\"finish\"}\n",
        ]))
        .await;

        assert_eq!(outcome, PumpOutcome::Completed { delivered: 0 });
        assert_eq!(texts(&received), vec![NO_DATA_MESSAGE]);
    }

    #[tokio::test]
    async fn trailing_partial_line_is_dropped() {
        let (outcome, received) = run(upstream(vec![
            "data: {\"type\":\"text-delta\",\"payload\":{\"text\":\"a\"}}\n",
            "data: {\"type\":\"text-delta\",\"payload\":{\"text\":\"b\"}}",
        ]))
        .await;

        assert_eq!(outcome, PumpOutcome::Completed { delivered: 1 });
        assert_eq!(texts(&received), vec!["a"]);
    }

    #[tokio::test]
    async fn upstream_failure_aborts_the_body() {
        let failing = stream::iter(vec![
            Ok(Bytes::from_static(
                b"data: {\"type\":\"text-delta\",\"payload\":{\"text\":\"partial\"}}\n",
            )),
            Err(AgentError::Stream("connection reset".into())),
        ])
        .boxed();

        let (outcome, received) = run(failing).await;

        assert_eq!(outcome, PumpOutcome::UpstreamFailed);
        assert_eq!(received.len(), 2);
        assert!(received[0].is_ok());
        assert!(received[1].is_err());
    }

    #[tokio::test]
    async fn dropped_receiver_stops_the_pump() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let outcome = pump(
            upstream(vec![
                "data: {\"type\":\"text-delta\",\"payload\":{\"text\":\"x\"}}\n",
            ]),
            tx,
        )
        .await;
        assert_eq!(outcome, PumpOutcome::CallerGone);
    }

    #[tokio::test]
    async fn caller_gone_stops_a_noise_only_upstream() {
        let reads = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let outcome = tokio::time::timeout(
            Duration::from_millis(500),
            pump(endless("data: {\"type\":\"tool-call\"}\n", &reads), tx),
        )
        .await
        .expect("pump should stop once the caller is gone");

        assert_eq!(outcome, PumpOutcome::CallerGone);
        assert!(reads.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test]
    async fn slow_consumer_stalls_upstream_reads() {
        let reads = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(pump(
            endless(
                "data: {\"type\":\"text-delta\",\"payload\":{\"text\":\"x\"}}\n",
                &reads,
            ),
            tx,
        ));

        tokio::time::sleep(Duration::from_millis(300)).await;
        // One read fills the channel, the next blocks in `send`.
        assert_eq!(reads.load(Ordering::SeqCst), 2);

        drop(rx);
        let outcome = tokio::time::timeout(Duration::from_millis(500), handle)
            .await
            .expect("pump should stop once the caller is gone")
            .unwrap();
        assert_eq!(outcome, PumpOutcome::CallerGone);
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }
}
