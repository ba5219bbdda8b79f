use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::debug;

use crate::config::ClientConfig;
use crate::domain::errors::{NotifyError, NotifyResult};
use crate::domain::ports::notification_stream::{
    NotificationChannel, StreamConnector, StreamFrame, TransportEvent,
};
use crate::infrastructure::http::sse::SseDecoder;
use crate::infrastructure::http::truncate_body;

/// Opens `GET /notifications?api_token=...` as a server-sent event stream
pub struct HttpStreamConnector {
    http_client: Client,
    stream_url: String,
}

impl HttpStreamConnector {
    pub fn new(config: &ClientConfig) -> NotifyResult<Self> {
        // No overall timeout: the response body is expected to stay open
        let http_client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            stream_url: config.stream_url(),
        })
    }
}

#[async_trait]
impl StreamConnector for HttpStreamConnector {
    async fn connect(&self, token: &str) -> NotifyResult<NotificationChannel> {
        debug!(url = %self.stream_url, "Connecting to notification stream");

        let response = self
            .http_client
            .get(&self.stream_url)
            .query(&[("api_token", token)])
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Http {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        Ok(sse_channel(response.bytes_stream()))
    }
}

struct SseBody<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    ready: VecDeque<StreamFrame>,
    finished: bool,
}

/// Turn a raw event-stream body into a [`NotificationChannel`].
///
/// Yields `Open` first, then one `Message` per dispatched frame. A body error
/// or an oversized line or event yields a terminal `Error` and ends the
/// channel; a clean end of body just ends it.
pub fn sse_channel<S, B, E>(body: S) -> NotificationChannel
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    decode_channel(body, SseDecoder::new())
}

fn decode_channel<S, B, E>(body: S, decoder: SseDecoder) -> NotificationChannel
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = SseBody {
        body: Box::pin(body),
        decoder,
        ready: VecDeque::new(),
        finished: false,
    };

    let frames = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.ready.pop_front() {
                return Some((TransportEvent::Message(frame), state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => match state.decoder.push(chunk.as_ref()) {
                    Ok(frames) => state.ready.extend(frames),
                    Err(e) => {
                        state.finished = true;
                        let event = TransportEvent::Error {
                            terminal: true,
                            message: e.to_string(),
                        };
                        return Some((event, state));
                    }
                },
                Some(Err(e)) => {
                    state.finished = true;
                    let event = TransportEvent::Error {
                        terminal: true,
                        message: e.to_string(),
                    };
                    return Some((event, state));
                }
                None => return None,
            }
        }
    });

    stream::once(async { TransportEvent::Open })
        .chain(frames)
        .boxed()
}
