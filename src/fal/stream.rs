use super::ClientError;
use crate::workflow::event::{WorkflowEvent, WorkflowResult};
use futures_util::{
    stream::{self, BoxStream},
    Stream, StreamExt,
};
use serde_json::Value;

/// Events of a running workflow, in arrival order.
pub struct WorkflowStream {
    events: BoxStream<'static, Result<Value, ClientError>>,
    last: Option<Value>,
}

impl WorkflowStream {
    pub fn new(events: BoxStream<'static, Result<Value, ClientError>>) -> Self {
        Self { events, last: None }
    }

    /// Next event of the run. Payloads that do not decode as an event are
    /// handed out as [`WorkflowEvent::undecodable`] so the run carries on.
    pub async fn next_event(&mut self) -> Option<Result<WorkflowEvent, ClientError>> {
        let value = match self.events.next().await? {
            Ok(value) => value,
            Err(e) => return Some(Err(e)),
        };

        let event = match serde_json::from_value::<WorkflowEvent>(value.clone()) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("undecodable workflow event {}: {}", value, e);
                WorkflowEvent::undecodable(value.clone(), format!("undecodable event: {}", e))
            }
        };
        self.last = Some(value);

        Some(Ok(event))
    }

    /// Drain the stream and resolve the last payload into the run result.
    pub async fn done(mut self) -> Result<WorkflowResult, ClientError> {
        while let Some(value) = self.events.next().await {
            self.last = Some(value?);
        }

        let last = self.last.ok_or(ClientError::InvalidResponse(
            "stream ended without output".to_string(),
        ))?;

        Ok(serde_json::from_value(last)?)
    }
}

#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already searched for a frame separator.
    scanned: usize,
}

impl SseDecoder {
    fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend(chunk.iter().filter(|b| **b != b'\r'));
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    /// Position of the next `\n\n`, resuming where the last search stopped.
    fn frame_end(&mut self) -> Option<usize> {
        let start = self.scanned.saturating_sub(1);
        match self.buffer[start..].windows(2).position(|w| w == b"\n\n") {
            Some(position) => {
                self.scanned = 0;
                Some(start + position)
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Pop the data of the next complete frame. When `flush` is set the
    /// trailing unterminated frame is returned as well.
    fn next_data(&mut self, flush: bool) -> Option<String> {
        loop {
            let frame: Vec<u8> = match self.frame_end() {
                Some(end) => {
                    let frame = self.buffer[..end].to_vec();
                    self.buffer.drain(..end + 2);
                    frame
                }
                None if flush && !self.buffer.is_empty() => {
                    self.scanned = 0;
                    std::mem::take(&mut self.buffer)
                }
                None => return None,
            };

            let frame = String::from_utf8_lossy(&frame);
            let data: Vec<&str> = frame
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|data| data.strip_prefix(' ').unwrap_or(data))
                .collect();

            if !data.is_empty() {
                return Some(data.join("\n"));
            }
        }
    }
}

/// Turn a `text/event-stream` body into its JSON `data` payloads.
pub fn decode_sse<S, B>(chunks: S) -> BoxStream<'static, Result<Value, ClientError>>
where
    S: Stream<Item = Result<B, ClientError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = (chunks.boxed(), SseDecoder::default(), false);

    stream::unfold(state, |(mut chunks, mut decoder, mut finished)| async move {
        loop {
            if let Some(data) = decoder.next_data(finished) {
                let item = serde_json::from_str::<Value>(&data).map_err(ClientError::from);
                return Some((item, (chunks, decoder, finished)));
            }

            if finished {
                return None;
            }

            match chunks.next().await {
                Some(Ok(chunk)) => decoder.push(chunk.as_ref()),
                Some(Err(e)) => {
                    decoder.clear();
                    return Some((Err(e), (chunks, decoder, true)));
                }
                None => finished = true,
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::event::EventKind;
    use serde_json::json;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, ClientError>> + Send {
        let parts: Vec<_> = parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(parts)
    }

    #[tokio::test]
    async fn decodes_frames_split_across_chunks() {
        let values: Vec<_> = decode_sse(chunks(&[
            "data: {\"type\":\"sub",
            "mit\",\"node_id\":\"a\"}\r\n\r\n: keep-alive\n\n",
            "event: message\ndata: {\"type\":\"completion\"}\n\n",
            "data: {\"type\":\"output\"}",
        ]))
        .collect()
        .await;

        let values: Vec<Value> = values.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            values,
            vec![
                json!({ "type": "submit", "node_id": "a" }),
                json!({ "type": "completion" }),
                json!({ "type": "output" }),
            ]
        );
    }

    #[tokio::test]
    async fn transport_error_ends_stream() {
        let parts = vec![
            Ok(b"data: {\"type\":\"submit\"}\n\n".to_vec()),
            Err(ClientError::InvalidResponse("connection reset".into())),
            Ok(b"data: {\"type\":\"completion\"}\n\n".to_vec()),
        ];
        let items: Vec<_> = decode_sse(stream::iter(parts)).collect().await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(
            &items[1],
            Err(ClientError::InvalidResponse(msg)) if msg == "connection reset"
        ));
    }

    #[tokio::test]
    async fn done_resolves_last_payload() {
        let mut stream = WorkflowStream::new(decode_sse(chunks(&[
            "data: {\"type\":\"submit\",\"node_id\":\"nodes/any_llm/vision\"}\n\n",
            "data: {\"type\":\"output\",\"output\":{\"video\":{\"url\":\"https://v3.fal.media/files/final.mp4\",\"content_type\":\"video/mp4\",\"file_name\":\"final.mp4\",\"file_size\":2048}}}\n\n",
        ])));

        let first = stream.next_event().await.unwrap().unwrap();
        assert_eq!(first.kind, EventKind::Submit);

        let result = stream.done().await.unwrap();
        assert_eq!(result.video().file_name, "final.mp4");
        assert_eq!(result.kind, Some(EventKind::Output));
    }

    #[test]
    fn finds_separator_split_across_pushes() {
        let mut decoder = SseDecoder::default();
        decoder.push(b"data: {\"type\":\"submit\"}\n");
        assert_eq!(decoder.next_data(false), None);
        assert_eq!(decoder.scanned, decoder.buffer.len());

        decoder.push(b"\ndata: {\"type\":");
        assert_eq!(
            decoder.next_data(false).as_deref(),
            Some("{\"type\":\"submit\"}")
        );
        assert_eq!(decoder.next_data(false), None);

        decoder.push(b"\"output\"}\n\n");
        assert_eq!(
            decoder.next_data(false).as_deref(),
            Some("{\"type\":\"output\"}")
        );
        assert!(decoder.buffer.is_empty());
    }

    #[tokio::test]
    async fn undecodable_events_do_not_end_the_run() {
        let mut stream = WorkflowStream::new(decode_sse(chunks(&[
            "data: {\"type\":\"submit\",\"node_id\":\"nodes/any_llm/vision\"}\n\n",
            "data: {\"type\":\"completion\",\"node_id\":\"node_1/nano_banana\",\"output\":{\"images\":\"a.png\"}}\n\n",
            "data: {\"type\":\"submit\",\"node_id\":\"node_3/veo3/image_to_video\"}\n\n",
        ])));

        let mut kinds = vec![];
        while let Some(event) = stream.next_event().await {
            let event = event.unwrap();
            if event.kind == EventKind::Other {
                assert!(event.message.unwrap().starts_with("undecodable event"));
                assert_eq!(event.details.unwrap()["output"]["images"], json!("a.png"));
            }
            kinds.push(event.kind);
        }

        assert_eq!(
            kinds,
            vec![EventKind::Submit, EventKind::Other, EventKind::Submit]
        );
    }

    #[tokio::test]
    async fn done_without_events_is_an_error() {
        let stream = WorkflowStream::new(decode_sse(chunks(&[])));
        assert!(matches!(
            stream.done().await,
            Err(ClientError::InvalidResponse(_))
        ));
    }
}
