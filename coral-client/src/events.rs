use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::api::CommentId;

/// User-triggered network actions reported for observability
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum ViewerNetworkEvent {
    ShowAllReplies {
        #[serde(rename = "commentID")]
        comment_id: CommentId,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum Phase {
    Begin,
    Success { rtt: Duration },
    Error { rtt: Duration, message: String, code: String },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ViewerNetworkEvent, phase: &Phase);
}

/// An event that began and still has to report its outcome
///
/// Dropping it without calling `success` or `error` reports nothing more.
#[must_use]
pub struct PendingEvent {
    sink: Arc<dyn EventSink>,
    event: ViewerNetworkEvent,
    started: Instant,
}

pub fn begin(sink: &Arc<dyn EventSink>, event: ViewerNetworkEvent) -> PendingEvent {
    sink.emit(&event, &Phase::Begin);
    PendingEvent {
        sink: sink.clone(),
        event,
        started: Instant::now(),
    }
}

impl PendingEvent {
    pub fn success(self) {
        let rtt = self.started.elapsed();
        self.sink.emit(&self.event, &Phase::Success { rtt });
    }

    pub fn error(self, message: String, code: &str) {
        let rtt = self.started.elapsed();
        self.sink.emit(
            &self.event,
            &Phase::Error {
                rtt,
                message,
                code: String::from(code),
            },
        );
    }
}

/// Reports every lifecycle event as a tracing event
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ViewerNetworkEvent, phase: &Phase) {
        match phase {
            Phase::Begin => tracing::debug!(?event, "viewer network event started"),
            Phase::Success { rtt } => {
                tracing::info!(?event, ?rtt, "viewer network event succeeded")
            }
            Phase::Error { rtt, message, code } => tracing::warn!(
                ?event,
                ?rtt,
                %code,
                %message,
                "viewer network event failed"
            ),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{testing::RecordingSink, *};

    #[test]
    fn begin_then_outcome() {
        let recorder = Arc::new(RecordingSink::default());
        let sink: Arc<dyn EventSink> = recorder.clone();
        let event = ViewerNetworkEvent::ShowAllReplies {
            comment_id: CommentId::stub(),
        };
        begin(&sink, event.clone()).success();
        begin(&sink, event).error(String::from("offline"), "NETWORK_ERROR");
        assert_eq!(recorder.phases(), vec!["begin", "success", "begin", "error"]);
        assert_eq!(
            recorder.errors(),
            vec![(String::from("offline"), String::from("NETWORK_ERROR"))]
        );
    }

    #[test]
    fn serializes_like_the_stream_events() {
        let event = ViewerNetworkEvent::ShowAllReplies {
            comment_id: CommentId::stub(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["name"], "showAllReplies");
        assert_eq!(json["commentID"], "ffffffff-ffff-ffff-ffff-ffffffffffff");
    }

    #[test]
    fn tracing_sink_takes_any_round_trip() {
        let event = ViewerNetworkEvent::ShowAllReplies {
            comment_id: CommentId::stub(),
        };
        TracingSink.emit(&event, &Phase::Success { rtt: Duration::MAX });
        TracingSink.emit(
            &event,
            &Phase::Error {
                rtt: Duration::MAX,
                message: String::from("slow"),
                code: String::from("NETWORK_ERROR"),
            },
        );
    }
}
