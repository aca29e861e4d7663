use tokio::sync::mpsc;
use tokio_postgres::error::DbError;

/// An informational, non-error message asynchronously emitted by the
/// backend during a session.
#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: String,
    pub code: String,
    pub message: String,
}

impl Notice {
    pub(crate) fn from_db(raw: &DbError) -> Self {
        Self {
            severity: raw.severity().to_owned(),
            code: raw.code().code().to_owned(),
            message: raw.message().to_owned(),
        }
    }
}

/// Sink for backend notices.
///
/// Every connection built from one driver forwards its notices (those with
/// a non-empty message) here; the forwarding listener is detached when the
/// connection closes.
pub struct NoticeSink {
    inner: SinkInner,
}

enum SinkInner {
    Discard,
    Log,
    Closure(Box<dyn FnMut(Notice) + Send>),
    Channel(mpsc::UnboundedSender<Notice>),
}

impl NoticeSink {
    /// Discard all notices.
    pub fn discard() -> Self {
        Self { inner: SinkInner::Discard }
    }

    /// Log notices according to severity under the target
    /// `tusker::postgres::notice`.
    ///
    /// | Backend severity          | `tracing` level |
    /// | ------------------------- | --------------- |
    /// | `PANIC`, `FATAL`, `ERROR` | `ERROR`         |
    /// | `WARNING`                 | `WARN`          |
    /// | `NOTICE`                  | `INFO`          |
    /// | `DEBUG`                   | `DEBUG`         |
    /// | `INFO`, `LOG`             | `TRACE`         |
    pub fn log() -> Self {
        Self { inner: SinkInner::Log }
    }

    /// Supply a closure to handle notices.
    ///
    /// The closure is invoked from the connection's message pump, so it
    /// must not block.
    pub fn closure(f: impl FnMut(Notice) + Send + 'static) -> Self {
        Self { inner: SinkInner::Closure(Box::new(f)) }
    }

    /// Forward notices into a channel. Notices sent after the receiver is
    /// dropped are discarded.
    pub fn channel(sender: mpsc::UnboundedSender<Notice>) -> Self {
        Self { inner: SinkInner::Channel(sender) }
    }

    pub(crate) fn consume(&mut self, notice: Notice) {
        match &mut self.inner {
            SinkInner::Discard => {}
            SinkInner::Log => log_notice(&notice),
            SinkInner::Closure(f) => f(notice),
            SinkInner::Channel(sender) => {
                let _ = sender.send(notice);
            }
        }
    }
}

fn log_notice(notice: &Notice) {
    macro_rules! notice_event {
        ($level:ident) => {
            tracing::$level!(
                target: "tusker::postgres::notice",
                severity = %notice.severity,
                code = %notice.code,
                "{}",
                notice.message,
            )
        };
    }

    match notice.severity.as_str() {
        "PANIC" | "FATAL" | "ERROR" => notice_event!(error),
        "WARNING" => notice_event!(warn),
        "NOTICE" => notice_event!(info),
        "DEBUG" => notice_event!(debug),
        _ => notice_event!(trace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(message: &str) -> Notice {
        Notice {
            severity: "NOTICE".into(),
            code: "00000".into(),
            message: message.into(),
        }
    }

    #[test]
    fn closure_sink_observes_every_notice() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut sink = NoticeSink::closure(move |notice| tx.send(notice.message).unwrap());

        sink.consume(notice("relation exists, skipping"));

        assert_eq!(rx.recv().unwrap(), "relation exists, skipping");
    }

    #[tokio::test]
    async fn channel_sink_forwards_notices() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = NoticeSink::channel(tx);

        sink.consume(notice("hello"));

        assert_eq!(rx.recv().await.unwrap().message, "hello");
    }

    #[test]
    fn channel_sink_tolerates_a_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let mut sink = NoticeSink::channel(tx);
        sink.consume(notice("late"));
    }
}
