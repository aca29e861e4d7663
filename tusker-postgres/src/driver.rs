use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use postgres_openssl::MakeTlsConnector;
use tokio::sync::OnceCell;
use tokio_postgres::AsyncMessage;

use tusker_core::{ClientConfiguration, Result, TypeParser};

use crate::connection::PgConnection;
use crate::error::map_wire_error;
use crate::notice::{Notice, NoticeSink};
use crate::options::{pg_config, tls_connector};
use crate::type_parsers::TypeParserRegistry;

/// The per-configuration connection factory.
///
/// Owns the mapped driver configuration, the TLS connector, the notice
/// sink shared by every connection it builds, and the memoized type-parser
/// resolution. Construct one driver per [`ClientConfiguration`] and reuse
/// it for every connection.
pub struct PgDriver {
    config: tokio_postgres::Config,
    tls: MakeTlsConnector,
    type_parsers: Vec<TypeParser>,
    registry: OnceCell<Arc<TypeParserRegistry>>,
    notices: Arc<Mutex<NoticeSink>>,
}

impl PgDriver {
    pub fn new(configuration: &ClientConfiguration, notices: NoticeSink) -> Result<Self> {
        Ok(Self {
            config: pg_config(configuration),
            tls: tls_connector(configuration.resolved_ssl_mode())?,
            type_parsers: configuration.type_parsers.clone(),
            registry: OnceCell::new(),
            notices: Arc::new(Mutex::new(notices)),
        })
    }

    /// Opens a fresh underlying client.
    ///
    /// The connection's I/O pump is spawned here; it forwards every notice
    /// with a non-empty message to the driver's sink until the connection
    /// closes. The first successful connect also resolves the registered
    /// type parsers against the backend catalog; racing callers share a
    /// single in-flight resolution, and a resolution failure is fatal to
    /// bring-up.
    pub async fn connect(&self) -> Result<PgConnection> {
        let (client, mut connection) = self
            .config
            .connect(self.tls.clone())
            .await
            .map_err(|error| map_wire_error(error, "", &[]))?;

        let notices = Arc::clone(&self.notices);
        let connection_task = tokio::spawn(async move {
            let mut messages =
                futures_util::stream::poll_fn(move |cx| connection.poll_message(cx));

            while let Some(message) = messages.next().await {
                match message {
                    Ok(AsyncMessage::Notice(notice)) => {
                        if notice.message().is_empty() {
                            continue;
                        }

                        let mut sink = notices.lock().expect("notice sink poisoned");
                        sink.consume(Notice::from_db(&notice));
                    }
                    Ok(_) => {}
                    Err(error) => {
                        tracing::debug!(
                            target: "tusker::postgres",
                            %error,
                            "connection terminated",
                        );
                        break;
                    }
                }
            }
        });

        let registry = match self
            .registry
            .get_or_try_init(|| async {
                TypeParserRegistry::resolve(&client, &self.type_parsers).await.map(Arc::new)
            })
            .await
        {
            Ok(registry) => Arc::clone(registry),
            Err(error) => {
                connection_task.abort();
                return Err(error);
            }
        };

        Ok(PgConnection { client, registry, connection_task })
    }
}
