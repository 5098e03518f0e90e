use std::{net::SocketAddr, sync::Arc};

use tokio::{
    net::TcpListener,
    sync::{broadcast, Semaphore},
};

use crate::{
    config::MirageConfig,
    logging::MirageLogger,
    session::{self, SessionContext},
    upstream::{StatusSource, UpstreamClient},
};

/// Accepts clients and runs one session pipeline per connection.
pub struct Mirage {
    config: MirageConfig,
    context: Arc<SessionContext>,
    stop: broadcast::Sender<()>,
}

impl Mirage {
    pub fn new(config: MirageConfig, stop: broadcast::Sender<()>) -> Mirage {
        let upstream = Arc::new(UpstreamClient::from_config(&config));
        Self::with_upstream(config, upstream, stop)
    }

    pub fn with_upstream(
        config: MirageConfig,
        upstream: Arc<dyn StatusSource>,
        stop: broadcast::Sender<()>,
    ) -> Mirage {
        let context = Arc::new(SessionContext::from_config(&config, upstream));
        Mirage {
            config,
            context,
            stop,
        }
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        MirageLogger::preparing_socket(&self.config.bind);
        let address: SocketAddr = self.config.bind.parse()?;
        let listener = TcpListener::bind(address).await?;
        self.serve(listener).await
    }

    /// Accept loop. Returns once the stop signal fires.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_conn as usize));
        let mut stop = self.stop.subscribe();

        loop {
            let (client, addr) = tokio::select! {
                _ = stop.recv() => return Ok(()),
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        MirageLogger::accept_failed(&e);
                        continue;
                    }
                },
            };

            // Try to acquire semaphore (non-blocking)
            let permit = match semaphore.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    MirageLogger::connection_rejected(&addr);
                    drop(client);
                    continue;
                }
            };

            if dotenvy::var("NO_NODELAY").is_err() {
                if let Err(e) = client.set_nodelay(true) {
                    MirageLogger::tcp_nodelay_failed(&e);
                }
            }

            let context = Arc::clone(&self.context);
            tokio::spawn(async move {
                MirageLogger::new_connection(&addr);
                match session::serve(client, addr, context).await {
                    Err(err) if !err.is_closed() => MirageLogger::connection_error(&addr, &err),
                    _ => MirageLogger::connection_closed(&addr),
                }
                drop(permit);
            });
        }
    }
}
