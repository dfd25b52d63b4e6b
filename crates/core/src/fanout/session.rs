use futures::{Stream, StreamExt};
use log::{debug, info};
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::hub::{FanoutHub, SubscriberId};
use super::sink::{Inbound, SinkError};

/// Why a subscriber session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    ClientClosed,
    ReadTimeout,
    TransportError(String),
    PingFailed(String),
    /// Removed by the hub, e.g. after a failed broadcast write.
    Removed,
    Shutdown,
}

impl FanoutHub {
    /// Runs the read side of an active subscriber until it goes away.
    ///
    /// Any inbound traffic, pongs included, pushes the read deadline
    /// forward. Pings go out on their own timer. Whatever ends the loop,
    /// the subscriber is removed exactly once.
    pub async fn drive_session<S>(
        &self,
        id: SubscriberId,
        mut inbound: S,
        shutdown: CancellationToken,
    ) -> SessionEnd
    where
        S: Stream<Item = Result<Inbound, SinkError>> + Unpin + Send,
    {
        let Some((sink, closed)) = self.subscriber_handle(id) else {
            return SessionEnd::Removed;
        };

        let config = self.config();
        let read_timeout = config.read_timeout;
        let write_timeout = config.write_timeout;
        let ping_period = config.ping_interval;

        let read_deadline = sleep(read_timeout);
        tokio::pin!(read_deadline);
        let mut ping = interval_at(Instant::now() + ping_period, ping_period);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let end = loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break SessionEnd::Shutdown,
                _ = closed.cancelled() => break SessionEnd::Removed,
                _ = &mut read_deadline => break SessionEnd::ReadTimeout,
                message = inbound.next() => match message {
                    None | Some(Ok(Inbound::Close)) => break SessionEnd::ClientClosed,
                    Some(Err(e)) => break SessionEnd::TransportError(e.to_string()),
                    Some(Ok(frame)) => {
                        if let Inbound::Text(text) = &frame {
                            debug!("Subscriber {} sent {} bytes", id, text.len());
                        }
                        read_deadline.as_mut().reset(Instant::now() + read_timeout);
                    }
                },
                _ = ping.tick() => {
                    let sent = match timeout(write_timeout, sink.send_ping()).await {
                        Ok(result) => result,
                        Err(_) => Err(SinkError::Timeout),
                    };
                    if let Err(e) = sent {
                        break SessionEnd::PingFailed(e.to_string());
                    }
                }
            }
        };

        info!("Subscriber {} session ended: {:?}", id, end);
        self.remove(id).await;
        end
    }
}
