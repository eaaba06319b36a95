//! Periodic tick driver.
//!
//! The core never blocks, so something has to call [`Bridge::tick`] on a
//! cadence. This is a minimal tokio loop for hosts that already run a
//! runtime; embedded or test callers can just call `tick` themselves.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::bridge::Bridge;
use crate::error::Result;
use crate::transport::Transport;

/// Drive the bridge until the shutdown channel fires or a tick fails.
///
/// Ticks are spaced `period` apart; missed ticks are delayed, not bunched,
/// since a burst of catch-up ticks would defeat the per-tick read cap.
pub async fn run<T: Transport>(
    bridge: &mut Bridge,
    io: &mut T,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<()> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => bridge.tick(io)?,
            _ = &mut shutdown => {
                debug!("driver shutting down");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{msg, MessageSet};
    use crate::protocol::wire_format::{Address, AddressClass, Command, DataType};
    use crate::protocol::Packet;
    use crate::transport::MockTransport;

    fn notification_frame() -> Vec<u8> {
        Packet {
            source: Address::new(AddressClass::Indoor, 0, 0),
            destination: Address::local(),
            command: Command::outgoing(DataType::Notification, 1),
            messages: vec![MessageSet::numeric(msg::ENUM_IN_OPERATION_POWER, 1)],
        }
        .encode()
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_until_shutdown() {
        let mut bridge = Bridge::default();
        let mut io = MockTransport::new();
        io.feed(&notification_frame());

        let (tx, rx) = oneshot::channel();
        let driver = run(&mut bridge, &mut io, Duration::from_millis(10), rx);
        let stopper = async {
            tokio::time::sleep(Duration::from_millis(55)).await;
            tx.send(()).unwrap();
        };
        let (result, ()) = tokio::join!(driver, stopper);
        result.unwrap();

        assert_eq!(bridge.list_devices(), ["20.00.00"]);
    }

    #[tokio::test]
    async fn test_run_returns_immediately_on_early_shutdown() {
        let mut bridge = Bridge::default();
        let mut io = MockTransport::new();
        let (tx, rx) = oneshot::channel();
        tx.send(()).unwrap();
        run(&mut bridge, &mut io, Duration::from_secs(3600), rx)
            .await
            .unwrap();
    }
}
