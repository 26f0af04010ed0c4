use embedded_hal_async::delay::DelayNs;
use tokio::time::{Duration, sleep};

/// [`DelayNs`] on top of the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioDelay;

impl DelayNs for TokioDelay {
    async fn delay_ns(&mut self, ns: u32) {
        sleep(Duration::from_nanos(u64::from(ns))).await
    }

    async fn delay_us(&mut self, us: u32) {
        sleep(Duration::from_micros(u64::from(us))).await
    }

    async fn delay_ms(&mut self, ms: u32) {
        sleep(Duration::from_millis(u64::from(ms))).await
    }
}
