//! Transfer step used by the queue processor.

use super::types::FileBlob;
use async_trait::async_trait;
use std::time::Duration;

/// Moves one admitted file to its destination, reporting progress along the way.
///
/// Implementations must report monotonically increasing percentages ending at 100 on success.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Transfer `file`, calling `progress` with each percentage reached.
    ///
    /// Failures are returned as user-facing messages.
    async fn transfer(
        &self,
        file: &FileBlob,
        progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<(), String>;
}

/// Local stand-in for a real upload: advances in fixed steps and always succeeds.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    step: u8,
    delay: Duration,
}

impl SimulatedTransport {
    /// Progress increment between observable steps.
    pub const STEP: u8 = 10;

    /// Build a transport that waits `delay` before each progress step.
    pub fn new(delay: Duration) -> Self {
        Self {
            step: Self::STEP,
            delay,
        }
    }
}

#[async_trait]
impl UploadTransport for SimulatedTransport {
    async fn transfer(
        &self,
        file: &FileBlob,
        progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<(), String> {
        tracing::debug!(file = %file.name, size = file.size, "Simulating transfer");
        let mut current: u8 = 0;
        loop {
            tokio::time::sleep(self.delay).await;
            progress(current);
            if current >= 100 {
                break;
            }
            current = current.saturating_add(self.step).min(100);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn simulated_transport_reports_every_step() {
        let transport = SimulatedTransport::new(Duration::from_millis(100));
        let file = FileBlob::from_bytes(
            "acta.pdf",
            "application/pdf",
            Bytes::from_static(b"%PDF"),
        );
        let seen = Mutex::new(Vec::new());
        let started = tokio::time::Instant::now();

        transport
            .transfer(&file, &|value: u8| seen.lock().unwrap().push(value))
            .await
            .expect("simulated transfer succeeds");

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen, (0..=100).step_by(10).collect::<Vec<u8>>());
        assert_eq!(started.elapsed(), Duration::from_millis(1_100));
    }
}
