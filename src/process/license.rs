//! Unattended answers to interactive license prompts.

use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Default delay between two responses.
const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Writes an affirmative answer to a child's stdin until the child stops listening.
///
/// `sdkmanager` asks one `(y/N)` question per license it has not seen before
/// and there is no flag to pre-accept them, so the responder keeps answering
/// at a steady cadence. It stops once a write fails, which happens when the
/// child exits or closes its stdin.
///
/// Run it concurrently with draining the child's output, never before.
///
/// # Example
///
/// ```rust
/// use sdk_cmdline_installer::process::LicenseResponder;
/// use std::time::Duration;
///
/// let responder = LicenseResponder::default();
/// assert_eq!(responder.response(), "y\n");
///
/// let fast = LicenseResponder::new("yes\n", Duration::from_millis(10));
/// assert_eq!(fast.interval(), Duration::from_millis(10));
/// ```
#[derive(Debug, Clone)]
pub struct LicenseResponder {
    response: String,
    interval: Duration,
}

impl Default for LicenseResponder {
    fn default() -> Self {
        Self::new("y\n", DEFAULT_INTERVAL)
    }
}

impl LicenseResponder {
    /// A responder writing `response` (which should end in a newline) every `interval`.
    pub fn new(response: impl Into<String>, interval: Duration) -> Self {
        Self {
            response: response.into(),
            interval,
        }
    }

    /// The line written for every prompt.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// The delay between two responses.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Answer on `input` until it is closed by the peer.
    ///
    /// Returns how many responses were written successfully.
    pub async fn run<W>(&self, mut input: W) -> u64
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        loop {
            let result = match input.write_all(self.response.as_bytes()).await {
                Ok(()) => input.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                debug!(error = %e, written, "license input closed");
                return written;
            }
            written += 1;
            tokio::time::sleep(self.interval).await;
        }
    }
}
