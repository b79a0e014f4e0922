use embedded_hal::spi::ErrorKind;
use thiserror::Error;

/// Failure of a byte exchange.
///
/// Register accesses cannot fail, so the only way an exchange goes wrong is
/// the peripheral never reporting completion, even after every reset the
/// [`RetryPolicy`](crate::config::RetryPolicy) allows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("SPI transfer timed out after {resets} peripheral resets")]
    Timeout { resets: u8 },
}

impl embedded_hal::spi::Error for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}
