//! Device position capability.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::{ConsoleError, Result};
use crate::models::Coordinates;

/// Why a position fix could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    Denied,
    Unavailable,
    Timeout,
}

impl std::fmt::Display for PositionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionError::Denied => write!(f, "location permission denied"),
            PositionError::Unavailable => write!(f, "position unavailable"),
            PositionError::Timeout => write!(f, "timed out waiting for a position"),
        }
    }
}

/// Platform capability returning the device's current position.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    async fn current_position(&self) -> std::result::Result<Coordinates, PositionError>;
}

/// A provider that always answers with the same result.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub std::result::Result<Coordinates, PositionError>);

#[async_trait]
impl PositionProvider for FixedPosition {
    async fn current_position(&self) -> std::result::Result<Coordinates, PositionError> {
        self.0
    }
}

/// One attempt at a position fix, bounded by `timeout`. Never retried.
pub async fn acquire_position(
    provider: &dyn PositionProvider,
    timeout: Duration,
) -> Result<Coordinates> {
    let outcome = match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(outcome) => outcome,
        Err(_) => Err(PositionError::Timeout),
    };

    let coordinates = outcome.map_err(|e| {
        tracing::warn!("Unable to get current location: {}", e);
        ConsoleError::GeoAcquisition(format!("Unable to get current location: {}", e))
    })?;
    coordinates.validate()?;
    Ok(coordinates)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverAnswers;

    #[async_trait]
    impl PositionProvider for NeverAnswers {
        async fn current_position(&self) -> std::result::Result<Coordinates, PositionError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_fix_is_returned() {
        let provider = FixedPosition(Ok(Coordinates::new(6.45, 3.39)));
        let coordinates = acquire_position(&provider, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(coordinates, Coordinates::new(6.45, 3.39));
    }

    #[tokio::test]
    async fn test_denial_is_acquisition_error() {
        let provider = FixedPosition(Err(PositionError::Denied));
        let err = acquire_position(&provider, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::GeoAcquisition(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_acquisition_error() {
        let err = acquire_position(&NeverAnswers, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::GeoAcquisition(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn test_bogus_fix_is_rejected() {
        let provider = FixedPosition(Ok(Coordinates::new(123.0, 0.0)));
        let err = acquire_position(&provider, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { .. }));
    }
}
