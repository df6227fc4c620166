//! Location sensor abstraction.

use crate::types::LatLng;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(20),
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("timed out")]
    Timeout,

    #[error("geolocation not supported")]
    Unsupported,

    #[error("{0}")]
    Other(String),
}

impl GeolocationError {
    /// Text of the blocking notice shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            GeolocationError::PermissionDenied => {
                "Permission denied. Please allow location access.".to_string()
            }
            GeolocationError::PositionUnavailable => {
                "Location information is unavailable.".to_string()
            }
            GeolocationError::Timeout => "The request to get your location timed out.".to_string(),
            GeolocationError::Unsupported => {
                "Geolocation is not supported on this device.".to_string()
            }
            GeolocationError::Other(message) => format!("Unable to get location: {}", message),
        }
    }
}

/// Source of the device position.
///
/// Implementations may ignore `options.timeout`; callers bound the wait
/// themselves.
#[allow(async_fn_in_trait)]
pub trait Geolocator {
    async fn current_position(&self, options: &PositionOptions)
        -> Result<LatLng, GeolocationError>;
}

/// Always reports the same coordinate.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    position: LatLng,
}

impl FixedGeolocator {
    pub fn new(position: LatLng) -> Self {
        Self { position }
    }
}

impl Geolocator for FixedGeolocator {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<LatLng, GeolocationError> {
        Ok(self.position)
    }
}

/// Always fails with the configured error.
#[derive(Debug, Clone)]
pub struct UnavailableGeolocator {
    error: GeolocationError,
}

impl UnavailableGeolocator {
    pub fn new(error: GeolocationError) -> Self {
        Self { error }
    }
}

impl Default for UnavailableGeolocator {
    fn default() -> Self {
        Self::new(GeolocationError::Unsupported)
    }
}

impl Geolocator for UnavailableGeolocator {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<LatLng, GeolocationError> {
        Err(self.error.clone())
    }
}

/// Query `geolocator`, giving up after `options.timeout`.
pub async fn locate<G: Geolocator>(
    geolocator: &G,
    options: &PositionOptions,
) -> Result<LatLng, GeolocationError> {
    match tokio::time::timeout(options.timeout, geolocator.current_position(options)).await {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Never;

    impl Geolocator for Never {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<LatLng, GeolocationError> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            GeolocationError::PermissionDenied.user_message(),
            "Permission denied. Please allow location access."
        );
        assert_eq!(
            GeolocationError::Other("boom".into()).user_message(),
            "Unable to get location: boom"
        );
    }

    #[tokio::test]
    async fn test_fixed_geolocator() {
        let geo = FixedGeolocator::new(LatLng::new(1.0, 2.0));
        assert_eq!(locate(&geo, &PositionOptions::default()).await, Ok(LatLng::new(1.0, 2.0)));
    }

    #[tokio::test]
    async fn test_unavailable_geolocator() {
        let geo = UnavailableGeolocator::new(GeolocationError::PositionUnavailable);
        assert_eq!(
            locate(&geo, &PositionOptions::default()).await,
            Err(GeolocationError::PositionUnavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_times_out() {
        let options = PositionOptions {
            timeout: std::time::Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(locate(&Never, &options).await, Err(GeolocationError::Timeout));
    }
}
