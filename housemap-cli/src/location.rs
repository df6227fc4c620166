//! Location sources selectable from the configuration.

use housemap_core::{
    FixedGeolocator, GeolocationError, Geolocator, LatLng, PositionOptions, UnavailableGeolocator,
};

#[derive(Debug, Clone)]
pub enum ConfiguredGeolocator {
    Fixed(FixedGeolocator),
    Unavailable(UnavailableGeolocator),
}

impl Geolocator for ConfiguredGeolocator {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<LatLng, GeolocationError> {
        match self {
            Self::Fixed(geolocator) => geolocator.current_position(options).await,
            Self::Unavailable(geolocator) => geolocator.current_position(options).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delegates_to_selected_source() {
        let options = PositionOptions::default();
        let fixed = ConfiguredGeolocator::Fixed(FixedGeolocator::new(LatLng::new(3.0, 4.0)));
        assert_eq!(fixed.current_position(&options).await, Ok(LatLng::new(3.0, 4.0)));

        let none = ConfiguredGeolocator::Unavailable(UnavailableGeolocator::default());
        assert_eq!(none.current_position(&options).await, Err(GeolocationError::Unsupported));
    }
}
