use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Coordinates, LocationSample, PermissionResponse};

use super::LocationProvider;

/// Reports one configured position, stamped with the time of each request.
#[derive(Debug, Clone)]
pub struct FixedProvider {
    coordinates: Coordinates,
    grant_permission: bool,
}

impl FixedProvider {
    pub fn new(latitude: f64, longitude: f64, grant_permission: bool) -> Self {
        Self { coordinates: Coordinates::new(latitude, longitude), grant_permission }
    }
}

#[async_trait]
impl LocationProvider for FixedProvider {
    async fn request_permission(&self) -> Result<PermissionResponse> {
        if self.grant_permission {
            Ok(PermissionResponse::granted())
        } else {
            Ok(PermissionResponse { granted: false, can_ask_again: false })
        }
    }

    async fn current_position(&self) -> Result<LocationSample> {
        Ok(LocationSample::now(self.coordinates))
    }
}
