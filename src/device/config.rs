//! Session configuration

use crate::color::DepthTreatment;

/// Session configuration options
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum depth for the session colorizer, in millimeters
    pub min_depth: u16,

    /// Maximum depth for the session colorizer, in millimeters
    pub max_depth: u16,

    /// Treatment of depth samples outside the reliable range
    pub depth_treatment: DepthTreatment,

    /// Capacity of the lifecycle advisory channel
    pub status_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_depth: 400,
            max_depth: 4500,
            depth_treatment: DepthTreatment::TintUnreliable,
            status_capacity: 16,
        }
    }
}

impl SessionConfig {
    /// Set the colorizer depth range
    pub fn depth_range(mut self, min: u16, max: u16) -> Self {
        self.min_depth = min;
        self.max_depth = max;
        self
    }

    /// Set the unreliable-range treatment
    pub fn depth_treatment(mut self, treatment: DepthTreatment) -> Self {
        self.depth_treatment = treatment;
        self
    }

    /// Set the advisory channel capacity
    pub fn status_capacity(mut self, capacity: usize) -> Self {
        self.status_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();

        assert_eq!(config.min_depth, 400);
        assert_eq!(config.max_depth, 4500);
        assert_eq!(config.depth_treatment, DepthTreatment::TintUnreliable);
        assert_eq!(config.status_capacity, 16);
    }

    #[test]
    fn test_builder_chaining() {
        let config = SessionConfig::default()
            .depth_range(500, 4000)
            .depth_treatment(DepthTreatment::DisplayAll)
            .status_capacity(4);

        assert_eq!(config.min_depth, 500);
        assert_eq!(config.max_depth, 4000);
        assert_eq!(config.depth_treatment, DepthTreatment::DisplayAll);
        assert_eq!(config.status_capacity, 4);
    }

    #[test]
    fn test_status_capacity_floor() {
        // A zero-capacity broadcast channel would panic at construction.
        let config = SessionConfig::default().status_capacity(0);

        assert_eq!(config.status_capacity, 1);
    }
}
