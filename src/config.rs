//! Grid and controller configuration.

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::{GRID_COLUMNS, GRID_ROW_HEIGHT_PX, MIN_HEIGHT, MIN_WIDTH};
use crate::logging::Logger;
use crate::metrics::InteractionMetrics;

/// Upper bound on reflow relaxation passes.
pub const MAX_REFLOW_PASSES: usize = 100;
/// Surface width assumed until the host reports a real one.
pub const DEFAULT_SURFACE_WIDTH_PX: f64 = 1200.0;

/// Shape of the placement grid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: i32,
    pub row_height_px: f64,
    pub min_width: i32,
    pub min_height: i32,
    pub max_reflow_passes: usize,
    /// Push neighbours clear of a block when a resize is committed.
    pub settle_after_resize: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: GRID_COLUMNS,
            row_height_px: GRID_ROW_HEIGHT_PX,
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
            max_reflow_passes: MAX_REFLOW_PASSES,
            settle_after_resize: true,
        }
    }
}

impl GridConfig {
    /// Parse a JSON object; missing keys fall back to the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GridConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_width < 1 {
            return Err(ConfigError::Invalid(format!(
                "min_width must be at least 1, got {}",
                self.min_width
            )));
        }
        if self.min_height < 1 {
            return Err(ConfigError::Invalid(format!(
                "min_height must be at least 1, got {}",
                self.min_height
            )));
        }
        if self.columns < self.min_width {
            return Err(ConfigError::Invalid(format!(
                "grid of {} columns cannot hold a block {} columns wide",
                self.columns, self.min_width
            )));
        }
        if !self.row_height_px.is_finite() || self.row_height_px <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "row_height_px must be positive, got {}",
                self.row_height_px
            )));
        }
        if self.max_reflow_passes == 0 {
            return Err(ConfigError::Invalid(
                "max_reflow_passes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Pixel width of one column on a surface `surface_width_px` wide.
    pub fn column_width_px(&self, surface_width_px: f64) -> f64 {
        surface_width_px / self.columns as f64
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse grid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid grid config: {0}")]
    Invalid(String),
}

/// Runtime knobs for an [`InteractionController`](crate::InteractionController).
#[derive(Clone)]
pub struct ControllerConfig {
    pub grid: GridConfig,
    /// Rendered width of the grid; column width is derived from it.
    pub surface_width_px: f64,
    /// Optional structured logger used by the controller.
    pub logger: Option<Logger>,
    /// Counters shared with the host. `None` disables collection.
    pub metrics: Option<Arc<Mutex<InteractionMetrics>>>,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            surface_width_px: DEFAULT_SURFACE_WIDTH_PX,
            logger: None,
            metrics: None,
            metrics_target: "blockgrid::interaction.metrics".to_string(),
        }
    }
}

impl ControllerConfig {
    pub fn with_grid(grid: GridConfig) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_surface_width(mut self, surface_width_px: f64) -> Self {
        self.surface_width_px = surface_width_px;
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(InteractionMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<InteractionMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}
