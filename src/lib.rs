pub mod config;
pub mod constants;
pub mod derived;
pub mod error;
pub mod math_utils;
pub mod snapshot;
pub mod soil;
pub mod state;
pub mod tile;

pub use config::ModelOptions;
pub use derived::{DerivedStateReport, compute_derived_state, compute_derived_state_owned};
pub use error::{ConfigError, DerivedStateError, PropertyError, Stage};
pub use snapshot::SoilColumnSnapshot;
pub use soil::SoilParameters;
pub use state::{CellVars, LayerState, SoilColumnState, ThermalNodeState, TileDiagnostics, TileVars};
pub use tile::{Tile, TileIndex, TileSelector};
