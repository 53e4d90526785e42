/// Scratch copy of layer moisture and ice taken before any tile is modified
///
/// The buffer is owned by the caller and scoped to one cell, so cells can
/// be processed in parallel each with its own snapshot. It is sized from
/// the configured counts rather than compile-time maxima.
use crate::config::ModelOptions;
use crate::state::SoilColumnState;
use crate::tile::TileIndex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoilColumnSnapshot {
    n_bands: usize,
    n_layers: usize,
    n_frost: usize,
    moist: Vec<f64>,
    ice: Vec<f64>,
}

impl SoilColumnSnapshot {
    /// Buffer large enough for every tile of a cell with `n_veg_classes`
    /// vegetation classes (bare soil included)
    pub fn for_cell(options: &ModelOptions, n_veg_classes: usize) -> Self {
        let mut snapshot = Self::default();
        snapshot.reshape(options, n_veg_classes);
        snapshot
    }

    /// Resize for a different configuration; contents are reset
    pub fn reshape(&mut self, options: &ModelOptions, n_veg_classes: usize) {
        self.n_bands = options.n_bands;
        self.n_layers = options.n_layers;
        self.n_frost = options.n_frost;
        let columns = n_veg_classes * options.n_bands;
        self.moist.clear();
        self.moist.resize(columns * options.n_layers, 0.0);
        self.ice.clear();
        self.ice.resize(columns * options.n_layers * options.n_frost, 0.0);
    }

    pub fn fits(&self, options: &ModelOptions, n_veg_classes: usize) -> bool {
        self.n_bands == options.n_bands
            && self.n_layers == options.n_layers
            && self.n_frost == options.n_frost
            && self.moist.len() == n_veg_classes * options.n_bands * options.n_layers
    }

    /// Number of f64 slots held
    pub fn capacity(&self) -> usize {
        self.moist.len() + self.ice.len()
    }

    fn column_offset(&self, index: TileIndex) -> usize {
        (index.veg * self.n_bands + index.band) * self.n_layers
    }

    /// Copy a tile's moisture and ice into the buffer
    pub fn capture(&mut self, index: TileIndex, column: &SoilColumnState) {
        let offset = self.column_offset(index);
        for (lidx, layer) in column.layers.iter().enumerate() {
            self.moist[offset + lidx] = layer.moist;
            let ice_offset = (offset + lidx) * self.n_frost;
            self.ice[ice_offset..ice_offset + self.n_frost].copy_from_slice(&layer.ice);
        }
    }

    /// Captured layer moisture of a tile (mm)
    pub fn moist(&self, index: TileIndex) -> &[f64] {
        let offset = self.column_offset(index);
        &self.moist[offset..offset + self.n_layers]
    }

    /// Captured frost-area ice of one layer of a tile (mm)
    pub fn ice(&self, index: TileIndex, lidx: usize) -> &[f64] {
        let ice_offset = (self.column_offset(index) + lidx) * self.n_frost;
        &self.ice[ice_offset..ice_offset + self.n_frost]
    }

    /// Write the captured values back into the tile's layers
    pub fn commit(&self, index: TileIndex, column: &mut SoilColumnState) {
        for (lidx, layer) in column.layers.iter_mut().enumerate() {
            layer.moist = self.moist(index)[lidx];
            layer.ice.copy_from_slice(self.ice(index, lidx));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_follows_configuration() {
        let options = ModelOptions {
            n_layers: 3,
            n_bands: 2,
            n_frost: 4,
            ..ModelOptions::default()
        };
        let snapshot = SoilColumnSnapshot::for_cell(&options, 5);
        // 5 classes × 2 bands × 3 layers, and × 4 frost areas for ice
        assert_eq!(snapshot.capacity(), 30 + 120);
        assert!(snapshot.fits(&options, 5));
        assert!(!snapshot.fits(&options, 6));
    }

    #[test]
    fn test_capture_then_commit_restores_column() {
        let options = ModelOptions {
            n_bands: 2,
            n_frost: 2,
            ..ModelOptions::default()
        };
        let index = TileIndex { veg: 1, band: 1 };
        let mut column = SoilColumnState::new(&[10.0, 50.0, 200.0], 2);
        column.layers[1].ice = vec![5.0, 7.0];

        let mut snapshot = SoilColumnSnapshot::for_cell(&options, 2);
        snapshot.capture(index, &column);
        assert_eq!(snapshot.moist(index), &[10.0, 50.0, 200.0]);
        assert_eq!(snapshot.ice(index, 1), &[5.0, 7.0]);

        let original = column.clone();
        column.layers[0].moist = 99.0;
        column.layers[1].ice[0] = 0.0;
        snapshot.commit(index, &mut column);
        assert_eq!(column, original);

        // other tiles are untouched
        assert_eq!(snapshot.moist(TileIndex { veg: 0, band: 0 }), &[0.0, 0.0, 0.0]);
    }
}
