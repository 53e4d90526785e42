/// Tiles of a grid cell: (vegetation class, elevation band) pairs
///
/// Vegetation cover fractions carry one entry per vegetation class plus a
/// final bare soil entry, so indices run over `0..=n_veg`.

/// Position of a tile inside a cell's state arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    pub veg: usize,
    pub band: usize,
}

/// A tile selected for processing with its area weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub index: TileIndex,
    /// Vegetation cover fraction × band area fraction, always > 0
    pub weight: f64,
}

/// Enumerates the tiles of a cell that have nonzero area
pub struct TileSelector<'a> {
    veg_cover: &'a [f64],
    area_fract: &'a [f64],
}

impl<'a> TileSelector<'a> {
    /// `veg_cover` includes the trailing bare soil class.
    pub fn new(veg_cover: &'a [f64], area_fract: &'a [f64]) -> Self {
        Self {
            veg_cover,
            area_fract,
        }
    }

    /// Vegetation classes including bare soil
    pub fn n_veg_classes(&self) -> usize {
        self.veg_cover.len()
    }

    /// Tiles with positive cover and positive band area, vegetation major,
    /// band minor.
    pub fn select(&self) -> Vec<Tile> {
        let mut tiles = Vec::new();
        for (veg, &cv) in self.veg_cover.iter().enumerate() {
            if !(cv > 0.0) {
                continue;
            }
            for (band, &area) in self.area_fract.iter().enumerate() {
                if area > 0.0 {
                    tiles.push(Tile {
                        index: TileIndex { veg, band },
                        weight: cv * area,
                    });
                }
            }
        }
        tiles
    }
}
