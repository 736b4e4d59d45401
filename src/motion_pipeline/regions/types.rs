/// Axis-aligned box in pixel coordinates, inclusive of `x`/`y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn right(&self) -> u32 {
        self.x + self.width - 1
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height - 1
    }
}

/// One external region of the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub bounds: BoundingBox,
    /// Pixels enclosed by the region's outer boundary, holes included.
    pub area: u32,
}

/// Output of region validation for one mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionReport {
    /// Regions that reached the minimum area. Order carries no meaning.
    pub regions: Vec<Region>,
    /// Raw foreground pixel count of the mask, independent of any filtering.
    pub total_motion_pixels: u32,
}

impl RegionReport {
    pub fn valid_region_count(&self) -> usize {
        self.regions.len()
    }
}
