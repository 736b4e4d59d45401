//! Connected-region extraction with external-boundary semantics.
//!
//! Regions are 8-connected. Only outer boundaries count: a hole inside a region,
//! and anything inside that hole, belongs to the enclosing region's area. This
//! is computed by flooding the background from the image border with the dual
//! 4-connectivity; every pixel the flood cannot reach is inside some region.

use std::collections::{BTreeMap, HashSet};

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::trace;

use crate::motion_pipeline::mask::{FOREGROUND, MotionMask};
use crate::motion_pipeline::regions::types::{BoundingBox, Region, RegionReport};

pub struct RegionValidator {
    min_area: u32,
}

struct RegionAccumulator {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    area: u32,
}

impl RegionAccumulator {
    fn new(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            area: 0,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.area += 1;
    }

    fn into_region(self) -> Region {
        Region {
            bounds: BoundingBox {
                x: self.min_x,
                y: self.min_y,
                width: self.max_x - self.min_x + 1,
                height: self.max_y - self.min_y + 1,
            },
            area: self.area,
        }
    }
}

impl RegionValidator {
    pub fn new(min_area: u32) -> Self {
        Self { min_area }
    }

    pub fn min_area(&self) -> u32 {
        self.min_area
    }

    /// Extracts external regions of `mask` and keeps those with `area >= min_area`.
    pub fn validate(&self, mask: &MotionMask) -> RegionReport {
        let total_motion_pixels = mask.foreground_count();
        if total_motion_pixels == 0 {
            return RegionReport::default();
        }

        let filled = fill_enclosed(mask.as_image());
        let labels = connected_components(&filled, Connectivity::Eight, Luma([0u8]));

        let mut accumulators: BTreeMap<u32, RegionAccumulator> = BTreeMap::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label.0[0];
            if label == 0 {
                continue;
            }
            accumulators
                .entry(label)
                .or_insert_with(|| RegionAccumulator::new(x, y))
                .add(x, y);
        }

        let found = accumulators.len();
        let regions: Vec<Region> = accumulators
            .into_values()
            .map(RegionAccumulator::into_region)
            .filter(|region| region.area >= self.min_area)
            .collect();

        trace!(
            found,
            kept = regions.len(),
            min_area = self.min_area,
            "Regions validated"
        );

        RegionReport {
            regions,
            total_motion_pixels,
        }
    }
}

/// Returns `mask` with every background pixel unreachable from the border set to foreground.
fn fill_enclosed(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();

    let mut background = mask.clone();
    background
        .pixels_mut()
        .for_each(|p| p.0[0] = if p.0[0] == 0 { FOREGROUND } else { 0 });
    let background_labels = connected_components(&background, Connectivity::Four, Luma([0u8]));

    let mut outside: HashSet<u32> = HashSet::new();
    for x in 0..width {
        outside.insert(background_labels.get_pixel(x, 0).0[0]);
        outside.insert(background_labels.get_pixel(x, height - 1).0[0]);
    }
    for y in 0..height {
        outside.insert(background_labels.get_pixel(0, y).0[0]);
        outside.insert(background_labels.get_pixel(width - 1, y).0[0]);
    }
    outside.remove(&0);

    GrayImage::from_fn(width, height, |x, y| {
        let is_outside = outside.contains(&background_labels.get_pixel(x, y).0[0]);
        Luma([if is_outside { 0 } else { FOREGROUND }])
    })
}
