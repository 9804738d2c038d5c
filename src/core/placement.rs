//! Rejection sampling of spawn points inside regions.

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::core::error::DispatchError;
use crate::core::region::Region;
use crate::util::geometry::Vec3;

/// Draws spawn points that respect region membership and task spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSampler {
    max_attempts: u32,
    min_spacing: f32,
}

impl PlacementSampler {
    /// Create a sampler. At least one attempt is always made.
    pub fn new(max_attempts: u32, min_spacing: f32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_spacing: min_spacing.max(0.0),
        }
    }

    /// Attempts per placement.
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Minimum world-space distance between tasks at zoom 1.
    pub const fn min_spacing(&self) -> f32 {
        self.min_spacing
    }

    /// True if `p` keeps the scaled spacing to every occupied point.
    pub fn is_clear(&self, p: Vec3, occupied: &[Vec3], zoom: f32) -> bool {
        let spacing = self.min_spacing * zoom;
        occupied.iter().all(|o| o.distance(p) >= spacing)
    }

    /// One candidate: uniform in the boundary rectangle, then membership,
    /// then spacing.
    pub fn try_once<R: Rng + ?Sized>(
        &self,
        region: &Region,
        occupied: &[Vec3],
        zoom: f32,
        rng: &mut R,
    ) -> Option<Vec3> {
        let bounds = region.boundary_rect();
        let candidate = bounds.at(rng.random::<f32>(), rng.random::<f32>());
        if !region.contains_point(candidate) {
            return None;
        }
        self.is_clear(candidate, occupied, zoom).then_some(candidate)
    }

    /// Sample until a candidate passes or attempts run out.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        region: &Region,
        occupied: &[Vec3],
        zoom: f32,
        rng: &mut R,
    ) -> Result<Vec3, DispatchError> {
        for attempt in 1..=self.max_attempts {
            if let Some(p) = self.try_once(region, occupied, zoom, rng) {
                debug!(region = %region.id(), attempt, x = p.x, y = p.y, "spawn point found");
                return Ok(p);
            }
        }
        warn!(region = %region.id(), attempts = self.max_attempts, "no valid spawn point");
        Err(DispatchError::PlacementExhausted {
            region: region.id().clone(),
            attempts: self.max_attempts,
        })
    }
}

/// Uniform choice among unlocked regions.
pub fn pick_unlocked_region<'a, I, R>(regions: I, rng: &mut R) -> Option<&'a Region>
where
    I: IntoIterator<Item = &'a Region>,
    R: Rng + ?Sized,
{
    let unlocked: Vec<&Region> = regions.into_iter().filter(|r| r.is_unlocked()).collect();
    unlocked.choose(rng).copied()
}
