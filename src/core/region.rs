//! Spawn regions: boundary shapes, unlock state and accumulated experience.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::geometry::{Rect, Vec3};
use crate::util::serde::RegionId;

/// Membership test for a spawn area.
pub trait RegionShape: Send + Sync + fmt::Debug {
    /// Rectangle enclosing the whole shape; sampling draws from it.
    fn boundary_rect(&self) -> Rect;

    /// True if `p` lies in a valid part of the shape.
    fn contains_point(&self, p: Vec3) -> bool;
}

impl RegionShape for Rect {
    fn boundary_rect(&self) -> Rect {
        *self
    }

    fn contains_point(&self, p: Vec3) -> bool {
        self.contains(p)
    }
}

/// Simple polygon in the x/y plane, tested with the even-odd rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Vec3>,
    bounds: Rect,
}

impl Polygon {
    /// Build a polygon from its vertices. Needs at least three.
    pub fn new(points: Vec<Vec3>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let bounds = Rect::new(min_x, min_y, max_x - min_x, max_y - min_y);
        Some(Self { points, bounds })
    }

    /// Vertices in order.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
}

impl RegionShape for Polygon {
    fn boundary_rect(&self) -> Rect {
        self.bounds
    }

    fn contains_point(&self, p: Vec3) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }
        let mut inside = false;
        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let (a, b) = (self.points[i], self.points[j]);
            if (a.y > p.y) != (b.y > p.y) {
                let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Alpha grid stretched over a rectangle; a point is inside where the
/// sampled alpha is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaMask {
    /// Columns.
    pub width: usize,
    /// Rows, bottom row first.
    pub height: usize,
    /// Row-major alpha values.
    pub alpha: Vec<u8>,
}

impl AlphaMask {
    /// True if the grid dimensions match the data.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.alpha.len() == self.width * self.height
    }

    /// Alpha at normalized coordinates, nearest cell.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn sample(&self, u: f32, v: f32) -> u8 {
        if !self.is_valid() {
            return 0;
        }
        let col = ((u.clamp(0.0, 1.0) * self.width as f32) as usize).min(self.width - 1);
        let row = ((v.clamp(0.0, 1.0) * self.height as f32) as usize).min(self.height - 1);
        self.alpha[row * self.width + col]
    }
}

/// [`AlphaMask`] placed in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskShape {
    bounds: Rect,
    mask: AlphaMask,
}

impl MaskShape {
    /// Stretch `mask` over `bounds`.
    pub const fn new(bounds: Rect, mask: AlphaMask) -> Self {
        Self { bounds, mask }
    }
}

impl RegionShape for MaskShape {
    fn boundary_rect(&self) -> Rect {
        self.bounds
    }

    fn contains_point(&self, p: Vec3) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }
        let (u, v) = self.bounds.normalize(p);
        self.mask.sample(u, v) != 0
    }
}

/// Persisted per-region state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSave {
    /// Region id.
    pub id: RegionId,
    /// Unlock state.
    pub unlocked: bool,
    /// Accumulated experience.
    pub experience: u64,
}

/// A spawn region.
#[derive(Debug)]
pub struct Region {
    id: RegionId,
    shape: Box<dyn RegionShape>,
    unlocked: bool,
    experience: u64,
}

impl Region {
    /// Create a region with no experience.
    pub fn new(id: RegionId, shape: Box<dyn RegionShape>, unlocked: bool) -> Self {
        Self {
            id,
            shape,
            unlocked,
            experience: 0,
        }
    }

    /// Region id.
    pub const fn id(&self) -> &RegionId {
        &self.id
    }

    /// Boundary shape.
    pub fn shape(&self) -> &dyn RegionShape {
        self.shape.as_ref()
    }

    /// Rectangle sampled for spawn points.
    pub fn boundary_rect(&self) -> Rect {
        self.shape.boundary_rect()
    }

    /// Membership test.
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.shape.contains_point(p)
    }

    /// True if random spawns may target this region.
    pub const fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Allow random spawns here. Returns false if already unlocked.
    pub fn unlock(&mut self) -> bool {
        !std::mem::replace(&mut self.unlocked, true)
    }

    /// Accumulated experience.
    pub const fn experience(&self) -> u64 {
        self.experience
    }

    /// Credit experience from a claimed task.
    pub fn add_experience(&mut self, amount: u32) {
        self.experience = self.experience.saturating_add(u64::from(amount));
    }

    /// Persisted form.
    pub fn to_save(&self) -> RegionSave {
        RegionSave {
            id: self.id.clone(),
            unlocked: self.unlocked,
            experience: self.experience,
        }
    }

    /// Apply persisted unlock state and experience.
    pub fn restore(&mut self, save: &RegionSave) {
        self.unlocked = save.unlocked;
        self.experience = save.experience;
    }
}
