//! Hotspot controllers and polygon hit testing.
//!
//! Each interactive region of a scene is driven by one [`Hotspot`]. Every
//! playback tick the engine pushes the region's visual and baked polygon set
//! for the current frame into its controller, then asks it to evaluate the
//! pointer against that geometry.
//!
//! Hit testing happens in two steps so that every region sees up-to-date
//! geometry: all colliders are refreshed first, then a single [`raycast`]
//! resolves which region the pointer struck, and finally each controller
//! registers the hit through [`Hotspot::register_hit`].

use raylib::prelude::Vector2;
use smallvec::SmallVec;

use crate::resources::slicetable::Slice;

/// Closed polygon in frame space. The last vertex connects back to the first.
pub type Polygon = Vec<Vector2>;

/// Hit-test geometry of one region for the current frame.
#[derive(Debug, Clone, Default)]
pub struct PolygonCollider {
    /// Region id reported when this collider is struck.
    pub region: usize,
    pub paths: SmallVec<[Polygon; 2]>,
}

impl PolygonCollider {
    pub fn new(region: usize) -> Self {
        Self {
            region,
            paths: SmallVec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether `point` lies inside any path. Points on an edge count as inside.
    pub fn contains_point(&self, point: Vector2) -> bool {
        self.paths
            .iter()
            .filter(|path| path.len() >= 3)
            .any(|path| point_on_polygon_edge(point, path) || ray_cast_contains(point, path))
    }
}

fn ray_cast_contains(point: Vector2, vertices: &[Vector2]) -> bool {
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let vi = vertices[i];
        let vj = vertices[j];
        if (vi.y > point.y) != (vj.y > point.y) {
            let denom = vj.y - vi.y;
            if denom.abs() > 1e-6 {
                let xinters = (point.y - vi.y) * (vj.x - vi.x) / denom + vi.x;
                if xinters > point.x {
                    inside = !inside;
                }
            }
        }
        j = i;
    }
    inside
}

fn point_on_polygon_edge(point: Vector2, vertices: &[Vector2]) -> bool {
    let Some(&last) = vertices.last() else {
        return false;
    };
    let mut prev = last;
    for &current in vertices {
        if point_on_segment(point, prev, current) {
            return true;
        }
        prev = current;
    }
    false
}

fn point_on_segment(p: Vector2, a: Vector2, b: Vector2) -> bool {
    let cross = (p.y - a.y) * (b.x - a.x) - (p.x - a.x) * (b.y - a.y);
    if cross.abs() > 1e-4 {
        return false;
    }
    let dot = (p.x - a.x) * (p.x - b.x) + (p.y - a.y) * (p.y - b.y);
    dot <= 0.0
}

/// Resolve the region struck by `point`.
///
/// Regions are stacked in index order, so when colliders overlap the highest
/// region index is the one on top and wins.
pub fn raycast(hotspots: &[Hotspot], point: Vector2) -> Option<usize> {
    hotspots
        .iter()
        .rev()
        .find(|h| h.collider.contains_point(point))
        .map(|h| h.collider.region)
}

/// Per-region playback state, owned by the playback engine.
#[derive(Debug, Clone)]
pub struct Hotspot {
    pub region: usize,
    /// Ticks elapsed in the current slice.
    pub played_frames: u32,
    /// Ticks during which the pointer was on this region. Never exceeds
    /// `played_frames`.
    pub touched_frames: u32,
    /// Fill of the bound score indicators, `0.0..=1.0`.
    pub score: f32,
    /// Texture key of the sprite shown for the current frame.
    pub visual: Option<String>,
    pub collider: PolygonCollider,
}

impl Hotspot {
    pub fn new(region: usize) -> Self {
        Self {
            region,
            played_frames: 0,
            touched_frames: 0,
            score: 0.0,
            visual: None,
            collider: PolygonCollider::new(region),
        }
    }

    /// Show `visual` for this tick.
    pub fn update_frame(&mut self, visual: impl Into<String>) {
        self.visual = Some(visual.into());
        self.played_frames += 1;
    }

    /// Hide the region for this tick. The tick still counts as played.
    pub fn remove_frame(&mut self) {
        self.visual = None;
        self.played_frames += 1;
    }

    /// Replace the hit geometry. Returns `false` when there is nothing to test.
    pub fn load_collider<'a, I>(&mut self, polygons: I) -> bool
    where
        I: IntoIterator<Item = &'a Polygon>,
    {
        self.collider.paths.clear();
        self.collider
            .paths
            .extend(polygons.into_iter().filter(|p| !p.is_empty()).cloned());
        !self.collider.is_empty()
    }

    pub fn remove_collider(&mut self) {
        self.collider.paths.clear();
    }

    /// Count this tick as touched if the pointer struck this region.
    ///
    /// `struck` is the region resolved by [`raycast`] for this tick, or
    /// `None` when there is no active pointer.
    pub fn register_hit(&mut self, slice: &Slice, struck: Option<usize>) -> bool {
        if self.collider.is_empty() || struck != Some(self.region) {
            return false;
        }
        if self.touched_frames < self.played_frames {
            self.touched_frames += 1;
        }
        if slice.show_score {
            self.score = score_for(self.touched_frames, slice.pass_threshold);
        }
        true
    }

    /// Pin touched ticks to played ticks while a touch is held.
    pub fn hold_touch(&mut self) {
        self.touched_frames = self.played_frames;
    }

    /// Whether at least one tick of this slice went untouched.
    pub fn released(&self) -> bool {
        self.touched_frames < self.played_frames
    }

    pub fn reset(&mut self) {
        self.played_frames = 0;
        self.touched_frames = 0;
        self.score = 0.0;
    }
}

fn score_for(touched: u32, threshold: u32) -> f32 {
    if threshold == 0 {
        return 1.0;
    }
    (touched as f32 / threshold as f32).min(1.0)
}
