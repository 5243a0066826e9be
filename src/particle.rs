use crate::settings::{BoundaryBehavior, GroupSettings};
use crate::surface::Surface;
use glam::Vec2;
use rand::Rng;
use std::collections::VecDeque;

/// Number of past positions kept for the motion trail
pub const TRAIL_LENGTH: usize = 16;

/// Downward acceleration added to velocity.y each frame when gravity is on
pub const GRAVITY: f32 = 0.05;

/// Peak pointer push (pixels) at zero distance; falls off linearly to 0 at the radius
pub const REPULSION_STRENGTH: f32 = 4.0;

/// Push direction used when the pointer sits exactly on the particle
pub const FALLBACK_DIRECTION: Vec2 = Vec2::new(0.0, -1.0);

/// Shortest slide along an edge for a pinned, repelled particle
const MIN_SLIDE: f32 = 0.5;

const GLOW_SCALE: f32 = 2.5;
const GLOW_ALPHA: f32 = 0.25;
const TRAIL_ALPHA: f32 = 0.4;

/// Index of a group inside the owning `Simulation`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GroupId(pub usize);

/// A single simulated point
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub group: GroupId,
    /// Most recent positions, oldest first
    trail: VecDeque<Vec2>,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2, group: GroupId) -> Self {
        Self {
            position,
            velocity,
            group,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
        }
    }

    /// Fresh particle at a random position inside `bounds` with a random
    /// velocity within the group's bound and an empty trail.
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        group: GroupId,
        settings: &GroupSettings,
        bounds: Vec2,
    ) -> Self {
        let position = Vec2::new(rng.gen::<f32>() * bounds.x, rng.gen::<f32>() * bounds.y);
        let bound = settings.velocity_bound;
        let velocity = Vec2::new(
            (rng.gen::<f32>() * 2.0 - 1.0) * bound,
            (rng.gen::<f32>() * 2.0 - 1.0) * bound,
        );
        Self::new(position, velocity, group)
    }

    pub fn trail(&self) -> &VecDeque<Vec2> {
        &self.trail
    }

    /// Add downward speed
    pub fn apply_gravity(&mut self, amount: f32) {
        self.velocity.y += amount;
    }

    /// Advance one frame.
    ///
    /// `interaction` is the neighbour velocity change computed by the simulation
    /// from its frame-start snapshot; `bounds` is the surface size.
    pub fn update(
        &mut self,
        pointer: Option<Vec2>,
        settings: &GroupSettings,
        bounds: Vec2,
        interaction: Vec2,
    ) {
        let start = self.position;
        let away = pointer.and_then(|p| self.avoid_pointer(p, settings.interaction_radius));

        self.velocity += interaction;
        if settings.gravity_enabled {
            self.apply_gravity(GRAVITY);
        }

        let bound = settings.velocity_bound;
        self.velocity = self.velocity.clamp(Vec2::splat(-bound), Vec2::splat(bound));

        // While repelled, never drift back toward the pointer
        if let Some((dir, _)) = away {
            let inward = self.velocity.dot(dir);
            if inward < 0.0 {
                self.velocity -= dir * inward;
                let peak = self.velocity.x.abs().max(self.velocity.y.abs());
                if peak > bound {
                    self.velocity *= bound / peak;
                }
            }
        }

        self.position += self.velocity;
        self.apply_boundary(settings.boundary, bounds);
        if let (Some(pointer), Some((_, push))) = (pointer, away) {
            if settings.boundary == BoundaryBehavior::Bounce {
                self.slide_along_edge(pointer, start, push, bounds);
            }
        }
        self.record_trail();
    }

    /// Displace away from the pointer when inside `radius`.
    /// Returns the push direction and length if the force was applied.
    fn avoid_pointer(&mut self, pointer: Vec2, radius: f32) -> Option<(Vec2, f32)> {
        let offset = self.position - pointer;
        let distance = offset.length();
        if distance >= radius {
            return None;
        }
        let dir = if distance > 0.0 {
            offset / distance
        } else {
            FALLBACK_DIRECTION
        };
        let push = REPULSION_STRENGTH * (1.0 - distance / radius);
        self.position += dir * push;
        Some((dir, push))
    }

    /// A repelled particle pinned against an edge (or into a corner) by the
    /// bounce clamp moves along the edge instead, to the nearest in-bounds
    /// spot that is further from the pointer than `start`.
    fn slide_along_edge(&mut self, pointer: Vec2, start: Vec2, push: f32, bounds: Vec2) {
        let before = start.distance(pointer);
        if self.position.distance(pointer) > before {
            return;
        }
        let offset = self.position - pointer;
        let margin = push.max(MIN_SLIDE);

        // (axis, target coordinate, distance moved)
        let mut best: Option<(usize, f32, f32)> = None;
        for axis in 0..2 {
            let other = offset[1 - axis];
            // Offset along `axis` must exceed this for the distance to grow
            let need = (before * before - other * other).max(0.0).sqrt();
            let away = if offset[axis] < 0.0 { -1.0 } else { 1.0 };
            for sign in [away, -away] {
                let target = pointer[axis] + sign * (need + margin);
                if target < 0.0 || target > bounds[axis] {
                    continue;
                }
                let cost = (target - self.position[axis]).abs();
                if best.map_or(true, |(_, _, c)| cost < c) {
                    best = Some((axis, target, cost));
                }
            }
        }

        if let Some((axis, target, _)) = best {
            self.position[axis] = target;
        }
    }

    fn apply_boundary(&mut self, boundary: BoundaryBehavior, bounds: Vec2) {
        match boundary {
            BoundaryBehavior::Bounce => {
                if self.position.x < 0.0 {
                    self.position.x = 0.0;
                    self.velocity.x = self.velocity.x.abs();
                } else if self.position.x > bounds.x {
                    self.position.x = bounds.x;
                    self.velocity.x = -self.velocity.x.abs();
                }
                if self.position.y < 0.0 {
                    self.position.y = 0.0;
                    self.velocity.y = self.velocity.y.abs();
                } else if self.position.y > bounds.y {
                    self.position.y = bounds.y;
                    self.velocity.y = -self.velocity.y.abs();
                }
            }
            BoundaryBehavior::Wrap => {
                let before = self.position;
                if bounds.x > 0.0 {
                    self.position.x = self.position.x.rem_euclid(bounds.x);
                }
                if bounds.y > 0.0 {
                    self.position.y = self.position.y.rem_euclid(bounds.y);
                }
                if self.position != before {
                    // Don't streak the trail across the whole surface
                    self.trail.clear();
                }
            }
        }
    }

    fn record_trail(&mut self) {
        self.trail.push_back(self.position);
        while self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }

    /// Keep the particle inside a resized surface
    pub fn confine(&mut self, bounds: Vec2) {
        self.position = self.position.clamp(Vec2::ZERO, bounds.max(Vec2::ZERO));
        self.trail.clear();
    }

    /// Issue draw calls: optional glow, the body, then the trail polyline
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, settings: &GroupSettings) {
        let Vec2 { x, y } = self.position;

        if settings.glow_enabled {
            surface.set_fill_style(settings.color.scaled_alpha(GLOW_ALPHA));
            surface.begin_path();
            surface.arc(x, y, settings.size * GLOW_SCALE);
            surface.fill();
        }

        surface.set_fill_style(settings.color);
        surface.begin_path();
        surface.arc(x, y, settings.size);
        surface.fill();

        let trail = self.trail();
        if trail.len() >= 2 {
            surface.set_stroke_style(settings.color.scaled_alpha(TRAIL_ALPHA));
            surface.begin_path();
            let mut points = trail.iter();
            if let Some(first) = points.next() {
                surface.move_to(first.x, first.y);
            }
            for point in points {
                surface.line_to(point.x, point.y);
            }
            surface.stroke();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::surface::recording::{Call, RecordingSurface};
    use crate::surface::PathOp;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const BOUNDS: Vec2 = Vec2::new(400.0, 300.0);

    fn still(x: f32, y: f32) -> Particle {
        Particle::new(Vec2::new(x, y), Vec2::ZERO, GroupId(0))
    }

    #[test]
    fn test_spawn_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let settings = GroupSettings {
            velocity_bound: 4.0,
            ..Default::default()
        };
        for _ in 0..500 {
            let p = Particle::spawn(&mut rng, GroupId(2), &settings, BOUNDS);
            assert!(p.position.x >= 0.0 && p.position.x <= BOUNDS.x);
            assert!(p.position.y >= 0.0 && p.position.y <= BOUNDS.y);
            assert!(p.velocity.x.abs() <= 4.0 && p.velocity.y.abs() <= 4.0);
            assert!(p.trail().is_empty());
            assert_eq!(p.group, GroupId(2));
        }
    }

    #[test]
    fn test_moves_away_from_nearby_pointer() {
        let mut p = still(110.0, 110.0);
        p.update(
            Some(Vec2::new(100.0, 100.0)),
            &GroupSettings::default(),
            BOUNDS,
            Vec2::ZERO,
        );
        assert!(p.position.x > 110.0);
        assert!(p.position.y > 110.0);
    }

    #[test]
    fn test_pointer_distance_grows_even_when_heading_inward() {
        let pointer = Vec2::new(200.0, 150.0);
        let settings = GroupSettings {
            gravity_enabled: true,
            ..Default::default()
        };
        // Near the edge of the radius the push is tiny, so the full-speed
        // inward velocity has to be neutralised for the distance to grow.
        for start in [Vec2::new(299.0, 150.0), Vec2::new(205.0, 140.0), Vec2::new(130.0, 200.0)] {
            let mut p = Particle::new(start, (pointer - start).normalize() * 2.0, GroupId(0));
            let before = p.position.distance(pointer);
            p.update(Some(pointer), &settings, BOUNDS, Vec2::ZERO);
            assert!(p.position.distance(pointer) > before, "start {:?}", start);
            assert!(p.velocity.x.abs() <= 2.0 && p.velocity.y.abs() <= 2.0);
        }
    }

    #[test]
    fn test_particle_on_floor_slides_away_from_pointer_above() {
        let pointer = Vec2::new(200.0, 295.0);
        let mut p = still(200.0, 300.0);
        let before = p.position.distance(pointer);
        p.update(Some(pointer), &GroupSettings::default(), BOUNDS, Vec2::ZERO);
        assert!(p.position.distance(pointer) > before);
        assert_eq!(p.position.y, 300.0);
        assert!(p.position.x >= 0.0 && p.position.x <= BOUNDS.x);
    }

    #[test]
    fn test_particle_in_corner_escapes_pointer_on_diagonal() {
        let pointer = Vec2::new(3.0, 297.0);
        let settings = GroupSettings {
            gravity_enabled: true,
            ..Default::default()
        };
        let mut p = Particle::new(Vec2::new(0.0, 300.0), Vec2::new(0.0, 2.0), GroupId(0));
        let before = p.position.distance(pointer);
        p.update(Some(pointer), &settings, BOUNDS, Vec2::ZERO);
        assert!(p.position.distance(pointer) > before);
        assert!(p.position.x >= 0.0 && p.position.x <= BOUNDS.x);
        assert!(p.position.y >= 0.0 && p.position.y <= BOUNDS.y);
    }

    #[test]
    fn test_pointer_distance_grows_along_every_edge() {
        let settings = GroupSettings {
            gravity_enabled: true,
            ..Default::default()
        };
        let edges = [
            (Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0)),
            (Vec2::new(400.0, 0.0), Vec2::new(-2.0, 2.0)),
            (Vec2::new(400.0, 300.0), Vec2::new(-2.0, -2.0)),
            (Vec2::new(0.0, 300.0), Vec2::new(2.0, -2.0)),
            (Vec2::new(150.0, 300.0), Vec2::new(0.0, -5.0)),
            (Vec2::new(150.0, 0.0), Vec2::new(0.0, 5.0)),
            (Vec2::new(0.0, 120.0), Vec2::new(5.0, 0.0)),
            (Vec2::new(400.0, 120.0), Vec2::new(-5.0, 0.0)),
        ];
        for (start, toward_pointer) in edges {
            for velocity in [Vec2::ZERO, Vec2::new(2.0, 2.0), Vec2::new(-2.0, -2.0)] {
                let pointer = start + toward_pointer;
                let mut p = Particle::new(start, velocity, GroupId(0));
                let before = p.position.distance(pointer);
                p.update(Some(pointer), &settings, BOUNDS, Vec2::ZERO);
                assert!(
                    p.position.distance(pointer) > before,
                    "start {:?} velocity {:?} ended at {:?}",
                    start,
                    velocity,
                    p.position
                );
            }
        }
    }

    #[test]
    fn test_pointer_on_top_uses_fallback_direction() {
        let mut p = still(50.0, 50.0);
        p.update(
            Some(Vec2::new(50.0, 50.0)),
            &GroupSettings::default(),
            BOUNDS,
            Vec2::ZERO,
        );
        assert!(p.position.is_finite());
        assert_eq!(p.position.x, 50.0);
        assert!(p.position.y < 50.0);
    }

    #[test]
    fn test_pointer_outside_radius_has_no_effect() {
        let mut p = still(300.0, 200.0);
        p.update(
            Some(Vec2::new(10.0, 10.0)),
            &GroupSettings::default(),
            BOUNDS,
            Vec2::ZERO,
        );
        assert_eq!(p.position, Vec2::new(300.0, 200.0));
    }

    #[test]
    fn test_gravity_accelerates_downward() {
        let mut p = still(100.0, 100.0);
        p.apply_gravity(9.8);
        assert!(p.velocity.y > 0.0);

        let mut p = still(100.0, 100.0);
        let settings = GroupSettings {
            gravity_enabled: true,
            ..Default::default()
        };
        p.update(None, &settings, BOUNDS, Vec2::ZERO);
        assert!(p.velocity.y > 0.0);
        for _ in 0..200 {
            p.update(None, &settings, Vec2::new(400.0, 100_000.0), Vec2::ZERO);
        }
        assert_eq!(p.velocity.y, settings.velocity_bound);
    }

    #[test]
    fn test_velocity_clamped_after_update() {
        let mut p = Particle::new(Vec2::new(200.0, 150.0), Vec2::new(9.0, -7.0), GroupId(0));
        let settings = GroupSettings {
            velocity_bound: 1.5,
            ..Default::default()
        };
        p.update(None, &settings, BOUNDS, Vec2::new(3.0, -3.0));
        assert_eq!(p.velocity, Vec2::new(1.5, -1.5));
        assert_eq!(p.position, Vec2::new(201.5, 148.5));
    }

    #[test]
    fn test_bounce_reflects_inward() {
        let settings = GroupSettings::default();
        let mut p = Particle::new(Vec2::new(399.0, 1.0), Vec2::new(2.0, -2.0), GroupId(0));
        p.update(None, &settings, BOUNDS, Vec2::ZERO);
        assert_eq!(p.position, Vec2::new(400.0, 0.0));
        assert_eq!(p.velocity, Vec2::new(-2.0, 2.0));
    }

    #[test]
    fn test_wrap_moves_to_opposite_side_and_clears_trail() {
        let settings = GroupSettings {
            boundary: BoundaryBehavior::Wrap,
            ..Default::default()
        };
        let mut p = Particle::new(Vec2::new(395.0, 100.0), Vec2::new(2.0, 0.0), GroupId(0));
        p.update(None, &settings, BOUNDS, Vec2::ZERO);
        p.update(None, &settings, BOUNDS, Vec2::ZERO);
        assert_eq!(p.trail().len(), 2);

        p.update(None, &settings, BOUNDS, Vec2::ZERO);
        assert!((p.position.x - 1.0).abs() < 1e-3);
        assert_eq!(p.trail().len(), 1);
        assert_eq!(p.velocity, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_trail_keeps_last_positions_in_order() {
        let mut p = Particle::new(Vec2::new(10.0, 10.0), Vec2::new(1.0, 0.5), GroupId(0));
        let settings = GroupSettings::default();
        let mut history = Vec::new();
        for _ in 0..(TRAIL_LENGTH * 3) {
            p.update(None, &settings, BOUNDS, Vec2::ZERO);
            history.push(p.position);
            assert!(p.trail().len() <= TRAIL_LENGTH);
        }
        let expected: Vec<Vec2> = history[history.len() - TRAIL_LENGTH..].to_vec();
        let actual: Vec<Vec2> = p.trail().iter().copied().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_draw_uses_group_color_and_trail() {
        let mut p = still(50.0, 50.0);
        let settings = GroupSettings {
            color: Rgba::from_hex("#0000ff").unwrap(),
            ..Default::default()
        };
        p.update(None, &settings, BOUNDS, Vec2::new(1.0, 0.0));
        p.update(None, &settings, BOUNDS, Vec2::ZERO);

        let mut surface = RecordingSurface::default();
        p.draw(&mut surface, &settings);

        assert!(surface.count(&Call::BeginPath) >= 1);
        assert_eq!(surface.fill_styles(), vec![settings.color]);
        assert!(surface
            .calls
            .contains(&Call::Path(PathOp::Arc { x: 52.0, y: 50.0, radius: 3.0 })));
        assert_eq!(surface.count(&Call::Stroke), 1);
        assert!(surface
            .calls
            .contains(&Call::Path(PathOp::MoveTo { x: 51.0, y: 50.0 })));
    }

    #[test]
    fn test_glow_draws_larger_fainter_circle_first() {
        let p = still(20.0, 30.0);
        let settings = GroupSettings {
            glow_enabled: true,
            ..Default::default()
        };
        let mut surface = RecordingSurface::default();
        p.draw(&mut surface, &settings);

        let styles = surface.fill_styles();
        assert_eq!(styles.len(), 2);
        assert!(styles[0].a < styles[1].a);
        let arcs: Vec<f32> = surface
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Path(PathOp::Arc { radius, .. }) => Some(*radius),
                _ => None,
            })
            .collect();
        assert!(arcs[0] > arcs[1]);
        // No trail yet
        assert_eq!(surface.count(&Call::Stroke), 0);
    }
}
