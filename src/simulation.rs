use crate::config::ControlSnapshot;
use crate::error::SimError;
use crate::particle::{GroupId, Particle};
use crate::settings::{GroupSettings, ParticleGroup};
use crate::surface::Surface;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Scale applied to the summed neighbour offsets before they reach velocity
pub const PAIR_STRENGTH: f32 = 0.05;

/// Coarse lifecycle state, derived from the particle count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// No particles to simulate
    Idle,
    /// At least one particle, advanced every frame
    Running,
}

/// Particle simulation state
pub struct Simulation {
    pub width: f32,
    pub height: f32,
    pub paused: bool,
    /// Number of ticks run since creation
    pub frame: u64,
    groups: Vec<ParticleGroup>,
    particles: Vec<Particle>,
    /// Last known pointer position; None while the pointer is off the surface
    pointer: Option<Vec2>,
    rng: StdRng,
}

impl Simulation {
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    /// Deterministic spawns, for reproducible runs
    pub fn with_seed(width: f32, height: f32, seed: u64) -> Self {
        Self::with_rng(width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: f32, height: f32, rng: StdRng) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            paused: false,
            frame: 0,
            groups: Vec::new(),
            particles: Vec::new(),
            pointer: None,
            rng,
        }
    }

    fn bounds(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn state(&self) -> SimulationState {
        if self.particles.is_empty() {
            SimulationState::Idle
        } else {
            SimulationState::Running
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn groups(&self) -> &[ParticleGroup] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&ParticleGroup> {
        self.groups.get(id.0)
    }

    /// Number of particles belonging to `id`
    pub fn group_len(&self, id: GroupId) -> usize {
        self.particles.iter().filter(|p| p.group == id).count()
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Record the latest pointer position; read at the start of the next tick
    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer;
    }

    /// Register a new, empty group
    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        settings: GroupSettings,
    ) -> Result<GroupId, SimError> {
        let group = ParticleGroup::new(name, settings)?;
        self.groups.push(group);
        let id = GroupId(self.groups.len() - 1);
        log::debug!("added group {:?} '{}'", id, self.groups[id.0].name);
        Ok(id)
    }

    /// Drop every group from index `count` on, along with its particles
    pub fn truncate_groups(&mut self, count: usize) {
        if count >= self.groups.len() {
            return;
        }
        self.groups.truncate(count);
        self.particles.retain(|p| p.group.0 < count);
        log::debug!("truncated to {} group(s)", count);
    }

    /// Apply a control snapshot to a group: validate and swap its settings,
    /// then reconcile the group's particle count. A rejected snapshot changes nothing.
    pub fn apply_snapshot(&mut self, id: GroupId, snapshot: &ControlSnapshot) -> Result<(), SimError> {
        let group = self
            .groups
            .get_mut(id.0)
            .ok_or_else(|| SimError::invalid("group", format!("no group with index {}", id.0)))?;
        group.apply(snapshot.settings())?;
        self.reconcile(id, snapshot.num_particles);
        Ok(())
    }

    /// Grow or shrink a group to `requested` particles. Existing particles keep
    /// their motion state; new ones are appended, removals take the group's
    /// newest particles.
    pub fn reconcile(&mut self, id: GroupId, requested: usize) {
        let Some(group) = self.groups.get(id.0) else {
            return;
        };
        let settings = *group.settings();
        let current = self.group_len(id);

        if requested > current {
            let bounds = self.bounds();
            self.particles.reserve(requested - current);
            for _ in current..requested {
                let particle = Particle::spawn(&mut self.rng, id, &settings, bounds);
                self.particles.push(particle);
            }
        } else if requested < current {
            let mut kept = 0;
            self.particles.retain(|p| {
                if p.group != id {
                    return true;
                }
                kept += 1;
                kept <= requested
            });
        } else {
            return;
        }
        log::debug!("group {:?}: {} -> {} particles", id, current, requested);
    }

    /// Advance every particle by one frame.
    ///
    /// Neighbour forces read a snapshot of positions taken before any particle
    /// moves, so the outcome does not depend on iteration order.
    pub fn tick(&mut self) {
        if self.paused || self.particles.is_empty() {
            return;
        }

        let snapshot: Vec<Vec2> = self.particles.iter().map(|p| p.position).collect();
        let bounds = self.bounds();
        let pointer = self.pointer;

        for (index, particle) in self.particles.iter_mut().enumerate() {
            let Some(group) = self.groups.get(particle.group.0) else {
                continue;
            };
            let settings = group.settings();
            let interaction = interaction_delta(index, &snapshot, settings);
            particle.update(pointer, settings, bounds, interaction);
        }

        self.frame += 1;
    }

    /// Clear the surface and draw every particle in order
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) -> Result<(), SimError> {
        if !surface.is_available() {
            return Err(SimError::SurfaceUnavailable);
        }
        surface.clear_rect(0.0, 0.0, self.width, self.height);
        for particle in &self.particles {
            if let Some(group) = self.groups.get(particle.group.0) {
                particle.draw(surface, group.settings());
            }
        }
        Ok(())
    }

    /// Change the surface size, pulling particles back inside
    pub fn resize(&mut self, width: f32, height: f32) {
        let (width, height) = (width.max(0.0), height.max(0.0));
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        let bounds = self.bounds();
        for particle in &mut self.particles {
            particle.confine(bounds);
        }
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}

/// Velocity change on particle `index` from every other particle within its
/// group's interaction radius
fn interaction_delta(index: usize, positions: &[Vec2], settings: &GroupSettings) -> Vec2 {
    let sign = settings.interaction.sign();
    let radius = settings.interaction_radius;
    if sign == 0.0 || radius <= 0.0 {
        return Vec2::ZERO;
    }

    let me = positions[index];
    let mut sum = Vec2::ZERO;
    for (other_index, &other) in positions.iter().enumerate() {
        if other_index == index {
            continue;
        }
        let offset = me - other;
        let distance = offset.length();
        if distance <= 0.0 || distance >= radius {
            continue;
        }
        sum += offset / distance * (1.0 - distance / radius);
    }
    sum * PAIR_STRENGTH * sign
}
