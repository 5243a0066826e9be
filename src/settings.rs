use crate::color::{Palette, Rgba};
use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Boundary behavior - what happens when particles leave the surface
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BoundaryBehavior {
    /// Stop on the edge and reflect the velocity inward
    #[default]
    Bounce,
    /// Reappear on the opposite side (toroidal)
    Wrap,
}

impl BoundaryBehavior {
    pub fn name(&self) -> &str {
        match self {
            BoundaryBehavior::Bounce => "Bounce",
            BoundaryBehavior::Wrap => "Wrap",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            BoundaryBehavior::Bounce => BoundaryBehavior::Wrap,
            BoundaryBehavior::Wrap => BoundaryBehavior::Bounce,
        }
    }
}

/// How particles react to neighbours inside the interaction radius
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Neighbours are ignored
    #[default]
    Off,
    /// Push away from neighbours (spreads the swarm out)
    Repel,
    /// Pull toward neighbours (forms clumps)
    Attract,
}

impl InteractionMode {
    pub fn name(&self) -> &str {
        match self {
            InteractionMode::Off => "Off",
            InteractionMode::Repel => "Repel",
            InteractionMode::Attract => "Attract",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            InteractionMode::Off => InteractionMode::Repel,
            InteractionMode::Repel => InteractionMode::Attract,
            InteractionMode::Attract => InteractionMode::Off,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            InteractionMode::Off => InteractionMode::Attract,
            InteractionMode::Repel => InteractionMode::Off,
            InteractionMode::Attract => InteractionMode::Repel,
        }
    }

    /// Sign applied to the summed neighbour offsets
    pub fn sign(&self) -> f32 {
        match self {
            InteractionMode::Off => 0.0,
            InteractionMode::Repel => 1.0,
            InteractionMode::Attract => -1.0,
        }
    }
}

/// Tunable parameters shared by every particle of one group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupSettings {
    /// Maximum speed per axis (>= 0)
    pub velocity_bound: f32,
    /// Distance threshold for pointer avoidance and neighbour interaction (>= 0)
    pub interaction_radius: f32,
    /// Fill/stroke colour including alpha
    pub color: Rgba,
    /// Draw a soft halo under each particle
    pub glow_enabled: bool,
    /// Accelerate downward every frame
    pub gravity_enabled: bool,
    /// Draw radius (> 0)
    pub size: f32,
    pub boundary: BoundaryBehavior,
    pub interaction: InteractionMode,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            velocity_bound: 2.0,
            interaction_radius: 100.0,
            color: Palette::default().color(),
            glow_enabled: false,
            gravity_enabled: false,
            size: 3.0,
            boundary: BoundaryBehavior::default(),
            interaction: InteractionMode::default(),
        }
    }
}

impl GroupSettings {
    /// Check every field; the first offending field is reported
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.velocity_bound.is_finite() || self.velocity_bound < 0.0 {
            return Err(SimError::invalid(
                "max_velocity",
                format!("{} must be a finite number >= 0", self.velocity_bound),
            ));
        }
        if !self.interaction_radius.is_finite() || self.interaction_radius < 0.0 {
            return Err(SimError::invalid(
                "interaction_radius",
                format!("{} must be a finite number >= 0", self.interaction_radius),
            ));
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(SimError::invalid(
                "particle_size",
                format!("{} must be a finite number > 0", self.size),
            ));
        }
        if !self.color.is_valid() {
            return Err(SimError::invalid(
                "color",
                format!("alpha {} must be within 0.0-1.0", self.color.a),
            ));
        }
        Ok(())
    }
}

/// A named bundle of settings shared by a set of particles
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleGroup {
    pub name: String,
    settings: GroupSettings,
}

impl ParticleGroup {
    pub fn new(name: impl Into<String>, settings: GroupSettings) -> Result<Self, SimError> {
        settings.validate()?;
        Ok(Self {
            name: name.into(),
            settings,
        })
    }

    pub fn settings(&self) -> &GroupSettings {
        &self.settings
    }

    /// Replace all settings at once. An invalid field rejects the whole update
    /// and leaves the previous settings in place.
    pub fn apply(&mut self, settings: GroupSettings) -> Result<(), SimError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }
}
