use crate::color::{Palette, Rgba};
use crate::error::SimError;
use crate::settings::{BoundaryBehavior, GroupSettings, InteractionMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_NUM_PARTICLES: usize = 100;
pub const DEFAULT_PARTICLE_SIZE: f32 = 3.0;
pub const DEFAULT_MAX_VELOCITY: f32 = 2.0;
pub const DEFAULT_INTERACTION_RADIUS: f32 = 100.0;

pub const MAX_PARTICLES: usize = 2000;

/// Live values of the control panel for one particle group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSnapshot {
    pub num_particles: usize,
    pub particle_size: f32,
    pub max_velocity: f32,
    pub interaction_radius: f32,
    pub color: Rgba,
    pub gravity_enabled: bool,
    pub glow_enabled: bool,
    pub boundary: BoundaryBehavior,
    pub interaction: InteractionMode,
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self {
            num_particles: DEFAULT_NUM_PARTICLES,
            particle_size: DEFAULT_PARTICLE_SIZE,
            max_velocity: DEFAULT_MAX_VELOCITY,
            interaction_radius: DEFAULT_INTERACTION_RADIUS,
            color: Palette::default().color(),
            gravity_enabled: false,
            glow_enabled: false,
            boundary: BoundaryBehavior::default(),
            interaction: InteractionMode::default(),
        }
    }
}

impl ControlSnapshot {
    /// Group settings described by this snapshot (not yet validated)
    pub fn settings(&self) -> GroupSettings {
        GroupSettings {
            velocity_bound: self.max_velocity,
            interaction_radius: self.interaction_radius,
            color: self.color,
            glow_enabled: self.glow_enabled,
            gravity_enabled: self.gravity_enabled,
            size: self.particle_size,
            boundary: self.boundary,
            interaction: self.interaction,
        }
    }

    /// Restore every field to its default value
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn adjust_num_particles(&mut self, delta: i32) {
        let new_val = (self.num_particles as i64 + delta as i64).clamp(0, MAX_PARTICLES as i64);
        self.num_particles = new_val as usize;
    }

    pub fn adjust_particle_size(&mut self, delta: f32) {
        self.particle_size = (self.particle_size + delta).clamp(1.0, 10.0);
    }

    pub fn adjust_max_velocity(&mut self, delta: f32) {
        self.max_velocity = (self.max_velocity + delta).clamp(0.0, 10.0);
    }

    pub fn adjust_interaction_radius(&mut self, delta: f32) {
        self.interaction_radius = (self.interaction_radius + delta).clamp(0.0, 400.0);
    }

    pub fn adjust_alpha(&mut self, delta: f32) {
        let alpha = ((self.color.a + delta) * 10.0).round() / 10.0;
        self.color.a = alpha.clamp(0.1, 1.0);
    }

    /// Step through the named palette, keeping the current alpha
    pub fn cycle_color(&mut self, forward: bool) {
        let current = Palette::find(self.color).unwrap_or_default();
        let next = if forward { current.next() } else { current.prev() };
        self.color = next.color().with_alpha(self.color.a);
    }

    /// Display name of the colour: palette name or hex code
    pub fn color_name(&self) -> String {
        match Palette::find(self.color) {
            Some(entry) => entry.name().to_string(),
            None => Rgba { a: 1.0, ..self.color }.to_hex(),
        }
    }
}

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// One snapshot per particle group, in group order
    pub groups: Vec<ControlSnapshot>,
    /// Simulation ticks per rendered frame
    pub steps_per_frame: usize,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SimError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, SimError> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.groups.is_empty() {
            return Err(SimError::invalid("groups", "at least one group is required"));
        }
        for group in &self.groups {
            if group.num_particles > MAX_PARTICLES {
                return Err(SimError::invalid(
                    "num_particles",
                    format!("{} exceeds the limit of {}", group.num_particles, MAX_PARTICLES),
                ));
            }
            group.settings().validate()?;
        }
        Ok(())
    }

    /// Default location for exported configs
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("particle-playground").join("config.json"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            groups: vec![ControlSnapshot::default()],
            steps_per_frame: 1,
        }
    }
}
