use crate::color::{Palette, Rgba};
use crate::config::{AppConfig, ControlSnapshot};
use crate::error::SimError;
use crate::settings::{BoundaryBehavior, InteractionMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named set of group snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub groups: Vec<ControlSnapshot>,
    pub steps_per_frame: usize,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        groups: Vec<ControlSnapshot>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            groups,
            steps_per_frame: 1,
        }
    }

    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            groups: self.groups.clone(),
            steps_per_frame: self.steps_per_frame,
            ..AppConfig::default()
        }
    }
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-ins plus whatever is in the user presets directory
    pub fn new() -> Self {
        Self::with_dir(Self::presets_dir())
    }

    /// Use `dir` for user presets (None disables user presets)
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    /// Get the presets directory path
    fn presets_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("particle-playground").join("presets"))
    }

    /// Load user presets from disk; unreadable files are skipped
    fn load_user_presets(&mut self) {
        let Some(dir) = &self.dir else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match load_preset(&path) {
                Ok(preset) => self.user.push(preset),
                Err(e) => log::warn!("skipping preset {}: {}", path.display(), e),
            }
        }
        self.user.sort_by(|a, b| a.name.cmp(&b.name));
        log::info!("loaded {} user preset(s)", self.user.len());
    }

    /// Save a preset to disk, replacing any user preset with the same name
    pub fn save_preset(&mut self, preset: Preset) -> Result<PathBuf, SimError> {
        let dir = self
            .dir
            .clone()
            .ok_or_else(|| SimError::invalid("preset", "no config directory available"))?;
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", sanitize(&preset.name)));
        let json = serde_json::to_string_pretty(&preset)?;
        fs::write(&path, json)?;

        self.user.retain(|p| p.name != preset.name);
        self.user.push(preset);
        Ok(path)
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.user.len()
    }

    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.all_presets().nth(index)
    }

    /// Index of the preset with this name (case-insensitive)
    pub fn position(&self, name: &str) -> Option<usize> {
        self.all_presets().position(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }
}

fn load_preset(path: &Path) -> Result<Preset, SimError> {
    let content = fs::read_to_string(path)?;
    let preset: Preset = serde_json::from_str(&content)?;
    preset.to_config().validate()?;
    Ok(preset)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn builtin_presets() -> Vec<Preset> {
    vec![
        // Default - reset values
        Preset::new(
            "Default",
            "A single cyan swarm with the reset settings",
            vec![ControlSnapshot::default()],
        ),
        // Twin Swarms - two groups with different behaviour
        Preset::new(
            "Twin Swarms",
            "A slow, tight cluster and a fast, wide-ranging one",
            vec![
                ControlSnapshot {
                    num_particles: 80,
                    max_velocity: 1.0,
                    interaction_radius: 100.0,
                    color: Palette::Cyan.color(),
                    ..Default::default()
                },
                ControlSnapshot {
                    num_particles: 80,
                    max_velocity: 3.0,
                    interaction_radius: 200.0,
                    color: Palette::Magenta.color(),
                    ..Default::default()
                },
            ],
        ),
        // Rain - gravity with wrap-around
        Preset::new(
            "Rain",
            "Falling particles that wrap back to the top",
            vec![ControlSnapshot {
                num_particles: 300,
                particle_size: 1.0,
                max_velocity: 4.0,
                interaction_radius: 60.0,
                color: Palette::Blue.color().with_alpha(0.8),
                gravity_enabled: true,
                boundary: BoundaryBehavior::Wrap,
                ..Default::default()
            }],
        ),
        // Fireflies - glowing, slow drift
        Preset::new(
            "Fireflies",
            "Slow glowing points that scatter from the pointer",
            vec![ControlSnapshot {
                num_particles: 60,
                particle_size: 2.0,
                max_velocity: 0.5,
                interaction_radius: 150.0,
                color: Palette::Amber.color(),
                glow_enabled: true,
                ..Default::default()
            }],
        ),
        // Flock - neighbours attract
        Preset::new(
            "Flock",
            "Particles pull toward neighbours and form clumps",
            vec![ControlSnapshot {
                num_particles: 150,
                max_velocity: 1.5,
                interaction_radius: 50.0,
                color: Palette::Lime.color(),
                interaction: InteractionMode::Attract,
                ..Default::default()
            }],
        ),
        // Crowd - neighbours repel
        Preset::new(
            "Crowd",
            "Particles keep their distance and spread evenly",
            vec![ControlSnapshot {
                num_particles: 200,
                particle_size: 2.0,
                interaction_radius: 40.0,
                color: Rgba::rgb(0xff, 0x7f, 0x50).with_alpha(0.9),
                interaction: InteractionMode::Repel,
                ..Default::default()
            }],
        ),
    ]
}
