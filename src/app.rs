use crate::braille;
use crate::config::{AppConfig, ControlSnapshot};
use crate::error::SimError;
use crate::particle::GroupId;
use crate::presets::{Preset, PresetManager};
use crate::simulation::Simulation;
use glam::Vec2;
use ratatui::layout::Rect;
use std::path::PathBuf;

const MAX_STEPS_PER_FRAME: usize = 10;

/// Focus state for parameter editing in the sidebar
/// Alphabetically ordered for consistent UI display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Alpha,
    Boundary,
    Color,
    Glow,
    Gravity,
    Group,
    Interaction,
    Particles,
    Preset,
    Radius,
    Size,
    Speed,
    Velocity,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Every parameter, in display order
    pub const PARAMS: [Focus; 13] = [
        Focus::Alpha,
        Focus::Boundary,
        Focus::Color,
        Focus::Glow,
        Focus::Gravity,
        Focus::Group,
        Focus::Interaction,
        Focus::Particles,
        Focus::Preset,
        Focus::Radius,
        Focus::Size,
        Focus::Speed,
        Focus::Velocity,
    ];

    fn index(&self) -> Option<usize> {
        Self::PARAMS.iter().position(|f| f == self)
    }

    /// Tab cycles through parameters in alphabetical order
    pub fn next(&self) -> Focus {
        match self.index() {
            Some(i) => Self::PARAMS[(i + 1) % Self::PARAMS.len()],
            None => Self::PARAMS[0],
        }
    }

    /// Shift+Tab cycles through parameters in reverse alphabetical order
    pub fn prev(&self) -> Focus {
        match self.index() {
            Some(i) => Self::PARAMS[(i + Self::PARAMS.len() - 1) % Self::PARAMS.len()],
            None => Self::PARAMS[Self::PARAMS.len() - 1],
        }
    }

    /// Get the line index in the parameters box for this focus
    pub fn line_index(&self) -> u16 {
        self.index().unwrap_or(0) as u16
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }

    pub fn label(&self) -> &str {
        match self {
            Focus::None | Focus::Controls => "",
            Focus::Alpha => "Alpha",
            Focus::Boundary => "Edges",
            Focus::Color => "Color",
            Focus::Glow => "Glow",
            Focus::Gravity => "Gravity",
            Focus::Group => "Group",
            Focus::Interaction => "Pairs",
            Focus::Particles => "Count",
            Focus::Preset => "Preset",
            Focus::Radius => "Radius",
            Focus::Size => "Size",
            Focus::Speed => "Speed",
            Focus::Velocity => "Velocity",
        }
    }
}

/// Main application state: the control panel around the simulation
pub struct App {
    pub simulation: Simulation,
    /// Live control values, one snapshot per group
    pub config: AppConfig,
    pub selected_group: usize,
    pub presets: PresetManager,
    pub preset_index: usize,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    /// Last user-facing message (errors, saves)
    pub status: Option<String>,
    /// Where `export_config` writes
    pub config_path: Option<PathBuf>,
    /// Whether the canvas had room to draw at the last resize
    canvas_available: bool,
}

impl App {
    pub fn new(canvas_width: u16, canvas_height: u16, seed: Option<u64>) -> Self {
        let (sim_width, sim_height) = braille::calculate_simulation_size(canvas_width, canvas_height);
        let simulation = match seed {
            Some(seed) => Simulation::with_seed(sim_width as f32, sim_height as f32, seed),
            None => Simulation::new(sim_width as f32, sim_height as f32),
        };
        Self::with_parts(simulation, PresetManager::new())
    }

    pub fn with_parts(simulation: Simulation, presets: PresetManager) -> Self {
        let canvas_available = simulation.width > 0.0 && simulation.height > 0.0;
        let mut app = Self {
            simulation,
            config: AppConfig::default(),
            selected_group: 0,
            presets,
            preset_index: 0,
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            status: None,
            config_path: AppConfig::default_path(),
            canvas_available,
        };
        if let Err(e) = app.load_config(AppConfig::default()) {
            log::error!("default configuration rejected: {}", e);
        }
        app
    }

    /// Snapshot of the group currently being edited
    pub fn selected(&self) -> &ControlSnapshot {
        &self.config.groups[self.selected_group.min(self.config.groups.len() - 1)]
    }

    /// Replace the whole configuration. Groups that already exist keep their
    /// particles (reconciled to the new counts); extra groups are dropped.
    pub fn load_config(&mut self, config: AppConfig) -> Result<(), SimError> {
        config.validate()?;

        for (index, snapshot) in config.groups.iter().enumerate() {
            let id = GroupId(index);
            if self.simulation.group(id).is_none() {
                self.simulation
                    .add_group(format!("Group {}", index + 1), snapshot.settings())?;
            }
            self.simulation.apply_snapshot(id, snapshot)?;
        }
        self.simulation.truncate_groups(config.groups.len());

        self.selected_group = self.selected_group.min(config.groups.len() - 1);
        self.config = AppConfig {
            steps_per_frame: config.steps_per_frame.clamp(1, MAX_STEPS_PER_FRAME),
            ..config
        };
        log::info!(
            "applied configuration: {} group(s), {} particle(s)",
            self.config.groups.len(),
            self.simulation.particles().len()
        );
        Ok(())
    }

    /// Validate and apply an edited snapshot of the selected group; on
    /// rejection the previous values stay in effect.
    pub fn apply_selected(&mut self, snapshot: ControlSnapshot) -> Result<(), SimError> {
        let index = self.selected_group;
        match self.simulation.apply_snapshot(GroupId(index), &snapshot) {
            Ok(()) => {
                self.config.groups[index] = snapshot;
                Ok(())
            }
            Err(e) => {
                log::warn!("rejected update for group {}: {}", index + 1, e);
                self.status = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn edit_selected(&mut self, edit: impl FnOnce(&mut ControlSnapshot)) {
        let mut snapshot = *self.selected();
        edit(&mut snapshot);
        if snapshot != *self.selected() {
            // Failure is already recorded in the status line
            let _ = self.apply_selected(snapshot);
        }
    }

    /// Run simulation steps for current frame
    pub fn tick(&mut self) {
        for _ in 0..self.config.steps_per_frame {
            self.simulation.tick();
        }
    }

    /// Pointer moved: Some(position) in surface coordinates, None when it left the canvas
    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.simulation.set_pointer(pointer);
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_up(&mut self) {
        self.adjust_focused(true);
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_down(&mut self) {
        self.adjust_focused(false);
    }

    fn adjust_focused(&mut self, up: bool) {
        let sign = if up { 1.0 } else { -1.0 };
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Alpha => self.edit_selected(|s| s.adjust_alpha(0.1 * sign)),
            Focus::Boundary => self.cycle_boundary(),
            Focus::Color => self.edit_selected(|s| s.cycle_color(up)),
            Focus::Glow => self.toggle_glow(),
            Focus::Gravity => self.toggle_gravity(),
            Focus::Group => self.cycle_group(up),
            Focus::Interaction => self.edit_selected(|s| {
                s.interaction = if up { s.interaction.next() } else { s.interaction.prev() }
            }),
            Focus::Particles => self.edit_selected(|s| s.adjust_num_particles(10 * sign as i32)),
            Focus::Preset => {
                if up {
                    self.next_preset()
                } else {
                    self.prev_preset()
                }
            }
            Focus::Radius => self.edit_selected(|s| s.adjust_interaction_radius(10.0 * sign)),
            Focus::Size => self.edit_selected(|s| s.adjust_particle_size(0.5 * sign)),
            Focus::Speed => {
                if up {
                    self.increase_speed()
                } else {
                    self.decrease_speed()
                }
            }
            Focus::Velocity => self.edit_selected(|s| s.adjust_max_velocity(0.5 * sign)),
        }
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        self.simulation.toggle_pause();
    }

    /// Restore every control to its default and reconcile
    pub fn reset(&mut self) {
        self.selected_group = 0;
        match self.load_config(AppConfig::default()) {
            Ok(()) => self.status = Some("Reset to defaults".to_string()),
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub fn toggle_gravity(&mut self) {
        self.edit_selected(|s| s.gravity_enabled = !s.gravity_enabled);
    }

    pub fn toggle_glow(&mut self) {
        self.edit_selected(|s| s.glow_enabled = !s.glow_enabled);
    }

    pub fn cycle_color(&mut self) {
        self.edit_selected(|s| s.cycle_color(true));
    }

    pub fn cycle_interaction(&mut self) {
        self.edit_selected(|s| s.interaction = s.interaction.next());
    }

    pub fn cycle_boundary(&mut self) {
        self.edit_selected(|s| s.boundary = s.boundary.next());
    }

    /// Move editing to the next/previous group
    pub fn cycle_group(&mut self, forward: bool) {
        let count = self.config.groups.len();
        self.selected_group = if forward {
            (self.selected_group + 1) % count
        } else {
            (self.selected_group + count - 1) % count
        };
    }

    /// Increase simulation speed
    pub fn increase_speed(&mut self) {
        self.config.steps_per_frame = (self.config.steps_per_frame + 1).min(MAX_STEPS_PER_FRAME);
    }

    /// Decrease simulation speed
    pub fn decrease_speed(&mut self) {
        self.config.steps_per_frame = self.config.steps_per_frame.saturating_sub(1).max(1);
    }

    pub fn next_preset(&mut self) {
        let count = self.presets.len().max(1);
        self.apply_preset((self.preset_index + 1) % count);
    }

    pub fn prev_preset(&mut self) {
        let count = self.presets.len().max(1);
        self.apply_preset((self.preset_index + count - 1) % count);
    }

    /// Load the preset at `index`
    pub fn apply_preset(&mut self, index: usize) {
        let Some(preset) = self.presets.get(index) else {
            return;
        };
        let name = preset.name.clone();
        let config = preset.to_config();
        self.selected_group = 0;
        match self.load_config(config) {
            Ok(()) => {
                self.preset_index = index;
                self.status = Some(format!("Preset: {}", name));
            }
            Err(e) => {
                log::warn!("preset '{}' rejected: {}", name, e);
                self.status = Some(e.to_string());
            }
        }
    }

    pub fn preset_name(&self) -> &str {
        self.presets
            .get(self.preset_index)
            .map(|p| p.name.as_str())
            .unwrap_or("-")
    }

    /// Write the current configuration to `config_path`
    pub fn export_config(&mut self) {
        let Some(path) = self.config_path.clone() else {
            self.status = Some("No config path available".to_string());
            return;
        };
        match self.config.save_to_file(&path) {
            Ok(()) => {
                log::info!("exported config to {}", path.display());
                self.status = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                log::warn!("config export failed: {}", e);
                self.status = Some(e.to_string());
            }
        }
    }

    /// Store the current configuration as a user preset
    pub fn save_user_preset(&mut self) {
        let name = format!("Custom {}", self.presets.user.len() + 1);
        let preset = Preset {
            steps_per_frame: self.config.steps_per_frame,
            ..Preset::new(name.clone(), "Saved from the control panel", self.config.groups.clone())
        };
        match self.presets.save_preset(preset) {
            Ok(path) => {
                log::info!("saved preset to {}", path.display());
                self.preset_index = self.presets.len() - 1;
                self.status = Some(format!("Saved preset {}", name));
            }
            Err(e) => {
                log::warn!("saving preset failed: {}", e);
                self.status = Some(e.to_string());
            }
        }
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Scroll controls box up
    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    /// Scroll controls box down
    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }

    /// Resize simulation to match new canvas size
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        let (sim_width, sim_height) = braille::calculate_simulation_size(canvas_width, canvas_height);
        self.simulation.resize(sim_width as f32, sim_height as f32);

        let available = sim_width > 0 && sim_height > 0;
        if available != self.canvas_available {
            if available {
                log::info!("canvas restored at {}x{} dots", sim_width, sim_height);
            } else {
                log::warn!("canvas has no room to draw; frames are skipped until it grows");
            }
            self.canvas_available = available;
        }
    }
}

/// Map a terminal cell to surface coordinates (centre of the cell's dot block),
/// or None if the cell lies outside the canvas.
pub fn pointer_from_cell(column: u16, row: u16, canvas: Rect) -> Option<Vec2> {
    let inside = column >= canvas.x
        && column < canvas.x + canvas.width
        && row >= canvas.y
        && row < canvas.y + canvas.height;
    if !inside {
        return None;
    }
    Some(Vec2::new(
        (column - canvas.x) as f32 * 2.0 + 1.0,
        (row - canvas.y) as f32 * 4.0 + 2.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_NUM_PARTICLES;

    fn test_app() -> App {
        let simulation = Simulation::with_seed(200.0, 120.0, 11);
        let mut app = App::with_parts(simulation, PresetManager::with_dir(None));
        app.config_path = None;
        app
    }

    #[test]
    fn test_starts_with_default_group() {
        let app = test_app();
        assert_eq!(app.simulation.groups().len(), 1);
        assert_eq!(app.simulation.particles().len(), DEFAULT_NUM_PARTICLES);
        assert_eq!(*app.selected(), ControlSnapshot::default());
    }

    #[test]
    fn test_adjust_parameters_through_focus() {
        let mut app = test_app();
        app.focus = Focus::Particles;
        for _ in 0..10 {
            app.adjust_focused_up();
        }
        app.focus = Focus::Size;
        for _ in 0..4 {
            app.adjust_focused_up();
        }
        app.focus = Focus::Velocity;
        app.adjust_focused_up();
        app.adjust_focused_up();
        app.focus = Focus::Radius;
        for _ in 0..5 {
            app.adjust_focused_up();
        }

        let selected = *app.selected();
        assert_eq!(selected.num_particles, 200);
        assert_eq!(selected.particle_size, 5.0);
        assert_eq!(selected.max_velocity, 3.0);
        assert_eq!(selected.interaction_radius, 150.0);
        assert_eq!(app.simulation.particles().len(), 200);
        let settings = app.simulation.group(GroupId(0)).unwrap().settings();
        assert_eq!(settings.velocity_bound, 3.0);
        assert_eq!(settings.size, 5.0);
    }

    #[test]
    fn test_rejected_edit_keeps_previous_values() {
        let mut app = test_app();
        let bad = ControlSnapshot {
            particle_size: -3.0,
            num_particles: 5,
            ..*app.selected()
        };
        assert!(app.apply_selected(bad).is_err());
        assert_eq!(*app.selected(), ControlSnapshot::default());
        assert_eq!(app.simulation.particles().len(), DEFAULT_NUM_PARTICLES);
        assert!(app.status.as_deref().unwrap_or("").contains("particle_size"));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut app = test_app();
        app.apply_preset(1); // Twin Swarms
        app.focus = Focus::Velocity;
        app.adjust_focused_up();
        app.toggle_gravity();
        app.toggle_glow();
        app.increase_speed();

        app.reset();
        let selected = *app.selected();
        assert_eq!(selected.num_particles, 100);
        assert_eq!(selected.particle_size, 3.0);
        assert_eq!(selected.max_velocity, 2.0);
        assert_eq!(selected.interaction_radius, 100.0);
        assert!(!selected.gravity_enabled && !selected.glow_enabled);
        assert_eq!(app.config.groups.len(), 1);
        assert_eq!(app.simulation.groups().len(), 1);
        assert_eq!(app.simulation.particles().len(), 100);
        assert_eq!(app.config.steps_per_frame, 1);
    }

    #[test]
    fn test_presets_create_groups_and_group_focus_cycles() {
        let mut app = test_app();
        app.apply_preset(1);
        assert_eq!(app.preset_name(), "Twin Swarms");
        assert_eq!(app.simulation.groups().len(), 2);
        assert_eq!(app.simulation.group_len(GroupId(0)), 80);
        assert_eq!(app.simulation.group_len(GroupId(1)), 80);

        app.focus = Focus::Group;
        app.adjust_focused_up();
        assert_eq!(app.selected_group, 1);
        assert_eq!(app.selected().max_velocity, 3.0);

        app.focus = Focus::Velocity;
        app.adjust_focused_down();
        assert_eq!(app.config.groups[1].max_velocity, 2.5);
        assert_eq!(app.config.groups[0].max_velocity, 1.0);

        app.prev_preset();
        assert_eq!(app.simulation.groups().len(), 1);
        assert_eq!(app.selected_group, 0);
    }

    #[test]
    fn test_toggles_update_group_settings() {
        let mut app = test_app();
        app.toggle_gravity();
        app.toggle_glow();
        app.cycle_color();
        let settings = *app.simulation.group(GroupId(0)).unwrap().settings();
        assert!(settings.gravity_enabled);
        assert!(settings.glow_enabled);
        assert_eq!(app.selected().color_name(), "Blue");
        assert_eq!(settings.color, app.selected().color);
    }

    #[test]
    fn test_tick_runs_steps_per_frame() {
        let mut app = test_app();
        app.increase_speed();
        app.increase_speed();
        app.tick();
        assert_eq!(app.simulation.frame, 3);
        for _ in 0..20 {
            app.increase_speed();
        }
        assert_eq!(app.config.steps_per_frame, MAX_STEPS_PER_FRAME);
    }

    #[test]
    fn test_focus_cycles_through_all_params() {
        let mut focus = Focus::Controls;
        for _ in 0..Focus::PARAMS.len() {
            focus = focus.next();
            assert!(focus.is_param());
        }
        assert_eq!(focus, Focus::Velocity);
        assert_eq!(focus.next(), Focus::Alpha);
        assert_eq!(Focus::Alpha.prev(), Focus::Velocity);
        assert_eq!(Focus::Group.line_index(), 5);
    }

    #[test]
    fn test_pointer_mapping() {
        let canvas = Rect::new(10, 1, 20, 10);
        assert_eq!(pointer_from_cell(10, 1, canvas), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(pointer_from_cell(12, 3, canvas), Some(Vec2::new(5.0, 10.0)));
        assert_eq!(pointer_from_cell(9, 3, canvas), None);
        assert_eq!(pointer_from_cell(30, 3, canvas), None);
        assert_eq!(pointer_from_cell(12, 11, canvas), None);

        let mut app = test_app();
        app.set_pointer(pointer_from_cell(12, 3, canvas));
        assert_eq!(app.simulation.pointer(), Some(Vec2::new(5.0, 10.0)));
    }

    #[test]
    fn test_canvas_availability_tracks_resize() {
        let mut app = test_app();
        assert!(app.canvas_available);
        app.resize(0, 10);
        assert!(!app.canvas_available);
        app.tick();
        assert_eq!(app.simulation.frame, 1);
        app.resize(0, 0);
        assert!(!app.canvas_available);
        app.resize(40, 20);
        assert!(app.canvas_available);
        assert_eq!(app.simulation.width, 80.0);
    }

    #[test]
    fn test_export_without_path_reports_status() {
        let mut app = test_app();
        app.export_config();
        assert!(app.status.is_some());

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        app.config_path = Some(path.clone());
        app.export_config();
        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, app.config);
    }
}
