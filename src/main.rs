mod app;
mod braille;
mod color;
mod config;
mod error;
mod particle;
mod presets;
mod settings;
mod simulation;
mod surface;
mod ui;

use app::{App, Focus};
use clap::Parser;
use color::{Palette, Rgba};
use config::{AppConfig, MAX_PARTICLES};
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use env_logger::{Env, Target};
use error::SimError;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use settings::{BoundaryBehavior, InteractionMode};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "particle-playground")]
#[command(about = "Interactive 2D particle simulation in the terminal")]
struct Args {
    // === Group Parameters (applied to the first group) ===
    /// Number of particles (0-2000)
    #[arg(short = 'p', long)]
    particles: Option<usize>,

    /// Particle draw radius in dots
    #[arg(short = 's', long)]
    size: Option<f32>,

    /// Max speed per axis, in dots per frame
    #[arg(long)]
    velocity: Option<f32>,

    /// Pointer and neighbour interaction radius
    #[arg(long)]
    radius: Option<f32>,

    /// Colour name (cyan, blue, magenta, amber, lime, coral, white) or #rrggbb[aa]
    #[arg(short = 'c', long)]
    color: Option<String>,

    /// Colour alpha (0.0-1.0)
    #[arg(long)]
    alpha: Option<f32>,

    /// Enable gravity
    #[arg(long)]
    gravity: bool,

    /// Enable glow
    #[arg(long)]
    glow: bool,

    /// Edge behavior (bounce, wrap)
    #[arg(long)]
    boundary: Option<String>,

    /// Neighbour interaction (off, repel, attract)
    #[arg(long)]
    interaction: Option<String>,

    // === Setup ===
    /// Start from a named preset (e.g. "Twin Swarms")
    #[arg(long)]
    preset: Option<String>,

    /// Start from an exported config file; X writes back to it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulation speed (steps per frame, 1-10)
    #[arg(long)]
    speed: Option<usize>,

    /// Random seed for reproducible spawns
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn parse_boundary(s: &str) -> Result<BoundaryBehavior, SimError> {
    match s.to_lowercase().as_str() {
        "bounce" | "reflect" => Ok(BoundaryBehavior::Bounce),
        "wrap" | "toroidal" => Ok(BoundaryBehavior::Wrap),
        _ => Err(SimError::invalid("boundary", format!("unknown boundary '{}'", s))),
    }
}

fn parse_interaction(s: &str) -> Result<InteractionMode, SimError> {
    match s.to_lowercase().as_str() {
        "off" | "none" => Ok(InteractionMode::Off),
        "repel" | "separate" => Ok(InteractionMode::Repel),
        "attract" | "flock" => Ok(InteractionMode::Attract),
        _ => Err(SimError::invalid("interaction", format!("unknown interaction '{}'", s))),
    }
}

/// Palette name or hex code
fn parse_color(s: &str) -> Result<Rgba, SimError> {
    let mut entry = Palette::default();
    loop {
        if entry.name().eq_ignore_ascii_case(s.trim()) {
            return Ok(entry.color());
        }
        entry = entry.next();
        if entry == Palette::default() {
            break;
        }
    }
    Rgba::from_hex(s)
}

fn init_logging(path: &Path) -> Result<(), SimError> {
    let file = File::create(path)?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Build the starting configuration from --config/--preset and apply the CLI overrides
fn configure(app: &mut App, args: &Args) -> Result<(), SimError> {
    let mut config = if let Some(path) = &args.config {
        app.config_path = Some(path.clone());
        AppConfig::load_from_file(path)?
    } else if let Some(name) = &args.preset {
        let index = app
            .presets
            .position(name)
            .ok_or_else(|| SimError::invalid("preset", format!("unknown preset '{}'", name)))?;
        app.preset_index = index;
        app.presets
            .get(index)
            .map(|p| p.to_config())
            .unwrap_or_default()
    } else {
        app.config.clone()
    };

    if let Some(speed) = args.speed {
        if !(1..=10).contains(&speed) {
            return Err(SimError::invalid("speed", "must be between 1 and 10"));
        }
        config.steps_per_frame = speed;
    }

    if let Some(group) = config.groups.first_mut() {
        if let Some(particles) = args.particles {
            if particles > MAX_PARTICLES {
                return Err(SimError::invalid(
                    "particles",
                    format!("at most {} particles are supported", MAX_PARTICLES),
                ));
            }
            group.num_particles = particles;
        }
        if let Some(size) = args.size {
            group.particle_size = size;
        }
        if let Some(velocity) = args.velocity {
            group.max_velocity = velocity;
        }
        if let Some(radius) = args.radius {
            group.interaction_radius = radius;
        }
        if let Some(color) = &args.color {
            group.color = parse_color(color)?.with_alpha(group.color.a);
        }
        if let Some(alpha) = args.alpha {
            group.color = group.color.with_alpha(alpha);
        }
        group.gravity_enabled |= args.gravity;
        group.glow_enabled |= args.glow;
        if let Some(boundary) = &args.boundary {
            group.boundary = parse_boundary(boundary)?;
        }
        if let Some(interaction) = &args.interaction {
            group.interaction = parse_interaction(interaction)?;
        }
    }

    app.load_config(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    // Build the app before touching the terminal so bad arguments print cleanly
    let (width, height) = crossterm::terminal::size()?;
    let (canvas_width, canvas_height) = ui::get_canvas_size(Rect::new(0, 0, width, height), false);
    let mut app = App::new(canvas_width, canvas_height, args.seed);
    if let Err(err) = configure(&mut app, &args) {
        log::error!("startup configuration rejected: {}", err);
        eprintln!("Error: {}", err);
        std::process::exit(2);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("terminal error: {}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn frame_rect<B: ratatui::backend::Backend>(terminal: &Terminal<B>) -> Rect {
    let size = terminal.size().unwrap_or_default();
    Rect::new(0, 0, size.width, size.height)
}

fn resize_canvas(app: &mut App, frame: Rect) {
    let (canvas_width, canvas_height) = ui::get_canvas_size(frame, app.fullscreen_mode);
    app.resize(canvas_width, canvas_height);
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        // Render current state
        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for events with timeout
        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    // Handle Ctrl+C
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        // System controls
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.reset(),
                        KeyCode::Char('v') | KeyCode::Char('V') => {
                            app.toggle_fullscreen();
                            resize_canvas(app, frame_rect(terminal));
                        }
                        KeyCode::Char('h') | KeyCode::Char('H') => app.toggle_help(),
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            app.increase_speed();
                            app.focus = Focus::Speed;
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            app.decrease_speed();
                            app.focus = Focus::Speed;
                        }

                        // Group toggles
                        KeyCode::Char('g') | KeyCode::Char('G') => {
                            app.toggle_gravity();
                            app.focus = Focus::Gravity;
                        }
                        KeyCode::Char('l') | KeyCode::Char('L') => {
                            app.toggle_glow();
                            app.focus = Focus::Glow;
                        }
                        KeyCode::Char('c') | KeyCode::Char('C') => {
                            app.cycle_color();
                            app.focus = Focus::Color;
                        }
                        KeyCode::Char('i') | KeyCode::Char('I') => {
                            app.cycle_interaction();
                            app.focus = Focus::Interaction;
                        }
                        KeyCode::Char('b') | KeyCode::Char('B') => {
                            app.cycle_boundary();
                            app.focus = Focus::Boundary;
                        }

                        // Presets and files
                        KeyCode::Char('p') | KeyCode::Char('P') => {
                            app.next_preset();
                            app.focus = Focus::Preset;
                        }
                        KeyCode::Char('s') | KeyCode::Char('S') => app.save_user_preset(),
                        KeyCode::Char('x') | KeyCode::Char('X') => app.export_config(),

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up => {
                            if !app.show_help {
                                if app.focus.is_param() {
                                    app.adjust_focused_up();
                                } else {
                                    app.scroll_controls_up();
                                }
                            }
                        }
                        KeyCode::Down => {
                            if !app.show_help {
                                if app.focus.is_param() {
                                    app.adjust_focused_down();
                                } else {
                                    let visible = ui::get_controls_visible_lines(frame_rect(terminal).height);
                                    app.scroll_controls_down(ui::CONTROLS_CONTENT_LINES.saturating_sub(visible));
                                }
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            }
                        }
                        KeyCode::Char('j') | KeyCode::Char('J') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) | MouseEventKind::Down(_) => {
                        let canvas = ui::get_canvas_area(frame_rect(terminal), app.fullscreen_mode);
                        app.set_pointer(app::pointer_from_cell(mouse.column, mouse.row, canvas));
                    }
                    _ => {}
                },
                Event::FocusLost => app.set_pointer(None),
                Event::Resize(width, height) => {
                    resize_canvas(app, Rect::new(0, 0, width, height));
                }
                _ => {}
            }
        }

        // Run simulation tick
        app.tick();
    }
}
