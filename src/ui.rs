use crate::app::{App, Focus};
use crate::braille::{BrailleCell, BrailleSurface};
use crate::particle::GroupId;
use crate::simulation::SimulationState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

const STATUS_HEIGHT: u16 = 6;
const PARAMS_HEIGHT: u16 = Focus::PARAMS.len() as u16 + 2;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 50;

const CONTROLS: [(&str, &str); 17] = [
    ("Space", "pause/resume"),
    ("Tab", "next parameter"),
    ("↑/↓", "adjust"),
    ("R", "reset defaults"),
    ("G", "gravity"),
    ("L", "glow"),
    ("C", "color"),
    ("I", "pair interaction"),
    ("B", "edges"),
    ("P", "next preset"),
    ("S", "save preset"),
    ("X", "export config"),
    ("+/-", "speed"),
    ("V", "fullscreen"),
    ("H", "help"),
    ("Mouse", "push particles"),
    ("Q", "quit"),
];

pub const CONTROLS_CONTENT_LINES: u16 = CONTROLS.len() as u16;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Canvas drawing area (inside the border) for a given frame area
pub fn get_canvas_area(frame_area: Rect, fullscreen: bool) -> Rect {
    let sidebar = if fullscreen { 0 } else { SIDEBAR_WIDTH.min(frame_area.width) };
    let outer = Rect {
        x: frame_area.x + sidebar,
        y: frame_area.y,
        width: frame_area.width - sidebar,
        height: frame_area.height,
    };
    Block::default().borders(Borders::ALL).inner(outer)
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    let canvas = get_canvas_area(frame_area, fullscreen);
    (canvas.width, canvas.height)
}

/// Visible lines in the controls box for a given terminal height
pub fn get_controls_visible_lines(terminal_height: u16) -> u16 {
    terminal_height
        .saturating_sub(STATUS_HEIGHT + PARAMS_HEIGHT)
        .saturating_sub(2)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Length(PARAMS_HEIGHT),
            Constraint::Min(6), // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Particle Playground ");
    let sim = &app.simulation;

    let (status_text, status_color) = if sim.paused {
        ("PAUSED", HIGHLIGHT_COLOR)
    } else {
        match sim.state() {
            SimulationState::Idle => ("IDLE", DIM_TEXT_COLOR),
            SimulationState::Running => ("RUNNING", Color::Green),
        }
    };

    let pointer = match sim.pointer() {
        Some(p) => format!("{:.0},{:.0}", p.x, p.y),
        None => "-".to_string(),
    };

    let content = vec![
        Line::from(vec![
            Span::styled(status_text, Style::default().fg(status_color)),
            Span::styled(
                format!("  {} pts", sim.particles().len()),
                Style::default().fg(TEXT_COLOR),
            ),
        ]),
        Line::from(Span::styled(
            format!("frame {}  ptr {}", sim.frame, pointer),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(Span::styled(
            format!(
                "{} of {}",
                sim.group(GroupId(app.selected_group))
                    .map(|g| g.name.as_str())
                    .unwrap_or("-"),
                app.config.groups.len()
            ),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(Span::styled(
            app.status.clone().unwrap_or_default(),
            Style::default().fg(HIGHLIGHT_COLOR),
        )),
    ];

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn on_off(value: bool) -> String {
    if value { "On" } else { "Off" }.to_string()
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |focus: Focus, value: String| {
        let focused = app.focus == focus;
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, focus.label(), value), style))
    };

    let snapshot = app.selected();

    let content: Vec<Line> = Focus::PARAMS
        .iter()
        .map(|&focus| {
            let value = match focus {
                Focus::Alpha => format!("{:.1}", snapshot.color.a),
                Focus::Boundary => snapshot.boundary.name().to_string(),
                Focus::Color => snapshot.color_name(),
                Focus::Glow => on_off(snapshot.glow_enabled),
                Focus::Gravity => on_off(snapshot.gravity_enabled),
                Focus::Group => format!("{}", app.selected_group + 1),
                Focus::Interaction => snapshot.interaction.name().to_string(),
                Focus::Particles => format!("{}", snapshot.num_particles),
                Focus::Preset => app.preset_name().to_string(),
                Focus::Radius => format!("{:.0}", snapshot.interaction_radius),
                Focus::Size => format!("{:.1}", snapshot.particle_size),
                Focus::Speed => format!("{}", app.config.steps_per_frame),
                Focus::Velocity => format!("{:.1}", snapshot.max_velocity),
                Focus::None | Focus::Controls => String::new(),
            };
            make_line(focus, value)
        })
        .collect();

    let scroll = follow_focus(app.focus.line_index(), area.height, content.len());
    let paragraph = Paragraph::new(content).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Scroll offset that keeps `line` inside a bordered box of `height`
fn follow_focus(line: u16, height: u16, lines: usize) -> u16 {
    let visible = height.saturating_sub(2);
    if visible == 0 || visible as usize >= lines {
        0
    } else {
        line.saturating_sub(visible - 1)
    }
}

/// `scrolling` when `lines` overflow a bordered box of `height`, else `plain`
fn scroll_title<'a>(lines: usize, height: u16, plain: &'a str, scrolling: &'a str) -> &'a str {
    if lines > height.saturating_sub(2) as usize {
        scrolling
    } else {
        plain
    }
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let content: Vec<Line> = CONTROLS
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("{:>5}", key), key_style),
                Span::styled(format!(" {}", desc), desc_style),
            ])
        })
        .collect();

    let title = scroll_title(content.len(), area.height, " Controls ", " Controls (↑↓) ");
    let paragraph = Paragraph::new(content)
        .block(styled_block(title))
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut surface = BrailleSurface::new(inner.width, inner.height);
    if let Err(e) = app.simulation.render(&mut surface) {
        log::debug!("skipping frame: {}", e);
        return;
    }

    frame.render_widget(Paragraph::new(canvas_lines(&surface.cells())), inner);
}

/// One line per canvas row, padding the gaps between lit cells with spaces
fn canvas_lines(cells: &[BrailleCell]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut row: Vec<Span<'static>> = Vec::new();
    let (mut row_y, mut column) = (0u16, 0u16);

    for cell in cells {
        while row_y < cell.y {
            lines.push(Line::from(std::mem::take(&mut row)));
            row_y += 1;
            column = 0;
        }
        if cell.x > column {
            row.push(Span::raw(" ".repeat((cell.x - column) as usize)));
        }
        row.push(Span::styled(cell.char.to_string(), Style::default().fg(cell.color)));
        column = cell.x + 1;
    }
    lines.push(Line::from(row));
    lines
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Centred over the canvas, not the whole terminal
    let canvas = get_canvas_area(area, app.fullscreen_mode);
    let help_width = 56.min(canvas.width.saturating_sub(2));
    let help_height = 36.min(area.height.saturating_sub(4));
    let help_area = Rect::new(
        canvas.x + canvas.width.saturating_sub(help_width) / 2,
        area.y + area.height.saturating_sub(help_height) / 2,
        help_width,
        help_height,
    );

    // Clear the background
    frame.render_widget(Clear, help_area);

    let heading = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(HIGHLIGHT_COLOR)));
    let item = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(TEXT_COLOR)));

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("PARTICLE PLAYGROUND", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Particles drift inside the canvas, leave short trails, and scatter away from the mouse pointer."),
        Line::from(""),
        heading("PARAMETERS (Tab, then ↑/↓):"),
        item("Count - particles in the selected group"),
        item("Size - draw radius"),
        item("Velocity - max speed per axis"),
        item("Radius - pointer/neighbour interaction distance"),
        item("Color, Alpha - particle colour and transparency"),
        item("Gravity, Glow - force and visual effect toggles"),
        item("Edges - Bounce (reflect) or Wrap (toroidal)"),
        item("Pairs - Off, Repel or Attract neighbours"),
        item("Group - which group the controls edit"),
        item("Preset - load a built-in or saved setup"),
        Line::from(""),
        heading("FILES:"),
        Line::from("S saves the current setup as a user preset; X exports it as a config file usable with --config."),
        Line::from(""),
        heading("BASIC CONTROLS:"),
        Line::from("Space=Pause, R=Reset, G=Gravity, L=Glow, C=Color, P=Preset, V=Fullscreen, +/-=Speed, Q=Quit"),
        Line::from(""),
    ];

    let title = scroll_title(
        content.len(),
        help_height,
        " Help (H to close) ",
        " Help (J/K scroll, H to close) ",
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::PresetManager;
    use crate::simulation::Simulation;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_canvas_area_excludes_sidebar_and_border() {
        let frame = Rect::new(0, 0, 100, 40);
        assert_eq!(get_canvas_area(frame, false), Rect::new(SIDEBAR_WIDTH + 1, 1, 100 - SIDEBAR_WIDTH - 2, 38));
        assert_eq!(get_canvas_area(frame, true), Rect::new(1, 1, 98, 38));
        assert_eq!(get_canvas_size(Rect::new(0, 0, 10, 2), false), (0, 0));
    }

    #[test]
    fn test_render_draws_particles_and_sidebar() {
        let area = Rect::new(0, 0, 80, 30);
        let (w, h) = get_canvas_size(area, false);
        let simulation = Simulation::with_seed(w as f32 * 2.0, h as f32 * 4.0, 5);
        let mut app = App::with_parts(simulation, PresetManager::with_dir(None));

        let mut terminal = Terminal::new(TestBackend::new(area.width, area.height)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let canvas = get_canvas_area(area, false);
        let mut braille = 0;
        for y in canvas.y..canvas.y + canvas.height {
            for x in canvas.x..canvas.x + canvas.width {
                let symbol = buffer[(x, y)].symbol();
                if symbol.chars().any(|c| ('\u{2801}'..='\u{28FF}').contains(&c)) {
                    braille += 1;
                }
            }
        }
        assert!(braille > 0);

        app.show_help = true;
        app.fullscreen_mode = true;
        terminal.draw(|frame| render(frame, &app)).unwrap();
    }

    #[test]
    fn test_canvas_lines_pad_gaps() {
        let cells = [
            BrailleCell { x: 2, y: 0, char: '⠁', color: Color::Red },
            BrailleCell { x: 0, y: 2, char: '⠂', color: Color::Blue },
            BrailleCell { x: 1, y: 2, char: '⠄', color: Color::Blue },
        ];
        let lines = canvas_lines(&cells);
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(text, vec!["  ⠁", "", "⠂⠄"]);
    }

    #[test]
    fn test_render_survives_tiny_terminal() {
        let simulation = Simulation::with_seed(0.0, 0.0, 5);
        let app = App::with_parts(simulation, PresetManager::with_dir(None));
        let mut terminal = Terminal::new(TestBackend::new(10, 3)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
    }
}
