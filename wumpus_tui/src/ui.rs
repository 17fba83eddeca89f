use ratatui::{prelude::*, widgets::*};
use wumpus_core::{Agent, Content, Direction, GameState, Percept, Position};

use crate::app::App;

/// Renders the user interface.
pub fn ui(frame: &mut Frame, app: &App) {
    let [body, message, help] = Layout::vertical([
        Constraint::Min(6),
        Constraint::Length(3),
        Constraint::Length(2),
    ])
    .areas(frame.area());
    let [map, panel] =
        Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)]).areas(body);

    render_map(frame, map, app);
    render_status(frame, panel, &app.agent);
    render_message(frame, message, app);

    let help_text = Paragraph::new("Arrows/WASD move  Space shoot  +/- size  r restart  h help  q quit")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, help);

    if app.show_help {
        render_help(frame, centered(frame.area(), 60, 60));
    }
}

fn facing_glyph(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => " ^ ",
        Direction::Down => " v ",
        Direction::Left => " < ",
        Direction::Right => " > ",
    }
}

/// One map cell: three characters wide so the grid reads roughly square.
fn cell_span(app: &App, pos: Position) -> Span<'static> {
    let agent = &app.agent;
    let world = agent.world();

    if pos == agent.position() {
        let style = match agent.state() {
            GameState::DeadByMonster | GameState::DeadByPit => Style::default().fg(Color::Red),
            GameState::Won => Style::default().fg(Color::Green),
            GameState::Playing => Style::default().fg(Color::Cyan),
        };
        return Span::styled(facing_glyph(agent.facing()), style.bold());
    }
    if app.arrow.as_ref().is_some_and(|a| a.visible().contains(&pos)) {
        return Span::styled(" * ", Style::default().fg(Color::White).bold());
    }

    let revealed = agent.is_over() || agent.explored().contains(&pos);
    if !revealed {
        return Span::styled(" . ", Style::default().fg(Color::DarkGray));
    }
    if world.monster_remains() == Some(pos) {
        return Span::styled(" x ", Style::default().fg(Color::Magenta));
    }

    match world.content_at(pos) {
        Content::Wumpus => Span::styled(" W ", Style::default().fg(Color::Red).bold()),
        Content::Gold => Span::styled(" G ", Style::default().fg(Color::Yellow).bold()),
        Content::Arrow => Span::styled(" A ", Style::default().fg(Color::Cyan)),
        Content::Pit => Span::styled(" O ", Style::default().fg(Color::Blue)),
        Content::Empty if pos == world.entry() => {
            Span::styled(" E ", Style::default().fg(Color::Green))
        }
        Content::Empty => Span::raw("   "),
    }
}

/// Renders the world grid onto the frame.
fn render_map(frame: &mut Frame, area: Rect, app: &App) {
    let size = app.agent.world().size();
    let lines: Vec<Line> = (0..size)
        .map(|row| {
            let spans: Vec<Span> = (0..size)
                .map(|col| cell_span(app, Position::new(row, col)))
                .collect();
            Line::from(spans)
        })
        .collect();

    let title = format!("Wumpus World - game {}", app.games_played);
    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(map_paragraph, area);
}

fn percept_span(percept: Percept) -> Span<'static> {
    let color = match percept {
        Percept::Glitter => Color::Yellow,
        Percept::Breeze => Color::Blue,
        Percept::Stench => Color::Red,
    };
    Span::styled(format!("{percept} "), Style::default().fg(color))
}

/// Renders score, inventory and current percepts.
fn render_status(frame: &mut Frame, area: Rect, agent: &Agent) {
    let inventory = agent.inventory();
    let state = match agent.state() {
        GameState::Playing => Span::raw("Exploring"),
        GameState::Won => Span::styled("Escaped with the gold", Style::default().fg(Color::Green)),
        GameState::DeadByMonster => {
            Span::styled("Eaten by the Wumpus", Style::default().fg(Color::Red))
        }
        GameState::DeadByPit => Span::styled("Fell into a pit", Style::default().fg(Color::Red)),
    };
    let yes_no = |held: bool| if held { "yes" } else { "no" };

    let mut percepts: Vec<Span> = vec![Span::raw("Percepts: ")];
    let sensed = agent.percepts();
    if sensed.is_empty() {
        percepts.push(Span::styled("none", Style::default().fg(Color::DarkGray)));
    } else {
        percepts.extend(sensed.iter().map(percept_span));
    }

    let lines = vec![
        Line::from(vec![Span::raw("State: "), state]),
        Line::from(format!("Score: {}", agent.score())),
        Line::from(format!("Turns: {}", agent.turns())),
        Line::from(format!(
            "Position: {}  Facing: {:?}",
            agent.position(),
            agent.facing()
        )),
        Line::from(format!(
            "Gold: {}  Arrow: {}",
            yes_no(inventory.has_gold),
            yes_no(inventory.has_arrow)
        )),
        Line::from(percepts),
        Line::from(format!(
            "Wumpus: {}",
            if agent.world().monster_alive() {
                "somewhere out there"
            } else {
                "dead"
            }
        )),
        Line::from(format!("Explored: {} cells", agent.explored().len())),
    ];

    let status = Paragraph::new(lines)
        .block(Block::default().title("Status").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, area);
}

fn render_message(frame: &mut Frame, area: Rect, app: &App) {
    let text = app.banner.as_ref().map(|b| b.text.as_str()).unwrap_or("");
    let style = match app.agent.state() {
        GameState::Won => Style::default().fg(Color::Green).bold(),
        GameState::DeadByMonster | GameState::DeadByPit => Style::default().fg(Color::Red).bold(),
        GameState::Playing => Style::default(),
    };
    let mut lines = vec![Line::styled(text.to_string(), style)];
    if app.agent.is_over() {
        lines.push(Line::from("Press 'r' to play again."));
    }
    let message = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(message, area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from("Find the gold and carry it back to the entry (E)."),
        Line::from(""),
        Line::from("Breeze  - a pit is next to you"),
        Line::from("Stench  - the Wumpus is next to you"),
        Line::from("Glitter - the gold is right here"),
        Line::from(""),
        Line::from("Pick up the arrow (A) to fight back. Walking into the"),
        Line::from("Wumpus while armed kills it; Space fires the arrow in"),
        Line::from("the direction you face."),
        Line::from(""),
        Line::from("Step -1  Shot -10  Kill +500  Gold +1000  Escape +1000"),
        Line::from(""),
        Line::from("+/- resize random worlds (4 to 8). Esc closes this window."),
    ];
    let popup = Paragraph::new(lines)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

/// A rectangle centred in `area`, sized as a percentage of it.
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, centre, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    centre
}
