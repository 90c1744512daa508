//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem, Wrap},
    style::{Color, Style, Modifier},
};
use crate::cpu::CpuState;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    // Left side: program, console and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_program(frame, left_chunks[0], app);
    draw_console(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: registers, memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(14),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_registers(frame, right_chunks[0], app);
    draw_memory(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw the validated program with the step cursor.
fn draw_program(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let items: Vec<ListItem> = app
        .program_lines()
        .into_iter()
        .map(|(index, text, is_next)| {
            let prefix = if is_next { "▶ " } else { "  " };
            let style = if is_next {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{:03}: {}", prefix, index, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Program ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the execution trace.
fn draw_console(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let style = if app.cpu.state == CpuState::Faulted {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::White)
    };

    let visible = (area.height as usize).saturating_sub(2);
    let top = app.trace_scroll.saturating_sub(visible.saturating_sub(1));

    let console = Paragraph::new(app.cpu.trace().to_string())
        .style(style)
        .wrap(Wrap { trim: false })
        .scroll((top as u16, 0))
        .block(Block::default()
            .title(" Console ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(console, area);
}

/// Draw every register with its displayed value.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let mut content: Vec<Line> = app
        .cpu
        .regs
        .snapshot()
        .into_iter()
        .map(|reg| {
            let style = if reg.value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(vec![
                Span::raw(format!("{:<4} ", reg.name)),
                Span::styled(format!("{:>6}", reg.value), style),
            ])
        })
        .collect();

    content.push(Line::from(vec![
        Span::raw("Cycles: "),
        Span::styled(format!("{}", app.cpu.cycles), Style::default().fg(Color::Cyan)),
        Span::raw("   State: "),
        Span::styled(format!("{:?}", app.cpu.state), state_style(app.cpu.state)),
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw the variable table at its display addresses.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let items: Vec<ListItem> = app
        .cpu
        .vars
        .snapshot()
        .into_iter()
        .map(|cell| ListItem::new(format!("{}  {:<12} {:>6}", cell.address, cell.name, cell.value)))
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("r: Run  s: Step  x: Stop  l: Reload"),
        Line::from("↑↓: Scroll console  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

fn state_style(state: CpuState) -> Style {
    match state {
        CpuState::Stepping => Style::default().fg(Color::Yellow),
        CpuState::Finished => Style::default().fg(Color::Green),
        CpuState::Faulted | CpuState::Stopped => Style::default().fg(Color::Red),
        CpuState::Idle => Style::default().fg(Color::Gray),
    }
}
