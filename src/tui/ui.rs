//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::bits::{Bit, BitWord};
use crate::asm::disasm::split_fields;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(60),
        ])
        .split(frame.area());

    // Left side: registers and clock
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(19),
            Constraint::Length(4),
        ])
        .split(chunks[0]);

    draw_registers(frame, left_chunks[0], app);
    draw_help(frame, left_chunks[1]);

    // Right side: program store and status
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(18),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(chunks[1]);

    draw_program(frame, right_chunks[0], app);
    draw_input(frame, right_chunks[1], app);
    draw_status(frame, right_chunks[2], app);
}

/// Draw the register file and clock with colored bits.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = app.machine.registers().values();

    let mut content: Vec<Line> = regs
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let mut spans = vec![Span::raw(format!("R{:<3} ", i))];
            spans.extend(bit_spans(value));
            spans.push(Span::styled(
                format!("  = {:>2}", value.to_u32()),
                Style::default().fg(Color::DarkGray),
            ));
            Line::from(spans)
        })
        .collect();

    let clock = app.machine.clock().value();
    let mut clk = vec![Span::styled("CLK  ", Style::default().fg(Color::Yellow))];
    clk.extend(bit_spans(&clock));
    clk.push(Span::styled(format!("  = {:>2}", clock.to_u32()), Style::default().fg(Color::Yellow)));
    content.push(Line::from(clk));

    content.push(Line::from(vec![
        Span::raw("Cycles: "),
        Span::styled(format!("{}", app.machine.cycles()), Style::default().fg(Color::Cyan)),
        Span::raw("   State: "),
        if app.running {
            Span::styled("Running", Style::default().fg(Color::Green))
        } else {
            Span::styled("Stopped", Style::default().fg(Color::Red))
        },
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw the program store with disassembly.
fn draw_program(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let words = app.machine.program().words();

    let items: Vec<ListItem> = app
        .get_disassembly()
        .into_iter()
        .map(|(addr, text, is_current)| {
            let prefix = if is_current { "▶" } else { " " };
            let bp = if app.breakpoints.contains(&addr) { "●" } else { " " };
            let word = &words[addr as usize];
            let line = format!("{}{} P{:<2} {}  {}", bp, prefix, addr, split_fields(word), text);

            let style = if is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(&addr) {
                Style::default().fg(Color::Red)
            } else if word.is_zero() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };

            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Program ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw the last executed instruction.
fn draw_input(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let input = Paragraph::new(app.last_instruction_text())
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default()
            .title(" Last instruction ")
            .borders(Borders::ALL));

    frame.render_widget(input, area);
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
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// One span per bit, ones highlighted.
fn bit_spans<const N: usize>(word: &BitWord<N>) -> Vec<Span<'static>> {
    word.bits()
        .iter()
        .map(|b| Span::styled(format!("[{}]", b), bit_style(*b)))
        .collect()
}

/// Get color style for a bit.
fn bit_style(b: Bit) -> Style {
    match b {
        Bit::Zero => Style::default().fg(Color::Gray),
        Bit::One => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    }
}
