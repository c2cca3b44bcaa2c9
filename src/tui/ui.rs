//! UI rendering for the simulator.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::alu::{Opcode, Severity};
use crate::register::{format_hex, format_nibbles};
use super::app::{Focus, RegisterPanel, SimulatorApp};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &SimulatorApp) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(12),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(20),
            Constraint::Percentage(35),
        ])
        .split(rows[0]);

    // Left: input registers
    let registers = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[0]);

    draw_register(frame, registers[0], app, Focus::Accumulator);
    draw_register(frame, registers[1], app, Focus::Operand);

    // Middle: operation and clock
    let middle = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(6)])
        .split(columns[1]);

    draw_operations(frame, middle[0], app);
    draw_clock(frame, middle[1], app);

    // Right: result and flags
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(4)])
        .split(columns[2]);

    draw_result(frame, right[0], app);
    draw_flags(frame, right[1], app);

    draw_status(frame, rows[1], app);
    draw_help(frame, rows[2]);
}

/// Draw one input register with its bit toggles.
fn draw_register(frame: &mut Frame, area: Rect, app: &SimulatorApp, which: Focus) {
    let (role, panel): (&str, &RegisterPanel) = match which {
        Focus::Accumulator => ("accumulator", &app.acc_panel),
        Focus::Operand => ("operand", &app.op_panel),
    };
    let title = format!(" {} ({}) ", which.register().label(), role);
    let focused = app.focus == which;

    // MSB on the left, like the hardware diagrams
    let mut bit_spans = vec![Span::raw("Bits: ")];
    for index in (0..8).rev() {
        let on = panel.bits[index];
        let mut style = if on {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if focused && index == app.bit_cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        bit_spans.push(Span::styled(if on { "1" } else { "0" }, style));
        bit_spans.push(Span::raw(if index == 4 { "  " } else { " " }));
    }

    let value = crate::register::from_bits(panel.bits);
    let entry = if focused && !app.input.is_empty() {
        format!("{}_", app.input)
    } else {
        panel.text.clone()
    };

    let mut content = vec![
        Line::from(vec![
            Span::raw("Value: "),
            Span::styled(entry, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            Span::raw(format!("   {}", format_hex(value))),
        ]),
        Line::from(bit_spans),
        Line::from(Span::styled("      7 6 5 4  3 2 1 0", Style::default().fg(Color::DarkGray))),
    ];
    if let Some(error) = &panel.error {
        content.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }

    let border = if focused { Color::Yellow } else { Color::Cyan };
    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)));

    frame.render_widget(paragraph, area);
}

/// Draw the operation selector.
fn draw_operations(frame: &mut Frame, area: Rect, app: &SimulatorApp) {
    let items: Vec<ListItem> = Opcode::ALL
        .iter()
        .map(|op| {
            let selected = *op == app.opcode;
            let prefix = if selected { "▶ " } else { "  " };
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{} {}", prefix, op.symbol(), op.mnemonic())).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Operation ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw clock state and the pulse light.
fn draw_clock(frame: &mut Frame, area: Rect, app: &SimulatorApp) {
    let running = app.clock.is_running();
    let pulse = if app.clock.pulse() {
        Span::styled("●", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("○", Style::default().fg(Color::DarkGray))
    };

    let content = vec![
        Line::from(vec![
            Span::styled(
                if running { "RUNNING " } else { "STOPPED " },
                if running {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                },
            ),
            pulse,
        ]),
        Line::from(format!("Every {} ms", app.clock.interval().as_millis())),
        Line::from(format!("Ticks: {}", app.clock.ticks())),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Clock ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(paragraph, area);
}

/// Draw the last result in every base.
fn draw_result(frame: &mut Frame, area: Rect, app: &SimulatorApp) {
    let content = match (app.processor.last_operation(), app.processor.last_output()) {
        (Some(op), Some(out)) => {
            let expr = if op.opcode.is_unary() {
                format!("{}{}", op.opcode.symbol(), op.a)
            } else {
                format!("{} {} {}", op.a, op.opcode.symbol(), op.b)
            };
            vec![
                Line::from(format!("{} =", expr)),
                Line::from(vec![
                    Span::raw(format!("Dec ({}): ", app.view)),
                    Span::styled(
                        app.view.render_decimal(out.result),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(format!("Hex: {}", format_hex(out.result))),
                Line::from(format!("Bin: {}", format_nibbles(out.result))),
            ]
        }
        _ => vec![Line::from(Span::styled("Waiting for an operation...", Style::default().fg(Color::DarkGray)))],
    };

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Result ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw the four flag lights.
fn draw_flags(frame: &mut Frame, area: Rect, app: &SimulatorApp) {
    let flags = app.processor.last_output().map(|out| out.flags).unwrap_or_default();

    let mut spans = Vec::new();
    for (letter, on) in flags.iter() {
        let style = match (on, letter) {
            (true, 'C') | (true, 'V') => Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
            (true, _) => Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD),
            (false, _) => Style::default().fg(Color::DarkGray),
        };
        spans.push(Span::styled(format!(" {} ", letter), style));
        spans.push(Span::raw(" "));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default()
            .title(" Flags ")
            .borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &SimulatorApp) {
    let status = Paragraph::new(app.status.clone())
        .style(severity_style(app.severity))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("0-9/Enter: Type value  Tab: A/B  ←→ Space: Bits  ↑↓ or + - & | ^ ~: Operation"),
        Line::from("x: Execute  u: Use result as A  c: Clock  s: Signed  r: Reset  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Get color style for a status severity.
fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default().fg(Color::Red),
        Severity::Warning => Style::default().fg(Color::Yellow),
        Severity::Zero => Style::default().fg(Color::Green),
        Severity::Normal => Style::default().fg(Color::White),
    }
}
