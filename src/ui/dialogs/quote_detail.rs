//! Read-only view of a stored quote

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use rust_decimal::Decimal;

use super::centered_rect;
use crate::types::{format_date, IncomeChannel, QuoteRecord, Relationship};
use crate::ui::quoter::money;

/// Keys that dismiss the detail view
pub fn closes_detail(key: KeyCode) -> bool {
    matches!(
        key,
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('v')
    )
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<18}", label), Style::default().fg(Color::Gray)),
        Span::raw(value),
    ])
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// Client, plan configuration and family group
pub(crate) fn profile_lines(record: &QuoteRecord) -> Vec<Line<'static>> {
    let client = &record.cliente;
    let mut lines = vec![
        heading("Datos del Cliente"),
        Line::from(Span::styled(
            format!("  {} {}", client.nombres, client.apellidos),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        field("DNI", or_dash(&client.dni)),
        field("Ciudad", or_dash(client.locality())),
        field("Email", or_dash(&client.email)),
        Line::from(""),
        heading("Configuración"),
        field("Plan", record.plan_nombre.clone().unwrap_or_else(|| "-".to_string())),
        field(
            "Tipo de ingreso",
            record.tipo_ingreso.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
        ),
        field(
            "Estado",
            record.estado.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
        ),
        field("F. creación", format_date(record.fecha_creacion.as_ref())),
        field("F. vencimiento", format_date(record.fecha_vencimiento.as_ref())),
    ];
    match record.tipo_ingreso {
        Some(IncomeChannel::Obligatory) => lines.push(field(
            "Aporte OS",
            money(record.aporte_obra_social.unwrap_or_default()),
        )),
        Some(IncomeChannel::SelfEmployed) => lines.push(field(
            "Monotributo",
            format!(
                "Cat. {} | Adherentes {}",
                record.monotributo_categoria.as_deref().unwrap_or("-"),
                record.monotributo_adherentes.unwrap_or(0)
            ),
        )),
        _ => {}
    }

    lines.push(Line::from(""));
    lines.push(heading(&format!(
        "Grupo Familiar ({} integrantes)",
        record.miembros.len()
    )));
    for member in &record.miembros {
        let style = if member.parentesco == Relationship::Holder {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<10}", member.parentesco.to_string()), style),
            Span::raw(format!("{:>3} años  ", member.edad)),
            Span::raw(money(member.valor_individual.unwrap_or_default())),
        ]));
    }
    lines
}

fn deduction(label: String, value: Option<Decimal>) -> Option<Line<'static>> {
    let value = value.filter(|v| *v > Decimal::ZERO)?;
    Some(Line::from(vec![
        Span::styled(format!("  {:<26}", label), Style::default().fg(Color::Green)),
        Span::styled(format!("-{}", money(value)), Style::default().fg(Color::Green)),
    ]))
}

fn pct(value: Option<Decimal>) -> String {
    format!("{}%", value.unwrap_or_default().normalize())
}

/// Base value, the deductions that apply, and the total
pub(crate) fn economics_lines(record: &QuoteRecord) -> Vec<Line<'static>> {
    let mut lines = vec![
        heading("Detalle Económico"),
        field("Valor base plan", money(record.valor_base_plan.unwrap_or_default())),
        Line::from(""),
    ];
    lines.extend(
        [
            deduction(
                format!("Desc. Comercial ({})", pct(record.descuento_comercial_pct)),
                record.valor_descuento_comercial,
            ),
            deduction(
                format!("Desc. Afinidad ({})", pct(record.descuento_afinidad_pct)),
                record.valor_descuento_afinidad,
            ),
            deduction(
                format!("Desc. Tarjeta ({})", pct(record.descuento_tarjeta_pct)),
                record.valor_descuento_tarjeta,
            ),
            deduction("Aportes Obra Social".to_string(), record.valor_aportes_estimados),
            deduction("Aporte Monotributo".to_string(), record.valor_aporte_monotributo),
        ]
        .into_iter()
        .flatten(),
    );
    if record.tipo_ingreso == Some(IncomeChannel::Voluntary) {
        if let Some(iva) = record.valor_iva.filter(|v| *v > Decimal::ZERO) {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<26}", "IVA (10.5%)"), Style::default().fg(Color::Gray)),
                Span::raw(format!("+{}", money(iva))),
            ]));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(
            "  TOTAL FINAL  ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            money(record.valor_total.unwrap_or_default()),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    lines
}

pub fn render_quote_detail(frame: &mut Frame, record: &QuoteRecord) {
    let area = centered_rect(85, 80, frame.area());
    frame.render_widget(Clear, area);

    let title = match record.id {
        Some(id) => format!(" Detalle de Cotización N° {} ", id),
        None => " Detalle de Cotización ".to_string(),
    };
    let block = Block::default()
        .title(Line::from(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(1)])
        .margin(1)
        .split(inner);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[0]);

    frame.render_widget(
        Paragraph::new(profile_lines(record)).wrap(Wrap { trim: false }),
        columns[0],
    );
    frame.render_widget(
        Paragraph::new(economics_lines(record)).block(
            Block::default()
                .borders(Borders::LEFT)
                .border_style(Style::default().fg(Color::DarkGray)),
        ),
        columns[1],
    );
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
            Span::styled(" Cerrar", Style::default().fg(Color::DarkGray)),
        ]))
        .alignment(Alignment::Center),
        rows[1],
    );
}
