//! Review of the server-computed figures

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use rust_decimal::Decimal;

use crate::ui::quoter::{money, QuoterScreen};

fn figure(label: &str, value: Option<Decimal>) -> Option<Line<'static>> {
    let value = value?;
    Some(Line::from(vec![
        Span::styled(format!("  {:<28}", label), Style::default().fg(Color::Gray)),
        Span::raw(money(value)),
    ]))
}

impl QuoterScreen {
    pub(crate) fn render_summary_step(&self, frame: &mut Frame, area: Rect) {
        let wf = self.workflow();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let client = wf.client();
        let config = wf.config();
        let mut left = vec![
            Line::from(Span::styled(
                client.full_name(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("DNI {}", client.dni)),
            Line::from(client.email.clone()),
            Line::from(""),
            Line::from(format!(
                "Plan: {}",
                wf.selected_plan().map(|p| p.nombre.as_str()).unwrap_or("-")
            )),
            Line::from(format!(
                "Tipo de ingreso: {}",
                config.channel.map(|c| c.to_string()).unwrap_or_default()
            )),
            Line::from(""),
            Line::from(Span::styled("Integrantes", Style::default().fg(Color::Cyan))),
        ];

        let Some(calculated) = wf.calculated() else {
            frame.render_widget(Paragraph::new(left), area);
            return;
        };
        for member in &calculated.members {
            let price = member.individual_value.map(money).unwrap_or_default();
            left.push(Line::from(format!(
                "  {} ({} años)  {}",
                member.role, member.age, price
            )));
        }
        frame.render_widget(
            Paragraph::new(left).block(
                Block::default()
                    .title(" Cliente ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            chunks[0],
        );

        let f = &calculated.figures;
        let youth = f
            .youth_discount_pct
            .map(|pct| format!("Descuento joven ({}%)", pct.normalize()))
            .unwrap_or_else(|| "Descuento joven".to_string());
        let mut right: Vec<Line> = [
            figure("Valor base del plan", f.base_plan_value),
            figure("Descuento comercial", f.commercial_discount_value),
            figure("Descuento afinidad", f.affinity_discount_value),
            figure("Descuento tarjeta", f.card_discount_value),
            figure(&youth, f.youth_discount_value),
            figure("Aportes estimados", f.estimated_contributions),
            figure("Aporte monotributo", f.monotributo_contribution),
            figure("IVA", f.vat),
        ]
        .into_iter()
        .flatten()
        .collect();
        right.push(Line::from(""));
        right.push(Line::from(vec![
            Span::styled(
                format!("  {:<28}", "TOTAL"),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                money(f.total),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        right.push(Line::from(""));
        right.push(Line::from(vec![
            Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
            Span::styled(
                if wf.is_edit_mode() {
                    " Guardar cambios"
                } else {
                    " Generar cotización"
                },
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        frame.render_widget(
            Paragraph::new(right).block(
                Block::default()
                    .title(" Detalle ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            chunks[1],
        );
    }
}
