//! Plan, channel, discounts and family group step

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::field_line;
use crate::quoter::QuoteWorkflow;
use crate::ui::quoter::{ConfigItem, QuoterScreen};

/// Placeholder for an unset selector
const UNSET: &str = "Seleccione...";

impl QuoterScreen {
    pub(crate) fn render_configure_step(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let items = self.config_items();
        let focused = items.get(self.focus()).copied();
        let (terms, family): (Vec<_>, Vec<_>) = items.iter().copied().partition(|item| {
            !matches!(item, ConfigItem::MemberRole(_) | ConfigItem::MemberAge(_))
        });

        let term_lines: Vec<Line> = terms
            .into_iter()
            .map(|item| {
                let (label, value) = describe(self.workflow(), item);
                field_line(&label, value, Some(item) == focused, true)
            })
            .collect();
        frame.render_widget(
            Paragraph::new(term_lines).block(
                Block::default()
                    .title(" Plan y condiciones ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            chunks[0],
        );

        let mut family_lines = Vec::new();
        for (index, member) in self.workflow().family().members().iter().enumerate() {
            let role = member.role.map(|r| r.label()).unwrap_or(UNSET).to_string();
            let role_item = ConfigItem::MemberRole(index);
            let editable = family.contains(&role_item);
            family_lines.push(field_line(
                &format!("{}. Parentesco", index + 1),
                role,
                Some(role_item) == focused,
                editable,
            ));
            let age_item = ConfigItem::MemberAge(index);
            let age = member.age.map(|a| a.to_string()).unwrap_or_default();
            family_lines.push(field_line("   Edad", age, Some(age_item) == focused, true));
        }
        frame.render_widget(
            Paragraph::new(family_lines).block(
                Block::default()
                    .title(" Grupo familiar [+] agregar [-] quitar ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            chunks[1],
        );
    }
}

fn describe(wf: &QuoteWorkflow, item: ConfigItem) -> (String, String) {
    let config = wf.config();
    match item {
        ConfigItem::Plan => {
            let value = match wf.selected_plan() {
                Some(plan) => plan.nombre.clone(),
                None if wf.plans_loading() => "Cargando planes...".to_string(),
                None => UNSET.to_string(),
            };
            ("Plan".to_string(), value)
        }
        ConfigItem::Channel => (
            "Tipo de ingreso".to_string(),
            config
                .channel
                .map(|c| c.to_string())
                .unwrap_or_else(|| UNSET.to_string()),
        ),
        ConfigItem::Contribution => (
            "Aporte obra social".to_string(),
            config
                .employer_contribution
                .map(|d| d.to_string())
                .unwrap_or_default(),
        ),
        ConfigItem::Category => (
            "Categoría monotributo".to_string(),
            config
                .monotributo_category
                .clone()
                .unwrap_or_else(|| UNSET.to_string()),
        ),
        ConfigItem::Dependents => (
            "Adherentes".to_string(),
            config.monotributo_dependents.to_string(),
        ),
        ConfigItem::Discount(kind) => (kind.label().to_string(), format!("{}%", wf.discount(kind))),
        ConfigItem::MemberRole(_) | ConfigItem::MemberAge(_) => (String::new(), String::new()),
    }
}
