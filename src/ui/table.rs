//! Paginated table over a [`ListController`], with the filter and page footer

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::pages::{ListController, ListRow};

/// Column layout for a page table
pub struct Columns<'a> {
    pub headers: &'a [&'a str],
    pub widths: &'a [Constraint],
}

/// Footer: filter being typed, page position and the paging keys
pub fn footer_line<T: ListRow>(list: &ListController<T>, filter_editing: bool) -> Line<'static> {
    let mut spans = Vec::new();
    if filter_editing || !list.filter().is_empty() {
        spans.push(Span::styled("Buscar: ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            list.filter().to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));
        if filter_editing {
            spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        }
        spans.push(Span::raw("  "));
    }

    let count = list.visible().len();
    if list.total_pages() <= 1 {
        spans.push(Span::styled(
            format!("{} registros", count),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.extend([
            Span::styled(
                format!("Página {}/{}", list.current_page(), list.total_pages()),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(format!(" ({} registros)", count), Style::default().fg(Color::DarkGray)),
            Span::raw("  "),
            Span::styled("[n]", Style::default().fg(Color::Yellow)),
            Span::styled(" siguiente  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[p]", Style::default().fg(Color::Yellow)),
            Span::styled(" anterior", Style::default().fg(Color::DarkGray)),
        ]);
    }
    Line::from(spans)
}

/// Render the current page of `list`. Rows with a request in flight are dimmed.
pub fn render_table<T, F>(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    list: &ListController<T>,
    columns: &Columns<'_>,
    filter_editing: bool,
    cells: F,
) where
    T: ListRow,
    F: Fn(&T) -> Vec<String>,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let header = Row::new(
        columns
            .headers
            .iter()
            .map(|h| Cell::from(h.to_string()))
            .collect::<Vec<_>>(),
    )
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = list
        .page_rows()
        .into_iter()
        .map(|item| {
            let row = Row::new(cells(item).into_iter().map(Cell::from).collect::<Vec<_>>());
            if list.is_busy(&item.key()) {
                row.style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            } else {
                row
            }
        })
        .collect();
    let empty = rows.is_empty();

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let table = Table::new(rows, columns.widths.to_vec())
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = TableState::default();
    if !empty {
        state.select(Some(list.selected_in_page()));
    }
    frame.render_stateful_widget(table, chunks[0], &mut state);

    frame.render_widget(Paragraph::new(footer_line(list, filter_editing)), chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Item(u32);

    impl ListRow for Item {
        type Key = u32;

        fn key(&self) -> u32 {
            self.0
        }

        fn search_text(&self) -> String {
            self.0.to_string()
        }
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_single_page_footer_shows_count() {
        let mut list = ListController::new(10);
        list.set_items((1..=3).map(Item).collect());
        assert_eq!(text(&footer_line(&list, false)), "3 registros");
    }

    #[test]
    fn test_multi_page_footer_shows_position_and_keys() {
        let mut list = ListController::new(2);
        list.set_items((1..=5).map(Item).collect());
        list.next_page();
        let footer = text(&footer_line(&list, false));
        assert!(footer.starts_with("Página 2/3"));
        assert!(footer.contains("[n]"));
    }

    #[test]
    fn test_filter_shown_while_typing() {
        let mut list = ListController::new(10);
        list.set_items((1..=12).map(Item).collect());
        list.set_filter("1");
        let footer = text(&footer_line(&list, true));
        assert!(footer.starts_with("Buscar: 1_"));
        assert!(footer.ends_with("4 registros"));
    }
}
