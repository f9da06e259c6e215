use chrono::NaiveDate;
use posy_core::{model::DistanceSource, service::EligibleFlorist};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new(format!(
        "posy – florist delivery search · {} florists loaded",
        app.florists.len()
    ))
    .block(Block::default().borders(Borders::ALL).title("Posy"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::AddressSearch => draw_address_search(frame, app, *content_area),
        Screen::FloristView => draw_florist_view(frame, app, *content_area),
    }

    let nav_hint = match app.screen {
        Screen::AddressSearch => {
            "Type to edit · Enter search · ↑/↓ move · Tab/→ find florists · Esc clear · Ctrl-C quit"
        }
        Screen::FloristView => "[/] change date · Esc/←/b back · q/Ctrl-C quit",
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_address_search(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // input
            Constraint::Min(0),    // candidates
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [input_area, results_area] = chunks else {
        return;
    };

    let input = Paragraph::new(app.address_input.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Delivery address (Enter to search)"),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(input, *input_area);

    let items = if app.candidates.is_empty() {
        vec![ListItem::new("No suggestions yet. Type a street address.")]
    } else {
        app.candidates
            .iter()
            .map(|candidate| match &candidate.secondary_text {
                Some(secondary) => ListItem::new(Line::from(vec![
                    Span::styled(
                        candidate.main_text.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(secondary.clone(), Style::default().fg(Color::DarkGray)),
                ])),
                None => ListItem::new(candidate.description.clone()),
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Suggestions (↑/↓, Tab/→ to find florists)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.candidates.is_empty() {
        state.select(Some(app.candidate_index));
    }
    frame.render_stateful_widget(list, *results_area, &mut state);
}

fn draw_florist_view(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let address_label = app
        .resolved_address
        .as_ref()
        .map_or("<address>", |address| address.formatted.as_str());

    let mut title = format!(
        "Florists for {address_label} on {} ({})",
        app.delivery_date.format("%a %d.%m.%Y"),
        relative_day_label(app.delivery_date, App::today())
    );
    if let Some(event) = app.service.calendar().event_on(app.delivery_date) {
        title.push_str(&format!(" · {event}"));
    }

    if app.is_loading {
        let paragraph = Paragraph::new("Checking florists…")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let Some(outcome) = &app.outcome else {
        let paragraph = Paragraph::new("No search has run yet.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    if outcome.florists.is_empty() {
        let message = match outcome.nearest_out_of_range_km {
            Some(km) => format!(
                "No florist can deliver on this date. The nearest florist is {km:.1} km away, outside its delivery radius."
            ),
            None => "No florist can deliver on this date. Try another day with [ or ].".to_owned(),
        };
        let paragraph = Paragraph::new(message)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = outcome.florists.iter().map(|florist| {
        let mut style = Style::default();
        if florist.eligibility.event.is_some() {
            style = style.fg(Color::Magenta);
        }

        Row::new(vec![
            Cell::from(florist.name.clone()),
            Cell::from(distance_label(florist)),
            Cell::from(format!("{} min", florist.estimated_duration_min)),
            Cell::from(florist.eligibility.available_slots.join(", ")),
            Cell::from(fees_label(florist)),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Min(24),
        Constraint::Length(18),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Florist", "Distance", "ETA", "Slots", "Fees"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn distance_label(florist: &EligibleFlorist) -> String {
    match florist.source {
        DistanceSource::Measured => format!("{:.1} km", florist.distance_km),
        // Straight-line estimate, the routing provider was unavailable.
        DistanceSource::Estimated => format!("~{:.1} km", florist.distance_km),
    }
}

fn fees_label(florist: &EligibleFlorist) -> String {
    let eligibility = &florist.eligibility;
    match (eligibility.event, eligibility.delivery_fee_multiplier) {
        (Some(event), Some(multiplier)) => format!("{event} x{multiplier}"),
        (Some(event), None) => event.to_string(),
        _ => "standard".to_owned(),
    }
}

fn relative_day_label(date: NaiveDate, today: NaiveDate) -> String {
    let delta = (date - today).num_days();
    match delta {
        0 => "today".to_owned(),
        1 => "tomorrow".to_owned(),
        days if days > 1 => format!("in {days} days"),
        -1 => "yesterday".to_owned(),
        days => format!("{} days ago", days.abs()),
    }
}
