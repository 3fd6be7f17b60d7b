use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::allocation::ALLOCATION_FRACTION;
use crate::cli::state::{App, FormField, Tab};
use crate::cli::util::fmt_money;
use crate::store::{KeyValueStore, Theme};

pub fn draw<S: KeyValueStore>(f: &mut Frame, app: &mut App<S>) {
    let accent = accent(app.store.theme());
    let size = f.area();

    // top tabs | main content | bottom status bar
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(size);

    let titles = ["Goals", "Income", "Help"]
        .into_iter()
        .map(|t| Line::from(Span::raw(t)))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(titles)
        .select(match app.tab {
            Tab::Goals => 0,
            Tab::Income => 1,
            Tab::Help => 2,
        })
        .block(Block::default().borders(Borders::ALL).title("Savings Planner"))
        .highlight_style(Style::default().fg(accent).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, root[0]);

    match app.tab {
        Tab::Goals => draw_goals(f, root[1], app, accent),
        Tab::Income => draw_income(f, root[1], app, accent),
        Tab::Help => draw_help(f, root[1]),
    }

    let status = Paragraph::new(app.status.clone()).style(Style::default().fg(accent));
    f.render_widget(status, root[2]);

    if app.form.is_some() {
        let area = center_rect(root[1], 54, 12);
        f.render_widget(Clear, area);
        draw_goal_form(f, area, app);
    }
}

fn accent(theme: Theme) -> Color {
    match theme {
        Theme::Light => Color::Blue,
        Theme::Dark => Color::Cyan,
    }
}

// Goals page

fn draw_goals<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>, accent: Color) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let len = app.store.goals().len();
    if let Some(i) = app.goal_sel.selected() {
        if i >= len {
            app.goal_sel.select(if len == 0 { None } else { Some(len - 1) });
        }
    } else if len > 0 {
        app.goal_sel.select(Some(0));
    }

    let items: Vec<ListItem> = app
        .store
        .goals()
        .iter()
        .map(|g| {
            let line = Line::from(vec![
                Span::raw(format!("{}  ", g.name)),
                Span::styled(
                    format!("save ${}/mo", fmt_money(g.suggested_savings)),
                    Style::default().fg(accent),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Goals  (Up/Down, n=new, e=edit, x=delete, t=theme)"),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(list, cols[0], &mut app.goal_sel);

    let right = if let Some(goal) = app.selected_goal() {
        let rate = goal.target_amount / f64::from(goal.time_frame.max(1));
        Paragraph::new(format!(
            "Name: {}\nTarget: ${}\nTime frame: {} months\nRequired: ${}/mo\nSuggested: ${}/mo\nSaved so far: ${}",
            goal.name,
            fmt_money(goal.target_amount),
            goal.time_frame,
            fmt_money(rate),
            fmt_money(goal.suggested_savings),
            fmt_money(goal.progress),
        ))
    } else {
        Paragraph::new("No goal selected\n\nPress n to add your first goal.")
    }
    .block(Block::default().borders(Borders::ALL).title("Details"));
    f.render_widget(right, cols[1]);
}

fn draw_goal_form<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let Some(form) = app.form.as_ref() else {
        return;
    };

    let (m_name, m_target, m_months) = match form.focus {
        FormField::Name => ("  <editing>", "", ""),
        FormField::Target => ("", "  <editing>", ""),
        FormField::Months => ("", "", "  <editing>"),
    };

    let lines = vec![
        format!("Name   : {}{}", form.name.as_str(), m_name),
        format!("Target : {}{}", form.target.as_str(), m_target),
        format!("Months : {}{}", form.months.as_str(), m_months),
        "".into(),
        "TAB: switch field | Enter: save | Esc: cancel".into(),
        form.error.clone().unwrap_or_default(),
    ]
    .join("\n");

    let title = if form.editing_id.is_some() {
        "Edit Goal"
    } else {
        "New Goal"
    };
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

// Income page

fn draw_income<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>, accent: Color) {
    let income = app.store.income();
    let allocatable = income * ALLOCATION_FRACTION;
    let committed: f64 = app.store.goals().iter().map(|g| g.suggested_savings).sum();

    let lines = vec![
        format!("Monthly income     : ${}", fmt_money(income)),
        format!(
            "Earmarked for goals: ${}  ({}% of income)",
            fmt_money(allocatable),
            (ALLOCATION_FRACTION * 100.0) as u32
        ),
        format!("Committed to goals : ${}/mo", fmt_money(committed)),
        String::new(),
        format!("New income: {}_", app.income_input.as_str()),
        String::new(),
        "Type a number and press Enter to save.".into(),
    ]
    .join("\n");

    let p = Paragraph::new(lines)
        .style(Style::default().fg(accent))
        .block(Block::default().borders(Borders::ALL).title("Income"));
    f.render_widget(p, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        "Global Keys:",
        "  q        : Quit",
        "  ?        : Open this Help tab",
        "  Tab      : Switch tabs (Goals <-> Income)",
        "  t        : Toggle light/dark theme",
        "",
        "Goals Tab:",
        "  Up/Down  : Navigate list",
        "  n        : New goal",
        "  e        : Edit selected goal",
        "  x/Del    : Delete selected goal",
        "",
        "Goal Form:",
        "  Tab      : Next field (Shift+Tab back)",
        "  Enter    : Save",
        "  Esc      : Cancel",
        "",
        "Income Tab:",
        "  0-9 .    : Type a new monthly income",
        "  Enter    : Save income",
    ]
    .join("\n");

    let p = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help & Keybindings"));
    f.render_widget(p, area);
}

fn center_rect(rect: Rect, w: u16, h: u16) -> Rect {
    let x = rect.x + rect.width.saturating_sub(w) / 2;
    let y = rect.y + rect.height.saturating_sub(h) / 2;
    Rect {
        x,
        y,
        width: w.min(rect.width),
        height: h.min(rect.height),
    }
}
