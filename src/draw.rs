use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::state::loader::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use bracket_engine::{Game, GameStake, OddsReport, RoundKind, Team};

static TABS: &[&str; 3] = &["Standings", "Stakes", "Picks"];

const HELP_TEXT: &str = "\
Global
  1 / 2 / 3     Standings / Stakes / Picks
  ?             this help (Esc to leave)
  R             reload the pool now
  f             toggle full screen
  \"             toggle the log pane
  q / Ctrl-C    quit

Standings, Stakes
  j / k         move the selection

Picks
  h / Left      pick the first team
  l / Right     pick the second team
  b             back one game
  s             save the finished bracket to picks/<user>.json";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let _ = terminal.draw(|f| {
        let layout = LayoutAreas::new(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Standings => draw_standings(f, layout.main, app),
            MenuItem::Stakes => draw_stakes(f, layout.main, app),
            MenuItem::PickWizard => draw_pick_wizard(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }
        draw_status(f, layout.status, app);
        draw_loading_spinner(f, f.area(), app, loading);
    });
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Standings => 0,
        MenuItem::Stakes => 1,
        MenuItem::PickWizard => 2,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

/// Shown in place of a view until the first pool load lands.
fn draw_waiting(f: &mut Frame, area: Rect, app: &App) {
    let msg = match app.state.last_error.as_deref() {
        Some(err) => format!("Pool load failed:\n{err}"),
        None => "Loading pool...".to_string(),
    };
    draw_placeholder(f, area, &msg);
}

fn draw_standings(f: &mut Frame, area: Rect, app: &App) {
    let Some(pool) = app.state.pool.as_ref() else {
        draw_waiting(f, area, app);
        return;
    };

    let standings = &app.state.standings;
    let odds = pool.odds.as_ref();
    let title = match odds {
        Some(report) if !report.exhaustive => format!(
            " Standings ({} entries, odds from {} sampled outcomes) ",
            standings.rows.len(),
            report.outcomes
        ),
        _ => format!(" Standings ({} entries) ", standings.rows.len()),
    };
    let block = default_border(Color::White).title(title);

    if standings.rows.is_empty() {
        let inner = block.inner(area);
        f.render_widget(block, area);
        f.render_widget(
            Paragraph::new(format!("No picks yet. Drop bracket files into {}/picks/", pool.dir.display()))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut header = vec!["#", "Name", "Score", "Bonus", "Right"];
    header.extend(RoundKind::ALL.iter().map(|r| round_column(*r)));
    header.extend(["Left", "Max", "Win%", "Place"]);
    let header = Row::new(header).style(bold.fg(Color::Yellow));

    let rows = standings.rows.iter().map(|s| {
        let mut cells = vec![
            Cell::from(s.rank.to_string()),
            Cell::from(s.name.clone()),
            Cell::from(s.score.to_string()).style(bold),
            Cell::from(s.seed_bonus.to_string()),
            Cell::from(s.correct_picks.to_string()),
        ];
        cells.extend(
            RoundKind::ALL
                .iter()
                .map(|r| Cell::from(s.round_breakdown[usize::from(r.number())].to_string())),
        );
        cells.push(Cell::from(s.possible_remaining.to_string()).style(Style::default().fg(Color::DarkGray)));
        cells.push(Cell::from(s.max_possible.to_string()));
        let (win, place) = odds_cells(odds, &s.name);
        cells.push(Cell::from(win).style(Style::default().fg(Color::Green)));
        cells.push(Cell::from(place));
        Row::new(cells)
    });

    let mut widths = vec![
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
    ];
    widths.extend([Constraint::Length(5); 6]);
    widths.extend([Constraint::Length(6); 4]);

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(standings.selected));
    f.render_stateful_widget(table, area, &mut state);
}

/// Win chance and average place for one participant, blank until the odds
/// are in.
fn odds_cells(report: Option<&OddsReport>, name: &str) -> (String, String) {
    match report.and_then(|r| r.get(name)) {
        Some(odds) => (
            format!("{:.1}", odds.win_probability * 100.0),
            format!("{:.1}", odds.average_place),
        ),
        None => ("-".to_string(), "-".to_string()),
    }
}

fn round_column(round: RoundKind) -> &'static str {
    match round {
        RoundKind::First => "R64",
        RoundKind::Second => "R32",
        RoundKind::Sweet16 => "S16",
        RoundKind::Elite8 => "E8",
        RoundKind::FinalFour => "F4",
        RoundKind::Championship => "Final",
    }
}

fn draw_stakes(f: &mut Frame, area: Rect, app: &App) {
    let Some(pool) = app.state.pool.as_ref() else {
        draw_waiting(f, area, app);
        return;
    };

    let [games_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);

    let stakes = &app.state.stakes;
    let block = default_border(Color::White).title(format!(" Remaining games ({}) ", stakes.games.len()));
    let inner = block.inner(games_area);
    f.render_widget(block, games_area);

    if stakes.games.is_empty() {
        f.render_widget(
            Paragraph::new("No games waiting on a result")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        draw_placeholder(f, detail_area, "");
        return;
    }

    // Keep the selection on screen when the list is taller than the pane.
    let visible = usize::from(inner.height).max(1);
    let first = stakes.selected.saturating_sub(visible - 1);
    let lines: Vec<Line> = stakes
        .games
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .filter_map(|(idx, &at)| {
            let game = pool.results.get(at)?;
            let selected = idx == stakes.selected;
            let marker = if selected { ">" } else { " " };
            let text = format!("{marker} {:<6} {} vs {}", round_column(at.round), team_label(game.team1.as_ref()), team_label(game.team2.as_ref()));
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Some(Line::from(Span::styled(text, style)))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);

    let Some(at) = stakes.selected_game() else {
        return;
    };
    let Some(game) = pool.results.get(at) else {
        return;
    };
    draw_game_stakes(f, detail_area, game, &pool.stakes(at));
}

fn draw_game_stakes(f: &mut Frame, area: Rect, game: &Game, stakes: &[(&str, GameStake)]) {
    let team1 = team_label(game.team1.as_ref());
    let team2 = team_label(game.team2.as_ref());
    let block = default_border(Color::White).title(format!(" {} ", game.id));

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from(team1.clone()),
        Cell::from(team2.clone()),
        Cell::from("Pick"),
    ])
    .style(bold.fg(Color::Yellow));

    let rows = stakes.iter().map(|(name, stake)| {
        let pick = match (&stake.picked_team, stake.has_pick) {
            (Some(team), true) => Span::styled(team.clone(), Style::default().fg(Color::Green)),
            _ => Span::styled("out", Style::default().fg(Color::DarkGray)),
        };
        Row::new(vec![
            Cell::from(name.to_string()),
            Cell::from(stake.team1.to_string()),
            Cell::from(stake.team2.to_string()),
            Cell::from(pick),
        ])
    });

    let total1: u32 = stakes.iter().map(|(_, s)| s.team1).sum();
    let total2: u32 = stakes.iter().map(|(_, s)| s.team2).sum();
    let footer = Row::new(vec![
        Cell::from("total"),
        Cell::from(total1.to_string()),
        Cell::from(total2.to_string()),
        Cell::from(""),
    ])
    .style(bold);

    let table = Table::new(
        rows,
        [
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
        ],
    )
    .header(header)
    .footer(footer)
    .block(block);
    f.render_widget(table, area);
}

fn team_label(team: Option<&Team>) -> String {
    match team {
        Some(team) if team.seed > 0 => format!("({}) {}", team.seed, team.name),
        Some(team) => team.name.clone(),
        None => "TBD".to_string(),
    }
}

fn draw_pick_wizard(f: &mut Frame, area: Rect, app: &App) {
    let title = format!(" Picks: {} ", app.settings.username);
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let wizard = &app.state.pick_wizard;
    let Some(bracket) = wizard.bracket.as_ref() else {
        f.render_widget(
            Paragraph::new("No team feed loaded yet. Press 3 again once the pool is in.")
                .style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    };

    let mut lines = Vec::new();
    lines.push(Line::from(format!(
        "Progress: {}/{} picks",
        wizard.decided(),
        wizard.order.len()
    )));
    lines.push(Line::from("Keys: h/Left=first  l/Right=second  b=back  s=save").style(Style::default().fg(Color::DarkGray)));
    lines.push(Line::from(""));

    if wizard.completed {
        let champion = bracket.winner.as_ref().map_or("?", |t| t.name.as_str());
        lines.push(Line::from(Span::styled(
            format!("Bracket complete. Champion: {champion}"),
            Style::default().fg(Color::Green),
        )));
        let saved = match &wizard.saved_to {
            Some(path) => format!("Saved to {}", path.display()),
            None => "Press s to save.".to_string(),
        };
        lines.push(Line::from(saved));
        lines.push(Line::from(""));
    }

    if let Some((at, game)) = wizard.current() {
        let region = game.region.map(|r| format!(" | {r}")).unwrap_or_default();
        lines.push(Line::from(format!(
            "Game {}/{}  |  {}{region}",
            wizard.current_index + 1,
            wizard.order.len(),
            at.round.label()
        )));
        lines.push(Line::from(""));

        let winner = game.winner_name();
        for (key, team) in [("←) ", game.team1.as_ref()), ("→) ", game.team2.as_ref())] {
            let picked = team.is_some_and(|t| Some(t.name.as_str()) == winner);
            let style = match team {
                None => Style::default().fg(Color::DarkGray),
                Some(_) if picked => Style::default().fg(Color::Green),
                Some(_) => Style::default().fg(Color::White),
            };
            lines.push(Line::from(vec![
                Span::styled(key, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(team_label(team), style),
            ]));
        }
        if !game.has_both_teams() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Pick the feeding games first (b to go back).",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new(HELP_TEXT), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(logs, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    if let Some(pool) = app.state.pool.as_ref() {
        let bonus = if app.settings.apply_seed_bonus { "on" } else { "off" };
        spans.push(Span::styled(
            format!(
                " {} | loaded at {} | {}/63 decided | seed bonus {bonus} ",
                pool.dir.display(),
                pool.loaded_at.format("%H:%M:%S"),
                pool.results.decided_count(),
            ),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(err) = app.state.last_error.as_deref() {
        spans.push(Span::styled(format!(" {err}"), Style::default().fg(Color::Red)));
    } else if let Some(notice) = app.state.notice.as_deref() {
        spans.push(Span::styled(format!(" {notice}"), Style::default().fg(Color::Green)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
