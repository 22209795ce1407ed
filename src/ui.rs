//! UI rendering functions

use std::time::Instant;

use ratatui::prelude::*;
use ratatui::widgets::{
    BarChart, Block, Borders, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation,
    ScrollbarState, Table, Wrap,
};

use crate::app::App;
use heroapps::catalog::{LoadStatus, PageControl};
use heroapps::details::DetailView;
use heroapps::types::*;

const SPARKLE: [&str; 4] = ["✦ ✧ ✦", "✧ ✦ ✧", "★ ✧ ★", "✧ ★ ✧"];

pub fn ui(frame: &mut Frame, app: &mut App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let mut title_text = format!(" HERO APPS │ {} ", app.screen.title());
    if let Some(frame_idx) = app.celebration_frame(Instant::now()) {
        title_text.push_str(&format!("│ {} ", SPARKLE[frame_idx % SPARKLE.len()]));
    }
    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::White).bg(Color::Blue).bold());
    frame.render_widget(title, main_chunks[0]);

    match app.screen {
        Screen::Catalog => render_catalog(frame, app, main_chunks[1]),
        Screen::Detail => render_detail(frame, app, main_chunks[1]),
        Screen::Installed => render_installed(frame, app, main_chunks[1]),
    }

    if app.state == AppState::ConfirmUninstall {
        render_uninstall_modal(frame, app, main_chunks[1]);
    }

    if let Some(toast) = &app.toast {
        let toast_line = Paragraph::new(format!(" {} ", toast.message))
            .style(Style::default().fg(Color::Black).bg(toast.kind.color()).bold())
            .alignment(Alignment::Center);
        frame.render_widget(toast_line, main_chunks[2]);
    }

    let status_style = match (&app.state, app.catalog.status()) {
        (AppState::Searching, _) => Style::default().fg(Color::White),
        (AppState::ConfirmUninstall, _) => Style::default().fg(Color::Red),
        (_, LoadStatus::Failed(_)) if app.screen == Screen::Catalog => {
            Style::default().fg(Color::LightRed)
        }
        _ => Style::default().fg(Color::Yellow),
    };

    let status_text = match app.state {
        AppState::Searching => format!("/{}_", app.catalog.query().search),
        _ => {
            let search = &app.catalog.query().search;
            if !search.is_empty() && app.screen == Screen::Catalog {
                format!("[Search: {search}] {}", app.status_message)
            } else {
                app.status_message.clone()
            }
        }
    };
    let status = Paragraph::new(status_text)
        .style(status_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, main_chunks[3]);

    let help_text = match (&app.state, app.screen) {
        (AppState::Searching, _) => "Enter:Confirm │ Esc:Clear │ Type to search...",
        (AppState::ConfirmUninstall, _) => "y/Enter:Uninstall │ n/Esc:Cancel",
        (_, Screen::Catalog) => {
            "/:Search │ s/S:Sort │ ←→:Page │ Enter:Details │ Tab:Installed │ r:Reload │ q:Quit"
        }
        (_, Screen::Detail) => "i:Install │ ↑↓:Scroll │ Esc:Back │ q:Quit",
        (_, Screen::Installed) => {
            "a:Size ↑ │ d:Size ↓ │ x:Uninstall │ Enter:Details │ Tab:All Apps │ q:Quit"
        }
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, main_chunks[4]);

    if app.state == AppState::Searching {
        // Cursor after "/<query>" in the status bar (inside border: +1 x, +1 y)
        let cursor_x = main_chunks[3].x + 1 + 1 + app.catalog.query().search.chars().count() as u16;
        let cursor_y = main_chunks[3].y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn app_rows<'a>(apps: &'a [AppRecord]) -> Vec<Row<'a>> {
    apps.iter()
        .map(|a| {
            Row::new(vec![
                Cell::from(a.title.as_str()).style(Style::default().bold()),
                Cell::from(a.company_name.as_str()),
                Cell::from(a.size_str()),
                Cell::from(a.downloads_str()),
                Cell::from(format!("★ {:.1}", a.rating_avg)).style(Style::default().fg(Color::Yellow)),
            ])
        })
        .collect()
}

fn app_table<'a>(rows: Vec<Row<'a>>, title: String) -> Table<'a> {
    let header = Row::new(
        ["App", "Developer", "Size", "Downloads", "Rating"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().fg(Color::Cyan).bold())),
    )
    .height(1);

    Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("▶ ")
}

fn render_catalog(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let query = app.catalog.query();
    let title = format!(
        " Our All Applications ({}) │ {} ",
        app.catalog.total(),
        query.sort_option().label()
    );

    if app.catalog.is_empty() {
        let message = match app.catalog.status() {
            LoadStatus::Idle | LoadStatus::Loading => "Loading apps...",
            LoadStatus::Failed(_) => "Could not load apps. Press 'r' to retry.",
            LoadStatus::Loaded => "No apps found",
        };
        let empty = Paragraph::new(vec![Line::from(""), Line::from(message)])
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, chunks[0]);
    } else {
        let apps = app.catalog.apps();
        let table = app_table(app_rows(apps), title);
        frame.render_stateful_widget(table, chunks[0], &mut app.catalog_table);

        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut scrollbar_state = ScrollbarState::new(apps.len())
            .position(app.catalog_table.selected().unwrap_or(0));
        let scrollbar_area = Rect {
            x: chunks[0].x + chunks[0].width - 1,
            y: chunks[0].y + 1,
            width: 1,
            height: chunks[0].height.saturating_sub(2),
        };
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }

    frame.render_widget(pagination_line(&app.catalog.page_controls()), chunks[1]);
}

pub fn pagination_line(controls: &[PageControl]) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for control in controls {
        let span = match *control {
            PageControl::Prev => Span::styled(" ◀ Prev ", Style::default().fg(Color::Cyan)),
            PageControl::Next => Span::styled(" Next ▶ ", Style::default().fg(Color::Cyan)),
            PageControl::Page { index, current: true } => Span::styled(
                format!(" {} ", index + 1),
                Style::default().fg(Color::Black).bg(Color::Yellow).bold(),
            ),
            PageControl::Page { index, current: false } => Span::raw(format!(" {} ", index + 1)),
        };
        spans.push(span);
    }
    Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(detail) = &app.detail else {
        return;
    };

    let DetailView::Found { app: record, installed, ratings } = detail.view() else {
        let not_found = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("404", Style::default().fg(Color::Red).bold())),
            Line::from("App Is Not Found"),
            Line::from(Span::styled(
                format!("(no app with id '{}')", detail.id()),
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().title(" Not Found ").borders(Borders::ALL));
        frame.render_widget(not_found, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let button_style = if *installed {
        Style::default().fg(Color::DarkGray).bold()
    } else {
        Style::default().fg(Color::Black).bg(Color::Green).bold()
    };

    let mut content = vec![
        Line::from(Span::styled(record.title.as_str(), Style::default().fg(Color::White).bold())),
        Line::from(vec![
            Span::raw("Developed by "),
            Span::styled(record.company_name.as_str(), Style::default().fg(Color::Magenta)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Downloads: ", Style::default().fg(Color::Cyan)),
            Span::raw(record.downloads_str()),
            Span::styled("   Rating: ", Style::default().fg(Color::Cyan)),
            Span::styled(format!("★ {:.1}", record.rating_avg), Style::default().fg(Color::Yellow)),
            Span::styled("   Reviews: ", Style::default().fg(Color::Cyan)),
            Span::raw(record.reviews_str()),
        ]),
        Line::from(""),
        Line::from(Span::styled(format!(" {} ", detail.install_label()), button_style)),
        Line::from(""),
        Line::from(Span::styled("Description:", Style::default().fg(Color::Cyan).bold())),
    ];
    content.extend(record.paragraphs().map(Line::from));

    let info = Paragraph::new(content)
        .block(
            Block::default()
                .title(" Details ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false })
        .scroll((detail.scroll, 0));
    frame.render_widget(info, chunks[0]);

    let bars: Vec<(&str, u64)> = ratings.iter().map(|r| (r.name.as_str(), r.count)).collect();
    let chart = BarChart::default()
        .block(
            Block::default()
                .title(" Ratings ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Yellow))
        .data(bars.as_slice());
    frame.render_widget(chart, chunks[1]);
}

fn render_installed(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(installed) = &app.installed else {
        return;
    };

    let order = match installed.size_order() {
        SortOrder::Asc => "Size : Low → High",
        SortOrder::Desc => "Size : High → Low",
        SortOrder::Default => "Install order",
    };
    let title = format!(" Your Installed Apps ({}) │ {order} ", installed.apps().len());

    if installed.apps().is_empty() {
        let empty = Paragraph::new(vec![Line::from(""), Line::from("No apps installed yet")])
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let table = app_table(app_rows(installed.apps()), title);
    frame.render_stateful_widget(table, area, &mut app.installed_table);
}

fn render_uninstall_modal(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref target) = app.pending_uninstall else {
        return;
    };

    let modal_width = 50.min(area.width.saturating_sub(4));
    let modal_height = 7;
    let modal_x = area.x + (area.width - modal_width) / 2;
    let modal_y = area.y + (area.height.saturating_sub(modal_height)) / 2;
    let modal_area = Rect::new(modal_x, modal_y, modal_width, modal_height.min(area.height));

    frame.render_widget(Clear, modal_area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Uninstall '{}'?", target.title),
            Style::default().fg(Color::Red).bold(),
        )),
        Line::from(""),
        Line::from(format!("Frees {}", target.size_str())),
        Line::from(""),
        Line::from(Span::styled(
            "y/Enter: Uninstall │ n/Esc: Cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let modal = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Confirm Uninstall ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(modal, modal_area);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use color_eyre::Result;
    use ratatui::backend::TestBackend;

    use heroapps::catalog::CatalogQuery;
    use heroapps::client::CatalogApi;
    use heroapps::store::MemoryStore;
    use heroapps::worker::FetchWorker;

    use super::*;

    struct EmptyApi;

    impl CatalogApi for EmptyApi {
        fn fetch_page(&self, _query: &CatalogQuery) -> Result<AppsPage> {
            Ok(AppsPage::default())
        }
        fn fetch_app(&self, _id: &str) -> Result<Option<AppRecord>> {
            Ok(None)
        }
        fn fetch_all(&self) -> Result<Vec<AppRecord>> {
            Ok(Vec::new())
        }
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn empty_catalog_renders_empty_state() {
        let worker = FetchWorker::spawn(EmptyApi).unwrap();
        let mut app = App::new(Box::new(EmptyApi), Box::new(MemoryStore::new()), worker, Duration::ZERO);

        let deadline = Instant::now() + Duration::from_secs(5);
        while *app.catalog.status() != LoadStatus::Loaded && Instant::now() < deadline {
            app.tick(Instant::now());
            std::thread::sleep(Duration::from_millis(5));
        }

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("No apps found"));
        assert!(!text.contains("Developer"));
    }

    #[test]
    fn pagination_marks_every_page() {
        let controls = [
            PageControl::Prev,
            PageControl::Page { index: 0, current: false },
            PageControl::Page { index: 1, current: true },
            PageControl::Page { index: 2, current: false },
            PageControl::Next,
        ];
        let mut terminal = Terminal::new(TestBackend::new(40, 1)).unwrap();
        terminal
            .draw(|f| f.render_widget(pagination_line(&controls), f.area()))
            .unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("◀ Prev  1  2  3  Next ▶"));
    }

    #[test]
    fn not_found_detail_renders_404() {
        let worker = FetchWorker::spawn(EmptyApi).unwrap();
        let mut app = App::new(Box::new(EmptyApi), Box::new(MemoryStore::new()), worker, Duration::ZERO);
        app.open_detail("missing");
        app.run_pending_load();

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();
        assert!(screen_text(&terminal).contains("App Is Not Found"));
    }
}
