//! Ratatui-based dashboard.
//!
//! Left: the model configuration. Right: coefficients, statistics and chart
//! tabs of the last result. Service calls run on worker threads and report
//! back over a channel, so the configuration stays editable meanwhile.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap},
    Terminal,
};
use tracing::debug;

use crate::auth::UserIdentity;
use crate::domain::{AnalysisRecord, AnalysisResult, ModelType};
use crate::error::{AppError, ClientError, ConfigError};
use crate::report::{describe_image, RenderedView, PLACEHOLDER_TEXT};
use crate::service::{AnalysisService, ApiClient};
use crate::session::{Dashboard, NoticeLevel, SubmitError};

mod fields;

use fields::{cycle_option, Field};

/// Start the dashboard for one analysis id.
pub fn run(client: ApiClient, identity: UserIdentity, analysis_id: String, out_dir: PathBuf) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(2, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(client, identity, analysis_id, out_dir);
    app.start_load();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(2, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(2, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Outcomes delivered by worker threads.
enum WorkerEvent {
    Loaded(Result<AnalysisRecord, ClientError>),
    Estimated(Result<AnalysisResult, ClientError>),
    Exported(Result<Option<PathBuf>, ClientError>),
    ChartSaved(Result<PathBuf, ClientError>),
}

enum Screen {
    Loading,
    /// Metadata could not be loaded; nothing is configurable.
    LoadFailed(String),
    Ready(Box<Dashboard>),
}

struct App {
    client: ApiClient,
    identity: UserIdentity,
    analysis_id: String,
    out_dir: PathBuf,
    screen: Screen,
    field: Field,
    /// Cursor into the independent-variable options.
    independent_cursor: usize,
    status: String,
    tx: Sender<WorkerEvent>,
    rx: Receiver<WorkerEvent>,
}

impl App {
    fn new(client: ApiClient, identity: UserIdentity, analysis_id: String, out_dir: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            identity,
            analysis_id,
            out_dir,
            screen: Screen::Loading,
            field: Field::Model,
            independent_cursor: 0,
            status: "Loading analysis data...".to_string(),
            tx,
            rx,
        }
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce(ApiClient) -> WorkerEvent + Send + 'static,
    {
        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let _ = tx.send(job(client));
        });
    }

    fn start_load(&mut self) {
        self.screen = Screen::Loading;
        self.status = "Loading analysis data...".to_string();
        let id = self.analysis_id.clone();
        self.spawn(move |client| WorkerEvent::Loaded(client.fetch_analysis(&id)));
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.drain_workers() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(2, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(2, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(2, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply finished worker jobs. Returns true if anything changed.
    fn drain_workers(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.apply_worker_event(event);
                    changed = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    fn apply_worker_event(&mut self, event: WorkerEvent) {
        let event = match event {
            WorkerEvent::Loaded(Ok(record)) => {
                let dashboard = Dashboard::from_record(&self.analysis_id, record);
                self.status = format!("Loaded {}", dashboard.record().metadata.filename);
                self.screen = Screen::Ready(Box::new(dashboard));
                self.field = Field::Model;
                self.independent_cursor = 0;
                return;
            }
            WorkerEvent::Loaded(Err(err)) => {
                self.status = err.to_string();
                self.screen = Screen::LoadFailed(err.to_string());
                return;
            }
            other => other,
        };

        let Screen::Ready(dashboard) = &mut self.screen else {
            return;
        };
        match event {
            WorkerEvent::Estimated(outcome) => dashboard.finish_submission(outcome),
            WorkerEvent::Exported(outcome) => {
                dashboard.record_export(outcome);
            }
            WorkerEvent::ChartSaved(Ok(path)) => {
                dashboard.notify(NoticeLevel::Info, format!("Chart saved to {}", path.display()));
            }
            WorkerEvent::ChartSaved(Err(err)) => dashboard.notify(NoticeLevel::Error, err.to_string()),
            WorkerEvent::Loaded(_) => {}
        }
        self.status.clear();
    }

    /// Returns true when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if code == KeyCode::Char('q') || code == KeyCode::Esc {
            return true;
        }

        let Screen::Ready(_) = self.screen else {
            if code == KeyCode::Char('r') && matches!(self.screen, Screen::LoadFailed(_)) {
                self.start_load();
            }
            return false;
        };

        match code {
            KeyCode::Up => self.move_field(-1),
            KeyCode::Down => self.move_field(1),
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char(' ') => self.toggle_independent(),
            KeyCode::Enter if self.field != Field::Independents => self.submit(),
            KeyCode::Enter => self.toggle_independent(),
            KeyCode::Char('s') => self.submit(),
            KeyCode::Tab => self.with_charts(|tabs| tabs.next()),
            KeyCode::BackTab => self.with_charts(|tabs| tabs.prev()),
            KeyCode::Char('e') => self.export_report(),
            KeyCode::Char('c') => self.export_active_chart(),
            _ => {}
        }
        false
    }

    fn dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        match &mut self.screen {
            Screen::Ready(d) => Some(d.as_mut()),
            _ => None,
        }
    }

    fn visible_fields(&self) -> Vec<Field> {
        match &self.screen {
            Screen::Ready(d) => Field::visible(d.config()),
            _ => Vec::new(),
        }
    }

    fn move_field(&mut self, delta: i32) {
        let fields = self.visible_fields();
        if fields.is_empty() {
            return;
        }
        let idx = fields.iter().position(|f| *f == self.field).unwrap_or(0) as i32;
        let next = (idx + delta).clamp(0, fields.len() as i32 - 1);
        if let Some(field) = fields.get(next as usize) {
            self.field = *field;
        }
    }

    fn adjust_field(&mut self, delta: i32) {
        let field = self.field;
        let mut cursor = self.independent_cursor;
        let Some(dashboard) = self.dashboard_mut() else {
            return;
        };
        let config = dashboard.config_mut();

        let outcome = match field {
            Field::Model => {
                let current = config.model_type().unwrap_or(ModelType::Linear);
                let next = if delta >= 0 { current.next() } else { current.prev() };
                config.set_model_type(next);
                Ok(())
            }
            Field::Dependent => {
                match cycle_option(config.dependent_options(), config.dependent_var(), delta) {
                    Some(column) => config.set_dependent_var(&column),
                    None => Ok(()),
                }
            }
            Field::Independents => {
                let len = config.independent_options().len();
                if len > 0 {
                    cursor = (cursor as i32 + delta).rem_euclid(len as i32) as usize;
                }
                Ok(())
            }
            Field::Entity => match cycle_option(config.key_options(), config.entity_var(), delta) {
                Some(column) => config.set_entity_var(&column),
                None => Ok(()),
            },
            Field::Time => match cycle_option(config.key_options(), config.time_var(), delta) {
                Some(column) => config.set_time_var(&column),
                None => Ok(()),
            },
            Field::Submit => Ok(()),
        };

        if let Err(err) = outcome {
            dashboard.notify(NoticeLevel::Error, err.to_string());
        }
        self.independent_cursor = cursor;
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let len = match &self.screen {
            Screen::Ready(d) => d.config().independent_options().len(),
            _ => 0,
        };
        if self.independent_cursor >= len {
            self.independent_cursor = len.saturating_sub(1);
        }
        // Hidden key fields cannot stay focused.
        let fields = self.visible_fields();
        if !fields.contains(&self.field) {
            self.field = Field::Model;
        }
    }

    fn toggle_independent(&mut self) {
        if self.field != Field::Independents {
            return;
        }
        let cursor = self.independent_cursor;
        let Some(dashboard) = self.dashboard_mut() else {
            return;
        };
        let Some(column) = dashboard
            .config()
            .independent_options()
            .get(cursor)
            .map(|c| c.to_string())
        else {
            return;
        };
        if let Err(err) = dashboard.config_mut().toggle_independent_var(&column) {
            dashboard.notify(NoticeLevel::Error, err.to_string());
        }
    }

    fn submit(&mut self) {
        let Some(dashboard) = self.dashboard_mut() else {
            return;
        };
        match dashboard.begin_submission() {
            Ok(request) => {
                debug!(model = %request.model_type(), "estimation dispatched");
                self.status = "Analyzing...".to_string();
                self.spawn(move |client| WorkerEvent::Estimated(client.run_analysis(&request)));
            }
            Err(SubmitError::Busy) => {
                self.status = "An analysis is already running.".to_string();
            }
            // The session already recorded a notice; jump to the field to fix.
            Err(SubmitError::Invalid(err)) => {
                self.field = match err {
                    ConfigError::MissingModelType => Field::Model,
                    ConfigError::MissingPanelKeys => Field::Entity,
                    ConfigError::MissingTimeVar => Field::Time,
                    ref e if e.is_variable_selection() => Field::Dependent,
                    _ => Field::Model,
                };
                self.clamp_cursor();
            }
        }
    }

    fn with_charts(&mut self, f: impl FnOnce(&mut crate::report::ChartTabs)) {
        if let Some(dashboard) = self.dashboard_mut() {
            if let RenderedView::Results(view) = dashboard.view_mut() {
                f(&mut view.charts);
            }
        }
    }

    fn export_report(&mut self) {
        let out_dir = self.out_dir.clone();
        let Some(dashboard) = self.dashboard_mut() else {
            return;
        };
        let Some(result) = dashboard.result().cloned() else {
            return;
        };
        self.status = "Exporting report...".to_string();
        self.spawn(move |client| {
            WorkerEvent::Exported(crate::export::export_current(&client, Some(&result), &out_dir))
        });
    }

    fn export_active_chart(&mut self) {
        let out_dir = self.out_dir.clone();
        let Some(dashboard) = self.dashboard_mut() else {
            return;
        };
        let Some(result) = dashboard.result().cloned() else {
            return;
        };
        let RenderedView::Results(view) = dashboard.view() else {
            return;
        };
        let Some(name) = view.charts.active().map(|t| t.name.clone()) else {
            return;
        };
        self.status = format!("Saving chart {name}...");
        self.spawn(move |client| {
            WorkerEvent::ChartSaved(crate::export::export_chart(&client, &result, &name, &out_dir))
        });
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        match &self.screen {
            Screen::Loading => {
                let p = Paragraph::new("Loading data...")
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(p, chunks[1]);
            }
            Screen::LoadFailed(message) => {
                let text = Text::from(vec![
                    Line::from(Span::styled(
                        "Failed to load analysis data",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(message.as_str()),
                    Line::from(""),
                    Line::from("r retry  q quit"),
                ]);
                let p = Paragraph::new(text)
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(p, chunks[1]);
            }
            Screen::Ready(dashboard) => self.draw_body(frame, chunks[1], dashboard),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("econlab", Style::default().fg(Color::Cyan)),
            Span::raw(" | econometric analysis | "),
            Span::styled(self.identity.display_name.as_str(), Style::default().fg(Color::Gray)),
        ]));

        if let Screen::Ready(dashboard) = &self.screen {
            let meta = &dashboard.record().metadata;
            lines.push(Line::from(Span::styled(
                format!(
                    "file: {} | rows: {} | columns: {} | suggested: {}",
                    meta.filename,
                    meta.rows,
                    meta.columns.len(),
                    meta.suggested_model.as_str().to_uppercase(),
                ),
                Style::default().fg(Color::Gray),
            )));
            lines.push(Line::from(Span::styled(
                meta.model_reasoning.as_str(),
                Style::default().fg(Color::DarkGray),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!("analysis: {}", self.analysis_id),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect, dashboard: &Dashboard) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Min(0)])
            .split(area);

        self.draw_config(frame, chunks[0], dashboard);
        draw_results(frame, chunks[1], dashboard.view());
    }

    fn draw_config(&self, frame: &mut ratatui::Frame<'_>, area: Rect, dashboard: &Dashboard) {
        let config = dashboard.config();
        let focus = |field: Field| {
            if field == self.field {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default()
            }
        };
        let value_or_dash = |v: Option<&str>| v.unwrap_or("-").to_string();

        let mut lines: Vec<Line> = Vec::new();
        let model = config.model_type().map(|m| m.display_name()).unwrap_or("-");
        lines.push(Line::from(Span::styled(format!("Model: {model}"), focus(Field::Model))));
        lines.push(Line::from(Span::styled(
            format!("Dependent (Y): {}", value_or_dash(config.dependent_var())),
            focus(Field::Dependent),
        )));

        lines.push(Line::from(Span::styled("Independent (X):", focus(Field::Independents))));
        for (idx, column) in config.independent_options().iter().enumerate() {
            let mark = if config.is_independent(column) { "[x]" } else { "[ ]" };
            let style = if self.field == Field::Independents && idx == self.independent_cursor {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(format!("  {mark} {column}"), style)));
        }

        if config.shows_entity_var() {
            lines.push(Line::from(Span::styled(
                format!("Entity: {}", value_or_dash(config.entity_var())),
                focus(Field::Entity),
            )));
        }
        if config.shows_time_var() {
            lines.push(Line::from(Span::styled(
                format!("Time: {}", value_or_dash(config.time_var())),
                focus(Field::Time),
            )));
        }
        if config.model_type() == Some(ModelType::Arima) {
            lines.push(Line::from(Span::styled(
                format!("Order (p, d, q): {}", config.arima_order()),
                Style::default().fg(Color::DarkGray),
            )));
        }

        lines.push(Line::from(""));
        let submit_label = if dashboard.is_busy() { "Analyzing..." } else { "Run analysis" };
        let submit_style = if dashboard.is_busy() {
            Style::default().fg(Color::DarkGray)
        } else if config.can_submit() {
            focus(Field::Submit).add_modifier(Modifier::BOLD)
        } else {
            focus(Field::Submit)
        };
        lines.push(Line::from(Span::styled(format!("> {submit_label}"), submit_style)));

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Configuration").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ field  ←/→ change  space toggle  Enter/s run  Tab chart  e pdf  c png  q quit";

        let (message, color) = match &self.screen {
            Screen::Ready(d) if self.status.is_empty() => match d.latest_notice() {
                Some(n) => (
                    format!("{} {}", n.at.format("%H:%M:%S"), n.message),
                    match n.level {
                        NoticeLevel::Info => Color::Green,
                        NoticeLevel::Error => Color::Red,
                    },
                ),
                None => (String::new(), Color::Yellow),
            },
            _ => (self.status.clone(), Color::Yellow),
        };

        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(message, Style::default().fg(color)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_results(frame: &mut ratatui::Frame<'_>, area: Rect, view: &RenderedView) {
    let RenderedView::Results(results) = view else {
        let p = Paragraph::new(PLACEHOLDER_TEXT)
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Results").borders(Borders::ALL));
        frame.render_widget(p, area);
        return;
    };

    let stat_rows = results.statistics.len().div_ceil(2) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(stat_rows + 2),
            Constraint::Length(if results.charts.is_empty() { 0 } else { 5 }),
        ])
        .split(area);

    let header = Row::new(vec!["Variable", "Coefficient", "Std. Error", "t-stat", "p-value"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = results.coefficients.iter().map(|r| {
        let p_style = if r.significant {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(r.variable.as_str()),
            Cell::from(r.coefficient.as_str()),
            Cell::from(r.std_error.as_str()),
            Cell::from(r.t_statistic.as_str()),
            Cell::from(r.p_value.as_str()).style(p_style),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().title("Coefficients").borders(Borders::ALL));
    frame.render_widget(table, chunks[0]);

    let stat_lines: Vec<Line> = results
        .statistics
        .chunks(2)
        .map(|pair| {
            let spans: Vec<Span> = pair
                .iter()
                .flat_map(|tile| {
                    [
                        Span::styled(format!("{:<18}", tile.label), Style::default().fg(Color::Gray)),
                        Span::styled(format!("{:<14}", tile.value), Style::default().add_modifier(Modifier::BOLD)),
                    ]
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    let stats = Paragraph::new(Text::from(stat_lines))
        .block(Block::default().title("Model statistics").borders(Borders::ALL));
    frame.render_widget(stats, chunks[1]);

    if results.charts.is_empty() {
        return;
    }
    let titles: Vec<Line> = results.charts.tabs().iter().map(|t| Line::from(t.name.as_str())).collect();
    let chart_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(chunks[2]);
    let tabs = Tabs::new(titles)
        .select(results.charts.active_index().unwrap_or(0))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
        .block(Block::default().title("Diagnostic charts").borders(Borders::ALL));
    frame.render_widget(tabs, chart_chunks[0]);

    if let Some(tab) = results.charts.active() {
        let body = Paragraph::new(format!("{}  (c saves {})", describe_image(&tab.image), tab.name))
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(body, chart_chunks[1]);
    }
}
