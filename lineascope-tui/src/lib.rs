use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lineascope_client::{GraphLoader, GraphPayload, GraphSink, QueryMode};
use lineascope_core::{
    Color, GraphEngine, LineageGraph, base_style, export_json, export_png, legend_entries,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color as TermColor, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Wrap,
        canvas::{Canvas, Circle, Line as CanvasLine, Rectangle as CanvasRect},
    },
};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Caller-supplied viewer parameters, mirroring the CLI flags.
pub struct ViewerOptions {
    pub api_base: String,
    pub mode: QueryMode,
    pub key: String,
    pub hops: u32,
}

/// Messages from fetch tasks back to the draw loop. Payloads are applied in
/// arrival order; with overlapping loads the last response to arrive wins.
enum ViewerMessage {
    Loaded(GraphPayload),
    LoadFailed(String),
}

struct App {
    engine: LineageGraph,
    loader: Arc<GraphLoader>,
    mode: QueryMode,
    key: String,
    hops: u32,
    selected: Option<usize>,
    status: String,
    in_flight: usize,
    should_quit: bool,
    tx: mpsc::UnboundedSender<ViewerMessage>,
    rx: mpsc::UnboundedReceiver<ViewerMessage>,
}

impl App {
    fn new(options: ViewerOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut engine = LineageGraph::new();
        // The ruleset is bound once; loads never rebuild it.
        engine.apply_style(base_style());
        Self {
            engine,
            loader: Arc::new(GraphLoader::new(options.api_base)),
            mode: options.mode,
            key: options.key,
            hops: options.hops,
            selected: None,
            status: "press r to load".to_string(),
            in_flight: 0,
            should_quit: false,
            tx,
            rx,
        }
    }

    /// Spawn a fetch task for the current parameters. Concurrent requests
    /// are not serialized or cancelled.
    fn request_load(&mut self) {
        let loader = self.loader.clone();
        let tx = self.tx.clone();
        let mode = self.mode;
        let key = self.key.clone();
        let hops = self.hops;

        self.in_flight += 1;
        self.status = format!("loading {}={} max_hops={} ...", mode.key_param(), key, hops);

        tokio::spawn(async move {
            match loader.fetch_graph(mode, &key, hops).await {
                Ok(payload) => {
                    let _ = tx.send(ViewerMessage::Loaded(payload));
                }
                Err(e) => {
                    let _ = tx.send(ViewerMessage::LoadFailed(e.to_string()));
                }
            }
        });
    }

    /// Drain pending fetch results without blocking the draw loop.
    fn process_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                ViewerMessage::Loaded(payload) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    let GraphPayload { nodes, edges } = payload;
                    self.engine.clear_elements();
                    self.engine.add_nodes(nodes);
                    self.engine.add_edges(edges);
                    self.selected = None;
                    self.status = format!(
                        "{} nodes, {} edges",
                        self.engine.nodes().len(),
                        self.engine.edges().len()
                    );
                }
                ViewerMessage::LoadFailed(err) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    self.status = format!("load failed: {}", err);
                }
            }
        }
    }

    fn select_next(&mut self) {
        let count = self.engine.nodes().len();
        if count == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(index) => (index + 1) % count,
            None => 0,
        });
    }

    fn select_previous(&mut self) {
        let count = self.engine.nodes().len();
        if count == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => count - 1,
            Some(index) => index - 1,
        });
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('r') => {
                self.request_load();
            }
            KeyCode::Char('m') => {
                self.mode = self.mode.toggled();
                self.status = format!("mode: {} (r to reload)", self.mode.as_str());
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.hops += 1;
                self.status = format!("max_hops: {} (r to reload)", self.hops);
            }
            KeyCode::Char('-') => {
                self.hops = self.hops.saturating_sub(1);
                self.status = format!("max_hops: {} (r to reload)", self.hops);
            }
            KeyCode::Tab | KeyCode::Down | KeyCode::Right => {
                self.select_next();
            }
            KeyCode::BackTab | KeyCode::Up | KeyCode::Left => {
                self.select_previous();
            }
            KeyCode::Char('p') => {
                self.status = match export_png(&self.engine, Path::new(".")) {
                    Ok(path) => format!("saved {}", path.display()),
                    Err(e) => format!("export failed: {}", e),
                };
            }
            KeyCode::Char('j') => {
                self.status = match export_json(&self.engine, Path::new(".")) {
                    Ok(path) => format!("saved {}", path.display()),
                    Err(e) => format!("export failed: {}", e),
                };
            }
            _ => {}
        }
    }
}

/// Launch the interactive viewer. Must be called from within a tokio
/// runtime; fetches run as spawned tasks while the draw loop polls input.
pub fn run(options: ViewerOptions) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(options);
    app.request_load();

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.process_messages();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                app.handle_key(key.code);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb(color.r, color.g, color.b)
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Graph + side panel
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(34)])
        .split(chunks[0]);

    render_graph(f, app, main[0]);
    render_side_panel(f, app, main[1]);
    render_status_bar(f, app, chunks[1]);
}

fn render_graph(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        " {} | {}={} max_hops={}{} ",
        app.loader.api_base(),
        app.mode.key_param(),
        app.key,
        app.hops,
        if app.in_flight > 0 { " | loading..." } else { "" },
    );

    let (min, max) = app
        .engine
        .bounds()
        .unwrap_or((Default::default(), Default::default()));
    let x_bounds = [min.x - 140.0, max.x + 140.0];
    let y_bounds = [-(max.y + 70.0), -(min.y - 70.0)];

    let style = *app.engine.style();
    let selected_id = app
        .selected
        .and_then(|index| app.engine.nodes().get(index))
        .map(|node| node.id.clone());

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(TermColor::Cyan)),
        )
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            // Edges first so node glyphs draw over them.
            for edge in app.engine.edges() {
                let (Some(source), Some(target)) = (
                    app.engine.position_of(&edge.source),
                    app.engine.position_of(&edge.target),
                ) else {
                    continue;
                };
                let color = term_color((style.edge.line_color)(edge));
                ctx.draw(&CanvasLine {
                    x1: source.x,
                    y1: -source.y,
                    x2: target.x,
                    y2: -target.y,
                    color,
                });
                let label = (style.edge.label)(edge);
                if !label.is_empty() {
                    ctx.print(
                        (source.x + target.x) / 2.0,
                        -(source.y + target.y) / 2.0,
                        Line::styled(label, Style::default().fg(color)),
                    );
                }
            }

            for node in app.engine.nodes() {
                let Some(position) = app.engine.position_of(&node.id) else {
                    continue;
                };
                let color = term_color((style.node.background_color)(node));
                let is_selected = selected_id.as_deref() == Some(node.id.as_str());
                let border = if is_selected {
                    term_color(style.selected.border_color)
                } else {
                    color
                };

                if (style.node.shape)(node).is_boxy() {
                    ctx.draw(&CanvasRect {
                        x: position.x - 40.0,
                        y: -position.y - 14.0,
                        width: 80.0,
                        height: 28.0,
                        color: border,
                    });
                } else {
                    ctx.draw(&Circle {
                        x: position.x,
                        y: -position.y,
                        radius: 22.0,
                        color: border,
                    });
                }

                // Two-line label: type, then display name.
                let label = (style.node.label)(node);
                let mut lines = label.lines();
                if let Some(first) = lines.next() {
                    ctx.print(
                        position.x - 30.0,
                        -position.y + 6.0,
                        Line::styled(first.to_string(), Style::default().fg(color)),
                    );
                }
                if let Some(second) = lines.next()
                    && !second.is_empty()
                {
                    ctx.print(
                        position.x - 30.0,
                        -position.y - 8.0,
                        Line::styled(
                            second.to_string(),
                            Style::default().fg(term_color(style.node.text_color)),
                        ),
                    );
                }
            }
        });

    f.render_widget(canvas, area);
}

fn render_side_panel(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(5)])
        .split(area);

    let legend_items: Vec<ListItem> = legend_entries()
        .into_iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled("■ ", Style::default().fg(term_color(entry.color))),
                Span::raw(entry.label),
            ]))
        })
        .collect();

    let legend = List::new(legend_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Legend ")
            .border_style(Style::default().fg(TermColor::DarkGray)),
    );
    f.render_widget(legend, chunks[0]);

    let detail = match app.selected.and_then(|index| app.engine.nodes().get(index)) {
        Some(node) => {
            let style = app.engine.style();
            let color = (style.node.background_color)(node);
            let incoming = app
                .engine
                .edges()
                .iter()
                .filter(|edge| edge.target == node.id)
                .count();
            let outgoing = app
                .engine
                .edges()
                .iter()
                .filter(|edge| edge.source == node.id)
                .count();

            let mut lines = vec![
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(term_color(color))),
                    Span::styled(
                        node.entity_type.as_str(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(format!("id: {}", node.id)),
            ];
            if let Some(name) = node.display_name() {
                lines.push(Line::from(name.to_string()));
            }
            lines.push(Line::from(format!(
                "shape: {}",
                (style.node.shape)(node).as_str()
            )));
            lines.push(Line::from(format!("color: {}", color.hex())));
            lines.push(Line::from(format!("edges: {} in / {} out", incoming, outgoing)));
            lines
        }
        None => vec![
            Line::from("No node selected."),
            Line::from("Tab cycles through nodes."),
        ],
    };

    let detail = Paragraph::new(detail)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Node ")
                .border_style(Style::default().fg(TermColor::DarkGray)),
        );
    f.render_widget(detail, chunks[1]);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled("r", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" reload | "),
        Span::styled("m", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" mode | "),
        Span::styled("+/-", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" hops | "),
        Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" select | "),
        Span::styled("p/j", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" export | "),
        Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" quit | {}", app.status)),
    ]))
    .style(Style::default().fg(TermColor::DarkGray));

    f.render_widget(status, area);
}
