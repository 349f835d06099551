use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pokedex_gallery::{
    CategorySelector, FilterQuery, Fragment, ImageVariant, LoadStatus, Rendered, Session,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Browsing,
    Searching,
}

/// Why the UI loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiOutcome {
    Quit,
    /// User asked for a full reload of the catalog
    Reload,
}

pub struct App {
    pub session: Session,
    pub state: TableState,
    pub input_mode: InputMode,
    pub search: String,
    pub category: CategorySelector,
}

impl App {
    pub fn new(session: Session) -> Self {
        let query = session.query().clone();
        let mut app = Self {
            session,
            state: TableState::default(),
            input_mode: InputMode::Browsing,
            search: query.text,
            category: query.category,
        };
        app.apply_filters();
        app
    }

    /// Re-filter the full collection from the current widgets.
    pub fn apply_filters(&mut self) {
        let query = FilterQuery {
            text: self.search.clone(),
            category: self.category.clone(),
        };
        let count = self.session.apply_filter(query).fragments().len();

        if count > 0 {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn clear_filters(&mut self) {
        self.search.clear();
        self.category = CategorySelector::All;
        self.apply_filters();
    }

    pub fn fragments(&self) -> &[Fragment] {
        self.session
            .rendered()
            .map(Rendered::fragments)
            .unwrap_or(&[])
    }

    pub fn selected_fragment(&self) -> Option<&Fragment> {
        self.state.selected().and_then(|i| self.fragments().get(i))
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_fragment().map(|f| f.id) {
            self.session.toggle_image(id);
        }
    }

    pub fn next(&mut self) {
        let len = self.fragments().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.fragments().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.fragments().len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + 20).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.fragments().is_empty() {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(20));
        self.state.select(Some(i));
    }

    /// Returns `Some` when the UI loop should end.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UiOutcome> {
        match self.input_mode {
            InputMode::Searching => {
                match key.code {
                    KeyCode::Enter | KeyCode::Esc => self.input_mode = InputMode::Browsing,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Some(UiOutcome::Quit)
                    }
                    KeyCode::Backspace => {
                        self.search.pop();
                        self.apply_filters();
                    }
                    KeyCode::Char(c) => {
                        self.search.push(c);
                        self.apply_filters();
                    }
                    _ => {}
                }
                None
            }
            InputMode::Browsing => {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Some(UiOutcome::Quit),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Some(UiOutcome::Quit)
                    }
                    KeyCode::Char('r') => return Some(UiOutcome::Reload),
                    KeyCode::Char('/') => self.input_mode = InputMode::Searching,
                    KeyCode::Char('c') => self.clear_filters(),
                    KeyCode::Tab => {
                        self.category = self.category.next();
                        self.apply_filters();
                    }
                    KeyCode::BackTab => {
                        self.category = self.category.previous();
                        self.apply_filters();
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
                    KeyCode::Down | KeyCode::Char('j') => self.next(),
                    KeyCode::Up | KeyCode::Char('k') => self.previous(),
                    KeyCode::PageDown => self.page_down(),
                    KeyCode::PageUp => self.page_up(),
                    KeyCode::Home => {
                        if !self.fragments().is_empty() {
                            self.state.select(Some(0));
                        }
                    }
                    KeyCode::End => {
                        let len = self.fragments().len();
                        if len > 0 {
                            self.state.select(Some(len - 1));
                        }
                    }
                    _ => {}
                }
                None
            }
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<UiOutcome> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(res?)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<UiOutcome> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(outcome) = app.handle_key(key) {
                return Ok(outcome);
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search + category
            Constraint::Min(0),    // Gallery
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.session.status().clone() {
        LoadStatus::Failed { message, .. } => render_error(f, chunks[1], &message),
        LoadStatus::Loading | LoadStatus::Idle => render_loading(f, chunks[1]),
        LoadStatus::Loaded { .. } => {
            if app.fragments().is_empty() {
                render_empty(f, chunks[1]);
            } else {
                let content_chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(60), // Card list
                        Constraint::Percentage(40), // Selected card
                    ])
                    .split(chunks[1]);

                render_table(f, content_chunks[0], app);
                render_card(f, content_chunks[1], app);
            }
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn badge_spans(fragment: &Fragment) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, badge) in fragment.badges.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        let (r, g, b) = badge.color.rgb;
        spans.push(Span::styled(
            format!(" {} ", badge.name),
            Style::default().fg(Color::Black).bg(Color::Rgb(r, g, b)),
        ));
    }
    spans
}

fn variant_style(variant: ImageVariant) -> Style {
    match variant {
        ImageVariant::Primary => Style::default().fg(Color::Gray),
        ImageVariant::Alternate => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let searching = app.input_mode == InputMode::Searching;

    let search_style = if searching {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let header_text = vec![Line::from(vec![
        Span::styled("Search: ", Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{}{}", app.search, if searching { "_" } else { "" }),
            search_style,
        ),
        Span::raw("  |  "),
        Span::styled("Type: ", Style::default().fg(Color::Cyan)),
        Span::styled(
            app.category.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!(
                "Showing {} of {}",
                app.fragments().len(),
                app.session.collection().len()
            ),
            Style::default().fg(Color::White),
        ),
    ])];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Pokédex "),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Name", "Types", "Height", "Weight", "Sprite"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .fragments()
        .iter()
        .map(|card| {
            let cells = vec![
                Cell::from(card.number.clone()),
                Cell::from(card.name.clone()),
                Cell::from(Line::from(badge_spans(card))),
                Cell::from(format!("{}m", card.height_m)),
                Cell::from(format!("{}kg", card.weight_kg)),
                Cell::from(card.image.label).style(variant_style(card.image.variant)),
            ];

            Row::new(cells).height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(16),
            Constraint::Length(22),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Creatures "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_card(f: &mut Frame, area: Rect, app: &App) {
    let card = match app.selected_fragment() {
        Some(c) => c,
        None => {
            let no_selection = Paragraph::new("No creature selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Card "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut badges = vec![Span::raw("  ")];
    badges.extend(badge_spans(card));

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("  {}", card.name.to_uppercase()),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(card.number.clone(), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from(badges),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Height: ", label),
            Span::raw(format!("{}m", card.height_m)),
        ]),
        Line::from(vec![
            Span::styled("  Weight: ", label),
            Span::raw(format!("{}kg", card.weight_kg)),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Sprite: ", label),
            Span::styled(card.image.label, variant_style(card.image.variant)),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                card.image.src.clone().unwrap_or_else(|| "(no image)".to_string()),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to see the shiny version!",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Card "),
    );

    f.render_widget(panel, area);
}

fn render_loading(f: &mut Frame, area: Rect) {
    let loading = Paragraph::new("\n  Loading Pokédex...").block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(loading, area);
}

fn render_empty(f: &mut Frame, area: Rect) {
    let empty = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "  No creatures found",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "  Press c to clear the filters",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Creatures "),
    );
    f.render_widget(empty, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let error = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Could not load the Pokédex",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("  {}", message), Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(vec![
            Span::raw("  Press "),
            Span::styled("r", Style::default().fg(Color::Yellow)),
            Span::raw(" to try again"),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Error "),
    );
    f.render_widget(error, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.fragments().len();

    let mut status_spans = vec![Span::styled(
        format!(" Card: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.input_mode == InputMode::Searching {
        status_spans.push(Span::raw(" | Typing filters as you go | "));
        status_spans.push(Span::styled("Enter/Esc", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Done"));
    } else {
        for (key, action) in [
            ("/", " Search | "),
            ("Tab", " Type | "),
            ("Enter", " Shiny | "),
            ("c", " Clear | "),
            ("r", " Reload | "),
        ] {
            status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(action));
        }
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokedex_gallery::{Collection, Creature};

    fn creature(id: u32, name: &str, categories: &[&str]) -> Creature {
        Creature {
            id,
            name: name.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            primary_image: Some(format!("front/{}.png", id)),
            alternate_image: Some(format!("shiny/{}.png", id)),
            height: 10,
            weight: 100,
        }
    }

    fn app() -> App {
        App::new(Session::from_collection(Collection::from_batch(vec![
            creature(1, "bulbasaur", &["grass", "poison"]),
            creature(4, "charmander", &["fire"]),
            creature(25, "pikachu", &["electric"]),
        ])))
    }

    fn press(app: &mut App, code: KeyCode) -> Option<UiOutcome> {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_every_keystroke_refilters() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Searching);

        press(&mut app, KeyCode::Char('A'));
        assert_eq!(app.fragments().len(), 3);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.fragments().len(), 1); // charmander
        assert_eq!(app.fragments()[0].id, 4);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.fragments().len(), 3);

        // 'q' is text while searching
        assert_eq!(press(&mut app, KeyCode::Char('q')), None);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Browsing);
    }

    #[test]
    fn test_category_cycling_and_clear() {
        let mut app = app();
        press(&mut app, KeyCode::Tab); // normal
        assert!(app.fragments().is_empty());
        assert_eq!(app.state.selected(), None);

        press(&mut app, KeyCode::Tab); // fire
        assert_eq!(app.fragments()[0].name, "charmander");

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.category, CategorySelector::All);
        assert_eq!(app.fragments().len(), 3);
    }

    #[test]
    fn test_enter_toggles_selected_card() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        let card = app.selected_fragment().unwrap();
        assert_eq!(card.id, 4);
        assert_eq!(card.image.variant, ImageVariant::Alternate);

        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.selected_fragment().unwrap().image.variant,
            ImageVariant::Primary
        );
    }

    #[test]
    fn test_quit_and_reload_keys() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Char('r')), Some(UiOutcome::Reload));
        assert_eq!(press(&mut app, KeyCode::Char('q')), Some(UiOutcome::Quit));
    }

    #[test]
    fn test_paging_with_no_results_keeps_selection_empty() {
        let mut app = app();
        app.category = CategorySelector::parse("water");
        app.apply_filters();
        assert!(app.fragments().is_empty());

        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.state.selected(), None);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.state.selected(), None);
    }

    #[test]
    fn test_ctrl_c_quits_while_searching() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        let outcome = app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        assert_eq!(outcome, Some(UiOutcome::Quit));
        assert!(app.search.is_empty());
    }
}
