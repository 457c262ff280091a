use crate::fetch::FetchProgress;
use crate::models::Pokemon;
use crate::sprites::SpriteCache;
use crate::state::{LoadState, Pokedex, Ticket};
use crate::types::{Generation, PokemonType, TypeFilter};
use crate::utils::{format_measurements, format_name, stat_label};
use crate::view::visible_indices;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::io;
use std::sync::Arc;

pub struct App {
    pub pokedex: Pokedex,
    pub generation: Generation,
    pub type_filter: TypeFilter,
    pub visible: Vec<usize>, // indices into pokedex.records()
    pub selected_visible: usize,
    pub progress: Arc<FetchProgress>,
    pub show_sprites: bool,
    pub show_help: bool,
    pub sprites: SpriteCache,
}

impl App {
    pub fn new(generation: Generation, type_filter: TypeFilter) -> Self {
        Self {
            pokedex: Pokedex::default(),
            generation,
            type_filter,
            visible: Vec::new(),
            selected_visible: 0,
            progress: Arc::new(FetchProgress::default()),
            show_sprites: true,
            show_help: false,
            sprites: SpriteCache::default(),
        }
    }

    /// Enters `Loading` for the selected generation.
    pub fn begin_load(&mut self) -> Ticket {
        let ticket = self.pokedex.begin(self.generation);
        self.progress = Arc::new(FetchProgress::default());
        self.sprites.clear();
        self.visible.clear();
        self.selected_visible = 0;
        ticket
    }

    /// Applies a finished batch unless a newer one has been started since.
    pub fn finish_load(&mut self, ticket: Ticket, records: Vec<Pokemon>) -> bool {
        if !self.pokedex.complete(ticket, records) {
            return false;
        }
        self.selected_visible = 0;
        self.apply_filter();
        true
    }

    pub fn selected(&self) -> Option<&Pokemon> {
        let idx = *self.visible.get(self.selected_visible)?;
        self.pokedex.records().get(idx)
    }

    pub fn next(&mut self) {
        if !self.visible.is_empty() {
            self.selected_visible = (self.selected_visible + 1) % self.visible.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.visible.is_empty() {
            if self.selected_visible == 0 {
                self.selected_visible = self.visible.len() - 1;
            } else {
                self.selected_visible -= 1;
            }
        }
    }

    pub fn set_type_filter(&mut self, filter: TypeFilter) {
        self.type_filter = filter;
        self.apply_filter();
    }

    pub fn apply_filter(&mut self) {
        self.visible = visible_indices(self.pokedex.records(), self.type_filter);

        if self.visible.is_empty() {
            self.selected_visible = 0;
        } else if self.selected_visible >= self.visible.len() {
            self.selected_visible = self.visible.len() - 1;
        }
    }

    /// Kicks off the sprite download for the selected Pokémon.
    pub fn request_selected_sprite(&self, client: &reqwest::Client) {
        if !self.show_sprites {
            return;
        }
        if let Some((id, url)) = self
            .selected()
            .and_then(|p| p.image.as_deref().map(|url| (p.id, url)))
        {
            self.sprites.request(client, id, url);
        }
    }
}

pub fn draw_ui<B: Backend>(terminal: &mut Terminal<B>, app: &App) -> io::Result<()> {
    terminal
        .draw(|f| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(5)])
                .split(f.size());
            draw_header(f, app, rows[0]);

            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
                .split(rows[1]);
            let left_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(3)])
                .split(chunks[0]);

            draw_list(f, app, left_chunks[0]);
            draw_status(f, app, left_chunks[1]);
            draw_detail(f, app, chunks[1]);

            if app.show_help {
                draw_help(f, centered_rect(60, 50, f.size()));
            }
        })
        .map(|_| ())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_w = r.width.saturating_mul(percent_x) / 100;
    let popup_h = r.height.saturating_mul(percent_y) / 100;
    let popup_x = r.x + (r.width.saturating_sub(popup_w) / 2);
    let popup_y = r.y + (r.height.saturating_sub(popup_h) / 2);
    Rect::new(popup_x, popup_y, popup_w, popup_h)
}

fn draw_header<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let status = match app.pokedex.state() {
        LoadState::Idle => "idle".to_string(),
        LoadState::Loading(_) => "loading...".to_string(),
        LoadState::Ready(batch) => format!(
            "{} of {} shown",
            app.visible.len(),
            batch.records.len()
        ),
    };
    let line = Spans::from(vec![
        Span::raw("Generation "),
        Span::styled(
            format!("◂ {} ▸", app.pokedex.generation().unwrap_or(app.generation)),
            bold,
        ),
        Span::raw("   Type "),
        Span::styled(format!("‹ {} ›", format_name(app.type_filter.tag())), bold),
        Span::raw(format!("   {}", status)),
    ]);
    let header = Paragraph::new(vec![line])
        .block(Block::default().borders(Borders::ALL).title("Pokédex"));
    f.render_widget(header, area);
}

fn draw_list<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Pokémon");
    if app.pokedex.is_loading() {
        f.render_widget(Paragraph::new("Loading...").block(block), area);
        return;
    }

    let records = app.pokedex.records();
    let items: Vec<ListItem> = app
        .visible
        .iter()
        .filter_map(|&i| records.get(i))
        .map(|p| {
            ListItem::new(vec![Spans::from(vec![Span::raw(format!(
                "#{:03} {}",
                p.id,
                format_name(&p.name)
            ))])])
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    if !app.visible.is_empty() {
        state.select(Some(app.selected_visible));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_status<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    if app.pokedex.is_loading() {
        let (fetched, total) = app.progress.snapshot();
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Fetching Pokémon"),
            )
            .gauge_style(Style::default().fg(Color::Green))
            .label(format!("{}/{}", fetched, total))
            .ratio(app.progress.ratio());
        f.render_widget(gauge, area);
    } else {
        let hint = Paragraph::new(vec![Spans::from(Span::raw(
            "←/→ generation  t/T type  h help",
        ))])
        .block(Block::default().borders(Borders::ALL).title("Keys"));
        f.render_widget(hint, area);
    }
}

fn type_badge(tag: &str) -> Span<'static> {
    let (r, g, b) = tag
        .parse::<PokemonType>()
        .map(PokemonType::rgb)
        .unwrap_or((200, 200, 200));
    let lum = 0.2126 * (r as f32) + 0.7152 * (g as f32) + 0.0722 * (b as f32);
    let fg = if lum > 160.0 { Color::Black } else { Color::White };
    Span::styled(
        format!(" {} ", format_name(tag)),
        Style::default().fg(fg).bg(Color::Rgb(r, g, b)),
    )
}

fn draw_detail<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let Some(p) = app.selected() else {
        let msg = match app.pokedex.state() {
            LoadState::Ready(_) => "No Pokémon match the filter",
            _ => "",
        };
        f.render_widget(
            Paragraph::new(msg).block(Block::default().borders(Borders::ALL).title("Details")),
            area,
        );
        return;
    };

    let detail_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(6)])
        .split(area);
    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(10)])
        .split(detail_chunks[0]);

    draw_sprite(f, app, p, top_chunks[0]);

    let mut info_lines: Vec<Spans> = Vec::new();
    info_lines.push(Spans::from(Span::styled(
        format!("{} (#{})", format_name(&p.name), p.id),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let mut type_spans: Vec<Span> = vec![Span::raw("Types: ")];
    for (i, t) in p.types.iter().enumerate() {
        if i > 0 {
            type_spans.push(Span::raw(" "));
        }
        type_spans.push(type_badge(t));
    }
    info_lines.push(Spans::from(type_spans));
    if !p.abilities.is_empty() {
        let abilities: Vec<String> = p.abilities.iter().map(|a| format_name(a)).collect();
        info_lines.push(Spans::from(Span::raw(format!(
            "Abilities: {}",
            abilities.join(", ")
        ))));
    }
    info_lines.push(Spans::from(Span::raw(format_measurements(
        p.height, p.weight,
    ))));
    let info_para = Paragraph::new(info_lines)
        .block(Block::default().borders(Borders::ALL).title("Info"))
        .wrap(Wrap { trim: true });
    f.render_widget(info_para, top_chunks[1]);

    draw_stats(f, app, p, detail_chunks[1]);
}

fn draw_sprite<B: Backend>(f: &mut Frame<B>, app: &App, p: &Pokemon, rect: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Sprite");
    if !app.show_sprites {
        f.render_widget(Paragraph::new("(sprites off)").block(block), rect);
        return;
    }
    if p.image.is_none() {
        f.render_widget(Paragraph::new("(no sprite)").block(block), rect);
        return;
    }

    let sprite_w = (rect.width.saturating_sub(2).max(1) as u32).min(64);
    let sprite_h = (rect.height.saturating_sub(2).max(1) as u32).min(64);
    let para = match app.sprites.pixels(p.id, sprite_w, sprite_h) {
        Some(rows) => {
            let text: Vec<Spans> = rows
                .iter()
                .map(|row| {
                    Spans::from(
                        row.iter()
                            .map(|&(r, g, b)| {
                                Span::styled(" ", Style::default().bg(Color::Rgb(r, g, b)))
                            })
                            .collect::<Vec<_>>(),
                    )
                })
                .collect();
            Paragraph::new(text)
        }
        None if app.sprites.is_pending(p.id) => Paragraph::new("(loading)"),
        None => Paragraph::new("(no sprite)"),
    };
    f.render_widget(para.block(block), rect);
}

fn draw_stats<B: Backend>(f: &mut Frame<B>, app: &App, p: &Pokemon, rect: Rect) {
    // NAME (padded) | VALUE | [bar...]
    let inner_w = rect.width.saturating_sub(2) as usize;
    let name_w = 10usize;
    let val_w = 4usize;
    let bar_max_w = inner_w.saturating_sub(name_w + val_w + 2);

    // bars share one scale across the batch so entries are comparable
    let global_max = app
        .pokedex
        .records()
        .iter()
        .flat_map(|pp| pp.stats.iter().filter_map(|s| s.base_stat))
        .max()
        .unwrap_or(1) as f32;
    let scale_max = global_max.clamp(1.0, 255.0);

    let stat_lines: Vec<Spans> = p
        .stats
        .iter()
        .map(|st| {
            let value = st.base_stat.map_or_else(|| "?".to_string(), |v| v.to_string());
            let ratio = (st.base_stat.unwrap_or(0) as f32 / scale_max).min(1.0);
            let bar = "█".repeat((ratio * bar_max_w as f32).round() as usize);
            Spans::from(Span::raw(format!(
                "{:<name_w$} {:>val_w$} {}",
                stat_label(&st.name),
                value,
                bar,
                name_w = name_w,
                val_w = val_w
            )))
        })
        .collect();

    let stats_para =
        Paragraph::new(stat_lines).block(Block::default().borders(Borders::ALL).title("Base Stats"));
    f.render_widget(stats_para, rect);
}

fn draw_help<B: Backend>(f: &mut Frame<B>, area: Rect) {
    let help_lines: Vec<Spans> = vec![
        Spans::from(Span::styled(
            "Keybindings",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Spans::from(Span::raw("")),
        Spans::from(Span::raw("q          Quit")),
        Spans::from(Span::raw("Up/Down    Navigate list")),
        Spans::from(Span::raw("Left/Right Previous/next generation")),
        Spans::from(Span::raw("t / T      Next/previous type filter")),
        Spans::from(Span::raw("a          Show all types")),
        Spans::from(Span::raw("r          Reload generation")),
        Spans::from(Span::raw("s          Toggle sprites")),
        Spans::from(Span::raw("h / F1     Toggle this help")),
    ];
    let help_para = Paragraph::new(help_lines)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true });
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help_para, area);
}
