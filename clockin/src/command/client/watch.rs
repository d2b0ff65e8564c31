use super::{connect, Target};
use crate::tui;
use clockin_client::session::{AttendanceSession, SessionConfig, SessionHandle, TimerView};
use clockin_client::settings::Settings;
use clockin_client::timer::SystemClock;
use clockin_common::timestamp::format_time_of_day;
use crossterm::event::{
    Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use eyre::{Context, Result};
use futures_util::stream::StreamExt;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Buffer, Widget};
use ratatui::style::palette::tailwind::{EMERALD, GRAY, RED, SLATE, YELLOW};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use tracing::error;

struct App {
    session: SessionHandle,
    view: TimerView,
    running: bool,
}

impl App {
    fn quit(&mut self) {
        self.running = false;
    }

    fn handle_terminal_event(&mut self, ev: CrosstermEvent) {
        let Some(key) = ev_key_press(&ev) else {
            return;
        };

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('t') | KeyCode::Enter => self.session.toggle(),
            KeyCode::Char('r') => self.session.refresh(),
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            _ => {}
        }
    }

    fn build_context(&self) -> Paragraph {
        let view = &self.view;
        let status = if !view.loaded {
            Span::styled("loading", Style::new().fg(GRAY.c500))
        } else if view.status.is_checked_in() {
            let since = view
                .check_in_time
                .map(|x| format!(" since {}", format_time_of_day(x)))
                .unwrap_or_default();
            Span::styled(format!("checked in{since}"), Style::new().fg(EMERALD.c400))
        } else {
            Span::styled("checked out", Style::new().fg(GRAY.c300))
        };

        Paragraph::new(Line::from(vec![
            Span::styled(" clockin ", Style::new().bg(SLATE.c800).fg(GRAY.c200)),
            Span::raw(format!("  {}  ", view.employee_id)),
            status,
        ]))
    }

    fn build_clock(&self) -> Paragraph {
        let title = if self.view.busy {
            " Today (saving) "
        } else {
            " Today "
        };
        let style = if self.view.status.is_checked_in() {
            Style::new().fg(EMERALD.c300).add_modifier(Modifier::BOLD)
        } else {
            Style::new().fg(GRAY.c200).add_modifier(Modifier::BOLD)
        };

        Paragraph::new(vec![Line::raw(""), Line::styled(self.view.clock.clone(), style)])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::all()).title(title))
    }

    fn build_notice(&self) -> Paragraph {
        let line = match &self.view.notice {
            Some(notice) if notice.is_error() => {
                Line::styled(notice.text().to_string(), Style::new().fg(RED.c400))
            }
            Some(notice) => Line::styled(notice.text().to_string(), Style::new().fg(YELLOW.c300)),
            None => Line::raw(""),
        };
        Paragraph::new(line)
    }

    fn build_history(&self, height: u16) -> Paragraph {
        let lines = self
            .view
            .history
            .iter()
            .take(height.saturating_sub(2) as usize)
            .map(|x| {
                Line::from(vec![
                    Span::styled(format!("{:<12}", x.date), Style::new().fg(GRAY.c400)),
                    Span::raw(format!(
                        "{:>5} - {:<5}  ",
                        x.check_in_time.map(format_time_of_day).unwrap_or("--:--".into()),
                        x.check_out_time.map(format_time_of_day).unwrap_or("--:--".into()),
                    )),
                    Span::raw(x.label.clone()),
                ])
            })
            .collect::<Vec<_>>();

        Paragraph::new(lines).block(Block::default().borders(Borders::all()).title(" History "))
    }

    fn render_page(&self, frame: &mut Frame) {
        let layout = Layout::new(
            Direction::Vertical,
            vec![
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ],
        );
        let [context_l, spacer_l, clock_l, notice_l, history_l, help_l] =
            layout.areas(frame.area());

        frame.render_widget(self.build_context(), context_l);
        frame.render_widget(
            Paragraph::new(Line::raw("-".repeat(spacer_l.width.into())))
                .style(Style::new().fg(GRAY.c500)),
            spacer_l,
        );
        frame.render_widget(self.build_clock(), clock_l);
        frame.render_widget(self.build_notice(), notice_l);
        frame.render_widget(self.build_history(history_l.height), history_l);
        frame.render_widget(HelpWidget { loaded: self.view.loaded }, help_l);
    }
}

struct HelpWidget {
    loaded: bool,
}

impl Widget for HelpWidget {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let key = Style::new().bg(SLATE.c800).fg(GRAY.c400);
        let mut spans = vec![];
        if self.loaded {
            spans.push(Span::raw("   Check in/out "));
            spans.push(Span::styled(" space ", key));
        }
        spans.extend([
            Span::raw("   Refresh "),
            Span::styled(" r ", key),
            Span::raw("   Exit "),
            Span::styled(" q ", key),
        ]);

        Paragraph::new(
            Line::from(spans)
                .style(Style::new().fg(GRAY.c200))
                .alignment(Alignment::Right),
        )
        .render(area, buf);
    }
}

fn ev_key_press(ev: &CrosstermEvent) -> Option<&KeyEvent> {
    match ev {
        CrosstermEvent::Key(key_event) if key_event.kind == KeyEventKind::Press => Some(key_event),
        _ => None,
    }
}

pub async fn run(settings: &Settings, target: &Target) -> Result<()> {
    let (api, employee_id) = connect(settings, target)?;
    let session = AttendanceSession::spawn(
        api,
        SystemClock,
        employee_id,
        SessionConfig::from(settings),
    );
    let mut views = session.subscribe();

    tui::install_hooks()?;
    let mut terminal = tui::init()?;
    let mut crossterm = EventStream::new();
    let mut app = App {
        view: session.view(),
        session,
        running: true,
    };

    while app.running {
        terminal
            .draw(|frame| app.render_page(frame))
            .wrap_err("failed to render terminal")?;

        tokio::select! {
            event = crossterm.next() => match event {
                Some(Ok(ev)) => app.handle_terminal_event(ev),
                Some(Err(err)) => {
                    error!("failed to read terminal event: {err}");
                    app.quit();
                }
                None => app.quit(),
            },
            changed = views.changed() => match changed {
                Ok(()) => app.view = views.borrow_and_update().clone(),
                Err(_) => app.quit(),
            },
        }
    }

    tui::restore()?;
    app.session.shutdown().await;

    Ok(())
}
