use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use aimon_core::config::{SettingKey, SharedSettings, REFRESH_INTERVALS};
use aimon_core::usage::{
    ControllerHandle, DisplayMode, PanelIndicator, PopupView, RefreshController, ToolId,
    UsageSource,
};

use super::components::{HelpPopup, IndicatorBar, StatusBar, ToolPanel};
use super::Layout;

/// Main application
pub struct App {
    settings: SharedSettings,
    source: Arc<dyn UsageSource>,
    layout: Layout,
    show_help: bool,
    running: bool,
}

impl App {
    /// Create a new application
    pub fn new(settings: SharedSettings, source: Arc<dyn UsageSource>) -> Self {
        Self {
            settings,
            source,
            layout: Layout::new(),
            show_help: false,
            running: true,
        }
    }

    /// Run the application
    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        crossterm::terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Start refresh controller
        let mut handle =
            RefreshController::new(Arc::clone(&self.source), Arc::clone(&self.settings)).spawn();

        // Main loop
        let result = self.main_loop(&mut terminal, &handle).await;
        handle.teardown().await;

        // Restore terminal
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        handle: &ControllerHandle,
    ) -> Result<()> {
        while self.running {
            let state = handle.state();
            let settings = self.settings.snapshot();
            let now = Utc::now();
            let indicator = PanelIndicator::build(&state, &settings, now);
            let popup = PopupView::build(&state, &settings, now);

            // Draw UI
            terminal.draw(|frame| {
                let areas = self.layout.calculate(frame.area());

                IndicatorBar::render(frame, areas.header, &indicator, &state);
                ToolPanel::render(frame, areas.body, &popup);
                StatusBar::render(frame, areas.status_bar, &state, &settings);

                if self.show_help {
                    let popup_area = self.layout.popup_area(frame.area(), 60, 70);
                    HelpPopup::render(frame, popup_area);
                }
            })?;

            // Handle events with timeout
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, handle)?;
                    }
                }
            }

            // Let the controller task make progress
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, handle: &ControllerHandle) -> Result<()> {
        // Any key closes the help popup
        if self.show_help {
            self.show_help = false;
            return Ok(());
        }

        let settings = &self.settings;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            KeyCode::Char('r') => {
                debug!("Manual refresh requested");
                handle.request_refresh()?;
            }
            KeyCode::Char('t') => {
                let current = settings
                    .get_string(SettingKey::PanelTool)?
                    .parse::<ToolId>()
                    .unwrap_or(ToolId::Claude);
                settings.set_string(SettingKey::PanelTool, current.next().as_str())?;
            }
            KeyCode::Char('m') => {
                let mode = DisplayMode::from_setting(settings.get_int(SettingKey::PanelDisplayMode)?);
                settings.set_int(SettingKey::PanelDisplayMode, mode.next().as_setting())?;
            }
            KeyCode::Char('i') => {
                let current = settings.get_int(SettingKey::RefreshInterval)?;
                settings.set_int(SettingKey::RefreshInterval, next_interval(current))?;
            }
            KeyCode::Char(c @ '1'..='3') => {
                let tool = ToolId::ALL[c as usize - '1' as usize];
                let key = SettingKey::show(tool);
                let shown = settings.get_bool(key)?;
                settings.set_bool(key, !shown)?;
            }
            _ => {}
        }

        Ok(())
    }
}

/// The allowed refresh interval after `current`, wrapping around
fn next_interval(current: i64) -> i64 {
    REFRESH_INTERVALS
        .iter()
        .map(|&secs| secs as i64)
        .find(|&secs| secs > current)
        .unwrap_or(REFRESH_INTERVALS[0] as i64)
}
