//! TUI rendering and terminal management (impure shell)

pub mod constants;
pub mod layout;
mod message;
pub mod styles;

pub use message::MessageList;
pub use styles::{BubbleStyles, ColorConfig};

use crate::model::AppError;
use crate::view::constants::{EVENT_POLL_INTERVAL, PREFETCH_LOOKAHEAD};
use crate::view_state::{spawn_prefetch, CellMeasurer, ConversationView, PrefetchHandle};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, widgets::Paragraph, Terminal};
use std::io::{self, Stdout};
use std::ops::Range;
use tracing::{debug, warn};

/// Background measurement in flight, with the item range it covers.
struct PendingPrefetch {
    handle: PrefetchHandle,
    range: Range<usize>,
}

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    terminal: Terminal<B>,
    conversation: ConversationView<CellMeasurer>,
    styles: BubbleStyles,
    prefetch: Option<PendingPrefetch>,
}

impl TuiApp<CrosstermBackend<Stdout>> {
    /// Set up the terminal in raw mode with alternate screen.
    pub fn new(conversation: ConversationView<CellMeasurer>) -> Result<Self, AppError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self::with_terminal(
            terminal,
            conversation,
            BubbleStyles::default(),
        ))
    }
}

impl<B> TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    /// Wrap an existing terminal.
    pub fn with_terminal(
        terminal: Terminal<B>,
        conversation: ConversationView<CellMeasurer>,
        styles: BubbleStyles,
    ) -> Self {
        Self {
            terminal,
            conversation,
            styles,
            prefetch: None,
        }
    }

    /// The conversation being displayed.
    pub fn conversation(&self) -> &ConversationView<CellMeasurer> {
        &self.conversation
    }

    /// The underlying terminal.
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Run the main event loop
    ///
    /// Returns when user quits (q or Ctrl+C). Redraws on input and resize,
    /// and when a background prefetch delivers new heights.
    pub fn run(&mut self) -> Result<(), AppError> {
        self.draw()?;

        loop {
            if event::poll(EVENT_POLL_INTERVAL)? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key) {
                            self.cancel_prefetch();
                            return Ok(());
                        }
                        self.draw()?;
                    }
                    Event::Resize(width, height) => {
                        self.handle_resize(width, height);
                        self.draw()?;
                    }
                    _ => {}
                }
            } else if self.collect_prefetch() {
                self.draw()?;
            }
        }
    }

    /// Handle a key press. Returns true if the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        let page = isize::try_from(self.conversation.viewport_height()).unwrap_or(isize::MAX);
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => self.scroll(|c| c.scroll_by(-1)),
            KeyCode::Down => self.scroll(|c| c.scroll_by(1)),
            KeyCode::PageUp => self.scroll(|c| c.scroll_by(-page)),
            KeyCode::PageDown => self.scroll(|c| c.scroll_by(page)),
            KeyCode::Home => self.scroll(ConversationView::scroll_to_top),
            KeyCode::End => self.scroll(ConversationView::scroll_to_bottom),
            KeyCode::Char('t') => {
                let visible = !self.conversation.engine().is_typing_indicator_visible();
                let command = self.conversation.set_typing(visible);
                debug!(visible, ?command, "Typing indicator toggled from keyboard");
            }
            KeyCode::Char('a') => {
                let enabled = !self.conversation.anchor().auto_scroll();
                self.conversation.set_auto_scroll(enabled);
                if enabled {
                    self.scroll(ConversationView::scroll_to_bottom);
                }
            }
            _ => {}
        }
        false
    }

    /// Scrolling moves the visible range, so in-flight prefetch is stale.
    fn scroll(&mut self, action: impl FnOnce(&mut ConversationView<CellMeasurer>)) {
        self.cancel_prefetch();
        action(&mut self.conversation);
    }

    fn handle_resize(&mut self, width: u16, height: u16) {
        debug!(width, height, "Handling resize");
        self.sync_viewport(width, layout::list_height(height));
    }

    fn sync_viewport(&mut self, width: u16, height: u16) {
        let height = usize::from(height);
        let unchanged = self.conversation.engine().context().container_width() == width
            && self.conversation.viewport_height() == height;
        if unchanged {
            return;
        }
        self.cancel_prefetch();
        if let Err(err) = self.conversation.resize(width, height) {
            warn!(width, height, error = %err, "Ignoring resize");
        }
    }

    /// Render the current frame, then queue measurement around it.
    fn draw(&mut self) -> Result<(), AppError> {
        let size = self.terminal.size()?;
        self.sync_viewport(size.width, layout::list_height(size.height));

        let status = layout::status_line(&self.conversation);
        let text = self.conversation.engine().context().style().text;
        let styles = self.styles;
        let items = self.conversation.visible_items();

        self.terminal.draw(|frame| {
            let (list_area, status_area) = layout::split(frame.area());
            frame.render_widget(MessageList::new(&items, &text, &styles), list_area);
            frame.render_widget(
                Paragraph::new(status.as_str()).style(styles.status_bar()),
                status_area,
            );
        })?;

        self.schedule_prefetch();
        Ok(())
    }

    fn schedule_prefetch(&mut self) {
        if self.prefetch.is_some() {
            return;
        }
        let job = self.conversation.prefetch_job(PREFETCH_LOOKAHEAD);
        if job.is_empty() {
            return;
        }

        let visible = self.conversation.engine().visible_range();
        let range = visible.start.saturating_sub(PREFETCH_LOOKAHEAD)
            ..visible.end.saturating_add(PREFETCH_LOOKAHEAD);
        debug!(items = job.len(), ?range, "Scheduling prefetch");

        match spawn_prefetch(job, CellMeasurer) {
            Ok(handle) => self.prefetch = Some(PendingPrefetch { handle, range }),
            Err(err) => warn!(error = %err, "Could not spawn prefetch thread"),
        }
    }

    /// Adopt a finished prefetch. Returns true when heights changed.
    fn collect_prefetch(&mut self) -> bool {
        let finished = self
            .prefetch
            .as_ref()
            .is_some_and(|pending| pending.handle.is_finished());
        if !finished {
            return false;
        }
        let Some(PendingPrefetch { handle, range }) = self.prefetch.take() else {
            return false;
        };

        match handle.join() {
            Some(outcome) if outcome.merged => self.conversation.adopt_prefetched(range) > 0,
            Some(_) => false,
            None => {
                warn!("Prefetch thread panicked");
                false
            }
        }
    }

    /// Cancel without waiting; a late result may still land in the cache.
    fn cancel_prefetch(&mut self) {
        if let Some(pending) = self.prefetch.take() {
            pending.handle.cancel();
        }
    }
}

/// Initialize and run the TUI application.
///
/// Handles terminal setup, runs the event loop, and restores the terminal
/// on exit, including when the loop fails.
///
/// Note: Logging must be initialized by caller before calling this function.
pub fn run(conversation: ConversationView<CellMeasurer>) -> Result<(), AppError> {
    let result = TuiApp::new(conversation).and_then(|mut app| app.run());
    restore_terminal()?;
    result
}

/// Restore terminal to normal state
fn restore_terminal() -> Result<(), AppError> {
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
