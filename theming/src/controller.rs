//! Theme controller

use lunary_core::{SettingsRepository, ThemePreference};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::{debug, info};

use crate::appearance::SystemAppearance;
use crate::context::PreferenceContext;

/// Whatever renders the UI in light or dark colours
pub trait PresentationSink: Send + Sync {
    fn apply(&self, dark: bool);
}

/// Owns the theme mode and keeps the presentation in sync with it.
///
/// While the mode is `System` a background task follows the OS preference.
/// That task is stopped when the mode changes away from `System`, on
/// [`shutdown`](Self::shutdown), and on drop.
pub struct ThemeController {
    mode: PreferenceContext<ThemePreference>,
    settings: SettingsRepository,
    appearance: Arc<dyn SystemAppearance>,
    sink: Arc<dyn PresentationSink>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl ThemeController {
    /// Create a controller starting in `System` mode. Nothing is applied
    /// until [`initialize`](Self::initialize) or [`set_theme`](Self::set_theme).
    pub fn new(
        settings: SettingsRepository,
        appearance: Arc<dyn SystemAppearance>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        Self {
            mode: PreferenceContext::new(ThemePreference::default()),
            settings,
            appearance,
            sink,
            listener: Mutex::new(None),
        }
    }

    /// Adopt the stored theme and apply it
    pub async fn initialize(&self) -> ThemePreference {
        let theme = self.settings.load().await.ui.theme;
        info!("Initial theme: {}", theme);
        self.apply(theme);
        theme
    }

    /// Switch theme, apply it and store it
    pub async fn set_theme(&self, theme: ThemePreference) {
        self.apply(theme);
        self.settings.set_theme(theme).await;
    }

    /// Current mode
    pub fn mode(&self) -> ThemePreference {
        self.mode.get()
    }

    /// Effective dark flag for the current mode
    pub fn is_dark(&self) -> bool {
        self.mode.get().is_dark(self.appearance.prefers_dark())
    }

    /// The observable mode, for views that react to theme changes
    pub fn context(&self) -> &PreferenceContext<ThemePreference> {
        &self.mode
    }

    /// Check if the OS preference is being followed
    pub fn is_following_system(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .map_or(false, |task| !task.is_finished())
    }

    /// Stop following the OS and drop mode listeners
    pub fn shutdown(&self) {
        self.stop_listening();
        self.mode.shutdown();
        debug!("Theme controller shut down");
    }

    /// Switch theme and apply it without storing it
    pub fn apply(&self, theme: ThemePreference) {
        self.mode.set(theme);
        let dark = self.is_dark();
        debug!("Applying theme {} (dark = {})", theme, dark);
        self.sink.apply(dark);

        if theme == ThemePreference::System {
            self.start_listening();
        } else {
            self.stop_listening();
        }
    }

    fn start_listening(&self) {
        let mut listener = self.listener.lock();
        if listener.as_ref().map_or(false, |task| !task.is_finished()) {
            return;
        }

        let mut changes = WatchStream::from_changes(self.appearance.watch());
        let mode = self.mode.clone();
        let sink = Arc::clone(&self.sink);
        *listener = Some(tokio::spawn(async move {
            while let Some(dark) = changes.next().await {
                if mode.get() != ThemePreference::System {
                    break;
                }
                debug!("System appearance changed, dark = {}", dark);
                sink.apply(dark);
            }
        }));
        debug!("Following system appearance");
    }

    fn stop_listening(&self) {
        if let Some(task) = self.listener.lock().take() {
            task.abort();
            debug!("Stopped following system appearance");
        }
    }
}

impl Drop for ThemeController {
    fn drop(&mut self) {
        if let Some(task) = self.listener.get_mut().take() {
            task.abort();
        }
    }
}
