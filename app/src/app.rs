//! Main application structure for Lunary

use crate::commands::{Command, HELP};
use crate::engine::{DemoEngine, UnavailableEngine};
use crate::platform::{ArgsPicker, OpenLauncher};
use crate::presentation::{self, ConsoleSink};
use lunary_core::index::{simulate_rebuild, RebuildPlan};
use lunary_core::{
    AppSettings, ConfigStore, DirectoryRepository, FileLauncher, IndexStatusRepository,
    LunaryResult, SearchEngine, SearchSession, SessionEvent, SessionPhase, SettingsPatch,
    SettingsRepository,
};
use lunary_theming::{ManualAppearance, PreferenceContext, SystemAppearance, ThemeController};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Main application structure
pub struct LunaryApp {
    /// Settings repository
    settings: SettingsRepository,
    /// Watched folder repository
    directories: DirectoryRepository,
    /// Index status repository
    index_status: IndexStatusRepository,
    /// Search session
    session: SearchSession,
    /// Theme controller
    theme: ThemeController,
    /// Simulated OS appearance
    appearance: Arc<ManualAppearance>,
    /// UI language
    language: PreferenceContext<String>,
    /// Highlight display toggle, mirrored from settings
    highlighting: Arc<Mutex<bool>>,
    /// File launcher
    launcher: Arc<dyn FileLauncher>,
    /// Running index rebuild
    rebuild: Option<JoinHandle<()>>,
    /// Demo mode flag
    demo_mode: bool,
}

impl LunaryApp {
    /// Create a new Lunary application
    pub async fn new(demo_mode: bool) -> LunaryResult<Self> {
        info!("Initializing Lunary application");

        let config_dir = lunary_core::get_config_dir();
        let data_dir = lunary_core::get_data_dir();
        let store = Arc::new(ConfigStore::open(&config_dir, &data_dir).await);
        info!(
            "Configuration in {} (backends: {})",
            config_dir.display(),
            store.backend_names().join(", ")
        );

        let settings = SettingsRepository::new(store.clone());
        let directories = DirectoryRepository::new(store.clone());
        let index_status = IndexStatusRepository::new(store);

        let engine: Arc<dyn SearchEngine> = if demo_mode {
            Arc::new(DemoEngine::new(lunary_core::now_millis()))
        } else {
            Arc::new(UnavailableEngine)
        };
        let session = SearchSession::new(engine);

        let appearance = Arc::new(ManualAppearance::from_env());
        let theme = ThemeController::new(
            settings.clone(),
            appearance.clone() as Arc<dyn SystemAppearance>,
            Arc::new(ConsoleSink::default()),
        );

        Ok(Self {
            settings,
            directories,
            index_status,
            session,
            theme,
            appearance,
            language: PreferenceContext::new(AppSettings::default().ui.language),
            highlighting: Arc::new(Mutex::new(true)),
            launcher: Arc::new(OpenLauncher),
            rebuild: None,
            demo_mode,
        })
    }

    /// Run the interactive shell until `:quit` or end of input
    pub async fn run(mut self) -> LunaryResult<()> {
        self.load_preferences().await;

        if self.demo_mode {
            info!("Running in demo mode");
            println!("Demo mode: searching a sample corpus. Try \"report\".");
        }
        println!("Lunary v{}. Type :help for commands.", lunary_core::VERSION);

        let printer = self.spawn_printer();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match Command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command).await,
                Err(e) => println!("{}", e),
            }
        }

        self.shutdown().await;
        printer.abort();
        Ok(())
    }

    async fn load_preferences(&self) {
        let stored = self.settings.load().await;
        let mut effective = stored.clone();
        effective.apply_env_overrides();

        self.theme.initialize().await;
        if effective.ui.theme != stored.ui.theme {
            info!("Theme overridden from environment: {}", effective.ui.theme);
            self.theme.apply(effective.ui.theme);
        }

        self.language.set(effective.ui.language.clone());
        self.language
            .subscribe(|language: &String| println!("(language: {})", language));
        *self.highlighting.lock() = effective.search.enable_highlighting;

        let status = self.index_status.load().await;
        if status.is_indexing {
            // A rebuild cannot survive a restart
            warn!("Previous index rebuild did not finish");
            let mut status = status;
            status.is_indexing = false;
            self.index_status.save(&status).await;
        }
    }

    fn spawn_printer(&self) -> JoinHandle<()> {
        let session = self.session.clone();
        let highlighting = self.highlighting.clone();
        let mut events = session.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Updated) => {
                        let snapshot = session.snapshot();
                        if snapshot.phase == SessionPhase::Settled && snapshot.last_error.is_none() {
                            let highlight = *highlighting.lock();
                            print!("{}", presentation::render_results(&snapshot, highlight));
                        }
                    }
                    Ok(SessionEvent::SearchFailed(message)) => println!("Search failed: {}", message),
                    Err(RecvError::Lagged(skipped)) => debug!("Skipped {} session events", skipped),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Query(text) => self.session.set_query(text),
            Command::Submit => self.session.submit(),
            Command::NextPage => {
                if !self.session.next_page() {
                    println!("Already on the last page");
                }
            }
            Command::PrevPage => {
                if !self.session.prev_page() {
                    println!("Already on the first page");
                }
            }
            Command::GotoPage(page) => {
                if !self.session.goto_page(page) {
                    println!("Staying on page {}", self.session.snapshot().page.page());
                }
            }
            Command::PerPage(per_page) => {
                if let Err(e) = self.session.set_per_page(per_page) {
                    println!("{}", e);
                }
            }
            Command::ToggleType(file_type) => {
                let selected = self.session.toggle_file_type(&file_type);
                println!("{} filter {}", file_type, if selected { "on" } else { "off" });
            }
            Command::DatePreset(preset) => self.session.apply_date_preset(preset),
            Command::ClearFilters => self.session.clear_filters(),
            Command::History => print!("{}", presentation::render_history(&self.session.history())),
            Command::SelectHistory(n) => match self.session.history().get(n - 1) {
                Some(text) => self.session.select_history(text),
                None => println!("No history entry {}", n),
            },
            Command::ForgetHistory(text) => {
                if !self.session.remove_history(&text) {
                    println!("{:?} is not in the history", text);
                }
            }
            Command::ClearHistory => self.session.clear_history(),
            Command::Open(n) => self.with_result(n, |launcher, path| launcher.open(path)),
            Command::Reveal(n) => self.with_result(n, |launcher, path| launcher.reveal(path)),
            Command::Directories => {
                print!("{}", presentation::render_directories(&self.directories.load().await))
            }
            Command::AddDirectories(paths) => {
                let picker = ArgsPicker::new(paths);
                let dirs = self.directories.add_from_picker(&picker).await;
                print!("{}", presentation::render_directories(&dirs));
            }
            Command::RemoveDirectory(path) => {
                print!("{}", presentation::render_directories(&self.directories.remove(&path).await))
            }
            Command::ToggleDirectory(path) => {
                let dirs = self.directories.toggle_enabled(&path).await;
                print!("{}", presentation::render_directories(&dirs));
            }
            Command::ToggleRecursive(path) => {
                let dirs = self.directories.toggle_recursive(&path).await;
                print!("{}", presentation::render_directories(&dirs));
            }
            Command::Status => print!("{}", presentation::render_status(&self.index_status.current().await)),
            Command::Rebuild => self.start_rebuild(),
            Command::Settings => print!("{}", presentation::render_settings(&self.settings.load().await)),
            Command::Set(patch) => self.update_settings(patch).await,
            Command::Exclude(pattern) => {
                if !self.settings.add_exclude_pattern(&pattern).await {
                    println!("{:?} is already excluded", pattern);
                }
            }
            Command::Include(pattern) => {
                if !self.settings.remove_exclude_pattern(&pattern).await {
                    println!("{:?} was not excluded", pattern);
                }
            }
            Command::ResetSettings => {
                let settings = self.settings.reset().await;
                self.theme.apply(settings.ui.theme);
                self.language.set(settings.ui.language.clone());
                *self.highlighting.lock() = settings.search.enable_highlighting;
            }
            Command::Theme(theme) => self.theme.set_theme(theme).await,
            Command::SystemDark(dark) => self.appearance.set_dark(dark),
            Command::Language(language) => {
                self.update_settings(SettingsPatch::Ui(lunary_core::config::UiPatch {
                    language: Some(language),
                    ..Default::default()
                }))
                .await
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
    }

    async fn update_settings(&self, patch: SettingsPatch) {
        match self.settings.update(patch).await {
            Ok(settings) => {
                self.theme.apply(settings.ui.theme);
                self.language.set(settings.ui.language.clone());
                *self.highlighting.lock() = settings.search.enable_highlighting;
                println!("Settings saved");
            }
            Err(e) => println!("{}", e),
        }
    }

    fn with_result<F>(&self, n: usize, action: F)
    where
        F: FnOnce(&dyn FileLauncher, &Path),
    {
        let snapshot = self.session.snapshot();
        match snapshot.results.get(n - 1) {
            Some(result) => action(self.launcher.as_ref(), Path::new(&result.file_path)),
            None => println!("No result {} on this page", n),
        }
    }

    fn start_rebuild(&mut self) {
        if self.rebuild.as_ref().map_or(false, |task| !task.is_finished()) {
            println!("A rebuild is already running");
            return;
        }

        let index_status = self.index_status.clone();
        let directories = self.directories.clone();
        self.rebuild = Some(tokio::spawn(async move {
            let plan = RebuildPlan::default();
            let mut last_reported = None;
            let status = simulate_rebuild(&plan, |status| {
                index_status.report_progress(status);
                let quarter = status.progress / 25;
                if last_reported != Some(quarter) {
                    last_reported = Some(quarter);
                    println!(
                        "Indexing {}% ({} / {} files)",
                        status.progress, status.indexed_files, status.total_files
                    );
                }
            })
            .await;

            index_status.save(&status).await;
            directories.mark_indexed(status.last_updated).await;
            print!("{}", presentation::render_status(&status));
        }));
    }

    async fn shutdown(&mut self) {
        if let Some(task) = self.rebuild.take() {
            if !task.is_finished() {
                warn!("Stopping unfinished index rebuild");
                task.abort();
            }
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!("Index rebuild task failed: {}", e);
                }
            }
        }
        self.session.shutdown();
        self.theme.shutdown();
        self.language.shutdown();
        info!("Lunary shut down");
    }
}
