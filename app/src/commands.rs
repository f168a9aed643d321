//! Shell command parsing

use lunary_core::config::{IndexingPatch, SearchPatch, UiPatch};
use lunary_core::{DatePreset, LunaryError, LunaryResult, SettingsPatch, ThemePreference};

/// Help text printed by `:help`
pub const HELP: &str = "\
Type text to search (debounced). An empty line clears the results.

Search
  :go                     search the current text now
  :next | :prev           move between result pages
  :page N                 jump to page N
  :per N                  results per page (10, 20, 50, 100)
  :type EXT               toggle a file type filter (txt, md, pdf, doc, xls, ppt)
  :date any|day|week|month
  :clear-filters
  :history                list recent queries
  :history N              search recent query N again
  :forget TEXT            remove a query from the history
  :clear-history
  :open N | :reveal N     open result N, or show it in the file browser

Folders and index
  :dirs                   list watched folders
  :add PATH...            watch folders
  :remove PATH            stop watching a folder
  :toggle PATH            enable or disable a folder
  :recursive PATH         toggle subfolder indexing
  :status                 show index status
  :rebuild                rebuild the index

Settings
  :settings               show settings
  :set KEY VALUE          e.g. :set search.resultsPerPage 50
  :exclude PATTERN        add an exclude pattern
  :include PATTERN        remove an exclude pattern
  :reset-settings
  :theme light|dark|system
  :system-dark on|off     simulate the OS dark mode preference
  :lang CODE

  :help | :quit";

/// One line of shell input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Query(String),
    Submit,
    NextPage,
    PrevPage,
    GotoPage(u32),
    PerPage(u32),
    ToggleType(String),
    DatePreset(DatePreset),
    ClearFilters,
    History,
    SelectHistory(usize),
    ForgetHistory(String),
    ClearHistory,
    Open(usize),
    Reveal(usize),
    Directories,
    AddDirectories(Vec<String>),
    RemoveDirectory(String),
    ToggleDirectory(String),
    ToggleRecursive(String),
    Status,
    Rebuild,
    Settings,
    Set(SettingsPatch),
    Exclude(String),
    Include(String),
    ResetSettings,
    Theme(ThemePreference),
    SystemDark(bool),
    Language(String),
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Lines not starting with `:` are query text.
    pub fn parse(line: &str) -> LunaryResult<Self> {
        let Some(command) = line.trim().strip_prefix(':') else {
            return Ok(Command::Query(line.trim_end_matches(['\r', '\n']).to_string()));
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        let command = match name {
            "go" | "submit" => Command::Submit,
            "next" | "n" => Command::NextPage,
            "prev" | "p" => Command::PrevPage,
            "page" => Command::GotoPage(number(rest, "page")?),
            "per" => Command::PerPage(number(rest, "per")?),
            "type" => Command::ToggleType(required(rest, "type")?),
            "date" => Command::DatePreset(required(rest, "date")?.parse()?),
            "clear-filters" => Command::ClearFilters,
            "history" if rest.is_empty() => Command::History,
            "history" => Command::SelectHistory(index(rest, "history")?),
            "forget" => Command::ForgetHistory(required(rest, "forget")?),
            "clear-history" => Command::ClearHistory,
            "open" => Command::Open(index(rest, "open")?),
            "reveal" => Command::Reveal(index(rest, "reveal")?),
            "dirs" => Command::Directories,
            "add" => {
                let paths: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
                if paths.is_empty() {
                    return Err(LunaryError::validation("usage: :add PATH..."));
                }
                Command::AddDirectories(paths)
            }
            "remove" => Command::RemoveDirectory(required(rest, "remove")?),
            "toggle" => Command::ToggleDirectory(required(rest, "toggle")?),
            "recursive" => Command::ToggleRecursive(required(rest, "recursive")?),
            "status" => Command::Status,
            "rebuild" => Command::Rebuild,
            "settings" => Command::Settings,
            "set" => {
                let (key, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| LunaryError::validation("usage: :set KEY VALUE"))?;
                Command::Set(settings_patch(key, value.trim())?)
            }
            "exclude" => Command::Exclude(required(rest, "exclude")?),
            "include" => Command::Include(required(rest, "include")?),
            "reset-settings" => Command::ResetSettings,
            "theme" => Command::Theme(required(rest, "theme")?.parse()?),
            "system-dark" => Command::SystemDark(flag(rest)?),
            "lang" => Command::Language(required(rest, "lang")?),
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => {
                return Err(LunaryError::validation(format!(
                    "Unknown command :{} (try :help)",
                    other
                )))
            }
        };
        Ok(command)
    }
}

/// Build a settings patch from a `section.field` key
pub fn settings_patch(key: &str, value: &str) -> LunaryResult<SettingsPatch> {
    let patch = match key {
        "search.resultsPerPage" => SettingsPatch::Search(SearchPatch {
            results_per_page: Some(parse_value(key, value)?),
            ..Default::default()
        }),
        "search.matchPrecision" => SettingsPatch::Search(SearchPatch {
            match_precision: Some(parse_value(key, value)?),
            ..Default::default()
        }),
        "search.enableHighlighting" => SettingsPatch::Search(SearchPatch {
            enable_highlighting: Some(flag(value)?),
            ..Default::default()
        }),
        "indexing.autoUpdate" => SettingsPatch::Indexing(IndexingPatch {
            auto_update: Some(flag(value)?),
            ..Default::default()
        }),
        "indexing.updateInterval" => SettingsPatch::Indexing(IndexingPatch {
            update_interval: Some(parse_value(key, value)?),
            ..Default::default()
        }),
        "indexing.maxFileSize" => SettingsPatch::Indexing(IndexingPatch {
            max_file_size: Some(parse_value(key, value)?),
            ..Default::default()
        }),
        "ui.theme" => SettingsPatch::Ui(UiPatch {
            theme: Some(value.parse()?),
            ..Default::default()
        }),
        "ui.language" => SettingsPatch::Ui(UiPatch {
            language: Some(value.to_string()),
            ..Default::default()
        }),
        "ui.showThumbnails" => SettingsPatch::Ui(UiPatch {
            show_thumbnails: Some(flag(value)?),
            ..Default::default()
        }),
        other => {
            return Err(LunaryError::validation(format!(
                "Unknown setting: {}",
                other
            )))
        }
    };
    Ok(patch)
}

fn required(rest: &str, command: &str) -> LunaryResult<String> {
    if rest.is_empty() {
        return Err(LunaryError::validation(format!(
            ":{} needs an argument",
            command
        )));
    }
    Ok(rest.to_string())
}

fn number(rest: &str, command: &str) -> LunaryResult<u32> {
    parse_value(command, rest)
}

/// 1-based list position
fn index(rest: &str, command: &str) -> LunaryResult<usize> {
    let n: usize = parse_value(command, rest)?;
    if n == 0 {
        return Err(LunaryError::validation(format!(
            ":{} counts from 1",
            command
        )));
    }
    Ok(n)
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> LunaryResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LunaryError::validation(format!("Invalid value for {}: {:?}", name, value)))
}

fn flag(value: &str) -> LunaryResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(LunaryError::validation(format!(
            "Expected on or off, got {:?}",
            other
        ))),
    }
}
