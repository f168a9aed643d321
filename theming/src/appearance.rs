//! Operating system dark mode signal

use tokio::sync::watch;
use tracing::debug;

/// Reports whether the OS prefers a dark appearance
pub trait SystemAppearance: Send + Sync {
    /// Current preference
    fn prefers_dark(&self) -> bool;

    /// Receiver that sees every later change
    fn watch(&self) -> watch::Receiver<bool>;
}

/// Appearance source driven by the application itself.
///
/// Used where no desktop integration is available: the value comes from
/// `LUNARY_SYSTEM_DARK` at startup and can be flipped at runtime.
#[derive(Debug)]
pub struct ManualAppearance {
    sender: watch::Sender<bool>,
}

impl ManualAppearance {
    pub fn new(prefers_dark: bool) -> Self {
        let (sender, _) = watch::channel(prefers_dark);
        Self { sender }
    }

    /// Read the initial value from `LUNARY_SYSTEM_DARK` (`1`, `true`, `yes`, `dark`)
    pub fn from_env() -> Self {
        let dark = std::env::var("LUNARY_SYSTEM_DARK")
            .map(|value| parse_flag(&value))
            .unwrap_or(false);
        Self::new(dark)
    }

    /// Change the reported preference
    pub fn set_dark(&self, prefers_dark: bool) {
        let previous = self.sender.send_replace(prefers_dark);
        if previous != prefers_dark {
            debug!("System appearance changed: dark = {}", prefers_dark);
        }
    }
}

impl Default for ManualAppearance {
    fn default() -> Self {
        Self::new(false)
    }
}

impl SystemAppearance for ManualAppearance {
    fn prefers_dark(&self) -> bool {
        *self.sender.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "dark"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" Dark "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("light"));
    }

    #[tokio::test]
    async fn test_watch_sees_changes() {
        let appearance = ManualAppearance::new(false);
        let mut rx = appearance.watch();

        appearance.set_dark(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(appearance.prefers_dark());
    }

    #[test]
    fn test_set_without_receivers() {
        let appearance = ManualAppearance::default();
        appearance.set_dark(true);
        assert!(appearance.prefers_dark());
    }
}
