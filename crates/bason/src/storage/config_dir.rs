//! Configuration directory resolution.
//!
//! The host application decides where configuration files go.  Anything that
//! implements [`ConfigDirProvider`] can be handed to
//! [`crate::ConfigFile::open`]; the provider is asked once, when the file is
//! opened.
//!
//! [`PlatformConfigDir`] resolves the usual per-user location:
//! - Windows:  `%APPDATA%\<app>`
//! - Linux:    `$XDG_CONFIG_HOME/<app>` or `~/.config/<app>`
//! - macOS:    `~/Library/Application Support/<app>`

use std::path::{Path, PathBuf};

use tracing::warn;

/// Directory used when the platform location cannot be determined.
pub const FALLBACK_CONFIG_DIR: &str = "config";

/// Supplies the directory in which configuration files are stored.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigDirProvider {
    fn config_dir(&self) -> PathBuf;
}

impl ConfigDirProvider for PathBuf {
    fn config_dir(&self) -> PathBuf {
        self.clone()
    }
}

impl ConfigDirProvider for Path {
    fn config_dir(&self) -> PathBuf {
        self.to_path_buf()
    }
}

impl<P: ConfigDirProvider + ?Sized> ConfigDirProvider for &P {
    fn config_dir(&self) -> PathBuf {
        (**self).config_dir()
    }
}

/// Per-user configuration directory for an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfigDir {
    app_name: String,
}

impl PlatformConfigDir {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Resolves the platform directory, or `None` when the relevant
    /// environment variables are missing.
    pub fn resolve(&self) -> Option<PathBuf> {
        platform_config_base().map(|base| base.join(&self.app_name))
    }
}

impl ConfigDirProvider for PlatformConfigDir {
    fn config_dir(&self) -> PathBuf {
        self.resolve().unwrap_or_else(|| {
            warn!(
                app = %self.app_name,
                "could not determine platform config directory; using ./{FALLBACK_CONFIG_DIR}"
            );
            PathBuf::from(FALLBACK_CONFIG_DIR)
        })
    }
}

/// Resolves the platform config base directory without the application subdirectory.
fn platform_config_base() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(PathBuf::from)
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_buf_provider_returns_itself() {
        let dir = PathBuf::from("/srv/game/config");
        assert_eq!(dir.config_dir(), dir);
    }

    #[test]
    fn test_borrowed_path_provider_returns_owned_copy() {
        let dir = Path::new("relative/config");
        let provider: &dyn ConfigDirProvider = &dir;
        assert_eq!(provider.config_dir(), PathBuf::from("relative/config"));
    }

    #[test]
    fn test_platform_dir_ends_with_app_name_when_resolvable() {
        let provider = PlatformConfigDir::new("bason-test");
        if let Some(dir) = provider.resolve() {
            assert!(
                dir.ends_with("bason-test"),
                "platform dir must end with the app name, got {dir:?}"
            );
        }
        // None is acceptable in a stripped environment without HOME/APPDATA.
    }

    #[test]
    fn test_platform_dir_provider_never_returns_empty_path() {
        let dir = PlatformConfigDir::new("bason-test").config_dir();
        assert!(!dir.as_os_str().is_empty());
    }

    #[test]
    fn test_platform_config_base_is_some_when_env_is_present() {
        let result = platform_config_base();
        #[cfg(target_os = "windows")]
        if std::env::var_os("APPDATA").is_some() {
            assert!(result.is_some());
        }
        #[cfg(target_os = "linux")]
        {
            let has_xdg = std::env::var_os("XDG_CONFIG_HOME").is_some();
            let has_home = std::env::var_os("HOME").is_some();
            if has_xdg || has_home {
                assert!(result.is_some());
            }
        }
        #[cfg(target_os = "macos")]
        if std::env::var_os("HOME").is_some() {
            assert!(result.is_some());
        }
        let _ = result;
    }

    #[test]
    fn test_mock_provider_can_stand_in_for_the_host() {
        let mut mock = MockConfigDirProvider::new();
        mock.expect_config_dir()
            .times(1)
            .return_const(PathBuf::from("/mock/config"));

        assert_eq!(mock.config_dir(), PathBuf::from("/mock/config"));
    }
}
