//! # Tool Path Resolver
//!
//! Finds the external compression tools:
//! - the backend's default absolute location (e.g. `/usr/bin/jpegoptim`)
//! - the first executable match on `PATH` when the default location is not executable
//!
//! Explicitly configured paths never go through the resolver.

use crate::config::{JpegConfig, PngBackend};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tool path resolver for system-installed tools
#[derive(Debug, Clone)]
pub struct ToolResolver {
    search_path: Option<OsString>,
}

impl ToolResolver {
    /// Create a resolver that searches the current `PATH`
    pub fn new() -> Self {
        Self {
            search_path: env::var_os("PATH"),
        }
    }

    /// Create a resolver with an explicit search path (`PATH` syntax)
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    /// Resolve the path to a specific tool.
    ///
    /// Falls back to `default_location` when nothing is found so the
    /// executable check can report the expected path.
    pub fn resolve(&self, tool_name: &str, default_location: &Path) -> PathBuf {
        if is_executable(default_location) {
            return default_location.to_path_buf();
        }

        if let Some(system_path) = self.find_in_system_path(tool_name) {
            debug!("Using {} from PATH: {:?}", tool_name, system_path);
            return system_path;
        }

        warn!("Tool not found: {} (expected at {})", tool_name, default_location.display());
        default_location.to_path_buf()
    }

    /// Find tool in the search path
    fn find_in_system_path(&self, tool_name: &str) -> Option<PathBuf> {
        let tool_with_ext = if cfg!(windows) {
            format!("{}.exe", tool_name)
        } else {
            tool_name.to_string()
        };

        env::split_paths(self.search_path.as_ref()?)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.join(&tool_with_ext))
            .find(|path| is_executable(path))
    }

    /// Get a report of tool availability
    pub fn report(&self) -> String {
        let mut report = String::from("Tool availability:\n");

        let tools = std::iter::once((JpegConfig::TOOL_NAME, JpegConfig::default_location())).chain(
            PngBackend::ALL
                .iter()
                .map(|backend| (backend.tool_name(), backend.default_location())),
        );

        for (tool, default_location) in tools {
            let path = self.resolve(tool, default_location);
            if is_executable(&path) {
                report.push_str(&format!("  ✅ {} -> {}\n", tool, path.display()));
            } else {
                report.push_str(&format!(
                    "  ❌ {} (install with: {})\n",
                    tool,
                    install_instructions(tool)
                ));
            }
        }

        report
    }
}

impl Default for ToolResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Installation hint for a tool on Debian-like systems
pub fn install_instructions(tool_name: &str) -> String {
    format!("sudo apt-get install {}", tool_name)
}

/// Regular file with at least one execute bit set.
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };

    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fake_binary;
    use tempfile::TempDir;

    #[test]
    fn test_default_location_wins_when_present() {
        let dir = TempDir::new().unwrap();
        let default = fake_binary(dir.path(), "jpegoptim");

        let resolver = ToolResolver::with_search_path("");
        assert_eq!(resolver.resolve("jpegoptim", &default), default);
    }

    #[test]
    fn test_falls_back_to_search_path() {
        let dir = TempDir::new().unwrap();
        let bin_dir = dir.path().join("bin");
        std::fs::create_dir(&bin_dir).unwrap();
        let found = fake_binary(&bin_dir, "pngquant");

        let resolver = ToolResolver::with_search_path(bin_dir.as_os_str());
        let resolved = resolver.resolve("pngquant", &dir.path().join("missing").join("pngquant"));
        assert_eq!(resolved, found);
    }

    #[test]
    fn test_missing_tool_reports_default_location() {
        let dir = TempDir::new().unwrap();
        let default = dir.path().join("optipng");

        let resolver = ToolResolver::with_search_path(dir.path().as_os_str());
        assert_eq!(resolver.resolve("optipng", &default), default);
        assert!(!is_executable(&default));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pngcrush");
        std::fs::write(&path, "not a program").unwrap();

        assert!(!is_executable(&path));
        assert!(!is_executable(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_default_falls_back_to_search_path() {
        let dir = TempDir::new().unwrap();
        let default = dir.path().join("pngquant");
        std::fs::write(&default, "not a program").unwrap();
        let bin_dir = dir.path().join("bin");
        std::fs::create_dir(&bin_dir).unwrap();
        let found = fake_binary(&bin_dir, "pngquant");

        let resolver = ToolResolver::with_search_path(bin_dir.as_os_str());
        assert_eq!(resolver.resolve("pngquant", &default), found);
    }

    #[test]
    fn test_report_lists_every_backend() {
        let report = ToolResolver::with_search_path("").report();
        for tool in ["jpegoptim", "pngquant", "optipng", "pngcrush"] {
            assert!(report.contains(tool), "missing {} in report", tool);
        }
    }
}
