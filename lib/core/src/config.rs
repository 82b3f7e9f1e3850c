use std::path::PathBuf;

/// Storage configuration shared by service constructors.
///
/// Callers parse these from command-line arguments or environment
/// variables, then hand them to storage layer initialization.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Directory holding the service's data files.
    pub data_dir: Option<PathBuf>,

    /// Path to the SQLite database file.
    /// Defaults to `{data_dir}/data.sqlite` if not specified.
    pub sqlite_path: Option<PathBuf>,
}

impl StoreConfig {
    /// Parse configuration from command-line arguments.
    ///
    /// Supported flags:
    /// - `--data-dir=PATH`
    /// - `--sqlite=PATH`
    pub fn from_args(args: &[String]) -> Self {
        let mut config = StoreConfig::default();

        for arg in args {
            if let Some(val) = arg.strip_prefix("--data-dir=") {
                config.data_dir = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--sqlite=") {
                config.sqlite_path = Some(PathBuf::from(val));
            }
        }

        config
    }

    /// Resolve the SQLite database path, falling back to `{data_dir}/data.sqlite`.
    pub fn resolve_sqlite_path(&self) -> PathBuf {
        self.sqlite_path.clone().unwrap_or_else(|| {
            self.data_dir
                .as_ref()
                .map(|d| d.join("data.sqlite"))
                .unwrap_or_else(|| PathBuf::from("data.sqlite"))
        })
    }
}
