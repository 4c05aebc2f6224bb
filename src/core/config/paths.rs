use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let user_data_dir = discover_user_data_dir(&project_root);
        Self::from_dirs(project_root, user_data_dir)
    }

    /// Builds paths rooted at explicit directories, creating them if needed.
    pub fn from_dirs(project_root: PathBuf, user_data_dir: PathBuf) -> Self {
        let log_dir = user_data_dir.join("logs");
        let secrets_path = user_data_dir.join("secrets.yaml");

        for dir in [&user_data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            user_data_dir,
            log_dir,
            secrets_path,
        }
    }

    /// Resolves a configured path: absolute paths are kept, relative ones
    /// live under the data directory.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let candidate = PathBuf::from(raw);
        if candidate.is_absolute() {
            return candidate;
        }
        self.user_data_dir.join(candidate)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("MEDIBOOK_ROOT") {
        return PathBuf::from(root);
    }

    if let Ok(cwd) = env::current_dir() {
        if cwd.join("config.yml").exists() {
            return cwd;
        }
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

fn discover_user_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("MEDIBOOK_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return project_root.to_path_buf();
    }

    if cfg!(target_os = "windows") {
        let base = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string()));
        return PathBuf::from(base).join("Medibook");
    }

    if cfg!(target_os = "macos") {
        return home_dir()
            .join("Library")
            .join("Application Support")
            .join("Medibook");
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir()
            .join(".local/share")
            .to_string_lossy()
            .to_string()
    });
    PathBuf::from(xdg).join("medibook")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
