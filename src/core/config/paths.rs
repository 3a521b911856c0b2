use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let user_data_dir = discover_user_data_dir(&project_root);
        Self::from_data_dir(project_root, user_data_dir)
    }

    /// Build the layout under an explicit data directory.
    pub fn from_data_dir(project_root: PathBuf, user_data_dir: PathBuf) -> Self {
        let log_dir = user_data_dir.join("logs");
        let upload_dir = user_data_dir.join("uploaded_docs");
        let secrets_path = user_data_dir.join("secrets.yaml");

        for dir in [&user_data_dir, &log_dir, &upload_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            user_data_dir,
            log_dir,
            upload_dir,
            secrets_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

const APP_DIR_NAME: &str = "study-companion";

fn discover_project_root() -> PathBuf {
    if let Some(root) = env::var_os("STUDY_COMPANION_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").is_file() {
        manifest_dir
    } else {
        env::current_dir().unwrap_or(manifest_dir)
    }
}

fn discover_user_data_dir(project_root: &Path) -> PathBuf {
    if let Some(dir) = env::var_os("STUDY_COMPANION_DATA_DIR") {
        return PathBuf::from(dir);
    }
    // Debug builds keep data next to the sources.
    if cfg!(debug_assertions) {
        return project_root.to_path_buf();
    }
    platform_data_dir().join(APP_DIR_NAME)
}

fn platform_data_dir() -> PathBuf {
    let var = |name: &str| env::var_os(name).map(PathBuf::from);
    match env::consts::OS {
        "windows" => var("LOCALAPPDATA").or_else(|| var("USERPROFILE")),
        "macos" => var("HOME").map(|home| home.join("Library").join("Application Support")),
        _ => var("XDG_DATA_HOME").or_else(|| var("HOME").map(|home| home.join(".local").join("share"))),
    }
    .unwrap_or_else(|| PathBuf::from("."))
}
