#![allow(dead_code)]

use bunnypad_updater::libs::{
    config::UpdaterConfig,
    context::{AppContext, SystemInfo},
    error::UpdateError,
    messages::Message,
    process::ProcessControl,
    prompt::Prompter,
};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

pub const OWNER: &str = "GSYT-Productions";
pub const REPO: &str = "BunnyPad-SRC";
pub const RELEASES_PATH: &str = "/repos/GSYT-Productions/BunnyPad-SRC/releases";

pub fn app_context(version_tag: &str, log_path: PathBuf) -> AppContext {
    AppContext {
        app_name: "BunnyPad".to_string(),
        version_tag: version_tag.to_string(),
        package_version: "11.0.0".to_string(),
        display_os: "Test OS".to_string(),
        system: SystemInfo::default(),
        current_dir: PathBuf::from("."),
        log_path,
    }
}

pub fn config_for(api_base: &str) -> UpdaterConfig {
    UpdaterConfig {
        owner: OWNER.to_string(),
        repo: REPO.to_string(),
        api_base: api_base.to_string(),
        ..UpdaterConfig::default()
    }
}

/// Answers prompts by kind and remembers what was asked.
pub struct ScriptedPrompter {
    pub download: bool,
    pub install: bool,
    pub elevation: bool,
    pub continue_unelevated: bool,
    pub open_log: bool,
    pub asked: RefCell<Vec<String>>,
    pub errors: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn agreeing() -> Self {
        Self {
            download: true,
            install: true,
            elevation: true,
            continue_unelevated: true,
            open_log: false,
            asked: RefCell::new(Vec::new()),
            errors: RefCell::new(Vec::new()),
        }
    }

    pub fn declining() -> Self {
        Self {
            download: false,
            install: false,
            elevation: false,
            continue_unelevated: false,
            ..Self::agreeing()
        }
    }

    pub fn was_asked(&self, kind: &str) -> bool {
        self.asked.borrow().iter().any(|asked| asked == kind)
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &Message, _default: bool) -> bool {
        let (kind, answer) = match prompt {
            Message::ConfirmDownload { .. } => ("download", self.download),
            Message::ConfirmInstall(_) => ("install", self.install),
            Message::ConfirmElevation(_) => ("elevation", self.elevation),
            Message::ConfirmContinueUnelevated => ("continue_unelevated", self.continue_unelevated),
            Message::ConfirmOpenLog(_) => ("open_log", self.open_log),
            _ => ("other", false),
        };
        self.asked.borrow_mut().push(kind.to_string());
        answer
    }

    fn report_error(&self, error: &UpdateError) {
        self.errors.borrow_mut().push(error.to_string());
    }
}

/// Records launches instead of performing them.
pub struct RecordingProcess {
    pub elevated: bool,
    pub fail_spawn: bool,
    pub fail_elevation: bool,
    pub spawned: RefCell<Vec<(PathBuf, bool)>>,
    pub terminated: Cell<bool>,
}

impl RecordingProcess {
    pub fn new() -> Self {
        Self {
            elevated: false,
            fail_spawn: false,
            fail_elevation: false,
            spawned: RefCell::new(Vec::new()),
            terminated: Cell::new(false),
        }
    }
}

impl ProcessControl for RecordingProcess {
    fn is_elevated(&self) -> bool {
        self.elevated
    }

    fn spawn_detached(&self, path: &Path) -> Result<u32, UpdateError> {
        if self.fail_spawn {
            return Err(UpdateError::Spawn {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        self.spawned.borrow_mut().push((path.to_path_buf(), false));
        Ok(4242)
    }

    fn spawn_elevated(&self, path: &Path) -> Result<u32, UpdateError> {
        if self.fail_elevation {
            return Err(UpdateError::Elevation("declined".to_string()));
        }
        self.spawned.borrow_mut().push((path.to_path_buf(), true));
        Ok(4343)
    }

    fn terminate_current(&self) {
        self.terminated.set(true);
    }
}
