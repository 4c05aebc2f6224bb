use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::core::config::AppPaths;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Which program is logging. Each one writes its own rolling file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Server,
    Setup,
    Reprocess,
    Doctor,
}

impl Component {
    pub fn file_name(self) -> &'static str {
        match self {
            Component::Server => "server.log",
            Component::Setup => "setup.log",
            Component::Reprocess => "reprocess.log",
            Component::Doctor => "doctor.log",
        }
    }

    /// The command-line tools print their own progress, so their console
    /// output is limited to warnings.
    fn console_level(self) -> LevelFilter {
        match self {
            Component::Server => LevelFilter::TRACE,
            _ => LevelFilter::WARN,
        }
    }
}

pub fn init(paths: &AppPaths, component: Component) {
    let log_dir = &paths.log_dir;
    let _ = std::fs::create_dir_all(log_dir);

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, component.file_name()));
    let _ = LOG_GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(component.console_level());
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init();
}
