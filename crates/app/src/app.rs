use paths::PathContext;
use std::marker::PhantomData;
#[cfg(debug_assertions)]
use std::path::PathBuf;
use tracing_subscriber::{
    Layer, filter::LevelFilter, filter::filter_fn, fmt, layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// Log targets shared by all front-end systems.
pub const LOG_MAIN: &str = "main";
pub const LOG_SCENES: &str = "scenes";
pub const LOG_AUDIO: &str = "audio";
pub const LOG_UI: &str = "ui";
pub const LOG_SETTINGS: &str = "settings";

/// Application infrastructure context.
///
/// Contains path management, version info, and logging infrastructure.
pub struct AppContext {
    pub path_context: PathContext,
    pub version: &'static str,
    /// Dropping the guard flushes and stops the file writer.
    _log_guard: tracing_appender::non_blocking::WorkerGuard,
}

impl AppContext {
    pub fn app_id(&self) -> &str {
        self.path_context.app_id()
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn path_context(&self) -> &PathContext {
        &self.path_context
    }
}

/// Application metadata.
///
/// Define your application's identity by implementing this trait.
pub trait Application: Sized + 'static {
    const APP_ID: &'static str;
    const STUDIO: &'static str = "chicken105";
    const PROJECT_ID: &'static str = "lantern";
}

/// Level used for both the file and the console layer.
fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Installs the global subscriber: non-blocking file layer + console layer.
///
/// The returned guard must outlive every log call.
fn init_logging(
    path_context: &PathContext,
    level: LevelFilter,
) -> Result<tracing_appender::non_blocking::WorkerGuard, BoxError> {
    let log_file_path = path_context.log_file_now();
    let log_dir = log_file_path
        .parent()
        .ok_or("log file path has no parent directory")?;
    let log_filename = log_file_path
        .file_name()
        .ok_or("log file path has no file name")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::Layer::default()
        .with_target(true)
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(filter_fn(move |metadata| metadata.level() <= &level));

    let console_layer = fmt::Layer::default()
        .with_target(true)
        .with_filter(filter_fn(move |metadata| metadata.level() <= &level));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;

    Ok(guard)
}

/// Builder for creating applications with proper initialization.
pub struct AppBuilder<A: Application> {
    context: AppContext,
    _marker: PhantomData<A>,
}

impl<A: Application> AppBuilder<A> {
    /// Create a new application builder.
    ///
    /// - Sets up path context (platform-specific directories)
    /// - Ensures all directories exist
    /// - Initializes logging (file + console)
    pub fn new(version: &'static str) -> Result<Self, BoxError> {
        #[cfg(debug_assertions)]
        let path_context = PathContext::with_base_path(
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("..")
                .join("..")
                .join(".out"),
            A::STUDIO,
            A::PROJECT_ID,
            A::APP_ID,
        );
        #[cfg(not(debug_assertions))]
        let path_context = PathContext::new(A::STUDIO, A::PROJECT_ID, A::APP_ID);

        path_context.ensure_directories()?;
        let guard = init_logging(&path_context, default_level())?;

        tracing::info!(
            target: LOG_MAIN,
            app_id = A::APP_ID,
            version,
            root = %path_context.project_root().display(),
            "application context ready"
        );

        Ok(Self {
            context: AppContext {
                path_context,
                version,
                _log_guard: guard,
            },
            _marker: PhantomData,
        })
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Build an application without Bevy.
    pub fn build_simple(self) -> AppContext {
        self.context
    }

    /// Build a Bevy-based application.
    ///
    /// The `configure` callback receives the Bevy `App` by value and the `AppContext`,
    /// and must return the configured App.
    ///
    /// ```ignore
    /// let app = AppBuilder::<MyApp>::new("1.0.0")?
    ///     .build_with_bevy(|app, ctx| {
    ///         app.add_plugins(DefaultPlugins)
    ///            .add_systems(Update, my_system)
    ///     });
    /// ```
    #[cfg(feature = "bevy")]
    pub fn build_with_bevy(
        self,
        configure: impl FnOnce(bevy::prelude::App, &AppContext) -> bevy::prelude::App,
    ) -> BevyApp<A> {
        let bevy_app = bevy::prelude::App::new();
        let configured_app = configure(bevy_app, &self.context);

        BevyApp {
            context: self.context,
            app: configured_app,
            _marker: PhantomData,
        }
    }
}

/// Bevy-based application wrapper.
///
/// The context is kept alive next to the Bevy App so logging keeps working.
#[cfg(feature = "bevy")]
pub struct BevyApp<A: Application> {
    pub context: AppContext,
    pub app: bevy::prelude::App,
    _marker: PhantomData<A>,
}

#[cfg(feature = "bevy")]
impl<A: Application> BevyApp<A> {
    pub fn run(&mut self) -> bevy::app::AppExit {
        self.app.run()
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn app_mut(&mut self) -> &mut bevy::prelude::App {
        &mut self.app
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_builds_log_less_than_debug_builds() {
        if cfg!(debug_assertions) {
            assert_eq!(default_level(), LevelFilter::INFO);
        } else {
            assert_eq!(default_level(), LevelFilter::WARN);
        }
    }

    struct Probe;

    impl Application for Probe {
        const APP_ID: &'static str = "probe";
    }

    #[test]
    fn application_defaults_point_at_the_lantern_project() {
        assert_eq!(Probe::STUDIO, "chicken105");
        assert_eq!(Probe::PROJECT_ID, "lantern");
        assert_eq!(Probe::APP_ID, "probe");
    }
}
