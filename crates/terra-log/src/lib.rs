//! Structured logging for the Terra server and viewer.
//!
//! Console output with uptime timestamps and module paths, plus a JSON log
//! file in debug builds. The filter comes from `RUST_LOG` when set, otherwise
//! from the config's `debug.log_level`.

use std::path::Path;

use terra_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config says otherwise.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `file_name` - log file name, e.g. `terra-server.log`
/// * `debug_build` - whether to attach the JSON file layer
/// * `config` - optional config supplying `debug.log_level`
///
/// ```no_run
/// use terra_log::init_logging;
///
/// init_logging(None, "terra.log", false, None);
/// ```
pub fn init_logging(
    log_dir: Option<&Path>,
    file_name: &str,
    debug_build: bool,
    config: Option<&Config>,
) {
    let filter_str = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(file_name))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// The filter directive derived from the config.
///
/// A bare level such as `debug` keeps the wgpu/naga noise suppression; a full
/// directive list (anything containing `=` or `,`) is used verbatim.
pub fn filter_directive(config: Option<&Config>) -> String {
    let level = config
        .map(|c| c.debug.log_level.trim())
        .filter(|level| !level.is_empty());

    match level {
        Some(level) if level.contains('=') || level.contains(',') => level.to_string(),
        Some(level) => format!("{level},wgpu=warn,naga=warn"),
        None => DEFAULT_FILTER.to_string(),
    }
}

/// An `EnvFilter` built from [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_gpu_crates() {
        let filter_str = format!("{}", default_env_filter());
        assert!(filter_str.contains("wgpu=warn"));
        assert!(filter_str.contains("naga=warn"));
    }

    #[test]
    fn test_no_config_uses_default() {
        assert_eq!(filter_directive(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_bare_level_keeps_gpu_suppression() {
        let mut config = Config::default();
        config.debug.log_level = "debug".to_string();
        assert_eq!(filter_directive(Some(&config)), "debug,wgpu=warn,naga=warn");
    }

    #[test]
    fn test_full_directive_used_verbatim() {
        let mut config = Config::default();
        config.debug.log_level = "warn,terra_server=trace".to_string();
        assert_eq!(filter_directive(Some(&config)), "warn,terra_server=trace");
    }

    #[test]
    fn test_empty_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_directive(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_directives_parse() {
        for directive in [
            "info",
            "debug,terra_scene=trace",
            "warn,terra_server=debug,terra_planets=trace",
        ] {
            assert!(
                EnvFilter::try_new(directive).is_ok(),
                "failed to parse filter: {directive}"
            );
        }
    }

    #[test]
    fn test_log_file_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("terra-server.log");
        assert_eq!(path.file_name().unwrap(), "terra-server.log");
    }
}
