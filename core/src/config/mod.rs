mod load;
mod types;

pub use load::{apply_env_overrides, data_dir, load_default};
pub use types::{
    AppConfig, DispatchConfig, LoggingConfig, RunnerConfig, DEFAULT_TIMEOUT_SECS,
};
