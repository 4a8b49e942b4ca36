//! The resolved set of CLI-provided options, threaded immutably through a run.
//!
//! This engine has no project-wide manifest to layer under CLI flags (unlike the
//! teacher's workspace-wide `config.toml`): CLI flags are the sole configuration
//! surface, per `SPEC_FULL.md` §10.

#[derive(Debug, Clone)]
pub struct Config {
    pub num_cycles: usize,
    pub top: String,
    pub includes: Vec<String>,
    pub defines: Vec<String>,
    pub use_sv: bool,
    pub cache_path: Option<std::path::PathBuf>,
    pub explore_time: Option<u64>,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_cycles: 0,
            top: "top".to_string(),
            includes: Vec::new(),
            defines: Vec::new(),
            use_sv: false,
            cache_path: None,
            explore_time: None,
            debug: false,
        }
    }
}
