use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::util::paths::config_path;
use crate::util::tools::ToolPaths;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerSettings,
    pub python: PythonSettings,
    pub sandbox: SandboxSettings,
    /// Configured paths for external tools (python, docker)
    pub tool_paths: ToolPaths,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allow any origin (the browser front end is served from elsewhere)
    pub cors_permissive: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3001,
            cors_permissive: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PythonSettings {
    /// Wall-clock limit for one traced run
    pub timeout: Duration,
    /// Steps captured before the run is stopped
    pub max_steps: usize,
}

impl Default for PythonSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_steps: 5_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SandboxSettings {
    /// Base toolchain image; gdb is layered on top of it
    pub image: String,
    /// Wall-clock limit covering image build and debugger run
    pub timeout: Duration,
    pub memory: String,
    pub pids_limit: u32,
    pub compiler_flags: Vec<String>,
    /// Function whose first frame starts the trace
    pub entry_function: String,
    /// Transcript bytes kept before the run is stopped
    pub max_transcript_bytes: usize,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            image: "gcc:13".into(),
            timeout: Duration::from_secs(60),
            memory: "256m".into(),
            pids_limit: 64,
            compiler_flags: vec!["-g".into(), "-O0".into(), "-std=c++17".into()],
            entry_function: "main".into(),
            max_transcript_bytes: 8 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_permissive: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlPythonConfig {
    pub timeout_secs: Option<u64>,
    pub max_steps: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlSandboxConfig {
    pub image: Option<String>,
    pub timeout_secs: Option<u64>,
    pub memory: Option<String>,
    pub pids_limit: Option<u32>,
    pub compiler_flags: Option<Vec<String>>,
    pub entry_function: Option<String>,
    pub max_transcript_bytes: Option<usize>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub server: Option<TomlServerConfig>,
    pub python: Option<TomlPythonConfig>,
    pub sandbox: Option<TomlSandboxConfig>,
    /// Tool path configuration
    pub tools: Option<ToolPaths>,
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        match fs::read_to_string(&config_file) {
            Ok(contents) => Self::from_toml_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %config_file.display(),
                    error = %e,
                    "Invalid config file, using defaults"
                );
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    /// Parse a config document and merge it over the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let toml_config = toml::from_str::<TomlConfig>(contents)?;
        let mut config = Config::default();
        config.merge(toml_config);
        Ok(config)
    }

    fn merge(&mut self, toml_config: TomlConfig) {
        if let Some(server) = toml_config.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(cors_permissive) = server.cors_permissive {
                self.server.cors_permissive = cors_permissive;
            }
        }

        if let Some(python) = toml_config.python {
            if let Some(secs) = python.timeout_secs {
                self.python.timeout = Duration::from_secs(secs.max(1));
            }
            if let Some(max_steps) = python.max_steps {
                self.python.max_steps = max_steps.max(1);
            }
        }

        if let Some(sandbox) = toml_config.sandbox {
            if let Some(image) = sandbox.image {
                self.sandbox.image = image;
            }
            if let Some(secs) = sandbox.timeout_secs {
                self.sandbox.timeout = Duration::from_secs(secs.max(1));
            }
            if let Some(memory) = sandbox.memory {
                self.sandbox.memory = memory;
            }
            if let Some(pids_limit) = sandbox.pids_limit {
                self.sandbox.pids_limit = pids_limit;
            }
            if let Some(flags) = sandbox.compiler_flags {
                self.sandbox.compiler_flags = flags;
            }
            if let Some(entry) = sandbox.entry_function {
                self.sandbox.entry_function = entry;
            }
            if let Some(limit) = sandbox.max_transcript_bytes {
                self.sandbox.max_transcript_bytes = limit;
            }
        }

        if let Some(tools) = toml_config.tools {
            self.tool_paths = tools;
        }
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(error = %e, "Failed to create config directory");
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }
}
