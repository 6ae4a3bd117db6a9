//! Tool availability detection
//!
//! Tracing shells out to a Python interpreter and to the Docker CLI. Each can be pinned in
//! config.toml; otherwise it is looked up on PATH.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// External tools that steptrace depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Python interpreter used by the instrumented tracer
    Python,
    /// Docker CLI used to build and run the debugger sandbox
    Docker,
}

impl Tool {
    /// Binary names tried on PATH, in order
    pub fn binary_names(&self) -> &'static [&'static str] {
        match self {
            Tool::Python => &["python3", "python"],
            Tool::Docker => &["docker"],
        }
    }

    /// Get the binary name for this tool
    pub fn binary_name(&self) -> &'static str {
        self.binary_names()[0]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Python => "Python 3",
            Tool::Docker => "Docker",
        }
    }

    pub fn install_instructions(&self) -> &'static str {
        match self {
            Tool::Python => "https://www.python.org/downloads/",
            Tool::Docker => "https://docs.docker.com/get-docker/",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[Tool::Python, Tool::Docker]
    }
}

/// Status of a tool's availability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolStatus {
    /// Tool is available at the given path
    Available(PathBuf),
    /// Tool was not found in PATH or configured location
    #[default]
    NotFound,
    /// A path was configured in config.toml but it's invalid
    ConfiguredPathInvalid(PathBuf),
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, ToolStatus::Available(_))
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ToolStatus::Available(p) => Some(p),
            _ => None,
        }
    }
}

/// Configuration for tool paths from config.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolPaths {
    pub python: Option<PathBuf>,
    pub docker: Option<PathBuf>,
}

impl ToolPaths {
    pub fn get(&self, tool: Tool) -> Option<&PathBuf> {
        match tool {
            Tool::Python => self.python.as_ref(),
            Tool::Docker => self.docker.as_ref(),
        }
    }

    pub fn set(&mut self, tool: Tool, path: PathBuf) {
        match tool {
            Tool::Python => self.python = Some(path),
            Tool::Docker => self.docker = Some(path),
        }
    }
}

/// Tracks the availability of all tools
#[derive(Debug, Clone, Default)]
pub struct ToolAvailability {
    python: ToolStatus,
    docker: ToolStatus,
}

impl ToolAvailability {
    /// Detect availability of all tools
    ///
    /// A configured path must exist and be executable; without one, PATH is searched.
    pub fn detect(configured_paths: &ToolPaths) -> Self {
        Self {
            python: Self::detect_tool(Tool::Python, configured_paths.python.as_ref()),
            docker: Self::detect_tool(Tool::Docker, configured_paths.docker.as_ref()),
        }
    }

    fn detect_tool(tool: Tool, configured_path: Option<&PathBuf>) -> ToolStatus {
        if let Some(path) = configured_path {
            if Self::is_valid_executable(path) {
                return ToolStatus::Available(path.clone());
            } else {
                return ToolStatus::ConfiguredPathInvalid(path.clone());
            }
        }

        tool.binary_names()
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(ToolStatus::Available)
            .unwrap_or(ToolStatus::NotFound)
    }

    fn is_valid_executable(path: &Path) -> bool {
        if !path.exists() {
            return false;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = path.metadata() {
                let permissions = metadata.permissions();
                return permissions.mode() & 0o111 != 0;
            }
            false
        }

        #[cfg(not(unix))]
        {
            path.is_file()
        }
    }

    pub fn status(&self, tool: Tool) -> &ToolStatus {
        match tool {
            Tool::Python => &self.python,
            Tool::Docker => &self.docker,
        }
    }

    pub fn is_available(&self, tool: Tool) -> bool {
        self.status(tool).is_available()
    }

    pub fn path(&self, tool: Tool) -> Option<&PathBuf> {
        self.status(tool).path()
    }

    /// Resolved path, falling back to the bare binary name so the spawn error is descriptive
    pub fn path_or_default(&self, tool: Tool) -> PathBuf {
        self.path(tool)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(tool.binary_name()))
    }

    /// Tools that could not be found
    pub fn missing(&self) -> Vec<Tool> {
        Tool::all()
            .iter()
            .copied()
            .filter(|tool| !self.is_available(*tool))
            .collect()
    }
}
