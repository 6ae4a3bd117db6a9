mod settings;

pub use settings::{
    Config, PythonSettings, SandboxSettings, ServerSettings, TomlConfig, EXAMPLE_CONFIG,
};
