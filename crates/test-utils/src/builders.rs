#![allow(dead_code)]

use runcmd::config::{ConfigFile, DefaultsSection, RawConfigFile, StepConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                defaults: DefaultsSection::default(),
                step: vec![],
            },
        }
    }

    pub fn with_step(mut self, step: StepConfig) -> Self {
        self.config.step.push(step);
        self
    }

    pub fn with_default_timeout(mut self, timeout: &str) -> Self {
        self.config.defaults.timeout = Some(timeout.to_string());
        self
    }

    pub fn with_default_directory(mut self, dir: &str) -> Self {
        self.config.defaults.directory = Some(dir.to_string());
        self
    }

    pub fn with_default_stdout(mut self, sink: &str) -> Self {
        self.config.defaults.stdout = Some(sink.to_string());
        self
    }

    pub fn with_default_foreground(mut self, val: bool) -> Self {
        self.config.defaults.foreground = Some(val);
        self
    }

    /// The raw (unvalidated) config.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StepConfig`.
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            step: StepConfig {
                name: None,
                cmd: cmd.to_string(),
                args: vec![],
                directory: None,
                timeout: None,
                foreground: None,
                stdout: None,
                stderr: None,
                out_placeholder: None,
                err_placeholder: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.step.name = Some(name.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.step.args.push(arg.to_string());
        self
    }

    pub fn directory(mut self, dir: &str) -> Self {
        self.step.directory = Some(dir.to_string());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.step.timeout = Some(timeout.to_string());
        self
    }

    pub fn foreground(mut self, val: bool) -> Self {
        self.step.foreground = Some(val);
        self
    }

    pub fn stdout(mut self, sink: &str) -> Self {
        self.step.stdout = Some(sink.to_string());
        self
    }

    pub fn stderr(mut self, sink: &str) -> Self {
        self.step.stderr = Some(sink.to_string());
        self
    }

    pub fn out_placeholder(mut self, token: &str) -> Self {
        self.step.out_placeholder = Some(token.to_string());
        self
    }

    pub fn err_placeholder(mut self, token: &str) -> Self {
        self.step.err_placeholder = Some(token.to_string());
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}
