//! Configuration validation

use super::Config;
use crate::server::eui64::MAX_PREFIX_LEN;

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn print_diagnostics(&self) {
        for warning in &self.warnings {
            println!("[WARN] {}", warning);
        }
        for error in &self.errors {
            println!("[ERROR] {}", error);
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate configuration and return warnings/errors
pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_interface(config, &mut result);
    validate_subnet(config, &mut result);
    validate_server_mac(config, &mut result);

    result
}

fn validate_interface(config: &Config, result: &mut ValidationResult) {
    if config.interface.trim().is_empty() {
        result.error("interface: must not be empty");
    }
}

fn validate_subnet(config: &Config, result: &mut ValidationResult) {
    match config.prefix() {
        Ok(prefix) if prefix.len() != MAX_PREFIX_LEN => {
            result.warn(format!(
                "subnet: /{} is not a /64, host bits up to /64 come from {}",
                prefix.len(),
                config.subnet
            ));
        }
        Ok(_) => {}
        Err(e) => result.error(format!("subnet: {}", e)),
    }
}

fn validate_server_mac(config: &Config, result: &mut ValidationResult) {
    if let Err(e) = config.server_mac() {
        result.error(e.to_string());
    }
}
