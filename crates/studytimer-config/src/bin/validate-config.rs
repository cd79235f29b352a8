//! Config validation CLI tool
//!
//! Validates a studytimer configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use studytimer_util::default_config_path;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a studytimer configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match studytimer_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Server:");
            println!("  Listen address: {}", settings.server.listen_addr);
            println!("  Data directory: {}", settings.server.data_dir.display());
            println!("  CORS origins: {}", settings.server.cors_allow_origins.join(", "));
            println!("Auth:");
            println!(
                "  Token lifetime: {} days",
                settings.auth.token_ttl.as_secs() / 86400
            );
            println!(
                "  Login attempts per minute: {}",
                settings.auth.login_attempts_per_minute
            );
            println!(
                "  JWT secret: {}",
                if settings.auth.jwt_secret.is_some() {
                    "set"
                } else {
                    "not set (environment or generated)"
                }
            );
            println!("Client:");
            println!("  API URL: {}", settings.client.api_url);
            println!("  Data directory: {}", settings.client.data_dir.display());

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                studytimer_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                studytimer_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                studytimer_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                studytimer_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        studytimer_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
