use std::{env, env::VarError};

/// The server takes no arguments. Passing any prints the help text and the current (non-secret) settings.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

// Be explicit about which envars to print, so as to avoid accidentally exposing secrets
const DISPLAY_ENVS: [&str; 16] = [
    "RUST_LOG",
    "RELAY_HOST",
    "RELAY_PORT",
    "RELAY_DATABASE_URL",
    "RELAY_CONFIRMATION_MODE",
    "RELAY_RETURN_URL",
    "RELAY_WEBHOOK_TRUSTED_NETWORKS",
    "RELAY_USE_X_FORWARDED_FOR",
    "RELAY_USE_FORWARDED",
    "RELAY_SHUTDOWN_TIMEOUT",
    "RELAY_YOOKASSA_SHOP_ID",
    "RELAY_YOOKASSA_API_URL",
    "RELAY_YOOKASSA_TIMEOUT",
    "RELAY_YOOKASSA_MAX_RETRIES",
    "RELAY_TELEGRAM_CHAT_ID",
    "RELAY_TELEGRAM_API_URL",
];

fn display_envs() {
    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
