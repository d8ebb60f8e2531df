use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // PGR_SIGNING_SECRET is deliberately left out
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "PGR_HOST",
        "PGR_PORT",
        "PGR_DATABASE_URL",
        "PGR_MERCHANT_ID",
        "PGR_GATEWAY_URL",
        "PGR_GATEWAY_PREFLIGHT_URL",
        "PGR_RETURN_URL",
        "PGR_FRONTEND_URL",
        "PGR_PAYMENT_MODE",
        "PGR_CURRENCY",
        "PGR_INITIATION_TIMEOUT",
        "PGR_PENDING_ALERT_AFTER",
        "PGR_NOTIFIER_BUFFER",
    ];

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
