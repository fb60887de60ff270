use std::env;

pub const CLI_HELP: &str = include_str!("cli-help.txt");

/// The environment variables the server reads, shown by `--envs`.
const DISPLAY_ENVS: [&str; 11] = [
    "SPS_HOST",
    "SPS_PORT",
    "SPS_INTENT_TTL_HOURS",
    "SPS_STORE_URL",
    "SPS_STORE_API_KEY",
    "SPS_MP_BASE_URL",
    "SPS_MP_ACCESS_TOKEN",
    "SPS_MP_SUCCESS_URL",
    "SPS_MP_FAILURE_URL",
    "SPS_MP_PENDING_URL",
    "SPS_WEBHOOK_SECRET",
];

const SENSITIVE_ENVS: [&str; 3] = ["SPS_STORE_API_KEY", "SPS_MP_ACCESS_TOKEN", "SPS_WEBHOOK_SECRET"];

/// Handles `--help` and `--envs` and exits if either was given. Anything else falls through to a normal server
/// start.
pub fn handle_command_line_args() {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{CLI_HELP}");
        std::process::exit(0);
    }
    if args.iter().any(|a| a == "--envs") {
        print_envs();
        std::process::exit(0);
    }
}

fn print_envs() {
    println!("Environment variables:");
    for name in DISPLAY_ENVS {
        let value = match env::var(name) {
            Ok(_) if SENSITIVE_ENVS.contains(&name) => "****".to_string(),
            Ok(v) => v,
            Err(_) => "(not set)".to_string(),
        };
        println!("  {name:<28} {value}");
    }
}
