//! tree_show — interactive entry point.

use std::io::{self, Write};
use std::path::PathBuf;

use tree_show::app::{run, AppConfig};

fn main() {
    tracing_subscriber::fmt::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture Tree — particle Christmas show                ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "tracker")]
    println!("  Mode: external hand tracker");
    #[cfg(not(feature = "tracker"))]
    println!("  Mode: pointer + keyboard simulation  (use --features tracker for a camera)");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cfg = if args.iter().any(|a| a == "--quick") {
        println!("  Quick-start: defaults\n");
        AppConfig::default()
    } else {
        configure_interactively()
    };

    // `--share <id>` is the CLI analog of the `?share=` query parameter.
    if let Some(id) = flag_value(&args, "--share") {
        cfg.share_id = Some(id);
    }
    if let Some(path) = flag_value(&args, "--audio") {
        cfg.audio_path = PathBuf::from(path);
    }
    if let Some(base) = flag_value(&args, "--api") {
        cfg.api_base = base;
    }
    if let Some(command) = flag_value(&args, "--tracker") {
        cfg.tracker_command = Some(command);
    }

    println!();
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn configure_interactively() -> AppConfig {
    let defaults = AppConfig::default();

    let particle_count: usize = {
        let n = read_line("  Particle count (default 2400): ")
            .trim()
            .parse()
            .unwrap_or(defaults.particle_count);
        n.clamp(200, 20_000)
    };

    let audio_path = {
        let p = read_line("  Show track WAV (default assets/christmas_list.wav): ");
        let p = p.trim();
        if p.is_empty() {
            defaults.audio_path.clone()
        } else {
            PathBuf::from(p)
        }
    };

    let api_base = {
        let b = read_line("  Share service base URL (default http://127.0.0.1:8787): ");
        let b = b.trim();
        if b.is_empty() {
            defaults.api_base.clone()
        } else {
            b.to_string()
        }
    };

    AppConfig {
        particle_count,
        audio_path,
        api_base,
        ..defaults
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
