//! UI Pilot CLI - route planning entry point
//!
//! Loads a page graph definition and prints the clicks that lead from one
//! page to another, without touching any device.
//!
//! Usage: `pilot <graph.json> <from> <to> [--settings settings.json]`

use std::process::ExitCode;

use ui_pilot::config::{self, ConfigError, GraphSpec, Settings};

struct Args {
    graph: String,
    from: String,
    to: String,
    settings: Option<String>,
}

fn parse_args() -> Option<Args> {
    let mut positional = Vec::new();
    let mut settings = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--settings" {
            settings = Some(args.next()?);
        } else {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    let args = Args {
        graph: positional.next()?,
        from: positional.next()?,
        to: positional.next()?,
        settings,
    };
    positional.next().is_none().then_some(args)
}

fn run(args: &Args) -> Result<(), ConfigError> {
    let settings = match &args.settings {
        Some(path) => config::load_settings(path)?,
        None => Settings::default(),
    };
    let (graph, keywords) = GraphSpec::open(&args.graph)?.build()?;

    let find = |name: &str| {
        graph
            .find(name)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown page {}", name)))
    };
    let from = find(&args.from)?;
    let to = find(&args.to)?;

    println!("Loaded {} pages, {} keywords", graph.len(), keywords.len());
    println!();

    let route = graph.route_to(to)?;
    let path = route.path_from(from);
    if path.is_empty() {
        println!("No route from {} to {}", args.from, args.to);
    } else {
        println!("Route {} -> {} ({} clicks):", args.from, args.to, path.len() - 1);
        for pair in path.windows(2) {
            let page = graph.page(pair[0])?;
            let button = page.button_to(pair[1]).map_or("?", |b| b.name());
            println!("  {} --[{}]--> {}", page.name(), button, graph.name(pair[1]));
        }
    }
    println!();

    // Print current configuration
    println!("Current Configuration:");
    println!("  - Find timeout: {:?}", settings.locator.find_timeout());
    println!("  - Poll interval: {:?}", settings.locator.poll_interval());
    println!("  - Match threshold: {}", settings.locator.threshold);
    println!("  - Page probe timeout: {:?}", settings.navigation.page_probe_timeout());
    println!("  - Goto budget: {:?}", settings.navigation.goto_budget());
    println!("  - OCR language: {:?}", settings.ocr.lang);
    println!("  - Humanize taps: {}", settings.stealth.humanize_position);
    Ok(())
}

fn main() -> ExitCode {
    println!("UI Pilot - Route Planner");
    println!("========================");
    println!();

    let Some(args) = parse_args() else {
        println!("Usage: pilot <graph.json> <from> <to> [--settings settings.json]");
        return ExitCode::from(2);
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
