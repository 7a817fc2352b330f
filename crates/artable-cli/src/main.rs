// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use artable_app::AppState;
use config::Config;
use runtime::{ApiRuntime, DemoRuntime};
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `artable --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let client = if options.demo {
        None
    } else {
        Some(
            artable_api::Client::new(config.base_url(), config.page_size(), config.timeout()?)
                .with_context(|| {
                    format!(
                        "invalid [api] config in {}; fix base_url/page_size/timeout values",
                        options.config_path.display()
                    )
                })?,
        )
    };
    let log_settings = config.log_settings()?;
    if options.check_only {
        return Ok(());
    }

    let _log_guard = logging::init(&log_settings)?;
    let mut state = AppState::with_start_page(options.start_page, config.page_size());
    match client {
        Some(client) => {
            info!(
                base_url = client.base_url(),
                page_size = client.page_size(),
                timeout_ms = client.timeout().as_millis() as u64,
                start_page = options.start_page,
                "starting artwork table"
            );
            artable_tui::run_app(&mut state, &mut ApiRuntime::new(client))
        }
        None => {
            info!(
                rows = DemoRuntime::DEMO_ROWS,
                start_page = options.start_page,
                "starting artwork table with demo catalog"
            );
            artable_tui::run_app(&mut state, &mut DemoRuntime::new(config.page_size()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    start_page: u32,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        start_page: 1,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--page" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--page requires a page number"))?;
                options.start_page = parse_start_page(value.as_ref())?;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn parse_start_page(raw: &str) -> Result<u32> {
    let page: u32 = raw
        .parse()
        .with_context(|| format!("--page expects a positive number, got {raw:?}"))?;
    if page == 0 {
        return Err(anyhow!("--page expects a positive number; pages start at 1"));
    }
    Ok(page)
}

fn print_help() {
    println!("artable");
    println!("  --config <path>          Use a specific config path");
    println!("  --page <n>               Open the table on page n");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Browse a generated offline catalog");
    println!("  --check                  Validate config + API client setup");
    println!("  --help                   Show this help");
}
