use clap::Parser;
use color_eyre::Result;
use databarista::batch::{self, BatchPlan};
use databarista::error_display::{user_message_from_load, user_message_from_report};
use databarista::logging::{self, LogTarget};
use databarista::{
    resolve_data_path, start_page, App, AppConfig, AppEvent, Args, CacheManager, ConfigManager,
    Dataset, OpenOptions, Theme, APP_NAME,
};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, mut app: App, poll_interval: Duration) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    render(&mut terminal, &mut app)?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Configuration file written to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                match cache.clear_all() {
                    Ok(removed) if removed.is_empty() => println!("No cache to clear"),
                    Ok(removed) => println!("Cache cleared ({} file(s) removed)", removed.len()),
                    Err(e) => {
                        eprintln!("Error clearing cache: {}", e);
                        std::process::exit(1);
                    }
                }
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    Ok(None)
}

fn init_logging(args: &Args, config: &AppConfig) -> Result<()> {
    let debug = args.debug || config.debug.enabled;
    if args.is_batch() {
        return logging::init(LogTarget::Stderr, debug);
    }
    let path = match args
        .log_file
        .clone()
        .or_else(|| config.debug.log_file.as_ref().map(PathBuf::from))
    {
        Some(path) => path,
        None => CacheManager::new(APP_NAME)?.log_path()?,
    };
    logging::init(LogTarget::File(&path), debug)
}

fn run_batch(args: &Args, dataset: &Dataset, config: &AppConfig) -> Result<()> {
    let Some(charts) = &args.charts else {
        return Ok(());
    };
    let selections = batch::load_selections(charts)?;
    let plan = BatchPlan {
        print_requests: args.print_requests || args.export_dir.is_none(),
        export_dir: args.export_dir.clone(),
        format: config.export.format,
        size: config.export.size(),
        options: config.chart.options(),
    };
    let mut stdout = std::io::stdout().lock();
    batch::run(dataset, &selections, &plan, &mut stdout)?;
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let mut config = match AppConfig::load(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(format) = args.export_format {
        config.export.format = format.into();
    }
    let theme = Theme::from_config(&config.theme)?;

    init_logging(&args, &config)?;

    let path = resolve_data_path(&args, &config);
    let opts = OpenOptions::from_args_and_config(&args, &config);
    let dataset = match Dataset::load(&path, &opts) {
        Ok(dataset) => Arc::new(dataset),
        Err(e) => {
            error!(error = %e, "dataset load failed");
            eprintln!("{}", user_message_from_load(&e));
            std::process::exit(1);
        }
    };
    let (rows, cols) = dataset.shape();
    info!(path = %path.display(), rows, cols, "dataset loaded");

    if args.is_batch() {
        if let Err(e) = run_batch(&args, &dataset, &config) {
            let cause = format!("{e:#}");
            error!(error = %cause, "batch run failed");
            eprintln!("Error: {}", user_message_from_report(&e));
            std::process::exit(1);
        }
        return Ok(());
    }

    let poll_interval = Duration::from_millis(config.display.event_poll_interval_ms);
    let page = start_page(args.page, &config);
    let app = App::new(dataset, config, theme, page);

    let terminal = ratatui::init();
    let result = run(terminal, app, poll_interval);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
