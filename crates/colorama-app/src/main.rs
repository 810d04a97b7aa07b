//! Command-line entry point (native).

#[cfg(feature = "native")]
use clap::Parser;
#[cfg(feature = "native")]
use colorama_app::{AppConfig, AppResult, Cli, Command, Session, ShortcutRegistry};

#[cfg(feature = "native")]
fn main() -> std::process::ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("Starting Colorama");

    match run(cli.command) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "native")]
fn run(command: Command) -> AppResult<()> {
    let config = AppConfig::load_default();

    match command {
        Command::Shortcuts => ShortcutRegistry::print_all(),
        Command::List => {
            let session = Session::new(&config, config.storage()?)?;
            for project in session.list_projects()? {
                println!(
                    "{}  {:8}  {}  {}",
                    project.id,
                    project.mode.name(),
                    project.modified.format("%Y-%m-%d %H:%M"),
                    project.name
                );
            }
        }
        Command::Export { id, out } => {
            let mut session = Session::new(&config, config.storage()?)?;
            session.open_project(&id)?;
            let format = session.export_to_file(&out)?;
            println!("Exported {} as {}", id, format.extension());
        }
    }
    Ok(())
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
