mod cli;
mod profiles;

use std::{fs, path::PathBuf};

use anyhow::{Context as _, bail};
use clap::Parser;
use cli::{Cli, Command, ConvertArgs, ExecArgs, PickArgs, ProfileAction};
use directories::BaseDirs;
use toolbelt_core::{ConnectionProfile, SslMode};
use toolbelt_db::{HandlerOptions, MySqlHandler, parse_connection_string};
use toolbelt_dialog::{DialogConfig, FileDialogHandler};
use toolbelt_imaging::{EncodeOptions, bytes_to_image, format_from_name, image_to_bytes};
use toolbelt_storage::ConnectionStore;

type Result<T> = anyhow::Result<T>;

fn main() {
    if let Err(err) = run() {
        eprintln!("Toolbelt failed: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Pick(args) => pick(args),
        Command::Convert(args) => convert(args),
        Command::Profile { action } => {
            let store = ConnectionStore::new(&resolve_config_dir()?);
            manage_profiles(&store, action)
        }
        Command::Exec(args) => exec(args),
    }
}

fn init_tracing() {
    use std::sync::OnceLock;
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

fn resolve_config_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().context("Unable to determine config directory")?;
    let dir_name = if cfg!(target_os = "linux") {
        "toolbelt"
    } else {
        "Toolbelt"
    };
    let dir = base_dirs.config_dir().join(dir_name);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

fn pick(args: PickArgs) -> Result<()> {
    let mut config = DialogConfig {
        filter_index: args.filter_index,
        restore_directory: !args.keep_directory,
        ..Default::default()
    };
    if let Some(dir) = args.dir {
        config.initial_directory = dir;
    }
    if let Some(filter) = args.filter {
        config.filter = filter;
    }

    match FileDialogHandler::new(config).open_file_selector()? {
        Some(path) => println!("{}", path.display()),
        None => tracing::info!("No file selected."),
    }
    Ok(())
}

fn convert(args: ConvertArgs) -> Result<()> {
    let bytes =
        fs::read(&args.input).with_context(|| format!("Failed to read {}", args.input.display()))?;
    let image = bytes_to_image(&bytes)?;

    let format = match (&args.format, args.output.extension()) {
        (Some(name), _) => Some(format_from_name(name)?),
        (None, Some(ext)) => Some(format_from_name(&ext.to_string_lossy())?),
        (None, None) => None,
    };
    let encoded = image_to_bytes(&image, &EncodeOptions { format })?;
    fs::write(&args.output, &encoded)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    tracing::info!(
        width = image.width(),
        height = image.height(),
        bytes = encoded.len(),
        "Wrote {}",
        args.output.display()
    );
    Ok(())
}

fn manage_profiles(store: &ConnectionStore, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Add(args) => {
            let replaced = profiles::add(
                store,
                &args.name,
                &args.connection_string,
                args.save_password,
            )?;
            let verb = if replaced { "Replaced" } else { "Added" };
            tracing::info!("{verb} profile `{}`.", args.name.trim());
            Ok(())
        }
        ProfileAction::List => {
            for line in profiles::list(store)? {
                println!("{line}");
            }
            Ok(())
        }
        ProfileAction::Remove { name } => {
            if store.remove(&name)?.is_none() {
                bail!("No profile named `{name}`.");
            }
            tracing::info!("Removed profile `{name}`.");
            Ok(())
        }
    }
}

fn exec(args: ExecArgs) -> Result<()> {
    let (profile, ssl_mode) = resolve_target(&args)?;
    let mut handler = MySqlHandler::new(&profile, HandlerOptions { ssl_mode })?;
    let command = handler.prepare_with(args.sql, args.params)?;
    let affected = handler.execute_command(&command)?;
    println!("{affected}");
    Ok(())
}

fn resolve_target(args: &ExecArgs) -> Result<(ConnectionProfile, SslMode)> {
    let password = args.password.as_deref();
    match (&args.connection_string, &args.profile) {
        (Some(text), _) => {
            let (profile, ssl_mode) = parse_connection_string(text)?;
            let profile = match password {
                Some(password) => profile.with_password(password),
                None => profile,
            };
            Ok((profile, ssl_mode))
        }
        (None, Some(name)) => {
            let store = ConnectionStore::new(&resolve_config_dir()?);
            profiles::resolve(&store, name, password)
        }
        (None, None) => bail!("Pass `--profile` or `--connection-string`."),
    }
}
