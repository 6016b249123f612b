use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use toolbelt_db::SqlValue;

use crate::Result;

#[derive(Debug, Parser)]
#[command(name = "toolbelt", version, about = "File picker, image and MySQL helpers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the native file picker and print the chosen path.
    Pick(PickArgs),
    /// Decode an image and encode it again, optionally in another format.
    Convert(ConvertArgs),
    /// Manage connection strings saved under a name.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Run a non-query statement and print the affected row count.
    Exec(ExecArgs),
}

#[derive(Debug, Args)]
pub struct PickArgs {
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// `Description|pattern` pairs.
    #[arg(long)]
    pub filter: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub filter_index: usize,
    /// Leave the working directory wherever the dialog left it.
    #[arg(long)]
    pub keep_directory: bool,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Output format such as `png`. Defaults to the output extension.
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    Add(ProfileAddArgs),
    List,
    Remove { name: String },
}

#[derive(Debug, Args)]
pub struct ProfileAddArgs {
    pub name: String,
    /// `Server=..;Port=..;SslMode=..;Database=..;Uid=..;Pwd=..;`
    pub connection_string: String,
    /// Keep `Pwd` in the saved string. The file is not encrypted.
    #[arg(long)]
    pub save_password: bool,
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    pub sql: String,
    #[arg(
        long,
        conflicts_with = "connection_string",
        required_unless_present = "connection_string"
    )]
    pub profile: Option<String>,
    /// `Server=..;Port=..;SslMode=..;Database=..;Uid=..;Pwd=..;`
    #[arg(long)]
    pub connection_string: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    /// `name=value`; repeat for several parameters.
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, SqlValue)>,
}

/// Integers bind as numbers, `NULL` as null, everything else as text.
pub fn parse_param(text: &str) -> Result<(String, SqlValue)> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected `name=value`, got `{text}`."))?;
    let value = if value.eq_ignore_ascii_case("null") {
        SqlValue::Null
    } else if let Ok(number) = value.parse::<i64>() {
        SqlValue::Int(number)
    } else {
        SqlValue::Text(value.to_string())
    };
    Ok((name.trim().to_string(), value))
}
