pub mod profiles;

pub use profiles::{ConnectionProfile, SslMode};

pub type Result<T> = anyhow::Result<T>;
