use clap::Parser;

use crate::config::StoreKind;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Overrides HEALTHHUB_STORE.
    #[arg(long)]
    pub store: Option<StoreKind>,
    #[arg(long, default_value_t = false)]
    pub skip_migrations: bool,
}
