use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "emotedrop", about = "Resolve emote CDN URLs to chat keywords")]
pub struct Cli {
    /// Resolver cache file [default: $XDG_CACHE_HOME/emotedrop/cache.json]
    #[arg(long, global = true)]
    pub cache: Option<PathBuf>,

    /// Settings file [default: $XDG_CONFIG_HOME/emotedrop/settings.json]
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Days a resolved keyword stays cached
    #[arg(long, global = true, default_value_t = 10)]
    pub ttl_days: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the provider and emote id of a CDN URL
    Classify {
        url: String,
    },

    /// Resolve a CDN URL to its keyword
    Resolve {
        url: String,
    },

    /// Remove expired entries from the resolver cache
    Sweep,

    /// Show or change the persisted feature flags
    Settings {
        #[arg(long)]
        enabled: Option<bool>,

        #[arg(long = "enable-7tv")]
        enable_7tv: Option<bool>,

        #[arg(long = "enable-bttv")]
        enable_bttv: Option<bool>,

        #[arg(long = "enable-ffz")]
        enable_ffz: Option<bool>,
    },
}
