//! CLI entry point for modelprobe.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Probe LLM providers for vision and PDF support
#[derive(Parser, Debug)]
#[command(name = "modelprobe", version, about = "Model capability prober")]
pub struct Cli {
    /// Capability cache file (default: ~/.modelprobe/capability-cache.json)
    #[arg(long, global = true)]
    pub cache: Option<PathBuf>,

    /// TOML probe configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe one or more models and cache the results
    Probe(ProbeArgs),
    /// Show resolved capabilities for a model
    Caps(CapsArgs),
    /// Show cache statistics
    Stats,
    /// Manage local capability overrides
    Override(OverrideArgs),
}

/// Arguments for `modelprobe probe`.
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Models to probe (format: provider:model, e.g., openai:gpt-4o)
    #[arg(required = true)]
    pub models: Vec<String>,

    /// Base URL override applied to every target
    #[arg(long)]
    pub endpoint: Option<String>,

    /// API key applied to every target
    #[arg(long)]
    pub api_key: Option<String>,

    /// Maximum probes in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Skip models probed more recently than this
    #[arg(long)]
    pub max_age_hours: Option<u64>,
}

/// Arguments for `modelprobe caps`.
#[derive(Parser, Debug)]
pub struct CapsArgs {
    /// Model (format: provider:model)
    pub model: String,
}

/// Arguments for the `override` subcommand group.
#[derive(Parser, Debug)]
pub struct OverrideArgs {
    #[command(subcommand)]
    pub command: OverrideCommands,
}

/// Override subcommands.
#[derive(Subcommand, Debug)]
pub enum OverrideCommands {
    /// Merge a JSON patch into a model's override
    Set(OverrideSetArgs),
    /// Remove a model's override
    Remove(OverrideRemoveArgs),
    /// Remove all overrides
    Clear,
}

/// Arguments for `modelprobe override set`.
#[derive(Parser, Debug)]
pub struct OverrideSetArgs {
    /// Model (format: provider:model)
    pub model: String,
    /// Partial capabilities, e.g. '{"supportsVision": true}'
    pub patch: String,
}

/// Arguments for `modelprobe override remove`.
#[derive(Parser, Debug)]
pub struct OverrideRemoveArgs {
    /// Model (format: provider:model)
    pub model: String,
}
