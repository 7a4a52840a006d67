use std::path::PathBuf;

use anyhow::Context;

use crate::util::{self, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PrepareArg {
    /// Path to the raw songs JSON file (array of rows)
    songs: PathBuf,
    /// Conference to keep, after the 2024 Big Ten remap
    #[arg(long, default_value = "Big Ten")]
    conference: String,
    /// Keep every conference
    #[arg(long, conflicts_with = "conference")]
    all_conferences: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &PrepareArg) -> anyhow::Result<()> {
    let songs = util::read_songs_file(&arg.songs)?;
    eprintln!("Loaded {} songs from {}", songs.len(), arg.songs.display());

    let conference = (!arg.all_conferences).then_some(arg.conference.as_str());
    let dataset = anthem_features::prepare(songs, conference)
        .with_context(|| format!("Failed to prepare features from {}", arg.songs.display()))?;

    eprintln!("Prepared {} entities:", dataset.entities.len());
    for entity in &dataset.entities {
        eprintln!("  - {} ({:.3})", entity.id, entity.win_percentage);
    }

    Output::save_json(&dataset, arg.output.clone())?;
    Ok(())
}
