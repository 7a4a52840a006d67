//! Feature provider for the fight-song Mapper.
//!
//! Turns raw fight-song rows into the entity records consumed by `anthem-mapper`:
//!
//! 1. Pac-12 schools that joined the Big Ten in 2024 are remapped
//! 2. Rows are filtered to one conference (optional)
//! 3. Each school gets its all-time win percentage, from the row itself or the
//!    built-in table
//! 4. Energy, aggression, cliché and complexity scores are derived
//!
//! The resulting feature vector has the dimensions of [`FEATURE_NAMES`], in order.

pub mod record;
pub mod scores;
pub mod win_table;

use anthem_mapper::feature_space::{EntityDataset, EntityRecord};

use crate::{
    record::{RawSongRecord, filter_conference, remap_conferences},
    scores::score_songs,
};

/// Feature dimensions produced by [`prepare`].
pub const FEATURE_NAMES: [&str; 5] = [
    "energy_score",
    "win_perc",
    "aggression_score",
    "cliche_score",
    "complexity_score",
];

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum FeatureError {
    #[display("no win percentage known for school '{school}'")]
    MissingWinPercentage { school: String },
    #[display("no songs left after selecting conference '{conference}'")]
    EmptySelection { conference: String },
    #[display("no songs supplied")]
    NoSongs,
}

/// Builds the Mapper input from raw song rows.
///
/// With `conference` set, only that conference's rows are kept (after remapping).
///
/// # Errors
///
/// - [`FeatureError::NoSongs`] if `records` is empty
/// - [`FeatureError::EmptySelection`] if the conference filter removes every row
/// - [`FeatureError::MissingWinPercentage`] if a school has neither a `win_perc`
///   value nor a table entry
pub fn prepare(
    mut records: Vec<RawSongRecord>,
    conference: Option<&str>,
) -> Result<EntityDataset, FeatureError> {
    if records.is_empty() {
        return Err(FeatureError::NoSongs);
    }

    let remapped = remap_conferences(&mut records);
    log::debug!("remapped {remapped} schools into the Big Ten");

    if let Some(conference) = conference {
        records = filter_conference(records, conference);
        if records.is_empty() {
            return Err(FeatureError::EmptySelection {
                conference: conference.to_owned(),
            });
        }
        log::debug!("{} songs in {conference}", records.len());
    }

    let scores = score_songs(&records);
    let entities = records
        .into_iter()
        .zip(scores)
        .map(|(record, scores)| {
            let win = record
                .win_perc
                .or_else(|| win_table::win_percentage(&record.school))
                .ok_or_else(|| FeatureError::MissingWinPercentage {
                    school: record.school.clone(),
                })?;
            Ok(EntityRecord {
                id: record.school.into(),
                label: Some(record.song_name),
                features: vec![
                    scores.energy,
                    win,
                    scores.aggression,
                    scores.cliche,
                    scores.complexity,
                ],
                win_percentage: win,
                spirit_score: scores.spirit(),
            })
        })
        .collect::<Result<Vec<_>, FeatureError>>()?;

    Ok(EntityDataset {
        feature_names: FEATURE_NAMES.map(str::to_owned).to_vec(),
        entities,
    })
}
