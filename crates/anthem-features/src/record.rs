use serde::{Deserialize, Serialize};

/// A `Yes`/`No` column of the fight-song table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

/// One row of the fight-song table.
///
/// Flag columns that are absent from the input default to [`YesNo::No`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSongRecord {
    pub school: String,
    pub conference: String,
    pub song_name: String,
    #[serde(default)]
    pub writers: String,
    /// Year written; free text because some songs are `Unknown`
    #[serde(default)]
    pub year: String,
    pub bpm: f64,
    pub sec_duration: f64,
    #[serde(default)]
    pub fight: YesNo,
    pub number_fights: u32,
    #[serde(default)]
    pub victory_win_won: YesNo,
    #[serde(default)]
    pub rah: YesNo,
    #[serde(default)]
    pub nonsense: YesNo,
    #[serde(default)]
    pub colors: YesNo,
    #[serde(default)]
    pub men: YesNo,
    #[serde(default)]
    pub opponents: YesNo,
    #[serde(default)]
    pub spelling: YesNo,
    pub trope_count: u32,
    /// Overrides the built-in win-percentage table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_perc: Option<f64>,
}

/// Schools that left the Pac-12 for the Big Ten in 2024.
pub const BIG_TEN_ARRIVALS: [&str; 4] = ["USC", "UCLA", "Oregon", "Washington"];

/// Moves the 2024 arrivals still listed under the Pac-12 into the Big Ten.
///
/// Returns the number of remapped records.
pub fn remap_conferences(records: &mut [RawSongRecord]) -> usize {
    let mut remapped = 0;
    for record in records
        .iter_mut()
        .filter(|r| r.conference == "Pac-12" && BIG_TEN_ARRIVALS.contains(&r.school.as_str()))
    {
        record.conference = "Big Ten".to_owned();
        remapped += 1;
    }
    remapped
}

/// Keeps the records of one conference.
#[must_use]
pub fn filter_conference(records: Vec<RawSongRecord>, conference: &str) -> Vec<RawSongRecord> {
    records
        .into_iter()
        .filter(|r| r.conference == conference)
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn song(school: &str, conference: &str) -> RawSongRecord {
        RawSongRecord {
            school: school.to_owned(),
            conference: conference.to_owned(),
            song_name: format!("{school} Fight Song"),
            writers: String::new(),
            year: "1900".to_owned(),
            bpm: 120.0,
            sec_duration: 60.0,
            fight: YesNo::Yes,
            number_fights: 2,
            victory_win_won: YesNo::No,
            rah: YesNo::No,
            nonsense: YesNo::No,
            colors: YesNo::No,
            men: YesNo::No,
            opponents: YesNo::No,
            spelling: YesNo::No,
            trope_count: 3,
            win_perc: None,
        }
    }

    #[test]
    fn test_remap_only_moves_pac12_arrivals() {
        let mut records = vec![
            song("USC", "Pac-12"),
            song("Oregon", "Pac-12"),
            song("Stanford", "Pac-12"),
            song("Iowa", "Big Ten"),
            song("UCLA", "Mountain West"),
        ];
        assert_eq!(remap_conferences(&mut records), 2);
        let conferences = records
            .iter()
            .map(|r| r.conference.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            conferences,
            ["Big Ten", "Big Ten", "Pac-12", "Big Ten", "Mountain West"]
        );

        let big_ten = filter_conference(records, "Big Ten");
        assert_eq!(big_ten.len(), 3);
    }

    #[test]
    fn test_parse_with_missing_flags() {
        let json = r#"{
            "school": "Purdue",
            "conference": "Big Ten",
            "song_name": "Hail Purdue",
            "bpm": 152,
            "sec_duration": 71,
            "number_fights": 1,
            "victory_win_won": "Yes",
            "trope_count": 4
        }"#;
        let record: RawSongRecord = serde_json::from_str(json).unwrap();
        assert!(record.victory_win_won.is_yes());
        assert_eq!(record.fight, YesNo::No);
        assert_eq!(record.win_perc, None);
    }
}
