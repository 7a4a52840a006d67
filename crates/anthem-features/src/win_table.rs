/// All-time win percentage of every Big Ten football program (2024 membership).
pub const BIG_TEN_WIN_PERCENTAGES: [(&str, f64); 18] = [
    ("Ohio State", 0.735),
    ("Michigan", 0.732),
    ("USC", 0.694),
    ("Penn State", 0.691),
    ("Nebraska", 0.677),
    ("Washington", 0.620),
    ("Michigan State", 0.596),
    ("Wisconsin", 0.584),
    ("UCLA", 0.586),
    ("Oregon", 0.582),
    ("Minnesota", 0.573),
    ("Iowa", 0.546),
    ("Maryland", 0.520),
    ("Purdue", 0.513),
    ("Illinois", 0.507),
    ("Rutgers", 0.491),
    ("Northwestern", 0.448),
    ("Indiana", 0.421),
];

#[must_use]
pub fn win_percentage(school: &str) -> Option<f64> {
    BIG_TEN_WIN_PERCENTAGES
        .iter()
        .find(|(name, _)| *name == school)
        .map(|&(_, win)| win)
}
