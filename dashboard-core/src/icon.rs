//! Classification of provider icon tokens.
//!
//! Sources disagree on what an "icon" is: OpenWeatherMap sends short codes
//! such as `"09d"`, Open-Meteo derived data and the synthetic source use emoji,
//! and some payloads already carry a full image URL. [`IconKind::classify`]
//! decides which one a token is, and every place that renders an icon goes
//! through it.

const OPENWEATHER_ICON_BASE: &str = "https://openweathermap.org/img/wn";

/// Pictographic blocks treated as directly renderable glyphs.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F), // emoticons
    (0x1F300, 0x1F5FF), // misc symbols and pictographs
    (0x1F680, 0x1F6FF), // transport and map
    (0x1F1E0, 0x1F1FF), // regional indicators
    (0x2600, 0x26FF),   // misc symbols
    (0x2700, 0x27BF),   // dingbats
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IconKind {
    Url(String),
    Emoji(String),
    IconCode(String),
}

impl IconKind {
    pub fn classify(token: &str) -> Self {
        if token.contains("http") || token.contains('@') {
            IconKind::Url(token.to_string())
        } else if token.chars().any(is_pictographic) {
            IconKind::Emoji(token.to_string())
        } else {
            IconKind::IconCode(token.to_string())
        }
    }

    /// The string to hand to a renderer: the glyph itself or an image URL.
    pub fn resolve(&self) -> String {
        match self {
            IconKind::Url(url) => url.clone(),
            IconKind::Emoji(glyph) => glyph.clone(),
            IconKind::IconCode(code) => format!("{OPENWEATHER_ICON_BASE}/{code}@2x.png"),
        }
    }

    pub fn is_glyph(&self) -> bool {
        matches!(self, IconKind::Emoji(_))
    }
}

/// Shorthand for `IconKind::classify(token).resolve()`.
pub fn resolve_icon(token: &str) -> String {
    IconKind::classify(token).resolve()
}

fn is_pictographic(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&cp))
}
