use serde::{Deserialize, Serialize};

/// ASEAN member states eligible for the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "Brunei Darussalam")]
    Brunei,
    Cambodia,
    Indonesia,
    #[serde(rename = "Lao PDR")]
    Laos,
    Malaysia,
    Myanmar,
    Philippines,
    Singapore,
    Thailand,
    Vietnam,
}

/// Alternative spellings found across World Bank extracts, already normalized.
const ALIASES: &[(&str, Country)] = &[
    ("vietnam", Country::Vietnam),
    ("laopdr", Country::Laos),
    ("laos", Country::Laos),
    ("laopeoplesdemocraticrepublic", Country::Laos),
    ("brunei", Country::Brunei),
    ("bruneidarussalam", Country::Brunei),
    ("burma", Country::Myanmar),
];

impl Country {
    pub const ALL: [Country; 10] = [
        Country::Brunei,
        Country::Cambodia,
        Country::Indonesia,
        Country::Laos,
        Country::Malaysia,
        Country::Myanmar,
        Country::Philippines,
        Country::Singapore,
        Country::Thailand,
        Country::Vietnam,
    ];

    /// Canonical display name.
    pub fn name(&self) -> &'static str {
        match self {
            Country::Brunei => "Brunei Darussalam",
            Country::Cambodia => "Cambodia",
            Country::Indonesia => "Indonesia",
            Country::Laos => "Lao PDR",
            Country::Malaysia => "Malaysia",
            Country::Myanmar => "Myanmar",
            Country::Philippines => "Philippines",
            Country::Singapore => "Singapore",
            Country::Thailand => "Thailand",
            Country::Vietnam => "Vietnam",
        }
    }

    /// Resolve a raw `Country Name` cell, applying normalization and aliases.
    ///
    /// Returns `None` for anything outside the ASEAN set (aggregates such as
    /// "East Asia & Pacific" included).
    pub fn from_name(raw: &str) -> Option<Country> {
        let key = normalize_name(raw);
        if key.is_empty() {
            return None;
        }
        Country::ALL
            .iter()
            .copied()
            .find(|c| normalize_name(c.name()) == key)
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == key)
                    .map(|(_, c)| *c)
            })
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Country::from_name(s).ok_or_else(|| format!("'{}' is not an ASEAN member", s))
    }
}

/// Lower-case and drop whitespace and punctuation: "Viet Nam" -> "vietnam".
pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
