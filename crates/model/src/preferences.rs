//! Listing preferences and their persisted keys.

use serde::{Deserialize, Serialize};

/// Sort direction applied to directory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Persisted preference keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreferenceKey {
    /// `true` means ascending order.
    Sort,
    /// `true` means file sizes are shown.
    Size,
}

impl PreferenceKey {
    /// All keys, in settings-screen order.
    pub const ALL: [PreferenceKey; 2] = [PreferenceKey::Sort, PreferenceKey::Size];

    /// Name under which the value is stored.
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::Sort => "sort",
            PreferenceKey::Size => "size",
        }
    }

    /// Label shown on the settings screen.
    pub fn label(self) -> &'static str {
        match self {
            PreferenceKey::Sort => "Sort",
            PreferenceKey::Size => "Show file size",
        }
    }

    /// Value used when nothing has been stored yet.
    pub fn default_value(self) -> bool {
        true
    }

    /// Encode a flag the way it is persisted.
    pub fn encode(value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    /// Decode a persisted flag. Anything but `"1"` reads as off.
    pub fn decode(raw: &str) -> bool {
        raw.trim() == "1"
    }
}

impl std::fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PreferenceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sort" => Ok(PreferenceKey::Sort),
            "size" => Ok(PreferenceKey::Size),
            other => Err(format!("unknown preference: {other}")),
        }
    }
}

/// Display preferences threaded into every listing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPreferences {
    /// Sort entries in descending order.
    pub sort_descending: bool,
    /// Read and show file sizes.
    pub show_size: bool,
}

impl Default for ListingPreferences {
    fn default() -> Self {
        Self {
            sort_descending: false,
            show_size: true,
        }
    }
}

impl ListingPreferences {
    /// Build preferences from the two persisted flags.
    pub fn from_flags(sort_ascending: bool, show_size: bool) -> Self {
        Self {
            sort_descending: !sort_ascending,
            show_size,
        }
    }

    pub fn sort_order(&self) -> SortOrder {
        if self.sort_descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    /// The persisted flag value for `key`.
    pub fn flag(&self, key: PreferenceKey) -> bool {
        match key {
            PreferenceKey::Sort => !self.sort_descending,
            PreferenceKey::Size => self.show_size,
        }
    }
}
