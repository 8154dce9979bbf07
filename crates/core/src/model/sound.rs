use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const MUTED_KEY: &str = "sound_isMuted";
pub const VOLUME_KEY: &str = "sound_volume";
const SETTING_KEY_PREFIX: &str = "sound_setting_";
const DEFAULT_VOLUME: u8 = 50;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SoundPreferencesError {
    #[error("volume must be between 0 and 100, got {0}")]
    InvalidVolume(u32),

    #[error("unknown {event} sound: {file}")]
    UnknownSound { event: SoundEvent, file: String },
}

/// Events a front-end plays a sound for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundEvent {
    Background,
    Click,
    Correct,
    Wrong,
}

impl SoundEvent {
    pub const ALL: [SoundEvent; 4] = [
        SoundEvent::Background,
        SoundEvent::Click,
        SoundEvent::Correct,
        SoundEvent::Wrong,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SoundEvent::Background => "background",
            SoundEvent::Click => "click",
            SoundEvent::Correct => "correct",
            SoundEvent::Wrong => "wrong",
        }
    }

    /// Preference key holding the selected file for this event.
    #[must_use]
    pub fn setting_key(self) -> String {
        format!("{SETTING_KEY_PREFIX}{}", self.as_str())
    }

    /// Sounds a learner may pick for this event; the first is the default.
    #[must_use]
    pub fn library(self) -> &'static [SoundChoice] {
        match self {
            SoundEvent::Background => &[
                SoundChoice { name: "Calm Music", file: "background/calm-background-music.mp3" },
                SoundChoice { name: "Documentary", file: "background/documentary-background-music.mp3" },
                SoundChoice { name: "Relaxing Loop", file: "background/relaxing-light-background-loop.wav" },
            ],
            SoundEvent::Click => &[
                SoundChoice { name: "Click (wav)", file: "click/click.wav" },
                SoundChoice { name: "Standard Click (mp3)", file: "click/standard-click.mp3" },
            ],
            SoundEvent::Correct => &[
                SoundChoice { name: "Correct (mp3)", file: "correct/correct.mp3" },
                SoundChoice { name: "Chime", file: "correct/chime.mp3" },
            ],
            SoundEvent::Wrong => &[
                SoundChoice { name: "Wrong (mp3)", file: "wrong/wrong.mp3" },
                SoundChoice { name: "Fail", file: "wrong/fail.mp3" },
            ],
        }
    }

    #[must_use]
    pub fn default_file(self) -> &'static str {
        self.library()[0].file
    }

    #[must_use]
    pub fn offers(self, file: &str) -> bool {
        self.library().iter().any(|choice| choice.file == file)
    }
}

impl fmt::Display for SoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoundChoice {
    pub name: &'static str,
    pub file: &'static str,
}

//
// ─── PREFERENCES ───────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundPreferences {
    muted: bool,
    volume: u8,
    selections: BTreeMap<SoundEvent, String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundPreferencesDraft {
    pub muted: Option<bool>,
    pub volume: Option<u32>,
    #[serde(default)]
    pub selections: BTreeMap<SoundEvent, String>,
}

impl SoundPreferencesDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, filling unset fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns `SoundPreferencesError` if the volume is above 100 or a
    /// selection is not part of that event's library.
    pub fn validate(self) -> Result<SoundPreferences, SoundPreferencesError> {
        self.apply_to(SoundPreferences::default())
    }

    /// Validate the draft and overlay the fields it sets onto `base`.
    ///
    /// # Errors
    ///
    /// Same as [`SoundPreferencesDraft::validate`]; `base` is left untouched
    /// on error.
    pub fn apply_to(
        self,
        mut prefs: SoundPreferences,
    ) -> Result<SoundPreferences, SoundPreferencesError> {
        if let Some(muted) = self.muted {
            prefs.muted = muted;
        }
        if let Some(volume) = self.volume {
            prefs.volume = u8::try_from(volume)
                .ok()
                .filter(|v| *v <= 100)
                .ok_or(SoundPreferencesError::InvalidVolume(volume))?;
        }
        for (event, file) in self.selections {
            let file = file.trim().to_owned();
            if !event.offers(&file) {
                return Err(SoundPreferencesError::UnknownSound { event, file });
            }
            prefs.selections.insert(event, file);
        }
        Ok(prefs)
    }
}

impl SoundPreferences {
    /// Rebuild preferences from stored key/value pairs.
    ///
    /// Missing or unreadable entries fall back to defaults individually, so a
    /// single corrupt key never discards the rest.
    #[must_use]
    pub fn from_entries(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut prefs = Self::default();
        if let Some(muted) = lookup(MUTED_KEY).and_then(|raw| raw.trim().parse::<bool>().ok()) {
            prefs.muted = muted;
        }
        if let Some(volume) = lookup(VOLUME_KEY)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|v| (0.0..=100.0).contains(v))
        {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                prefs.volume = volume.round() as u8;
            }
        }
        for event in SoundEvent::ALL {
            if let Some(file) = lookup(&event.setting_key()).filter(|file| event.offers(file)) {
                prefs.selections.insert(event, file);
            }
        }
        prefs
    }

    /// Key/value pairs to persist, using the browser storage key names.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            (MUTED_KEY.to_owned(), self.muted.to_string()),
            (VOLUME_KEY.to_owned(), self.volume.to_string()),
        ];
        for (event, file) in &self.selections {
            entries.push((event.setting_key(), file.clone()));
        }
        entries
    }

    #[must_use]
    pub fn muted(&self) -> bool {
        self.muted
    }

    #[must_use]
    pub fn volume(&self) -> u8 {
        self.volume
    }

    #[must_use]
    pub fn selection(&self, event: SoundEvent) -> &str {
        self.selections
            .get(&event)
            .map_or_else(|| event.default_file(), String::as_str)
    }
}

impl Default for SoundPreferences {
    fn default() -> Self {
        Self {
            muted: false,
            volume: DEFAULT_VOLUME,
            selections: SoundEvent::ALL
                .into_iter()
                .map(|event| (event, event.default_file().to_owned()))
                .collect(),
        }
    }
}
