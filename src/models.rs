use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the twelve selectable synthesis algorithms.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceId {
    #[default]
    Brown,
    Pink,
    White,
    Ocean,
    Alpha,
    Theta,
    Drone,
    Wind,
    Interstellar,
    Oppenheimer,
    Pulse,
    Library,
}

/// Menu metadata for a voice.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceInfo {
    pub id: VoiceId,
    pub name: &'static str,
    pub description: &'static str,
    /// Accent colour as `#rrggbb`.
    pub accent: &'static str,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown voice `{0}`")]
pub struct UnknownVoice(pub String);

impl VoiceId {
    /// Menu order.
    pub const ALL: [VoiceId; 12] = [
        VoiceId::Brown,
        VoiceId::Pink,
        VoiceId::White,
        VoiceId::Ocean,
        VoiceId::Alpha,
        VoiceId::Theta,
        VoiceId::Drone,
        VoiceId::Wind,
        VoiceId::Interstellar,
        VoiceId::Oppenheimer,
        VoiceId::Pulse,
        VoiceId::Library,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VoiceId::Brown => "brown",
            VoiceId::Pink => "pink",
            VoiceId::White => "white",
            VoiceId::Ocean => "ocean",
            VoiceId::Alpha => "alpha",
            VoiceId::Theta => "theta",
            VoiceId::Drone => "drone",
            VoiceId::Wind => "wind",
            VoiceId::Interstellar => "interstellar",
            VoiceId::Oppenheimer => "oppenheimer",
            VoiceId::Pulse => "pulse",
            VoiceId::Library => "library",
        }
    }

    pub fn info(self) -> VoiceInfo {
        let (name, description, accent) = match self {
            VoiceId::Brown => ("Brown Noise", "Deep Rumble", "#92400e"),
            VoiceId::Pink => ("Pink Noise", "Soft Rainfall", "#fb7185"),
            VoiceId::White => ("White Noise", "Steady Static", "#d4d4d8"),
            VoiceId::Ocean => ("Ocean Waves", "Tidal Rhythm", "#60a5fa"),
            VoiceId::Alpha => ("Alpha Focus", "10Hz Binaural", "#6366f1"),
            VoiceId::Theta => ("Theta Zen", "6Hz Meditation", "#a855f7"),
            VoiceId::Drone => ("Study Drone", "Deep Space", "#334155"),
            VoiceId::Wind => ("Midnight Wind", "Howling Gusts", "#0891b2"),
            VoiceId::Interstellar => ("Interstellar", "Organ & Space", "#1e3a8a"),
            VoiceId::Oppenheimer => ("Oppenheimer", "Atomic Tension", "#7c2d12"),
            VoiceId::Pulse => ("Minimalist Pulse", "Steady Rhythm", "#10b981"),
            VoiceId::Library => ("Library Hiss", "Cozy Ambiance", "#fdba74"),
        };
        VoiceInfo {
            id: self,
            name,
            description,
            accent,
        }
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for VoiceId {
    type Err = UnknownVoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        VoiceId::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVoice(s.to_string()))
    }
}

/// The full selection menu in display order.
pub fn catalog() -> Vec<VoiceInfo> {
    VoiceId::ALL.iter().map(|v| v.info()).collect()
}
