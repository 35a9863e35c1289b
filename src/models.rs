//! Request and image types shared across the pipeline

use std::fmt;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The lane a fan picks in the wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Top lane
    Top,
    /// Jungler
    Jungle,
    /// Mid lane
    Mid,
    /// Bottom lane carry
    #[serde(rename = "ADC")]
    Adc,
    /// Support
    Support,
}

impl Role {
    /// Label as sent by the client and stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Top => "Top",
            Role::Jungle => "Jungle",
            Role::Mid => "Mid",
            Role::Adc => "ADC",
            Role::Support => "Support",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual style of the poster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Style {
    /// Painted illustration of the whole roster, the default.
    #[default]
    PaintedHype,
    /// Photoreal victory celebration in an arena.
    HypeMatchDay,
    /// Single-subject profile portrait, never shows teammates.
    SocialMediaAvatar,
}

impl Style {
    /// Every style, in the order the wizard offers them.
    pub const ALL: [Style; 3] = [
        Style::PaintedHype,
        Style::HypeMatchDay,
        Style::SocialMediaAvatar,
    ];

    /// Label as sent by the client.
    pub fn label(self) -> &'static str {
        match self {
            Style::PaintedHype => "Painted Hype",
            Style::HypeMatchDay => "Hype Match Day",
            Style::SocialMediaAvatar => "Social Media Avatar",
        }
    }

    /// Exact label match. Anything unrecognised falls back to [`Style::PaintedHype`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "Painted Hype" => Style::PaintedHype,
            "Hype Match Day" => Style::HypeMatchDay,
            "Social Media Avatar" => Style::SocialMediaAvatar,
            other => {
                debug!("Unknown style {other:?}, using {}", Style::default().label());
                Style::default()
            }
        }
    }

    /// Portrait styles only ever show the fan.
    pub fn is_portrait(self) -> bool {
        matches!(self, Style::SocialMediaAvatar)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Body of `POST /generate`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Lane the fan plays.
    pub role: Role,
    /// Raw style label, resolved with [`Style::from_label`].
    #[serde(default)]
    pub style: String,
    /// Favorite roster member, free text.
    #[serde(default)]
    pub favorite_player: Option<String>,
    /// Where to mail the poster.
    #[serde(default)]
    pub email: Option<String>,
    /// Marketing consent.
    #[serde(default)]
    pub consent: bool,
    /// Gallery opt-in.
    #[serde(default)]
    pub show_in_gallery: bool,
    /// Fan photo as a `data:image/...;base64,...` URI.
    #[serde(default)]
    pub photo: Option<String>,
}

impl GenerationRequest {
    /// Resolved style.
    pub fn style(&self) -> Style {
        Style::from_label(&self.style)
    }

    /// The email address, if one was actually typed in.
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    /// Parsed fan photo. Malformed values count as no photo.
    pub fn fan_photo(&self) -> Option<InlineImage> {
        let photo = self.photo.as_deref()?;
        match InlineImage::from_data_uri(photo) {
            Some(image) => Some(image),
            None => {
                warn!("Ignoring malformed photo data URI ({} bytes)", photo.len());
                None
            }
        }
    }
}

static DATA_URI: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^data:(image/[A-Za-z0-9.+-]+);base64,([A-Za-z0-9+/=\s]+)$")
});

/// Base64 image bytes tagged with their MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineImage {
    /// eg `image/png`
    pub mime_type: String,
    /// Standard base64, no data URI prefix.
    pub data: String,
}

impl InlineImage {
    /// Wraps raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Parses `data:image/<subtype>;base64,<payload>`, checking the payload decodes.
    pub fn from_data_uri(value: &str) -> Option<Self> {
        let regex = DATA_URI.as_ref().ok()?;
        let captures = regex.captures(value.trim())?;
        let mime_type = captures.get(1)?.as_str().to_ascii_lowercase();
        let data: String = captures
            .get(2)?
            .as_str()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        STANDARD.decode(&data).ok()?;
        Some(Self { mime_type, data })
    }

    /// Decoded image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}
