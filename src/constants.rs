//! Shared constants for things
//!

/// Most roster photos that go into a single poster request.
pub const MAX_ROSTER_IMAGES: usize = 5;

/// File extensions accepted from the roster directory, compared lowercased.
pub const ROSTER_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// URL path the generated artifacts are served under.
pub const GENERATED_MOUNT: &str = "/generated";

/// URL path the roster photos are served under.
pub const PLAYERS_MOUNT: &str = "/players";

/// Prefix for generated artifact filenames.
pub const ARTIFACT_PREFIX: &str = "roster";

/// Largest request body we accept, photos arrive base64 encoded.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Header the admin token can be passed in.
pub const X_API_TOKEN: &str = "x-api-token";

/// Most entries returned by the public gallery.
pub const GALLERY_LIMIT: u64 = 50;

/// Disclosure text stored alongside every consent record.
pub const CONSENT_TEXT: &str = "I agree to receive my Roster Moment poster by email and to be \
contacted by Cloud9 about future fan experiences. I can withdraw consent at any time.";

/// Sender display name on outgoing poster emails.
pub const EMAIL_SENDER_NAME: &str = "Roster Moment";

/// Subject line on outgoing poster emails.
pub const EMAIL_SUBJECT: &str = "Your Roster Moment is here! 🏆";

#[cfg(test)]
/// Base URL used in tests
pub const TEST_BASE_URL: &str = "https://roster.example.org";
