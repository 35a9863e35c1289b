//! Builds the text part of the poster request.
//!
//! The prompt is assembled from fixed sections, always in this order:
//! identity preservation, role assignment, scene, style, negative constraints.
//! Image indices are 1-based as the model sees them: the fan photo, when one is
//! sent, is image 1 and the roster photos follow.

use crate::models::{Role, Style};

/// Header of the image index assignment section.
pub const ROLE_ASSIGNMENT_HEADER: &str = "MANDATORY ROLE ASSIGNMENT:";

/// Header of the style section.
pub const STYLE_HEADER: &str = "STYLE INSTRUCTIONS:";

const PAINTED_HYPE: &str = "STYLE: Masterpiece Esports Digital Illustration.
- Technique: Thick, expressive oil-painting style with visible palette knife textures and bold brush strokes.
- Color Palette: Dominant Cloud9 blues (deep navy to electric cyan), crisp whites, and cinematic warm orange/gold highlights for contrast.
- Lighting: Intense, dramatic \"Rembrandt\" lighting on faces. High-contrast chiaroscuro effect.
- Energy: Dynamic paint splashes, ethereal energy wisps, and motion-blurred paint fragments exploding from the subjects.
- Atmosphere: A fusion of a high-tech arena and a dreamlike artistic void. No flat backgrounds.
- Subjects: Faces must be recognizable but rendered with artistic soul. The fan should look heroic and integrated into the paint texture.";

const HYPE_MATCH_DAY: &str = "STYLE: Elite Esports Victory Celebration.
- Subjects: Intense, emotional expressions. Everyone is visibly excited, shouting in joy, or cheering.
- Posture: Dynamic and triumphant, arms raised, fists pumped, leaning forward as if celebrating a championship point.
- Lighting: Aggressive neon rim lighting, cinematic lens flares, and volumetric spotlights dancing across the arena.
- Background: A high-tech futuristic esports arena stadium at the peak of a grand final. Holographic Cloud9 banners and digital confetti in the air.
- Visual Effects: Floating data particles, electrical sparks, and vibrant energy streaks that amplify the hype.
- Texture: Sharp, clean, and high-definition photorealism.
- Colors: Electrified cyan, deep space black, and brilliant white flashes.";

const SOCIAL_MEDIA_AVATAR: &str = "STYLE: Photorealistic Pro Player Portrait.
- Subject: The fan from Image 1, facing forward, confident posture with arms crossed.
- Clothing: A high-quality, realistic Cloud9 esports jersey.
- Rendering: Photorealistic, clean, sharp focus.
- Background: Neutral, studio-like professional background (blurred or solid clean color).
- Composition: Waist-up shot, centered, suited to a social media profile picture.
- Likeness: Maximum fidelity to the fan's facial features.";

const NEGATIVE_CONSTRAINTS: &str = "AVOID:
- Generic faces
- Faces taken from anything other than the provided images
- Photorealistic collage (unified artwork required)
- Text other than \"Cloud9\"
- Mismatched lighting
- Extra limbs or distorted hands";

/// Composes the generation instructions for a poster with a fan photo.
///
/// Never fails. `roster_count` is the number of roster photos sent after the
/// fan photo, and is ignored by portrait styles.
pub fn compose(role: Role, style: Style, roster_count: usize) -> String {
    compose_with(role, style, roster_count, true)
}

/// Like [`compose`], but `has_fan_photo` says whether image 1 is the fan.
/// Without a fan photo the roster photos start at image 1 and the fan is drawn
/// without a reference face.
pub fn compose_with(role: Role, style: Style, roster_count: usize, has_fan_photo: bool) -> String {
    let layout = ImageLayout {
        has_fan_photo,
        roster_count,
    };
    let sections = [
        identity_directive(layout),
        role_assignment(layout),
        scene(role, style, layout),
        format!("{STYLE_HEADER}\n{}", style_block(style)),
        NEGATIVE_CONSTRAINTS.to_string(),
    ];
    sections.join("\n\n")
}

/// The style section for a style. [`Style::from_label`] already maps unknown
/// labels onto the default, so the match here is exhaustive.
pub fn style_block(style: Style) -> &'static str {
    match style {
        Style::PaintedHype => PAINTED_HYPE,
        Style::HypeMatchDay => HYPE_MATCH_DAY,
        Style::SocialMediaAvatar => SOCIAL_MEDIA_AVATAR,
    }
}

/// Which 1-based image indices the model will see for what.
#[derive(Clone, Copy, Debug)]
struct ImageLayout {
    has_fan_photo: bool,
    roster_count: usize,
}

impl ImageLayout {
    fn first_roster_index(self) -> usize {
        if self.has_fan_photo { 2 } else { 1 }
    }

    /// Equals `first_roster_index() - 1` for an empty roster.
    fn last_roster_index(self) -> usize {
        self.first_roster_index() + self.roster_count - 1
    }
}

const ANONYMOUS_FAN: &str =
    "NO PHOTO OF THE FAN IS PROVIDED: DRAW THE FAN FROM BEHIND OR IN PROFILE, FACE NOT VISIBLE.";

fn identity_directive(layout: ImageLayout) -> String {
    let first = layout.first_roster_index();
    let last = layout.last_roster_index();
    let sources = match (layout.has_fan_photo, layout.roster_count) {
        (true, 0) => "ONLY USE IMAGE 1 FOR THE FAN'S FACE.".to_string(),
        (true, 1) => {
            "ONLY USE IMAGE 1 FOR THE FAN'S FACE AND IMAGE 2 FOR THE PRO PLAYER'S FACE."
                .to_string()
        }
        (true, _) => format!(
            "ONLY USE IMAGE 1 FOR THE FAN'S FACE AND IMAGES 2 TO {last} FOR THE PRO PLAYERS' FACES."
        ),
        (false, 0) => format!("NO REFERENCE PHOTOS ARE PROVIDED. {ANONYMOUS_FAN}"),
        (false, 1) => format!("ONLY USE IMAGE {first} FOR THE PRO PLAYER'S FACE. {ANONYMOUS_FAN}"),
        (false, _) => format!(
            "ONLY USE IMAGES {first} TO {last} FOR THE PRO PLAYERS' FACES. {ANONYMOUS_FAN}"
        ),
    };
    format!(
        "CRITICAL: STRICT IDENTITY PRESERVATION MODE.
DO NOT USE ANY PRE-TRAINED KNOWLEDGE OF CLOUD9 PLAYERS OR ANY OTHER RECOGNIZABLE PEOPLE.
{sources}
The faces in the final image MUST be exact artistic representations of the provided photos.
IGNORE any famous faces you might know and stick ONLY to the visual blueprints provided in the input images."
    )
}

fn role_assignment(layout: ImageLayout) -> String {
    let protagonist = if layout.has_fan_photo {
        "- IMAGE 1 IS THE PRIMARY PROTAGONIST (The Fan). You MUST include this person as the central focus of the image. This is NON-NEGOTIABLE."
    } else {
        "- THE FAN IS THE PRIMARY PROTAGONIST and has no reference photo. You MUST include the fan, face turned away, as the central focus of the image. This is NON-NEGOTIABLE."
    };
    let first = layout.first_roster_index();
    let secondary = match layout.roster_count {
        0 if layout.has_fan_photo => {
            "- NO OTHER IMAGES ARE PROVIDED. The fan is the only person to depict.".to_string()
        }
        0 => "- NO IMAGES ARE PROVIDED. The fan is the only person to depict.".to_string(),
        1 => format!("- IMAGE {first} IS THE SECONDARY TEAMMATE (The Pro Player)."),
        _ => format!(
            "- IMAGES {first} to {} ARE THE SECONDARY TEAMMATES (The Pro Players).",
            layout.last_roster_index()
        ),
    };
    format!("{ROLE_ASSIGNMENT_HEADER}\n{protagonist}\n{secondary}")
}

fn scene(role: Role, style: Style, layout: ImageLayout) -> String {
    if style.is_portrait() {
        let focus = if layout.has_fan_photo {
            "- FOCUS ONLY ON IMAGE 1 (The Fan). Ignore any other images, even if present."
        } else {
            "- FOCUS ONLY ON THE FAN, who has no reference photo. Ignore any images, even if present."
        };
        return format!(
            "CREATE AN INDIVIDUAL PORTRAIT.
{focus}
- Exactly one person appears in the image.
- The fan is a Cloud9 {role} player."
        );
    }

    let first = layout.first_roster_index();
    let players = match layout.roster_count {
        0 => String::new(),
        1 => format!("- 1 PROFESSIONAL PLAYER (Image {first}): Standing beside the fan.\n"),
        n => format!(
            "- {n} PROFESSIONAL PLAYERS (Images {first} to {}): Arranged around the fan.\n",
            layout.last_roster_index()
        ),
    };
    let people = if layout.roster_count == 0 {
        "1 person".to_string()
    } else {
        format!("{} people total", layout.roster_count + 1)
    };
    let fan = if layout.has_fan_photo {
        "THE FAN (Image 1)"
    } else {
        "THE FAN (no reference photo, face turned away)"
    };
    format!(
        "A high-impact esports poster composition featuring {people}:
- {fan}: Central subject, foreground, largest scale. The entire poster revolves around this person.
{players}
The fan is positioned at the exact center of the image, slightly forward, as the clear visual protagonist.
The fan plays the {role} position and is wearing an official Cloud9 esports jersey.
All subjects are fully integrated into the same visual style.
Vertical orientation, 4:5 aspect ratio."
    )
}
