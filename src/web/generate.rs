use crate::artifact::GeneratedArtifact;
use crate::models::GenerationRequest;
use crate::prompt::compose_with;
use crate::roster::load_roster_images;

use super::prelude::*;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    success: bool,
    message: &'static str,
    image_url: String,
    image_name: String,
    image_base64: String,
    role: String,
    style: String,
    email: Option<String>,
}

/// handles POST /generate
///
/// Roster load, model call and persistence run in order and any failure ends the
/// request. Email and consent storage run after the response is built and
/// never affect it.
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    client_ip: ClientIp,
    RosterJson(request): RosterJson<GenerationRequest>,
) -> Result<Json<GenerateResponse>, RosterError> {
    let style = request.style();
    let fan_photo = request.fan_photo();
    info!(
        "New request: role={} style={} email={} photo={}",
        request.role,
        style,
        request.email().is_some(),
        fan_photo.is_some()
    );

    let roster = load_roster_images(&state.config.players_dir, style).await?;
    let prompt = compose_with(request.role, style, roster.len(), fan_photo.is_some());
    let artifact = state
        .gemini
        .generate(&prompt, fan_photo.as_ref(), &roster)
        .await?;
    let image_url = state.artifacts.persist(&artifact).await?;

    spawn_side_effects(&state, &request, &client_ip, &artifact).await;

    Ok(Json(GenerateResponse {
        success: true,
        message: "Roster Moment generated",
        image_url,
        image_name: artifact.file_name,
        image_base64: artifact.data,
        role: request.role.to_string(),
        style: request.style,
        email: request.email,
    }))
}

async fn spawn_side_effects(
    state: &AppState,
    request: &GenerationRequest,
    client_ip: &ClientIp,
    artifact: &GeneratedArtifact,
) {
    let Some(email) = request.email().map(str::to_string) else {
        return;
    };

    let notifier = state.notifier.clone();
    let to = email.clone();
    let image = artifact.data.clone();
    let attachment_name = format!("roster-moment.{}", artifact.extension);
    state
        .tasks
        .spawn("email", async move {
            if !notifier.send(&to, &image, &attachment_name).await {
                warn!("Background email to {to} failed");
            }
        })
        .await;

    let db = state.db.clone();
    let entry = subscribers::SubscriberEntry {
        email,
        consent: request.consent,
        ip_address: client_ip.0.clone(),
        role: request.role.to_string(),
        style: request.style().label().to_string(),
        favorite_player: request
            .favorite_player
            .as_deref()
            .map(str::trim)
            .filter(|player| !player.is_empty())
            .map(str::to_string),
        show_in_gallery: request.show_in_gallery,
        image_name: Some(artifact.file_name.clone()),
    };
    state
        .tasks
        .spawn("consent", async move {
            match subscribers::upsert(&db, entry).await {
                Ok(outcome) => info!("Consent ledger: {:?}", outcome.receipt()),
                Err(err) => error!("Failed to store subscriber: {err}"),
            }
        })
        .await;
}
