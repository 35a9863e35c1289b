use crate::constants::X_API_TOKEN;

use super::prelude::*;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EmailsQuery {
    token: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriberView {
    id: i32,
    email: String,
    consent: bool,
    consent_text: String,
    created_at: String,
    ip_address: String,
    role: String,
    style: String,
    favorite_player: Option<String>,
    show_in_gallery: bool,
    image_name: Option<String>,
}

impl From<subscribers::Model> for SubscriberView {
    fn from(model: subscribers::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            consent: model.consent,
            consent_text: model.consent_text,
            created_at: model.created_at.to_rfc3339(),
            ip_address: model.ip_address,
            role: model.role,
            style: model.style,
            favorite_player: model.favorite_player,
            show_in_gallery: model.show_in_gallery,
            image_name: model.image_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubscriberList {
    count: usize,
    subscribers: Vec<SubscriberView>,
}

/// Accepts the token from either `?token=` or the `x-api-token` header. No
/// configured token means nobody gets in.
fn authorize(
    expected: Option<&str>,
    query: &EmailsQuery,
    headers: &HeaderMap,
) -> Result<(), RosterError> {
    let Some(expected) = expected else {
        warn!("Subscriber export requested but no admin token is configured");
        return Err(RosterError::Unauthorized);
    };
    let from_header = headers
        .get(X_API_TOKEN)
        .and_then(|value| value.to_str().ok());
    let matched = [query.token.as_deref(), from_header]
        .into_iter()
        .flatten()
        .any(|token| tokens_match(token, expected));
    if matched {
        Ok(())
    } else {
        Err(RosterError::Unauthorized)
    }
}

/// Comparison time depends on the lengths only, not on where the bytes differ.
fn tokens_match(provided: &str, expected: &str) -> bool {
    let (provided, expected) = (provided.as_bytes(), expected.as_bytes());
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(rows: &[subscribers::Model]) -> String {
    let mut csv = String::from("id,email,consent,created_at,ip_address,role,style\n");
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            row.id,
            csv_cell(&row.email),
            row.consent,
            row.created_at.to_rfc3339(),
            csv_cell(&row.ip_address),
            csv_cell(&row.role),
            csv_cell(&row.style),
        ));
    }
    csv
}

/// handles GET /emails
pub(crate) async fn emails_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<EmailsQuery>,
) -> Result<Response, RosterError> {
    authorize(state.config.admin_token.as_deref(), &query, &headers)?;

    let rows = subscribers::all(&state.db).await?;
    info!("Subscriber export: {} rows", rows.len());

    if query.format.as_deref() == Some("csv") {
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"subscribers.csv\"",
                ),
            ],
            render_csv(&rows),
        )
            .into_response());
    }

    Ok(Json(SubscriberList {
        count: rows.len(),
        subscribers: rows.into_iter().map(SubscriberView::from).collect(),
    })
    .into_response())
}
