use std::collections::BTreeMap;

use crate::constants::GALLERY_LIMIT;

use super::prelude::*;

/// handles GET /health
pub(crate) async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatsResponse {
    total: i64,
    by_role: BTreeMap<String, i64>,
    by_style: BTreeMap<String, i64>,
    by_player: BTreeMap<String, i64>,
    by_hour: BTreeMap<String, i64>,
}

/// handles GET /stats
pub(crate) async fn stats_handler(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, RosterError> {
    let db = &state.db;
    let by_role = subscribers::count_by(db, subscribers::Column::Role).await?;
    Ok(Json(StatsResponse {
        total: by_role.values().sum(),
        by_role,
        by_style: subscribers::count_by(db, subscribers::Column::Style).await?,
        by_player: subscribers::count_by(db, subscribers::Column::FavoritePlayer).await?,
        by_hour: subscribers::count_by_hour(db).await?,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GalleryItem {
    role: String,
    style: String,
    player: Option<String>,
    image_url: String,
    created_at: String,
}

/// handles GET /gallery
pub(crate) async fn gallery_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<GalleryItem>>, RosterError> {
    let rows = subscribers::gallery(&state.db, GALLERY_LIMIT).await?;
    let items = rows
        .into_iter()
        .filter_map(|row| {
            let image_name = row.image_name?;
            Some(GalleryItem {
                role: row.role,
                style: row.style,
                player: row.favorite_player,
                image_url: state.artifacts.public_url(&image_name),
                created_at: row.created_at.to_rfc3339(),
            })
        })
        .collect();
    Ok(Json(items))
}
