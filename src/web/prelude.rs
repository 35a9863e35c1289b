pub(crate) use super::extractors::{ClientIp, RosterJson};
pub(crate) use crate::db::entities::subscribers;
pub(crate) use crate::error::RosterError;
pub(crate) use crate::web::AppState;
pub(crate) use axum::Json;
pub(crate) use axum::extract::{Query, State};
pub(crate) use axum::http::{HeaderMap, header};
pub(crate) use axum::response::{IntoResponse, Response};
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use tracing::{error, info, warn};
