//! Opt-in contact records, one per email address
use std::collections::BTreeMap;

use chrono::{Timelike, Utc};
use sea_orm::sea_query::{Alias, Expr, OnConflict, Query};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, QueryOrder, QuerySelect, StatementBuilder,
    TransactionTrait, entity::prelude::*,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::constants::CONSENT_TEXT;
use crate::error::RosterError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "subscribers")]
/// A fan who agreed to be contacted
pub struct Model {
    #[sea_orm(primary_key)]
    /// db id
    pub id: i32,
    /// normalised email, unique
    #[sea_orm(unique)]
    pub email: String,
    /// always true for stored rows
    pub consent: bool,
    /// disclosure the fan agreed to
    pub consent_text: String,
    /// time of the latest submission
    pub created_at: DateTimeUtc,
    /// client address of the latest submission
    pub ip_address: String,
    /// lane picked in the wizard
    pub role: String,
    /// poster style picked in the wizard
    pub style: String,
    /// favorite roster member, if picked
    pub favorite_player: Option<String>,
    /// public gallery opt-in
    pub show_in_gallery: bool,
    /// generated artifact filename
    pub image_name: Option<String>,
}

/// relations for subscribers
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Everything captured about a submission, before consent is checked.
#[derive(Clone, Debug)]
pub struct SubscriberEntry {
    /// address as typed
    pub email: String,
    /// explicit consent
    pub consent: bool,
    /// client address
    pub ip_address: String,
    /// lane label
    pub role: String,
    /// style label
    pub style: String,
    /// favorite roster member
    pub favorite_player: Option<String>,
    /// gallery opt-in
    pub show_in_gallery: bool,
    /// generated artifact filename
    pub image_name: Option<String>,
}

/// What happened to a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsentOutcome {
    /// No row existed for the email.
    Inserted,
    /// The previous row for the email was overwritten.
    Replaced,
    /// Nothing written, consent was not given.
    NoConsent,
}

/// Wire form of a [`ConsentOutcome`]: `{saved, reason?}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsentReceipt {
    /// whether a row now holds this submission
    pub saved: bool,
    /// why nothing was saved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl ConsentOutcome {
    /// Inserts and replacements both count as saved.
    pub fn receipt(self) -> ConsentReceipt {
        match self {
            ConsentOutcome::Inserted | ConsentOutcome::Replaced => ConsentReceipt {
                saved: true,
                reason: None,
            },
            ConsentOutcome::NoConsent => ConsentReceipt {
                saved: false,
                reason: Some("no_consent"),
            },
        }
    }
}

/// Emails are keyed case-insensitively: trimmed and ASCII-lowercased.
pub fn normalize_email(email: &str) -> Result<String, RosterError> {
    let email = email.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(RosterError::MalformedInput(format!(
            "not an email address: {email:?}"
        ))),
    }
}

/// Stores the submission if consent was given, replacing any earlier row for the
/// same email. Last write wins, no history is kept.
pub async fn upsert(
    db: &DatabaseConnection,
    entry: SubscriberEntry,
) -> Result<ConsentOutcome, RosterError> {
    if !entry.consent {
        debug!("No consent given, not storing subscriber");
        return Ok(ConsentOutcome::NoConsent);
    }
    let email = normalize_email(&entry.email)?;

    let db_txn = db.begin().await?;
    let existing = Entity::find()
        .filter(Column::Email.eq(email.as_str()))
        .one(&db_txn)
        .await?;

    let active = ActiveModel {
        email: Set(email.clone()),
        consent: Set(true),
        consent_text: Set(CONSENT_TEXT.to_string()),
        created_at: Set(Utc::now()),
        ip_address: Set(entry.ip_address),
        role: Set(entry.role),
        style: Set(entry.style),
        favorite_player: Set(entry.favorite_player),
        show_in_gallery: Set(entry.show_in_gallery),
        image_name: Set(entry.image_name),
        ..Default::default()
    };
    Entity::insert(active)
        .on_conflict(
            OnConflict::column(Column::Email)
                .update_columns([
                    Column::Consent,
                    Column::ConsentText,
                    Column::CreatedAt,
                    Column::IpAddress,
                    Column::Role,
                    Column::Style,
                    Column::FavoritePlayer,
                    Column::ShowInGallery,
                    Column::ImageName,
                ])
                .to_owned(),
        )
        .exec_without_returning(&db_txn)
        .await?;
    db_txn.commit().await?;

    let outcome = if existing.is_some() {
        ConsentOutcome::Replaced
    } else {
        ConsentOutcome::Inserted
    };
    info!("Subscriber {email} saved ({outcome:?})");
    Ok(outcome)
}

/// All subscribers, oldest first.
pub async fn all(db: &DatabaseConnection) -> Result<Vec<Model>, RosterError> {
    Ok(Entity::find()
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}

/// Newest gallery opt-ins that have an image, at most `limit`.
pub async fn gallery(db: &DatabaseConnection, limit: u64) -> Result<Vec<Model>, RosterError> {
    Ok(Entity::find()
        .filter(Column::ShowInGallery.eq(true))
        .filter(Column::ImageName.is_not_null())
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .limit(limit)
        .all(db)
        .await?)
}

/// Subscriber counts grouped by `column`, null values skipped.
pub async fn count_by(
    db: &DatabaseConnection,
    column: Column,
) -> Result<BTreeMap<String, i64>, RosterError> {
    let query = Query::select()
        .from(Entity)
        .expr_as(Expr::col(column), Alias::new("value"))
        .expr_as(Expr::col(Column::Id).count(), Alias::new("total"))
        .and_where(Expr::col(column).is_not_null())
        .group_by_col(column)
        .to_owned();
    let stmt = StatementBuilder::build(&query, &db.get_database_backend());
    let rows = db.query_all(stmt).await?;

    let mut counts = BTreeMap::new();
    for row in rows {
        let value: String = row.try_get("", "value")?;
        let total: i64 = row.try_get("", "total")?;
        counts.insert(value, total);
    }
    Ok(counts)
}

/// Subscriber counts by UTC hour of their latest submission, keyed `00`..`23`.
pub async fn count_by_hour(db: &DatabaseConnection) -> Result<BTreeMap<String, i64>, RosterError> {
    let created: Vec<DateTimeUtc> = Entity::find()
        .select_only()
        .column(Column::CreatedAt)
        .into_tuple()
        .all(db)
        .await?;

    let mut counts = BTreeMap::new();
    for timestamp in created {
        *counts
            .entry(format!("{:02}", timestamp.hour()))
            .or_insert(0) += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::MigratorTrait;

    async fn setup_db() -> DatabaseConnection {
        let db = crate::db::connect_test_db().await.expect("connect test db");
        crate::db::migrations::Migrator::up(&db, None)
            .await
            .expect("run migrations");
        db
    }

    fn entry(email: &str, consent: bool) -> SubscriberEntry {
        SubscriberEntry {
            email: email.to_string(),
            consent,
            ip_address: "203.0.113.7".to_string(),
            role: "Mid".to_string(),
            style: "Painted Hype".to_string(),
            favorite_player: Some("Zven".to_string()),
            show_in_gallery: false,
            image_name: Some("roster_1.png".to_string()),
        }
    }

    #[test]
    fn email_normalization() {
        assert_eq!(
            normalize_email("  Fan@Example.ORG ").expect("valid"),
            "fan@example.org"
        );
        assert!(normalize_email("fan").is_err());
        assert!(normalize_email("@example.org").is_err());
        assert!(normalize_email("fan@").is_err());
    }

    #[test]
    fn receipts() {
        assert_eq!(
            ConsentOutcome::NoConsent.receipt(),
            ConsentReceipt {
                saved: false,
                reason: Some("no_consent")
            }
        );
        assert!(ConsentOutcome::Inserted.receipt().saved);
        assert!(ConsentOutcome::Replaced.receipt().saved);
    }

    #[tokio::test]
    async fn second_submission_replaces_first() {
        let db = setup_db().await;

        let first = upsert(&db, entry("fan@example.org", true)).await.expect("first");
        assert_eq!(first, ConsentOutcome::Inserted);

        let mut second = entry("FAN@example.org", true);
        second.role = "Support".to_string();
        second.style = "Hype Match Day".to_string();
        second.favorite_player = None;
        second.show_in_gallery = true;
        second.image_name = Some("roster_2.png".to_string());
        let outcome = upsert(&db, second).await.expect("second");
        assert_eq!(outcome, ConsentOutcome::Replaced);

        let rows = all(&db).await.expect("rows");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.email, "fan@example.org");
        assert_eq!(row.role, "Support");
        assert_eq!(row.style, "Hype Match Day");
        assert_eq!(row.favorite_player, None);
        assert!(row.show_in_gallery);
        assert_eq!(row.image_name.as_deref(), Some("roster_2.png"));
        assert_eq!(row.consent_text, CONSENT_TEXT);
    }

    #[tokio::test]
    async fn no_consent_never_writes() {
        let db = setup_db().await;
        upsert(&db, entry("fan@example.org", true)).await.expect("seed");

        let mut withdrawn = entry("fan@example.org", false);
        withdrawn.role = "Top".to_string();
        let outcome = upsert(&db, withdrawn).await.expect("upsert");
        assert_eq!(outcome, ConsentOutcome::NoConsent);

        let outcome = upsert(&db, entry("other@example.org", false))
            .await
            .expect("upsert");
        assert_eq!(outcome, ConsentOutcome::NoConsent);

        let rows = all(&db).await.expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, "Mid");
    }

    #[tokio::test]
    async fn counts_and_gallery() {
        let db = setup_db().await;
        for (email, role, gallery) in [
            ("a@example.org", "Mid", true),
            ("b@example.org", "Mid", false),
            ("c@example.org", "ADC", true),
        ] {
            let mut e = entry(email, true);
            e.role = role.to_string();
            e.show_in_gallery = gallery;
            upsert(&db, e).await.expect("upsert");
        }
        let mut no_image = entry("d@example.org", true);
        no_image.show_in_gallery = true;
        no_image.image_name = None;
        no_image.favorite_player = None;
        upsert(&db, no_image).await.expect("upsert");

        let roles = count_by(&db, Column::Role).await.expect("roles");
        assert_eq!(roles.get("Mid"), Some(&3));
        assert_eq!(roles.get("ADC"), Some(&1));

        let players = count_by(&db, Column::FavoritePlayer).await.expect("players");
        assert_eq!(players.get("Zven"), Some(&3));
        assert_eq!(players.len(), 1);

        let hours = count_by_hour(&db).await.expect("hours");
        assert_eq!(hours.values().sum::<i64>(), 4);
        assert!(hours.keys().all(|hour| hour.len() == 2));

        let shown = gallery(&db, 50).await.expect("gallery");
        let emails: Vec<&str> = shown.iter().map(|row| row.email.as_str()).collect();
        assert_eq!(emails, vec!["c@example.org", "a@example.org"]);

        let capped = gallery(&db, 1).await.expect("gallery");
        assert_eq!(capped.len(), 1);
    }
}
