//! Read-only lookups against tables owned by the rest of the platform.

use {crate::domain::error::ReconcileError, sqlx::PgPool};

#[derive(Debug, sqlx::FromRow)]
pub struct BestieRow {
    pub id: String,
    pub name: String,
}

pub async fn find_bestie(
    pool: &PgPool,
    bestie_ref: &str,
) -> Result<Option<BestieRow>, ReconcileError> {
    let row = sqlx::query_as::<_, BestieRow>("SELECT id, name FROM besties WHERE id = $1")
        .bind(bestie_ref)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_profile_email(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<String>, ReconcileError> {
    let email: Option<Option<String>> =
        sqlx::query_scalar("SELECT email FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(email.flatten())
}

#[derive(Debug, sqlx::FromRow)]
pub struct OrgRow {
    pub org_name: String,
    pub org_ein: Option<String>,
}

/// Best-effort: the singleton row may not exist, and receipts tolerate that.
pub async fn find_org(pool: &PgPool) -> Result<Option<OrgRow>, ReconcileError> {
    let row = sqlx::query_as::<_, OrgRow>("SELECT org_name, org_ein FROM org_settings WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
