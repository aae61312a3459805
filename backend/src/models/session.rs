use sqlx::FromRow;

/// Session joined with its user, as stored.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub user_id: String,
    pub school_id: String,
    pub role: String,
    pub name: String,
    pub expires_at: String,
}
