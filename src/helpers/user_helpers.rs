use surrealdb::{engine::any::Any, Surreal};

use crate::{
    config::LedgerConfig,
    helpers::thing_helpers::{create_user_thing, parse_id_part},
    models::user::UserRecord,
    Result,
};

/// Identity collaborator lookup: the account with its status flag.
pub async fn get_user(db: &Surreal<Any>, user_id: &str) -> Result<Option<UserRecord>> {
    let mut response = db
        .query("SELECT id, username, status FROM $user")
        .bind(("user", create_user_thing(user_id)))
        .await?;
    let user: Option<UserRecord> = response.take(0)?;
    Ok(user)
}

/// The configured administrator is the only admin identity.
pub fn is_admin(config: &LedgerConfig, user_id: &str) -> bool {
    parse_id_part(user_id.trim()) == config.admin_user_id
}
