use homeauth_config::OwnerBootstrap;
use homeauth_model::User;
use tracing::info;

use crate::state::InMemoryBackends;

/// Create the configured owner unless a login with that username exists.
pub async fn ensure_owner(
    backends: &InMemoryBackends,
    owner: &OwnerBootstrap,
) -> anyhow::Result<()> {
    let existing = backends
        .state
        .provider
        .get_or_create_credentials(&owner.username)
        .await?;
    if !existing.is_new {
        info!(username = %owner.username, "owner already provisioned");
        return Ok(());
    }

    let user = User::owner(owner.username.clone());
    let user_id = backends.store.insert_user(user.clone()).await;
    backends
        .state
        .commands
        .create(Some(&user), user_id, &owner.username, &owner.password)
        .await?;

    info!(user_id = %user_id, username = %owner.username, "owner account created");
    Ok(())
}
