//! Create-admin command handler

use crate::config::Config;
use crate::services::AuthError;
use crate::state::SharedState;

pub async fn cmd_create_admin(
    config: Config,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    match state
        .auth_service
        .create_admin(username, email, password)
        .await
    {
        Ok(user) => {
            println!("✓ Admin '{}' created (id {})", user.username, user.id);
            Ok(())
        }
        Err(AuthError::Fields(errors)) => anyhow::bail!("Admin account not created: {errors}"),
        Err(e) => Err(e.into()),
    }
}
