mod support;

use std::sync::Arc;

use anyhow::Result;
use homeauth_core::CredentialCommandError;
use homeauth_core::infra::LOCAL_PROVIDER_TYPE;
use homeauth_core::ports::{LocalAuthProvider, UserCredentialStore};
use homeauth_core::sync::{DispatcherSettings, PasswordCipher, SyncDispatcher};
use homeauth_model::User;
use serde_json::json;

use support::{CommandHarness, RecordingSink, RejectingSink};

#[tokio::test]
async fn create_links_credential_to_regular_user() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let user_id = harness.add_user(User::new("Alice")).await;

    harness
        .handler()
        .create(Some(&harness.owner), user_id, "alice", "secret1")
        .await?;

    let user = harness.reload(user_id).await?;
    let credential = user
        .credential_for(LOCAL_PROVIDER_TYPE)
        .expect("local credential linked");
    assert_eq!(credential.username(), "alice");
    assert!(!credential.is_new);
    harness.provider.validate_login("alice", "secret1").await?;
    Ok(())
}

#[tokio::test]
async fn system_generated_users_never_gain_credentials() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let system_id = harness.add_user(User::system("Supervisor")).await;

    for (username, password) in [("svc", "secret1"), ("", ""), ("x", "1")] {
        let err = harness
            .handler()
            .create(Some(&harness.owner), system_id, username, password)
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialCommandError::SystemGenerated));
        assert_eq!(err.code(), "system_generated");
    }

    assert!(harness.store.list_credentials(system_id).await?.is_empty());
    assert!(!harness.provider.is_registered("svc").await);
    Ok(())
}

#[tokio::test]
async fn create_then_delete_leaves_no_local_credential() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let user_id = harness.add_user(User::new("Alice")).await;
    let handler = harness.handler();

    handler
        .create(Some(&harness.owner), user_id, "alice", "pw1234")
        .await?;
    handler.delete(Some(&harness.owner), "alice").await?;

    let user = harness.reload(user_id).await?;
    assert!(user.credential_for(LOCAL_PROVIDER_TYPE).is_none());
    assert!(!harness.provider.is_registered("alice").await);
    let recreated = harness.provider.get_or_create_credentials("alice").await?;
    assert!(recreated.is_new);
    Ok(())
}

#[tokio::test]
async fn short_new_password_is_rejected_without_mutation() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let user_id = harness.add_user(User::new("Bob")).await;
    harness
        .handler()
        .create(Some(&harness.owner), user_id, "bob", "oldpw1")
        .await?;
    let bob = harness.reload(user_id).await?;

    let err = harness
        .handler()
        .change_password(Some(&bob), "oldpw1", "12345")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "invalid_password");
    assert_eq!(err.to_string(), "Password should be at least 6 characters");
    harness.provider.validate_login("bob", "oldpw1").await?;
    Ok(())
}

#[tokio::test]
async fn wrong_current_password_keeps_old_password() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let user_id = harness.add_user(User::new("Bob")).await;
    harness
        .handler()
        .create(Some(&harness.owner), user_id, "bob", "oldpw")
        .await?;
    let bob = harness.reload(user_id).await?;

    let err = harness
        .handler()
        .change_password(Some(&bob), "wrong", "newpw123")
        .await
        .unwrap_err();

    assert!(matches!(err, CredentialCommandError::InvalidCurrentPassword));
    harness.provider.validate_login("bob", "oldpw").await?;
    assert!(harness.provider.validate_login("bob", "newpw123").await.is_err());
    Ok(())
}

#[tokio::test]
async fn self_service_change_syncs_after_update() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let user_id = harness.add_user(User::new("Bob")).await;
    harness
        .handler()
        .create(Some(&harness.owner), user_id, "bob", "oldpw1")
        .await?;
    let bob = harness.reload(user_id).await?;

    let sink = Arc::new(RecordingSink::default());
    let cipher = PasswordCipher::new(&[4u8; 32])?;
    let dispatcher =
        SyncDispatcher::spawn(sink.clone(), cipher.clone(), DispatcherSettings::default());
    let handler = harness.handler().with_sync(dispatcher.queue());

    handler
        .change_password(Some(&bob), "oldpw1", "newpw123")
        .await?;
    harness.provider.validate_login("bob", "newpw123").await?;

    let stats = dispatcher.shutdown().await;
    assert_eq!(stats.delivered, 1);

    let payloads = sink.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].email, "bob");
    assert_eq!(payloads[0].current_password, "oldpw1");
    assert_ne!(payloads[0].new_password, "newpw123");
    assert_eq!(cipher.decrypt(&payloads[0].new_password)?.as_str(), "newpw123");
    Ok(())
}

#[tokio::test]
async fn admin_overrides_require_the_owner() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let admin = User::admin("Admin");
    harness.add_user(admin.clone()).await;
    let target = harness.add_user(User::new("Target")).await;
    harness
        .handler()
        .create(Some(&harness.owner), target, "target", "secret1")
        .await?;
    let handler = harness.handler();

    let err = handler
        .admin_change_password(Some(&admin), target, "hijack1")
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialCommandError::OwnerRequired));
    assert_eq!(err.code(), "unauthorized");

    let err = handler
        .admin_change_username(Some(&admin), target, "hijacked")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "unauthorized");

    harness.provider.validate_login("target", "secret1").await?;
    assert_eq!(
        harness
            .reload(target)
            .await?
            .credential_for(LOCAL_PROVIDER_TYPE)
            .map(|c| c.username().to_owned()),
        Some("target".to_owned())
    );
    Ok(())
}

#[tokio::test]
async fn owner_can_reset_and_rename() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let target = harness.add_user(User::new("Target")).await;
    let handler = harness.handler();
    handler
        .create(Some(&harness.owner), target, "oldname", "secret1")
        .await?;

    handler
        .admin_change_username(Some(&harness.owner), target, "newname")
        .await?;
    handler
        .admin_change_password(Some(&harness.owner), target, "fresh1")
        .await?;

    let user = harness.reload(target).await?;
    assert_eq!(
        user.credential_for(LOCAL_PROVIDER_TYPE).unwrap().username(),
        "newname"
    );
    harness.provider.validate_login("newname", "fresh1").await?;
    assert!(harness.provider.validate_login("oldname", "secret1").await.is_err());
    Ok(())
}

#[tokio::test]
async fn rename_onto_existing_username_is_rejected() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let first = harness.add_user(User::new("First")).await;
    let second = harness.add_user(User::new("Second")).await;
    let handler = harness.handler();
    handler
        .create(Some(&harness.owner), first, "first", "secret1")
        .await?;
    handler
        .create(Some(&harness.owner), second, "second", "secret2")
        .await?;

    let err = handler
        .admin_change_username(Some(&harness.owner), second, "first")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "username_exists");
    harness.provider.validate_login("second", "secret2").await?;
    Ok(())
}

#[tokio::test]
async fn sync_failures_do_not_reach_the_caller() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let user_id = harness.add_user(User::new("Hank")).await;
    harness
        .handler()
        .create(Some(&harness.owner), user_id, "hank", "oldpw1")
        .await?;
    let hank = harness.reload(user_id).await?;

    let dispatcher = SyncDispatcher::spawn(
        Arc::new(RejectingSink),
        PasswordCipher::new(&[5u8; 32])?,
        DispatcherSettings::default(),
    );
    let queue = dispatcher.queue();
    let handler = harness.handler().with_sync(queue.clone());

    handler
        .change_password(Some(&hank), "oldpw1", "newpw1")
        .await?;
    harness.provider.validate_login("hank", "newpw1").await?;

    let stats = dispatcher.shutdown().await;
    assert_eq!(stats.enqueued, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.delivered, 0);

    // The queue is closed now; the change still goes through.
    handler
        .change_password(Some(&hank), "newpw1", "newpw2")
        .await?;
    harness.provider.validate_login("hank", "newpw2").await?;
    Ok(())
}

#[tokio::test]
async fn envelope_dispatch_end_to_end() -> Result<()> {
    let harness = CommandHarness::new().await?;
    let user_id = harness.add_user(User::new("Zed")).await;
    let handler = harness.handler();

    let response = handler
        .dispatch(
            Some(&harness.owner),
            json!({
                "id": 1,
                "type": "auth_provider/local/create",
                "user_id": user_id.to_string(),
                "username": "zed",
                "password": "secret1",
            }),
        )
        .await
        .response();
    assert_eq!(
        serde_json::to_value(&response)?,
        json!({"id": 1, "type": "result", "success": true, "result": null})
    );

    let zed = harness.reload(user_id).await?;
    let response = handler
        .dispatch(
            Some(&zed),
            json!({
                "id": 2,
                "type": "auth_provider/local/admin_change_password",
                "user_id": user_id.to_string(),
                "password": "secret2",
            }),
        )
        .await
        .response();
    assert_eq!(response.error_code(), Some("forbidden"));
    Ok(())
}
