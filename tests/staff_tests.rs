use waitline::error::Error;
use waitline::models::{StaffRole, TicketStatus};
use waitline::queue::{Config, get_ticket, init_pool, issue_ticket, set_status};
use waitline::staff::{list_staff, login, register, remove_staff};

fn test_config(tmp: &tempfile::TempDir) -> Config {
    let mut cfg = Config::default();
    cfg.db_path = tmp.path().join("test.db");
    cfg.force_recreate = true;
    cfg
}

#[tokio::test]
async fn register_defaults_to_staff_role() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let s = register(&pool, "Ana", "ana@example.com", "secret", None).await?;
    assert_eq!(s.role, StaffRole::Staff);
    assert_eq!(s.email, "ana@example.com");

    let admin = register(
        &pool,
        "Boss",
        "boss@example.com",
        "secret",
        Some(StaffRole::Admin),
    )
    .await?;
    assert_eq!(admin.role, StaffRole::Admin);
    Ok(())
}

#[tokio::test]
async fn register_validates_input() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let err = register(&pool, "", "ana@example.com", "secret", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = register(&pool, "Ana", "not-an-email", "secret", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = register(&pool, "Ana", "ana@example.com", "", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    register(&pool, "Ana", "ana@example.com", "secret", None).await?;
    let err = register(&pool, "Another Ana", "ana@example.com", "other", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn password_is_stored_as_phc_hash() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let s = register(&pool, "Ana", "ana@example.com", "secret", None).await?;
    assert_ne!(s.password_phc, "secret");
    assert!(s.password_phc.starts_with("$pbkdf2"));

    // the hash never reaches serialized output
    let json = serde_json::to_value(&s)?;
    assert!(json.get("password_phc").is_none());
    assert_eq!(json["email"], "ana@example.com");
    Ok(())
}

#[tokio::test]
async fn login_verifies_credentials() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let s = register(&pool, "Ana", "ana@example.com", "secret", None).await?;

    let logged_in = login(&pool, "ana@example.com", "secret").await?;
    assert_eq!(logged_in.id, s.id);

    let err = login(&pool, "ana@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));

    // unknown email yields the same error as a bad password
    let err = login(&pool, "ghost@example.com", "secret").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
    Ok(())
}

#[tokio::test]
async fn list_returns_newest_first() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let first = register(&pool, "Ana", "ana@example.com", "secret", None).await?;
    let second = register(&pool, "Ben", "ben@example.com", "secret", None).await?;

    let all = list_staff(&pool).await?;
    assert_eq!(
        all.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );
    Ok(())
}

#[tokio::test]
async fn remove_deletes_or_reports_not_found() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let s = register(&pool, "Ana", "ana@example.com", "secret", None).await?;
    remove_staff(&pool, s.id).await?;
    assert!(list_staff(&pool).await?.is_empty());

    let err = remove_staff(&pool, s.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn removing_staff_keeps_served_ticket_history() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let s = register(&pool, "Ana", "ana@example.com", "secret", None).await?;
    let t = issue_ticket(&pool, "Ada").await?;
    set_status(&pool, t.queue_number, TicketStatus::Serving, None).await?;
    set_status(&pool, t.queue_number, TicketStatus::Done, Some(s.id)).await?;

    remove_staff(&pool, s.id).await?;

    // the ticket survives with its staff reference nulled
    let t = get_ticket(&pool, t.queue_number).await?;
    assert_eq!(t.status, TicketStatus::Done);
    assert!(t.served_by.is_none());
    assert!(t.served_at.is_some());
    Ok(())
}
