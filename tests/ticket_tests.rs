use waitline::error::Error;
use waitline::models::TicketStatus;
use waitline::queue::{
    Config, call_next, get_ticket, init_pool, issue_ticket, list_tickets, purge_done,
    search_tickets, set_status,
};
use waitline::staff::register;

fn test_config(tmp: &tempfile::TempDir) -> Config {
    let mut cfg = Config::default();
    cfg.db_path = tmp.path().join("test.db");
    cfg.force_recreate = true;
    cfg
}

#[tokio::test]
async fn issue_assigns_sequential_numbers() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let t1 = issue_ticket(&pool, "Ada").await?;
    let t2 = issue_ticket(&pool, "Grace").await?;
    let t3 = issue_ticket(&pool, "Edsger").await?;

    assert_eq!(t1.queue_number, 1);
    assert_eq!(t2.queue_number, 2);
    assert_eq!(t3.queue_number, 3);
    assert_eq!(t1.status, TicketStatus::Waiting);
    assert!(t1.created_at > 0);
    assert!(t1.served_by.is_none() && t1.served_at.is_none());
    Ok(())
}

#[tokio::test]
async fn issue_rejects_blank_name() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let err = issue_ticket(&pool, "   ").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn list_orders_by_number_and_filters_by_status() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    issue_ticket(&pool, "Ada").await?;
    issue_ticket(&pool, "Grace").await?;
    issue_ticket(&pool, "Edsger").await?;
    set_status(&pool, 1, TicketStatus::Serving, None).await?;

    let all = list_tickets(&pool, None).await?;
    assert_eq!(
        all.iter().map(|t| t.queue_number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let waiting = list_tickets(&pool, Some(TicketStatus::Waiting)).await?;
    assert_eq!(
        waiting.iter().map(|t| t.queue_number).collect::<Vec<_>>(),
        vec![2, 3]
    );
    let serving = list_tickets(&pool, Some(TicketStatus::Serving)).await?;
    assert_eq!(serving.len(), 1);
    assert_eq!(serving[0].queue_number, 1);
    Ok(())
}

#[tokio::test]
async fn search_matches_case_insensitive_substring() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    issue_ticket(&pool, "Maria Santos").await?;
    issue_ticket(&pool, "Mario Rossi").await?;
    issue_ticket(&pool, "John Doe").await?;

    let hits = search_tickets(&pool, "mari").await?;
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|t| t.name.to_lowercase().contains("mari")));

    assert!(search_tickets(&pool, "nobody").await?.is_empty());
    let err = search_tickets(&pool, "  ").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn status_flow_stamps_serving_staff_and_time() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let clerk = register(&pool, "Clerk", "clerk@example.com", "hunter2", None).await?;
    let t = issue_ticket(&pool, "Ada").await?;

    let serving = set_status(&pool, t.queue_number, TicketStatus::Serving, None).await?;
    assert_eq!(serving.status, TicketStatus::Serving);
    assert!(serving.served_at.is_none());

    let done = set_status(&pool, t.queue_number, TicketStatus::Done, Some(clerk.id)).await?;
    assert_eq!(done.status, TicketStatus::Done);
    assert_eq!(done.served_by, Some(clerk.id));
    assert!(done.served_at.unwrap() >= done.created_at);
    Ok(())
}

#[tokio::test]
async fn illegal_transitions_are_conflicts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let t = issue_ticket(&pool, "Ada").await?;

    // waiting -> done skips the counter
    let err = set_status(&pool, t.queue_number, TicketStatus::Done, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    set_status(&pool, t.queue_number, TicketStatus::Serving, None).await?;
    // serving -> waiting walks backwards
    let err = set_status(&pool, t.queue_number, TicketStatus::Waiting, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    set_status(&pool, t.queue_number, TicketStatus::Done, None).await?;
    // done is terminal
    let err = set_status(&pool, t.queue_number, TicketStatus::Serving, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn unknown_staff_on_transition_is_not_found() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let t = issue_ticket(&pool, "Ada").await?;
    set_status(&pool, t.queue_number, TicketStatus::Serving, None).await?;
    let err = set_status(&pool, t.queue_number, TicketStatus::Done, Some(99))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn only_one_ticket_serving_at_a_time() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    issue_ticket(&pool, "Ada").await?;
    issue_ticket(&pool, "Grace").await?;

    set_status(&pool, 1, TicketStatus::Serving, None).await?;
    let err = set_status(&pool, 2, TicketStatus::Serving, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // finishing the first frees the counter
    set_status(&pool, 1, TicketStatus::Done, None).await?;
    set_status(&pool, 2, TicketStatus::Serving, None).await?;
    Ok(())
}

#[tokio::test]
async fn call_next_promotes_lowest_waiting() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let clerk = register(&pool, "Clerk", "clerk@example.com", "hunter2", None).await?;
    issue_ticket(&pool, "Ada").await?;
    issue_ticket(&pool, "Grace").await?;

    let first = call_next(&pool, Some(clerk.id)).await?.unwrap();
    assert_eq!(first.queue_number, 1);
    assert_eq!(first.status, TicketStatus::Serving);
    assert_eq!(first.served_by, Some(clerk.id));

    // a second call while one is serving trips the invariant
    let err = call_next(&pool, None).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // staff id is kept when the ticket is finished without one
    let done = set_status(&pool, 1, TicketStatus::Done, None).await?;
    assert_eq!(done.served_by, Some(clerk.id));

    let second = call_next(&pool, None).await?.unwrap();
    assert_eq!(second.queue_number, 2);

    set_status(&pool, 2, TicketStatus::Done, None).await?;
    assert!(call_next(&pool, None).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn purge_done_removes_finished_and_resets_numbering() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    issue_ticket(&pool, "Ada").await?;
    issue_ticket(&pool, "Grace").await?;
    set_status(&pool, 1, TicketStatus::Serving, None).await?;
    set_status(&pool, 1, TicketStatus::Done, None).await?;

    assert_eq!(purge_done(&pool).await?, 1);
    assert_eq!(list_tickets(&pool, None).await?.len(), 1);

    // remaining numbers still anchor the counter
    let t = issue_ticket(&pool, "Edsger").await?;
    assert_eq!(t.queue_number, 3);

    set_status(&pool, 2, TicketStatus::Serving, None).await?;
    set_status(&pool, 2, TicketStatus::Done, None).await?;
    set_status(&pool, 3, TicketStatus::Serving, None).await?;
    set_status(&pool, 3, TicketStatus::Done, None).await?;
    assert_eq!(purge_done(&pool).await?, 2);

    // an empty table restarts numbering from 1
    let t = issue_ticket(&pool, "Alan").await?;
    assert_eq!(t.queue_number, 1);
    Ok(())
}

#[tokio::test]
async fn get_ticket_unknown_number_is_not_found() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&dir);
    let pool = init_pool(&cfg).await?;

    let err = get_ticket(&pool, 42).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    Ok(())
}
