mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{client, todo_fixture};
use stash_cache::{MUTATION_FAILED, NotificationKind, QueryStatus};
use stash_core::StashError;
use stash_core::model::{CreateTodoRequest, UpdateTodoRequest};
use stash_resources::{MemoryTodoStore, TodoMutations, TodoQueries, TodoUpdate};
use stash_resources::todos::{TOGGLE_FAILED, TOGGLE_FAILED_DETAIL};

// ========== create ==========

#[tokio::test]
async fn create_todo_refreshes_observed_list_and_notifies() {
    let (client, notifier) = client();
    let (store, queries, mutations) = todo_fixture(5);

    let mut observer = client.subscribe(&queries.page(1));
    let before = observer.settled().await;
    assert_eq!(before.data.unwrap().todos.len(), 5);

    let created = client
        .mutate(&mutations.create(), CreateTodoRequest::new("Buy milk", 1))
        .await
        .unwrap();

    let after = observer.settled().await;
    assert_eq!(after.status, QueryStatus::Fresh);
    let page = after.data.unwrap();
    assert!(page.contains(created.id));
    assert_eq!(page.total, 6);
    assert_eq!(store.calls("list"), 2);

    let received = notifier.notifications();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].kind, NotificationKind::Success);
    assert_eq!(received[0].title, "Todo created");
    assert_eq!(received[0].detail.as_deref(), Some("Buy milk"));
}

#[tokio::test]
async fn create_stales_unobserved_pages_until_next_read() {
    let (client, _) = client();
    let (store, queries, mutations) = todo_fixture(35);

    client.fetch_query(&queries.page(1)).await.unwrap();
    client.fetch_query(&queries.page(2)).await.unwrap();

    client
        .mutate(&mutations.create(), CreateTodoRequest::new("Walk the dog", 2))
        .await
        .unwrap();

    assert_eq!(client.query_status(queries.page(1).key()), QueryStatus::Stale);
    assert_eq!(client.query_status(queries.page(2).key()), QueryStatus::Stale);
    assert_eq!(store.calls("list"), 2);

    let second = client.fetch_query(&queries.page(2)).await.unwrap();
    assert_eq!(second.total, 36);
    assert!(second.contains(36));
    assert_eq!(store.calls("list"), 3);
}

#[tokio::test]
async fn invalid_create_never_reaches_the_transport() {
    let (client, notifier) = client();
    let (store, _, mutations) = todo_fixture(1);

    let err = client
        .mutate(&mutations.create(), CreateTodoRequest::new("   ", 1))
        .await
        .unwrap_err();

    assert!(err.is_validation_error());
    assert_eq!(store.calls("create"), 0);
    assert_eq!(notifier.count_of(NotificationKind::Error), 1);
    assert_eq!(notifier.notifications()[0].title, MUTATION_FAILED);
}

// ========== update / delete ==========

#[tokio::test]
async fn update_writes_returned_todo_into_detail_entry() {
    let (client, notifier) = client();
    let (_, queries, mutations) = todo_fixture(3);
    client.fetch_query(&queries.by_id(2)).await.unwrap();

    let update = TodoUpdate {
        id: 2,
        changes: UpdateTodoRequest {
            todo: Some("Renamed".to_string()),
            ..UpdateTodoRequest::default()
        },
    };
    client.mutate(&mutations.update(), update).await.unwrap();

    let detail = client
        .get_query_data::<stash_core::model::Todo>(queries.by_id(2).key())
        .unwrap();
    assert_eq!(detail.todo, "Renamed");
    assert_eq!(notifier.notifications()[0].title, "Todo updated");
}

#[tokio::test]
async fn delete_drops_detail_entry() {
    let (client, notifier) = client();
    let (store, queries, mutations) = todo_fixture(3);
    client.fetch_query(&queries.by_id(3)).await.unwrap();
    client.fetch_query(&queries.page(1)).await.unwrap();

    let deleted = client.mutate(&mutations.delete(), 3).await.unwrap();

    assert!(deleted.is_deleted);
    assert_eq!(client.query_status(queries.by_id(3).key()), QueryStatus::Absent);
    assert_eq!(client.query_status(queries.page(1).key()), QueryStatus::Stale);
    assert_eq!(store.todos().len(), 2);
    assert_eq!(notifier.notifications()[0].title, "Todo deleted");
}

// ========== toggle ==========

#[tokio::test]
async fn toggle_updates_every_cached_copy() {
    let (client, notifier) = client();
    let (store, queries, mutations) = todo_fixture(5);
    client.fetch_query(&queries.page(1)).await.unwrap();
    client.fetch_query(&queries.by_user(4)).await.unwrap();

    let toggled = mutations.toggle_complete(&client, 4).await.unwrap();

    assert!(toggled.completed);
    for key in [queries.page(1).key().clone(), queries.by_user(4).key().clone()] {
        let page = client
            .get_query_data::<stash_core::model::TodosResponse>(&key)
            .unwrap();
        assert!(page.find(4).unwrap().completed);
    }
    assert!(store.todos()[3].completed);
    assert_eq!(notifier.count_of(NotificationKind::Error), 0);
}

#[tokio::test]
async fn failed_toggle_rolls_back_with_one_notification() {
    let (client, notifier) = client();
    let (store, queries, mutations) = todo_fixture(5);
    client.fetch_query(&queries.page(1)).await.unwrap();
    client.fetch_query(&queries.by_id(4)).await.unwrap();
    store.fail_next(StashError::http_status("todos", 400, "Bad Request"));

    let err = mutations.toggle_complete(&client, 4).await.unwrap_err();

    assert!(err.is_transport_error());
    let page = client
        .get_query_data::<stash_core::model::TodosResponse>(queries.page(1).key())
        .unwrap();
    assert!(!page.find(4).unwrap().completed);
    let detail = client
        .get_query_data::<stash_core::model::Todo>(queries.by_id(4).key())
        .unwrap();
    assert!(!detail.completed);
    assert_eq!(client.query_status(queries.page(1).key()), QueryStatus::Fresh);

    let received = notifier.notifications();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].kind, NotificationKind::Error);
    assert_eq!(received[0].title, TOGGLE_FAILED);
    assert_eq!(received[0].detail.as_deref(), Some(TOGGLE_FAILED_DETAIL));
}

#[tokio::test]
async fn toggle_retries_a_transient_failure_once() {
    let (client, notifier) = client();
    let (store, queries, mutations) = todo_fixture(5);
    client.fetch_query(&queries.page(1)).await.unwrap();
    store.fail_next(StashError::http_status("todos", 503, "Service Unavailable"));
    store.fail_next(StashError::http_status("todos", 503, "Service Unavailable"));

    mutations.toggle_complete(&client, 4).await.unwrap_err();

    assert_eq!(store.calls("update"), 2);
    assert_eq!(notifier.notifications().len(), 1);
}

#[tokio::test]
async fn overlapping_failed_toggles_restore_the_server_value() {
    let (client, notifier) = client();
    let store = Arc::new(MemoryTodoStore::seeded(3).with_latency(Duration::from_millis(30)));
    let queries = TodoQueries::new(store.clone());
    let mutations = TodoMutations::new(store.clone());
    let before = client.fetch_query(&queries.by_id(1)).await.unwrap();
    assert!(!before.completed);
    store.fail_next(StashError::http_status("todos", 400, "Bad Request"));
    store.fail_next(StashError::http_status("todos", 400, "Bad Request"));

    let (first, second) = tokio::join!(
        mutations.toggle_complete(&client, 1),
        mutations.toggle_complete(&client, 1)
    );

    assert!(first.is_err());
    assert!(second.is_err());
    let cached = client
        .get_query_data::<stash_core::model::Todo>(queries.by_id(1).key())
        .unwrap();
    assert!(Arc::ptr_eq(&cached, &before));
    assert!(!store.todos()[0].completed);
    assert_eq!(notifier.count_of(NotificationKind::Error), 2);
}

#[tokio::test]
async fn toggle_of_uncached_todo_is_rejected() {
    let (client, notifier) = client();
    let (store, _, mutations) = todo_fixture(5);

    let err = mutations.toggle_complete(&client, 4).await.unwrap_err();

    assert!(err.is_not_cached());
    assert_eq!(store.calls("update"), 0);
    assert!(notifier.notifications().is_empty());
}
