use super::*;

fn item(uid: &str, quantity: u32) -> CartItem {
    CartItem {
        id: format!("row-{uid}"),
        uid: uid.to_string(),
        identifier: format!("X-{uid}"),
        name: format!("cross {uid}"),
        quantity,
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let store = CartStore::new("sqlite::memory:").await.expect("db");
    store.health_check().await.expect("health check");
}

#[tokio::test]
async fn missing_cart_key_loads_as_empty() {
    let store = CartStore::new("sqlite::memory:").await.expect("db");
    let items = store.load_cart().await.expect("load");
    assert!(items.is_empty());
}

#[tokio::test]
async fn save_overwrites_the_whole_sequence() {
    let store = CartStore::new("sqlite::memory:").await.expect("db");

    store
        .save_cart(&[item("A", 1), item("B", 2)])
        .await
        .expect("first save");
    store.save_cart(&[item("B", 3)]).await.expect("second save");

    let items = store.load_cart().await.expect("load");
    assert_eq!(items, vec![item("B", 3)]);
}

#[tokio::test]
async fn saved_empty_cart_loads_as_empty() {
    let store = CartStore::new("sqlite::memory:").await.expect("db");

    store.save_cart(&[item("A", 1)]).await.expect("save");
    store.save_cart(&[]).await.expect("clear");

    let items = store.load_cart().await.expect("load");
    assert!(items.is_empty());
}

#[tokio::test]
async fn cart_round_trips_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("station.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let saved = vec![item("A", 2), item("B", 1), item("C", 4)];
    {
        let store = CartStore::new(&database_url).await.expect("db");
        store.save_cart(&saved).await.expect("save");
    }

    let reopened = CartStore::new(&database_url).await.expect("reopen");
    let items = reopened.load_cart().await.expect("load");
    assert_eq!(items, saved);
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("station.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let store = CartStore::new(&database_url).await.expect("db");
    drop(store);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}
