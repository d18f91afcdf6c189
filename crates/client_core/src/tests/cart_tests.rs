use super::*;
use shared::domain::CartItem;
use storage::CartStore;

fn item(uid: &str) -> CartItem {
    CartItem {
        id: format!("row-{uid}"),
        uid: uid.to_string(),
        identifier: format!("X-{uid}"),
        name: format!("cross {uid}"),
        quantity: 1,
    }
}

async fn fresh_store() -> CartStore {
    CartStore::new("sqlite::memory:").await.expect("db")
}

struct TestLabelBackend {
    requests: Mutex<Vec<LabelBatchRequest>>,
}

impl TestLabelBackend {
    fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LabelBackend for TestLabelBackend {
    async fn generate_labels(&self, request: &LabelBatchRequest) -> Result<Vec<u8>> {
        self.requests.lock().await.push(request.clone());
        Ok(b"%PDF-1.4 label sheet".to_vec())
    }
}

#[tokio::test]
async fn adding_same_uid_increments_quantity() {
    let cart = Cart::load(fresh_store().await).await.expect("cart");

    cart.add(item("A")).await.expect("add A");
    cart.add(item("B")).await.expect("add B");
    cart.add(item("A")).await.expect("re-add A");

    let items = cart.items().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].uid, "A");
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[1].uid, "B");
    assert_eq!(items[1].quantity, 1);
}

#[tokio::test]
async fn quantity_edits_clamp_to_form_minimum() {
    let cart = Cart::load(fresh_store().await).await.expect("cart");
    cart.add(item("A")).await.expect("add");

    cart.set_quantity("A", 5).await.expect("raise");
    assert_eq!(cart.items().await[0].quantity, 5);

    cart.set_quantity("A", 0).await.expect("clamp");
    assert_eq!(cart.items().await[0].quantity, 1);
}

#[tokio::test]
async fn mutations_persist_through_the_store() {
    let store = fresh_store().await;
    let cart = Cart::load(store.clone()).await.expect("cart");

    cart.add(item("A")).await.expect("add A");
    cart.add(item("B")).await.expect("add B");
    cart.remove("A").await.expect("remove A");

    let persisted = store.load_cart().await.expect("load");
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].uid, "B");
}

#[tokio::test]
async fn reload_sees_the_same_ordered_sequence() {
    let store = fresh_store().await;
    let cart = Cart::load(store.clone()).await.expect("cart");

    cart.add(item("A")).await.expect("add A");
    cart.add(item("B")).await.expect("add B");
    cart.add(item("A")).await.expect("re-add A");

    let reloaded = Cart::load(store).await.expect("reload");
    assert_eq!(reloaded.items().await, cart.items().await);
}

#[tokio::test]
async fn clear_persists_an_empty_sequence() {
    let store = fresh_store().await;
    let cart = Cart::load(store.clone()).await.expect("cart");

    cart.add(item("A")).await.expect("add");
    cart.clear().await.expect("clear");

    assert!(cart.is_empty().await);
    assert!(store.load_cart().await.expect("load").is_empty());
}

#[tokio::test]
async fn generate_labels_submits_cart_order_and_empties() {
    let cart = Cart::load(fresh_store().await).await.expect("cart");
    cart.add(item("A")).await.expect("add A");
    cart.add(item("A")).await.expect("re-add A");
    cart.add(item("B")).await.expect("add B");

    let backend = TestLabelBackend::new();
    let document = cart.generate_labels(&backend, 4).await.expect("labels");

    assert_eq!(document, b"%PDF-1.4 label sheet");
    let requests = backend.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].unique_ids, vec!["A", "B"]);
    assert_eq!(requests[0].quantities, vec![2, 1]);
    assert_eq!(requests[0].blank_spaces, 4);
    assert!(cart.is_empty().await);
}

#[tokio::test]
async fn generate_labels_on_empty_cart_is_rejected() {
    let cart = Cart::load(fresh_store().await).await.expect("cart");
    let backend = TestLabelBackend::new();

    let result = cart.generate_labels(&backend, 0).await;

    assert!(result.is_err());
    assert!(backend.requests.lock().await.is_empty());
}
