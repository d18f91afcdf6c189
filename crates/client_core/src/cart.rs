//! Label cart: the batch selection used to print label sheets for cross
//! records.

use anyhow::{bail, Result};
use shared::{domain::CartItem, protocol::LabelBatchRequest};
use storage::CartStore;
use tokio::sync::Mutex;

use crate::LabelBackend;

/// Ordered selection of records queued for label printing. Every mutation
/// rewrites the persisted sequence, so a restart sees exactly the items and
/// quantities that were on screen.
pub struct Cart {
    store: CartStore,
    items: Mutex<Vec<CartItem>>,
}

impl Cart {
    /// Load the persisted cart, or start empty when none was saved yet.
    pub async fn load(store: CartStore) -> Result<Self> {
        let items = store.load_cart().await?;
        Ok(Self {
            store,
            items: Mutex::new(items),
        })
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.items.lock().await.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Add an item. A uid already in the cart bumps that row's quantity
    /// instead of inserting a duplicate.
    pub async fn add(&self, item: CartItem) -> Result<()> {
        let mut items = self.items.lock().await;
        match items.iter_mut().find(|existing| existing.uid == item.uid) {
            Some(existing) => existing.quantity += 1,
            None => items.push(item),
        }
        self.store.save_cart(&items).await
    }

    /// Quantity edits clamp to the form minimum of 1.
    pub async fn set_quantity(&self, uid: &str, quantity: u32) -> Result<()> {
        let mut items = self.items.lock().await;
        if let Some(item) = items.iter_mut().find(|item| item.uid == uid) {
            item.quantity = quantity.max(1);
        }
        self.store.save_cart(&items).await
    }

    pub async fn remove(&self, uid: &str) -> Result<()> {
        let mut items = self.items.lock().await;
        items.retain(|item| item.uid != uid);
        self.store.save_cart(&items).await
    }

    /// Empty the cart. Confirmation prompts are the frontend's concern.
    pub async fn clear(&self) -> Result<()> {
        let mut items = self.items.lock().await;
        items.clear();
        self.store.save_cart(&items).await
    }

    /// Submit the whole cart as one label batch, in cart order, and empty it
    /// afterwards. Returns the generated document bytes.
    pub async fn generate_labels(
        &self,
        backend: &dyn LabelBackend,
        blank_spaces: u32,
    ) -> Result<Vec<u8>> {
        let request = {
            let items = self.items.lock().await;
            if items.is_empty() {
                bail!("cart is empty");
            }
            LabelBatchRequest {
                unique_ids: items.iter().map(|item| item.uid.clone()).collect(),
                quantities: items.iter().map(|item| item.quantity).collect(),
                blank_spaces,
            }
        };

        let document = backend.generate_labels(&request).await?;
        self.clear().await?;
        Ok(document)
    }
}
