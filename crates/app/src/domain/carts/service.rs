//! Carts service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            models::{CartItem, CartItemUuid, NewCartItem},
            repository::PgCartItemsRepository,
        },
        catalog::repository::PgCatalogRepository,
    },
    uuids::UserUuid,
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    items_repository: PgCartItemsRepository,
    catalog_repository: PgCatalogRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            items_repository: PgCartItemsRepository::new(),
            catalog_repository: PgCatalogRepository::new(),
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(&self, user: UserUuid) -> Result<Vec<CartItem>, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let items = self.items_repository.get_cart_items(&mut tx, user).await?;

        tx.commit().await?;

        Ok(items)
    }

    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
    ) -> Result<CartItem, CartsServiceError> {
        if item.quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        let product = self
            .catalog_repository
            .get_product(&mut tx, item.product_uuid)
            .await?
            .ok_or(CartsServiceError::ProductNotFound)?;

        // Capture the unit price at add time; the variant's override wins.
        let price = match item.variant_uuid {
            None => product.price,
            Some(variant_uuid) => {
                let variant = self
                    .catalog_repository
                    .get_variant(&mut tx, variant_uuid)
                    .await?
                    .filter(|variant| variant.product_uuid == item.product_uuid)
                    .ok_or(CartsServiceError::VariantNotFound)?;

                variant.price.unwrap_or(product.price)
            }
        };

        let item = self
            .items_repository
            .upsert_cart_item(&mut tx, user, item, price)
            .await?;

        tx.commit().await?;

        Ok(item)
    }

    async fn update_item_quantity(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartItem, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        let updated = self
            .items_repository
            .update_quantity(&mut tx, user, item, quantity)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn remove_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self
            .items_repository
            .delete_cart_item(&mut tx, user, item)
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the user's cart items in insertion order.
    async fn get_cart(&self, user: UserUuid) -> Result<Vec<CartItem>, CartsServiceError>;

    /// Add an item to the cart, accumulating quantity when the same
    /// (product, variant) pair is already carted.
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
    ) -> Result<CartItem, CartsServiceError>;

    /// Replace the quantity of a cart item.
    async fn update_item_quantity(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartItem, CartsServiceError>;

    /// Remove an item from the cart.
    async fn remove_item(&self, user: UserUuid, item: CartItemUuid)
    -> Result<(), CartsServiceError>;
}
