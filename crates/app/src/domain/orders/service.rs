//! Orders service.
//!
//! Owns the order lifecycle after checkout has written the order: payment
//! outcomes and fulfilment status changes. Every transition goes through the
//! lifecycle graph first and then a compare-and-set update, so a stale caller
//! gets [`OrdersServiceError::StatusConflict`] instead of clobbering a
//! concurrent change.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use storefront::orders::{OrderStatus, PaymentStatus, transition};
use tracing::info;

use crate::{
    database::Db,
    domain::orders::{
        errors::OrdersServiceError,
        models::{
            NewPayment, Order, OrderItem, OrderUuid, PaymentAttemptStatus, PaymentResult,
            PaymentUuid,
        },
        repository::PgOrdersRepository,
    },
    uuids::UserUuid,
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    repository: PgOrdersRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
        }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<(Order, Vec<OrderItem>), OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let found = self
            .repository
            .get_order_for_user(&mut tx, order, user)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        let items = self.repository.get_order_items(&mut tx, order).await?;

        tx.commit().await?;

        Ok((found, items))
    }

    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self.repository.list_orders_for_user(&mut tx, user).await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn record_payment_result(
        &self,
        order: OrderUuid,
        payment_method: String,
        result: PaymentResult,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self
            .repository
            .get_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        let attempt_status = if result.success {
            PaymentAttemptStatus::Completed
        } else {
            PaymentAttemptStatus::Failed
        };

        // A failed retry never downgrades a settled rollup; the attempt row
        // still records the outcome.
        let payment_status = if result.success {
            PaymentStatus::Paid
        } else {
            match current.payment_status {
                PaymentStatus::Paid | PaymentStatus::Refunded => current.payment_status,
                PaymentStatus::Pending | PaymentStatus::Failed => PaymentStatus::Failed,
            }
        };

        self.repository
            .create_payment(
                &mut tx,
                NewPayment {
                    uuid: PaymentUuid::new(),
                    order_uuid: order,
                    payment_method,
                    payment_provider: result.provider,
                    transaction_id: result.transaction_id,
                    amount: current.totals.total_amount,
                    currency: current.currency.clone(),
                    status: attempt_status,
                    processed_at: Some(Timestamp::now()),
                },
            )
            .await?;

        self.repository
            .set_payment_status(&mut tx, order, payment_status)
            .await?;

        // A successful first payment confirms the order.
        if result.success && current.status == OrderStatus::Pending {
            let confirmed = transition(current.status, OrderStatus::Confirmed)?;

            let rows_affected = self
                .repository
                .update_status(&mut tx, order, current.status, confirmed)
                .await?;

            if rows_affected == 0 {
                return Err(OrdersServiceError::StatusConflict);
            }
        }

        let updated = self
            .repository
            .get_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        tx.commit().await?;

        info!(
            order_number = %updated.order_number,
            payment_status = %payment_status.as_str(),
            "recorded payment result"
        );

        Ok(updated)
    }

    async fn advance_status(
        &self,
        user: UserUuid,
        order: OrderUuid,
        to: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self
            .repository
            .get_order_for_user(&mut tx, order, user)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        let next = transition(current.status, to)?;

        let rows_affected = self
            .repository
            .update_status(&mut tx, order, current.status, next)
            .await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::StatusConflict);
        }

        let updated = self
            .repository
            .get_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        tx.commit().await?;

        info!(
            order_number = %updated.order_number,
            from = %current.status,
            to = %updated.status,
            "advanced order status"
        );

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Retrieve an order and its item snapshots, scoped to the owning user.
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<(Order, Vec<OrderItem>), OrdersServiceError>;

    /// List the user's orders, newest first.
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, OrdersServiceError>;

    /// Record a gateway outcome for the order: writes a payment attempt,
    /// rolls up the order's payment status, and confirms a pending order on
    /// success.
    async fn record_payment_result(
        &self,
        order: OrderUuid,
        payment_method: String,
        result: PaymentResult,
    ) -> Result<Order, OrdersServiceError>;

    /// Move the order along its lifecycle, scoped to the owning user.
    async fn advance_status(
        &self,
        user: UserUuid,
        order: OrderUuid,
        to: OrderStatus,
    ) -> Result<Order, OrdersServiceError>;
}
