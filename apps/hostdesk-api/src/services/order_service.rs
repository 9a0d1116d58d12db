use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Months, Utc};
use hostdesk_db::models::invoice::{Invoice, INVOICE_REFUNDED};
use hostdesk_db::models::order::{
    BillingCycle, Order, PAYMENT_PAID, PAYMENT_PARTIALLY_REFUNDED, PAYMENT_PENDING,
};
use hostdesk_db::repositories::catalog_repo::CatalogRepository;
use hostdesk_db::repositories::invoice_repo::InvoiceRepository;
use hostdesk_db::repositories::order_repo::{NewOrder, NewOrderLine, OrderRepository};
use hostdesk_db::repositories::server_repo::ServerRepository;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::commission_service::CommissionService;
use super::payment::razorpay::RazorpayGateway;
use super::payment::{to_minor_units, PaymentGateway};
use super::pricing::{price_order, PricingInput};
use crate::settings::SettingsService;

const INVOICE_DUE_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Unknown billing cycle")]
    UnknownBillingCycle,
    #[error("Plan not found")]
    PlanNotFound,
    #[error("Plan is not offered on that billing cycle")]
    CycleUnavailable,
    #[error("Addon {0} not found")]
    AddonNotFound(i64),
    #[error("Service {0} not found")]
    ServiceNotFound(i64),
    #[error("Order is not awaiting payment")]
    NotPayable,
    #[error("Refund exceeds the refundable balance")]
    RefundTooLarge,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// What the browser needs to open the gateway checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub order_id: i64,
    pub gateway_order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub key_id: String,
}

pub struct OrderService {
    orders: OrderRepository,
    invoices: InvoiceRepository,
    servers: ServerRepository,
    catalog: CatalogRepository,
    commissions: Arc<CommissionService>,
    settings: Arc<SettingsService>,
}

impl OrderService {
    pub fn new(
        orders: OrderRepository,
        invoices: InvoiceRepository,
        servers: ServerRepository,
        catalog: CatalogRepository,
        commissions: Arc<CommissionService>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            orders,
            invoices,
            servers,
            catalog,
            commissions,
            settings,
        }
    }

    /// Adapter built per call from cached settings, so credential changes
    /// made through the admin settings endpoint apply without a restart.
    pub async fn gateway(&self) -> Arc<dyn PaymentGateway> {
        Arc::new(RazorpayGateway::from_settings(&self.settings).await)
    }

    /// Prices the cart and persists the order with its line snapshots and an
    /// unpaid invoice.
    pub async fn create_order(
        &self,
        user_id: i64,
        plan_id: i64,
        billing_cycle: &str,
        addon_ids: &[i64],
        service_ids: &[i64],
    ) -> Result<Order, OrderError> {
        let cycle = BillingCycle::parse(billing_cycle).ok_or(OrderError::UnknownBillingCycle)?;

        let plan = self
            .catalog
            .get_plan_by_id(plan_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(OrderError::PlanNotFound)?;

        let price_row = self
            .catalog
            .get_plan_price(plan.id, cycle.as_str())
            .await?
            .ok_or(OrderError::CycleUnavailable)?;

        let mut addons = Vec::with_capacity(addon_ids.len());
        for id in addon_ids {
            let addon = self
                .catalog
                .get_addon(*id)
                .await?
                .filter(|a| a.is_active)
                .ok_or(OrderError::AddonNotFound(*id))?;
            addons.push(NewOrderLine {
                item_id: addon.id,
                name: addon.name,
                price: addon.price,
            });
        }

        let mut services = Vec::with_capacity(service_ids.len());
        for id in service_ids {
            let service = self
                .catalog
                .get_service(*id)
                .await?
                .filter(|s| s.is_active)
                .ok_or(OrderError::ServiceNotFound(*id))?;
            services.push(NewOrderLine {
                item_id: service.id,
                name: service.name,
                price: service.price,
            });
        }

        let tax_percent = self
            .settings
            .get_decimal("tax_percent", Decimal::ZERO)
            .await;
        let pricing = price_order(&PricingInput {
            plan_price: price_row.price,
            discount_percent: price_row.discount_percent,
            tax_percent,
            addon_prices: addons.iter().map(|l| l.price).collect(),
            service_prices: services.iter().map(|l| l.price).collect(),
        });

        let order = self
            .orders
            .create(
                &NewOrder {
                    user_id,
                    plan_id: plan.id,
                    billing_cycle: cycle.as_str().to_string(),
                    total_amount: pricing.total_amount,
                    discount_amount: pricing.discount_amount,
                    tax_amount: pricing.tax_amount,
                    grand_total: pricing.grand_total,
                },
                &addons,
                &services,
            )
            .await?;

        let due_date = Utc::now() + chrono::Duration::days(INVOICE_DUE_DAYS);
        self.invoices
            .create(
                order.id,
                user_id,
                &invoice_number(order.id),
                order.total_amount - order.discount_amount,
                order.tax_amount,
                order.grand_total,
                due_date,
            )
            .await?;

        info!(order_id = order.id, user_id, "Order created");
        Ok(order)
    }

    /// Registers the order with the gateway and stores the gateway's id.
    pub async fn checkout(&self, order: &Order) -> Result<CheckoutSession, OrderError> {
        if order.payment_status != PAYMENT_PENDING {
            return Err(OrderError::NotPayable);
        }

        let currency = self.settings.get_or_default("currency", "INR").await;
        let amount_minor = to_minor_units(order.grand_total)?;
        let receipt = format!("order_{}", order.id);

        let gateway_order = self
            .gateway()
            .await
            .create_order(amount_minor, &currency, &receipt)
            .await?;

        self.orders
            .set_gateway_order_id(order.id, &gateway_order.gateway_order_id)
            .await?;

        let key_id = self.settings.get_or_default("razorpay_key_id", "").await;
        Ok(CheckoutSession {
            order_id: order.id,
            gateway_order_id: gateway_order.gateway_order_id,
            amount_minor,
            currency,
            key_id,
        })
    }

    /// Marks the order paid, settles its invoice and creates the server
    /// record in one transaction, then records commissions best-effort.
    /// Returns false when the order was not in a payable state, which makes
    /// the verify endpoint and the webhook safely re-entrant.
    pub async fn confirm_paid(&self, order_id: i64) -> Result<bool> {
        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Order {} not found", order_id))?;

        if order.payment_status == PAYMENT_PAID {
            return Ok(false);
        }

        let cycle = BillingCycle::parse(&order.billing_cycle)
            .ok_or_else(|| anyhow::anyhow!("Order {} has invalid billing cycle", order.id))?;
        let starts_at = Utc::now();
        let ends_at = starts_at
            .checked_add_months(Months::new(cycle.months()))
            .ok_or_else(|| anyhow::anyhow!("Service end date out of range"))?;

        let plan = self
            .catalog
            .get_plan_by_id(order.plan_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Order {} references missing plan", order.id))?;

        let mut tx = self.orders.pool().begin().await?;

        if !self
            .orders
            .mark_paid(&mut tx, order.id, starts_at, ends_at)
            .await?
        {
            // Lost the race to another confirmation path.
            return Ok(false);
        }

        self.invoices.mark_paid(&mut tx, order.id).await?;

        let hostname = format!("{}-{}.hostdesk.host", plan.slug, order.id);
        self.servers
            .create(&mut tx, order.id, order.user_id, plan.id, &hostname, ends_at)
            .await?;

        tx.commit().await.context("Failed to commit payment")?;
        info!(order_id = order.id, "Order confirmed paid");

        match self.commissions.record_for_order(&order).await {
            Ok(created) if created > 0 => {
                info!(order_id = order.id, created, "Referral earnings recorded")
            }
            Ok(_) => {}
            Err(err) => warn!(
                order_id = order.id,
                error = %err,
                "Commission creation failed, payment stands"
            ),
        }

        Ok(true)
    }

    pub async fn mark_failed(&self, order_id: i64) -> Result<()> {
        self.orders.mark_failed(order_id).await
    }

    /// Admin refund. `None` means refund whatever is left.
    pub async fn refund(&self, order: &Order, amount: Option<Decimal>) -> Result<(), OrderError> {
        if order.payment_status != PAYMENT_PAID
            && order.payment_status != PAYMENT_PARTIALLY_REFUNDED
        {
            return Err(OrderError::NotPayable);
        }

        let (amount, full) = refund_request(order.grand_total, order.refunded_amount, amount)?;

        let done = self.orders.record_refund(order.id, amount, full).await?;
        if done == 0 {
            // A concurrent refund consumed the balance between our read and
            // the UPDATE; its balance guard refused this one.
            return Err(OrderError::RefundTooLarge);
        }

        if full {
            if let Some(invoice) = self.invoices.get_by_order(order.id).await? {
                self.invoices
                    .set_status(invoice.id, INVOICE_REFUNDED)
                    .await?;
            }
        }

        info!(order_id = order.id, %amount, full, "Refund recorded");
        Ok(())
    }

    pub async fn invoice_for_order(&self, order_id: i64) -> Result<Option<Invoice>> {
        self.invoices.get_by_order(order_id).await
    }
}

/// Invoice numbers are year-month scoped and derived from the order id, so
/// they are unique without a separate sequence.
fn invoice_number(order_id: i64) -> String {
    format!("INV-{}-{:06}", Utc::now().format("%Y%m"), order_id)
}

/// Validates a refund against the remaining balance. `None` refunds whatever
/// is left. Returns the amount and whether it exhausts the order.
fn refund_request(
    grand_total: Decimal,
    refunded_amount: Decimal,
    requested: Option<Decimal>,
) -> Result<(Decimal, bool), OrderError> {
    let remaining = grand_total - refunded_amount;
    let amount = requested.unwrap_or(remaining);
    if amount <= Decimal::ZERO || amount > remaining {
        return Err(OrderError::RefundTooLarge);
    }
    Ok((amount, amount == remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_numbers_embed_period_and_order() {
        let number = invoice_number(42);
        let period = Utc::now().format("%Y%m").to_string();
        assert_eq!(number, format!("INV-{}-000042", period));
    }

    #[test]
    fn invoice_numbers_differ_per_order() {
        assert_ne!(invoice_number(1), invoice_number(2));
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn refund_defaults_to_remaining_balance() {
        let (amount, full) = refund_request(d("500.00"), d("100.00"), None).unwrap();
        assert_eq!(amount, d("400.00"));
        assert!(full);
    }

    #[test]
    fn partial_refund_within_balance_is_not_full() {
        let (amount, full) = refund_request(d("500.00"), d("0"), Some(d("200.00"))).unwrap();
        assert_eq!(amount, d("200.00"));
        assert!(!full);
    }

    #[test]
    fn refund_beyond_remaining_balance_is_rejected() {
        assert!(refund_request(d("500.00"), d("400.00"), Some(d("100.01"))).is_err());
        assert!(refund_request(d("500.00"), d("0"), Some(d("0"))).is_err());
    }

    // Two admins refunding the full balance at once both read the same
    // order; the second acts on stale state and must be refused.
    #[test]
    fn refund_against_exhausted_balance_is_rejected() {
        assert!(refund_request(d("500.00"), d("500.00"), None).is_err());
        assert!(refund_request(d("500.00"), d("500.00"), Some(d("500.00"))).is_err());
    }
}
