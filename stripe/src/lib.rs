//! Billing resources for a Terraform provider, mapped through tfmap.
//!
//! Each resource kind pairs a `FieldSpec` with typed API request and object
//! structs; `StripeResource` runs create/read/update/delete for all of them.

pub mod api;
pub mod resources;

use resources::ResourceKind;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tfmap::{FieldSpec, ResourceWithImportState};

use resources::{
    coupon::CouponKind, customer_portal::CustomerPortalKind, plan::PlanKind, price::PriceKind,
    product::ProductKind, tax_rate::TaxRateKind, webhook_endpoint::WebhookEndpointKind,
};

#[derive(Default)]
pub struct StripeProvider {
    client: Option<api::Client>,
}

impl StripeProvider {
    pub fn new() -> Self {
        Self { client: None }
    }

    /// Point the provider at a billing API backend
    pub fn configure(&mut self, backend: Arc<dyn api::BillingApi>) {
        tracing::debug!("Configuring provider");
        self.client = Some(api::Client::new(backend));
    }

    pub fn create_resource(&self, name: &str) -> tfmap::Result<Box<dyn ResourceWithImportState>> {
        let client = self
            .client
            .as_ref()
            .ok_or("Provider not configured")?
            .clone();

        match name {
            "stripe_coupon" => Ok(Box::new(resources::CouponResource::new(client))),
            "stripe_customer_portal" => {
                Ok(Box::new(resources::CustomerPortalResource::new(client)))
            }
            "stripe_plan" => Ok(Box::new(resources::PlanResource::new(client))),
            "stripe_price" => Ok(Box::new(resources::PriceResource::new(client))),
            "stripe_product" => Ok(Box::new(resources::ProductResource::new(client))),
            "stripe_tax_rate" => Ok(Box::new(resources::TaxRateResource::new(client))),
            "stripe_webhook_endpoint" => {
                Ok(Box::new(resources::WebhookEndpointResource::new(client)))
            }
            _ => Err(format!("Unknown resource: {}", name).into()),
        }
    }

    /// Field specs keyed by resource type name
    pub fn resource_specs() -> &'static HashMap<&'static str, &'static FieldSpec> {
        static SPECS: OnceLock<HashMap<&'static str, &'static FieldSpec>> = OnceLock::new();

        SPECS.get_or_init(|| {
            let mut specs = HashMap::new();
            specs.insert(CouponKind::TYPE_NAME, CouponKind::spec());
            specs.insert(CustomerPortalKind::TYPE_NAME, CustomerPortalKind::spec());
            specs.insert(PlanKind::TYPE_NAME, PlanKind::spec());
            specs.insert(PriceKind::TYPE_NAME, PriceKind::spec());
            specs.insert(ProductKind::TYPE_NAME, ProductKind::spec());
            specs.insert(TaxRateKind::TYPE_NAME, TaxRateKind::spec());
            specs.insert(WebhookEndpointKind::TYPE_NAME, WebhookEndpointKind::spec());
            specs
        })
    }

    pub fn resource_types() -> Vec<&'static str> {
        let mut types: Vec<&'static str> = Self::resource_specs().keys().copied().collect();
        types.sort_unstable();
        types
    }
}
