//! Resource implementations

pub mod coupon;
pub mod customer_portal;
pub mod plan;
pub mod price;
pub mod product;
pub mod resource;
pub mod tax_rate;
pub mod webhook_endpoint;

pub use coupon::CouponResource;
pub use customer_portal::CustomerPortalResource;
pub use plan::PlanResource;
pub use price::PriceResource;
pub use product::ProductResource;
pub use resource::{ResourceKind, StripeResource};
pub use tax_rate::TaxRateResource;
pub use webhook_endpoint::WebhookEndpointResource;

use tfmap::validator::StringPatternValidator;
use tfmap::{Field, FieldBuilder};

/// Fields every billing object reports
pub(crate) fn id_field() -> Field {
    FieldBuilder::string("id")
        .computed()
        .description("Unique identifier for the object")
        .build()
}

pub(crate) fn created_field() -> Field {
    FieldBuilder::int("created")
        .computed()
        .description("Time at which the object was created, in unix seconds")
        .build()
}

pub(crate) fn livemode_field() -> Field {
    FieldBuilder::bool("livemode")
        .computed()
        .description("Whether the object exists in live mode or test mode")
        .build()
}

pub(crate) fn currency_validator() -> StringPatternValidator {
    StringPatternValidator::new("^[a-z]{3}$", "a lowercase three-letter ISO currency code")
}
