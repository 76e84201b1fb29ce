//! Customer portal configuration.
//!
//! Every feature is a single nested block; changing any part of `features`
//! resends the whole block.

use std::sync::OnceLock;
use tfmap::schema::NestedBlock;
use tfmap::validator::{EachElementValidator, OneOfValidator};
use tfmap::{FieldBuilder, FieldSpec, FieldSpecBuilder, FieldType, NestedBlockBuilder};

use super::resource::{ResourceKind, StripeResource};
use super::{created_field, id_field, livemode_field};
use crate::api::billing_portal::BillingPortalConfiguration;

pub struct CustomerPortalKind;

pub type CustomerPortalResource = StripeResource<CustomerPortalKind>;

impl ResourceKind for CustomerPortalKind {
    const TYPE_NAME: &'static str = "stripe_customer_portal";
    const NOUN: &'static str = "customer portal configuration";

    type Object = BillingPortalConfiguration;

    fn spec() -> &'static FieldSpec {
        static SPEC: OnceLock<FieldSpec> = OnceLock::new();
        SPEC.get_or_init(customer_portal_spec)
    }

    fn deletable() -> bool {
        false
    }
}

fn enabled() -> tfmap::Field {
    FieldBuilder::bool("enabled").required().build()
}

fn toggle(name: &str) -> NestedBlock {
    NestedBlockBuilder::single(name).attribute(enabled()).build()
}

fn enum_list(name: &str, allowed: &[&str]) -> tfmap::Field {
    FieldBuilder::list(name, FieldType::String)
        .optional()
        .validator(EachElementValidator::new(OneOfValidator::new(allowed)))
        .build()
}

fn features() -> NestedBlock {
    let customer_update = NestedBlockBuilder::single("customer_update")
        .attribute(enum_list(
            "allowed_updates",
            &["email", "address", "shipping", "phone", "tax_id"],
        ))
        .attribute(enabled())
        .build();

    let cancellation_reason = NestedBlockBuilder::single("cancellation_reason")
        .attribute(enabled())
        .attribute(enum_list(
            "options",
            &[
                "too_expensive",
                "missing_features",
                "switched_service",
                "unused",
                "customer_service",
                "too_complex",
                "low_quality",
                "other",
            ],
        ))
        .build();

    let subscription_cancel = NestedBlockBuilder::single("subscription_cancel")
        .block(cancellation_reason)
        .attribute(enabled())
        .attribute(
            FieldBuilder::string("mode")
                .optional()
                .validator(OneOfValidator::new(&["immediately", "at_period_end"]))
                .build(),
        )
        .attribute(
            FieldBuilder::string("proration_behavior")
                .optional()
                .validator(OneOfValidator::new(&["none", "create_prorations"]))
                .build(),
        )
        .build();

    let product = NestedBlockBuilder::set("product")
        .remote("products")
        .description("Products and prices a customer can switch between")
        .attribute(FieldBuilder::string("id").remote("product").required().build())
        .attribute(
            FieldBuilder::list("prices", FieldType::String)
                .required()
                .build(),
        )
        .build();

    let subscription_update = NestedBlockBuilder::single("subscription_update")
        .attribute(enum_list(
            "default_allowed_updates",
            &["price", "quantity", "promotion_code"],
        ))
        .attribute(enabled())
        .attribute(
            FieldBuilder::string("proration_behavior")
                .optional()
                .validator(OneOfValidator::new(&[
                    "none",
                    "create_prorations",
                    "always_invoice",
                ]))
                .build(),
        )
        .block(product)
        .build();

    NestedBlockBuilder::single("features")
        .required()
        .block(customer_update)
        .block(toggle("invoice_history"))
        .block(toggle("payment_method_update"))
        .block(subscription_cancel)
        .block(toggle("subscription_pause"))
        .block(subscription_update)
        .build()
}

fn customer_portal_spec() -> FieldSpec {
    let business_profile = NestedBlockBuilder::single("business_profile")
        .required()
        .attribute(FieldBuilder::string("headline").optional().build())
        .attribute(FieldBuilder::string("privacy_policy_url").required().build())
        .attribute(FieldBuilder::string("terms_of_service_url").required().build())
        .build();

    FieldSpecBuilder::new()
        .description("Configuration of the hosted customer billing portal")
        .attribute(id_field())
        .attribute(FieldBuilder::string("default_return_url").optional().build())
        .attribute(FieldBuilder::metadata("metadata").build())
        .attribute(FieldBuilder::bool("active").computed().build())
        .attribute(FieldBuilder::bool("is_default").computed().build())
        .attribute(
            FieldBuilder::int("updated")
                .computed()
                .description("Time of the last update, in unix seconds")
                .build(),
        )
        .attribute(created_field())
        .attribute(livemode_field())
        .block(business_profile)
        .block(features())
        .build()
}
