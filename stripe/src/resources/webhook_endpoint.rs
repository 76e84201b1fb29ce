use std::sync::OnceLock;
use tfmap::validator::{ListLengthValidator, StringPatternValidator};
use tfmap::{FieldBuilder, FieldSpec, FieldSpecBuilder, FieldType};

use super::resource::{ResourceKind, StripeResource};
use super::{created_field, id_field, livemode_field};
use crate::api::webhook_endpoint::WebhookEndpoint;

pub struct WebhookEndpointKind;

pub type WebhookEndpointResource = StripeResource<WebhookEndpointKind>;

impl ResourceKind for WebhookEndpointKind {
    const TYPE_NAME: &'static str = "stripe_webhook_endpoint";
    const NOUN: &'static str = "webhook endpoint";

    type Object = WebhookEndpoint;

    fn spec() -> &'static FieldSpec {
        static SPEC: OnceLock<FieldSpec> = OnceLock::new();
        SPEC.get_or_init(webhook_endpoint_spec)
    }
}

fn webhook_endpoint_spec() -> FieldSpec {
    FieldSpecBuilder::new()
        .description("An HTTPS endpoint that receives event notifications")
        .attribute(id_field())
        .attribute(
            FieldBuilder::string("url")
                .required()
                .validator(StringPatternValidator::new("^https?://", "an http(s) URL"))
                .build(),
        )
        .attribute(
            FieldBuilder::list("enabled_events", FieldType::String)
                .required()
                .validator(ListLengthValidator {
                    min: Some(1),
                    max: None,
                })
                .description("Events to deliver, or [\"*\"] for all of them")
                .build(),
        )
        // Only settable at creation and never echoed back
        .attribute(
            FieldBuilder::bool("connect")
                .optional()
                .force_new()
                .write_only()
                .build(),
        )
        .attribute(FieldBuilder::string("description").optional().build())
        .attribute(FieldBuilder::metadata("metadata").build())
        .attribute(
            FieldBuilder::string("secret")
                .computed()
                .sensitive()
                .description("Signing secret, returned only when the endpoint is created")
                .build(),
        )
        .attribute(FieldBuilder::string("status").computed().build())
        .attribute(created_field())
        .attribute(livemode_field())
        .build()
}
