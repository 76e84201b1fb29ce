use std::sync::OnceLock;
use tfmap::validator::{NumberRangeValidator, OneOfValidator};
use tfmap::{FieldBuilder, FieldSpec, FieldSpecBuilder};

use super::resource::{ResourceKind, StripeResource};
use super::{created_field, currency_validator, id_field, livemode_field};
use crate::api::plan::Plan;

pub struct PlanKind;

pub type PlanResource = StripeResource<PlanKind>;

impl ResourceKind for PlanKind {
    const TYPE_NAME: &'static str = "stripe_plan";
    const NOUN: &'static str = "plan";

    type Object = Plan;

    fn spec() -> &'static FieldSpec {
        static SPEC: OnceLock<FieldSpec> = OnceLock::new();
        SPEC.get_or_init(|| {
            FieldSpecBuilder::new()
                .description("A recurring price for a product (legacy prices API)")
                .attribute(id_field())
                .attribute(
                    FieldBuilder::bool("active")
                        .optional()
                        .default(true)
                        .build(),
                )
                .attribute(
                    FieldBuilder::int("amount")
                        .required()
                        .force_new()
                        .validator(NumberRangeValidator {
                            min: Some(0.0),
                            max: None,
                        })
                        .description("Amount in the smallest currency unit charged per interval")
                        .build(),
                )
                .attribute(
                    FieldBuilder::string("currency")
                        .required()
                        .force_new()
                        .validator(currency_validator())
                        .build(),
                )
                .attribute(
                    FieldBuilder::string("interval")
                        .required()
                        .force_new()
                        .validator(OneOfValidator::new(&["day", "week", "month", "year"]))
                        .build(),
                )
                .attribute(
                    FieldBuilder::int("interval_count")
                        .optional()
                        .force_new()
                        .validator(NumberRangeValidator {
                            min: Some(1.0),
                            max: None,
                        })
                        .build(),
                )
                .attribute(FieldBuilder::metadata("metadata").build())
                .attribute(FieldBuilder::string("nickname").optional().build())
                .attribute(
                    FieldBuilder::string("product")
                        .required()
                        .force_new()
                        .description("Id of the product this plan bills for")
                        .build(),
                )
                .attribute(created_field())
                .attribute(livemode_field())
                .build()
        })
    }
}
