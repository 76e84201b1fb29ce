use std::sync::OnceLock;
use tfmap::validator::{NumberRangeValidator, OneOfValidator, StringLengthValidator};
use tfmap::{Constraint, FieldBuilder, FieldSpec, FieldSpecBuilder};

use super::resource::{ResourceKind, StripeResource};
use super::{created_field, currency_validator, id_field, livemode_field};
use crate::api::coupon::Coupon;

pub struct CouponKind;

pub type CouponResource = StripeResource<CouponKind>;

impl ResourceKind for CouponKind {
    const TYPE_NAME: &'static str = "stripe_coupon";
    const NOUN: &'static str = "coupon";

    type Object = Coupon;

    fn spec() -> &'static FieldSpec {
        static SPEC: OnceLock<FieldSpec> = OnceLock::new();
        SPEC.get_or_init(coupon_spec)
    }
}

fn coupon_spec() -> FieldSpec {
    FieldSpecBuilder::new()
        .description("A discount that can be applied to customers or invoices")
        .attribute(id_field())
        .attribute(
            FieldBuilder::string("code")
                .remote("id")
                .required()
                .force_new()
                .description("Code customers use to redeem the coupon")
                .build(),
        )
        .attribute(
            FieldBuilder::int("amount_off")
                .optional()
                .force_new()
                .validator(NumberRangeValidator {
                    min: Some(1.0),
                    max: None,
                })
                .description("Amount in the smallest currency unit taken off the subtotal")
                .build(),
        )
        .attribute(
            FieldBuilder::string("currency")
                .optional()
                .force_new()
                .validator(currency_validator())
                .description("Currency of amount_off")
                .build(),
        )
        .attribute(
            FieldBuilder::string("duration")
                .required()
                .force_new()
                .validator(OneOfValidator::new(&["forever", "once", "repeating"]))
                .build(),
        )
        .attribute(
            FieldBuilder::int("duration_in_months")
                .optional()
                .force_new()
                .validator(NumberRangeValidator {
                    min: Some(1.0),
                    max: None,
                })
                .description("Number of months the coupon applies for, only with a repeating duration")
                .build(),
        )
        .attribute(
            FieldBuilder::int("max_redemptions")
                .optional()
                .force_new()
                .validator(NumberRangeValidator {
                    min: Some(1.0),
                    max: None,
                })
                .build(),
        )
        .attribute(FieldBuilder::metadata("metadata").build())
        .attribute(
            FieldBuilder::string("name")
                .optional()
                .validator(StringLengthValidator {
                    min: None,
                    max: Some(40),
                })
                .description("Name displayed to customers on invoices and receipts")
                .build(),
        )
        .attribute(
            FieldBuilder::float("percent_off")
                .optional()
                .force_new()
                .validator(NumberRangeValidator {
                    min: Some(0.0),
                    max: Some(100.0),
                })
                .build(),
        )
        .attribute(
            FieldBuilder::timestamp("redeem_by")
                .optional()
                .force_new()
                .description("RFC 3339 time after which the coupon can no longer be redeemed")
                .build(),
        )
        .attribute(FieldBuilder::bool("valid").computed().build())
        .attribute(FieldBuilder::int("times_redeemed").computed().build())
        .attribute(created_field())
        .attribute(livemode_field())
        .constraint(Constraint::exactly_one_of(&["amount_off", "percent_off"]))
        .constraint(Constraint::required_with("amount_off", "currency"))
        .constraint(Constraint::required_when(
            "duration_in_months",
            "duration",
            &["repeating"],
        ))
        .constraint(Constraint::only_when(
            "duration_in_months",
            "duration",
            &["repeating"],
        ))
        .build()
}
