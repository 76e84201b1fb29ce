use std::sync::OnceLock;
use tfmap::validator::NumberRangeValidator;
use tfmap::{FieldBuilder, FieldSpec, FieldSpecBuilder};

use super::resource::{ResourceKind, StripeResource};
use super::{created_field, id_field, livemode_field};
use crate::api::tax_rate::TaxRate;

pub struct TaxRateKind;

pub type TaxRateResource = StripeResource<TaxRateKind>;

impl ResourceKind for TaxRateKind {
    const TYPE_NAME: &'static str = "stripe_tax_rate";
    const NOUN: &'static str = "tax rate";

    type Object = TaxRate;

    fn spec() -> &'static FieldSpec {
        static SPEC: OnceLock<FieldSpec> = OnceLock::new();
        SPEC.get_or_init(|| {
            FieldSpecBuilder::new()
                .attribute(id_field())
                .attribute(FieldBuilder::bool("active").optional().default(true).build())
                .attribute(FieldBuilder::string("description").optional().build())
                .attribute(
                    FieldBuilder::string("display_name")
                        .required()
                        .description("Short name shown on invoices, e.g. \"VAT\"")
                        .build(),
                )
                .attribute(FieldBuilder::bool("inclusive").required().force_new().build())
                .attribute(FieldBuilder::string("jurisdiction").optional().build())
                .attribute(FieldBuilder::metadata("metadata").build())
                .attribute(
                    FieldBuilder::float("percentage")
                        .required()
                        .force_new()
                        .validator(NumberRangeValidator {
                            min: Some(0.0),
                            max: Some(100.0),
                        })
                        .build(),
                )
                .attribute(created_field())
                .attribute(livemode_field())
                .build()
        })
    }

    fn deletable() -> bool {
        false
    }
}
