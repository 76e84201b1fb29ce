use std::sync::OnceLock;
use tfmap::validator::{OneOfValidator, StringLengthValidator};
use tfmap::{FieldBuilder, FieldSpec, FieldSpecBuilder, FieldType};

use super::resource::{ResourceKind, StripeResource};
use super::{created_field, id_field, livemode_field};
use crate::api::product::Product;

pub struct ProductKind;

pub type ProductResource = StripeResource<ProductKind>;

impl ResourceKind for ProductKind {
    const TYPE_NAME: &'static str = "stripe_product";
    const NOUN: &'static str = "product";

    type Object = Product;

    fn spec() -> &'static FieldSpec {
        static SPEC: OnceLock<FieldSpec> = OnceLock::new();
        SPEC.get_or_init(product_spec)
    }
}

fn product_spec() -> FieldSpec {
    FieldSpecBuilder::new()
        .description("A good or service offered to customers")
        .attribute(id_field())
        .attribute(FieldBuilder::string("name").required().build())
        .attribute(
            FieldBuilder::string("type")
                .required()
                .force_new()
                .validator(OneOfValidator::new(&["good", "service"]))
                .build(),
        )
        .attribute(FieldBuilder::bool("active").optional().default(true).build())
        .attribute(
            FieldBuilder::set("attributes", FieldType::String)
                .optional()
                .description("Up to five alphanumeric attribute names")
                .build(),
        )
        .attribute(FieldBuilder::metadata("metadata").build())
        .attribute(
            FieldBuilder::string("statement_descriptor")
                .optional()
                .validator(StringLengthValidator {
                    min: None,
                    max: Some(22),
                })
                .description("Text shown on the customer's credit card statement")
                .build(),
        )
        .attribute(
            FieldBuilder::string("unit_label")
                .optional()
                .validator(StringLengthValidator {
                    min: None,
                    max: Some(12),
                })
                .build(),
        )
        .attribute(created_field())
        .attribute(livemode_field())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfmap::{expand, DynamicValue};

    #[test]
    fn long_statement_descriptor_is_rejected() {
        let config = DynamicValue::decode_json(
            br#"{"name": "Gold", "type": "service", "statement_descriptor": "THIS DESCRIPTOR IS TOO LONG"}"#,
        )
        .unwrap();
        let err = expand(&config, ProductKind::spec()).unwrap_err();
        let diags = err.diagnostics().unwrap();
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(
            diags.errors[0].attribute,
            Some(tfmap::AttributePath::new("statement_descriptor"))
        );
    }

    #[test]
    fn type_field_maps_onto_create_request() {
        let config =
            DynamicValue::decode_json(br#"{"name": "Gold", "type": "service"}"#).unwrap();
        let request: crate::api::product::ProductCreateRequest = expand(&config, ProductKind::spec())
            .unwrap()
            .into_typed()
            .unwrap();
        assert_eq!(request.product_type.as_deref(), Some("service"));
        assert_eq!(request.name.as_deref(), Some("Gold"));
    }
}
