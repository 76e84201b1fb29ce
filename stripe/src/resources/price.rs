//! Prices, including tiered pricing.
//!
//! The API does not return `tiers` unless asked to expand them, so the tier
//! blocks are write-only: the configured tiers stay in state as written.

use std::sync::OnceLock;
use tfmap::validator::{OneOfValidator, Validator};
use tfmap::{
    AttributePath, Constraint, Diagnostics, Dynamic, FieldBuilder, FieldSpec, FieldSpecBuilder,
    FieldType, NestedBlockBuilder, NumberKind, OmitWhen,
};

use super::resource::{ResourceKind, StripeResource};
use super::{created_field, currency_validator, id_field, livemode_field};
use crate::api::price::Price;

pub struct PriceKind;

pub type PriceResource = StripeResource<PriceKind>;

impl ResourceKind for PriceKind {
    const TYPE_NAME: &'static str = "stripe_price";
    const NOUN: &'static str = "price";

    type Object = Price;

    fn spec() -> &'static FieldSpec {
        static SPEC: OnceLock<FieldSpec> = OnceLock::new();
        SPEC.get_or_init(price_spec)
    }

    fn deletable() -> bool {
        false
    }
}

/// Tiers must be bounded in ascending `up_to` order, with only the final
/// tier open ended
struct TierOrderValidator;

impl Validator for TierOrderValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        let Some(tiers) = value.as_list() else {
            return;
        };
        let mut previous: Option<f64> = None;
        for (i, tier) in tiers.iter().enumerate() {
            let Some(tier) = tier.as_map() else {
                continue;
            };
            let tier_path = path.clone().index(i as i64);
            let last = i + 1 == tiers.len();
            let unbounded = tier
                .get("up_to_inf")
                .and_then(Dynamic::as_bool)
                .unwrap_or(false);
            let up_to = tier.get("up_to").and_then(Dynamic::as_number);

            if unbounded {
                if !last {
                    diagnostics.add_attribute_error(
                        &tier_path.child("up_to_inf"),
                        "Only the last tier may be unbounded",
                        format!("tier {} sets up_to_inf but is followed by more tiers", i),
                    );
                }
                continue;
            }
            if last {
                diagnostics.add_attribute_error(
                    &tier_path,
                    "The last tier must be unbounded",
                    "Set up_to_inf = true on the final tier",
                );
            }
            match (up_to, previous) {
                (None, _) if !last => diagnostics.add_attribute_error(
                    &tier_path,
                    "Missing tier bound",
                    "Every tier but the last must set up_to",
                ),
                (Some(bound), Some(prev)) if bound <= prev => diagnostics.add_attribute_error(
                    &tier_path.child("up_to"),
                    "Tiers must be in ascending order",
                    format!("up_to {} does not exceed the previous tier's {}", bound, prev),
                ),
                _ => {}
            }
            if up_to.is_some() {
                previous = up_to;
            }
        }
    }
}

fn price_spec() -> FieldSpec {
    let recurring = vec![
        FieldBuilder::string("aggregate_usage")
            .optional()
            .validator(OneOfValidator::new(&[
                "sum",
                "last_during_period",
                "last_ever",
                "max",
            ]))
            .build(),
        FieldBuilder::string("interval")
            .required()
            .validator(OneOfValidator::new(&["day", "week", "month", "year"]))
            .build(),
        // Configured as a string, sent as an integer
        FieldBuilder::new("interval_count", FieldType::NumericString(NumberKind::Int))
            .optional()
            .build(),
        FieldBuilder::string("usage_type")
            .optional()
            .validator(OneOfValidator::new(&["licensed", "metered"]))
            .build(),
    ];

    let tier = NestedBlockBuilder::list("tier")
        .remote("tiers")
        .description("Pricing tiers, in ascending order of up_to")
        .write_only()
        .force_new()
        .attribute(FieldBuilder::int("up_to").optional().build())
        .attribute(FieldBuilder::bool("up_to_inf").optional().build())
        .attribute(FieldBuilder::int("flat_amount").optional().build())
        .attribute(FieldBuilder::decimal("flat_amount_decimal").optional().build())
        .attribute(FieldBuilder::int("unit_amount").optional().build())
        .attribute(FieldBuilder::decimal("unit_amount_decimal").optional().build())
        .constraint(Constraint::conflicts(&["up_to", "up_to_inf"]))
        .constraint(Constraint::conflicts(&["flat_amount", "flat_amount_decimal"]))
        .constraint(Constraint::conflicts(&["unit_amount", "unit_amount_decimal"]))
        .validator(TierOrderValidator)
        .build();

    FieldSpecBuilder::new()
        .description("How much and how often to charge for a product")
        .attribute(id_field())
        .attribute(
            FieldBuilder::string("price_id")
                .remote("id")
                .computed()
                .build(),
        )
        .attribute(FieldBuilder::bool("active").optional().default(true).build())
        .attribute(
            FieldBuilder::string("billing_scheme")
                .optional()
                .force_new()
                .validator(OneOfValidator::new(&["per_unit", "tiered"]))
                .build(),
        )
        .attribute(
            FieldBuilder::string("currency")
                .required()
                .force_new()
                .validator(currency_validator())
                .build(),
        )
        .attribute(FieldBuilder::metadata("metadata").build())
        .attribute(FieldBuilder::string("nickname").optional().build())
        .attribute(
            FieldBuilder::string("product")
                .required()
                .force_new()
                .build(),
        )
        .attribute(
            FieldBuilder::object("recurring", recurring)
                .optional()
                .force_new()
                .build(),
        )
        .attribute(
            FieldBuilder::string("tiers_mode")
                .optional()
                .force_new()
                .validator(OneOfValidator::new(&["graduated", "volume"]))
                .build(),
        )
        .attribute(FieldBuilder::int("unit_amount").optional().force_new().build())
        .attribute(
            FieldBuilder::decimal("unit_amount_decimal")
                .optional()
                .force_new()
                .description("Unit amount with up to 12 decimal places, as a number")
                .build(),
        )
        .attribute(created_field())
        .attribute(livemode_field())
        .block(tier)
        .constraint(Constraint::conflicts(&["unit_amount", "unit_amount_decimal"]))
        .constraint(Constraint::required_when("tier", "billing_scheme", &["tiered"]))
        .constraint(Constraint::required_when("tiers_mode", "billing_scheme", &["tiered"]))
        .constraint(Constraint::only_when("tier", "billing_scheme", &["tiered"]))
        .constraint(Constraint::only_when("tiers_mode", "billing_scheme", &["tiered"]))
        .omit(OmitWhen::new(
            &["unit_amount", "unit_amount_decimal"],
            "billing_scheme",
            &["tiered"],
        ))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::price::PriceCreateRequest;
    use serde_json::json;
    use tfmap::{expand, DynamicValue};

    fn config(value: serde_json::Value) -> DynamicValue {
        DynamicValue::decode_json(value.to_string().as_bytes()).unwrap()
    }

    fn tiered(tiers: serde_json::Value) -> DynamicValue {
        config(json!({
            "product": "prod_1",
            "currency": "usd",
            "billing_scheme": "tiered",
            "tiers_mode": "graduated",
            "tier": tiers
        }))
    }

    #[test]
    fn tiered_price_builds_a_typed_request() {
        let request: PriceCreateRequest = expand(
            &tiered(json!([
                {"up_to": 10, "unit_amount": 500},
                {"up_to_inf": true, "unit_amount_decimal": 0.0125}
            ])),
            PriceKind::spec(),
        )
        .unwrap()
        .into_typed()
        .unwrap();

        let tiers = request.tiers.unwrap();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].up_to, Some(10));
        assert_eq!(tiers[1].up_to_inf, Some(true));
        assert_eq!(tiers[1].unit_amount_decimal.as_deref(), Some("0.0125"));
    }

    #[test]
    fn recurring_interval_count_is_sent_as_integer() {
        let request: PriceCreateRequest = expand(
            &config(json!({
                "product": "prod_1",
                "currency": "usd",
                "unit_amount": 1000,
                "recurring": {"interval": "month", "interval_count": "3"}
            })),
            PriceKind::spec(),
        )
        .unwrap()
        .into_typed()
        .unwrap();

        let recurring = request.recurring.unwrap();
        assert_eq!(recurring.interval.as_deref(), Some("month"));
        assert_eq!(recurring.interval_count, Some(3));
    }

    #[test]
    fn unbounded_tier_must_come_last() {
        let err = expand(
            &tiered(json!([
                {"up_to_inf": true, "unit_amount": 100},
                {"up_to": 10, "unit_amount": 500}
            ])),
            PriceKind::spec(),
        )
        .unwrap_err();
        let diags = err.diagnostics().unwrap();
        let summaries: Vec<&str> = diags.errors.iter().map(|d| d.summary.as_str()).collect();
        assert!(summaries.contains(&"Only the last tier may be unbounded"));
        assert!(summaries.contains(&"The last tier must be unbounded"));
    }

    #[test]
    fn tiers_must_ascend() {
        let err = expand(
            &tiered(json!([
                {"up_to": 10, "unit_amount": 500},
                {"up_to": 5, "unit_amount": 400},
                {"up_to_inf": true, "unit_amount": 300}
            ])),
            PriceKind::spec(),
        )
        .unwrap_err();
        let diags = err.diagnostics().unwrap();
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(
            diags.errors[0].attribute,
            Some(AttributePath::new("tier").index(1).attribute("up_to"))
        );
    }

    #[test]
    fn tiers_are_rejected_for_per_unit_prices() {
        let err = expand(
            &config(json!({
                "product": "prod_1",
                "currency": "usd",
                "billing_scheme": "per_unit",
                "unit_amount": 100,
                "tier": [{"up_to_inf": true, "unit_amount": 100}]
            })),
            PriceKind::spec(),
        )
        .unwrap_err();
        let diags = err.diagnostics().unwrap();
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].summary, "Invalid combination of arguments");
    }
}
