//! Coupon API types

use super::common::{Metadata, StripeApiResource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub amount_off: Option<i64>,
    #[serde(default)]
    pub created: i64,
    pub currency: Option<String>,
    pub duration: String,
    pub duration_in_months: Option<i64>,
    #[serde(default)]
    pub livemode: bool,
    pub max_redemptions: Option<i64>,
    #[serde(default)]
    pub metadata: Metadata,
    pub name: Option<String>,
    pub percent_off: Option<f64>,
    pub redeem_by: Option<i64>,
    #[serde(default)]
    pub times_redeemed: i64,
    #[serde(default)]
    pub valid: bool,
}

/// Request body for creating coupons
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CouponCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_off: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_months: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_redemptions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_off: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeem_by: Option<i64>,
}

/// Request body for updating coupons; everything else is fixed at creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CouponUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl StripeApiResource for Coupon {
    type CreateRequest = CouponCreateRequest;
    type UpdateRequest = CouponUpdateRequest;

    fn api_path() -> &'static str {
        "/v1/coupons"
    }
}
