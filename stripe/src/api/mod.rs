//! Stripe API client module

pub mod billing_portal;
pub mod client;
pub mod common;
pub mod coupon;
pub mod error;
pub mod memory;
pub mod plan;
pub mod price;
pub mod product;
pub mod tax_rate;
pub mod webhook_endpoint;

pub use client::{BillingApi, Client};
pub use common::StripeApiResource;
pub use error::ApiError;
