//! Typed templates.
//!
//! A struct per email template instead of hand-built parameter maps, so a
//! template id typo or a missing field is a compile error.
//!
//! ```ignore
//! #[derive(Serialize)]
//! struct ShipmentNotice {
//!     to: String,
//!     order_id: String,
//!     tracking_url: String,
//! }
//!
//! impl EmailTemplate for ShipmentNotice {
//!     const TEMPLATE_ID: &'static str = "order.shipped.v1";
//! }
//!
//! queue.enqueue_template(&notice, Priority::High)?;
//! ```

use serde::Serialize;

use crate::domain::Parameters;
use crate::error::PostboxError;

pub trait EmailTemplate: Serialize {
    /// Template / integration id handed to the delivery capability.
    const TEMPLATE_ID: &'static str;

    /// Serialize `self` into a parameter bag. Must produce a JSON object.
    fn to_parameters(&self) -> Result<Parameters, PostboxError> {
        let invalid = |reason: String| PostboxError::InvalidParameters {
            template_id: Self::TEMPLATE_ID.to_string(),
            reason,
        };
        match serde_json::to_value(self).map_err(|e| invalid(e.to_string()))? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(invalid(format!("got {other}"))),
        }
    }
}
