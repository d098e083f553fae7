// Outbound contact: messaging deep-link plus a best-effort tracking request.

use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ContactConfig;
use crate::model::{ContactError, Listing};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContactRequest<'a> {
    property_number: &'a str,
}

pub struct ContactNotifier {
    client: Client,
    config: ContactConfig,
}

impl ContactNotifier {
    pub fn new(config: ContactConfig) -> Result<Self, ContactError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Digits of the listing's own handle, or the system default handle.
    pub fn handle_for(&self, listing: &Listing) -> (String, bool) {
        let own: Option<String> = listing
            .contact_handle
            .as_deref()
            .map(|h| h.chars().filter(char::is_ascii_digit).collect::<String>())
            .filter(|digits| !digits.is_empty());
        match own {
            Some(digits) => (digits, true),
            None => (self.config.default_handle.clone(), false),
        }
    }

    /// Builds the messaging deep-link with a pre-filled inquiry text.
    pub fn deep_link(&self, listing: &Listing) -> Result<Url, ContactError> {
        let (handle, own) = self.handle_for(listing);
        let text = if own {
            format!(
                "مرحباً، أريد الاستفسار عن عقار رقم {} - {}",
                listing.id, listing.title
            )
        } else {
            format!("استفسار عن رقم العقار {}", listing.id)
        };
        let base = self.config.deep_link_base.trim_end_matches('/');
        Url::parse_with_params(&format!("{}/{}", base, handle), &[("text", text)])
            .map_err(|e| ContactError::InvalidLink(e.to_string()))
    }

    /// Records the inquiry with the back office.
    pub async fn track(&self, listing_id: &str) -> Result<(), ContactError> {
        let Some(url) = &self.config.tracking_url else {
            return Ok(());
        };
        let response = self
            .client
            .post(url)
            .json(&ContactRequest {
                property_number: listing_id,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ContactError::Unreachable(response.status().as_u16()));
        }
        Ok(())
    }

    /// Tracks the inquiry, then returns the deep-link. Tracking failures are
    /// logged and never block the link.
    pub async fn contact(&self, listing: &Listing) -> Result<Url, ContactError> {
        match self.track(&listing.id).await {
            Ok(()) => info!("Tracked contact request for {}", listing.id),
            Err(e) => warn!("Contact tracking failed for {}: {}", listing.id, e),
        }
        self.deep_link(listing)
    }
}
