//! Marker popup and tooltip content.
//!
//! Two styles are supported: a contact card (name, address, phone, email)
//! and a plain label with the address underneath. Which one a run uses is
//! chosen by [`MarkerStyle`]; the composer only sees [`MarkerContent`].

use std::fmt::Write as _;

use html_escape::encode_text;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Produces the popup and hover tooltip for one marker.
pub trait MarkerContent {
    /// HTML shown when the marker is clicked. `address` is the text that
    /// was geocoded.
    fn popup_html(&self, address: &str) -> String;

    /// Short plain-text hover tooltip.
    fn tooltip(&self, address: &str) -> String;
}

/// Which [`MarkerContent`] implementation a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MarkerStyle {
    /// [`ContactCard`] popups.
    #[strum(serialize = "contact")]
    ContactCard,
    /// [`LabeledAddress`] popups.
    Label,
}

/// Contact details for a marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCard {
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Street address as written in the source data.
    pub address: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Email address.
    pub email: Option<String>,
}

impl ContactCard {
    /// `"First Last"`, or `None` when both parts are blank.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }
}

fn field_or_na(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| "N/A".to_string(), |s| encode_text(s).into_owned())
}

impl MarkerContent for ContactCard {
    fn popup_html(&self, _address: &str) -> String {
        let mut html = String::from(
            "<div style=\"min-width: 300px;\">\
             <h4 style=\"margin-bottom: 10px;\">Contact Information</h4>",
        );
        for (label, value) in [
            ("First Name", &self.first_name),
            ("Last Name", &self.last_name),
            ("Address", &self.address),
            ("Phone", &self.phone),
            ("Email", &self.email),
        ] {
            let _ = write!(
                html,
                "<p><strong>{label}:</strong> {}</p>",
                field_or_na(value.as_deref())
            );
        }
        html.push_str("</div>");
        html
    }

    fn tooltip(&self, address: &str) -> String {
        self.full_name().unwrap_or_else(|| address.to_string())
    }
}

/// A free-text label shown above the address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledAddress {
    /// Label text.
    pub label: String,
}

impl MarkerContent for LabeledAddress {
    fn popup_html(&self, address: &str) -> String {
        format!(
            "<div><strong>{}</strong><br>{}</div>",
            encode_text(self.label.trim()),
            encode_text(address)
        )
    }

    fn tooltip(&self, address: &str) -> String {
        let label = self.label.trim();
        if label.is_empty() {
            address.to_string()
        } else {
            label.to_string()
        }
    }
}

/// Either content style, for runs that pick the style at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum MarkerInfo {
    /// Contact card popup.
    Contact(ContactCard),
    /// Label + address popup.
    Label(LabeledAddress),
}

impl MarkerContent for MarkerInfo {
    fn popup_html(&self, address: &str) -> String {
        match self {
            Self::Contact(card) => card.popup_html(address),
            Self::Label(label) => label.popup_html(address),
        }
    }

    fn tooltip(&self, address: &str) -> String {
        match self {
            Self::Contact(card) => card.tooltip(address),
            Self::Label(label) => label.tooltip(address),
        }
    }
}
