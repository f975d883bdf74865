//! Section kind registry: the single place that knows which payload shape,
//! default content, and schema version each section kind carries.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::migrate;
use super::shapes::*;
use super::ContentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Hero,
    Benefits,
    Services,
    Process,
    Support,
    Contacts,
    Map,
    Payment,
    Delivery,
    Welcome,
    Offerings,
    AboutCompany,
}

impl SectionKind {
    pub const ALL: &'static [SectionKind] = &[
        SectionKind::Hero,
        SectionKind::Benefits,
        SectionKind::Services,
        SectionKind::Process,
        SectionKind::Support,
        SectionKind::Contacts,
        SectionKind::Map,
        SectionKind::Payment,
        SectionKind::Delivery,
        SectionKind::Welcome,
        SectionKind::Offerings,
        SectionKind::AboutCompany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Hero => "hero",
            SectionKind::Benefits => "benefits",
            SectionKind::Services => "services",
            SectionKind::Process => "process",
            SectionKind::Support => "support",
            SectionKind::Contacts => "contacts",
            SectionKind::Map => "map",
            SectionKind::Payment => "payment",
            SectionKind::Delivery => "delivery",
            SectionKind::Welcome => "welcome",
            SectionKind::Offerings => "offerings",
            SectionKind::AboutCompany => "about_company",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ContentError> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ContentError::UnknownKind(s.to_string()))
    }

    /// Schema version newly written payloads carry
    pub fn current_version(&self) -> i32 {
        match self {
            SectionKind::Hero => 2,
            SectionKind::Contacts => 2,
            _ => 1,
        }
    }

    /// Default payload for a section created without content
    pub fn default_content(&self) -> Value {
        // Serializing a shape struct cannot fail
        match self {
            SectionKind::Hero => to_value(HeroContent::default()),
            SectionKind::Benefits => to_value(BenefitsContent::default()),
            SectionKind::Services => to_value(ServicesContent::default()),
            SectionKind::Process => to_value(ProcessContent::default()),
            SectionKind::Support => to_value(SupportContent::default()),
            SectionKind::Contacts => to_value(ContactsContent::default()),
            SectionKind::Map => to_value(MapContent::default()),
            SectionKind::Payment => to_value(PaymentContent::default()),
            SectionKind::Delivery => to_value(DeliveryContent::default()),
            SectionKind::Welcome => to_value(WelcomeContent::default()),
            SectionKind::Offerings => to_value(OfferingsContent::default()),
            SectionKind::AboutCompany => to_value(AboutCompanyContent::default()),
        }
    }

    /// Validate a payload against this kind's current shape
    pub fn validate(&self, content: &Value) -> Result<(), ContentError> {
        match self {
            SectionKind::Hero => check::<HeroContent>(self, content),
            SectionKind::Benefits => check::<BenefitsContent>(self, content),
            SectionKind::Services => check::<ServicesContent>(self, content),
            SectionKind::Process => check::<ProcessContent>(self, content),
            SectionKind::Support => check::<SupportContent>(self, content),
            SectionKind::Contacts => check::<ContactsContent>(self, content),
            SectionKind::Map => check::<MapContent>(self, content),
            SectionKind::Payment => check::<PaymentContent>(self, content),
            SectionKind::Delivery => check::<DeliveryContent>(self, content),
            SectionKind::Welcome => check::<WelcomeContent>(self, content),
            SectionKind::Offerings => check::<OfferingsContent>(self, content),
            SectionKind::AboutCompany => check::<AboutCompanyContent>(self, content),
        }
    }

    /// Upgrade a stored payload from `version` to the current schema version.
    /// Returns the (possibly rewritten) payload and the version it now carries.
    pub fn upgrade(&self, version: i32, content: Value) -> Result<(Value, i32), ContentError> {
        migrate::upgrade_to_current(*self, version, content)
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn to_value<T: Serialize>(shape: T) -> Value {
    serde_json::to_value(shape).unwrap_or(Value::Null)
}

fn check<T: DeserializeOwned>(kind: &SectionKind, content: &Value) -> Result<(), ContentError> {
    serde_json::from_value::<T>(content.clone())
        .map(|_| ())
        .map_err(|e| ContentError::InvalidShape {
            kind: kind.as_str().to_string(),
            message: e.to_string(),
        })
}
