//! Conversion policy between versions of a definition

use crate::webhook::{ServiceRef, WebhookTarget};

/// How the cluster converts stored objects between versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionStrategy {
    /// Only `apiVersion` is rewritten
    #[default]
    None,
    /// An external webhook performs the conversion
    Webhook,
}

impl ConversionStrategy {
    /// Wire name of the strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Webhook => "Webhook",
        }
    }
}

/// Conversion settings of a definition
#[derive(Debug, Clone, Default)]
pub struct ConversionPolicy {
    pub(crate) strategy: ConversionStrategy,
    pub(crate) target: WebhookTarget,
    pub(crate) review_versions: Vec<String>,
}

impl ConversionPolicy {
    pub fn strategy_none(&mut self) -> &mut Self {
        self.strategy = ConversionStrategy::None;
        self
    }

    pub fn strategy_webhook(&mut self) -> &mut Self {
        self.strategy = ConversionStrategy::Webhook;
        self
    }

    pub fn url(&mut self, url: impl Into<String>) -> &mut Self {
        self.target.url = Some(url.into());
        self
    }

    pub fn service(&mut self, service: ServiceRef) -> &mut Self {
        self.target.service = Some(service);
        self
    }

    /// Override the service reference's path
    pub fn path(&mut self, path: impl Into<String>) -> &mut Self {
        self.target.path = Some(path.into());
        self
    }

    pub fn ca_bundle(&mut self, bundle: impl Into<Vec<u8>>) -> &mut Self {
        self.target.ca_bundle = Some(bundle.into());
        self
    }

    /// ConversionReview versions the webhook accepts, in preference order
    pub fn review_versions<I, S>(&mut self, versions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.review_versions = versions.into_iter().map(Into::into).collect();
        self
    }

    pub fn strategy(&self) -> ConversionStrategy {
        self.strategy
    }

    pub fn target(&self) -> &WebhookTarget {
        &self.target
    }
}
