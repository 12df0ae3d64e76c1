//! Webhook endpoint targets shared by conversion and validation policies

/// Reference to an in-cluster Service serving a webhook
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceRef {
    /// Service namespace
    pub namespace: String,
    /// Service name
    pub name: String,
    /// URL path requests are sent to
    pub path: Option<String>,
    /// Service port (the cluster defaults to 443)
    pub port: Option<i32>,
}

impl ServiceRef {
    /// Reference a service by namespace and name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            path: None,
            port: None,
        }
    }

    /// Set the request path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the service port
    pub fn with_port(mut self, port: i32) -> Self {
        self.port = Some(port);
        self
    }
}

/// Where the cluster sends webhook requests
///
/// Exactly one of `url` or `service` should be set. When both are set the URL
/// wins; when neither is, the compiled object has no client target and the
/// cluster rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WebhookTarget {
    /// Inline URL
    pub url: Option<String>,
    /// In-cluster service
    pub service: Option<ServiceRef>,
    /// Path overriding the service reference's own path
    pub path: Option<String>,
    /// PEM CA bundle used to verify the webhook's serving certificate
    pub ca_bundle: Option<Vec<u8>>,
}

impl WebhookTarget {
    /// The URL, if one is configured
    pub fn resolved_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    /// The service reference with the path override applied
    ///
    /// Returns `None` when an inline URL takes precedence.
    pub fn resolved_service(&self) -> Option<ServiceRef> {
        if self.resolved_url().is_some() {
            return None;
        }

        self.service.clone().map(|mut svc| {
            if let Some(path) = self.path.as_ref().filter(|p| !p.is_empty()) {
                svc.path = Some(path.clone());
            }
            svc
        })
    }

    /// Whether any endpoint is configured
    pub fn is_set(&self) -> bool {
        self.resolved_url().is_some() || self.service.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_override_applies_to_service() {
        let target = WebhookTarget {
            service: Some(ServiceRef::new("default", "svc").with_path("/old")),
            path: Some("/convert".to_string()),
            ..Default::default()
        };

        let svc = target.resolved_service().unwrap();
        assert_eq!(svc.path.as_deref(), Some("/convert"));
        assert_eq!(svc.name, "svc");
    }

    #[test]
    fn test_service_path_kept_without_override() {
        let target = WebhookTarget {
            service: Some(ServiceRef::new("default", "svc").with_path("/validate")),
            ..Default::default()
        };

        assert_eq!(
            target.resolved_service().unwrap().path.as_deref(),
            Some("/validate")
        );
    }

    #[test]
    fn test_url_wins_over_service() {
        let target = WebhookTarget {
            url: Some("https://hooks.example.org/convert".to_string()),
            service: Some(ServiceRef::new("default", "svc")),
            ..Default::default()
        };

        assert_eq!(
            target.resolved_url(),
            Some("https://hooks.example.org/convert")
        );
        assert!(target.resolved_service().is_none());
    }

    #[test]
    fn test_empty_target() {
        let target = WebhookTarget::default();
        assert!(!target.is_set());
        assert!(target.resolved_url().is_none());
        assert!(target.resolved_service().is_none());
    }
}
