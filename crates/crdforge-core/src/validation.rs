//! Validating admission webhook policies attached to a definition

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

use crate::webhook::{ServiceRef, WebhookTarget};

/// Admission operation a rule matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Connect,
    All,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
            Self::All => "*",
        }
    }
}

/// How requests through other API versions are matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    Exact,
    Equivalent,
}

impl MatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "Exact",
            Self::Equivalent => "Equivalent",
        }
    }
}

/// Side effects the webhook has on the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SideEffectClass {
    #[default]
    None,
    NoneOnDryRun,
}

impl SideEffectClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::NoneOnDryRun => "NoneOnDryRun",
        }
    }
}

/// What happens when the webhook cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    Fail,
    Ignore,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "Fail",
            Self::Ignore => "Ignore",
        }
    }
}

/// Operations × group/version/resource matched by a webhook
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rule {
    pub operations: Vec<Operation>,
    pub api_groups: Vec<String>,
    pub api_versions: Vec<String>,
    pub resources: Vec<String>,
    /// `Cluster`, `Namespaced` or `*`; unset means `*`
    pub scope: Option<String>,
}

impl Rule {
    /// Match `operations` on `resources` of `group/version`
    pub fn new<S: Into<String>>(
        operations: impl IntoIterator<Item = Operation>,
        group: S,
        version: S,
        resources: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            operations: operations.into_iter().collect(),
            api_groups: vec![group.into()],
            api_versions: vec![version.into()],
            resources: resources.into_iter().map(Into::into).collect(),
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// A validating webhook registration attached to a definition
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    pub(crate) name: String,
    pub(crate) target: WebhookTarget,
    pub(crate) match_policy: Option<MatchPolicy>,
    pub(crate) side_effects: SideEffectClass,
    pub(crate) failure_policy: Option<FailurePolicy>,
    pub(crate) timeout_seconds: Option<i32>,
    pub(crate) review_versions: Vec<String>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) namespace_selector: LabelSelector,
    pub(crate) object_selector: LabelSelector,
}

impl ValidationPolicy {
    /// New policy with side effects `None` and selectors matching everything
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: WebhookTarget::default(),
            match_policy: None,
            side_effects: SideEffectClass::None,
            failure_policy: None,
            timeout_seconds: None,
            review_versions: Vec::new(),
            rules: Vec::new(),
            namespace_selector: LabelSelector::default(),
            object_selector: LabelSelector::default(),
        }
    }

    pub fn match_policy_exact(&mut self) -> &mut Self {
        self.match_policy = Some(MatchPolicy::Exact);
        self
    }

    pub fn match_policy_equivalent(&mut self) -> &mut Self {
        self.match_policy = Some(MatchPolicy::Equivalent);
        self
    }

    pub fn side_effects(&mut self, class: SideEffectClass) -> &mut Self {
        self.side_effects = class;
        self
    }

    pub fn failure_policy(&mut self, policy: FailurePolicy) -> &mut Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Per-call timeout; the cluster allows 1 to 30 seconds
    pub fn timeout_seconds(&mut self, seconds: i32) -> &mut Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// AdmissionReview versions the webhook accepts, in preference order
    pub fn review_versions<I, S>(&mut self, versions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.review_versions = versions.into_iter().map(Into::into).collect();
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

    pub fn rule(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&mut self, rules: impl IntoIterator<Item = Rule>) -> &mut Self {
        self.rules.extend(rules);
        self
    }

    pub fn namespace_selector(&mut self, selector: LabelSelector) -> &mut Self {
        self.namespace_selector = selector;
        self
    }

    pub fn object_selector(&mut self, selector: LabelSelector) -> &mut Self {
        self.object_selector = selector;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &WebhookTarget {
        &self.target
    }
}
