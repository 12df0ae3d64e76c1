//! Readiness of an installed definition

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

const ESTABLISHED: &str = "Established";
const NAMES_ACCEPTED: &str = "NamesAccepted";

/// What the cluster reports about a definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionState {
    /// Instances can be created
    Established,
    /// The names collide with another definition
    NameConflict { reason: String },
    /// Anything else; keep waiting
    Pending,
}

impl DefinitionState {
    /// Classify a definition from its status conditions
    ///
    /// `Established=True` wins over everything else, `NamesAccepted=False` is
    /// a conflict, and any other combination is still pending.
    pub fn of(crd: &CustomResourceDefinition) -> Self {
        let conditions = crd
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_deref())
            .unwrap_or_default();

        if conditions
            .iter()
            .any(|c| c.type_ == ESTABLISHED && c.status == "True")
        {
            return Self::Established;
        }

        conditions
            .iter()
            .find(|c| c.type_ == NAMES_ACCEPTED && c.status == "False")
            .map(|c| Self::NameConflict {
                reason: c
                    .reason
                    .clone()
                    .filter(|r| !r.is_empty())
                    .or_else(|| c.message.clone())
                    .unwrap_or_else(|| "names not accepted".to_string()),
            })
            .unwrap_or(Self::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
        CustomResourceDefinitionCondition, CustomResourceDefinitionStatus,
    };

    fn with_conditions(conditions: &[(&str, &str, &str)]) -> CustomResourceDefinition {
        CustomResourceDefinition {
            status: Some(CustomResourceDefinitionStatus {
                conditions: Some(
                    conditions
                        .iter()
                        .map(|(type_, status, reason)| CustomResourceDefinitionCondition {
                            type_: type_.to_string(),
                            status: status.to_string(),
                            reason: Some(reason.to_string()),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_established() {
        let crd = with_conditions(&[
            ("NamesAccepted", "True", "NoConflicts"),
            ("Established", "True", "InitialNamesAccepted"),
        ]);
        assert_eq!(DefinitionState::of(&crd), DefinitionState::Established);
    }

    #[test]
    fn test_name_conflict_carries_reason() {
        let crd = with_conditions(&[
            ("NamesAccepted", "False", "AlreadyInUse"),
            ("Established", "False", "NotAccepted"),
        ]);
        assert_eq!(
            DefinitionState::of(&crd),
            DefinitionState::NameConflict {
                reason: "AlreadyInUse".to_string()
            }
        );
    }

    #[test]
    fn test_pending() {
        let crd = with_conditions(&[
            ("NamesAccepted", "True", "NoConflicts"),
            ("Established", "False", "Installing"),
        ]);
        assert_eq!(DefinitionState::of(&crd), DefinitionState::Pending);
    }

    #[test]
    fn test_no_status() {
        assert_eq!(
            DefinitionState::of(&CustomResourceDefinition::default()),
            DefinitionState::Pending
        );
    }
}
