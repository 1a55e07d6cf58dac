//! # Schema Provisioning
//!
//! The mirrored kinds are custom resources, so both clusters need their
//! CustomResourceDefinitions before anything can be synced. At startup each
//! required definition is copied from whichever cluster has it to the one
//! that lacks it, then polled until the API server reports it `Established`.

use crate::constants::{EXCLUDED_ANNOTATIONS, FIELD_MANAGER};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, ObjectMeta, PostParams};
use kube::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("CustomResourceDefinition {0} exists in neither cluster")]
    Missing(String),

    #[error("CustomResourceDefinition {name} not established after {seconds}s")]
    NotEstablished { name: String, seconds: u64 },

    #[error("Kubernetes API request failed: {0}")]
    Kube(#[from] kube::Error),
}

#[derive(Clone)]
pub struct SchemaProvisioner {
    virtual_client: Client,
    physical_client: Client,
    timeout: Duration,
    poll_interval: Duration,
}

impl std::fmt::Debug for SchemaProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaProvisioner")
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl SchemaProvisioner {
    #[must_use]
    pub fn new(
        virtual_client: Client,
        physical_client: Client,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            virtual_client,
            physical_client,
            timeout,
            poll_interval,
        }
    }

    pub async fn ensure_all(&self, names: &[&str]) -> Result<(), SchemaError> {
        for name in names {
            self.ensure(name).await?;
        }
        Ok(())
    }

    /// Make sure `name` exists and is established in both clusters.
    pub async fn ensure(&self, name: &str) -> Result<(), SchemaError> {
        let virtual_api: Api<CustomResourceDefinition> = Api::all(self.virtual_client.clone());
        let physical_api: Api<CustomResourceDefinition> = Api::all(self.physical_client.clone());

        match (
            virtual_api.get_opt(name).await?,
            physical_api.get_opt(name).await?,
        ) {
            (Some(_), Some(_)) => {
                debug!(crd = name, "schema present in both clusters");
                Ok(())
            }
            (Some(source), None) => self.copy(source, &physical_api, "physical").await,
            (None, Some(source)) => self.copy(source, &virtual_api, "virtual").await,
            (None, None) => Err(SchemaError::Missing(name.to_string())),
        }
    }

    async fn copy(
        &self,
        source: CustomResourceDefinition,
        target: &Api<CustomResourceDefinition>,
        cluster: &'static str,
    ) -> Result<(), SchemaError> {
        let crd = prepare_copy(source);
        let name = crd.metadata.name.clone().unwrap_or_default();
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PostParams::default()
        };
        target.create(&params, &crd).await?;
        info!(crd = %name, cluster, "copied schema, waiting for it to be established");
        self.wait_established(target, &name).await
    }

    async fn wait_established(
        &self,
        api: &Api<CustomResourceDefinition>,
        name: &str,
    ) -> Result<(), SchemaError> {
        let poll = async {
            loop {
                if let Some(crd) = api.get_opt(name).await? {
                    if is_established(&crd) {
                        return Ok::<(), SchemaError>(());
                    }
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };
        tokio::time::timeout(self.timeout, poll)
            .await
            .map_err(|_elapsed| SchemaError::NotEstablished {
                name: name.to_string(),
                seconds: self.timeout.as_secs(),
            })?
    }
}

/// Keep name, labels, annotations and spec; drop everything the source
/// API server populated.
#[must_use]
pub fn prepare_copy(source: CustomResourceDefinition) -> CustomResourceDefinition {
    let annotations = source.metadata.annotations.map(|mut annotations| {
        annotations.retain(|key, _| !EXCLUDED_ANNOTATIONS.contains(&key.as_str()));
        annotations
    });
    CustomResourceDefinition {
        metadata: ObjectMeta {
            name: source.metadata.name,
            labels: source.metadata.labels,
            annotations,
            ..ObjectMeta::default()
        },
        spec: source.spec,
        status: None,
    }
}

#[must_use]
pub fn is_established(crd: &CustomResourceDefinition) -> bool {
    crd.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Established" && c.status == "True")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
        CustomResourceDefinitionCondition, CustomResourceDefinitionStatus,
    };
    use std::collections::BTreeMap;

    fn crd(condition: Option<(&str, &str)>) -> CustomResourceDefinition {
        CustomResourceDefinition {
            metadata: ObjectMeta {
                name: Some("certificates.cert-manager.io".to_string()),
                uid: Some("1234".to_string()),
                resource_version: Some("99".to_string()),
                annotations: Some(BTreeMap::from([
                    (
                        "kubectl.kubernetes.io/last-applied-configuration".to_string(),
                        "{}".to_string(),
                    ),
                    ("cert-manager.io/inject-ca-from".to_string(), "x".to_string()),
                ])),
                ..ObjectMeta::default()
            },
            status: condition.map(|(type_, status)| CustomResourceDefinitionStatus {
                conditions: Some(vec![CustomResourceDefinitionCondition {
                    type_: type_.to_string(),
                    status: status.to_string(),
                    ..CustomResourceDefinitionCondition::default()
                }]),
                ..CustomResourceDefinitionStatus::default()
            }),
            ..CustomResourceDefinition::default()
        }
    }

    #[test]
    fn test_prepare_copy_strips_server_fields() {
        let copy = prepare_copy(crd(Some(("Established", "True"))));
        assert!(copy.status.is_none());
        assert!(copy.metadata.uid.is_none());
        assert!(copy.metadata.resource_version.is_none());
        let annotations = copy.metadata.annotations.unwrap();
        assert_eq!(annotations.len(), 1);
        assert!(annotations.contains_key("cert-manager.io/inject-ca-from"));
    }

    #[test]
    fn test_is_established() {
        assert!(is_established(&crd(Some(("Established", "True")))));
        assert!(!is_established(&crd(Some(("Established", "False")))));
        assert!(!is_established(&crd(Some(("NamesAccepted", "True")))));
        assert!(!is_established(&crd(None)));
    }
}
