//! # Convergence
//!
//! Builds the desired Secret for a VaultSecret and merges it into whatever
//! exists in the cluster.
//!
//! Merge rules:
//! - labels: controller labels, then user labels, then filter labels; user
//!   labels override controller labels but never the filter labels, written
//!   over the labels already present
//! - data: resolved values overlaid on existing data, stale keys are kept
//! - annotations: replaced wholesale
//! - type: immutable once set; a differing type is changed on its own first
//!   and the data follows on the next pass
//! - owner reference: the VaultSecret is the controller owner

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use kube::{Resource, ResourceExt};
use tracing::debug;

use crate::constants::{LAST_UPDATE_TIME_FORMAT, OPERATOR_APP_NAME};
use crate::controller::backoff::{retry_on_conflict, ExponentialBackoff};
use crate::controller::filter::LabelFilter;
use crate::controller::reconciler::store::{ObjectStore, StoreError};
use crate::crd::VaultSecret;

pub const LABEL_NAME: &str = "app.kubernetes.io/name";
pub const LABEL_VERSION: &str = "app.kubernetes.io/version";
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_CR_NAME: &str = "crName";
pub const LABEL_CR_NAMESPACE: &str = "crNamespace";
pub const LABEL_LAST_UPDATE: &str = "lastUpdate";

/// What the materialized Secret should look like, apart from its data
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredSecret {
    pub name: String,
    pub namespace: String,
    pub secret_type: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: Option<BTreeMap<String, String>>,
    pub owner: Option<OwnerReference>,
}

impl DesiredSecret {
    pub fn from_vault_secret(
        vault_secret: &VaultSecret,
        operator_name: &str,
        filter: &LabelFilter,
        now: DateTime<Utc>,
    ) -> Self {
        let mut labels = BTreeMap::from([
            (LABEL_NAME.to_string(), OPERATOR_APP_NAME.to_string()),
            (
                LABEL_VERSION.to_string(),
                env!("CARGO_PKG_VERSION").to_string(),
            ),
            (LABEL_MANAGED_BY.to_string(), operator_name.to_string()),
            (LABEL_CR_NAME.to_string(), vault_secret.name_any()),
            (
                LABEL_CR_NAMESPACE.to_string(),
                vault_secret.namespace().unwrap_or_default(),
            ),
            (
                LABEL_LAST_UPDATE.to_string(),
                now.format(LAST_UPDATE_TIME_FORMAT).to_string(),
            ),
        ]);
        if let Some(user_labels) = &vault_secret.spec.secret_labels {
            labels.extend(user_labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        // Owned Secrets are watched through the filter selector
        labels.extend(
            filter
                .labels()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        Self {
            name: vault_secret.target_secret_name(),
            namespace: vault_secret.namespace().unwrap_or_default(),
            secret_type: vault_secret.target_secret_type().to_string(),
            labels,
            annotations: vault_secret.spec.secret_annotations.clone(),
            owner: vault_secret.controller_owner_ref(&()),
        }
    }
}

/// Outcome of a create-or-update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Created,
    Updated,
    Unchanged,
}

impl WriteOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Whether `existing` carries a non-empty type other than `desired_type`
pub fn needs_type_transition(existing: &Secret, desired_type: &str) -> bool {
    existing
        .type_
        .as_deref()
        .is_some_and(|current| !current.is_empty() && current != desired_type)
}

/// `existing` with only its type changed
pub fn with_type_only(existing: &Secret, desired_type: &str) -> Secret {
    let mut secret = existing.clone();
    secret.type_ = Some(desired_type.to_string());
    secret
}

/// Merge `desired` and `values` into `existing`, or build a new Secret
pub fn converge_secret(
    existing: Option<&Secret>,
    desired: &DesiredSecret,
    values: &BTreeMap<String, ByteString>,
) -> Secret {
    let mut secret = existing.cloned().unwrap_or_else(|| Secret {
        metadata: ObjectMeta {
            name: Some(desired.name.clone()),
            namespace: Some(desired.namespace.clone()),
            ..ObjectMeta::default()
        },
        ..Secret::default()
    });

    secret.labels_mut().extend(
        desired
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );

    secret
        .data
        .get_or_insert_with(BTreeMap::new)
        .extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));

    if secret.type_.as_deref().is_none_or(str::is_empty) {
        secret.type_ = Some(desired.secret_type.clone());
    }

    secret.metadata.annotations = desired.annotations.clone();

    if let Some(owner) = &desired.owner {
        let references = secret.metadata.owner_references.get_or_insert_with(Vec::new);
        match references.iter_mut().find(|r| r.uid == owner.uid) {
            Some(reference) => *reference = owner.clone(),
            None => references.push(owner.clone()),
        }
    }

    secret
}

/// Change the type of an existing Secret when it differs from the desired one
///
/// Returns `true` when a type-only write happened.
pub async fn transition_type<S: ObjectStore + ?Sized>(
    store: &S,
    backoff: &ExponentialBackoff,
    desired: &DesiredSecret,
) -> Result<bool, StoreError> {
    retry_on_conflict(backoff, StoreError::is_conflict, move || async move {
        let Some(existing) = store.get_secret(&desired.namespace, &desired.name).await? else {
            return Ok(false);
        };
        if !needs_type_transition(&existing, &desired.secret_type) {
            return Ok(false);
        }
        debug!(
            secret.name = %desired.name,
            from = existing.type_.as_deref().unwrap_or_default(),
            to = %desired.secret_type,
            "secret.type.transition"
        );
        store
            .replace_secret(
                &desired.namespace,
                &with_type_only(&existing, &desired.secret_type),
            )
            .await?;
        Ok(true)
    })
    .await
}

/// Read, converge and write the target Secret, retrying on conflicts
pub async fn create_or_update<S: ObjectStore + ?Sized>(
    store: &S,
    backoff: &ExponentialBackoff,
    desired: &DesiredSecret,
    values: &BTreeMap<String, ByteString>,
) -> Result<WriteOperation, StoreError> {
    retry_on_conflict(backoff, StoreError::is_conflict, move || async move {
        let existing = store.get_secret(&desired.namespace, &desired.name).await?;
        let converged = converge_secret(existing.as_ref(), desired, values);
        match existing {
            None => {
                store.create_secret(&desired.namespace, &converged).await?;
                Ok(WriteOperation::Created)
            }
            Some(existing) if existing == converged => Ok(WriteOperation::Unchanged),
            Some(_) => {
                store.replace_secret(&desired.namespace, &converged).await?;
                Ok(WriteOperation::Updated)
            }
        }
    })
    .await
}
