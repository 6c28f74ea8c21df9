//! Browsing session: upload a database, pick a train number, drill into
//! complex actions.
//!
//! Each call marks the session busy while its request is outstanding.
//! Failures are logged, clear whatever data the call was meant to replace,
//! and are handed back to the caller for display. Requests are not
//! cancelled or versioned; a slow answer may arrive after a newer one.

use crate::api::{Backend, Endpoint};
use crate::decode::decode_response;
use crate::error::ApiError;
use crate::page::{complex_action_page_url, decode_new_tab};
use cab_core::{ActionTree, Catalog, ComplexActionQuery, Scalar, TreeSchema, build_tree, parse_label};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Shared count of requests in flight, for UIs that show a spinner.
///
/// Busy while any call is outstanding, so overlapping requests keep it set
/// until the last one returns.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicUsize>);

impl BusyFlag {
    pub fn is_busy(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn enter(&self) -> BusyGuard {
        self.0.fetch_add(1, Ordering::AcqRel);
        BusyGuard(self.clone())
    }
}

/// Releases one in-flight slot when the call returns, on every path.
struct BusyGuard(BusyFlag);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        (self.0).0.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct CabSession<B> {
    backend: B,
    catalog: Catalog,
    busy: BusyFlag,
}

impl<B: Backend> CabSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            catalog: Catalog::default(),
            busy: BusyFlag::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Train numbers of the last successful upload.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    /// Upload a database and load its train-number catalog.
    pub async fn upload_db(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<&Catalog, ApiError> {
        let _busy = self.busy.enter();
        self.catalog = Catalog::default();

        let result = async {
            let body = self.backend.upload_db(file_name, bytes).await?;
            decode_response::<Catalog>(Endpoint::UploadDb.operation(), &body)
        }
        .await;

        match result {
            Ok(catalog) => {
                log::info!("{file_name}: {} train numbers", catalog.len());
                self.catalog = catalog;
                Ok(&self.catalog)
            }
            Err(e) => {
                log::error!("{e}");
                Err(e)
            }
        }
    }

    /// Load the action tree of the train number behind a picker label.
    pub async fn select_train_number(&self, label: &str) -> Result<ActionTree, ApiError> {
        let id = parse_label(label).ok_or_else(|| ApiError::UnknownTrainNumber(label.to_string()))?;
        self.load_actions(&id).await
    }

    /// Load the action tree of a train number.
    pub async fn load_actions(&self, train_number_id: &Scalar) -> Result<ActionTree, ApiError> {
        let body = json!({ "trainNumberId": train_number_id });
        self.fetch_tree(Endpoint::GetActions, Some(body), TreeSchema::TrainNumber)
            .await
    }

    /// Load the definition tree of a complex action.
    pub async fn load_complex_action(
        &self,
        query: &ComplexActionQuery,
    ) -> Result<ActionTree, ApiError> {
        let body = serde_json::to_value(query).map_err(|source| ApiError::Encode {
            operation: Endpoint::GetComplexAction.operation(),
            source,
        })?;
        self.fetch_tree(Endpoint::GetComplexAction, Some(body), TreeSchema::ComplexAction)
            .await
    }

    /// Ask the server for the complex-action page and decorate it with `query`.
    pub async fn complex_action_page(
        &self,
        base: &Url,
        query: &ComplexActionQuery,
    ) -> Result<Url, ApiError> {
        let _busy = self.busy.enter();
        let result = async {
            let endpoint = Endpoint::LoadComplexAction;
            let body = self.backend.post_json(endpoint, None).await?;
            let new_tab = decode_new_tab(&body)?;
            complex_action_page_url(base, &new_tab, query)
        }
        .await;
        result.inspect_err(|e| log::error!("{e}"))
    }

    async fn fetch_tree(
        &self,
        endpoint: Endpoint,
        body: Option<Value>,
        schema: TreeSchema,
    ) -> Result<ActionTree, ApiError> {
        let _busy = self.busy.enter();
        let result = async {
            let raw = self.backend.post_json(endpoint, body).await?;
            let value: Value = decode_response(endpoint.operation(), &raw)?;
            Ok(build_tree(&value, schema)?)
        }
        .await;
        result.inspect_err(|e| log::error!("{e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_clears_flag() {
        let flag = BusyFlag::default();
        {
            let _guard = flag.enter();
            assert!(flag.is_busy());
        }
        assert!(!flag.is_busy());
    }

    #[test]
    fn nested_guards_stay_busy_until_the_last() {
        let flag = BusyFlag::default();
        let first = flag.enter();
        let second = flag.enter();
        assert_eq!(flag.in_flight(), 2);
        drop(first);
        assert!(flag.is_busy());
        drop(second);
        assert!(!flag.is_busy());
    }
}
