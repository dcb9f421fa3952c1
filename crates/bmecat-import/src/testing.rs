//! In-memory shop used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bmecat_shopware::{ShopwareError, TaxRate};
use serde::Serialize;
use serde_json::{json, Value};

use crate::backend::{ReferenceSource, SyncTarget};

type RejectFn = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// Accepts every sync call unless a payload item matches `reject`, in which
/// case the whole call fails the way Shopware does for a bad item.
pub(crate) struct FakeShop {
    pub currencies: HashMap<String, String>,
    pub taxes: Vec<TaxRate>,
    pub reject: RejectFn,
    pub calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl FakeShop {
    pub fn new() -> Self {
        Self {
            currencies: HashMap::from([("EUR".to_string(), "cur-eur".to_string())]),
            taxes: vec![
                TaxRate {
                    id: "tax-19".to_string(),
                    tax_rate: 19.into(),
                },
                TaxRate {
                    id: "tax-7".to_string(),
                    tax_rate: 7.into(),
                },
            ],
            reject: Box::new(|_| false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(mut self, reject: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.reject = Box::new(reject);
        self
    }

    /// Every sync call so far as `(entity, payload)`.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, entity: &str) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter(|(e, _)| e == entity)
            .map(|(_, payload)| payload)
            .collect()
    }
}

#[async_trait]
impl ReferenceSource for FakeShop {
    async fn currency_id(&self, iso_code: &str) -> Result<Option<String>, ShopwareError> {
        Ok(self.currencies.get(iso_code).cloned())
    }

    async fn tax_rates(&self, limit: u32) -> Result<Vec<TaxRate>, ShopwareError> {
        Ok(self.taxes.iter().take(limit as usize).cloned().collect())
    }
}

#[async_trait]
impl SyncTarget for FakeShop {
    async fn sync_upsert<T>(&self, entity: &str, payload: &[T]) -> Result<(), ShopwareError>
    where
        T: Serialize + Sync,
    {
        let items: Vec<Value> = payload
            .iter()
            .map(|item| serde_json::to_value(item).unwrap())
            .collect();
        let bad: Vec<Value> = items.iter().filter(|v| (self.reject)(v)).cloned().collect();
        self.calls
            .lock()
            .unwrap()
            .push((entity.to_string(), items));

        if bad.is_empty() {
            Ok(())
        } else {
            Err(ShopwareError::SyncRejected {
                entity: entity.to_string(),
                errors: json!([{"code": "FAKE_REJECTED", "items": bad}]),
            })
        }
    }
}
