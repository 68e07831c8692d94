use crate::utils::error::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};

/// 單值 TTL 快取，「整批載入後快取一個 session」的模式用。
///
/// 載入期間鎖住 slot，同時到達的呼叫者會等同一次載入完成，
/// 不會各自打一次 API。載入失敗不寫入，下一個呼叫者重試。
pub struct TtlCache<T> {
    ttl: Duration,
    slot: Mutex<Option<(Instant, Arc<T>)>>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some((loaded_at, value)) = slot.as_ref() {
            if loaded_at.elapsed() < self.ttl {
                tracing::debug!("🗃️ cache hit (age: {:?})", loaded_at.elapsed());
                return Ok(value.clone());
            }
            tracing::debug!("🗃️ cache expired, reloading");
        }

        let value = Arc::new(load().await?);
        *slot = Some((Instant::now(), value.clone()));
        Ok(value)
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}

/// 相同 key 的進行中請求去重。
///
/// 第一個呼叫者真的發請求，其餘等同一個 OnceCell；
/// 完成後移除 key，之後的呼叫重新發請求（結果快取是上層的事）。
pub struct RequestCoalescer<T: Clone> {
    inflight: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
}

impl<T: Clone> Default for RequestCoalescer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> RequestCoalescer<T> {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn run<F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let cell = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        // 失敗時 OnceCell 維持未初始化，等待中的呼叫者會接手重試
        let result = cell.get_or_try_init(fetch).await.cloned();

        let mut inflight = self.inflight.lock().await;
        if let Some(existing) = inflight.get(key) {
            if Arc::ptr_eq(existing, &cell) {
                inflight.remove(key);
            }
        }

        result
    }
}

/// 「最新請求獲勝」：互動式搜尋的 switch-to-latest 語義。
///
/// 每次搜尋領一張票，回應到達時票已過期就丟棄結果。
/// 不做傳輸層取消，原系統的 switch-latest 也只是丟掉過期 payload。
#[derive(Debug, Default)]
pub struct LatestWins {
    generation: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

impl LatestWins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> SearchTicket {
        SearchTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// 票仍有效就回傳 Some(value)，否則結果作廢
    pub fn settle<T>(&self, ticket: SearchTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!("🔄 dropping stale search result (ticket {})", ticket.0);
            None
        }
    }
}
