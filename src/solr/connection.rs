//! Solr connection with per-core document queues / 带核心队列的 Solr 连接
//!
//! Lifecycle / 生命周期：
//! - `connect`: discover cores once, one queue per core
//! - `add_document`: queue, submit automatically when the queue reaches the threshold
//! - `flush_all`: submit whatever is pending (call on shutdown)
//!
//! Each queue sits behind its own lock; push, drain and submit happen while holding it,
//! so a document is never sent twice or lost between the threshold check and the drain.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use super::transport::IndexTransport;
use super::types::{QueryParams, Submission};
use crate::error::{Error, Result};
use crate::search::schema::Document;

/// Documents queued per core before an automatic submission / 自动提交阈值
pub const QUEUE_THRESHOLD: usize = 100;

/// Connection behaviour / 连接设置
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub queue_threshold: usize,
    /// Ask Solr to commit with every submitted batch
    pub commit: bool,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            queue_threshold: QUEUE_THRESHOLD,
            commit: true,
        }
    }
}

#[derive(Default)]
struct CoreQueue {
    pending: Mutex<Vec<Document>>,
}

/// Connection to a Solr instance / Solr 连接
pub struct IndexConnection {
    transport: Arc<dyn IndexTransport>,
    cores: BTreeMap<String, CoreQueue>,
    settings: ConnectionSettings,
}

/// Ask Solr which cores it serves / 查询 Solr 提供的核心
pub async fn discover_cores(transport: &dyn IndexTransport) -> Result<Vec<String>> {
    let status = transport.core_status().await?;
    let cores = status
        .get("status")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::UnexpectedResponse("core status without a status object".to_string()))?;
    Ok(cores.keys().cloned().collect())
}

impl IndexConnection {
    /// Discover cores and create their queues / 发现核心并创建队列
    pub async fn connect(
        transport: Arc<dyn IndexTransport>,
        settings: ConnectionSettings,
    ) -> Result<Self> {
        let names = discover_cores(transport.as_ref()).await?;
        tracing::info!("Discovered {} Solr core(s): {}", names.len(), names.join(","));

        let cores = names
            .into_iter()
            .map(|name| (name, CoreQueue::default()))
            .collect();

        Ok(Self {
            transport,
            cores,
            settings: ConnectionSettings {
                queue_threshold: settings.queue_threshold.max(1),
                ..settings
            },
        })
    }

    /// Re-query the core list (does not change the cached cores) / 重新查询核心列表
    pub async fn discover_cores(&self) -> Result<Vec<String>> {
        discover_cores(self.transport.as_ref()).await
    }

    /// Cores discovered at connect time / 已发现的核心
    pub fn core_names(&self) -> Vec<String> {
        self.cores.keys().cloned().collect()
    }

    pub fn has_core(&self, core: &str) -> bool {
        self.cores.contains_key(core)
    }

    fn queue(&self, core: &str) -> Result<&CoreQueue> {
        self.cores
            .get(core)
            .ok_or_else(|| Error::UnknownCore(core.to_string()))
    }

    /// Number of documents waiting for a core / 待提交文档数
    pub async fn pending(&self, core: &str) -> Result<usize> {
        Ok(self.queue(core)?.pending.lock().await.len())
    }

    /// Submit a batch right away / 立即提交一批文档
    pub async fn add_documents(&self, core: &str, docs: &[Document]) -> Result<Value> {
        self.queue(core)?;
        self.submit(core, docs).await
    }

    async fn submit(&self, core: &str, docs: &[Document]) -> Result<Value> {
        tracing::info!("Submitting {} document(s) to core {}", docs.len(), core);
        self.transport
            .update(core, docs, self.settings.commit)
            .await
    }

    /// Queue a document, submitting the queue once it reaches the threshold / 入队
    ///
    /// A submitted batch is exactly `queue_threshold` documents long, oldest first.
    /// On error the batch, `doc` included, stays queued and will go out with the
    /// next submission; callers must not add it again.
    pub async fn add_document(&self, core: &str, doc: Document) -> Result<Submission> {
        let queue = self.queue(core)?;
        let threshold = self.settings.queue_threshold;
        let mut pending = queue.pending.lock().await;
        pending.push(doc);

        if pending.len() < threshold {
            return Ok(Submission::Queued {
                pending: pending.len(),
            });
        }

        let mut batch: Vec<Document> = pending.drain(..threshold).collect();
        match self.submit(core, &batch).await {
            Ok(ack) => Ok(Submission::Submitted {
                count: batch.len(),
                ack,
            }),
            Err(e) => {
                // back to the front, order kept / 放回队首
                batch.append(&mut *pending);
                *pending = batch;
                Err(e)
            }
        }
    }

    /// Submit every pending queue / 提交所有队列
    ///
    /// A failing core does not stop the others. Its documents stay queued and
    /// it is reported as `Submission::Failed`.
    pub async fn flush_all(&self) -> BTreeMap<String, Submission> {
        let mut results = BTreeMap::new();

        for (core, queue) in &self.cores {
            let mut pending = queue.pending.lock().await;
            if pending.is_empty() {
                results.insert(core.clone(), Submission::Empty);
                continue;
            }

            let batch = std::mem::take(&mut *pending);
            let outcome = match self.submit(core, &batch).await {
                Ok(ack) => Submission::Submitted {
                    count: batch.len(),
                    ack,
                },
                Err(e) => {
                    tracing::error!("Flushing core {} failed: {}", core, e);
                    *pending = batch;
                    Submission::Failed {
                        pending: pending.len(),
                        message: e.to_string(),
                    }
                }
            };
            results.insert(core.clone(), outcome);
        }

        results
    }

    /// Run a select query / 执行查询
    pub async fn query(&self, core: &str, query: &str, params: &QueryParams) -> Result<Value> {
        self.queue(core)?;
        let pairs = params.to_pairs(query);
        tracing::debug!("Solr select on {}: {:?}", core, pairs);
        self.transport.select(core, &pairs).await
    }

    /// Optimize one core, or every core when `core` is `None` / 优化核心
    pub async fn optimize(&self, core: Option<&str>) -> Result<BTreeMap<String, Value>> {
        let targets: Vec<String> = match core {
            Some(core) => {
                self.queue(core)?;
                vec![core.to_string()]
            }
            None => self.core_names(),
        };

        let mut results = BTreeMap::new();
        for core in targets {
            tracing::info!("Optimizing core {}", core);
            let ack = self.transport.optimize(&core).await?;
            results.insert(core, ack);
        }
        Ok(results)
    }

    /// Field-type schema of a core / 获取核心 schema
    pub async fn fetch_schema(&self, core: &str) -> Result<Value> {
        self.queue(core)?;
        let mut resp = self.transport.schema(core).await?;
        match resp.get_mut("schema") {
            Some(schema) => Ok(schema.take()),
            None => Err(Error::UnexpectedResponse(format!(
                "schema response for core {} has no schema object",
                core
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory transport recording every call / 记录调用的内存传输
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub cores: Vec<String>,
        pub updates: SyncMutex<Vec<(String, Vec<Document>)>>,
        pub selects: SyncMutex<Vec<(String, Vec<(String, String)>)>>,
        pub optimized: SyncMutex<Vec<String>>,
        pub fail_updates: AtomicBool,
        /// Cores whose updates are refused / 拒绝更新的核心
        pub failing_cores: SyncMutex<Vec<String>>,
    }

    impl RecordingTransport {
        pub fn with_cores(cores: &[&str]) -> Self {
            Self {
                cores: cores.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl IndexTransport for RecordingTransport {
        async fn core_status(&self) -> Result<Value> {
            let status: serde_json::Map<String, Value> =
                self.cores.iter().map(|c| (c.clone(), json!({}))).collect();
            Ok(json!({ "status": status }))
        }

        async fn schema(&self, core: &str) -> Result<Value> {
            Ok(json!({"schema": {"name": core, "fields": [{"name": "id", "type": "string"}]}}))
        }

        async fn select(&self, core: &str, params: &[(String, String)]) -> Result<Value> {
            self.selects.lock().push((core.to_string(), params.to_vec()));
            Ok(json!({"response": {"numFound": 0, "start": 0, "docs": []}}))
        }

        async fn update(&self, core: &str, docs: &[Document], _commit: bool) -> Result<Value> {
            if self.fail_updates.load(Ordering::SeqCst)
                || self.failing_cores.lock().iter().any(|c| c == core)
            {
                return Err(Error::Connection("connection refused".to_string()));
            }
            self.updates.lock().push((core.to_string(), docs.to_vec()));
            Ok(json!({"responseHeader": {"status": 0}}))
        }

        async fn optimize(&self, core: &str) -> Result<Value> {
            self.optimized.lock().push(core.to_string());
            Ok(json!({"responseHeader": {"status": 0}}))
        }
    }

    async fn connect(transport: Arc<RecordingTransport>) -> IndexConnection {
        IndexConnection::connect(transport, ConnectionSettings::default())
            .await
            .unwrap()
    }

    fn doc(n: usize) -> Document {
        Document::new(format!("doc-{}", n), "thesis")
    }

    #[tokio::test]
    async fn test_connect_discovers_cores() {
        let transport = Arc::new(RecordingTransport::with_cores(&["thesis", "test"]));
        let conn = connect(transport).await;
        assert!(conn.has_core("thesis"));
        assert!(conn.has_core("test"));
        assert!(!conn.has_core("person"));
        assert_eq!(conn.discover_cores().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_queue_threshold() {
        let transport = Arc::new(RecordingTransport::with_cores(&["thesis"]));
        let conn = connect(transport.clone()).await;

        for n in 0..QUEUE_THRESHOLD - 1 {
            let result = conn.add_document("thesis", doc(n)).await.unwrap();
            assert_eq!(result, Submission::Queued { pending: n + 1 });
        }
        assert!(transport.updates.lock().is_empty());

        let result = conn.add_document("thesis", doc(QUEUE_THRESHOLD - 1)).await.unwrap();
        assert_eq!(result.submitted_count(), QUEUE_THRESHOLD);

        {
            let updates = transport.updates.lock();
            assert_eq!(updates.len(), 1);
            let (core, batch) = &updates[0];
            assert_eq!(core, "thesis");
            let ids: Vec<&str> = batch.iter().map(Document::id).collect();
            let expected: Vec<String> = (0..QUEUE_THRESHOLD).map(|n| format!("doc-{}", n)).collect();
            assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
        }

        let result = conn.add_document("thesis", doc(QUEUE_THRESHOLD)).await.unwrap();
        assert_eq!(result, Submission::Queued { pending: 1 });
        assert_eq!(transport.updates.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_documents() {
        let transport = Arc::new(RecordingTransport::with_cores(&["thesis"]));
        let conn = IndexConnection::connect(
            transport.clone(),
            ConnectionSettings {
                queue_threshold: 3,
                commit: false,
            },
        )
        .await
        .unwrap();

        conn.add_document("thesis", doc(0)).await.unwrap();
        conn.add_document("thesis", doc(1)).await.unwrap();
        transport.fail_updates.store(true, Ordering::SeqCst);
        assert!(conn.add_document("thesis", doc(2)).await.is_err());
        assert_eq!(conn.pending("thesis").await.unwrap(), 3);

        transport.fail_updates.store(false, Ordering::SeqCst);
        let result = conn.add_document("thesis", doc(3)).await.unwrap();
        assert_eq!(result.submitted_count(), 3);
        assert_eq!(conn.pending("thesis").await.unwrap(), 1);

        let updates = transport.updates.lock();
        let ids: Vec<&str> = updates[0].1.iter().map(Document::id).collect();
        assert_eq!(ids, vec!["doc-0", "doc-1", "doc-2"]);
    }

    #[tokio::test]
    async fn test_batches_never_exceed_threshold() {
        let transport = Arc::new(RecordingTransport::with_cores(&["thesis"]));
        let conn = IndexConnection::connect(
            transport.clone(),
            ConnectionSettings {
                queue_threshold: 2,
                commit: false,
            },
        )
        .await
        .unwrap();

        transport.fail_updates.store(true, Ordering::SeqCst);
        conn.add_document("thesis", doc(0)).await.unwrap();
        assert!(conn.add_document("thesis", doc(1)).await.is_err());
        assert!(conn.add_document("thesis", doc(2)).await.is_err());
        assert_eq!(conn.pending("thesis").await.unwrap(), 3);

        transport.fail_updates.store(false, Ordering::SeqCst);
        conn.add_document("thesis", doc(3)).await.unwrap();
        conn.add_document("thesis", doc(4)).await.unwrap();

        let updates = transport.updates.lock();
        assert!(updates.iter().all(|(_, batch)| batch.len() == 2));
        let ids: Vec<&str> = updates
            .iter()
            .flat_map(|(_, batch)| batch.iter().map(Document::id))
            .collect();
        assert_eq!(ids, vec!["doc-0", "doc-1", "doc-2", "doc-3"]);
        drop(updates);
        assert_eq!(conn.pending("thesis").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_producers() {
        let transport = Arc::new(RecordingTransport::with_cores(&["thesis"]));
        let conn = Arc::new(connect(transport.clone()).await);

        let mut handles = Vec::new();
        for worker in 0..4 {
            let conn = conn.clone();
            handles.push(tokio::spawn(async move {
                for n in 0..50 {
                    conn.add_document("thesis", doc(worker * 1000 + n)).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let updates = transport.updates.lock();
        assert_eq!(updates.len(), 2);
        assert!(updates.iter().all(|(_, batch)| batch.len() == QUEUE_THRESHOLD));
        let mut ids: Vec<String> = updates
            .iter()
            .flat_map(|(_, batch)| batch.iter().map(|d| d.id().to_string()))
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
    }

    #[tokio::test]
    async fn test_unknown_core() {
        let transport = Arc::new(RecordingTransport::with_cores(&["thesis"]));
        let conn = connect(transport.clone()).await;

        assert!(matches!(
            conn.add_document("person", doc(0)).await,
            Err(Error::UnknownCore(_))
        ));
        assert!(matches!(
            conn.add_documents("person", &[doc(0)]).await,
            Err(Error::UnknownCore(_))
        ));
        assert!(matches!(
            conn.query("person", "*:*", &QueryParams::default()).await,
            Err(Error::UnknownCore(_))
        ));
        assert!(matches!(conn.fetch_schema("person").await, Err(Error::UnknownCore(_))));
        assert!(matches!(conn.optimize(Some("person")).await, Err(Error::UnknownCore(_))));
        assert!(transport.updates.lock().is_empty());
        assert!(transport.selects.lock().is_empty());
    }

    #[tokio::test]
    async fn test_flush_all() {
        let transport = Arc::new(RecordingTransport::with_cores(&["test", "thesis"]));
        let conn = connect(transport.clone()).await;

        conn.add_document("thesis", doc(1)).await.unwrap();
        conn.add_document("thesis", doc(2)).await.unwrap();

        let results = conn.flush_all().await;
        assert_eq!(results["test"], Submission::Empty);
        assert_eq!(results["thesis"].submitted_count(), 2);
        assert_eq!(conn.pending("thesis").await.unwrap(), 0);
        assert_eq!(transport.updates.lock().len(), 1);

        let again = conn.flush_all().await;
        assert!(again.values().all(|s| *s == Submission::Empty));
    }

    #[tokio::test]
    async fn test_flush_all_continues_past_failed_core() {
        let transport = Arc::new(RecordingTransport::with_cores(&["a", "b"]));
        let conn = connect(transport.clone()).await;

        conn.add_document("a", doc(1)).await.unwrap();
        conn.add_document("b", doc(2)).await.unwrap();
        conn.add_document("b", doc(3)).await.unwrap();
        transport.failing_cores.lock().push("a".to_string());

        let results = conn.flush_all().await;
        assert!(results["a"].is_failed());
        assert!(matches!(&results["a"], Submission::Failed { pending: 1, .. }));
        assert_eq!(results["b"].submitted_count(), 2);
        assert_eq!(conn.pending("a").await.unwrap(), 1);
        assert_eq!(conn.pending("b").await.unwrap(), 0);

        transport.failing_cores.lock().clear();
        let retry = conn.flush_all().await;
        assert_eq!(retry["a"].submitted_count(), 1);
        assert_eq!(retry["b"], Submission::Empty);
    }

    #[tokio::test]
    async fn test_add_documents_submits_immediately() {
        let transport = Arc::new(RecordingTransport::with_cores(&["thesis"]));
        let conn = connect(transport.clone()).await;

        let ack = conn.add_documents("thesis", &[doc(1), doc(2)]).await.unwrap();
        assert_eq!(ack["responseHeader"]["status"], json!(0));
        assert_eq!(transport.updates.lock()[0].1.len(), 2);
    }

    #[tokio::test]
    async fn test_query_marshals_params() {
        let transport = Arc::new(RecordingTransport::with_cores(&["thesis"]));
        let conn = connect(transport.clone()).await;

        let params = QueryParams {
            rows: Some(10),
            ..Default::default()
        };
        conn.query("thesis", "title:x", &params).await.unwrap();

        let selects = transport.selects.lock();
        let (core, pairs) = &selects[0];
        assert_eq!(core, "thesis");
        assert!(pairs.contains(&("rows".to_string(), "10".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "start"));
    }

    #[tokio::test]
    async fn test_optimize_all_and_schema() {
        let transport = Arc::new(RecordingTransport::with_cores(&["test", "thesis"]));
        let conn = connect(transport.clone()).await;

        let results = conn.optimize(None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(*transport.optimized.lock(), vec!["test", "thesis"]);

        conn.optimize(Some("thesis")).await.unwrap();
        assert_eq!(transport.optimized.lock().len(), 3);

        let schema = conn.fetch_schema("thesis").await.unwrap();
        assert_eq!(schema["name"], json!("thesis"));
    }
}
