#![allow(dead_code)]

use async_trait::async_trait;
use connectors::{
    error::TransferError,
    memory::MemorySource,
    transfer::{SubmitRequest, TransferService},
};
use model::{core::identifiers::JobId, jobs::JobStatus};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

/// The reference scenario: table `Orders`, rows `(1,"A") (2,"B")
/// (3,"C")`, migrated with batch size 2 into `orders/batch_00000.csv`
/// (rows 1-2) and `orders/batch_00001.csv` (row 3).
pub fn orders_source() -> MemorySource {
    MemorySource::from_json_rows(
        "orders",
        vec!["id".into(), "item".into()],
        &[
            vec![serde_json::json!(1), serde_json::json!("A")],
            vec![serde_json::json!(2), serde_json::json!("B")],
            vec![serde_json::json!(3), serde_json::json!("C")],
        ],
    )
}

/// Migration plan over the inline `orders` dataset with a filesystem
/// destination.
pub fn orders_plan(root: &Path, batch_size: usize) -> engine_config::plan::MigrationPlan {
    let json = format!(
        r#"{{
            "source": {{
                "format": "memory",
                "columns": ["id", "item"],
                "rows": [[1, "A"], [2, "B"], [3, "C"]]
            }},
            "destination": {{ "kind": "fs", "root": {root:?} }},
            "tables": [ {{ "table": "orders" }} ],
            "settings": {{ "batch_size": {batch_size}, "sample_size": 10 }}
        }}"#
    );
    engine_config::plan::parse(&json).expect("reference plan must parse")
}

/// Transfer service double that replays a scripted status sequence per
/// job; the last entry repeats once the script runs dry.
#[derive(Default)]
pub struct ScriptedTransferService {
    scripts: Mutex<HashMap<String, VecDeque<JobStatus>>>,
}

impl ScriptedTransferService {
    pub fn script(self, table: &str, statuses: Vec<JobStatus>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(format!("job-{table}"), VecDeque::from(statuses));
        self
    }
}

#[async_trait]
impl TransferService for ScriptedTransferService {
    async fn submit(&self, request: &SubmitRequest) -> Result<JobId, TransferError> {
        let id = format!("job-{}", request.table);
        if self.scripts.lock().unwrap().contains_key(&id) {
            Ok(JobId::new(id))
        } else {
            Err(TransferError::Protocol(format!(
                "no pipeline defined for table '{}'",
                request.table
            )))
        }
    }

    async fn status(&self, id: &JobId) -> Result<JobStatus, TransferError> {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(id.as_str())
            .ok_or_else(|| TransferError::Protocol(format!("unknown job {id}")))?;
        if script.len() > 1 {
            Ok(script.pop_front().unwrap())
        } else {
            script
                .front()
                .cloned()
                .ok_or_else(|| TransferError::Protocol("empty script".into()))
        }
    }
}
