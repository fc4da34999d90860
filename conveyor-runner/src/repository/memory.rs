//! In-memory repositories for service tests

use async_trait::async_trait;
use conveyor_client::{ClientError, Result};
use conveyor_core::domain::environment::Environment;
use conveyor_core::domain::push_job::PushJobRecord;
use conveyor_core::dto::push_job::CreatePushJob;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use super::{BlockGate, EnvironmentStore, NodeResolver, PushJobApi};

/// Environment store backed by a map, recording every call
#[derive(Default)]
pub struct InMemoryEnvironmentStore {
    envs: Mutex<HashMap<String, Environment>>,
    calls: Mutex<Vec<String>>,
    broken: Mutex<HashSet<String>>,
}

impl InMemoryEnvironmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, env: Environment) -> Self {
        self.envs.lock().unwrap().insert(env.name.clone(), env);
        self
    }

    /// Makes every call touching `name` fail with a server error
    pub fn break_environment(&self, name: &str) {
        self.broken.lock().unwrap().insert(name.to_string());
    }

    pub fn get(&self, name: &str) -> Option<Environment> {
        self.envs.lock().unwrap().get(name).cloned()
    }

    /// Calls in order, as `"<op> <name>"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn saves(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("save ").map(str::to_string))
            .collect()
    }

    fn record(&self, op: &str, name: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{} {}", op, name));
        if self.broken.lock().unwrap().contains(name) {
            return Err(ClientError::api_error(500, format!("{} unavailable", name)));
        }
        Ok(())
    }
}

#[async_trait]
impl EnvironmentStore for InMemoryEnvironmentStore {
    async fn load(&self, name: &str) -> Result<Environment> {
        self.record("load", name)?;
        self.get(name)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))
    }

    async fn create(&self, name: &str) -> Result<Environment> {
        self.record("create", name)?;
        let env = Environment::new(name);
        self.envs
            .lock()
            .unwrap()
            .insert(name.to_string(), env.clone());
        Ok(env)
    }

    async fn save(&self, env: &Environment) -> Result<Environment> {
        self.record("save", &env.name)?;
        self.envs
            .lock()
            .unwrap()
            .insert(env.name.clone(), env.clone());
        Ok(env.clone())
    }
}

/// Block gate returning a fixed list, or failing like a broken Delivery API
pub struct StaticBlockGate {
    blocked: Vec<String>,
    fail_with: Option<u16>,
}

impl StaticBlockGate {
    pub fn new(blocked: &[&str]) -> Self {
        Self {
            blocked: blocked.iter().map(|p| p.to_string()).collect(),
            fail_with: None,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            blocked: Vec::new(),
            fail_with: Some(status),
        }
    }
}

#[async_trait]
impl BlockGate for StaticBlockGate {
    async fn blocked_projects(&self) -> Result<Vec<String>> {
        match self.fail_with {
            Some(status) => Err(ClientError::BadApiResponse {
                status,
                url: "memory://blocked_projects".to_string(),
                body: "boom".to_string(),
            }),
            None => Ok(self.blocked.clone()),
        }
    }
}

/// Push job API replaying a script of job records
///
/// Each fetch returns the next record; once the script runs out the last
/// record repeats.
pub struct ScriptedPushJobApi {
    uri: Option<String>,
    script: Mutex<VecDeque<PushJobRecord>>,
    last: Mutex<Option<PushJobRecord>>,
    started: Mutex<Vec<CreatePushJob>>,
    fetches: Mutex<usize>,
}

impl ScriptedPushJobApi {
    pub fn new(records: Vec<PushJobRecord>) -> Self {
        Self {
            uri: Some("https://chef.example.com/organizations/acme/pushy/jobs/1".to_string()),
            script: Mutex::new(records.into()),
            last: Mutex::new(None),
            started: Mutex::new(Vec::new()),
            fetches: Mutex::new(0),
        }
    }

    /// A server that accepts the job but returns no locator
    pub fn without_uri() -> Self {
        Self {
            uri: None,
            ..Self::new(Vec::new())
        }
    }

    pub fn started(&self) -> Vec<CreatePushJob> {
        self.started.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl PushJobApi for ScriptedPushJobApi {
    async fn start(&self, req: &CreatePushJob) -> Result<String> {
        self.started.lock().unwrap().push(req.clone());
        self.uri
            .clone()
            .ok_or_else(|| ClientError::ParseError("push job response carried no uri".to_string()))
    }

    async fn fetch(&self, _uri: &str) -> Result<PushJobRecord> {
        *self.fetches.lock().unwrap() += 1;
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        (*last).clone()
            .ok_or_else(|| ClientError::NotFound("push job".to_string()))
    }
}

/// Node resolver returning fixed node names and recording queries
pub struct StaticNodeResolver {
    nodes: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl StaticNodeResolver {
    pub fn new(nodes: &[&str]) -> Self {
        Self {
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeResolver for StaticNodeResolver {
    async fn resolve(&self, query: &str) -> Result<Vec<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.nodes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_or_create_creates_missing_environment() {
        let store = InMemoryEnvironmentStore::new();

        let env = store.load_or_create("union").await.unwrap();

        assert_eq!(env.name, "union");
        assert_eq!(store.calls(), vec!["load union", "create union"]);
        assert!(store.get("union").is_some());
    }

    #[tokio::test]
    async fn test_load_or_create_propagates_other_errors() {
        let store = InMemoryEnvironmentStore::new();
        store.break_environment("union");

        let err = store.load_or_create("union").await.unwrap_err();

        assert!(err.is_server_error());
        assert_eq!(store.calls(), vec!["load union"]);
    }
}
