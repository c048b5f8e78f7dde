use crate::db::models::{
    DashboardSummary, DbUser, Mapping, NewRequirement, NewTestCase, Requirement,
    RequirementPatch, TestCase, TestCasePatch,
};
use crate::db::sqlite::TrackerStorage;
use crate::error::TrackerError;

use chrono::{DateTime, Utc};
use ractor::rpc::CallResult;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::fmt::Display;
use tracing::{debug, info};

type Reply<T> = RpcReplyPort<Result<T, TrackerError>>;

/// Every store operation. The actor handles one message at a time, so each
/// variant runs with exclusive use of the connection.
#[derive(Debug)]
pub enum StoreMessage {
    InsertUser {
        username: String,
        password_hash: String,
        email: String,
        now: DateTime<Utc>,
        reply: Reply<i64>,
    },
    FindUserByUsername(String, Reply<Option<DbUser>>),
    GetUser(i64, Reply<Option<DbUser>>),
    ListUsers(Reply<Vec<DbUser>>),
    SetPassword(String, String, Reply<bool>),

    ListRequirements(Reply<Vec<Requirement>>),
    GetRequirement(i64, Reply<Option<Requirement>>),
    InsertRequirement(NewRequirement, DateTime<Utc>, Reply<i64>),
    UpdateRequirement(i64, RequirementPatch, DateTime<Utc>, Reply<bool>),
    DeleteRequirement(i64, Reply<bool>),
    RequirementsForTestCase(i64, Reply<Vec<Requirement>>),

    ListTestCases(Reply<Vec<TestCase>>),
    GetTestCase(i64, Reply<Option<TestCase>>),
    InsertTestCase(NewTestCase, DateTime<Utc>, Reply<i64>),
    UpdateTestCase(i64, TestCasePatch, DateTime<Utc>, Reply<bool>),
    DeleteTestCase(i64, Reply<bool>),
    TestCasesForRequirement(i64, Reply<Vec<TestCase>>),

    ListMappings(Reply<Vec<Mapping>>),
    InsertMapping(i64, i64, DateTime<Utc>, Reply<i64>),
    DeleteMapping(i64, Reply<bool>),

    Summary(Reply<DashboardSummary>),
}

impl StoreMessage {
    fn name(&self) -> &'static str {
        match self {
            StoreMessage::InsertUser { .. } => "InsertUser",
            StoreMessage::FindUserByUsername(..) => "FindUserByUsername",
            StoreMessage::GetUser(..) => "GetUser",
            StoreMessage::ListUsers(..) => "ListUsers",
            StoreMessage::SetPassword(..) => "SetPassword",
            StoreMessage::ListRequirements(..) => "ListRequirements",
            StoreMessage::GetRequirement(..) => "GetRequirement",
            StoreMessage::InsertRequirement(..) => "InsertRequirement",
            StoreMessage::UpdateRequirement(..) => "UpdateRequirement",
            StoreMessage::DeleteRequirement(..) => "DeleteRequirement",
            StoreMessage::RequirementsForTestCase(..) => "RequirementsForTestCase",
            StoreMessage::ListTestCases(..) => "ListTestCases",
            StoreMessage::GetTestCase(..) => "GetTestCase",
            StoreMessage::InsertTestCase(..) => "InsertTestCase",
            StoreMessage::UpdateTestCase(..) => "UpdateTestCase",
            StoreMessage::DeleteTestCase(..) => "DeleteTestCase",
            StoreMessage::TestCasesForRequirement(..) => "TestCasesForRequirement",
            StoreMessage::ListMappings(..) => "ListMappings",
            StoreMessage::InsertMapping(..) => "InsertMapping",
            StoreMessage::DeleteMapping(..) => "DeleteMapping",
            StoreMessage::Summary(..) => "Summary",
        }
    }
}

/// Cloneable handle to the store actor. All database access goes through here.
#[derive(Clone)]
pub struct StoreHandle {
    actor: ActorRef<StoreMessage>,
}

fn rpc_failed<E: Display>(op: &'static str) -> impl FnOnce(E) -> TrackerError {
    move |e| TrackerError::RactorError(format!("{op} RPC failed: {e}"))
}

impl StoreHandle {
    pub async fn insert_user(
        &self,
        username: String,
        password_hash: String,
        email: String,
        now: DateTime<Utc>,
    ) -> Result<i64, TrackerError> {
        let result = self
            .actor
            .call(
                |reply| StoreMessage::InsertUser {
                    username,
                    password_hash,
                    email,
                    now,
                    reply,
                },
                None,
            )
            .await
            .map_err(rpc_failed("InsertUser"))?;
        match result {
            CallResult::Success(inserted) => inserted,
            CallResult::Timeout | CallResult::SenderError => Err(TrackerError::RactorError(
                "InsertUser reply channel closed".to_string(),
            )),
        }
    }

    pub async fn find_user_by_username(
        &self,
        username: impl AsRef<str>,
    ) -> Result<Option<DbUser>, TrackerError> {
        ractor::call!(
            self.actor,
            StoreMessage::FindUserByUsername,
            username.as_ref().to_string()
        )
        .map_err(rpc_failed("FindUserByUsername"))?
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<DbUser>, TrackerError> {
        ractor::call!(self.actor, StoreMessage::GetUser, id).map_err(rpc_failed("GetUser"))?
    }

    pub async fn list_users(&self) -> Result<Vec<DbUser>, TrackerError> {
        ractor::call!(self.actor, StoreMessage::ListUsers).map_err(rpc_failed("ListUsers"))?
    }

    pub async fn set_password(
        &self,
        username: String,
        password_hash: String,
    ) -> Result<bool, TrackerError> {
        ractor::call!(self.actor, StoreMessage::SetPassword, username, password_hash)
            .map_err(rpc_failed("SetPassword"))?
    }

    pub async fn list_requirements(&self) -> Result<Vec<Requirement>, TrackerError> {
        ractor::call!(self.actor, StoreMessage::ListRequirements)
            .map_err(rpc_failed("ListRequirements"))?
    }

    pub async fn get_requirement(&self, id: i64) -> Result<Option<Requirement>, TrackerError> {
        ractor::call!(self.actor, StoreMessage::GetRequirement, id)
            .map_err(rpc_failed("GetRequirement"))?
    }

    pub async fn insert_requirement(
        &self,
        new: NewRequirement,
        now: DateTime<Utc>,
    ) -> Result<i64, TrackerError> {
        ractor::call!(self.actor, StoreMessage::InsertRequirement, new, now)
            .map_err(rpc_failed("InsertRequirement"))?
    }

    pub async fn update_requirement(
        &self,
        id: i64,
        patch: RequirementPatch,
        now: DateTime<Utc>,
    ) -> Result<bool, TrackerError> {
        ractor::call!(self.actor, StoreMessage::UpdateRequirement, id, patch, now)
            .map_err(rpc_failed("UpdateRequirement"))?
    }

    pub async fn delete_requirement(&self, id: i64) -> Result<bool, TrackerError> {
        ractor::call!(self.actor, StoreMessage::DeleteRequirement, id)
            .map_err(rpc_failed("DeleteRequirement"))?
    }

    pub async fn requirements_for_test_case(
        &self,
        test_case_id: i64,
    ) -> Result<Vec<Requirement>, TrackerError> {
        ractor::call!(self.actor, StoreMessage::RequirementsForTestCase, test_case_id)
            .map_err(rpc_failed("RequirementsForTestCase"))?
    }

    pub async fn list_test_cases(&self) -> Result<Vec<TestCase>, TrackerError> {
        ractor::call!(self.actor, StoreMessage::ListTestCases)
            .map_err(rpc_failed("ListTestCases"))?
    }

    pub async fn get_test_case(&self, id: i64) -> Result<Option<TestCase>, TrackerError> {
        ractor::call!(self.actor, StoreMessage::GetTestCase, id)
            .map_err(rpc_failed("GetTestCase"))?
    }

    pub async fn insert_test_case(
        &self,
        new: NewTestCase,
        now: DateTime<Utc>,
    ) -> Result<i64, TrackerError> {
        ractor::call!(self.actor, StoreMessage::InsertTestCase, new, now)
            .map_err(rpc_failed("InsertTestCase"))?
    }

    pub async fn update_test_case(
        &self,
        id: i64,
        patch: TestCasePatch,
        now: DateTime<Utc>,
    ) -> Result<bool, TrackerError> {
        ractor::call!(self.actor, StoreMessage::UpdateTestCase, id, patch, now)
            .map_err(rpc_failed("UpdateTestCase"))?
    }

    pub async fn delete_test_case(&self, id: i64) -> Result<bool, TrackerError> {
        ractor::call!(self.actor, StoreMessage::DeleteTestCase, id)
            .map_err(rpc_failed("DeleteTestCase"))?
    }

    pub async fn test_cases_for_requirement(
        &self,
        requirement_id: i64,
    ) -> Result<Vec<TestCase>, TrackerError> {
        ractor::call!(self.actor, StoreMessage::TestCasesForRequirement, requirement_id)
            .map_err(rpc_failed("TestCasesForRequirement"))?
    }

    pub async fn list_mappings(&self) -> Result<Vec<Mapping>, TrackerError> {
        ractor::call!(self.actor, StoreMessage::ListMappings)
            .map_err(rpc_failed("ListMappings"))?
    }

    pub async fn insert_mapping(
        &self,
        requirement_id: i64,
        test_case_id: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, TrackerError> {
        ractor::call!(
            self.actor,
            StoreMessage::InsertMapping,
            requirement_id,
            test_case_id,
            now
        )
        .map_err(rpc_failed("InsertMapping"))?
    }

    pub async fn delete_mapping(&self, id: i64) -> Result<bool, TrackerError> {
        ractor::call!(self.actor, StoreMessage::DeleteMapping, id)
            .map_err(rpc_failed("DeleteMapping"))?
    }

    pub async fn summary(&self) -> Result<DashboardSummary, TrackerError> {
        ractor::call!(self.actor, StoreMessage::Summary).map_err(rpc_failed("Summary"))?
    }

    /// Stop the actor; the connection closes with it.
    pub fn shutdown(&self) {
        self.actor.stop(None);
    }
}

/// Internal state held by the store actor
struct StoreActorState {
    storage: TrackerStorage,
}

/// ractor-based store actor: the one owner of the database connection
struct StoreActor;

#[ractor::async_trait]
impl Actor for StoreActor {
    type Msg = StoreMessage;
    type State = StoreActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let mut storage = TrackerStorage::connect(&database_url)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("DB connect failed: {}", e)))?;
        storage
            .init_schema()
            .await
            .map_err(|e| ActorProcessingErr::from(format!("DB schema init failed: {}", e)))?;
        info!(database_url = %database_url, "StoreActor started");
        Ok(StoreActorState { storage })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        debug!(op = message.name(), "store operation");
        let s = &mut state.storage;
        // A dropped reply port means the caller went away; the work is still done.
        match message {
            StoreMessage::InsertUser {
                username,
                password_hash,
                email,
                now,
                reply,
            } => {
                let _ = reply.send(s.insert_user(&username, &password_hash, &email, now).await);
            }
            StoreMessage::FindUserByUsername(username, reply) => {
                let _ = reply.send(s.find_user_by_username(&username).await);
            }
            StoreMessage::GetUser(id, reply) => {
                let _ = reply.send(s.get_user(id).await);
            }
            StoreMessage::ListUsers(reply) => {
                let _ = reply.send(s.list_users().await);
            }
            StoreMessage::SetPassword(username, hash, reply) => {
                let _ = reply.send(s.set_password(&username, &hash).await);
            }

            StoreMessage::ListRequirements(reply) => {
                let _ = reply.send(s.list_requirements().await);
            }
            StoreMessage::GetRequirement(id, reply) => {
                let _ = reply.send(s.get_requirement(id).await);
            }
            StoreMessage::InsertRequirement(new, now, reply) => {
                let _ = reply.send(s.insert_requirement(new, now).await);
            }
            StoreMessage::UpdateRequirement(id, patch, now, reply) => {
                let _ = reply.send(s.update_requirement(id, patch, now).await);
            }
            StoreMessage::DeleteRequirement(id, reply) => {
                let _ = reply.send(s.delete_requirement(id).await);
            }
            StoreMessage::RequirementsForTestCase(id, reply) => {
                let _ = reply.send(s.requirements_for_test_case(id).await);
            }

            StoreMessage::ListTestCases(reply) => {
                let _ = reply.send(s.list_test_cases().await);
            }
            StoreMessage::GetTestCase(id, reply) => {
                let _ = reply.send(s.get_test_case(id).await);
            }
            StoreMessage::InsertTestCase(new, now, reply) => {
                let _ = reply.send(s.insert_test_case(new, now).await);
            }
            StoreMessage::UpdateTestCase(id, patch, now, reply) => {
                let _ = reply.send(s.update_test_case(id, patch, now).await);
            }
            StoreMessage::DeleteTestCase(id, reply) => {
                let _ = reply.send(s.delete_test_case(id).await);
            }
            StoreMessage::TestCasesForRequirement(id, reply) => {
                let _ = reply.send(s.test_cases_for_requirement(id).await);
            }

            StoreMessage::ListMappings(reply) => {
                let _ = reply.send(s.list_mappings().await);
            }
            StoreMessage::InsertMapping(requirement_id, test_case_id, now, reply) => {
                let _ = reply.send(s.insert_mapping(requirement_id, test_case_id, now).await);
            }
            StoreMessage::DeleteMapping(id, reply) => {
                let _ = reply.send(s.delete_mapping(id).await);
            }

            StoreMessage::Summary(reply) => {
                let _ = reply.send(s.summary().await);
            }
        }
        Ok(())
    }
}

/// Async spawn of the store actor and return a handle.
pub async fn spawn(database_url: &str) -> Result<StoreHandle, TrackerError> {
    let (actor, _jh) = Actor::spawn(None, StoreActor, database_url.to_string())
        .await
        .map_err(|e| TrackerError::RactorError(format!("failed to spawn StoreActor: {e}")))?;
    Ok(StoreHandle { actor })
}
