use crate::api::ApiClient;
use crate::cache::LocalCache;
use crate::models::{CompleteResponse, ProgressSource, ProgressState, UserResponse};
use serde_json::json;
use tracing::{info, warn};

pub const COMPLETION_AWARD: u32 = 50;

/// How the offline path treats a completion for a project that is already
/// completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatAward {
    /// A repeat completion changes nothing.
    #[default]
    Guarded,
    /// A repeat completion awards points again (never duplicates the index).
    Legacy,
}

impl RepeatAward {
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("legacy") => RepeatAward::Legacy,
            _ => RepeatAward::Guarded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Server { accepted: bool },
    Local { newly_completed: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Server accepted the change; `refreshed` tells whether the follow-up
    /// user fetch succeeded.
    Synced { refreshed: bool },
    /// The change only reached the local cache.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Server,
    Local,
}

/// Applies a completion without the server.
///
/// The frontier advances only when completing the frontier project itself
/// and it is not the last one. Returns whether the project was new.
pub fn complete_locally(
    state: &mut ProgressState,
    index: usize,
    last_index: Option<usize>,
    policy: RepeatAward,
) -> bool {
    let already = state.is_completed(index);
    if already && policy == RepeatAward::Guarded {
        return false;
    }

    if !already {
        state.completed_projects.push(index);
    }
    state.points = state.points.saturating_add(COMPLETION_AWARD);
    if let Some(last) = last_index {
        if index == state.unlocked_index && state.unlocked_index < last {
            state.unlocked_index += 1;
        }
    }
    !already
}

/// In-memory mirror of the signed-in user's progress.
///
/// Exactly one tier backs it at a time: server responses, or the local cache
/// snapshot when the server could not be reached.
#[derive(Debug, Default)]
pub struct ProgressStore {
    state: ProgressState,
    source: ProgressSource,
    username: Option<String>,
    repeat_award: RepeatAward,
}

impl ProgressStore {
    pub fn new(repeat_award: RepeatAward) -> Self {
        Self {
            repeat_award,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn source(&self) -> ProgressSource {
        self.source
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn unlocked_index(&self) -> usize {
        self.state.unlocked_index
    }

    pub fn points(&self) -> u32 {
        self.state.points
    }

    /// Adopts a user response when it describes a signed-in user.
    pub fn apply_user(&mut self, user: &UserResponse) -> bool {
        if !user.logged_in {
            return false;
        }
        self.state = ProgressState {
            unlocked_index: user.unlocked_index,
            completed_projects: dedup(&user.completed_projects),
            points: user.points,
            task_completion: user.task_completion.clone(),
        };
        self.username = user.username.clone();
        self.source = ProgressSource::Server;
        true
    }

    pub fn adopt_local(&mut self, cache: &LocalCache) {
        self.state = cache.snapshot();
        self.source = ProgressSource::Local;
    }

    pub fn clear(&mut self) {
        self.state = ProgressState::default();
        self.username = None;
    }

    /// Refreshes from `/api/user`. Failures keep the current state.
    pub async fn load_from_server(&mut self, api: &ApiClient) -> bool {
        match api.get_as::<UserResponse>("/api/user").await {
            Ok(user) => {
                let adopted = self.apply_user(&user);
                if adopted {
                    info!(
                        unlocked = self.state.unlocked_index,
                        points = self.state.points,
                        "progress loaded from server"
                    );
                }
                adopted
            }
            Err(err) if err.is_transport() => {
                warn!("server unreachable, keeping current progress: {err}");
                false
            }
            Err(err) => {
                warn!(status = ?err.status, "loading user state failed: {err}");
                false
            }
        }
    }

    pub async fn complete_project(
        &mut self,
        api: &ApiClient,
        cache: &mut LocalCache,
        index: usize,
        last_index: Option<usize>,
    ) -> CompletionOutcome {
        let body = json!({ "project_index": index });
        match api
            .post_as::<CompleteResponse>("/api/user/progress/complete", Some(body))
            .await
        {
            Ok(response) => {
                if response.success {
                    self.state.unlocked_index = response.unlocked_index;
                    self.state.completed_projects = dedup(&response.completed_projects);
                    self.state.points = response.points;
                    self.source = ProgressSource::Server;
                    info!(project = index, "project completed on server");
                }
                CompletionOutcome::Server {
                    accepted: response.success,
                }
            }
            Err(err) => {
                warn!("completing project {index} on server failed, applying locally: {err}");
                let newly_completed =
                    complete_locally(&mut self.state, index, last_index, self.repeat_award);
                cache.store_progress(&self.state).await;
                self.source = ProgressSource::Local;
                CompletionOutcome::Local { newly_completed }
            }
        }
    }

    pub async fn toggle_task(
        &mut self,
        api: &ApiClient,
        cache: &mut LocalCache,
        project: usize,
        task: usize,
        checked: bool,
    ) -> ToggleOutcome {
        let body = json!({ "project_index": project, "task_index": task, "checked": checked });
        match api.post("/api/user/progress/task", Some(body)).await {
            Ok(_) => ToggleOutcome::Synced {
                refreshed: self.load_from_server(api).await,
            },
            Err(err) => {
                warn!("saving task {project}/{task} on server failed, saving locally: {err}");
                cache.set_task(project, task, checked).await;
                ToggleOutcome::Local
            }
        }
    }

    pub async fn reset(&mut self, api: &ApiClient, cache: &mut LocalCache) -> ResetOutcome {
        match api.post("/api/user/progress/reset", None).await {
            Ok(_) => {
                self.load_from_server(api).await;
                ResetOutcome::Server
            }
            Err(err) => {
                warn!("resetting progress on server failed, resetting locally: {err}");
                self.state = ProgressState::default();
                cache.reset().await;
                self.source = ProgressSource::Local;
                ResetOutcome::Local
            }
        }
    }
}

fn dedup(indices: &[usize]) -> Vec<usize> {
    let mut unique = Vec::with_capacity(indices.len());
    for index in indices {
        if !unique.contains(index) {
            unique.push(*index);
        }
    }
    unique
}
