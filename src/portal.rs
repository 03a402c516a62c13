use crate::api::ApiClient;
use crate::cache::LocalCache;
use crate::charts::ChartBoard;
use crate::chat::ChatWidget;
use crate::models::{Catalog, CatalogResponse, UserResponse};
use crate::progress::{CompletionOutcome, ProgressStore, RepeatAward, ToggleOutcome};
use crate::render::{Page, Renderer, Views};
use tracing::{info, warn};

pub const LOCKED_NOTICE: &str = "This project is locked. Complete the previous project to unlock it.";

/// Application state: the catalog, the progress mirror, the fallback cache,
/// the renderer and the chat box, created once at startup.
pub struct Portal {
    pub(crate) api: ApiClient,
    pub(crate) cache: LocalCache,
    pub(crate) catalog: Catalog,
    pub(crate) store: ProgressStore,
    pub(crate) renderer: Renderer,
    pub(crate) chat: ChatWidget,
    pub(crate) current_project: Option<usize>,
}

impl Portal {
    pub fn new(api: ApiClient, cache: LocalCache, repeat_award: RepeatAward) -> Self {
        Self {
            api,
            cache,
            catalog: Catalog::default(),
            store: ProgressStore::new(repeat_award),
            renderer: Renderer::default(),
            chat: ChatWidget::default(),
            current_project: None,
        }
    }

    pub fn views(&self) -> &Views {
        &self.renderer.views
    }

    pub fn board(&self) -> &ChartBoard {
        self.renderer.board()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn chat(&self) -> &ChatWidget {
        &self.chat
    }

    pub fn current_project(&self) -> Option<usize> {
        self.current_project
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        self.renderer.views.take_notices()
    }

    pub(crate) fn notify(&mut self, message: impl Into<String>) {
        self.renderer.views.notify(message);
    }

    /// Startup: catalog first, then whoever the session cookie says we are.
    pub async fn initialize(&mut self) {
        self.load_catalog().await;

        match self.api.get_as::<UserResponse>("/api/user").await {
            Ok(user) if self.store.apply_user(&user) => {
                info!("resuming signed-in session");
                self.refresh_views();
                self.renderer.show(Page::Portfolio);
                return;
            }
            Ok(_) => {}
            Err(err) => {
                warn!("could not fetch user (server may be offline), using local state: {err}");
                self.store.adopt_local(&self.cache);
            }
        }

        let state = self.store.state();
        self.renderer.update_points(state);
        self.renderer.show_badges(state);
        self.renderer.render_projects(&self.catalog, state, self.current_project);
        self.renderer.show(Page::Login);
    }

    pub async fn load_catalog(&mut self) {
        match self.api.get_as::<CatalogResponse>("/api/projects").await {
            Ok(response) => {
                if let Some(projects) = response.projects {
                    self.catalog.projects = projects;
                }
                if let Some(tasks) = response.project_tasks {
                    self.catalog.project_tasks = tasks;
                }
                info!(projects = self.catalog.len(), "catalog loaded");
                let state = self.store.state();
                self.renderer.render_projects(&self.catalog, state, self.current_project);
                self.renderer.render_research_charts(&self.catalog, state);
            }
            Err(err) => warn!("could not load projects from server, keeping current catalog: {err}"),
        }
    }

    /// Reloads progress from the server and re-renders on success.
    pub async fn load_user_state(&mut self) -> bool {
        let loaded = self.store.load_from_server(&self.api).await;
        if loaded {
            self.refresh_views();
        }
        loaded
    }

    pub(crate) fn refresh_views(&mut self) {
        self.renderer.set_user(self.store.username());
        self.renderer
            .render_all(&self.catalog, self.store.state(), self.current_project);
    }

    /// Opens the dashboard for one project.
    pub async fn select_project(&mut self, index: usize) {
        if self.catalog.project(index).is_none() {
            self.renderer.show(Page::Dashboard);
            self.renderer.render_dashboard(&self.catalog, index, &[]);
            self.current_project = None;
            return;
        }
        if !self.store.state().is_unlocked(index) {
            self.notify(LOCKED_NOTICE);
            return;
        }

        self.renderer.show(Page::Dashboard);
        match self.api.get_as::<UserResponse>("/api/user").await {
            Ok(user) => {
                let completion = user.task_completion.get(index).to_vec();
                self.current_project = Some(index);
                if self.store.apply_user(&user) {
                    self.refresh_views();
                }
                self.renderer.render_dashboard(&self.catalog, index, &completion);
                self.renderer.highlight_project(index);
                if !self.chat.is_visible() {
                    self.chat.open(&self.api).await;
                }
            }
            Err(err) => {
                warn!("could not fetch task completion for project {index}, using local copy: {err}");
                let completion = self.cache.project_tasks(index);
                self.renderer.render_dashboard(&self.catalog, index, &completion);
                self.current_project = Some(index);
                self.renderer.highlight_project(index);
            }
        }
    }

    /// Completes `index`, or the open project when none is given, then
    /// returns to the project list.
    pub async fn complete_project(&mut self, index: Option<usize>) {
        let Some(index) = index.or(self.current_project) else {
            self.notify("No project selected");
            return;
        };
        if self.catalog.project(index).is_none() {
            self.notify("Project not found");
            return;
        }
        if !self.store.state().is_unlocked(index) {
            self.notify(LOCKED_NOTICE);
            return;
        }

        let outcome = self
            .store
            .complete_project(&self.api, &mut self.cache, index, self.catalog.last_index())
            .await;
        match outcome {
            CompletionOutcome::Server { accepted: true } => {
                self.refresh_views();
                self.notify("Project completed! You earned 50 points and the next project unlocked.");
            }
            CompletionOutcome::Server { accepted: false } => {
                warn!(project = index, "server did not accept completion");
            }
            CompletionOutcome::Local { .. } => {
                self.refresh_views();
                self.notify("Project completed locally. Next project unlocked when server is available.");
            }
        }
        self.back_to_projects();
    }

    pub async fn toggle_task(&mut self, project: usize, task: usize, checked: bool) {
        if !self.store.state().is_unlocked(project) || task >= self.catalog.tasks(project).len() {
            self.notify("Task not found");
            return;
        }

        let outcome = self
            .store
            .toggle_task(&self.api, &mut self.cache, project, task, checked)
            .await;
        match outcome {
            ToggleOutcome::Synced { refreshed: true } => {
                let state = self.store.state();
                let completion = state.task_completion.get(project).to_vec();
                self.renderer.render_tasks(&self.catalog, project, &completion);
                self.renderer.render_task_chart(&self.catalog, project, &completion);
                self.renderer.render_mini_charts(&self.catalog, state);
                self.renderer.render_research_charts(&self.catalog, state);
            }
            ToggleOutcome::Synced { refreshed: false } => {
                let completion = self.cache.project_tasks(project);
                self.renderer.render_task_chart(&self.catalog, project, &completion);
                self.renderer
                    .render_research_charts(&self.catalog, self.store.state());
            }
            ToggleOutcome::Local => {
                let completion = self.cache.project_tasks(project);
                self.renderer.render_tasks(&self.catalog, project, &completion);
                self.renderer.render_task_chart(&self.catalog, project, &completion);
            }
        }
    }

    pub fn open_research(&mut self, index: usize) {
        if !self.renderer.open_research(&self.catalog, index) {
            self.notify("Project not found");
        }
    }

    pub fn close_research(&mut self) {
        self.renderer.close_research();
    }

    pub fn back_to_projects(&mut self) {
        self.renderer.show(Page::Projects);
        self.renderer
            .render_projects(&self.catalog, self.store.state(), self.current_project);
    }

    /// Plain show/hide navigation between pages.
    pub fn show_page(&mut self, page: Page) {
        match page {
            Page::Projects => self.back_to_projects(),
            other => self.renderer.show(other),
        }
    }

    pub async fn toggle_chat(&mut self) {
        self.chat.toggle(&self.api).await;
    }

    pub fn close_chat(&mut self) {
        self.chat.close();
    }

    pub async fn send_chat(&mut self, text: &str) {
        self.chat.send(&self.api, text).await;
    }
}
