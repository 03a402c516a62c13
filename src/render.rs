use crate::charts::{
    mini_chart_canvas, research_chart_canvas, ChartBoard, ChartHandle, ChartRegistry, ChartSpec,
    TASK_CHART_CANVAS,
};
use crate::models::{Catalog, ProgressState, RegisterForm, Resource};

pub const NO_TASKS_MESSAGE: &str = "No tasks defined for this project.";
pub const NO_RESOURCES_MESSAGE: &str = "No resources available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Login,
    Register,
    Portfolio,
    Projects,
    Dashboard,
}

impl Page {
    pub fn id(self) -> &'static str {
        match self {
            Page::Login => "login-page",
            Page::Register => "register-page",
            Page::Portfolio => "portfolio-page",
            Page::Projects => "projects-page",
            Page::Dashboard => "dashboard-page",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCard {
    pub index: usize,
    pub name: String,
    pub locked: bool,
    pub selected: bool,
    pub completed: bool,
    pub image: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub project: usize,
    pub task: usize,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskList {
    Placeholder,
    Rows(Vec<TaskRow>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dashboard {
    pub index: Option<usize>,
    pub title: String,
    pub description: String,
    pub image: String,
    pub tasks: Option<TaskList>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressBar {
    pub percent: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointsDisplay {
    pub points: u32,
    pub level: u32,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Beginner,
    Intermediate,
    Expert,
}

impl Badge {
    pub fn label(self) -> &'static str {
        match self {
            Badge::Beginner => "🏆 Beginner",
            Badge::Intermediate => "🎖 Intermediate",
            Badge::Expert => "🌟 Expert",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchCard {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchModal {
    pub title: String,
    pub resources: Vec<Resource>,
}

/// Everything the page shows, rebuilt by the render functions below.
#[derive(Debug, Default)]
pub struct Views {
    pub page: Page,
    pub user_label: String,
    pub project_cards: Vec<ProjectCard>,
    pub progress_bar: ProgressBar,
    pub points: PointsDisplay,
    pub badges: Vec<Badge>,
    pub research_cards: Vec<ResearchCard>,
    pub dashboard: Option<Dashboard>,
    pub research_modal: Option<ResearchModal>,
    pub register_form: RegisterForm,
    pub notices: Vec<String>,
}

impl Views {
    pub fn notify(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }
}

pub fn progress_percent(unlocked_index: usize, total_projects: usize) -> u32 {
    if total_projects == 0 {
        return 0;
    }
    let percent = ((unlocked_index + 1) as f64 / total_projects as f64 * 100.0).round() as u32;
    percent.min(100)
}

pub fn project_percent(catalog: &Catalog, progress: &ProgressState, index: usize) -> u32 {
    if progress.is_completed(index) {
        return 100;
    }
    let total = catalog.tasks(index).len();
    if total == 0 {
        return 0;
    }
    let done = progress
        .task_completion
        .get(index)
        .iter()
        .take(total)
        .filter(|done| **done)
        .count();
    (done as f64 / total as f64 * 100.0).round() as u32
}

pub fn level(points: u32) -> u32 {
    points / 100 + 1
}

pub fn badges(points: u32) -> Vec<Badge> {
    [(50, Badge::Beginner), (100, Badge::Intermediate), (200, Badge::Expert)]
        .into_iter()
        .filter(|(threshold, _)| points >= *threshold)
        .map(|(_, badge)| badge)
        .collect()
}

pub fn task_list(catalog: &Catalog, index: usize, completion: &[bool]) -> TaskList {
    let tasks = catalog.tasks(index);
    if tasks.is_empty() {
        return TaskList::Placeholder;
    }
    TaskList::Rows(
        tasks
            .iter()
            .enumerate()
            .map(|(task, label)| TaskRow {
                project: index,
                task,
                label: label.clone(),
                checked: completion.get(task).copied().unwrap_or(false),
            })
            .collect(),
    )
}

/// View renderer: owns the view output and every live chart instance.
///
/// Each render call is a full rebuild and may be repeated freely.
#[derive(Debug, Default)]
pub struct Renderer {
    pub views: Views,
    board: ChartBoard,
    task_chart: Option<ChartHandle>,
    mini_charts: ChartRegistry,
    research_charts: ChartRegistry,
}

impl Renderer {
    pub fn board(&self) -> &ChartBoard {
        &self.board
    }

    pub fn show(&mut self, page: Page) {
        self.views.page = page;
    }

    pub fn render_projects(&mut self, catalog: &Catalog, progress: &ProgressState, selected: Option<usize>) {
        self.views.project_cards = catalog
            .projects
            .iter()
            .enumerate()
            .map(|(index, project)| ProjectCard {
                index,
                name: project.name.clone(),
                locked: !progress.is_unlocked(index),
                selected: selected == Some(index),
                completed: progress.is_completed(index),
                image: project.image.clone(),
                description: project.description.clone(),
            })
            .collect();

        self.update_progress_bar(catalog, progress);
        self.render_mini_charts(catalog, progress);
    }

    pub fn highlight_project(&mut self, index: usize) {
        for card in &mut self.views.project_cards {
            card.selected = card.index == index;
        }
    }

    pub fn render_mini_charts(&mut self, catalog: &Catalog, progress: &ProgressState) {
        self.mini_charts.dispose(&mut self.board);
        // Locked cards have no canvas.
        for card in self.views.project_cards.iter().filter(|card| !card.locked) {
            let spec = ChartSpec::percent_doughnut(project_percent(catalog, progress, card.index));
            let handle = self.board.create(&mini_chart_canvas(card.index), spec);
            self.mini_charts.track(handle);
        }
    }

    pub fn render_research_charts(&mut self, catalog: &Catalog, progress: &ProgressState) {
        self.research_charts.dispose(&mut self.board);
        self.views.research_cards = catalog
            .projects
            .iter()
            .enumerate()
            .map(|(index, project)| ResearchCard {
                index,
                name: project.name.clone(),
            })
            .collect();

        for index in 0..catalog.len() {
            let spec = ChartSpec::percent_doughnut(project_percent(catalog, progress, index));
            let handle = self.board.create(&research_chart_canvas(index), spec);
            self.research_charts.track(handle);
        }
    }

    pub fn render_dashboard(&mut self, catalog: &Catalog, index: usize, completion: &[bool]) {
        let Some(project) = catalog.project(index) else {
            self.views.dashboard = Some(Dashboard {
                title: "Project not found".to_string(),
                ..Dashboard::default()
            });
            return;
        };
        self.views.dashboard = Some(Dashboard {
            index: Some(index),
            title: project.name.clone(),
            description: project.description.clone(),
            image: project.image.clone(),
            tasks: None,
        });
        self.render_tasks(catalog, index, completion);
        self.render_task_chart(catalog, index, completion);
    }

    pub fn render_tasks(&mut self, catalog: &Catalog, index: usize, completion: &[bool]) {
        if let Some(dashboard) = self.views.dashboard.as_mut() {
            if dashboard.index == Some(index) {
                dashboard.tasks = Some(task_list(catalog, index, completion));
            }
        }
    }

    pub fn render_task_chart(&mut self, catalog: &Catalog, index: usize, completion: &[bool]) {
        if let Some(previous) = self.task_chart.take() {
            self.board.destroy(&previous);
        }
        let tasks = catalog.tasks(index);
        if tasks.is_empty() {
            self.board.clear_canvas(TASK_CHART_CANVAS);
            return;
        }
        let handle = self
            .board
            .create(TASK_CHART_CANVAS, ChartSpec::task_bars(tasks, completion));
        self.task_chart = Some(handle);
    }

    pub fn update_progress_bar(&mut self, catalog: &Catalog, progress: &ProgressState) {
        let percent = progress_percent(progress.unlocked_index, catalog.len());
        self.views.progress_bar = ProgressBar {
            percent,
            label: format!("{percent}% Completed"),
        };
    }

    pub fn update_points(&mut self, progress: &ProgressState) {
        let points = progress.points;
        let level = level(points);
        self.views.points = PointsDisplay {
            points,
            level,
            label: format!("Points: {points} | Level: {level}"),
        };
    }

    pub fn show_badges(&mut self, progress: &ProgressState) {
        self.views.badges = badges(progress.points);
    }

    pub fn set_user(&mut self, username: Option<&str>) {
        self.views.user_label = username
            .map(|name| format!("Signed in as: {name}"))
            .unwrap_or_default();
    }

    pub fn open_research(&mut self, catalog: &Catalog, index: usize) -> bool {
        let Some(project) = catalog.project(index) else {
            return false;
        };
        self.views.research_modal = Some(ResearchModal {
            title: format!("Research: {}", project.name),
            resources: project.resources.clone(),
        });
        true
    }

    pub fn close_research(&mut self) {
        self.views.research_modal = None;
    }

    /// Re-renders every progress-derived view.
    pub fn render_all(&mut self, catalog: &Catalog, progress: &ProgressState, selected: Option<usize>) {
        self.update_points(progress);
        self.show_badges(progress);
        self.render_projects(catalog, progress, selected);
        self.render_research_charts(catalog, progress);
    }
}
