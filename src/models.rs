use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Resource {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Project {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// Ordered project catalog. A project's position is its identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub projects: Vec<Project>,
    pub project_tasks: Vec<Vec<String>>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn project(&self, index: usize) -> Option<&Project> {
        self.projects.get(index)
    }

    pub fn tasks(&self, index: usize) -> &[String] {
        self.project_tasks
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.projects.len().checked_sub(1)
    }
}

/// Per-project task completion keyed by the project index as a string.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(transparent)]
pub struct TaskCompletion(
    #[serde(deserialize_with = "deserialize_sparse")] BTreeMap<String, Vec<bool>>,
);

impl TaskCompletion {
    pub fn get(&self, project: usize) -> &[bool] {
        self.0
            .get(&project.to_string())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_done(&self, project: usize, task: usize) -> bool {
        self.get(project).get(task).copied().unwrap_or(false)
    }

    pub fn done_count(&self, project: usize) -> usize {
        self.get(project).iter().filter(|done| **done).count()
    }

    pub fn set(&mut self, project: usize, task: usize, checked: bool) {
        let entry = self.0.entry(project.to_string()).or_default();
        if entry.len() <= task {
            entry.resize(task + 1, false);
        }
        entry[task] = checked;
    }
}

// Browsers serialise array holes as null.
fn deserialize_sparse<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<Vec<Option<bool>>>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, values)| {
            let values = values
                .unwrap_or_default()
                .into_iter()
                .map(|value| value.unwrap_or(false))
                .collect();
            (key, values)
        })
        .collect())
}

// Servers send null where a field has no value yet.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressSource {
    #[default]
    Server,
    Local,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
    pub unlocked_index: usize,
    pub completed_projects: Vec<usize>,
    pub points: u32,
    pub task_completion: TaskCompletion,
}

impl ProgressState {
    pub fn is_unlocked(&self, index: usize) -> bool {
        index <= self.unlocked_index
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed_projects.contains(&index)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub who: Speaker,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct CatalogResponse {
    #[serde(default)]
    pub projects: Option<Vec<Project>>,
    #[serde(default)]
    pub project_tasks: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UserResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub logged_in: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unlocked_index: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_projects: Vec<usize>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub points: u32,
    #[serde(default)]
    pub task_completion: TaskCompletion,
}

#[derive(Debug, Deserialize, Default)]
pub struct CompleteResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unlocked_index: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_projects: Vec<usize>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub points: u32,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ChatReply {
    Message { text: String },
    Text(String),
}

impl ChatReply {
    pub fn text(&self) -> &str {
        match self {
            ChatReply::Message { text } => text,
            ChatReply::Text(text) => text,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ChatResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub history: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub reply: Option<ChatReply>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub admission: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleTaskForm {
    pub project_index: usize,
    pub task_index: usize,
    #[serde(default)]
    pub checked: Option<String>,
}

impl ToggleTaskForm {
    pub fn is_checked(&self) -> bool {
        matches!(self.checked.as_deref(), Some("on" | "true" | "1"))
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct CompleteForm {
    #[serde(default)]
    pub project_index: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ResetForm {
    #[serde(default)]
    pub confirm: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_completion_reads_missing_keys_as_empty() {
        let completion = TaskCompletion::default();
        assert!(completion.get(3).is_empty());
        assert!(!completion.is_done(3, 0));
        assert_eq!(completion.done_count(3), 0);
    }

    #[test]
    fn task_completion_pads_when_setting_past_the_end() {
        let mut completion = TaskCompletion::default();
        completion.set(1, 3, true);
        assert_eq!(completion.get(1), &[false, false, false, true]);
        completion.set(1, 0, true);
        assert_eq!(completion.done_count(1), 2);
    }

    #[test]
    fn task_completion_accepts_sparse_arrays() {
        let completion: TaskCompletion =
            serde_json::from_str(r#"{"0":[true,null,true],"2":null}"#).unwrap();
        assert_eq!(completion.get(0), &[true, false, true]);
        assert!(completion.get(2).is_empty());
    }

    #[test]
    fn null_progress_fields_read_as_defaults() {
        let user: UserResponse = serde_json::from_value(serde_json::json!({
            "logged_in": true,
            "username": "ada",
            "unlocked_index": null,
            "completed_projects": null,
            "points": null,
            "task_completion": null,
        }))
        .unwrap();
        assert!(user.logged_in);
        assert_eq!(user.unlocked_index, 0);
        assert!(user.completed_projects.is_empty());
        assert_eq!(user.points, 0);
        assert!(user.task_completion.get(0).is_empty());

        let complete: CompleteResponse = serde_json::from_value(serde_json::json!({
            "success": true,
            "unlocked_index": 1,
            "completed_projects": null,
            "points": null,
        }))
        .unwrap();
        assert!(complete.success);
        assert_eq!(complete.unlocked_index, 1);
        assert!(complete.completed_projects.is_empty());
        assert_eq!(complete.points, 0);
    }

    #[test]
    fn chat_reply_accepts_object_or_string() {
        let object: ChatReply = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        let bare: ChatReply = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(object.text(), "hi");
        assert_eq!(bare.text(), "hello");
    }

    #[test]
    fn catalog_tasks_default_to_empty() {
        let catalog = Catalog {
            projects: vec![Project::default()],
            project_tasks: vec![],
        };
        assert!(catalog.tasks(0).is_empty());
        assert_eq!(catalog.last_index(), Some(0));
        assert_eq!(Catalog::default().last_index(), None);
    }
}
