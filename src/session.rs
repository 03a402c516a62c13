use crate::models::{LoginResponse, RegisterForm, RegisterResponse};
use crate::portal::Portal;
use crate::progress::ResetOutcome;
use crate::render::Page;
use serde_json::json;
use tracing::{info, warn};

impl Portal {
    /// Creates an account. Only emptiness is checked here; the server
    /// decides the rest.
    pub async fn register(&mut self, form: RegisterForm) {
        let form = RegisterForm {
            username: form.username.trim().to_string(),
            admission: form.admission.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.trim().to_string(),
        };
        if [&form.username, &form.admission, &form.email, &form.password]
            .iter()
            .any(|field| field.is_empty())
        {
            self.keep_register_form(&form);
            self.notify("Please fill all fields.");
            return;
        }

        let body = json!({
            "username": form.username,
            "admission": form.admission,
            "email": form.email,
            "password": form.password,
        });
        match self.api.post_as::<RegisterResponse>("/api/register", Some(body)).await {
            Ok(response) => {
                info!(username = %form.username, "account registered");
                self.renderer.views.register_form = RegisterForm::default();
                self.notify(
                    response
                        .message
                        .unwrap_or_else(|| "Account created successfully. Please log in.".to_string()),
                );
                self.renderer.show(Page::Login);
            }
            Err(err) => {
                self.keep_register_form(&form);
                self.notify(non_empty_or(err.message, "Could not register (server error)"));
            }
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) {
        let body = json!({ "username": username.trim(), "password": password.trim() });
        match self.api.post_as::<LoginResponse>("/api/login", Some(body)).await {
            Ok(response) if response.success => {
                info!(username = %username.trim(), "signed in");
                self.load_user_state().await;
                self.renderer.show(Page::Portfolio);
            }
            Ok(_) => self.notify("Login failed"),
            Err(err) => self.notify(non_empty_or(err.message, "Login failed")),
        }
    }

    /// Signs out. The server call is best effort; local state is cleared
    /// regardless.
    pub async fn logout(&mut self) {
        if let Err(err) = self.api.post("/api/logout", None).await {
            warn!("logout request failed: {err}");
        }
        self.store.clear();
        self.current_project = None;
        self.renderer.views.dashboard = None;
        self.refresh_views();
        self.renderer.show(Page::Login);
    }

    /// Resets all progress once the user has confirmed. Falls back to
    /// resetting the local cache when the server is unreachable.
    pub async fn reset_progress(&mut self, confirmed: bool) {
        if !confirmed {
            return;
        }
        match self.store.reset(&self.api, &mut self.cache).await {
            ResetOutcome::Server => {
                self.refresh_views();
                let completion = self
                    .current_project
                    .map(|project| self.store.state().task_completion.get(project).to_vec())
                    .unwrap_or_default();
                self.refresh_dashboard(completion);
                self.notify("Progress reset on server.");
            }
            ResetOutcome::Local => {
                self.refresh_views();
                let completion = self
                    .current_project
                    .map(|project| self.cache.project_tasks(project))
                    .unwrap_or_default();
                self.refresh_dashboard(completion);
                self.notify("Progress reset locally.");
            }
        }
    }

    fn refresh_dashboard(&mut self, completion: Vec<bool>) {
        if let Some(project) = self.current_project {
            self.renderer.render_tasks(&self.catalog, project, &completion);
            self.renderer.render_task_chart(&self.catalog, project, &completion);
        }
    }

    fn keep_register_form(&mut self, form: &RegisterForm) {
        self.renderer.views.register_form = RegisterForm {
            password: String::new(),
            ..form.clone()
        };
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
