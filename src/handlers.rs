use crate::chat::MAX_MESSAGE_CHARS;
use crate::errors::AppError;
use crate::models::{ChatForm, CompleteForm, LoginForm, RegisterForm, ResetForm, ToggleTaskForm};
use crate::render::Page;
use crate::state::AppState;
use crate::ui::render_page;
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Form,
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let mut portal = state.portal.lock().await;
    let notices = portal.take_notices();
    Html(render_page(&portal, &notices))
}

pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Redirect {
    state.portal.lock().await.register(form).await;
    Redirect::to("/")
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Redirect {
    state
        .portal
        .lock()
        .await
        .login(&form.username, &form.password)
        .await;
    Redirect::to("/")
}

pub async fn logout(State(state): State<AppState>) -> Redirect {
    state.portal.lock().await.logout().await;
    Redirect::to("/")
}

pub async fn reset_progress(State(state): State<AppState>, Form(form): Form<ResetForm>) -> Redirect {
    let confirmed = form.confirm.as_deref() == Some("yes");
    state.portal.lock().await.reset_progress(confirmed).await;
    Redirect::to("/")
}

pub async fn complete_project(
    State(state): State<AppState>,
    Form(form): Form<CompleteForm>,
) -> Redirect {
    state
        .portal
        .lock()
        .await
        .complete_project(form.project_index)
        .await;
    Redirect::to("/")
}

pub async fn open_project(State(state): State<AppState>, Path(index): Path<usize>) -> Redirect {
    state.portal.lock().await.select_project(index).await;
    Redirect::to("/")
}

pub async fn open_research(State(state): State<AppState>, Path(index): Path<usize>) -> Redirect {
    state.portal.lock().await.open_research(index);
    Redirect::to("/")
}

pub async fn close_research(State(state): State<AppState>) -> Redirect {
    state.portal.lock().await.close_research();
    Redirect::to("/")
}

pub async fn toggle_task(State(state): State<AppState>, Form(form): Form<ToggleTaskForm>) -> Redirect {
    let checked = form.is_checked();
    state
        .portal
        .lock()
        .await
        .toggle_task(form.project_index, form.task_index, checked)
        .await;
    Redirect::to("/")
}

pub async fn show_page(State(state): State<AppState>, Path(page): Path<String>) -> Result<Redirect, AppError> {
    let page = match page.as_str() {
        "login" => Page::Login,
        "register" => Page::Register,
        "portfolio" => Page::Portfolio,
        "projects" => Page::Projects,
        other => return Err(AppError::not_found(format!("unknown page '{other}'"))),
    };
    state.portal.lock().await.show_page(page);
    Ok(Redirect::to("/"))
}

pub async fn toggle_chat(State(state): State<AppState>) -> Redirect {
    state.portal.lock().await.toggle_chat().await;
    Redirect::to("/")
}

pub async fn close_chat(State(state): State<AppState>) -> Redirect {
    state.portal.lock().await.close_chat();
    Redirect::to("/")
}

pub async fn send_chat(State(state): State<AppState>, Form(form): Form<ChatForm>) -> Result<Redirect, AppError> {
    if form.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::bad_request("message is too long"));
    }
    state.portal.lock().await.send_chat(&form.message).await;
    Ok(Redirect::to("/"))
}
