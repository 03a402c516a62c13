use crate::chat::format_time;
use crate::models::{ProgressSource, Speaker};
use crate::portal::Portal;
use crate::render::{
    Dashboard, Page, ProjectCard, ResearchModal, TaskList, Views, NO_RESOURCES_MESSAGE,
    NO_TASKS_MESSAGE,
};
use crate::charts::{mini_chart_canvas, research_chart_canvas, LiveChart, TASK_CHART_CANVAS};
use handlebars::html_escape;
use tracing::error;

pub fn render_page(portal: &Portal, notices: &[String]) -> String {
    let views = portal.views();
    let live: Vec<&LiveChart> = portal.board().live().collect();
    let charts = serde_json::to_string(&live).unwrap_or_else(|err| {
        error!("failed to serialize charts: {err}");
        "[]".to_string()
    });
    let cleared: Vec<&str> = [TASK_CHART_CANVAS]
        .into_iter()
        .filter(|canvas| portal.board().is_cleared(canvas))
        .collect();
    let offline = if portal.store().source() == ProgressSource::Local {
        r#"<p class="offline">Offline mode: showing progress saved on this device.</p>"#
    } else {
        ""
    };

    INDEX_HTML
        .replace("{{NOTICES}}", &render_notices(notices))
        .replace("{{OFFLINE}}", offline)
        .replace("{{USER}}", &html_escape(&views.user_label))
        .replace("{{POINTS}}", &html_escape(&views.points.label))
        .replace("{{BADGES}}", &render_badges(views))
        .replace("{{LOGIN_ACTIVE}}", active(views, Page::Login))
        .replace("{{REGISTER_ACTIVE}}", active(views, Page::Register))
        .replace("{{PORTFOLIO_ACTIVE}}", active(views, Page::Portfolio))
        .replace("{{PROJECTS_ACTIVE}}", active(views, Page::Projects))
        .replace("{{DASHBOARD_ACTIVE}}", active(views, Page::Dashboard))
        .replace("{{REG_USERNAME}}", &html_escape(&views.register_form.username))
        .replace("{{REG_ADMISSION}}", &html_escape(&views.register_form.admission))
        .replace("{{REG_EMAIL}}", &html_escape(&views.register_form.email))
        .replace("{{PROGRESS_PERCENT}}", &views.progress_bar.percent.to_string())
        .replace("{{PROGRESS_LABEL}}", &html_escape(&views.progress_bar.label))
        .replace("{{PROJECT_CARDS}}", &render_project_cards(&views.project_cards))
        .replace("{{RESEARCH_CARDS}}", &render_research_cards(views))
        .replace("{{DASHBOARD}}", &render_dashboard(views.dashboard.as_ref()))
        .replace("{{MODAL}}", &render_modal(views.research_modal.as_ref()))
        .replace("{{CHAT}}", &render_chat(portal))
        .replace("{{CLEARED}}", &script_json(&serde_json::to_string(&cleared).unwrap_or_default()))
        .replace("{{CHARTS}}", &script_json(&charts))
}

fn active(views: &Views, page: Page) -> &'static str {
    if views.page == page { "page active" } else { "page" }
}

fn render_notices(notices: &[String]) -> String {
    notices
        .iter()
        .map(|notice| format!(r#"<div class="notice" role="alert">{}</div>"#, html_escape(notice)))
        .collect()
}

fn render_badges(views: &Views) -> String {
    views
        .badges
        .iter()
        .map(|badge| format!(r#"<span class="badge">{}</span>"#, badge.label()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_project_cards(cards: &[ProjectCard]) -> String {
    cards.iter().map(render_project_card).collect()
}

fn render_project_card(card: &ProjectCard) -> String {
    let selected = if card.selected { " selected" } else { "" };
    if card.locked {
        return format!(
            r#"<div class="card locked{selected}" data-index="{index}"><h3>{name}</h3><p>🔒 Locked</p></div>"#,
            index = card.index,
            name = html_escape(&card.name),
        );
    }
    let check = if card.completed { " ✔" } else { "" };
    format!(
        r#"<div class="card{selected}" data-index="{index}">
  <div class="mini-chart" aria-hidden="true"><canvas id="{canvas}"></canvas></div>
  <img src="{image}" class="project-image" alt="">
  <h3>{name}{check}</h3>
  <p>{description}</p>
  <form method="post" action="/projects/{index}/open"><button class="btnn" type="submit">Open Project</button></form>
</div>"#,
        index = card.index,
        canvas = mini_chart_canvas(card.index),
        image = html_escape(&card.image),
        name = html_escape(&card.name),
        description = html_escape(&card.description),
    )
}

fn render_research_cards(views: &Views) -> String {
    views
        .research_cards
        .iter()
        .map(|card| {
            format!(
                r#"<div class="chart-card">
  <div class="chart-title">{name}</div>
  <canvas id="{canvas}" data-index="{index}"></canvas>
  <div class="chart-meta">
    <form method="post" action="/projects/{index}/research"><button class="research-btn" type="submit">Research</button></form>
    <form method="post" action="/projects/{index}/open"><button class="link-btn" type="submit">Open project</button></form>
  </div>
</div>"#,
                name = html_escape(&card.name),
                canvas = research_chart_canvas(card.index),
                index = card.index,
            )
        })
        .collect()
}

fn render_dashboard(dashboard: Option<&Dashboard>) -> String {
    let Some(dashboard) = dashboard else {
        return String::new();
    };
    let image = if dashboard.image.is_empty() {
        String::new()
    } else {
        format!(r#"<img src="{}" class="project-image" alt="">"#, html_escape(&dashboard.image))
    };
    let tasks = match &dashboard.tasks {
        None => String::new(),
        Some(TaskList::Placeholder) => format!(r#"<div class="empty">{NO_TASKS_MESSAGE}</div>"#),
        Some(TaskList::Rows(rows)) => rows
            .iter()
            .map(|row| {
                format!(
                    r#"<form method="post" action="/tasks/toggle" class="task">
  <input type="hidden" name="project_index" value="{project}">
  <input type="hidden" name="task_index" value="{task}">
  <input type="checkbox" name="checked" id="task-{project}-{task}"{checked} onchange="this.form.submit()">
  <label for="task-{project}-{task}">{label}</label>
</form>"#,
                    project = row.project,
                    task = row.task,
                    checked = if row.checked { " checked" } else { "" },
                    label = html_escape(&row.label),
                )
            })
            .collect(),
    };
    let complete = match dashboard.index {
        Some(index) => format!(
            r#"<form method="post" action="/projects/complete"><input type="hidden" name="project_index" value="{index}"><button class="btnn" type="submit">Mark Project Complete</button></form>"#
        ),
        None => String::new(),
    };
    format!(
        r#"<h2 id="project-title">{title}</h2>
<p id="project-description">{description}</p>
<div id="project-image">{image}</div>
<div id="task-list">{tasks}</div>
<div class="bar-chart"><canvas id="{TASK_CHART_CANVAS}"></canvas></div>
{complete}"#,
        title = html_escape(&dashboard.title),
        description = html_escape(&dashboard.description),
    )
}

fn render_modal(modal: Option<&ResearchModal>) -> String {
    let Some(modal) = modal else {
        return String::new();
    };
    let resources: String = if modal.resources.is_empty() {
        format!(r#"<div class="resource-item">{NO_RESOURCES_MESSAGE}</div>"#)
    } else {
        modal
            .resources
            .iter()
            .map(|resource| {
                format!(
                    r#"<div class="resource-item"><a href="{url}" target="_blank" rel="noopener noreferrer">{label}</a></div>"#,
                    url = html_escape(&resource.url),
                    label = html_escape(&resource.label),
                )
            })
            .collect()
    };
    format!(
        r#"<div id="research-modal" class="modal" aria-hidden="false">
  <div class="modal-body">
    <h3 id="modal-project-title">{title}</h3>
    <div id="modal-resources">{resources}</div>
    <form method="post" action="/research/close"><button class="modal-close" type="submit">Close</button></form>
  </div>
</div>"#,
        title = html_escape(&modal.title),
    )
}

fn render_chat(portal: &Portal) -> String {
    let chat = portal.chat();
    let hidden = if chat.is_visible() { "" } else { " hidden" };
    let messages: String = chat
        .log()
        .iter()
        .map(|message| {
            let who = match message.who {
                Speaker::User => "user",
                Speaker::Bot => "bot",
            };
            format!(
                r#"<div class="chat-msg {who}"><div class="chat-text">{text}</div><div class="chat-meta">{time}</div></div>"#,
                text = html_escape(&message.text),
                time = html_escape(&format_time(&message.time)),
            )
        })
        .collect();
    format!(
        r#"<div id="chatbox" class="chatbox{hidden}">
  <form method="post" action="/chat/toggle" class="chatbox-header"><button type="submit">Chat</button></form>
  <form method="post" action="/chat/close" class="chatbox-close"><button type="submit" aria-label="Close chat">×</button></form>
  <div id="chat-messages">{messages}</div>
  <form method="post" action="/chat/send" class="chat-input">
    <input id="chat-input" name="message" autocomplete="off">
    <button id="chat-send" type="submit">Send</button>
  </form>
</div>"#
    )
}

// Keeps `</script>` out of inline JSON.
fn script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Learning Portal</title>
  <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
  <style>
    :root {
      --ink: #1f2a44;
      --accent: #2a5298;
      --muted: #e6e6e6;
      --card: #ffffff;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      font-family: "Segoe UI", sans-serif;
      background: linear-gradient(135deg, #eef2fb, #f9fbff);
      color: var(--ink);
    }

    header.top {
      display: flex;
      flex-wrap: wrap;
      gap: 16px;
      align-items: center;
      justify-content: space-between;
      padding: 16px 28px;
      background: var(--accent);
      color: white;
    }

    header.top nav {
      display: flex;
      gap: 8px;
    }

    .page {
      display: none;
      padding: 24px 28px;
    }

    .page.active {
      display: block;
    }

    .notice {
      margin: 12px 28px 0;
      padding: 12px 16px;
      border-radius: 12px;
      background: #fff4d6;
      border: 1px solid #f0d48a;
    }

    .offline {
      margin: 12px 28px 0;
      color: #8a5a00;
    }

    .badge {
      background: white;
      color: var(--accent);
      border-radius: 999px;
      padding: 4px 10px;
      font-weight: 600;
    }

    #projects-container,
    #research-charts {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(220px, 1fr));
      gap: 16px;
    }

    .card,
    .chart-card {
      position: relative;
      background: var(--card);
      border-radius: 16px;
      padding: 16px;
      box-shadow: 0 10px 24px rgba(42, 82, 152, 0.12);
    }

    .card.locked {
      opacity: 0.55;
    }

    .card.selected {
      outline: 3px solid var(--accent);
    }

    .mini-chart {
      position: absolute;
      top: 12px;
      right: 12px;
      width: 56px;
      height: 56px;
    }

    .chart-card canvas {
      height: 140px !important;
    }

    .project-image {
      max-width: 100%;
      border-radius: 12px;
    }

    .progress {
      height: 14px;
      background: var(--muted);
      border-radius: 999px;
      overflow: hidden;
    }

    #progress-fill {
      height: 100%;
      background: var(--accent);
    }

    .btnn,
    button {
      border: none;
      border-radius: 999px;
      padding: 8px 16px;
      background: var(--accent);
      color: white;
      font-weight: 600;
      cursor: pointer;
    }

    .task {
      display: flex;
      gap: 8px;
      padding: 6px 0;
    }

    .empty,
    .resource-item {
      padding: 8px 0;
    }

    .modal {
      position: fixed;
      inset: 0;
      display: grid;
      place-items: center;
      background: rgba(0, 0, 0, 0.35);
    }

    .modal-body {
      background: white;
      border-radius: 16px;
      padding: 24px;
      min-width: 320px;
    }

    .chatbox {
      position: fixed;
      right: 20px;
      bottom: 20px;
      width: 320px;
      background: white;
      border-radius: 16px;
      box-shadow: 0 16px 40px rgba(0, 0, 0, 0.2);
    }

    .chatbox.hidden #chat-messages,
    .chatbox.hidden .chat-input,
    .chatbox.hidden .chatbox-close {
      display: none;
    }

    #chat-messages {
      max-height: 280px;
      overflow-y: auto;
      padding: 8px 12px;
    }

    .chat-msg.user {
      text-align: right;
    }

    .chat-meta {
      font-size: 0.75rem;
      color: #777;
    }
  </style>
</head>
<body>
  <header class="top">
    <div>
      <strong>Learning Portal</strong>
      <div id="user-info">{{USER}}</div>
    </div>
    <div id="points-display">{{POINTS}}</div>
    <div id="badges-display">{{BADGES}}</div>
    <nav>
      <form method="post" action="/show/portfolio"><button type="submit">Portfolio</button></form>
      <form method="post" action="/show/projects"><button type="submit">Projects</button></form>
      <form method="post" action="/progress/reset" onsubmit="return confirm('Reset all progress?')">
        <input type="hidden" name="confirm" value="yes">
        <button type="submit">Reset</button>
      </form>
      <form method="post" action="/logout"><button type="submit">Log out</button></form>
    </nav>
  </header>

  {{NOTICES}}
  {{OFFLINE}}

  <section id="login-page" class="{{LOGIN_ACTIVE}}">
    <h2>Sign in</h2>
    <form method="post" action="/login">
      <input id="login-username" name="username" placeholder="Username">
      <input id="login-password" name="password" type="password" placeholder="Password">
      <button type="submit">Log in</button>
    </form>
    <form method="post" action="/show/register"><button type="submit">Create an account</button></form>
  </section>

  <section id="register-page" class="{{REGISTER_ACTIVE}}">
    <h2>Register</h2>
    <form method="post" action="/register">
      <input id="reg-username" name="username" placeholder="Username" value="{{REG_USERNAME}}">
      <input id="reg-admission" name="admission" placeholder="Admission number" value="{{REG_ADMISSION}}">
      <input id="reg-email" name="email" type="email" placeholder="Email" value="{{REG_EMAIL}}">
      <input id="reg-password" name="password" type="password" placeholder="Password">
      <button type="submit">Register</button>
    </form>
    <form method="post" action="/show/login"><button type="submit">Back to sign in</button></form>
  </section>

  <section id="portfolio-page" class="{{PORTFOLIO_ACTIVE}}">
    <h2>Your research</h2>
    <div id="research-charts">{{RESEARCH_CARDS}}</div>
  </section>

  <section id="projects-page" class="{{PROJECTS_ACTIVE}}">
    <h2>Projects</h2>
    <div class="progress"><div id="progress-fill" style="width: {{PROGRESS_PERCENT}}%"></div></div>
    <p id="progress-text">{{PROGRESS_LABEL}}</p>
    <div id="projects-container">{{PROJECT_CARDS}}</div>
  </section>

  <section id="dashboard-page" class="{{DASHBOARD_ACTIVE}}">
    <form method="post" action="/show/projects"><button type="submit">Back to projects</button></form>
    {{DASHBOARD}}
  </section>

  {{MODAL}}
  {{CHAT}}

  <script>
    const liveCharts = {{CHARTS}};
    const clearedCanvases = {{CLEARED}};

    const centerText = {
      id: 'centerTextPlugin',
      beforeDraw(chart) {
        const cfg = chart.config.options.plugins && chart.config.options.plugins.centerText;
        if (!cfg || !cfg.display) {
          return;
        }
        const { ctx, width, height } = chart;
        ctx.save();
        ctx.font = `700 ${cfg.fontSize || Math.floor(Math.min(width, height) / 6)}px Segoe UI`;
        ctx.fillStyle = '#2a5298';
        ctx.textAlign = 'center';
        ctx.textBaseline = 'middle';
        ctx.fillText(cfg.text, width / 2, height / 2);
        ctx.restore();
      }
    };

    const chartConfig = (live) => {
      if (live.spec.kind === 'bar') {
        return {
          type: 'bar',
          data: {
            labels: live.spec.labels,
            datasets: [{ label: 'Completion %', data: live.spec.data, backgroundColor: 'rgba(42,82,152,0.6)' }]
          },
          options: { responsive: true, scales: { y: { beginAtZero: true, max: 100 } } }
        };
      }
      const mini = live.canvas.startsWith('project-mini-chart-');
      return {
        type: 'doughnut',
        data: {
          labels: live.spec.labels,
          datasets: [{ data: live.spec.data, backgroundColor: ['#2a5298', '#e6e6e6'] }]
        },
        options: {
          responsive: true,
          maintainAspectRatio: false,
          plugins: {
            legend: { display: false },
            tooltip: { enabled: !mini },
            centerText: { display: true, text: live.spec.center_text, fontSize: mini ? 12 : 14 }
          }
        }
      };
    };

    if (typeof Chart !== 'undefined') {
      Chart.register(centerText);
      liveCharts.forEach((live) => {
        const canvas = document.getElementById(live.canvas);
        if (canvas) {
          new Chart(canvas.getContext('2d'), chartConfig(live));
        }
      });
    }

    clearedCanvases.forEach((id) => {
      const canvas = document.getElementById(id);
      if (canvas) {
        canvas.getContext('2d').clearRect(0, 0, canvas.width, canvas.height);
      }
    });

    const chatMessages = document.getElementById('chat-messages');
    if (chatMessages) {
      chatMessages.scrollTop = chatMessages.scrollHeight;
    }
  </script>
</body>
</html>
"#;
