use maud::{DOCTYPE, Markup, PreEscaped, html};

use super::handlers::urlencoded;
use crate::{
    auth::{Role, Session},
    dashboard::DashboardSummary,
    intake::CandidateForm,
    store::{Candidate, resume_file_name},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Info,
}

impl NoticeKind {
    fn class(self) -> &'static str {
        match self {
            NoticeKind::Success => "notice notice-success",
            NoticeKind::Warning => "notice notice-warning",
            NoticeKind::Info => "notice notice-info",
        }
    }
}

/// An inline status message shown above a page's content.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }
}

/// Pages reachable from the sidebar once logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Chat,
    Screening,
    Candidates,
    Profile,
}

impl Page {
    pub fn href(self) -> &'static str {
        match self {
            Page::Dashboard => "/dashboard",
            Page::Chat => "/chat",
            Page::Screening => "/screening",
            Page::Candidates => "/candidates",
            Page::Profile => "/profile",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Chat => "Chatbot",
            Page::Screening => "Candidate Screening",
            Page::Candidates => "Stored Candidates",
            Page::Profile => "Profile",
        }
    }

    /// Sidebar entries for a role; the first is the landing page.
    pub fn for_role(role: Role) -> &'static [Page] {
        match role {
            Role::Admin => &[
                Page::Dashboard,
                Page::Chat,
                Page::Screening,
                Page::Candidates,
                Page::Profile,
            ],
            Role::User => &[Page::Chat, Page::Screening, Page::Profile],
        }
    }
}

// ── Page shells ────────────────────────────────────────────────────────────────

fn document(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " — TalentScout Hiring Assistant" }
                style { (PreEscaped(BASE_CSS)) }
            }
            body {
                div class="layout" { (body) }
            }
        }
    }
}

fn app_page(session: &Session, active: Page, title: &str, content: Markup) -> Markup {
    document(
        title,
        html! {
            aside class="sidebar" {
                div class="brand" { "TalentScout" span { " Assistant" } }
                nav {
                    ul {
                        @for page in Page::for_role(session.role()) {
                            li class=(if *page == active { "active" } else { "" }) {
                                a href=(page.href()) { (page.label()) }
                            }
                        }
                    }
                }
                form method="post" action="/logout" {
                    button type="submit" class="btn-secondary" { "Logout" }
                }
            }
            main class="main-content" {
                h1 { (title) }
                (content)
            }
        },
    )
}

fn public_page(title: &str, active: &str, content: Markup) -> Markup {
    document(
        title,
        html! {
            aside class="sidebar" {
                div class="brand" { "Login & Sign Up" }
                nav {
                    ul {
                        li class=(if active == "login" { "active" } else { "" }) {
                            a href="/login" { "Login" }
                        }
                        li class=(if active == "signup" { "active" } else { "" }) {
                            a href="/signup" { "Sign Up" }
                        }
                    }
                }
            }
            main class="main-content" {
                h1 { (title) }
                (content)
            }
        },
    )
}

fn notices(items: &[Notice]) -> Markup {
    html! {
        @for notice in items {
            p class=(notice.kind.class()) { (notice.text) }
        }
    }
}

// ── Login / signup ─────────────────────────────────────────────────────────────

pub fn login_page(items: &[Notice]) -> Markup {
    public_page(
        "Login",
        "login",
        html! {
            (notices(items))
            form method="post" action="/login" class="card" {
                div class="form-group" {
                    label for="username" { "Enter Username" }
                    input type="text" id="username" name="username"
                        autocomplete="username" autofocus required;
                }
                div class="form-group" {
                    label for="password" { "Enter Password" }
                    input type="password" id="password" name="password"
                        autocomplete="current-password" required;
                }
                button type="submit" { "Login" }
            }
        },
    )
}

pub fn signup_page(items: &[Notice]) -> Markup {
    public_page(
        "Sign Up",
        "signup",
        html! {
            (notices(items))
            form method="post" action="/signup" class="card" {
                div class="form-group" {
                    label for="username" { "Enter Username" }
                    input type="text" id="username" name="username"
                        autocomplete="username" autofocus required;
                }
                div class="form-group" {
                    label for="password" { "Enter Password" }
                    input type="password" id="password" name="password"
                        autocomplete="new-password" required;
                }
                div class="form-group checkbox" {
                    input type="checkbox" id="apply_admin" name="apply_admin";
                    label for="apply_admin" { "Apply for Admin Access" }
                }
                div class="form-group" {
                    label for="passkey" { "Enter 8-digit Admin Passkey" }
                    input type="password" id="passkey" name="passkey" autocomplete="off";
                }
                button type="submit" { "Register" }
            }
        },
    )
}

// ── Chat ───────────────────────────────────────────────────────────────────────

pub fn chat_page(session: &Session, query: Option<&str>, answer_html: Option<&str>) -> Markup {
    app_page(
        session,
        Page::Chat,
        "AI Hiring Assistant",
        html! {
            form method="post" action="/chat" class="card" {
                div class="form-group" {
                    label for="query" { "Type your question here..." }
                    input type="text" id="query" name="query" value=(query.unwrap_or("")) autofocus;
                }
                button type="submit" { "Ask" }
            }
            @if let Some(answer) = answer_html {
                section class="card answer" {
                    h2 { "Response" }
                    div class="markdown" { (PreEscaped(answer)) }
                }
            }
        },
    )
}

// ── Candidate screening ────────────────────────────────────────────────────────

pub fn screening_page(session: &Session, form: &CandidateForm, items: &[Notice]) -> Markup {
    let fields: [(&str, &str, &str); 6] = [
        ("full_name", "Full Name", &form.full_name),
        ("email", "Email", &form.email),
        ("phone", "Phone Number", &form.phone),
        ("experience", "Years of Experience", &form.experience),
        ("position", "Applied Position", &form.position),
        ("location", "Current Location", &form.location),
    ];

    app_page(
        session,
        Page::Screening,
        "Candidate Screening Form",
        html! {
            (notices(items))
            form method="post" action="/screening" enctype="multipart/form-data" class="card" {
                @for (name, label, value) in fields {
                    div class="form-group" {
                        label for=(name) { (label) }
                        input type="text" id=(name) name=(name) value=(value);
                    }
                }
                div class="form-group" {
                    label for="tech_stack" { "Technology Stack (Comma-Separated)" }
                    textarea id="tech_stack" name="tech_stack" rows="3" { (form.tech_stack) }
                }
                div class="form-group" {
                    label for="resume" { "Upload Resume (PDF or DOCX)" }
                    input type="file" id="resume" name="resume" accept=".pdf,.docx";
                }
                button type="submit" { "Submit" }
            }
        },
    )
}

// ── Profile ────────────────────────────────────────────────────────────────────

pub fn profile_page(session: &Session) -> Markup {
    app_page(
        session,
        Page::Profile,
        "User Profile",
        html! {
            div class="card" {
                p { strong { "Username: " } (session.username) }
                p { strong { "Role: " } (session.role()) }
            }
        },
    )
}

// ── Admin ──────────────────────────────────────────────────────────────────────

pub fn dashboard_page(session: &Session, summary: &DashboardSummary) -> Markup {
    app_page(
        session,
        Page::Dashboard,
        "Admin Dashboard",
        html! {
            div class="metrics" {
                div class="metric" {
                    div class="metric-label" { "Total Logins" }
                    div class="metric-value" { (summary.login_count) }
                }
                div class="metric" {
                    div class="metric-label" { "Total Candidates" }
                    div class="metric-value" { (summary.candidate_count) }
                }
            }
            hr;
            h2 { "Recent Candidates" }
            @if summary.recent_candidates.is_empty() {
                (notices(&[Notice::warning("No candidates have applied yet.")]))
            } @else {
                (candidate_table(&summary.recent_candidates))
            }
        },
    )
}

pub fn candidates_page(session: &Session, candidates: &[Candidate]) -> Markup {
    app_page(
        session,
        Page::Candidates,
        "Stored Candidate Information",
        html! {
            @if candidates.is_empty() {
                (notices(&[Notice::warning("No candidates found.")]))
            } @else {
                (candidate_table(candidates))
            }
        },
    )
}

fn candidate_table(candidates: &[Candidate]) -> Markup {
    html! {
        div class="table-wrap" {
            table {
                thead {
                    tr {
                        th { "Full Name" }
                        th { "Email" }
                        th { "Phone" }
                        th { "Experience" }
                        th { "Position" }
                        th { "Location" }
                        th { "Tech Stack" }
                        th { "Resume" }
                    }
                }
                tbody {
                    @for c in candidates {
                        tr {
                            td { (c.full_name) }
                            td { (c.email) }
                            td { (c.phone) }
                            td { (c.experience) }
                            td { (c.position) }
                            td { (c.location) }
                            td { (c.tech_stack) }
                            td {
                                @if let Some(name) = c.resume_path.as_deref().and_then(resume_file_name) {
                                    a href=(format!("/candidates/resume?name={}", urlencoded(name))) { (name) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

// ── CSS ────────────────────────────────────────────────────────────────────────

const BASE_CSS: &str = r#"
*, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }

:root {
  --bg:        #f7f8fa;
  --surface:   #ffffff;
  --border:    #dde1e8;
  --text:      #1f2430;
  --muted:     #6b7285;
  --accent:    #4caf50;
  --accent-hi: #43a047;
  --warning:   #b7791f;
  --warning-bg:#fff8e6;
  --success-bg:#e9f7ef;
  --info-bg:   #eaf2fd;
  --sidebar-w: 240px;
}

body {
  font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
  background: var(--bg);
  color: var(--text);
}

.layout { display: flex; min-height: 100vh; }

.sidebar {
  width: var(--sidebar-w);
  flex-shrink: 0;
  background: var(--surface);
  border-right: 1px solid var(--border);
  padding: 24px 16px;
  display: flex;
  flex-direction: column;
  gap: 24px;
}
.brand { font-size: 20px; font-weight: 700; }
.brand span { color: var(--muted); font-weight: 400; }
.sidebar ul { list-style: none; display: flex; flex-direction: column; gap: 4px; }
.sidebar li a {
  display: block;
  padding: 8px 12px;
  border-radius: 6px;
  color: var(--text);
  text-decoration: none;
}
.sidebar li.active a, .sidebar li a:hover { background: var(--success-bg); }

.main-content { flex: 1; padding: 32px 40px; max-width: 1100px; }
h1 { font-size: 26px; margin-bottom: 20px; }
h2 { font-size: 18px; margin: 16px 0 10px; }
hr { border: none; border-top: 1px solid var(--border); margin: 24px 0; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: 8px;
  padding: 20px;
  margin-bottom: 20px;
}

.form-group { display: flex; flex-direction: column; gap: 6px; margin-bottom: 14px; }
.form-group.checkbox { flex-direction: row; align-items: center; }
label { font-size: 14px; color: var(--muted); }
input[type=text], input[type=password], textarea {
  padding: 8px 10px;
  border: 1px solid var(--border);
  border-radius: 6px;
  font: inherit;
}

button {
  background: var(--accent);
  color: white;
  border: none;
  border-radius: 6px;
  padding: 8px 18px;
  font: inherit;
  cursor: pointer;
}
button:hover { background: var(--accent-hi); }
.btn-secondary { background: transparent; color: var(--muted); border: 1px solid var(--border); }
.btn-secondary:hover { background: var(--bg); }

.notice { padding: 10px 14px; border-radius: 6px; margin-bottom: 12px; }
.notice-success { background: var(--success-bg); }
.notice-warning { background: var(--warning-bg); color: var(--warning); }
.notice-info    { background: var(--info-bg); }

.metrics { display: flex; gap: 20px; }
.metric {
  flex: 1;
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: 8px;
  padding: 16px 20px;
}
.metric-label { color: var(--muted); font-size: 14px; }
.metric-value { font-size: 32px; font-weight: 700; }

.table-wrap { overflow-x: auto; }
table { border-collapse: collapse; width: 100%; background: var(--surface); }
th, td { text-align: left; padding: 8px 10px; border-bottom: 1px solid var(--border); font-size: 14px; }
th { background: var(--bg); }

.markdown p { margin-bottom: 10px; line-height: 1.6; }
.markdown pre { background: var(--bg); padding: 10px; border-radius: 6px; overflow-x: auto; }
"#;
