use crate::admin::{AdminFilter, AdminSession, AdminSessions};
use crate::audit::AuditLog;
use crate::config::Config;
use crate::confirmation::ConfirmationWorkflow;
use crate::error::{ErrorKind, WorkflowError};
use crate::event::Countdown;
use crate::export;
use crate::lookup::{LookupState, LookupWorkflow};
use crate::messages::{
    ALREADY_CONFIRMED, CONFIRM_FAILED, CONFIRMED, EMPTY_SEARCH, FORBIDDEN, FOUND, LOOKUP_FAILED,
    SAVE_FAILED, UPDATED, not_found,
};
use crate::registry::{AuditedRegistry, Registry};
use crate::runner::{Runner, TShirtSize};
use chrono::{DateTime, NaiveDate, Utc};
use http_body_util::{BodyExt, Either, Empty, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{ALLOW, CONTENT_DISPOSITION, CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tiered_server::api::Extension;
use tiered_server::headers::JSON;
use tiered_server::session::SessionState;
use tiered_server::store::snapshot;
use tracing::debug;

const CSV: HeaderValue = HeaderValue::from_static("text/csv; charset=utf-8");
const GET: HeaderValue = HeaderValue::from_static("GET");
const POST: HeaderValue = HeaderValue::from_static("POST");
const POST_DELETE: HeaderValue = HeaderValue::from_static("POST, DELETE");

const MAX_BODY_SIZE: usize = 16 * 1024;

type ResponseBody = Either<Full<Bytes>, Empty<Bytes>>;

pub struct ApiExtension<R, A> {
    config: Config,
    registry: AuditedRegistry<R, A>,
    admin_sessions: AdminSessions,
}

#[derive(Debug)]
enum Body {
    Json(Value),
    Csv { file_name: String, content: String },
    Empty,
}

#[derive(Debug)]
struct Reply {
    status: StatusCode,
    allow: Option<HeaderValue>,
    body: Body,
}

impl Reply {
    fn json(status: StatusCode, value: Value) -> Self {
        Self {
            status,
            allow: None,
            body: Body::Json(value),
        }
    }

    fn error(status: StatusCode, kind: ErrorKind, message: &str) -> Self {
        Self::json(status, json!({ "kind": kind, "message": message }))
    }

    fn method_not_allowed(allow: HeaderValue) -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            allow: Some(allow),
            body: Body::Empty,
        }
    }

    fn forbidden() -> Self {
        Self::error(StatusCode::FORBIDDEN, ErrorKind::Forbidden, FORBIDDEN)
    }

    fn bad_request(message: &str) -> Self {
        Self::error(StatusCode::BAD_REQUEST, ErrorKind::Validation, message)
    }

    fn into_response(self) -> Response<ResponseBody> {
        let mut response = match self.body {
            Body::Json(value) => {
                let mut response = Response::new(Either::Left(Full::from(value.to_string())));
                response.headers_mut().insert(CONTENT_TYPE, JSON);
                response
            }
            Body::Csv { file_name, content } => {
                let mut response = Response::new(Either::Left(Full::from(content)));
                response.headers_mut().insert(CONTENT_TYPE, CSV);
                if let Ok(value) =
                    HeaderValue::try_from(format!("attachment; filename=\"{file_name}\""))
                {
                    response.headers_mut().insert(CONTENT_DISPOSITION, value);
                }
                response
            }
            Body::Empty => Response::new(Either::Right(Empty::new())),
        };
        *response.status_mut() = self.status;
        if let Some(allow) = self.allow {
            response.headers_mut().insert(ALLOW, allow);
        }
        response
    }
}

#[derive(Deserialize)]
struct ConfirmRequest {
    phone: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest {
    phone: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    tshirt_size: Option<TShirtSize>,
}

fn parse_body<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, Reply> {
    serde_json::from_slice::<T>(body).map_err(|err| {
        debug!("invalid request body: {err}");
        Reply::bad_request("invalid request body")
    })
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn runner_reply(runner: &Runner, message: &str) -> Reply {
    Reply::json(
        StatusCode::OK,
        json!({ "runner": runner, "message": message }),
    )
}

impl<R: Registry, A: AuditLog> ApiExtension<R, A> {
    pub fn new(config: Config, registry: R, audit: A) -> Self {
        Self {
            config,
            registry: AuditedRegistry::new(registry, audit),
            admin_sessions: AdminSessions::default(),
        }
    }

    fn workflow_error(&self, err: WorkflowError, transport_message: &str) -> Reply {
        match err.kind() {
            ErrorKind::Validation => Reply::bad_request(&err.to_string()),
            ErrorKind::NotFound => Reply::error(
                StatusCode::NOT_FOUND,
                ErrorKind::NotFound,
                &not_found(&self.config.support),
            ),
            ErrorKind::Unavailable => {
                Reply::error(StatusCode::CONFLICT, ErrorKind::Unavailable, &err.to_string())
            }
            ErrorKind::Forbidden => Reply::forbidden(),
            ErrorKind::Transport => Reply::error(
                StatusCode::BAD_GATEWAY,
                ErrorKind::Transport,
                transport_message,
            ),
        }
    }

    fn event(&self, now: &DateTime<Utc>) -> Reply {
        let event = &self.config.event;
        Reply::json(
            StatusCode::OK,
            json!({
                "name": event.name,
                "slug": event.slug,
                "starts_at": event.starts_at.to_rfc3339(),
                "countdown": Countdown::until(&event.starts_at, now),
                "support": self.config.support,
            }),
        )
    }

    async fn lookup(&self, search: Option<&str>) -> Reply {
        let mut workflow = LookupWorkflow::new(self.config.support.clone());
        if let Err(err) = workflow
            .submit(&self.registry, search.unwrap_or_default())
            .await
        {
            return self.workflow_error(err, LOOKUP_FAILED);
        }
        if let Some(runner) = workflow.take_found() {
            return runner_reply(&runner, FOUND);
        }
        match workflow.state() {
            LookupState::NotFound { message } => {
                Reply::error(StatusCode::NOT_FOUND, ErrorKind::NotFound, message)
            }
            LookupState::Error { message } => {
                Reply::error(StatusCode::BAD_GATEWAY, ErrorKind::Transport, message)
            }
            _ => Reply::error(StatusCode::BAD_GATEWAY, ErrorKind::Transport, LOOKUP_FAILED),
        }
    }

    async fn found(&self, phone: &str) -> Result<ConfirmationWorkflow, WorkflowError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(WorkflowError::Validation(EMPTY_SEARCH));
        }
        Ok(ConfirmationWorkflow::new(
            self.registry.find_runner(phone).await?,
        ))
    }

    async fn confirm(&self, body: &[u8]) -> Reply {
        let request = match parse_body::<ConfirmRequest>(body) {
            Ok(it) => it,
            Err(reply) => return reply,
        };
        let mut workflow = match self.found(&request.phone).await {
            Ok(it) => it,
            Err(err) => return self.workflow_error(err, CONFIRM_FAILED),
        };
        if workflow.runner().is_confirmed() {
            return runner_reply(workflow.runner(), ALREADY_CONFIRMED);
        }
        match workflow.confirm(&self.registry).await {
            Ok(()) => runner_reply(workflow.runner(), CONFIRMED),
            Err(err) => self.workflow_error(err, CONFIRM_FAILED),
        }
    }

    async fn update(&self, body: &[u8]) -> Reply {
        let request = match parse_body::<UpdateRequest>(body) {
            Ok(it) => it,
            Err(reply) => return reply,
        };
        let mut workflow = match self.found(&request.phone).await {
            Ok(it) => it,
            Err(err) => return self.workflow_error(err, SAVE_FAILED),
        };
        match workflow.start_edit() {
            Ok(draft) => {
                if let Some(full_name) = request.full_name {
                    draft.full_name = full_name;
                }
                if let Some(tshirt_size) = request.tshirt_size {
                    draft.tshirt_size = Some(tshirt_size);
                }
            }
            Err(err) => return self.workflow_error(err, SAVE_FAILED),
        }
        match workflow.save(&self.registry).await {
            Ok(()) => runner_reply(workflow.runner(), UPDATED),
            Err(err) => self.workflow_error(err, SAVE_FAILED),
        }
    }

    async fn admin_login(&self, session: AdminSession) -> Reply {
        match self.admin_sessions.login(session, &self.registry).await {
            Ok(view) => Reply::json(
                StatusCode::OK,
                json!({ "session": view.session(), "stats": view.stats() }),
            ),
            Err(err) => self.workflow_error(err.into(), LOOKUP_FAILED),
        }
    }

    fn admin_logout(&self, session: &AdminSession) -> Reply {
        self.admin_sessions.logout(session);
        Reply {
            status: StatusCode::NO_CONTENT,
            allow: None,
            body: Body::Empty,
        }
    }

    async fn admin_runners(&self, session: AdminSession, search: &str, filter: &str) -> Reply {
        let Ok(filter) = AdminFilter::try_from(filter) else {
            return Reply::bad_request("unknown filter");
        };
        match self
            .admin_sessions
            .view_or_login(session, &self.registry)
            .await
        {
            Ok(view) => Reply::json(
                StatusCode::OK,
                json!({
                    "stats": view.stats(),
                    "filter": filter,
                    "runners": view.filtered(search, filter),
                }),
            ),
            Err(err) => self.workflow_error(err.into(), LOOKUP_FAILED),
        }
    }

    async fn admin_export(
        &self,
        session: AdminSession,
        search: &str,
        filter: &str,
        today: NaiveDate,
    ) -> Reply {
        let Ok(filter) = AdminFilter::try_from(filter) else {
            return Reply::bad_request("unknown filter");
        };
        match self
            .admin_sessions
            .view_or_login(session, &self.registry)
            .await
        {
            Ok(view) => {
                let runners = view.filtered(search, filter);
                debug!("exporting {} runners", runners.len());
                Reply {
                    status: StatusCode::OK,
                    allow: None,
                    body: Body::Csv {
                        file_name: export::file_name(&self.config.event.slug, today),
                        content: export::to_csv(runners),
                    },
                }
            }
            Err(err) => self.workflow_error(err.into(), LOOKUP_FAILED),
        }
    }

    async fn admin_audit(&self) -> Reply {
        Reply::json(
            StatusCode::OK,
            json!({ "entries": self.registry.audit_log().entries().await }),
        )
    }

    async fn admin(&self, path: &str, method: &Method, session: AdminSession, url: &Url) -> Reply {
        let search = query_param(url, "search").unwrap_or_default();
        let filter = query_param(url, "filter").unwrap_or_default();
        match path {
            "/session" => match *method {
                Method::POST => self.admin_login(session).await,
                Method::DELETE => self.admin_logout(&session),
                _ => Reply::method_not_allowed(POST_DELETE),
            },
            "/runners" if *method == Method::GET => {
                self.admin_runners(session, &search, &filter).await
            }
            "/runners.csv" if *method == Method::GET => {
                self.admin_export(session, &search, &filter, Utc::now().date_naive())
                    .await
            }
            "/audit" if *method == Method::GET => self.admin_audit().await,
            _ => Reply::method_not_allowed(GET),
        }
    }

    async fn route(&self, request: Request<Incoming>, path: &str, url: &Url) -> Option<Reply> {
        let method = request.method().clone();
        if let Some(path) = path.strip_prefix("/user/admin") {
            if !matches!(path, "/session" | "/runners" | "/runners.csv" | "/audit") {
                return None;
            }
            let snapshot = snapshot();
            let state = SessionState::from_headers(request.headers(), &snapshot).await;
            let Some(session) = AdminSession::from_session_state(state) else {
                return Some(Reply::forbidden());
            };
            return Some(self.admin(path, &method, session, url).await);
        }
        match path {
            "/event" => Some(if method == Method::GET {
                self.event(&Utc::now())
            } else {
                Reply::method_not_allowed(GET)
            }),
            "/runner" => Some(if method == Method::GET {
                self.lookup(query_param(url, "search").as_deref()).await
            } else {
                Reply::method_not_allowed(GET)
            }),
            "/runner/confirm" | "/runner/update" => {
                if method != Method::POST {
                    return Some(Reply::method_not_allowed(POST));
                }
                let body = match Limited::new(request.into_body(), MAX_BODY_SIZE)
                    .collect()
                    .await
                {
                    Ok(it) => it.to_bytes(),
                    Err(err) => {
                        debug!("failed to read request body: {err}");
                        return Some(Reply::bad_request("invalid request body"));
                    }
                };
                Some(if path == "/runner/confirm" {
                    self.confirm(&body).await
                } else {
                    self.update(&body).await
                })
            }
            _ => None,
        }
    }
}

impl<R: Registry + 'static, A: AuditLog + 'static> Extension for ApiExtension<R, A> {
    async fn handle_api_extension(
        &self,
        request: Request<Incoming>,
        server_name: &Arc<String>,
    ) -> Option<Response<ResponseBody>> {
        let path = request.uri().path().strip_prefix("/api")?.to_string();
        let url = Url::parse(&format!("https://{server_name}{}", request.uri())).ok()?;
        let reply = self.route(request, &path, &url).await?;
        debug!(
            "{} https://{server_name}/api{path}",
            reply.status.as_u16()
        );
        Some(reply.into_response())
    }
}
