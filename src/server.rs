use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use crate::store::EmployeeFilter;
use crate::StaffBot;

// Chat bodies are a single short string; 64KB is plenty.
const MAX_BODY: u64 = 64 * 1024;

const QUERY_REQUIRED: &str = "Query is required.";

/// Body of `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Clone)]
struct ApiState {
    bot: Arc<StaffBot>,
    top_k: usize,
}

pub fn routes(bot: Arc<StaffBot>, top_k: usize) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let state = ApiState { bot, top_k };

    // POST /chat
    let chat = warp::post()
    .and(warp::path("chat"))
    .and(warp::path::end())
    .and(warp::body::content_length_limit(MAX_BODY))
    .and(warp::body::bytes())
    .and(with_state(state.clone()))
    .and_then(handle_chat);

    // GET /employees/search
    let search = warp::get()
    .and(warp::path!("employees" / "search"))
    .and(warp::query::<Vec<(String, String)>>())
    .and(with_state(state))
    .and_then(handle_search);

    let cors = warp::cors()
    .allow_any_origin()
    .allow_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "CONNECT", "TRACE"])
    .allow_headers(vec!["content-type"]);

    chat.or(search)
    .recover(handle_rejection)
    .with(cors)
    .with(warp::trace::request())
}

/// Serves until `shutdown` resolves. Returns once in-flight requests drain.
pub async fn run(
    bot: Arc<StaffBot>,
    top_k: usize,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), warp::Error> {
    let (bound, server) = warp::serve(routes(bot, top_k)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    info!(addr = %bound, "HTTP API listening");
    server.await;
    Ok(())
}

fn with_state(state: ApiState) -> impl Filter<Extract = (ApiState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn reply(body: &impl Serialize, status: StatusCode) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(body), status)
}

fn detail(status: StatusCode, msg: impl Into<String>) -> WithStatus<Json> {
    reply(&ErrorBody { detail: msg.into() }, status)
}

async fn handle_chat(body: Bytes, state: ApiState) -> Result<WithStatus<Json>, Infallible> {
    let req: ChatRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "rejected chat body");
            return Ok(detail(StatusCode::BAD_REQUEST, QUERY_REQUIRED));
        }
    };
    if req.query.trim().is_empty() {
        return Ok(detail(StatusCode::BAD_REQUEST, QUERY_REQUIRED));
    }

    match state.bot.answer(&req.query, state.top_k).await {
        Ok(response) => Ok(reply(&ChatResponse { response }, StatusCode::OK)),
        Err(e) => {
            let status = StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error!(error = %e, status = status.as_u16(), "chat query failed");
            Ok(detail(status, e.to_string()))
        }
    }
}

/// Builds the filter from raw pairs so `skills` may repeat.
/// Empty values are ignored, as is any unknown key.
pub fn parse_filter(pairs: &[(String, String)]) -> Result<EmployeeFilter, String> {
    let mut filter = EmployeeFilter::default();
    for (key, value) in pairs {
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            "skills" => filter.skills.push(value.clone()),
            "min_experience" => {
                let n: i64 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("min_experience must be an integer, got {value:?}"))?;
                filter.min_experience = (n > 0).then(|| u32::try_from(n).unwrap_or(u32::MAX));
            }
            "availability" => filter.availability = Some(value.clone()),
            "project" => filter.project = Some(value.clone()),
            _ => {}
        }
    }
    Ok(filter)
}

async fn handle_search(pairs: Vec<(String, String)>, state: ApiState) -> Result<WithStatus<Json>, Infallible> {
    let filter = match parse_filter(&pairs) {
        Ok(f) => f,
        Err(msg) => return Ok(detail(StatusCode::BAD_REQUEST, msg)),
    };
    let found = state.bot.store().search(&filter);
    info!(matches = found.len(), "employee search");
    Ok(reply(&found, StatusCode::OK))
}

async fn handle_rejection(err: Rejection) -> Result<WithStatus<Json>, Infallible> {
    let (status, msg) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Length Required".to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        error!(?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
    };
    Ok(detail(status, msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn repeated_skills_accumulate() {
        let f = parse_filter(&pairs(&[("skills", "Python"), ("skills", "SQL"), ("page", "2")])).unwrap();
        assert_eq!(f.skills, vec!["Python", "SQL"]);
        assert_eq!(f.min_experience, None);
    }

    #[test]
    fn min_experience_must_be_integer() {
        assert!(parse_filter(&pairs(&[("min_experience", "three")])).is_err());
        assert_eq!(parse_filter(&pairs(&[("min_experience", "3")])).unwrap().min_experience, Some(3));
        assert_eq!(parse_filter(&pairs(&[("min_experience", "-1")])).unwrap().min_experience, None);
    }

    #[test]
    fn empty_values_are_ignored() {
        let f = parse_filter(&pairs(&[("availability", ""), ("project", "")])).unwrap();
        assert_eq!(f, EmployeeFilter::default());
    }
}
