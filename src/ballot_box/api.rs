// Transport-neutral endpoints: JSON in, status and JSON out.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::str::FromStr;
use subtle::ConstantTimeEq;

use crate::ballot_box::{
    config_reader::Settings,
    reporting::{counted_report, raw_report},
    service::BallotBox,
    store::ElectionStore,
    *,
};

#[derive(PartialEq, Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: JSValue,
}

impl ApiResponse {
    fn ok(body: JSValue) -> ApiResponse {
        ApiResponse { status: 200, body }
    }

    pub fn from_error(e: &BoxError) -> ApiResponse {
        let mut body = json!({ "error": e.to_string(), "kind": e.kind().as_str() });
        if let Some(reason) = e.reason() {
            body["reason"] = json!(reason);
        }
        ApiResponse {
            status: e.status(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn respond(operation: &str, res: BoxResult<JSValue>) -> ApiResponse {
    match res {
        Ok(body) => ApiResponse::ok(body),
        Err(e) => {
            log_failure(operation, &e);
            ApiResponse::from_error(&e)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub ballot: Vec<String>,
    pub token: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub count: i64,
}

/// The two admin views of the results.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ResultsMode {
    Raw,
    Counted,
}

impl FromStr for ResultsMode {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(ResultsMode::Raw),
            "counted" => Ok(ResultsMode::Counted),
            x => UnknownViewSnafu { mode: x }.fail(),
        }
    }
}

fn parse_body<'a, T: Deserialize<'a>>(body: &'a str) -> BoxResult<T> {
    serde_json::from_str(body).map_err(|e| BoxError::InvalidRequest {
        message: e.to_string(),
    })
}

/// Checks an `Authorization: Bearer <secret>` header value against the configured secret.
pub fn authorize(settings: &Settings, authorization: Option<&str>) -> BoxResult<()> {
    let secret = settings.admin_secret.as_deref().context(UnauthorizedSnafu {})?;
    let presented = authorization
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|k| k.trim())
        .context(UnauthorizedSnafu {})?;
    let matches: bool = secret.as_bytes().ct_eq(presented.as_bytes()).into();
    ensure!(matches, UnauthorizedSnafu {});
    Ok(())
}

/// `GET /api/candidates`
pub fn candidates<S: ElectionStore>(bb: &BallotBox<S>) -> ApiResponse {
    respond("candidates", bb.candidates().map(|cs| json!(cs)))
}

/// `POST /api/vote` with `{ballot, token}`
pub fn vote<S: ElectionStore>(bb: &BallotBox<S>, body: &str) -> ApiResponse {
    let res = parse_body::<VoteRequest>(body).and_then(|req| {
        bb.submit(&req.ballot, &req.token)?;
        Ok(json!({ "message": "Vote submitted successfully" }))
    });
    respond("vote", res)
}

/// `GET /api/results?mode=raw|counted`, privileged
pub fn results<S: ElectionStore>(
    bb: &BallotBox<S>,
    authorization: Option<&str>,
    mode: &str,
) -> ApiResponse {
    let res = authorize(bb.settings(), authorization).and_then(|_| {
        let mode = ResultsMode::from_str(mode)?;
        let snapshot = bb.snapshot()?;
        debug!("results: {:?} over {} ballots", mode, snapshot.ballots.len());
        match mode {
            ResultsMode::Raw => serde_json::to_value(raw_report(&snapshot, bb.settings())),
            ResultsMode::Counted => {
                serde_json::to_value(counted_report(&snapshot, bb.settings()))
            }
        }
        .context(SerializingJsonSnafu {})
    });
    respond("results", res)
}

/// `POST /api/generate-tokens` with `{count}`, privileged
pub fn generate_tokens<S: ElectionStore>(
    bb: &BallotBox<S>,
    authorization: Option<&str>,
    body: &str,
) -> ApiResponse {
    let res = authorize(bb.settings(), authorization).and_then(|_| {
        let req: TokenRequest = parse_body(body)?;
        let fresh = bb.generate_tokens(req.count)?;
        info!("generate_tokens: issued {} tokens", fresh.len());
        let tokens: Vec<&String> = fresh.iter().map(|t| &t.token).collect();
        Ok(json!({ "message": "Tokens generated", "tokens": tokens }))
    });
    respond("generate_tokens", res)
}

/// `GET /api/tokens`, privileged: how many tokens were issued and used.
pub fn tokens<S: ElectionStore>(bb: &BallotBox<S>, authorization: Option<&str>) -> ApiResponse {
    let res = authorize(bb.settings(), authorization).and_then(|_| {
        serde_json::to_value(bb.token_summary()?).context(SerializingJsonSnafu {})
    });
    respond("tokens", res)
}
