mod args;
mod ballot_box;

use clap::Parser;
use log::{debug, info, warn};
use snafu::{prelude::*, ErrorCompat};
use std::fs;
use std::path::Path;
use std::process;

use crate::args::{Args, Command};
use crate::ballot_box::api::{self, ApiResponse, TokenRequest, VoteRequest};
use crate::ballot_box::config_reader::{read_config, BoxConfig, Settings};
use crate::ballot_box::io_json::{read_json, JsonFileStore};
use crate::ballot_box::reporting::{check_against_reference, raw_report, render_raw_text};
use crate::ballot_box::service::BallotBox;
use crate::ballot_box::*;

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn load_settings(args: &Args) -> BoxResult<Settings> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => BoxConfig::default(),
    };
    let mut settings = Settings::from_config(&config);
    if let Some(dir) = &args.data_dir {
        settings.data_dir = dir.into();
    }
    if let Some(seats) = args.seats {
        settings.seats = seats;
    }
    if let Some(ranks) = args.ranks {
        settings.ranks_required = ranks;
    }
    if let Some(secret) = &args.admin_secret {
        settings = settings.with_admin_secret(secret);
    }
    debug!("settings: {:?}, rules: {:?}", settings, settings.rules());
    Ok(settings)
}

fn bearer(admin_key: &Option<String>) -> Option<String> {
    admin_key.as_ref().map(|k| format!("Bearer {}", k))
}

fn api_ok(body: serde_json::Value) -> ApiResponse {
    ApiResponse { status: 200, body }
}

fn to_body<T: serde::Serialize>(request: &T) -> BoxResult<String> {
    serde_json::to_string(request).context(SerializingJsonSnafu {})
}

fn init_election(
    settings: &Settings,
    candidates: &[String],
    file: &Option<String>,
) -> BoxResult<ApiResponse> {
    let names: Vec<String> = match file {
        Some(path) => read_json(Path::new(path))?,
        None => candidates.to_vec(),
    };
    ensure!(
        !names.is_empty(),
        InvalidRequestSnafu {
            message: "At least one candidate is required"
        }
    );
    let store = JsonFileStore::initialize(&settings.data_dir, &names)?;
    info!("init: election ready in {:?}", store.dir());
    Ok(api_ok(
        serde_json::json!({ "message": "Election initialized", "candidates": names }),
    ))
}

fn dispatch(
    bb: &BallotBox<JsonFileStore>,
    command: &Command,
) -> BoxResult<(ApiResponse, Option<String>)> {
    let resp = match command {
        Command::Init { .. } | Command::Candidates => api::candidates(bb),
        Command::Vote { token, ballot } => {
            let body = to_body(&VoteRequest {
                ballot: ballot.clone(),
                token: token.clone(),
            })?;
            api::vote(bb, &body)
        }
        Command::Results {
            mode,
            admin_key,
            text,
            reference,
        } => {
            let auth = bearer(admin_key);
            if *text && mode == "raw" {
                api::authorize(bb.settings(), auth.as_deref())?;
                let report = raw_report(&bb.snapshot()?, bb.settings());
                let text = render_raw_text(&report);
                return Ok((api_ok(serde_json::Value::Null), Some(text)));
            }
            let resp = api::results(bb, auth.as_deref(), mode);
            if let (Some(path), true) = (reference, resp.is_success()) {
                check_against_reference(&resp.body, path)?;
            }
            resp
        }
        Command::GenerateTokens { count, admin_key } => {
            let body = to_body(&TokenRequest { count: *count })?;
            api::generate_tokens(bb, bearer(admin_key).as_deref(), &body)
        }
        Command::Tokens { admin_key } => api::tokens(bb, bearer(admin_key).as_deref()),
    };
    Ok((resp, None))
}

fn run(args: &Args) -> BoxResult<(ApiResponse, Option<String>)> {
    let settings = load_settings(args)?;
    match &args.command {
        Command::Init {
            candidates,
            candidates_file,
        } => Ok((init_election(&settings, candidates, candidates_file)?, None)),
        command => {
            let store = JsonFileStore::open(&settings.data_dir)?;
            dispatch(&BallotBox::new(store, settings), command)
        }
    }
}

fn emit(out: &Option<String>, contents: &str) -> BoxResult<()> {
    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", contents);
            Ok(())
        }
        Some(path) => {
            fs::write(path, contents).context(WritingJsonSnafu { path })?;
            info!("Output written to {}", path);
            Ok(())
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let resp = match run(&args) {
        Ok((_, Some(text))) => {
            if let Err(e) = emit(&args.out, &text) {
                eprintln!("An error occurred {}", e);
                process::exit(1);
            }
            return;
        }
        Ok((resp, None)) => resp,
        Err(e) => {
            warn!("Error occurred {:?}", e);
            for cause in ErrorCompat::iter_chain(&e).skip(1) {
                eprintln!("caused by: {}", cause);
            }
            ApiResponse::from_error(&e)
        }
    };

    let pretty = match serde_json::to_string_pretty(&resp.body) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("An error occurred {}", e);
            process::exit(1);
        }
    };
    if resp.is_success() {
        if let Err(e) = emit(&args.out, &pretty) {
            eprintln!("An error occurred {}", e);
            process::exit(1);
        }
    } else {
        println!("{}", pretty);
        process::exit(1);
    }
}
