//! Submit one eco action photo and print the resulting streak.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use chrono::TimeDelta;
use clap::Parser;
use ecosnap::domain::ports::{
    ActionSubmissionRequest, ActionSubmissionService, EcoActionRepository, ImageStorage,
};
use ecosnap::domain::{
    ActionSubmissionPipeline, ActionSubmissionPorts, DEFAULT_CONTENT_TYPE, GeoFix, ImagePayload,
    Session, UserId,
};
use ecosnap::outbound::memory::InMemoryEcoActionStore;
use ecosnap::outbound::session::StaticSessionProvider;
use ecosnap::outbound::supabase::{
    SupabaseClient, SupabaseEcoActionRepository, SupabaseImageStorage,
};
use ecosnap::settings::EcoSnapSettings;
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const DRY_RUN_ACCESS_TOKEN: &str = "dry-run";

/// `ecosnap-submit` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ecosnap-submit",
    about = "Upload an eco action photo, record it, and advance the user's streak",
    version
)]
struct CliArgs {
    /// Path to the photo to submit.
    #[arg(long = "image", value_name = "path")]
    image_path: PathBuf,
    /// Latitude of the capture location in degrees.
    #[arg(long, requires = "longitude", allow_negative_numbers = true)]
    latitude: Option<f64>,
    /// Longitude of the capture location in degrees.
    #[arg(long, requires = "latitude", allow_negative_numbers = true)]
    longitude: Option<f64>,
    /// Horizontal accuracy of the location in metres.
    #[arg(long, default_value_t = 25.0)]
    accuracy: f64,
    /// Submitting user. Falls back to `ECOSNAP_USER_ID` when omitted.
    #[arg(long = "user-id", value_name = "id")]
    user_id: Option<String>,
    /// Bearer token for the user. Falls back to `ECOSNAP_ACCESS_TOKEN`.
    #[arg(long = "access-token", value_name = "token")]
    access_token: Option<String>,
    /// Seconds until the supplied token expires.
    #[arg(long = "expires-in-secs", default_value_t = 3_600)]
    expires_in_secs: i64,
    /// MIME type of the photo.
    #[arg(long = "content-type", default_value = DEFAULT_CONTENT_TYPE)]
    content_type: String,
    /// Submit against an in-memory store instead of Supabase.
    #[arg(long = "dry-run")]
    dry_run: bool,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = EcoSnapSettings::load_from_iter([OsString::from("ecosnap-submit")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let bytes = read_file(&args.image_path)?;
    let file_name = args
        .image_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let image = ImagePayload::from_file_name(
        bytes,
        file_name,
        &args.content_type,
        clock.utc().timestamp_millis(),
    )
    .map_err(invalid_input)?;
    let fix = build_fix(&args, clock.utc().timestamp_millis())?;

    let session = build_session(&args, clock.as_ref())?;
    info!(user_id = %session.user_id(), dry_run = args.dry_run, "submitting eco action");
    let session_provider = Arc::new(StaticSessionProvider::signed_in(session));

    let (image_storage, repository): (Arc<dyn ImageStorage>, Arc<dyn EcoActionRepository>) =
        if args.dry_run {
            let store = Arc::new(InMemoryEcoActionStore::new());
            let image_storage: Arc<dyn ImageStorage> = store.clone();
            (image_storage, store)
        } else {
            let target = settings.supabase_target().map_err(invalid_input)?;
            let client = SupabaseClient::new(&target)
                .map_err(|error| io::Error::other(format!("create http client: {error}")))?;
            (
                Arc::new(SupabaseImageStorage::new(client.clone(), target.bucket)),
                Arc::new(SupabaseEcoActionRepository::new(client)),
            )
        };

    let pipeline = ActionSubmissionPipeline::new(
        ActionSubmissionPorts::new(session_provider, image_storage, repository),
        clock,
    );
    let response = pipeline
        .submit(ActionSubmissionRequest::new(image, fix))
        .await
        .map_err(|error| io::Error::other(format!("submission failed: {error}")))?;

    println!("streak={}", response.streak);
    println!("storage_path={}", response.storage_path);
    println!("action_date={}", response.action_date);
    Ok(())
}

fn build_fix(args: &CliArgs, captured_at_epoch_ms: i64) -> io::Result<Option<GeoFix>> {
    match (args.latitude, args.longitude) {
        (Some(latitude), Some(longitude)) => {
            GeoFix::new(latitude, longitude, args.accuracy, captured_at_epoch_ms)
                .map(Some)
                .map_err(invalid_input)
        }
        _ => Ok(None),
    }
}

fn build_session(args: &CliArgs, clock: &dyn Clock) -> io::Result<Session> {
    let user_id = match resolve_value(args.user_id.clone(), "ECOSNAP_USER_ID", "--user-id") {
        Ok(raw) => UserId::new(raw).map_err(invalid_input)?,
        Err(_) if args.dry_run => UserId::random(),
        Err(error) => return Err(error),
    };
    let access_token =
        match resolve_value(args.access_token.clone(), "ECOSNAP_ACCESS_TOKEN", "--access-token") {
            Ok(token) => token,
            Err(_) if args.dry_run => DRY_RUN_ACCESS_TOKEN.to_owned(),
            Err(error) => return Err(error),
        };
    let expires_at = clock.utc() + TimeDelta::seconds(args.expires_in_secs);
    Session::new(user_id, access_token, expires_at).map_err(invalid_input)
}

fn resolve_value(explicit: Option<String>, env_key: &str, flag: &str) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{flag} must not be empty when provided"),
            ));
        }
        return Ok(value);
    }

    let from_env = env::var(env_key).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("value missing: set {flag} or {env_key}"),
        )
    })?;
    if from_env.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{env_key} must not be empty"),
        ));
    }
    Ok(from_env)
}

fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "image path must be a file"))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|error| {
        io::Error::other(format!(
            "open image parent directory '{}': {error}",
            parent.display()
        ))
    })?;
    directory
        .read(Path::new(file_name))
        .map_err(|error| io::Error::other(format!("read image '{}': {error}", path.display())))
}

fn invalid_input(error: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, error.to_string())
}
