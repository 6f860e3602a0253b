use clap::Parser as ClapParser;
use journey_log::{
    ApiOutcome, ApiResource, Config, DbAccess, Error, EventEmitter, Metadata, Outcome,
};
use std::path::PathBuf;

/// Emits a sample user journey through the selected transports
#[derive(Debug, clap::Parser)]
struct Opts {
    /// Optional YAML configuration file, environment variables still apply on top
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Directory receiving combined.log and error.log
    #[clap(long)]
    pub log_dir: Option<PathBuf>,

    /// Console-only, as on a read-only deployment
    #[clap(long)]
    pub read_only: bool,

    /// Environment tag stamped on every record
    #[clap(long)]
    pub environment: Option<String>,
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let opts = Opts::parse();

    let mut cfg = match &opts.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    cfg.apply_env()?;
    if let Some(dir) = opts.log_dir {
        cfg.log_dir = dir;
    }
    if let Some(env) = opts.environment {
        cfg.environment = env;
    }
    cfg.read_only_fs |= opts.read_only;

    let events = EventEmitter::new(&cfg);
    eprintln!(
        "transports: {} {:?}",
        events.transports().mode(),
        events.transports().names()
    );

    let user = Some("u1");

    events.view_login_page(None);
    events.login_attempt();
    events.login(None, Outcome::failure("Invalid credentials"));
    events.login(user, Outcome::Success);

    events.view_home(user, 1, None, 10);
    events.search(user, "rust", 3);
    events.navigate_to_post(user, "hello-world");
    events.db_access(
        user,
        DbAccess::Query,
        "getPostBySlug",
        "hello-world",
        Outcome::Success,
        Metadata::new(),
    );
    events.view_post(user, 7, "hello-world");
    events.api_access(
        user,
        ApiResource::Replies,
        "/api/comment/[id]/replies",
        ApiOutcome::Ok,
        Metadata::new().with("commentId", 11).with("repliesCount", 2),
    );

    events.like_post(user, 7);
    events.submit_comment(user, 7, Outcome::Success);
    events.submit_reply(user, 11, 7, Outcome::failure("Comment is locked"));

    events.api_access(
        None,
        ApiResource::Post,
        "/api/posts/[slug]",
        ApiOutcome::Unauthorized,
        Metadata::new(),
    );
    events.navigate_to_home(user);
    events.logout(user);

    Ok(())
}
