//! CLI smoke entry point.
//!
//! Opens a store from `BLOG_*` environment configuration, publishes one
//! article as `BLOG_ACTOR` (anonymous when unset) and prints its provenance.
//!
//! Usage: `blog_cli [title] [content]`

use blog_core::{
    init_logging, AnonymousActor, ArticleService, BlogStore, CurrentActor, ManualActor,
    StoreConfig, SystemClock,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

const ACTOR_VAR: &str = "BLOG_ACTOR";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = StoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir)?;
    }

    let actor: Arc<dyn CurrentActor> = match std::env::var(ACTOR_VAR) {
        Ok(id) if !id.trim().is_empty() => Arc::new(ManualActor::new(Some(id.trim()))),
        _ => Arc::new(AnonymousActor),
    };

    let mut args = std::env::args().skip(1);
    let title = args.next().unwrap_or_else(|| "Hello".to_string());
    let content = args.next().unwrap_or_else(|| "Published from blog_cli.".to_string());

    let store = BlogStore::new(config.open_connection()?, actor, Arc::new(SystemClock))?;
    let mut service = ArticleService::new(store);
    let article = service.publish_article(title, content)?;
    info!("event=cli_publish module=cli status=ok article_id={}", article.id);

    println!("blog_core version={}", blog_core::core_version());
    println!("article id={}", article.id);
    println!(
        "created_by={} created_on={}",
        article.audit.created_by.as_deref().unwrap_or("<anonymous>"),
        article.audit.created_on
    );
    Ok(())
}
