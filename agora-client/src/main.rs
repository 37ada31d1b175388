//! Agora command-line browser.
//!
//! Read-only: no identity provider or card processor is wired in, so every
//! session-gated action answers with a login prompt.
//!
//! ```text
//! agora-client [--config path] feed [newest|popular] [page]
//! agora-client [--config path] post <id>
//! agora-client [--config path] tags [tag]
//! agora-client [--config path] announcements
//! ```

use std::sync::Arc;

use agora_client::app::{App, Capabilities};
use agora_client::config::ClientConfig;
use agora_client::error::{ClientError, ClientResult};
use agora_client::events::{AppEvent, EventReceiver};
use agora_client::identity::SignedOutIdentity;
use agora_client::pagination::{ListState, PageItem};
use agora_client::payment::PaymentsUnavailable;
use agora_client::telemetry::{self, TelemetryConfig};
use agora_client::views::{AnnouncementsView, FeedView, PostDetailView, TagBrowserView};
use agora_core::{sort_comments, CommentSort, Post, PostId, PostSort, ValidationError, Votable};

#[derive(Debug, PartialEq)]
enum Command {
    Feed { sort: PostSort, page: u32 },
    Post(PostId),
    Tags(Option<String>),
    Announcements,
}

fn parse_command(args: &[String]) -> Result<Command, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidValue {
        field: "command".to_string(),
        reason: reason.to_string(),
    };
    match args.first().map(String::as_str) {
        None | Some("feed") => {
            let sort = match args.get(1).map(String::as_str) {
                None | Some("newest") => PostSort::Newest,
                Some("popular") => PostSort::Popular,
                Some(_) => return Err(invalid("sort must be newest or popular")),
            };
            let page = match args.get(2) {
                Some(p) => p.parse().map_err(|_| invalid("page must be a number"))?,
                None => 1,
            };
            Ok(Command::Feed { sort, page })
        }
        Some("post") => args
            .get(1)
            .map(|id| Command::Post(PostId::new(id.as_str())))
            .ok_or_else(|| invalid("post needs an id")),
        Some("tags") => Ok(Command::Tags(args.get(1).cloned())),
        Some("announcements") => Ok(Command::Announcements),
        Some(other) => Err(invalid(&format!("unknown command {other}"))),
    }
}

/// Positional arguments with `--config <path>` removed.
fn positional_args() -> Vec<String> {
    let mut out = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            args.next();
        } else {
            out.push(arg);
        }
    }
    out
}

fn print_posts(state: &ListState<Post>) {
    match state {
        ListState::Loading => println!("Loading..."),
        ListState::Failed { message } => println!("Error: {message}"),
        ListState::Empty => println!("No posts yet."),
        ListState::NoMorePages { total_pages } => {
            println!("No more posts ({total_pages} pages in total).")
        }
        ListState::Page {
            items,
            page,
            total_pages,
            window,
        } => {
            for post in items {
                println!(
                    "{:<26} {:>+5}  [{}] {} ({} comments)",
                    post.id,
                    post.score(),
                    post.tag_or_default(),
                    post.title,
                    post.comment_count()
                );
            }
            let selector: Vec<String> = window
                .iter()
                .map(|item| match item {
                    PageItem::Page { number, current: true } => format!("[{number}]"),
                    PageItem::Page { number, .. } => number.to_string(),
                    PageItem::Ellipsis => "...".to_string(),
                })
                .collect();
            println!("page {page}/{total_pages}: {}", selector.join(" "));
        }
    }
}

fn drain_events(events: &mut EventReceiver) {
    while let Ok(event) = events.try_recv() {
        match event {
            AppEvent::Toast(toast) => eprintln!("{:?}: {}", toast.level, toast.message),
            AppEvent::Navigate(route) => tracing::debug!(route = %route.path(), "navigation requested"),
            AppEvent::SessionChanged => {}
        }
    }
}

async fn run(app: &App, command: Command) -> ClientResult<()> {
    match command {
        Command::Feed { sort, page } => {
            let mut view = FeedView::new(app.clone());
            view.set_sort(sort);
            view.set_page(page);
            print_posts(&view.load().await);
        }
        Command::Post(id) => {
            let post = PostDetailView::new(app.clone(), id).load().await?;
            println!("{}\nby {}\n\n{}\n", post.title, post.author_display_name(), post.description);
            for comment in sort_comments(&post.comments, CommentSort::Popularity) {
                println!(
                    "  {:>+4} {}: {}",
                    comment.score(),
                    comment.author_display_name(),
                    comment.text
                );
                for reply in &comment.replies {
                    println!("         {}: {}", reply.user_name.as_deref().unwrap_or(agora_core::ANONYMOUS), reply.text);
                }
            }
        }
        Command::Tags(tag) => {
            let mut view = TagBrowserView::new(app.clone());
            let tags = view.load_tags().await?;
            let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
            println!("tags: {}", names.join(", "));
            if let Some(tag) = tag {
                view.search(&tag).await?;
            }
            print_posts(&view.load_posts().await);
        }
        Command::Announcements => {
            let announcements = AnnouncementsView::new(app.clone()).load().await?;
            if announcements.is_empty() {
                println!("No announcements.");
            }
            for item in announcements.iter() {
                println!("{}\n  {}", item.title, item.description);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    telemetry::init_tracing(&TelemetryConfig::default())?;
    let config = ClientConfig::load()?;
    let command = parse_command(&positional_args()).map_err(|e| ClientError::Agora(e.into()))?;

    let capabilities = Capabilities {
        identity: Arc::new(SignedOutIdentity),
        payments: Arc::new(PaymentsUnavailable),
        uploader: None,
    };
    let (app, mut events) = App::new(config, capabilities)?;
    app.start().await?;

    let result = run(&app, command).await;
    drain_events(&mut events);
    app.shutdown();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_feed_defaults() {
        assert_eq!(
            parse_command(&[]).unwrap(),
            Command::Feed {
                sort: PostSort::Newest,
                page: 1
            }
        );
        assert_eq!(
            parse_command(&args(&["feed", "popular", "3"])).unwrap(),
            Command::Feed {
                sort: PostSort::Popular,
                page: 3
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_command(&args(&["feed", "oldest"])).is_err());
        assert!(parse_command(&args(&["feed", "newest", "two"])).is_err());
        assert!(parse_command(&args(&["post"])).is_err());
        assert!(parse_command(&args(&["delete"])).is_err());
    }

    #[test]
    fn test_parse_post_and_tags() {
        assert_eq!(
            parse_command(&args(&["post", "abc"])).unwrap(),
            Command::Post(PostId::new("abc"))
        );
        assert_eq!(
            parse_command(&args(&["tags", "rust"])).unwrap(),
            Command::Tags(Some("rust".to_string()))
        );
    }
}
