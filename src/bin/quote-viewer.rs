use std::{sync::Arc, time::Instant};

use book_quotes::viewer::{
    config::ViewerConfig,
    error::ViewerError,
    feed::{HttpQuoteFeed, QuoteFeed},
    fetch,
    likes::{FileKeyValueStore, LikeOverrides},
    FetchResult, LikeAction, LoadState, LoadTicket, Source, Viewer,
};
use dotenv::dotenv;
use log::{log, Level};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{self, UnboundedSender},
    time,
};

enum Event {
    Loaded(FetchResult),
    Liked(i32, Result<i32, ViewerError>),
}

fn spawn_load(feed: &Arc<dyn QuoteFeed>, tx: &UnboundedSender<Event>, ticket: LoadTicket) {
    let feed = feed.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(Event::Loaded(fetch(feed.as_ref(), ticket).await));
    });
}

fn spawn_like(feed: &Arc<dyn QuoteFeed>, tx: &UnboundedSender<Event>, id: i32) {
    let feed = feed.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(Event::Liked(id, feed.like(id).await));
    });
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

fn print_help() {
    println!("Book Quote Shorts");
    println!("  enter/n  next      p  previous   l  like");
    println!("  a        autoplay  s  source     q  quit");
}

fn render(viewer: &Viewer) {
    let source = match viewer.source() {
        Source::Local => "local quotes",
        Source::External => "Recite API",
    };
    match (viewer.state(), viewer.current()) {
        (LoadState::Idle | LoadState::Loading, _) => println!("Loading quotes..."),
        (_, None) => println!("No quotes available"),
        (state, Some(quote)) => {
            println!();
            println!("  \"{}\"", quote.text);
            println!("      - {}, {}", quote.author_name, quote.book_title);
            println!(
                "  [{}/{}] likes: {}  source: {}{}{}",
                viewer.cursor() + 1,
                viewer.quotes().len(),
                quote.likes,
                source,
                if state == LoadState::ReadyWithFallback {
                    " (offline)"
                } else {
                    ""
                },
                if viewer.autoplay() { "" } else { "  paused" },
            );
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = ViewerConfig::from_env();
    let feed: Arc<dyn QuoteFeed> = Arc::new(HttpQuoteFeed::new(
        &config.api_base,
        &config.recite_api_base,
    )?);
    let mut viewer = Viewer::new(LikeOverrides::new(Box::new(FileKeyValueStore::new(
        &config.likes_file,
    ))));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();
    spawn_load(&feed, &tx, viewer.begin_load());
    render(&viewer);

    loop {
        let deadline = viewer.deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let now = Instant::now();
                match line.trim() {
                    "" => viewer.click(now),
                    "n" => viewer.next(now),
                    "p" => viewer.previous(now),
                    "a" => viewer.toggle_autoplay(now),
                    "s" => spawn_load(&feed, &tx, viewer.toggle_source(now)),
                    "l" => {
                        let Some(id) = viewer.current().map(|q| q.id) else {
                            continue;
                        };
                        match viewer.prepare_like(id) {
                            Ok(LikeAction::Remote(id)) => spawn_like(&feed, &tx, id),
                            Ok(LikeAction::Recorded(_)) => {}
                            Err(ViewerError::LikesUnavailable) => {
                                println!("Likes are not available for quotes from the external API");
                                continue;
                            }
                            Err(e) => {
                                println!("Could not like quote: {e}");
                                continue;
                            }
                        }
                    }
                    "q" => break,
                    _ => {
                        print_help();
                        continue;
                    }
                }
                render(&viewer);
            }
            _ = wait_until(deadline) => {
                if viewer.tick(Instant::now()) {
                    render(&viewer);
                }
            }
            Some(event) = rx.recv() => match event {
                Event::Loaded(result) => {
                    if viewer.finish_load(result, Instant::now()) {
                        render(&viewer);
                    }
                }
                Event::Liked(id, result) => match viewer.finish_like(id, result) {
                    Ok(_) => render(&viewer),
                    Err(e) => println!("Could not like quote: {e}"),
                },
            },
        }
    }

    log!(Level::Info, "Viewer closed");
    Ok(())
}
