//! Kansha Wall - community gratitude board
//!
//! A terminal frontend for the kansha wall crates: browse the shared
//! wall, post gratitude, earn and spend offerings, and keep a local
//! ledger between visits.
//!
//! ## Usage
//!
//! ```bash
//! # Enter the wall interactively
//! wall enter --username Hana
//!
//! # Show your ledger without entering
//! wall status
//!
//! # Demo mode: simulate two devices sharing one wall
//! wall demo
//! ```

mod display;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use display::*;
use kansha_core::{NewPost, OfferingKind, Post};
use kansha_feed::{InMemoryPostStore, PostStore};
use kansha_ledger::{LedgerStore, remaining_quota};
use kansha_storage::PersistentKeyValueStore;
use kansha_wall::{BrowseTab, ViewError, ViewState, WallSession};

/// Kansha Wall - community gratitude board
#[derive(Parser)]
#[command(name = "wall")]
#[command(about = "Community gratitude board over a shared feed")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory for the local ledger
    #[arg(short, long, default_value = "~/.kansha-wall")]
    data_dir: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Enter the wall interactively
    Enter {
        /// Author name to suggest on your first visit
        #[arg(short, long, default_value = "Anonymous")]
        username: String,
    },
    /// Show your ledger without entering
    Status,
    /// Demo mode: simulate two devices sharing one wall
    Demo,
}

fn get_data_dir(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wall=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = get_data_dir(&cli.data_dir);

    match cli.command {
        Commands::Enter { username } => cmd_enter(&data_dir, &username).await,
        Commands::Status => cmd_status(&data_dir).await,
        Commands::Demo => cmd_demo().await,
    }
}

/// A wall with a few posts already on it, so a fresh visit has
/// something to read.
async fn seeded_wall() -> Result<InMemoryPostStore> {
    let store = InMemoryPostStore::new();
    let seeds = [
        ("Taro", "駅で道を教えてくれた人、ありがとう"),
        ("Yui", "Thank you to whoever returned my umbrella."),
        ("Ken", "今日の夕焼けがきれいだった。それだけで十分。"),
    ];
    for (author, content) in seeds {
        store.insert(NewPost::new(author, content)).await?;
    }
    Ok(store)
}

async fn open_session(data_dir: &Path) -> Result<WallSession> {
    let kv = Arc::new(
        PersistentKeyValueStore::new(data_dir.join("ledger"))
            .await
            .context("Failed to open ledger storage")?,
    );
    let posts = Arc::new(seeded_wall().await?);
    let session = WallSession::new(kv, posts)
        .await
        .context("Failed to open the wall session")?;
    session.start().await.context("Failed to reach the wall")?;
    Ok(session)
}

async fn cmd_status(data_dir: &Path) -> Result<()> {
    print_banner();

    let kv = Arc::new(
        PersistentKeyValueStore::new(data_dir.join("ledger"))
            .await
            .context("Failed to open ledger storage")?,
    );
    let ledger = LedgerStore::new(kv).load().await?;
    let today = chrono::Local::now().date_naive();

    print_ledger(&ledger, remaining_quota(&ledger, today));
    print_info(&format!(
        "{} posts written from this device, {} favorites marked",
        ledger.owned_post_ids.len(),
        ledger.favorite_post_ids.len()
    ));
    Ok(())
}

async fn cmd_enter(data_dir: &Path, username: &str) -> Result<()> {
    let session = open_session(data_dir).await?;
    let coord = session.coordinator();

    print_banner();
    show_wall(&session, "Gratitude Wall").await;
    print_interactive_help();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        let tab_label = match coord.current_state() {
            ViewState::Browse {
                tab: BrowseTab::Mine,
            } => "mine",
            _ => "all",
        };
        print_prompt(tab_label);
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input).is_err() {
            break;
        }
        let input = input.trim();

        let parts: Vec<&str> = input.splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "" => show_wall(&session, "Gratitude Wall").await,
            "all" => {
                let _ = coord.select_tab(BrowseTab::All);
                show_wall(&session, "Gratitude Wall").await;
            }
            "mine" => {
                let _ = coord.select_tab(BrowseTab::Mine);
                show_wall(&session, "My Posts").await;
            }
            "post" => {
                if let Err(e) = interactive_post(&session, username).await {
                    print_error(&format!("Could not post: {e}"));
                }
            }
            "fav" => match numbered_post(&session, parts.get(1)).await {
                Some(post) => {
                    let marked = session.sync().toggle_favorite(post.id).await?;
                    if marked {
                        print_success("Marked as a favorite ★");
                    } else {
                        print_info("Favorite removed");
                    }
                }
                None => print_warning("Usage: fav <post number>"),
            },
            "edit" => {
                if let Err(e) = interactive_edit(&session, parts.get(1)).await {
                    print_error(&format!("Could not edit: {e}"));
                }
            }
            "status" => {
                let ledger = session.sync().ledger().await;
                print_ledger(&ledger, session.sync().remaining_quota().await);
            }
            "help" | "?" => print_interactive_help(),
            "quit" | "exit" | "q" => {
                session.shutdown().await;
                print_info("またね - see you tomorrow!");
                break;
            }
            _ => print_warning("Unknown command - try 'help'"),
        }
    }

    Ok(())
}

/// Print the wall as the current tab sees it.
async fn show_wall(session: &WallSession, title: &str) {
    let posts = session.coordinator().visible_posts().await;
    let ledger = session.sync().ledger().await;
    print_wall(title, &posts, &ledger);
    print_ledger(&ledger, session.sync().remaining_quota().await);
}

/// Resolve a 1-based index argument against the visible posts.
async fn numbered_post(session: &WallSession, arg: Option<&&str>) -> Option<Post> {
    let index: usize = arg?.trim().parse().ok()?;
    let posts = session.coordinator().visible_posts().await;
    posts.get(index.checked_sub(1)?).cloned()
}

async fn interactive_post(session: &WallSession, fallback_name: &str) -> Result<()> {
    let coord = session.coordinator();
    match coord.open_compose().await {
        Ok(()) => {}
        Err(ViewError::QuotaExhausted) => {
            print_warning("You have used all of today's posts. Come back tomorrow!");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let remembered = match coord.current_state() {
        ViewState::Composing { draft } if !draft.author_name.is_empty() => draft.author_name,
        _ => fallback_name.to_string(),
    };

    let name = ask(&format!("Your name [{remembered}]:"))?;
    coord
        .set_draft_author(if name.is_empty() { &remembered } else { &name })
        .ok();

    let content = ask("Your gratitude:")?;
    coord.set_draft_content(&content).ok();

    let tokens = session.sync().ledger().await.tokens;
    if !tokens.is_empty() {
        let choice = ask(&format!(
            "Offer something? 🍙 ×{} / 🍡 ×{} [r/d/N]:",
            tokens.rice_balls, tokens.dumplings
        ))?;
        let kind = match choice.to_lowercase().as_str() {
            "r" => Some(OfferingKind::RiceBall),
            "d" => Some(OfferingKind::Dumpling),
            _ => None,
        };
        if let Some(kind) = kind {
            if let Err(e) = coord.choose_offering(kind).await {
                print_warning(&format!("Offering skipped: {e}"));
            }
        }
    }

    coord.submit_draft().await?;
    match coord.current_state() {
        ViewState::Celebrating { celebration } => {
            print_celebration(&celebration);
            coord.dismiss_celebration();
            show_wall(session, "Gratitude Wall").await;
        }
        _ => {
            // Validation failed quietly; give the draft back
            print_warning("Nothing posted - both name and message are needed.");
            coord.cancel_compose().ok();
        }
    }
    Ok(())
}

async fn interactive_edit(session: &WallSession, arg: Option<&&str>) -> Result<()> {
    let coord = session.coordinator();
    if !matches!(
        coord.current_state(),
        ViewState::Browse {
            tab: BrowseTab::Mine
        }
    ) {
        print_warning("Switch to 'mine' first - only your own posts can be edited.");
        return Ok(());
    }

    let Some(post) = numbered_post(session, arg).await else {
        print_warning("Usage: edit <post number>");
        return Ok(());
    };

    match coord.begin_edit(post.id).await {
        Ok(()) => {}
        Err(ViewError::NotOwner) => {
            print_warning("That post is not yours.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    println!("{} {}", "Current:".dimmed(), post.content);
    let content = ask("New wording:")?;
    if content.is_empty() {
        print_warning("Nothing saved - the new wording cannot be empty.");
        coord.cancel_edit().ok();
        return Ok(());
    }
    coord.set_edit_content(&content).ok();
    coord.save_edit().await?;

    if coord.current_state().is_browse() {
        print_success("Post updated.");
        show_wall(session, "My Posts").await;
    } else {
        print_warning("Nothing saved - the wall could not be updated.");
        coord.cancel_edit().ok();
    }
    Ok(())
}

fn ask(prompt: &str) -> Result<String> {
    print!("{} ", prompt.cyan());
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Scripted two-device walkthrough of the whole wall.
async fn cmd_demo() -> Result<()> {
    print_banner();
    println!(
        "{}",
        "Simulating two devices sharing one gratitude wall...".dimmed()
    );
    println!();

    let wall = Arc::new(seeded_wall().await?);

    // Hana's device
    let hana = WallSession::new(
        Arc::new(kansha_storage::InMemoryKeyValueStore::new()),
        wall.clone(),
    )
    .await?;
    hana.start().await?;

    show_wall(&hana, "Gratitude Wall (Hana's device)").await;
    pause().await;

    println!("{}", "Hana writes her first three posts...".yellow().bold());
    let posts = [
        "朝のコーヒーを淹れてくれてありがとう",
        "Thank you to the neighbor who waters our plants.",
        "電車で席をゆずってくれた学生さんへ",
    ];
    for content in posts {
        demo_submit(&hana, "Hana", content, None).await?;
        pause().await;
    }

    let ledger = hana.sync().ledger().await;
    print_success(&format!(
        "Three posts in - a rice ball appears! 🍙 ×{}",
        ledger.tokens.rice_balls
    ));
    pause().await;

    // Taro's device comes online and sees everything
    println!();
    println!("{}", "Taro's device comes online...".yellow().bold());
    let taro = WallSession::new(
        Arc::new(kansha_storage::InMemoryKeyValueStore::new()),
        wall.clone(),
    )
    .await?;
    taro.start().await?;
    show_wall(&taro, "Gratitude Wall (Taro's device)").await;
    pause().await;

    // Hana spends the rice ball; the reply reaches Taro by notice alone
    println!(
        "{}",
        "Hana spends her rice ball on the next post...".yellow().bold()
    );
    demo_submit(
        &hana,
        "Hana",
        "このコミュニティに出会えてありがとう",
        Some(OfferingKind::RiceBall),
    )
    .await?;
    tokio::time::sleep(Duration::from_millis(400)).await;

    let taro_top = taro.sync().current_feed();
    if taro_top.first().and_then(|p| p.ai_reply.as_ref()).is_some() {
        print_info("The offering reply reached Taro's device without a manual refresh.");
    }
    pause().await;

    // Editing costs nothing
    println!("{}", "Hana rewords her very first post...".yellow().bold());
    let coord = hana.coordinator();
    coord.select_tab(BrowseTab::Mine)?;
    let mine = coord.visible_posts().await;
    if let Some(oldest) = mine.last() {
        coord.begin_edit(oldest.id).await?;
        coord.set_edit_content("朝のコーヒー、今日もありがとう ☕").ok();
        coord.save_edit().await?;
    }
    let remaining = hana.sync().remaining_quota().await;
    print_info(&format!(
        "Editing costs nothing: still {remaining} post(s) left today."
    ));
    coord.select_tab(BrowseTab::All)?;
    pause().await;

    // Taro favorites Hana's offering post
    println!(
        "{}",
        "Taro marks Hana's offering post as a favorite...".yellow().bold()
    );
    if let Some(post) = taro.sync().current_feed().first().cloned() {
        taro.sync().toggle_favorite(post.id).await?;
        print_success("Marked ★ - favorites live only on Taro's device.");
    }
    pause().await;

    // The daily limit closes the compose surface, nothing else
    println!("{}", "Hana posts once more...".yellow().bold());
    demo_submit(&hana, "Hana", "五つ目の感謝。今日はここまで。", None).await?;
    match coord.open_compose().await {
        Err(ViewError::QuotaExhausted) => {
            print_warning("The wall asks Hana to return tomorrow (5/5 posts used).");
        }
        Ok(()) => {
            let _ = coord.cancel_compose();
        }
        Err(e) => print_error(&format!("Unexpected refusal: {e}")),
    }
    pause().await;

    show_wall(&hana, "Gratitude Wall (Hana's device)").await;
    let hana_ledger = hana.sync().ledger().await;
    let taro_ledger = taro.sync().ledger().await;
    println!("{}", "Hana's ledger:".dimmed());
    print_ledger(&hana_ledger, hana.sync().remaining_quota().await);
    println!("{}", "Taro's ledger:".dimmed());
    print_ledger(&taro_ledger, taro.sync().remaining_quota().await);
    println!();

    hana.shutdown().await;
    taro.shutdown().await;

    print_success("Demo complete!");
    println!();
    println!("{}", "To visit the wall yourself:".dimmed());
    println!(
        "  {} {}",
        "wall enter".green(),
        "--username YourName".dimmed()
    );
    println!();
    Ok(())
}

/// Drive one submission through the view machine and show the result.
async fn demo_submit(
    session: &WallSession,
    author: &str,
    content: &str,
    offering: Option<OfferingKind>,
) -> Result<()> {
    let coord = session.coordinator();
    coord.open_compose().await?;
    coord.set_draft_author(author)?;
    coord.set_draft_content(content)?;
    if let Some(kind) = offering {
        coord.choose_offering(kind).await?;
    }
    coord.submit_draft().await?;

    println!("  {} {}", author.green().bold(), content);
    if let ViewState::Celebrating { celebration } = coord.current_state() {
        if celebration.reply_text.is_some() {
            print_celebration(&celebration);
        }
        coord.dismiss_celebration();
    }
    Ok(())
}

async fn pause() {
    tokio::time::sleep(Duration::from_millis(400)).await;
}
