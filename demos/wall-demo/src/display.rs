//! Terminal display utilities for the wall demo

use chrono::{DateTime, Local};
use colored::Colorize;

use kansha_core::Post;
use kansha_ledger::{DAILY_POST_LIMIT, Ledger};
use kansha_wall::Celebration;

/// Print the application banner
pub fn print_banner() {
    println!();
    println!(
        "{}",
        "╔═══════════════════════════════════════════════════╗".cyan()
    );
    println!(
        "{}",
        "║       Kansha Wall - Community Gratitude Board     ║".cyan()
    );
    println!(
        "{}",
        "╚═══════════════════════════════════════════════════╝".cyan()
    );
    println!();
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg.green());
}

/// Print an info message
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg.dimmed());
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("{} {}", "✗".red().bold(), msg.red());
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg.yellow());
}

/// Print the interactive prompt
pub fn print_prompt(tab: &str) {
    print!("{} {} ", format!("[{tab}]").cyan(), ">".green());
}

/// Print one post, numbered for the interactive commands
pub fn print_post(index: usize, post: &Post, owned: bool, favorite: bool) {
    let local_time: DateTime<Local> = post.created_at().into();
    let time_str = local_time.format("%m-%d %H:%M").to_string();
    let star = if favorite { "★".yellow() } else { " ".normal() };
    let author = if owned {
        format!("{} (you)", post.author_name).green().bold()
    } else {
        post.author_name.cyan().bold()
    };

    println!(
        "{} {} {} {}  {}",
        format!("{index:>2}.").dimmed(),
        star,
        time_str.dimmed(),
        author,
        post.content
    );
    if let Some(reply) = &post.ai_reply {
        println!("       {} {}", "🙏".normal(), reply.magenta());
    }
}

/// Print a whole wall under a header
pub fn print_wall(title: &str, posts: &[Post], ledger: &Ledger) {
    println!();
    println!("{}", "═".repeat(50).cyan());
    println!("{}", format!("  {title}").cyan().bold());
    println!("{}", "═".repeat(50).cyan());
    if posts.is_empty() {
        println!("{}", "  (no posts yet - be the first!)".dimmed());
    }
    for (i, post) in posts.iter().enumerate() {
        print_post(
            i + 1,
            post,
            ledger.owns(&post.id),
            ledger.is_favorite(&post.id),
        );
    }
    println!("{}", "═".repeat(50).cyan());
    println!();
}

/// Print the ledger summary line
pub fn print_ledger(ledger: &Ledger, remaining: u32) {
    println!(
        "{} virtue {}  🍙 ×{}  🍡 ×{}  {} {}/{} posts left today",
        "☸".yellow(),
        ledger.virtue.to_string().yellow().bold(),
        ledger.tokens.rice_balls.to_string().bold(),
        ledger.tokens.dumplings.to_string().bold(),
        "|".dimmed(),
        remaining.to_string().bold(),
        DAILY_POST_LIMIT
    );
}

/// Print the post-submission celebration
pub fn print_celebration(celebration: &Celebration) {
    println!();
    println!("{}", "  ✨ Thank you for your gratitude! ✨".yellow().bold());
    if let Some(kind) = celebration.offering {
        println!(
            "  {} {}",
            kind.glyph(),
            format!("You offered a {kind}.").yellow()
        );
    }
    if let Some(reply) = &celebration.reply_text {
        println!("  {} {}", "🙏".normal(), reply.magenta());
    }
    println!();
}

/// Print interactive mode help
pub fn print_interactive_help() {
    println!();
    println!("{}", "Commands:".yellow().bold());
    println!("  {}       - Write a new post", "post".cyan());
    println!("  {}  - Switch tabs", "all / mine".cyan());
    println!("  {}    - Toggle favorite on post N", "fav <n>".cyan());
    println!("  {}   - Rewrite your post N", "edit <n>".cyan());
    println!("  {}     - Show your ledger", "status".cyan());
    println!("  {}       - Show this help", "help".cyan());
    println!("  {}       - Leave the wall", "quit".cyan());
    println!();
}
