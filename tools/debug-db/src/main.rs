//! Standalone debug tool to inspect VizWiz's history database
//! Run with: cargo run -- [path/to/data/vizwiz.db]
//!
//! Make sure the server is NOT running (database lock)

use serde::Deserialize;
use std::path::PathBuf;
use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::Surreal;

#[derive(Debug, Deserialize)]
struct CountResult {
    count: usize,
}

#[derive(Debug, Deserialize)]
struct TurnRow {
    sequence: u64,
    role: String,
    content: String,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct SequenceRow {
    sequence: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== VizWiz Database Debug Tool ===\n");

    // 1. Open database
    println!("1. Opening database...");
    let db_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("data/vizwiz.db"), PathBuf::from);
    if !db_path.exists() {
        println!("   ERROR: Database not found at {:?}", db_path);
        return Ok(());
    }

    let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path).await?;
    db.use_ns("vizwiz").use_db("main").await?;
    println!("   SUCCESS: Connected to database");

    // 2. Count turns
    println!("\n2. History statistics...");
    let mut resp = db.query("SELECT count() AS count FROM history GROUP ALL").await?;
    let total: Vec<CountResult> = resp.take(0)?;
    let total_count = total.first().map_or(0, |c| c.count);
    println!("   Total turns: {}", total_count);

    let mut resp = db
        .query("SELECT count() AS count FROM history WHERE role = 'user' GROUP ALL")
        .await?;
    let users: Vec<CountResult> = resp.take(0)?;
    let user_count = users.first().map_or(0, |c| c.count);
    println!("   User turns: {}", user_count);
    println!("   Ai turns: {}", total_count.saturating_sub(user_count));

    // 3. Sequence gaps
    println!("\n3. Checking sequence numbering...");
    let mut resp = db
        .query("SELECT sequence FROM history ORDER BY sequence ASC")
        .await?;
    let sequences: Vec<SequenceRow> = resp.take(0)?;
    let mut gaps = 0;
    for pair in sequences.windows(2) {
        if let [prev, next] = pair {
            if next.sequence != prev.sequence + 1 {
                gaps += 1;
                println!("   gap: {} -> {}", prev.sequence, next.sequence);
            }
        }
    }
    if gaps == 0 {
        println!("   OK: no gaps");
    }

    // 4. Show recent turns
    println!("\n4. Recent turns...");
    let mut resp = db
        .query(
            "
        SELECT sequence, role, content, created_at
        FROM history
        ORDER BY sequence DESC
        LIMIT 10
    ",
        )
        .await?;
    let turns: Vec<TurnRow> = resp.take(0)?;

    if turns.is_empty() {
        println!("   NO TURNS IN DATABASE");
    } else {
        for turn in turns.iter().rev() {
            let preview: String = turn.content.chars().take(60).collect();
            println!(
                "   #{} [{}] {} | {}...",
                turn.sequence, turn.created_at, turn.role, preview
            );
        }
    }

    println!("\n=== Debug Complete ===");
    Ok(())
}
