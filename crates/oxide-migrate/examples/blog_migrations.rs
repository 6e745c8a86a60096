//! Example: Blog Application Migrations
//!
//! This example applies a set of SQL scripts for a blog application with
//! users, posts, and comments, then edits one of them to show how checksum
//! validation and `repair` behave.
//!
//! Run with: cargo run --example blog_migrations -p oxide-migrate

use oxide_migrate::prelude::*;

const V1_USERS: &str = "\
-- Users of the blog
CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(100) NOT NULL UNIQUE,
    email VARCHAR(255) NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

const V2_POSTS: &str = "\
CREATE TABLE posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id INTEGER NOT NULL REFERENCES users(id),
    title VARCHAR(200) NOT NULL,
    body TEXT NOT NULL DEFAULT ''
);
CREATE INDEX idx_posts_author ON posts (author_id);
";

const V3_COMMENTS: &str = "\
CREATE TABLE comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL REFERENCES posts(id),
    body TEXT NOT NULL
);

/* Keep a running count; the trigger body has its own semicolons. */
ALTER TABLE posts ADD COLUMN comment_count INTEGER NOT NULL DEFAULT 0;
CREATE TRIGGER trg_comment_count AFTER INSERT ON comments
BEGIN
    UPDATE posts SET comment_count = comment_count + 1 WHERE id = NEW.post_id;
END;
/

INSERT INTO users (username, email) VALUES ('${admin}', '${admin}@example.com');
";

fn print_rows(rows: &[MigrationInfo]) {
    for row in rows {
        println!(
            "    {:<4} {:<12} {}",
            row.version.to_string(),
            row.state.label(),
            row.description
        );
    }
    println!();
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("{}", "=".repeat(70));
    println!(" OXIDE-MIGRATE: Blog Application Example");
    println!("{}", "=".repeat(70));
    println!();

    // Create in-memory SQLite database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    // Trigger bodies end with a line holding only `/`
    let migrator = Migrator::new(pool.clone())
        .dialect(Dialect::Oracle)
        .placeholders(PlaceholderReplacer::new([("admin", "root")]));

    let resolved = vec![
        ResolvedMigration::new("V1__create_users.sql", V1_USERS)?,
        ResolvedMigration::new("V2__create_posts.sql", V2_POSTS)?,
        ResolvedMigration::new("V3__create_comments.sql", V3_COMMENTS)?,
    ];

    println!("[1] Statements per script...");
    for migration in &resolved {
        let statements = migrator.statements(migration)?;
        println!("    {}: {} statement(s)", migration.script, statements.len());
        for statement in &statements {
            let first_line = statement.sql().lines().next().unwrap_or_default();
            println!("        line {:>2}: {}", statement.line_number(), first_line);
        }
    }
    println!();

    println!("[2] Before migrating...");
    print_rows(&migrator.info(&resolved).await?);

    println!("[3] Applying migrations...");
    let applied = migrator.migrate(&resolved).await?;
    println!("    Applied {applied} migration(s)\n");
    print_rows(&migrator.info(&resolved).await?);

    println!("[4] Exercising the trigger...");
    sqlx::query("INSERT INTO posts (author_id, title) VALUES (1, 'Hello')")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO comments (post_id, body) VALUES (1, 'First; really')")
        .execute(&pool)
        .await?;
    let (count,): (i64,) = sqlx::query_as("SELECT comment_count FROM posts WHERE id = 1")
        .fetch_one(&pool)
        .await?;
    println!("    comment_count = {count}\n");

    println!("[5] Editing an applied script...");
    let mut edited = resolved.clone();
    edited[0] = ResolvedMigration::new(
        "V1__create_users.sql",
        format!("{V1_USERS}-- reviewed\n"),
    )?;
    match migrator.validate(&edited).await {
        Err(err) => println!("    validate: {err}"),
        Ok(()) => println!("    validate: ok"),
    }

    let report = migrator.repair(&edited).await?;
    println!(
        "    repair: removed {}, realigned {}",
        report.removed, report.realigned
    );
    migrator.validate(&edited).await?;
    println!("    validate: ok\n");

    println!("{}", "=".repeat(70));
    Ok(())
}
