use anyhow::{Context, Result};
use sqlx::PgPool;

/// `hostdesk admin reset-password <email> <new-pass>`. Also promotes the
/// account to admin, which is how the first administrator is bootstrapped
/// after registering through the normal API.
pub async fn reset_password(pool: &PgPool, email: &str, new_pass: &str) -> Result<()> {
    let hash = bcrypt::hash(new_pass, bcrypt::DEFAULT_COST).context("Failed to hash password")?;

    let result = sqlx::query(
        "UPDATE users SET password_hash = $1, role = 'admin', is_active = TRUE WHERE email = $2",
    )
    .bind(&hash)
    .bind(email.trim().to_lowercase())
    .execute(pool)
    .await
    .context("Failed to update password in database")?;

    if result.rows_affected() == 0 {
        anyhow::bail!(
            "No user with email '{}'. Register the account first, then re-run this command.",
            email
        );
    }

    println!("Password for '{}' reset; account is now an admin.", email);
    Ok(())
}

pub async fn info(pool: &PgPool) -> Result<()> {
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(pool)
        .await?;
    let port = std::env::var("API_PORT").unwrap_or_else(|_| "3000".to_string());

    println!("\n=== HOSTDESK INFO ===");
    println!("API port:  {}", port);
    println!("Users:     {}", users);
    println!("Admins:    {}", admins);
    println!("=====================\n");
    Ok(())
}
