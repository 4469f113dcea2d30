//! Bootstrap an account directly in the database.
//!
//! The first secretary has to exist before anyone can log in and use the
//! admin endpoints, so this binary writes one without going through HTTP.
//!
//! ```text
//! create-user <ROLE> <USERNAME> <EMAIL> <FULL NAME>
//! ```
//!
//! The password is read from `CREATE_USER_PASSWORD`. `DATABASE_URL` must be
//! set; migrations are applied first.

use anyhow::{bail, Context};
use thesis_api::auth::password::hash_password;
use thesis_core::roles::Role;
use thesis_core::users::{validate_email, validate_password_strength, validate_required};
use thesis_db::models::user::CreateUser;
use thesis_db::repositories::UserRepo;

const USAGE: &str = "usage: create-user <ROLE> <USERNAME> <EMAIL> <FULL NAME>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "create_user=info,thesis_db=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [role, username, email, full_name] = args.as_slice() else {
        bail!(USAGE);
    };

    let role: Role = role.parse()?;
    validate_required("Username", username)?;
    validate_required("Full name", full_name)?;
    validate_email(email)?;

    let password =
        std::env::var("CREATE_USER_PASSWORD").context("CREATE_USER_PASSWORD must be set")?;
    validate_password_strength(&password)?;
    let password_hash =
        hash_password(&password).map_err(|e| anyhow::anyhow!("Password hashing failed: {e}"))?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = thesis_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    thesis_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let input = CreateUser {
        username: username.trim().to_string(),
        email: email.clone(),
        password_hash,
        full_name: full_name.trim().to_string(),
        role,
        student_number: None,
        postal_address: None,
        mobile_phone: None,
        landline_phone: None,
    };
    let user = UserRepo::create(&pool, &input)
        .await
        .with_context(|| format!("Failed to create user '{username}'"))?;

    tracing::info!(user_id = user.id, role = %role, username = %user.username, "User created");
    Ok(())
}
