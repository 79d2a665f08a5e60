use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use sqlx::PgPool;

use gatehouse_cli::seeder;

#[derive(Parser)]
#[command(name = "gatehouse-cli")]
#[command(about = "Gatehouse CLI - Administrative tools for Gatehouse", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the default permission catalog (resources, actions, roles)
    Seed,
    /// Create (or reset) the bootstrap administrator account
    CreateAdmin {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// First name of the administrator
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the administrator
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    match cli.command {
        Commands::Seed => {
            if let Err(e) = seeder::seed_catalog(&pool).await {
                eprintln!("Seeding failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::CreateAdmin {
            email,
            first_name,
            last_name,
            password,
        } => {
            let email = email
                .or_else(|| std::env::var("ADMIN_EMAIL").ok())
                .unwrap_or_else(|| {
                    Input::new()
                        .with_prompt("Admin email")
                        .interact_text()
                        .expect("Failed to read email")
                });
            let first_name = first_name
                .or_else(|| std::env::var("ADMIN_FIRSTNAME").ok())
                .unwrap_or_else(|| "Super".to_string());
            let last_name = last_name
                .or_else(|| std::env::var("ADMIN_LASTNAME").ok())
                .unwrap_or_else(|| "Admin".to_string());
            let password = password
                .or_else(|| std::env::var("ADMIN_PASSWORD").ok())
                .unwrap_or_else(|| {
                    Password::new()
                        .with_prompt("Admin password")
                        .with_confirmation("Confirm password", "Passwords do not match")
                        .interact()
                        .expect("Failed to read password")
                });

            if let Err(e) =
                seeder::create_admin(&pool, &email, &first_name, &last_name, &password).await
            {
                eprintln!("Failed to create admin: {}", e);
                std::process::exit(1);
            }
        }
    }
}
