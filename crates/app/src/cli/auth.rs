use clap::{Args, Subcommand};
use scancart_app::{auth::SignUpOutcome, context::AppContext};

#[derive(Debug, Args)]
pub(crate) struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Debug, Args)]
struct Credentials {
    #[arg(long, env = "SCANCART_EMAIL")]
    email: String,

    #[arg(long, env = "SCANCART_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Debug, Subcommand)]
enum AuthSubcommand {
    /// Create an account
    Signup(Credentials),

    /// Sign in and keep the session on this device
    Login(Credentials),

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in user
    Whoami,
}

pub(crate) async fn run(context: &AppContext, command: AuthCommand) -> Result<(), String> {
    match command.command {
        AuthSubcommand::Signup(credentials) => {
            let outcome = context
                .auth
                .sign_up(&credentials.email, &credentials.password)
                .await
                .map_err(|error| format!("sign up failed: {error}"))?;

            match outcome {
                SignUpOutcome::SignedIn(session) => {
                    println!("signed up and signed in as {}", session.user.uuid);
                }
                SignUpOutcome::ConfirmationRequired(user) => {
                    println!(
                        "account {} created; confirm your email before signing in",
                        user.uuid
                    );
                }
            }
        }
        AuthSubcommand::Login(credentials) => {
            let session = context
                .auth
                .sign_in_with_password(&credentials.email, &credentials.password)
                .await
                .map_err(|error| format!("sign in failed: {error}"))?;

            println!(
                "signed in as {}",
                session.user.email.as_deref().unwrap_or("unknown email")
            );
        }
        AuthSubcommand::Logout => {
            context
                .auth
                .sign_out()
                .await
                .map_err(|error| format!("sign out failed: {error}"))?;

            println!("signed out");
        }
        AuthSubcommand::Whoami => {
            let user = context
                .auth
                .current_user()
                .await
                .map_err(|error| format!("failed to load user: {error}"))?;

            match user {
                Some(user) => println!(
                    "{} ({})",
                    user.email.as_deref().unwrap_or("no email"),
                    user.uuid
                ),
                None => println!("not signed in; carts belong to {}", context.identity.user_uuid()),
            }
        }
    }

    Ok(())
}
