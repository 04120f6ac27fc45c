//! Maps parsed subcommands onto controller operations.

use std::io::{self, BufRead, Write};

use portal_core::{
    ApiError, Controller, Credentials, NewFeedback, ProfileUpdate, Registration, TokenStore,
    Transport, UserUpdate,
};
use serde_json::json;

use crate::cli::Commands;

/// Run one command. Returns `true` when the operation succeeded; the
/// controller has already rendered the outcome either way.
pub fn run<T, S, W>(
    controller: &mut Controller<T, S, W>,
    command: Commands,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> bool
where
    T: Transport,
    S: TokenStore,
    W: Write,
{
    match command {
        Commands::Login { username, password } => controller
            .login(&Credentials { username, password })
            .is_ok(),
        Commands::Register {
            username,
            email,
            password,
            role,
        } => controller
            .register(&Registration {
                username,
                email,
                password,
                role,
            })
            .is_ok(),
        Commands::Me => controller.current_user().is_ok(),
        Commands::UpdateMe { email, password } => controller
            .update_current_user(ProfileUpdate { email, password })
            .is_ok(),
        Commands::Logout => {
            controller.logout();
            true
        }
        Commands::Status => {
            controller.restore();
            controller.status();
            true
        }
        Commands::Users => controller.list_users().is_ok(),
        Commands::User { id } => controller.get_user(id).is_ok(),
        Commands::UpdateUser {
            id,
            username,
            email,
            password,
            role,
        } => controller
            .update_user(
                id,
                UserUpdate {
                    username,
                    email,
                    password,
                    role,
                },
            )
            .is_ok(),
        Commands::DeleteUser { id, yes } => {
            if !yes && !confirm(&format!("Delete user {id}?")) {
                return cancelled(controller);
            }
            controller.delete_user(id).is_ok()
        }
        Commands::FeedbackCreate {
            name,
            email,
            phone,
            message,
        } => controller
            .create_feedback(&NewFeedback {
                name,
                email,
                phone,
                message,
            })
            .is_ok(),
        Commands::Feedbacks => controller.list_feedback().is_ok(),
        Commands::AllFeedbacks => controller.list_all_feedback().is_ok(),
        Commands::FeedbackDelete { id, yes } => {
            if !yes && !confirm(&format!("Delete feedback {id}?")) {
                return cancelled(controller);
            }
            controller.delete_feedback(id).is_ok()
        }
        Commands::Health => controller.health().is_ok(),
        Commands::Request { method, path, body } => {
            let body = match body.as_deref().map(serde_json::from_str::<serde_json::Value>).transpose() {
                Ok(body) => body,
                Err(e) => {
                    let err = ApiError::Validation(format!("invalid JSON body: {e}"));
                    controller.presenter_mut().present_error(&err);
                    return false;
                }
            };
            controller.request(method, &path, body).is_ok()
        }
    }
}

fn cancelled<T, S, W>(controller: &mut Controller<T, S, W>) -> bool
where
    T: Transport,
    S: TokenStore,
    W: Write,
{
    controller
        .presenter_mut()
        .present(&json!({"message": "Cancelled"}), None);
    true
}

/// Ask a yes/no question on stderr and read the answer from stdin.
pub fn stdin_confirm(question: &str) -> bool {
    eprint!("{question} [y/N] ");
    io::stderr().flush().ok();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
