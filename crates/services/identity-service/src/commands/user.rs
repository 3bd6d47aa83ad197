//! `user` subcommands.

use serde_json::json;
use tracing::info;

use common::AppError;
use domain::{NewUser, UserOverview};

use super::CommandResult;
use crate::service::IdentityService;

/// Arguments of `user create`.
#[derive(Debug, Clone)]
pub struct CreateUserArgs {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<i32>,
    pub user_type: Option<i32>,
}

pub async fn create_user(service: &dyn IdentityService, args: CreateUserArgs) -> CommandResult {
    let result = service
        .register(NewUser {
            username: args.username,
            email: args.email,
            password: args.password,
            status_id: None,
            role_id: args.role,
            user_type_id: args.user_type,
        })
        .await;

    match result {
        Ok(user) => {
            println!("{}", user.id);
            Ok(())
        }
        Err(AppError::InvalidFields(errors)) => {
            for error in errors.iter() {
                eprintln!("{}: {}", error.field, error.message);
            }
            Err(AppError::InvalidFields(errors).user_message().into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Print the active user's overview as JSON, with placeholders for missing
/// relations.
pub async fn show_user(service: &dyn IdentityService, username: &str) -> CommandResult {
    let user = service
        .find_by_username(username)
        .await?
        .ok_or(AppError::NotFound)?;
    let overview = service.overview(user.id).await?.ok_or(AppError::NotFound)?;

    println!("{}", serde_json::to_string_pretty(&render(&overview))?);
    Ok(())
}

fn render(overview: &UserOverview) -> serde_json::Value {
    json!({
        "user": overview.user,
        "role": overview.role_name_or_default(),
        "status": overview.status_name_or_default(),
        "user_type": overview.user_type_name_or_default(),
        "user_type_pk": overview.user_type_pk,
        "profile_id": overview.profile_id,
    })
}

pub async fn request_reset(service: &dyn IdentityService, email: &str) -> CommandResult {
    match service.request_password_reset(email).await? {
        Some(token) => println!("{}", token),
        None => info!("No active user with that email"),
    }
    Ok(())
}

pub async fn reset_password(
    service: &dyn IdentityService,
    token: &str,
    password: &str,
) -> CommandResult {
    let user = service.reset_password(token, password).await?;
    info!(user_id = %user.id, "Password updated");
    Ok(())
}
