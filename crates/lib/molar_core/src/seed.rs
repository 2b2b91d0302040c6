//! Default staff accounts for fresh installations.

use thiserror::Error;
use tracing::info;

use crate::auth::AuthError;
use crate::auth::password::hash_password;
use crate::models::auth::{NewUser, Role};
use crate::store::{StoreError, UserStore};

/// Password given to seeded accounts unless another is supplied.
pub const DEFAULT_SEED_PASSWORD: &str = "password123";

/// Seeding errors.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

struct SeedAccount {
    first_name: &'static str,
    last_name: &'static str,
    username: &'static str,
    email: &'static str,
    role: Role,
    specialization: Option<&'static str>,
}

const STAFF: [SeedAccount; 3] = [
    SeedAccount {
        first_name: "Admin",
        last_name: "Manager",
        username: "manager",
        email: "manager@clinic.com",
        role: Role::Manager,
        specialization: None,
    },
    SeedAccount {
        first_name: "John",
        last_name: "Doe",
        username: "doctor",
        email: "doctor@clinic.com",
        role: Role::Doctor,
        specialization: Some("General Dentistry"),
    },
    SeedAccount {
        first_name: "Sarah",
        last_name: "Assistant",
        username: "assistant",
        email: "assistant@clinic.com",
        role: Role::Assistant,
        specialization: None,
    },
];

/// Create the manager, doctor, and assistant accounts that do not exist yet.
///
/// Returns how many accounts were created; running it twice creates none
/// the second time.
pub async fn seed_staff(store: &dyn UserStore, password: &str) -> Result<usize, SeedError> {
    let mut created = 0;
    for account in &STAFF {
        if store
            .identifier_taken(account.email, account.username)
            .await?
        {
            continue;
        }
        store
            .create_user(NewUser {
                first_name: account.first_name.into(),
                last_name: account.last_name.into(),
                email: account.email.into(),
                username: account.username.into(),
                password_hash: hash_password(password)?,
                role: account.role,
                phone: None,
                specialization: account.specialization.map(Into::into),
            })
            .await?;
        info!(username = account.username, role = %account.role, "seeded staff account");
        created += 1;
    }
    Ok(created)
}
