//! # Sessions
//!
//! PIN login and role checks. A [`Session`] is an explicit value handed to
//! every operation that needs an actor; there is no ambient "current user"
//! global, so tests and multi-terminal setups can hold several at once.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use maracuya_core::Role;
use maracuya_db::Database;

use crate::error::{PosError, PosResult};

/// An authenticated user. Carried by value through service calls; dropping
/// it is logging out.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub code: String,
    pub name: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    /// Checks the session's role against what an operation requires.
    /// Admin passes every check.
    pub fn require(&self, action: &str, required: Role) -> PosResult<()> {
        let allowed = match required {
            Role::Admin => self.role == Role::Admin,
            Role::Cashier => matches!(self.role, Role::Admin | Role::Cashier),
            Role::Family => true,
        };

        if allowed {
            Ok(())
        } else {
            warn!(user = %self.code, %action, ?required, "Permission denied");
            Err(PosError::PermissionDenied { action: action.to_string(), required })
        }
    }
}

/// Opens sessions by verifying a code + PIN pair against stored bcrypt
/// hashes.
#[derive(Debug, Clone)]
pub struct SessionManager {
    db: Database,
}

impl SessionManager {
    pub fn new(db: Database) -> Self {
        SessionManager { db }
    }

    /// Verifies the PIN and opens a session.
    ///
    /// An unknown code and a wrong PIN both return
    /// [`PosError::AuthenticationFailed`]; the response never reveals which
    /// half was wrong.
    pub async fn login(&self, code: &str, pin: &str) -> PosResult<Session> {
        let user = match self.db.users().get_active_by_code(code).await {
            Ok(user) => user,
            Err(maracuya_db::DbError::NotFound { .. }) => {
                warn!(%code, "Login attempt with unknown code");
                return Err(PosError::AuthenticationFailed);
            }
            Err(other) => return Err(other.into()),
        };

        if !bcrypt::verify(pin, &user.pin_hash)? {
            warn!(%code, "Login attempt with wrong PIN");
            return Err(PosError::AuthenticationFailed);
        }

        info!(user = %user.code, role = ?user.role, "Session opened");
        Ok(Session {
            user_id: user.id,
            code: user.code,
            name: user.name,
            role: user.role,
            logged_in_at: Utc::now(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use maracuya_core::{Role, User};
    use maracuya_db::{Database, DbConfig};
    use uuid::Uuid;

    use super::*;

    // Minimum bcrypt cost keeps the test suite fast
    async fn seed_user(db: &Database, code: &str, pin: &str, role: Role) {
        let user = User {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            name: "Test User".to_string(),
            pin_hash: bcrypt::hash(pin, 4).unwrap(),
            role,
            is_active: true,
            created_at: Utc::now(),
        };
        db.users().insert(&user).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_with_correct_pin() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_user(&db, "caja1", "5678", Role::Cashier).await;

        let session = SessionManager::new(db).login("caja1", "5678").await.unwrap();
        assert_eq!(session.code, "caja1");
        assert_eq!(session.role, Role::Cashier);
    }

    #[tokio::test]
    async fn test_wrong_pin_and_unknown_code_look_identical() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_user(&db, "caja1", "5678", Role::Cashier).await;
        let sessions = SessionManager::new(db);

        let wrong_pin = sessions.login("caja1", "0000").await.unwrap_err();
        let unknown = sessions.login("nadie", "0000").await.unwrap_err();

        assert!(matches!(wrong_pin, PosError::AuthenticationFailed));
        assert!(matches!(unknown, PosError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_user(&db, "caja1", "5678", Role::Cashier).await;

        let user = db.users().get_active_by_code("caja1").await.unwrap();
        db.users().set_active(&user.id, false).await.unwrap();

        let err = SessionManager::new(db).login("caja1", "5678").await.unwrap_err();
        assert!(matches!(err, PosError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_role_checks() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_user(&db, "admin", "1234", Role::Admin).await;
        seed_user(&db, "caja1", "5678", Role::Cashier).await;
        let sessions = SessionManager::new(db);

        let admin = sessions.login("admin", "1234").await.unwrap();
        let cashier = sessions.login("caja1", "5678").await.unwrap();

        // Admin passes every check
        assert!(admin.require("void sale", Role::Admin).is_ok());
        assert!(admin.require("commit sale", Role::Cashier).is_ok());

        // Cashier cannot do admin-only actions
        assert!(cashier.require("commit sale", Role::Cashier).is_ok());
        assert!(matches!(
            cashier.require("void sale", Role::Admin),
            Err(PosError::PermissionDenied { .. })
        ));
    }
}
