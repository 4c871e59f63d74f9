//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::user::{Email, Login, Name, Password, Phone, Role};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Login`] of a new [`User`].
    pub login: user::Login,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Email`] of a new [`User`].
    pub email: Option<user::Email>,

    /// [`Phone`] of a new [`User`].
    pub phone: Option<user::Phone>,

    /// [`Role`] of a new [`User`].
    pub role: user::Role,

    /// [`Initiator`] of this [`Command`].
    pub initiator: Initiator,
}

/// Initiator of a [`CreateUser`] [`Command`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Initiator {
    /// Anonymous registration, allowed for [`Role::Client`]s only.
    Anonymous,

    /// Existing [`User`] creating another one within their [`Role`]
    /// permissions.
    User(user::Id),

    /// Application itself, allowed to create [`User`]s in any [`Role`].
    System,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Login>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            login,
            password,
            email,
            phone,
            role,
            initiator,
        } = cmd;

        match initiator {
            Initiator::Anonymous => {
                if role != user::Role::Client {
                    return Err(tracerr::new!(E::NotPermitted(role)));
                }
            }
            Initiator::User(id) => {
                let creator = self
                    .database()
                    .execute(Select(By::<Option<User>, _>::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::InitiatorNotExists(id))
                    .map_err(tracerr::wrap!())?;
                if !creator.role.may_create(role) {
                    return Err(tracerr::new!(E::NotPermitted(role)));
                }
            }
            Initiator::System => {}
        }

        if email.is_none() && phone.is_none() {
            return Err(tracerr::new!(E::NoContactInfo));
        }

        let u = self
            .database()
            .execute(Select(By::new(&login)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if u.is_some() {
            return Err(tracerr::new!(E::LoginOccupied(login)));
        }

        let user = User {
            id: user::Id::new(),
            name,
            login,
            password_hash: user::PasswordHash::new(password.expose_secret())
                .map_err(tracerr::from_and_wrap!(=> E))?,
            email,
            phone,
            role,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`User(id: {})` created as {}", user.id, user.role);

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Password`] hashing error.
    #[display("Failed to hash `Password`: {_0}")]
    PasswordHashing(bcrypt::BcryptError),

    /// [`User`] initiating the [`Command`] doesn't exist.
    #[display("Initiator `User(id: {_0})` does not exist")]
    #[from(ignore)]
    InitiatorNotExists(#[error(not(source))] user::Id),

    /// [`Initiator`] is not permitted to create [`User`]s in the [`Role`].
    #[display("Not permitted to create `User`s in `{_0}` role")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] user::Role),

    /// [`Login`] is already occupied.
    #[display("`{_0}` login is occupied")]
    #[from(ignore)]
    LoginOccupied(#[error(not(source))] user::Login),

    /// No contact information provided.
    #[display("No contact information provided")]
    NoContactInfo,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        command::{fixture, Command as _},
        domain::user,
    };

    use super::{CreateUser, ExecutionError, Initiator};

    fn cmd(role: user::Role, initiator: Initiator) -> CreateUser {
        CreateUser {
            name: user::Name::new("John Smith").unwrap(),
            login: user::Login::new("johnsmith").unwrap(),
            password: SecretBox::new(Box::new(
                user::Password::new("secret123").unwrap(),
            )),
            email: user::Email::new("john@example.com"),
            phone: None,
            role,
            initiator,
        }
    }

    #[tokio::test]
    async fn anonymous_registers_clients_only() {
        let svc = fixture::service();

        let user = svc
            .execute(cmd(user::Role::Client, Initiator::Anonymous))
            .await
            .unwrap();
        assert_eq!(user.role, user::Role::Client);
        assert!(user
            .password_hash
            .verify(&user::Password::new("secret123").unwrap()));

        let err = svc
            .execute(cmd(user::Role::Driver, Initiator::Anonymous))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotPermitted(user::Role::Driver),
        ));
    }

    #[tokio::test]
    async fn respects_role_hierarchy() {
        let svc = fixture::service();
        let admin = fixture::user(&svc, user::Role::Admin).await;

        let err = svc
            .execute(cmd(user::Role::Owner, Initiator::User(admin.id)))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));

        let driver = svc
            .execute(cmd(user::Role::Driver, Initiator::User(admin.id)))
            .await
            .unwrap();
        assert_eq!(driver.role, user::Role::Driver);
    }

    #[tokio::test]
    async fn system_creates_owner() {
        let svc = fixture::service();

        let owner = svc
            .execute(cmd(user::Role::Owner, Initiator::System))
            .await
            .unwrap();
        assert!(owner.is_owner());
    }

    #[tokio::test]
    async fn rejects_occupied_login() {
        let svc = fixture::service();
        _ = svc
            .execute(cmd(user::Role::Client, Initiator::Anonymous))
            .await
            .unwrap();

        let err = svc
            .execute(cmd(user::Role::Client, Initiator::Anonymous))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::LoginOccupied(_)));
    }

    #[tokio::test]
    async fn requires_contact_info() {
        let svc = fixture::service();
        let mut cmd = cmd(user::Role::Client, Initiator::Anonymous);
        cmd.email = None;

        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NoContactInfo));
    }
}
