//! [`User`] definitions.

pub mod session;

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Person interacting with the fuel delivery ledger in some [`Role`].
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`]
    pub id: Id,

    /// [`Name`] of this [`User`].
    pub name: Name,

    /// [`Login`] of this [`User`].
    pub login: Login,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`Email`] of this [`User`].
    pub email: Option<Email>,

    /// [`Phone`] of this [`User`].
    pub phone: Option<Phone>,

    /// [`Role`] of this [`User`].
    pub role: Role,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`User`] was deleted.
    pub deleted_at: Option<DeletionDateTime>,
}

impl User {
    /// Indicates whether this [`User`] is staff: an [`Role::Admin`] or an
    /// [`Role::Owner`].
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Indicates whether this [`User`] is an [`Role::Owner`].
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    /// Narrows the provided `(client, driver)` party filter down to the
    /// parties this [`User`] is allowed to see.
    ///
    /// Clients see what is issued to them, drivers see what is assigned to
    /// them, while staff see everything.
    #[must_use]
    pub fn scope_parties(
        &self,
        client_id: Option<Id>,
        driver_id: Option<Id>,
    ) -> (Option<Id>, Option<Id>) {
        match self.role {
            Role::Client => (Some(self.id), driver_id),
            Role::Driver => (client_id, Some(self.id)),
            Role::Admin | Role::Owner => (client_id, driver_id),
        }
    }
}

define_kind! {
    #[doc = "Role of a [`User`]."]
    enum Role {
        #[doc = "Orders fuel and pays invoices."]
        Client = 1,

        #[doc = "Delivers fuel and reports truck locations."]
        Driver = 2,

        #[doc = "Manages invoices and deliveries."]
        Admin = 3,

        #[doc = "Manages everything, including prices."]
        Owner = 4,
    }
}

impl Role {
    /// Indicates whether this [`Role`] is a staff one.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Owner)
    }

    /// Indicates whether a [`User`] in this [`Role`] may create a [`User`]
    /// in the provided one.
    #[must_use]
    pub const fn may_create(self, role: Self) -> bool {
        match self {
            Self::Owner => true,
            Self::Admin => matches!(role, Self::Client | Self::Driver),
            Self::Client | Self::Driver => false,
        }
    }
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Login of a [`User`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Login(String);

impl Login {
    /// Creates a new [`Login`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `login` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    /// Creates a new [`Login`] if the given `login` is valid.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Option<Self> {
        let login = login.into();
        Self::check(&login).then_some(Self(login))
    }

    /// Checks whether the given `login` is a valid [`Login`].
    fn check(login: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Login`] consists of 2 to 100
        /// letters or digits.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\S[\p{L}\p{N}]{0,98}\S$").expect("valid regex")
        });

        REGEX.is_match(login.as_ref())
    }
}

impl FromStr for Login {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Login`")
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Display, Eq, From, PartialEq)]
#[from(&str, String)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `password` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        (6..=72).contains(&password.len())
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [`bcrypt`] hash of a [`User`]'s [`Password`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// [`bcrypt`] cost used for hashing.
    #[cfg(not(test))]
    const COST: u32 = bcrypt::DEFAULT_COST;
    #[cfg(test)]
    const COST: u32 = 4;

    /// Hashes the given [`Password`].
    ///
    /// # Errors
    ///
    /// If [`bcrypt`] fails to hash the [`Password`].
    pub fn new(password: &Password) -> Result<Self, bcrypt::BcryptError> {
        bcrypt::hash(&password.0, Self::COST).map(Self)
    }

    /// Verifies the given [`Password`] against this [`PasswordHash`].
    ///
    /// Malformed hashes never match.
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        bcrypt::verify(&password.0, &self.0).unwrap_or(false)
    }
}

/// Email address of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `address` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                "^([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                  |\\x5c[\\x00-\\x7f])*\\x22)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x22))*\\x40\
                  ([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d))*$",
            )
            .expect("valid regex")
        });

        REGEX.is_match(address.as_ref())
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Phone number of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `number` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Phone`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^([+]?\d{1,2}[-\s]?|)\d{3}[-\s]?\d{3}[-\s]?\d{4}$")
                .expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

/// [`DateTime`] when a [`User`] was deleted.
pub type DeletionDateTime = DateTimeOf<(User, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{Id, Login, Name, Password, PasswordHash, Phone, Role, User};

    fn user(role: Role) -> User {
        User {
            id: Id::new(),
            name: Name::new("Jane Doe").unwrap(),
            login: Login::new("jane").unwrap(),
            password_hash: PasswordHash::new(&Password::new("s3cr3t-pass").unwrap())
                .unwrap(),
            email: None,
            phone: None,
            role,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        }
    }

    #[test]
    fn scopes_parties_by_role() {
        let (someone, other) = (Id::new(), Id::new());

        let client = user(Role::Client);
        assert_eq!(
            client.scope_parties(Some(someone), Some(other)),
            (Some(client.id), Some(other)),
        );
        assert_eq!(client.scope_parties(None, None), (Some(client.id), None));

        let driver = user(Role::Driver);
        assert_eq!(
            driver.scope_parties(Some(someone), Some(other)),
            (Some(someone), Some(driver.id)),
        );
        assert_eq!(driver.scope_parties(None, None), (None, Some(driver.id)));

        for role in [Role::Admin, Role::Owner] {
            let staff = user(role);
            assert_eq!(
                staff.scope_parties(Some(someone), None),
                (Some(someone), None),
            );
            assert_eq!(staff.scope_parties(None, None), (None, None));
        }
    }

    #[test]
    fn login_format() {
        assert!(Login::new("driver01").is_some());
        assert!(Login::new("ab").is_some());

        assert!(Login::new("a").is_none());
        assert!(Login::new("john doe").is_none());
        assert!(Login::new("john@doe").is_none());
    }

    #[test]
    fn phone_format() {
        assert!(Phone::new("+1 555 123 4567").is_some());
        assert!(Phone::new("555-123-4567").is_some());

        assert!(Phone::new("12345").is_none());
    }

    #[test]
    fn verifies_password_hash() {
        let password = Password::new("s3cr3t-pass").unwrap();
        let hash = PasswordHash::new(&password).unwrap();

        assert!(hash.verify(&password));
        assert!(!hash.verify(&Password::new("other-pass").unwrap()));
        assert_ne!(hash.to_string(), "s3cr3t-pass");
    }

    #[test]
    fn role_hierarchy() {
        assert!(Role::Owner.may_create(Role::Owner));
        assert!(Role::Owner.may_create(Role::Admin));
        assert!(Role::Admin.may_create(Role::Driver));
        assert!(Role::Admin.may_create(Role::Client));

        assert!(!Role::Admin.may_create(Role::Owner));
        assert!(!Role::Admin.may_create(Role::Admin));
        assert!(!Role::Client.may_create(Role::Client));
        assert!(!Role::Driver.may_create(Role::Client));

        assert!(Role::Admin.is_staff());
        assert!(Role::Owner.is_staff());
        assert!(!Role::Driver.is_staff());
    }
}
