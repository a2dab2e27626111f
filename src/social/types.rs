//! Core types for accounts, messaging, groups and alerts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::discovery::{GroupId, UserId, UserSnapshot};
use crate::location::Coordinate;

/// Gender recorded on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    /// Stored as `M`.
    #[default]
    #[serde(rename = "M")]
    Male,
    /// Stored as `F`.
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID.
    pub id: UserId,
    /// Unique public username.
    pub username: String,
    /// Unique e-mail address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Gender.
    pub gender: Gender,
    /// Free-form profile text.
    pub description: String,
    /// Profile picture reference (URL or encoded image).
    pub profile_picture: String,
    /// Last known location; the placeholder until the user sets one.
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Last authenticated request.
    pub last_activity: DateTime<Utc>,
}

impl UserProfile {
    /// Age in full years on `today`.
    #[must_use]
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.date_of_birth).unwrap_or(0)
    }

    /// Whether the user never set a location.
    #[must_use]
    pub fn has_placeholder_location(&self) -> bool {
        self.coordinate.is_placeholder()
    }

    /// The ranking projection of this profile.
    #[must_use]
    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.id,
            username: self.username.clone(),
            coordinate: self.coordinate,
            last_activity: self.last_activity,
        }
    }
}

/// Profile with derived fields, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    /// The stored profile.
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Age in full years.
    pub age: u32,
    /// Number of users this user follows.
    pub number_of_following: u64,
    /// Number of users following this user.
    pub number_of_followers: u64,
    /// Whether the user is online.
    pub online: bool,
    /// Groups the user belongs to.
    pub groups: Vec<Group>,
}

/// Registration data for a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique public username.
    pub username: String,
    /// Unique e-mail address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Gender.
    pub gender: Gender,
    /// Initial location; the placeholder when `None`.
    pub coordinate: Option<Coordinate>,
}

impl NewUser {
    /// Creates registration data with empty names and no location.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            date_of_birth,
            gender: Gender::default(),
            coordinate: None,
        }
    }

    /// Sets first and last name.
    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    /// Sets the gender.
    #[must_use]
    pub const fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    /// Sets the initial location.
    #[must_use]
    pub const fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }
}

/// Partial update of a profile. Fields left as `None` keep their value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub coordinate: Option<Coordinate>,
    pub description: Option<String>,
    pub profile_picture: Option<String>,
}

impl ProfileUpdate {
    /// An update that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the e-mail address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets first and last name.
    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    #[must_use]
    pub const fn with_date_of_birth(mut self, date_of_birth: NaiveDate) -> Self {
        self.date_of_birth = Some(date_of_birth);
        self
    }

    #[must_use]
    pub const fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    #[must_use]
    pub const fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_profile_picture(mut self, profile_picture: impl Into<String>) -> Self {
        self.profile_picture = Some(profile_picture.into());
        self
    }

    /// Applies the set fields to `profile`.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(username) = &self.username {
            profile.username.clone_from(username);
        }
        if let Some(email) = &self.email {
            profile.email.clone_from(email);
        }
        if let Some(first_name) = &self.first_name {
            profile.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &self.last_name {
            profile.last_name.clone_from(last_name);
        }
        if let Some(date_of_birth) = self.date_of_birth {
            profile.date_of_birth = date_of_birth;
        }
        if let Some(gender) = self.gender {
            profile.gender = gender;
        }
        if let Some(coordinate) = self.coordinate {
            profile.coordinate = coordinate;
        }
        if let Some(description) = &self.description {
            profile.description.clone_from(description);
        }
        if let Some(profile_picture) = &self.profile_picture {
            profile.profile_picture.clone_from(profile_picture);
        }
    }
}

/// A direct message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message ID.
    pub id: i64,
    /// Sender user ID.
    pub sender: UserId,
    /// Receiver user ID.
    pub receiver: UserId,
    /// Message body.
    pub text: String,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
}

/// A password-protected group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group ID.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Logo URL.
    pub logo_url: String,
    /// Group website URL.
    pub site_url: String,
}

/// Data for creating a group.
#[derive(Clone)]
pub struct NewGroup {
    /// Display name.
    pub name: String,
    /// Logo URL.
    pub logo_url: String,
    /// Group website URL.
    pub site_url: String,
    /// Join password, in the clear. Hashed before storage.
    pub password: String,
}

impl NewGroup {
    /// Creates group data with empty URLs.
    #[must_use]
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logo_url: String::new(),
            site_url: String::new(),
            password: password.into(),
        }
    }

    /// Sets the logo URL.
    #[must_use]
    pub fn with_logo_url(mut self, url: impl Into<String>) -> Self {
        self.logo_url = url.into();
        self
    }

    /// Sets the website URL.
    #[must_use]
    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = url.into();
        self
    }
}

impl std::fmt::Debug for NewGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewGroup")
            .field("name", &self.name)
            .field("logo_url", &self.logo_url)
            .field("site_url", &self.site_url)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Group summary with its member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDetail {
    /// Group ID.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Logo URL.
    pub logo_url: String,
    /// Number of members.
    pub user_count: u64,
}

/// A time-windowed announcement posted to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert ID.
    pub id: i64,
    /// Headline.
    pub title: String,
    /// Body.
    pub content: String,
    /// First instant the alert is shown.
    pub start_date: DateTime<Utc>,
    /// Last instant the alert is shown.
    pub end_date: DateTime<Utc>,
    /// Group the alert belongs to.
    pub group: GroupId,
    /// Presentation hint (e.g. `primary`, `warning`).
    pub style: String,
}

impl Alert {
    /// Whether `now` falls inside `[start_date, end_date]`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }
}

/// Data for creating an alert.
#[derive(Debug, Clone)]
pub struct NewAlert {
    /// Headline.
    pub title: String,
    /// Body.
    pub content: String,
    /// First instant the alert is shown.
    pub start_date: DateTime<Utc>,
    /// Last instant the alert is shown.
    pub end_date: DateTime<Utc>,
    /// Group the alert belongs to.
    pub group: GroupId,
    /// Presentation hint.
    pub style: String,
}

/// One page of active alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPage {
    /// Total number of active alerts across all pages.
    pub count: u64,
    /// Next page number, if any.
    pub next: Option<u32>,
    /// Previous page number, if any.
    pub previous: Option<u32>,
    /// Alerts on this page, soonest-ending first.
    pub results: Vec<Alert>,
}
