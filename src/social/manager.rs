//! High-level social API.
//!
//! [`SocialManager`] validates requests and applies the account, friendship,
//! blocking, messaging, group and alert rules on top of [`SocialStorage`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::credentials::CredentialVerifier;
use super::error::{Result, SocialError};
use super::storage::SocialStorage;
use super::types::{
    Alert, AlertPage, Group, GroupDetail, Message, NewAlert, NewGroup, NewUser, ProfileUpdate,
    ProfileView, UserProfile,
};
use crate::config::CoreSettings;
use crate::discovery::{BlockFilter, GroupId, PresenceEvaluator, UserId};
use crate::location::Coordinate;

/// Default number of alerts per page.
pub const DEFAULT_ALERT_PAGE_SIZE: u32 = 2;

/// Largest page size a caller may ask for.
pub const DEFAULT_MAX_ALERT_PAGE_SIZE: u32 = 100;

/// High-level API for accounts, relationships, messages, groups and alerts.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use nearby_core::social::{SaltedSha256Verifier, SocialManager, SocialStorage};
///
/// let storage = Arc::new(SocialStorage::new(path)?);
/// let manager = SocialManager::new(storage, SaltedSha256Verifier);
/// let profile = manager.user_profile(user_id, chrono::Utc::now())?;
/// ```
pub struct SocialManager<V> {
    storage: Arc<SocialStorage>,
    verifier: V,
    presence: PresenceEvaluator,
    alert_page_size: u32,
    max_alert_page_size: u32,
}

impl<V: CredentialVerifier> SocialManager<V> {
    /// Creates a manager with default presence and paging.
    #[must_use]
    pub fn new(storage: Arc<SocialStorage>, verifier: V) -> Self {
        Self {
            storage,
            verifier,
            presence: PresenceEvaluator::default(),
            alert_page_size: DEFAULT_ALERT_PAGE_SIZE,
            max_alert_page_size: DEFAULT_MAX_ALERT_PAGE_SIZE,
        }
    }

    /// Creates a manager configured from settings.
    #[must_use]
    pub fn from_settings(storage: Arc<SocialStorage>, verifier: V, settings: &CoreSettings) -> Self {
        Self {
            storage,
            verifier,
            presence: PresenceEvaluator::from_secs(settings.online_threshold_secs),
            alert_page_size: settings.alert_page_size,
            max_alert_page_size: settings.max_alert_page_size,
        }
    }

    /// The underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &Arc<SocialStorage> {
        &self.storage
    }

    // ==================== Accounts ====================

    /// Registers a new user.
    ///
    /// The user starts at the placeholder location unless one is given, and
    /// counts as active at `now`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` for a blank username or e-mail, or
    /// `AlreadyExists` if either is taken.
    pub fn register_user(&self, user: &NewUser, now: DateTime<Utc>) -> Result<UserProfile> {
        if user.username.trim().is_empty() {
            return Err(SocialError::InvalidData("Username is required".to_string()));
        }
        if user.email.trim().is_empty() {
            return Err(SocialError::InvalidData("Email is required".to_string()));
        }

        let profile = self.storage.insert_user(user, now)?;
        info!(user = profile.id, username = %profile.username, "Registered user");
        Ok(profile)
    }

    /// Every registered user, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_users(&self) -> Result<Vec<UserProfile>> {
        self.storage.list_users()
    }

    /// A user's profile with age, follow counts, presence and groups.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user doesn't exist.
    pub fn user_profile(&self, id: UserId, now: DateTime<Utc>) -> Result<ProfileView> {
        let profile = self.require_user(id)?;
        let (number_of_following, number_of_followers) = self.storage.follow_counts(id)?;

        Ok(ProfileView {
            age: profile.age_on(now.date_naive()),
            number_of_following,
            number_of_followers,
            online: self.presence.is_online(profile.last_activity, now),
            groups: self.storage.groups_for_user(id)?,
            profile,
        })
    }

    /// Moves a user.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` for an out-of-range coordinate or `NotFound` if
    /// the user doesn't exist.
    pub fn update_location(&self, id: UserId, coordinate: Coordinate) -> Result<()> {
        self.storage.update_location(id, coordinate)?;
        debug!(user = id, "Updated location");
        Ok(())
    }

    /// Changes the fields set in `update` and returns the new profile.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` for a blank username or e-mail or an
    /// out-of-range coordinate, `NotFound` if the user doesn't exist, or
    /// `AlreadyExists` if the new username or e-mail is taken.
    pub fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> Result<UserProfile> {
        if update.username.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(SocialError::InvalidData("Username is required".to_string()));
        }
        if update.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
            return Err(SocialError::InvalidData("Email is required".to_string()));
        }

        let profile = self.storage.update_profile(id, update)?;
        debug!(user = id, "Updated profile");
        Ok(profile)
    }

    /// Records that `id` made an authenticated request at `now`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user doesn't exist.
    pub fn touch_activity(&self, id: UserId, now: DateTime<Utc>) -> Result<()> {
        self.storage.touch_activity(id, now)
    }

    /// Deletes a user with their messages, follows, blocks and memberships.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user doesn't exist.
    pub fn delete_user(&self, id: UserId) -> Result<()> {
        self.storage.delete_user(id)?;
        info!(user = id, "Deleted user");
        Ok(())
    }

    // ==================== Friendships ====================

    /// `person` starts following `friend`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` for a self-follow, `NotFound` for an unknown
    /// user, or `AlreadyExists` if already following.
    pub fn follow(&self, person: UserId, friend: UserId) -> Result<()> {
        if person == friend {
            return Err(SocialError::InvalidData(
                "Users cannot follow themselves".to_string(),
            ));
        }
        self.require_user(person)?;
        self.require_user(friend)?;
        self.storage.insert_follow(person, friend)?;
        debug!(person, friend, "Followed");
        Ok(())
    }

    /// `person` stops following `friend`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `person` doesn't follow `friend`.
    pub fn unfollow(&self, person: UserId, friend: UserId) -> Result<()> {
        if !self.storage.delete_follow(person, friend)? {
            return Err(SocialError::NotFound(format!(
                "User {person} does not follow {friend}"
            )));
        }
        debug!(person, friend, "Unfollowed");
        Ok(())
    }

    /// Users `person` follows.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user doesn't exist.
    pub fn following(&self, person: UserId) -> Result<Vec<UserProfile>> {
        self.require_user(person)?;
        self.storage.list_following(person)
    }

    // ==================== Blocking ====================

    /// `blocker` blocks `blocked`. Blocking twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` for a self-block or `NotFound` for an unknown
    /// user.
    pub fn block(&self, blocker: UserId, blocked: UserId, now: DateTime<Utc>) -> Result<()> {
        if blocker == blocked {
            return Err(SocialError::InvalidData(
                "Users cannot block themselves".to_string(),
            ));
        }
        self.require_user(blocker)?;
        self.require_user(blocked)?;
        if self.storage.insert_block(blocker, blocked, now)? {
            info!(blocker, blocked, "Blocked user");
        }
        Ok(())
    }

    /// Lifts a block.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there was no such block.
    pub fn unblock(&self, blocker: UserId, blocked: UserId) -> Result<()> {
        if !self.storage.delete_block(blocker, blocked)? {
            return Err(SocialError::NotFound(format!(
                "User {blocker} has not blocked {blocked}"
            )));
        }
        info!(blocker, blocked, "Unblocked user");
        Ok(())
    }

    /// Users `blocker` has blocked.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user doesn't exist.
    pub fn blocked_users(&self, blocker: UserId) -> Result<Vec<UserProfile>> {
        self.require_user(blocker)?;
        self.storage.list_blocked(blocker)
    }

    // ==================== Messaging ====================

    /// Sends a message.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown sender or receiver, `InvalidData`
    /// for blank text, or `PermissionDenied` if either side blocked the
    /// other.
    pub fn post_message(
        &self,
        sender: UserId,
        receiver: UserId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Message> {
        self.require_user(sender)?;
        self.require_user(receiver)?;
        if text.trim().is_empty() {
            return Err(SocialError::InvalidData(
                "Message text is required".to_string(),
            ));
        }

        let filter = BlockFilter::new(self.storage.block_relations_for(sender)?);
        if let Err(e) = filter.ensure_can_message(sender, receiver) {
            warn!(sender, receiver, "Message refused between blocked users");
            return Err(e.into());
        }

        let message = self.storage.insert_message(sender, receiver, text, now)?;
        debug!(message = message.id, sender, receiver, "Posted message");
        Ok(message)
    }

    /// Messages between `a` and `b`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either user doesn't exist.
    pub fn conversation(&self, a: UserId, b: UserId) -> Result<Vec<Message>> {
        self.require_user(a)?;
        self.require_user(b)?;
        self.storage.conversation(a, b)
    }

    // ==================== Groups ====================

    /// Creates a group. The creator becomes its first member.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` for a blank name or password, `NotFound` for an
    /// unknown creator, or `Credential` if hashing fails.
    pub fn create_group(
        &self,
        creator: UserId,
        group: &NewGroup,
        now: DateTime<Utc>,
    ) -> Result<Group> {
        if group.name.trim().is_empty() {
            return Err(SocialError::InvalidData("Group name is required".to_string()));
        }
        if group.password.is_empty() {
            return Err(SocialError::InvalidData(
                "Group password is required".to_string(),
            ));
        }
        self.require_user(creator)?;

        let password_hash = self.verifier.hash(&group.password)?;
        let created = self.storage.insert_group(
            &group.name,
            &group.logo_url,
            &group.site_url,
            &password_hash,
        )?;
        self.storage.add_group_member(created.id, creator, now)?;

        info!(group = created.id, creator, "Created group");
        Ok(created)
    }

    /// Joins a group with its password. Joining again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user or group, or
    /// `InvalidCredentials` for a wrong password.
    pub fn join_group(
        &self,
        user: UserId,
        group: GroupId,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<GroupDetail> {
        self.require_user(user)?;
        let stored = self
            .storage
            .group_password_hash(group)?
            .ok_or_else(|| SocialError::NotFound(format!("Group {group}")))?;

        if !self.verifier.verify(password, &stored) {
            warn!(user, group, "Rejected group join with wrong password");
            return Err(SocialError::InvalidCredentials(
                "Incorrect password".to_string(),
            ));
        }

        if self.storage.add_group_member(group, user, now)? {
            info!(user, group, "Joined group");
        }
        self.group_detail(group)
    }

    /// Leaves a group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user is not a member.
    pub fn leave_group(&self, user: UserId, group: GroupId) -> Result<()> {
        if !self.storage.remove_group_member(group, user)? {
            return Err(SocialError::NotFound(format!(
                "User {user} is not a member of group {group}"
            )));
        }
        info!(user, group, "Left group");
        Ok(())
    }

    /// A group with its member count.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the group doesn't exist.
    pub fn group_detail(&self, group: GroupId) -> Result<GroupDetail> {
        let found = self
            .storage
            .get_group(group)?
            .ok_or_else(|| SocialError::NotFound(format!("Group {group}")))?;
        Ok(GroupDetail {
            id: found.id,
            name: found.name,
            logo_url: found.logo_url,
            user_count: self.storage.group_member_count(group)?,
        })
    }

    /// Groups a user belongs to.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user doesn't exist.
    pub fn user_groups(&self, user: UserId) -> Result<Vec<Group>> {
        self.require_user(user)?;
        self.storage.groups_for_user(user)
    }

    // ==================== Alerts ====================

    /// Posts an alert to a group.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` for a blank title or an end before the start,
    /// or `NotFound` if the group doesn't exist.
    pub fn create_alert(&self, alert: &NewAlert) -> Result<Alert> {
        if alert.title.trim().is_empty() {
            return Err(SocialError::InvalidData("Alert title is required".to_string()));
        }
        if alert.end_date < alert.start_date {
            return Err(SocialError::InvalidData(
                "Alert end date precedes its start date".to_string(),
            ));
        }
        if self.storage.get_group(alert.group)?.is_none() {
            return Err(SocialError::NotFound(format!("Group {}", alert.group)));
        }

        let created = self.storage.insert_alert(alert)?;
        info!(alert = created.id, group = created.group, "Created alert");
        Ok(created)
    }

    /// One page of the alerts active at `now` in the user's groups,
    /// soonest-ending first.
    ///
    /// `page` starts at 1. `page_size` falls back to the configured default
    /// and is capped at the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user or `InvalidData` for a page
    /// past the last one.
    pub fn active_alerts(
        &self,
        user: UserId,
        now: DateTime<Utc>,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<AlertPage> {
        self.require_user(user)?;
        let size = page_size
            .unwrap_or(self.alert_page_size)
            .clamp(1, self.max_alert_page_size.max(1));
        let page = page.unwrap_or(1);

        let count = self.storage.count_active_alerts(user, now)?;
        let pages = count.div_ceil(u64::from(size)).max(1);
        if page == 0 || u64::from(page) > pages {
            return Err(SocialError::InvalidData(format!("Invalid page: {page}")));
        }

        let offset = u64::from(page - 1) * u64::from(size);
        let results = self.storage.active_alerts(user, now, size, offset)?;

        Ok(AlertPage {
            count,
            next: (u64::from(page) < pages).then(|| page + 1),
            previous: (page > 1).then(|| page - 1),
            results,
        })
    }

    fn require_user(&self, id: UserId) -> Result<UserProfile> {
        self.storage
            .get_user(id)?
            .ok_or_else(|| SocialError::NotFound(format!("User {id}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone};

    use super::*;
    use crate::social::credentials::SaltedSha256Verifier;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn manager() -> SocialManager<SaltedSha256Verifier> {
        let storage = Arc::new(SocialStorage::in_memory().unwrap());
        SocialManager::new(storage, SaltedSha256Verifier)
    }

    fn register(manager: &SocialManager<SaltedSha256Verifier>, name: &str) -> UserProfile {
        let user = NewUser::new(
            name,
            format!("{name}@example.com"),
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        );
        manager.register_user(&user, t(0)).unwrap()
    }

    fn alert(group: GroupId, title: &str, start: i64, end: i64) -> NewAlert {
        NewAlert {
            title: title.to_string(),
            content: format!("{title} body"),
            start_date: t(start),
            end_date: t(end),
            group,
            style: "info".to_string(),
        }
    }

    // ==================== Account Tests ====================

    #[test]
    fn register_rejects_blank_username() {
        let m = manager();
        let user = NewUser::new("  ", "x@example.com", NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert!(matches!(
            m.register_user(&user, t(0)),
            Err(SocialError::InvalidData(_))
        ));
    }

    #[test]
    fn register_rejects_blank_email() {
        let m = manager();
        let user = NewUser::new("ola", "", NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert!(matches!(
            m.register_user(&user, t(0)),
            Err(SocialError::InvalidData(_))
        ));
    }

    #[test]
    fn profile_view_has_counts_age_and_presence() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        m.follow(a.id, b.id).unwrap();

        let view = m.user_profile(b.id, t(30)).unwrap();
        assert_eq!(view.number_of_followers, 1);
        assert_eq!(view.number_of_following, 0);
        assert_eq!(view.age, 23);
        assert!(view.online);

        let later = m.user_profile(b.id, t(120)).unwrap();
        assert!(!later.online);
    }

    #[test]
    fn touch_activity_brings_user_online() {
        let m = manager();
        let a = register(&m, "a");
        m.touch_activity(a.id, t(500)).unwrap();
        assert!(m.user_profile(a.id, t(530)).unwrap().online);
    }

    #[test]
    fn update_location_validates_range() {
        let m = manager();
        let a = register(&m, "a");
        let bad = Coordinate {
            latitude: 95.0,
            longitude: 0.0,
        };
        assert!(matches!(
            m.update_location(a.id, bad),
            Err(SocialError::InvalidData(_))
        ));
        m.update_location(a.id, Coordinate::new(1.0, 2.0).unwrap())
            .unwrap();
    }

    #[test]
    fn list_users_includes_everyone() {
        let m = manager();
        assert!(m.list_users().unwrap().is_empty());
        let a = register(&m, "a");
        let b = register(&m, "b");
        let names: Vec<_> = m
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();
        assert_eq!(names, vec![(a.id, "a".to_string()), (b.id, "b".to_string())]);
    }

    #[test]
    fn update_profile_applies_partial_changes() {
        let m = manager();
        let a = register(&m, "a");
        let update = ProfileUpdate::new()
            .with_email("new@example.com")
            .with_date_of_birth(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
            .with_coordinate(Coordinate::new(1.0, 2.0).unwrap());

        let updated = m.update_profile(a.id, &update).unwrap();
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.username, "a");

        let view = m.user_profile(a.id, t(0)).unwrap();
        assert_eq!(view.profile, updated);
        assert_eq!(view.age, 33);
        assert_eq!(view.profile.coordinate, Coordinate::new(1.0, 2.0).unwrap());
    }

    #[test]
    fn update_profile_rejects_blank_identity_and_bad_location() {
        let m = manager();
        let a = register(&m, "a");
        for update in [
            ProfileUpdate::new().with_username(" "),
            ProfileUpdate::new().with_email(""),
            ProfileUpdate::new().with_coordinate(Coordinate {
                latitude: 0.0,
                longitude: 200.0,
            }),
        ] {
            assert!(matches!(
                m.update_profile(a.id, &update),
                Err(SocialError::InvalidData(_))
            ));
        }
        assert_eq!(m.user_profile(a.id, t(0)).unwrap().profile, a);
        assert!(matches!(
            m.update_profile(404, &ProfileUpdate::new().with_description("x")),
            Err(SocialError::NotFound(_))
        ));
    }

    #[test]
    fn profile_view_lists_groups() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        assert!(m.user_profile(b.id, t(0)).unwrap().groups.is_empty());

        let group = m.create_group(a.id, &NewGroup::new("Hikers", "pw"), t(0)).unwrap();
        m.join_group(b.id, group.id, "pw", t(1)).unwrap();

        let view = m.user_profile(b.id, t(1)).unwrap();
        assert_eq!(view.groups, vec![group]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["groups"][0]["name"], "Hikers");
        assert_eq!(json["username"], "b");
    }

    #[test]
    fn profile_of_unknown_user_is_not_found() {
        let m = manager();
        assert!(matches!(
            m.user_profile(9, t(0)),
            Err(SocialError::NotFound(_))
        ));
    }

    // ==================== Friendship Tests ====================

    #[test]
    fn self_follow_rejected() {
        let m = manager();
        let a = register(&m, "a");
        assert!(matches!(
            m.follow(a.id, a.id),
            Err(SocialError::InvalidData(_))
        ));
    }

    #[test]
    fn follow_twice_is_already_exists() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        m.follow(a.id, b.id).unwrap();
        assert!(matches!(
            m.follow(a.id, b.id),
            Err(SocialError::AlreadyExists(_))
        ));
    }

    #[test]
    fn unfollow_missing_is_not_found() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        assert!(matches!(
            m.unfollow(a.id, b.id),
            Err(SocialError::NotFound(_))
        ));
        m.follow(a.id, b.id).unwrap();
        m.unfollow(a.id, b.id).unwrap();
        assert!(m.following(a.id).unwrap().is_empty());
    }

    // ==================== Blocking and Messaging Tests ====================

    #[test]
    fn block_is_idempotent() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        m.block(a.id, b.id, t(0)).unwrap();
        m.block(a.id, b.id, t(1)).unwrap();
        assert_eq!(m.blocked_users(a.id).unwrap().len(), 1);
    }

    #[test]
    fn self_block_rejected() {
        let m = manager();
        let a = register(&m, "a");
        assert!(matches!(
            m.block(a.id, a.id, t(0)),
            Err(SocialError::InvalidData(_))
        ));
    }

    #[test]
    fn blocked_pair_cannot_message_either_way() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        m.block(b.id, a.id, t(0)).unwrap();

        assert!(matches!(
            m.post_message(a.id, b.id, "hi", t(1)),
            Err(SocialError::PermissionDenied(_))
        ));
        assert!(matches!(
            m.post_message(b.id, a.id, "hi", t(1)),
            Err(SocialError::PermissionDenied(_))
        ));

        m.unblock(b.id, a.id).unwrap();
        m.post_message(a.id, b.id, "hi", t(2)).unwrap();
    }

    #[test]
    fn blank_message_rejected() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        assert!(matches!(
            m.post_message(a.id, b.id, "   ", t(0)),
            Err(SocialError::InvalidData(_))
        ));
    }

    #[test]
    fn message_to_unknown_user_is_not_found() {
        let m = manager();
        let a = register(&m, "a");
        assert!(matches!(
            m.post_message(a.id, 77, "hi", t(0)),
            Err(SocialError::NotFound(_))
        ));
    }

    #[test]
    fn conversation_collects_both_directions() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        m.post_message(a.id, b.id, "one", t(1)).unwrap();
        m.post_message(b.id, a.id, "two", t(2)).unwrap();

        let texts: Vec<_> = m
            .conversation(b.id, a.id)
            .unwrap()
            .into_iter()
            .map(|msg| msg.text)
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    // ==================== Group Tests ====================

    #[test]
    fn creator_joins_own_group() {
        let m = manager();
        let a = register(&m, "a");
        let group = m.create_group(a.id, &NewGroup::new("Hikers", "pw"), t(0)).unwrap();
        assert_eq!(m.group_detail(group.id).unwrap().user_count, 1);
    }

    #[test]
    fn join_with_wrong_password_fails() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        let group = m.create_group(a.id, &NewGroup::new("Hikers", "pw"), t(0)).unwrap();

        assert!(matches!(
            m.join_group(b.id, group.id, "nope", t(1)),
            Err(SocialError::InvalidCredentials(_))
        ));
        let detail = m.join_group(b.id, group.id, "pw", t(1)).unwrap();
        assert_eq!(detail.user_count, 2);

        let again = m.join_group(b.id, group.id, "pw", t(2)).unwrap();
        assert_eq!(again.user_count, 2);
    }

    #[test]
    fn join_unknown_group_is_not_found() {
        let m = manager();
        let a = register(&m, "a");
        assert!(matches!(
            m.join_group(a.id, 404, "pw", t(0)),
            Err(SocialError::NotFound(_))
        ));
    }

    #[test]
    fn leave_group_requires_membership() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        let group = m.create_group(a.id, &NewGroup::new("g", "pw"), t(0)).unwrap();

        assert!(matches!(
            m.leave_group(b.id, group.id),
            Err(SocialError::NotFound(_))
        ));
        m.leave_group(a.id, group.id).unwrap();
        assert_eq!(m.group_detail(group.id).unwrap().user_count, 0);
    }

    #[test]
    fn create_group_requires_name_and_password() {
        let m = manager();
        let a = register(&m, "a");
        assert!(matches!(
            m.create_group(a.id, &NewGroup::new("", "pw"), t(0)),
            Err(SocialError::InvalidData(_))
        ));
        assert!(matches!(
            m.create_group(a.id, &NewGroup::new("g", ""), t(0)),
            Err(SocialError::InvalidData(_))
        ));
    }

    struct BrokenHasher;

    impl CredentialVerifier for BrokenHasher {
        fn hash(&self, _password: &str) -> Result<String> {
            Err(SocialError::Credential("entropy source unavailable".to_string()))
        }

        fn verify(&self, _password: &str, _stored: &str) -> bool {
            false
        }
    }

    #[test]
    fn hashing_failure_creates_no_group() {
        let storage = Arc::new(SocialStorage::in_memory().unwrap());
        let m = SocialManager::new(Arc::clone(&storage), BrokenHasher);
        let user = NewUser::new("a", "a@example.com", NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let a = m.register_user(&user, t(0)).unwrap();

        assert!(matches!(
            m.create_group(a.id, &NewGroup::new("g", "pw"), t(0)),
            Err(SocialError::Credential(_))
        ));
        assert!(m.user_groups(a.id).unwrap().is_empty());
        assert!(storage.get_group(1).unwrap().is_none());
    }

    // ==================== Alert Tests ====================

    #[test]
    fn alert_end_before_start_rejected() {
        let m = manager();
        let a = register(&m, "a");
        let group = m.create_group(a.id, &NewGroup::new("g", "pw"), t(0)).unwrap();
        assert!(matches!(
            m.create_alert(&alert(group.id, "x", 100, 50)),
            Err(SocialError::InvalidData(_))
        ));
    }

    #[test]
    fn alert_for_unknown_group_is_not_found() {
        let m = manager();
        assert!(matches!(
            m.create_alert(&alert(5, "x", 0, 50)),
            Err(SocialError::NotFound(_))
        ));
    }

    #[test]
    fn active_alerts_paginate_by_default_size() {
        let m = manager();
        let a = register(&m, "a");
        let group = m.create_group(a.id, &NewGroup::new("g", "pw"), t(0)).unwrap();
        for (i, end) in [300, 100, 200].into_iter().enumerate() {
            m.create_alert(&alert(group.id, &format!("a{i}"), 0, end))
                .unwrap();
        }

        let first = m.active_alerts(a.id, t(50), None, None).unwrap();
        assert_eq!(first.count, 3);
        assert_eq!(first.next, Some(2));
        assert_eq!(first.previous, None);
        let titles: Vec<_> = first.results.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2"]);

        let second = m.active_alerts(a.id, t(50), Some(2), None).unwrap();
        assert_eq!(second.next, None);
        assert_eq!(second.previous, Some(1));
        assert_eq!(second.results.len(), 1);
        assert_eq!(second.results[0].title, "a0");
    }

    #[test]
    fn active_alerts_out_of_range_page() {
        let m = manager();
        let a = register(&m, "a");
        assert!(matches!(
            m.active_alerts(a.id, t(0), Some(2), None),
            Err(SocialError::InvalidData(_))
        ));
        assert!(matches!(
            m.active_alerts(a.id, t(0), Some(0), None),
            Err(SocialError::InvalidData(_))
        ));
    }

    #[test]
    fn empty_first_page_is_allowed() {
        let m = manager();
        let a = register(&m, "a");
        let page = m.active_alerts(a.id, t(0), None, None).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
        assert_eq!(page.next, None);
    }

    #[test]
    fn page_size_is_capped() {
        let storage = Arc::new(SocialStorage::in_memory().unwrap());
        let settings = CoreSettings {
            max_alert_page_size: 3,
            ..CoreSettings::default()
        };
        let m = SocialManager::from_settings(storage, SaltedSha256Verifier, &settings);
        let a = register(&m, "a");
        let group = m.create_group(a.id, &NewGroup::new("g", "pw"), t(0)).unwrap();
        for i in 0..5 {
            m.create_alert(&alert(group.id, &format!("a{i}"), 0, 100 + i))
                .unwrap();
        }

        let page = m.active_alerts(a.id, t(10), None, Some(50)).unwrap();
        assert_eq!(page.results.len(), 3);
        assert_eq!(page.next, Some(2));
    }

    #[test]
    fn expired_alerts_are_hidden() {
        let m = manager();
        let a = register(&m, "a");
        let group = m.create_group(a.id, &NewGroup::new("g", "pw"), t(0)).unwrap();
        m.create_alert(&alert(group.id, "old", 0, 10)).unwrap();
        let page = m
            .active_alerts(a.id, t(0) + Duration::seconds(11), None, None)
            .unwrap();
        assert_eq!(page.count, 0);
    }

    #[test]
    fn delete_user_removes_memberships() {
        let m = manager();
        let a = register(&m, "a");
        let b = register(&m, "b");
        let group = m.create_group(a.id, &NewGroup::new("g", "pw"), t(0)).unwrap();
        m.join_group(b.id, group.id, "pw", t(0)).unwrap();

        m.delete_user(b.id).unwrap();
        assert_eq!(m.group_detail(group.id).unwrap().user_count, 1);
        assert!(matches!(
            m.user_profile(b.id, t(0)),
            Err(SocialError::NotFound(_))
        ));
    }
}
