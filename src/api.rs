//! Entry point tying storage, the social manager and discovery together.

use std::sync::Arc;

use crate::config::CoreSettings;
use crate::discovery::{
    self, ActivityReport, Clock, DistanceReport, DiscoveryService, GroupId, RankedCandidate,
    SystemClock, UserId,
};
use crate::social::{
    self, AlertPage, CredentialVerifier, GroupDetail, Message, NewGroup, NewUser, ProfileUpdate,
    ProfileView, SaltedSha256Verifier, SocialManager, SocialStorage, UserProfile,
};

/// Core interface for Nearby.
///
/// Owns one shared [`SocialStorage`], the [`SocialManager`] writing to it and
/// the [`DiscoveryService`] reading from it. Operations that depend on the
/// current time read it from the clock `C`.
///
/// # Examples
///
/// ```ignore
/// use nearby_core::{config::CoreSettings, NearbyCore};
///
/// let core = NearbyCore::open(&CoreSettings::from_env()?)?;
/// let nearby = core.nearby_users(user_id)?;
/// ```
pub struct NearbyCore<C = SystemClock, V = SaltedSha256Verifier> {
    settings: CoreSettings,
    clock: C,
    social: SocialManager<V>,
    discovery: DiscoveryService<Arc<SocialStorage>, C>,
}

impl NearbyCore {
    /// Opens the database named in `settings`, using the system clock and
    /// salted SHA-256 group passwords.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(settings: &CoreSettings) -> social::Result<Self> {
        let storage = Arc::new(SocialStorage::new(&settings.database_path)?);
        Ok(Self::with_parts(
            storage,
            SystemClock,
            SaltedSha256Verifier,
            settings,
        ))
    }
}

impl<C: Clock + Clone, V: CredentialVerifier> NearbyCore<C, V> {
    /// Assembles a core from explicit collaborators.
    pub fn with_parts(
        storage: Arc<SocialStorage>,
        clock: C,
        verifier: V,
        settings: &CoreSettings,
    ) -> Self {
        Self {
            settings: settings.clone(),
            social: SocialManager::from_settings(Arc::clone(&storage), verifier, settings),
            discovery: DiscoveryService::from_settings(storage, clock.clone(), settings),
            clock,
        }
    }

    /// Creates a core over an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory(clock: C, verifier: V, settings: &CoreSettings) -> social::Result<Self> {
        let storage = Arc::new(SocialStorage::in_memory()?);
        Ok(Self::with_parts(storage, clock, verifier, settings))
    }

    /// The settings this core was built with.
    pub const fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    /// Account, relationship, group and alert operations.
    pub const fn social(&self) -> &SocialManager<V> {
        &self.social
    }

    /// Ranking operations.
    pub const fn discovery(&self) -> &DiscoveryService<Arc<SocialStorage>, C> {
        &self.discovery
    }

    // ==================== Accounts ====================

    /// Registers a user, active as of now.
    ///
    /// # Errors
    ///
    /// See [`SocialManager::register_user`].
    pub fn register_user(&self, user: &NewUser) -> social::Result<UserProfile> {
        self.social.register_user(user, self.clock.now())
    }

    /// A user's profile as of now.
    ///
    /// # Errors
    ///
    /// See [`SocialManager::user_profile`].
    pub fn user_profile(&self, id: UserId) -> social::Result<ProfileView> {
        self.social.user_profile(id, self.clock.now())
    }

    /// Every registered user.
    ///
    /// # Errors
    ///
    /// See [`SocialManager::list_users`].
    pub fn list_users(&self) -> social::Result<Vec<UserProfile>> {
        self.social.list_users()
    }

    /// Edits a user's profile.
    ///
    /// # Errors
    ///
    /// See [`SocialManager::update_profile`].
    pub fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> social::Result<UserProfile> {
        self.social.update_profile(id, update)
    }

    /// Marks a user active now. Call on every authenticated request.
    ///
    /// # Errors
    ///
    /// See [`SocialManager::touch_activity`].
    pub fn touch_activity(&self, id: UserId) -> social::Result<()> {
        self.social.touch_activity(id, self.clock.now())
    }

    // ==================== Social Actions ====================

    /// Blocks a user.
    ///
    /// # Errors
    ///
    /// See [`SocialManager::block`].
    pub fn block(&self, blocker: UserId, blocked: UserId) -> social::Result<()> {
        self.social.block(blocker, blocked, self.clock.now())
    }

    /// Sends a message.
    ///
    /// # Errors
    ///
    /// See [`SocialManager::post_message`].
    pub fn post_message(
        &self,
        sender: UserId,
        receiver: UserId,
        text: &str,
    ) -> social::Result<Message> {
        self.social
            .post_message(sender, receiver, text, self.clock.now())
    }

    /// Creates a group.
    ///
    /// # Errors
    ///
    /// See [`SocialManager::create_group`].
    pub fn create_group(&self, creator: UserId, group: &NewGroup) -> social::Result<GroupDetail> {
        let created = self.social.create_group(creator, group, self.clock.now())?;
        self.social.group_detail(created.id)
    }

    /// Joins a group.
    ///
    /// # Errors
    ///
    /// See [`SocialManager::join_group`].
    pub fn join_group(
        &self,
        user: UserId,
        group: GroupId,
        password: &str,
    ) -> social::Result<GroupDetail> {
        self.social
            .join_group(user, group, password, self.clock.now())
    }

    /// Alerts active now in the user's groups.
    ///
    /// # Errors
    ///
    /// See [`SocialManager::active_alerts`].
    pub fn active_alerts(
        &self,
        user: UserId,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> social::Result<AlertPage> {
        self.social
            .active_alerts(user, self.clock.now(), page, page_size)
    }

    // ==================== Discovery ====================

    /// Users closest to `actor`.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryService::nearby_users`].
    pub fn nearby_users(&self, actor: UserId) -> discovery::Result<Vec<RankedCandidate>> {
        self.discovery.nearby_users(actor)
    }

    /// Users `actor` most recently messaged with.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryService::recent_correspondents`].
    pub fn recent_correspondents(&self, actor: UserId) -> discovery::Result<Vec<RankedCandidate>> {
        self.discovery.recent_correspondents(actor)
    }

    /// Members of a group closest to `actor`.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryService::group_members`].
    pub fn group_members(
        &self,
        actor: UserId,
        group: GroupId,
    ) -> discovery::Result<Vec<RankedCandidate>> {
        self.discovery.group_members(actor, group)
    }

    /// Distance between two users in meters.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryService::distance_between`].
    pub fn distance_between(&self, a: UserId, b: UserId) -> discovery::Result<DistanceReport> {
        self.discovery.distance_between(a, b)
    }

    /// Whether a user is online.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryService::activity`].
    pub fn activity(&self, user: UserId) -> discovery::Result<ActivityReport> {
        self.discovery.activity(user)
    }
}
