//! Service layer for NAAM
//!
//! The screen logic of the mobile app, minus the screens: each
//! sub-service validates input, calls the API client and keeps the
//! session in step. Front ends (the `naam` CLI, tests) talk to this layer
//! only.
//!
//! # Architecture
//!
//! `NaamService` is the facade. It owns the shared `ApiClient`,
//! `SessionManager`, `Config` and `EventBus`, and hands out:
//!
//! - `AuthService`: OTP login and logout
//! - `ProfileService`: profile, KYC uploads, bank details
//! - `LandService`: land-detail registration
//! - `CollectionService`: collections, payments, investor portfolios
//! - `MarketService`: price history
//! - `FeedService`: news, ads, quote, polls, engagement counters
//! - `DashboardService`: the home screen fan-out
//!
//! # Example
//!
//! ```no_run
//! use libnaam::service::NaamService;
//! use libnaam::types::UserRole;
//!
//! # async fn example() -> libnaam::Result<()> {
//! let service = NaamService::new()?;
//!
//! let mut login = service.auth().start_login(UserRole::Farmer);
//! login.send_otp("9876543210").await?;
//! login.verify_otp("123456").await?;
//!
//! let dashboard = service.dashboard().load().await;
//! println!("{} news items", dashboard.news.unwrap_or_default().len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod dashboard;
pub mod events;
pub mod feed;
pub mod land;
pub mod locations;
pub mod market;
pub mod payments;
pub mod profile;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use self::auth::AuthService;
use self::dashboard::DashboardService;
use self::events::{EventBus, EventReceiver};
use self::feed::FeedService;
use self::land::LandService;
use self::locations::LocationSelector;
use self::market::MarketService;
use self::payments::CollectionService;
use self::profile::ProfileService;
use crate::api::ApiClient;
use crate::session::{open_store, SessionManager, SessionStore};
use crate::types::UserRole;
use crate::{Config, Result};

/// Where a front end should go after an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The role's home screen
    Dashboard(UserRole),
    /// The previous screen
    Back,
    /// The login screen (session gone)
    Login,
}

pub struct NaamService {
    config: Arc<Config>,
    client: Arc<ApiClient>,
    session: Arc<SessionManager>,
    auth: AuthService,
    profile: ProfileService,
    land: LandService,
    collections: CollectionService,
    market: MarketService,
    feed: FeedService,
    dashboard: DashboardService,
    event_bus: EventBus,
}

impl NaamService {
    /// Create a service from the default configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the
    /// stored session is unreadable.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    /// Create a service with the configured session store
    pub fn from_config(config: Config) -> Result<Self> {
        let store = open_store(&config.session);
        Self::with_store(config, store)
    }

    /// Create a service over an explicit session store
    ///
    /// Any persisted session is loaded before the service is returned.
    pub fn with_store(config: Config, store: Box<dyn SessionStore>) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(100);
        let session = Arc::new(SessionManager::new(store, event_bus.clone()));
        session.load()?;

        let config = Arc::new(config);
        let client = Arc::new(ApiClient::new(&config, Arc::clone(&session))?);

        let auth = AuthService::new(
            Arc::clone(&client),
            Arc::clone(&session),
            Duration::from_secs(config.otp.resend_cooldown_secs),
        );
        let profile = ProfileService::new(Arc::clone(&client), Arc::clone(&session));
        let land = LandService::new(Arc::clone(&client), Arc::clone(&session), event_bus.clone());
        let collections = CollectionService::new(
            Arc::clone(&client),
            Arc::clone(&session),
            Arc::clone(&config),
            event_bus.clone(),
        );
        let market = MarketService::new(Arc::clone(&client));
        let feed = FeedService::new(Arc::clone(&client), event_bus.clone());
        let dashboard = DashboardService::new(
            Arc::clone(&client),
            feed.clone(),
            market.clone(),
            event_bus.clone(),
        );

        Ok(Self {
            config,
            client,
            session,
            auth,
            profile,
            land,
            collections,
            market,
            feed,
            dashboard,
            event_bus,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Direct access to the typed API client
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn profile(&self) -> &ProfileService {
        &self.profile
    }

    pub fn land(&self) -> &LandService {
        &self.land
    }

    pub fn collections(&self) -> &CollectionService {
        &self.collections
    }

    pub fn market(&self) -> &MarketService {
        &self.market
    }

    pub fn feed(&self) -> &FeedService {
        &self.feed
    }

    pub fn dashboard(&self) -> &DashboardService {
        &self.dashboard
    }

    /// A location cascade backed by the API
    pub fn locations(&self) -> LocationSelector<ApiClient> {
        LocationSelector::new(Arc::clone(&self.client))
    }

    /// Subscribe to service and session events
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }
}
