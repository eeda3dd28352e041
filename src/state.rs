use std::sync::Arc;

use crate::application::message_hub::MessageHub;
use crate::application::messaging_service::MessagingService;
use crate::application::offering_service::OfferingService;
use crate::application::order_service::OrderService;
use crate::application::profile_service::ProfileService;
use crate::application::review_service::ReviewService;
use crate::application::stats_service::StatsService;
use crate::db::DbPool;
use crate::domain::ports::{
    MessageRepository, OfferingRepository, OrderRepository, ProfileRepository, ReviewRepository,
    StatsRepository,
};
use crate::infrastructure::memory::InMemoryStore;
use crate::infrastructure::message_repo::DieselMessageRepository;
use crate::infrastructure::offering_repo::DieselOfferingRepository;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::profile_repo::DieselProfileRepository;
use crate::infrastructure::review_repo::DieselReviewRepository;
use crate::infrastructure::stats_repo::DieselStatsRepository;

/// Services shared by every worker, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub profiles: ProfileService,
    pub offerings: OfferingService,
    pub orders: OrderService,
    pub reviews: ReviewService,
    pub stats: StatsService,
    pub messaging: MessagingService,
}

struct Repositories {
    profiles: Arc<dyn ProfileRepository>,
    offerings: Arc<dyn OfferingRepository>,
    orders: Arc<dyn OrderRepository>,
    reviews: Arc<dyn ReviewRepository>,
    stats: Arc<dyn StatsRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl AppState {
    pub fn with_pool(pool: DbPool, message_channel_capacity: usize) -> Self {
        Self::wire(
            Repositories {
                profiles: Arc::new(DieselProfileRepository::new(pool.clone())),
                offerings: Arc::new(DieselOfferingRepository::new(pool.clone())),
                orders: Arc::new(DieselOrderRepository::new(pool.clone())),
                reviews: Arc::new(DieselReviewRepository::new(pool.clone())),
                stats: Arc::new(DieselStatsRepository::new(pool.clone())),
                messages: Arc::new(DieselMessageRepository::new(pool)),
            },
            message_channel_capacity,
        )
    }

    /// Everything backed by one process-local store; used by the HTTP tests.
    pub fn in_memory(message_channel_capacity: usize) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::wire(
            Repositories {
                profiles: store.clone(),
                offerings: store.clone(),
                orders: store.clone(),
                reviews: store.clone(),
                stats: store.clone(),
                messages: store,
            },
            message_channel_capacity,
        )
    }

    fn wire(repos: Repositories, message_channel_capacity: usize) -> Self {
        let profiles = ProfileService::new(repos.profiles);
        Self {
            offerings: OfferingService::new(repos.offerings.clone(), profiles.clone()),
            orders: OrderService::new(
                repos.orders.clone(),
                repos.offerings,
                profiles.clone(),
            ),
            reviews: ReviewService::new(
                repos.reviews.clone(),
                repos.orders.clone(),
                repos.stats.clone(),
            ),
            stats: StatsService::new(
                repos.stats,
                repos.orders.clone(),
                repos.reviews,
                profiles.clone(),
            ),
            messaging: MessagingService::new(
                repos.messages,
                repos.orders,
                profiles.clone(),
                Arc::new(MessageHub::new(message_channel_capacity)),
            ),
            profiles,
        }
    }
}
