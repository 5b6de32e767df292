use crate::{ai::AdvisorService, auth::AuthService, config::AppConfig, market::MarketDataService};

pub struct AppServices {
    pub auth: AuthService,
    pub advisor: AdvisorService,
    pub market: MarketDataService,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            auth: AuthService::new(&config.jwt),
            advisor: AdvisorService::new(&config.llm),
            market: MarketDataService::new(&config.market),
        }
    }
}
