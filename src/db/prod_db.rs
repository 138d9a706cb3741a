use crate::config::Config;
use crate::db::aemo::{
    historical_demand_archive::AemoHistoricalDemandArchive,
    price_and_demand_archive::AemoPriceAndDemandArchive,
};

pub struct ProdDb {}

impl ProdDb {
    pub fn aemo_price_and_demand(config: &Config) -> AemoPriceAndDemandArchive {
        AemoPriceAndDemandArchive {
            base_dir: config.data_dir.clone(),
            region: config.region.clone(),
            max_cache_age: config.max_cache_age,
        }
    }

    pub fn aemo_historical_demand(config: &Config) -> AemoHistoricalDemandArchive {
        AemoHistoricalDemandArchive {
            base_dir: config.data_dir.clone(),
            region: config.region.clone(),
        }
    }
}
