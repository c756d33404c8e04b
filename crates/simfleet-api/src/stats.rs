// Stats endpoint
//
// Server-side counters: broker connectivity plus device totals.

use crate::client::PanelClient;
use crate::error::Error;
use crate::models::BrokerStats;

impl PanelClient {
    /// Fetch broker connectivity and fleet counters.
    ///
    /// `GET /api/stats`
    pub async fn get_stats(&self) -> Result<BrokerStats, Error> {
        let url = self.api_url("stats");
        self.get(url).await
    }
}
