// Device endpoints
//
// Fleet CRUD plus run-state commands and CSV upload. Create and update
// echo the stored Device back; start/stop reply with the new status.

use tracing::debug;

use crate::client::PanelClient;
use crate::error::Error;
use crate::models::{Ack, CsvUploadReply, Device, StatusReply};

impl PanelClient {
    /// List the full device collection.
    ///
    /// `GET /api/devices`
    pub async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        let url = self.api_url("devices");
        debug!("listing devices");
        self.get(url).await
    }

    /// Fetch a single device by uuid.
    ///
    /// `GET /api/devices/{uuid}`
    pub async fn get_device(&self, uuid: &str) -> Result<Device, Error> {
        let url = self.api_url(&format!("devices/{uuid}"));
        self.get(url).await
    }

    /// Create a device. The server stores it and echoes it back.
    ///
    /// `POST /api/devices`
    pub async fn create_device(&self, device: &Device) -> Result<Device, Error> {
        let url = self.api_url("devices");
        debug!(uuid = %device.uuid, "creating device");
        self.post(url, device).await
    }

    /// Replace a device wholesale (full update, not a patch).
    ///
    /// `PUT /api/devices/{uuid}`
    pub async fn update_device(&self, uuid: &str, device: &Device) -> Result<Device, Error> {
        let url = self.api_url(&format!("devices/{uuid}"));
        debug!(uuid, "updating device");
        self.put(url, device).await
    }

    /// Delete a device.
    ///
    /// `DELETE /api/devices/{uuid}`
    pub async fn delete_device(&self, uuid: &str) -> Result<Ack, Error> {
        let url = self.api_url(&format!("devices/{uuid}"));
        debug!(uuid, "deleting device");
        self.delete(url).await
    }

    /// Start publishing.
    ///
    /// `POST /api/devices/{uuid}/start`
    pub async fn start_device(&self, uuid: &str) -> Result<StatusReply, Error> {
        let url = self.api_url(&format!("devices/{uuid}/start"));
        debug!(uuid, "starting device");
        self.post_empty(url).await
    }

    /// Stop publishing.
    ///
    /// `POST /api/devices/{uuid}/stop`
    pub async fn stop_device(&self, uuid: &str) -> Result<StatusReply, Error> {
        let url = self.api_url(&format!("devices/{uuid}/stop"));
        debug!(uuid, "stopping device");
        self.post_empty(url).await
    }

    /// Start every device in the fleet.
    ///
    /// `POST /api/devices/start-all`
    pub async fn start_all(&self) -> Result<Ack, Error> {
        let url = self.api_url("devices/start-all");
        debug!("starting all devices");
        self.post_empty(url).await
    }

    /// Stop every device in the fleet.
    ///
    /// `POST /api/devices/stop-all`
    pub async fn stop_all(&self) -> Result<Ack, Error> {
        let url = self.api_url("devices/stop-all");
        debug!("stopping all devices");
        self.post_empty(url).await
    }

    /// Upload a CSV dataset for playback. The server switches the device
    /// into CSV playback mode and records the stored file path.
    ///
    /// `POST /api/devices/{uuid}/upload-csv` (multipart, field `file`)
    pub async fn upload_csv(
        &self,
        uuid: &str,
        file_name: String,
        bytes: Vec<u8>,
    ) -> Result<CsvUploadReply, Error> {
        let url = self.api_url(&format!("devices/{uuid}/upload-csv"));
        debug!(uuid, file_name, "uploading CSV");
        self.post_multipart(url, file_name, bytes).await
    }
}
