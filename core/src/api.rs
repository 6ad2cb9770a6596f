//! One method per provider operation: build, send, parse.
//!
//! `OneSignal` pairs the stateless `OneSignalClient` with a `Transport`.
//! Validation runs before the transport is touched, so a rejected input never
//! produces network traffic. The struct holds no mutable state; it is `Sync`
//! whenever the transport is and can be shared across threads as-is.

use serde_json::Value;

use crate::client::OneSignalClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::transport::Transport;
use crate::types::{ApiResponse, Credentials};
use crate::validation::ValidationError;

#[derive(Debug, Clone)]
pub struct OneSignal<T> {
    client: OneSignalClient,
    transport: T,
}

#[cfg(feature = "ureq")]
impl OneSignal<crate::transport::UreqTransport> {
    /// Client for the public provider endpoint over a blocking ureq agent.
    pub fn connect(credentials: Credentials) -> Result<Self, ValidationError> {
        Ok(Self::new(
            OneSignalClient::new(credentials)?,
            crate::transport::UreqTransport::new(),
        ))
    }
}

impl<T: Transport> OneSignal<T> {
    pub fn new(client: OneSignalClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn with_transport(credentials: Credentials, transport: T) -> Result<Self, ValidationError> {
        Ok(Self::new(OneSignalClient::new(credentials)?, transport))
    }

    pub fn client(&self) -> &OneSignalClient {
        &self.client
    }

    pub fn get_app(&self) -> Result<ApiResponse, ApiError> {
        self.execute(self.client.build_get_app())
    }

    /// Whether the credentials address an existing app. A 404 from the
    /// provider is `Ok(false)`; any other failure is returned as an error so
    /// "does not exist" stays distinguishable from "could not check".
    pub fn is_valid(&self) -> Result<bool, ApiError> {
        let response = self.transport.send(&self.client.build_get_app())?;
        self.client.parse_is_valid(response)
    }

    pub fn send_notification(&self, message: &Value, options: Option<&Value>) -> Result<ApiResponse, ApiError> {
        let request = self.client.build_send_notification(message, options)?;
        self.execute(request)
    }

    pub fn cancel_notification(&self, notification_id: &str) -> Result<ApiResponse, ApiError> {
        let request = self.client.build_cancel_notification(notification_id)?;
        self.execute(request)
    }

    pub fn view_notifications(&self, options: Option<&Value>) -> Result<ApiResponse, ApiError> {
        let request = self.client.build_view_notifications(options)?;
        self.execute(request)
    }

    pub fn view_notification(&self, notification_id: &str) -> Result<ApiResponse, ApiError> {
        let request = self.client.build_view_notification(notification_id)?;
        self.execute(request)
    }

    pub fn view_devices(&self, options: Option<&Value>) -> Result<ApiResponse, ApiError> {
        let request = self.client.build_view_devices(options)?;
        self.execute(request)
    }

    pub fn view_device(&self, player_id: &str) -> Result<ApiResponse, ApiError> {
        let request = self.client.build_view_device(player_id)?;
        self.execute(request)
    }

    fn execute(&self, request: HttpRequest) -> Result<ApiResponse, ApiError> {
        let response = self.transport.send(&request)?;
        self.client.parse_response(response)
    }
}
