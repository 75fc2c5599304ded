// ── Command channel ──
//
// Turns a `Command` into one HTTP request to the arm. Gated on the link:
// with no connection or no configured endpoint nothing is sent at all.
// Every attempt is single-shot and classified into a `CommandResult`.

use std::future::Future;
use std::sync::OnceLock;

use roarm_api::{ArmClient, ArmReply, command_url};
use tracing::{debug, info, warn};
use url::Url;

use crate::command::{Command, CommandResult};
use crate::connection::ConnectionManager;

/// Something that can perform the arm's GET request.
pub trait CommandTransport: Send + Sync {
    fn get(&self, url: Url) -> impl Future<Output = Result<ArmReply, roarm_api::Error>> + Send;
}

impl CommandTransport for ArmClient {
    fn get(&self, url: Url) -> impl Future<Output = Result<ArmReply, roarm_api::Error>> + Send {
        ArmClient::get(self, url)
    }
}

/// Where commands are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    pub host: String,
}

/// Gated, single-attempt command sender.
pub struct CommandChannel<T = ArmClient> {
    link: ConnectionManager,
    transport: T,
    endpoint: OnceLock<DeviceEndpoint>,
}

impl<T: CommandTransport> CommandChannel<T> {
    pub fn new(link: ConnectionManager, transport: T) -> Self {
        Self {
            link,
            transport,
            endpoint: OnceLock::new(),
        }
    }

    /// Bind the channel to a device. Only the first call takes effect.
    pub fn configure(&self, host: impl Into<String>) -> bool {
        let host = host.into();
        let accepted = self.endpoint.set(DeviceEndpoint { host: host.clone() }).is_ok();
        if accepted {
            info!(%host, "command channel configured");
        } else {
            debug!(%host, "command channel already configured, ignoring");
        }
        accepted
    }

    pub fn endpoint(&self) -> Option<&DeviceEndpoint> {
        self.endpoint.get()
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.get().is_some()
    }

    /// Configured and the link is up.
    pub fn is_ready(&self) -> bool {
        self.is_configured() && self.link.is_connected()
    }

    pub fn link(&self) -> &ConnectionManager {
        &self.link
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one command and classify the outcome.
    pub async fn dispatch(&self, command: &Command) -> CommandResult {
        let name = command.name();

        if !self.link.is_connected() {
            debug!(command = name, "link down, not sending");
            return CommandResult::NotConnected;
        }
        let Some(endpoint) = self.endpoint.get() else {
            debug!(command = name, "no device configured, not sending");
            return CommandResult::NotConnected;
        };

        let url = match command
            .to_json()
            .map_err(roarm_api::Error::from)
            .and_then(|json| command_url(&endpoint.host, &json))
        {
            Ok(url) => url,
            Err(e) => {
                warn!(command = name, error = %e, "could not build request");
                return CommandResult::TransportError;
            }
        };

        match self.transport.get(url).await {
            Ok(reply) if (200..300).contains(&reply.status) => {
                debug!(
                    command = name,
                    status = reply.status,
                    body = %reply.body.text(),
                    truncated = reply.body.is_truncated(),
                    "command sent"
                );
                CommandResult::Ok
            }
            Ok(reply) => {
                warn!(command = name, status = reply.status, "arm rejected command");
                CommandResult::TransportError
            }
            Err(e) => {
                warn!(command = name, error = %e, "command failed");
                CommandResult::TransportError
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::joint::{Joint, SHOULDER, to_angle};
    use crate::command::MotionProfile;
    use crate::testing::{CountingTransport, connected_manager};
    use crate::station::LinkEvent;
    use crate::testing::ScriptedStation;

    #[tokio::test]
    async fn dispatch_while_disconnected_sends_nothing() {
        let link = ConnectionManager::new(ScriptedStation::new(vec![]), 10);
        let channel = CommandChannel::new(link, CountingTransport::new(200));
        channel.configure("192.168.4.1");

        for cmd in [
            Command::Home,
            Command::EnableTorque,
            Command::SetLed { brightness: 255 },
            Command::move_joint(Joint::Base, 0.0, MotionProfile::default()),
        ] {
            assert_eq!(channel.dispatch(&cmd).await, CommandResult::NotConnected);
        }
        assert_eq!(channel.transport().calls(), 0);
        assert!(!channel.is_ready());
    }

    #[tokio::test]
    async fn dispatch_without_endpoint_sends_nothing() {
        let link = connected_manager().await;
        let channel = CommandChannel::new(link, CountingTransport::new(200));

        assert_eq!(channel.dispatch(&Command::Home).await, CommandResult::NotConnected);
        assert_eq!(channel.transport().calls(), 0);
    }

    #[tokio::test]
    async fn dispatch_sends_one_escaped_request() {
        let link = connected_manager().await;
        let channel = CommandChannel::new(link, CountingTransport::new(200));
        assert!(channel.configure("192.168.4.1"));
        assert!(channel.is_ready());

        let cmd = Command::move_joint(
            Joint::Shoulder,
            to_angle(50, &SHOULDER),
            MotionProfile::default(),
        );
        assert_eq!(channel.dispatch(&cmd).await, CommandResult::Ok);

        let urls = channel.transport().urls();
        assert_eq!(urls.len(), 1);
        assert_eq!(
            urls[0].as_str(),
            "http://192.168.4.1/js?json=%7B%22T%22%3A101%2C%22joint%22%3A2%2C%22rad%22%3A0.60%2C%22spd%22%3A0%2C%22acc%22%3A10%7D"
        );
    }

    #[tokio::test]
    async fn led_brightness_is_clamped_on_the_wire() {
        let link = connected_manager().await;
        let channel = CommandChannel::new(link, CountingTransport::new(200));
        channel.configure("192.168.4.1");

        channel.dispatch(&Command::SetLed { brightness: 300 }).await;
        channel.dispatch(&Command::SetLed { brightness: -5 }).await;

        let urls = channel.transport().urls();
        assert!(urls[0].as_str().ends_with("%22led%22%3A255%7D"), "{}", urls[0]);
        assert!(urls[1].as_str().ends_with("%22led%22%3A0%7D"), "{}", urls[1]);
    }

    #[tokio::test]
    async fn failures_are_transport_errors() {
        let link = connected_manager().await;
        let channel = CommandChannel::new(link, CountingTransport::new(404));
        channel.configure("192.168.4.1");
        assert_eq!(channel.dispatch(&Command::Home).await, CommandResult::TransportError);

        let link = connected_manager().await;
        let channel = CommandChannel::new(link, CountingTransport::failing());
        channel.configure("192.168.4.1");
        assert_eq!(channel.dispatch(&Command::Home).await, CommandResult::TransportError);
        assert_eq!(channel.transport().calls(), 1);
    }

    #[tokio::test]
    async fn bad_angle_fails_without_a_request() {
        let link = connected_manager().await;
        let channel = CommandChannel::new(link, CountingTransport::new(200));
        channel.configure("192.168.4.1");

        let cmd = Command::move_joint(Joint::Elbow, f32::NAN, MotionProfile::default());
        assert_eq!(channel.dispatch(&cmd).await, CommandResult::TransportError);
        assert_eq!(channel.transport().calls(), 0);
    }

    #[tokio::test]
    async fn endpoint_is_set_once() {
        let link = ConnectionManager::new(ScriptedStation::new(vec![LinkEvent::Started]), 10);
        let channel = CommandChannel::new(link, CountingTransport::new(200));
        assert!(channel.configure("10.0.0.1"));
        assert!(!channel.configure("10.0.0.2"));
        assert_eq!(channel.endpoint().unwrap().host, "10.0.0.1");
    }
}
