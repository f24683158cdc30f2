//! Code issuance, joining and teardown.

use std::sync::Arc;

use rendezvous_protocol::{ConnectionId, PairingCode, ServerEvent};
use tracing::{debug, info, instrument, warn};

use super::code::{CodeGenerator, is_well_formed};
use super::registry::{Claim, ConnectionRegistry};
use crate::error::{BrokerError, BrokerResult};
use crate::transport::MessageSink;

/// Default number of fresh codes tried before giving up on a collision streak.
pub const DEFAULT_MAX_ISSUE_ATTEMPTS: u32 = 32;

/// Pairs two connections through a short-lived code.
///
/// A connection asks for a code, shares it out of band, and the first other
/// connection to present it is matched with the owner. The code is gone
/// after that, and also when its owner disconnects.
#[derive(Clone)]
pub struct PairingService {
    registry: Arc<ConnectionRegistry>,
    codes: Arc<dyn CodeGenerator>,
    sink: Arc<dyn MessageSink>,
    max_issue_attempts: u32,
}

impl PairingService {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        codes: Arc<dyn CodeGenerator>,
        sink: Arc<dyn MessageSink>,
        max_issue_attempts: u32,
    ) -> Self {
        Self {
            registry,
            codes,
            sink,
            max_issue_attempts: max_issue_attempts.max(1),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Issue a code owned by `identity`.
    ///
    /// Replaces any code `identity` already held. Codes held by other
    /// connections are never handed out; a colliding draw is retried.
    #[instrument(skip_all, fields(identity = %identity))]
    pub async fn issue_code(&self, identity: &ConnectionId) -> BrokerResult<PairingCode> {
        for attempt in 1..=self.max_issue_attempts {
            let code = self.codes.generate();
            if self.registry.try_put(code.clone(), identity.clone()).await {
                info!("Generated new code {} for {}", code, identity);
                return Ok(code);
            }
            debug!(attempt, "Code {} already in use, drawing another", code);
        }

        warn!(
            attempts = self.max_issue_attempts,
            "Could not find a free code for {}", identity
        );
        Err(BrokerError::CodesExhausted)
    }

    /// Match `joiner` with the owner of `code`.
    ///
    /// On success the owner gets `peer_joined` and the joiner gets
    /// `code_accepted`, and the code is consumed. Returns the owner.
    #[instrument(skip_all, fields(joiner = %joiner))]
    pub async fn join_code(
        &self,
        joiner: &ConnectionId,
        code: Option<&str>,
    ) -> BrokerResult<ConnectionId> {
        let code = match code {
            Some(code) if !code.is_empty() => code.trim(),
            _ => return Err(BrokerError::invalid_request("No code provided")),
        };
        info!("Join attempt with code {}", code);

        if !is_well_formed(code) {
            debug!("Rejecting malformed code {:?}", code);
            return Err(BrokerError::CodeNotFound);
        }

        let owner = match self.registry.claim(&PairingCode::from(code), joiner).await {
            Claim::Claimed(owner) => owner,
            Claim::NotFound => {
                warn!("No matching code found for {}", code);
                return Err(BrokerError::CodeNotFound);
            }
            Claim::OwnedByJoiner => {
                warn!("Self-join attempt rejected for {}", joiner);
                return Err(BrokerError::SelfJoin);
            }
        };

        info!("Paired {} with {} via code {}", joiner, owner, code);
        self.sink
            .send(
                &owner,
                ServerEvent::PeerJoined {
                    peer_sid: joiner.clone(),
                },
            )
            .await;
        self.sink
            .send(
                joiner,
                ServerEvent::CodeAccepted {
                    peer_sid: owner.clone(),
                },
            )
            .await;

        Ok(owner)
    }

    /// Forget everything `identity` owned.
    pub async fn disconnect(&self, identity: &ConnectionId) {
        if let Some(code) = self.registry.purge(identity).await {
            debug!("Released code {} held by {}", code, identity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::code::RandomCodeGenerator;
    use crate::pairing::code::testing::ScriptedCodes;
    use crate::transport::testing::RecordingSink;

    fn id(s: &str) -> ConnectionId {
        ConnectionId::from(s)
    }

    fn service_with(codes: Arc<dyn CodeGenerator>) -> (PairingService, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let service = PairingService::new(
            Arc::new(ConnectionRegistry::new()),
            codes,
            sink.clone(),
            DEFAULT_MAX_ISSUE_ATTEMPTS,
        );
        (service, sink)
    }

    fn scripted(codes: &[&'static str]) -> (PairingService, Arc<RecordingSink>) {
        service_with(Arc::new(ScriptedCodes::new(codes)))
    }

    #[tokio::test]
    async fn test_issue_code_registers_owner() {
        let (service, sink) = service_with(Arc::new(RandomCodeGenerator));
        let code = service.issue_code(&id("a")).await.unwrap();

        assert_eq!(code.len(), 6);
        assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        assert_eq!(service.registry().resolve(&code).await, Some(id("a")));
        assert_eq!(service.registry().code_for(&id("a")).await, Some(code));
        assert!(sink.take().await.is_empty());
    }

    #[tokio::test]
    async fn test_reissue_replaces_old_code() {
        let (service, _) = scripted(&["111111", "222222"]);
        let first = service.issue_code(&id("a")).await.unwrap();
        let second = service.issue_code(&id("a")).await.unwrap();

        assert_eq!(first.as_str(), "111111");
        assert_eq!(second.as_str(), "222222");
        assert_eq!(service.registry().resolve(&first).await, None);
        assert_eq!(service.registry().resolve(&second).await, Some(id("a")));
    }

    #[tokio::test]
    async fn test_issue_skips_codes_held_by_others() {
        let (service, _) = scripted(&["111111", "111111", "333333"]);
        service.issue_code(&id("a")).await.unwrap();
        let code = service.issue_code(&id("b")).await.unwrap();

        assert_eq!(code.as_str(), "333333");
        assert_eq!(
            service.registry().resolve(&PairingCode::from("111111")).await,
            Some(id("a"))
        );
    }

    #[tokio::test]
    async fn test_issue_gives_up_after_max_attempts() {
        let sink = Arc::new(RecordingSink::default());
        let service = PairingService::new(
            Arc::new(ConnectionRegistry::new()),
            Arc::new(ScriptedCodes::new(&["111111"])),
            sink,
            4,
        );
        service.issue_code(&id("a")).await.unwrap();

        assert_eq!(
            service.issue_code(&id("b")).await,
            Err(BrokerError::CodesExhausted)
        );
        assert_eq!(service.registry().code_for(&id("b")).await, None);
    }

    #[tokio::test]
    async fn test_join_notifies_both_sides_and_consumes() {
        let (service, sink) = scripted(&["482913"]);
        let code = service.issue_code(&id("a")).await.unwrap();

        let owner = service.join_code(&id("b"), Some("482913")).await.unwrap();
        assert_eq!(owner, id("a"));

        assert_eq!(
            sink.take().await,
            vec![
                (id("a"), ServerEvent::PeerJoined { peer_sid: id("b") }),
                (id("b"), ServerEvent::CodeAccepted { peer_sid: id("a") }),
            ]
        );
        assert_eq!(service.registry().resolve(&code).await, None);
        assert_eq!(service.registry().code_for(&id("a")).await, None);
        assert_eq!(service.registry().code_for(&id("b")).await, None);
    }

    #[tokio::test]
    async fn test_second_joiner_gets_code_not_found() {
        let (service, sink) = scripted(&["482913"]);
        service.issue_code(&id("a")).await.unwrap();

        service.join_code(&id("b"), Some("482913")).await.unwrap();
        sink.take().await;

        assert_eq!(
            service.join_code(&id("c"), Some("482913")).await,
            Err(BrokerError::CodeNotFound)
        );
        assert!(sink.take().await.is_empty());
    }

    #[tokio::test]
    async fn test_self_join_is_rejected_and_code_survives() {
        let (service, sink) = scripted(&["482913"]);
        let code = service.issue_code(&id("a")).await.unwrap();

        assert_eq!(
            service.join_code(&id("a"), Some("482913")).await,
            Err(BrokerError::SelfJoin)
        );
        assert_eq!(service.registry().resolve(&code).await, Some(id("a")));
        assert!(sink.take().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_code_is_invalid_request() {
        let (service, _) = scripted(&["482913"]);

        for code in [None, Some("")] {
            assert_eq!(
                service.join_code(&id("x"), code).await,
                Err(BrokerError::invalid_request("No code provided"))
            );
        }
    }

    #[tokio::test]
    async fn test_blank_code_is_not_found_and_padding_is_trimmed() {
        let (service, _) = scripted(&["482913"]);
        service.issue_code(&id("a")).await.unwrap();

        for code in ["   ", "\t"] {
            assert_eq!(
                service.join_code(&id("b"), Some(code)).await,
                Err(BrokerError::CodeNotFound)
            );
        }
        assert_eq!(
            service.join_code(&id("b"), Some(" 482913 ")).await,
            Ok(id("a"))
        );
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_codes_are_not_found() {
        let (service, _) = scripted(&["482913"]);
        service.issue_code(&id("a")).await.unwrap();

        for code in ["000000", "48291", "abcdef", "4829130"] {
            assert_eq!(
                service.join_code(&id("b"), Some(code)).await,
                Err(BrokerError::CodeNotFound)
            );
        }
    }

    #[tokio::test]
    async fn test_disconnect_invalidates_code() {
        let (service, _) = scripted(&["482913"]);
        let code = service.issue_code(&id("a")).await.unwrap();

        service.disconnect(&id("a")).await;
        service.disconnect(&id("a")).await;

        assert_eq!(service.registry().resolve(&code).await, None);
        assert_eq!(
            service.join_code(&id("b"), Some("482913")).await,
            Err(BrokerError::CodeNotFound)
        );
    }

    #[tokio::test]
    async fn test_concurrent_joins_single_winner() {
        let (service, sink) = scripted(&["482913"]);
        service.issue_code(&id("a")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .join_code(&id(&format!("j{i}")), Some("482913"))
                    .await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(owner) => {
                    assert_eq!(owner, id("a"));
                    ok += 1;
                }
                Err(err) => assert_eq!(err, BrokerError::CodeNotFound),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(sink.take().await.len(), 2);
    }
}
