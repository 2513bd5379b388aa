use crate::forwarder::forward_once;
use crate::types::*;
use tracing::Instrument;

/// What happened after walking the candidate list.
#[derive(Debug, Clone)]
pub enum FailoverOutcome {
    /// A candidate completed the exchange. `skipped` holds the transport
    /// failures of the candidates tried before it.
    Delivered {
        response: UpstreamResponse,
        skipped: NetworkErrorLog,
    },
    /// Every candidate failed at the transport level.
    Exhausted(NetworkErrorLog),
}

impl FailoverOutcome {
    pub fn into_result(self) -> std::result::Result<UpstreamResponse, NetworkErrorLog> {
        match self {
            Self::Delivered { response, .. } => Ok(response),
            Self::Exhausted(log) => Err(log),
        }
    }
}

/// Tries `candidates` strictly in order and stops at the first one that
/// answers, whatever the status. Holds no state between calls.
pub async fn dispatch(
    client: &reqwest::Client,
    candidates: &[CandidateAddress],
    request: &ForwardedRequest,
) -> FailoverOutcome {
    let mut log = NetworkErrorLog::default();

    for (attempt, candidate) in candidates.iter().enumerate() {
        let span = tracing::debug_span!(
            "failover.attempt",
            attempt = attempt + 1,
            candidate = %candidate
        );

        match forward_once(client, candidate, request).instrument(span).await {
            UpstreamOutcome::Success(response) => {
                if !log.is_empty() {
                    tracing::info!(
                        "[⚙️  -> 🗄️ ] {} {} served by {} after {} failed candidate(s)",
                        request.method,
                        request.path,
                        candidate,
                        log.len()
                    );
                }
                return FailoverOutcome::Delivered {
                    response,
                    skipped: log,
                };
            }
            UpstreamOutcome::NetworkFailure(failure) => {
                tracing::warn!("[⚙️  -> 🗄️ ] Candidate unreachable: {}", failure);
                log.push(failure);
            }
        }
    }

    tracing::error!(
        "[⚙️  -> 🗄️ ] {} {}: all {} candidate(s) unreachable ({})",
        request.method,
        request.path,
        candidates.len(),
        log
    );
    FailoverOutcome::Exhausted(log)
}
